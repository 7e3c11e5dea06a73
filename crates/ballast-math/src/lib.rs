//! # ballast-math
//!
//! Fixed-point arithmetic for the Ballast collateral engine.
//!
//! All protocol quantities (prices, exchange rates, error tolerances) are
//! represented as [`Decimal`], an unsigned 18-decimal fixed-point number
//! backed by a `u128`. Every operation is checked: overflow, underflow and
//! division by zero surface as [`MathError`] instead of wrapping or
//! saturating, because a silently wrong price is worse than a halted
//! refresh.
//!
//! ## Modules
//!
//! - [`decimal`] — The [`Decimal`] type and its checked operations

pub mod decimal;

pub use decimal::Decimal;

/// Error types for fixed-point arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    /// The result does not fit in the 18-decimal `u128` representation.
    #[error("fixed-point overflow")]
    Overflow,

    /// A subtraction went below zero.
    #[error("fixed-point underflow")]
    Underflow,

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A decimal literal could not be parsed.
    #[error("invalid decimal literal: {0}")]
    InvalidLiteral(String),
}

/// Convenience result type for fixed-point operations.
pub type Result<T> = std::result::Result<T, MathError>;
