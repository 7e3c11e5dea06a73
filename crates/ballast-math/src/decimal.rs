//! Unsigned 18-decimal fixed-point arithmetic.
//!
//! [`Decimal`] stores a value scaled by `10^18` in a `u128`. Multiplication
//! and division go through a 256-bit intermediate product, so `a * b / c`
//! is exact up to the final truncation even when `a * b` does not fit in
//! 128 bits. Nothing here touches floating point.
//!
//! ## Range
//!
//! Representable values span `[0, u128::MAX / 10^18]`, roughly `3.4e20`
//! whole units. [`Decimal::MAX`] doubles as the unbounded sentinel in price
//! upper bounds.

use std::fmt;
use std::str::FromStr;

use crate::{MathError, Result};

/// Number of fractional decimal digits.
pub const DECIMALS: u32 = 18;

/// Scaling factor: `10^18`.
const SCALE: u128 = 1_000_000_000_000_000_000;

/// Unsigned fixed-point number with 18 fractional decimal digits.
///
/// Ordering and equality compare the underlying scaled integer. Arithmetic
/// is only available through the checked `try_*` methods; there are no
/// operator impls that could hide a panic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Decimal(u128);

impl Decimal {
    /// Zero.
    pub const ZERO: Decimal = Decimal(0);

    /// One whole unit (`10^18` internally).
    pub const ONE: Decimal = Decimal(SCALE);

    /// The largest representable value; used as the unbounded price sentinel.
    pub const MAX: Decimal = Decimal(u128::MAX);

    /// Build a `Decimal` from a raw scaled integer (`value * 10^18`).
    pub const fn from_inner(inner: u128) -> Self {
        Decimal(inner)
    }

    /// The raw scaled integer backing this value.
    pub const fn inner(self) -> u128 {
        self.0
    }

    /// Build a `Decimal` from a whole number of units.
    pub const fn from_int(units: u64) -> Self {
        Decimal(units as u128 * SCALE)
    }

    /// Build a `Decimal` from an integer ratio `numerator / denominator`.
    ///
    /// # Errors
    ///
    /// - [`MathError::DivisionByZero`] if `denominator` is zero
    /// - [`MathError::Overflow`] if the quotient exceeds the representable range
    pub fn from_ratio(numerator: u128, denominator: u128) -> Result<Self> {
        mul_div(numerator, SCALE, denominator).map(Decimal)
    }

    /// Rescale a raw integer carrying `decimals` fractional digits to 18.
    ///
    /// Oracle feeds report integers at their own precision (Chainlink-style
    /// feeds commonly use 8); `from_scaled(100_000_000, 8)` is `1.0`.
    /// Precision beyond 18 digits truncates.
    ///
    /// # Errors
    ///
    /// - [`MathError::Overflow`] if the rescaled value does not fit, or if
    ///   `decimals` is so large that no `u128` input could survive the shift
    pub fn from_scaled(raw: u128, decimals: u8) -> Result<Self> {
        let decimals = u32::from(decimals);
        if decimals <= DECIMALS {
            let factor = 10u128
                .checked_pow(DECIMALS - decimals)
                .ok_or(MathError::Overflow)?;
            raw.checked_mul(factor)
                .map(Decimal)
                .ok_or(MathError::Overflow)
        } else {
            let factor = 10u128
                .checked_pow(decimals - DECIMALS)
                .ok_or(MathError::Overflow)?;
            Ok(Decimal(raw / factor))
        }
    }

    /// Checked addition.
    ///
    /// # Errors
    ///
    /// - [`MathError::Overflow`] if the sum exceeds [`Decimal::MAX`]
    pub fn try_add(self, rhs: Decimal) -> Result<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Decimal)
            .ok_or(MathError::Overflow)
    }

    /// Checked subtraction.
    ///
    /// # Errors
    ///
    /// - [`MathError::Underflow`] if `rhs > self`
    pub fn try_sub(self, rhs: Decimal) -> Result<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(Decimal)
            .ok_or(MathError::Underflow)
    }

    /// Checked fixed-point multiplication, truncating toward zero.
    ///
    /// # Errors
    ///
    /// - [`MathError::Overflow`] if the product exceeds [`Decimal::MAX`]
    pub fn try_mul(self, rhs: Decimal) -> Result<Self> {
        mul_div(self.0, rhs.0, SCALE).map(Decimal)
    }

    /// Checked fixed-point division, truncating toward zero.
    ///
    /// # Errors
    ///
    /// - [`MathError::DivisionByZero`] if `rhs` is zero
    /// - [`MathError::Overflow`] if the quotient exceeds [`Decimal::MAX`]
    pub fn try_div(self, rhs: Decimal) -> Result<Self> {
        mul_div(self.0, SCALE, rhs.0).map(Decimal)
    }

    /// `self * numerator / denominator` through a single 256-bit
    /// intermediate, exact up to the final truncation.
    ///
    /// # Errors
    ///
    /// - [`MathError::DivisionByZero`] if `denominator` is zero
    /// - [`MathError::Overflow`] if the result exceeds [`Decimal::MAX`]
    pub fn try_mul_div(self, numerator: Decimal, denominator: Decimal) -> Result<Self> {
        mul_div(self.0, numerator.0, denominator.0).map(Decimal)
    }

    /// Whether this value is exactly zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// Compute `a * b / denominator` with a 256-bit intermediate product.
fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }
    let (hi, lo) = widening_mul(a, b);
    if hi == 0 {
        return Ok(lo / denominator);
    }
    if hi >= denominator {
        // The quotient would need 129+ bits.
        return Err(MathError::Overflow);
    }
    Ok(div_wide(hi, lo, denominator))
}

/// Full 256-bit product of two `u128`s as `(high, low)` limbs.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = (1 << 64) - 1;
    let (a_hi, a_lo) = (a >> 64, a & MASK);
    let (b_hi, b_lo) = (b >> 64, b & MASK);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    // Middle column plus the carry out of the low limb; at most
    // 3 * (2^64 - 1), so there is no 128-bit overflow here.
    let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);

    let lo = (mid << 64) | (ll & MASK);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// Divide the 256-bit value `(hi, lo)` by `divisor`, returning the quotient.
///
/// Callers guarantee `divisor != 0` and `hi < divisor`, which bounds the
/// quotient below `2^128` and keeps the running remainder below `divisor`.
fn div_wide(hi: u128, lo: u128, divisor: u128) -> u128 {
    let mut rem = hi;
    let mut quot = 0u128;
    for i in (0..128).rev() {
        // `carry` is the remainder bit pushed out of the 128-bit window;
        // the true shifted remainder is `carry * 2^128 + rem`.
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        if carry == 1 || rem >= divisor {
            rem = rem.wrapping_sub(divisor);
            quot = (quot << 1) | 1;
        } else {
            quot <<= 1;
        }
    }
    quot
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = self.0 / SCALE;
        let frac = self.0 % SCALE;
        if frac == 0 {
            return write!(f, "{int}");
        }
        let digits = format!("{frac:018}");
        write!(f, "{int}.{}", digits.trim_end_matches('0'))
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({self})")
    }
}

impl FromStr for Decimal {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || MathError::InvalidLiteral(s.to_string());
        let (int_part, frac_part) = match s.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed());
        }
        if frac_part.len() > DECIMALS as usize {
            return Err(malformed());
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(malformed());
        }

        let int: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| malformed())?
        };
        let mut inner = int.checked_mul(SCALE).ok_or(MathError::Overflow)?;
        if !frac_part.is_empty() {
            let frac: u128 = frac_part.parse().map_err(|_| malformed())?;
            // frac has at most 18 digits, so frac * shift < 10^18.
            let shift = 10u128.pow(DECIMALS - frac_part.len() as u32);
            inner = inner
                .checked_add(frac * shift)
                .ok_or(MathError::Overflow)?;
        }
        Ok(Decimal(inner))
    }
}

impl serde::Serialize for Decimal {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Decimal {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text: String = serde::Deserialize::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal literal")
    }

    #[test]
    fn test_constants() {
        assert_eq!(Decimal::ZERO.inner(), 0);
        assert_eq!(Decimal::ONE.inner(), SCALE);
        assert!(Decimal::ZERO.is_zero());
        assert!(!Decimal::ONE.is_zero());
    }

    #[test]
    fn test_from_int() {
        assert_eq!(Decimal::from_int(42), dec("42"));
        assert_eq!(Decimal::from_int(0), Decimal::ZERO);
    }

    #[test]
    fn test_add_sub() {
        let a = dec("1.5");
        let b = dec("0.25");
        assert_eq!(a.try_add(b).expect("add"), dec("1.75"));
        assert_eq!(a.try_sub(b).expect("sub"), dec("1.25"));
    }

    #[test]
    fn test_add_overflow() {
        let err = Decimal::MAX.try_add(Decimal::ONE).expect_err("overflow");
        assert_eq!(err, MathError::Overflow);
    }

    #[test]
    fn test_sub_underflow() {
        let err = dec("1").try_sub(dec("2")).expect_err("underflow");
        assert_eq!(err, MathError::Underflow);
    }

    #[test]
    fn test_mul_rescales() {
        assert_eq!(dec("1.5").try_mul(dec("2")).expect("mul"), dec("3"));
        assert_eq!(dec("0.5").try_mul(dec("0.5")).expect("mul"), dec("0.25"));
    }

    #[test]
    fn test_mul_truncates_below_resolution() {
        let tiny = Decimal::from_inner(1);
        assert_eq!(tiny.try_mul(tiny).expect("mul"), Decimal::ZERO);
    }

    #[test]
    fn test_mul_large_intermediate() {
        // 1e10 * 1e10 = 1e20 units; the raw inner product needs ~187 bits.
        let ten_billion = Decimal::from_int(10_000_000_000);
        let got = ten_billion.try_mul(ten_billion).expect("mul");
        assert_eq!(got, Decimal::from_inner(10u128.pow(20) * SCALE));
    }

    #[test]
    fn test_mul_overflow() {
        let err = Decimal::MAX.try_mul(dec("2")).expect_err("overflow");
        assert_eq!(err, MathError::Overflow);
    }

    #[test]
    fn test_div() {
        assert_eq!(dec("3").try_div(dec("2")).expect("div"), dec("1.5"));
        assert_eq!(
            dec("1").try_div(dec("3")).expect("div").inner(),
            333_333_333_333_333_333
        );
    }

    #[test]
    fn test_div_by_zero() {
        let err = dec("1").try_div(Decimal::ZERO).expect_err("div by zero");
        assert_eq!(err, MathError::DivisionByZero);
    }

    #[test]
    fn test_mul_div_exact() {
        // a * b / b == a even though a * b overflows u128.
        let a = dec("123456789.987654321");
        let b = Decimal::from_int(1_000_000_000_000_000_000);
        assert_eq!(a.try_mul_div(b, b).expect("mul_div"), a);
    }

    #[test]
    fn test_mul_div_quotient_too_large() {
        let err = Decimal::MAX
            .try_mul_div(Decimal::MAX, Decimal::ONE)
            .expect_err("overflow");
        assert_eq!(err, MathError::Overflow);
    }

    #[test]
    fn test_from_ratio() {
        assert_eq!(Decimal::from_ratio(1, 2).expect("ratio"), dec("0.5"));
        assert_eq!(Decimal::from_ratio(604_800, 604_800).expect("ratio"), Decimal::ONE);
        assert_eq!(
            Decimal::from_ratio(u128::MAX, u128::MAX).expect("ratio"),
            Decimal::ONE
        );
        assert_eq!(
            Decimal::from_ratio(1, 0).expect_err("zero denominator"),
            MathError::DivisionByZero
        );
    }

    #[test]
    fn test_from_scaled_feed_decimals() {
        // 8-decimal feed reporting 1.00
        assert_eq!(
            Decimal::from_scaled(100_000_000, 8).expect("rescale"),
            Decimal::ONE
        );
        // 18-decimal feed passes through
        assert_eq!(Decimal::from_scaled(SCALE, 18).expect("rescale"), Decimal::ONE);
        // 27-decimal feed truncates extra precision
        assert_eq!(
            Decimal::from_scaled(1_500_000_000_000_000_000_000_000_000, 27).expect("rescale"),
            dec("1.5")
        );
    }

    #[test]
    fn test_from_scaled_overflow() {
        let err = Decimal::from_scaled(u128::MAX, 0).expect_err("overflow");
        assert_eq!(err, MathError::Overflow);
    }

    #[test]
    fn test_display() {
        assert_eq!(dec("42").to_string(), "42");
        assert_eq!(dec("1.5").to_string(), "1.5");
        assert_eq!(dec("0.005").to_string(), "0.005");
        assert_eq!(Decimal::from_inner(1).to_string(), "0.000000000000000001");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", ".", "1.2.3", "abc", "1,5", "-1", "+1", "1.1234567890123456789"] {
            assert!(bad.parse::<Decimal>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_parse_frac_only() {
        assert_eq!(dec(".5"), dec("0.5"));
    }

    #[test]
    fn test_ordering() {
        assert!(dec("0.99") < Decimal::ONE);
        assert!(Decimal::MAX > dec("1000000"));
        assert_eq!(dec("1.0"), Decimal::ONE);
    }

    #[test]
    fn test_serde_round_trip() {
        let price = dec("0.995");
        let json = serde_json::to_string(&price).expect("serialize");
        assert_eq!(json, "\"0.995\"");
        let back: Decimal = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, price);
    }
}
