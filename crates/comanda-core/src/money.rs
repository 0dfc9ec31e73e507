//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The backend sends prices as JSON numbers:  25, 15.5, "12.30"           │
//! │  Summing floats:  0.1 + 0.2 = 0.30000000000000004  ❌                   │
//! │                                                                         │
//! │  OUR SOLUTION: convert ONCE at the boundary, then integer cents         │
//! │    "15.5" ──► 1550 cents ──► every total is exact                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comanda_core::money::Money;
//!
//! let price = Money::from_cents(2500);
//! let line = price * 2;
//! assert_eq!(line.to_decimal_string(), "50.00");
//!
//! let parsed = Money::parse_decimal("15.5").unwrap();
//! assert_eq!(parsed.cents(), 1550);
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// Product.price ──► OrderItemDraft.price ──► line_total ──► OrderDraft.total
///                                                               │
/// Order (confirmed) ──► PrintOrder.items ──► ticket TOTAL ◄─────┘ (equal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a decimal string such as `"25"`, `"15.5"` or `"-3.75"`.
    ///
    /// ## Rounding
    /// More than two fraction digits are rounded half away from zero on the
    /// third digit: `"1.005"` → 101 cents. Everything after the third digit
    /// is ignored.
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let s = input.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("empty amount"));
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("not a decimal number"));
        }

        let major: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid("amount too large"))?
        };

        let mut frac = frac_part.bytes().map(|b| (b - b'0') as i64);
        let tens = frac.next().unwrap_or(0);
        let ones = frac.next().unwrap_or(0);
        let round_up = frac.next().map(|d| d >= 5).unwrap_or(false);

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(tens * 10 + ones + i64::from(round_up)))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` when the product does not fit in `i64` cents.
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `None` when the sum does not fit in `i64` cents.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Plain two-decimal rendering used on kitchen tickets: `"65.00"`.
    ///
    /// No currency symbol and no thousands separator, so the string always
    /// fits the fixed-width price column.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

// =============================================================================
// Deserialization from backend numbers
// =============================================================================

/// Deserializes a backend amount (JSON number or decimal string) into Money.
///
/// Numbers are rendered with two decimals first so `15.5` and `"15.50"`
/// take the same path through [`Money::parse_decimal`].
pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(major) => major
            .checked_mul(100)
            .map(Money::from_cents)
            .ok_or_else(|| serde::de::Error::custom("amount too large")),
        Raw::Float(value) if value.is_finite() => {
            Money::parse_decimal(&format!("{:.3}", value)).map_err(serde::de::Error::custom)
        }
        Raw::Float(_) => Err(serde::de::Error::custom("amount is not finite")),
        Raw::Text(text) => Money::parse_decimal(&text).map_err(serde::de::Error::custom),
    }
}

/// Serializes Money as a decimal number, the shape the backend expects.
pub fn serialize_decimal<S>(money: &Money, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(money.0 as f64 / 100.0)
}

// =============================================================================
// Trait Implementations
// =============================================================================
// Operators saturate instead of panicking. Code that must not print a
// clamped amount (tickets) goes through `checked_mul` / `checked_add`.

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_decimal_string() {
        assert_eq!(Money::from_cents(6500).to_decimal_string(), "65.00");
        assert_eq!(Money::from_cents(5).to_decimal_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_decimal_string(), "-5.50");
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("25").unwrap().cents(), 2500);
        assert_eq!(Money::parse_decimal("15.5").unwrap().cents(), 1550);
        assert_eq!(Money::parse_decimal("12.30").unwrap().cents(), 1230);
        assert_eq!(Money::parse_decimal(".75").unwrap().cents(), 75);
        assert_eq!(Money::parse_decimal("-3.75").unwrap().cents(), -375);
        assert_eq!(Money::parse_decimal("1.005").unwrap().cents(), 101);
        assert_eq!(Money::parse_decimal("1.004").unwrap().cents(), 100);

        assert!(Money::parse_decimal("").is_err());
        assert!(Money::parse_decimal("abc").is_err());
        assert!(Money::parse_decimal("1.2.3").is_err());
    }

    #[test]
    fn test_deserialize_backend_shapes() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(deserialize_with = "deserialize_decimal")]
            price: Money,
        }

        let int: Row = serde_json::from_str(r#"{"price": 25}"#).unwrap();
        let float: Row = serde_json::from_str(r#"{"price": 15.5}"#).unwrap();
        let text: Row = serde_json::from_str(r#"{"price": "12.30"}"#).unwrap();

        assert_eq!(int.price.cents(), 2500);
        assert_eq!(float.price.cents(), 1550);
        assert_eq!(text.price.cents(), 1230);
    }

    #[test]
    fn test_float_noise_does_not_leak_into_cents() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(deserialize_with = "deserialize_decimal")]
            price: Money,
        }

        // 0.1 + 0.2 as computed by a JavaScript backend
        let row: Row = serde_json::from_str(r#"{"price": 0.30000000000000004}"#).unwrap();
        assert_eq!(row.price.cents(), 30);
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_cents(5000), Money::from_cents(1500)]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), 6500);
    }

    #[test]
    fn test_checked_arithmetic() {
        let big = Money::from_cents(i64::MAX / 2 + 1);

        assert_eq!(Money::from_cents(2500).checked_mul(2), Some(Money::from_cents(5000)));
        assert_eq!(big.checked_mul(2), None);
        assert_eq!(big.checked_add(big), None);
        assert_eq!(
            Money::from_cents(5000).checked_add(Money::from_cents(1500)),
            Some(Money::from_cents(6500))
        );
    }

    #[test]
    fn test_operators_saturate() {
        let big = Money::from_cents(i64::MAX);
        assert_eq!((big * 3).cents(), i64::MAX);
        assert_eq!((big + Money::from_cents(1)).cents(), i64::MAX);
        assert_eq!(big.multiply_quantity(2).cents(), i64::MAX);
    }
}
