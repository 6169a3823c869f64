//! Whole-rupiah money amounts.
//!
//! All shop prices are whole Indonesian Rupiah, so amounts are plain `i64`
//! values with no fractional unit. Inbound prices from the catalog may arrive
//! as JSON numbers with decimals or as strings; those are rounded to the
//! nearest rupiah with `rust_decimal` so float noise never leaks into totals.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign};
use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};

/// An amount in whole Indonesian Rupiah.
///
/// Deserialization is lenient: numbers, numeric strings, `null` and garbage
/// all produce a value, with anything unusable or negative becoming zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Rupiah(i64);

impl Rupiah {
    /// Zero rupiah.
    pub const ZERO: Self = Self(0);

    /// Create an amount. Negative inputs clamp to zero.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        if amount < 0 { Self(0) } else { Self(amount) }
    }

    /// Get the underlying amount.
    #[must_use]
    pub const fn amount(self) -> i64 {
        self.0
    }

    /// Returns `true` for zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Difference clamped at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self::new(self.0.saturating_sub(other.0))
    }

    /// Parse a loosely-typed JSON price.
    ///
    /// Returns `None` when the value is missing, non-numeric or negative.
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let decimal = match value {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Decimal::from(i)
                } else {
                    Decimal::try_from(n.as_f64()?).ok()?
                }
            }
            serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok()?,
            _ => return None,
        };

        if decimal.is_sign_negative() {
            return None;
        }

        decimal
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
    }
}

impl fmt::Display for Rupiah {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Rupiah {
    fn from(amount: i64) -> Self {
        Self::new(amount)
    }
}

impl Add for Rupiah {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Rupiah {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'de> Deserialize<'de> for Rupiah {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value).unwrap_or_default())
    }
}

/// Format an amount for display, e.g. `Rp 54.000`.
///
/// Uses Indonesian digit grouping (`.` as thousands separator) and no decimal
/// places. Non-positive amounts render as an empty string so a missing price
/// never shows up as a bogus number.
///
/// ```rust
/// use alcary_core::{Rupiah, format_rupiah};
///
/// assert_eq!(format_rupiah(Rupiah::new(1_250_000)), "Rp 1.250.000");
/// assert_eq!(format_rupiah(Rupiah::ZERO), "");
/// ```
#[must_use]
pub fn format_rupiah(amount: Rupiah) -> String {
    if amount.0 <= 0 {
        return String::new();
    }
    format!("Rp {}", group_thousands(amount.0.unsigned_abs()))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_groups_thousands() {
        assert_eq!(format_rupiah(Rupiah::new(8_000)), "Rp 8.000");
        assert_eq!(format_rupiah(Rupiah::new(54_000)), "Rp 54.000");
        assert_eq!(format_rupiah(Rupiah::new(999)), "Rp 999");
        assert_eq!(format_rupiah(Rupiah::new(100_000)), "Rp 100.000");
    }

    #[test]
    fn test_format_non_positive_is_empty() {
        assert_eq!(format_rupiah(Rupiah::ZERO), "");
        assert_eq!(format_rupiah(Rupiah::new(-5)), "");
    }

    #[test]
    fn test_from_value_rounds_decimals() {
        assert_eq!(Rupiah::from_value(&json!(27000.4)), Some(Rupiah::new(27000)));
        assert_eq!(Rupiah::from_value(&json!(27000.5)), Some(Rupiah::new(27001)));
        assert_eq!(Rupiah::from_value(&json!("15000")), Some(Rupiah::new(15000)));
    }

    #[test]
    fn test_from_value_rejects_garbage() {
        assert_eq!(Rupiah::from_value(&json!("abc")), None);
        assert_eq!(Rupiah::from_value(&json!(null)), None);
        assert_eq!(Rupiah::from_value(&json!(-100)), None);
    }

    #[test]
    fn test_deserialize_is_lenient() {
        let price: Rupiah = serde_json::from_str("null").unwrap();
        assert_eq!(price, Rupiah::ZERO);
        let price: Rupiah = serde_json::from_str("\"oops\"").unwrap();
        assert_eq!(price, Rupiah::ZERO);
        let price: Rupiah = serde_json::from_str("12000").unwrap();
        assert_eq!(price, Rupiah::new(12000));
    }

    #[test]
    fn test_times_and_sum() {
        let total: Rupiah = [Rupiah::new(27000).times(2), Rupiah::new(8000)]
            .into_iter()
            .sum();
        assert_eq!(total, Rupiah::new(62000));
    }
}
