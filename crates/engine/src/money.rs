use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::EngineError;

const CENTS_PER_UNIT: i64 = 100;
const THOUSAND_CENTS: i64 = 1_000 * CENTS_PER_UNIT;
const MILLION_CENTS: i64 = 1_000_000 * CENTS_PER_UNIT;

/// Signed money amount represented as **integer cents**.
///
/// Use this type for **all** monetary values (balances, transfer and request
/// amounts) to avoid floating-point drift. Documents store plain currency
/// units: whole amounts as integers, anything else as a number with up to two
/// decimals (`1500`, `12.5`).
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "$12.34");
/// ```
///
/// Parsing from user input accepts `.` or `,` as decimal separator and the
/// `K`/`M` shorthands used at the table:
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().cents(), 1000);
/// assert_eq!("2.5M".parse::<Money>().unwrap(), Money::from_units(2_500_000));
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates a new amount from whole currency units.
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units * CENTS_PER_UNIT)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Short form used in player lists and the transaction log.
    ///
    /// Millions and thousands are abbreviated with at most two decimals
    /// (`15M`, `1.25M`, `1.5K`); smaller amounts keep their cents only when
    /// non-zero (`999`, `12.5`).
    #[must_use]
    pub fn compact(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let (hundredths, suffix) = if abs >= MILLION_CENTS.unsigned_abs() {
            (round_div(abs, (MILLION_CENTS / 100).unsigned_abs()), "M")
        } else if abs >= THOUSAND_CENTS.unsigned_abs() {
            (round_div(abs, (THOUSAND_CENTS / 100).unsigned_abs()), "K")
        } else {
            (abs, "")
        };
        let whole = hundredths / 100;
        let frac = hundredths % 100;
        let frac = match frac {
            0 => String::new(),
            f if f % 10 == 0 => format!(".{}", f / 10),
            f => format!(".{f:02}"),
        };
        format!("{sign}{whole}{frac}{suffix}")
    }
}

fn round_div(value: u64, divisor: u64) -> u64 {
    (value + divisor / 2) / divisor
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}${units}.{cents:02}")
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % CENTS_PER_UNIT == 0 {
            serializer.serialize_i64(self.0 / CENTS_PER_UNIT)
        } else {
            serializer.serialize_f64(self.0 as f64 / CENTS_PER_UNIT as f64)
        }
    }
}

struct UnitsVisitor;

impl de::Visitor<'_> for UnitsVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an amount in currency units")
    }

    fn visit_i64<E: de::Error>(self, units: i64) -> Result<Money, E> {
        units
            .checked_mul(CENTS_PER_UNIT)
            .map(Money)
            .ok_or_else(|| E::custom("amount too large"))
    }

    fn visit_u64<E: de::Error>(self, units: u64) -> Result<Money, E> {
        let units = i64::try_from(units).map_err(|_| E::custom("amount too large"))?;
        self.visit_i64(units)
    }

    fn visit_f64<E: de::Error>(self, units: f64) -> Result<Money, E> {
        let cents = (units * CENTS_PER_UNIT as f64).round();
        if !cents.is_finite() || cents.abs() >= i64::MAX as f64 {
            return Err(E::custom("amount out of range"));
        }
        Ok(Money(cents as i64))
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(UnitsVisitor)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string into cents.
    ///
    /// Accepts `.` or `,` as decimal separator, an optional leading `+`/`-`
    /// and an optional `K` (thousand) or `M` (million) suffix.
    ///
    /// Validation rules:
    /// - the result must be a whole number of cents (rejects `12.345`,
    ///   accepts `1.234K`)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (sign, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (-1i64, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (1i64, stripped)
        } else {
            (1i64, trimmed)
        };

        let rest = rest.trim();
        let (rest, scale) = match rest.chars().last() {
            Some('k' | 'K') => (&rest[..rest.len() - 1], THOUSAND_CENTS),
            Some('m' | 'M') => (&rest[..rest.len() - 1], MILLION_CENTS),
            _ => (rest, CENTS_PER_UNIT),
        };
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let whole_str = parts.next().ok_or_else(invalid)?;
        let frac_str = parts.next().unwrap_or("");

        if parts.next().is_some() {
            return Err(invalid());
        }

        if whole_str.is_empty() || !whole_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = whole_str.parse().map_err(|_| overflow())?;
        let whole_cents = whole.checked_mul(scale).ok_or_else(overflow)?;

        let frac_cents = if frac_str.is_empty() {
            0
        } else {
            let digits = u32::try_from(frac_str.len()).map_err(|_| invalid())?;
            let denominator = 10i64.checked_pow(digits).ok_or_else(|| {
                EngineError::InvalidAmount("too many decimals".to_string())
            })?;
            let frac: i64 = frac_str.parse().map_err(|_| invalid())?;
            let scaled = frac.checked_mul(scale).ok_or_else(overflow)?;
            if scaled % denominator != 0 {
                return Err(EngineError::InvalidAmount("too many decimals".to_string()));
            }
            scaled / denominator
        };

        let total = whole_cents.checked_add(frac_cents).ok_or_else(overflow)?;
        let signed = if sign < 0 {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money(signed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_hold_currency_units() {
        assert_eq!(
            serde_json::to_value(Money::from_units(1500)).unwrap(),
            serde_json::json!(1500)
        );
        assert_eq!(serde_json::to_value(Money::new(1250)).unwrap(), serde_json::json!(12.5));

        let whole: Money = serde_json::from_value(serde_json::json!(15_000_000)).unwrap();
        assert_eq!(whole, Money::from_units(15_000_000));
        let fractional: Money = serde_json::from_value(serde_json::json!(0.29)).unwrap();
        assert_eq!(fractional.cents(), 29);
        assert!(serde_json::from_value::<Money>(serde_json::json!("12")).is_err());
    }

    #[test]
    fn display_formats_dollars() {
        assert_eq!(Money::new(0).to_string(), "$0.00");
        assert_eq!(Money::new(1).to_string(), "$0.01");
        assert_eq!(Money::new(1050).to_string(), "$10.50");
        assert_eq!(Money::new(-1050).to_string(), "-$10.50");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<Money>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().cents(), 1050);
        assert_eq!("10,50".parse::<Money>().unwrap().cents(), 1050);
        assert_eq!("-0.01".parse::<Money>().unwrap().cents(), -1);
        assert_eq!("+1.00".parse::<Money>().unwrap().cents(), 100);
        assert_eq!("  2.30 ".parse::<Money>().unwrap().cents(), 230);
    }

    #[test]
    fn parse_understands_table_shorthands() {
        assert_eq!("15M".parse::<Money>().unwrap(), Money::from_units(15_000_000));
        assert_eq!("2.5m".parse::<Money>().unwrap(), Money::from_units(2_500_000));
        assert_eq!("200k".parse::<Money>().unwrap(), Money::from_units(200_000));
        assert_eq!("1.23456K".parse::<Money>().unwrap().cents(), 123_456);
    }

    #[test]
    fn parse_rejects_fractions_of_a_cent() {
        assert!("12.345".parse::<Money>().is_err());
        assert!("0.001".parse::<Money>().is_err());
        assert!("1.234567K".parse::<Money>().is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Money>().is_err());
        assert!("M".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("ten".parse::<Money>().is_err());
        assert!("99999999999999999999".parse::<Money>().is_err());
    }

    #[test]
    fn compact_abbreviates_large_amounts() {
        assert_eq!(Money::from_units(15_000_000).compact(), "15M");
        assert_eq!(Money::from_units(1_250_000).compact(), "1.25M");
        assert_eq!(Money::from_units(1_002_000_000).compact(), "1002M");
        assert_eq!(Money::from_units(1_500).compact(), "1.5K");
        assert_eq!(Money::from_units(999).compact(), "999");
        assert_eq!(Money::new(1250).compact(), "12.5");
        assert_eq!(Money::from_units(-2_000_000).compact(), "-2M");
    }
}
