/// Fixed-point monetary amounts
///
/// Balances, task pay and withdrawal payouts are all kept in hundredths so
/// that repeated cent-level arithmetic never drifts. On the wire they are
/// plain JSON numbers (`50`, `12.5`), which is what the remote service stores.
///
/// # Example
///
/// ```
/// use taskhub_shared::money::{Coins, Usd};
///
/// let pay: Coins = "2.50".parse().unwrap();
/// assert_eq!(pay.cents(), 250);
/// assert_eq!(pay.to_string(), "2.50");
///
/// let payout = Usd::from_cents(1000);
/// assert_eq!(payout.to_string(), "$10.00");
/// ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Hundredths per whole unit
pub const CENTS_PER_UNIT: i64 = 100;

/// Error returned when parsing an amount from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseAmountError {
    /// Input was empty
    #[error("amount is empty")]
    Empty,

    /// Input was not a decimal number
    #[error("invalid amount: {0}")]
    Invalid(String),

    /// More than two fractional digits
    #[error("amount has more than two decimal places: {0}")]
    TooPrecise(String),
}

macro_rules! fixed_point_amount {
    ($name:ident) => {
        impl $name {
            pub const ZERO: Self = Self(0);

            /// Creates an amount from hundredths
            pub const fn from_cents(cents: i64) -> Self {
                Self(cents)
            }

            /// Creates an amount from whole units
            pub const fn whole(units: i64) -> Self {
                Self(units * CENTS_PER_UNIT)
            }

            /// Converts a float, rounding to the nearest hundredth.
            ///
            /// Returns `None` for NaN, infinities and values outside the
            /// range of hundredths an `i64` can hold.
            pub fn from_f64(value: f64) -> Option<Self> {
                // 2^63, the first float past i64::MAX
                const LIMIT: f64 = 9_223_372_036_854_775_808.0;
                let scaled = (value * CENTS_PER_UNIT as f64).round();
                if !scaled.is_finite() || scaled >= LIMIT || scaled < -LIMIT {
                    return None;
                }
                Some(Self(scaled as i64))
            }

            pub const fn cents(&self) -> i64 {
                self.0
            }

            pub fn to_f64(&self) -> f64 {
                self.0 as f64 / CENTS_PER_UNIT as f64
            }

            pub const fn is_zero(&self) -> bool {
                self.0 == 0
            }

            pub const fn is_negative(&self) -> bool {
                self.0 < 0
            }

            pub fn checked_add(&self, other: Self) -> Option<Self> {
                self.0.checked_add(other.0).map(Self)
            }

            pub fn checked_sub(&self, other: Self) -> Option<Self> {
                self.0.checked_sub(other.0).map(Self)
            }

            pub fn saturating_add(&self, other: Self) -> Self {
                Self(self.0.saturating_add(other.0))
            }

            pub fn saturating_sub(&self, other: Self) -> Self {
                Self(self.0.saturating_sub(other.0))
            }

            /// Writes the amount with exactly two decimals, no unit
            fn write_decimal(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let sign = if self.0 < 0 { "-" } else { "" };
                let abs = self.0.unsigned_abs();
                let unit = CENTS_PER_UNIT as u64;
                write!(f, "{}{}.{:02}", sign, abs / unit, abs % unit)
            }
        }

        impl FromStr for $name {
            type Err = ParseAmountError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_cents(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                if self.0 % CENTS_PER_UNIT == 0 {
                    serializer.serialize_i64(self.0 / CENTS_PER_UNIT)
                } else {
                    serializer.serialize_f64(self.to_f64())
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = f64::deserialize(deserializer)?;
                Self::from_f64(value)
                    .ok_or_else(|| serde::de::Error::custom("amount must be a finite number in range"))
            }
        }
    };
}

/// Platform balance unit
///
/// Balances, task pay and purchased packages are all denominated in coins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Coins(i64);

fixed_point_amount!(Coins);

impl Coins {
    /// Multiplies by a worker count, `None` on overflow
    pub fn checked_mul(&self, factor: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(factor)).map(Self)
    }

    /// Whole coins, truncating any fraction
    pub const fn whole_coins(&self) -> i64 {
        self.0 / CENTS_PER_UNIT
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_decimal(f)
    }
}

/// US dollar amount (payment provider side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Usd(i64);

fixed_point_amount!(Usd);

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        self.write_decimal(f)
    }
}

fn parse_cents(input: &str) -> Result<i64, ParseAmountError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };

    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(ParseAmountError::Invalid(input.to_string()));
    }
    if fraction.len() > 2 {
        return Err(ParseAmountError::TooPrecise(input.to_string()));
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| ParseAmountError::Invalid(input.to_string()))?
    };
    let fraction_value: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().unwrap_or(0) * 10,
        _ => fraction.parse::<i64>().unwrap_or(0),
    };

    let cents = whole_value
        .checked_mul(CENTS_PER_UNIT)
        .and_then(|c| c.checked_add(fraction_value))
        .ok_or_else(|| ParseAmountError::Invalid(input.to_string()))?;

    Ok(if negative { -cents } else { cents })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amounts() {
        assert_eq!("12".parse::<Coins>().unwrap(), Coins::whole(12));
        assert_eq!("12.5".parse::<Coins>().unwrap(), Coins::from_cents(1250));
        assert_eq!("0.05".parse::<Coins>().unwrap(), Coins::from_cents(5));
        assert_eq!(".5".parse::<Coins>().unwrap(), Coins::from_cents(50));
        assert_eq!("-3.10".parse::<Coins>().unwrap(), Coins::from_cents(-310));

        assert_eq!("".parse::<Coins>(), Err(ParseAmountError::Empty));
        assert!(matches!("abc".parse::<Coins>(), Err(ParseAmountError::Invalid(_))));
        assert!(matches!(".".parse::<Coins>(), Err(ParseAmountError::Invalid(_))));
        assert!(matches!(
            "1.234".parse::<Coins>(),
            Err(ParseAmountError::TooPrecise(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Coins::whole(50).to_string(), "50.00");
        assert_eq!(Coins::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Usd::from_cents(1550).to_string(), "$15.50");
    }

    #[test]
    fn test_from_f64_rounds_to_cents() {
        assert_eq!(Coins::from_f64(0.1 + 0.2), Some(Coins::from_cents(30)));
        assert_eq!(Coins::from_f64(f64::NAN), None);
        assert_eq!(Coins::from_f64(f64::INFINITY), None);
        assert_eq!(Coins::from_f64(1e17), None);
        assert_eq!(Coins::from_f64(-1e17), None);
        assert_eq!(Coins::from_f64(9e16), Some(Coins::from_cents(9_000_000_000_000_000_000)));
    }

    #[test]
    fn test_serde_uses_plain_numbers() {
        assert_eq!(serde_json::to_string(&Coins::whole(50)).unwrap(), "50");
        assert_eq!(serde_json::to_string(&Coins::from_cents(1250)).unwrap(), "12.5");

        let parsed: Coins = serde_json::from_str("30").unwrap();
        assert_eq!(parsed, Coins::whole(30));
        let parsed: Usd = serde_json::from_str("17.5").unwrap();
        assert_eq!(parsed, Usd::from_cents(1750));

        assert!(serde_json::from_str::<Coins>("\"ten\"").is_err());
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(Coins::whole(5).checked_mul(4), Some(Coins::whole(20)));
        assert_eq!(Coins::from_cents(i64::MAX).checked_mul(2), None);
        assert_eq!(Coins::whole(1).checked_sub(Coins::whole(2)), Some(Coins::whole(-1)));
        assert_eq!(Coins::from_cents(i64::MAX).saturating_add(Coins::whole(1)).cents(), i64::MAX);
    }
}
