use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error returned when a decimal amount cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount")]
    Invalid,
    #[error("too many decimals")]
    TooManyDecimals,
    #[error("amount too large")]
    Overflow,
}

/// Signed decimal amount with two fraction digits, stored as **integer cents**.
///
/// The backend exchanges amounts as decimal strings (`"1250.00"`); older
/// endpoints may send plain JSON numbers, both are accepted on input.
///
/// # Examples
///
/// ```rust
/// use api_types::Amount;
///
/// assert_eq!("10".parse::<Amount>().unwrap().cents(), 1000);
/// assert_eq!("10,5".parse::<Amount>().unwrap().cents(), 1050);
/// assert_eq!(Amount::new(-1050).to_string(), "-10.50");
/// assert!("12.345".parse::<Amount>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Amount(i64);

impl Amount {
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parses a decimal string into cents.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`;
    /// rejects more than two fraction digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }

        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let rest = rest.trim().replace(',', ".");
        if rest.is_empty() {
            return Err(AmountError::Empty);
        }

        let mut parts = rest.split('.');
        let units_str = parts.next().ok_or(AmountError::Invalid)?;
        let frac_str = parts.next();
        if parts.next().is_some() {
            return Err(AmountError::Invalid);
        }
        if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(AmountError::Invalid);
        }

        let units: i64 = units_str.parse().map_err(|_| AmountError::Overflow)?;
        let cents: i64 = match frac_str {
            None | Some("") => 0,
            Some(frac) if !frac.chars().all(|c| c.is_ascii_digit()) => {
                return Err(AmountError::Invalid);
            }
            Some(frac) if frac.len() == 1 => frac.parse::<i64>().map_err(|_| AmountError::Invalid)? * 10,
            Some(frac) if frac.len() == 2 => frac.parse::<i64>().map_err(|_| AmountError::Invalid)?,
            Some(_) => return Err(AmountError::TooManyDecimals),
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or(AmountError::Overflow)?;
        Ok(Amount(if negative { -total } else { total }))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Float(f64),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text,
            Raw::Int(units) => return Ok(Amount(units.saturating_mul(100))),
            Raw::Float(value) => format!("{value:.2}"),
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Amount::new(0).to_string(), "0.00");
        assert_eq!(Amount::new(5).to_string(), "0.05");
        assert_eq!(Amount::new(123_456).to_string(), "1234.56");
        assert_eq!(Amount::new(-500).to_string(), "-5.00");
    }

    #[test]
    fn parse_accepts_dot_comma_and_sign() {
        assert_eq!("-5".parse::<Amount>().unwrap().cents(), -500);
        assert_eq!("+1.5".parse::<Amount>().unwrap().cents(), 150);
        assert_eq!(" 2,30 ".parse::<Amount>().unwrap().cents(), 230);
        assert_eq!("7.".parse::<Amount>().unwrap().cents(), 700);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!("".parse::<Amount>(), Err(AmountError::Empty));
        assert_eq!("-".parse::<Amount>(), Err(AmountError::Empty));
        assert_eq!("1.2.3".parse::<Amount>(), Err(AmountError::Invalid));
        assert_eq!("abc".parse::<Amount>(), Err(AmountError::Invalid));
        assert_eq!("1.234".parse::<Amount>(), Err(AmountError::TooManyDecimals));
    }

    #[test]
    fn deserializes_strings_and_numbers() {
        let from_str: Amount = serde_json::from_str("\"1250.00\"").unwrap();
        let from_int: Amount = serde_json::from_str("12").unwrap();
        let from_float: Amount = serde_json::from_str("3.5").unwrap();
        assert_eq!(from_str.cents(), 125_000);
        assert_eq!(from_int.cents(), 1200);
        assert_eq!(from_float.cents(), 350);
        assert_eq!(serde_json::to_string(&from_float).unwrap(), "\"3.50\"");
    }
}
