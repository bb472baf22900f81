//! Fixed-point income amount
//!
//! Stored as a signed count of hundredths in an `i128`, which is also the
//! 16-byte on-disk representation. Text form is `[-]units[.cc]`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Income amount with two fractional digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Income(i128);

/// Error returned when income text cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid income '{input}': {reason}")]
pub struct ParseIncomeError {
    input: String,
    reason: &'static str,
}

impl ParseIncomeError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

impl Income {
    /// Hundredths per unit
    pub const SCALE: i128 = 100;

    /// Build from a raw hundredths count
    pub const fn from_hundredths(hundredths: i128) -> Self {
        Self(hundredths)
    }

    /// Build from whole units
    pub const fn from_units(units: i64) -> Self {
        Self(units as i128 * Self::SCALE)
    }

    /// Raw hundredths count
    pub const fn hundredths(&self) -> i128 {
        self.0
    }
}

impl fmt::Display for Income {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = Self::SCALE as u128;
        write!(f, "{}{}.{:02}", sign, abs / scale, abs % scale)
    }
}

impl FromStr for Income {
    type Err = ParseIncomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (units_text, fraction_text) = match body.split_once('.') {
            Some((units, fraction)) => (units, fraction),
            None => (body, ""),
        };

        if units_text.is_empty() {
            return Err(ParseIncomeError::new(s, "missing integer part"));
        }
        if !units_text.bytes().all(|b| b.is_ascii_digit())
            || !fraction_text.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ParseIncomeError::new(s, "expected decimal digits"));
        }
        if fraction_text.len() > 2 {
            return Err(ParseIncomeError::new(s, "at most two decimal places"));
        }

        let units: i128 = units_text
            .parse()
            .map_err(|_| ParseIncomeError::new(s, "amount out of range"))?;
        let mut fraction: i128 = if fraction_text.is_empty() {
            0
        } else {
            fraction_text
                .parse()
                .map_err(|_| ParseIncomeError::new(s, "expected decimal digits"))?
        };
        if fraction_text.len() == 1 {
            fraction *= 10;
        }

        let magnitude = units
            .checked_mul(Self::SCALE)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(|| ParseIncomeError::new(s, "amount out of range"))?;

        Ok(Self(if negative { -magnitude } else { magnitude }))
    }
}

impl Serialize for Income {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Income {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!("1500".parse::<Income>().unwrap(), Income::from_units(1500));
        assert_eq!("1500.5".parse::<Income>().unwrap().hundredths(), 150_050);
        assert_eq!("0.07".parse::<Income>().unwrap().hundredths(), 7);
        assert_eq!("-12.30".parse::<Income>().unwrap().hundredths(), -1230);
        assert_eq!(" 42 ".parse::<Income>().unwrap().hundredths(), 4200);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Income>().is_err());
        assert!(".5".parse::<Income>().is_err());
        assert!("12.345".parse::<Income>().is_err());
        assert!("1e5".parse::<Income>().is_err());
        assert!("12,50".parse::<Income>().is_err());
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Income::from_hundredths(150_050).to_string(), "1500.50");
        assert_eq!(Income::from_hundredths(-5).to_string(), "-0.05");
        assert_eq!(Income::default().to_string(), "0.00");
    }

    #[test]
    fn test_display_parses_back() {
        let income = Income::from_hundredths(-987_654_321);
        assert_eq!(income.to_string().parse::<Income>().unwrap(), income);
    }
}
