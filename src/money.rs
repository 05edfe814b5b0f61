// 💰 Money - exact currency amounts in centavos
//
// Amounts are kept as integer cents so apportionment can be reconciled to the
// exact centavo. Text input goes through rust_decimal and is rounded half-to-even.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("'{0}' is not a valid monetary amount")]
    Invalid(String),

    #[error("'{0}' is out of range")]
    OutOfRange(String),
}

/// Monetary amount in BRL cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "MoneyInput", into = "String")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn from_decimal(value: Decimal) -> Result<Self, MoneyError> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
        rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.trunc().to_i64())
            .map(Money)
            .ok_or_else(|| MoneyError::OutOfRange(value.to_string()))
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Brazilian display: `R$ 1.234,56`
    pub fn to_brl(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = (abs / 100).to_string();

        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, ch) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        format!("{}R$ {},{:02}", sign, grouped, abs % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Canonical `-1234.56` form of a typed amount.
///
/// The separator that appears last is the decimal one and the other groups
/// thousands, so `1.234,56` and `1,234.56` are the same amount. A separator
/// that appears once and alone is decimal (`1.234` is one real and 23.4
/// centavos); repeated alone it groups thousands (`1.000.000`). Groups must be
/// three digits.
fn normalize_amount(text: &str) -> Option<String> {
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest.trim_start()),
        None => ("", text),
    };

    let single_or_group = |sep: char| {
        if body.matches(sep).count() > 1 {
            (None, Some(sep))
        } else {
            (Some(sep), None)
        }
    };
    let (decimal, group) = match (body.rfind(','), body.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => (Some(','), Some('.')),
        (Some(_), Some(_)) => (Some('.'), Some(',')),
        (Some(_), None) => single_or_group(','),
        (None, Some(_)) => single_or_group('.'),
        (None, None) => (None, None),
    };

    let (integer, fraction) = match decimal {
        Some(sep) => body.rsplit_once(sep)?,
        None => (body, ""),
    };
    if decimal.is_some() && fraction.is_empty() {
        return None;
    }

    let integer = match group {
        Some(sep) => {
            let groups: Vec<&str> = integer.split(sep).collect();
            let well_formed = groups.iter().enumerate().all(|(i, g)| {
                if i == 0 {
                    (1..=3).contains(&g.len())
                } else {
                    g.len() == 3
                }
            });
            if !well_formed {
                return None;
            }
            groups.concat()
        }
        None => integer.to_string(),
    };

    let is_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if integer.is_empty() || !is_digits(&integer) || !is_digits(fraction) {
        return None;
    }

    if fraction.is_empty() {
        Some(format!("{}{}", sign, integer))
    } else {
        Some(format!("{}{}.{}", sign, integer, fraction))
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches("R$").trim();
        let normalized =
            normalize_amount(trimmed).ok_or_else(|| MoneyError::Invalid(s.to_string()))?;

        let value =
            Decimal::from_str(&normalized).map_err(|_| MoneyError::Invalid(s.to_string()))?;
        Money::from_decimal(value)
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}

/// JSON amounts are whole reais as integers, or text. Fractional numbers are
/// refused since they would pass through `f64`.
#[derive(Deserialize)]
#[serde(untagged)]
enum MoneyInput {
    Int(i64),
    Text(String),
}

impl TryFrom<MoneyInput> for Money {
    type Error = MoneyError;

    fn try_from(value: MoneyInput) -> Result<Self, Self::Error> {
        match value {
            MoneyInput::Int(units) => Money::from_decimal(Decimal::from(units)),
            MoneyInput::Text(text) => text.parse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_brazilian_forms() {
        assert_eq!("100.00".parse::<Money>().unwrap().cents(), 10_000);
        assert_eq!("100".parse::<Money>().unwrap().cents(), 10_000);
        assert_eq!("1234.5".parse::<Money>().unwrap().cents(), 123_450);
        assert_eq!("1.234,56".parse::<Money>().unwrap().cents(), 123_456);
        assert_eq!("R$ 10,00".parse::<Money>().unwrap().cents(), 1_000);
    }

    #[test]
    fn test_parse_rounds_half_to_even() {
        assert_eq!("0.125".parse::<Money>().unwrap().cents(), 12);
        assert_eq!("0.135".parse::<Money>().unwrap().cents(), 14);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!("abc".parse::<Money>(), Err(MoneyError::Invalid(_))));
        assert!(matches!("".parse::<Money>(), Err(MoneyError::Invalid(_))));
        assert!(matches!("12,34,56".parse::<Money>(), Err(MoneyError::Invalid(_))));
        assert!(matches!("1.23.45,00".parse::<Money>(), Err(MoneyError::Invalid(_))));
        assert!(matches!("10,".parse::<Money>(), Err(MoneyError::Invalid(_))));
        assert!(matches!("1e5".parse::<Money>(), Err(MoneyError::Invalid(_))));
    }

    #[test]
    fn test_last_separator_is_decimal() {
        assert_eq!("1,234.56".parse::<Money>().unwrap().cents(), 123_456);
        assert_eq!("1.234,56".parse::<Money>().unwrap().cents(), 123_456);
        assert_eq!("R$ 1.000.000,00".parse::<Money>().unwrap().cents(), 100_000_000);
        assert_eq!("1.000.000".parse::<Money>().unwrap().cents(), 100_000_000);
        assert_eq!("1,000,000".parse::<Money>().unwrap().cents(), 100_000_000);
        assert_eq!("-1.234,50".parse::<Money>().unwrap().cents(), -123_450);
    }

    #[test]
    fn test_lone_separator_is_decimal() {
        // 1.234 rounds half-to-even to 1.23
        assert_eq!("1.234".parse::<Money>().unwrap().cents(), 123);
        assert_eq!("1,234".parse::<Money>().unwrap().cents(), 123);
        assert_eq!("0,5".parse::<Money>().unwrap().cents(), 50);
    }

    #[test]
    fn test_huge_amounts_are_out_of_range() {
        assert!(matches!(
            "100000000000000000000".parse::<Money>(),
            Err(MoneyError::OutOfRange(_))
        ));
        assert!(matches!(
            "79228162514264337593543950335".parse::<Money>(),
            Err(MoneyError::OutOfRange(_))
        ));
        assert!(serde_json::from_str::<Money>("\"1000000000000000000000000000\"").is_err());
        assert!(serde_json::from_str::<Money>("9223372036854775807").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(3_334).to_string(), "33.34");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::from_cents(123_456_789).to_brl(), "R$ 1.234.567,89");
        assert_eq!(Money::from_cents(99).to_brl(), "R$ 0,99");
    }

    #[test]
    fn test_serde_accepts_text_and_whole_numbers() {
        let from_text: Money = serde_json::from_str("\"10.50\"").unwrap();
        let from_int: Money = serde_json::from_str("7").unwrap();

        assert_eq!(from_text.cents(), 1_050);
        assert_eq!(from_int.cents(), 700);
        assert_eq!(serde_json::to_string(&from_text).unwrap(), "\"10.50\"");

        // 0.1 + 0.2 style values never reach the decimal parser
        assert!(serde_json::from_str::<Money>("10.5").is_err());
    }
}
