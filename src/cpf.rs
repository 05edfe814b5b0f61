// 🪪 CPF - Brazilian individual taxpayer number
//
// Stored normalized as 11 digits; the last two are mod-11 check digits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpfError {
    #[error("CPF must have 11 digits, got {0}")]
    Length(usize),

    #[error("CPF contains invalid characters")]
    Characters,

    #[error("CPF with all digits equal is not valid")]
    Repeated,

    #[error("CPF check digits do not match")]
    CheckDigits,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cpf(String);

impl Cpf {
    pub fn parse(raw: &str) -> Result<Self, CpfError> {
        let mut digits = Vec::with_capacity(11);
        for ch in raw.trim().chars() {
            match ch {
                '0'..='9' => digits.push(ch as u8 - b'0'),
                '.' | '-' | ' ' => {}
                _ => return Err(CpfError::Characters),
            }
        }

        if digits.len() != 11 {
            return Err(CpfError::Length(digits.len()));
        }

        if digits.iter().all(|d| *d == digits[0]) {
            return Err(CpfError::Repeated);
        }

        if check_digit(&digits[..9]) != digits[9] || check_digit(&digits[..10]) != digits[10] {
            return Err(CpfError::CheckDigits);
        }

        Ok(Cpf(digits.iter().map(|d| (b'0' + d) as char).collect()))
    }

    /// Bare 11 digits, as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `XXX.XXX.XXX-XX`
    pub fn formatted(&self) -> String {
        format!(
            "{}.{}.{}-{}",
            &self.0[0..3],
            &self.0[3..6],
            &self.0[6..9],
            &self.0[9..11]
        )
    }
}

fn check_digit(digits: &[u8]) -> u8 {
    let weight_start = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| *d as u32 * (weight_start - i as u32))
        .sum();

    let rest = (sum * 10) % 11;
    if rest == 10 {
        0
    } else {
        rest as u8
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl FromStr for Cpf {
    type Err = CpfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cpf::parse(s)
    }
}

impl TryFrom<String> for Cpf {
    type Error = CpfError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Cpf::parse(&value)
    }
}

impl From<Cpf> for String {
    fn from(value: Cpf) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_cpf_in_both_forms() {
        let bare = Cpf::parse("52998224725").unwrap();
        let punctuated = Cpf::parse("529.982.247-25").unwrap();

        assert_eq!(bare, punctuated);
        assert_eq!(bare.as_str(), "52998224725");
        assert_eq!(bare.formatted(), "529.982.247-25");
    }

    #[test]
    fn test_check_digit_rest_ten_maps_to_zero() {
        assert!(Cpf::parse("111.444.777-35").is_ok());
        assert!(Cpf::parse("123.456.789-09").is_ok());
    }

    #[test]
    fn test_rejects_wrong_check_digits() {
        assert_eq!(Cpf::parse("529.982.247-26"), Err(CpfError::CheckDigits));
        assert_eq!(Cpf::parse("12345678900"), Err(CpfError::CheckDigits));
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert_eq!(Cpf::parse("5299822472"), Err(CpfError::Length(10)));
        assert_eq!(Cpf::parse("529982247a5"), Err(CpfError::Characters));
        assert_eq!(Cpf::parse("111.111.111-11"), Err(CpfError::Repeated));
        assert_eq!(Cpf::parse(""), Err(CpfError::Length(0)));
    }

    #[test]
    fn test_serde_normalizes() {
        let cpf: Cpf = serde_json::from_str("\"529.982.247-25\"").unwrap();
        assert_eq!(serde_json::to_string(&cpf).unwrap(), "\"52998224725\"");
        assert!(serde_json::from_str::<Cpf>("\"000\"").is_err());
    }
}
