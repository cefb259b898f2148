use std::{fmt, ops::Deref, str::FromStr};

use common_utils::{PeekInterface, Secret, Strategy, WithType};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Deserialize, Serialize, Error)]
#[error("not a valid credit card number")]
pub struct CCValError;

/// Card number
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CardNumber(Secret<String, CardNumberStrategy>);

impl CardNumber {
    /// First six digits, enough to identify the issuing network
    pub fn get_card_isin(&self) -> String {
        self.0.peek().chars().take(6).collect::<String>()
    }

    pub fn get_card_no(&self) -> String {
        self.0.peek().clone()
    }

    pub fn get_last4(&self) -> String {
        let number = self.0.peek();
        number
            .get(number.len().saturating_sub(4)..)
            .unwrap_or_default()
            .to_string()
    }
}

fn luhn_valid(number: &str) -> bool {
    let digits = number
        .chars()
        .rev()
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<u32>>>();

    match digits {
        Some(digits) if digits.len() >= 8 => {
            let checksum: u32 = digits
                .iter()
                .enumerate()
                .map(|(index, digit)| {
                    if index % 2 == 1 {
                        let doubled = digit * 2;
                        if doubled > 9 {
                            doubled - 9
                        } else {
                            doubled
                        }
                    } else {
                        *digit
                    }
                })
                .sum();
            checksum % 10 == 0
        }
        _ => false,
    }
}

impl FromStr for CardNumber {
    type Err = CCValError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cc_no_whitespace: String = s.split_whitespace().collect();
        if luhn_valid(&cc_no_whitespace) {
            Ok(Self(Secret::new(cc_no_whitespace)))
        } else {
            Err(CCValError)
        }
    }
}

impl TryFrom<String> for CardNumber {
    type Error = CCValError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl Deref for CardNumber {
    type Target = Secret<String, CardNumberStrategy>;

    fn deref(&self) -> &Secret<String, CardNumberStrategy> {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CardNumber {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

pub enum CardNumberStrategy {}

impl<T> Strategy<T> for CardNumberStrategy
where
    T: AsRef<str>,
{
    fn fmt(val: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let val_str: &str = val.as_ref();

        if val_str.len() < 15 || val_str.len() > 19 {
            return WithType::fmt(val, f);
        }

        match val_str.get(..6) {
            Some(value) => write!(f, "{}{}", value, "*".repeat(val_str.len() - 6)),
            None => WithType::fmt(val, f),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn valid_card_number() {
        let s = "371449635398431";
        assert_eq!(CardNumber::from_str(s).unwrap().get_card_no(), s);
    }

    #[test]
    fn invalid_card_number() {
        let s = "371446431";
        assert_eq!(
            CardNumber::from_str(s).unwrap_err().to_string(),
            "not a valid credit card number".to_string()
        );
    }

    #[test]
    fn card_number_no_whitespace() {
        let card_number = CardNumber::from_str("4929 0000 0000 6").unwrap();
        assert_eq!(card_number.get_card_no(), "4929000000006");
        assert_eq!(card_number.get_last4(), "0006");
        assert_eq!(card_number.get_card_isin(), "492900");
    }

    #[test]
    fn test_valid_card_number_masking() {
        let card_number = CardNumber::from_str("3714 4963 5398 431").unwrap();
        let secret = &(*card_number);
        assert_eq!("371449*********", format!("{secret:?}"));
    }

    #[test]
    fn test_invalid_card_number_deserialization() {
        let card_number = serde_json::from_str::<CardNumber>(r#""1234 5678""#);
        let error_msg = card_number.unwrap_err().to_string();
        assert_eq!(error_msg, "not a valid credit card number".to_string());
    }
}
