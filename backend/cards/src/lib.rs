pub mod validate;

use common_utils::{errors, PeekInterface, Secret};
use error_stack::report;
pub use validate::{CCValError, CardNumber, CardNumberStrategy};

/// Expiry month, always rendered with two digits
#[derive(Clone, Debug)]
pub struct CardExpirationMonth(Secret<u8>);

impl CardExpirationMonth {
    pub fn new(secret: Secret<u8>) -> errors::CustomResult<Self, errors::ValidationError> {
        let month = secret.peek();

        if (1..=12).contains(month) {
            Ok(Self(secret))
        } else {
            Err(report!(errors::ValidationError::InvalidValue {
                message: "invalid card expiration month".to_string()
            }))
        }
    }

    pub fn two_digits(&self) -> String {
        format!("{:02}", self.0.peek())
    }
}

impl TryFrom<&str> for CardExpirationMonth {
    type Error = error_stack::Report<errors::ValidationError>;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let month = value.trim().parse::<u8>().map_err(|_| {
            report!(errors::ValidationError::InvalidValue {
                message: "card expiration month is not a number".to_string()
            })
        })?;
        Self::new(Secret::new(month))
    }
}

/// Expiry year; accepts both `YY` and `YYYY` input
#[derive(Clone, Debug)]
pub struct CardExpirationYear(Secret<u16>);

impl CardExpirationYear {
    pub fn new(secret: Secret<u16>) -> errors::CustomResult<Self, errors::ValidationError> {
        let year = *secret.peek();

        match year {
            0..=99 => Ok(Self(Secret::new(2000 + year))),
            1997..=9999 => Ok(Self(secret)),
            _ => Err(report!(errors::ValidationError::InvalidValue {
                message: "invalid card expiration year".to_string()
            })),
        }
    }

    pub fn four_digits(&self) -> String {
        self.0.peek().to_string()
    }

    pub fn two_digits(&self) -> String {
        format!("{:02}", self.0.peek() % 100)
    }
}

impl TryFrom<&str> for CardExpirationYear {
    type Error = error_stack::Report<errors::ValidationError>;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let year = value.trim().parse::<u16>().map_err(|_| {
            report!(errors::ValidationError::InvalidValue {
                message: "card expiration year is not a number".to_string()
            })
        })?;
        Self::new(Secret::new(year))
    }
}

#[derive(Clone, Debug)]
pub struct CardExpiration {
    pub month: CardExpirationMonth,
    pub year: CardExpirationYear,
}

impl CardExpiration {
    pub fn new(
        month: &str,
        year: &str,
    ) -> errors::CustomResult<Self, errors::ValidationError> {
        Ok(Self {
            month: CardExpirationMonth::try_from(month)?,
            year: CardExpirationYear::try_from(year)?,
        })
    }

    /// `MMYY`, the form most gateways accept on the wire
    pub fn to_mmyy(&self) -> Secret<String> {
        Secret::new(format!("{}{}", self.month.two_digits(), self.year.two_digits()))
    }
}
