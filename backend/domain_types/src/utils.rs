use std::sync::LazyLock;

use common_utils::{consts, AmountConvertor, CustomResult, MinorUnit};
use error_stack::ResultExt;
use regex::Regex;
use serde_json::Value;

use crate::{errors, router_data::ErrorResponse, router_response_types::Response};

pub type Error = error_stack::Report<errors::ConnectorError>;

/// Trait for converting from one foreign type to another
pub trait ForeignTryFrom<F>: Sized {
    /// Custom error for conversion failure
    type Error;

    /// Convert from a foreign type to the current type and return an error if the conversion fails
    fn foreign_try_from(from: F) -> Result<Self, Self::Error>;
}

pub trait ForeignFrom<F>: Sized {
    /// Convert from a foreign type to the current type
    fn foreign_from(from: F) -> Self;
}

pub fn handle_json_response_deserialization_failure(
    res: Response,
    _: &'static str,
) -> CustomResult<ErrorResponse, errors::ConnectorError> {
    let response_data = String::from_utf8(res.response.to_vec())
        .change_context(errors::ConnectorError::ResponseDeserializationFailed)?;

    // check for whether the response is in json format
    match serde_json::from_str::<Value>(&response_data) {
        // in case of unexpected response but in json format
        Ok(_) => Err(errors::ConnectorError::ResponseDeserializationFailed)?,
        // in case of unexpected response but in html or string format
        Err(_) => Ok(ErrorResponse {
            status_code: res.status_code,
            code: consts::NO_ERROR_CODE.to_string(),
            message: consts::UNSUPPORTED_ERROR_MESSAGE.to_string(),
            reason: Some(response_data),
            attempt_status: None,
            connector_transaction_id: None,
            network_advice_code: None,
            network_decline_code: None,
            network_error_message: None,
        }),
    }
}

pub fn missing_field_err(
    message: &'static str,
) -> Box<dyn Fn() -> error_stack::Report<errors::ConnectorError> + 'static> {
    Box::new(move || {
        errors::ConnectorError::MissingRequiredField {
            field_name: message,
        }
        .into()
    })
}

pub fn construct_not_supported_error_report(
    capture_method: common_enums::CaptureMethod,
    connector_name: &'static str,
) -> error_stack::Report<errors::ConnectorError> {
    errors::ConnectorError::NotSupported {
        message: capture_method.to_string(),
        connector: connector_name,
    }
    .into()
}

pub fn convert_amount<T>(
    amount_convertor: &dyn AmountConvertor<Output = T>,
    amount: MinorUnit,
    currency: common_enums::Currency,
) -> Result<T, error_stack::Report<errors::ConnectorError>> {
    amount_convertor
        .convert(amount, currency)
        .change_context(errors::ConnectorError::AmountConversionFailed)
}

pub fn convert_back_amount_to_minor_units<T>(
    amount_convertor: &dyn AmountConvertor<Output = T>,
    amount: T,
    currency: common_enums::Currency,
) -> Result<MinorUnit, error_stack::Report<errors::ConnectorError>> {
    amount_convertor
        .convert_back(amount, currency)
        .change_context(errors::ConnectorError::AmountConversionFailed)
}

#[derive(Debug, Copy, Clone, strum::Display, Eq, Hash, PartialEq)]
pub enum CardIssuer {
    AmericanExpress,
    Master,
    Maestro,
    Visa,
    Discover,
    DinersClub,
    JCB,
    UnionPay,
}

#[track_caller]
pub fn get_card_issuer(card_number: &str) -> Result<CardIssuer, Error> {
    for (issuer, pattern) in CARD_REGEX.iter() {
        let regex: Regex = pattern
            .clone()
            .change_context(errors::ConnectorError::RequestEncodingFailed)?;
        if regex.is_match(card_number) {
            return Ok(*issuer);
        }
    }
    Err(error_stack::Report::new(
        errors::ConnectorError::NotImplemented("Card Type".into()),
    ))
}

// Checked in order; Maestro ranges come before the broader Mastercard and Discover ones
static CARD_REGEX: LazyLock<Vec<(CardIssuer, Result<Regex, regex::Error>)>> =
    LazyLock::new(|| {
        vec![
            (
                CardIssuer::Maestro,
                Regex::new(r"^(5018|5020|5038|5893|6304|6759|6761|6762|6763)[0-9]{8,15}$"),
            ),
            (CardIssuer::Master, Regex::new(r"^(5[1-5][0-9]{14}|2(2[2-9][1-9]|2[3-9][0-9]|[3-6][0-9]{2}|7[01][0-9]|720)[0-9]{12})$")),
            (CardIssuer::AmericanExpress, Regex::new(r"^3[47][0-9]{13}$")),
            (CardIssuer::Visa, Regex::new(r"^4[0-9]{12}(?:[0-9]{3})?$")),
            (
                CardIssuer::DinersClub,
                Regex::new(r"^3(?:0[0-5]|[68][0-9])[0-9]{11}$"),
            ),
            (
                CardIssuer::JCB,
                Regex::new(r"^(3(?:088|096|112|158|337|5(?:2[89]|[3-8][0-9]))\d{12})$"),
            ),
            (CardIssuer::Discover, Regex::new(r"^(65[4-9][0-9]{13}|64[4-9][0-9]{13}|6011[0-9]{12}|(622(?:12[6-9]|1[3-9][0-9]|[2-8][0-9][0-9]|9[01][0-9]|92[0-5])[0-9]{10}))$")),
            (CardIssuer::UnionPay, Regex::new(r"^62[0-9]{14,17}$")),
        ]
    });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_issuer_is_detected_from_the_number() {
        let cases = [
            ("4929000000006", CardIssuer::Visa),
            ("5404000000000001", CardIssuer::Master),
            ("374200000000004", CardIssuer::AmericanExpress),
            ("36000000000008", CardIssuer::DinersClub),
            ("3530111333300000", CardIssuer::JCB),
            ("6759000000000005", CardIssuer::Maestro),
        ];
        for (number, issuer) in cases {
            assert_eq!(get_card_issuer(number).expect("issuer"), issuer, "{number}");
        }
    }

    #[test]
    fn unknown_card_number_is_not_implemented() {
        assert!(get_card_issuer("9999000000000000").is_err());
    }

    #[test]
    fn plain_text_error_bodies_become_error_responses() {
        let response = Response {
            headers: None,
            response: bytes::Bytes::from_static(b"<html>Bad Gateway</html>"),
            status_code: 502,
        };
        let error = handle_json_response_deserialization_failure(response, "sagepay")
            .expect("error response");
        assert_eq!(error.status_code, 502);
        assert_eq!(error.reason.as_deref(), Some("<html>Bad Gateway</html>"));
    }
}
