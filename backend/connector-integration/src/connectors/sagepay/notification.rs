//! Server notifications: the URL-encoded POST the gateway sends once the shopper has left the
//! hosted pages, its MD5 signature and the plain text reply the gateway expects back.

use std::collections::HashMap;

use common_enums::AttemptStatus;
use common_utils::{
    crypto::{GenerateDigest, Md5, VerifySignature},
    PeekInterface,
};
use domain_types::errors::ConnectorError;
use error_stack::ResultExt;

use super::{
    constants::{self, fields},
    transformers::{SagepayStatus, TransactionReference, TxType},
};

type Error = error_stack::Report<ConnectorError>;

/// Signed fields of a payment notification, in signing order. `None` is the vendor name slot.
const PAYMENT_SIGNATURE_FIELDS: [Option<&str>; 21] = [
    Some(fields::VPS_TX_ID),
    Some(fields::VENDOR_TX_CODE),
    Some(fields::STATUS),
    Some(fields::TX_AUTH_NO),
    None,
    Some("AVSCV2"),
    Some(fields::SECURITY_KEY),
    Some("AddressResult"),
    Some("PostCodeResult"),
    Some("CV2Result"),
    Some("GiftAid"),
    Some("3DSecureStatus"),
    Some("CAVV"),
    Some("AddressStatus"),
    Some("PayerStatus"),
    Some("CardType"),
    Some("Last4Digits"),
    Some("DeclineCode"),
    Some("ExpiryDate"),
    Some("FraudResponse"),
    Some("BankAuthCode"),
];

/// Signed fields of a token registration notification
const TOKEN_SIGNATURE_FIELDS: [Option<&str>; 6] = [
    Some(fields::VPS_TX_ID),
    Some(fields::VENDOR_TX_CODE),
    Some(fields::STATUS),
    None,
    Some(fields::TOKEN),
    Some(fields::SECURITY_KEY),
];

#[derive(Debug, Clone)]
pub struct SagepayNotification {
    fields: HashMap<String, String>,
}

impl SagepayNotification {
    pub fn parse(body: &[u8]) -> Result<Self, Error> {
        let fields: HashMap<String, String> = url::form_urlencoded::parse(body)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        if !fields.contains_key(fields::STATUS) {
            return Err(ConnectorError::WebhookBodyDecodingFailed)
                .attach_printable("notification carries no Status");
        }
        Ok(Self { fields })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn get_required(&self, key: &'static str) -> Result<&str, Error> {
        self.get(key)
            .ok_or(ConnectorError::MissingRequiredField { field_name: key }.into())
    }

    pub fn status(&self) -> SagepayStatus {
        self.get(fields::STATUS)
            .and_then(|status| {
                serde_json::from_value(serde_json::Value::String(status.to_string())).ok()
            })
            .unwrap_or(SagepayStatus::Unknown)
    }

    pub fn tx_type(&self) -> Option<TxType> {
        self.get(fields::TX_TYPE).and_then(|tx_type| {
            serde_json::from_value(serde_json::Value::String(tx_type.to_uppercase())).ok()
        })
    }

    pub fn is_token_registration(&self) -> bool {
        self.tx_type() == Some(TxType::Token)
    }

    pub fn get_vendor_tx_code(&self) -> Result<&str, Error> {
        self.get(fields::VENDOR_TX_CODE)
            .ok_or(ConnectorError::WebhookReferenceIdNotFound.into())
    }

    pub fn get_signature(&self) -> Result<&str, Error> {
        self.get(fields::VPS_SIGNATURE)
            .filter(|signature| !signature.is_empty())
            .ok_or(ConnectorError::WebhookSignatureNotFound.into())
    }

    /// Concatenation the gateway hashed. The vendor name is lower-cased; token registrations
    /// sign the `VPSTxId` without its braces.
    pub fn get_signature_message(&self, vendor: &str, security_key: &str) -> String {
        let is_token = self.is_token_registration();
        let signed_fields: &[Option<&str>] = if is_token {
            &TOKEN_SIGNATURE_FIELDS
        } else {
            &PAYMENT_SIGNATURE_FIELDS
        };
        signed_fields
            .iter()
            .map(|field| match *field {
                None => vendor.to_lowercase(),
                Some(fields::SECURITY_KEY) => security_key.to_string(),
                Some(fields::VPS_TX_ID) if is_token => self
                    .get(fields::VPS_TX_ID)
                    .unwrap_or_default()
                    .replace(['{', '}'], ""),
                Some(name) => self.get(name).unwrap_or_default().to_string(),
            })
            .collect()
    }

    pub fn build_signature(&self, vendor: &str, security_key: &str) -> Result<String, Error> {
        let digest = Md5
            .generate_digest(self.get_signature_message(vendor, security_key).as_bytes())
            .change_context(ConnectorError::WebhookSourceVerificationFailed)?;
        Ok(hex::encode(digest))
    }

    pub fn is_valid(&self, vendor: &str, security_key: &str) -> Result<bool, Error> {
        let is_valid = Md5
            .verify_signature(
                &[],
                self.get_signature()?.as_bytes(),
                self.get_signature_message(vendor, security_key).as_bytes(),
            )
            .change_context(ConnectorError::WebhookSourceVerificationFailed)?;
        if !is_valid {
            tracing::warn!(
                vendor_tx_code = self.get(fields::VENDOR_TX_CODE),
                "sagepay notification signature mismatch"
            );
        }
        Ok(is_valid)
    }

    pub fn get_attempt_status(&self, is_auto_capture: bool) -> AttemptStatus {
        let tx_type = self
            .tx_type()
            .unwrap_or_else(|| TxType::for_payment(is_auto_capture));
        get_completion_status(&self.status(), tx_type)
    }
}

/// Outcome of a finished hosted or form payment
pub fn get_completion_status(status: &SagepayStatus, tx_type: TxType) -> AttemptStatus {
    match status {
        SagepayStatus::Ok
        | SagepayStatus::OkRepeated
        | SagepayStatus::Authenticated
        | SagepayStatus::Registered => match tx_type {
            TxType::Payment | TxType::Repeat | TxType::Token => AttemptStatus::Charged,
            _ => AttemptStatus::Authorized,
        },
        SagepayStatus::Pending => AttemptStatus::Pending,
        SagepayStatus::ThreeDAuth | SagepayStatus::PpRedirect => {
            AttemptStatus::AuthenticationPending
        }
        SagepayStatus::NotAuthed => AttemptStatus::AuthorizationFailed,
        SagepayStatus::Rejected
        | SagepayStatus::Abort
        | SagepayStatus::Error
        | SagepayStatus::Invalid
        | SagepayStatus::Malformed
        | SagepayStatus::Unknown => AttemptStatus::Failure,
    }
}

/// The notification secret is the transaction's `SecurityKey`, given raw or as the stored
/// transaction reference
pub fn get_security_key(secret: &[u8]) -> Result<String, Error> {
    let secret = std::str::from_utf8(secret)
        .change_context(ConnectorError::WebhookVerificationSecretNotFound)?
        .trim();
    let security_key = match TransactionReference::decode(secret) {
        Ok(reference) => reference
            .security_key
            .map(|key| key.peek().clone()),
        Err(_) => Some(secret.to_string()),
    };
    security_key
        .filter(|key| !key.is_empty())
        .ok_or(ConnectorError::WebhookVerificationSecretNotFound.into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum NotificationReplyStatus {
    Ok,
    Invalid,
    Error,
}

/// Plain text answer to a notification, telling the gateway where to send the shopper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationReply {
    pub status: NotificationReplyStatus,
    pub redirect_url: String,
    pub status_detail: Option<String>,
}

impl NotificationReply {
    /// Acknowledges a notification. Refuses to confirm one whose signature does not match.
    pub fn confirm(
        notification: &SagepayNotification,
        vendor: &str,
        security_key: &str,
        redirect_url: String,
        status_detail: Option<String>,
    ) -> Result<Self, Error> {
        if !notification.is_valid(vendor, security_key)? {
            return Err(ConnectorError::WebhookSourceVerificationFailed.into());
        }
        Ok(Self {
            status: NotificationReplyStatus::Ok,
            redirect_url,
            status_detail,
        })
    }

    /// `OK` for a notification whose signature was already checked while processing it
    pub fn accept(redirect_url: String, status_detail: Option<String>) -> Self {
        Self {
            status: NotificationReplyStatus::Ok,
            redirect_url,
            status_detail,
        }
    }

    pub fn reject(redirect_url: String, status_detail: Option<String>) -> Self {
        Self {
            status: NotificationReplyStatus::Invalid,
            redirect_url,
            status_detail,
        }
    }

    pub fn error(redirect_url: String, status_detail: Option<String>) -> Self {
        Self {
            status: NotificationReplyStatus::Error,
            redirect_url,
            status_detail,
        }
    }

    pub fn to_body(&self) -> String {
        let mut lines = vec![
            format!("{}={}", fields::STATUS, self.status),
            format!("{}={}", fields::REDIRECT_URL, self.redirect_url),
        ];
        if let Some(detail) = &self.status_detail {
            lines.push(format!("{}={detail}", fields::STATUS_DETAIL));
        }
        lines.join(constants::LINE_SEPARATOR)
    }
}
