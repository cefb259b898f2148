use std::collections::HashMap;

use common_enums::{AttemptStatus, AuthenticationType, Currency, PaymentMethod};
use common_utils::{
    errors, ext_traits::OptionExt, pii::IpAddress, CustomResult, Email, MinorUnit,
    SecretSerdeValue,
};
use common_utils::{ExposeInterface, Secret};
use error_stack::ResultExt;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    errors::ConnectorError,
    payment_address::{self, Address, AddressDetails, PhoneDetails},
    payment_method_data::{Card, PaymentMethodData},
    router_data::PaymentMethodToken,
    router_request_types::{BrowserInformation, CompleteAuthorizeRedirectResponse, SyncRequestType},
    router_response_types::RedirectForm,
    types::Connectors,
    utils::{missing_field_err, Error},
};

// snake case for enum variants
#[derive(Clone, Copy, Debug, Display, EnumString, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectorEnum {
    Sagepaydirect,
    Sagepayserver,
    Sagepayform,
    Sagepaypi,
}

#[derive(Debug, Deserialize, Serialize, Clone, Eq, PartialEq)]
pub struct ConnectorMandateReferenceId {
    connector_mandate_id: Option<String>,
    payment_method_id: Option<String>,
    connector_mandate_request_reference_id: Option<String>,
}

impl ConnectorMandateReferenceId {
    pub fn new(
        connector_mandate_id: Option<String>,
        payment_method_id: Option<String>,
        connector_mandate_request_reference_id: Option<String>,
    ) -> Self {
        Self {
            connector_mandate_id,
            payment_method_id,
            connector_mandate_request_reference_id,
        }
    }

    pub fn get_connector_mandate_id(&self) -> Option<String> {
        self.connector_mandate_id.clone()
    }

    pub fn get_payment_method_id(&self) -> Option<&String> {
        self.payment_method_id.as_ref()
    }

    pub fn get_connector_mandate_request_reference_id(&self) -> Option<String> {
        self.connector_mandate_request_reference_id.clone()
    }
}

pub trait RawConnectorRequestResponse {
    fn set_raw_connector_response(&mut self, response: Option<Secret<String>>);
    fn get_raw_connector_response(&self) -> Option<Secret<String>>;
    fn set_raw_connector_request(&mut self, request: Option<Secret<String>>);
    fn get_raw_connector_request(&self) -> Option<Secret<String>>;
}

#[derive(Eq, PartialEq, Debug, Deserialize, Serialize, Clone)]
pub enum MandateReferenceId {
    ConnectorMandateId(ConnectorMandateReferenceId), // mandate_id send by connector
    NetworkMandateId(String), // network_txns_id send by Issuer to connector
}

#[derive(Default, Eq, PartialEq, Debug, Deserialize, Serialize, Clone)]
pub struct MandateIds {
    pub mandate_id: Option<String>,
    pub mandate_reference_id: Option<MandateReferenceId>,
}

impl MandateIds {
    pub fn new(mandate_id: String) -> Self {
        Self {
            mandate_id: Some(mandate_id),
            mandate_reference_id: None,
        }
    }

    pub fn get_connector_mandate_id(&self) -> Option<String> {
        match &self.mandate_reference_id {
            Some(MandateReferenceId::ConnectorMandateId(connector_mandate_ids)) => {
                connector_mandate_ids.get_connector_mandate_id()
            }
            Some(MandateReferenceId::NetworkMandateId(_)) | None => None,
        }
    }
}

fn is_auto_capture(capture_method: Option<common_enums::CaptureMethod>) -> Result<bool, Error> {
    match capture_method {
        Some(common_enums::CaptureMethod::Automatic)
        | None
        | Some(common_enums::CaptureMethod::SequentialAutomatic) => Ok(true),
        Some(common_enums::CaptureMethod::Manual) => Ok(false),
        Some(_) => Err(ConnectorError::CaptureMethodNotSupported.into()),
    }
}

#[derive(Debug, Clone)]
pub struct PaymentFlowData {
    pub merchant_id: String,
    pub customer_id: Option<String>,
    pub payment_id: String,
    pub attempt_id: String,
    pub status: AttemptStatus,
    pub payment_method: PaymentMethod,
    pub description: Option<String>,
    pub return_url: Option<String>,
    pub address: payment_address::PaymentAddress,
    pub auth_type: AuthenticationType,
    /// Per merchant connector settings, e.g. `{"protocol_version": "3.00"}`
    pub connector_meta_data: Option<SecretSerdeValue>,
    pub amount_captured: Option<i64>,
    // minor amount for amount framework
    pub minor_amount_captured: Option<MinorUnit>,
    pub session_token: Option<String>,
    pub reference_id: Option<String>,
    pub payment_method_token: Option<PaymentMethodToken>,
    /// Contains a reference ID that should be sent in the connector request
    pub connector_request_reference_id: String,
    pub test_mode: Option<bool>,
    pub connector_http_status_code: Option<u16>,
    pub connectors: Connectors,
    pub raw_connector_response: Option<Secret<String>>,
    pub raw_connector_request: Option<Secret<String>>,
}

impl PaymentFlowData {
    pub fn set_status(&mut self, status: AttemptStatus) {
        self.status = status;
    }

    pub fn get_billing(&self) -> Result<&Address, Error> {
        self.address
            .get_payment_method_billing()
            .ok_or_else(missing_field_err("billing"))
    }

    pub fn get_billing_country(&self) -> Result<common_enums::CountryAlpha2, Error> {
        self.address
            .get_payment_method_billing()
            .and_then(|a| a.address.as_ref())
            .and_then(|ad| ad.country)
            .ok_or_else(missing_field_err(
                "payment_method_data.billing.address.country",
            ))
    }

    pub fn get_billing_phone(&self) -> Result<&PhoneDetails, Error> {
        self.address
            .get_payment_method_billing()
            .and_then(|a| a.phone.as_ref())
            .ok_or_else(missing_field_err("billing.phone"))
    }

    pub fn get_optional_billing(&self) -> Option<&Address> {
        self.address.get_payment_method_billing()
    }

    pub fn get_optional_shipping(&self) -> Option<&Address> {
        self.address.get_shipping()
    }

    pub fn get_description(&self) -> Result<String, Error> {
        self.description
            .clone()
            .ok_or_else(missing_field_err("description"))
    }

    pub fn get_billing_address(&self) -> Result<&AddressDetails, Error> {
        self.address
            .get_payment_method_billing()
            .and_then(|a| a.address.as_ref())
            .ok_or_else(missing_field_err("billing.address"))
    }

    pub fn get_connector_meta_data(&self) -> Result<SecretSerdeValue, Error> {
        self.connector_meta_data
            .clone()
            .ok_or_else(missing_field_err("connector_meta_data"))
    }

    pub fn get_session_token(&self) -> Result<String, Error> {
        self.session_token
            .clone()
            .ok_or_else(missing_field_err("session_token"))
    }

    pub fn get_billing_first_name(&self) -> Result<Secret<String>, Error> {
        self.get_optional_billing_first_name()
            .ok_or_else(missing_field_err(
                "payment_method_data.billing.address.first_name",
            ))
    }

    pub fn get_billing_last_name(&self) -> Result<Secret<String>, Error> {
        self.get_optional_billing_last_name()
            .ok_or_else(missing_field_err(
                "payment_method_data.billing.address.last_name",
            ))
    }

    pub fn get_billing_email(&self) -> Result<Email, Error> {
        self.get_optional_billing_email()
            .ok_or_else(missing_field_err("payment_method_data.billing.email"))
    }

    pub fn get_optional_billing_first_name(&self) -> Option<Secret<String>> {
        self.address
            .get_payment_method_billing()
            .and_then(|billing_address| {
                billing_address
                    .clone()
                    .address
                    .and_then(|billing_details| billing_details.first_name)
            })
    }

    pub fn get_optional_billing_last_name(&self) -> Option<Secret<String>> {
        self.address
            .get_payment_method_billing()
            .and_then(|billing_address| {
                billing_address
                    .clone()
                    .address
                    .and_then(|billing_details| billing_details.last_name)
            })
    }

    pub fn get_optional_billing_full_name(&self) -> Option<Secret<String>> {
        self.get_optional_billing()
            .and_then(|billing_details| billing_details.address.as_ref())
            .and_then(|billing_address| billing_address.get_optional_full_name())
    }

    pub fn get_optional_billing_email(&self) -> Option<Email> {
        self.address
            .get_payment_method_billing()
            .and_then(|billing_address| billing_address.clone().email)
    }

    pub fn get_optional_billing_country(&self) -> Option<common_enums::CountryAlpha2> {
        self.address
            .get_payment_method_billing()
            .and_then(|billing_address| {
                billing_address
                    .clone()
                    .address
                    .and_then(|billing_details| billing_details.country)
            })
    }

    /// Reads the merchant's connector metadata into the connector's own settings type
    pub fn to_connector_meta<T>(&self) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        self.get_connector_meta_data()?
            .expose()
            .parse_connector_meta("connector_meta_data")
    }

    pub fn is_three_ds(&self) -> bool {
        matches!(self.auth_type, AuthenticationType::ThreeDs)
    }

    pub fn get_payment_method_token(&self) -> Result<PaymentMethodToken, Error> {
        self.payment_method_token
            .clone()
            .ok_or_else(missing_field_err("payment_method_token"))
    }

    pub fn get_reference_id(&self) -> Result<String, Error> {
        self.reference_id
            .clone()
            .ok_or_else(missing_field_err("reference_id"))
    }

    pub fn set_session_token_id(mut self, session_token_id: Option<String>) -> Self {
        if session_token_id.is_some() {
            self.session_token = session_token_id;
        }
        self
    }

    pub fn set_payment_method_token(mut self, payment_method_token: Option<String>) -> Self {
        if let Some(token) = payment_method_token {
            self.payment_method_token = Some(PaymentMethodToken::Token(Secret::new(token)));
        }
        self
    }

    pub fn get_return_url(&self) -> Option<String> {
        self.return_url.clone()
    }
}

trait ParseConnectorMeta {
    fn parse_connector_meta<T: DeserializeOwned>(self, field_name: &'static str)
        -> Result<T, Error>;
}

impl ParseConnectorMeta for serde_json::Value {
    fn parse_connector_meta<T: DeserializeOwned>(
        self,
        field_name: &'static str,
    ) -> Result<T, Error> {
        serde_json::from_value(self).change_context(ConnectorError::InvalidDataFormat { field_name })
    }
}

impl RawConnectorRequestResponse for PaymentFlowData {
    fn set_raw_connector_response(&mut self, response: Option<Secret<String>>) {
        self.raw_connector_response = response;
    }

    fn get_raw_connector_response(&self) -> Option<Secret<String>> {
        self.raw_connector_response.clone()
    }

    fn get_raw_connector_request(&self) -> Option<Secret<String>> {
        self.raw_connector_request.clone()
    }

    fn set_raw_connector_request(&mut self, request: Option<Secret<String>>) {
        self.raw_connector_request = request;
    }
}

#[derive(Debug, Default, Clone)]
pub struct PaymentsSyncData {
    pub connector_transaction_id: ResponseId,
    pub encoded_data: Option<String>,
    pub capture_method: Option<common_enums::CaptureMethod>,
    pub connector_meta: Option<serde_json::Value>,
    pub sync_type: SyncRequestType,
    pub mandate_id: Option<MandateIds>,
    pub currency: Currency,
    pub amount: MinorUnit,
}

impl PaymentsSyncData {
    pub fn is_auto_capture(&self) -> Result<bool, Error> {
        is_auto_capture(self.capture_method)
    }
    pub fn get_connector_transaction_id(&self) -> CustomResult<String, ConnectorError> {
        self.connector_transaction_id
            .get_connector_transaction_id()
            .change_context(ConnectorError::MissingConnectorTransactionID)
    }
}

#[derive(Debug, Clone)]
pub struct PaymentVoidData {
    pub connector_transaction_id: String,
    pub cancellation_reason: Option<String>,
    pub browser_info: Option<BrowserInformation>,
    pub amount: Option<MinorUnit>,
    pub currency: Option<Currency>,
    pub connector_metadata: Option<serde_json::Value>,
}

impl PaymentVoidData {
    pub fn get_cancellation_reason(&self) -> Result<String, Error> {
        self.cancellation_reason
            .clone()
            .ok_or_else(missing_field_err("cancellation_reason"))
    }
}

#[derive(Debug, Clone)]
pub struct PaymentsCancelPostCaptureData {
    pub connector_transaction_id: String,
    pub cancellation_reason: Option<String>,
    pub browser_info: Option<BrowserInformation>,
}

impl PaymentsCancelPostCaptureData {
    pub fn get_cancellation_reason(&self) -> Result<String, Error> {
        self.cancellation_reason
            .clone()
            .ok_or_else(missing_field_err("cancellation_reason"))
    }
}

#[derive(Debug, Clone)]
pub struct PaymentsAuthorizeData {
    pub payment_method_data: PaymentMethodData,
    // New amount for amount frame work
    pub minor_amount: MinorUnit,
    pub email: Option<Email>,
    pub customer_name: Option<String>,
    pub currency: Currency,
    pub confirm: bool,
    pub capture_method: Option<common_enums::CaptureMethod>,
    pub router_return_url: Option<String>,
    pub webhook_url: Option<String>,
    pub complete_authorize_url: Option<String>,
    // Mandates
    pub mandate_id: Option<MandateIds>,
    pub setup_future_usage: Option<common_enums::FutureUsage>,
    pub off_session: Option<bool>,
    pub browser_info: Option<BrowserInformation>,
    pub customer_id: Option<String>,
    pub metadata: Option<SecretSerdeValue>,
    /// Merchant's identifier for the payment/invoice. This will be sent to the connector
    /// if the connector provides support to accept multiple reference ids.
    pub merchant_order_reference_id: Option<String>,
    pub statement_descriptor: Option<String>,
}

impl PaymentsAuthorizeData {
    pub fn is_auto_capture(&self) -> Result<bool, Error> {
        is_auto_capture(self.capture_method)
    }
    pub fn get_email(&self) -> Result<Email, Error> {
        self.email.clone().ok_or_else(missing_field_err("email"))
    }
    pub fn get_optional_email(&self) -> Option<Email> {
        self.email.clone()
    }
    pub fn get_browser_info(&self) -> Result<BrowserInformation, Error> {
        self.browser_info
            .clone()
            .ok_or_else(missing_field_err("browser_info"))
    }
    pub fn get_card(&self) -> Result<Card, Error> {
        match &self.payment_method_data {
            PaymentMethodData::Card(card) => Ok(card.clone()),
            _ => Err(missing_field_err("card")()),
        }
    }
    pub fn get_complete_authorize_url(&self) -> Result<String, Error> {
        self.complete_authorize_url
            .clone()
            .ok_or_else(missing_field_err("complete_authorize_url"))
    }
    pub fn connector_mandate_id(&self) -> Option<String> {
        self.mandate_id
            .as_ref()
            .and_then(MandateIds::get_connector_mandate_id)
    }
    pub fn get_connector_mandate_id(&self) -> Result<String, Error> {
        self.connector_mandate_id()
            .ok_or_else(missing_field_err("connector_mandate_id"))
    }
    /// The customer asks for the payment method to be kept for off-session payments
    pub fn is_customer_initiated_mandate_payment(&self) -> bool {
        self.setup_future_usage == Some(common_enums::FutureUsage::OffSession)
    }
    pub fn is_mandate_payment(&self) -> bool {
        self.is_customer_initiated_mandate_payment()
            || self
                .mandate_id
                .as_ref()
                .and_then(|mandate_ids| mandate_ids.mandate_reference_id.as_ref())
                .is_some()
    }
    pub fn get_webhook_url(&self) -> Result<String, Error> {
        self.webhook_url
            .clone()
            .ok_or_else(missing_field_err("webhook_url"))
    }
    pub fn get_router_return_url(&self) -> Result<String, Error> {
        self.router_return_url
            .clone()
            .ok_or_else(missing_field_err("return_url"))
    }
    pub fn is_card(&self) -> bool {
        matches!(self.payment_method_data, PaymentMethodData::Card(_))
    }
    pub fn get_ip_address_as_optional(&self) -> Option<Secret<String, IpAddress>> {
        self.browser_info.clone().and_then(|browser_info| {
            browser_info
                .ip_address
                .map(|ip| Secret::new(ip.to_string()))
        })
    }
    pub fn get_ip_address(&self) -> Result<Secret<String, IpAddress>, Error> {
        self.get_ip_address_as_optional()
            .ok_or_else(missing_field_err("browser_info.ip_address"))
    }
}

/// Second leg of an authorization that needed the customer (3-D Secure challenge, PayPal)
#[derive(Debug, Clone)]
pub struct PaymentsCompleteAuthorizeData {
    pub payment_method_data: Option<PaymentMethodData>,
    pub minor_amount: MinorUnit,
    pub email: Option<Email>,
    pub currency: Currency,
    pub capture_method: Option<common_enums::CaptureMethod>,
    /// The transaction id returned by the first leg, when the connector issued one
    pub connector_transaction_id: Option<String>,
    pub redirect_response: Option<CompleteAuthorizeRedirectResponse>,
    pub browser_info: Option<BrowserInformation>,
    pub complete_authorize_url: Option<String>,
    pub connector_meta: Option<serde_json::Value>,
    pub setup_future_usage: Option<common_enums::FutureUsage>,
}

impl PaymentsCompleteAuthorizeData {
    pub fn is_auto_capture(&self) -> Result<bool, Error> {
        is_auto_capture(self.capture_method)
    }
    pub fn get_redirect_response_payload(&self) -> Result<serde_json::Value, Error> {
        self.redirect_response
            .as_ref()
            .and_then(|res| res.payload.to_owned())
            .ok_or(
                ConnectorError::MissingConnectorRedirectionPayload {
                    field_name: "request.redirect_response.payload",
                }
                .into(),
            )
            .map(ExposeInterface::expose)
    }
    pub fn get_complete_authorize_url(&self) -> Result<String, Error> {
        self.complete_authorize_url
            .clone()
            .ok_or_else(missing_field_err("complete_authorize_url"))
    }
    pub fn get_connector_transaction_id(&self) -> Result<String, Error> {
        self.connector_transaction_id
            .clone()
            .ok_or_else(missing_field_err("connector_transaction_id"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum ResponseId {
    ConnectorTransactionId(String),
    EncodedData(String),
    #[default]
    NoResponseId,
}

impl ResponseId {
    pub fn get_connector_transaction_id(&self) -> CustomResult<String, errors::ValidationError> {
        match self {
            Self::ConnectorTransactionId(txn_id) => Ok(txn_id.to_string()),
            _ => Err(errors::ValidationError::IncorrectValueProvided {
                field_name: "connector_transaction_id",
            })
            .attach_printable("Expected connector transaction ID not found"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PaymentsResponseData {
    TransactionResponse {
        resource_id: ResponseId,
        redirection_data: Option<Box<RedirectForm>>,
        connector_metadata: Option<serde_json::Value>,
        mandate_reference: Option<Box<MandateReference>>,
        network_txn_id: Option<String>,
        connector_response_reference_id: Option<String>,
        incremental_authorization_allowed: Option<bool>,
        status_code: u16,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MandateReference {
    pub connector_mandate_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub connector_mandate_request_reference_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaymentMethodTokenizationData {
    pub payment_method_data: PaymentMethodData,
    pub browser_info: Option<BrowserInformation>,
    pub currency: Currency,
    pub amount: MinorUnit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMethodTokenResponse {
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct SessionTokenRequestData {
    pub amount: MinorUnit,
    pub currency: Currency,
    pub browser_info: Option<BrowserInformation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionTokenResponseData {
    pub session_token: String,
}

#[derive(Debug, Clone)]
pub struct MandateRevokeRequestData {
    pub mandate_id: Secret<String>,
    pub connector_mandate_id: Option<Secret<String>>,
}

impl MandateRevokeRequestData {
    pub fn get_connector_mandate_id(&self) -> Result<Secret<String>, Error> {
        self.connector_mandate_id
            .clone()
            .ok_or_else(missing_field_err("connector_mandate_id"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MandateRevokeResponseData {
    pub mandate_status: common_enums::MandateStatus,
    pub status_code: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefundsResponseData {
    pub connector_refund_id: String,
    pub refund_status: common_enums::RefundStatus,
    pub status_code: u16,
}

#[derive(Debug, Clone)]
pub struct RefundFlowData {
    pub merchant_id: String,
    pub status: common_enums::RefundStatus,
    pub refund_id: Option<String>,
    pub connectors: Connectors,
    pub connector_request_reference_id: String,
    pub connector_meta_data: Option<SecretSerdeValue>,
    pub raw_connector_response: Option<Secret<String>>,
    pub raw_connector_request: Option<Secret<String>>,
    pub test_mode: Option<bool>,
    pub payment_method: Option<PaymentMethod>,
}

impl RefundFlowData {
    pub fn to_connector_meta<T>(&self) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        self.connector_meta_data
            .clone()
            .ok_or_else(missing_field_err("connector_meta_data"))?
            .expose()
            .parse_connector_meta("connector_meta_data")
    }
}

impl RawConnectorRequestResponse for RefundFlowData {
    fn set_raw_connector_response(&mut self, response: Option<Secret<String>>) {
        self.raw_connector_response = response;
    }

    fn get_raw_connector_response(&self) -> Option<Secret<String>> {
        self.raw_connector_response.clone()
    }

    fn get_raw_connector_request(&self) -> Option<Secret<String>> {
        self.raw_connector_request.clone()
    }

    fn set_raw_connector_request(&mut self, request: Option<Secret<String>>) {
        self.raw_connector_request = request;
    }
}

#[derive(Debug, Default, Clone)]
pub struct RefundsData {
    pub refund_id: String,
    pub connector_transaction_id: String,
    pub connector_refund_id: Option<String>,
    pub currency: Currency,
    pub reason: Option<String>,
    pub webhook_url: Option<String>,
    pub minor_payment_amount: MinorUnit,
    pub minor_refund_amount: MinorUnit,
    pub refund_connector_metadata: Option<SecretSerdeValue>,
    pub capture_method: Option<common_enums::CaptureMethod>,
    pub browser_info: Option<BrowserInformation>,
}

impl RefundsData {
    #[track_caller]
    pub fn get_connector_refund_id(&self) -> Result<String, Error> {
        self.connector_refund_id
            .clone()
            .get_required_value("connector_refund_id")
            .change_context(ConnectorError::MissingConnectorRefundID)
    }
    pub fn get_webhook_url(&self) -> Result<String, Error> {
        self.webhook_url
            .clone()
            .ok_or_else(missing_field_err("webhook_url"))
    }
}

#[derive(Debug, Default, Clone)]
pub struct PaymentsCaptureData {
    pub minor_amount_to_capture: MinorUnit,
    pub currency: Currency,
    pub connector_transaction_id: ResponseId,
    pub connector_metadata: Option<serde_json::Value>,
    pub browser_info: Option<BrowserInformation>,
    pub capture_method: Option<common_enums::CaptureMethod>,
}

impl PaymentsCaptureData {
    pub fn get_connector_transaction_id(&self) -> CustomResult<String, ConnectorError> {
        self.connector_transaction_id
            .get_connector_transaction_id()
            .change_context(ConnectorError::MissingConnectorTransactionID)
    }
}

#[derive(Debug, Clone)]
pub struct SetupMandateRequestData {
    pub currency: Currency,
    pub payment_method_data: PaymentMethodData,
    pub minor_amount: Option<MinorUnit>,
    pub confirm: bool,
    pub mandate_id: Option<MandateIds>,
    pub setup_future_usage: Option<common_enums::FutureUsage>,
    pub off_session: Option<bool>,
    pub router_return_url: Option<String>,
    pub webhook_url: Option<String>,
    pub browser_info: Option<BrowserInformation>,
    pub email: Option<Email>,
    pub customer_name: Option<String>,
    pub capture_method: Option<common_enums::CaptureMethod>,
    pub metadata: Option<SecretSerdeValue>,
}

impl SetupMandateRequestData {
    pub fn get_browser_info(&self) -> Result<BrowserInformation, Error> {
        self.browser_info
            .clone()
            .ok_or_else(missing_field_err("browser_info"))
    }
    pub fn get_email(&self) -> Result<Email, Error> {
        self.email.clone().ok_or_else(missing_field_err("email"))
    }
    pub fn is_card(&self) -> bool {
        matches!(self.payment_method_data, PaymentMethodData::Card(_))
    }
    pub fn get_webhook_url(&self) -> Result<String, Error> {
        self.webhook_url
            .clone()
            .ok_or_else(missing_field_err("webhook_url"))
    }
    pub fn get_router_return_url(&self) -> Result<String, Error> {
        self.router_return_url
            .clone()
            .ok_or_else(missing_field_err("return_url"))
    }
}

#[derive(Debug, Clone)]
pub struct RepeatPaymentData {
    /// Points at the original payment: its transaction reference or connector transaction id
    pub mandate_reference: MandateReferenceId,
    pub minor_amount: MinorUnit,
    pub currency: Currency,
    pub merchant_order_reference_id: Option<String>,
    pub metadata: Option<SecretSerdeValue>,
    pub webhook_url: Option<String>,
    pub capture_method: Option<common_enums::CaptureMethod>,
    pub browser_info: Option<BrowserInformation>,
    pub email: Option<Email>,
    pub off_session: Option<bool>,
    pub router_return_url: Option<String>,
    pub description: Option<String>,
}

impl RepeatPaymentData {
    pub fn is_auto_capture(&self) -> Result<bool, Error> {
        is_auto_capture(self.capture_method)
    }
    pub fn get_connector_mandate_id(&self) -> Result<String, Error> {
        match &self.mandate_reference {
            MandateReferenceId::ConnectorMandateId(connector_mandate_ids) => connector_mandate_ids
                .get_connector_mandate_id()
                .ok_or_else(missing_field_err("connector_mandate_id")),
            MandateReferenceId::NetworkMandateId(_) => Err(ConnectorError::NotSupported {
                message: "network transaction id".to_string(),
                connector: "sagepay",
            }
            .into()),
        }
    }

    /// Reference of the payment the mandate was issued on, or the mandate id itself when the
    /// caller passes a transaction reference there directly
    pub fn get_related_transaction_reference(&self) -> Result<String, Error> {
        match &self.mandate_reference {
            MandateReferenceId::ConnectorMandateId(connector_mandate_ids) => connector_mandate_ids
                .get_connector_mandate_request_reference_id()
                .or_else(|| connector_mandate_ids.get_connector_mandate_id())
                .ok_or_else(missing_field_err("connector_mandate_id")),
            MandateReferenceId::NetworkMandateId(_) => self.get_connector_mandate_id(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedirectDetailsResponse {
    pub resource_id: Option<ResponseId>,
    pub status: Option<AttemptStatus>,
    pub response_minor_amount: Option<MinorUnit>,
    pub response_currency: Option<Currency>,
    pub connector_response_reference_id: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub error_reason: Option<String>,
    pub raw_connector_response: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WebhookDetailsResponse {
    pub resource_id: Option<ResponseId>,
    pub status: AttemptStatus,
    pub connector_response_reference_id: Option<String>,
    pub mandate_reference: Option<Box<MandateReference>>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub error_reason: Option<String>,
    pub raw_connector_response: Option<String>,
    pub status_code: u16,
    pub response_headers: Option<http::HeaderMap>,
    // minor amount for amount framework
    pub minor_amount_captured: Option<MinorUnit>,
    pub network_txn_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Options,
    Get,
    Post,
    Put,
    Delete,
    Head,
    Trace,
    Connect,
    Patch,
}

#[derive(Debug, Clone)]
pub struct RequestDetails {
    pub method: HttpMethod,
    pub uri: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub query_params: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConnectorWebhookSecrets {
    pub secret: Vec<u8>,
    pub additional_secret: Option<Secret<String>>,
}

#[derive(Debug, Clone)]
pub struct ConnectorRedirectResponseSecrets {
    pub secret: Vec<u8>,
    pub additional_secret: Option<Secret<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    // Payment intent events
    PaymentIntentFailure,
    PaymentIntentSuccess,
    PaymentIntentProcessing,
    PaymentIntentCancelled,
    PaymentIntentAuthorizationSuccess,
    PaymentIntentAuthorizationFailure,
    PaymentActionRequired,

    // Mandate events
    MandateActive,
    MandateRevoked,

    IncomingWebhookEventUnspecified,
}

impl EventType {
    /// Returns true if this event type is payment-related
    pub fn is_payment_event(&self) -> bool {
        matches!(
            self,
            Self::PaymentIntentFailure
                | Self::PaymentIntentSuccess
                | Self::PaymentIntentProcessing
                | Self::PaymentIntentCancelled
                | Self::PaymentIntentAuthorizationSuccess
                | Self::PaymentIntentAuthorizationFailure
                | Self::PaymentActionRequired
        )
    }

    /// Returns true if this event type is mandate-related
    pub fn is_mandate_event(&self) -> bool {
        matches!(self, Self::MandateActive | Self::MandateRevoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment_address::PaymentAddress;

    fn flow_data(connector_meta_data: Option<serde_json::Value>) -> PaymentFlowData {
        PaymentFlowData {
            merchant_id: "merchant".to_string(),
            customer_id: None,
            payment_id: "pay_1".to_string(),
            attempt_id: "attempt_1".to_string(),
            status: AttemptStatus::Started,
            payment_method: PaymentMethod::Card,
            description: None,
            return_url: None,
            address: PaymentAddress::default(),
            auth_type: AuthenticationType::NoThreeDs,
            connector_meta_data: connector_meta_data.map(Secret::new),
            amount_captured: None,
            minor_amount_captured: None,
            session_token: None,
            reference_id: None,
            payment_method_token: None,
            connector_request_reference_id: "order-1".to_string(),
            test_mode: Some(true),
            connector_http_status_code: None,
            connectors: Connectors::default(),
            raw_connector_response: None,
            raw_connector_request: None,
        }
    }

    #[derive(Debug, Deserialize)]
    struct ProtocolMeta {
        protocol_version: String,
    }

    #[test]
    fn connector_meta_is_parsed_into_the_requested_type() {
        let data = flow_data(Some(serde_json::json!({ "protocol_version": "3.00" })));
        let meta: ProtocolMeta = data.to_connector_meta().expect("meta");
        assert_eq!(meta.protocol_version, "3.00");
    }

    #[test]
    fn missing_connector_meta_is_a_missing_field() {
        let data = flow_data(None);
        let error = data.to_connector_meta::<ProtocolMeta>().expect_err("missing");
        assert_eq!(
            error.current_context(),
            &ConnectorError::MissingRequiredField {
                field_name: "connector_meta_data"
            }
        );
    }

    #[test]
    fn manual_capture_is_not_auto_capture() {
        assert!(!is_auto_capture(Some(common_enums::CaptureMethod::Manual)).expect("manual"));
        assert!(is_auto_capture(None).expect("default"));
        assert!(is_auto_capture(Some(common_enums::CaptureMethod::Scheduled)).is_err());
    }

    #[test]
    fn response_id_yields_the_connector_transaction_id() {
        let id = ResponseId::ConnectorTransactionId("{ABC}".to_string());
        assert_eq!(id.get_connector_transaction_id().expect("id"), "{ABC}");
        assert!(ResponseId::NoResponseId.get_connector_transaction_id().is_err());
    }
}
