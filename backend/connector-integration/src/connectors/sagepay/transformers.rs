use std::collections::HashMap;

use common_enums::{AttemptStatus, AuthenticationType, CountryAlpha2, Currency, MandateStatus};
use common_utils::{
    consts, ext_traits::ValueExt, request::Method, types::StringMajorUnit, PeekInterface, Secret,
};
use domain_types::{
    connector_flow::{Capture, MandateRevoke, Refund, RepeatPayment, Void, VoidPC},
    connector_types::{
        MandateReference, MandateRevokeRequestData, MandateRevokeResponseData, PaymentFlowData,
        PaymentVoidData, PaymentsCancelPostCaptureData, PaymentsCaptureData, PaymentsResponseData,
        RefundFlowData, RefundsData, RefundsResponseData, RepeatPaymentData, ResponseId,
    },
    errors::ConnectorError,
    payment_address::{Address, AddressDetails},
    payment_method_data::Card,
    router_data::{ConnectorAuthType, ErrorResponse},
    router_data_v2::RouterDataV2,
    router_request_types::BrowserInformation,
    router_response_types::RedirectForm,
    utils::missing_field_err,
};
use error_stack::ResultExt;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::constants;
use crate::{types::ResponseRouterData, utils};

type Error = error_stack::Report<ConnectorError>;

pub struct SagepayRouterData<T> {
    pub amount: StringMajorUnit,
    pub router_data: T,
}

impl<T> From<(StringMajorUnit, T)> for SagepayRouterData<T> {
    fn from((amount, router_data): (StringMajorUnit, T)) -> Self {
        Self {
            amount,
            router_data,
        }
    }
}

// Auth
#[derive(Debug, Clone)]
pub struct SagepayAuthType {
    pub vendor: Secret<String>,
}

impl TryFrom<&ConnectorAuthType> for SagepayAuthType {
    type Error = Error;
    fn try_from(auth_type: &ConnectorAuthType) -> Result<Self, Self::Error> {
        match auth_type {
            ConnectorAuthType::HeaderKey { api_key }
            | ConnectorAuthType::BodyKey { api_key, .. } => Ok(Self {
                vendor: api_key.to_owned(),
            }),
            _ => Err(ConnectorError::FailedToObtainAuthType.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolVersion {
    #[serde(rename = "3.00")]
    V3,
    #[default]
    #[serde(rename = "4.00")]
    V4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TxType {
    Payment,
    Deferred,
    Authenticate,
    Release,
    Void,
    Abort,
    Refund,
    Repeat,
    RepeatDeferred,
    Token,
    RemoveToken,
    Complete,
}

impl TxType {
    pub fn for_payment(is_auto_capture: bool) -> Self {
        if is_auto_capture {
            Self::Payment
        } else {
            Self::Deferred
        }
    }

    pub fn for_repeat(is_auto_capture: bool) -> Self {
        if is_auto_capture {
            Self::Repeat
        } else {
            Self::RepeatDeferred
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    #[default]
    #[serde(rename = "E")]
    Ecommerce,
    #[serde(rename = "M")]
    MailOrder,
    #[serde(rename = "C")]
    ContinuousAuthority,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Apply3DSecure {
    #[default]
    #[serde(rename = "0")]
    UseAccountRules,
    #[serde(rename = "1")]
    Force,
    #[serde(rename = "2")]
    Disable,
    #[serde(rename = "3")]
    ForceIgnoringRules,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyAvsCv2 {
    #[default]
    #[serde(rename = "0")]
    UseAccountRules,
    #[serde(rename = "1")]
    Force,
    #[serde(rename = "2")]
    Disable,
    #[serde(rename = "3")]
    ForceIgnoringRules,
}

/// Look of the hosted payment pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServerProfile {
    #[default]
    Normal,
    Low,
}

/// Who receives the Form confirmation email
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendEmail {
    #[serde(rename = "0")]
    Nobody,
    #[default]
    #[serde(rename = "1")]
    CustomerAndVendor,
    #[serde(rename = "2")]
    VendorOnly,
}

/// Merchant level settings read from the connector metadata, all optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SagepayMetadata {
    #[serde(default)]
    pub protocol_version: ProtocolVersion,
    pub account_type: Option<AccountType>,
    pub apply_avs_cv2: Option<ApplyAvsCv2>,
    pub apply_3d_secure: Option<Apply3DSecure>,
    pub profile: Option<ServerProfile>,
    pub allow_gift_aid: Option<bool>,
    pub referrer_id: Option<String>,
    pub vendor_email: Option<String>,
    pub send_email: Option<SendEmail>,
    pub email_message: Option<String>,
    pub vendor_data: Option<String>,
}

impl SagepayMetadata {
    pub fn from_payment_flow_data(data: &PaymentFlowData) -> Result<Self, Error> {
        match data.connector_meta_data {
            Some(_) => data.to_connector_meta(),
            None => Ok(Self::default()),
        }
    }

    pub fn from_refund_flow_data(data: &RefundFlowData) -> Result<Self, Error> {
        match data.connector_meta_data {
            Some(_) => data.to_connector_meta(),
            None => Ok(Self::default()),
        }
    }

    pub fn get_apply_3d_secure(&self, auth_type: AuthenticationType) -> Apply3DSecure {
        self.apply_3d_secure.unwrap_or(match auth_type {
            AuthenticationType::ThreeDs => Apply3DSecure::Force,
            AuthenticationType::NoThreeDs => Apply3DSecure::UseAccountRules,
        })
    }

    pub fn get_allow_gift_aid(&self) -> Option<u8> {
        self.allow_gift_aid.map(u8::from)
    }
}

pub fn get_description(description: Option<&str>, default: &str) -> String {
    utils::truncate_chars(
        description
            .filter(|description| !description.trim().is_empty())
            .unwrap_or(default),
        constants::DESCRIPTION_MAX_LENGTH,
    )
}

// Gateway statuses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum SagepayStatus {
    #[serde(rename = "OK")]
    #[strum(serialize = "OK")]
    Ok,
    #[serde(rename = "OK REPEATED")]
    #[strum(serialize = "OK REPEATED")]
    OkRepeated,
    #[serde(rename = "REGISTERED")]
    #[strum(serialize = "REGISTERED")]
    Registered,
    #[serde(rename = "AUTHENTICATED")]
    #[strum(serialize = "AUTHENTICATED")]
    Authenticated,
    #[serde(rename = "PENDING")]
    #[strum(serialize = "PENDING")]
    Pending,
    #[serde(rename = "NOTAUTHED")]
    #[strum(serialize = "NOTAUTHED")]
    NotAuthed,
    #[serde(rename = "REJECTED")]
    #[strum(serialize = "REJECTED")]
    Rejected,
    #[serde(rename = "ABORT")]
    #[strum(serialize = "ABORT")]
    Abort,
    #[serde(rename = "ERROR")]
    #[strum(serialize = "ERROR")]
    Error,
    #[serde(rename = "INVALID")]
    #[strum(serialize = "INVALID")]
    Invalid,
    #[serde(rename = "MALFORMED")]
    #[strum(serialize = "MALFORMED")]
    Malformed,
    #[serde(rename = "3DAUTH")]
    #[strum(serialize = "3DAUTH")]
    ThreeDAuth,
    #[serde(rename = "PPREDIRECT")]
    #[strum(serialize = "PPREDIRECT")]
    PpRedirect,
    #[serde(other)]
    #[strum(serialize = "UNKNOWN")]
    Unknown,
}

impl SagepayStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok | Self::OkRepeated)
    }

    /// Attempt status of a registration or notification answer
    pub fn get_attempt_status(&self, is_auto_capture: bool) -> AttemptStatus {
        match self {
            Self::Ok | Self::OkRepeated => {
                if is_auto_capture {
                    AttemptStatus::Charged
                } else {
                    AttemptStatus::Authorized
                }
            }
            Self::Registered | Self::Authenticated => AttemptStatus::Authorized,
            Self::ThreeDAuth | Self::PpRedirect => AttemptStatus::AuthenticationPending,
            Self::Pending => AttemptStatus::Pending,
            Self::NotAuthed => AttemptStatus::AuthorizationFailed,
            Self::Abort
            | Self::Rejected
            | Self::Error
            | Self::Invalid
            | Self::Malformed
            | Self::Unknown => AttemptStatus::Failure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagepayStatusDetail {
    pub code: Option<String>,
    pub message: String,
}

impl SagepayStatusDetail {
    pub fn parse(detail: &str) -> Self {
        match detail.split_once(constants::STATUS_DETAIL_CODE_SEPARATOR) {
            Some((code, message))
                if !code.trim().is_empty() && code.trim().chars().all(|c| c.is_ascii_digit()) =>
            {
                Self {
                    code: Some(code.trim().to_string()),
                    message: message.trim().to_string(),
                }
            }
            _ => Self {
                code: None,
                message: detail.trim().to_string(),
            },
        }
    }
}

// Key=Value bodies
/// Splits `Key=Value` pairs on `separator`. Only the first `=` of a pair splits, so values may
/// contain `=`; empty pairs are skipped.
pub fn split_key_value_pairs(text: &str, separator: char) -> serde_json::Map<String, Value> {
    text.split(separator)
        .map(|pair| pair.trim_end_matches('\r'))
        .filter(|pair| !pair.trim().is_empty())
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), Value::String(value.to_string())))
        .collect()
}

/// Parses a gateway response body: `Key=Value` lines separated by CRLF (LF tolerated)
pub fn parse_key_value_response<T: DeserializeOwned>(
    body: &[u8],
    type_name: &'static str,
) -> Result<T, Error> {
    let text = std::str::from_utf8(body)
        .change_context(ConnectorError::ResponseDeserializationFailed)?;
    Value::Object(split_key_value_pairs(text, '\n'))
        .parse_value(type_name)
        .change_context(ConnectorError::ResponseDeserializationFailed)
}

// Transaction reference
/// Correlation token handed back as the connector transaction id. Fields are declared in
/// lexicographic order so the JSON keys come out sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReference {
    #[serde(
        rename = "SecurityKey",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub security_key: Option<Secret<String>>,
    #[serde(rename = "TxAuthNo", default, skip_serializing_if = "Option::is_none")]
    pub tx_auth_no: Option<String>,
    #[serde(rename = "VPSTxId", default, skip_serializing_if = "Option::is_none")]
    pub vps_tx_id: Option<String>,
    #[serde(rename = "VendorTxCode")]
    pub vendor_tx_code: String,
}

impl TransactionReference {
    pub fn new(vendor_tx_code: String) -> Self {
        Self {
            security_key: None,
            tx_auth_no: None,
            vps_tx_id: None,
            vendor_tx_code,
        }
    }

    pub fn from_response(vendor_tx_code: &str, response: &SagepayResponse) -> Self {
        Self {
            security_key: response.security_key.clone(),
            tx_auth_no: response.tx_auth_no.clone(),
            vps_tx_id: response.vps_tx_id.clone(),
            vendor_tx_code: vendor_tx_code.to_string(),
        }
    }

    pub fn encode(&self) -> Result<String, Error> {
        serde_json::to_string(self).change_context(ConnectorError::ResponseHandlingFailed)
    }

    pub fn decode(reference: &str) -> Result<Self, Error> {
        serde_json::from_str(reference)
            .change_context(ConnectorError::InvalidConnectorTransactionReference)
    }

    pub fn get_vps_tx_id(&self) -> Result<String, Error> {
        self.vps_tx_id
            .clone()
            .ok_or_else(missing_field_err(constants::fields::VPS_TX_ID))
    }

    pub fn get_security_key(&self) -> Result<Secret<String>, Error> {
        self.security_key
            .clone()
            .ok_or_else(missing_field_err(constants::fields::SECURITY_KEY))
    }
}

// Card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SagepayCardType {
    #[serde(rename = "VISA")]
    Visa,
    #[serde(rename = "MC")]
    Mastercard,
    #[serde(rename = "MAESTRO")]
    Maestro,
    #[serde(rename = "AMEX")]
    Amex,
    #[serde(rename = "DC")]
    DinersClub,
    #[serde(rename = "JCB")]
    Jcb,
    #[serde(rename = "PAYPAL")]
    PayPal,
}

impl TryFrom<&Card> for SagepayCardType {
    type Error = Error;
    fn try_from(card: &Card) -> Result<Self, Self::Error> {
        match card.get_card_network()? {
            common_enums::CardNetwork::Visa => Ok(Self::Visa),
            common_enums::CardNetwork::Mastercard => Ok(Self::Mastercard),
            common_enums::CardNetwork::Maestro => Ok(Self::Maestro),
            common_enums::CardNetwork::AmericanExpress => Ok(Self::Amex),
            common_enums::CardNetwork::DinersClub => Ok(Self::DinersClub),
            common_enums::CardNetwork::JCB => Ok(Self::Jcb),
            network @ (common_enums::CardNetwork::Discover
            | common_enums::CardNetwork::UnionPay) => Err(ConnectorError::NotSupported {
                message: format!("{network} cards"),
                connector: "sagepay",
            }
            .into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SagepayCardDetails {
    #[serde(rename = "CardHolder")]
    pub card_holder: Secret<String>,
    #[serde(rename = "CardNumber")]
    pub card_number: cards::CardNumber,
    #[serde(rename = "ExpiryDate")]
    pub expiry_date: Secret<String>,
    #[serde(rename = "CV2")]
    pub cv2: Secret<String>,
    #[serde(rename = "CardType")]
    pub card_type: SagepayCardType,
}

impl SagepayCardDetails {
    /// The holder name falls back to the billing name when the card carries none
    pub fn try_new(card: &Card, billing_name: Option<Secret<String>>) -> Result<Self, Error> {
        Ok(Self {
            card_holder: card
                .card_holder_name
                .clone()
                .or(billing_name)
                .ok_or_else(missing_field_err(
                    "payment_method_data.card.card_holder_name",
                ))?,
            card_number: card.card_number.clone(),
            expiry_date: card.get_expiry_date_as_mmyy()?,
            cv2: card.card_cvc.clone(),
            card_type: SagepayCardType::try_from(card)?,
        })
    }
}

// Addresses
struct AddressFieldNames {
    first_name: &'static str,
    last_name: &'static str,
    line1: &'static str,
    city: &'static str,
    country: &'static str,
}

const BILLING_FIELDS: AddressFieldNames = AddressFieldNames {
    first_name: "billing.address.first_name",
    last_name: "billing.address.last_name",
    line1: "billing.address.line1",
    city: "billing.address.city",
    country: "billing.address.country",
};

const SHIPPING_FIELDS: AddressFieldNames = AddressFieldNames {
    first_name: "shipping.address.first_name",
    last_name: "shipping.address.last_name",
    line1: "shipping.address.line1",
    city: "shipping.address.city",
    country: "shipping.address.country",
};

struct SagepayAddressParts {
    surname: Secret<String>,
    firstnames: Secret<String>,
    address1: Secret<String>,
    address2: Option<Secret<String>>,
    city: Secret<String>,
    post_code: Option<Secret<String>>,
    country: CountryAlpha2,
    state: Option<Secret<String>>,
    phone: Option<Secret<String>>,
}

impl SagepayAddressParts {
    fn try_new(address: &Address, fields: &AddressFieldNames) -> Result<Self, Error> {
        let details: &AddressDetails = address
            .address
            .as_ref()
            .ok_or_else(missing_field_err(fields.line1))?;
        let country = details
            .country
            .ok_or_else(missing_field_err(fields.country))?;
        Ok(Self {
            surname: details
                .last_name
                .clone()
                .ok_or_else(missing_field_err(fields.last_name))?,
            firstnames: details
                .first_name
                .clone()
                .ok_or_else(missing_field_err(fields.first_name))?,
            address1: details
                .line1
                .clone()
                .ok_or_else(missing_field_err(fields.line1))?,
            address2: details.line2.clone(),
            city: details
                .city
                .clone()
                .ok_or_else(missing_field_err(fields.city))?,
            post_code: details.zip.clone(),
            state: details
                .state
                .clone()
                .filter(|_| country == constants::STATE_COUNTRY),
            country,
            phone: address
                .phone
                .as_ref()
                .and_then(|phone| phone.get_number_with_country_code()),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SagepayBillingDetails {
    #[serde(rename = "BillingSurname")]
    pub surname: Secret<String>,
    #[serde(rename = "BillingFirstnames")]
    pub firstnames: Secret<String>,
    #[serde(rename = "BillingAddress1")]
    pub address1: Secret<String>,
    #[serde(rename = "BillingAddress2", skip_serializing_if = "Option::is_none")]
    pub address2: Option<Secret<String>>,
    #[serde(rename = "BillingCity")]
    pub city: Secret<String>,
    #[serde(rename = "BillingPostCode", skip_serializing_if = "Option::is_none")]
    pub post_code: Option<Secret<String>>,
    #[serde(rename = "BillingCountry")]
    pub country: CountryAlpha2,
    #[serde(rename = "BillingState", skip_serializing_if = "Option::is_none")]
    pub state: Option<Secret<String>>,
    #[serde(rename = "BillingPhone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Secret<String>>,
}

impl From<SagepayAddressParts> for SagepayBillingDetails {
    fn from(parts: SagepayAddressParts) -> Self {
        Self {
            surname: parts.surname,
            firstnames: parts.firstnames,
            address1: parts.address1,
            address2: parts.address2,
            city: parts.city,
            post_code: parts.post_code,
            country: parts.country,
            state: parts.state,
            phone: parts.phone,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SagepayDeliveryDetails {
    #[serde(rename = "DeliverySurname")]
    pub surname: Secret<String>,
    #[serde(rename = "DeliveryFirstnames")]
    pub firstnames: Secret<String>,
    #[serde(rename = "DeliveryAddress1")]
    pub address1: Secret<String>,
    #[serde(rename = "DeliveryAddress2", skip_serializing_if = "Option::is_none")]
    pub address2: Option<Secret<String>>,
    #[serde(rename = "DeliveryCity")]
    pub city: Secret<String>,
    #[serde(rename = "DeliveryPostCode", skip_serializing_if = "Option::is_none")]
    pub post_code: Option<Secret<String>>,
    #[serde(rename = "DeliveryCountry")]
    pub country: CountryAlpha2,
    #[serde(rename = "DeliveryState", skip_serializing_if = "Option::is_none")]
    pub state: Option<Secret<String>>,
    #[serde(rename = "DeliveryPhone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Secret<String>>,
}

impl From<SagepayAddressParts> for SagepayDeliveryDetails {
    fn from(parts: SagepayAddressParts) -> Self {
        Self {
            surname: parts.surname,
            firstnames: parts.firstnames,
            address1: parts.address1,
            address2: parts.address2,
            city: parts.city,
            post_code: parts.post_code,
            country: parts.country,
            state: parts.state,
            phone: parts.phone,
        }
    }
}

/// Billing and delivery blocks; delivery falls back to billing field by field
#[derive(Debug, Clone, Serialize)]
pub struct SagepayCustomerAddresses {
    #[serde(flatten)]
    pub billing: SagepayBillingDetails,
    #[serde(flatten)]
    pub delivery: SagepayDeliveryDetails,
}

impl TryFrom<&PaymentFlowData> for SagepayCustomerAddresses {
    type Error = Error;
    fn try_from(data: &PaymentFlowData) -> Result<Self, Self::Error> {
        let billing = data.get_billing()?;
        let delivery = match data.get_optional_shipping() {
            Some(shipping) => SagepayAddressParts::try_new(
                &shipping.clone().unify_address(Some(billing)),
                &SHIPPING_FIELDS,
            )?,
            None => SagepayAddressParts::try_new(billing, &BILLING_FIELDS)?,
        };
        Ok(Self {
            billing: SagepayAddressParts::try_new(billing, &BILLING_FIELDS)?.into(),
            delivery: delivery.into(),
        })
    }
}

// 3-D Secure 2 browser data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ChallengeWindowSize {
    #[serde(rename = "01")]
    Small,
    #[serde(rename = "02")]
    Medium,
    #[serde(rename = "03")]
    Large,
    #[serde(rename = "04")]
    ExtraLarge,
    #[default]
    #[serde(rename = "05")]
    FullScreen,
}

#[derive(Debug, Clone, Serialize)]
pub struct SagepayBrowserDetails {
    #[serde(rename = "BrowserJavascriptEnabled")]
    pub javascript_enabled: u8,
    #[serde(rename = "BrowserJavaEnabled", skip_serializing_if = "Option::is_none")]
    pub java_enabled: Option<u8>,
    #[serde(rename = "BrowserLanguage", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "BrowserColorDepth", skip_serializing_if = "Option::is_none")]
    pub color_depth: Option<u8>,
    #[serde(rename = "BrowserScreenHeight", skip_serializing_if = "Option::is_none")]
    pub screen_height: Option<u32>,
    #[serde(rename = "BrowserScreenWidth", skip_serializing_if = "Option::is_none")]
    pub screen_width: Option<u32>,
    #[serde(rename = "BrowserTZ", skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(rename = "BrowserAcceptHeader")]
    pub accept_header: String,
    #[serde(rename = "BrowserUserAgent")]
    pub user_agent: String,
    #[serde(rename = "ThreeDSNotificationURL")]
    pub three_ds_notification_url: String,
    #[serde(rename = "ChallengeWindowSize")]
    pub challenge_window_size: ChallengeWindowSize,
}

impl SagepayBrowserDetails {
    pub fn try_new(
        browser_info: &BrowserInformation,
        three_ds_notification_url: String,
    ) -> Result<Self, Error> {
        Ok(Self {
            javascript_enabled: u8::from(browser_info.java_script_enabled.unwrap_or(false)),
            java_enabled: browser_info.java_enabled.map(u8::from),
            language: browser_info.language.clone(),
            color_depth: browser_info.color_depth,
            screen_height: browser_info.screen_height,
            screen_width: browser_info.screen_width,
            time_zone: browser_info.time_zone.map(|offset| format!("{offset:+}")),
            accept_header: browser_info.get_accept_header()?,
            user_agent: browser_info.get_user_agent()?,
            three_ds_notification_url,
            challenge_window_size: ChallengeWindowSize::default(),
        })
    }
}

// Responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagepayResponse {
    #[serde(rename = "VPSProtocol")]
    pub vps_protocol: Option<String>,
    #[serde(rename = "Status")]
    pub status: SagepayStatus,
    #[serde(rename = "StatusDetail")]
    pub status_detail: Option<String>,
    #[serde(rename = "VPSTxId")]
    pub vps_tx_id: Option<String>,
    #[serde(rename = "SecurityKey")]
    pub security_key: Option<Secret<String>>,
    #[serde(rename = "TxAuthNo")]
    pub tx_auth_no: Option<String>,
    #[serde(rename = "AVSCV2")]
    pub avs_cv2: Option<String>,
    #[serde(rename = "AddressResult")]
    pub address_result: Option<String>,
    #[serde(rename = "PostCodeResult")]
    pub post_code_result: Option<String>,
    #[serde(rename = "CV2Result")]
    pub cv2_result: Option<String>,
    #[serde(rename = "3DSecureStatus")]
    pub three_d_secure_status: Option<String>,
    #[serde(rename = "CAVV")]
    pub cavv: Option<Secret<String>>,
    #[serde(rename = "Token")]
    pub token: Option<Secret<String>>,
    #[serde(rename = "ACSURL")]
    pub acs_url: Option<String>,
    #[serde(rename = "PAReq")]
    pub pa_req: Option<Secret<String>>,
    #[serde(rename = "MD")]
    pub md: Option<String>,
    #[serde(rename = "CReq")]
    pub c_req: Option<Secret<String>>,
    #[serde(rename = "ACSTransID")]
    pub acs_trans_id: Option<String>,
    #[serde(rename = "DSTransID")]
    pub ds_trans_id: Option<String>,
    #[serde(rename = "PayPalRedirectURL")]
    pub paypal_redirect_url: Option<String>,
    #[serde(rename = "NextURL")]
    pub next_url: Option<String>,
    #[serde(rename = "DeclineCode")]
    pub decline_code: Option<String>,
    #[serde(rename = "BankAuthCode")]
    pub bank_auth_code: Option<String>,
    #[serde(rename = "SchemeTraceID")]
    pub scheme_trace_id: Option<String>,
}

impl SagepayResponse {
    pub fn get_vps_tx_id(&self) -> Result<String, Error> {
        self.vps_tx_id
            .clone()
            .ok_or_else(missing_field_err(constants::fields::VPS_TX_ID))
    }

    pub fn to_error_response(
        &self,
        http_code: u16,
        attempt_status: Option<AttemptStatus>,
    ) -> ErrorResponse {
        let detail = self.status_detail.as_deref().map(SagepayStatusDetail::parse);
        ErrorResponse {
            code: detail
                .as_ref()
                .and_then(|detail| detail.code.clone())
                .unwrap_or_else(|| self.status.to_string()),
            message: detail
                .map(|detail| detail.message)
                .unwrap_or_else(|| consts::NO_ERROR_MESSAGE.to_string()),
            reason: self.status_detail.clone(),
            status_code: http_code,
            attempt_status,
            connector_transaction_id: self.vps_tx_id.clone(),
            network_decline_code: self.decline_code.clone(),
            network_advice_code: None,
            network_error_message: None,
        }
    }

    /// ACS form for a `3DAUTH` answer: `creq`/`threeDSSessionData` for 3-D Secure 2, otherwise
    /// `PaReq`/`TermUrl`/`MD`
    pub fn get_three_ds_form(&self, term_url: Option<&str>) -> Result<RedirectForm, Error> {
        let endpoint = self
            .acs_url
            .clone()
            .ok_or_else(missing_field_err("ACSURL"))?;
        let form_fields = match (&self.c_req, &self.pa_req) {
            (Some(c_req), _) => HashMap::from([
                ("creq".to_string(), c_req.peek().clone()),
                ("threeDSSessionData".to_string(), self.get_vps_tx_id()?),
            ]),
            (None, Some(pa_req)) => HashMap::from([
                ("PaReq".to_string(), pa_req.peek().clone()),
                (
                    "TermUrl".to_string(),
                    term_url
                        .ok_or_else(missing_field_err("complete_authorize_url"))?
                        .to_string(),
                ),
                (
                    "MD".to_string(),
                    self.md.clone().ok_or_else(missing_field_err("MD"))?,
                ),
            ]),
            (None, None) => Err(missing_field_err("CReq")())?,
        };
        Ok(RedirectForm::Form {
            endpoint,
            method: Method::Post,
            form_fields,
        })
    }

    /// Token issued alongside a payment; repeats are made against `transaction_reference`
    fn get_mandate_reference(&self, transaction_reference: &str) -> Option<Box<MandateReference>> {
        self.token.as_ref().map(|token| {
            Box::new(MandateReference {
                connector_mandate_id: Some(token.peek().clone()),
                payment_method_id: None,
                connector_mandate_request_reference_id: Some(transaction_reference.to_string()),
            })
        })
    }
}

pub fn get_redirect_form(url: &str, method: Method) -> Result<RedirectForm, Error> {
    let url = url::Url::parse(url).change_context(ConnectorError::ResponseHandlingFailed)?;
    Ok(RedirectForm::from((url, method)))
}

/// Maps a registration style answer (Direct register, 3-D Secure callback, repeat) onto the
/// attempt status and the flow response
pub fn get_payment_outcome(
    response: &SagepayResponse,
    vendor_tx_code: &str,
    is_auto_capture: bool,
    term_url: Option<&str>,
    http_code: u16,
) -> Result<(AttemptStatus, Result<PaymentsResponseData, ErrorResponse>), Error> {
    let status = response.status.get_attempt_status(is_auto_capture);
    if matches!(
        status,
        AttemptStatus::AuthorizationFailed | AttemptStatus::Failure
    ) {
        return Ok((
            status,
            Err(response.to_error_response(http_code, Some(status))),
        ));
    }

    let redirection_data = match response.status {
        SagepayStatus::ThreeDAuth => Some(Box::new(response.get_three_ds_form(term_url)?)),
        SagepayStatus::PpRedirect => Some(Box::new(get_redirect_form(
            response
                .paypal_redirect_url
                .as_deref()
                .ok_or_else(missing_field_err("PayPalRedirectURL"))?,
            Method::Get,
        )?)),
        _ => None,
    };

    let reference = TransactionReference::from_response(vendor_tx_code, response).encode()?;
    Ok((
        status,
        Ok(PaymentsResponseData::TransactionResponse {
            mandate_reference: response.get_mandate_reference(&reference),
            resource_id: ResponseId::ConnectorTransactionId(reference),
            redirection_data,
            connector_metadata: None,
            network_txn_id: response.scheme_trace_id.clone(),
            connector_response_reference_id: Some(vendor_tx_code.to_string()),
            incremental_authorization_allowed: None,
            status_code: http_code,
        }),
    ))
}

// Follow-up requests shared by Direct and Server
#[derive(Debug, Serialize)]
pub struct SagepayReleaseRequest {
    #[serde(rename = "VPSProtocol")]
    pub vps_protocol: ProtocolVersion,
    #[serde(rename = "TxType")]
    pub tx_type: TxType,
    #[serde(rename = "Vendor")]
    pub vendor: Secret<String>,
    #[serde(rename = "VendorTxCode")]
    pub vendor_tx_code: String,
    #[serde(rename = "VPSTxId")]
    pub vps_tx_id: String,
    #[serde(rename = "SecurityKey")]
    pub security_key: Secret<String>,
    #[serde(rename = "TxAuthNo", skip_serializing_if = "Option::is_none")]
    pub tx_auth_no: Option<String>,
    #[serde(rename = "ReleaseAmount")]
    pub release_amount: StringMajorUnit,
}

impl
    TryFrom<
        SagepayRouterData<
            &RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>,
        >,
    > for SagepayReleaseRequest
{
    type Error = Error;
    fn try_from(
        item: SagepayRouterData<
            &RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let router_data = item.router_data;
        let auth = SagepayAuthType::try_from(&router_data.connector_auth_type)?;
        let metadata = SagepayMetadata::from_payment_flow_data(&router_data.resource_common_data)?;
        let reference =
            TransactionReference::decode(&router_data.request.get_connector_transaction_id()?)?;
        Ok(Self {
            vps_protocol: metadata.protocol_version,
            tx_type: TxType::Release,
            vendor: auth.vendor,
            vps_tx_id: reference.get_vps_tx_id()?,
            security_key: reference.get_security_key()?,
            tx_auth_no: reference.tx_auth_no,
            vendor_tx_code: reference.vendor_tx_code,
            release_amount: item.amount,
        })
    }
}

/// `ABORT` of a deferred payment or `VOID` of a captured one
#[derive(Debug, Serialize)]
pub struct SagepayCancelRequest {
    #[serde(rename = "VPSProtocol")]
    pub vps_protocol: ProtocolVersion,
    #[serde(rename = "TxType")]
    pub tx_type: TxType,
    #[serde(rename = "Vendor")]
    pub vendor: Secret<String>,
    #[serde(rename = "VendorTxCode")]
    pub vendor_tx_code: String,
    #[serde(rename = "VPSTxId")]
    pub vps_tx_id: String,
    #[serde(rename = "SecurityKey")]
    pub security_key: Secret<String>,
    #[serde(rename = "TxAuthNo", skip_serializing_if = "Option::is_none")]
    pub tx_auth_no: Option<String>,
}

impl SagepayCancelRequest {
    fn try_new(
        tx_type: TxType,
        data: &PaymentFlowData,
        auth_type: &ConnectorAuthType,
        connector_transaction_id: &str,
    ) -> Result<Self, Error> {
        let auth = SagepayAuthType::try_from(auth_type)?;
        let metadata = SagepayMetadata::from_payment_flow_data(data)?;
        let reference = TransactionReference::decode(connector_transaction_id)?;
        Ok(Self {
            vps_protocol: metadata.protocol_version,
            tx_type,
            vendor: auth.vendor,
            vps_tx_id: reference.get_vps_tx_id()?,
            security_key: reference.get_security_key()?,
            tx_auth_no: reference.tx_auth_no,
            vendor_tx_code: reference.vendor_tx_code,
        })
    }
}

impl TryFrom<&RouterDataV2<Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>>
    for SagepayCancelRequest
{
    type Error = Error;
    fn try_from(
        item: &RouterDataV2<Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>,
    ) -> Result<Self, Self::Error> {
        Self::try_new(
            TxType::Abort,
            &item.resource_common_data,
            &item.connector_auth_type,
            &item.request.connector_transaction_id,
        )
    }
}

impl
    TryFrom<
        &RouterDataV2<VoidPC, PaymentFlowData, PaymentsCancelPostCaptureData, PaymentsResponseData>,
    > for SagepayCancelRequest
{
    type Error = Error;
    fn try_from(
        item: &RouterDataV2<
            VoidPC,
            PaymentFlowData,
            PaymentsCancelPostCaptureData,
            PaymentsResponseData,
        >,
    ) -> Result<Self, Self::Error> {
        Self::try_new(
            TxType::Void,
            &item.resource_common_data,
            &item.connector_auth_type,
            &item.request.connector_transaction_id,
        )
    }
}

/// `REFUND`, `REPEAT` and `REPEATDEFERRED` point at an earlier transaction through the
/// `Related*` fields
#[derive(Debug, Serialize)]
pub struct SagepayRelatedTransactionRequest {
    #[serde(rename = "VPSProtocol")]
    pub vps_protocol: ProtocolVersion,
    #[serde(rename = "TxType")]
    pub tx_type: TxType,
    #[serde(rename = "Vendor")]
    pub vendor: Secret<String>,
    #[serde(rename = "VendorTxCode")]
    pub vendor_tx_code: String,
    #[serde(rename = "Amount")]
    pub amount: StringMajorUnit,
    #[serde(rename = "Currency")]
    pub currency: Currency,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "RelatedVPSTxId")]
    pub related_vps_tx_id: String,
    #[serde(rename = "RelatedVendorTxCode")]
    pub related_vendor_tx_code: String,
    #[serde(rename = "RelatedSecurityKey")]
    pub related_security_key: Secret<String>,
    #[serde(rename = "RelatedTxAuthNo", skip_serializing_if = "Option::is_none")]
    pub related_tx_auth_no: Option<String>,
}

impl
    TryFrom<SagepayRouterData<&RouterDataV2<Refund, RefundFlowData, RefundsData, RefundsResponseData>>>
    for SagepayRelatedTransactionRequest
{
    type Error = Error;
    fn try_from(
        item: SagepayRouterData<
            &RouterDataV2<Refund, RefundFlowData, RefundsData, RefundsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let router_data = item.router_data;
        let auth = SagepayAuthType::try_from(&router_data.connector_auth_type)?;
        let metadata = SagepayMetadata::from_refund_flow_data(&router_data.resource_common_data)?;
        let related = TransactionReference::decode(&router_data.request.connector_transaction_id)?;
        Ok(Self {
            vps_protocol: metadata.protocol_version,
            tx_type: TxType::Refund,
            vendor: auth.vendor,
            vendor_tx_code: router_data.request.refund_id.clone(),
            amount: item.amount,
            currency: router_data.request.currency,
            description: get_description(
                router_data.request.reason.as_deref(),
                constants::DEFAULT_REFUND_DESCRIPTION,
            ),
            related_vps_tx_id: related.get_vps_tx_id()?,
            related_security_key: related.get_security_key()?,
            related_tx_auth_no: related.tx_auth_no,
            related_vendor_tx_code: related.vendor_tx_code,
        })
    }
}

impl
    TryFrom<
        SagepayRouterData<
            &RouterDataV2<RepeatPayment, PaymentFlowData, RepeatPaymentData, PaymentsResponseData>,
        >,
    > for SagepayRelatedTransactionRequest
{
    type Error = Error;
    fn try_from(
        item: SagepayRouterData<
            &RouterDataV2<RepeatPayment, PaymentFlowData, RepeatPaymentData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let router_data = item.router_data;
        let auth = SagepayAuthType::try_from(&router_data.connector_auth_type)?;
        let metadata = SagepayMetadata::from_payment_flow_data(&router_data.resource_common_data)?;
        let related = TransactionReference::decode(
            &router_data.request.get_related_transaction_reference()?,
        )?;
        let description = router_data
            .request
            .description
            .as_deref()
            .or(router_data.resource_common_data.description.as_deref());
        Ok(Self {
            vps_protocol: metadata.protocol_version,
            tx_type: TxType::for_repeat(router_data.request.is_auto_capture()?),
            vendor: auth.vendor,
            vendor_tx_code: router_data
                .resource_common_data
                .connector_request_reference_id
                .clone(),
            amount: item.amount,
            currency: router_data.request.currency,
            description: get_description(description, constants::DEFAULT_DESCRIPTION),
            related_vps_tx_id: related.get_vps_tx_id()?,
            related_security_key: related.get_security_key()?,
            related_tx_auth_no: related.tx_auth_no,
            related_vendor_tx_code: related.vendor_tx_code,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SagepayRemoveTokenRequest {
    #[serde(rename = "VPSProtocol")]
    pub vps_protocol: ProtocolVersion,
    #[serde(rename = "TxType")]
    pub tx_type: TxType,
    #[serde(rename = "Vendor")]
    pub vendor: Secret<String>,
    #[serde(rename = "Token")]
    pub token: Secret<String>,
}

impl
    TryFrom<
        &RouterDataV2<
            MandateRevoke,
            PaymentFlowData,
            MandateRevokeRequestData,
            MandateRevokeResponseData,
        >,
    > for SagepayRemoveTokenRequest
{
    type Error = Error;
    fn try_from(
        item: &RouterDataV2<
            MandateRevoke,
            PaymentFlowData,
            MandateRevokeRequestData,
            MandateRevokeResponseData,
        >,
    ) -> Result<Self, Self::Error> {
        let auth = SagepayAuthType::try_from(&item.connector_auth_type)?;
        let metadata = SagepayMetadata::from_payment_flow_data(&item.resource_common_data)?;
        Ok(Self {
            vps_protocol: metadata.protocol_version,
            tx_type: TxType::RemoveToken,
            vendor: auth.vendor,
            token: item.request.get_connector_mandate_id()?,
        })
    }
}

// Follow-up responses
fn get_follow_up_response<F, Req>(
    response: SagepayResponse,
    router_data: RouterDataV2<F, PaymentFlowData, Req, PaymentsResponseData>,
    http_code: u16,
    resource_id: ResponseId,
    success_status: AttemptStatus,
    failure_status: AttemptStatus,
) -> RouterDataV2<F, PaymentFlowData, Req, PaymentsResponseData> {
    if response.status.is_success() {
        let connector_response_reference_id = Some(
            router_data
                .resource_common_data
                .connector_request_reference_id
                .clone(),
        );
        RouterDataV2 {
            resource_common_data: PaymentFlowData {
                status: success_status,
                ..router_data.resource_common_data
            },
            response: Ok(PaymentsResponseData::TransactionResponse {
                resource_id,
                redirection_data: None,
                connector_metadata: None,
                mandate_reference: None,
                network_txn_id: None,
                connector_response_reference_id,
                incremental_authorization_allowed: None,
                status_code: http_code,
            }),
            ..router_data
        }
    } else {
        tracing::warn!(status = %response.status, "sagepay follow-up request declined");
        RouterDataV2 {
            resource_common_data: PaymentFlowData {
                status: failure_status,
                ..router_data.resource_common_data
            },
            response: Err(response.to_error_response(http_code, Some(failure_status))),
            ..router_data
        }
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepayResponse,
            RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>,
        >,
    > for RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepayResponse,
            RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let resource_id = item.router_data.request.connector_transaction_id.clone();
        Ok(get_follow_up_response(
            item.response,
            item.router_data,
            item.http_code,
            resource_id,
            AttemptStatus::Charged,
            AttemptStatus::CaptureFailed,
        ))
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepayResponse,
            RouterDataV2<Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>,
        >,
    > for RouterDataV2<Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepayResponse,
            RouterDataV2<Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let resource_id = ResponseId::ConnectorTransactionId(
            item.router_data.request.connector_transaction_id.clone(),
        );
        Ok(get_follow_up_response(
            item.response,
            item.router_data,
            item.http_code,
            resource_id,
            AttemptStatus::Voided,
            AttemptStatus::VoidFailed,
        ))
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepayResponse,
            RouterDataV2<
                VoidPC,
                PaymentFlowData,
                PaymentsCancelPostCaptureData,
                PaymentsResponseData,
            >,
        >,
    >
    for RouterDataV2<VoidPC, PaymentFlowData, PaymentsCancelPostCaptureData, PaymentsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepayResponse,
            RouterDataV2<
                VoidPC,
                PaymentFlowData,
                PaymentsCancelPostCaptureData,
                PaymentsResponseData,
            >,
        >,
    ) -> Result<Self, Self::Error> {
        let resource_id = ResponseId::ConnectorTransactionId(
            item.router_data.request.connector_transaction_id.clone(),
        );
        Ok(get_follow_up_response(
            item.response,
            item.router_data,
            item.http_code,
            resource_id,
            AttemptStatus::Voided,
            AttemptStatus::VoidFailed,
        ))
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepayResponse,
            RouterDataV2<RepeatPayment, PaymentFlowData, RepeatPaymentData, PaymentsResponseData>,
        >,
    > for RouterDataV2<RepeatPayment, PaymentFlowData, RepeatPaymentData, PaymentsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepayResponse,
            RouterDataV2<RepeatPayment, PaymentFlowData, RepeatPaymentData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let ResponseRouterData {
            response,
            router_data,
            http_code,
        } = item;
        let (status, response) = get_payment_outcome(
            &response,
            &router_data.resource_common_data.connector_request_reference_id,
            router_data.request.is_auto_capture()?,
            None,
            http_code,
        )?;
        Ok(Self {
            resource_common_data: PaymentFlowData {
                status,
                ..router_data.resource_common_data
            },
            response,
            ..router_data
        })
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepayResponse,
            RouterDataV2<Refund, RefundFlowData, RefundsData, RefundsResponseData>,
        >,
    > for RouterDataV2<Refund, RefundFlowData, RefundsData, RefundsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepayResponse,
            RouterDataV2<Refund, RefundFlowData, RefundsData, RefundsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let ResponseRouterData {
            response,
            router_data,
            http_code,
        } = item;
        if response.status.is_success() {
            let reference =
                TransactionReference::from_response(&router_data.request.refund_id, &response);
            Ok(Self {
                resource_common_data: RefundFlowData {
                    status: common_enums::RefundStatus::Success,
                    ..router_data.resource_common_data
                },
                response: Ok(RefundsResponseData {
                    connector_refund_id: reference.encode()?,
                    refund_status: common_enums::RefundStatus::Success,
                    status_code: http_code,
                }),
                ..router_data
            })
        } else {
            Ok(Self {
                resource_common_data: RefundFlowData {
                    status: common_enums::RefundStatus::Failure,
                    ..router_data.resource_common_data
                },
                response: Err(response.to_error_response(http_code, None)),
                ..router_data
            })
        }
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepayResponse,
            RouterDataV2<
                MandateRevoke,
                PaymentFlowData,
                MandateRevokeRequestData,
                MandateRevokeResponseData,
            >,
        >,
    >
    for RouterDataV2<
        MandateRevoke,
        PaymentFlowData,
        MandateRevokeRequestData,
        MandateRevokeResponseData,
    >
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepayResponse,
            RouterDataV2<
                MandateRevoke,
                PaymentFlowData,
                MandateRevokeRequestData,
                MandateRevokeResponseData,
            >,
        >,
    ) -> Result<Self, Self::Error> {
        let ResponseRouterData {
            response,
            router_data,
            http_code,
        } = item;
        let response = if response.status.is_success() {
            Ok(MandateRevokeResponseData {
                mandate_status: MandateStatus::Revoked,
                status_code: http_code,
            })
        } else {
            Err(response.to_error_response(http_code, None))
        };
        Ok(Self {
            response,
            ..router_data
        })
    }
}
