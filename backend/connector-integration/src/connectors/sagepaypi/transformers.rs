use std::collections::HashMap;

use base64::Engine;
use common_enums::{AttemptStatus, CountryAlpha2, Currency, RefundStatus};
use common_utils::{
    consts, pii::IpAddress, request::Method, Email, MinorUnit, PeekInterface, Secret,
};
use domain_types::{
    connector_flow::{
        Authorize, Capture, CompleteAuthorize, CreateSessionToken, PSync, PaymentMethodToken,
        Refund, RepeatPayment, Void, VoidPC,
    },
    connector_types::{
        MandateReference, MandateReferenceId, PaymentFlowData, PaymentMethodTokenResponse,
        PaymentMethodTokenizationData, PaymentVoidData, PaymentsAuthorizeData,
        PaymentsCancelPostCaptureData, PaymentsCaptureData, PaymentsCompleteAuthorizeData,
        PaymentsResponseData, PaymentsSyncData, RefundFlowData, RefundsData, RefundsResponseData,
        RepeatPaymentData, ResponseId, SessionTokenRequestData, SessionTokenResponseData,
    },
    errors::ConnectorError,
    payment_method_data::PaymentMethodData,
    router_data::{ConnectorAuthType, ErrorResponse},
    router_data_v2::RouterDataV2,
    router_request_types::BrowserInformation,
    router_response_types::RedirectForm,
    utils::missing_field_err,
};
use serde::{Deserialize, Serialize};

use crate::{
    connectors::sagepay::transformers::{get_description, Apply3DSecure, SagepayMetadata},
    types::ResponseRouterData,
    utils,
};

type Error = error_stack::Report<ConnectorError>;

const CONNECTOR_NAME: &str = "sagepaypi";

pub struct SagepaypiRouterData<T> {
    pub amount: MinorUnit,
    pub router_data: T,
}

impl<T> From<(MinorUnit, T)> for SagepaypiRouterData<T> {
    fn from((amount, router_data): (MinorUnit, T)) -> Self {
        Self {
            amount,
            router_data,
        }
    }
}

// Auth
/// Integration key and password for Basic auth; the vendor name opens merchant sessions
pub struct SagepaypiAuthType {
    pub integration_key: Secret<String>,
    pub integration_password: Secret<String>,
    pub vendor_name: Secret<String>,
}

impl TryFrom<&ConnectorAuthType> for SagepaypiAuthType {
    type Error = Error;
    fn try_from(auth_type: &ConnectorAuthType) -> Result<Self, Self::Error> {
        match auth_type {
            ConnectorAuthType::SignatureKey {
                api_key,
                key1,
                api_secret,
            } => Ok(Self {
                integration_key: api_key.to_owned(),
                integration_password: key1.to_owned(),
                vendor_name: api_secret.to_owned(),
            }),
            _ => Err(ConnectorError::FailedToObtainAuthType.into()),
        }
    }
}

impl SagepaypiAuthType {
    pub fn get_basic_auth_header(&self) -> String {
        let credentials = format!(
            "{}:{}",
            self.integration_key.peek(),
            self.integration_password.peek()
        );
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials)
        )
    }
}

// Merchant session key
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiMerchantSessionKeyRequest {
    pub vendor_name: Secret<String>,
}

impl
    TryFrom<
        &RouterDataV2<
            CreateSessionToken,
            PaymentFlowData,
            SessionTokenRequestData,
            SessionTokenResponseData,
        >,
    > for SagepaypiMerchantSessionKeyRequest
{
    type Error = Error;
    fn try_from(
        item: &RouterDataV2<
            CreateSessionToken,
            PaymentFlowData,
            SessionTokenRequestData,
            SessionTokenResponseData,
        >,
    ) -> Result<Self, Self::Error> {
        let auth = SagepaypiAuthType::try_from(&item.connector_auth_type)?;
        Ok(Self {
            vendor_name: auth.vendor_name,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiMerchantSessionKeyResponse {
    pub merchant_session_key: Secret<String>,
    pub expiry: Option<String>,
}

impl
    TryFrom<
        ResponseRouterData<
            SagepaypiMerchantSessionKeyResponse,
            RouterDataV2<
                CreateSessionToken,
                PaymentFlowData,
                SessionTokenRequestData,
                SessionTokenResponseData,
            >,
        >,
    >
    for RouterDataV2<
        CreateSessionToken,
        PaymentFlowData,
        SessionTokenRequestData,
        SessionTokenResponseData,
    >
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepaypiMerchantSessionKeyResponse,
            RouterDataV2<
                CreateSessionToken,
                PaymentFlowData,
                SessionTokenRequestData,
                SessionTokenResponseData,
            >,
        >,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            response: Ok(SessionTokenResponseData {
                session_token: item.response.merchant_session_key.peek().clone(),
            }),
            ..item.router_data
        })
    }
}

// Card identifiers
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiCardDetails {
    pub cardholder_name: Secret<String>,
    pub card_number: cards::CardNumber,
    pub expiry_date: Secret<String>,
    pub security_code: Secret<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiCardIdentifierRequest {
    pub card_details: SagepaypiCardDetails,
}

impl
    TryFrom<
        &RouterDataV2<
            PaymentMethodToken,
            PaymentFlowData,
            PaymentMethodTokenizationData,
            PaymentMethodTokenResponse,
        >,
    > for SagepaypiCardIdentifierRequest
{
    type Error = Error;
    fn try_from(
        item: &RouterDataV2<
            PaymentMethodToken,
            PaymentFlowData,
            PaymentMethodTokenizationData,
            PaymentMethodTokenResponse,
        >,
    ) -> Result<Self, Self::Error> {
        match &item.request.payment_method_data {
            PaymentMethodData::Card(card) => Ok(Self {
                card_details: SagepaypiCardDetails {
                    cardholder_name: card
                        .card_holder_name
                        .clone()
                        .or(item.resource_common_data.get_optional_billing_full_name())
                        .ok_or_else(missing_field_err(
                            "payment_method_data.card.card_holder_name",
                        ))?,
                    card_number: card.card_number.clone(),
                    expiry_date: card.get_expiry_date_as_mmyy()?,
                    security_code: card.card_cvc.clone(),
                },
            }),
            PaymentMethodData::Wallet(_)
            | PaymentMethodData::CardToken(_)
            | PaymentMethodData::MandatePayment => Err(ConnectorError::NotImplemented(
                utils::get_unimplemented_payment_method_error_message(CONNECTOR_NAME),
            )
            .into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiCardIdentifierResponse {
    pub card_identifier: Secret<String>,
    pub expiry: Option<String>,
    pub card_type: Option<String>,
}

impl
    TryFrom<
        ResponseRouterData<
            SagepaypiCardIdentifierResponse,
            RouterDataV2<
                PaymentMethodToken,
                PaymentFlowData,
                PaymentMethodTokenizationData,
                PaymentMethodTokenResponse,
            >,
        >,
    >
    for RouterDataV2<
        PaymentMethodToken,
        PaymentFlowData,
        PaymentMethodTokenizationData,
        PaymentMethodTokenResponse,
    >
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepaypiCardIdentifierResponse,
            RouterDataV2<
                PaymentMethodToken,
                PaymentFlowData,
                PaymentMethodTokenizationData,
                PaymentMethodTokenResponse,
            >,
        >,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            response: Ok(PaymentMethodTokenResponse {
                token: item.response.card_identifier.peek().clone(),
            }),
            ..item.router_data
        })
    }
}

// Transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SagepaypiTransactionType {
    Payment,
    Deferred,
    Authenticate,
    Repeat,
    Refund,
    #[serde(other)]
    Unknown,
}

impl SagepaypiTransactionType {
    fn for_payment(is_auto_capture: bool) -> Self {
        if is_auto_capture {
            Self::Payment
        } else {
            Self::Deferred
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SagepaypiApply3DSecure {
    #[serde(rename = "UseMSPSetting")]
    UseMspSetting,
    Force,
    Disable,
    ForceIgnoringRules,
}

impl From<Apply3DSecure> for SagepaypiApply3DSecure {
    fn from(apply_3d_secure: Apply3DSecure) -> Self {
        match apply_3d_secure {
            Apply3DSecure::UseAccountRules => Self::UseMspSetting,
            Apply3DSecure::Force => Self::Force,
            Apply3DSecure::Disable => Self::Disable,
            Apply3DSecure::ForceIgnoringRules => Self::ForceIgnoringRules,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiCard {
    pub merchant_session_key: Secret<String>,
    pub card_identifier: Secret<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reusable: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SagepaypiPaymentMethod {
    pub card: SagepaypiCard,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiBillingAddress {
    pub address1: Secret<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<Secret<String>>,
    pub city: Secret<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<Secret<String>>,
    pub country: CountryAlpha2,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Secret<String>>,
}

impl TryFrom<&PaymentFlowData> for SagepaypiBillingAddress {
    type Error = Error;
    fn try_from(data: &PaymentFlowData) -> Result<Self, Self::Error> {
        let address = data.get_billing_address()?;
        let country = address
            .country
            .ok_or_else(missing_field_err("billing.address.country"))?;
        Ok(Self {
            address1: address
                .line1
                .clone()
                .ok_or_else(missing_field_err("billing.address.line1"))?,
            address2: address.line2.clone(),
            city: address
                .city
                .clone()
                .ok_or_else(missing_field_err("billing.address.city"))?,
            postal_code: address.zip.clone(),
            // state codes are only accepted for US addresses
            state: address
                .state
                .clone()
                .filter(|_| country == CountryAlpha2::US),
            country,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SagepaypiChallengeWindowSize {
    Small,
    Medium,
    Large,
    ExtraLarge,
    #[default]
    FullScreen,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiStrongCustomerAuthentication {
    #[serde(rename = "notificationURL")]
    pub notification_url: String,
    #[serde(rename = "browserIP")]
    pub browser_ip: Secret<String, IpAddress>,
    pub browser_accept_header: String,
    pub browser_javascript_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_java_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_color_depth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_screen_height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_screen_width: Option<String>,
    #[serde(rename = "browserTZ", skip_serializing_if = "Option::is_none")]
    pub browser_tz: Option<String>,
    pub browser_user_agent: String,
    pub challenge_window_size: SagepaypiChallengeWindowSize,
    pub trans_type: &'static str,
}

const GOODS_AND_SERVICE_PURCHASE: &str = "GoodsAndServicePurchase";

impl SagepaypiStrongCustomerAuthentication {
    fn try_new(browser_info: &BrowserInformation, notification_url: String) -> Result<Self, Error> {
        Ok(Self {
            notification_url,
            browser_ip: browser_info.get_ip_address()?,
            browser_accept_header: browser_info.get_accept_header()?,
            browser_javascript_enabled: browser_info.java_script_enabled.unwrap_or(false),
            browser_java_enabled: browser_info.java_enabled,
            browser_language: browser_info.language.clone(),
            browser_color_depth: browser_info.color_depth.map(|depth| depth.to_string()),
            browser_screen_height: browser_info.screen_height.map(|height| height.to_string()),
            browser_screen_width: browser_info.screen_width.map(|width| width.to_string()),
            browser_tz: browser_info.time_zone.map(|offset| format!("{offset:+}")),
            browser_user_agent: browser_info.get_user_agent()?,
            challenge_window_size: SagepaypiChallengeWindowSize::default(),
            trans_type: GOODS_AND_SERVICE_PURCHASE,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CofUsage {
    First,
    Subsequent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InitiatedType {
    #[serde(rename = "CIT")]
    Cit,
    #[serde(rename = "MIT")]
    Mit,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiCredentialType {
    pub cof_usage: CofUsage,
    pub initiated_type: InitiatedType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mit_type: Option<&'static str>,
}

const UNSCHEDULED_MIT: &str = "Unscheduled";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiPaymentRequest {
    pub transaction_type: SagepaypiTransactionType,
    pub payment_method: SagepaypiPaymentMethod,
    pub vendor_tx_code: String,
    pub amount: MinorUnit,
    pub currency: Currency,
    pub description: String,
    pub customer_first_name: Secret<String>,
    pub customer_last_name: Secret<String>,
    pub billing_address: SagepaypiBillingAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<Email>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<Secret<String>>,
    pub entry_method: &'static str,
    #[serde(rename = "apply3DSecure")]
    pub apply_3d_secure: SagepaypiApply3DSecure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strong_customer_authentication: Option<SagepaypiStrongCustomerAuthentication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<SagepaypiCredentialType>,
}

const ECOMMERCE_ENTRY_METHOD: &str = "Ecommerce";

impl
    TryFrom<
        SagepaypiRouterData<
            &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        >,
    > for SagepaypiPaymentRequest
{
    type Error = Error;
    fn try_from(
        item: SagepaypiRouterData<
            &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let router_data = item.router_data;
        let request = &router_data.request;
        let common_data = &router_data.resource_common_data;
        let merchant_session_key = Secret::new(common_data.get_session_token()?);

        let (card, credential_type) = match &request.payment_method_data {
            PaymentMethodData::Card(_) => {
                let save = request.is_customer_initiated_mandate_payment();
                let domain_types::router_data::PaymentMethodToken::Token(card_identifier) =
                    common_data.get_payment_method_token()?;
                (
                    SagepaypiCard {
                        merchant_session_key,
                        card_identifier,
                        save: save.then_some(true),
                        reusable: None,
                    },
                    save.then_some(SagepaypiCredentialType {
                        cof_usage: CofUsage::First,
                        initiated_type: InitiatedType::Cit,
                        mit_type: Some(UNSCHEDULED_MIT),
                    }),
                )
            }
            // a saved card identifier, kept as the mandate of an earlier payment
            PaymentMethodData::CardToken(_) | PaymentMethodData::MandatePayment => {
                let is_merchant_initiated = request.off_session.unwrap_or(false);
                (
                    SagepaypiCard {
                        merchant_session_key,
                        card_identifier: Secret::new(request.get_connector_mandate_id()?),
                        save: None,
                        reusable: Some(true),
                    },
                    Some(SagepaypiCredentialType {
                        cof_usage: CofUsage::Subsequent,
                        initiated_type: if is_merchant_initiated {
                            InitiatedType::Mit
                        } else {
                            InitiatedType::Cit
                        },
                        mit_type: is_merchant_initiated.then_some(UNSCHEDULED_MIT),
                    }),
                )
            }
            PaymentMethodData::Wallet(_) => Err(ConnectorError::NotImplemented(
                utils::get_unimplemented_payment_method_error_message(CONNECTOR_NAME),
            ))?,
        };

        let metadata = SagepayMetadata::from_payment_flow_data(common_data)?;
        let strong_customer_authentication = match &request.browser_info {
            Some(browser_info) => Some(SagepaypiStrongCustomerAuthentication::try_new(
                browser_info,
                request.get_complete_authorize_url()?,
            )?),
            None => None,
        };

        Ok(Self {
            transaction_type: SagepaypiTransactionType::for_payment(request.is_auto_capture()?),
            payment_method: SagepaypiPaymentMethod { card },
            vendor_tx_code: common_data.connector_request_reference_id.clone(),
            amount: item.amount,
            currency: request.currency,
            description: get_description(
                common_data.description.as_deref(),
                crate::connectors::sagepay::constants::DEFAULT_DESCRIPTION,
            ),
            customer_first_name: common_data.get_billing_first_name()?,
            customer_last_name: common_data.get_billing_last_name()?,
            billing_address: SagepaypiBillingAddress::try_from(common_data)?,
            customer_email: request
                .get_optional_email()
                .or(common_data.get_optional_billing_email()),
            customer_phone: common_data
                .get_optional_billing()
                .and_then(|billing| billing.phone.as_ref())
                .and_then(|phone| phone.get_number_with_country_code()),
            entry_method: ECOMMERCE_ENTRY_METHOD,
            apply_3d_secure: metadata.get_apply_3d_secure(common_data.auth_type).into(),
            strong_customer_authentication,
            credential_type,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiThreeDsChallengeRequest {
    pub c_res: Secret<String>,
    #[serde(rename = "threeDSSessionData")]
    pub three_ds_session_data: String,
}

impl
    TryFrom<
        &RouterDataV2<
            CompleteAuthorize,
            PaymentFlowData,
            PaymentsCompleteAuthorizeData,
            PaymentsResponseData,
        >,
    > for SagepaypiThreeDsChallengeRequest
{
    type Error = Error;
    fn try_from(
        item: &RouterDataV2<
            CompleteAuthorize,
            PaymentFlowData,
            PaymentsCompleteAuthorizeData,
            PaymentsResponseData,
        >,
    ) -> Result<Self, Self::Error> {
        let payload = item.request.get_redirect_response_payload()?;
        let c_res = utils::get_string_ignore_case(&payload, "cres").ok_or(
            ConnectorError::MissingConnectorRedirectionPayload { field_name: "cres" },
        )?;
        Ok(Self {
            c_res: Secret::new(c_res),
            three_ds_session_data: get_challenge_transaction_id(item)?,
        })
    }
}

/// The ACS echoes the transaction id back as `threeDSSessionData`
pub fn get_challenge_transaction_id(
    item: &RouterDataV2<
        CompleteAuthorize,
        PaymentFlowData,
        PaymentsCompleteAuthorizeData,
        PaymentsResponseData,
    >,
) -> Result<String, Error> {
    item.request
        .redirect_response
        .as_ref()
        .and_then(|response| response.payload.as_ref())
        .and_then(|payload| utils::get_string_ignore_case(payload.peek(), "threeDSSessionData"))
        .map_or_else(|| item.request.get_connector_transaction_id(), Ok)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum SagepaypiStatus {
    Ok,
    NotAuthed,
    Rejected,
    #[serde(rename = "3DAuth")]
    #[strum(serialize = "3DAuth")]
    ThreeDAuth,
    Malformed,
    Invalid,
    Error,
    #[serde(other)]
    Unknown,
}

impl SagepaypiStatus {
    pub fn get_attempt_status(
        &self,
        transaction_type: Option<SagepaypiTransactionType>,
        is_auto_capture: bool,
    ) -> AttemptStatus {
        match self {
            Self::Ok => match transaction_type
                .unwrap_or_else(|| SagepaypiTransactionType::for_payment(is_auto_capture))
            {
                SagepaypiTransactionType::Deferred | SagepaypiTransactionType::Authenticate => {
                    AttemptStatus::Authorized
                }
                SagepaypiTransactionType::Payment
                | SagepaypiTransactionType::Repeat
                | SagepaypiTransactionType::Refund
                | SagepaypiTransactionType::Unknown => AttemptStatus::Charged,
            },
            Self::ThreeDAuth => AttemptStatus::AuthenticationPending,
            Self::NotAuthed => AttemptStatus::AuthorizationFailed,
            Self::Rejected | Self::Malformed | Self::Invalid | Self::Error | Self::Unknown => {
                AttemptStatus::Failure
            }
        }
    }

    pub fn get_refund_status(&self) -> RefundStatus {
        match self {
            Self::Ok => RefundStatus::Success,
            Self::ThreeDAuth | Self::Unknown => RefundStatus::Pending,
            Self::NotAuthed | Self::Rejected | Self::Malformed | Self::Invalid | Self::Error => {
                RefundStatus::Failure
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiResponseCard {
    pub card_type: Option<String>,
    pub last_four_digits: Option<String>,
    pub expiry_date: Option<String>,
    pub card_identifier: Option<Secret<String>>,
    pub reusable: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagepaypiResponsePaymentMethod {
    pub card: Option<SagepaypiResponseCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagepaypiThreeDSecure {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiTransactionResponse {
    pub transaction_id: String,
    pub transaction_type: Option<SagepaypiTransactionType>,
    pub status: SagepaypiStatus,
    pub status_code: Option<String>,
    pub status_detail: Option<String>,
    pub retrieval_reference: Option<u64>,
    pub bank_response_code: Option<String>,
    pub bank_authorisation_code: Option<String>,
    pub payment_method: Option<SagepaypiResponsePaymentMethod>,
    #[serde(rename = "3DSecure")]
    pub three_d_secure: Option<SagepaypiThreeDSecure>,
    pub acs_url: Option<String>,
    pub pa_req: Option<Secret<String>>,
    pub c_req: Option<Secret<String>>,
    pub acs_trans_id: Option<String>,
    pub ds_tran_id: Option<String>,
}

impl SagepaypiTransactionResponse {
    pub fn to_error_response(
        &self,
        http_code: u16,
        attempt_status: Option<AttemptStatus>,
    ) -> ErrorResponse {
        ErrorResponse {
            code: self
                .status_code
                .clone()
                .unwrap_or_else(|| self.status.to_string()),
            message: self
                .status_detail
                .clone()
                .unwrap_or_else(|| consts::NO_ERROR_MESSAGE.to_string()),
            reason: self.status_detail.clone(),
            status_code: http_code,
            attempt_status,
            connector_transaction_id: Some(self.transaction_id.clone()),
            network_decline_code: self.bank_response_code.clone(),
            network_advice_code: None,
            network_error_message: None,
        }
    }

    /// ACS form for a `3DAuth` answer: `creq` for 3-D Secure 2, otherwise `PaReq`
    pub fn get_three_ds_form(&self, term_url: Option<&str>) -> Result<RedirectForm, Error> {
        let endpoint = self
            .acs_url
            .clone()
            .ok_or_else(missing_field_err("acsUrl"))?;
        let form_fields = match (&self.c_req, &self.pa_req) {
            (Some(c_req), _) => HashMap::from([
                ("creq".to_string(), c_req.peek().clone()),
                (
                    "threeDSSessionData".to_string(),
                    self.transaction_id.clone(),
                ),
            ]),
            (None, Some(pa_req)) => HashMap::from([
                ("PaReq".to_string(), pa_req.peek().clone()),
                ("MD".to_string(), self.transaction_id.clone()),
                (
                    "TermUrl".to_string(),
                    term_url
                        .ok_or_else(missing_field_err("complete_authorize_url"))?
                        .to_string(),
                ),
            ]),
            (None, None) => Err(missing_field_err("cReq")())?,
        };
        Ok(RedirectForm::Form {
            endpoint,
            method: Method::Post,
            form_fields,
        })
    }

    /// A reusable card identifier becomes the mandate; the transaction id is kept for repeats
    fn get_mandate_reference(&self) -> Option<Box<MandateReference>> {
        self.payment_method
            .as_ref()
            .and_then(|payment_method| payment_method.card.as_ref())
            .filter(|card| card.reusable == Some(true))
            .and_then(|card| card.card_identifier.as_ref())
            .map(|card_identifier| {
                Box::new(MandateReference {
                    connector_mandate_id: Some(card_identifier.peek().clone()),
                    payment_method_id: None,
                    connector_mandate_request_reference_id: Some(self.transaction_id.clone()),
                })
            })
    }

    pub fn get_payment_outcome(
        &self,
        is_auto_capture: bool,
        term_url: Option<&str>,
        http_code: u16,
    ) -> Result<(AttemptStatus, Result<PaymentsResponseData, ErrorResponse>), Error> {
        let status = self
            .status
            .get_attempt_status(self.transaction_type, is_auto_capture);
        if matches!(
            status,
            AttemptStatus::AuthorizationFailed | AttemptStatus::Failure
        ) {
            return Ok((status, Err(self.to_error_response(http_code, Some(status)))));
        }

        let redirection_data = match self.status {
            SagepaypiStatus::ThreeDAuth => Some(Box::new(self.get_three_ds_form(term_url)?)),
            _ => None,
        };
        Ok((
            status,
            Ok(PaymentsResponseData::TransactionResponse {
                resource_id: ResponseId::ConnectorTransactionId(self.transaction_id.clone()),
                redirection_data,
                connector_metadata: None,
                mandate_reference: self.get_mandate_reference(),
                network_txn_id: self.retrieval_reference.map(|reference| reference.to_string()),
                connector_response_reference_id: None,
                incremental_authorization_allowed: None,
                status_code: http_code,
            }),
        ))
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepaypiTransactionResponse,
            RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        >,
    > for RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepaypiTransactionResponse,
            RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let request = &item.router_data.request;
        let (status, response) = item.response.get_payment_outcome(
            request.is_auto_capture()?,
            request.complete_authorize_url.as_deref(),
            item.http_code,
        )?;
        Ok(Self {
            resource_common_data: PaymentFlowData {
                status,
                ..item.router_data.resource_common_data
            },
            response,
            ..item.router_data
        })
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepaypiTransactionResponse,
            RouterDataV2<
                CompleteAuthorize,
                PaymentFlowData,
                PaymentsCompleteAuthorizeData,
                PaymentsResponseData,
            >,
        >,
    >
    for RouterDataV2<
        CompleteAuthorize,
        PaymentFlowData,
        PaymentsCompleteAuthorizeData,
        PaymentsResponseData,
    >
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepaypiTransactionResponse,
            RouterDataV2<
                CompleteAuthorize,
                PaymentFlowData,
                PaymentsCompleteAuthorizeData,
                PaymentsResponseData,
            >,
        >,
    ) -> Result<Self, Self::Error> {
        let request = &item.router_data.request;
        let (status, response) = item.response.get_payment_outcome(
            request.is_auto_capture()?,
            request.complete_authorize_url.as_deref(),
            item.http_code,
        )?;
        Ok(Self {
            resource_common_data: PaymentFlowData {
                status,
                ..item.router_data.resource_common_data
            },
            response,
            ..item.router_data
        })
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepaypiTransactionResponse,
            RouterDataV2<PSync, PaymentFlowData, PaymentsSyncData, PaymentsResponseData>,
        >,
    > for RouterDataV2<PSync, PaymentFlowData, PaymentsSyncData, PaymentsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepaypiTransactionResponse,
            RouterDataV2<PSync, PaymentFlowData, PaymentsSyncData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let (status, response) = item.response.get_payment_outcome(
            item.router_data.request.is_auto_capture()?,
            None,
            item.http_code,
        )?;
        Ok(Self {
            resource_common_data: PaymentFlowData {
                status,
                ..item.router_data.resource_common_data
            },
            response,
            ..item.router_data
        })
    }
}

// Instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SagepaypiInstructionType {
    Release,
    Abort,
    Void,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiInstructionRequest {
    pub instruction_type: SagepaypiInstructionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<MinorUnit>,
}

impl
    TryFrom<
        SagepaypiRouterData<
            &RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>,
        >,
    > for SagepaypiInstructionRequest
{
    type Error = Error;
    fn try_from(
        item: SagepaypiRouterData<
            &RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            instruction_type: SagepaypiInstructionType::Release,
            amount: Some(item.amount),
        })
    }
}

impl SagepaypiInstructionRequest {
    pub fn abort() -> Self {
        Self {
            instruction_type: SagepaypiInstructionType::Abort,
            amount: None,
        }
    }

    pub fn void() -> Self {
        Self {
            instruction_type: SagepaypiInstructionType::Void,
            amount: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiInstructionResponse {
    pub instruction_type: SagepaypiInstructionType,
    pub date: Option<String>,
}

impl SagepaypiInstructionResponse {
    fn get_outcome(
        &self,
        connector_transaction_id: String,
        http_code: u16,
    ) -> (AttemptStatus, PaymentsResponseData) {
        let status = match self.instruction_type {
            SagepaypiInstructionType::Release => AttemptStatus::Charged,
            SagepaypiInstructionType::Abort | SagepaypiInstructionType::Void => {
                AttemptStatus::Voided
            }
            SagepaypiInstructionType::Unknown => AttemptStatus::Pending,
        };
        (
            status,
            PaymentsResponseData::TransactionResponse {
                resource_id: ResponseId::ConnectorTransactionId(connector_transaction_id),
                redirection_data: None,
                connector_metadata: None,
                mandate_reference: None,
                network_txn_id: None,
                connector_response_reference_id: None,
                incremental_authorization_allowed: None,
                status_code: http_code,
            },
        )
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepaypiInstructionResponse,
            RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>,
        >,
    > for RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepaypiInstructionResponse,
            RouterDataV2<Capture, PaymentFlowData, PaymentsCaptureData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let transaction_id = item.router_data.request.get_connector_transaction_id()?;
        let (status, response) = item.response.get_outcome(transaction_id, item.http_code);
        Ok(Self {
            resource_common_data: PaymentFlowData {
                status,
                ..item.router_data.resource_common_data
            },
            response: Ok(response),
            ..item.router_data
        })
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepaypiInstructionResponse,
            RouterDataV2<Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>,
        >,
    > for RouterDataV2<Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepaypiInstructionResponse,
            RouterDataV2<Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let transaction_id = item.router_data.request.connector_transaction_id.clone();
        let (status, response) = item.response.get_outcome(transaction_id, item.http_code);
        Ok(Self {
            resource_common_data: PaymentFlowData {
                status,
                ..item.router_data.resource_common_data
            },
            response: Ok(response),
            ..item.router_data
        })
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepaypiInstructionResponse,
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
            SagepaypiInstructionResponse,
            RouterDataV2<
                VoidPC,
                PaymentFlowData,
                PaymentsCancelPostCaptureData,
                PaymentsResponseData,
            >,
        >,
    ) -> Result<Self, Self::Error> {
        let transaction_id = item.router_data.request.connector_transaction_id.clone();
        let (status, response) = item.response.get_outcome(transaction_id, item.http_code);
        Ok(Self {
            resource_common_data: PaymentFlowData {
                status,
                ..item.router_data.resource_common_data
            },
            response: Ok(response),
            ..item.router_data
        })
    }
}

// Refund and repeat
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SagepaypiReferencedTransactionRequest {
    pub transaction_type: SagepaypiTransactionType,
    pub reference_transaction_id: String,
    pub vendor_tx_code: String,
    pub amount: MinorUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    pub description: String,
}

impl
    TryFrom<
        SagepaypiRouterData<
            &RouterDataV2<Refund, RefundFlowData, RefundsData, RefundsResponseData>,
        >,
    > for SagepaypiReferencedTransactionRequest
{
    type Error = Error;
    fn try_from(
        item: SagepaypiRouterData<
            &RouterDataV2<Refund, RefundFlowData, RefundsData, RefundsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let router_data = item.router_data;
        Ok(Self {
            transaction_type: SagepaypiTransactionType::Refund,
            reference_transaction_id: router_data.request.connector_transaction_id.clone(),
            vendor_tx_code: router_data
                .resource_common_data
                .connector_request_reference_id
                .clone(),
            amount: item.amount,
            currency: None,
            description: get_description(
                router_data.request.reason.as_deref(),
                crate::connectors::sagepay::constants::DEFAULT_REFUND_DESCRIPTION,
            ),
        })
    }
}

impl
    TryFrom<
        SagepaypiRouterData<
            &RouterDataV2<RepeatPayment, PaymentFlowData, RepeatPaymentData, PaymentsResponseData>,
        >,
    > for SagepaypiReferencedTransactionRequest
{
    type Error = Error;
    fn try_from(
        item: SagepaypiRouterData<
            &RouterDataV2<RepeatPayment, PaymentFlowData, RepeatPaymentData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let router_data = item.router_data;
        let request = &router_data.request;
        Ok(Self {
            transaction_type: SagepaypiTransactionType::Repeat,
            reference_transaction_id: get_repeat_reference_transaction_id(
                &request.mandate_reference,
            )?,
            vendor_tx_code: router_data
                .resource_common_data
                .connector_request_reference_id
                .clone(),
            amount: item.amount,
            currency: Some(request.currency),
            description: get_description(
                request
                    .description
                    .as_deref()
                    .or(router_data.resource_common_data.description.as_deref()),
                crate::connectors::sagepay::constants::DEFAULT_DESCRIPTION,
            ),
        })
    }
}

/// Repeats point at a transaction: the one the mandate was created by, or the mandate id itself
/// when only that is known
fn get_repeat_reference_transaction_id(
    mandate_reference: &MandateReferenceId,
) -> Result<String, Error> {
    match mandate_reference {
        MandateReferenceId::ConnectorMandateId(ids) => ids
            .get_connector_mandate_request_reference_id()
            .or_else(|| ids.get_connector_mandate_id())
            .ok_or_else(missing_field_err("connector_mandate_id")),
        MandateReferenceId::NetworkMandateId(_) => Err(ConnectorError::NotSupported {
            message: "network transaction id".to_string(),
            connector: CONNECTOR_NAME,
        }
        .into()),
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepaypiTransactionResponse,
            RouterDataV2<RepeatPayment, PaymentFlowData, RepeatPaymentData, PaymentsResponseData>,
        >,
    > for RouterDataV2<RepeatPayment, PaymentFlowData, RepeatPaymentData, PaymentsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepaypiTransactionResponse,
            RouterDataV2<RepeatPayment, PaymentFlowData, RepeatPaymentData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let (status, response) = item.response.get_payment_outcome(
            item.router_data.request.is_auto_capture()?,
            None,
            item.http_code,
        )?;
        Ok(Self {
            resource_common_data: PaymentFlowData {
                status,
                ..item.router_data.resource_common_data
            },
            response,
            ..item.router_data
        })
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepaypiTransactionResponse,
            RouterDataV2<Refund, RefundFlowData, RefundsData, RefundsResponseData>,
        >,
    > for RouterDataV2<Refund, RefundFlowData, RefundsData, RefundsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepaypiTransactionResponse,
            RouterDataV2<Refund, RefundFlowData, RefundsData, RefundsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let refund_status = item.response.status.get_refund_status();
        let response = match refund_status {
            RefundStatus::Failure => Err(item.response.to_error_response(item.http_code, None)),
            _ => Ok(RefundsResponseData {
                connector_refund_id: item.response.transaction_id.clone(),
                refund_status,
                status_code: item.http_code,
            }),
        };
        Ok(Self {
            resource_common_data: RefundFlowData {
                status: refund_status,
                ..item.router_data.resource_common_data
            },
            response,
            ..item.router_data
        })
    }
}

// Errors
/// Error codes are numeric on most endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SagepaypiErrorCode {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for SagepaypiErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(code) => write!(f, "{code}"),
            Self::Text(code) => f.write_str(code),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagepaypiErrorDetail {
    pub code: Option<SagepaypiErrorCode>,
    pub description: Option<String>,
    pub property: Option<String>,
    #[serde(rename = "clientMessage")]
    pub client_message: Option<String>,
}

/// Validation failures come as a list, authentication and lookup failures as a single error,
/// declines as a full transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SagepaypiErrorResponse {
    Errors { errors: Vec<SagepaypiErrorDetail> },
    Transaction(Box<SagepaypiTransactionResponse>),
    Single(SagepaypiErrorDetail),
}

impl SagepaypiErrorResponse {
    pub fn to_error_response(&self, http_code: u16) -> ErrorResponse {
        match self {
            Self::Errors { errors } => {
                let reason = errors
                    .iter()
                    .map(|error| match &error.property {
                        Some(property) => format!(
                            "{property}: {}",
                            error.description.as_deref().unwrap_or_default()
                        ),
                        None => error.description.clone().unwrap_or_default(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let first = errors.first();
                ErrorResponse {
                    code: first
                        .and_then(|error| error.code.as_ref())
                        .map_or_else(|| consts::NO_ERROR_CODE.to_string(), ToString::to_string),
                    message: first
                        .and_then(|error| error.description.clone())
                        .unwrap_or_else(|| consts::NO_ERROR_MESSAGE.to_string()),
                    reason: (!reason.is_empty()).then_some(reason),
                    status_code: http_code,
                    attempt_status: None,
                    connector_transaction_id: None,
                    network_decline_code: None,
                    network_advice_code: None,
                    network_error_message: None,
                }
            }
            Self::Transaction(transaction) => {
                let status = transaction
                    .status
                    .get_attempt_status(transaction.transaction_type, true);
                transaction.to_error_response(http_code, Some(status))
            }
            Self::Single(error) => ErrorResponse {
                code: error
                    .code
                    .as_ref()
                    .map_or_else(|| consts::NO_ERROR_CODE.to_string(), ToString::to_string),
                message: error
                    .description
                    .clone()
                    .unwrap_or_else(|| consts::NO_ERROR_MESSAGE.to_string()),
                reason: error.client_message.clone().or(error.description.clone()),
                status_code: http_code,
                attempt_status: None,
                connector_transaction_id: None,
                network_decline_code: None,
                network_advice_code: None,
                network_error_message: None,
            },
        }
    }
}
