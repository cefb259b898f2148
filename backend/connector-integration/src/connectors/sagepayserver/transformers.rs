use common_enums::{AttemptStatus, Currency};
use common_utils::{pii::IpAddress, request::Method, types::StringMajorUnit, Email, Secret};
use domain_types::{
    connector_flow::{Authorize, SetupMandate},
    connector_types::{
        EventType, MandateReference, PaymentFlowData, PaymentsAuthorizeData,
        PaymentsResponseData, ResponseId, SetupMandateRequestData, WebhookDetailsResponse,
    },
    errors::ConnectorError,
    payment_method_data::PaymentMethodData,
    router_data::ErrorResponse,
    router_data_v2::RouterDataV2,
    utils::missing_field_err,
};
use error_stack::ResultExt;
use serde::Serialize;

use crate::{
    connectors::sagepay::{
        constants::{self, fields},
        notification::SagepayNotification,
        transformers::{
            get_description, get_redirect_form, AccountType, Apply3DSecure, ApplyAvsCv2,
            ProtocolVersion, SagepayAuthType, SagepayCustomerAddresses, SagepayMetadata,
            SagepayResponse, SagepayRouterData, SagepayStatus, SagepayStatusDetail,
            ServerProfile, TransactionReference, TxType,
        },
    },
    types::ResponseRouterData,
    utils,
};

type Error = error_stack::Report<ConnectorError>;

const CONNECTOR_NAME: &str = "sagepayserver";

const CREATE_TOKEN: u8 = 1;

/// Carries the shopper's return URL on the notification URL so the notification reply can
/// name it without any stored state
pub fn build_notification_url(
    webhook_url: &str,
    return_url: Option<&str>,
) -> Result<String, Error> {
    let mut url = url::Url::parse(webhook_url).change_context(ConnectorError::InvalidDataFormat {
        field_name: "webhook_url",
    })?;
    let has_redirect_url = url
        .query_pairs()
        .any(|(name, _)| name == constants::NOTIFICATION_REDIRECT_URL_PARAM);
    if let (Some(return_url), false) = (return_url, has_redirect_url) {
        url.query_pairs_mut()
            .append_pair(constants::NOTIFICATION_REDIRECT_URL_PARAM, return_url);
    }
    Ok(url.to_string())
}

#[derive(Debug, Serialize)]
pub struct SagepayServerPaymentRequest {
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
    #[serde(rename = "NotificationURL")]
    pub notification_url: String,
    #[serde(flatten)]
    pub addresses: SagepayCustomerAddresses,
    #[serde(rename = "CustomerEMail", skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<Email>,
    #[serde(rename = "ClientIPAddress", skip_serializing_if = "Option::is_none")]
    pub client_ip_address: Option<Secret<String, IpAddress>>,
    #[serde(rename = "AccountType")]
    pub account_type: AccountType,
    #[serde(rename = "Apply3DSecure")]
    pub apply_3d_secure: Apply3DSecure,
    #[serde(rename = "ApplyAVSCV2")]
    pub apply_avs_cv2: ApplyAvsCv2,
    #[serde(rename = "Profile")]
    pub profile: ServerProfile,
    #[serde(rename = "AllowGiftAid", skip_serializing_if = "Option::is_none")]
    pub allow_gift_aid: Option<u8>,
    #[serde(rename = "CreateToken", skip_serializing_if = "Option::is_none")]
    pub create_token: Option<u8>,
    #[serde(rename = "ReferrerID", skip_serializing_if = "Option::is_none")]
    pub referrer_id: Option<String>,
    #[serde(rename = "VendorData", skip_serializing_if = "Option::is_none")]
    pub vendor_data: Option<String>,
}

impl
    TryFrom<
        SagepayRouterData<
            &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        >,
    > for SagepayServerPaymentRequest
{
    type Error = Error;
    fn try_from(
        item: SagepayRouterData<
            &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let router_data = item.router_data;
        let request = &router_data.request;
        let common_data = &router_data.resource_common_data;

        // card details are entered on the hosted pages, so only card payments are accepted here
        match request.payment_method_data {
            PaymentMethodData::Card(_) => (),
            PaymentMethodData::Wallet(_)
            | PaymentMethodData::CardToken(_)
            | PaymentMethodData::MandatePayment => Err(ConnectorError::NotImplemented(
                utils::get_unimplemented_payment_method_error_message(CONNECTOR_NAME),
            ))?,
        }

        let auth = SagepayAuthType::try_from(&router_data.connector_auth_type)?;
        let metadata = SagepayMetadata::from_payment_flow_data(common_data)?;
        Ok(Self {
            vps_protocol: metadata.protocol_version,
            tx_type: TxType::for_payment(request.is_auto_capture()?),
            vendor: auth.vendor,
            vendor_tx_code: common_data.connector_request_reference_id.clone(),
            amount: item.amount,
            currency: request.currency,
            description: get_description(
                common_data.description.as_deref(),
                constants::DEFAULT_DESCRIPTION,
            ),
            notification_url: build_notification_url(
                &request.get_webhook_url()?,
                request.router_return_url.as_deref(),
            )?,
            addresses: SagepayCustomerAddresses::try_from(common_data)?,
            customer_email: request
                .get_optional_email()
                .or(common_data.get_optional_billing_email()),
            client_ip_address: request.get_ip_address_as_optional(),
            account_type: metadata.account_type.unwrap_or_default(),
            apply_3d_secure: metadata.get_apply_3d_secure(common_data.auth_type),
            apply_avs_cv2: metadata.apply_avs_cv2.unwrap_or_default(),
            profile: metadata.profile.unwrap_or_default(),
            allow_gift_aid: metadata.get_allow_gift_aid(),
            create_token: request
                .is_customer_initiated_mandate_payment()
                .then_some(CREATE_TOKEN),
            referrer_id: metadata.referrer_id,
            vendor_data: metadata.vendor_data,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SagepayServerTokenRequest {
    #[serde(rename = "VPSProtocol")]
    pub vps_protocol: ProtocolVersion,
    #[serde(rename = "TxType")]
    pub tx_type: TxType,
    #[serde(rename = "Vendor")]
    pub vendor: Secret<String>,
    #[serde(rename = "VendorTxCode")]
    pub vendor_tx_code: String,
    #[serde(rename = "Currency")]
    pub currency: Currency,
    #[serde(rename = "NotificationURL")]
    pub notification_url: String,
    #[serde(rename = "Profile")]
    pub profile: ServerProfile,
}

impl
    TryFrom<
        &RouterDataV2<SetupMandate, PaymentFlowData, SetupMandateRequestData, PaymentsResponseData>,
    > for SagepayServerTokenRequest
{
    type Error = Error;
    fn try_from(
        item: &RouterDataV2<
            SetupMandate,
            PaymentFlowData,
            SetupMandateRequestData,
            PaymentsResponseData,
        >,
    ) -> Result<Self, Self::Error> {
        let auth = SagepayAuthType::try_from(&item.connector_auth_type)?;
        let metadata = SagepayMetadata::from_payment_flow_data(&item.resource_common_data)?;
        Ok(Self {
            vps_protocol: metadata.protocol_version,
            tx_type: TxType::Token,
            vendor: auth.vendor,
            vendor_tx_code: item
                .resource_common_data
                .connector_request_reference_id
                .clone(),
            currency: item.request.currency,
            notification_url: build_notification_url(
                &item.request.get_webhook_url()?,
                item.request.router_return_url.as_deref(),
            )?,
            profile: metadata.profile.unwrap_or_default(),
        })
    }
}

/// A registration answer: the shopper goes to `NextURL`, the outcome arrives later as a
/// notification
fn get_registration_outcome(
    response: &SagepayResponse,
    vendor_tx_code: &str,
    http_code: u16,
) -> Result<(AttemptStatus, Result<PaymentsResponseData, ErrorResponse>), Error> {
    if !response.status.is_success() {
        let status = match response.status {
            SagepayStatus::NotAuthed => AttemptStatus::AuthorizationFailed,
            _ => AttemptStatus::Failure,
        };
        return Ok((
            status,
            Err(response.to_error_response(http_code, Some(status))),
        ));
    }

    let next_url = response
        .next_url
        .as_deref()
        .ok_or_else(missing_field_err("NextURL"))?;
    let reference = TransactionReference::from_response(vendor_tx_code, response);
    Ok((
        AttemptStatus::AuthenticationPending,
        Ok(PaymentsResponseData::TransactionResponse {
            resource_id: ResponseId::ConnectorTransactionId(reference.encode()?),
            redirection_data: Some(Box::new(get_redirect_form(next_url, Method::Get)?)),
            connector_metadata: None,
            mandate_reference: None,
            network_txn_id: None,
            connector_response_reference_id: Some(vendor_tx_code.to_string()),
            incremental_authorization_allowed: None,
            status_code: http_code,
        }),
    ))
}

/// Registration answer from the hosted-page service, kept apart from the direct service's
/// authorization answer of the same shape
#[derive(Debug, Clone)]
pub struct SagepayServerRegistrationResponse(pub SagepayResponse);

impl
    TryFrom<
        ResponseRouterData<
            SagepayServerRegistrationResponse,
            RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        >,
    > for RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepayServerRegistrationResponse,
            RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let ResponseRouterData {
            response,
            router_data,
            http_code,
        } = item;
        let (status, response) = get_registration_outcome(
            &response.0,
            &router_data.resource_common_data.connector_request_reference_id,
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
            SagepayServerRegistrationResponse,
            RouterDataV2<SetupMandate, PaymentFlowData, SetupMandateRequestData, PaymentsResponseData>,
        >,
    > for RouterDataV2<SetupMandate, PaymentFlowData, SetupMandateRequestData, PaymentsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepayServerRegistrationResponse,
            RouterDataV2<
                SetupMandate,
                PaymentFlowData,
                SetupMandateRequestData,
                PaymentsResponseData,
            >,
        >,
    ) -> Result<Self, Self::Error> {
        let ResponseRouterData {
            response,
            router_data,
            http_code,
        } = item;
        let (status, response) = get_registration_outcome(
            &response.0,
            &router_data.resource_common_data.connector_request_reference_id,
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

// Notifications
pub fn get_event_type(notification: &SagepayNotification) -> EventType {
    let status = notification.status();
    match (notification.tx_type(), &status) {
        (Some(TxType::Token), status) if status.is_success() => EventType::MandateActive,
        (Some(TxType::Token), _) => EventType::PaymentIntentFailure,
        (_, SagepayStatus::Pending) => EventType::PaymentIntentProcessing,
        (_, SagepayStatus::NotAuthed) => EventType::PaymentIntentAuthorizationFailure,
        (_, SagepayStatus::Abort) => EventType::PaymentIntentCancelled,
        (Some(TxType::Deferred | TxType::Authenticate), status)
            if status.is_success()
                || matches!(
                    status,
                    SagepayStatus::Registered | SagepayStatus::Authenticated
                ) =>
        {
            EventType::PaymentIntentAuthorizationSuccess
        }
        (_, status) if status.is_success() => EventType::PaymentIntentSuccess,
        (_, SagepayStatus::Registered | SagepayStatus::Authenticated) => {
            EventType::PaymentIntentAuthorizationSuccess
        }
        _ => EventType::PaymentIntentFailure,
    }
}

/// Transaction reference rebuilt from a notification, equal to the one later follow-ups need
pub fn get_notification_reference(
    notification: &SagepayNotification,
    security_key: &str,
) -> Result<TransactionReference, Error> {
    Ok(TransactionReference {
        security_key: Some(Secret::new(security_key.to_string())),
        tx_auth_no: notification
            .get(fields::TX_AUTH_NO)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string),
        vps_tx_id: notification.get(fields::VPS_TX_ID).map(ToString::to_string),
        vendor_tx_code: notification.get_vendor_tx_code()?.to_string(),
    })
}

pub fn get_webhook_details(
    notification: &SagepayNotification,
    security_key: &str,
    raw_body: &[u8],
) -> Result<WebhookDetailsResponse, Error> {
    let reference = get_notification_reference(notification, security_key)?;
    let status = notification.get_attempt_status(true);
    let detail = notification
        .get(fields::STATUS_DETAIL)
        .map(SagepayStatusDetail::parse);
    let is_failure = matches!(
        status,
        AttemptStatus::AuthorizationFailed | AttemptStatus::Failure
    );
    let (error_code, error_message, error_reason) = match (is_failure, detail) {
        (true, Some(detail)) => (
            Some(
                detail
                    .code
                    .unwrap_or_else(|| notification.status().to_string()),
            ),
            Some(detail.message),
            notification.get(fields::STATUS_DETAIL).map(ToString::to_string),
        ),
        (true, None) => (Some(notification.status().to_string()), None, None),
        (false, _) => (None, None, None),
    };
    let encoded_reference = reference.encode()?;
    // a bare token registration has no transaction to repeat
    let related_reference = match notification.tx_type() {
        Some(TxType::Token) => None,
        _ => Some(encoded_reference.clone()),
    };
    let mandate_reference = notification
        .get(fields::TOKEN)
        .filter(|token| !token.is_empty())
        .map(|token| {
            Box::new(MandateReference {
                connector_mandate_id: Some(token.to_string()),
                payment_method_id: None,
                connector_mandate_request_reference_id: related_reference,
            })
        });

    Ok(WebhookDetailsResponse {
        resource_id: Some(ResponseId::ConnectorTransactionId(encoded_reference)),
        status,
        connector_response_reference_id: Some(reference.vendor_tx_code),
        mandate_reference,
        error_code,
        error_message,
        error_reason,
        raw_connector_response: Some(String::from_utf8_lossy(raw_body).into_owned()),
        status_code: 200,
        response_headers: None,
        minor_amount_captured: None,
        network_txn_id: None,
    })
}
