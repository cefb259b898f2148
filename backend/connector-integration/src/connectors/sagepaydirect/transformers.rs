use common_enums::{AttemptStatus, Currency};
use common_utils::{pii::IpAddress, types::StringMajorUnit, Email, Secret};
use domain_types::{
    connector_flow::{Authorize, CompleteAuthorize, PaymentMethodToken, SetupMandate},
    connector_types::{
        MandateReference, PaymentFlowData, PaymentMethodTokenResponse,
        PaymentMethodTokenizationData, PaymentsAuthorizeData, PaymentsCompleteAuthorizeData,
        PaymentsResponseData, ResponseId, SetupMandateRequestData,
    },
    errors::ConnectorError,
    payment_method_data::{PaymentMethodData, WalletData},
    router_data::PaymentMethodToken as StoredPaymentMethodToken,
    router_data_v2::RouterDataV2,
    utils::missing_field_err,
};
use serde::Serialize;

use crate::{
    connectors::sagepay::{
        constants::{self, fields, services},
        transformers::{
            get_description, get_payment_outcome, AccountType, Apply3DSecure, ApplyAvsCv2,
            ProtocolVersion, SagepayAuthType, SagepayBrowserDetails, SagepayCardDetails,
            SagepayCardType, SagepayCustomerAddresses, SagepayMetadata, SagepayResponse,
            SagepayRouterData, SagepayStatus, TransactionReference, TxType,
        },
    },
    types::ResponseRouterData,
    utils,
};

type Error = error_stack::Report<ConnectorError>;

const CONNECTOR_NAME: &str = "sagepaydirect";

/// Ask the gateway to keep a card token after it has been used
const STORE_TOKEN: u8 = 1;
const CREATE_TOKEN: u8 = 1;

/// Status the gateway posts to the PayPal callback URL once the shopper approved the payment
const PAYPAL_APPROVED_STATUS: &str = "PAYPALOK";

#[derive(Debug, Serialize)]
pub struct SagepayStoredCard {
    #[serde(rename = "Token")]
    pub token: Secret<String>,
    #[serde(rename = "StoreToken")]
    pub store_token: u8,
    #[serde(rename = "CV2", skip_serializing_if = "Option::is_none")]
    pub cv2: Option<Secret<String>>,
}

#[derive(Debug, Serialize)]
pub struct SagepayPayPalDetails {
    #[serde(rename = "CardType")]
    pub card_type: SagepayCardType,
    #[serde(rename = "PayPalCallbackURL")]
    pub callback_url: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SagepayDirectPaymentMethod {
    Card(SagepayCardDetails),
    StoredCard(SagepayStoredCard),
    PayPal(SagepayPayPalDetails),
}

impl SagepayDirectPaymentMethod {
    fn is_card(&self) -> bool {
        matches!(self, Self::Card(_) | Self::StoredCard(_))
    }
}

#[derive(Debug, Serialize)]
pub struct SagepayDirectPaymentRequest {
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
    #[serde(flatten)]
    pub payment_method: SagepayDirectPaymentMethod,
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
    #[serde(rename = "CreateToken", skip_serializing_if = "Option::is_none")]
    pub create_token: Option<u8>,
    #[serde(flatten)]
    pub browser: Option<SagepayBrowserDetails>,
    #[serde(rename = "ReferrerID", skip_serializing_if = "Option::is_none")]
    pub referrer_id: Option<String>,
    #[serde(rename = "VendorData", skip_serializing_if = "Option::is_none")]
    pub vendor_data: Option<String>,
}

fn get_payment_method(
    router_data: &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
) -> Result<SagepayDirectPaymentMethod, Error> {
    let request = &router_data.request;
    match &request.payment_method_data {
        PaymentMethodData::Card(card) => Ok(SagepayDirectPaymentMethod::Card(
            SagepayCardDetails::try_new(
                card,
                router_data
                    .resource_common_data
                    .get_optional_billing_full_name(),
            )?,
        )),
        PaymentMethodData::CardToken(card_token) => {
            let StoredPaymentMethodToken::Token(token) = router_data
                .resource_common_data
                .get_payment_method_token()?;
            Ok(SagepayDirectPaymentMethod::StoredCard(SagepayStoredCard {
                token,
                store_token: STORE_TOKEN,
                cv2: card_token.card_cvc.clone(),
            }))
        }
        PaymentMethodData::MandatePayment => {
            Ok(SagepayDirectPaymentMethod::StoredCard(SagepayStoredCard {
                token: Secret::new(request.get_connector_mandate_id()?),
                store_token: STORE_TOKEN,
                cv2: None,
            }))
        }
        PaymentMethodData::Wallet(WalletData::PaypalRedirect(_)) => {
            Ok(SagepayDirectPaymentMethod::PayPal(SagepayPayPalDetails {
                card_type: SagepayCardType::PayPal,
                callback_url: request.get_complete_authorize_url()?,
            }))
        }
    }
}

impl
    TryFrom<
        SagepayRouterData<
            &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        >,
    > for SagepayDirectPaymentRequest
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
        let auth = SagepayAuthType::try_from(&router_data.connector_auth_type)?;
        let metadata = SagepayMetadata::from_payment_flow_data(common_data)?;
        let payment_method = get_payment_method(router_data)?;

        // 3-D Secure 2 needs the shopper's browser; protocol 3.00 has no such fields
        let browser = match (metadata.protocol_version, &payment_method) {
            (ProtocolVersion::V4, SagepayDirectPaymentMethod::Card(_)) => {
                Some(SagepayBrowserDetails::try_new(
                    &request.get_browser_info()?,
                    request.get_complete_authorize_url()?,
                )?)
            }
            (ProtocolVersion::V4, SagepayDirectPaymentMethod::StoredCard(_)) => request
                .browser_info
                .as_ref()
                .map(|browser_info| {
                    SagepayBrowserDetails::try_new(
                        browser_info,
                        request.get_complete_authorize_url()?,
                    )
                })
                .transpose()?,
            _ => None,
        };

        let create_token = (payment_method.is_card()
            && request.is_customer_initiated_mandate_payment())
        .then_some(CREATE_TOKEN);

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
            payment_method,
            addresses: SagepayCustomerAddresses::try_from(common_data)?,
            customer_email: request
                .get_optional_email()
                .or(common_data.get_optional_billing_email()),
            client_ip_address: request.get_ip_address_as_optional(),
            account_type: metadata.account_type.unwrap_or_default(),
            apply_3d_secure: metadata.get_apply_3d_secure(common_data.auth_type),
            apply_avs_cv2: metadata.apply_avs_cv2.unwrap_or_default(),
            create_token,
            browser,
            referrer_id: metadata.referrer_id,
            vendor_data: metadata.vendor_data,
        })
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepayResponse,
            RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        >,
    > for RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepayResponse,
            RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
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
            router_data.request.complete_authorize_url.as_deref(),
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

// Second leg: 3-D Secure callback or PayPal completion
#[derive(Debug, Serialize)]
pub struct SagepayThreeDsV2Callback {
    #[serde(rename = "VPSTxId")]
    pub vps_tx_id: String,
    #[serde(rename = "CRes")]
    pub c_res: Secret<String>,
}

#[derive(Debug, Serialize)]
pub struct SagepayThreeDsV1Callback {
    #[serde(rename = "MD")]
    pub md: String,
    #[serde(rename = "PARes")]
    pub pa_res: Secret<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PayPalAccept {
    Yes,
    No,
}

#[derive(Debug, Serialize)]
pub struct SagepayPayPalCompleteRequest {
    #[serde(rename = "VPSProtocol")]
    pub vps_protocol: ProtocolVersion,
    #[serde(rename = "TxType")]
    pub tx_type: TxType,
    #[serde(rename = "VPSTxId")]
    pub vps_tx_id: String,
    #[serde(rename = "Amount")]
    pub amount: StringMajorUnit,
    #[serde(rename = "Accept")]
    pub accept: PayPalAccept,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SagepayDirectCompleteRequest {
    ThreeDsV2(SagepayThreeDsV2Callback),
    ThreeDsV1(SagepayThreeDsV1Callback),
    PayPal(SagepayPayPalCompleteRequest),
}

impl SagepayDirectCompleteRequest {
    pub fn get_service(&self) -> &'static str {
        match self {
            Self::ThreeDsV2(_) | Self::ThreeDsV1(_) => services::DIRECT_3D_CALLBACK,
            Self::PayPal(_) => services::PAYPAL_COMPLETE,
        }
    }
}

/// Picks the VPSTxId the first leg registered, from the payload or the stored reference
fn get_vps_tx_id(
    payload: &serde_json::Value,
    payload_key: &str,
    request: &PaymentsCompleteAuthorizeData,
) -> Result<String, Error> {
    match utils::get_string_ignore_case(payload, payload_key) {
        Some(vps_tx_id) => Ok(vps_tx_id),
        None => TransactionReference::decode(&request.get_connector_transaction_id()?)?
            .get_vps_tx_id(),
    }
}

impl
    TryFrom<
        SagepayRouterData<
            &RouterDataV2<
                CompleteAuthorize,
                PaymentFlowData,
                PaymentsCompleteAuthorizeData,
                PaymentsResponseData,
            >,
        >,
    > for SagepayDirectCompleteRequest
{
    type Error = Error;
    fn try_from(
        item: SagepayRouterData<
            &RouterDataV2<
                CompleteAuthorize,
                PaymentFlowData,
                PaymentsCompleteAuthorizeData,
                PaymentsResponseData,
            >,
        >,
    ) -> Result<Self, Self::Error> {
        let router_data = item.router_data;
        let request = &router_data.request;
        let payload = request.get_redirect_response_payload()?;

        if let Some(c_res) = utils::get_string_ignore_case(&payload, "cres") {
            return Ok(Self::ThreeDsV2(SagepayThreeDsV2Callback {
                vps_tx_id: get_vps_tx_id(&payload, "threeDSSessionData", request)?,
                c_res: Secret::new(c_res),
            }));
        }

        if let Some(pa_res) = utils::get_string_ignore_case(&payload, "PaRes") {
            return Ok(Self::ThreeDsV1(SagepayThreeDsV1Callback {
                md: utils::get_string_ignore_case(&payload, "MD")
                    .ok_or_else(missing_field_err("MD"))?,
                pa_res: Secret::new(pa_res),
            }));
        }

        match utils::get_string_ignore_case(&payload, fields::STATUS) {
            Some(status) => {
                let metadata =
                    SagepayMetadata::from_payment_flow_data(&router_data.resource_common_data)?;
                let accept = if status.eq_ignore_ascii_case(PAYPAL_APPROVED_STATUS) {
                    PayPalAccept::Yes
                } else {
                    tracing::info!(%status, "paypal payment not approved by the shopper");
                    PayPalAccept::No
                };
                Ok(Self::PayPal(SagepayPayPalCompleteRequest {
                    vps_protocol: metadata.protocol_version,
                    tx_type: TxType::Complete,
                    vps_tx_id: get_vps_tx_id(&payload, fields::VPS_TX_ID, request)?,
                    amount: item.amount,
                    accept,
                }))
            }
            None => Err(ConnectorError::MissingConnectorRedirectionPayload {
                field_name: "cres, PaRes or Status",
            }
            .into()),
        }
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepayResponse,
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
            SagepayResponse,
            RouterDataV2<
                CompleteAuthorize,
                PaymentFlowData,
                PaymentsCompleteAuthorizeData,
                PaymentsResponseData,
            >,
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
            router_data.request.complete_authorize_url.as_deref(),
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

// Card tokens
#[derive(Debug, Serialize)]
pub struct SagepayDirectTokenRequest {
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
    #[serde(flatten)]
    pub card: SagepayCardDetails,
}

impl SagepayDirectTokenRequest {
    fn try_new(
        common_data: &PaymentFlowData,
        auth_type: &domain_types::router_data::ConnectorAuthType,
        payment_method_data: &PaymentMethodData,
        currency: Currency,
    ) -> Result<Self, Error> {
        let auth = SagepayAuthType::try_from(auth_type)?;
        let metadata = SagepayMetadata::from_payment_flow_data(common_data)?;
        let card = match payment_method_data {
            PaymentMethodData::Card(card) => {
                SagepayCardDetails::try_new(card, common_data.get_optional_billing_full_name())?
            }
            PaymentMethodData::Wallet(_)
            | PaymentMethodData::CardToken(_)
            | PaymentMethodData::MandatePayment => Err(ConnectorError::NotImplemented(
                utils::get_unimplemented_payment_method_error_message(CONNECTOR_NAME),
            ))?,
        };
        Ok(Self {
            vps_protocol: metadata.protocol_version,
            tx_type: TxType::Token,
            vendor: auth.vendor,
            vendor_tx_code: common_data.connector_request_reference_id.clone(),
            currency,
            card,
        })
    }
}

impl
    TryFrom<
        &RouterDataV2<
            PaymentMethodToken,
            PaymentFlowData,
            PaymentMethodTokenizationData,
            PaymentMethodTokenResponse,
        >,
    > for SagepayDirectTokenRequest
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
        Self::try_new(
            &item.resource_common_data,
            &item.connector_auth_type,
            &item.request.payment_method_data,
            item.request.currency,
        )
    }
}

impl
    TryFrom<
        &RouterDataV2<SetupMandate, PaymentFlowData, SetupMandateRequestData, PaymentsResponseData>,
    > for SagepayDirectTokenRequest
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
        Self::try_new(
            &item.resource_common_data,
            &item.connector_auth_type,
            &item.request.payment_method_data,
            item.request.currency,
        )
    }
}

fn get_registered_token(response: &SagepayResponse) -> Option<Secret<String>> {
    match response.status {
        SagepayStatus::Ok => response.token.clone(),
        _ => None,
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepayResponse,
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
            SagepayResponse,
            RouterDataV2<
                PaymentMethodToken,
                PaymentFlowData,
                PaymentMethodTokenizationData,
                PaymentMethodTokenResponse,
            >,
        >,
    ) -> Result<Self, Self::Error> {
        let ResponseRouterData {
            response,
            router_data,
            http_code,
        } = item;
        let response = match get_registered_token(&response) {
            Some(token) => Ok(PaymentMethodTokenResponse {
                token: common_utils::ExposeInterface::expose(token),
            }),
            None => Err(response.to_error_response(http_code, None)),
        };
        Ok(Self {
            response,
            ..router_data
        })
    }
}

impl
    TryFrom<
        ResponseRouterData<
            SagepayResponse,
            RouterDataV2<SetupMandate, PaymentFlowData, SetupMandateRequestData, PaymentsResponseData>,
        >,
    > for RouterDataV2<SetupMandate, PaymentFlowData, SetupMandateRequestData, PaymentsResponseData>
{
    type Error = Error;
    fn try_from(
        item: ResponseRouterData<
            SagepayResponse,
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
        let (status, response) = match get_registered_token(&response) {
            Some(token) => (
                AttemptStatus::Charged,
                Ok(PaymentsResponseData::TransactionResponse {
                    resource_id: ResponseId::NoResponseId,
                    redirection_data: None,
                    connector_metadata: None,
                    mandate_reference: Some(Box::new(MandateReference {
                        connector_mandate_id: Some(common_utils::ExposeInterface::expose(token)),
                        payment_method_id: None,
                        connector_mandate_request_reference_id: None,
                    })),
                    network_txn_id: None,
                    connector_response_reference_id: Some(
                        router_data
                            .resource_common_data
                            .connector_request_reference_id
                            .clone(),
                    ),
                    incremental_authorization_allowed: None,
                    status_code: http_code,
                }),
            ),
            None => (
                AttemptStatus::Failure,
                Err(response.to_error_response(http_code, Some(AttemptStatus::Failure))),
            ),
        };
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
