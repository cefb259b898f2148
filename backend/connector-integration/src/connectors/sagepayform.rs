//! Form integration: the payment details travel encrypted in the `Crypt` field of a browser
//! form, and the result comes back encrypted on the shopper's return URL. No server-to-server
//! call is ever made.

pub mod transformers;


use common_enums::{AttemptStatus, CurrencyUnit};
use common_utils::{
    crypto, errors::CustomResult, types::StringMajorUnit, AmountConvertor, PeekInterface, Secret,
    StringMajorUnitForConnector,
};
use domain_types::{
    connector_flow::{Authorize, CompleteAuthorize},
    connector_types::{
        PaymentFlowData, PaymentMethodTokenResponse, PaymentMethodTokenizationData,
        PaymentsAuthorizeData, PaymentsCompleteAuthorizeData, PaymentsResponseData,
        PaymentsSyncData, RedirectDetailsResponse, RequestDetails, SessionTokenRequestData,
        SessionTokenResponseData, SetupMandateRequestData,
    },
    errors::ConnectorError,
    router_data::ErrorResponse,
    router_data_v2::RouterDataV2,
    router_response_types::Response,
    types::Connectors,
    utils::convert_amount,
};
use interfaces::{
    api::ConnectorCommon, connector_integration_v2::ConnectorIntegrationV2,
    connector_types::VerifyRedirectResponse, decode::BodyDecoding,
    events::connector_api_logs::ConnectorEvent,
    verification::{ConnectorSourceVerificationSecrets, SourceVerification},
};
use transformers::{
    build_registration_form, extract_crypt, get_registration_response, SagepayFormAuthType,
    SagepayFormCrypt, SagepayFormResult,
};

use super::{
    macros,
    sagepay::{
        self, constants, crypt,
        transformers::{SagepayMetadata, SagepayRouterData, TxType},
        FORM_URL_ENCODED,
    },
};

#[derive(Clone)]
pub struct Sagepayform {
    amount_converter: &'static (dyn AmountConvertor<Output = StringMajorUnit> + Sync),
}

impl Sagepayform {
    pub const fn new() -> &'static Self {
        &Self {
            amount_converter: &StringMajorUnitForConnector,
        }
    }
}

impl ConnectorCommon for Sagepayform {
    fn id(&self) -> &'static str {
        "sagepayform"
    }

    fn get_currency_unit(&self) -> CurrencyUnit {
        CurrencyUnit::Base
    }

    fn common_get_content_type(&self) -> &'static str {
        FORM_URL_ENCODED
    }

    fn base_url<'a>(&self, connectors: &'a Connectors) -> &'a str {
        connectors.sagepay.base_url.as_ref()
    }

    fn build_error_response(
        &self,
        res: Response,
        event_builder: Option<&mut ConnectorEvent>,
    ) -> CustomResult<ErrorResponse, ConnectorError> {
        sagepay::build_error_response(res, event_builder)
    }
}

macros::impl_capability_markers!(
    Sagepayform,
    [
        ConnectorServiceTrait,
        ValidationTrait,
        PaymentAuthorizeV2,
        PaymentCompleteAuthorizeV2,
        PaymentSyncV2,
        PaymentSessionToken,
        PaymentTokenV2,
        PaymentVoidV2,
        PaymentVoidPostCaptureV2,
        IncomingWebhook,
        RefundV2,
        PaymentCapture,
        SetupMandateV2,
        RepeatPaymentV2,
        MandateRevokeV2,
    ]
);

impl ConnectorIntegrationV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>
    for Sagepayform
{
    fn build_request_v2(
        &self,
        _req: &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
    ) -> CustomResult<Option<common_utils::request::Request>, ConnectorError> {
        Ok(None)
    }

    fn handle_without_request_v2(
        &self,
        data: &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
    ) -> CustomResult<
        RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        ConnectorError,
    > {
        let amount = convert_amount(
            self.amount_converter,
            data.request.minor_amount,
            data.request.currency,
        )?;
        let auth = SagepayFormAuthType::try_from(&data.connector_auth_type)?;
        let metadata = SagepayMetadata::from_payment_flow_data(&data.resource_common_data)?;
        let encrypted = SagepayFormCrypt::try_from(SagepayRouterData::from((amount, data)))?
            .encrypt(&auth.encryption_password)?;

        let vendor_tx_code = &data.resource_common_data.connector_request_reference_id;
        let form = build_registration_form(
            self.base_url(&data.resource_common_data.connectors),
            metadata.protocol_version,
            TxType::for_payment(data.request.is_auto_capture()?),
            &auth.vendor,
            encrypted,
        )?;
        tracing::info!(%vendor_tx_code, "sagepay form registration built");

        Ok(RouterDataV2 {
            resource_common_data: PaymentFlowData {
                status: AttemptStatus::AuthenticationPending,
                ..data.resource_common_data.clone()
            },
            response: Ok(get_registration_response(vendor_tx_code, form)?),
            ..data.clone()
        })
    }
}

impl
    ConnectorIntegrationV2<
        CompleteAuthorize,
        PaymentFlowData,
        PaymentsCompleteAuthorizeData,
        PaymentsResponseData,
    > for Sagepayform
{
    fn build_request_v2(
        &self,
        _req: &RouterDataV2<
            CompleteAuthorize,
            PaymentFlowData,
            PaymentsCompleteAuthorizeData,
            PaymentsResponseData,
        >,
    ) -> CustomResult<Option<common_utils::request::Request>, ConnectorError> {
        Ok(None)
    }

    fn handle_without_request_v2(
        &self,
        data: &RouterDataV2<
            CompleteAuthorize,
            PaymentFlowData,
            PaymentsCompleteAuthorizeData,
            PaymentsResponseData,
        >,
    ) -> CustomResult<
        RouterDataV2<
            CompleteAuthorize,
            PaymentFlowData,
            PaymentsCompleteAuthorizeData,
            PaymentsResponseData,
        >,
        ConnectorError,
    > {
        transformers::complete_payment(data)
    }
}

macros::impl_flow_not_supported!(
    Sagepayform,
    PSync,
    PaymentFlowData,
    PaymentsSyncData,
    PaymentsResponseData
);

macros::impl_flow_not_supported!(
    Sagepayform,
    CreateSessionToken,
    PaymentFlowData,
    SessionTokenRequestData,
    SessionTokenResponseData
);

macros::impl_flow_not_supported!(
    Sagepayform,
    PaymentMethodToken,
    PaymentFlowData,
    PaymentMethodTokenizationData,
    PaymentMethodTokenResponse
);

macros::impl_flow_not_supported!(
    Sagepayform,
    SetupMandate,
    PaymentFlowData,
    SetupMandateRequestData,
    PaymentsResponseData
);

// Form payments are settled from the gateway's admin pages
macros::impl_flow_not_supported!(
    Sagepayform,
    Capture,
    PaymentFlowData,
    domain_types::connector_types::PaymentsCaptureData,
    PaymentsResponseData
);

macros::impl_flow_not_supported!(
    Sagepayform,
    Void,
    PaymentFlowData,
    domain_types::connector_types::PaymentVoidData,
    PaymentsResponseData
);

macros::impl_flow_not_supported!(
    Sagepayform,
    VoidPC,
    PaymentFlowData,
    domain_types::connector_types::PaymentsCancelPostCaptureData,
    PaymentsResponseData
);

macros::impl_flow_not_supported!(
    Sagepayform,
    Refund,
    domain_types::connector_types::RefundFlowData,
    domain_types::connector_types::RefundsData,
    domain_types::connector_types::RefundsResponseData
);

macros::impl_flow_not_supported!(
    Sagepayform,
    RepeatPayment,
    PaymentFlowData,
    domain_types::connector_types::RepeatPaymentData,
    PaymentsResponseData
);

macros::impl_flow_not_supported!(
    Sagepayform,
    MandateRevoke,
    PaymentFlowData,
    domain_types::connector_types::MandateRevokeRequestData,
    domain_types::connector_types::MandateRevokeResponseData
);

/// The encryption password, from the redirect secret or the merchant's `BodyKey` auth
fn get_encryption_password(
    secrets: ConnectorSourceVerificationSecrets,
) -> CustomResult<Secret<String>, ConnectorError> {
    match secrets {
        ConnectorSourceVerificationSecrets::RedirectResponseSecret(secret) => {
            String::from_utf8(secret.secret)
                .map(Secret::new)
                .map_err(|_| ConnectorError::FailedToObtainAuthType.into())
        }
        ConnectorSourceVerificationSecrets::AuthHeaders(auth)
        | ConnectorSourceVerificationSecrets::AuthWithWebHookSecret {
            auth_headers: auth, ..
        } => Ok(SagepayFormAuthType::try_from(&auth)?.encryption_password),
        ConnectorSourceVerificationSecrets::WebhookSecret(_) => {
            Err(ConnectorError::FailedToObtainAuthType.into())
        }
    }
}

fn get_crypt(text: &[u8]) -> CustomResult<String, ConnectorError> {
    std::str::from_utf8(text)
        .ok()
        .and_then(extract_crypt)
        .ok_or(
            ConnectorError::MissingConnectorRedirectionPayload {
                field_name: constants::FORM_CRYPT_PARAM,
            }
            .into(),
        )
}

impl BodyDecoding for Sagepayform {
    fn get_secrets(
        &self,
        secrets: ConnectorSourceVerificationSecrets,
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        Ok(get_encryption_password(secrets)?.peek().as_bytes().to_vec())
    }

    fn get_algorithm(&self) -> CustomResult<Box<dyn crypto::DecodeMessage + Send>, ConnectorError> {
        Ok(Box::new(crypt::SagepayCrypt))
    }

    fn get_message(&self, body: &[u8]) -> CustomResult<Vec<u8>, ConnectorError> {
        Ok(get_crypt(body)?.into_bytes())
    }
}

impl SourceVerification for Sagepayform {
    fn get_secrets(
        &self,
        secrets: ConnectorSourceVerificationSecrets,
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        Ok(get_encryption_password(secrets)?.peek().as_bytes().to_vec())
    }

    /// The crypt carries no signature; it is authentic when our password decrypts it into a
    /// well formed result
    fn verify(
        &self,
        secrets: ConnectorSourceVerificationSecrets,
        payload: &[u8],
    ) -> CustomResult<bool, ConnectorError> {
        let password = get_encryption_password(secrets)?;
        match SagepayFormResult::decode(&get_crypt(payload)?, &password) {
            Ok(_) => Ok(true),
            Err(error) => {
                tracing::warn!(?error, "sagepay form crypt failed to decrypt");
                Ok(false)
            }
        }
    }
}

impl VerifyRedirectResponse for Sagepayform {
    fn process_redirect_response(
        &self,
        request: &RequestDetails,
        secrets: Option<ConnectorSourceVerificationSecrets>,
    ) -> CustomResult<RedirectDetailsResponse, ConnectorError> {
        let secrets = secrets.ok_or(ConnectorError::MissingRequiredField {
            field_name: "redirect response secrets",
        })?;
        let password = get_encryption_password(secrets)?;
        let encrypted = request
            .query_params
            .as_deref()
            .and_then(extract_crypt)
            .map_or_else(|| get_crypt(&request.body), Ok)?;

        let plain_text = crypt::decrypt(&encrypted, &password)?;
        let result = SagepayFormResult::parse(&plain_text)?;
        // the result does not say whether the payment was deferred
        let details = result.to_redirect_details(true)?;
        Ok(RedirectDetailsResponse {
            raw_connector_response: Some(plain_text),
            ..details
        })
    }
}
