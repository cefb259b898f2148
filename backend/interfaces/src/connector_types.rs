use common_enums::PaymentMethod;
use common_utils::CustomResult;
use domain_types::{
    connector_flow,
    connector_types::{
        ConnectorWebhookSecrets, EventType, MandateRevokeRequestData, MandateRevokeResponseData,
        PaymentFlowData, PaymentMethodTokenResponse, PaymentMethodTokenizationData,
        PaymentVoidData, PaymentsAuthorizeData, PaymentsCancelPostCaptureData,
        PaymentsCaptureData, PaymentsCompleteAuthorizeData, PaymentsResponseData,
        PaymentsSyncData, RedirectDetailsResponse, RefundFlowData, RefundsData,
        RefundsResponseData, RepeatPaymentData, RequestDetails, SessionTokenRequestData,
        SessionTokenResponseData, SetupMandateRequestData, WebhookDetailsResponse,
    },
    router_data::ConnectorAuthType,
};
use serde_json::Value;

use crate::{
    api::{ApplicationResponse, ConnectorCommon},
    connector_integration_v2::ConnectorIntegrationV2,
    decode::BodyDecoding,
    verification::{ConnectorSourceVerificationSecrets, SourceVerification},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomingWebhookFlowError {
    ResourceNotFound,
    InternalError,
}

pub trait ConnectorServiceTrait:
    ConnectorCommon
    + ValidationTrait
    + PaymentAuthorizeV2
    + PaymentCompleteAuthorizeV2
    + PaymentSyncV2
    + PaymentSessionToken
    + PaymentTokenV2
    + PaymentVoidV2
    + PaymentVoidPostCaptureV2
    + IncomingWebhook
    + RefundV2
    + PaymentCapture
    + SetupMandateV2
    + RepeatPaymentV2
    + MandateRevokeV2
    + VerifyRedirectResponse
{
}

pub type BoxedConnector = Box<&'static (dyn ConnectorServiceTrait + Sync)>;

/// Pre-flows a caller has to run before `Authorize`
pub trait ValidationTrait {
    fn should_do_session_token(&self) -> bool {
        false
    }

    fn should_do_payment_method_token(&self, _payment_method: PaymentMethod) -> bool {
        false
    }
}

pub trait PaymentVoidV2:
    ConnectorIntegrationV2<connector_flow::Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData>
{
}

pub trait PaymentVoidPostCaptureV2:
    ConnectorIntegrationV2<
    connector_flow::VoidPC,
    PaymentFlowData,
    PaymentsCancelPostCaptureData,
    PaymentsResponseData,
>
{
}

pub trait PaymentSessionToken:
    ConnectorIntegrationV2<
    connector_flow::CreateSessionToken,
    PaymentFlowData,
    SessionTokenRequestData,
    SessionTokenResponseData,
>
{
}

pub trait PaymentTokenV2:
    ConnectorIntegrationV2<
    connector_flow::PaymentMethodToken,
    PaymentFlowData,
    PaymentMethodTokenizationData,
    PaymentMethodTokenResponse,
>
{
}

pub trait PaymentAuthorizeV2:
    ConnectorIntegrationV2<
    connector_flow::Authorize,
    PaymentFlowData,
    PaymentsAuthorizeData,
    PaymentsResponseData,
>
{
}

pub trait PaymentCompleteAuthorizeV2:
    ConnectorIntegrationV2<
    connector_flow::CompleteAuthorize,
    PaymentFlowData,
    PaymentsCompleteAuthorizeData,
    PaymentsResponseData,
>
{
}

pub trait PaymentSyncV2:
    ConnectorIntegrationV2<
    connector_flow::PSync,
    PaymentFlowData,
    PaymentsSyncData,
    PaymentsResponseData,
>
{
}

pub trait RefundV2:
    ConnectorIntegrationV2<connector_flow::Refund, RefundFlowData, RefundsData, RefundsResponseData>
{
}

pub trait PaymentCapture:
    ConnectorIntegrationV2<
    connector_flow::Capture,
    PaymentFlowData,
    PaymentsCaptureData,
    PaymentsResponseData,
>
{
}

pub trait SetupMandateV2:
    ConnectorIntegrationV2<
    connector_flow::SetupMandate,
    PaymentFlowData,
    SetupMandateRequestData,
    PaymentsResponseData,
>
{
}

pub trait RepeatPaymentV2:
    ConnectorIntegrationV2<
    connector_flow::RepeatPayment,
    PaymentFlowData,
    RepeatPaymentData,
    PaymentsResponseData,
>
{
}

pub trait MandateRevokeV2:
    ConnectorIntegrationV2<
    connector_flow::MandateRevoke,
    PaymentFlowData,
    MandateRevokeRequestData,
    MandateRevokeResponseData,
>
{
}

pub trait IncomingWebhook {
    fn verify_webhook_source(
        &self,
        _request: RequestDetails,
        _connector_webhook_secret: Option<ConnectorWebhookSecrets>,
        _connector_account_details: Option<ConnectorAuthType>,
    ) -> Result<bool, error_stack::Report<domain_types::errors::ConnectorError>> {
        Ok(false)
    }

    /// fn get_webhook_source_verification_signature
    fn get_webhook_source_verification_signature(
        &self,
        _request: &RequestDetails,
        _connector_webhook_secret: &ConnectorWebhookSecrets,
    ) -> Result<Vec<u8>, error_stack::Report<domain_types::errors::ConnectorError>> {
        Ok(Vec::new())
    }

    /// fn get_webhook_source_verification_message
    fn get_webhook_source_verification_message(
        &self,
        _request: &RequestDetails,
        _connector_webhook_secret: &ConnectorWebhookSecrets,
    ) -> Result<Vec<u8>, error_stack::Report<domain_types::errors::ConnectorError>> {
        Ok(Vec::new())
    }

    fn get_event_type(
        &self,
        _request: RequestDetails,
        _connector_webhook_secret: Option<ConnectorWebhookSecrets>,
        _connector_account_details: Option<ConnectorAuthType>,
    ) -> Result<EventType, error_stack::Report<domain_types::errors::ConnectorError>> {
        Err(
            domain_types::errors::ConnectorError::NotImplemented("get_event_type".to_string())
                .into(),
        )
    }

    fn process_payment_webhook(
        &self,
        _request: RequestDetails,
        _connector_webhook_secret: Option<ConnectorWebhookSecrets>,
        _connector_account_details: Option<ConnectorAuthType>,
    ) -> Result<WebhookDetailsResponse, error_stack::Report<domain_types::errors::ConnectorError>>
    {
        Err(domain_types::errors::ConnectorError::NotImplemented(
            "process_payment_webhook".to_string(),
        )
        .into())
    }

    /// fn get_webhook_api_response
    ///
    /// This is used by callers to decide what HTTP response
    /// should be sent back to the connector for webhook acknowledgement.
    fn get_webhook_api_response(
        &self,
        _request: RequestDetails,
        _error_kind: Option<IncomingWebhookFlowError>,
    ) -> Result<
        ApplicationResponse<Value>,
        error_stack::Report<domain_types::errors::ConnectorError>,
    > {
        Ok(ApplicationResponse::StatusOk)
    }
}

pub trait VerifyRedirectResponse: SourceVerification + BodyDecoding {
    /// fn decode_redirect_response_body
    fn decode_redirect_response_body(
        &self,
        request: &RequestDetails,
        secrets: Option<ConnectorSourceVerificationSecrets>,
    ) -> CustomResult<Vec<u8>, domain_types::errors::ConnectorError> {
        self.decode(secrets, &request.body)
    }

    fn verify_redirect_response_source(
        &self,
        request: &RequestDetails,
        secrets: Option<ConnectorSourceVerificationSecrets>,
    ) -> CustomResult<bool, domain_types::errors::ConnectorError> {
        let connector_source_verification_secrets =
            secrets.ok_or(domain_types::errors::ConnectorError::MissingRequiredField {
                field_name: "redirect response secrets",
            })?;

        self.verify(connector_source_verification_secrets, &request.body)
    }

    fn process_redirect_response(
        &self,
        _request: &RequestDetails,
        _secrets: Option<ConnectorSourceVerificationSecrets>,
    ) -> CustomResult<RedirectDetailsResponse, domain_types::errors::ConnectorError> {
        Err(domain_types::errors::ConnectorError::NotImplemented(
            "process_redirect_response".to_string(),
        )
        .into())
    }
}
