//! Server integration: the shopper pays on the gateway's hosted pages and the outcome reaches
//! us as a signed notification posted to the `NotificationURL`.

pub mod transformers;

#[cfg(test)]
mod test;

use common_enums::CurrencyUnit;
use common_utils::{
    errors::CustomResult, request::RequestContent, types::StringMajorUnit, AmountConvertor,
    ExposeInterface, StringMajorUnitForConnector,
};
use domain_types::{
    connector_flow::{Authorize, SetupMandate},
    connector_types::{
        ConnectorWebhookSecrets, EventType, PaymentFlowData, PaymentMethodTokenResponse,
        PaymentMethodTokenizationData, PaymentsAuthorizeData, PaymentsCompleteAuthorizeData,
        PaymentsResponseData, PaymentsSyncData, RequestDetails, SessionTokenRequestData,
        SessionTokenResponseData, SetupMandateRequestData, WebhookDetailsResponse,
    },
    errors::ConnectorError,
    router_data::{ConnectorAuthType, ErrorResponse},
    router_data_v2::RouterDataV2,
    router_response_types::Response,
    types::Connectors,
    utils::convert_amount,
};
use interfaces::{
    api::{ApplicationResponse, ConnectorCommon},
    connector_integration_v2::ConnectorIntegrationV2,
    connector_types::{IncomingWebhook, IncomingWebhookFlowError},
    events::connector_api_logs::ConnectorEvent,
};
use serde_json::Value;
use transformers::{
    SagepayServerPaymentRequest, SagepayServerRegistrationResponse, SagepayServerTokenRequest,
};

use super::{
    macros,
    sagepay::{
        self,
        constants::{self, services},
        notification::{self, NotificationReply, SagepayNotification},
        transformers::{SagepayAuthType, SagepayResponse, SagepayRouterData},
        FORM_URL_ENCODED,
    },
};
use crate::{types::ResponseRouterData, utils};

#[derive(Clone)]
pub struct Sagepayserver {
    amount_converter: &'static (dyn AmountConvertor<Output = StringMajorUnit> + Sync),
}

impl Sagepayserver {
    pub const fn new() -> &'static Self {
        &Self {
            amount_converter: &StringMajorUnitForConnector,
        }
    }
}

impl ConnectorCommon for Sagepayserver {
    fn id(&self) -> &'static str {
        "sagepayserver"
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
    Sagepayserver,
    [
        ConnectorServiceTrait,
        ValidationTrait,
        PaymentAuthorizeV2,
        PaymentCompleteAuthorizeV2,
        PaymentSyncV2,
        PaymentSessionToken,
        PaymentTokenV2,
        SetupMandateV2,
        VerifyRedirectResponse,
    ]
);

macros::impl_sagepay_follow_up_flows!(Sagepayserver);

macros::impl_flow_not_supported!(
    Sagepayserver,
    PSync,
    PaymentFlowData,
    PaymentsSyncData,
    PaymentsResponseData
);

macros::impl_flow_not_supported!(
    Sagepayserver,
    CreateSessionToken,
    PaymentFlowData,
    SessionTokenRequestData,
    SessionTokenResponseData
);

// The hosted pages collect the card and run 3-D Secure themselves
macros::impl_flow_not_supported!(
    Sagepayserver,
    CompleteAuthorize,
    PaymentFlowData,
    PaymentsCompleteAuthorizeData,
    PaymentsResponseData
);

macros::impl_flow_not_supported!(
    Sagepayserver,
    PaymentMethodToken,
    PaymentFlowData,
    PaymentMethodTokenizationData,
    PaymentMethodTokenResponse
);

impl ConnectorIntegrationV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>
    for Sagepayserver
{
    macros::expand_sagepay_common_fns!(
        Authorize,
        PaymentFlowData,
        PaymentsAuthorizeData,
        PaymentsResponseData
    );

    fn get_url(
        &self,
        req: &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
    ) -> CustomResult<String, ConnectorError> {
        Ok(sagepay::service_url(
            self.base_url(&req.resource_common_data.connectors),
            services::SERVER_REGISTER,
        ))
    }

    fn get_request_body(
        &self,
        req: &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
    ) -> CustomResult<Option<RequestContent>, ConnectorError> {
        let amount = convert_amount(
            self.amount_converter,
            req.request.minor_amount,
            req.request.currency,
        )?;
        let connector_req =
            SagepayServerPaymentRequest::try_from(SagepayRouterData::from((amount, req)))?;
        Ok(Some(RequestContent::FormUrlEncoded(Box::new(connector_req))))
    }

    fn handle_response_v2(
        &self,
        data: &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        event_builder: Option<&mut ConnectorEvent>,
        res: Response,
    ) -> CustomResult<
        RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        ConnectorError,
    > {
        let response: SagepayResponse =
            sagepay::handle_key_value_response(&res, event_builder, "SagepayResponse")?;
        tracing::info!(status = %response.status, "sagepay server registration answered");
        RouterDataV2::try_from(ResponseRouterData {
            response: SagepayServerRegistrationResponse(response),
            router_data: data.clone(),
            http_code: res.status_code,
        })
    }
}

impl
    ConnectorIntegrationV2<
        SetupMandate,
        PaymentFlowData,
        SetupMandateRequestData,
        PaymentsResponseData,
    > for Sagepayserver
{
    macros::expand_sagepay_common_fns!(
        SetupMandate,
        PaymentFlowData,
        SetupMandateRequestData,
        PaymentsResponseData
    );

    fn get_url(
        &self,
        req: &RouterDataV2<SetupMandate, PaymentFlowData, SetupMandateRequestData, PaymentsResponseData>,
    ) -> CustomResult<String, ConnectorError> {
        Ok(sagepay::service_url(
            self.base_url(&req.resource_common_data.connectors),
            services::SERVER_TOKEN,
        ))
    }

    fn get_request_body(
        &self,
        req: &RouterDataV2<SetupMandate, PaymentFlowData, SetupMandateRequestData, PaymentsResponseData>,
    ) -> CustomResult<Option<RequestContent>, ConnectorError> {
        let connector_req = SagepayServerTokenRequest::try_from(req)?;
        Ok(Some(RequestContent::FormUrlEncoded(Box::new(connector_req))))
    }

    fn handle_response_v2(
        &self,
        data: &RouterDataV2<SetupMandate, PaymentFlowData, SetupMandateRequestData, PaymentsResponseData>,
        event_builder: Option<&mut ConnectorEvent>,
        res: Response,
    ) -> CustomResult<
        RouterDataV2<SetupMandate, PaymentFlowData, SetupMandateRequestData, PaymentsResponseData>,
        ConnectorError,
    > {
        let response: SagepayResponse =
            sagepay::handle_key_value_response(&res, event_builder, "SagepayResponse")?;
        RouterDataV2::try_from(ResponseRouterData {
            response: SagepayServerRegistrationResponse(response),
            router_data: data.clone(),
            http_code: res.status_code,
        })
    }
}

/// Vendor name signed into notifications: the webhook secret's additional secret when set,
/// otherwise the connector account's vendor
fn get_vendor(
    connector_webhook_secret: &ConnectorWebhookSecrets,
    connector_account_details: Option<&ConnectorAuthType>,
) -> CustomResult<String, ConnectorError> {
    match (
        &connector_webhook_secret.additional_secret,
        connector_account_details,
    ) {
        (Some(vendor), _) => Ok(vendor.clone().expose()),
        (None, Some(auth_type)) => Ok(SagepayAuthType::try_from(auth_type)?.vendor.expose()),
        (None, None) => Err(ConnectorError::WebhookVerificationSecretNotFound.into()),
    }
}

fn get_webhook_secret(
    connector_webhook_secret: Option<ConnectorWebhookSecrets>,
) -> CustomResult<ConnectorWebhookSecrets, ConnectorError> {
    connector_webhook_secret.ok_or(ConnectorError::WebhookVerificationSecretNotFound.into())
}

impl IncomingWebhook for Sagepayserver {
    fn get_webhook_source_verification_signature(
        &self,
        request: &RequestDetails,
        _connector_webhook_secret: &ConnectorWebhookSecrets,
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        let notification = SagepayNotification::parse(&request.body)?;
        Ok(notification
            .get_signature()?
            .to_ascii_lowercase()
            .into_bytes())
    }

    fn get_webhook_source_verification_message(
        &self,
        request: &RequestDetails,
        connector_webhook_secret: &ConnectorWebhookSecrets,
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        let notification = SagepayNotification::parse(&request.body)?;
        let vendor = get_vendor(connector_webhook_secret, None)?;
        let security_key = notification::get_security_key(&connector_webhook_secret.secret)?;
        Ok(notification
            .get_signature_message(&vendor, &security_key)
            .into_bytes())
    }

    fn verify_webhook_source(
        &self,
        request: RequestDetails,
        connector_webhook_secret: Option<ConnectorWebhookSecrets>,
        connector_account_details: Option<ConnectorAuthType>,
    ) -> CustomResult<bool, ConnectorError> {
        let secret = get_webhook_secret(connector_webhook_secret)?;
        let notification = SagepayNotification::parse(&request.body)?;
        let vendor = get_vendor(&secret, connector_account_details.as_ref())?;
        let security_key = notification::get_security_key(&secret.secret)?;
        notification.is_valid(&vendor, &security_key)
    }

    fn get_event_type(
        &self,
        request: RequestDetails,
        _connector_webhook_secret: Option<ConnectorWebhookSecrets>,
        _connector_account_details: Option<ConnectorAuthType>,
    ) -> CustomResult<EventType, ConnectorError> {
        let notification = SagepayNotification::parse(&request.body)?;
        Ok(transformers::get_event_type(&notification))
    }

    fn process_payment_webhook(
        &self,
        request: RequestDetails,
        connector_webhook_secret: Option<ConnectorWebhookSecrets>,
        connector_account_details: Option<ConnectorAuthType>,
    ) -> CustomResult<WebhookDetailsResponse, ConnectorError> {
        let secret = get_webhook_secret(connector_webhook_secret)?;
        let notification = SagepayNotification::parse(&request.body)?;
        let vendor = get_vendor(&secret, connector_account_details.as_ref())?;
        let security_key = notification::get_security_key(&secret.secret)?;
        if !notification.is_valid(&vendor, &security_key)? {
            return Err(ConnectorError::WebhookSourceVerificationFailed.into());
        }
        tracing::info!(
            vendor_tx_code = notification.get(constants::fields::VENDOR_TX_CODE),
            status = %notification.status(),
            "sagepay server notification accepted"
        );
        transformers::get_webhook_details(&notification, &security_key, &request.body)
    }

    /// The gateway waits for a plain text `Status`/`RedirectURL` answer; the redirect URL was
    /// put on the notification URL when the payment was registered
    fn get_webhook_api_response(
        &self,
        request: RequestDetails,
        error_kind: Option<IncomingWebhookFlowError>,
    ) -> CustomResult<ApplicationResponse<Value>, ConnectorError> {
        let redirect_url = request
            .query_params
            .as_deref()
            .and_then(|query| {
                utils::get_query_param(query, constants::NOTIFICATION_REDIRECT_URL_PARAM)
            })
            .ok_or(ConnectorError::MissingRequiredField {
                field_name: constants::NOTIFICATION_REDIRECT_URL_PARAM,
            })?;
        let reply = match error_kind {
            None => NotificationReply::accept(redirect_url, None),
            Some(IncomingWebhookFlowError::ResourceNotFound) => NotificationReply::reject(
                redirect_url,
                Some("Unknown VendorTxCode".to_string()),
            ),
            Some(IncomingWebhookFlowError::InternalError) => NotificationReply::error(
                redirect_url,
                Some("Notification could not be processed".to_string()),
            ),
        };
        Ok(ApplicationResponse::TextPlain(reply.to_body()))
    }
}
