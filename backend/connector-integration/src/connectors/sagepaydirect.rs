//! Direct integration: the merchant collects card details and registers the payment
//! server-to-server.

pub mod transformers;

#[cfg(test)]
mod test;

use common_enums::CurrencyUnit;
use common_utils::{
    errors::CustomResult, request::RequestContent, types::StringMajorUnit, AmountConvertor,
    StringMajorUnitForConnector,
};
use domain_types::{
    connector_flow::{Authorize, CompleteAuthorize, PaymentMethodToken, SetupMandate},
    connector_types::{
        PaymentFlowData, PaymentMethodTokenResponse, PaymentMethodTokenizationData,
        PaymentsAuthorizeData, PaymentsCompleteAuthorizeData, PaymentsResponseData,
        PaymentsSyncData, SessionTokenRequestData, SessionTokenResponseData,
        SetupMandateRequestData,
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
    events::connector_api_logs::ConnectorEvent,
};
use transformers::{
    SagepayDirectCompleteRequest, SagepayDirectPaymentRequest, SagepayDirectTokenRequest,
};

use super::{
    macros,
    sagepay::{
        self, constants::services, transformers::SagepayResponse,
        transformers::SagepayRouterData, FORM_URL_ENCODED,
    },
};
use crate::types::ResponseRouterData;

#[derive(Clone)]
pub struct Sagepaydirect {
    amount_converter: &'static (dyn AmountConvertor<Output = StringMajorUnit> + Sync),
}

impl Sagepaydirect {
    pub const fn new() -> &'static Self {
        &Self {
            amount_converter: &StringMajorUnitForConnector,
        }
    }
}

impl ConnectorCommon for Sagepaydirect {
    fn id(&self) -> &'static str {
        "sagepaydirect"
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
    Sagepaydirect,
    [
        ConnectorServiceTrait,
        ValidationTrait,
        PaymentAuthorizeV2,
        PaymentCompleteAuthorizeV2,
        PaymentSyncV2,
        PaymentSessionToken,
        PaymentTokenV2,
        SetupMandateV2,
        IncomingWebhook,
        VerifyRedirectResponse,
    ]
);

macros::impl_sagepay_follow_up_flows!(Sagepaydirect);

macros::impl_flow_not_supported!(
    Sagepaydirect,
    PSync,
    PaymentFlowData,
    PaymentsSyncData,
    PaymentsResponseData
);

macros::impl_flow_not_supported!(
    Sagepaydirect,
    CreateSessionToken,
    PaymentFlowData,
    SessionTokenRequestData,
    SessionTokenResponseData
);

impl ConnectorIntegrationV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>
    for Sagepaydirect
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
            services::DIRECT_REGISTER,
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
            SagepayDirectPaymentRequest::try_from(SagepayRouterData::from((amount, req)))?;
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
        tracing::info!(status = %response.status, "sagepay direct registration answered");
        RouterDataV2::try_from(ResponseRouterData {
            response,
            router_data: data.clone(),
            http_code: res.status_code,
        })
    }
}

impl
    ConnectorIntegrationV2<
        CompleteAuthorize,
        PaymentFlowData,
        PaymentsCompleteAuthorizeData,
        PaymentsResponseData,
    > for Sagepaydirect
{
    macros::expand_sagepay_common_fns!(
        CompleteAuthorize,
        PaymentFlowData,
        PaymentsCompleteAuthorizeData,
        PaymentsResponseData
    );

    fn get_url(
        &self,
        req: &RouterDataV2<
            CompleteAuthorize,
            PaymentFlowData,
            PaymentsCompleteAuthorizeData,
            PaymentsResponseData,
        >,
    ) -> CustomResult<String, ConnectorError> {
        let connector_req = self.build_complete_authorize_request(req)?;
        Ok(sagepay::service_url(
            self.base_url(&req.resource_common_data.connectors),
            connector_req.get_service(),
        ))
    }

    fn get_request_body(
        &self,
        req: &RouterDataV2<
            CompleteAuthorize,
            PaymentFlowData,
            PaymentsCompleteAuthorizeData,
            PaymentsResponseData,
        >,
    ) -> CustomResult<Option<RequestContent>, ConnectorError> {
        let connector_req = self.build_complete_authorize_request(req)?;
        Ok(Some(RequestContent::FormUrlEncoded(Box::new(connector_req))))
    }

    fn handle_response_v2(
        &self,
        data: &RouterDataV2<
            CompleteAuthorize,
            PaymentFlowData,
            PaymentsCompleteAuthorizeData,
            PaymentsResponseData,
        >,
        event_builder: Option<&mut ConnectorEvent>,
        res: Response,
    ) -> CustomResult<
        RouterDataV2<
            CompleteAuthorize,
            PaymentFlowData,
            PaymentsCompleteAuthorizeData,
            PaymentsResponseData,
        >,
        ConnectorError,
    > {
        let response: SagepayResponse =
            sagepay::handle_key_value_response(&res, event_builder, "SagepayResponse")?;
        RouterDataV2::try_from(ResponseRouterData {
            response,
            router_data: data.clone(),
            http_code: res.status_code,
        })
    }
}

impl Sagepaydirect {
    fn build_complete_authorize_request(
        &self,
        req: &RouterDataV2<
            CompleteAuthorize,
            PaymentFlowData,
            PaymentsCompleteAuthorizeData,
            PaymentsResponseData,
        >,
    ) -> CustomResult<SagepayDirectCompleteRequest, ConnectorError> {
        let amount = convert_amount(
            self.amount_converter,
            req.request.minor_amount,
            req.request.currency,
        )?;
        SagepayDirectCompleteRequest::try_from(SagepayRouterData::from((amount, req)))
    }
}

impl
    ConnectorIntegrationV2<
        PaymentMethodToken,
        PaymentFlowData,
        PaymentMethodTokenizationData,
        PaymentMethodTokenResponse,
    > for Sagepaydirect
{
    macros::expand_sagepay_common_fns!(
        PaymentMethodToken,
        PaymentFlowData,
        PaymentMethodTokenizationData,
        PaymentMethodTokenResponse
    );

    fn get_url(
        &self,
        req: &RouterDataV2<
            PaymentMethodToken,
            PaymentFlowData,
            PaymentMethodTokenizationData,
            PaymentMethodTokenResponse,
        >,
    ) -> CustomResult<String, ConnectorError> {
        Ok(sagepay::service_url(
            self.base_url(&req.resource_common_data.connectors),
            services::DIRECT_TOKEN,
        ))
    }

    fn get_request_body(
        &self,
        req: &RouterDataV2<
            PaymentMethodToken,
            PaymentFlowData,
            PaymentMethodTokenizationData,
            PaymentMethodTokenResponse,
        >,
    ) -> CustomResult<Option<RequestContent>, ConnectorError> {
        let connector_req = SagepayDirectTokenRequest::try_from(req)?;
        Ok(Some(RequestContent::FormUrlEncoded(Box::new(connector_req))))
    }

    fn handle_response_v2(
        &self,
        data: &RouterDataV2<
            PaymentMethodToken,
            PaymentFlowData,
            PaymentMethodTokenizationData,
            PaymentMethodTokenResponse,
        >,
        event_builder: Option<&mut ConnectorEvent>,
        res: Response,
    ) -> CustomResult<
        RouterDataV2<
            PaymentMethodToken,
            PaymentFlowData,
            PaymentMethodTokenizationData,
            PaymentMethodTokenResponse,
        >,
        ConnectorError,
    > {
        let response: SagepayResponse =
            sagepay::handle_key_value_response(&res, event_builder, "SagepayResponse")?;
        RouterDataV2::try_from(ResponseRouterData {
            response,
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
    > for Sagepaydirect
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
            services::DIRECT_TOKEN,
        ))
    }

    fn get_request_body(
        &self,
        req: &RouterDataV2<SetupMandate, PaymentFlowData, SetupMandateRequestData, PaymentsResponseData>,
    ) -> CustomResult<Option<RequestContent>, ConnectorError> {
        let connector_req = SagepayDirectTokenRequest::try_from(req)?;
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
            response,
            router_data: data.clone(),
            http_code: res.status_code,
        })
    }
}
