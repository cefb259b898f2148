//! Pi REST integration: JSON over HTTPS with Basic auth, card details tokenised into a
//! card identifier under a short lived merchant session key.

pub mod transformers;


use common_enums::{CurrencyUnit, PaymentMethod};
use common_utils::{
    consts, errors::CustomResult, ext_traits::BytesExt, request::RequestContent, AmountConvertor,
    Mask, Maskable, MinorUnit, MinorUnitForConnector,
};
use domain_types::{
    connector_flow::{
        Authorize, Capture, CompleteAuthorize, CreateSessionToken, PSync, PaymentMethodToken,
        Refund, RepeatPayment, Void, VoidPC,
    },
    connector_types::{
        MandateRevokeRequestData, MandateRevokeResponseData, PaymentFlowData,
        PaymentMethodTokenResponse, PaymentMethodTokenizationData, PaymentVoidData,
        PaymentsAuthorizeData, PaymentsCancelPostCaptureData, PaymentsCaptureData,
        PaymentsCompleteAuthorizeData, PaymentsResponseData, PaymentsSyncData, RefundFlowData,
        RefundsData, RefundsResponseData, RepeatPaymentData, SessionTokenRequestData,
        SessionTokenResponseData, SetupMandateRequestData,
    },
    errors::ConnectorError,
    router_data::{ConnectorAuthType, ErrorResponse},
    router_data_v2::RouterDataV2,
    router_response_types::Response,
    types::Connectors,
    utils::convert_amount,
};
use error_stack::ResultExt;
use interfaces::{
    api::ConnectorCommon, connector_integration_v2::ConnectorIntegrationV2,
    connector_types::ValidationTrait, events::connector_api_logs::ConnectorEvent,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use transformers::{
    get_challenge_transaction_id, SagepaypiAuthType, SagepaypiCardIdentifierRequest,
    SagepaypiCardIdentifierResponse, SagepaypiErrorResponse, SagepaypiInstructionRequest,
    SagepaypiInstructionResponse, SagepaypiMerchantSessionKeyRequest,
    SagepaypiMerchantSessionKeyResponse, SagepaypiPaymentRequest,
    SagepaypiReferencedTransactionRequest, SagepaypiRouterData, SagepaypiThreeDsChallengeRequest,
    SagepaypiTransactionResponse,
};

use super::macros;
use crate::{types::ResponseRouterData, with_error_response_body, with_response_body};

pub(crate) mod headers {
    pub(crate) const CONTENT_TYPE: &str = "Content-Type";
    pub(crate) const AUTHORIZATION: &str = "Authorization";
}

mod endpoints {
    pub(super) const MERCHANT_SESSION_KEYS: &str = "merchant-session-keys";
    pub(super) const CARD_IDENTIFIERS: &str = "card-identifiers";
    pub(super) const TRANSACTIONS: &str = "transactions";
    pub(super) const INSTRUCTIONS: &str = "instructions";
    pub(super) const THREE_DS_CHALLENGE: &str = "3d-secure-challenge";
}

#[derive(Clone)]
pub struct Sagepaypi {
    amount_converter: &'static (dyn AmountConvertor<Output = MinorUnit> + Sync),
}

impl Sagepaypi {
    pub const fn new() -> &'static Self {
        &Self {
            amount_converter: &MinorUnitForConnector,
        }
    }

    fn endpoint(&self, connectors: &Connectors, path: &str) -> String {
        format!("{}/{path}", self.base_url(connectors).trim_end_matches('/'))
    }

    fn transaction_endpoint(&self, connectors: &Connectors, transaction_id: &str) -> String {
        self.endpoint(
            connectors,
            &format!("{}/{transaction_id}", endpoints::TRANSACTIONS),
        )
    }

    fn instruction_endpoint(&self, connectors: &Connectors, transaction_id: &str) -> String {
        format!(
            "{}/{}",
            self.transaction_endpoint(connectors, transaction_id),
            endpoints::INSTRUCTIONS
        )
    }
}

pub(crate) fn build_headers(
    connector: &Sagepaypi,
    auth_type: &ConnectorAuthType,
) -> CustomResult<Vec<(String, Maskable<String>)>, ConnectorError> {
    let mut request_headers = vec![(
        headers::CONTENT_TYPE.to_string(),
        connector.common_get_content_type().to_string().into(),
    )];
    request_headers.extend(connector.get_auth_header(auth_type)?);
    Ok(request_headers)
}

pub(crate) fn handle_json_response<T>(
    res: &Response,
    event_builder: Option<&mut ConnectorEvent>,
    type_name: &'static str,
) -> CustomResult<T, ConnectorError>
where
    T: DeserializeOwned + Serialize,
{
    let response: T = res
        .response
        .parse_struct(type_name)
        .change_context(ConnectorError::ResponseDeserializationFailed)?;
    with_response_body!(event_builder, response);
    Ok(response)
}

impl ConnectorCommon for Sagepaypi {
    fn id(&self) -> &'static str {
        "sagepaypi"
    }

    fn get_currency_unit(&self) -> CurrencyUnit {
        CurrencyUnit::Minor
    }

    fn get_auth_header(
        &self,
        auth_type: &ConnectorAuthType,
    ) -> CustomResult<Vec<(String, Maskable<String>)>, ConnectorError> {
        let auth = SagepaypiAuthType::try_from(auth_type)?;
        Ok(vec![(
            headers::AUTHORIZATION.to_string(),
            auth.get_basic_auth_header().into_masked(),
        )])
    }

    fn common_get_content_type(&self) -> &'static str {
        "application/json"
    }

    fn base_url<'a>(&self, connectors: &'a Connectors) -> &'a str {
        connectors.sagepaypi.base_url.as_ref()
    }

    fn build_error_response(
        &self,
        res: Response,
        event_builder: Option<&mut ConnectorEvent>,
    ) -> CustomResult<ErrorResponse, ConnectorError> {
        match res
            .response
            .parse_struct::<SagepaypiErrorResponse>("SagepaypiErrorResponse")
        {
            Ok(response) => {
                with_error_response_body!(event_builder, response);
                let error = response.to_error_response(res.status_code);
                tracing::info!(code = %error.code, http_code = res.status_code, "sagepay pi error response");
                Ok(error)
            }
            Err(_) => {
                let body = String::from_utf8_lossy(&res.response).into_owned();
                if let Some(event) = event_builder {
                    event.set_error(json!({ "error": body, "status_code": res.status_code }));
                }
                Ok(ErrorResponse {
                    status_code: res.status_code,
                    code: consts::NO_ERROR_CODE.to_string(),
                    message: consts::NO_ERROR_MESSAGE.to_string(),
                    reason: Some(body),
                    attempt_status: None,
                    connector_transaction_id: None,
                    network_decline_code: None,
                    network_advice_code: None,
                    network_error_message: None,
                })
            }
        }
    }
}

/// Cards are never sent with the transaction: a merchant session key is opened first and the
/// card is exchanged for a card identifier under it
impl ValidationTrait for Sagepaypi {
    fn should_do_session_token(&self) -> bool {
        true
    }

    fn should_do_payment_method_token(&self, payment_method: PaymentMethod) -> bool {
        payment_method == PaymentMethod::Card
    }
}

macros::impl_capability_markers!(
    Sagepaypi,
    [
        ConnectorServiceTrait,
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
        VerifyRedirectResponse,
    ]
);

impl ConnectorIntegrationV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>
    for Sagepaypi
{
    fn get_headers(
        &self,
        req: &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
    ) -> CustomResult<Vec<(String, Maskable<String>)>, ConnectorError> {
        build_headers(self, &req.connector_auth_type)
    }

    fn get_content_type(&self) -> &'static str {
        self.common_get_content_type()
    }

    fn get_url(
        &self,
        req: &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
    ) -> CustomResult<String, ConnectorError> {
        Ok(self.endpoint(&req.resource_common_data.connectors, endpoints::TRANSACTIONS))
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
            SagepaypiPaymentRequest::try_from(SagepaypiRouterData::from((amount, req)))?;
        Ok(Some(RequestContent::Json(Box::new(connector_req))))
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
        let response: SagepaypiTransactionResponse =
            handle_json_response(&res, event_builder, "SagepaypiTransactionResponse")?;
        tracing::info!(
            status = %response.status,
            transaction_id = %response.transaction_id,
            "sagepay pi transaction answered"
        );
        RouterDataV2::try_from(ResponseRouterData {
            response,
            router_data: data.clone(),
            http_code: res.status_code,
        })
    }

    fn get_error_response_v2(
        &self,
        res: Response,
        event_builder: Option<&mut ConnectorEvent>,
    ) -> CustomResult<ErrorResponse, ConnectorError> {
        self.build_error_response(res, event_builder)
    }
}

macros::expand_sagepaypi_flow!(
    connector: Sagepaypi,
    flow: CompleteAuthorize,
    resource_common_data: PaymentFlowData,
    flow_request: PaymentsCompleteAuthorizeData,
    flow_response: PaymentsResponseData,
    http_method: Post,
    response_type: SagepaypiTransactionResponse,
    url: |this, req| {
        Ok(format!(
            "{}/{}",
            this.transaction_endpoint(
                &req.resource_common_data.connectors,
                &get_challenge_transaction_id(req)?,
            ),
            endpoints::THREE_DS_CHALLENGE
        ))
    },
    request_body: |_this, req| {
        let connector_req = SagepaypiThreeDsChallengeRequest::try_from(req)?;
        Ok(Some(RequestContent::Json(Box::new(connector_req))))
    },
);

macros::expand_sagepaypi_flow!(
    connector: Sagepaypi,
    flow: PSync,
    resource_common_data: PaymentFlowData,
    flow_request: PaymentsSyncData,
    flow_response: PaymentsResponseData,
    http_method: Get,
    response_type: SagepaypiTransactionResponse,
    url: |this, req| {
        Ok(this.transaction_endpoint(
            &req.resource_common_data.connectors,
            &req.request.get_connector_transaction_id()?,
        ))
    },
    request_body: |_this, _req| { Ok(None) },
);

macros::expand_sagepaypi_flow!(
    connector: Sagepaypi,
    flow: CreateSessionToken,
    resource_common_data: PaymentFlowData,
    flow_request: SessionTokenRequestData,
    flow_response: SessionTokenResponseData,
    http_method: Post,
    response_type: SagepaypiMerchantSessionKeyResponse,
    url: |this, req| {
        Ok(this.endpoint(
            &req.resource_common_data.connectors,
            endpoints::MERCHANT_SESSION_KEYS,
        ))
    },
    request_body: |_this, req| {
        let connector_req = SagepaypiMerchantSessionKeyRequest::try_from(req)?;
        Ok(Some(RequestContent::Json(Box::new(connector_req))))
    },
);

impl
    ConnectorIntegrationV2<
        PaymentMethodToken,
        PaymentFlowData,
        PaymentMethodTokenizationData,
        PaymentMethodTokenResponse,
    > for Sagepaypi
{
    /// Card identifiers are created with the merchant session key as a bearer token
    fn get_headers(
        &self,
        req: &RouterDataV2<
            PaymentMethodToken,
            PaymentFlowData,
            PaymentMethodTokenizationData,
            PaymentMethodTokenResponse,
        >,
    ) -> CustomResult<Vec<(String, Maskable<String>)>, ConnectorError> {
        let merchant_session_key = req.resource_common_data.get_session_token()?;
        Ok(vec![
            (
                headers::CONTENT_TYPE.to_string(),
                self.common_get_content_type().to_string().into(),
            ),
            (
                headers::AUTHORIZATION.to_string(),
                format!("Bearer {merchant_session_key}").into_masked(),
            ),
        ])
    }

    fn get_content_type(&self) -> &'static str {
        self.common_get_content_type()
    }

    fn get_url(
        &self,
        req: &RouterDataV2<
            PaymentMethodToken,
            PaymentFlowData,
            PaymentMethodTokenizationData,
            PaymentMethodTokenResponse,
        >,
    ) -> CustomResult<String, ConnectorError> {
        Ok(self.endpoint(
            &req.resource_common_data.connectors,
            endpoints::CARD_IDENTIFIERS,
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
        let connector_req = SagepaypiCardIdentifierRequest::try_from(req)?;
        Ok(Some(RequestContent::Json(Box::new(connector_req))))
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
        let response: SagepaypiCardIdentifierResponse =
            handle_json_response(&res, event_builder, "SagepaypiCardIdentifierResponse")?;
        RouterDataV2::try_from(ResponseRouterData {
            response,
            router_data: data.clone(),
            http_code: res.status_code,
        })
    }

    fn get_error_response_v2(
        &self,
        res: Response,
        event_builder: Option<&mut ConnectorEvent>,
    ) -> CustomResult<ErrorResponse, ConnectorError> {
        self.build_error_response(res, event_builder)
    }
}

macros::expand_sagepaypi_flow!(
    connector: Sagepaypi,
    flow: Capture,
    resource_common_data: PaymentFlowData,
    flow_request: PaymentsCaptureData,
    flow_response: PaymentsResponseData,
    http_method: Post,
    response_type: SagepaypiInstructionResponse,
    url: |this, req| {
        Ok(this.instruction_endpoint(
            &req.resource_common_data.connectors,
            &req.request.get_connector_transaction_id()?,
        ))
    },
    request_body: |this, req| {
        let amount = convert_amount(
            this.amount_converter,
            req.request.minor_amount_to_capture,
            req.request.currency,
        )?;
        let connector_req =
            SagepaypiInstructionRequest::try_from(SagepaypiRouterData::from((amount, req)))?;
        Ok(Some(RequestContent::Json(Box::new(connector_req))))
    },
);

macros::expand_sagepaypi_flow!(
    connector: Sagepaypi,
    flow: Void,
    resource_common_data: PaymentFlowData,
    flow_request: PaymentVoidData,
    flow_response: PaymentsResponseData,
    http_method: Post,
    response_type: SagepaypiInstructionResponse,
    url: |this, req| {
        Ok(this.instruction_endpoint(
            &req.resource_common_data.connectors,
            &req.request.connector_transaction_id,
        ))
    },
    request_body: |_this, _req| {
        Ok(Some(RequestContent::Json(Box::new(
            SagepaypiInstructionRequest::abort(),
        ))))
    },
);

macros::expand_sagepaypi_flow!(
    connector: Sagepaypi,
    flow: VoidPC,
    resource_common_data: PaymentFlowData,
    flow_request: PaymentsCancelPostCaptureData,
    flow_response: PaymentsResponseData,
    http_method: Post,
    response_type: SagepaypiInstructionResponse,
    url: |this, req| {
        Ok(this.instruction_endpoint(
            &req.resource_common_data.connectors,
            &req.request.connector_transaction_id,
        ))
    },
    request_body: |_this, _req| {
        Ok(Some(RequestContent::Json(Box::new(
            SagepaypiInstructionRequest::void(),
        ))))
    },
);

macros::expand_sagepaypi_flow!(
    connector: Sagepaypi,
    flow: Refund,
    resource_common_data: RefundFlowData,
    flow_request: RefundsData,
    flow_response: RefundsResponseData,
    http_method: Post,
    response_type: SagepaypiTransactionResponse,
    url: |this, req| {
        Ok(this.endpoint(&req.resource_common_data.connectors, endpoints::TRANSACTIONS))
    },
    request_body: |this, req| {
        let amount = convert_amount(
            this.amount_converter,
            req.request.minor_refund_amount,
            req.request.currency,
        )?;
        let connector_req = SagepaypiReferencedTransactionRequest::try_from(
            SagepaypiRouterData::from((amount, req)),
        )?;
        Ok(Some(RequestContent::Json(Box::new(connector_req))))
    },
);

macros::expand_sagepaypi_flow!(
    connector: Sagepaypi,
    flow: RepeatPayment,
    resource_common_data: PaymentFlowData,
    flow_request: RepeatPaymentData,
    flow_response: PaymentsResponseData,
    http_method: Post,
    response_type: SagepaypiTransactionResponse,
    url: |this, req| {
        Ok(this.endpoint(&req.resource_common_data.connectors, endpoints::TRANSACTIONS))
    },
    request_body: |this, req| {
        let amount = convert_amount(
            this.amount_converter,
            req.request.minor_amount,
            req.request.currency,
        )?;
        let connector_req = SagepaypiReferencedTransactionRequest::try_from(
            SagepaypiRouterData::from((amount, req)),
        )?;
        Ok(Some(RequestContent::Json(Box::new(connector_req))))
    },
);

// Card identifiers are saved by a payment with `save`; there is no standalone registration
// and no removal call
macros::impl_flow_not_supported!(
    Sagepaypi,
    SetupMandate,
    PaymentFlowData,
    SetupMandateRequestData,
    PaymentsResponseData
);

macros::impl_flow_not_supported!(
    Sagepaypi,
    MandateRevoke,
    PaymentFlowData,
    MandateRevokeRequestData,
    MandateRevokeResponseData
);
