/// Empty implementations of the per-flow capability traits a connector advertises
macro_rules! impl_capability_markers {
    ($connector:ident, [$($marker:ident),* $(,)?]) => {
        $(
            impl interfaces::connector_types::$marker for $connector {}
        )*
    };
}

/// A flow the connector cannot perform. Building the request fails instead of silently
/// sending nothing.
macro_rules! impl_flow_not_supported {
    ($connector:ident, $flow:ident, $resource_common_data:ty, $request:ty, $response:ty) => {
        impl
            interfaces::connector_integration_v2::ConnectorIntegrationV2<
                domain_types::connector_flow::$flow,
                $resource_common_data,
                $request,
                $response,
            > for $connector
        {
            fn build_request_v2(
                &self,
                _req: &domain_types::router_data_v2::RouterDataV2<
                    domain_types::connector_flow::$flow,
                    $resource_common_data,
                    $request,
                    $response,
                >,
            ) -> common_utils::errors::CustomResult<
                Option<common_utils::request::Request>,
                domain_types::errors::ConnectorError,
            > {
                Err(domain_types::errors::ConnectorError::FlowNotSupported {
                    flow: stringify!($flow).to_string(),
                    connector: interfaces::api::ConnectorCommon::id(self).to_string(),
                }
                .into())
            }
        }
    };
}

/// Headers, content type and error parsing shared by every `*.vsp` call
macro_rules! expand_sagepay_common_fns {
    ($flow:ty, $resource_common_data:ty, $request:ty, $response:ty) => {
        fn get_headers(
            &self,
            _req: &domain_types::router_data_v2::RouterDataV2<
                $flow,
                $resource_common_data,
                $request,
                $response,
            >,
        ) -> common_utils::errors::CustomResult<
            Vec<(String, common_utils::Maskable<String>)>,
            domain_types::errors::ConnectorError,
        > {
            Ok($crate::connectors::sagepay::build_headers())
        }

        fn get_content_type(&self) -> &'static str {
            interfaces::api::ConnectorCommon::common_get_content_type(self)
        }

        fn get_error_response_v2(
            &self,
            res: domain_types::router_response_types::Response,
            event_builder: Option<&mut interfaces::events::connector_api_logs::ConnectorEvent>,
        ) -> common_utils::errors::CustomResult<
            domain_types::router_data::ErrorResponse,
            domain_types::errors::ConnectorError,
        > {
            $crate::connectors::sagepay::build_error_response(res, event_builder)
        }
    };
}

/// One `*.vsp` follow-up call whose body is `$request_body` built from the router data and
/// whose `Key=Value` answer converts back through `TryFrom<ResponseRouterData<SagepayResponse, _>>`
macro_rules! expand_sagepay_follow_up_flow {
    (
        connector: $connector:ident,
        flow: $flow:ty,
        resource_common_data: $resource_common_data:ty,
        flow_request: $request:ty,
        flow_response: $response:ty,
        service: $service:expr,
        request_body: |$this:ident, $req:ident| $body:block $(,)?
    ) => {
        impl
            interfaces::connector_integration_v2::ConnectorIntegrationV2<
                $flow,
                $resource_common_data,
                $request,
                $response,
            > for $connector
        {
            $crate::connectors::macros::expand_sagepay_common_fns!(
                $flow,
                $resource_common_data,
                $request,
                $response
            );

            fn get_url(
                &self,
                req: &domain_types::router_data_v2::RouterDataV2<
                    $flow,
                    $resource_common_data,
                    $request,
                    $response,
                >,
            ) -> common_utils::errors::CustomResult<String, domain_types::errors::ConnectorError>
            {
                Ok($crate::connectors::sagepay::service_url(
                    interfaces::api::ConnectorCommon::base_url(
                        self,
                        &req.resource_common_data.connectors,
                    ),
                    $service,
                ))
            }

            fn get_request_body(
                &self,
                req: &domain_types::router_data_v2::RouterDataV2<
                    $flow,
                    $resource_common_data,
                    $request,
                    $response,
                >,
            ) -> common_utils::errors::CustomResult<
                Option<common_utils::request::RequestContent>,
                domain_types::errors::ConnectorError,
            > {
                let $this = self;
                let $req = req;
                $body
            }

            fn handle_response_v2(
                &self,
                data: &domain_types::router_data_v2::RouterDataV2<
                    $flow,
                    $resource_common_data,
                    $request,
                    $response,
                >,
                event_builder: Option<&mut interfaces::events::connector_api_logs::ConnectorEvent>,
                res: domain_types::router_response_types::Response,
            ) -> common_utils::errors::CustomResult<
                domain_types::router_data_v2::RouterDataV2<
                    $flow,
                    $resource_common_data,
                    $request,
                    $response,
                >,
                domain_types::errors::ConnectorError,
            > {
                let response: $crate::connectors::sagepay::transformers::SagepayResponse =
                    $crate::connectors::sagepay::handle_key_value_response(
                        &res,
                        event_builder,
                        "SagepayResponse",
                    )?;
                domain_types::router_data_v2::RouterDataV2::try_from(
                    $crate::types::ResponseRouterData {
                        response,
                        router_data: data.clone(),
                        http_code: res.status_code,
                    },
                )
            }
        }
    };
}

/// Release, abort, void, refund, repeat and token removal: identical for the Direct and Server
/// integrations since they only need the transaction reference
macro_rules! impl_sagepay_follow_up_flows {
    ($connector:ident) => {
        $crate::connectors::macros::impl_capability_markers!(
            $connector,
            [
                PaymentCapture,
                PaymentVoidV2,
                PaymentVoidPostCaptureV2,
                RefundV2,
                RepeatPaymentV2,
                MandateRevokeV2,
            ]
        );

        $crate::connectors::macros::expand_sagepay_follow_up_flow!(
            connector: $connector,
            flow: domain_types::connector_flow::Capture,
            resource_common_data: domain_types::connector_types::PaymentFlowData,
            flow_request: domain_types::connector_types::PaymentsCaptureData,
            flow_response: domain_types::connector_types::PaymentsResponseData,
            service: $crate::connectors::sagepay::constants::services::RELEASE,
            request_body: |this, req| {
                let amount = domain_types::utils::convert_amount(
                    this.amount_converter,
                    req.request.minor_amount_to_capture,
                    req.request.currency,
                )?;
                let connector_req =
                    $crate::connectors::sagepay::transformers::SagepayReleaseRequest::try_from(
                        $crate::connectors::sagepay::transformers::SagepayRouterData::from((
                            amount, req,
                        )),
                    )?;
                Ok(Some(common_utils::request::RequestContent::FormUrlEncoded(
                    Box::new(connector_req),
                )))
            },
        );

        $crate::connectors::macros::expand_sagepay_follow_up_flow!(
            connector: $connector,
            flow: domain_types::connector_flow::Void,
            resource_common_data: domain_types::connector_types::PaymentFlowData,
            flow_request: domain_types::connector_types::PaymentVoidData,
            flow_response: domain_types::connector_types::PaymentsResponseData,
            service: $crate::connectors::sagepay::constants::services::ABORT,
            request_body: |_this, req| {
                let connector_req =
                    $crate::connectors::sagepay::transformers::SagepayCancelRequest::try_from(req)?;
                Ok(Some(common_utils::request::RequestContent::FormUrlEncoded(
                    Box::new(connector_req),
                )))
            },
        );

        $crate::connectors::macros::expand_sagepay_follow_up_flow!(
            connector: $connector,
            flow: domain_types::connector_flow::VoidPC,
            resource_common_data: domain_types::connector_types::PaymentFlowData,
            flow_request: domain_types::connector_types::PaymentsCancelPostCaptureData,
            flow_response: domain_types::connector_types::PaymentsResponseData,
            service: $crate::connectors::sagepay::constants::services::VOID,
            request_body: |_this, req| {
                let connector_req =
                    $crate::connectors::sagepay::transformers::SagepayCancelRequest::try_from(req)?;
                Ok(Some(common_utils::request::RequestContent::FormUrlEncoded(
                    Box::new(connector_req),
                )))
            },
        );

        $crate::connectors::macros::expand_sagepay_follow_up_flow!(
            connector: $connector,
            flow: domain_types::connector_flow::Refund,
            resource_common_data: domain_types::connector_types::RefundFlowData,
            flow_request: domain_types::connector_types::RefundsData,
            flow_response: domain_types::connector_types::RefundsResponseData,
            service: $crate::connectors::sagepay::constants::services::REFUND,
            request_body: |this, req| {
                let amount = domain_types::utils::convert_amount(
                    this.amount_converter,
                    req.request.minor_refund_amount,
                    req.request.currency,
                )?;
                let connector_req = $crate::connectors::sagepay::transformers::SagepayRelatedTransactionRequest::try_from(
                    $crate::connectors::sagepay::transformers::SagepayRouterData::from((
                        amount, req,
                    )),
                )?;
                Ok(Some(common_utils::request::RequestContent::FormUrlEncoded(
                    Box::new(connector_req),
                )))
            },
        );

        $crate::connectors::macros::expand_sagepay_follow_up_flow!(
            connector: $connector,
            flow: domain_types::connector_flow::RepeatPayment,
            resource_common_data: domain_types::connector_types::PaymentFlowData,
            flow_request: domain_types::connector_types::RepeatPaymentData,
            flow_response: domain_types::connector_types::PaymentsResponseData,
            service: $crate::connectors::sagepay::constants::services::REPEAT,
            request_body: |this, req| {
                let amount = domain_types::utils::convert_amount(
                    this.amount_converter,
                    req.request.minor_amount,
                    req.request.currency,
                )?;
                let connector_req = $crate::connectors::sagepay::transformers::SagepayRelatedTransactionRequest::try_from(
                    $crate::connectors::sagepay::transformers::SagepayRouterData::from((
                        amount, req,
                    )),
                )?;
                Ok(Some(common_utils::request::RequestContent::FormUrlEncoded(
                    Box::new(connector_req),
                )))
            },
        );

        $crate::connectors::macros::expand_sagepay_follow_up_flow!(
            connector: $connector,
            flow: domain_types::connector_flow::MandateRevoke,
            resource_common_data: domain_types::connector_types::PaymentFlowData,
            flow_request: domain_types::connector_types::MandateRevokeRequestData,
            flow_response: domain_types::connector_types::MandateRevokeResponseData,
            service: $crate::connectors::sagepay::constants::services::REMOVE_TOKEN,
            request_body: |_this, req| {
                let connector_req =
                    $crate::connectors::sagepay::transformers::SagepayRemoveTokenRequest::try_from(
                        req,
                    )?;
                Ok(Some(common_utils::request::RequestContent::FormUrlEncoded(
                    Box::new(connector_req),
                )))
            },
        );
    };
}

/// One JSON call to the Pi REST API authenticated with the integration key. `$response_type`
/// converts back through `TryFrom<ResponseRouterData<$response_type, _>>`.
macro_rules! expand_sagepaypi_flow {
    (
        connector: $connector:ident,
        flow: $flow:ty,
        resource_common_data: $resource_common_data:ty,
        flow_request: $request:ty,
        flow_response: $response:ty,
        http_method: $method:ident,
        response_type: $response_type:ty,
        url: |$url_this:ident, $url_req:ident| $url:block,
        request_body: |$this:ident, $req:ident| $body:block $(,)?
    ) => {
        impl
            interfaces::connector_integration_v2::ConnectorIntegrationV2<
                $flow,
                $resource_common_data,
                $request,
                $response,
            > for $connector
        {
            fn get_headers(
                &self,
                req: &domain_types::router_data_v2::RouterDataV2<
                    $flow,
                    $resource_common_data,
                    $request,
                    $response,
                >,
            ) -> common_utils::errors::CustomResult<
                Vec<(String, common_utils::Maskable<String>)>,
                domain_types::errors::ConnectorError,
            > {
                $crate::connectors::sagepaypi::build_headers(self, &req.connector_auth_type)
            }

            fn get_content_type(&self) -> &'static str {
                interfaces::api::ConnectorCommon::common_get_content_type(self)
            }

            fn get_http_method(&self) -> common_utils::request::Method {
                common_utils::request::Method::$method
            }

            fn get_url(
                &self,
                req: &domain_types::router_data_v2::RouterDataV2<
                    $flow,
                    $resource_common_data,
                    $request,
                    $response,
                >,
            ) -> common_utils::errors::CustomResult<String, domain_types::errors::ConnectorError>
            {
                let $url_this = self;
                let $url_req = req;
                $url
            }

            fn get_request_body(
                &self,
                req: &domain_types::router_data_v2::RouterDataV2<
                    $flow,
                    $resource_common_data,
                    $request,
                    $response,
                >,
            ) -> common_utils::errors::CustomResult<
                Option<common_utils::request::RequestContent>,
                domain_types::errors::ConnectorError,
            > {
                let $this = self;
                let $req = req;
                $body
            }

            fn handle_response_v2(
                &self,
                data: &domain_types::router_data_v2::RouterDataV2<
                    $flow,
                    $resource_common_data,
                    $request,
                    $response,
                >,
                event_builder: Option<&mut interfaces::events::connector_api_logs::ConnectorEvent>,
                res: domain_types::router_response_types::Response,
            ) -> common_utils::errors::CustomResult<
                domain_types::router_data_v2::RouterDataV2<
                    $flow,
                    $resource_common_data,
                    $request,
                    $response,
                >,
                domain_types::errors::ConnectorError,
            > {
                let response: $response_type = $crate::connectors::sagepaypi::handle_json_response(
                    &res,
                    event_builder,
                    stringify!($response_type),
                )?;
                domain_types::router_data_v2::RouterDataV2::try_from(
                    $crate::types::ResponseRouterData {
                        response,
                        router_data: data.clone(),
                        http_code: res.status_code,
                    },
                )
            }

            fn get_error_response_v2(
                &self,
                res: domain_types::router_response_types::Response,
                event_builder: Option<&mut interfaces::events::connector_api_logs::ConnectorEvent>,
            ) -> common_utils::errors::CustomResult<
                domain_types::router_data::ErrorResponse,
                domain_types::errors::ConnectorError,
            > {
                interfaces::api::ConnectorCommon::build_error_response(self, res, event_builder)
            }
        }
    };
}

pub(crate) use expand_sagepay_common_fns;
pub(crate) use expand_sagepay_follow_up_flow;
pub(crate) use expand_sagepaypi_flow;
pub(crate) use impl_capability_markers;
pub(crate) use impl_flow_not_supported;
pub(crate) use impl_sagepay_follow_up_flows;
