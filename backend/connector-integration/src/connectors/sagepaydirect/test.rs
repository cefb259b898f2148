#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[allow(clippy::expect_used)]
#[allow(clippy::panic)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use common_enums::{AttemptStatus, CaptureMethod, Currency};
    use common_utils::{request::Method, MinorUnit, Secret};
    use domain_types::{
        connector_flow::{
            Authorize, Capture, CompleteAuthorize, MandateRevoke, PSync, PaymentMethodToken,
            Refund, RepeatPayment, Void, VoidPC,
        },
        connector_types::{
            ConnectorMandateReferenceId, MandateReferenceId, MandateRevokeRequestData,
            MandateRevokeResponseData, PaymentFlowData, PaymentMethodTokenResponse,
            PaymentMethodTokenizationData, PaymentVoidData, PaymentsAuthorizeData,
            PaymentsCancelPostCaptureData, PaymentsCaptureData, PaymentsCompleteAuthorizeData,
            PaymentsResponseData, PaymentsSyncData, RefundFlowData, RefundsData,
            RefundsResponseData, RepeatPaymentData, ResponseId,
        },
        errors::ConnectorError,
        payment_method_data::{PaymentMethodData, PaypalRedirection, WalletData},
        router_data_v2::RouterDataV2,
        router_request_types::CompleteAuthorizeRedirectResponse,
        router_response_types::RedirectForm,
    };
    use interfaces::{
        connector_integration_v2::{BoxedConnectorIntegrationV2, ConnectorIntegrationV2},
        connector_types::BoxedConnector,
    };
    use serde_json::json;

    use crate::{
        connectors::{
            sagepay::{
                test_utils::{self, VENDOR, VENDOR_TX_CODE, VPS_TX_ID},
                transformers::TransactionReference,
            },
            Sagepaydirect,
        },
        types::ConnectorData,
    };

    type AuthorizeRouterData =
        RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>;

    fn card_authorize() -> AuthorizeRouterData {
        test_utils::router_data(
            test_utils::authorize_data(PaymentMethodData::Card(test_utils::card())),
            test_utils::vendor_auth(),
        )
    }

    fn complete_authorize(
        payload: serde_json::Value,
    ) -> RouterDataV2<CompleteAuthorize, PaymentFlowData, PaymentsCompleteAuthorizeData, PaymentsResponseData>
    {
        test_utils::router_data(
            PaymentsCompleteAuthorizeData {
                payment_method_data: None,
                minor_amount: MinorUnit::new(1000),
                email: None,
                currency: Currency::GBP,
                capture_method: Some(CaptureMethod::Automatic),
                connector_transaction_id: Some(test_utils::transaction_reference()),
                redirect_response: Some(CompleteAuthorizeRedirectResponse {
                    params: None,
                    payload: Some(Secret::new(payload)),
                }),
                browser_info: None,
                complete_authorize_url: Some(test_utils::COMPLETE_AUTHORIZE_URL.to_string()),
                connector_meta: None,
                setup_future_usage: None,
            },
            test_utils::vendor_auth(),
        )
    }

    type RepeatRouterData =
        RouterDataV2<RepeatPayment, PaymentFlowData, RepeatPaymentData, PaymentsResponseData>;

    fn repeat_payment(
        mandate_reference: MandateReferenceId,
        capture_method: CaptureMethod,
    ) -> RepeatRouterData {
        test_utils::router_data(
            RepeatPaymentData {
                mandate_reference,
                minor_amount: MinorUnit::new(2500),
                currency: Currency::GBP,
                merchant_order_reference_id: None,
                metadata: None,
                webhook_url: None,
                capture_method: Some(capture_method),
                browser_info: None,
                email: None,
                off_session: Some(true),
                router_return_url: None,
                description: Some("Monthly box".to_string()),
            },
            test_utils::vendor_auth(),
        )
    }

    fn stored_payment_mandate() -> MandateReferenceId {
        MandateReferenceId::ConnectorMandateId(ConnectorMandateReferenceId::new(
            Some(test_utils::TOKEN.to_string()),
            None,
            Some(test_utils::transaction_reference()),
        ))
    }

    #[test]
    fn authorize_registers_card_payment() {
        let connector_data =
            ConnectorData::get_connector_by_name(&domain_types::connector_types::ConnectorEnum::Sagepaydirect);
        let connector: BoxedConnector = connector_data.connector;
        let connector_integration: BoxedConnectorIntegrationV2<
            '_,
            Authorize,
            PaymentFlowData,
            PaymentsAuthorizeData,
            PaymentsResponseData,
        > = connector.get_connector_integration_v2();

        let request = connector_integration
            .build_request_v2(&card_authorize())
            .unwrap()
            .expect("direct authorize always calls the gateway");

        assert_eq!(
            request.url,
            "https://test.sagepay.com/gateway/service/vspdirect-register.vsp"
        );
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.get_headers_map().get("Content-Type").map(String::as_str),
            Some("application/x-www-form-urlencoded")
        );

        let fields = test_utils::form_fields(request.body.as_ref().unwrap());
        let expected = [
            ("VPSProtocol", "4.00"),
            ("TxType", "PAYMENT"),
            ("Vendor", VENDOR),
            ("VendorTxCode", VENDOR_TX_CODE),
            ("Amount", "10.00"),
            ("Currency", "GBP"),
            ("Description", "Order 123"),
            ("CardHolder", "Sam Jones"),
            ("CardNumber", "4929000000006"),
            ("ExpiryDate", "0330"),
            ("CV2", "123"),
            ("CardType", "VISA"),
            ("BillingSurname", "Jones"),
            ("BillingFirstnames", "Sam"),
            ("BillingAddress1", "88 The Road"),
            ("BillingCity", "London"),
            ("BillingCountry", "GB"),
            ("BillingPhone", "+447700900077"),
            ("DeliverySurname", "Jones"),
            ("DeliveryCountry", "GB"),
            ("CustomerEMail", "sam.jones@example.com"),
            ("ClientIPAddress", "203.0.113.7"),
            ("AccountType", "E"),
            ("Apply3DSecure", "0"),
            ("ApplyAVSCV2", "0"),
            ("BrowserJavascriptEnabled", "1"),
            ("BrowserTZ", "-60"),
            ("ThreeDSNotificationURL", test_utils::COMPLETE_AUTHORIZE_URL),
            ("ChallengeWindowSize", "05"),
        ];
        for (key, value) in expected {
            assert_eq!(fields.get(key).map(String::as_str), Some(value), "{key}");
        }
        // state is only sent for US addresses
        assert!(!fields.contains_key("BillingState"));
        assert!(!fields.contains_key("CreateToken"));
    }

    #[test]
    fn manual_capture_on_protocol_3_is_deferred_without_browser_fields() {
        let mut router_data = test_utils::with_connector_meta(
            card_authorize(),
            json!({ "protocol_version": "3.00", "account_type": "M" }),
        );
        router_data.request.capture_method = Some(CaptureMethod::Manual);
        router_data.request.setup_future_usage = Some(common_enums::FutureUsage::OffSession);

        let body = Sagepaydirect::new()
            .get_request_body(&router_data)
            .unwrap()
            .unwrap();
        let fields = test_utils::form_fields(&body);

        assert_eq!(fields["VPSProtocol"], "3.00");
        assert_eq!(fields["TxType"], "DEFERRED");
        assert_eq!(fields["AccountType"], "M");
        assert_eq!(fields["CreateToken"], "1");
        assert!(!fields.contains_key("BrowserUserAgent"));
        assert!(!fields.contains_key("ThreeDSNotificationURL"));
    }

    #[test]
    fn stored_token_replaces_the_card_block() {
        let mut router_data: AuthorizeRouterData = test_utils::router_data(
            test_utils::authorize_data(PaymentMethodData::CardToken(
                domain_types::payment_method_data::CardToken {
                    card_holder_name: None,
                    card_cvc: Some(Secret::new("123".to_string())),
                },
            )),
            test_utils::vendor_auth(),
        );
        router_data.resource_common_data = router_data
            .resource_common_data
            .set_payment_method_token(Some("{B3A1A9F2-7D4E-4C1B-9E52-3C8F0A6B7D21}".to_string()));

        let body = Sagepaydirect::new()
            .get_request_body(&router_data)
            .unwrap()
            .unwrap();
        let fields = test_utils::form_fields(&body);

        assert_eq!(fields["Token"], "{B3A1A9F2-7D4E-4C1B-9E52-3C8F0A6B7D21}");
        assert_eq!(fields["StoreToken"], "1");
        assert_eq!(fields["CV2"], "123");
        assert!(!fields.contains_key("CardNumber"));
    }

    #[test]
    fn paypal_sends_callback_url() {
        let router_data: AuthorizeRouterData = test_utils::router_data(
            test_utils::authorize_data(PaymentMethodData::Wallet(WalletData::PaypalRedirect(
                PaypalRedirection { email: None },
            ))),
            test_utils::vendor_auth(),
        );
        let body = Sagepaydirect::new()
            .get_request_body(&router_data)
            .unwrap()
            .unwrap();
        let fields = test_utils::form_fields(&body);

        assert_eq!(fields["CardType"], "PAYPAL");
        assert_eq!(fields["PayPalCallbackURL"], test_utils::COMPLETE_AUTHORIZE_URL);
        assert!(!fields.contains_key("BrowserUserAgent"));
    }

    #[test]
    fn discover_cards_are_not_supported() {
        let mut card = test_utils::card();
        card.card_network = Some(common_enums::CardNetwork::Discover);
        let router_data: AuthorizeRouterData = test_utils::router_data(
            test_utils::authorize_data(PaymentMethodData::Card(card)),
            test_utils::vendor_auth(),
        );
        let error = Sagepaydirect::new()
            .get_request_body(&router_data)
            .unwrap_err();
        assert!(matches!(
            error.current_context(),
            ConnectorError::NotSupported { .. }
        ));
    }

    #[test]
    fn missing_billing_address_is_a_missing_field() {
        let mut router_data = card_authorize();
        router_data.resource_common_data.address = Default::default();
        let error = Sagepaydirect::new()
            .get_request_body(&router_data)
            .unwrap_err();
        assert_eq!(
            error.current_context(),
            &ConnectorError::MissingRequiredField {
                field_name: "billing"
            }
        );
    }

    #[test]
    fn ok_answer_charges_and_returns_the_reference() {
        let response = test_utils::key_value_response(
            "VPSProtocol=4.00\nStatus=OK\nStatusDetail=0000 : The Authorisation was Successful.\nVPSTxId={5A1BC414-5409-48DD-9B8B-DCDF096CE0BE}\nSecurityKey=IDBL4ZXJ2A\nTxAuthNo=9962\nAVSCV2=ALL MATCH\n3DSecureStatus=NOTCHECKED\n",
            200,
        );
        let result = Sagepaydirect::new()
            .handle_response_v2(&card_authorize(), None, response)
            .unwrap();

        assert_eq!(result.resource_common_data.status, AttemptStatus::Charged);
        match result.response.unwrap() {
            PaymentsResponseData::TransactionResponse {
                resource_id,
                redirection_data,
                connector_response_reference_id,
                ..
            } => {
                assert_eq!(
                    resource_id,
                    ResponseId::ConnectorTransactionId(test_utils::transaction_reference())
                );
                assert!(redirection_data.is_none());
                assert_eq!(connector_response_reference_id.as_deref(), Some(VENDOR_TX_CODE));
            }
        }
    }

    #[test]
    fn three_d_secure_2_challenge_posts_creq_to_the_acs() {
        let response = test_utils::key_value_response(
            "VPSProtocol=4.00\nStatus=3DAUTH\nStatusDetail=2021 : Please redirect your customer to the ACSURL to complete the 3DS Transaction\nVPSTxId={5A1BC414-5409-48DD-9B8B-DCDF096CE0BE}\nACSURL=https://acs.example/challenge\nCReq=eyJtZXNzYWdlVHlwZSI6IkNSZXEifQ==\n",
            200,
        );
        let result = Sagepaydirect::new()
            .handle_response_v2(&card_authorize(), None, response)
            .unwrap();

        assert_eq!(
            result.resource_common_data.status,
            AttemptStatus::AuthenticationPending
        );
        let PaymentsResponseData::TransactionResponse {
            redirection_data, ..
        } = result.response.unwrap();
        match *redirection_data.expect("acs form") {
            RedirectForm::Form {
                endpoint,
                method,
                form_fields,
            } => {
                assert_eq!(endpoint, "https://acs.example/challenge");
                assert_eq!(method, Method::Post);
                assert_eq!(form_fields["creq"], "eyJtZXNzYWdlVHlwZSI6IkNSZXEifQ==");
                assert_eq!(form_fields["threeDSSessionData"], VPS_TX_ID);
            }
            other => panic!("unexpected redirect {other:?}"),
        }
    }

    #[test]
    fn three_d_secure_1_challenge_carries_term_url() {
        let response = test_utils::key_value_response(
            "VPSProtocol=3.00\nStatus=3DAUTH\nStatusDetail=2007 : Please redirect your customer to the ACSURL\nMD=A1B2C3\nACSURL=https://acs.example/pareq\nPAReq=eJxVUk1zgjAQ\n",
            200,
        );
        let result = Sagepaydirect::new()
            .handle_response_v2(&card_authorize(), None, response)
            .unwrap();
        let PaymentsResponseData::TransactionResponse {
            redirection_data, ..
        } = result.response.unwrap();
        match *redirection_data.expect("acs form") {
            RedirectForm::Form { form_fields, .. } => {
                assert_eq!(form_fields["PaReq"], "eJxVUk1zgjAQ");
                assert_eq!(form_fields["MD"], "A1B2C3");
                assert_eq!(form_fields["TermUrl"], test_utils::COMPLETE_AUTHORIZE_URL);
            }
            other => panic!("unexpected redirect {other:?}"),
        }
    }

    #[test]
    fn not_authed_is_an_authorization_failure() {
        let response = test_utils::key_value_response(
            "VPSProtocol=4.00\nStatus=NOTAUTHED\nStatusDetail=2000 : The Authorisation was Declined by the bank.\nVPSTxId={5A1BC414-5409-48DD-9B8B-DCDF096CE0BE}\nDeclineCode=05\n",
            200,
        );
        let result = Sagepaydirect::new()
            .handle_response_v2(&card_authorize(), None, response)
            .unwrap();

        assert_eq!(
            result.resource_common_data.status,
            AttemptStatus::AuthorizationFailed
        );
        let error = result.response.unwrap_err();
        assert_eq!(error.code, "2000");
        assert_eq!(error.message, "The Authorisation was Declined by the bank.");
        assert_eq!(error.network_decline_code.as_deref(), Some("05"));
        assert_eq!(error.attempt_status, Some(AttemptStatus::AuthorizationFailed));
    }

    #[test]
    fn invalid_answer_without_code_keeps_the_status() {
        let response = test_utils::key_value_response(
            "VPSProtocol=4.00\nStatus=INVALID\nStatusDetail=The Vendor field is missing\n",
            200,
        );
        let result = Sagepaydirect::new()
            .handle_response_v2(&card_authorize(), None, response)
            .unwrap();
        assert_eq!(result.resource_common_data.status, AttemptStatus::Failure);
        let error = result.response.unwrap_err();
        assert_eq!(error.code, "INVALID");
        assert_eq!(error.message, "The Vendor field is missing");
    }

    #[test]
    fn challenge_result_goes_to_the_3d_callback() {
        let router_data = complete_authorize(json!({
            "cres": "eyJ0cmFuc1N0YXR1cyI6IlkifQ",
            "threeDSSessionData": VPS_TX_ID,
        }));
        let connector = Sagepaydirect::new();
        assert_eq!(
            connector.get_url(&router_data).unwrap(),
            "https://test.sagepay.com/gateway/service/direct3dcallback.vsp"
        );
        let fields =
            test_utils::form_fields(&connector.get_request_body(&router_data).unwrap().unwrap());
        assert_eq!(fields["VPSTxId"], VPS_TX_ID);
        assert_eq!(fields["CRes"], "eyJ0cmFuc1N0YXR1cyI6IlkifQ");
    }

    #[test]
    fn pares_is_read_case_insensitively() {
        let router_data = complete_authorize(json!({ "PaRes": "eJzVWFmz", "MD": "A1B2C3" }));
        let fields = test_utils::form_fields(
            &Sagepaydirect::new()
                .get_request_body(&router_data)
                .unwrap()
                .unwrap(),
        );
        assert_eq!(fields["MD"], "A1B2C3");
        assert_eq!(fields["PARes"], "eJzVWFmz");
    }

    #[test]
    fn approved_paypal_payment_is_completed() {
        let router_data = complete_authorize(json!({ "Status": "PAYPALOK" }));
        let connector = Sagepaydirect::new();
        assert_eq!(
            connector.get_url(&router_data).unwrap(),
            "https://test.sagepay.com/gateway/service/complete.vsp"
        );
        let fields =
            test_utils::form_fields(&connector.get_request_body(&router_data).unwrap().unwrap());
        assert_eq!(fields["TxType"], "COMPLETE");
        assert_eq!(fields["VPSTxId"], VPS_TX_ID);
        assert_eq!(fields["Amount"], "10.00");
        assert_eq!(fields["Accept"], "YES");
    }

    #[test]
    fn empty_redirect_payload_is_rejected() {
        let error = Sagepaydirect::new()
            .get_request_body(&complete_authorize(json!({})))
            .unwrap_err();
        assert!(matches!(
            error.current_context(),
            ConnectorError::MissingConnectorRedirectionPayload { .. }
        ));
    }

    #[test]
    fn card_token_is_registered() {
        let router_data: RouterDataV2<
            PaymentMethodToken,
            PaymentFlowData,
            PaymentMethodTokenizationData,
            PaymentMethodTokenResponse,
        > = test_utils::router_data(
            PaymentMethodTokenizationData {
                payment_method_data: PaymentMethodData::Card(test_utils::card()),
                browser_info: None,
                currency: Currency::GBP,
                amount: MinorUnit::new(1000),
            },
            test_utils::vendor_auth(),
        );
        let connector = Sagepaydirect::new();
        assert_eq!(
            connector.get_url(&router_data).unwrap(),
            "https://test.sagepay.com/gateway/service/directtoken.vsp"
        );
        let fields =
            test_utils::form_fields(&connector.get_request_body(&router_data).unwrap().unwrap());
        assert_eq!(fields["TxType"], "TOKEN");
        assert_eq!(fields["CardType"], "VISA");
        assert!(!fields.contains_key("Amount"));

        let response = test_utils::key_value_response(
            "VPSProtocol=4.00\nStatus=OK\nStatusDetail=0000 : Token registered\nToken={B3A1A9F2-7D4E-4C1B-9E52-3C8F0A6B7D21}\n",
            200,
        );
        let result = connector
            .handle_response_v2(&router_data, None, response)
            .unwrap();
        assert_eq!(
            result.response.unwrap().token,
            "{B3A1A9F2-7D4E-4C1B-9E52-3C8F0A6B7D21}"
        );
    }

    #[test]
    fn capture_releases_the_deferred_payment() {
        let router_data: RouterDataV2<
            Capture,
            PaymentFlowData,
            PaymentsCaptureData,
            PaymentsResponseData,
        > = test_utils::router_data(
            PaymentsCaptureData {
                minor_amount_to_capture: MinorUnit::new(750),
                currency: Currency::GBP,
                connector_transaction_id: ResponseId::ConnectorTransactionId(
                    test_utils::transaction_reference(),
                ),
                connector_metadata: None,
                browser_info: None,
                capture_method: Some(CaptureMethod::Manual),
            },
            test_utils::vendor_auth(),
        );
        let connector = Sagepaydirect::new();
        assert_eq!(
            connector.get_url(&router_data).unwrap(),
            "https://test.sagepay.com/gateway/service/release.vsp"
        );
        let fields =
            test_utils::form_fields(&connector.get_request_body(&router_data).unwrap().unwrap());
        assert_eq!(fields["TxType"], "RELEASE");
        assert_eq!(fields["VPSTxId"], VPS_TX_ID);
        assert_eq!(fields["SecurityKey"], test_utils::SECURITY_KEY);
        assert_eq!(fields["TxAuthNo"], "9962");
        assert_eq!(fields["ReleaseAmount"], "7.50");

        let result = connector
            .handle_response_v2(
                &router_data,
                None,
                test_utils::key_value_response("VPSProtocol=4.00\nStatus=OK\nStatusDetail=2004 : The Release was Successful.\n", 200),
            )
            .unwrap();
        assert_eq!(result.resource_common_data.status, AttemptStatus::Charged);

        let declined = connector
            .handle_response_v2(
                &router_data,
                None,
                test_utils::key_value_response("VPSProtocol=4.00\nStatus=INVALID\nStatusDetail=4044 : This Authorise would exceed 115% of the value of the original transaction.\n", 200),
            )
            .unwrap();
        assert_eq!(
            declined.resource_common_data.status,
            AttemptStatus::CaptureFailed
        );
        assert_eq!(declined.response.unwrap_err().code, "4044");
    }

    #[test]
    fn refund_points_at_the_original_payment() {
        let router_data = RouterDataV2::<Refund, RefundFlowData, RefundsData, RefundsResponseData>::new(
            test_utils::refund_flow_data(),
            test_utils::vendor_auth(),
            RefundsData {
                refund_id: "ref_123_1".to_string(),
                connector_transaction_id: test_utils::transaction_reference(),
                currency: Currency::GBP,
                reason: None,
                minor_refund_amount: MinorUnit::new(500),
                ..Default::default()
            },
        );
        let connector = Sagepaydirect::new();
        let fields =
            test_utils::form_fields(&connector.get_request_body(&router_data).unwrap().unwrap());
        assert_eq!(fields["TxType"], "REFUND");
        assert_eq!(fields["VendorTxCode"], "ref_123_1");
        assert_eq!(fields["Amount"], "5.00");
        assert_eq!(fields["Description"], "Refund");
        assert_eq!(fields["RelatedVPSTxId"], VPS_TX_ID);
        assert_eq!(fields["RelatedVendorTxCode"], VENDOR_TX_CODE);
        assert_eq!(fields["RelatedSecurityKey"], test_utils::SECURITY_KEY);

        let result = connector
            .handle_response_v2(
                &router_data,
                None,
                test_utils::key_value_response(
                    "VPSProtocol=4.00\nStatus=OK\nStatusDetail=0000 : The Authorisation was Successful.\nVPSTxId={0E5A7B2C-1111-2222-3333-444455556666}\nTxAuthNo=9963\n",
                    200,
                ),
            )
            .unwrap();
        let refund = result.response.unwrap();
        assert_eq!(refund.refund_status, common_enums::RefundStatus::Success);
        let reference = TransactionReference::decode(&refund.connector_refund_id).unwrap();
        assert_eq!(reference.vendor_tx_code, "ref_123_1");
        assert_eq!(reference.tx_auth_no.as_deref(), Some("9963"));
    }

    #[test]
    fn refund_of_an_unknown_reference_fails() {
        let router_data = RouterDataV2::<Refund, RefundFlowData, RefundsData, RefundsResponseData>::new(
            test_utils::refund_flow_data(),
            test_utils::vendor_auth(),
            RefundsData {
                refund_id: "ref_123_1".to_string(),
                connector_transaction_id: "not a reference".to_string(),
                currency: Currency::GBP,
                minor_refund_amount: MinorUnit::new(500),
                ..Default::default()
            },
        );
        let error = Sagepaydirect::new()
            .get_request_body(&router_data)
            .unwrap_err();
        assert_eq!(
            error.current_context(),
            &ConnectorError::InvalidConnectorTransactionReference
        );
    }

    #[test]
    fn abort_cancels_the_deferred_payment() {
        let router_data: RouterDataV2<Void, PaymentFlowData, PaymentVoidData, PaymentsResponseData> =
            test_utils::router_data(
                PaymentVoidData {
                    connector_transaction_id: test_utils::transaction_reference(),
                    cancellation_reason: None,
                    browser_info: None,
                    amount: None,
                    currency: None,
                    connector_metadata: None,
                },
                test_utils::vendor_auth(),
            );
        let connector = Sagepaydirect::new();
        assert_eq!(
            connector.get_url(&router_data).unwrap(),
            "https://test.sagepay.com/gateway/service/abort.vsp"
        );
        let fields =
            test_utils::form_fields(&connector.get_request_body(&router_data).unwrap().unwrap());
        assert_eq!(fields["TxType"], "ABORT");
        assert_eq!(fields["Vendor"], VENDOR);
        assert_eq!(fields["VendorTxCode"], VENDOR_TX_CODE);
        assert_eq!(fields["VPSTxId"], VPS_TX_ID);
        assert_eq!(fields["SecurityKey"], test_utils::SECURITY_KEY);
        assert_eq!(fields["TxAuthNo"], "9962");
        assert!(!fields.contains_key("Amount"));

        let result = connector
            .handle_response_v2(
                &router_data,
                None,
                test_utils::key_value_response(
                    "VPSProtocol=4.00\nStatus=OK\nStatusDetail=2006 : The Abort was Successful.\n",
                    200,
                ),
            )
            .unwrap();
        assert_eq!(result.resource_common_data.status, AttemptStatus::Voided);

        let refused = connector
            .handle_response_v2(
                &router_data,
                None,
                test_utils::key_value_response(
                    "VPSProtocol=4.00\nStatus=INVALID\nStatusDetail=4041 : The Transaction type does not support the requested operation.\n",
                    200,
                ),
            )
            .unwrap();
        assert_eq!(
            refused.resource_common_data.status,
            AttemptStatus::VoidFailed
        );
        assert_eq!(refused.response.unwrap_err().code, "4041");
    }

    #[test]
    fn void_cancels_a_captured_payment() {
        let router_data: RouterDataV2<
            VoidPC,
            PaymentFlowData,
            PaymentsCancelPostCaptureData,
            PaymentsResponseData,
        > = test_utils::router_data(
            PaymentsCancelPostCaptureData {
                connector_transaction_id: test_utils::transaction_reference(),
                cancellation_reason: Some("duplicate order".to_string()),
                browser_info: None,
            },
            test_utils::vendor_auth(),
        );
        let connector = Sagepaydirect::new();
        assert_eq!(
            connector.get_url(&router_data).unwrap(),
            "https://test.sagepay.com/gateway/service/void.vsp"
        );
        let fields =
            test_utils::form_fields(&connector.get_request_body(&router_data).unwrap().unwrap());
        assert_eq!(fields["TxType"], "VOID");
        assert_eq!(fields["VPSTxId"], VPS_TX_ID);
        assert_eq!(fields["SecurityKey"], test_utils::SECURITY_KEY);

        let result = connector
            .handle_response_v2(
                &router_data,
                None,
                test_utils::key_value_response(
                    "VPSProtocol=4.00\nStatus=OK\nStatusDetail=2005 : The Void was Successful.\n",
                    200,
                ),
            )
            .unwrap();
        assert_eq!(result.resource_common_data.status, AttemptStatus::Voided);
        match result.response.unwrap() {
            PaymentsResponseData::TransactionResponse { resource_id, .. } => assert_eq!(
                resource_id,
                ResponseId::ConnectorTransactionId(test_utils::transaction_reference())
            ),
        }
    }

    #[test]
    fn repeat_follows_the_capture_method() {
        let connector = Sagepaydirect::new();
        let router_data = repeat_payment(stored_payment_mandate(), CaptureMethod::Automatic);
        assert_eq!(
            connector.get_url(&router_data).unwrap(),
            "https://test.sagepay.com/gateway/service/repeat.vsp"
        );
        let fields =
            test_utils::form_fields(&connector.get_request_body(&router_data).unwrap().unwrap());
        assert_eq!(fields["TxType"], "REPEAT");
        assert_eq!(fields["Amount"], "25.00");
        assert_eq!(fields["Currency"], "GBP");
        assert_eq!(fields["Description"], "Monthly box");
        assert_eq!(fields["RelatedVPSTxId"], VPS_TX_ID);
        assert_eq!(fields["RelatedVendorTxCode"], VENDOR_TX_CODE);
        assert_eq!(fields["RelatedSecurityKey"], test_utils::SECURITY_KEY);
        assert_eq!(fields["RelatedTxAuthNo"], "9962");

        let answer = "VPSProtocol=4.00\nStatus=OK\nStatusDetail=0000 : The Authorisation was Successful.\nVPSTxId={0E5A7B2C-1111-2222-3333-444455556666}\nSecurityKey=QWERTY1234\nTxAuthNo=9970\n";
        let charged = connector
            .handle_response_v2(
                &router_data,
                None,
                test_utils::key_value_response(answer, 200),
            )
            .unwrap();
        assert_eq!(charged.resource_common_data.status, AttemptStatus::Charged);

        let deferred = repeat_payment(stored_payment_mandate(), CaptureMethod::Manual);
        let fields =
            test_utils::form_fields(&connector.get_request_body(&deferred).unwrap().unwrap());
        assert_eq!(fields["TxType"], "REPEATDEFERRED");
        let authorized = connector
            .handle_response_v2(&deferred, None, test_utils::key_value_response(answer, 200))
            .unwrap();
        assert_eq!(
            authorized.resource_common_data.status,
            AttemptStatus::Authorized
        );
    }

    #[test]
    fn repeat_accepts_a_reference_given_as_the_mandate_id() {
        let router_data = repeat_payment(
            MandateReferenceId::ConnectorMandateId(ConnectorMandateReferenceId::new(
                Some(test_utils::transaction_reference()),
                None,
                None,
            )),
            CaptureMethod::Automatic,
        );
        let fields = test_utils::form_fields(
            &Sagepaydirect::new()
                .get_request_body(&router_data)
                .unwrap()
                .unwrap(),
        );
        assert_eq!(fields["RelatedVPSTxId"], VPS_TX_ID);

        let bare_token = repeat_payment(
            MandateReferenceId::ConnectorMandateId(ConnectorMandateReferenceId::new(
                Some(test_utils::TOKEN.to_string()),
                None,
                None,
            )),
            CaptureMethod::Automatic,
        );
        let error = Sagepaydirect::new()
            .get_request_body(&bare_token)
            .unwrap_err();
        assert_eq!(
            error.current_context(),
            &ConnectorError::InvalidConnectorTransactionReference
        );
    }

    #[test]
    fn mandate_from_a_payment_drives_the_repeat() {
        let connector = Sagepaydirect::new();
        let mut authorize = card_authorize();
        authorize.request.setup_future_usage = Some(common_enums::FutureUsage::OffSession);
        let fields =
            test_utils::form_fields(&connector.get_request_body(&authorize).unwrap().unwrap());
        assert_eq!(fields["CreateToken"], "1");

        let response = test_utils::key_value_response(
            "VPSProtocol=4.00\nStatus=OK\nStatusDetail=0000 : The Authorisation was Successful.\nVPSTxId={5A1BC414-5409-48DD-9B8B-DCDF096CE0BE}\nSecurityKey=IDBL4ZXJ2A\nTxAuthNo=9962\nToken={B3A1A9F2-7D4E-4C1B-9E52-3C8F0A6B7D21}\n",
            200,
        );
        let result = connector
            .handle_response_v2(&authorize, None, response)
            .unwrap();
        let mandate = match result.response.unwrap() {
            PaymentsResponseData::TransactionResponse {
                mandate_reference, ..
            } => mandate_reference.expect("token issued with the payment"),
        };
        assert_eq!(
            mandate.connector_mandate_id.as_deref(),
            Some(test_utils::TOKEN)
        );

        let repeat = repeat_payment(
            MandateReferenceId::ConnectorMandateId(ConnectorMandateReferenceId::new(
                mandate.connector_mandate_id,
                mandate.payment_method_id,
                mandate.connector_mandate_request_reference_id,
            )),
            CaptureMethod::Automatic,
        );
        let fields =
            test_utils::form_fields(&connector.get_request_body(&repeat).unwrap().unwrap());
        assert_eq!(fields["TxType"], "REPEAT");
        assert_eq!(fields["RelatedVPSTxId"], VPS_TX_ID);
        assert_eq!(fields["RelatedVendorTxCode"], VENDOR_TX_CODE);
        assert_eq!(fields["RelatedSecurityKey"], test_utils::SECURITY_KEY);
        assert_eq!(fields["RelatedTxAuthNo"], "9962");
    }

    #[test]
    fn token_removal_revokes_the_mandate() {
        let router_data: RouterDataV2<
            MandateRevoke,
            PaymentFlowData,
            MandateRevokeRequestData,
            MandateRevokeResponseData,
        > = test_utils::router_data(
            MandateRevokeRequestData {
                mandate_id: Secret::new("man_1".to_string()),
                connector_mandate_id: Some(Secret::new(test_utils::TOKEN.to_string())),
            },
            test_utils::vendor_auth(),
        );
        let connector = Sagepaydirect::new();
        assert_eq!(
            connector.get_url(&router_data).unwrap(),
            "https://test.sagepay.com/gateway/service/removetoken.vsp"
        );
        let fields =
            test_utils::form_fields(&connector.get_request_body(&router_data).unwrap().unwrap());
        assert_eq!(fields["TxType"], "REMOVETOKEN");
        assert_eq!(fields["Vendor"], VENDOR);
        assert_eq!(fields["Token"], test_utils::TOKEN);

        let result = connector
            .handle_response_v2(
                &router_data,
                None,
                test_utils::key_value_response(
                    "VPSProtocol=4.00\nStatus=OK\nStatusDetail=0000 : The Token was removed.\n",
                    200,
                ),
            )
            .unwrap();
        assert_eq!(
            result.response.unwrap().mandate_status,
            common_enums::MandateStatus::Revoked
        );

        let unknown = connector
            .handle_response_v2(
                &router_data,
                None,
                test_utils::key_value_response(
                    "VPSProtocol=4.00\nStatus=INVALID\nStatusDetail=4057 : The Token does not exist.\n",
                    200,
                ),
            )
            .unwrap();
        assert_eq!(unknown.response.unwrap_err().code, "4057");
    }

    #[test]
    fn payment_sync_is_not_offered() {
        let router_data: RouterDataV2<PSync, PaymentFlowData, PaymentsSyncData, PaymentsResponseData> =
            test_utils::router_data(PaymentsSyncData::default(), test_utils::vendor_auth());
        let error = Sagepaydirect::new()
            .build_request_v2(&router_data)
            .unwrap_err();
        assert!(matches!(
            error.current_context(),
            ConnectorError::FlowNotSupported { .. }
        ));
    }

    #[test]
    fn html_error_page_is_passed_through() {
        let response = domain_types::router_response_types::Response {
            headers: None,
            response: bytes::Bytes::from_static(b"<html>Service Unavailable</html>"),
            status_code: 503,
        };
        let error = <Sagepaydirect as ConnectorIntegrationV2<
            Authorize,
            PaymentFlowData,
            PaymentsAuthorizeData,
            PaymentsResponseData,
        >>::get_error_response_v2(Sagepaydirect::new(), response, None)
        .unwrap();
        assert_eq!(error.status_code, 503);
        assert_eq!(error.reason.as_deref(), Some("<html>Service Unavailable</html>"));
    }
}
