#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[allow(clippy::expect_used)]
#[allow(clippy::panic)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use std::collections::HashMap;

    use common_enums::{AttemptStatus, CaptureMethod, Currency};
    use common_utils::{request::Method, MinorUnit, Secret};
    use domain_types::{
        connector_flow::{Authorize, CompleteAuthorize, SetupMandate, Void},
        connector_types::{
            ConnectorWebhookSecrets, EventType, HttpMethod, PaymentFlowData, PaymentVoidData,
            PaymentsAuthorizeData, PaymentsCompleteAuthorizeData, PaymentsResponseData,
            RequestDetails, ResponseId, SetupMandateRequestData,
        },
        errors::ConnectorError,
        payment_method_data::{PaymentMethodData, PaypalRedirection, WalletData},
        router_data_v2::RouterDataV2,
        router_response_types::RedirectForm,
    };
    use interfaces::{
        api::ApplicationResponse,
        connector_integration_v2::ConnectorIntegrationV2,
        connector_types::{IncomingWebhook, IncomingWebhookFlowError},
    };
    use serde_json::json;

    use crate::connectors::{
        sagepay::{
            test_utils::{self, SECURITY_KEY, VENDOR, VENDOR_TX_CODE, VPS_TX_ID},
            transformers::TransactionReference,
        },
        Sagepayserver,
    };

    type AuthorizeRouterData =
        RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>;

    fn authorize() -> AuthorizeRouterData {
        test_utils::router_data(
            test_utils::authorize_data(PaymentMethodData::Card(test_utils::card())),
            test_utils::vendor_auth(),
        )
    }

    fn notification_request(body: Vec<u8>) -> RequestDetails {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("redirect_url", test_utils::RETURN_URL)
            .finish();
        RequestDetails {
            method: HttpMethod::Post,
            uri: Some(format!("/webhooks/sagepay?{query}")),
            headers: HashMap::new(),
            body,
            query_params: Some(query),
        }
    }

    fn secret(secret: &str) -> Option<ConnectorWebhookSecrets> {
        Some(ConnectorWebhookSecrets {
            secret: secret.as_bytes().to_vec(),
            additional_secret: None,
        })
    }

    #[test]
    fn registration_carries_the_notification_url() {
        let connector = Sagepayserver::new();
        let router_data = authorize();
        assert_eq!(
            connector.get_url(&router_data).unwrap(),
            "https://test.sagepay.com/gateway/service/vspserver-register.vsp"
        );
        let fields =
            test_utils::form_fields(&connector.get_request_body(&router_data).unwrap().unwrap());

        assert_eq!(fields["TxType"], "PAYMENT");
        assert_eq!(fields["Vendor"], VENDOR);
        assert_eq!(fields["VendorTxCode"], VENDOR_TX_CODE);
        assert_eq!(fields["Amount"], "10.00");
        assert_eq!(fields["Profile"], "NORMAL");
        assert_eq!(fields["BillingSurname"], "Jones");
        assert!(!fields.contains_key("CardNumber"));
        assert!(!fields.contains_key("AllowGiftAid"));

        let notification_url = url::Url::parse(&fields["NotificationURL"]).unwrap();
        assert_eq!(
            notification_url.as_str().split('?').next(),
            Some(test_utils::WEBHOOK_URL)
        );
        let redirect_url = notification_url
            .query_pairs()
            .find(|(name, _)| name == "redirect_url")
            .map(|(_, value)| value.into_owned());
        assert_eq!(redirect_url.as_deref(), Some(test_utils::RETURN_URL));
    }

    #[test]
    fn hosted_page_settings_come_from_metadata() {
        let mut router_data = test_utils::with_connector_meta(
            authorize(),
            json!({ "profile": "LOW", "allow_gift_aid": true, "vendor_data": "basket 42" }),
        );
        router_data.request.capture_method = Some(CaptureMethod::Manual);
        let fields = test_utils::form_fields(
            &Sagepayserver::new()
                .get_request_body(&router_data)
                .unwrap()
                .unwrap(),
        );
        assert_eq!(fields["Profile"], "LOW");
        assert_eq!(fields["AllowGiftAid"], "1");
        assert_eq!(fields["VendorData"], "basket 42");
        assert_eq!(fields["TxType"], "DEFERRED");
    }

    #[test]
    fn hosted_pages_take_card_payments_only() {
        let router_data: AuthorizeRouterData = test_utils::router_data(
            test_utils::authorize_data(PaymentMethodData::Wallet(WalletData::PaypalRedirect(
                PaypalRedirection { email: None },
            ))),
            test_utils::vendor_auth(),
        );
        let error = Sagepayserver::new()
            .get_request_body(&router_data)
            .unwrap_err();
        assert!(matches!(
            error.current_context(),
            ConnectorError::NotImplemented(_)
        ));
    }

    #[test]
    fn notification_url_is_required() {
        let mut router_data = authorize();
        router_data.request.webhook_url = None;
        let error = Sagepayserver::new()
            .get_request_body(&router_data)
            .unwrap_err();
        assert_eq!(
            error.current_context(),
            &ConnectorError::MissingRequiredField {
                field_name: "webhook_url"
            }
        );
    }

    #[test]
    fn registered_payment_sends_the_shopper_to_next_url() {
        let response = test_utils::key_value_response(
            "VPSProtocol=4.00\nStatus=OK\nStatusDetail=2014 : The Transaction was Registered Successfully.\nVPSTxId={5A1BC414-5409-48DD-9B8B-DCDF096CE0BE}\nSecurityKey=IDBL4ZXJ2A\nNextURL=https://test.sagepay.com/gateway/service/cardselection?vpstxid={5A1BC414-5409-48DD-9B8B-DCDF096CE0BE}\n",
            200,
        );
        let result = Sagepayserver::new()
            .handle_response_v2(&authorize(), None, response)
            .unwrap();

        assert_eq!(
            result.resource_common_data.status,
            AttemptStatus::AuthenticationPending
        );
        let PaymentsResponseData::TransactionResponse {
            resource_id,
            redirection_data,
            ..
        } = result.response.unwrap();
        let ResponseId::ConnectorTransactionId(reference) = resource_id else {
            panic!("expected a transaction reference");
        };
        let reference = TransactionReference::decode(&reference).unwrap();
        assert_eq!(reference.vendor_tx_code, VENDOR_TX_CODE);
        assert_eq!(reference.vps_tx_id.as_deref(), Some(VPS_TX_ID));
        assert_eq!(
            reference.get_security_key().unwrap(),
            Secret::new(SECURITY_KEY.to_string())
        );

        match *redirection_data.expect("hosted page redirect") {
            RedirectForm::Form {
                endpoint,
                method,
                form_fields,
            } => {
                assert_eq!(
                    endpoint,
                    "https://test.sagepay.com/gateway/service/cardselection"
                );
                assert_eq!(method, Method::Get);
                assert_eq!(form_fields["vpstxid"], VPS_TX_ID);
            }
            other => panic!("unexpected redirect {other:?}"),
        }
    }

    #[test]
    fn registration_answer_is_never_read_as_a_charge() {
        let response = test_utils::key_value_response(
            "VPSProtocol=4.00\nStatus=OK\nStatusDetail=0000 : The Authorisation was Successful.\nVPSTxId={5A1BC414-5409-48DD-9B8B-DCDF096CE0BE}\nSecurityKey=IDBL4ZXJ2A\nTxAuthNo=9962\n",
            200,
        );
        let error = Sagepayserver::new()
            .handle_response_v2(&authorize(), None, response)
            .unwrap_err();
        assert_eq!(
            error.current_context(),
            &ConnectorError::MissingRequiredField {
                field_name: "NextURL"
            }
        );
    }

    #[test]
    fn malformed_registration_is_a_failure() {
        let response = test_utils::key_value_response(
            "VPSProtocol=4.00\nStatus=MALFORMED\nStatusDetail=3045 : The Currency field is missing.\n",
            200,
        );
        let result = Sagepayserver::new()
            .handle_response_v2(&authorize(), None, response)
            .unwrap();
        assert_eq!(result.resource_common_data.status, AttemptStatus::Failure);
        let error = result.response.unwrap_err();
        assert_eq!(error.code, "3045");
        assert_eq!(error.message, "The Currency field is missing.");
    }

    #[test]
    fn token_registration_uses_the_token_service() {
        let router_data: RouterDataV2<
            SetupMandate,
            PaymentFlowData,
            SetupMandateRequestData,
            PaymentsResponseData,
        > = test_utils::router_data(
            SetupMandateRequestData {
                currency: Currency::GBP,
                payment_method_data: PaymentMethodData::Card(test_utils::card()),
                minor_amount: None,
                confirm: true,
                mandate_id: None,
                setup_future_usage: Some(common_enums::FutureUsage::OffSession),
                off_session: None,
                router_return_url: Some(test_utils::RETURN_URL.to_string()),
                webhook_url: Some(test_utils::WEBHOOK_URL.to_string()),
                browser_info: None,
                email: None,
                customer_name: None,
                capture_method: None,
                metadata: None,
            },
            test_utils::vendor_auth(),
        );
        let connector = Sagepayserver::new();
        assert_eq!(
            connector.get_url(&router_data).unwrap(),
            "https://test.sagepay.com/gateway/service/token.vsp"
        );
        let fields =
            test_utils::form_fields(&connector.get_request_body(&router_data).unwrap().unwrap());
        assert_eq!(fields["TxType"], "TOKEN");
        assert_eq!(fields["Currency"], "GBP");
        assert!(fields["NotificationURL"].starts_with(test_utils::WEBHOOK_URL));
        assert!(!fields.contains_key("Amount"));
    }

    #[test]
    fn hosted_payment_is_aborted_like_a_direct_one() {
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
        let connector = Sagepayserver::new();
        assert_eq!(
            connector.get_url(&router_data).unwrap(),
            "https://test.sagepay.com/gateway/service/abort.vsp"
        );
        let fields =
            test_utils::form_fields(&connector.get_request_body(&router_data).unwrap().unwrap());
        assert_eq!(fields["TxType"], "ABORT");
        assert_eq!(fields["VPSTxId"], VPS_TX_ID);

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
    }

    #[test]
    fn three_d_secure_callback_is_not_offered() {
        let router_data: RouterDataV2<
            CompleteAuthorize,
            PaymentFlowData,
            PaymentsCompleteAuthorizeData,
            PaymentsResponseData,
        > = test_utils::router_data(
            PaymentsCompleteAuthorizeData {
                payment_method_data: None,
                minor_amount: MinorUnit::new(1000),
                email: None,
                currency: Currency::GBP,
                capture_method: None,
                connector_transaction_id: None,
                redirect_response: None,
                browser_info: None,
                complete_authorize_url: None,
                connector_meta: None,
                setup_future_usage: None,
            },
            test_utils::vendor_auth(),
        );
        let error = Sagepayserver::new()
            .build_request_v2(&router_data)
            .unwrap_err();
        assert!(matches!(
            error.current_context(),
            ConnectorError::FlowNotSupported { .. }
        ));
    }

    #[test]
    fn signed_notification_is_verified() {
        let connector = Sagepayserver::new();
        assert!(connector
            .verify_webhook_source(
                notification_request(test_utils::payment_notification()),
                secret(SECURITY_KEY),
                Some(test_utils::vendor_auth()),
            )
            .unwrap());

        // the stored transaction reference works as the secret too
        assert!(connector
            .verify_webhook_source(
                notification_request(test_utils::payment_notification()),
                secret(&test_utils::transaction_reference()),
                Some(test_utils::vendor_auth()),
            )
            .unwrap());
    }

    #[test]
    fn vendor_can_travel_with_the_webhook_secret() {
        let secrets = Some(ConnectorWebhookSecrets {
            secret: test_utils::TOKEN_SECURITY_KEY.as_bytes().to_vec(),
            additional_secret: Some(Secret::new("SANDBOXEC".to_string())),
        });
        assert!(Sagepayserver::new()
            .verify_webhook_source(
                notification_request(test_utils::token_notification()),
                secrets,
                None,
            )
            .unwrap());
    }

    #[test]
    fn webhook_secret_vendor_wins_over_the_account() {
        let connector = Sagepayserver::new();
        let secrets = ConnectorWebhookSecrets {
            secret: SECURITY_KEY.as_bytes().to_vec(),
            additional_secret: Some(Secret::new(VENDOR.to_string())),
        };
        let other_account = domain_types::router_data::ConnectorAuthType::HeaderKey {
            api_key: Secret::new("othervendor".to_string()),
        };
        let request = notification_request(test_utils::payment_notification());

        assert!(connector
            .verify_webhook_source(
                request.clone(),
                Some(secrets.clone()),
                Some(other_account),
            )
            .unwrap());
        let message = String::from_utf8(
            connector
                .get_webhook_source_verification_message(&request, &secrets)
                .unwrap(),
        )
        .unwrap();
        assert!(message.contains("sandboxec"));
        assert!(!message.contains("othervendor"));
    }

    #[test]
    fn message_without_any_vendor_is_refused() {
        let error = Sagepayserver::new()
            .get_webhook_source_verification_message(
                &notification_request(test_utils::payment_notification()),
                &ConnectorWebhookSecrets {
                    secret: SECURITY_KEY.as_bytes().to_vec(),
                    additional_secret: None,
                },
            )
            .unwrap_err();
        assert_eq!(
            error.current_context(),
            &ConnectorError::WebhookVerificationSecretNotFound
        );
    }

    #[test]
    fn tampered_notification_fails_verification() {
        let mut fields = test_utils::payment_notification_fields();
        for field in fields.iter_mut() {
            if field.0 == "Status" {
                field.1 = "NOTAUTHED";
            }
        }
        let body = test_utils::form_body(
            &fields,
            Some(test_utils::PAYMENT_NOTIFICATION_SIGNATURE),
        );
        let connector = Sagepayserver::new();
        assert!(!connector
            .verify_webhook_source(
                notification_request(body.clone()),
                secret(SECURITY_KEY),
                Some(test_utils::vendor_auth()),
            )
            .unwrap());

        let error = connector
            .process_payment_webhook(
                notification_request(body),
                secret(SECURITY_KEY),
                Some(test_utils::vendor_auth()),
            )
            .unwrap_err();
        assert_eq!(
            error.current_context(),
            &ConnectorError::WebhookSourceVerificationFailed
        );
    }

    #[test]
    fn missing_secret_is_reported() {
        let error = Sagepayserver::new()
            .verify_webhook_source(
                notification_request(test_utils::payment_notification()),
                None,
                Some(test_utils::vendor_auth()),
            )
            .unwrap_err();
        assert_eq!(
            error.current_context(),
            &ConnectorError::WebhookVerificationSecretNotFound
        );
    }

    #[test]
    fn verification_parts_are_exposed() {
        let connector = Sagepayserver::new();
        let secrets = ConnectorWebhookSecrets {
            secret: SECURITY_KEY.as_bytes().to_vec(),
            additional_secret: Some(Secret::new(VENDOR.to_string())),
        };
        let request = notification_request(test_utils::form_body(
            &test_utils::payment_notification_fields(),
            Some("EFFF27DB880F761D8ECDB6D6522DD77F"),
        ));
        assert_eq!(
            connector
                .get_webhook_source_verification_signature(&request, &secrets)
                .unwrap(),
            test_utils::PAYMENT_NOTIFICATION_SIGNATURE.as_bytes()
        );
        let message = String::from_utf8(
            connector
                .get_webhook_source_verification_message(&request, &secrets)
                .unwrap(),
        )
        .unwrap();
        assert!(message.starts_with("{5A1BC414-5409-48DD-9B8B-DCDF096CE0BE}pay_123_1OK9962sandboxecALL MATCHIDBL4ZXJ2A"));
        assert!(message.ends_with("VISA0006000330999777"));
    }

    #[test]
    fn event_types_follow_status_and_tx_type() {
        let connector = Sagepayserver::new();
        let event = |fields: &[(&str, &str)]| {
            connector
                .get_event_type(
                    notification_request(test_utils::form_body(fields, None)),
                    None,
                    None,
                )
                .unwrap()
        };

        assert_eq!(
            event(&test_utils::payment_notification_fields()),
            EventType::PaymentIntentSuccess
        );
        assert_eq!(
            event(&test_utils::token_notification_fields()),
            EventType::MandateActive
        );
        assert_eq!(
            event(&[("TxType", "DEFERRED"), ("Status", "OK")]),
            EventType::PaymentIntentAuthorizationSuccess
        );
        assert_eq!(
            event(&[("TxType", "PAYMENT"), ("Status", "NOTAUTHED")]),
            EventType::PaymentIntentAuthorizationFailure
        );
        assert_eq!(
            event(&[("TxType", "PAYMENT"), ("Status", "ABORT")]),
            EventType::PaymentIntentCancelled
        );
        assert_eq!(
            event(&[("TxType", "PAYMENT"), ("Status", "PENDING")]),
            EventType::PaymentIntentProcessing
        );
        assert_eq!(
            event(&[("TxType", "PAYMENT"), ("Status", "REJECTED")]),
            EventType::PaymentIntentFailure
        );
    }

    #[test]
    fn notification_without_status_cannot_be_decoded() {
        let error = Sagepayserver::new()
            .get_event_type(
                notification_request(test_utils::form_body(&[("VendorTxCode", "x")], None)),
                None,
                None,
            )
            .unwrap_err();
        assert_eq!(
            error.current_context(),
            &ConnectorError::WebhookBodyDecodingFailed
        );
    }

    #[test]
    fn payment_notification_yields_the_transaction_reference() {
        let details = Sagepayserver::new()
            .process_payment_webhook(
                notification_request(test_utils::payment_notification()),
                secret(SECURITY_KEY),
                Some(test_utils::vendor_auth()),
            )
            .unwrap();

        assert_eq!(details.status, AttemptStatus::Charged);
        assert_eq!(
            details.resource_id,
            Some(ResponseId::ConnectorTransactionId(
                test_utils::transaction_reference()
            ))
        );
        assert_eq!(
            details.connector_response_reference_id.as_deref(),
            Some(VENDOR_TX_CODE)
        );
        assert!(details.mandate_reference.is_none());
        assert!(details.error_code.is_none());
        assert!(details
            .raw_connector_response
            .unwrap()
            .contains("VPSSignature=efff27db880f761d8ecdb6d6522dd77f"));
    }

    #[test]
    fn token_notification_yields_the_mandate() {
        let details = Sagepayserver::new()
            .process_payment_webhook(
                notification_request(test_utils::token_notification()),
                secret(test_utils::TOKEN_SECURITY_KEY),
                Some(test_utils::vendor_auth()),
            )
            .unwrap();
        assert_eq!(details.status, AttemptStatus::Charged);
        let mandate = details.mandate_reference.unwrap();
        assert_eq!(
            mandate.connector_mandate_id.as_deref(),
            Some(test_utils::TOKEN)
        );
        assert!(mandate.connector_mandate_request_reference_id.is_none());
    }

    #[test]
    fn payment_notification_with_token_keeps_the_payment_for_repeats() {
        let mut fields = test_utils::payment_notification_fields();
        fields.push(("Token", test_utils::TOKEN));
        let notification = crate::connectors::sagepay::notification::SagepayNotification::parse(
            &test_utils::form_body(&fields, None),
        )
        .unwrap();
        let signature = notification.build_signature(VENDOR, SECURITY_KEY).unwrap();

        let details = Sagepayserver::new()
            .process_payment_webhook(
                notification_request(test_utils::form_body(&fields, Some(&signature))),
                secret(SECURITY_KEY),
                Some(test_utils::vendor_auth()),
            )
            .unwrap();
        let mandate = details.mandate_reference.unwrap();
        assert_eq!(
            mandate.connector_mandate_id.as_deref(),
            Some(test_utils::TOKEN)
        );
        let related = TransactionReference::decode(
            &mandate.connector_mandate_request_reference_id.unwrap(),
        )
        .unwrap();
        assert_eq!(related.vendor_tx_code, VENDOR_TX_CODE);
        assert_eq!(related.vps_tx_id.as_deref(), Some(VPS_TX_ID));
        assert_eq!(related.tx_auth_no.as_deref(), Some("9962"));
    }

    #[test]
    fn declined_notification_carries_the_error() {
        let fields = [
            ("TxType", "PAYMENT"),
            ("VendorTxCode", VENDOR_TX_CODE),
            ("VPSTxId", VPS_TX_ID),
            ("Status", "NOTAUTHED"),
            ("StatusDetail", "2000 : The Authorisation was Declined by the bank."),
        ];
        let unsigned = test_utils::form_body(&fields, None);
        let notification =
            crate::connectors::sagepay::notification::SagepayNotification::parse(&unsigned)
                .unwrap();
        let signature = notification.build_signature(VENDOR, SECURITY_KEY).unwrap();

        let details = Sagepayserver::new()
            .process_payment_webhook(
                notification_request(test_utils::form_body(&fields, Some(&signature))),
                secret(SECURITY_KEY),
                Some(test_utils::vendor_auth()),
            )
            .unwrap();
        assert_eq!(details.status, AttemptStatus::AuthorizationFailed);
        assert_eq!(details.error_code.as_deref(), Some("2000"));
        assert_eq!(
            details.error_message.as_deref(),
            Some("The Authorisation was Declined by the bank.")
        );
    }

    #[test]
    fn reply_tells_the_gateway_where_to_send_the_shopper() {
        let connector = Sagepayserver::new();
        let reply = connector
            .get_webhook_api_response(
                notification_request(test_utils::payment_notification()),
                None,
            )
            .unwrap();
        assert_eq!(
            reply,
            ApplicationResponse::TextPlain(format!(
                "Status=OK\r\nRedirectURL={}",
                test_utils::RETURN_URL
            ))
        );

        let ApplicationResponse::TextPlain(body) = connector
            .get_webhook_api_response(
                notification_request(test_utils::payment_notification()),
                Some(IncomingWebhookFlowError::ResourceNotFound),
            )
            .unwrap()
        else {
            panic!("expected a plain text reply");
        };
        assert!(body.starts_with("Status=INVALID\r\n"));
        assert!(body.contains("StatusDetail="));

        let ApplicationResponse::TextPlain(body) = connector
            .get_webhook_api_response(
                notification_request(test_utils::payment_notification()),
                Some(IncomingWebhookFlowError::InternalError),
            )
            .unwrap()
        else {
            panic!("expected a plain text reply");
        };
        assert!(body.starts_with("Status=ERROR\r\n"));
    }

    #[test]
    fn reply_needs_the_redirect_url() {
        let mut request = notification_request(test_utils::payment_notification());
        request.query_params = None;
        let error = Sagepayserver::new()
            .get_webhook_api_response(request, None)
            .unwrap_err();
        assert_eq!(
            error.current_context(),
            &ConnectorError::MissingRequiredField {
                field_name: "redirect_url"
            }
        );
    }
}
