//! Drives the connectors through the boxed registry handles a caller gets from
//! `ConnectorData::get_connector_by_name`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::collections::HashMap;

use common_enums::{AttemptStatus, AuthenticationType, Currency, PaymentMethod};
use common_utils::{MinorUnit, Secret};
use connector_integration::types::ConnectorData;
use domain_types::{
    connector_flow::CreateSessionToken,
    connector_types::{
        ConnectorEnum, ConnectorWebhookSecrets, EventType, HttpMethod, PaymentFlowData,
        RequestDetails, ResponseId, SessionTokenRequestData, SessionTokenResponseData,
    },
    payment_address::PaymentAddress,
    router_data::ConnectorAuthType,
    router_data_v2::RouterDataV2,
    types::{ConnectorParams, Connectors},
};
use interfaces::{
    api::ConnectorCommon,
    connector_integration_v2::ConnectorIntegrationV2,
    connector_types::{BoxedConnector, ConnectorServiceTrait, IncomingWebhook, ValidationTrait},
};

const SHARED_BASE_URL: &str = "https://test.sagepay.com/gateway/service";
const PI_BASE_URL: &str = "https://pi-test.sagepay.com/api/v1";
const VENDOR: &str = "sandboxEC";
const SECURITY_KEY: &str = "IDBL4ZXJ2A";

fn connectors() -> Connectors {
    Connectors {
        sagepay: ConnectorParams::new(SHARED_BASE_URL.to_string()),
        sagepaypi: ConnectorParams::new(PI_BASE_URL.to_string()),
    }
}

fn connector(name: ConnectorEnum) -> BoxedConnector {
    ConnectorData::get_connector_by_name(&name).connector
}

fn payment_flow_data() -> PaymentFlowData {
    PaymentFlowData {
        merchant_id: "merchant_1".to_string(),
        customer_id: None,
        payment_id: "pay_123".to_string(),
        attempt_id: "pay_123_1".to_string(),
        status: AttemptStatus::Started,
        payment_method: PaymentMethod::Card,
        description: None,
        return_url: None,
        address: PaymentAddress::new(None, None, None, None),
        auth_type: AuthenticationType::NoThreeDs,
        connector_meta_data: None,
        amount_captured: None,
        minor_amount_captured: None,
        session_token: None,
        reference_id: None,
        payment_method_token: None,
        connector_request_reference_id: "pay_123_1".to_string(),
        test_mode: Some(true),
        connector_http_status_code: None,
        connectors: connectors(),
        raw_connector_response: None,
        raw_connector_request: None,
    }
}

fn payment_notification() -> RequestDetails {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs([
            ("VPSProtocol", "4.00"),
            ("TxType", "PAYMENT"),
            ("VendorTxCode", "pay_123_1"),
            ("VPSTxId", "{5A1BC414-5409-48DD-9B8B-DCDF096CE0BE}"),
            ("Status", "OK"),
            ("StatusDetail", "0000 : The Authorisation was Successful."),
            ("TxAuthNo", "9962"),
            ("AVSCV2", "ALL MATCH"),
            ("AddressResult", "MATCHED"),
            ("PostCodeResult", "MATCHED"),
            ("CV2Result", "MATCHED"),
            ("GiftAid", "0"),
            ("3DSecureStatus", "OK"),
            ("CAVV", "AAABARR5kwAAAAAAAAAAAAAAAAA="),
            ("CardType", "VISA"),
            ("Last4Digits", "0006"),
            ("DeclineCode", "00"),
            ("ExpiryDate", "0330"),
            ("BankAuthCode", "999777"),
            ("VPSSignature", "efff27db880f761d8ecdb6d6522dd77f"),
        ])
        .finish();
    let query = "redirect_url=https%3A%2F%2Fshop.example%2Fdone".to_string();
    RequestDetails {
        method: HttpMethod::Post,
        uri: Some(format!("/webhooks/sagepay?{query}")),
        headers: HashMap::new(),
        body: body.into_bytes(),
        query_params: Some(query),
    }
}

#[test]
fn every_connector_is_registered_under_its_own_id() {
    let expected = [
        (ConnectorEnum::Sagepaydirect, "sagepaydirect", SHARED_BASE_URL),
        (ConnectorEnum::Sagepayserver, "sagepayserver", SHARED_BASE_URL),
        (ConnectorEnum::Sagepayform, "sagepayform", SHARED_BASE_URL),
        (ConnectorEnum::Sagepaypi, "sagepaypi", PI_BASE_URL),
    ];
    let connectors = connectors();
    for (name, id, base_url) in expected {
        let data = ConnectorData::get_connector_by_name(&name);
        assert_eq!(data.connector_name, name);
        assert_eq!(data.connector.id(), id);
        assert_eq!(data.connector.base_url(&connectors), base_url);
        assert_eq!(name.to_string(), id);
    }
}

#[test]
fn only_pi_needs_pre_flows() {
    for name in [
        ConnectorEnum::Sagepaydirect,
        ConnectorEnum::Sagepayserver,
        ConnectorEnum::Sagepayform,
    ] {
        let connector = connector(name);
        assert!(!connector.should_do_session_token(), "{name}");
        assert!(
            !connector.should_do_payment_method_token(PaymentMethod::Card),
            "{name}"
        );
    }

    let pi = connector(ConnectorEnum::Sagepaypi);
    assert!(pi.should_do_session_token());
    assert!(pi.should_do_payment_method_token(PaymentMethod::Card));
    assert!(!pi.should_do_payment_method_token(PaymentMethod::Wallet));
}

#[test]
fn pi_session_key_request_goes_through_the_boxed_connector() {
    let pi = connector(ConnectorEnum::Sagepaypi);
    let router_data: RouterDataV2<
        CreateSessionToken,
        PaymentFlowData,
        SessionTokenRequestData,
        SessionTokenResponseData,
    > = RouterDataV2::new(
        payment_flow_data(),
        ConnectorAuthType::SignatureKey {
            api_key: Secret::new("integration-key".to_string()),
            key1: Secret::new("integration-password".to_string()),
            api_secret: Secret::new(VENDOR.to_string()),
        },
        SessionTokenRequestData {
            amount: MinorUnit::new(1000),
            currency: Currency::GBP,
            browser_info: None,
        },
    );

    let flow: &(dyn ConnectorServiceTrait + Sync) = *pi;
    let url = ConnectorIntegrationV2::<
        CreateSessionToken,
        PaymentFlowData,
        SessionTokenRequestData,
        SessionTokenResponseData,
    >::get_url(flow, &router_data)
    .unwrap();
    assert_eq!(url, format!("{PI_BASE_URL}/merchant-session-keys"));
}

#[test]
fn server_notification_is_verified_and_processed() {
    let server = connector(ConnectorEnum::Sagepayserver);
    let secret = || {
        Some(ConnectorWebhookSecrets {
            secret: SECURITY_KEY.as_bytes().to_vec(),
            additional_secret: Some(Secret::new(VENDOR.to_string())),
        })
    };

    assert!(server
        .verify_webhook_source(payment_notification(), secret(), None)
        .unwrap());
    assert_eq!(
        server
            .get_event_type(payment_notification(), None, None)
            .unwrap(),
        EventType::PaymentIntentSuccess
    );

    let details = server
        .process_payment_webhook(payment_notification(), secret(), None)
        .unwrap();
    assert_eq!(details.status, AttemptStatus::Charged);
    assert!(matches!(
        details.resource_id,
        Some(ResponseId::ConnectorTransactionId(ref reference)) if reference.contains(SECURITY_KEY)
    ));
}

#[test]
fn direct_does_not_accept_notifications() {
    let direct = connector(ConnectorEnum::Sagepaydirect);
    assert!(!direct
        .verify_webhook_source(payment_notification(), None, None)
        .unwrap());
}
