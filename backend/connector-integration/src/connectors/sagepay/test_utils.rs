//! Router data fixtures shared by the connector unit tests

use std::str::FromStr;

use common_enums::{AttemptStatus, AuthenticationType, CountryAlpha2, Currency, PaymentMethod};
use common_utils::{Email, MinorUnit, Secret};
use domain_types::{
    connector_types::{PaymentFlowData, PaymentsAuthorizeData, RefundFlowData},
    payment_address::{Address, AddressDetails, PaymentAddress, PhoneDetails},
    payment_method_data::{Card, PaymentMethodData},
    router_data::ConnectorAuthType,
    router_data_v2::RouterDataV2,
    router_request_types::BrowserInformation,
    router_response_types::Response,
    types::{ConnectorParams, Connectors},
};

pub const VENDOR: &str = "sandboxEC";
pub const ENCRYPTION_PASSWORD: &str = "55Wvr47ZmvoKtyzD";
pub const VENDOR_TX_CODE: &str = "pay_123_1";
pub const VPS_TX_ID: &str = "{5A1BC414-5409-48DD-9B8B-DCDF096CE0BE}";
pub const SECURITY_KEY: &str = "IDBL4ZXJ2A";
pub const SAGEPAY_BASE_URL: &str = "https://test.sagepay.com/gateway/service";
pub const SAGEPAYPI_BASE_URL: &str = "https://pi-test.sagepay.com/api/v1";
pub const COMPLETE_AUTHORIZE_URL: &str = "https://shop.example/payments/pay_123/complete";
pub const RETURN_URL: &str = "https://shop.example/payments/pay_123/return";
pub const WEBHOOK_URL: &str = "https://shop.example/webhooks/sagepay";

pub fn connectors() -> Connectors {
    Connectors {
        sagepay: ConnectorParams::new(SAGEPAY_BASE_URL.to_string()),
        sagepaypi: ConnectorParams::new(SAGEPAYPI_BASE_URL.to_string()),
    }
}

pub fn vendor_auth() -> ConnectorAuthType {
    ConnectorAuthType::HeaderKey {
        api_key: Secret::new(VENDOR.to_string()),
    }
}

pub fn form_auth() -> ConnectorAuthType {
    ConnectorAuthType::BodyKey {
        api_key: Secret::new(VENDOR.to_string()),
        key1: Secret::new(ENCRYPTION_PASSWORD.to_string()),
    }
}

pub fn pi_auth() -> ConnectorAuthType {
    ConnectorAuthType::SignatureKey {
        api_key: Secret::new("hJYxsw7HLbj40cB8udES8CDRFLhuJ8G54O6rDpUXvE6hYDrria".to_string()),
        key1: Secret::new("o2iHSrFybYMZpmWOQMuhsXP52V4fBtpuSDshrKDSWsBY1OiN6hwd9Kb12z4j5Us5u".to_string()),
        api_secret: Secret::new(VENDOR.to_string()),
    }
}

pub fn billing_address() -> Address {
    Address {
        address: Some(AddressDetails {
            first_name: Some(Secret::new("Sam".to_string())),
            last_name: Some(Secret::new("Jones".to_string())),
            line1: Some(Secret::new("88 The Road".to_string())),
            line2: Some(Secret::new("Flat 2".to_string())),
            city: Some(Secret::new("London".to_string())),
            zip: Some(Secret::new("412".to_string())),
            state: Some(Secret::new("Greater London".to_string())),
            country: Some(CountryAlpha2::GB),
            ..Default::default()
        }),
        phone: Some(PhoneDetails {
            number: Some(Secret::new("7700900077".to_string())),
            country_code: Some("+44".to_string()),
        }),
        email: Some(email()),
    }
}

pub fn email() -> Email {
    Email::from_str("sam.jones@example.com").unwrap()
}

pub fn payment_flow_data() -> PaymentFlowData {
    PaymentFlowData {
        merchant_id: "merchant_1".to_string(),
        customer_id: Some("cus_1".to_string()),
        payment_id: "pay_123".to_string(),
        attempt_id: "pay_123_1".to_string(),
        status: AttemptStatus::Started,
        payment_method: PaymentMethod::Card,
        description: Some("Order 123".to_string()),
        return_url: Some(RETURN_URL.to_string()),
        address: PaymentAddress::new(None, Some(billing_address()), None, None),
        auth_type: AuthenticationType::NoThreeDs,
        connector_meta_data: None,
        amount_captured: None,
        minor_amount_captured: None,
        session_token: None,
        reference_id: None,
        payment_method_token: None,
        connector_request_reference_id: VENDOR_TX_CODE.to_string(),
        test_mode: Some(true),
        connector_http_status_code: None,
        connectors: connectors(),
        raw_connector_response: None,
        raw_connector_request: None,
    }
}

pub fn refund_flow_data() -> RefundFlowData {
    RefundFlowData {
        merchant_id: "merchant_1".to_string(),
        status: common_enums::RefundStatus::Pending,
        refund_id: Some("ref_123_1".to_string()),
        connectors: connectors(),
        connector_request_reference_id: "ref_123_1".to_string(),
        connector_meta_data: None,
        raw_connector_response: None,
        raw_connector_request: None,
        test_mode: Some(true),
        payment_method: Some(PaymentMethod::Card),
    }
}

pub fn card() -> Card {
    Card {
        card_number: cards::CardNumber::from_str("4929000000006").unwrap(),
        card_exp_month: Secret::new("3".to_string()),
        card_exp_year: Secret::new("2030".to_string()),
        card_cvc: Secret::new("123".to_string()),
        card_issuer: None,
        card_network: None,
        card_holder_name: Some(Secret::new("Sam Jones".to_string())),
    }
}

pub fn browser_info() -> BrowserInformation {
    BrowserInformation {
        color_depth: Some(24),
        java_enabled: Some(false),
        java_script_enabled: Some(true),
        language: Some("en-GB".to_string()),
        screen_height: Some(1080),
        screen_width: Some(1920),
        time_zone: Some(-60),
        ip_address: Some(std::net::IpAddr::from([203, 0, 113, 7])),
        accept_header: Some("text/html".to_string()),
        user_agent: Some("Mozilla/5.0".to_string()),
        accept_language: Some("en-GB".to_string()),
        referer: None,
    }
}

pub fn authorize_data(payment_method_data: PaymentMethodData) -> PaymentsAuthorizeData {
    PaymentsAuthorizeData {
        payment_method_data,
        minor_amount: MinorUnit::new(1000),
        email: Some(email()),
        customer_name: Some("Sam Jones".to_string()),
        currency: Currency::GBP,
        confirm: true,
        capture_method: Some(common_enums::CaptureMethod::Automatic),
        router_return_url: Some(RETURN_URL.to_string()),
        webhook_url: Some(WEBHOOK_URL.to_string()),
        complete_authorize_url: Some(COMPLETE_AUTHORIZE_URL.to_string()),
        mandate_id: None,
        setup_future_usage: None,
        off_session: None,
        browser_info: Some(browser_info()),
        customer_id: Some("cus_1".to_string()),
        metadata: None,
        merchant_order_reference_id: None,
        statement_descriptor: None,
    }
}

pub fn router_data<F, Req, Resp>(
    request: Req,
    auth: ConnectorAuthType,
) -> RouterDataV2<F, PaymentFlowData, Req, Resp> {
    RouterDataV2::new(payment_flow_data(), auth, request)
}

pub fn with_connector_meta<F, Req, Resp>(
    mut router_data: RouterDataV2<F, PaymentFlowData, Req, Resp>,
    meta: serde_json::Value,
) -> RouterDataV2<F, PaymentFlowData, Req, Resp> {
    router_data.resource_common_data.connector_meta_data = Some(Secret::new(meta));
    router_data
}

/// The stored reference of the fixture payment
pub fn transaction_reference() -> String {
    serde_json::json!({
        "SecurityKey": SECURITY_KEY,
        "TxAuthNo": "9962",
        "VPSTxId": VPS_TX_ID,
        "VendorTxCode": VENDOR_TX_CODE,
    })
    .to_string()
}

pub fn key_value_response(body: &str, status_code: u16) -> Response {
    Response {
        headers: None,
        response: bytes::Bytes::from(body.replace('\n', "\r\n")),
        status_code,
    }
}

pub fn json_response(body: serde_json::Value, status_code: u16) -> Response {
    Response {
        headers: None,
        response: bytes::Bytes::from(body.to_string()),
        status_code,
    }
}

/// Form body of a built request as decoded pairs
pub fn form_fields(
    body: &common_utils::request::RequestContent,
) -> std::collections::HashMap<String, String> {
    let encoded = common_utils::ExposeInterface::expose(body.get_inner_value());
    url::form_urlencoded::parse(encoded.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

pub const PAYMENT_NOTIFICATION_SIGNATURE: &str = "efff27db880f761d8ecdb6d6522dd77f";
pub const TOKEN_NOTIFICATION_SIGNATURE: &str = "aee82a16f37c50e4f7f36710561518dc";
pub const TOKEN_SECURITY_KEY: &str = "KX2L9ZQW1P";
pub const TOKEN: &str = "{B3A1A9F2-7D4E-4C1B-9E52-3C8F0A6B7D21}";

/// Unsigned fields of a successful payment notification
pub fn payment_notification_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("VPSProtocol", "4.00"),
        ("TxType", "PAYMENT"),
        ("VendorTxCode", VENDOR_TX_CODE),
        ("VPSTxId", VPS_TX_ID),
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
    ]
}

pub fn token_notification_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("VPSProtocol", "4.00"),
        ("TxType", "TOKEN"),
        ("VendorTxCode", "tok_123_1"),
        ("VPSTxId", VPS_TX_ID),
        ("Status", "OK"),
        ("StatusDetail", "0000 : The Authorisation was Successful."),
        ("Token", TOKEN),
    ]
}

/// URL-encodes `fields`, appending `VPSSignature` when given
pub fn form_body(fields: &[(&str, &str)], signature: Option<&str>) -> Vec<u8> {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(fields.iter().copied());
    if let Some(signature) = signature {
        serializer.append_pair("VPSSignature", signature);
    }
    serializer.finish().into_bytes()
}

pub fn payment_notification() -> Vec<u8> {
    form_body(
        &payment_notification_fields(),
        Some(PAYMENT_NOTIFICATION_SIGNATURE),
    )
}

pub fn token_notification() -> Vec<u8> {
    form_body(&token_notification_fields(), Some(TOKEN_NOTIFICATION_SIGNATURE))
}
