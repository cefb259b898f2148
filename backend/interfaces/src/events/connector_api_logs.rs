//! Connector API logs interface

use common_utils::request::Method;
use serde::Serialize;
use serde_json::{json, Value};
use time::OffsetDateTime;

/// Gateway field names whose values never reach the logs
const MASKED_KEYS: &[&str] = &[
    "CardNumber",
    "CV2",
    "SecurityKey",
    "Token",
    "Crypt",
    "PaReq",
    "CAVV",
    "cardNumber",
    "securityCode",
    "cardIdentifier",
    "merchantSessionKey",
];

const MASK: &str = "*** masked ***";

/// struct ConnectorEvent
#[derive(Debug, Serialize)]
pub struct ConnectorEvent {
    connector_name: String,
    flow: String,
    request: String,
    masked_response: Option<String>,
    error: Option<String>,
    url: String,
    method: String,
    payment_id: String,
    created_at: i128,
    status_code: u16,
}

impl ConnectorEvent {
    /// fn new ConnectorEvent
    pub fn new(
        connector_name: String,
        flow: &str,
        request: Value,
        url: String,
        method: Method,
        payment_id: String,
        status_code: u16,
    ) -> Self {
        Self {
            connector_name,
            flow: flow
                .rsplit_once("::")
                .map(|(_, s)| s)
                .unwrap_or(flow)
                .to_string(),
            request: mask_value(request).to_string(),
            masked_response: None,
            error: None,
            url,
            method: method.to_string(),
            payment_id,
            created_at: OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000,
            status_code,
        }
    }

    /// fn set_response_body
    pub fn set_response_body<T: Serialize>(&mut self, response: &T) {
        match serde_json::to_value(response) {
            Ok(value) => {
                self.masked_response = Some(mask_value(value).to_string());
            }
            Err(er) => self.set_error(json!({"error": er.to_string()})),
        }
    }

    /// fn set_error_response_body
    pub fn set_error_response_body<T: Serialize>(&mut self, response: &T) {
        match serde_json::to_value(response) {
            Ok(value) => {
                self.error = Some(mask_value(value).to_string());
            }
            Err(er) => self.set_error(json!({"error": er.to_string()})),
        }
    }

    /// fn set_error
    pub fn set_error(&mut self, error: Value) {
        self.error = Some(error.to_string());
    }

    pub fn masked_response(&self) -> Option<&str> {
        self.masked_response.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Writes the event to the `connector_api` log target
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(event) => tracing::info!(target: "connector_api", connector_event = %event),
            Err(error) => tracing::error!(?error, "failed to serialize connector event"),
        }
    }
}

fn mask_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    if MASKED_KEYS.contains(&key.as_str()) && !value.is_null() {
                        (key, Value::String(MASK.to_string()))
                    } else {
                        (key, mask_value(value))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(mask_value).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> ConnectorEvent {
        ConnectorEvent::new(
            "sagepaydirect".to_string(),
            "domain_types::connector_flow::Authorize",
            json!({ "Vendor": "sandbox", "CardNumber": "4929000000006" }),
            "https://test.sagepay.com/gateway/service/vspdirect-register.vsp".to_string(),
            Method::Post,
            "pay_1".to_string(),
            200,
        )
    }

    #[test]
    fn flow_name_is_shortened_and_card_data_masked() {
        let event = event();
        assert_eq!(event.flow, "Authorize");
        assert!(!event.request.contains("4929000000006"));
        assert!(event.request.contains("sandbox"));
    }

    #[test]
    fn nested_secrets_are_masked_in_responses() {
        let mut event = event();
        event.set_response_body(&json!({
            "Status": "OK",
            "Related": { "SecurityKey": "ABCDEF1234" }
        }));
        let masked = event.masked_response().unwrap_or_default();
        assert!(masked.contains("\"Status\":\"OK\""));
        assert!(!masked.contains("ABCDEF1234"));
    }
}
