//! Protocol shared by the Form, Server and Direct integrations: `Key=Value` responses,
//! `{base_url}/{service}.vsp` endpoints, the transaction reference and the notification signature.

pub mod constants;
pub mod crypt;
pub mod notification;
pub mod transformers;

#[cfg(test)]
pub(crate) mod test_utils;

use common_utils::{consts, errors::CustomResult, Maskable};
use domain_types::{
    errors::ConnectorError, router_data::ErrorResponse, router_response_types::Response,
};
use interfaces::events::connector_api_logs::ConnectorEvent;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;

use crate::{with_error_response_body, with_response_body};

pub(crate) mod headers {
    pub(crate) const CONTENT_TYPE: &str = "Content-Type";
}

pub const FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";

pub fn service_url(base_url: &str, service: &str) -> String {
    format!("{}/{service}.vsp", base_url.trim_end_matches('/'))
}

pub(crate) fn build_headers() -> Vec<(String, Maskable<String>)> {
    vec![(
        headers::CONTENT_TYPE.to_string(),
        FORM_URL_ENCODED.to_string().into(),
    )]
}

/// Parses a `Key=Value` response body and records it on the connector event
pub(crate) fn handle_key_value_response<T>(
    res: &Response,
    event_builder: Option<&mut ConnectorEvent>,
    type_name: &'static str,
) -> CustomResult<T, ConnectorError>
where
    T: DeserializeOwned + Serialize,
{
    let response: T = transformers::parse_key_value_response(&res.response, type_name)?;
    with_response_body!(event_builder, response);
    Ok(response)
}

/// Error bodies are usually `Key=Value` lines with a `StatusDetail`; anything else (an HTML
/// error page from a proxy) is passed through as the reason
pub(crate) fn build_error_response(
    res: Response,
    event_builder: Option<&mut ConnectorEvent>,
) -> CustomResult<ErrorResponse, ConnectorError> {
    match transformers::parse_key_value_response::<transformers::SagepayResponse>(
        &res.response,
        "SagepayResponse",
    ) {
        Ok(response) => {
            with_error_response_body!(event_builder, response);
            tracing::info!(status = %response.status, http_code = res.status_code, "sagepay error response");
            Ok(response.to_error_response(res.status_code, None))
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
