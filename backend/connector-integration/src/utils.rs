#[macro_export]
macro_rules! with_error_response_body {
    ($event_builder:ident, $response:ident) => {
        if let Some(body) = $event_builder {
            body.set_error_response_body(&$response);
        }
    };
}

#[macro_export]
macro_rules! with_response_body {
    ($event_builder:ident, $response:ident) => {
        if let Some(body) = $event_builder {
            body.set_response_body(&$response);
        }
    };
}

pub(crate) fn get_unimplemented_payment_method_error_message(connector: &str) -> String {
    format!("Selected payment method through {connector}")
}

/// Cuts `value` down to `max_chars` characters without splitting a character
pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Looks `key` up in an `application/x-www-form-urlencoded` string, ignoring a leading `?`
pub(crate) fn get_query_param(query: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

/// Looks `key` up in a JSON object regardless of its case; browsers and ACS servers disagree
/// on the casing of fields like `PaRes`/`PARes` and `cres`/`CRes`
pub(crate) fn get_value_ignore_case<'a>(
    value: &'a serde_json::Value,
    key: &str,
) -> Option<&'a serde_json::Value> {
    value.as_object().and_then(|object| {
        object
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    })
}

pub(crate) fn get_string_ignore_case(value: &serde_json::Value, key: &str) -> Option<String> {
    get_value_ignore_case(value, key)
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
}
