use std::collections::HashMap;

use common_utils::request::Method;

#[derive(Clone, Debug)]
pub struct Response {
    pub headers: Option<http::HeaderMap>,
    pub response: bytes::Bytes,
    pub status_code: u16,
}

/// Where the customer's browser has to be sent next, and with which fields
#[derive(Debug, Eq, PartialEq, Clone, serde::Serialize, serde::Deserialize)]
pub enum RedirectForm {
    Form {
        endpoint: String,
        method: Method,
        form_fields: HashMap<String, String>,
    },
    Html {
        html_data: String,
    },
}

impl From<(url::Url, Method)> for RedirectForm {
    fn from((mut redirect_url, method): (url::Url, Method)) -> Self {
        let form_fields = HashMap::from_iter(
            redirect_url
                .query_pairs()
                .map(|(key, value)| (key.to_string(), value.to_string())),
        );

        // Do not include query params in the endpoint
        redirect_url.set_query(None);

        Self::Form {
            endpoint: redirect_url.to_string(),
            method,
            form_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_parameters_move_into_form_fields() {
        let url = url::Url::parse("https://test.sagepay.com/gateway/service/cardselection?vpstxid=ABC")
            .expect("url");
        match RedirectForm::from((url, Method::Get)) {
            RedirectForm::Form {
                endpoint,
                method,
                form_fields,
            } => {
                assert_eq!(endpoint, "https://test.sagepay.com/gateway/service/cardselection");
                assert_eq!(method, Method::Get);
                assert_eq!(form_fields.get("vpstxid").map(String::as_str), Some("ABC"));
            }
            other => panic!("unexpected form {other:?}"),
        }
    }
}
