use hyperswitch_masking::{ErasedMaskSerialize, ExposeInterface, Maskable, PeekInterface, Secret};
use serde::{Deserialize, Serialize};

pub type Headers = std::collections::HashSet<(String, Maskable<String>)>;

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    FormUrlEncoded,
}

impl ContentType {
    pub fn as_mime(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

#[derive(Debug)]
pub struct Request {
    pub url: String,
    pub headers: Headers,
    pub method: Method,
    pub body: Option<RequestContent>,
}

#[derive(Serialize)]
pub enum RequestContent {
    Json(Box<dyn ErasedMaskSerialize + Send>),
    FormUrlEncoded(Box<dyn ErasedMaskSerialize + Send>),
    RawBytes(Vec<u8>),
}

impl std::fmt::Debug for RequestContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Json(_) => "JsonRequestBody",
            Self::FormUrlEncoded(_) => "FormUrlEncodedRequestBody",
            Self::RawBytes(_) => "RawBytesRequestBody",
        })
    }
}

impl RequestContent {
    /// The body exactly as it goes on the wire, kept behind a `Secret` because it carries card data
    pub fn get_inner_value(&self) -> Secret<String> {
        match self {
            Self::Json(i) => serde_json::to_string(&i).unwrap_or_default().into(),
            Self::FormUrlEncoded(i) => serde_urlencoded::to_string(i).unwrap_or_default().into(),
            Self::RawBytes(bytes) => String::from_utf8(bytes.clone()).unwrap_or_default().into(),
        }
    }

    pub fn get_body_bytes(&self) -> Vec<u8> {
        match self {
            Self::RawBytes(bytes) => bytes.clone(),
            Self::Json(_) | Self::FormUrlEncoded(_) => self.get_inner_value().expose().into_bytes(),
        }
    }
}

impl Request {
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: String::from(url),
            headers: std::collections::HashSet::new(),
            body: None,
        }
    }

    pub fn get_headers_map(&self) -> std::collections::HashMap<String, String> {
        let mut map = std::collections::HashMap::new();
        for (k, v) in &self.headers {
            let val = match v {
                Maskable::Masked(s) => s.peek().to_string(),
                Maskable::Normal(s) => s.to_string(),
            };
            map.insert(k.clone(), val);
        }
        map
    }

    pub fn set_body<T: Into<RequestContent>>(&mut self, body: T) {
        self.body.replace(body.into());
    }

    pub fn add_header(&mut self, header: &str, value: Maskable<String>) {
        self.headers.insert((String::from(header), value));
    }
}

#[derive(Debug)]
pub struct RequestBuilder {
    pub url: String,
    pub headers: Headers,
    pub method: Method,
    pub body: Option<RequestContent>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: Method::Get,
            url: String::with_capacity(1024),
            headers: std::collections::HashSet::new(),
            body: None,
        }
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = url.into();
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, header: &str, value: &str) -> Self {
        self.headers.insert((header.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: Vec<(String, Maskable<String>)>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn set_optional_body<T: Into<RequestContent>>(mut self, body: Option<T>) -> Self {
        body.map(|body| self.body.replace(body.into()));
        self
    }

    pub fn set_body<T: Into<RequestContent>>(mut self, body: T) -> Self {
        self.body.replace(body.into());
        self
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperswitch_masking::Mask;

    #[derive(Serialize)]
    struct Body {
        #[serde(rename = "TxType")]
        tx_type: &'static str,
        #[serde(rename = "Amount")]
        amount: &'static str,
    }

    #[test]
    fn form_bodies_render_url_encoded() {
        let content = RequestContent::FormUrlEncoded(Box::new(Body {
            tx_type: "PAYMENT",
            amount: "10.00",
        }));
        assert_eq!(
            content.get_inner_value().expose(),
            "TxType=PAYMENT&Amount=10.00"
        );
    }

    #[derive(Debug, Serialize)]
    struct CardBody {
        #[serde(rename = "CardNumber")]
        card_number: Secret<String>,
    }

    #[test]
    fn secret_fields_are_sent_but_not_printed() {
        let body = CardBody {
            card_number: Secret::new("4929000000006".to_string()),
        };
        assert!(!format!("{body:?}").contains("4929000000006"));
        let content = RequestContent::FormUrlEncoded(Box::new(body));
        assert_eq!(
            content.get_inner_value().expose(),
            "CardNumber=4929000000006"
        );
    }

    #[test]
    fn builder_keeps_masked_headers() {
        let request = RequestBuilder::new()
            .method(Method::Post)
            .url("https://pi-test.sagepay.com/api/v1/transactions")
            .headers(vec![(
                "Authorization".to_string(),
                "Basic abc".to_string().into_masked(),
            )])
            .set_body(RequestContent::Json(Box::new(serde_json::json!({"a": 1}))))
            .build();
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.get_headers_map().get("Authorization"),
            Some(&"Basic abc".to_string())
        );
        assert!(!format!("{:?}", request.headers).contains("Basic abc"));
        assert_eq!(
            request.body.map(|body| body.get_body_bytes()),
            Some(br#"{"a":1}"#.to_vec())
        );
    }
}
