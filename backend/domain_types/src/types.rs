use serde::{Deserialize, Serialize};

/// Gateway endpoints, one entry per API family
#[derive(Clone, Deserialize, Serialize, Debug, Default, PartialEq)]
pub struct Connectors {
    /// Shared form/server/direct protocol (`{base_url}/{service}.vsp`)
    pub sagepay: ConnectorParams,
    /// REST API
    pub sagepaypi: ConnectorParams,
}

#[derive(Clone, Deserialize, Serialize, Debug, Default, PartialEq)]
pub struct ConnectorParams {
    /// base url
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub secondary_base_url: Option<String>,
}

impl ConnectorParams {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            secondary_base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectors_deserialize_from_nested_tables() {
        let connectors: Connectors = serde_json::from_value(serde_json::json!({
            "sagepay": { "base_url": "https://test.sagepay.com/gateway/service" },
            "sagepaypi": { "base_url": "https://pi-test.sagepay.com/api/v1" }
        }))
        .expect("connectors");
        assert_eq!(
            connectors.sagepay,
            ConnectorParams::new("https://test.sagepay.com/gateway/service".to_string())
        );
        assert_eq!(connectors.sagepaypi.secondary_base_url, None);
    }
}
