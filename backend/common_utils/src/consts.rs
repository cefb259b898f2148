/// Fallback error code when the connector does not send one
pub const NO_ERROR_CODE: &str = "No error code";

/// Fallback error message when the connector does not send one
pub const NO_ERROR_MESSAGE: &str = "No error message";

/// Header carrying the request body's media type
pub const CONTENT_TYPE: &str = "Content-Type";

/// Basic / bearer credentials header
pub const AUTHORIZATION: &str = "Authorization";

/// Message used when a connector answers with a body we cannot interpret
pub const UNSUPPORTED_ERROR_MESSAGE: &str = "Unsupported response type";

/// Prefix of environment variables that override file configuration
pub const ENV_PREFIX: &str = "CS";

/// Env variable that selects the configuration environment
pub const RUN_ENV: &str = "RUN_ENV";

/// Current environment.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Env {
    #[default]
    Development,
    Sandbox,
    Production,
}

impl Env {
    /// Reads `RUN_ENV`; unknown or missing values fall back to development
    pub fn current_env() -> Self {
        std::env::var(RUN_ENV).map_or_else(|_| Self::default(), |v| v.parse().unwrap_or_default())
    }

    pub const fn config_path(self) -> &'static str {
        match self {
            Self::Development => "development.toml",
            Self::Sandbox => "sandbox.toml",
            Self::Production => "production.toml",
        }
    }
}
