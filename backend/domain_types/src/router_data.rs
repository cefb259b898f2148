use common_utils::{
    ext_traits::ValueExt, pii::SecretSerdeValue, ExposeInterface, PeekInterface, Secret,
};
use error_stack::ResultExt;

use crate::errors::ConnectorError;

pub type Error = error_stack::Report<ConnectorError>;

#[derive(Default, Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(tag = "auth_type")]
pub enum ConnectorAuthType {
    HeaderKey {
        api_key: Secret<String>,
    },
    BodyKey {
        api_key: Secret<String>,
        key1: Secret<String>,
    },
    SignatureKey {
        api_key: Secret<String>,
        key1: Secret<String>,
        api_secret: Secret<String>,
    },
    MultiAuthKey {
        api_key: Secret<String>,
        key1: Secret<String>,
        api_secret: Secret<String>,
        key2: Secret<String>,
    },
    #[default]
    NoKey,
}

impl ConnectorAuthType {
    pub fn from_option_secret_value(
        value: Option<SecretSerdeValue>,
    ) -> common_utils::errors::CustomResult<Self, common_utils::errors::ParsingError> {
        value
            .ok_or(common_utils::errors::ParsingError::StructParseFailure(
                "ConnectorAuthType",
            ))
            .map_err(error_stack::Report::new)
            .and_then(Self::from_secret_value)
    }

    pub fn from_secret_value(
        value: SecretSerdeValue,
    ) -> common_utils::errors::CustomResult<Self, common_utils::errors::ParsingError> {
        value
            .parse_value::<Self>("ConnectorAuthType")
            .change_context(common_utils::errors::ParsingError::StructParseFailure(
                "ConnectorAuthType",
            ))
    }

    // show only first and last two characters of the key and mask others with *
    // mask the entire key if it's length is less than or equal to 4
    fn mask_key(&self, key: String) -> Secret<String> {
        let key_len = key.chars().count();
        let masked_key = if key_len <= 4 {
            "*".repeat(key_len)
        } else {
            key.chars()
                .enumerate()
                .map(|(index, character)| {
                    if index < 2 || index >= key_len - 2 {
                        character
                    } else {
                        '*'
                    }
                })
                .collect()
        };
        Secret::new(masked_key)
    }

    // Mask the keys in the auth_type
    pub fn get_masked_keys(&self) -> Self {
        match self {
            Self::NoKey => Self::NoKey,
            Self::HeaderKey { api_key } => Self::HeaderKey {
                api_key: self.mask_key(api_key.clone().expose()),
            },
            Self::BodyKey { api_key, key1 } => Self::BodyKey {
                api_key: self.mask_key(api_key.clone().expose()),
                key1: self.mask_key(key1.clone().expose()),
            },
            Self::SignatureKey {
                api_key,
                key1,
                api_secret,
            } => Self::SignatureKey {
                api_key: self.mask_key(api_key.clone().expose()),
                key1: self.mask_key(key1.clone().expose()),
                api_secret: self.mask_key(api_secret.clone().expose()),
            },
            Self::MultiAuthKey {
                api_key,
                key1,
                api_secret,
                key2,
            } => Self::MultiAuthKey {
                api_key: self.mask_key(api_key.clone().expose()),
                key1: self.mask_key(key1.clone().expose()),
                api_secret: self.mask_key(api_secret.clone().expose()),
                key2: self.mask_key(key2.clone().expose()),
            },
        }
    }

    /// The first key of every keyed variant; used where a connector only needs one credential
    pub fn get_api_key(&self) -> Result<&Secret<String>, Error> {
        match self {
            Self::HeaderKey { api_key }
            | Self::BodyKey { api_key, .. }
            | Self::SignatureKey { api_key, .. }
            | Self::MultiAuthKey { api_key, .. } => Ok(api_key),
            Self::NoKey => Err(ConnectorError::FailedToObtainAuthType.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.get_api_key()
            .map(|key| key.peek().trim().is_empty())
            .unwrap_or(true)
    }
}

/// A payment method stored by the connector ahead of the payment (a card identifier, a token)
#[derive(Debug, Clone, serde::Deserialize)]
pub enum PaymentMethodToken {
    Token(Secret<String>),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub reason: Option<String>,
    pub status_code: u16,
    pub attempt_status: Option<common_enums::AttemptStatus>,
    pub connector_transaction_id: Option<String>,
    pub network_decline_code: Option<String>,
    pub network_advice_code: Option<String>,
    pub network_error_message: Option<String>,
}

impl Default for ErrorResponse {
    fn default() -> Self {
        Self {
            code: "HE_00".to_string(),
            message: "Something went wrong".to_string(),
            reason: None,
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            attempt_status: None,
            connector_transaction_id: None,
            network_decline_code: None,
            network_advice_code: None,
            network_error_message: None,
        }
    }
}

impl ErrorResponse {
    pub fn get_not_implemented() -> Self {
        Self {
            code: "IR_00".to_string(),
            message: "This API is under development and will be made available soon.".to_string(),
            ..Default::default()
        }
    }
}
