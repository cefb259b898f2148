use common_utils::{pii::IpAddress, Secret};

use crate::{errors, utils};

pub type Error = error_stack::Report<errors::ConnectorError>;

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BrowserInformation {
    pub color_depth: Option<u8>,
    pub java_enabled: Option<bool>,
    pub java_script_enabled: Option<bool>,
    pub language: Option<String>,
    pub screen_height: Option<u32>,
    pub screen_width: Option<u32>,
    /// Offset from UTC in minutes, as reported by the browser
    pub time_zone: Option<i32>,
    pub ip_address: Option<std::net::IpAddr>,
    pub accept_header: Option<String>,
    pub user_agent: Option<String>,
    pub accept_language: Option<String>,
    pub referer: Option<String>,
}

impl BrowserInformation {
    pub fn get_ip_address(&self) -> Result<Secret<String, IpAddress>, Error> {
        let ip_address = self
            .ip_address
            .ok_or_else(utils::missing_field_err("browser_info.ip_address"))?;
        Ok(Secret::new(ip_address.to_string()))
    }
    pub fn get_accept_header(&self) -> Result<String, Error> {
        self.accept_header
            .clone()
            .ok_or_else(utils::missing_field_err("browser_info.accept_header"))
    }
    pub fn get_language(&self) -> Result<String, Error> {
        self.language
            .clone()
            .ok_or_else(utils::missing_field_err("browser_info.language"))
    }
    pub fn get_screen_height(&self) -> Result<u32, Error> {
        self.screen_height
            .ok_or_else(utils::missing_field_err("browser_info.screen_height"))
    }
    pub fn get_screen_width(&self) -> Result<u32, Error> {
        self.screen_width
            .ok_or_else(utils::missing_field_err("browser_info.screen_width"))
    }
    pub fn get_color_depth(&self) -> Result<u8, Error> {
        self.color_depth
            .ok_or_else(utils::missing_field_err("browser_info.color_depth"))
    }
    pub fn get_user_agent(&self) -> Result<String, Error> {
        self.user_agent
            .clone()
            .ok_or_else(utils::missing_field_err("browser_info.user_agent"))
    }
    pub fn get_time_zone(&self) -> Result<i32, Error> {
        self.time_zone
            .ok_or_else(utils::missing_field_err("browser_info.time_zone"))
    }
    pub fn get_java_enabled(&self) -> Result<bool, Error> {
        self.java_enabled
            .ok_or_else(utils::missing_field_err("browser_info.java_enabled"))
    }
    pub fn get_java_script_enabled(&self) -> Result<bool, Error> {
        self.java_script_enabled
            .ok_or_else(utils::missing_field_err("browser_info.java_script_enabled"))
    }
}

#[derive(Debug, Default, Clone)]
pub enum SyncRequestType {
    MultipleCaptureSync,
    #[default]
    SinglePaymentSync,
}

/// Parameters the customer's browser posts back after an ACS challenge or an off-site redirect
#[derive(Debug, Clone, Default)]
pub struct CompleteAuthorizeRedirectResponse {
    pub params: Option<Secret<String>>,
    pub payload: Option<common_utils::pii::SecretSerdeValue>,
}
