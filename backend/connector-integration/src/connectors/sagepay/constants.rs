//! Wire constants of the Form/Server/Direct protocol family

/// Service names; the endpoint is `{base_url}/{service}.vsp`
pub mod services {
    pub const DIRECT_REGISTER: &str = "vspdirect-register";
    pub const SERVER_REGISTER: &str = "vspserver-register";
    pub const FORM_REGISTER: &str = "vspform-register";
    pub const DIRECT_3D_CALLBACK: &str = "direct3dcallback";
    pub const RELEASE: &str = "release";
    pub const VOID: &str = "void";
    pub const ABORT: &str = "abort";
    pub const REFUND: &str = "refund";
    pub const REPEAT: &str = "repeat";
    pub const DIRECT_TOKEN: &str = "directtoken";
    pub const SERVER_TOKEN: &str = "token";
    pub const REMOVE_TOKEN: &str = "removetoken";
    pub const PAYPAL_COMPLETE: &str = "complete";
}

/// Field names that appear in notifications, form results and transaction references
pub mod fields {
    pub const VPS_PROTOCOL: &str = "VPSProtocol";
    pub const TX_TYPE: &str = "TxType";
    pub const VENDOR: &str = "Vendor";
    pub const VENDOR_TX_CODE: &str = "VendorTxCode";
    pub const VPS_TX_ID: &str = "VPSTxId";
    pub const STATUS: &str = "Status";
    pub const STATUS_DETAIL: &str = "StatusDetail";
    pub const TX_AUTH_NO: &str = "TxAuthNo";
    pub const SECURITY_KEY: &str = "SecurityKey";
    pub const VPS_SIGNATURE: &str = "VPSSignature";
    pub const TOKEN: &str = "Token";
    pub const CRYPT: &str = "Crypt";
    pub const REDIRECT_URL: &str = "RedirectURL";
}

pub const DESCRIPTION_MAX_LENGTH: usize = 100;

/// Used when neither the payment nor the refund carries a description
pub const DEFAULT_DESCRIPTION: &str = "Payment";
pub const DEFAULT_REFUND_DESCRIPTION: &str = "Refund";

/// Key=Value lines of gateway responses and notification replies
pub const LINE_SEPARATOR: &str = "\r\n";

/// `StatusDetail` is `NNNN : message` when the gateway attaches an error code
pub const STATUS_DETAIL_CODE_SEPARATOR: &str = " : ";

/// Only US addresses carry a state code
pub const STATE_COUNTRY: common_enums::CountryAlpha2 = common_enums::CountryAlpha2::US;

/// Query parameter on the notification URL that tells us where to send the shopper afterwards
pub const NOTIFICATION_REDIRECT_URL_PARAM: &str = "redirect_url";

/// Query parameter the Form integration appends to the success/failure URL
pub const FORM_CRYPT_PARAM: &str = "crypt";
