/// The status of the attempt
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Hash,
    Eq,
    PartialEq,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttemptStatus {
    Started,
    AuthenticationFailed,
    AuthenticationPending,
    AuthenticationSuccessful,
    Authorized,
    AuthorizationFailed,
    Charged,
    Authorizing,
    Voided,
    VoidInitiated,
    CaptureInitiated,
    CaptureFailed,
    VoidFailed,
    #[default]
    Pending,
    Failure,
}

impl AttemptStatus {
    pub fn is_terminal_status(self) -> bool {
        matches!(
            self,
            Self::Charged
                | Self::Voided
                | Self::AuthenticationFailed
                | Self::AuthorizationFailed
                | Self::VoidFailed
                | Self::CaptureFailed
                | Self::Failure
        )
    }

    pub fn is_success(self) -> bool {
        matches!(
            self,
            Self::Charged | Self::Authorized | Self::AuthenticationSuccessful | Self::Voided
        )
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    PartialEq,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Failure,
    ManualReview,
    #[default]
    Pending,
    Success,
    TransactionFailure,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    PartialEq,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CaptureMethod {
    #[default]
    Automatic,
    Manual,
    ManualMultiple,
    Scheduled,
    SequentialAutomatic,
}

/// Specifies how the payment method can be used for future payments.
/// - `off_session`: the payment method is stored for merchant initiated payments.
/// - `on_session`: the payment method is used only while the customer is present.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    PartialEq,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FutureUsage {
    OffSession,
    #[default]
    OnSession,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    PartialEq,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuthenticationType {
    /// Ask the acquirer to always run 3-D Secure
    ThreeDs,
    #[default]
    NoThreeDs,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    PartialEq,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    Wallet,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MandateStatus {
    Active,
    Inactive,
    Pending,
    Revoked,
}

/// Whether a connector expects amounts in the smallest or the major denomination
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CurrencyUnit {
    Base,
    Minor,
}

/// Indicates the card network.
#[derive(
    Clone,
    Debug,
    Eq,
    Hash,
    PartialEq,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
    strum::EnumString,
)]
pub enum CardNetwork {
    #[serde(alias = "VISA")]
    Visa,
    #[serde(alias = "MASTERCARD")]
    Mastercard,
    #[serde(alias = "AMERICANEXPRESS")]
    #[serde(alias = "AMEX")]
    AmericanExpress,
    JCB,
    #[serde(alias = "DINERSCLUB")]
    DinersClub,
    #[serde(alias = "DISCOVER")]
    Discover,
    #[serde(alias = "MAESTRO")]
    Maestro,
    #[serde(alias = "UNIONPAY")]
    UnionPay,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Currency {
    AED,
    AUD,
    BHD,
    BRL,
    CAD,
    CHF,
    CLP,
    CNY,
    CZK,
    DKK,
    EUR,
    #[default]
    GBP,
    HKD,
    HUF,
    IDR,
    ILS,
    INR,
    ISK,
    JOD,
    JPY,
    KRW,
    KWD,
    MXN,
    MYR,
    NOK,
    NZD,
    OMR,
    PHP,
    PLN,
    RON,
    SAR,
    SEK,
    SGD,
    THB,
    TND,
    TRY,
    TWD,
    USD,
    VND,
    ZAR,
}

impl Currency {
    pub fn iso_4217(self) -> &'static str {
        match self {
            Self::AED => "784",
            Self::AUD => "036",
            Self::BHD => "048",
            Self::BRL => "986",
            Self::CAD => "124",
            Self::CHF => "756",
            Self::CLP => "152",
            Self::CNY => "156",
            Self::CZK => "203",
            Self::DKK => "208",
            Self::EUR => "978",
            Self::GBP => "826",
            Self::HKD => "344",
            Self::HUF => "348",
            Self::IDR => "360",
            Self::ILS => "376",
            Self::INR => "356",
            Self::ISK => "352",
            Self::JOD => "400",
            Self::JPY => "392",
            Self::KRW => "410",
            Self::KWD => "414",
            Self::MXN => "484",
            Self::MYR => "458",
            Self::NOK => "578",
            Self::NZD => "554",
            Self::OMR => "512",
            Self::PHP => "608",
            Self::PLN => "985",
            Self::RON => "946",
            Self::SAR => "682",
            Self::SEK => "752",
            Self::SGD => "702",
            Self::THB => "764",
            Self::TND => "788",
            Self::TRY => "949",
            Self::TWD => "901",
            Self::USD => "840",
            Self::VND => "704",
            Self::ZAR => "710",
        }
    }

    pub fn is_zero_decimal_currency(self) -> bool {
        matches!(
            self,
            Self::CLP | Self::ISK | Self::JPY | Self::KRW | Self::VND
        )
    }

    pub fn is_three_decimal_currency(self) -> bool {
        matches!(
            self,
            Self::BHD | Self::JOD | Self::KWD | Self::OMR | Self::TND
        )
    }

    pub fn number_of_digits_after_decimal_point(self) -> u8 {
        if self.is_zero_decimal_currency() {
            0
        } else if self.is_three_decimal_currency() {
            3
        } else {
            2
        }
    }
}

/// ISO 3166-1 alpha-2 country codes accepted on billing and delivery addresses
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
    strum::EnumString,
)]
pub enum CountryAlpha2 {
    AE,
    AT,
    AU,
    BE,
    BG,
    BR,
    CA,
    CH,
    CN,
    CY,
    CZ,
    DE,
    DK,
    EE,
    ES,
    FI,
    FR,
    GB,
    GG,
    GI,
    GR,
    HK,
    HR,
    HU,
    IE,
    IM,
    IN,
    IS,
    IT,
    JE,
    JP,
    LI,
    LT,
    LU,
    LV,
    MT,
    MX,
    NL,
    NO,
    NZ,
    PL,
    PT,
    RO,
    SE,
    SG,
    SI,
    SK,
    US,
    ZA,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_decimal_places() {
        assert_eq!(Currency::GBP.number_of_digits_after_decimal_point(), 2);
        assert_eq!(Currency::JPY.number_of_digits_after_decimal_point(), 0);
        assert_eq!(Currency::KWD.number_of_digits_after_decimal_point(), 3);
    }

    #[test]
    fn attempt_status_serializes_as_snake_case() {
        let value = serde_json::to_value(AttemptStatus::AuthenticationPending).unwrap();
        assert_eq!(value, serde_json::json!("authentication_pending"));
        assert_eq!(AttemptStatus::Charged.to_string(), "charged");
    }

    #[test]
    fn card_network_accepts_upper_case_aliases() {
        let network: CardNetwork = serde_json::from_value(serde_json::json!("AMEX")).unwrap();
        assert_eq!(network, CardNetwork::AmericanExpress);
    }
}
