use common_enums::CardNetwork;
use common_utils::{pii::Email, ExposeInterface, PeekInterface, Secret};
use error_stack::ResultExt;
use serde::{Deserialize, Serialize};

use crate::{
    errors::ConnectorError,
    utils::{get_card_issuer, CardIssuer, Error},
};

#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize, Default)]
pub struct Card {
    pub card_number: cards::CardNumber,
    pub card_exp_month: Secret<String>,
    pub card_exp_year: Secret<String>,
    pub card_cvc: Secret<String>,
    pub card_issuer: Option<String>,
    pub card_network: Option<CardNetwork>,
    pub card_holder_name: Option<Secret<String>>,
}

impl Card {
    pub fn get_card_issuer(&self) -> Result<CardIssuer, Error> {
        get_card_issuer(self.card_number.peek())
    }

    /// The network given with the card, or the one its number belongs to
    pub fn get_card_network(&self) -> Result<CardNetwork, Error> {
        match &self.card_network {
            Some(network) => Ok(network.clone()),
            None => self.get_card_issuer().map(CardNetwork::from),
        }
    }

    pub fn get_card_expiry_year_2_digit(&self) -> Result<Secret<String>, ConnectorError> {
        let binding = self.card_exp_year.clone();
        let year = binding.peek();
        Ok(Secret::new(
            year.get(year.len().saturating_sub(2)..)
                .ok_or(ConnectorError::RequestEncodingFailed)?
                .to_string(),
        ))
    }

    pub fn get_expiry_year_4_digit(&self) -> Secret<String> {
        let mut year = self.card_exp_year.peek().clone();
        if year.len() == 2 {
            year = format!("20{year}");
        }
        Secret::new(year)
    }

    /// `MMYY` with a zero padded month
    pub fn get_expiry_date_as_mmyy(&self) -> Result<Secret<String>, Error> {
        let expiry = cards::CardExpiration::new(
            self.card_exp_month.peek(),
            self.card_exp_year.peek(),
        )
        .change_context(ConnectorError::InvalidDataFormat {
            field_name: "payment_method_data.card.card_exp_month",
        })?;
        Ok(expiry.to_mmyy())
    }

    pub fn get_expiry_date_as_yymm(&self) -> Result<Secret<String>, ConnectorError> {
        let year = self.get_card_expiry_year_2_digit()?.expose();
        let month = self.card_exp_month.clone().expose();
        Ok(Secret::new(format!("{year}{month:0>2}")))
    }
}

#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize, Default)]
pub struct CardToken {
    /// The card holder's name
    pub card_holder_name: Option<Secret<String>>,

    /// The CVC number for the card
    pub card_cvc: Option<Secret<String>>,
}

#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletData {
    PaypalRedirect(PaypalRedirection),
}

#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub struct PaypalRedirection {
    /// paypal's email address
    pub email: Option<Email>,
}

#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodData {
    Card(Card),
    Wallet(WalletData),
    /// A card the connector already stores; the token travels as the mandate or payment method token
    CardToken(CardToken),
    MandatePayment,
}

impl PaymentMethodData {
    pub fn get_payment_method(&self) -> Option<common_enums::PaymentMethod> {
        match self {
            Self::Card(_) | Self::CardToken(_) => Some(common_enums::PaymentMethod::Card),
            Self::Wallet(_) => Some(common_enums::PaymentMethod::Wallet),
            Self::MandatePayment => None,
        }
    }
}

impl From<CardIssuer> for CardNetwork {
    fn from(issuer: CardIssuer) -> Self {
        match issuer {
            CardIssuer::AmericanExpress => Self::AmericanExpress,
            CardIssuer::Master => Self::Mastercard,
            CardIssuer::Maestro => Self::Maestro,
            CardIssuer::Visa => Self::Visa,
            CardIssuer::Discover => Self::Discover,
            CardIssuer::DinersClub => Self::DinersClub,
            CardIssuer::JCB => Self::JCB,
            CardIssuer::UnionPay => Self::UnionPay,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn card(number: &str, month: &str, year: &str) -> Card {
        Card {
            card_number: cards::CardNumber::from_str(number).expect("valid card number"),
            card_exp_month: Secret::new(month.to_string()),
            card_exp_year: Secret::new(year.to_string()),
            card_cvc: Secret::new("123".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn expiry_is_rendered_as_mmyy() {
        let card = card("4929000000006", "3", "2030");
        assert_eq!(card.get_expiry_date_as_mmyy().expect("expiry").peek(), "0330");
        assert_eq!(card.get_expiry_date_as_yymm().expect("expiry").peek(), "3003");
        assert_eq!(card.get_expiry_year_4_digit().peek(), "2030");
    }

    #[test]
    fn network_is_inferred_from_the_number() {
        assert_eq!(
            card("4929000000006", "12", "30").get_card_network().expect("network"),
            CardNetwork::Visa
        );
        assert_eq!(
            card("374200000000004", "12", "30")
                .get_card_network()
                .expect("network"),
            CardNetwork::AmericanExpress
        );
    }

    #[test]
    fn explicit_network_wins() {
        let mut card = card("4929000000006", "12", "30");
        card.card_network = Some(CardNetwork::Maestro);
        assert_eq!(card.get_card_network().expect("network"), CardNetwork::Maestro);
    }
}
