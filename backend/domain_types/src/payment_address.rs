use common_enums::CountryAlpha2;
use common_utils::{pii::Email, PeekInterface, Secret};

#[derive(Default, Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct Address {
    /// Provide the address details
    pub address: Option<AddressDetails>,

    pub phone: Option<PhoneDetails>,

    pub email: Option<Email>,
}

impl Address {
    /// Unify the address, giving priority to `self` when details are present in both
    pub fn unify_address(self, other: Option<&Self>) -> Self {
        let other_address_details = other.and_then(|address| address.address.as_ref());
        Self {
            address: self
                .address
                .map(|address| address.unify_address_details(other_address_details))
                .or(other_address_details.cloned()),
            email: self.email.or(other.and_then(|other| other.email.clone())),
            phone: self.phone.or(other.and_then(|other| other.phone.clone())),
        }
    }
}

#[derive(Clone, Default, Debug, Eq, serde::Deserialize, serde::Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AddressDetails {
    /// The city, district, suburb, town, or village of the address.
    pub city: Option<Secret<String>>,

    /// The two-letter ISO 3166-1 alpha-2 country code (e.g., US, GB).
    pub country: Option<CountryAlpha2>,

    /// The first line of the street address or P.O. Box.
    pub line1: Option<Secret<String>>,

    /// The second line of the street address or P.O. Box (e.g., apartment, suite, unit, or building).
    pub line2: Option<Secret<String>>,

    /// The third line of the street address, if applicable.
    pub line3: Option<Secret<String>>,

    /// The zip/postal code for the address
    pub zip: Option<Secret<String>>,

    /// The address state
    pub state: Option<Secret<String>>,

    /// The first name for the address
    pub first_name: Option<Secret<String>>,

    /// The last name for the address
    pub last_name: Option<Secret<String>>,
}

impl AddressDetails {
    pub fn get_optional_full_name(&self) -> Option<Secret<String>> {
        match (self.first_name.as_ref(), self.last_name.as_ref()) {
            (Some(first_name), Some(last_name)) => Some(Secret::new(format!(
                "{} {}",
                first_name.peek(),
                last_name.peek()
            ))),
            (Some(name), None) | (None, Some(name)) => Some(name.to_owned()),
            _ => None,
        }
    }

    pub fn unify_address_details(self, other: Option<&Self>) -> Self {
        if let Some(other) = other {
            let (first_name, last_name) = if self
                .first_name
                .as_ref()
                .is_some_and(|first_name| !first_name.peek().trim().is_empty())
            {
                (self.first_name, self.last_name)
            } else {
                (other.first_name.clone(), other.last_name.clone())
            };

            Self {
                first_name,
                last_name,
                city: self.city.or(other.city.clone()),
                country: self.country.or(other.country),
                line1: self.line1.or(other.line1.clone()),
                line2: self.line2.or(other.line2.clone()),
                line3: self.line3.or(other.line3.clone()),
                zip: self.zip.or(other.zip.clone()),
                state: self.state.or(other.state.clone()),
            }
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PhoneDetails {
    /// The contact number
    pub number: Option<Secret<String>>,
    /// The country code attached to the number
    pub country_code: Option<String>,
}

impl PhoneDetails {
    pub fn get_number_with_country_code(&self) -> Option<Secret<String>> {
        self.number.as_ref().map(|number| match &self.country_code {
            Some(country_code) => Secret::new(format!("{}{}", country_code, number.peek())),
            None => number.clone(),
        })
    }
}

#[derive(Clone, Default, Debug)]
pub struct PaymentAddress {
    shipping: Option<Address>,
    billing: Option<Address>,
    unified_payment_method_billing: Option<Address>,
    payment_method_billing: Option<Address>,
}

impl PaymentAddress {
    pub fn new(
        shipping: Option<Address>,
        billing: Option<Address>,
        payment_method_billing: Option<Address>,
        should_unify_address: Option<bool>,
    ) -> Self {
        // billing -> .billing, this is the billing details passed in the root of payments request
        // payment_method_billing -> .payment_method_data.billing

        let unified_payment_method_billing = if should_unify_address.unwrap_or(true) {
            // Merge the billing details field from both `payment.billing` and `payment.payment_method_data.billing`
            // The unified payment_method_billing will be used as billing address and passed to the connector module
            // This unification is required in order to provide backwards compatibility
            // so that if `payment.billing` is passed it should be sent to the connector module
            // Unify the billing details with `payment_method_data.billing`
            payment_method_billing
                .as_ref()
                .map(|payment_method_billing| {
                    payment_method_billing
                        .clone()
                        .unify_address(billing.as_ref())
                })
                .or(billing.clone())
        } else {
            payment_method_billing.clone()
        };

        Self {
            shipping,
            billing,
            unified_payment_method_billing,
            payment_method_billing,
        }
    }

    pub fn get_shipping(&self) -> Option<&Address> {
        self.shipping.as_ref()
    }

    pub fn get_payment_method_billing(&self) -> Option<&Address> {
        self.unified_payment_method_billing.as_ref()
    }

    /// Unify the billing details from `payment_method_data.[payment_method_data].billing details`.
    pub fn unify_with_payment_method_data_billing(
        self,
        payment_method_data_billing: Option<Address>,
    ) -> Self {
        // Unify the billing details with `payment_method_data.billing_details`
        let unified_payment_method_billing = payment_method_data_billing
            .map(|payment_method_data_billing| {
                payment_method_data_billing.unify_address(self.get_payment_method_billing())
            })
            .or(self.get_payment_method_billing().cloned());

        Self {
            shipping: self.shipping,
            billing: self.billing,
            unified_payment_method_billing,
            payment_method_billing: self.payment_method_billing,
        }
    }

    pub fn get_request_payment_method_billing(&self) -> Option<&Address> {
        self.payment_method_billing.as_ref()
    }

    pub fn get_payment_billing(&self) -> Option<&Address> {
        self.billing.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(first_name: &str, city: Option<&str>) -> Address {
        Address {
            address: Some(AddressDetails {
                first_name: Some(Secret::new(first_name.to_string())),
                last_name: Some(Secret::new("Bloggs".to_string())),
                city: city.map(|city| Secret::new(city.to_string())),
                ..Default::default()
            }),
            phone: None,
            email: None,
        }
    }

    #[test]
    fn payment_method_billing_is_unified_with_payment_billing() {
        let payment_address = PaymentAddress::new(
            None,
            Some(address("Fred", Some("London"))),
            Some(address("Joe", None)),
            None,
        );
        let billing = payment_address
            .get_payment_method_billing()
            .and_then(|billing| billing.address.clone())
            .expect("unified billing");
        assert_eq!(billing.first_name.expect("first name").peek(), "Joe");
        assert_eq!(billing.city.expect("city").peek(), "London");
    }

    #[test]
    fn full_name_joins_first_and_last() {
        let details = address("Fred", None).address.expect("details");
        assert_eq!(
            details.get_optional_full_name().expect("name").peek(),
            "Fred Bloggs"
        );
    }
}
