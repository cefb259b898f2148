use std::collections::HashMap;

use common_enums::{AttemptStatus, Currency};
use common_utils::{
    consts, ext_traits::ValueExt, request::Method, types::StringMajorUnit, Email, PeekInterface,
    Secret,
};
use domain_types::{
    connector_flow::{Authorize, CompleteAuthorize},
    connector_types::{
        PaymentFlowData, PaymentsAuthorizeData, PaymentsCompleteAuthorizeData,
        PaymentsResponseData, RedirectDetailsResponse, ResponseId,
    },
    errors::ConnectorError,
    payment_method_data::PaymentMethodData,
    router_data::{ConnectorAuthType, ErrorResponse},
    router_data_v2::RouterDataV2,
    router_response_types::RedirectForm,
};
use error_stack::ResultExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    connectors::sagepay::{
        constants::{self, fields, services},
        crypt,
        notification::get_completion_status,
        service_url,
        transformers::{
            get_description, split_key_value_pairs, Apply3DSecure, ApplyAvsCv2,
            ProtocolVersion, SagepayCustomerAddresses, SagepayMetadata, SagepayRouterData,
            SagepayStatus, SagepayStatusDetail, SendEmail, TransactionReference, TxType,
        },
    },
    utils,
};

type Error = error_stack::Report<ConnectorError>;

const CONNECTOR_NAME: &str = "sagepayform";

/// The vendor name plus the password the `Crypt` field is encrypted with
#[derive(Debug, Clone)]
pub struct SagepayFormAuthType {
    pub vendor: Secret<String>,
    pub encryption_password: Secret<String>,
}

impl TryFrom<&ConnectorAuthType> for SagepayFormAuthType {
    type Error = Error;
    fn try_from(auth_type: &ConnectorAuthType) -> Result<Self, Self::Error> {
        match auth_type {
            ConnectorAuthType::BodyKey { api_key, key1 } => Ok(Self {
                vendor: api_key.to_owned(),
                encryption_password: key1.to_owned(),
            }),
            _ => Err(ConnectorError::FailedToObtainAuthType.into()),
        }
    }
}

/// Everything the gateway needs to show its payment pages, travelling encrypted inside `Crypt`
#[derive(Debug, Serialize)]
pub struct SagepayFormCrypt {
    #[serde(rename = "VendorTxCode")]
    pub vendor_tx_code: String,
    #[serde(rename = "Amount")]
    pub amount: StringMajorUnit,
    #[serde(rename = "Currency")]
    pub currency: Currency,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "SuccessURL")]
    pub success_url: String,
    #[serde(rename = "FailureURL")]
    pub failure_url: String,
    #[serde(rename = "CustomerName", skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<Secret<String>>,
    #[serde(rename = "CustomerEMail", skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<Email>,
    #[serde(rename = "VendorEMail", skip_serializing_if = "Option::is_none")]
    pub vendor_email: Option<String>,
    #[serde(rename = "SendEMail", skip_serializing_if = "Option::is_none")]
    pub send_email: Option<SendEmail>,
    #[serde(rename = "EmailMessage", skip_serializing_if = "Option::is_none")]
    pub email_message: Option<String>,
    #[serde(flatten)]
    pub addresses: SagepayCustomerAddresses,
    #[serde(rename = "AllowGiftAid", skip_serializing_if = "Option::is_none")]
    pub allow_gift_aid: Option<u8>,
    #[serde(rename = "ApplyAVSCV2")]
    pub apply_avs_cv2: ApplyAvsCv2,
    #[serde(rename = "Apply3DSecure")]
    pub apply_3d_secure: Apply3DSecure,
    #[serde(rename = "ReferrerID", skip_serializing_if = "Option::is_none")]
    pub referrer_id: Option<String>,
    #[serde(rename = "VendorData", skip_serializing_if = "Option::is_none")]
    pub vendor_data: Option<String>,
}

impl
    TryFrom<
        SagepayRouterData<
            &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        >,
    > for SagepayFormCrypt
{
    type Error = Error;
    fn try_from(
        item: SagepayRouterData<
            &RouterDataV2<Authorize, PaymentFlowData, PaymentsAuthorizeData, PaymentsResponseData>,
        >,
    ) -> Result<Self, Self::Error> {
        let router_data = item.router_data;
        let request = &router_data.request;
        let common_data = &router_data.resource_common_data;

        match request.payment_method_data {
            PaymentMethodData::Card(_) => (),
            PaymentMethodData::Wallet(_)
            | PaymentMethodData::CardToken(_)
            | PaymentMethodData::MandatePayment => Err(ConnectorError::NotImplemented(
                utils::get_unimplemented_payment_method_error_message(CONNECTOR_NAME),
            ))?,
        }

        let metadata = SagepayMetadata::from_payment_flow_data(common_data)?;
        let allow_gift_aid = metadata.get_allow_gift_aid();
        let apply_3d_secure = metadata.get_apply_3d_secure(common_data.auth_type);
        let success_url = request.get_complete_authorize_url()?;
        Ok(Self {
            vendor_tx_code: common_data.connector_request_reference_id.clone(),
            amount: item.amount,
            currency: request.currency,
            description: get_description(
                common_data.description.as_deref(),
                constants::DEFAULT_DESCRIPTION,
            ),
            failure_url: success_url.clone(),
            success_url,
            customer_name: common_data.get_optional_billing_full_name(),
            customer_email: request
                .get_optional_email()
                .or(common_data.get_optional_billing_email()),
            vendor_email: metadata.vendor_email,
            send_email: metadata.send_email,
            email_message: metadata.email_message,
            addresses: SagepayCustomerAddresses::try_from(common_data)?,
            allow_gift_aid,
            apply_avs_cv2: metadata.apply_avs_cv2.unwrap_or_default(),
            apply_3d_secure,
            referrer_id: metadata.referrer_id,
            vendor_data: metadata.vendor_data,
        })
    }
}

impl SagepayFormCrypt {
    /// `Key=Value` pairs joined by `&`, in declaration order and without URL encoding
    pub fn to_plain_text(&self) -> Result<String, Error> {
        let encoded = serde_urlencoded::to_string(self)
            .change_context(ConnectorError::RequestEncodingFailed)?;
        Ok(url::form_urlencoded::parse(encoded.as_bytes())
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&"))
    }

    pub fn encrypt(&self, password: &Secret<String>) -> Result<String, Error> {
        crypt::encrypt(&self.to_plain_text()?, password)
    }
}


/// Browser form that sends the shopper to the payment pages
pub fn build_registration_form(
    base_url: &str,
    protocol_version: ProtocolVersion,
    tx_type: TxType,
    vendor: &Secret<String>,
    crypt: String,
) -> Result<RedirectForm, Error> {
    Ok(RedirectForm::Form {
        endpoint: service_url(base_url, services::FORM_REGISTER),
        method: Method::Post,
        form_fields: HashMap::from([
            (
                fields::VPS_PROTOCOL.to_string(),
                get_wire_value(&protocol_version)?,
            ),
            (fields::TX_TYPE.to_string(), get_wire_value(&tx_type)?),
            (fields::VENDOR.to_string(), vendor.peek().clone()),
            (fields::CRYPT.to_string(), crypt),
        ]),
    })
}

fn get_wire_value<T: Serialize>(value: &T) -> Result<String, Error> {
    match serde_json::to_value(value).change_context(ConnectorError::RequestEncodingFailed)? {
        Value::String(value) => Ok(value),
        other => Ok(other.to_string()),
    }
}

/// Redirect answer for the Authorize flow. The reference only knows the `VendorTxCode` until
/// the shopper comes back.
pub fn get_registration_response(
    vendor_tx_code: &str,
    redirection_data: RedirectForm,
) -> Result<PaymentsResponseData, Error> {
    Ok(PaymentsResponseData::TransactionResponse {
        resource_id: ResponseId::ConnectorTransactionId(
            TransactionReference::new(vendor_tx_code.to_string()).encode()?,
        ),
        redirection_data: Some(Box::new(redirection_data)),
        connector_metadata: None,
        mandate_reference: None,
        network_txn_id: None,
        connector_response_reference_id: Some(vendor_tx_code.to_string()),
        incremental_authorization_allowed: None,
        status_code: 200,
    })
}

/// Decrypted `Crypt` the gateway appends to the success or failure URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagepayFormResult {
    #[serde(rename = "VendorTxCode")]
    pub vendor_tx_code: String,
    #[serde(rename = "VPSTxId")]
    pub vps_tx_id: Option<String>,
    #[serde(rename = "Status")]
    pub status: SagepayStatus,
    #[serde(rename = "StatusDetail")]
    pub status_detail: Option<String>,
    #[serde(rename = "TxAuthNo")]
    pub tx_auth_no: Option<String>,
    #[serde(rename = "Amount")]
    pub amount: Option<String>,
    #[serde(rename = "AVSCV2")]
    pub avs_cv2: Option<String>,
    #[serde(rename = "AddressResult")]
    pub address_result: Option<String>,
    #[serde(rename = "PostCodeResult")]
    pub post_code_result: Option<String>,
    #[serde(rename = "CV2Result")]
    pub cv2_result: Option<String>,
    #[serde(rename = "GiftAid")]
    pub gift_aid: Option<String>,
    #[serde(rename = "3DSecureStatus")]
    pub three_d_secure_status: Option<String>,
    #[serde(rename = "CardType")]
    pub card_type: Option<String>,
    #[serde(rename = "Last4Digits")]
    pub last_4_digits: Option<String>,
    #[serde(rename = "DeclineCode")]
    pub decline_code: Option<String>,
    #[serde(rename = "BankAuthCode")]
    pub bank_auth_code: Option<String>,
}

impl SagepayFormResult {
    /// Decrypts and parses a `Crypt` value; the pairs inside are `&` separated
    pub fn decode(encrypted: &str, password: &Secret<String>) -> Result<Self, Error> {
        Self::parse(&crypt::decrypt(encrypted, password)?)
    }

    pub fn parse(plain_text: &str) -> Result<Self, Error> {
        Value::Object(split_key_value_pairs(plain_text, '&'))
            .parse_value("SagepayFormResult")
            .change_context(ConnectorError::ResponseDeserializationFailed)
    }

    pub fn get_attempt_status(&self, is_auto_capture: bool) -> AttemptStatus {
        get_completion_status(&self.status, TxType::for_payment(is_auto_capture))
    }

    fn get_reference(&self) -> TransactionReference {
        TransactionReference {
            security_key: None,
            tx_auth_no: self.tx_auth_no.clone(),
            vps_tx_id: self.vps_tx_id.clone(),
            vendor_tx_code: self.vendor_tx_code.clone(),
        }
    }

    fn get_status_detail(&self) -> Option<SagepayStatusDetail> {
        self.status_detail.as_deref().map(SagepayStatusDetail::parse)
    }

    pub fn to_error_response(&self, attempt_status: AttemptStatus, http_code: u16) -> ErrorResponse {
        let detail = self.get_status_detail();
        ErrorResponse {
            code: detail
                .as_ref()
                .and_then(|detail| detail.code.clone())
                .unwrap_or_else(|| self.status.to_string()),
            message: detail
                .map(|detail| detail.message)
                .unwrap_or_else(|| consts::NO_ERROR_MESSAGE.to_string()),
            reason: self.status_detail.clone(),
            status_code: http_code,
            attempt_status: Some(attempt_status),
            connector_transaction_id: self.vps_tx_id.clone(),
            network_decline_code: self.decline_code.clone(),
            network_advice_code: None,
            network_error_message: None,
        }
    }

    /// A crypt encrypted with our password but naming another transaction is refused
    pub fn ensure_vendor_tx_code(&self, expected: &str) -> Result<(), Error> {
        if self.vendor_tx_code == expected {
            Ok(())
        } else {
            tracing::warn!(
                received = %self.vendor_tx_code,
                expected,
                "sagepay form result names another transaction"
            );
            Err(ConnectorError::SourceVerificationFailed)
                .attach_printable("VendorTxCode of the form result does not match the payment")
        }
    }

    pub fn get_outcome(
        &self,
        is_auto_capture: bool,
        http_code: u16,
    ) -> Result<(AttemptStatus, Result<PaymentsResponseData, ErrorResponse>), Error> {
        let status = self.get_attempt_status(is_auto_capture);
        if !self.status.is_success() {
            return Ok((status, Err(self.to_error_response(status, http_code))));
        }
        Ok((
            status,
            Ok(PaymentsResponseData::TransactionResponse {
                resource_id: ResponseId::ConnectorTransactionId(self.get_reference().encode()?),
                redirection_data: None,
                connector_metadata: None,
                mandate_reference: None,
                network_txn_id: None,
                connector_response_reference_id: Some(self.vendor_tx_code.clone()),
                incremental_authorization_allowed: None,
                status_code: http_code,
            }),
        ))
    }

    pub fn to_redirect_details(
        &self,
        is_auto_capture: bool,
    ) -> Result<RedirectDetailsResponse, Error> {
        let status = self.get_attempt_status(is_auto_capture);
        let detail = (!self.status.is_success())
            .then(|| self.get_status_detail())
            .flatten();
        Ok(RedirectDetailsResponse {
            resource_id: Some(ResponseId::ConnectorTransactionId(
                self.get_reference().encode()?,
            )),
            status: Some(status),
            response_minor_amount: None,
            response_currency: None,
            connector_response_reference_id: Some(self.vendor_tx_code.clone()),
            error_code: detail.as_ref().map(|detail| {
                detail
                    .code
                    .clone()
                    .unwrap_or_else(|| self.status.to_string())
            }),
            error_message: detail.map(|detail| detail.message),
            error_reason: (!self.status.is_success())
                .then(|| self.status_detail.clone())
                .flatten(),
            raw_connector_response: None,
        })
    }
}

/// The `crypt` query parameter of a URL query or form body, or the whole text when it is
/// already a bare crypt
pub fn extract_crypt(text: &str) -> Option<String> {
    let text = text.trim().trim_start_matches('?');
    if text.starts_with(crypt::CRYPT_PREFIX) {
        return Some(text.to_string());
    }
    utils::get_query_param(text, constants::FORM_CRYPT_PARAM)
        .or_else(|| utils::get_query_param(text, fields::CRYPT))
        .filter(|crypt| !crypt.is_empty())
}

/// Where the shopper's return carried the crypt: the query string first, then the payload
pub fn get_crypt_from_redirect(request: &PaymentsCompleteAuthorizeData) -> Result<String, Error> {
    let redirect_response = request.redirect_response.as_ref();
    redirect_response
        .and_then(|response| response.params.as_ref())
        .and_then(|params| extract_crypt(params.peek()))
        .or_else(|| {
            redirect_response
                .and_then(|response| response.payload.as_ref())
                .and_then(|payload| {
                    utils::get_string_ignore_case(payload.peek(), constants::FORM_CRYPT_PARAM)
                })
        })
        .ok_or(
            ConnectorError::MissingConnectorRedirectionPayload {
                field_name: constants::FORM_CRYPT_PARAM,
            }
            .into(),
        )
}

/// Completes the payment from the crypt the shopper came back with
pub fn complete_payment(
    router_data: &RouterDataV2<
        CompleteAuthorize,
        PaymentFlowData,
        PaymentsCompleteAuthorizeData,
        PaymentsResponseData,
    >,
) -> Result<
    RouterDataV2<
        CompleteAuthorize,
        PaymentFlowData,
        PaymentsCompleteAuthorizeData,
        PaymentsResponseData,
    >,
    Error,
> {
    let auth = SagepayFormAuthType::try_from(&router_data.connector_auth_type)?;
    let request = &router_data.request;
    let result = SagepayFormResult::decode(
        &get_crypt_from_redirect(request)?,
        &auth.encryption_password,
    )?;
    result.ensure_vendor_tx_code(
        &router_data
            .resource_common_data
            .connector_request_reference_id,
    )?;
    tracing::info!(
        vendor_tx_code = %result.vendor_tx_code,
        status = %result.status,
        "sagepay form result received"
    );

    let (status, response) = result.get_outcome(request.is_auto_capture()?, 200)?;
    Ok(RouterDataV2 {
        resource_common_data: PaymentFlowData {
            status,
            ..router_data.resource_common_data.clone()
        },
        response,
        ..router_data.clone()
    })
}
