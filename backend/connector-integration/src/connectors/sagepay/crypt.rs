//! The Form integration's `Crypt` field: AES-128-CBC with PKCS#7 padding, the encryption
//! password used as both key and IV, upper-case hex with a leading `@`.

use aes::Aes128;
use cbc::{
    cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit},
    Decryptor, Encryptor,
};
use common_utils::{
    crypto::{DecodeMessage, EncodeMessage},
    errors::{CryptoError, CustomResult},
    ExposeInterface, Secret,
};
use domain_types::errors::ConnectorError;
use error_stack::ResultExt;

pub const CRYPT_PREFIX: char = '@';
const AES_128_KEY_LENGTH: usize = 16;
const AES_BLOCK_SIZE: usize = 16;

type Aes128CbcEnc = Encryptor<Aes128>;
type Aes128CbcDec = Decryptor<Aes128>;

fn get_key(password: &[u8]) -> CustomResult<[u8; AES_128_KEY_LENGTH], CryptoError> {
    <[u8; AES_128_KEY_LENGTH]>::try_from(password)
        .map_err(|_| error_stack::report!(CryptoError::InvalidKeyLength))
        .attach_printable_lazy(|| {
            format!(
                "encryption password must be {AES_128_KEY_LENGTH} bytes, got {}",
                password.len()
            )
        })
}

#[derive(Debug)]
pub struct SagepayCrypt;

impl EncodeMessage for SagepayCrypt {
    /// Returns the `@`-prefixed upper-case hex ciphertext
    fn encode_message(&self, secret: &[u8], msg: &[u8]) -> CustomResult<Vec<u8>, CryptoError> {
        let key = get_key(secret)?;
        let encryptor = Aes128CbcEnc::new(&key.into(), &key.into());

        let mut buffer = Vec::with_capacity(msg.len() + AES_BLOCK_SIZE);
        buffer.extend_from_slice(msg);
        buffer.resize(msg.len() + AES_BLOCK_SIZE, 0);
        let encrypted_len = encryptor
            .encrypt_padded_mut::<Pkcs7>(&mut buffer, msg.len())
            .map_err(|_| error_stack::report!(CryptoError::EncodingFailed))?
            .len();
        buffer.truncate(encrypted_len);

        Ok(format!("{CRYPT_PREFIX}{}", hex::encode_upper(buffer)).into_bytes())
    }
}

impl DecodeMessage for SagepayCrypt {
    /// Accepts the hex in either case, with or without the `@`
    fn decode_message(
        &self,
        secret: &[u8],
        msg: Secret<Vec<u8>>,
    ) -> CustomResult<Vec<u8>, CryptoError> {
        let key = get_key(secret)?;
        let msg = msg.expose();
        let hex_text = std::str::from_utf8(&msg)
            .change_context(CryptoError::DecodingFailed)?
            .trim();
        let hex_text = hex_text.strip_prefix(CRYPT_PREFIX).unwrap_or(hex_text);
        let mut buffer = hex::decode(hex_text)
            .change_context(CryptoError::DecodingFailed)
            .attach_printable("crypt is not hex encoded")?;

        let decryptor = Aes128CbcDec::new(&key.into(), &key.into());
        let decrypted_len = decryptor
            .decrypt_padded_mut::<Pkcs7>(&mut buffer)
            .map_err(|_| error_stack::report!(CryptoError::DecodingFailed))
            .attach_printable("wrong encryption password or corrupted crypt")?
            .len();
        buffer.truncate(decrypted_len);
        Ok(buffer)
    }
}

pub fn encrypt(plain_text: &str, password: &Secret<String>) -> CustomResult<String, ConnectorError> {
    let encoded = SagepayCrypt
        .encode_message(password.clone().expose().as_bytes(), plain_text.as_bytes())
        .change_context(ConnectorError::RequestEncodingFailedWithReason(
            "failed to encrypt the form crypt".to_string(),
        ))?;
    String::from_utf8(encoded).change_context(ConnectorError::RequestEncodingFailed)
}

pub fn decrypt(crypt: &str, password: &Secret<String>) -> CustomResult<String, ConnectorError> {
    let decoded = SagepayCrypt
        .decode_message(
            password.clone().expose().as_bytes(),
            Secret::new(crypt.as_bytes().to_vec()),
        )
        .change_context(ConnectorError::DecodingFailed)?;
    String::from_utf8(decoded).change_context(ConnectorError::DecodingFailed)
}
