//! Utilities for cryptographic algorithms
use error_stack::ResultExt;
use hyperswitch_masking::{ExposeInterface, Secret};

use crate::errors::{self, CustomResult};

/// Trait for cryptographically verifying a message against a signature
pub trait VerifySignature {
    /// Takes in a secret, the signature and the message and verifies the message
    /// against the signature
    fn verify_signature(
        &self,
        _secret: &[u8],
        _signature: &[u8],
        _msg: &[u8],
    ) -> CustomResult<bool, errors::CryptoError>;
}

/// Trait for cryptographically encoding a message
pub trait EncodeMessage {
    /// Takes in a secret and the message and encodes it, returning bytes
    fn encode_message(
        &self,
        _secret: &[u8],
        _msg: &[u8],
    ) -> CustomResult<Vec<u8>, errors::CryptoError>;
}

/// Trait for cryptographically decoding a message
pub trait DecodeMessage {
    /// Takes in a secret, an encoded messages and attempts to decode it, returning bytes
    fn decode_message(
        &self,
        _secret: &[u8],
        _msg: Secret<Vec<u8>>,
    ) -> CustomResult<Vec<u8>, errors::CryptoError>;
}

/// Trait for generating a digest
pub trait GenerateDigest {
    /// takes a message and creates a digest for it
    fn generate_digest(&self, message: &[u8]) -> CustomResult<Vec<u8>, errors::CryptoError>;
}

/// Represents no cryptographic algorithm.
/// Implements all crypto traits and acts like a Nop
#[derive(Debug)]
pub struct NoAlgorithm;

impl VerifySignature for NoAlgorithm {
    fn verify_signature(
        &self,
        _secret: &[u8],
        _signature: &[u8],
        _msg: &[u8],
    ) -> CustomResult<bool, errors::CryptoError> {
        Ok(true)
    }
}

impl EncodeMessage for NoAlgorithm {
    fn encode_message(
        &self,
        _secret: &[u8],
        msg: &[u8],
    ) -> CustomResult<Vec<u8>, errors::CryptoError> {
        Ok(msg.to_vec())
    }
}

impl DecodeMessage for NoAlgorithm {
    fn decode_message(
        &self,
        _secret: &[u8],
        msg: Secret<Vec<u8>>,
    ) -> CustomResult<Vec<u8>, errors::CryptoError> {
        Ok(msg.expose())
    }
}

/// MD5 hash function
#[derive(Debug)]
pub struct Md5;

impl GenerateDigest for Md5 {
    fn generate_digest(&self, message: &[u8]) -> CustomResult<Vec<u8>, errors::CryptoError> {
        let digest = md5::compute(message);
        Ok(digest.as_ref().to_vec())
    }
}

/// Compares the lower-case hex MD5 of `msg` with a hex `signature`, ignoring the case of the latter
impl VerifySignature for Md5 {
    fn verify_signature(
        &self,
        _secret: &[u8],
        signature: &[u8],
        msg: &[u8],
    ) -> CustomResult<bool, errors::CryptoError> {
        let hashed_digest = hex::encode(
            Self.generate_digest(msg)
                .change_context(errors::CryptoError::SignatureVerificationFailed)?,
        );
        Ok(hashed_digest.as_bytes().eq_ignore_ascii_case(signature))
    }
}

#[cfg(test)]
mod crypto_tests {
    use super::{DecodeMessage, EncodeMessage, GenerateDigest, NoAlgorithm, VerifySignature};

    #[test]
    fn test_md5_digest() {
        let message = "abc".as_bytes();
        assert_eq!(
            hex::encode(super::Md5.generate_digest(message).expect("Digest")),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }

    #[test]
    fn test_md5_verify_signature() {
        let right_signature = "900150983CD24FB0D6963F7D28E17F72".as_bytes();
        let wrong_signature = "900150983cd24fb0d6963f7d28e17f73".as_bytes();
        let data = "abc".as_bytes();

        let right_verified = super::Md5
            .verify_signature(&[], right_signature, data)
            .expect("Right signature verification result");
        assert!(right_verified);

        let wrong_verified = super::Md5
            .verify_signature(&[], wrong_signature, data)
            .expect("Wrong signature verification result");
        assert!(!wrong_verified);
    }

    #[test]
    fn test_no_algorithm_passes_data_through() {
        let encoded = NoAlgorithm
            .encode_message(b"key", b"payload")
            .expect("encode");
        let decoded = NoAlgorithm
            .decode_message(b"key", encoded.into())
            .expect("decode");
        assert_eq!(decoded, b"payload");
    }
}
