//! PayPal transmission signature verification.
//!
//! PayPal signs the canonical message with SHA256withRSA (RSASSA-PKCS1-v1_5)
//! using the private key behind the certificate advertised in the
//! `paypal-cert-url` header. Verification extracts the RSA public key from
//! that certificate and checks the base64-decoded signature.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha2::Sha256;
use thiserror::Error;
use x509_cert::der::{DecodePem, Encode};
use x509_cert::Certificate;

use super::canonical::CanonicalMessage;

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";

/// Reasons a signature fails to verify.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature is not valid base64")]
    InvalidEncoding,

    #[error("certificate could not be parsed: {0}")]
    InvalidCertificate(String),

    #[error("certificate is not valid yet")]
    CertificateNotYetValid,

    #[error("certificate has expired")]
    CertificateExpired,

    #[error("certificate key is not a usable RSA key: {0}")]
    UnsupportedKey(String),

    #[error("signature does not match message")]
    Mismatch,
}

/// Parses the leaf certificate out of a PEM document.
///
/// PayPal serves the signing certificate followed by its chain; only the
/// first block carries the signing key.
pub fn parse_leaf_certificate(pem: &str) -> Result<Certificate, SignatureError> {
    let start = pem
        .find(PEM_BEGIN)
        .ok_or_else(|| SignatureError::InvalidCertificate("no PEM certificate block".into()))?;
    let end = pem[start..]
        .find(PEM_END)
        .map(|offset| start + offset + PEM_END.len())
        .ok_or_else(|| SignatureError::InvalidCertificate("unterminated PEM block".into()))?;

    Certificate::from_pem(&pem[start..end])
        .map_err(|e| SignatureError::InvalidCertificate(e.to_string()))
}

/// Stateless SHA256withRSA verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureVerifier;

impl SignatureVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Returns true only if the signature verifies over the message.
    ///
    /// Never fails: malformed input and internal errors are logged and
    /// reported as `false`.
    pub fn verify(
        &self,
        message: &CanonicalMessage,
        signature_base64: &str,
        certificate_pem: &str,
    ) -> bool {
        match self.check(message, signature_base64, certificate_pem) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(reason = %e, "Signature verification failed");
                false
            }
        }
    }

    /// Verifies and reports why verification failed.
    pub fn check(
        &self,
        message: &CanonicalMessage,
        signature_base64: &str,
        certificate_pem: &str,
    ) -> Result<(), SignatureError> {
        self.check_at(message, signature_base64, certificate_pem, SystemTime::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock for the
    /// certificate validity window.
    pub fn check_at(
        &self,
        message: &CanonicalMessage,
        signature_base64: &str,
        certificate_pem: &str,
        now: SystemTime,
    ) -> Result<(), SignatureError> {
        let signature_bytes = STANDARD
            .decode(signature_base64.trim())
            .map_err(|_| SignatureError::InvalidEncoding)?;

        let certificate = parse_leaf_certificate(certificate_pem)?;
        check_validity(&certificate, now)?;

        let public_key = rsa_public_key(&certificate)?;
        let verifying_key = VerifyingKey::<Sha256>::new(public_key);

        let signature =
            Signature::try_from(signature_bytes.as_slice()).map_err(|_| SignatureError::Mismatch)?;

        verifying_key
            .verify(message.as_bytes(), &signature)
            .map_err(|_| SignatureError::Mismatch)
    }
}

fn check_validity(certificate: &Certificate, now: SystemTime) -> Result<(), SignatureError> {
    let now = now.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
    let validity = &certificate.tbs_certificate.validity;

    if now < validity.not_before.to_unix_duration() {
        return Err(SignatureError::CertificateNotYetValid);
    }
    if now > validity.not_after.to_unix_duration() {
        return Err(SignatureError::CertificateExpired);
    }
    Ok(())
}

fn rsa_public_key(certificate: &Certificate) -> Result<RsaPublicKey, SignatureError> {
    let spki_der = certificate
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| SignatureError::InvalidCertificate(e.to_string()))?;

    RsaPublicKey::from_public_key_der(&spki_der)
        .map_err(|e| SignatureError::UnsupportedKey(e.to_string()))
}

/// PEM fixtures shared by unit tests across the crate.
#[cfg(test)]
pub mod fixtures {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use rsa::pkcs1v15::SigningKey;
    use rsa::pkcs8::DecodePrivateKey;
    use rsa::signature::{SignatureEncoding, Signer};
    use rsa::RsaPrivateKey;
    use sha2::Sha256;

    pub const SIGNING_CERT: &str =
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/signing_cert.pem"));
    pub const SIGNING_KEY: &str =
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/signing_key.pem"));
    pub const OTHER_CERT: &str =
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/other_cert.pem"));
    pub const EXPIRED_CERT: &str =
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/expired_cert.pem"));
    pub const EXPIRED_KEY: &str =
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/expired_key.pem"));

    /// Signs `message` with the given PKCS#8 key and returns base64.
    pub fn sign_with(private_key_pem: &str, message: &str) -> String {
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem).unwrap();
        let signing_key = SigningKey::<Sha256>::new(private_key);
        STANDARD.encode(signing_key.sign(message.as_bytes()).to_bytes())
    }

    /// Signs `message` with the key behind [`SIGNING_CERT`].
    pub fn sign(message: &str) -> String {
        sign_with(SIGNING_KEY, message)
    }
}
