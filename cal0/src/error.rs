use thiserror::Error;

use crate::asn1::DerError;

/**
    Errors raised while recovering SSL credentials from a CAL0 blob.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Cal0Error {
    // ── CAL0 container ────────────────────────────────────────────────
    #[error("invalid CAL0 data: {0}")]
    InvalidFormat(String),

    // ── Keys / KEK ────────────────────────────────────────────────────
    #[error("invalid key length {0}, expected 16 bytes")]
    InvalidKey(usize),
    #[error("{0} failed checksum verification")]
    UntrustedKey(String),
    #[error("key '{0}' not found in keys file")]
    KeyNotFound(String),
    #[error("malformed keys file at line {line}: {reason}")]
    InvalidKeyFile { line: usize, reason: String },

    // ── Certificate ───────────────────────────────────────────────────
    #[error("unsupported public key algorithm {0}")]
    UnsupportedAlgorithm(String),
    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    // ── RSA key recovery ──────────────────────────────────────────────
    #[error("decrypted private exponent does not match the certificate public key")]
    KeyMismatch,
    #[error("could not factor RSA modulus: {0}")]
    FactorizationError(String),
}

impl From<DerError> for Cal0Error {
    fn from(e: DerError) -> Self {
        Self::MalformedCertificate(e.to_string())
    }
}

/**
    Type alias for results that may return a [`Cal0Error`].
*/
pub type Cal0Result<T> = std::result::Result<T, Cal0Error>;
