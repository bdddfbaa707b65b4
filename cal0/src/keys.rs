use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::constants::{SSL_RSA_KEK_NAME, SSL_RSA_KEK_SHA256};
use crate::error::{Cal0Error, Cal0Result};

/**
    Named keys loaded from a `name = hexvalue` keys file.
*/
#[derive(Default, Clone)]
pub struct Keyset {
    keys: BTreeMap<String, Zeroizing<Vec<u8>>>,
}

impl Keyset {
    /**
        Parse a keys file.

        Spaces and tabs are ignored anywhere on a line and blank lines are
        skipped. Every other line must be `name=hex` with both sides
        non-empty. A repeated name replaces the earlier value.
    */
    pub fn parse(text: &str) -> Cal0Result<Self> {
        let mut keys = BTreeMap::new();

        for (index, raw) in text.lines().enumerate() {
            let line: String = raw.chars().filter(|c| !matches!(c, ' ' | '\t' | '\r')).collect();
            if line.is_empty() {
                continue;
            }

            let line_err = |reason: &str| Cal0Error::InvalidKeyFile {
                line: index + 1,
                reason: reason.into(),
            };

            let mut parts = line.split('=');
            let (Some(name), Some(value), None) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(line_err("expected exactly one '='"));
            };
            if name.is_empty() {
                return Err(line_err("empty key name"));
            }
            if value.is_empty() {
                return Err(line_err("empty key value"));
            }

            let bytes = hex::decode(value)
                .map_err(|e| line_err(&format!("invalid hex value for '{name}': {e}")))?;
            keys.insert(name.to_owned(), Zeroizing::new(bytes));
        }

        log::debug!("loaded {} key(s)", keys.len());
        Ok(Self { keys })
    }

    pub fn get(&self, name: &str) -> Cal0Result<&[u8]> {
        self.keys
            .get(name)
            .map(|v| v.as_slice())
            .ok_or_else(|| Cal0Error::KeyNotFound(name.into()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /**
        Key names in sorted order.
    */
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /**
        The `ssl_rsa_kek`, checked against the known genuine key digest.
    */
    pub fn ssl_rsa_kek(&self) -> Cal0Result<[u8; 16]> {
        self.ssl_rsa_kek_with_digest(&SSL_RSA_KEK_SHA256)
    }

    /**
        The `ssl_rsa_kek`, checked against a caller-supplied digest.
    */
    pub fn ssl_rsa_kek_with_digest(&self, expected_sha256: &[u8; 32]) -> Cal0Result<[u8; 16]> {
        verify_kek(self.get(SSL_RSA_KEK_NAME)?, expected_sha256)
    }
}

impl std::fmt::Debug for Keyset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/**
    Check a 16-byte KEK against its expected SHA-256 digest.
*/
pub fn verify_kek(kek: &[u8], expected_sha256: &[u8; 32]) -> Cal0Result<[u8; 16]> {
    let kek: [u8; 16] = kek
        .try_into()
        .map_err(|_| Cal0Error::InvalidKey(kek.len()))?;

    let digest = Sha256::digest(kek);
    if digest.as_slice() != expected_sha256 {
        return Err(Cal0Error::UntrustedKey(SSL_RSA_KEK_NAME.into()));
    }
    Ok(kek)
}
