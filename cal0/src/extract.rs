use zeroize::Zeroizing;

use crate::certificate::extract_public_key;
use crate::constants::{PRIVATE_EXPONENT_LEN, RSA_MODULUS_BITS};
use crate::container::Cal0;
use crate::crypto::aes::aes_ctr_decrypt;
use crate::crypto::rsa::recover;
use crate::error::{Cal0Error, Cal0Result};
use crate::keys::Keyset;
use crate::pem;

/**
    Device SSL client credentials recovered from a CAL0 blob.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslCredentials {
    /// Lowercase hex of the 8-byte device id.
    pub device_id: String,
    pub serial_number: String,
    /// X.509 certificate, DER.
    pub certificate_der: Vec<u8>,
    /// PKCS#1 RSAPrivateKey, DER.
    pub private_key_der: Zeroizing<Vec<u8>>,
}

impl SslCredentials {
    /**
        Certificate block, a newline, then the private key block.
    */
    pub fn to_pem(&self) -> Zeroizing<String> {
        let mut out = Zeroizing::new(pem::encode(pem::CERTIFICATE_LABEL, &self.certificate_der));
        out.push('\n');
        out.push_str(&Zeroizing::new(pem::encode(
            pem::RSA_PRIVATE_KEY_LABEL,
            &self.private_key_der,
        )));
        out
    }

    /**
        `<device_id>.pem`
    */
    pub fn default_file_name(&self) -> String {
        format!("{}.pem", self.device_id)
    }
}

/**
    Recover the SSL certificate and full RSA private key from a CAL0 blob.

    The KEK is used as given; see [`extract_with_keyset`] for the checked
    variant. Stages run in order and the first failure is returned as is.
*/
pub fn extract(blob: &[u8], kek: &[u8]) -> Cal0Result<SslCredentials> {
    let cal0 = Cal0::from_bytes(blob)?;

    let plaintext = aes_ctr_decrypt(kek, &cal0.counter_seed, &cal0.encrypted_key_block)?;
    let d = &plaintext[..PRIVATE_EXPONENT_LEN];

    let public = extract_public_key(&cal0.ssl_certificate)?;
    if public.bits() != RSA_MODULUS_BITS {
        return Err(Cal0Error::UnsupportedAlgorithm(format!(
            "RSA-{}",
            public.bits()
        )));
    }

    let key = recover(&public, d)?;
    let private_key_der = key.to_pkcs1_der();

    log::debug!("recovered SSL key for device {}", cal0.device_id_hex());

    Ok(SslCredentials {
        device_id: cal0.device_id_hex(),
        serial_number: cal0.serial_number,
        certificate_der: cal0.ssl_certificate,
        private_key_der,
    })
}

/**
    [`extract`] with the `ssl_rsa_kek` taken from a keys file and checked
    against the genuine key digest before anything is decrypted.
*/
pub fn extract_with_keyset(blob: &[u8], keys: &Keyset) -> Cal0Result<SslCredentials> {
    let kek = Zeroizing::new(keys.ssl_rsa_kek()?);
    extract(blob, kek.as_slice())
}
