use crate::asn1::{DerReader, tag};
use crate::constants::RSA_ENCRYPTION_OID;
use crate::crypto::rsa::RsaPublicKey;
use crate::error::{Cal0Error, Cal0Result};

/**
    Pull the RSA public key out of a DER X.509 certificate.

      Certificate ::= SEQUENCE {
          tbsCertificate       TBSCertificate,
          signatureAlgorithm   AlgorithmIdentifier,
          signatureValue       BIT STRING }

      TBSCertificate ::= SEQUENCE {
          version         [0]  EXPLICIT Version DEFAULT v1,
          serialNumber         CertificateSerialNumber,
          signature            AlgorithmIdentifier,
          issuer               Name,
          validity             Validity,
          subject              Name,
          subjectPublicKeyInfo SubjectPublicKeyInfo,
          ... }

    Only the SubjectPublicKeyInfo is interpreted; its algorithm must be
    rsaEncryption and its key an `RSAPublicKey ::= SEQUENCE { n, e }`.
    Nothing after it (extensions, signature) is read.
*/
pub fn extract_public_key(cert_der: &[u8]) -> Cal0Result<RsaPublicKey> {
    let mut cert = DerReader::new(cert_der).enter_sequence()?;
    let mut tbs = cert.enter_sequence()?;

    // v1 certificates omit the version
    if tbs.peek_tag() == Some(tag::CONTEXT_0) {
        tbs.skip()?;
    }
    // serialNumber, signature, issuer, validity, subject
    for _ in 0..5 {
        tbs.skip()?;
    }

    let mut spki = tbs.enter_sequence()?;
    let mut algorithm = spki.enter_sequence()?;
    let oid = algorithm.read_oid()?;
    if oid != RSA_ENCRYPTION_OID {
        return Err(Cal0Error::UnsupportedAlgorithm(oid));
    }

    let key_bits = spki.read_bit_string()?;
    let mut rsa_key = DerReader::new(key_bits).enter_sequence()?;
    let n = rsa_key.read_integer()?;
    let e = rsa_key.read_integer()?;

    let key = RsaPublicKey::new(n, e);
    log::debug!(
        "certificate public key: {} bit modulus, exponent {}",
        key.bits(),
        key.e()
    );
    Ok(key)
}
