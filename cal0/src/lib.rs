#![allow(clippy::doc_overindented_list_items)]

mod certificate;
mod container;
mod crypto;
mod error;
mod extract;
mod keys;

pub mod asn1;
pub mod constants;
pub mod pem;

pub use self::certificate::extract_public_key;
pub use self::container::Cal0;
pub use self::crypto::aes::aes_ctr_decrypt;
pub use self::crypto::rsa::{RsaPrivateKeyMaterial, RsaPublicKey, recover, recover_with_rng};
pub use self::error::{Cal0Error, Cal0Result};
pub use self::extract::{SslCredentials, extract, extract_with_keyset};
pub use self::keys::{Keyset, verify_kek};

// Big integers in the public API
pub use num_bigint::BigUint;
