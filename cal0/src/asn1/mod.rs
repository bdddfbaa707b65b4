/*!
    Minimal ASN.1 DER codec.

    Covers the subset needed to pull an RSA public key out of an X.509
    certificate and to emit a PKCS#1 RSAPrivateKey:

    - Reading: SEQUENCE (enter), INTEGER, OBJECT IDENTIFIER, BIT STRING,
      OCTET STRING, NULL, and skipping any other element.
    - Writing: SEQUENCE, INTEGER, NULL.

    Only low-tag-number identifiers (a single identifier octet) and definite
    lengths are accepted, which is all DER allows for these structures.
*/

mod reader;
mod writer;

use thiserror::Error;

pub use self::reader::DerReader;
pub use self::writer::DerWriter;

pub mod tag {
    pub const INTEGER: u8 = 0x02;
    pub const BIT_STRING: u8 = 0x03;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    pub const SEQUENCE: u8 = 0x30;
    /// `[0] EXPLICIT`, used for the X.509 version field.
    pub const CONTEXT_0: u8 = 0xA0;
}

/**
    Structural DER decoding failures.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerError {
    #[error("unexpected end of DER data")]
    UnexpectedEof,
    #[error("expected tag 0x{expected:02x}, found 0x{actual:02x}")]
    UnexpectedTag { expected: u8, actual: u8 },
    #[error("invalid DER length")]
    InvalidLength,
    #[error("unsupported multi-byte tag 0x{0:02x}")]
    UnsupportedTag(u8),
    #[error("invalid INTEGER encoding")]
    InvalidInteger,
    #[error("invalid OBJECT IDENTIFIER encoding")]
    InvalidObjectIdentifier,
    #[error("invalid BIT STRING encoding")]
    InvalidBitString,
}
