use hex_literal::hex;

/**
    Little-endian `u32` at offset 0 of every CAL0 blob ("CAL0" in ASCII).
*/
pub const CAL0_MAGIC: u32 = 810303811;

/**
    Byte offsets and lengths of the fields read from a CAL0 blob.
    All integers are little-endian.
*/
pub const SERIAL_NUMBER_OFFSET: usize = 0x250;
pub const SERIAL_NUMBER_LEN: usize = 0x0E;

pub const SSL_CERTIFICATE_SIZE_OFFSET: usize = 0xAD0;
pub const SSL_CERTIFICATE_OFFSET: usize = 0xAE0;

pub const ETICKET_CERTIFICATE_OFFSET: usize = 0x2A90;
pub const ETICKET_CERTIFICATE_LEN: usize = 0x240;

pub const DEVICE_ID_OFFSET: usize = 0x35E0;
pub const DEVICE_ID_LEN: usize = 0x08;

pub const SSL_KEY_COUNTER_OFFSET: usize = 0x3AE0;
pub const SSL_KEY_COUNTER_LEN: usize = 0x10;

pub const SSL_KEY_OFFSET: usize = 0x3AF0;
pub const SSL_KEY_LEN: usize = 0x120;

/**
    Smallest blob that holds every fixed-offset field.
*/
pub const CAL0_MIN_LEN: usize = SSL_KEY_OFFSET + SSL_KEY_LEN;

/**
    Length of the raw private exponent at the head of the decrypted key block.
    The remaining 0x20 bytes are padding.
*/
pub const PRIVATE_EXPONENT_LEN: usize = 0x100;

/**
    Name of the KEK entry in a keys file.
*/
pub const SSL_RSA_KEK_NAME: &str = "ssl_rsa_kek";

/**
    SHA-256 of the genuine `ssl_rsa_kek`.
*/
pub const SSL_RSA_KEK_SHA256: [u8; 32] = hex!(
    "02a3ccf14a9572947b40afa87ad8cdd3"
    "d3a39dccf5d7911cdaf78f369e788840"
);

/**
    rsaEncryption (PKCS #1), the only accepted SubjectPublicKeyInfo algorithm.
*/
pub const RSA_ENCRYPTION_OID: &str = "1.2.840.113549.1.1.1";

/**
    Modulus size of the device SSL key.
*/
pub const RSA_MODULUS_BITS: usize = 2048;

/**
    Value raised to D then E to confirm the exponent pair before factoring.
*/
pub const KEY_CHECK_PROBE: u64 = 0xDEAD_CAFE;

/**
    Random draws allowed before giving up on factoring the modulus.
    Each draw succeeds with probability at least 1/2 for a genuine key.
*/
pub const MAX_FACTOR_ATTEMPTS: usize = 4096;
