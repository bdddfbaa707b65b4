use crate::constants::*;
use crate::error::{Cal0Error, Cal0Result};

/**
    Fields of a decrypted CAL0 (PRODINFO) blob needed to rebuild the
    device SSL credentials.

    Layout (all integers little-endian):
      [0x0000..0x0004]  magic (u32, 810303811)
      [0x0250..0x025E]  serial number (UTF-8)
      [0x0AD0..0x0AD4]  SSL certificate size (u32)
      [0x0AE0..]        SSL certificate (DER, `size` bytes)
      [0x2A90..0x2CD0]  RSA-2048 eTicket certificate
      [0x35E0..0x35E8]  device id
      [0x3AE0..0x3AF0]  AES-CTR counter for the SSL key (big-endian)
      [0x3AF0..0x3C10]  encrypted SSL private exponent + padding
*/
#[derive(Debug, Clone)]
pub struct Cal0 {
    pub serial_number: String,
    pub ssl_certificate: Vec<u8>,
    pub eticket_certificate: Vec<u8>,
    pub device_id: [u8; DEVICE_ID_LEN],
    pub counter_seed: [u8; SSL_KEY_COUNTER_LEN],
    pub encrypted_key_block: [u8; SSL_KEY_LEN],
}

impl Cal0 {
    /**
        Parse the fixed-offset fields out of a raw CAL0 blob.

        The magic is checked before anything else is read. Certificate
        contents are not validated here.
    */
    pub fn from_bytes(data: impl AsRef<[u8]>) -> Cal0Result<Self> {
        let data: &[u8] = data.as_ref();

        let magic = read_u32_le(data, 0).ok_or_else(|| format_err("blob too short for magic"))?;
        if magic != CAL0_MAGIC {
            return Err(format_err(&format!("bad magic 0x{magic:08x}")));
        }

        if data.len() < CAL0_MIN_LEN {
            return Err(format_err(&format!(
                "blob is {} bytes, expected at least {CAL0_MIN_LEN}",
                data.len()
            )));
        }

        let serial_number = field(data, SERIAL_NUMBER_OFFSET, SERIAL_NUMBER_LEN)?;
        let serial_number = std::str::from_utf8(serial_number)
            .map_err(|e| format_err(&format!("serial number is not UTF-8: {e}")))?
            .to_owned();

        // Bounded by the blob length only, not by the next field
        let cert_size = read_u32_le(data, SSL_CERTIFICATE_SIZE_OFFSET)
            .ok_or_else(|| format_err("truncated SSL certificate size"))?
            as usize;
        if cert_size == 0 {
            return Err(format_err("SSL certificate size is zero"));
        }
        let ssl_certificate = field(data, SSL_CERTIFICATE_OFFSET, cert_size)?.to_vec();

        let eticket_certificate =
            field(data, ETICKET_CERTIFICATE_OFFSET, ETICKET_CERTIFICATE_LEN)?.to_vec();

        let cal0 = Cal0 {
            serial_number,
            ssl_certificate,
            eticket_certificate,
            device_id: array(data, DEVICE_ID_OFFSET)?,
            counter_seed: array(data, SSL_KEY_COUNTER_OFFSET)?,
            encrypted_key_block: array(data, SSL_KEY_OFFSET)?,
        };
        log::debug!(
            "parsed CAL0: device {}, {} byte SSL certificate",
            cal0.device_id_hex(),
            cal0.ssl_certificate.len()
        );
        Ok(cal0)
    }

    /**
        Device id as lowercase hex, the form used in the output file name.
    */
    pub fn device_id_hex(&self) -> String {
        hex::encode(self.device_id)
    }
}

fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn field(data: &[u8], offset: usize, len: usize) -> Cal0Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            format_err(&format!(
                "field at 0x{offset:x} (+0x{len:x}) exceeds blob length 0x{:x}",
                data.len()
            ))
        })
}

fn array<const N: usize>(data: &[u8], offset: usize) -> Cal0Result<[u8; N]> {
    let bytes = field(data, offset, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

fn format_err(msg: &str) -> Cal0Error {
    Cal0Error::InvalidFormat(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const TEST_CAL0: &[u8] = include_bytes!("../testfiles/cal0.bin");
    const TEST_CERT: &[u8] = include_bytes!("../testfiles/ssl_cert.der");

    #[test]
    fn parse_test_blob() {
        let cal0 = Cal0::from_bytes(TEST_CAL0).expect("failed to parse test CAL0");
        assert_eq!(cal0.serial_number, "XAW10000000001");
        assert_eq!(cal0.ssl_certificate, TEST_CERT);
        assert_eq!(cal0.device_id, hex!("6265ca3b4c2d1e0f"));
        assert_eq!(cal0.device_id_hex(), "6265ca3b4c2d1e0f");
        assert_eq!(cal0.counter_seed, hex!("0123456789abcdef00000000fffffffe"));
        assert_eq!(
            cal0.encrypted_key_block[..],
            TEST_CAL0[SSL_KEY_OFFSET..SSL_KEY_OFFSET + SSL_KEY_LEN]
        );
    }

    #[test]
    fn eticket_certificate_region() {
        let cal0 = Cal0::from_bytes(TEST_CAL0).unwrap();
        assert_eq!(cal0.eticket_certificate.len(), ETICKET_CERTIFICATE_LEN);
        // Fixture fills the region with (i * 7 + 3) mod 256
        assert_eq!(cal0.eticket_certificate[0], 3);
        assert_eq!(cal0.eticket_certificate[1], 10);
        assert_eq!(cal0.eticket_certificate[0x23F], ((0x23F * 7 + 3) & 0xFF) as u8);
    }

    #[test]
    fn zero_magic() {
        let mut data = TEST_CAL0.to_vec();
        data[..4].copy_from_slice(&[0, 0, 0, 0]);
        let err = Cal0::from_bytes(&data).unwrap_err();
        assert!(matches!(err, Cal0Error::InvalidFormat(_)));
    }

    #[test]
    fn magic_checked_before_length() {
        // Too short for any field, but the magic is what gets reported
        let err = Cal0::from_bytes([0u8; 8]).unwrap_err();
        assert_eq!(err, Cal0Error::InvalidFormat("bad magic 0x00000000".into()));
    }

    #[test]
    fn empty_input() {
        let err = Cal0::from_bytes(b"").unwrap_err();
        assert!(matches!(err, Cal0Error::InvalidFormat(_)));
    }

    #[test]
    fn truncated_blob() {
        let err = Cal0::from_bytes(&TEST_CAL0[..CAL0_MIN_LEN - 1]).unwrap_err();
        assert!(matches!(err, Cal0Error::InvalidFormat(_)));
    }

    #[test]
    fn minimum_length_blob() {
        let cal0 = Cal0::from_bytes(&TEST_CAL0[..CAL0_MIN_LEN]).unwrap();
        assert_eq!(cal0.ssl_certificate, TEST_CERT);
    }

    #[test]
    fn zero_certificate_size() {
        let mut data = TEST_CAL0.to_vec();
        data[SSL_CERTIFICATE_SIZE_OFFSET..SSL_CERTIFICATE_SIZE_OFFSET + 4]
            .copy_from_slice(&0u32.to_le_bytes());
        let err = Cal0::from_bytes(&data).unwrap_err();
        assert!(matches!(err, Cal0Error::InvalidFormat(_)));
    }

    #[test]
    fn certificate_size_past_end() {
        let mut data = TEST_CAL0.to_vec();
        let too_big = (data.len() - SSL_CERTIFICATE_OFFSET + 1) as u32;
        data[SSL_CERTIFICATE_SIZE_OFFSET..SSL_CERTIFICATE_SIZE_OFFSET + 4]
            .copy_from_slice(&too_big.to_le_bytes());
        let err = Cal0::from_bytes(&data).unwrap_err();
        assert!(matches!(err, Cal0Error::InvalidFormat(_)));
    }

    #[test]
    fn certificate_size_up_to_end() {
        let mut data = TEST_CAL0.to_vec();
        let exact = (data.len() - SSL_CERTIFICATE_OFFSET) as u32;
        data[SSL_CERTIFICATE_SIZE_OFFSET..SSL_CERTIFICATE_SIZE_OFFSET + 4]
            .copy_from_slice(&exact.to_le_bytes());
        let cal0 = Cal0::from_bytes(&data).unwrap();
        assert_eq!(cal0.ssl_certificate.len(), exact as usize);
    }

    #[test]
    fn certificate_size_overflow() {
        let mut data = TEST_CAL0.to_vec();
        data[SSL_CERTIFICATE_SIZE_OFFSET..SSL_CERTIFICATE_SIZE_OFFSET + 4]
            .copy_from_slice(&u32::MAX.to_le_bytes());
        let err = Cal0::from_bytes(&data).unwrap_err();
        assert!(matches!(err, Cal0Error::InvalidFormat(_)));
    }

    #[test]
    fn serial_number_not_utf8() {
        let mut data = TEST_CAL0.to_vec();
        data[SERIAL_NUMBER_OFFSET] = 0xFF;
        let err = Cal0::from_bytes(&data).unwrap_err();
        assert!(matches!(err, Cal0Error::InvalidFormat(_)));
    }
}
