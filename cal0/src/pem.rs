use data_encoding::BASE64;

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";

/**
    Wrap DER bytes in a PEM block.

    Every base64 line (64 columns, 48 input bytes) ends with a newline;
    the END line does not.
*/
pub fn encode(label: &str, der: &[u8]) -> String {
    let mut out = format!("-----BEGIN {label}-----\n");
    for chunk in der.chunks(48) {
        out.push_str(&BASE64.encode(chunk));
        out.push('\n');
    }
    out.push_str(&format!("-----END {label}-----"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CERT: &[u8] = include_bytes!("../testfiles/ssl_cert.der");
    const TEST_PEM: &str = include_str!("../testfiles/ssl.pem");

    #[test]
    fn certificate_block_matches_fixture() {
        let pem = encode(CERTIFICATE_LABEL, TEST_CERT);
        assert!(TEST_PEM.starts_with(&pem));
        assert_eq!(TEST_PEM.as_bytes()[pem.len()], b'\n');
    }

    #[test]
    fn line_layout() {
        let pem = encode("TEST", &[0xAB; 100]);
        let lines: Vec<&str> = pem.split('\n').collect();
        assert_eq!(lines[0], "-----BEGIN TEST-----");
        assert_eq!(lines[1].len(), 64);
        assert_eq!(lines[2].len(), 64);
        // 4 trailing bytes -> 8 base64 characters with padding
        assert_eq!(lines[3], "q6urqw==");
        assert_eq!(lines[4], "-----END TEST-----");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn exact_multiple_of_48() {
        let pem = encode("TEST", &[0u8; 96]);
        assert_eq!(pem.lines().count(), 4);
        assert!(!pem.ends_with('\n'));
    }

    #[test]
    fn empty_payload() {
        assert_eq!(encode("TEST", &[]), "-----BEGIN TEST-----\n-----END TEST-----");
    }
}
