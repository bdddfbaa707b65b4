use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tempfile::NamedTempFile;

use cal0::Keyset;
use cal0::constants::SSL_RSA_KEK_SHA256;

/**
    Extract the device SSL credentials from a CAL0 blob.

    Writes the certificate followed by the PKCS#1 private key as PEM.
    Nothing is written unless every stage succeeds.
*/
#[derive(Args)]
pub struct ExtractCommand {
    /// Path to the decrypted CAL0 (PRODINFO) blob.
    cal0_path: PathBuf,

    /// Path to a keys file holding `ssl_rsa_kek`.
    keys_path: PathBuf,

    /// Output PEM path. Defaults to `<device id>.pem` in the current directory.
    #[arg(long)]
    ssl_path: Option<PathBuf>,

    /// Expected SHA-256 of `ssl_rsa_kek`, in hex. Defaults to the genuine key's digest.
    #[arg(long, value_parser = parse_sha256)]
    kek_sha256: Option<[u8; 32]>,
}

impl ExtractCommand {
    pub fn run(self) -> Result<()> {
        let blob = std::fs::read(&self.cal0_path)
            .with_context(|| format!("failed to read CAL0 file {}", self.cal0_path.display()))?;
        let keys_text = std::fs::read_to_string(&self.keys_path)
            .with_context(|| format!("failed to read keys file {}", self.keys_path.display()))?;

        let keys = Keyset::parse(&keys_text).context("failed to parse keys file")?;
        let expected = self.kek_sha256.unwrap_or(SSL_RSA_KEK_SHA256);
        let kek = keys
            .ssl_rsa_kek_with_digest(&expected)
            .context("failed to load SSL key-encryption key")?;

        let creds = cal0::extract(&blob, &kek).context("failed to extract SSL credentials")?;

        println!("Device ID: {}", creds.device_id);
        println!("Serial Number: {}", creds.serial_number);

        let out_path = self
            .ssl_path
            .unwrap_or_else(|| PathBuf::from(creds.default_file_name()));
        write_file(&out_path, creds.to_pem().as_bytes())?;
        println!(
            "Extracted SSL certificate and key successfully to {}",
            out_path.display()
        );

        Ok(())
    }
}

/**
    Write through a temporary file in the target directory, then rename it
    into place. A failed write leaves no file at `path`.
*/
fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .with_context(|| format!("failed to write {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn parse_sha256(s: &str) -> Result<[u8; 32], String> {
    let bytes = hex::decode(s.trim()).map_err(|e| format!("invalid hex: {e}"))?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| format!("expected 32 bytes, got {}", v.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_argument() {
        let digest = parse_sha256(
            "5c1e778e728dcdd80aca720d38b6936633b28ccd1d8af1f6695e649663528165",
        )
        .unwrap();
        assert_eq!(digest[0], 0x5c);
        assert_eq!(digest[31], 0x65);

        assert!(parse_sha256("5c1e").is_err());
        assert!(parse_sha256("zz").is_err());
    }

    #[test]
    fn write_file_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.pem");
        std::fs::write(&path, b"old").unwrap();

        write_file(&path, b"new contents").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new contents");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the target path makes the final rename fail
        let path = dir.path().join("device.pem");
        std::fs::create_dir(&path).unwrap();

        assert!(write_file(&path, b"contents").is_err());
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, ["device.pem"]);
        assert!(path.is_dir());
    }

    #[test]
    fn missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("device.pem");
        assert!(write_file(&path, b"contents").is_err());
        assert!(!path.exists());
    }
}
