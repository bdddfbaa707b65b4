use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use cal0::{Cal0, extract_public_key};

/**
    Print the CAL0 fields used for SSL key recovery.
*/
#[derive(Args)]
pub struct InspectCommand {
    /// Path to the decrypted CAL0 (PRODINFO) blob.
    cal0_path: PathBuf,
}

impl InspectCommand {
    pub fn run(self) -> Result<()> {
        let data = std::fs::read(&self.cal0_path)
            .with_context(|| format!("failed to read CAL0 file {}", self.cal0_path.display()))?;
        let cal0 = Cal0::from_bytes(&data).context("failed to parse CAL0")?;
        let public = extract_public_key(&cal0.ssl_certificate)
            .context("failed to read SSL certificate public key")?;

        println!("Device ID:       {}", cal0.device_id_hex());
        println!("Serial Number:   {}", cal0.serial_number);
        println!("SSL Certificate: {} bytes", cal0.ssl_certificate.len());
        println!("RSA Modulus:     {} bits", public.bits());
        println!("RSA Exponent:    {}", public.e());
        println!("eTicket Cert:    {} bytes", cal0.eticket_certificate.len());

        Ok(())
    }
}
