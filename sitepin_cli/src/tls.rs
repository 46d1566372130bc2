use std::path::Path;

use anyhow::{Context, Result};

/// Builds an HTTP client that authenticates with the given client
/// certificate and private key (both PEM).
pub fn build_client(certificate: &Path, private_key: &Path) -> Result<reqwest::Client> {
    let mut pem = std::fs::read(certificate).with_context(|| {
        format!("failed to read client certificate {}", certificate.display())
    })?;
    let key = std::fs::read(private_key)
        .with_context(|| format!("failed to read private key {}", private_key.display()))?;
    pem.push(b'\n');
    pem.extend_from_slice(&key);

    let identity = reqwest::Identity::from_pem(&pem).with_context(|| {
        format!(
            "{} and {} do not form a valid PEM certificate and key",
            certificate.display(),
            private_key.display()
        )
    })?;

    reqwest::Client::builder()
        .use_rustls_tls()
        .identity(identity)
        .build()
        .context("failed to build HTTP client")
}
