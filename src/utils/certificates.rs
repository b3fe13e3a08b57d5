use std::{fs, path::Path};

use x509_parser::{extensions::GeneralName, pem::parse_x509_pem};

use crate::errors::{ArtifactKind, UpdateError};

/// Certificate and private key bytes for one project, read fresh on every run.
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateArtifact {
    pub cert: Vec<u8>,
    pub key: Vec<u8>,
}

impl CertificateArtifact {
    /// Certificate PEM as text
    pub fn cert_pem(&self) -> String {
        String::from_utf8_lossy(&self.cert).into_owned()
    }

    /// Private key PEM as text
    pub fn key_pem(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }
}

impl std::fmt::Debug for CertificateArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateArtifact")
            .field("cert_len", &self.cert.len())
            .field("key_len", &self.key.len())
            .finish()
    }
}

/// Read the certificate and key files as raw bytes. No interpretation happens here.
pub fn load_artifact(cert_path: &Path, key_path: &Path) -> Result<CertificateArtifact, UpdateError> {
    let cert = fs::read(cert_path).map_err(|source| UpdateError::FileRead {
        artifact: ArtifactKind::Certificate,
        path: cert_path.to_path_buf(),
        source,
    })?;

    let key = fs::read(key_path).map_err(|source| UpdateError::FileRead {
        artifact: ArtifactKind::PrivateKey,
        path: key_path.to_path_buf(),
        source,
    })?;

    Ok(CertificateArtifact { cert, key })
}

/// DNS names from the Subject Alternative Name extension of the first PEM
/// certificate, in certificate order.
///
/// No deduplication and no filtering; a certificate without the extension
/// yields an empty list.
pub fn extract_dns_names(cert_pem: &[u8]) -> Result<Vec<String>, UpdateError> {
    let (_, pem) = parse_x509_pem(cert_pem)
        .map_err(|_| UpdateError::certificate_parse("failed to parse certificate PEM"))?;

    let cert = pem.parse_x509().map_err(|err| UpdateError::certificate_parse(err.to_string()))?;

    let san = cert
        .subject_alternative_name()
        .map_err(|err| UpdateError::certificate_parse(err.to_string()))?;

    let names = san
        .map(|ext| {
            ext.value
                .general_names
                .iter()
                .filter_map(|name| match name {
                    GeneralName::DNSName(dns) => Some(dns.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(names)
}
