//! X.509 certificates in local PEM files
use crate::{Certificate, CertificateStatus, Error, InventoryProvider};
use chrono::{DateTime, Utc};

const CRT_EXTENSIONS: [&str; 3] = ["pem", "crt", "cer"];

pub struct X509Crt {
    subject: Option<String>,
    alt_names: Vec<String>,
    not_after: DateTime<Utc>,
}

/// Directory of PEM encoded certificates, one inventory entry per file
#[derive(Clone, Debug)]
pub struct PemDirInventory {
    dir: std::path::PathBuf,
}

impl X509Crt {
    /// Read leaf certificate from PEM encoded file
    pub fn from_pem_file<P: AsRef<std::path::Path>>(crt_pem_file: P) -> Result<Self, Error> {
        // Read file as binary
        let buf = std::fs::read(crt_pem_file)?;

        // Parse first PEM block, the leaf of a chain file
        let (_rem, pem) = x509_parser::pem::parse_x509_pem(&buf)?;

        Self::try_from(pem.contents.as_slice())
    }

    /// Subject common name, or first DNS SubjectAltName
    pub fn domain_name<'a>(&'a self) -> Option<&'a str> {
        self.subject
            .as_deref()
            .or_else(|| self.alt_names.first().map(|n| n.as_str()))
    }

    pub fn alt_names<'a>(&'a self) -> impl Iterator<Item = &'a str> {
        self.alt_names.iter().map(|n| n.as_str())
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }
}

impl TryFrom<&[u8]> for X509Crt {
    type Error = Error;

    /// Parse DER certificate
    fn try_from(der_bytes: &[u8]) -> Result<Self, Self::Error> {
        use x509_parser::{certificate::X509Certificate, error::X509Error, nom, prelude::FromDer};

        let (_rem, crt) = X509Certificate::from_der(der_bytes)?;

        // get subject common name, if any
        let subject = match crt.subject().iter_common_name().next() {
            Some(cn) => Some(
                cn.as_str()
                    .map_err(|e| nom::Err::Error(e))?
                    .to_ascii_lowercase(),
            ),
            None => None,
        };

        // Parse SubjectAltName extension
        let mut alt_names = Vec::<String>::new();
        for ext in crt.extensions() {
            use x509_parser::extensions::{GeneralName, ParsedExtension};
            if let ParsedExtension::SubjectAlternativeName(alt_name_ext) = ext.parsed_extension() {
                for alt_name in &alt_name_ext.general_names {
                    if let GeneralName::DNSName(dns_name) = alt_name {
                        alt_names.push(dns_name.to_ascii_lowercase());
                    }
                }
            }
        }

        let not_after = DateTime::<Utc>::from_timestamp(crt.validity().not_after.timestamp(), 0)
            .ok_or(nom::Err::Error(X509Error::InvalidDate))?;

        Ok(Self {
            subject,
            alt_names,
            not_after,
        })
    }
}

impl PemDirInventory {
    pub fn new<P: Into<std::path::PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn is_crt_file(path: &std::path::Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| CRT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl InventoryProvider for PemDirInventory {
    async fn list_certificates(&self) -> Result<Vec<Certificate>, Error> {
        let mut paths = std::fs::read_dir(&self.dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        paths.retain(|path| Self::is_crt_file(path));
        paths.sort();

        let now = Utc::now();
        paths
            .iter()
            .map(|path| -> Result<Certificate, Error> {
                let crt = X509Crt::from_pem_file(path)?;
                let status = if crt.not_after() < now {
                    CertificateStatus::Expired
                } else {
                    CertificateStatus::Issued
                };
                tracing::debug!(path = %path.display(), %status, "certificate file loaded");

                Ok(Certificate::new(
                    path.display().to_string(),
                    crt.domain_name().unwrap_or_default(),
                    crt.not_after(),
                    status,
                ))
            })
            .collect()
    }
}
