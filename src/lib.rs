mod auditor;
mod certificate;
mod config;
mod inventory;
mod pem;
mod publisher;
mod sdk_config;

// re-exports
pub use auditor::{
    audit_message, report_message, AuditedCertificate, CertificateAuditor, Classification, Pass,
    RunResult,
};
pub use certificate::{Certificate, CertificateStatus};
pub use config::{AuditConfig, NotifyMode};
pub use inventory::{AcmInventory, InventoryProvider};
pub use pem::{PemDirInventory, X509Crt};
pub use publisher::{NotificationPublisher, SnsPublisher, StdoutPublisher};
pub use sdk_config::aws_config_from_env;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    TomlError(#[from] toml::de::Error),
    #[error(transparent)]
    CrtPemParseError(#[from] x509_parser::nom::Err<x509_parser::error::PEMError>),
    #[error(transparent)]
    CrtParseError(#[from] x509_parser::nom::Err<x509_parser::error::X509Error>),
    #[error(transparent)]
    AcmListCertificatesError(
        #[from]
        aws_sdk_acm::error::SdkError<
            aws_sdk_acm::operation::list_certificates::ListCertificatesError,
        >,
    ),
    #[error(transparent)]
    AcmDescribeCertificateError(
        #[from]
        aws_sdk_acm::error::SdkError<
            aws_sdk_acm::operation::describe_certificate::DescribeCertificateError,
        >,
    ),
    #[error(transparent)]
    SnsPublishError(
        #[from] aws_sdk_sns::error::SdkError<aws_sdk_sns::operation::publish::PublishError>,
    ),
    #[error("Invalid configuration {key}: {reason}")]
    Configuration { key: String, reason: String },
    #[error("Malformed inventory record: {0}")]
    MalformedInventory(String),
    #[error("Certificate inventory unavailable: {0}")]
    InventoryUnavailable(#[source] Box<Error>),
    #[error("{} notification(s) failed: {}", .failures.len(), PublishFailure::join(.failures))]
    PublishFailures {
        /// What the run did inspect and send before the failures
        result: RunResult,
        failures: Vec<PublishFailure>,
    },
}

/// One failed publish, remembered so the other pass can still run
#[derive(Debug)]
pub struct PublishFailure {
    pub pass: Pass,
    pub topic: String,
    pub source: Box<Error>,
}

impl PublishFailure {
    fn join(failures: &[PublishFailure]) -> String {
        failures
            .iter()
            .map(|f| format!("{} -> {}: {}", f.pass, f.topic, f.source))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Check certificates in the configured ACM region and notify SNS topics.
pub async fn check_certificates(config: &AuditConfig) -> Result<RunResult, Error> {
    let aws_sdk_config = aws_config_from_env(config.region()).await;

    let inventory = AcmInventory::new(&aws_sdk_config, config.statuses());
    let publisher = SnsPublisher::new(&aws_sdk_config);

    CertificateAuditor::new(config)
        .run(&inventory, &publisher)
        .await
}
