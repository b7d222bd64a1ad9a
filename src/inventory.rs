use crate::{Certificate, CertificateStatus, Error};
use chrono::{DateTime, Utc};

/// Max DescribeCertificate calls in flight
const DESCRIBE_CONCURRENCY: usize = 8;

/// Source of certificates, read-only.
/// Region or location is bound when the provider is built.
#[async_trait::async_trait]
pub trait InventoryProvider: Send + Sync {
    async fn list_certificates(&self) -> Result<Vec<Certificate>, Error>;
}

/// AWS Certificate Manager inventory
#[derive(Clone, Debug)]
pub struct AcmInventory {
    acm_client: aws_sdk_acm::Client,
    statuses: Vec<CertificateStatus>,
}

impl AcmInventory {
    pub fn new(aws_sdk_config: &aws_config::SdkConfig, statuses: &[CertificateStatus]) -> Self {
        Self {
            acm_client: aws_sdk_acm::Client::new(aws_sdk_config),
            statuses: statuses.to_vec(),
        }
    }

    /// List ARNs of all certificates in the requested states
    async fn list_certificate_arns(&self) -> Result<Vec<String>, Error> {
        let statuses = self
            .statuses
            .iter()
            .map(|s| aws_sdk_acm::types::CertificateStatus::from(s.as_str()))
            .collect::<Vec<_>>();

        // Call ACM ListCertificates API, all pages
        let pages = self
            .acm_client
            .list_certificates()
            .set_certificate_statuses(Some(statuses))
            .includes(all_key_types())
            .into_paginator()
            .send()
            .try_collect()
            .await?;

        pages
            .iter()
            .flat_map(|page| page.certificate_summary_list())
            .map(|summary| {
                summary
                    .certificate_arn()
                    .map(|arn| arn.to_string())
                    .ok_or_else(|| Error::MalformedInventory("summary without ARN".to_string()))
            })
            .collect()
    }

    /// Call ACM DescribeCertificate API, None if the certificate has no NotAfter yet
    async fn describe_certificate(&self, arn: String) -> Result<Option<Certificate>, Error> {
        let resp = self
            .acm_client
            .describe_certificate()
            .certificate_arn(arn.as_str())
            .send()
            .await?;

        let detail = resp
            .certificate()
            .ok_or_else(|| Error::MalformedInventory(format!("no detail for {}", arn)))?;

        let Some(not_after) = detail.not_after() else {
            tracing::debug!(arn = arn.as_str(), "certificate without NotAfter skipped");
            return Ok(None);
        };
        let not_after =
            DateTime::<Utc>::from_timestamp(not_after.secs(), not_after.subsec_nanos())
                .ok_or_else(|| {
                    Error::MalformedInventory(format!("NotAfter out of range for {}", arn))
                })?;

        let status = detail
            .status()
            .map(|s| CertificateStatus::from(s.as_str()))
            .unwrap_or_else(|| CertificateStatus::Unknown(String::new()));
        tracing::debug!(arn = arn.as_str(), %status, "certificate described");

        Ok(Some(Certificate::new(
            detail.certificate_arn().unwrap_or(arn.as_str()),
            detail.domain_name().unwrap_or_default(),
            not_after,
            status,
        )))
    }
}

/// ListCertificates returns only RSA_2048 keys unless key types are given
fn all_key_types() -> aws_sdk_acm::types::Filters {
    use aws_sdk_acm::types::KeyAlgorithm;

    let key_types = KeyAlgorithm::values()
        .iter()
        .map(|k| KeyAlgorithm::from(*k))
        .collect::<Vec<_>>();

    aws_sdk_acm::types::Filters::builder()
        .set_key_types(Some(key_types))
        .build()
}

#[async_trait::async_trait]
impl InventoryProvider for AcmInventory {
    async fn list_certificates(&self) -> Result<Vec<Certificate>, Error> {
        use futures::stream::{StreamExt, TryStreamExt};

        let arns = self.list_certificate_arns().await?;
        tracing::debug!(count = arns.len(), "ACM certificates listed");

        // concurrent DescribeCertificate calls, sorted afterwards by domain name
        let mut certificates = futures::stream::iter(arns)
            .map(|arn| self.describe_certificate(arn))
            .buffer_unordered(DESCRIBE_CONCURRENCY)
            .try_filter_map(|cert| async move { Ok::<_, Error>(cert) })
            .try_collect::<Vec<_>>()
            .await?;
        certificates.sort_by(|a, b| a.domain_name().cmp(b.domain_name()));

        Ok(certificates)
    }
}
