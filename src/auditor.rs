use crate::{
    AuditConfig, Certificate, Error, InventoryProvider, NotificationPublisher, PublishFailure,
};
use chrono::{DateTime, Utc};

const AUDIT_SUBJECT: &str = "Warning: Certificate Expiration";
const REPORT_SUBJECT: &str = "Notice: Certificate Expiration Report";
const NO_DOMAIN_NAME: &str = "(no domain name)";

pub struct CertificateAuditor<'a> {
    config: &'a AuditConfig,
}

/// Notification pass
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    Audit,
    Report,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Expired,
    Expiring,
    Valid,
}

/// Certificate evaluated at one instant
#[derive(Clone, Debug, serde::Serialize)]
pub struct AuditedCertificate {
    certificate: Certificate,
    remaining_days: i64,
    classification: Classification,
}

/// Summary of one run, returned to the caller for logging
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize)]
pub struct RunResult {
    pub inspected: usize,
    pub flagged: usize,
    pub expired: usize,
    pub notifications: Vec<Pass>,
}

impl<'a> CertificateAuditor<'a> {
    pub fn new(config: &'a AuditConfig) -> Self {
        Self { config }
    }

    /// Run both passes against the current time
    pub async fn run<I, P>(&self, inventory: &I, publisher: &P) -> Result<RunResult, Error>
    where
        I: InventoryProvider + ?Sized,
        P: NotificationPublisher + ?Sized,
    {
        self.run_at(Utc::now(), inventory, publisher).await
    }

    pub async fn run_at<I, P>(
        &self,
        now: DateTime<Utc>,
        inventory: &I,
        publisher: &P,
    ) -> Result<RunResult, Error>
    where
        I: InventoryProvider + ?Sized,
        P: NotificationPublisher + ?Sized,
    {
        // Fetch failure aborts the whole run, nothing is published
        let certificates = inventory
            .list_certificates()
            .await
            .map_err(|e| Error::InventoryUnavailable(Box::new(e)))?;

        let audited = self.evaluate(now, certificates);
        let flagged = audited
            .iter()
            .filter(|c| c.is_below_threshold(self.config.threshold_days()))
            .collect::<Vec<_>>();

        let mode = self.config.mode();
        let audit_fut = async {
            match mode.audit_topic() {
                Some(topic) => self.audit_pass(topic, &flagged, publisher).await,
                None => Ok(None),
            }
        };
        let report_fut = async {
            match mode.report_topic() {
                Some(topic) => self.report_pass(topic, &audited, publisher).await,
                None => Ok(None),
            }
        };

        // Passes are independent, one failing publish never suppresses the other
        let (audit_res, report_res) = futures::join!(audit_fut, report_fut);

        let mut result = RunResult {
            inspected: audited.len(),
            flagged: flagged.len(),
            expired: audited
                .iter()
                .filter(|c| c.classification() == Classification::Expired)
                .count(),
            notifications: Vec::new(),
        };
        let mut failures = Vec::new();
        for res in [audit_res, report_res] {
            match res {
                Ok(Some(pass)) => result.notifications.push(pass),
                Ok(None) => {}
                Err(failure) => failures.push(failure),
            }
        }

        tracing::info!(
            inspected = result.inspected,
            flagged = result.flagged,
            expired = result.expired,
            notifications = ?result.notifications,
            failed = failures.len(),
            "certificate check finished"
        );

        if failures.is_empty() {
            Ok(result)
        } else {
            Err(Error::PublishFailures { result, failures })
        }
    }

    /// Report body for the whole inventory, nothing is published
    pub async fn list_at<I>(&self, now: DateTime<Utc>, inventory: &I) -> Result<String, Error>
    where
        I: InventoryProvider + ?Sized,
    {
        let certificates = inventory
            .list_certificates()
            .await
            .map_err(|e| Error::InventoryUnavailable(Box::new(e)))?;

        Ok(report_message(&self.evaluate(now, certificates)))
    }

    /// Compute remaining days and classification of every certificate
    pub fn evaluate(
        &self,
        now: DateTime<Utc>,
        certificates: Vec<Certificate>,
    ) -> Vec<AuditedCertificate> {
        let threshold_days = self.config.threshold_days();
        certificates
            .into_iter()
            .map(|certificate| {
                let audited = AuditedCertificate::new(certificate, now, threshold_days);
                tracing::debug!(
                    identifier = audited.certificate().identifier(),
                    domain_name = audited.certificate().domain_name(),
                    remaining_days = audited.remaining_days(),
                    classification = ?audited.classification(),
                    "certificate evaluated"
                );
                audited
            })
            .collect()
    }

    async fn audit_pass<P>(
        &self,
        topic: &str,
        flagged: &[&AuditedCertificate],
        publisher: &P,
    ) -> Result<Option<Pass>, PublishFailure>
    where
        P: NotificationPublisher + ?Sized,
    {
        // Silence means every certificate is healthy
        let Some(message) = audit_message(self.config.threshold_days(), flagged) else {
            tracing::info!(
                "no certificate expires within {} days",
                self.config.threshold_days()
            );
            return Ok(None);
        };

        publish(Pass::Audit, topic, AUDIT_SUBJECT, &message, publisher).await
    }

    async fn report_pass<P>(
        &self,
        topic: &str,
        audited: &[AuditedCertificate],
        publisher: &P,
    ) -> Result<Option<Pass>, PublishFailure>
    where
        P: NotificationPublisher + ?Sized,
    {
        let message = report_message(audited);
        publish(Pass::Report, topic, REPORT_SUBJECT, &message, publisher).await
    }
}

async fn publish<P>(
    pass: Pass,
    topic: &str,
    subject: &str,
    message: &str,
    publisher: &P,
) -> Result<Option<Pass>, PublishFailure>
where
    P: NotificationPublisher + ?Sized,
{
    match publisher.publish(topic, subject, message).await {
        Ok(()) => {
            tracing::info!(%pass, topic, "notification sent");
            Ok(Some(pass))
        }
        Err(e) => {
            tracing::warn!(%pass, topic, error = %e, "notification failed");
            Err(PublishFailure {
                pass,
                topic: topic.to_string(),
                source: Box::new(e),
            })
        }
    }
}

/// Warning listing certificates below threshold, None when there is nothing to warn
pub fn audit_message(threshold_days: u32, flagged: &[&AuditedCertificate]) -> Option<String> {
    if flagged.is_empty() {
        return None;
    }

    let lines = flagged
        .iter()
        .map(|c| {
            if c.classification() == Classification::Expired {
                format!(
                    "{:<36} has EXPIRED, {} days remaining ({})",
                    c.display_domain(),
                    c.remaining_days(),
                    c.certificate().identifier()
                )
            } else {
                format!(
                    "{:<36} is valid for {} more days ({})",
                    c.display_domain(),
                    c.remaining_days(),
                    c.certificate().identifier()
                )
            }
        })
        .collect::<Vec<_>>();

    Some(format!(
        "The following certificates will expire within {} days:\n\n{}",
        threshold_days,
        lines.join("\n")
    ))
}

/// Report of every certificate, sent even for an empty inventory
pub fn report_message(audited: &[AuditedCertificate]) -> String {
    let lines = audited
        .iter()
        .map(|c| {
            let state = match c.classification() {
                Classification::Expired => "EXPIRED",
                Classification::Expiring | Classification::Valid => "valid",
            };
            format!(
                "{:<36}: {} for {} days. ({})",
                c.display_domain(),
                state,
                c.remaining_days(),
                c.certificate().identifier()
            )
        })
        .collect::<Vec<_>>();

    if lines.is_empty() {
        "Certificate expiration report:\n\n0 certificates found.".to_string()
    } else {
        format!(
            "Certificate expiration report:\n\n{}\n\n{} certificates found.",
            lines.join("\n"),
            lines.len()
        )
    }
}

impl AuditedCertificate {
    pub fn new(certificate: Certificate, now: DateTime<Utc>, threshold_days: u32) -> Self {
        let remaining_days = certificate.remaining_days(now);
        let classification = if remaining_days < 0 {
            Classification::Expired
        } else if remaining_days < i64::from(threshold_days) {
            Classification::Expiring
        } else {
            Classification::Valid
        };

        Self {
            certificate,
            remaining_days,
            classification,
        }
    }

    pub fn certificate<'a>(&'a self) -> &'a Certificate {
        &self.certificate
    }

    pub fn remaining_days(&self) -> i64 {
        self.remaining_days
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// Strictly fewer days left than threshold
    pub fn is_below_threshold(&self, threshold_days: u32) -> bool {
        self.remaining_days < i64::from(threshold_days)
    }

    fn display_domain<'a>(&'a self) -> &'a str {
        match self.certificate.domain_name() {
            "" => NO_DOMAIN_NAME,
            domain_name => domain_name,
        }
    }
}

impl std::fmt::Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Audit => f.write_str("audit"),
            Self::Report => f.write_str("report"),
        }
    }
}
