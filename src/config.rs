//! Per-invocation audit configuration, from environment variables or TOML
//!
use crate::{CertificateStatus, Error};

const DEFAULT_THRESHOLD_DAYS: u32 = 30;
const DEFAULT_STATUSES: [CertificateStatus; 2] =
    [CertificateStatus::Issued, CertificateStatus::Expired];

/// Immutable snapshot, built once per run
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuditConfig {
    region: Option<String>,
    threshold_days: u32,
    mode: NotifyMode,
    statuses: Vec<CertificateStatus>,
}

/// Which passes run, with the topic each enabled pass notifies
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NotifyMode {
    AuditOnly {
        audit_topic: String,
    },
    ReportOnly {
        report_topic: String,
    },
    Both {
        audit_topic: String,
        report_topic: String,
    },
    Neither,
}

#[derive(serde::Deserialize)]
struct ConfigToml {
    region: Option<String>,
    #[serde(default = "default_threshold_days")]
    days: u32,
    #[serde(default = "default_true")]
    do_audit: bool,
    #[serde(default)]
    do_report: bool,
    sns_audit_arn: Option<String>,
    sns_report_arn: Option<String>,
    #[serde(default)]
    certificate_statuses: Vec<String>,
}

/// Whether mode flags are honoured, or forced off for listing
#[derive(Clone, Copy)]
enum Passes {
    Resolve,
    Disabled,
}

impl Passes {
    fn apply(self, do_audit: bool, do_report: bool) -> (bool, bool) {
        match self {
            Self::Resolve => (do_audit, do_report),
            Self::Disabled => (false, false),
        }
    }
}

fn default_threshold_days() -> u32 {
    DEFAULT_THRESHOLD_DAYS
}

fn default_true() -> bool {
    true
}

impl AuditConfig {
    /// Read from process environment variables
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read from any key/value source using the Lambda environment key names
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::lookup_with(lookup, Passes::Resolve)
    }

    /// Inventory settings only, both passes disabled and no topic required
    pub fn inventory_from_env() -> Result<Self, Error> {
        Self::inventory_from_lookup(|key| std::env::var(key).ok())
    }

    pub fn inventory_from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::lookup_with(lookup, Passes::Disabled)
    }

    fn lookup_with<F>(lookup: F, passes: Passes) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let region = lookup("region").filter(|r| !r.trim().is_empty());

        let threshold_days = match lookup("days").or_else(|| lookup("daysThreshold")) {
            Some(days) => parse_days(&days)?,
            None => DEFAULT_THRESHOLD_DAYS,
        };

        let do_audit = match lookup("doAudit") {
            Some(flag) => parse_flag("doAudit", &flag)?,
            None => true,
        };
        let do_report = match lookup("doReport") {
            Some(flag) => parse_flag("doReport", &flag)?,
            None => false,
        };

        let statuses = lookup("certificateStatuses")
            .map(|s| s.split(',').map(str::to_string).collect::<Vec<_>>())
            .unwrap_or_default();

        Self::from_parts(
            region,
            threshold_days,
            passes.apply(do_audit, do_report),
            lookup("snsAuditArn"),
            lookup("snsReportArn"),
            statuses,
        )
    }

    pub fn from_file<P: AsRef<std::path::Path>>(config_file: P) -> Result<Self, Error> {
        let toml_str = std::fs::read_to_string(config_file)?;
        Self::from_toml_str(&toml_str)
    }

    pub fn inventory_from_file<P: AsRef<std::path::Path>>(config_file: P) -> Result<Self, Error> {
        let toml_str = std::fs::read_to_string(config_file)?;
        Self::toml_with(&toml_str, Passes::Disabled)
    }

    pub fn from_toml_str(cfg_toml_str: &str) -> Result<Self, Error> {
        Self::toml_with(cfg_toml_str, Passes::Resolve)
    }

    fn toml_with(cfg_toml_str: &str, passes: Passes) -> Result<Self, Error> {
        let ConfigToml {
            region,
            days,
            do_audit,
            do_report,
            sns_audit_arn,
            sns_report_arn,
            certificate_statuses,
        } = toml::from_str::<ConfigToml>(cfg_toml_str)?;

        Self::from_parts(
            region,
            days,
            passes.apply(do_audit, do_report),
            sns_audit_arn,
            sns_report_arn,
            certificate_statuses,
        )
    }

    fn from_parts(
        region: Option<String>,
        threshold_days: u32,
        (do_audit, do_report): (bool, bool),
        audit_topic: Option<String>,
        report_topic: Option<String>,
        statuses: Vec<String>,
    ) -> Result<Self, Error> {
        let mode = NotifyMode::resolve(do_audit, do_report, audit_topic, report_topic)?;

        let statuses = statuses
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(CertificateStatus::from)
            .collect::<Vec<_>>();
        let statuses = if statuses.is_empty() {
            DEFAULT_STATUSES.to_vec()
        } else {
            statuses
        };

        Ok(Self {
            region,
            threshold_days,
            mode,
            statuses,
        })
    }

    pub fn region<'a>(&'a self) -> Option<&'a str> {
        self.region.as_deref()
    }

    pub fn threshold_days(&self) -> u32 {
        self.threshold_days
    }

    pub fn mode<'a>(&'a self) -> &'a NotifyMode {
        &self.mode
    }

    /// Certificate states listed from ACM
    pub fn statuses<'a>(&'a self) -> &'a [CertificateStatus] {
        self.statuses.as_slice()
    }
}

impl NotifyMode {
    /// Resolve mode flags once. An enabled pass requires its topic.
    pub fn resolve(
        do_audit: bool,
        do_report: bool,
        audit_topic: Option<String>,
        report_topic: Option<String>,
    ) -> Result<Self, Error> {
        let audit_topic = if do_audit {
            Some(required_topic("snsAuditArn", audit_topic)?)
        } else {
            None
        };
        let report_topic = if do_report {
            Some(required_topic("snsReportArn", report_topic)?)
        } else {
            None
        };

        Ok(match (audit_topic, report_topic) {
            (Some(audit_topic), Some(report_topic)) => Self::Both {
                audit_topic,
                report_topic,
            },
            (Some(audit_topic), None) => Self::AuditOnly { audit_topic },
            (None, Some(report_topic)) => Self::ReportOnly { report_topic },
            (None, None) => Self::Neither,
        })
    }

    /// Topic to notify when audit pass is enabled
    pub fn audit_topic<'a>(&'a self) -> Option<&'a str> {
        match self {
            Self::AuditOnly { audit_topic } | Self::Both { audit_topic, .. } => {
                Some(audit_topic.as_str())
            }
            _ => None,
        }
    }

    /// Topic to notify when report pass is enabled
    pub fn report_topic<'a>(&'a self) -> Option<&'a str> {
        match self {
            Self::ReportOnly { report_topic } | Self::Both { report_topic, .. } => {
                Some(report_topic.as_str())
            }
            _ => None,
        }
    }
}

fn required_topic(key: &str, topic: Option<String>) -> Result<String, Error> {
    match topic {
        Some(topic) if !topic.trim().is_empty() => Ok(topic.trim().to_string()),
        _ => Err(config_error(key, "required when its pass is enabled")),
    }
}

fn parse_days(days: &str) -> Result<u32, Error> {
    days.trim()
        .parse::<u32>()
        .map_err(|_| config_error("days", &format!("not a non-negative integer: {:?}", days)))
}

fn parse_flag(key: &str, flag: &str) -> Result<bool, Error> {
    match flag.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(config_error(key, &format!("not a boolean: {:?}", flag))),
    }
}

fn config_error(key: &str, reason: &str) -> Error {
    Error::Configuration {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<AuditConfig, Error> {
        let env = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        AuditConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn both_passes() {
        let config = from_pairs(&[
            ("region", "eu-west-1"),
            ("days", "14"),
            ("doAudit", "True"),
            ("doReport", "True"),
            ("snsAuditArn", "arn:aws:sns:eu-west-1:123456789012:audit"),
            ("snsReportArn", "arn:aws:sns:eu-west-1:123456789012:report"),
        ])
        .unwrap();

        assert_eq!(config.region(), Some("eu-west-1"));
        assert_eq!(config.threshold_days(), 14);
        assert_eq!(
            config.mode(),
            &NotifyMode::Both {
                audit_topic: "arn:aws:sns:eu-west-1:123456789012:audit".to_string(),
                report_topic: "arn:aws:sns:eu-west-1:123456789012:report".to_string(),
            }
        );
        assert_eq!(config.statuses(), &DEFAULT_STATUSES);
    }

    #[test]
    fn defaults_to_audit_only() {
        let config = from_pairs(&[("snsAuditArn", "audit")]).unwrap();
        assert_eq!(config.region(), None);
        assert_eq!(config.threshold_days(), 30);
        assert_eq!(config.mode().audit_topic(), Some("audit"));
        assert_eq!(config.mode().report_topic(), None);
    }

    #[test]
    fn disabled_pass_ignores_topic() {
        let config = from_pairs(&[
            ("doAudit", "False"),
            ("doReport", "no"),
            ("snsAuditArn", "audit"),
        ])
        .unwrap();
        assert_eq!(config.mode(), &NotifyMode::Neither);
    }

    #[test]
    fn days_threshold_alias() {
        let config = from_pairs(&[("daysThreshold", "7"), ("snsAuditArn", "audit")]).unwrap();
        assert_eq!(config.threshold_days(), 7);
    }

    #[test]
    fn missing_topic_is_error() {
        let err = from_pairs(&[("doReport", "True"), ("doAudit", "False")]).unwrap_err();
        assert!(matches!(err, Error::Configuration { ref key, .. } if key == "snsReportArn"));

        let err = from_pairs(&[("snsAuditArn", "  ")]).unwrap_err();
        assert!(matches!(err, Error::Configuration { ref key, .. } if key == "snsAuditArn"));
    }

    #[test]
    fn malformed_values_are_errors() {
        let err = from_pairs(&[("days", "-1"), ("snsAuditArn", "audit")]).unwrap_err();
        assert!(matches!(err, Error::Configuration { ref key, .. } if key == "days"));

        let err = from_pairs(&[("days", "thirty"), ("snsAuditArn", "audit")]).unwrap_err();
        assert!(matches!(err, Error::Configuration { ref key, .. } if key == "days"));

        let err = from_pairs(&[("doAudit", "maybe")]).unwrap_err();
        assert!(matches!(err, Error::Configuration { ref key, .. } if key == "doAudit"));
    }

    #[test]
    fn statuses_list() {
        let config = from_pairs(&[
            ("snsAuditArn", "audit"),
            ("certificateStatuses", "ISSUED, inactive,"),
        ])
        .unwrap();
        assert_eq!(
            config.statuses(),
            &[CertificateStatus::Issued, CertificateStatus::Inactive]
        );
    }

    #[test]
    fn toml_config() {
        let config = AuditConfig::from_toml_str(
            r#"
region = "us-east-1"
days = 45
do_audit = false
do_report = true
sns_report_arn = "arn:aws:sns:us-east-1:123456789012:report"
certificate_statuses = ["ISSUED"]
"#,
        )
        .unwrap();

        assert_eq!(config.threshold_days(), 45);
        assert_eq!(
            config.mode(),
            &NotifyMode::ReportOnly {
                report_topic: "arn:aws:sns:us-east-1:123456789012:report".to_string()
            }
        );
        assert_eq!(config.statuses(), &[CertificateStatus::Issued]);
    }

    #[test]
    fn inventory_config_without_environment() {
        assert!(matches!(
            AuditConfig::from_lookup(|_| None),
            Err(Error::Configuration { .. })
        ));

        let config = AuditConfig::inventory_from_lookup(|_| None).unwrap();
        assert_eq!(config.mode(), &NotifyMode::Neither);
        assert_eq!(config.threshold_days(), 30);
        assert_eq!(config.statuses(), &DEFAULT_STATUSES);
    }

    #[test]
    fn inventory_config_keeps_inventory_settings() {
        let env = HashMap::from([
            ("region", "ap-northeast-1"),
            ("days", "10"),
            ("doReport", "True"),
            ("certificateStatuses", "INACTIVE"),
        ]);
        let config =
            AuditConfig::inventory_from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.region(), Some("ap-northeast-1"));
        assert_eq!(config.threshold_days(), 10);
        assert_eq!(config.mode(), &NotifyMode::Neither);
        assert_eq!(config.statuses(), &[CertificateStatus::Inactive]);

        // malformed values are still rejected
        let err = AuditConfig::inventory_from_lookup(|key| {
            (key == "days").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, Error::Configuration { ref key, .. } if key == "days"));
    }

    #[test]
    fn toml_missing_topic() {
        let err = AuditConfig::from_toml_str("do_report = true\ndo_audit = false\n").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
