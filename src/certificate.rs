//! Certificate records read from an inventory
//!
use chrono::{DateTime, Utc};

/// One TLS certificate known to the inventory
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct Certificate {
    identifier: String,
    domain_name: String,
    not_after: DateTime<Utc>,
    status: CertificateStatus,
}

/// Certificate state as reported by the inventory.
/// Informational only, expiry is always computed from `not_after`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize)]
pub enum CertificateStatus {
    Issued,
    Expired,
    PendingValidation,
    Inactive,
    Revoked,
    ValidationTimedOut,
    Failed,
    Unknown(String),
}

impl Certificate {
    pub fn new(
        identifier: impl Into<String>,
        domain_name: impl Into<String>,
        not_after: DateTime<Utc>,
        status: CertificateStatus,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            domain_name: domain_name.into(),
            not_after,
            status,
        }
    }

    pub fn identifier<'a>(&'a self) -> &'a str {
        self.identifier.as_str()
    }

    /// Domain name, may be empty
    pub fn domain_name<'a>(&'a self) -> &'a str {
        self.domain_name.as_str()
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    pub fn status<'a>(&'a self) -> &'a CertificateStatus {
        &self.status
    }

    /// Whole days left until `not_after`, rounded toward negative infinity.
    /// Any instant past expiry, even a fraction of a second, is already -1.
    pub fn remaining_days(&self, now: DateTime<Utc>) -> i64 {
        let left = self.not_after - now;
        // num_days() truncates toward zero
        let days = left.num_days();
        if left < chrono::Duration::days(days) {
            days - 1
        } else {
            days
        }
    }
}

impl CertificateStatus {
    /// ACM API name, e.g. "ISSUED"
    pub fn as_str<'a>(&'a self) -> &'a str {
        match self {
            Self::Issued => "ISSUED",
            Self::Expired => "EXPIRED",
            Self::PendingValidation => "PENDING_VALIDATION",
            Self::Inactive => "INACTIVE",
            Self::Revoked => "REVOKED",
            Self::ValidationTimedOut => "VALIDATION_TIMED_OUT",
            Self::Failed => "FAILED",
            Self::Unknown(s) => s.as_str(),
        }
    }
}

impl From<&str> for CertificateStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "ISSUED" => Self::Issued,
            "EXPIRED" => Self::Expired,
            "PENDING_VALIDATION" => Self::PendingValidation,
            "INACTIVE" => Self::Inactive,
            "REVOKED" => Self::Revoked,
            "VALIDATION_TIMED_OUT" => Self::ValidationTimedOut,
            "FAILED" => Self::Failed,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn cert_expiring_at(not_after: DateTime<Utc>) -> Certificate {
        Certificate::new("arn", "www.example.com", not_after, CertificateStatus::Issued)
    }

    #[test]
    fn remaining_days_floors() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let cert = cert_expiring_at(now + Duration::days(10) + Duration::hours(23));
        assert_eq!(cert.remaining_days(now), 10);

        let cert = cert_expiring_at(now + Duration::hours(23));
        assert_eq!(cert.remaining_days(now), 0);

        let cert = cert_expiring_at(now - Duration::seconds(1));
        assert_eq!(cert.remaining_days(now), -1);

        let cert = cert_expiring_at(now - Duration::days(3));
        assert_eq!(cert.remaining_days(now), -3);

        let cert = cert_expiring_at(now - Duration::days(3) - Duration::minutes(1));
        assert_eq!(cert.remaining_days(now), -4);
    }

    #[test]
    fn remaining_days_sub_second_past_expiry() {
        // NotAfter has whole seconds, the clock does not
        let not_after = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let cert = cert_expiring_at(not_after);

        assert_eq!(cert.remaining_days(not_after), 0);
        assert_eq!(
            cert.remaining_days(not_after + Duration::milliseconds(400)),
            -1
        );
        assert_eq!(cert.remaining_days(not_after + Duration::nanoseconds(1)), -1);
        assert_eq!(
            cert.remaining_days(not_after - Duration::milliseconds(400)),
            0
        );
    }

    #[test]
    fn status_names() {
        assert_eq!(CertificateStatus::from("issued"), CertificateStatus::Issued);
        assert_eq!(
            CertificateStatus::from(" PENDING_VALIDATION "),
            CertificateStatus::PendingValidation
        );
        assert_eq!(
            CertificateStatus::from("SOMETHING_NEW").as_str(),
            "SOMETHING_NEW"
        );
    }
}
