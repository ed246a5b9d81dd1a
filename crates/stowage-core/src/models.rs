//! Domain models
//!
//! Pending uploads and claimed files are independent rows with no foreign
//! key between them; they correlate only on `(file_name, container)`
//! equality, since different containers may legitimately reuse a name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// An issued-but-unresolved upload authorization.
///
/// Created when a signed upload descriptor is handed out; removed once a
/// claimed file for the same name and container shows up, or when the
/// never-claimed sweep reclaims it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PendingUpload {
    pub id: Uuid,
    pub file_name: String,
    pub container_name: String,
    pub issued_at: DateTime<Utc>,
}

/// Durable record that some feature is actively using an uploaded object.
///
/// One table for every kind; `kind` selects the registered usage that
/// answers the deletion-eligibility questions, and `payload` carries the
/// kind-specific fields. `processed_at` is only meaningful for image kinds
/// and is monotonic: once set it is never cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ClaimedFile {
    pub id: Uuid,
    pub file_name: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub retain_until: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub payload: JsonValue,
}

impl ClaimedFile {
    /// Whether the resize pipeline already ran for this record.
    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }

    /// Whether the retention window has lapsed. A null `retain_until`
    /// never qualifies.
    pub fn retention_elapsed(&self, now: DateTime<Utc>) -> bool {
        match self.retain_until {
            Some(until) => until < now,
            None => false,
        }
    }
}

/// Fields callers supply when claiming an uploaded object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClaimedFile {
    pub file_name: String,
    pub kind: String,
    #[serde(default)]
    pub retain_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payload: JsonValue,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(retain_until: Option<DateTime<Utc>>) -> ClaimedFile {
        ClaimedFile {
            id: Uuid::new_v4(),
            file_name: "ABC1234.jpg".to_string(),
            kind: "image".to_string(),
            created_at: Utc::now(),
            retain_until,
            processed_at: None,
            payload: JsonValue::Null,
        }
    }

    #[test]
    fn null_retention_never_elapses() {
        let now = Utc::now();
        assert!(!record(None).retention_elapsed(now));
    }

    #[test]
    fn retention_elapse_is_strict() {
        let now = Utc::now();
        assert!(record(Some(now - Duration::seconds(1))).retention_elapsed(now));
        assert!(!record(Some(now)).retention_elapsed(now));
        assert!(!record(Some(now + Duration::seconds(1))).retention_elapsed(now));
    }
}
