use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifetime of a shared-store record.
pub const LINK_TTL_SECS: i64 = 3600;

/// A stored short link.
#[derive(Debug, Clone)]
pub struct StoredUrl {
    pub code: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StoredUrl {
    /// Build a record expiring [`LINK_TTL_SECS`] after `created_at`.
    pub fn new(code: String, url: String, created_at: DateTime<Utc>) -> Self {
        StoredUrl {
            code,
            url,
            created_at,
            expires_at: created_at + chrono::Duration::seconds(LINK_TTL_SECS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn from_record(code: &str, record: TempRecord) -> Self {
        StoredUrl {
            code: code.to_string(),
            url: record.url,
            created_at: DateTime::from_timestamp(record.created, 0).unwrap_or_else(Utc::now),
            expires_at: DateTime::from_timestamp(record.expires, 0).unwrap_or_else(Utc::now),
        }
    }
}

/// On-disk record format: one `<code>.json` per link.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TempRecord {
    pub url: String,
    /// Unix seconds.
    pub created: i64,
    /// Unix seconds.
    pub expires: i64,
}

impl From<&StoredUrl> for TempRecord {
    fn from(link: &StoredUrl) -> Self {
        TempRecord {
            url: link.url.clone(),
            created: link.created_at.timestamp(),
            expires: link.expires_at.timestamp(),
        }
    }
}
