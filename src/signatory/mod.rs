//! Signatory records and their display enrichment
//!
//! Raw entries come off the wire with a `signed` stamp and whatever identity
//! fields the server knows about. The [`Enricher`] turns a batch of them into
//! display-ready [`SignatoryRecord`]s, computing the relative age and the
//! manifesto version once per fetch.

pub mod age;
pub mod version;

pub use age::{display_age, Age, AgeUnit};
pub use version::{DocumentVersion, VersionEra, VersionSchedule};

use crate::error::{FeedError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Who signed: identity fields as provided by the login provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Login provider ("twitter", "github", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, alias = "url", skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    /// Any other fields the server sent
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    /// Name to show in the roster
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.provider.as_deref())
            .unwrap_or("anonymous")
    }
}

/// A `signed` stamp: epoch millis or a date string.
///
/// Anything else still decodes (as `Other`) so one odd entry can't fail a
/// whole page; [`SignedAt::resolve`] rejects it instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignedAt {
    Millis(i64),
    /// Fractional millis, as some JSON encoders emit them
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl SignedAt {
    /// Resolve to a UTC instant.
    ///
    /// Text accepts RFC 3339, a bare integer of millis, or a `YYYY-MM-DD` date.
    pub fn resolve(&self) -> Result<DateTime<Utc>> {
        match self {
            SignedAt::Millis(ms) => DateTime::from_timestamp_millis(*ms)
                .ok_or_else(|| FeedError::InvalidTimestamp(ms.to_string())),
            SignedAt::Text(text) => {
                let text = text.trim();
                if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                    return Ok(parsed.with_timezone(&Utc));
                }
                if let Ok(ms) = text.parse::<i64>() {
                    return SignedAt::Millis(ms).resolve();
                }
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
                    .ok_or_else(|| FeedError::InvalidTimestamp(text.to_string()))
            }
            SignedAt::Float(ms) if ms.is_finite() => SignedAt::Millis(ms.trunc() as i64).resolve(),
            SignedAt::Float(ms) => Err(FeedError::InvalidTimestamp(ms.to_string())),
            SignedAt::Other(value) => Err(FeedError::InvalidTimestamp(value.to_string())),
        }
    }
}

/// A signatory as returned by the listing, search and page endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSignatory {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(default)]
    pub signed: Option<SignedAt>,
}

impl RawSignatory {
    /// When this entry was signed; missing or unreadable stamps are errors
    pub fn signed_at(&self) -> Result<DateTime<Utc>> {
        self.signed
            .as_ref()
            .ok_or_else(|| FeedError::InvalidTimestamp("missing".to_string()))?
            .resolve()
    }
}

/// A display-ready signatory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatoryRecord {
    pub identity: Identity,
    pub signed_at: DateTime<Utc>,
    /// "3 days ago", relative to the fetch that produced this record
    pub display_age: String,
    pub document_version: DocumentVersion,
}

/// Derives age and version for raw signatories.
///
/// Holds only the immutable version schedule; each batch is classified
/// against its own "now".
#[derive(Debug, Clone, Default)]
pub struct Enricher {
    schedule: VersionSchedule,
}

impl Enricher {
    pub fn new(schedule: VersionSchedule) -> Self {
        Self { schedule }
    }

    /// Relative age and document version for one signing instant
    pub fn classify(&self, signed_at: DateTime<Utc>, now: DateTime<Utc>) -> (String, DocumentVersion) {
        let signed_ms = signed_at.timestamp_millis();
        (
            display_age(signed_ms, now.timestamp_millis()),
            self.schedule.classify(signed_ms).clone(),
        )
    }

    /// Enrich a batch in order.
    ///
    /// Entries whose `signed` stamp can't be resolved are dropped with a
    /// warning; the rest keep their relative order.
    pub fn enrich(&self, batch: Vec<RawSignatory>, now: DateTime<Utc>) -> Vec<SignatoryRecord> {
        batch
            .into_iter()
            .filter_map(|raw| match raw.signed_at() {
                Ok(signed_at) => {
                    let (display_age, document_version) = self.classify(signed_at, now);
                    Some(SignatoryRecord {
                        identity: raw.identity,
                        signed_at,
                        display_age,
                        document_version,
                    })
                }
                Err(e) => {
                    tracing::warn!(
                        "Dropping signatory {}: {}",
                        raw.identity.display_name(),
                        e
                    );
                    None
                }
            })
            .collect()
    }

    /// Enrich a batch as of the current wall-clock time
    pub fn enrich_now(&self, batch: Vec<RawSignatory>) -> Vec<SignatoryRecord> {
        self.enrich(batch, Utc::now())
    }
}
