//! Manifesto version eras
//!
//! A signature belongs to the version of the manifesto that was current when
//! it was made. Eras are separated by release boundaries; a signature stamped
//! strictly after a boundary belongs to the later era.

use crate::error::{FeedError, Result};
use serde::{Deserialize, Serialize};

/// 2013-06-17T00:00:00Z, first public release
pub const V1_0_RELEASED_MS: i64 = 1_371_427_200_000;
/// 2013-09-23T00:00:00Z
pub const V1_1_RELEASED_MS: i64 = 1_379_894_400_000;
/// 2014-09-16T00:00:00Z
pub const V2_0_RELEASED_MS: i64 = 1_410_825_600_000;

/// Version of the signed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVersion {
    /// Human label, e.g. "2.0"
    pub label: String,
    /// Stable link to the text of that version
    pub reference_url: String,
}

impl DocumentVersion {
    pub fn new(label: impl Into<String>, reference_url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            reference_url: reference_url.into(),
        }
    }
}

/// An era that begins strictly after `starts_after_ms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEra {
    pub starts_after_ms: i64,
    #[serde(flatten)]
    pub version: DocumentVersion,
}

/// Ordered partition of time into version eras
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchedule")]
pub struct VersionSchedule {
    initial: DocumentVersion,
    eras: Vec<VersionEra>,
}

#[derive(Deserialize)]
struct RawSchedule {
    initial: DocumentVersion,
    #[serde(default)]
    eras: Vec<VersionEra>,
}

impl TryFrom<RawSchedule> for VersionSchedule {
    type Error = FeedError;

    fn try_from(raw: RawSchedule) -> Result<Self> {
        VersionSchedule::new(raw.initial, raw.eras)
    }
}

impl VersionSchedule {
    /// Build a schedule; boundaries must be strictly ascending.
    pub fn new(initial: DocumentVersion, eras: Vec<VersionEra>) -> Result<Self> {
        if let Some(pair) = eras
            .windows(2)
            .find(|pair| pair[0].starts_after_ms >= pair[1].starts_after_ms)
        {
            return Err(FeedError::Config(format!(
                "version boundaries must ascend: {} ({}) is not before {} ({})",
                pair[0].version.label,
                pair[0].starts_after_ms,
                pair[1].version.label,
                pair[1].starts_after_ms
            )));
        }
        Ok(Self { initial, eras })
    }

    /// The manifesto's published eras
    pub fn manifesto() -> Self {
        Self {
            initial: DocumentVersion::new(
                "draft",
                "https://github.com/reactivemanifesto/reactivemanifesto",
            ),
            eras: vec![
                VersionEra {
                    starts_after_ms: V1_0_RELEASED_MS,
                    version: DocumentVersion::new(
                        "1.0",
                        "https://www.reactivemanifesto.org/pdf/the-reactive-manifesto-1.0.pdf",
                    ),
                },
                VersionEra {
                    starts_after_ms: V1_1_RELEASED_MS,
                    version: DocumentVersion::new(
                        "1.1",
                        "https://www.reactivemanifesto.org/pdf/the-reactive-manifesto-1.1.pdf",
                    ),
                },
                VersionEra {
                    starts_after_ms: V2_0_RELEASED_MS,
                    version: DocumentVersion::new(
                        "2.0",
                        "https://www.reactivemanifesto.org/pdf/the-reactive-manifesto-2.0.pdf",
                    ),
                },
            ],
        }
    }

    /// Version current at `signed_at_ms`
    pub fn classify(&self, signed_at_ms: i64) -> &DocumentVersion {
        self.eras
            .iter()
            .rev()
            .find(|era| signed_at_ms > era.starts_after_ms)
            .map(|era| &era.version)
            .unwrap_or(&self.initial)
    }

    pub fn initial(&self) -> &DocumentVersion {
        &self.initial
    }

    pub fn eras(&self) -> &[VersionEra] {
        &self.eras
    }
}

impl Default for VersionSchedule {
    fn default() -> Self {
        Self::manifesto()
    }
}
