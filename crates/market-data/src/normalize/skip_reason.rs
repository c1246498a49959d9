//! Per-item outcome tracking for normalization diagnostics.

use std::fmt;

use crate::models::AssetRecord;

/// Why a raw item was left out of a normalized batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The item is not a JSON object.
    NotAnObject,

    /// `id` is missing, empty, or not a string.
    MissingId,

    /// `symbol` is missing, empty, or not a string.
    MissingSymbol,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "not an object"),
            Self::MissingId => write!(f, "missing id"),
            Self::MissingSymbol => write!(f, "missing symbol"),
        }
    }
}

/// Record of a single skipped item.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedItem {
    /// Position of the item in the raw payload.
    pub index: usize,
    /// Upstream id, when the item had a usable one.
    pub id: Option<String>,
    pub reason: SkipReason,
}

/// Result of normalizing one payload: the kept records, in payload order,
/// plus every item that was skipped and why.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedBatch {
    pub records: Vec<AssetRecord>,
    pub skipped: Vec<SkippedItem>,
}

impl NormalizedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_kept(&mut self, record: AssetRecord) {
        self.records.push(record);
    }

    pub fn record_skip(&mut self, index: usize, id: Option<String>, reason: SkipReason) {
        self.skipped.push(SkippedItem { index, id, reason });
    }

    /// Number of items left out of the batch.
    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }

    /// True when no record survived normalization.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "kept {}, skipped {}",
            self.records.len(),
            self.skipped.len()
        );
        if !self.skipped.is_empty() {
            let details = self
                .skipped
                .iter()
                .map(|s| match &s.id {
                    Some(id) => format!("#{} [{}]: {}", s.index, id, s.reason),
                    None => format!("#{}: {}", s.index, s.reason),
                })
                .collect::<Vec<_>>()
                .join(", ");
            summary.push_str(&format!(" ({})", details));
        }
        summary
    }

    /// Consume the batch, keeping only the records.
    pub fn into_records(self) -> Vec<AssetRecord> {
        self.records
    }
}
