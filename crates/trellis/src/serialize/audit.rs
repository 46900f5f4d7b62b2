use indexmap::IndexMap;
use serde::Serialize;

/// Values written as `null` during serialization, per meta.
///
/// Missing cells are expected; unmatched ones held a value outside the
/// meta's domain and usually point at a mis-declared kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncodingAudit {
    pub unmatched: IndexMap<String, usize>,
    pub missing: IndexMap<String, usize>,
    pub missing_panels: usize,
}

impl EncodingAudit {
    pub(crate) fn record_unmatched(&mut self, meta: &str) {
        *self.unmatched.entry(meta.to_string()).or_default() += 1;
    }

    pub(crate) fn record_missing(&mut self, meta: &str) {
        *self.missing.entry(meta.to_string()).or_default() += 1;
    }

    pub fn total_unmatched(&self) -> usize {
        self.unmatched.values().sum()
    }

    pub fn total_missing(&self) -> usize {
        self.missing.values().sum()
    }

    /// True when every non-missing value was encoded.
    pub fn is_clean(&self) -> bool {
        self.unmatched.is_empty()
    }
}
