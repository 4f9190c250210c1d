//! Suppression of records belonging to permanently ignored nodes

use std::collections::HashSet;

use crate::model::{RawResultSet, RecordKind, StatusRecord};

/// Reason reported when a row lacks the reason field for its kind
pub const UNSPECIFIED_REASON: &str = "unspecified";

/// Node identifiers whose open conditions never alert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    ids: HashSet<u64>,
}

impl IgnoreSet {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Records that survived the filter, plus how many rows were dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filtered {
    pub records: Vec<StatusRecord>,
    pub suppressed: usize,
}

/// Drop ignored rows and convert the rest into [`StatusRecord`]s, preserving order
pub fn apply(raw: &RawResultSet, ignore: &IgnoreSet, kind: RecordKind) -> Filtered {
    if raw.records == 0 {
        return Filtered::default();
    }

    let mut filtered = Filtered::default();
    for row in &raw.rows {
        if ignore.contains(row.id) {
            tracing::debug!("Suppressing {} {} for {}", kind, row.id, row.fqdn);
            filtered.suppressed += 1;
            continue;
        }
        filtered.records.push(StatusRecord {
            node_identifier: row.id,
            detail_identifier: row.nid.unwrap_or(row.id),
            host_name: row.fqdn.clone(),
            duration_millis: row.duration,
            reason_code: row.reason(kind).unwrap_or(UNSPECIFIED_REASON).to_string(),
        });
    }
    filtered
}
