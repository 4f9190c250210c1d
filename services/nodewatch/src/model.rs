//! Node categories, record kinds and the records flowing through a sweep

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two independently configured fleets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Secure,
    Super,
}

impl NodeCategory {
    /// Every category, in sweep order
    pub const ALL: [NodeCategory; 2] = [NodeCategory::Secure, NodeCategory::Super];
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeCategory::Secure => write!(f, "secure"),
            NodeCategory::Super => write!(f, "super"),
        }
    }
}

/// Whether an open condition is a downtime or an exception
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Downtime,
    Exception,
}

impl RecordKind {
    /// Every kind, in sweep order
    pub const ALL: [RecordKind; 2] = [RecordKind::Downtime, RecordKind::Exception];

    /// Query path appended to the category base URL
    pub fn path(&self) -> &'static str {
        match self {
            RecordKind::Downtime => "/nodes/my/downtimes",
            RecordKind::Exception => "/nodes/my/exceptions",
        }
    }

    /// Name of the row field holding the failure reason
    pub fn reason_field(&self) -> &'static str {
        match self {
            RecordKind::Downtime => "dtype",
            RecordKind::Exception => "etype",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Downtime => write!(f, "downtime"),
            RecordKind::Exception => write!(f, "exception"),
        }
    }
}

/// Decoded page of open records as returned by the status API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResultSet {
    pub records: u64,
    #[serde(default)]
    pub rows: Vec<RawRow>,
}

/// A single row of a [`RawResultSet`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub id: u64,
    #[serde(default)]
    pub nid: Option<u64>,
    pub fqdn: String,
    pub duration: u64,
    #[serde(default)]
    pub dtype: Option<String>,
    #[serde(default)]
    pub etype: Option<String>,
}

impl RawRow {
    /// The reason code for the given kind, if the API supplied one
    pub fn reason(&self, kind: RecordKind) -> Option<&str> {
        match kind {
            RecordKind::Downtime => self.dtype.as_deref(),
            RecordKind::Exception => self.etype.as_deref(),
        }
    }
}

/// An open downtime or exception that survived the ignore filter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    /// Row identifier, matched against the ignore set
    pub node_identifier: u64,
    /// Identifier used in the detail-page link
    pub detail_identifier: u64,
    pub host_name: String,
    pub duration_millis: u64,
    pub reason_code: String,
}

impl StatusRecord {
    /// How long the condition has persisted, in fractional minutes
    pub fn duration_minutes(&self) -> f64 {
        self.duration_millis as f64 / 60000.0
    }

    /// Minutes rounded to the nearest whole number (ties to even)
    pub fn display_minutes(&self) -> u64 {
        self.duration_minutes().round_ties_even() as u64
    }
}
