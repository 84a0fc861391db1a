//! Timestamp-ordered index over the mirror.
//!
//! The index is derived state: it is rebuilt from the mirror after every
//! mutation by a full scan and sort, O(n log n).

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quire_core::ContentRecord;

/// One `(name, timestamp)` pair from the mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Name the record is stored under.
    pub name: String,
    /// The record's publication instant.
    pub timestamp: DateTime<Utc>,
}

/// Order in which [`ContentStore::list`](crate::ContentStore::list) returns entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Most recent timestamp first.
    #[default]
    NewestFirst,
    /// Oldest timestamp first.
    OldestFirst,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newest" | "newest-first" | "desc" => Ok(SortOrder::NewestFirst),
            "oldest" | "oldest-first" | "asc" => Ok(SortOrder::OldestFirst),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Build the index from the mirror, newest first.
///
/// The sort is stable and keyed on timestamp only.
pub fn build_index(mirror: &HashMap<String, ContentRecord>) -> Vec<IndexEntry> {
    let mut entries: Vec<IndexEntry> = mirror
        .iter()
        .map(|(name, record)| IndexEntry {
            name: name.clone(),
            timestamp: record.timestamp,
        })
        .collect();

    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries
}

/// Copy `index` (stored newest first) out in the requested order.
pub fn ordered_snapshot(index: &[IndexEntry], order: SortOrder) -> Vec<IndexEntry> {
    match order {
        SortOrder::NewestFirst => index.to_vec(),
        SortOrder::OldestFirst => {
            let mut out = index.to_vec();
            // Ties keep their relative order.
            out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
            out
        }
    }
}
