//! Chunk lineage: the ordered snapshot history of one (url, chunk) pair and a
//! positional diff between its two most recent snapshots.
//!
//! The diff compares lines by index only. An inserted line shifts everything
//! after it and every shifted line is reported as changed.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::api::models::VersionSnapshot;

/// Snapshots kept for display.
pub const MAX_SNAPSHOTS: usize = 5;
/// Characters of snapshot text kept for display.
pub const MAX_SNAPSHOT_CHARS: usize = 800;

/// One aligned position of a positional diff.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DiffRow {
    Same { line: String },
    Changed {
        older: Option<String>,
        newer: Option<String>,
    },
}

impl DiffRow {
    fn push_lines(&self, out: &mut Vec<String>) {
        match self {
            DiffRow::Same { line } => out.push(format!("  {line}")),
            DiffRow::Changed { older, newer } => {
                if let Some(older) = older {
                    out.push(format!("- {older}"));
                }
                if let Some(newer) = newer {
                    out.push(format!("+ {newer}"));
                }
            }
        }
    }
}

fn split_lines(text: &str) -> Vec<&str> {
    static NEWLINES: OnceLock<Regex> = OnceLock::new();
    NEWLINES
        .get_or_init(|| Regex::new(r"\n+").expect("valid newline pattern"))
        .split(text)
        .collect()
}

/// One row per position, `max(lines(newer), lines(older))` rows in total.
pub fn diff_rows(newer: &str, older: &str) -> Vec<DiffRow> {
    let newer = split_lines(newer);
    let older = split_lines(older);
    let len = newer.len().max(older.len());
    (0..len)
        .map(|i| match (newer.get(i), older.get(i)) {
            (Some(n), Some(o)) if n == o => DiffRow::Same {
                line: (*n).to_string(),
            },
            (n, o) => DiffRow::Changed {
                older: o.map(|s| (*s).to_string()),
                newer: n.map(|s| (*s).to_string()),
            },
        })
        .collect()
}

/// Rendered diff: `"  "` context lines, `"- "` older and `"+ "` newer lines.
pub fn diff(newer: &str, older: &str) -> Vec<String> {
    let mut out = Vec::new();
    for row in diff_rows(newer, older) {
        row.push_lines(&mut out);
    }
    out
}

/// Display-sized copy of one snapshot.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SnapshotView {
    pub version_ts: String,
    pub chunk_id: i64,
    pub text: String,
    pub truncated: bool,
}

impl SnapshotView {
    fn from_snapshot(snapshot: &VersionSnapshot) -> Self {
        let text: String = snapshot.text.chars().take(MAX_SNAPSHOT_CHARS).collect();
        let truncated = text.len() < snapshot.text.len();
        Self {
            version_ts: snapshot.version_ts.clone(),
            chunk_id: snapshot.chunk_id,
            text,
            truncated,
        }
    }
}

/// What the lineage panel shows for one result.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LineageView {
    pub url: String,
    pub chunk_id: Option<i64>,
    /// Total snapshots the backend returned.
    pub total: usize,
    pub snapshots: Vec<SnapshotView>,
    /// Newest against previous; `None` with fewer than two snapshots.
    pub diff: Option<Vec<String>>,
}

impl LineageView {
    /// Builds the view from the backend order, which is taken as newest-first.
    pub fn new(url: &str, chunk_id: Option<i64>, snapshots: &[VersionSnapshot]) -> Self {
        let diff = match snapshots {
            [newest, previous, ..] => Some(diff(&newest.text, &previous.text)),
            _ => None,
        };
        Self {
            url: url.to_string(),
            chunk_id,
            total: snapshots.len(),
            snapshots: snapshots
                .iter()
                .take(MAX_SNAPSHOTS)
                .map(SnapshotView::from_snapshot)
                .collect(),
            diff,
        }
    }
}
