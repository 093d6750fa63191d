//! Diagnostics markers, keyed by owner and model.
//!
//! The JSON shape matches what hosts already consume: camelCase fields and a numeric severity
//! (`1` hint, `2` info, `4` warning, `8` error).

use crate::model::{ContentChangeEvent, TextRange};
use crate::uri::ModelUri;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marker severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MarkerSeverity {
    /// Hint (`1`).
    Hint,
    /// Informational (`2`).
    Info,
    /// Warning (`4`).
    Warning,
    /// Error (`8`).
    Error,
}

impl From<MarkerSeverity> for u8 {
    fn from(value: MarkerSeverity) -> Self {
        match value {
            MarkerSeverity::Hint => 1,
            MarkerSeverity::Info => 2,
            MarkerSeverity::Warning => 4,
            MarkerSeverity::Error => 8,
        }
    }
}

impl TryFrom<u8> for MarkerSeverity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        match value {
            1 => Ok(MarkerSeverity::Hint),
            2 => Ok(MarkerSeverity::Info),
            4 => Ok(MarkerSeverity::Warning),
            8 => Ok(MarkerSeverity::Error),
            other => Err(format!("invalid marker severity {other}")),
        }
    }
}

/// Marker as supplied by a producer (host or language server), before it is bound to an owner
/// and a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerData {
    /// Severity.
    pub severity: MarkerSeverity,
    /// Message text.
    pub message: String,
    /// Producer name (e.g. `rust-analyzer`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Diagnostic code, stringified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Start line (1-based).
    pub start_line_number: usize,
    /// Start column (1-based).
    pub start_column: usize,
    /// End line (1-based).
    pub end_line_number: usize,
    /// End column (1-based).
    pub end_column: usize,
}

/// A stored marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Owner id.
    pub owner: String,
    /// Model URI.
    pub resource: ModelUri,
    /// Severity.
    pub severity: MarkerSeverity,
    /// Message text.
    pub message: String,
    /// Producer name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Diagnostic code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Start line (1-based).
    pub start_line_number: usize,
    /// Start column (1-based).
    pub start_column: usize,
    /// End line (1-based).
    pub end_line_number: usize,
    /// End column (1-based).
    pub end_column: usize,
}

impl Marker {
    fn from_data(owner: &str, resource: &ModelUri, data: MarkerData) -> Self {
        Self {
            owner: owner.to_string(),
            resource: resource.clone(),
            severity: data.severity,
            message: data.message,
            source: data.source,
            code: data.code,
            start_line_number: data.start_line_number.max(1),
            start_column: data.start_column.max(1),
            end_line_number: data.end_line_number.max(1),
            end_column: data.end_column.max(1),
        }
    }

    /// Marker range.
    pub fn range(&self) -> TextRange {
        TextRange::new(
            self.start_line_number,
            self.start_column,
            self.end_line_number,
            self.end_column,
        )
    }
}

/// Marker storage.
#[derive(Debug, Default)]
pub struct MarkerStore {
    entries: BTreeMap<(ModelUri, String), Vec<Marker>>,
}

impl MarkerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the markers `owner` holds for `resource`. Returns whether anything changed.
    pub fn change(&mut self, owner: &str, resource: &ModelUri, data: Vec<MarkerData>) -> bool {
        let key = (resource.clone(), owner.to_string());
        let markers: Vec<Marker> = data
            .into_iter()
            .map(|item| Marker::from_data(owner, resource, item))
            .collect();
        if markers.is_empty() {
            return self.entries.remove(&key).is_some();
        }
        let changed = self.entries.get(&key) != Some(&markers);
        self.entries.insert(key, markers);
        changed
    }

    /// Drop the markers `owner` holds for `resource`. Returns whether any existed.
    pub fn remove(&mut self, owner: &str, resource: &ModelUri) -> bool {
        self.entries
            .remove(&(resource.clone(), owner.to_string()))
            .is_some()
    }

    /// Every marker, ordered by resource then owner.
    pub fn all(&self) -> Vec<Marker> {
        self.entries.values().flatten().cloned().collect()
    }

    /// Markers attached to `resource`, across owners.
    pub fn for_model(&self, resource: &ModelUri) -> Vec<Marker> {
        self.entries
            .iter()
            .filter(|((uri, _), _)| uri == resource)
            .flat_map(|(_, markers)| markers.iter().cloned())
            .collect()
    }

    /// Shift marker lines after an incremental edit so they stay on the text they describe.
    ///
    /// Markers below an edit move by the edit's line delta; markers overlapping it collapse onto
    /// its start. Flush events leave markers alone.
    pub fn adjust_for_change(&mut self, event: &ContentChangeEvent) {
        if event.is_flush {
            return;
        }
        for ((uri, _), markers) in self.entries.iter_mut() {
            if uri != &event.uri {
                continue;
            }
            for change in &event.changes {
                let start = change.range.start_line_number;
                let end = change.range.end_line_number;
                let inserted_lines = change.text.matches('\n').count();
                let delta = inserted_lines as isize - (end - start) as isize;
                for marker in markers.iter_mut() {
                    if marker.start_line_number > end {
                        marker.start_line_number = shift(marker.start_line_number, delta);
                        marker.end_line_number = shift(marker.end_line_number, delta);
                    } else if marker.end_line_number > end {
                        marker.end_line_number = shift(marker.end_line_number, delta);
                    } else if marker.start_line_number > start {
                        marker.start_line_number = start;
                        marker.end_line_number = start;
                    }
                }
            }
        }
    }
}

fn shift(line: usize, delta: isize) -> usize {
    (line as isize + delta).max(1) as usize
}
