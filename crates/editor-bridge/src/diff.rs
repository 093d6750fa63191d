//! Line-level dirty diff between a baseline and a live model.
//!
//! The diff runs over lines with leading/trailing blanks stripped, which keeps indentation
//! churn from fragmenting hunks. Raw hunks are then "prettified": each one slides down while
//! the lines it would move over are equal, then slides back up to the spot whose edges sit on
//! the most boundaries (blank lines, sequence ends, the previous hunk). Hunks that end up
//! touching are merged.
//!
//! Line numbers in the result follow the usual editor convention: a pure insertion has
//! `original_end_line_number == 0` and `original_start_line_number` pointing at the line before
//! it, and symmetrically for deletions on the modified side.

use crate::registry::ModelRegistry;
use crate::uri::ModelUri;
use serde::Serialize;
use similar::{Algorithm, DiffTag, TextDiff};
use std::time::{Duration, Instant};

/// A changed line region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChange {
    /// First original line (or the line before an insertion).
    pub original_start_line_number: usize,
    /// Last original line, `0` for an insertion.
    pub original_end_line_number: usize,
    /// First modified line (or the line before a deletion).
    pub modified_start_line_number: usize,
    /// Last modified line, `0` for a deletion.
    pub modified_end_line_number: usize,
}

/// How a [`LineChange`] is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    /// Lines exist only in the modified text.
    Added,
    /// Lines exist only in the original text.
    Deleted,
    /// Lines were replaced.
    Modified,
}

impl LineChange {
    /// Classify the change.
    pub fn kind(&self) -> ChangeKind {
        if self.original_end_line_number == 0 {
            ChangeKind::Added
        } else if self.modified_end_line_number == 0 {
            ChangeKind::Deleted
        } else {
            ChangeKind::Modified
        }
    }
}

/// Diff tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Report lines that only differ in leading/trailing whitespace as unchanged.
    pub ignore_trim_whitespace: bool,
    /// Wall-clock ceiling; past it the best partial result is returned.
    pub time_budget: Duration,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            ignore_trim_whitespace: true,
            time_budget: Duration::from_millis(1000),
        }
    }
}

/// Diff output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    /// The time budget ran out before an optimal diff was found.
    pub quit_early: bool,
    /// Changes in document order.
    pub changes: Vec<LineChange>,
}

/// A hunk in 0-based sequence coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawChange {
    original_start: usize,
    original_length: usize,
    modified_start: usize,
    modified_length: usize,
}

impl RawChange {
    fn original_end(&self) -> usize {
        self.original_start + self.original_length
    }

    fn modified_end(&self) -> usize {
        self.modified_start + self.modified_length
    }

    fn to_line_change(self) -> LineChange {
        let (original_start_line_number, original_end_line_number) = if self.original_length == 0
        {
            (self.original_start, 0)
        } else {
            (self.original_start + 1, self.original_end())
        };
        let (modified_start_line_number, modified_end_line_number) = if self.modified_length == 0
        {
            (self.modified_start, 0)
        } else {
            (self.modified_start + 1, self.modified_end())
        };
        LineChange {
            original_start_line_number,
            original_end_line_number,
            modified_start_line_number,
            modified_end_line_number,
        }
    }
}

/// Diff two line lists.
pub fn compute_line_diff<S: AsRef<str>>(
    original: &[S],
    modified: &[S],
    options: &DiffOptions,
) -> DiffResult {
    let original: Vec<&str> = original.iter().map(AsRef::as_ref).collect();
    let modified: Vec<&str> = modified.iter().map(AsRef::as_ref).collect();

    if is_single_empty_line(&original) {
        if is_single_empty_line(&modified) {
            return DiffResult::default();
        }
        return DiffResult {
            quit_early: false,
            changes: vec![LineChange {
                original_start_line_number: 1,
                original_end_line_number: 1,
                modified_start_line_number: 1,
                modified_end_line_number: modified.len().max(1),
            }],
        };
    }
    if is_single_empty_line(&modified) {
        return DiffResult {
            quit_early: false,
            changes: vec![LineChange {
                original_start_line_number: 1,
                original_end_line_number: original.len(),
                modified_start_line_number: 1,
                modified_end_line_number: 1,
            }],
        };
    }

    let sequences = Sequences {
        original_trimmed: original.iter().map(|line| trim_blanks(line)).collect(),
        modified_trimmed: modified.iter().map(|line| trim_blanks(line)).collect(),
        original_raw: &original,
        modified_raw: &modified,
    };

    let started = Instant::now();
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .timeout(options.time_budget)
        .diff_slices(&sequences.original_trimmed, &sequences.modified_trimmed);

    let mut raw: Vec<RawChange> = Vec::new();
    for op in diff.ops() {
        if op.tag() == DiffTag::Equal {
            continue;
        }
        let old_range = op.old_range();
        let new_range = op.new_range();
        match raw.last_mut() {
            Some(last)
                if last.original_end() == old_range.start
                    && last.modified_end() == new_range.start =>
            {
                last.original_length += old_range.len();
                last.modified_length += new_range.len();
            }
            _ => raw.push(RawChange {
                original_start: old_range.start,
                original_length: old_range.len(),
                modified_start: new_range.start,
                modified_length: new_range.len(),
            }),
        }
    }
    let quit_early = started.elapsed() >= options.time_budget;
    if quit_early {
        tracing::debug!(budget = ?options.time_budget, "diff time budget exceeded");
    }

    let raw = sequences.prettify(raw);

    let changes = if options.ignore_trim_whitespace {
        raw.into_iter().map(RawChange::to_line_change).collect()
    } else {
        sequences.with_whitespace_changes(&raw)
    };

    DiffResult {
        quit_early,
        changes,
    }
}

/// Diff two registered models. `None` when either is missing.
pub fn compute_dirty_diff(
    registry: &ModelRegistry,
    original_uri: &ModelUri,
    modified_uri: &ModelUri,
    options: &DiffOptions,
) -> Option<DiffResult> {
    let original = registry.get(original_uri)?;
    let modified = registry.get(modified_uri)?;
    Some(compute_line_diff(
        &original.lines_content(),
        &modified.lines_content(),
        options,
    ))
}

fn is_single_empty_line(lines: &[&str]) -> bool {
    lines.is_empty() || (lines.len() == 1 && lines[0].is_empty())
}

fn trim_blanks(line: &str) -> &str {
    line.trim_matches([' ', '\t'])
}

struct Sequences<'a> {
    original_trimmed: Vec<&'a str>,
    modified_trimmed: Vec<&'a str>,
    original_raw: &'a [&'a str],
    modified_raw: &'a [&'a str],
}

impl Sequences<'_> {
    fn original_equal(&self, a: usize, b: usize) -> bool {
        self.original_trimmed.get(a) == self.original_trimmed.get(b)
    }

    fn modified_equal(&self, a: usize, b: usize) -> bool {
        self.modified_trimmed.get(a) == self.modified_trimmed.get(b)
    }

    fn strict_equal(&self, original: usize, modified: usize) -> bool {
        match (self.original_raw.get(original), self.modified_raw.get(modified)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn original_is_boundary(&self, index: isize) -> bool {
        let len = self.original_trimmed.len() as isize;
        if index <= 0 || index >= len - 1 {
            return true;
        }
        self.original_trimmed[index as usize].is_empty()
    }

    fn modified_is_boundary(&self, index: isize) -> bool {
        let len = self.modified_trimmed.len() as isize;
        if index <= 0 || index >= len - 1 {
            return true;
        }
        self.modified_trimmed[index as usize].is_empty()
    }

    fn original_region_is_boundary(&self, start: usize, length: usize) -> bool {
        let start = start as isize;
        if self.original_is_boundary(start) || self.original_is_boundary(start - 1) {
            return true;
        }
        if length > 0 {
            let end = start + length as isize;
            if self.original_is_boundary(end - 1) || self.original_is_boundary(end) {
                return true;
            }
        }
        false
    }

    fn modified_region_is_boundary(&self, start: usize, length: usize) -> bool {
        let start = start as isize;
        if self.modified_is_boundary(start) || self.modified_is_boundary(start - 1) {
            return true;
        }
        if length > 0 {
            let end = start + length as isize;
            if self.modified_is_boundary(end - 1) || self.modified_is_boundary(end) {
                return true;
            }
        }
        false
    }

    fn boundary_score(&self, change: &RawChange) -> u32 {
        u32::from(self.original_region_is_boundary(change.original_start, change.original_length))
            + u32::from(
                self.modified_region_is_boundary(change.modified_start, change.modified_length),
            )
    }

    fn prettify(&self, mut changes: Vec<RawChange>) -> Vec<RawChange> {
        let original_len = self.original_trimmed.len();
        let modified_len = self.modified_trimmed.len();

        // Slide each hunk down as far as equal lines allow.
        let mut i = 0;
        while i < changes.len() {
            let (original_stop, modified_stop) = match changes.get(i + 1) {
                Some(next) => (next.original_start, next.modified_start),
                None => (original_len, modified_len),
            };
            let change = &mut changes[i];
            let check_original = change.original_length > 0;
            let check_modified = change.modified_length > 0;
            while change.original_end() < original_stop
                && change.modified_end() < modified_stop
                && (!check_original
                    || self.original_equal(change.original_start, change.original_end()))
                && (!check_modified
                    || self.modified_equal(change.modified_start, change.modified_end()))
            {
                let start_strict = self.strict_equal(change.original_start, change.modified_start);
                let end_strict = self.strict_equal(change.original_end(), change.modified_end());
                if end_strict && !start_strict {
                    break;
                }
                change.original_start += 1;
                change.modified_start += 1;
            }

            if i + 1 < changes.len()
                && let Some(merged) = merge_overlapping(&changes[i], &changes[i + 1])
            {
                changes[i] = merged;
                changes.remove(i + 1);
                continue;
            }
            i += 1;
        }

        // Slide each hunk back up to the best-scoring boundary.
        let mut i = changes.len();
        while i > 0 {
            i -= 1;
            let (original_stop, modified_stop) = match i.checked_sub(1) {
                Some(prev) => (changes[prev].original_end(), changes[prev].modified_end()),
                None => (0, 0),
            };
            let change = changes[i];
            let check_original = change.original_length > 0;
            let check_modified = change.modified_length > 0;

            let mut best_delta = 0;
            let mut best_score = self.boundary_score(&change);
            let mut delta = 1;
            while change.original_start >= original_stop + delta
                && change.modified_start >= modified_stop + delta
            {
                let original_start = change.original_start - delta;
                let modified_start = change.modified_start - delta;
                if check_original
                    && !self.original_equal(original_start, original_start + change.original_length)
                {
                    break;
                }
                if check_modified
                    && !self.modified_equal(modified_start, modified_start + change.modified_length)
                {
                    break;
                }
                let touching_previous =
                    original_start == original_stop && modified_start == modified_stop;
                let candidate = RawChange {
                    original_start,
                    modified_start,
                    ..change
                };
                let score =
                    (if touching_previous { 5 } else { 0 }) + self.boundary_score(&candidate);
                if score > best_score {
                    best_score = score;
                    best_delta = delta;
                }
                delta += 1;
            }

            changes[i].original_start -= best_delta;
            changes[i].modified_start -= best_delta;

            if i > 0
                && let Some(merged) = merge_overlapping(&changes[i - 1], &changes[i])
            {
                changes[i - 1] = merged;
                changes.remove(i);
            }
        }

        changes
    }

    /// Emit the hunks plus one-line changes for equal-after-trim lines whose raw text differs.
    fn with_whitespace_changes(&self, raw: &[RawChange]) -> Vec<LineChange> {
        let mut result: Vec<LineChange> = Vec::new();
        let mut original_index = 0;
        let mut modified_index = 0;
        for next in raw.iter().map(Some).chain(std::iter::once(None)) {
            let (original_stop, modified_stop) = match next {
                Some(change) => (change.original_start, change.modified_start),
                None => (self.original_raw.len(), self.modified_raw.len()),
            };
            while original_index < original_stop && modified_index < modified_stop {
                if self.original_raw[original_index] != self.modified_raw[modified_index] {
                    push_whitespace_change(&mut result, original_index + 1, modified_index + 1);
                }
                original_index += 1;
                modified_index += 1;
            }
            if let Some(change) = next {
                result.push(change.to_line_change());
                original_index = change.original_end();
                modified_index = change.modified_end();
            }
        }
        result
    }
}

fn merge_overlapping(left: &RawChange, right: &RawChange) -> Option<RawChange> {
    if left.original_end() >= right.original_start || left.modified_end() >= right.modified_start
    {
        let original_start = left.original_start;
        let modified_start = left.modified_start;
        Some(RawChange {
            original_start,
            original_length: left.original_end().max(right.original_end()) - original_start,
            modified_start,
            modified_length: left.modified_end().max(right.modified_end()) - modified_start,
        })
    } else {
        None
    }
}

fn push_whitespace_change(result: &mut Vec<LineChange>, original_line: usize, modified_line: usize) {
    if let Some(prev) = result.last_mut()
        && prev.original_end_line_number != 0
        && prev.modified_end_line_number != 0
    {
        if prev.original_end_line_number == original_line
            && prev.modified_end_line_number == modified_line
        {
            return;
        }
        if prev.original_end_line_number + 1 == original_line
            && prev.modified_end_line_number + 1 == modified_line
        {
            prev.original_end_line_number = original_line;
            prev.modified_end_line_number = modified_line;
            return;
        }
    }
    result.push(LineChange {
        original_start_line_number: original_line,
        original_end_line_number: original_line,
        modified_start_line_number: modified_line,
        modified_end_line_number: modified_line,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn diff(original: &[&str], modified: &[&str]) -> Vec<LineChange> {
        compute_line_diff(original, modified, &DiffOptions::default()).changes
    }

    fn change(os: usize, oe: usize, ms: usize, me: usize) -> LineChange {
        LineChange {
            original_start_line_number: os,
            original_end_line_number: oe,
            modified_start_line_number: ms,
            modified_end_line_number: me,
        }
    }

    #[test]
    fn test_insertion_in_the_middle() {
        let changes = diff(&["a", "b"], &["a", "x", "b"]);
        assert_eq!(changes, vec![change(1, 0, 2, 2)]);
        assert_eq!(changes[0].kind(), ChangeKind::Added);
    }

    #[test]
    fn test_deletion_and_modification() {
        assert_eq!(diff(&["a", "b", "c"], &["a", "c"]), vec![change(2, 2, 1, 0)]);
        assert_eq!(diff(&["a", "b", "c"], &["a", "B", "c"]), vec![change(2, 2, 2, 2)]);
    }

    #[test]
    fn test_empty_fast_paths() {
        assert!(diff(&[""], &[""]).is_empty());
        assert_eq!(diff(&[""], &["a", "b"]), vec![change(1, 1, 1, 2)]);
        assert_eq!(diff(&["a", "b", "c"], &[""]), vec![change(1, 3, 1, 1)]);
    }

    #[test]
    fn test_insertion_slides_to_blank_line_boundary() {
        // The inserted block is ambiguous: "}", "", "fn b() {" could start after line 2 or 3.
        let original = ["fn a() {", "}", "", "fn c() {", "}"];
        let modified = ["fn a() {", "}", "", "fn b() {", "}", "", "fn c() {", "}"];
        let changes = diff(&original, &modified);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind(), ChangeKind::Added);
        assert_eq!(changes[0].modified_end_line_number - changes[0].modified_start_line_number, 2);
        assert_eq!(changes[0].modified_start_line_number, 4);
    }

    #[test]
    fn test_whitespace_only_changes() {
        let original = ["a", "  b", "c", "d"];
        let modified = ["a", "b", "c ", "d"];
        assert!(diff(&original, &modified).is_empty());

        let options = DiffOptions {
            ignore_trim_whitespace: false,
            ..DiffOptions::default()
        };
        let result = compute_line_diff(&original, &modified, &options);
        assert_eq!(result.changes, vec![change(2, 3, 2, 3)]);
    }

    #[test]
    fn test_generous_budget_does_not_quit_early() {
        let result = compute_line_diff(&["a", "b"], &["b", "a"], &DiffOptions::default());
        assert!(!result.quit_early);
        assert!(!result.changes.is_empty());
    }
}
