//! Text models: URI-identified buffers with version and undo history.
//!
//! Positions are 1-based (line number, column) and columns count Unicode scalar values. Lines
//! are split the way `ropey` splits them; line lengths exclude the line terminator.

use crate::error::BridgeError;
use crate::history::{EditHistory, HistoryEdit, UndoStep};
use crate::uri::ModelUri;
use ropey::Rope;
use serde::{Deserialize, Serialize};

/// A 1-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Line number (1-based).
    pub line_number: usize,
    /// Column (1-based, in chars).
    pub column: usize,
}

impl Position {
    /// Create a position.
    pub fn new(line_number: usize, column: usize) -> Self {
        Self {
            line_number,
            column,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// A 1-based, end-exclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    /// Start line (1-based).
    pub start_line_number: usize,
    /// Start column (1-based).
    pub start_column: usize,
    /// End line (1-based).
    pub end_line_number: usize,
    /// End column (1-based, exclusive).
    pub end_column: usize,
}

impl TextRange {
    /// Create a range.
    pub fn new(
        start_line_number: usize,
        start_column: usize,
        end_line_number: usize,
        end_column: usize,
    ) -> Self {
        Self {
            start_line_number,
            start_column,
            end_line_number,
            end_column,
        }
    }

    /// Range start.
    pub fn start(&self) -> Position {
        Position::new(self.start_line_number, self.start_column)
    }

    /// Range end.
    pub fn end(&self) -> Position {
        Position::new(self.end_line_number, self.end_column)
    }

    fn from_positions(start: Position, end: Position) -> Self {
        Self::new(start.line_number, start.column, end.line_number, end.column)
    }
}

/// A single replace operation as the host sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleEdit {
    /// Range to replace.
    pub range: TextRange,
    /// Replacement text.
    #[serde(default)]
    pub text: String,
}

impl SingleEdit {
    /// Create an edit.
    pub fn new(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }
}

/// One replacement inside a [`ContentChangeEvent`], in pre-change coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChange {
    /// Replaced range.
    pub range: TextRange,
    /// Char offset of the range start.
    pub range_offset: usize,
    /// Replaced length in chars.
    pub range_length: usize,
    /// Inserted text.
    pub text: String,
}

/// Emitted by every model mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChangeEvent {
    /// Model the change happened on.
    pub uri: ModelUri,
    /// Model version after the change.
    pub version: u64,
    /// Primitive replacements in application order.
    pub changes: Vec<ContentChange>,
    /// The whole text was replaced without an edit operation.
    pub is_flush: bool,
    /// Produced by undo.
    pub is_undoing: bool,
    /// Produced by redo.
    pub is_redoing: bool,
}

/// A text buffer.
#[derive(Debug, Clone)]
pub struct TextModel {
    uri: ModelUri,
    language_id: String,
    rope: Rope,
    version: u64,
    history: EditHistory,
}

impl TextModel {
    /// Create a model.
    pub fn new(
        uri: ModelUri,
        text: &str,
        language_id: impl Into<String>,
        max_undo_steps: usize,
    ) -> Self {
        Self {
            uri,
            language_id: language_id.into(),
            rope: Rope::from_str(text),
            version: 1,
            history: EditHistory::new(max_undo_steps),
        }
    }

    /// The model URI.
    pub fn uri(&self) -> &ModelUri {
        &self.uri
    }

    /// The model language id.
    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// Monotonic version, incremented by every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Undo/redo history.
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// Full text.
    pub fn value(&self) -> String {
        self.rope.to_string()
    }

    /// Length in chars.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Number of lines (an empty model has one line).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Content of line `line_number` without its terminator. Out of range yields `""`.
    pub fn line_content(&self, line_number: usize) -> String {
        if line_number == 0 || line_number > self.line_count() {
            return String::new();
        }
        let line = self.rope.line(line_number - 1);
        let len = line.len_chars() - terminator_len(&line);
        line.slice(..len).to_string()
    }

    /// All lines without terminators.
    pub fn lines_content(&self) -> Vec<String> {
        (1..=self.line_count())
            .map(|line_number| self.line_content(line_number))
            .collect()
    }

    /// Length of line `line_number` in chars, excluding the terminator.
    pub fn line_length(&self, line_number: usize) -> usize {
        if line_number == 0 || line_number > self.line_count() {
            return 0;
        }
        let line = self.rope.line(line_number - 1);
        line.len_chars() - terminator_len(&line)
    }

    /// Clamp a position into the model.
    pub fn validate_position(&self, position: Position) -> Position {
        if position.line_number < 1 {
            return Position::new(1, 1);
        }
        let line_count = self.line_count();
        if position.line_number > line_count {
            return Position::new(line_count, self.line_length(line_count) + 1);
        }
        let max_column = self.line_length(position.line_number) + 1;
        Position::new(position.line_number, position.column.clamp(1, max_column))
    }

    /// Char offset of a (clamped) position.
    pub fn offset_at(&self, position: Position) -> usize {
        let position = self.validate_position(position);
        self.rope.line_to_char(position.line_number - 1) + position.column - 1
    }

    /// Position of a (clamped) char offset.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.rope.len_chars());
        let line_idx = self.rope.char_to_line(offset);
        let column = offset - self.rope.line_to_char(line_idx) + 1;
        let max_column = self.line_length(line_idx + 1) + 1;
        Position::new(line_idx + 1, column.min(max_column))
    }

    /// Range covering the whole text.
    pub fn full_range(&self) -> TextRange {
        let line_count = self.line_count();
        TextRange::new(1, 1, line_count, self.line_length(line_count) + 1)
    }

    /// Replace the whole text without an edit operation (a flush). History is cleared.
    pub fn set_value(&mut self, text: &str) -> ContentChangeEvent {
        let change = ContentChange {
            range: self.full_range(),
            range_offset: 0,
            range_length: self.rope.len_chars(),
            text: text.to_string(),
        };
        self.rope = Rope::from_str(text);
        self.history.clear();
        self.version += 1;
        ContentChangeEvent {
            uri: self.uri.clone(),
            version: self.version,
            changes: vec![change],
            is_flush: true,
            is_undoing: false,
            is_redoing: false,
        }
    }

    /// Apply a batch of non-overlapping edits as one undo step.
    ///
    /// Ranges are clamped into the model. Touching ranges are allowed; overlapping ranges are
    /// rejected before anything is modified. Returns `None` for an empty batch.
    pub fn apply_edits(
        &mut self,
        edits: &[SingleEdit],
    ) -> Result<Option<ContentChangeEvent>, BridgeError> {
        if edits.is_empty() {
            return Ok(None);
        }

        let mut ops: Vec<(usize, usize, &str)> = edits
            .iter()
            .map(|edit| {
                let a = self.offset_at(edit.range.start());
                let b = self.offset_at(edit.range.end());
                (a.min(b), a.max(b), edit.text.as_str())
            })
            .collect();
        ops.sort_by_key(|(start, end, _)| (*start, *end));
        if ops.windows(2).any(|pair| pair[0].1 > pair[1].0) {
            return Err(BridgeError::OverlappingEdits);
        }

        // Final-text start offsets, computed in ascending order.
        let mut shift: isize = 0;
        let mut starts_after = Vec::with_capacity(ops.len());
        for (start, end, text) in &ops {
            starts_after.push((*start as isize + shift) as usize);
            shift += text.chars().count() as isize - (end - start) as isize;
        }

        let mut changes = Vec::with_capacity(ops.len());
        let mut recorded = Vec::with_capacity(ops.len());
        for ((start, end, text), start_after) in ops.iter().zip(starts_after).rev() {
            let (change, deleted_text) = self.replace_chars(*start, *end, text);
            changes.push(change);
            recorded.push(HistoryEdit {
                start_before: *start,
                start_after,
                deleted_text,
                inserted_text: text.to_string(),
            });
        }

        self.history.push(UndoStep { edits: recorded });
        self.version += 1;
        Ok(Some(ContentChangeEvent {
            uri: self.uri.clone(),
            version: self.version,
            changes,
            is_flush: false,
            is_undoing: false,
            is_redoing: false,
        }))
    }

    /// Undo the last step. `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<ContentChangeEvent> {
        let step = self.history.pop_undo()?;
        let mut changes = Vec::with_capacity(step.edits.len());
        for edit in step.edits.iter().rev() {
            let end = edit.start_before + edit.inserted_len();
            let (change, _) = self.replace_chars(edit.start_before, end, &edit.deleted_text);
            changes.push(change);
        }
        self.history.push_redo(step);
        self.version += 1;
        Some(ContentChangeEvent {
            uri: self.uri.clone(),
            version: self.version,
            changes,
            is_flush: false,
            is_undoing: true,
            is_redoing: false,
        })
    }

    /// Redo the last undone step. `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<ContentChangeEvent> {
        let step = self.history.pop_redo()?;
        let mut changes = Vec::with_capacity(step.edits.len());
        for edit in &step.edits {
            let end = edit.start_before + edit.deleted_len();
            let (change, _) = self.replace_chars(edit.start_before, end, &edit.inserted_text);
            changes.push(change);
        }
        self.history.push_undone(step);
        self.version += 1;
        Some(ContentChangeEvent {
            uri: self.uri.clone(),
            version: self.version,
            changes,
            is_flush: false,
            is_undoing: false,
            is_redoing: true,
        })
    }

    /// Hand this model's undo/redo history to `target`, leaving this one empty.
    pub fn transfer_history_to(&mut self, target: &mut TextModel) {
        target.history = self.history.take();
    }

    fn replace_chars(&mut self, start: usize, end: usize, text: &str) -> (ContentChange, String) {
        let len = self.rope.len_chars();
        let start = start.min(len);
        let end = end.clamp(start, len);
        let range = TextRange::from_positions(self.position_at(start), self.position_at(end));
        let deleted = self.rope.slice(start..end).to_string();
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        (
            ContentChange {
                range,
                range_offset: start,
                range_length: end - start,
                text: text.to_string(),
            },
            deleted,
        )
    }
}

fn terminator_len(line: &ropey::RopeSlice<'_>) -> usize {
    let len = line.len_chars();
    if len == 0 {
        return 0;
    }
    match line.char(len - 1) {
        '\n' if len >= 2 && line.char(len - 2) == '\r' => 2,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}' => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn model(text: &str) -> TextModel {
        TextModel::new(ModelUri::parse("file:///a.txt"), text, "plaintext", 100)
    }

    #[test]
    fn test_line_queries() {
        let m = model("one\r\ntwo\nthree");
        assert_eq!(m.line_count(), 3);
        assert_eq!(m.lines_content(), vec!["one", "two", "three"]);
        assert_eq!(m.line_length(1), 3);
        assert_eq!(m.line_length(4), 0);
        assert_eq!(m.full_range(), TextRange::new(1, 1, 3, 6));
    }

    #[test]
    fn test_offset_clamping() {
        let m = model("ab\ncd");
        assert_eq!(m.offset_at(Position::new(2, 0)), 3);
        assert_eq!(m.offset_at(Position::new(1, 99)), 2);
        assert_eq!(m.offset_at(Position::new(0, 5)), 0);
        assert_eq!(m.offset_at(Position::new(9, 1)), 5);
        assert_eq!(m.position_at(4), Position::new(2, 2));
    }

    #[test]
    fn test_apply_edits_is_one_undo_step() {
        let mut m = model("hello world");
        let event = m
            .apply_edits(&[
                SingleEdit::new(TextRange::new(1, 7, 1, 12), "there"),
                SingleEdit::new(TextRange::new(1, 1, 1, 6), "HELLO"),
            ])
            .unwrap()
            .unwrap();
        assert_eq!(m.value(), "HELLO there");
        assert_eq!(event.version, 2);
        assert_eq!(event.changes.len(), 2);
        assert_eq!(event.changes[0].range_offset, 6);

        let undo = m.undo().unwrap();
        assert!(undo.is_undoing);
        assert_eq!(m.value(), "hello world");
        m.redo().unwrap();
        assert_eq!(m.value(), "HELLO there");
        assert_eq!(m.version(), 4);
    }

    #[test]
    fn test_overlapping_edits_rejected() {
        let mut m = model("abcdef");
        let err = m.apply_edits(&[
            SingleEdit::new(TextRange::new(1, 1, 1, 4), "x"),
            SingleEdit::new(TextRange::new(1, 3, 1, 5), "y"),
        ]);
        assert!(matches!(err, Err(BridgeError::OverlappingEdits)));
        assert_eq!(m.value(), "abcdef");
        assert_eq!(m.version(), 1);
    }

    #[test]
    fn test_set_value_is_flush_and_clears_history() {
        let mut m = model("a");
        m.apply_edits(&[SingleEdit::new(TextRange::new(1, 2, 1, 2), "b")])
            .unwrap();
        let event = m.set_value("z");
        assert!(event.is_flush);
        assert!(m.undo().is_none());
        assert_eq!(m.value(), "z");
    }

    #[test]
    fn test_multiline_insert_undo() {
        let mut m = model("a\nb");
        m.apply_edits(&[SingleEdit::new(TextRange::new(1, 2, 1, 2), "\nx\ny")])
            .unwrap();
        assert_eq!(m.lines_content(), vec!["a", "x", "y", "b"]);
        m.undo().unwrap();
        assert_eq!(m.value(), "a\nb");
    }
}
