//! Per-model undo/redo history.
//!
//! History is stored as character-offset edits so it can be replayed against any model holding
//! the same text. That is what lets a rename carry history over to the new model.

/// One primitive replacement, recorded in both coordinate spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEdit {
    /// Start offset in the text before the step was applied.
    pub start_before: usize,
    /// Start offset in the text after the step was applied.
    pub start_after: usize,
    /// Text that was removed.
    pub deleted_text: String,
    /// Text that was inserted.
    pub inserted_text: String,
}

impl HistoryEdit {
    /// Removed length in chars.
    pub fn deleted_len(&self) -> usize {
        self.deleted_text.chars().count()
    }

    /// Inserted length in chars.
    pub fn inserted_len(&self) -> usize {
        self.inserted_text.chars().count()
    }
}

/// A group of edits undone/redone together.
///
/// `edits` are kept in application order (descending offsets), so undo walks them in reverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoStep {
    /// Edits in the order they were applied.
    pub edits: Vec<HistoryEdit>,
}

/// Bounded undo/redo stacks.
#[derive(Debug, Clone)]
pub struct EditHistory {
    undo_stack: Vec<UndoStep>,
    redo_stack: Vec<UndoStep>,
    max_undo: usize,
}

impl EditHistory {
    /// Create an empty history keeping at most `max_undo` steps.
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo,
        }
    }

    /// Whether an undo step is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether a redo step is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo steps.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Record a fresh step. Clears the redo stack and evicts the oldest step when full.
    pub fn push(&mut self, step: UndoStep) {
        if step.edits.is_empty() {
            return;
        }
        self.redo_stack.clear();
        if self.max_undo == 0 {
            return;
        }
        if self.undo_stack.len() >= self.max_undo {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(step);
    }

    /// Pop the most recent step for undoing.
    pub fn pop_undo(&mut self) -> Option<UndoStep> {
        self.undo_stack.pop()
    }

    /// Pop the most recently undone step for redoing.
    pub fn pop_redo(&mut self) -> Option<UndoStep> {
        self.redo_stack.pop()
    }

    /// Park an undone step on the redo stack.
    pub fn push_redo(&mut self, step: UndoStep) {
        self.redo_stack.push(step);
    }

    /// Put a redone step back on the undo stack without touching the redo stack.
    pub fn push_undone(&mut self, step: UndoStep) {
        self.undo_stack.push(step);
    }

    /// Drop everything (used when the text is flushed).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Move the full history out, leaving an empty one with the same bound behind.
    pub fn take(&mut self) -> EditHistory {
        std::mem::replace(self, EditHistory::new(self.max_undo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(text: &str) -> UndoStep {
        UndoStep {
            edits: vec![HistoryEdit {
                start_before: 0,
                start_after: 0,
                deleted_text: String::new(),
                inserted_text: text.to_string(),
            }],
        }
    }

    #[test]
    fn test_bound_evicts_oldest() {
        let mut history = EditHistory::new(2);
        history.push(step("a"));
        history.push(step("b"));
        history.push(step("c"));
        assert_eq!(history.undo_depth(), 2);
        assert_eq!(history.pop_undo(), Some(step("c")));
        assert_eq!(history.pop_undo(), Some(step("b")));
        assert_eq!(history.pop_undo(), None);
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = EditHistory::new(10);
        history.push(step("a"));
        let undone = history.pop_undo().unwrap();
        history.push_redo(undone);
        assert!(history.can_redo());
        history.push(step("b"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_take_leaves_empty_history() {
        let mut history = EditHistory::new(10);
        history.push(step("a"));
        let taken = history.take();
        assert_eq!(taken.undo_depth(), 1);
        assert!(!history.can_undo());
    }
}
