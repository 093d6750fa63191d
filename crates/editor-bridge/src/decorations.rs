//! Surface decorations and the dirty-diff decoration renderer.
//!
//! Decorations are UI-facing annotations anchored to model ranges. They do not modify the text
//! and nothing here renders them: the host reads the live set of a surface and draws it.
//!
//! Each surface owns a single [`DecorationSet`]. Updates go through
//! [`DecorationSet::delta`], which removes a list of handles and adds new decorations in one
//! atomic step, so a set is never observed half-replaced.

use crate::diff::{ChangeKind, LineChange};
use crate::model::TextRange;
use serde::Serialize;
use std::collections::BTreeMap;

/// Column used for zero-width decorations pinned to the end of a line.
pub const MAX_COLUMN: usize = usize::MAX;

/// Opaque handle of a live decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DecorationHandle(pub u64);

/// Where a minimap marker is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum MinimapPosition {
    /// Inline with the text.
    Inline,
    /// In the gutter.
    Gutter,
}

impl From<MinimapPosition> for u8 {
    fn from(value: MinimapPosition) -> Self {
        match value {
            MinimapPosition::Inline => 1,
            MinimapPosition::Gutter => 2,
        }
    }
}

/// Minimap appearance of a decoration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimapOptions {
    /// Colour used by light themes.
    pub color: String,
    /// Colour used by dark themes.
    pub dark_color: String,
    /// Placement.
    pub position: MinimapPosition,
}

/// Rendering options of a decoration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationOptions {
    /// Extend the decoration across the whole line.
    pub is_whole_line: bool,
    /// CSS-like class used to draw the line gutter.
    pub lines_decorations_class_name: String,
    /// Minimap marker.
    pub minimap: Option<MinimapOptions>,
}

/// A decoration as requested by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDecoration {
    /// Anchor range.
    pub range: TextRange,
    /// Rendering options.
    pub options: DecorationOptions,
}

/// The live decorations of one surface.
#[derive(Debug, Default)]
pub struct DecorationSet {
    next_handle: u64,
    generation: u64,
    items: BTreeMap<DecorationHandle, ModelDecoration>,
}

impl DecorationSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `old` and add `new` in one step, returning the handles of `new` in order.
    ///
    /// Unknown handles in `old` are ignored.
    pub fn delta(
        &mut self,
        old: &[DecorationHandle],
        new: Vec<ModelDecoration>,
    ) -> Vec<DecorationHandle> {
        for handle in old {
            self.items.remove(handle);
        }
        let handles = new
            .into_iter()
            .map(|decoration| {
                self.next_handle += 1;
                let handle = DecorationHandle(self.next_handle);
                self.items.insert(handle, decoration);
                handle
            })
            .collect();
        self.generation += 1;
        handles
    }

    /// Drop every decoration.
    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            self.items.clear();
            self.generation += 1;
        }
    }

    /// Bumped by every mutation; hosts compare it to skip redundant redraws.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of live decorations.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a live decoration.
    pub fn get(&self, handle: DecorationHandle) -> Option<&ModelDecoration> {
        self.items.get(&handle)
    }

    /// Live decorations in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (DecorationHandle, &ModelDecoration)> {
        self.items.iter().map(|(handle, decoration)| (*handle, decoration))
    }
}

fn options(class_name: &str, color: &str, dark_color: &str, is_whole_line: bool) -> DecorationOptions {
    DecorationOptions {
        is_whole_line,
        lines_decorations_class_name: class_name.to_string(),
        minimap: Some(MinimapOptions {
            color: color.to_string(),
            dark_color: dark_color.to_string(),
            position: MinimapPosition::Gutter,
        }),
    }
}

/// Map diff changes to gutter decorations on the modified side.
///
/// Each change covers `modified_start..=modified_end` (or just `modified_start` when the end is
/// zero). Deletions are zero-width markers at the end of the line before the removed block.
pub fn dirty_diff_decorations(changes: &[LineChange]) -> Vec<ModelDecoration> {
    changes
        .iter()
        .map(|change| {
            let start = change.modified_start_line_number;
            let end = if change.modified_end_line_number == 0 {
                start
            } else {
                change.modified_end_line_number
            };
            match change.kind() {
                ChangeKind::Added => ModelDecoration {
                    range: TextRange::new(start, 1, end, 1),
                    options: options("addedBackground", "#81b88b", "#587c0c", true),
                },
                ChangeKind::Modified => ModelDecoration {
                    range: TextRange::new(start, 1, end, 1),
                    options: options("modifiedBackground", "#66afe0", "#0c7d9d", true),
                },
                ChangeKind::Deleted => {
                    let line = start.max(1);
                    ModelDecoration {
                        range: TextRange::new(line, MAX_COLUMN, line, MAX_COLUMN),
                        options: options("deletedBackground", "#ca4b51", "#94151b", false),
                    }
                }
            }
        })
        .collect()
}

/// Tracks the handles of the last dirty-diff render so the next one can replace them.
#[derive(Debug, Default)]
pub struct DecorationRenderer {
    previous: Vec<DecorationHandle>,
}

impl DecorationRenderer {
    /// Create a renderer with no prior render.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the previous render on `set` with decorations for `changes`.
    pub fn render(&mut self, set: &mut DecorationSet, changes: &[LineChange]) {
        let decorations = dirty_diff_decorations(changes);
        self.previous = set.delta(&self.previous, decorations);
    }

    /// Remove the previous render from `set`.
    pub fn clear(&mut self, set: &mut DecorationSet) {
        self.render(set, &[]);
    }

    /// Forget the previous handles (their surface is gone).
    pub fn reset(&mut self) {
        self.previous.clear();
    }

    /// Handles of the last render.
    pub fn previous(&self) -> &[DecorationHandle] {
        &self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn change(os: usize, oe: usize, ms: usize, me: usize) -> LineChange {
        LineChange {
            original_start_line_number: os,
            original_end_line_number: oe,
            modified_start_line_number: ms,
            modified_end_line_number: me,
        }
    }

    #[test]
    fn test_decoration_per_kind() {
        let decorations = dirty_diff_decorations(&[
            change(1, 0, 2, 3),
            change(5, 5, 6, 6),
            change(8, 9, 0, 0),
        ]);
        assert_eq!(decorations.len(), 3);

        assert_eq!(decorations[0].range, TextRange::new(2, 1, 3, 1));
        assert_eq!(decorations[0].options.lines_decorations_class_name, "addedBackground");
        assert!(decorations[0].options.is_whole_line);

        assert_eq!(decorations[1].options.lines_decorations_class_name, "modifiedBackground");

        assert_eq!(
            decorations[2].range,
            TextRange::new(1, MAX_COLUMN, 1, MAX_COLUMN)
        );
        assert!(!decorations[2].options.is_whole_line);
        let minimap = decorations[2].options.minimap.as_ref().unwrap();
        assert_eq!(minimap.color, "#ca4b51");
        assert_eq!(minimap.dark_color, "#94151b");
    }

    #[test]
    fn test_render_replaces_previous() {
        let mut set = DecorationSet::new();
        let mut renderer = DecorationRenderer::new();
        renderer.render(&mut set, &[change(1, 0, 2, 2), change(3, 3, 4, 4)]);
        assert_eq!(set.len(), 2);
        renderer.render(&mut set, &[change(1, 0, 2, 2)]);
        assert_eq!(set.len(), 1);
        renderer.clear(&mut set);
        assert!(set.is_empty());
        assert!(renderer.previous().is_empty());
    }

    #[test]
    fn test_delta_ignores_unknown_handles() {
        let mut set = DecorationSet::new();
        let handles = set.delta(&[DecorationHandle(42)], dirty_diff_decorations(&[change(1, 0, 1, 1)]));
        assert_eq!(handles.len(), 1);
        assert!(set.get(handles[0]).is_some());
        assert_eq!(set.generation(), 1);
    }
}
