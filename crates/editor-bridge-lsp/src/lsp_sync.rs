//! Document synchronization and diagnostic conversion.
//!
//! Documents are synced with full-text `didChange` notifications: the tracker remembers the
//! last version sent for each open document and diffs that against the registry.

use crate::lsp_events::{LspDiagnostic, LspDiagnosticSeverity, LspPosition};
use crate::lsp_uri::document_uri;
use editor_bridge::{MarkerData, MarkerSeverity, ModelRegistry, ModelUri, TextModel};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Convert a UTF-16 code unit offset into a char offset within `line_text`.
pub fn utf16_to_char_offset(line_text: &str, utf16_offset: usize) -> usize {
    let mut current_utf16 = 0;
    let mut char_count = 0;
    for ch in line_text.chars() {
        if current_utf16 >= utf16_offset {
            break;
        }
        current_utf16 += ch.len_utf16();
        char_count += 1;
    }
    char_count
}

/// 1-based (line, column) for an LSP position, resolved against `model` when present.
fn marker_position(model: Option<&TextModel>, position: LspPosition) -> (usize, usize) {
    let line_number = position.line as usize + 1;
    let column = match model {
        Some(model) => {
            let line_text = model.line_content(line_number);
            utf16_to_char_offset(&line_text, position.character as usize) + 1
        }
        None => position.character as usize + 1,
    };
    (line_number, column)
}

/// Convert diagnostics into markers for `model`.
///
/// Missing severities count as errors.
pub fn diagnostics_to_markers(
    model: Option<&TextModel>,
    diagnostics: &[LspDiagnostic],
) -> Vec<MarkerData> {
    diagnostics
        .iter()
        .map(|diagnostic| {
            let (start_line_number, start_column) =
                marker_position(model, diagnostic.range.start);
            let (end_line_number, end_column) = marker_position(model, diagnostic.range.end);
            MarkerData {
                severity: match diagnostic.severity {
                    Some(LspDiagnosticSeverity::Warning) => MarkerSeverity::Warning,
                    Some(LspDiagnosticSeverity::Information) => MarkerSeverity::Info,
                    Some(LspDiagnosticSeverity::Hint) => MarkerSeverity::Hint,
                    Some(LspDiagnosticSeverity::Error) | None => MarkerSeverity::Error,
                },
                message: diagnostic.message.clone(),
                source: diagnostic.source.clone(),
                code: diagnostic.code.as_ref().map(|code| match code {
                    Value::String(code) => code.clone(),
                    other => other.to_string(),
                }),
                start_line_number,
                start_column,
                end_line_number,
                end_column,
            }
        })
        .collect()
}

/// One document notification to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSync {
    /// `textDocument/didOpen`
    Open {
        /// Model URI.
        uri: ModelUri,
        /// Language id.
        language_id: String,
        /// Model version.
        version: u64,
        /// Full text.
        text: String,
    },
    /// `textDocument/didChange` with the full text.
    Change {
        /// Model URI.
        uri: ModelUri,
        /// Model version.
        version: u64,
        /// Full text.
        text: String,
    },
    /// `textDocument/didClose`
    Close {
        /// Model URI.
        uri: ModelUri,
    },
}

impl DocumentSync {
    /// JSON-RPC method and params.
    pub fn to_notification(&self) -> (&'static str, Value) {
        match self {
            Self::Open {
                uri,
                language_id,
                version,
                text,
            } => (
                "textDocument/didOpen",
                json!({
                    "textDocument": {
                        "uri": document_uri(uri),
                        "languageId": language_id,
                        "version": version,
                        "text": text,
                    }
                }),
            ),
            Self::Change { uri, version, text } => (
                "textDocument/didChange",
                json!({
                    "textDocument": { "uri": document_uri(uri), "version": version },
                    "contentChanges": [{ "text": text }],
                }),
            ),
            Self::Close { uri } => (
                "textDocument/didClose",
                json!({ "textDocument": { "uri": document_uri(uri) } }),
            ),
        }
    }
}

/// Versions of the documents the server has open.
#[derive(Debug, Default)]
pub struct DocumentTracker {
    open: BTreeMap<ModelUri, u64>,
}

impl DocumentTracker {
    /// Nothing open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `uri` is open on the server.
    pub fn is_open(&self, uri: &ModelUri) -> bool {
        self.open.contains_key(uri)
    }

    /// Number of open documents.
    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// Whether no document is open.
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Bring the server's view in line with `registry` and return what to send.
    ///
    /// A model is synced when its language is `language` and its URI does not start with
    /// `excluded_prefix` (baselines).
    pub fn plan(
        &mut self,
        registry: &ModelRegistry,
        language: &str,
        excluded_prefix: &str,
    ) -> Vec<DocumentSync> {
        let wanted: BTreeMap<&ModelUri, &TextModel> = registry
            .iter()
            .filter(|model| {
                model.language_id() == language
                    && !model.uri().as_str().starts_with(excluded_prefix)
            })
            .map(|model| (model.uri(), model))
            .collect();

        let mut actions = Vec::new();
        self.open.retain(|uri, _| {
            let keep = wanted.contains_key(uri);
            if !keep {
                actions.push(DocumentSync::Close { uri: uri.clone() });
            }
            keep
        });

        for (uri, model) in wanted {
            match self.open.get(uri) {
                Some(&version) if version == model.version() => {}
                Some(_) => actions.push(DocumentSync::Change {
                    uri: uri.clone(),
                    version: model.version(),
                    text: model.value(),
                }),
                None => actions.push(DocumentSync::Open {
                    uri: uri.clone(),
                    language_id: model.language_id().to_string(),
                    version: model.version(),
                    text: model.value(),
                }),
            }
            self.open.insert(uri.clone(), model.version());
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp_events::LspRange;
    use editor_bridge::LanguageRegistry;
    use pretty_assertions::assert_eq;

    fn registry() -> ModelRegistry {
        let mut registry = ModelRegistry::new(LanguageRegistry::builtin(), 100);
        registry.get_or_create(&ModelUri::parse("/src/main.rs"), Some("fn main() {}"), None);
        registry.get_or_create(&ModelUri::parse("/notes.md"), Some("# notes"), None);
        registry.get_or_create(
            &ModelUri::parse("original://file:///src/main.rs"),
            Some("fn main() {}"),
            Some("rust"),
        );
        registry
    }

    #[test]
    fn test_utf16_offsets() {
        assert_eq!(utf16_to_char_offset("a😀b", 0), 0);
        assert_eq!(utf16_to_char_offset("a😀b", 1), 1);
        assert_eq!(utf16_to_char_offset("a😀b", 3), 2);
        assert_eq!(utf16_to_char_offset("ab", 10), 2);
    }

    #[test]
    fn test_plan_open_change_close() {
        let mut registry = registry();
        let main = ModelUri::parse("/src/main.rs");
        let mut tracker = DocumentTracker::new();

        let first = tracker.plan(&registry, "rust", "original://");
        assert_eq!(
            first,
            vec![DocumentSync::Open {
                uri: main.clone(),
                language_id: "rust".to_string(),
                version: 1,
                text: "fn main() {}".to_string(),
            }]
        );
        assert!(tracker.plan(&registry, "rust", "original://").is_empty());

        registry.set_value(&main, "fn main() { run() }");
        assert_eq!(
            tracker.plan(&registry, "rust", "original://"),
            vec![DocumentSync::Change {
                uri: main.clone(),
                version: 2,
                text: "fn main() { run() }".to_string(),
            }]
        );

        registry.remove(&main);
        assert_eq!(
            tracker.plan(&registry, "rust", "original://"),
            vec![DocumentSync::Close { uri: main }]
        );
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_did_change_carries_full_text() {
        let sync = DocumentSync::Change {
            uri: ModelUri::parse("/a b.rs"),
            version: 3,
            text: "x".to_string(),
        };
        let (method, params) = sync.to_notification();
        assert_eq!(method, "textDocument/didChange");
        assert_eq!(params["textDocument"]["uri"], "file:///a%20b.rs");
        assert_eq!(params["contentChanges"][0]["text"], "x");
    }

    #[test]
    fn test_diagnostics_use_char_columns() {
        let mut registry = ModelRegistry::new(LanguageRegistry::builtin(), 100);
        let uri = ModelUri::parse("/a.rs");
        registry.get_or_create(&uri, Some("let 😀x = 1;"), None);

        let diagnostic = LspDiagnostic {
            range: LspRange {
                start: LspPosition {
                    line: 0,
                    character: 4,
                },
                end: LspPosition {
                    line: 0,
                    character: 7,
                },
            },
            severity: None,
            code: Some(json!(42)),
            source: None,
            message: "bad".to_string(),
        };
        let markers = diagnostics_to_markers(registry.get(&uri), &[diagnostic]);
        assert_eq!(markers[0].severity, MarkerSeverity::Error);
        assert_eq!(markers[0].code.as_deref(), Some("42"));
        assert_eq!((markers[0].start_line_number, markers[0].start_column), (1, 5));
        assert_eq!((markers[0].end_line_number, markers[0].end_column), (1, 7));
    }
}
