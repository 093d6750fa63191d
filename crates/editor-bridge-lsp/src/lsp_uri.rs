//! URIs as language servers expect them.
//!
//! Model URIs are stored decoded (`file:///a b.txt`, only `%` kept as `%25`); on the wire
//! `file` URIs are fully percent-encoded again. Incoming URIs go back through [`ModelUri::parse`].

use editor_bridge::ModelUri;
use editor_bridge::uri::{percent_decode, percent_encode_path};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

/// Wire form of a model URI.
pub fn document_uri(uri: &ModelUri) -> String {
    match uri.as_str().strip_prefix("file://") {
        Some(rest) => format!("file://{}", percent_encode_path(&percent_decode(rest))),
        None => uri.to_string(),
    }
}

/// Convert a local filesystem path to a `file://` URI.
pub fn path_to_file_uri(path: &Path) -> String {
    let abs = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut path_str = abs.to_string_lossy().to_string();

    if cfg!(windows) {
        path_str = path_str.replace('\\', "/");
        if !path_str.starts_with('/') {
            path_str.insert(0, '/');
        }
    }

    format!("file://{}", percent_encode_path(&path_str))
}

/// Workspace root as a URI. Accepts either a URI or a filesystem path.
pub fn root_uri(root: &str) -> String {
    if root.contains("://") {
        document_uri(&ModelUri::parse(root))
    } else {
        path_to_file_uri(Path::new(root))
    }
}

/// `WorkspaceFolder` for a root URI, named after its last path segment.
pub fn workspace_folder(root_uri: &str) -> Value {
    let name = root_uri
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(root_uri);
    json!({ "uri": root_uri, "name": percent_decode(name) })
}
