//! Canonical model URIs.
//!
//! Every model is keyed by a [`ModelUri`]. Hosts send URIs in whatever spelling they have at
//! hand (`file:///a%20b.txt`, `FILE:///a b.txt`, `/a b.txt`), so lookups go through a single
//! normalisation step:
//!
//! - surrounding whitespace is trimmed
//! - input without a scheme is treated as a `file` path (`a.txt` -> `file:///a.txt`)
//! - the scheme is lower-cased
//! - percent-escapes are decoded, and a literal `%` is written back as `%25`
//! - `file` paths have `.` / `..` segments resolved
//!
//! The canonical string parses to itself, so hosts can hand back URIs they received in
//! notifications.

use std::fmt;

/// A normalized absolute URI identifying a model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelUri(String);

impl ModelUri {
    /// Normalize `input` into a canonical model URI.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match split_scheme(input) {
            Some((scheme, rest)) => {
                let scheme = scheme.to_ascii_lowercase();
                let mut rest = percent_decode(rest);
                if scheme == "file" {
                    rest = normalize_file_rest(&rest);
                }
                Self(format!("{scheme}:{}", escape_percent(&rest)))
            }
            None => {
                let path = percent_decode(input).replace('\\', "/");
                let path = if path.starts_with('/') {
                    path
                } else {
                    format!("/{path}")
                };
                Self(format!(
                    "file://{}",
                    escape_percent(&remove_dot_segments(&path))
                ))
            }
        }
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The lower-cased scheme (`file`, `original`, ...).
    pub fn scheme(&self) -> &str {
        self.0.split_once(':').map(|(scheme, _)| scheme).unwrap_or("")
    }

    /// Everything after the authority, i.e. the path used for language detection.
    pub fn path(&self) -> &str {
        let rest = self.0.split_once(':').map(|(_, rest)| rest).unwrap_or("");
        match rest.strip_prefix("//") {
            Some(after) => after.find('/').map(|idx| &after[idx..]).unwrap_or(""),
            None => rest,
        }
    }

    /// The URI of the baseline model tracked for this model.
    ///
    /// The baseline lives under `prefix` followed by the full canonical URI, e.g.
    /// `original://file:///src/main.rs`.
    pub fn baseline(&self, prefix: &str) -> Self {
        Self(format!("{prefix}{}", self.0))
    }
}

impl fmt::Display for ModelUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelUri {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl serde::Serialize for ModelUri {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl AsRef<str> for ModelUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Split `scheme:rest`. Single letters are not treated as schemes so Windows drive paths
/// (`C:\...`) stay paths.
fn split_scheme(input: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = input.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if scheme.len() < 2 || !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some((scheme, rest))
    } else {
        None
    }
}

fn normalize_file_rest(rest: &str) -> String {
    let Some(after) = rest.strip_prefix("//") else {
        return format!("//{}", remove_dot_segments(&format!("/{rest}")));
    };
    let (authority, path) = match after.find('/') {
        Some(idx) => after.split_at(idx),
        None => (after, "/"),
    };
    let authority = if authority.eq_ignore_ascii_case("localhost") {
        ""
    } else {
        authority
    };
    format!("//{authority}{}", remove_dot_segments(path))
}

fn remove_dot_segments(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/').skip(1) {
        match segment {
            "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    format!("/{}", out.join("/"))
}

fn escape_percent(decoded: &str) -> String {
    decoded.replace('%', "%25")
}

/// Percent-decode a URI component. Invalid escapes are kept verbatim.
pub fn percent_decode(input: &str) -> String {
    fn hex_val(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    let bytes = input.as_bytes();
    let mut out = Vec::<u8>::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2]))
        {
            out.push((hi << 4) | lo);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).to_string()
}

/// Percent-encode a path for use in `file://` URIs sent to language servers.
pub fn percent_encode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for &b in path.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
