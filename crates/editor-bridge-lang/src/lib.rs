#![warn(missing_docs)]
//! `editor-bridge-lang` - data-driven language table for `editor-bridge`.
//!
//! Models carry a language id that is implied by their URI. This crate maps file names and
//! extensions to those ids. It stays dependency-free so both the core and the language-service
//! connector can share one table.

/// Language id used when nothing else matches.
pub const PLAINTEXT: &str = "plaintext";

/// A single language entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Language id (e.g. `rust`, `typescript`).
    pub id: String,
    /// File extensions including the leading dot (e.g. `.rs`).
    pub extensions: Vec<String>,
    /// Exact file names (e.g. `Makefile`).
    pub filenames: Vec<String>,
}

impl LanguageConfig {
    /// Create a config matching only extensions.
    pub fn new(id: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            id: id.into(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
            filenames: Vec::new(),
        }
    }

    /// Add exact file names to this config.
    pub fn with_filenames(mut self, filenames: &[&str]) -> Self {
        self.filenames
            .extend(filenames.iter().map(|name| name.to_string()));
        self
    }

    fn matches(&self, file_name: &str) -> bool {
        if self.filenames.iter().any(|name| name == file_name) {
            return true;
        }
        let lower = file_name.to_ascii_lowercase();
        self.extensions
            .iter()
            .any(|ext| lower.len() > ext.len() && lower.ends_with(ext.as_str()))
    }
}

/// Ordered language table; the first matching entry wins.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

impl LanguageRegistry {
    /// An empty table (everything resolves to [`PLAINTEXT`]).
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table covering the languages hosts commonly open.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for config in [
            LanguageConfig::new("typescript", &[".ts", ".mts", ".cts"]),
            LanguageConfig::new("typescriptreact", &[".tsx"]),
            LanguageConfig::new("javascript", &[".js", ".mjs", ".cjs"]),
            LanguageConfig::new("javascriptreact", &[".jsx"]),
            LanguageConfig::new("json", &[".json", ".jsonc"]),
            LanguageConfig::new("html", &[".html", ".htm"]),
            LanguageConfig::new("css", &[".css"]),
            LanguageConfig::new("scss", &[".scss"]),
            LanguageConfig::new("less", &[".less"]),
            LanguageConfig::new("markdown", &[".md", ".markdown"]),
            LanguageConfig::new("python", &[".py", ".pyi"]),
            LanguageConfig::new("rust", &[".rs"]),
            LanguageConfig::new("go", &[".go"]),
            LanguageConfig::new("c", &[".c", ".h"]),
            LanguageConfig::new("cpp", &[".cpp", ".cc", ".cxx", ".hpp", ".hh"]),
            LanguageConfig::new("java", &[".java"]),
            LanguageConfig::new("swift", &[".swift"]),
            LanguageConfig::new("php", &[".php"]),
            LanguageConfig::new("ruby", &[".rb"]).with_filenames(&["Gemfile", "Rakefile"]),
            LanguageConfig::new("shellscript", &[".sh", ".bash", ".zsh"]),
            LanguageConfig::new("yaml", &[".yaml", ".yml"]),
            LanguageConfig::new("toml", &[".toml"]),
            LanguageConfig::new("xml", &[".xml", ".svg"]),
            LanguageConfig::new("makefile", &[".mk"]).with_filenames(&["Makefile", "makefile"]),
            LanguageConfig::new("dockerfile", &[".dockerfile"]).with_filenames(&["Dockerfile"]),
        ] {
            registry.register(config);
        }
        registry
    }

    /// Append a language entry.
    pub fn register(&mut self, config: LanguageConfig) {
        self.languages.push(config);
    }

    /// All registered entries, in match order.
    pub fn languages(&self) -> &[LanguageConfig] {
        &self.languages
    }

    /// Resolve the language id for a path or URI path (only the last segment is inspected).
    pub fn language_for_path(&self, path: &str) -> &str {
        let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        self.languages
            .iter()
            .find(|config| config.matches(file_name))
            .map(|config| config.id.as_str())
            .unwrap_or(PLAINTEXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_lookup() {
        let registry = LanguageRegistry::builtin();
        assert_eq!(registry.language_for_path("/src/main.rs"), "rust");
        assert_eq!(registry.language_for_path("/web/App.TSX"), "typescriptreact");
        assert_eq!(registry.language_for_path("/notes/readme"), PLAINTEXT);
    }

    #[test]
    fn test_filename_lookup() {
        let registry = LanguageRegistry::builtin();
        assert_eq!(registry.language_for_path("/repo/Makefile"), "makefile");
        assert_eq!(registry.language_for_path("C:\\repo\\Dockerfile"), "dockerfile");
    }

    #[test]
    fn test_bare_extension_is_not_a_match() {
        let registry = LanguageRegistry::builtin();
        assert_eq!(registry.language_for_path("/dotfiles/.rs"), PLAINTEXT);
    }
}
