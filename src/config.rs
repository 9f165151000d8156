//! TOML configuration for the HTML output.

use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub render: RenderOptions,
}

/// Markup hooks the chat UI styles against.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Class on the `<div>` wrapping a fenced code block
    pub code_block_class: String,
    /// Class on inline `<code>` elements
    pub inline_code_class: String,
    /// Prefix for a fence's language tag, e.g. `language-rust`
    pub language_class_prefix: String,
    /// Open links in a new browsing context with opener and referrer isolation
    pub links_in_new_tab: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            code_block_class: "code-block".to_string(),
            inline_code_class: "inline-code".to_string(),
            language_class_prefix: "language-".to_string(),
            links_in_new_tab: true,
        }
    }
}

impl Config {
    /// Load config from a TOML file, or return defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => {
                let config: Self = toml::from_str(&content)?;
                tracing::debug!(path = %path.display(), "loaded config");
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_table_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[render]\ninline_code_class = \"mono\"\nlinks_in_new_tab = false").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.render.inline_code_class, "mono");
        assert!(!config.render.links_in_new_tab);
        assert_eq!(config.render.code_block_class, "code-block");
        assert_eq!(config.render.language_class_prefix, "language-");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[render\ncode_block_class = 3").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "unexpected error: {err}");
    }
}
