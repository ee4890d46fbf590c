//! Emitter configuration
//!
//! Handles loading of `ang.yaml` and merging of command-line
//! overrides on top of it.

use crate::emit::ArtifactFamily;
use crate::error::{Error, Result};
use crate::format::FormatMode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "ang.yaml";

/// Emitter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EmitterConfig {
    /// Schema version for migrations
    pub version: u32,

    /// Root of the generated tree
    pub output_dir: PathBuf,

    /// Go module path used in absolute imports
    pub go_module: String,

    /// Overlay directory searched for `<name>.jinja` before the bundled templates
    pub template_dir: Option<PathBuf>,

    /// Stamp overrides; computed when absent
    pub ang_version: Option<String>,
    pub input_hash: Option<String>,
    pub compiler_hash: Option<String>,

    /// Strict fails on unparsable output, lenient writes it raw
    pub format_mode: FormatMode,

    pub formatter: FormatterKind,

    /// Process layout of the generated backend
    pub layout: Layout,

    /// Families to emit; all of them when absent
    pub families: Option<Vec<ArtifactFamily>>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            output_dir: PathBuf::from("."),
            go_module: "example.com/app".to_string(),
            template_dir: None,
            ang_version: None,
            input_hash: None,
            compiler_hash: None,
            format_mode: FormatMode::Strict,
            formatter: FormatterKind::Syntax,
            layout: Layout::Monolith,
            families: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FormatterKind {
    /// In-process tree-sitter check plus whitespace normalization
    #[default]
    Syntax,
    /// External `gofmt`
    Gofmt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// One `cmd/server/main.go`
    #[default]
    Monolith,
    /// One `cmd/services/<svc>/main.go` per service
    Microservices,
}

/// Command-line overrides (merge with the file config)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_dir: Option<PathBuf>,
    pub go_module: Option<String>,
    pub template_dir: Option<PathBuf>,
    pub format_mode: Option<FormatMode>,
    pub formatter: Option<FormatterKind>,
    pub layout: Option<Layout>,
    pub families: Option<Vec<ArtifactFamily>>,
}

impl EmitterConfig {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EmitterConfig = serde_norway::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;

        if config.version != 1 {
            return Err(Error::Config(format!(
                "unsupported {} version: {}",
                path.display(),
                config.version
            )));
        }
        Ok(config)
    }

    /// Load `ang.yaml` from a directory, if present
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let file = dir.join(CONFIG_FILE);
        if !file.exists() {
            return Ok(None);
        }
        Self::load(&file).map(Some)
    }

    /// Apply overrides; set values win
    pub fn merge(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(v) = overrides.output_dir {
            self.output_dir = v;
        }
        if let Some(v) = overrides.go_module {
            self.go_module = v;
        }
        if overrides.template_dir.is_some() {
            self.template_dir = overrides.template_dir;
        }
        if let Some(v) = overrides.format_mode {
            self.format_mode = v;
        }
        if let Some(v) = overrides.formatter {
            self.formatter = v;
        }
        if let Some(v) = overrides.layout {
            self.layout = v;
        }
        if overrides.families.is_some() {
            self.families = overrides.families;
        }
        self
    }

    /// Reject settings the emitter cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.go_module.trim().is_empty() {
            return Err(Error::Config("go_module must not be empty".into()));
        }
        if self.go_module.contains(char::is_whitespace) {
            return Err(Error::Config(format!(
                "go_module {:?} contains whitespace",
                self.go_module
            )));
        }
        if let Some(dir) = &self.template_dir {
            if !dir.is_dir() {
                return Err(Error::Config(format!(
                    "template_dir {} is not a directory",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// JSON Schema of the config file
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(EmitterConfig)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "version: 1\ngo_module: github.com/acme/tenders\nlayout: microservices\nformat_mode: lenient\n",
        )
        .unwrap();
        let config = EmitterConfig::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.go_module, "github.com/acme/tenders");
        assert_eq!(config.layout, Layout::Microservices);
        assert_eq!(config.format_mode, FormatMode::Lenient);
        assert_eq!(config.formatter, FormatterKind::Syntax);
        assert!(config.families.is_none());
    }

    #[test]
    fn test_missing_file_and_bad_version() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EmitterConfig::load_from_dir(dir.path()).unwrap().is_none());
        std::fs::write(dir.path().join(CONFIG_FILE), "version: 2\n").unwrap();
        assert!(matches!(
            EmitterConfig::load_from_dir(dir.path()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_merge_overrides() {
        let merged = EmitterConfig::default().merge(ConfigOverrides {
            output_dir: Some(PathBuf::from("out")),
            families: Some(vec![ArtifactFamily::Domain]),
            ..Default::default()
        });
        assert_eq!(merged.output_dir, PathBuf::from("out"));
        assert_eq!(merged.families, Some(vec![ArtifactFamily::Domain]));
        assert_eq!(merged.go_module, "example.com/app"); // Inherited
    }

    #[test]
    fn test_validate() {
        let mut config = EmitterConfig::default();
        assert!(config.validate().is_ok());
        config.go_module = "  ".into();
        assert!(config.validate().is_err());
        config.go_module = "a b".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_schema_lists_fields() {
        let schema = EmitterConfig::json_schema().to_string();
        assert!(schema.contains("go_module"));
        assert!(schema.contains("microservices"));
    }
}
