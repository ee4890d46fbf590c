//! Error types for the emission core

use crate::format::FormatError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Emission errors
///
/// Every variant raised while producing an artifact names the artifact path,
/// so a failing family can be traced back to the file it was writing.
#[derive(Error, Debug)]
pub enum Error {
    #[error("template {template} unavailable for {path}: {message}")]
    TemplateRead {
        path: String,
        template: String,
        message: String,
    },

    #[error("template {template} is invalid ({path}): {message}")]
    TemplateParse {
        path: String,
        template: String,
        message: String,
    },

    #[error("rendering {path} from {template} failed: {message}")]
    TemplateExecute {
        path: String,
        template: String,
        message: String,
    },

    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("generated code for {path} rejected: {source}")]
    PostProcess {
        path: String,
        #[source]
        source: FormatError,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{backend} repo unsupported return type: {returns} ({repository}.{finder})")]
    UnsupportedFinder {
        backend: String,
        repository: String,
        finder: String,
        returns: String,
    },

    #[error("unsupported ir_version {found:?} (current={current})")]
    SchemaMigration { found: String, current: String },

    #[error("{0}")]
    ServiceDependencies(String),

    #[error("emission cancelled before {path}")]
    Cancelled { path: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Artifact path the error refers to, if any
    pub fn artifact_path(&self) -> Option<String> {
        match self {
            Error::TemplateRead { path, .. }
            | Error::TemplateParse { path, .. }
            | Error::TemplateExecute { path, .. }
            | Error::PostProcess { path, .. }
            | Error::Cancelled { path } => Some(path.clone()),
            Error::OutputDir { path, .. } | Error::Write { path, .. } => {
                Some(path.display().to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_finder_message() {
        let err = Error::UnsupportedFinder {
            backend: "mongo".into(),
            repository: "UserRepository".into(),
            finder: "Stats".into(),
            returns: "map[string]int".into(),
        };
        assert_eq!(
            err.to_string(),
            "mongo repo unsupported return type: map[string]int (UserRepository.Stats)"
        );
        assert!(err.artifact_path().is_none());
    }

    #[test]
    fn test_artifact_path_for_write() {
        let err = Error::Write {
            path: PathBuf::from("out/internal/domain/user.go"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(
            err.artifact_path().as_deref(),
            Some("out/internal/domain/user.go")
        );
    }

    #[test]
    fn test_schema_migration_message() {
        let err = Error::SchemaMigration {
            found: "7".into(),
            current: "1".into(),
        };
        assert_eq!(err.to_string(), "unsupported ir_version \"7\" (current=1)");
    }
}
