//! Template resolution and rendering
//!
//! Uses MiniJinja templates for the generated Go sources. Templates are
//! embedded by default; a file `<name>.jinja` in the overlay directory
//! (`--template-dir` or `template_dir` in the config) takes precedence.
//!
//! Every render builds a fresh [`Environment`] holding only the template it
//! needs, so template names from different artifacts never collide.

pub mod context;
pub mod helpers;

use crate::error::{Error, Result};
use helpers::HelperKit;
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use std::path::{Path, PathBuf};

// Embedded templates (compiled into binary)
mod embedded {
    pub const DOMAIN: &str = include_str!("../../templates/go/domain.jinja");
    pub const DTO: &str = include_str!("../../templates/go/dto.jinja");
    pub const EVENTS: &str = include_str!("../../templates/go/events.jinja");
    pub const SERVICE: &str = include_str!("../../templates/go/service.jinja");
    pub const REPO_PORT: &str = include_str!("../../templates/go/repo_port.jinja");
    pub const SERVICE_IMPL: &str = include_str!("../../templates/go/service_impl.jinja");
    pub const SERVICE_CACHED: &str = include_str!("../../templates/go/service_cached.jinja");
    pub const MONGO_REPO: &str = include_str!("../../templates/go/mongo_repo.jinja");
    pub const MONGO_HELPERS: &str = include_str!("../../templates/go/mongo_helpers.jinja");
    pub const STUB_REPO: &str = include_str!("../../templates/go/stub_repo.jinja");
    pub const MOCK_REPO: &str = include_str!("../../templates/go/mock_repo.jinja");
    pub const CONTRACT_TESTS: &str = include_str!("../../templates/go/contract_tests.jinja");
    pub const MAIN_SERVER: &str = include_str!("../../templates/go/main_server.jinja");
}

/// Bundled templates by name, in a fixed order
pub const BUNDLED: &[(&str, &str)] = &[
    ("domain", embedded::DOMAIN),
    ("dto", embedded::DTO),
    ("events", embedded::EVENTS),
    ("service", embedded::SERVICE),
    ("repo_port", embedded::REPO_PORT),
    ("service_impl", embedded::SERVICE_IMPL),
    ("service_cached", embedded::SERVICE_CACHED),
    ("mongo_repo", embedded::MONGO_REPO),
    ("mongo_helpers", embedded::MONGO_HELPERS),
    ("stub_repo", embedded::STUB_REPO),
    ("mock_repo", embedded::MOCK_REPO),
    ("contract_tests", embedded::CONTRACT_TESTS),
    ("main_server", embedded::MAIN_SERVER),
];

/// Stable identifier of a template, independent of where it was loaded from
pub fn template_id(name: &str) -> String {
    format!("templates/{}.jinja", name)
}

/// Overlay directory first, bundled copy second
#[derive(Debug, Clone, Default)]
pub struct TemplateSource {
    overlay: Option<PathBuf>,
}

impl TemplateSource {
    pub fn new(overlay: Option<PathBuf>) -> Self {
        Self { overlay }
    }

    pub fn overlay(&self) -> Option<&Path> {
        self.overlay.as_deref()
    }

    /// Source text of template `name`; `artifact` labels errors
    pub fn load(&self, name: &str, artifact: &str) -> Result<String> {
        if let Some(dir) = &self.overlay {
            let path = dir.join(format!("{}.jinja", name));
            if path.is_file() {
                tracing::debug!(template = name, path = %path.display(), "using overlay template");
                return std::fs::read_to_string(&path).map_err(|e| Error::TemplateRead {
                    path: artifact.to_string(),
                    template: path.display().to_string(),
                    message: e.to_string(),
                });
            }
        }
        BUNDLED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, src)| src.to_string())
            .ok_or_else(|| Error::TemplateRead {
                path: artifact.to_string(),
                template: template_id(name),
                message: "no bundled template with this name".to_string(),
            })
    }

    /// Render template `name` with `ctx` for the artifact at `artifact`
    pub fn render<S: Serialize>(
        &self,
        name: &str,
        artifact: &str,
        kit: HelperKit,
        ctx: &S,
    ) -> Result<String> {
        let source = self.load(name, artifact)?;
        let id = template_id(name);

        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::SemiStrict);
        helpers::register(&mut env, kit);

        env.add_template_owned(id.clone(), source)
            .map_err(|e| Error::TemplateParse {
                path: artifact.to_string(),
                template: id.clone(),
                message: e.to_string(),
            })?;
        let template = env.get_template(&id).map_err(|e| Error::TemplateRead {
            path: artifact.to_string(),
            template: id.clone(),
            message: e.to_string(),
        })?;
        template.render(ctx).map_err(|e| Error::TemplateExecute {
            path: artifact.to_string(),
            template: id,
            message: format!("{:#}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_bundled_template_parses() {
        for (name, src) in BUNDLED {
            let mut env = Environment::new();
            helpers::register(&mut env, HelperKit::Mongo);
            env.add_template(name, src)
                .unwrap_or_else(|e| panic!("{name}: {e:#}"));
        }
    }

    #[test]
    fn test_overlay_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("events.jinja"), "package {{ pkg }}\n").unwrap();
        let source = TemplateSource::new(Some(dir.path().to_path_buf()));
        let out = source
            .render("events", "internal/domain/events.go", HelperKit::Shared, &json!({"pkg": "domain"}))
            .unwrap();
        assert_eq!(out, "package domain\n");
        // names without an overlay file still resolve to the bundled copy
        assert!(source.load("dto", "x").unwrap().contains("package dto"));
    }

    #[test]
    fn test_error_kinds_carry_artifact_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("domain.jinja"), "{% if %}").unwrap();
        std::fs::write(dir.path().join("dto.jinja"), "{{ fail('boom') }}").unwrap();
        let source = TemplateSource::new(Some(dir.path().to_path_buf()));

        let err = source
            .render("domain", "internal/domain/user.go", HelperKit::Shared, &json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::TemplateParse { .. }));
        assert_eq!(err.artifact_path().as_deref(), Some("internal/domain/user.go"));

        let err = source
            .render("dto", "internal/dto/user.go", HelperKit::Shared, &json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::TemplateExecute { .. }));

        let err = source
            .render("nope", "x.go", HelperKit::Shared, &json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::TemplateRead { .. }));
    }
}
