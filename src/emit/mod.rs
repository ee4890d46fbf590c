//! Emission driver
//!
//! Maps each artifact family to the files it produces. Every artifact walks
//! the same pipeline: build context, render, merge custom blocks with the
//! file on disk, post-process, write if changed.

mod app;
mod domain;
mod repo;
mod service;

use crate::audit::{ImplAudit, MissingImpl};
use crate::config::{EmitterConfig, FormatterKind, Layout};
use crate::error::{Error, Result};
use crate::format::{
    custom_blocks, write_if_changed, Formatter, GoSyntaxFormatter, GofmtFormatter, PostProcessor,
    WriteOutcome,
};
use crate::ir::{migrate_to_current, Schema};
use crate::model::{self, Model};
use crate::stamp::Stamp;
use crate::templates::context::{Header, Imports};
use crate::templates::helpers::HelperKit;
use crate::templates::TemplateSource;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Kinds of generated files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFamily {
    Domain,
    Dto,
    Events,
    ServicePorts,
    RepositoryPorts,
    ServiceImpls,
    CachedServices,
    MongoRepos,
    MongoHelpers,
    StubRepos,
    RepoMocks,
    ContractTests,
    ServiceMain,
}

impl ArtifactFamily {
    /// Every family, in emission order
    pub const ALL: [ArtifactFamily; 13] = [
        ArtifactFamily::Domain,
        ArtifactFamily::Dto,
        ArtifactFamily::Events,
        ArtifactFamily::ServicePorts,
        ArtifactFamily::RepositoryPorts,
        ArtifactFamily::ServiceImpls,
        ArtifactFamily::CachedServices,
        ArtifactFamily::MongoRepos,
        ArtifactFamily::MongoHelpers,
        ArtifactFamily::StubRepos,
        ArtifactFamily::RepoMocks,
        ArtifactFamily::ContractTests,
        ArtifactFamily::ServiceMain,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ArtifactFamily::Domain => "domain",
            ArtifactFamily::Dto => "dto",
            ArtifactFamily::Events => "events",
            ArtifactFamily::ServicePorts => "service_ports",
            ArtifactFamily::RepositoryPorts => "repository_ports",
            ArtifactFamily::ServiceImpls => "service_impls",
            ArtifactFamily::CachedServices => "cached_services",
            ArtifactFamily::MongoRepos => "mongo_repos",
            ArtifactFamily::MongoHelpers => "mongo_helpers",
            ArtifactFamily::StubRepos => "stub_repos",
            ArtifactFamily::RepoMocks => "repo_mocks",
            ArtifactFamily::ContractTests => "contract_tests",
            ArtifactFamily::ServiceMain => "service_main",
        }
    }

    /// Bundled template the family renders
    pub fn template(self) -> &'static str {
        match self {
            ArtifactFamily::Domain => "domain",
            ArtifactFamily::Dto => "dto",
            ArtifactFamily::Events => "events",
            ArtifactFamily::ServicePorts => "service",
            ArtifactFamily::RepositoryPorts => "repo_port",
            ArtifactFamily::ServiceImpls => "service_impl",
            ArtifactFamily::CachedServices => "service_cached",
            ArtifactFamily::MongoRepos => "mongo_repo",
            ArtifactFamily::MongoHelpers => "mongo_helpers",
            ArtifactFamily::StubRepos => "stub_repo",
            ArtifactFamily::RepoMocks => "mock_repo",
            ArtifactFamily::ContractTests => "contract_tests",
            ArtifactFamily::ServiceMain => "main_server",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl std::fmt::Display for ArtifactFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// External cancellation signal, checked before every artifact
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Paths (relative to the output root) touched by an emission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmitReport {
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
}

impl EmitReport {
    pub fn merge(&mut self, other: EmitReport) {
        self.written.extend(other.written);
        self.unchanged.extend(other.unchanged);
    }

    /// Number of artifacts produced
    pub fn len(&self) -> usize {
        self.written.len() + self.unchanged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drives template rendering and writing for one output tree
#[derive(Debug)]
pub struct Emitter {
    config: EmitterConfig,
    stamp: Stamp,
    templates: TemplateSource,
    post: PostProcessor,
    cancel: CancelToken,
    audit: ImplAudit,
}

impl Emitter {
    pub fn new(config: EmitterConfig, stamp: Stamp) -> Self {
        let formatter: Box<dyn Formatter> = match config.formatter {
            FormatterKind::Syntax => Box::new(GoSyntaxFormatter),
            FormatterKind::Gofmt => Box::new(GofmtFormatter::default()),
        };
        Self {
            templates: TemplateSource::new(config.template_dir.clone()),
            post: PostProcessor::new(formatter, config.format_mode),
            cancel: CancelToken::new(),
            audit: ImplAudit::new(),
            config,
            stamp,
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace the formatter, keeping the configured failure mode
    pub fn with_formatter(mut self, formatter: Box<dyn Formatter>) -> Self {
        self.post = PostProcessor::new(formatter, self.config.format_mode);
        self
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn stamp(&self) -> &Stamp {
        &self.stamp
    }

    /// Methods without flow, inline code or manual override, in discovery order
    pub fn missing_impls(&self) -> &[MissingImpl] {
        self.audit.entries()
    }

    pub fn audit(&self) -> &ImplAudit {
        &self.audit
    }

    /// Emit one family
    pub fn emit(&mut self, family: ArtifactFamily, model: &Model) -> Result<EmitReport> {
        let span = tracing::info_span!("emit", family = family.name());
        let _enter = span.enter();

        let mut report = EmitReport::default();
        match family {
            ArtifactFamily::Domain => self.emit_domain(model, &mut report)?,
            ArtifactFamily::Dto => self.emit_dto(model, &mut report)?,
            ArtifactFamily::Events => self.emit_events(model, &mut report)?,
            ArtifactFamily::ServicePorts => self.emit_service_ports(model, &mut report)?,
            ArtifactFamily::RepositoryPorts => self.emit_repo_ports(model, &mut report)?,
            ArtifactFamily::ServiceImpls => self.emit_service_impls(model, &mut report)?,
            ArtifactFamily::CachedServices => self.emit_cached_services(model, &mut report)?,
            ArtifactFamily::MongoRepos => self.emit_mongo_repos(model, &mut report)?,
            ArtifactFamily::MongoHelpers => self.emit_mongo_helpers(model, &mut report)?,
            ArtifactFamily::StubRepos => self.emit_stub_repos(model, &mut report)?,
            ArtifactFamily::RepoMocks => self.emit_repo_mocks(model, &mut report)?,
            ArtifactFamily::ContractTests => self.emit_contract_tests(model, &mut report)?,
            ArtifactFamily::ServiceMain => match self.config.layout {
                Layout::Monolith => self.emit_monolith_main(model, &mut report)?,
                Layout::Microservices => self.emit_service_mains(model, &mut report)?,
            },
        }

        tracing::info!(
            written = report.written.len(),
            unchanged = report.unchanged.len(),
            "family emitted"
        );
        Ok(report)
    }

    /// Emit the configured families (all of them by default) in order
    pub fn emit_all(&mut self, model: &Model) -> Result<EmitReport> {
        let selected = self.config.families.clone();
        let mut report = EmitReport::default();
        for family in ArtifactFamily::ALL {
            if selected.as_ref().is_some_and(|only| !only.contains(&family)) {
                continue;
            }
            report.merge(self.emit(family, model)?);
        }
        Ok(report)
    }

    fn header(&self) -> Header<'_> {
        Header::new(&self.config.go_module, &self.stamp)
    }

    fn module_path(&self, pkg: &str) -> String {
        format!("{}/{}", self.config.go_module, pkg)
    }

    /// Render `template` with `ctx` and persist it at `rel` under the output root
    fn write_artifact<S: Serialize>(
        &self,
        report: &mut EmitReport,
        rel: &str,
        template: &str,
        kit: HelperKit,
        ctx: &S,
    ) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled {
                path: rel.to_string(),
            });
        }
        let rendered = self.templates.render(template, rel, kit, ctx)?;

        // Custom bodies are spliced in after formatting so they stay byte-exact
        let formatted = self.post.process(rendered.into_bytes(), rel)?;
        let target = self.config.output_dir.join(rel);
        let bytes = match std::fs::read_to_string(&target) {
            Ok(on_disk) => match String::from_utf8(formatted) {
                Ok(text) => custom_blocks::merge(&text, &on_disk).into_bytes(),
                Err(raw) => raw.into_bytes(),
            },
            Err(_) => formatted,
        };

        match write_if_changed(&target, &bytes)? {
            WriteOutcome::Written => {
                tracing::debug!(path = rel, "artifact written");
                report.written.push(rel.to_string());
            }
            WriteOutcome::Unchanged => {
                tracing::debug!(path = rel, "artifact unchanged");
                report.unchanged.push(rel.to_string());
            }
        }
        Ok(())
    }
}

/// Outcome of a full generation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Generation {
    pub report: EmitReport,
    pub stamp: Stamp,
    pub missing_impls: Vec<MissingImpl>,
}

/// Migrate, project and emit `schema` according to `config`
pub fn generate(mut schema: Schema, config: EmitterConfig, cancel: CancelToken) -> Result<Generation> {
    migrate_to_current(&mut schema)?;
    let model = model::project(&schema);
    model::validate_service_dependencies(&model.services)?;

    let stamp = Stamp::resolve(
        &schema,
        config.ang_version.as_deref(),
        config.input_hash.as_deref(),
        config.compiler_hash.as_deref(),
    );
    tracing::info!(
        entities = model.entities.len(),
        services = model.services.len(),
        input_hash = %stamp.input_hash,
        "schema projected"
    );

    let mut emitter = Emitter::new(config, stamp.clone()).with_cancel_token(cancel);
    let report = emitter.emit_all(&model)?;
    Ok(Generation {
        report,
        stamp,
        missing_impls: emitter.missing_impls().to_vec(),
    })
}

/// Packages referenced by qualified identifiers in Go source
const PACKAGE_PATHS: &[(&str, &str)] = &[
    ("context", "context"),
    ("fmt", "fmt"),
    ("http", "net/http"),
    ("json", "encoding/json"),
    ("slog", "log/slog"),
    ("sort", "sort"),
    ("strconv", "strconv"),
    ("strings", "strings"),
    ("time", "time"),
    ("uuid", "github.com/google/uuid"),
];

fn qualifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b([a-z][a-z0-9]*)\.[A-Za-z_]").expect("static pattern"))
}

/// Import paths for every package qualifier used in `code`.
///
/// `domain`, `port` and `errors` resolve to packages of `module`.
pub fn scan_imports(code: &str, module: &str) -> Vec<String> {
    let mut out = Vec::new();
    for cap in qualifier_pattern().captures_iter(code) {
        let Some(pkg) = cap.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let path = match pkg {
            "domain" => format!("{}/internal/domain", module),
            "port" => format!("{}/internal/port", module),
            "errors" => format!("{}/internal/pkg/errors", module),
            _ => match PACKAGE_PATHS.iter().find(|(name, _)| *name == pkg) {
                Some((_, path)) => path.to_string(),
                None => continue,
            },
        };
        if !out.contains(&path) {
            out.push(path);
        }
    }
    out
}

/// Nested item declarations of `fields`, depth first, deduplicated by name
fn nested_types<'a>(
    fields: impl IntoIterator<Item = &'a crate::model::FieldModel>,
    out: &mut Vec<crate::templates::context::TypeDecl<'a>>,
) {
    for field in fields {
        if field.item_fields.is_empty() || out.iter().any(|t| t.name == field.item_type_name) {
            continue;
        }
        out.push(crate::templates::context::TypeDecl {
            name: field.item_type_name.clone(),
            description: "",
            fields: field.item_fields.iter().collect(),
        });
        nested_types(&field.item_fields, out);
    }
}

fn file_stem(name: &str) -> String {
    name.to_lowercase()
}

fn imports_for(code: &str, module: &str, extra: &[&str]) -> Imports {
    Imports::from_paths(
        scan_imports(code, module)
            .into_iter()
            .chain(extra.iter().map(|s| s.to_string())),
    )
}
