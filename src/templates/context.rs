//! Template context structures
//!
//! One context per artifact kind. Each bundles the model record the artifact
//! is about, its import list and the module identity with the stamps, so a
//! template never has to reach outside its context.

use crate::contract::ContractSuite;
use crate::ir::Requirements;
use crate::model::{
    AuthModel, EndpointModel, EntityModel, EventModel, FieldModel, FinderModel, MethodModel,
    RepositoryModel, ScheduleModel, ServiceModel,
};
use crate::signature::FinderSignature;
use crate::stamp::Stamp;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Module identity and stamps, flattened into every context
#[derive(Debug, Clone, Serialize)]
pub struct Header<'a> {
    pub module: &'a str,
    pub ang_version: &'a str,
    pub input_hash: &'a str,
    pub compiler_hash: &'a str,
}

impl<'a> Header<'a> {
    pub fn new(module: &'a str, stamp: &'a Stamp) -> Self {
        Self {
            module,
            ang_version: &stamp.ang_version,
            input_hash: &stamp.input_hash,
            compiler_hash: &stamp.compiler_hash,
        }
    }
}

/// Go import block, standard library first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Imports {
    pub std: Vec<String>,
    pub external: Vec<String>,
}

impl Imports {
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = paths.into_iter().map(Into::into).collect();
        let (external, std): (Vec<String>, Vec<String>) = set
            .into_iter()
            .partition(|p| p.split('/').next().is_some_and(|head| head.contains('.')));
        Imports { std, external }
    }

    pub fn is_empty(&self) -> bool {
        self.std.is_empty() && self.external.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.std.iter().chain(&self.external).any(|p| p == path)
    }
}

/// Struct declaration emitted next to its owner
#[derive(Debug, Clone, Serialize)]
pub struct TypeDecl<'a> {
    pub name: String,
    pub description: &'a str,
    pub fields: Vec<&'a FieldModel>,
}

#[derive(Debug, Serialize)]
pub struct EntityContext<'a> {
    #[serde(flatten)]
    pub header: Header<'a>,
    pub entity: &'a EntityModel,
    pub fields: Vec<&'a FieldModel>,
    /// Anonymous list item types of the entity's fields
    pub nested: Vec<TypeDecl<'a>>,
    pub imports: Imports,
}

#[derive(Debug, Serialize)]
pub struct EventsContext<'a> {
    #[serde(flatten)]
    pub header: Header<'a>,
    pub events: &'a [EventModel],
    pub imports: Imports,
}

#[derive(Debug, Serialize)]
pub struct ServicePortContext<'a> {
    #[serde(flatten)]
    pub header: Header<'a>,
    pub service: &'a ServiceModel,
    /// Request/response types and their nested item types
    pub types: Vec<TypeDecl<'a>>,
    pub imports: Imports,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    /// Lowered declarative flow
    Flow,
    /// Inline implementation code
    Inline,
    /// Not implemented: editable region
    Custom,
}

#[derive(Debug, Serialize)]
pub struct ImplMethod<'a> {
    pub method: &'a MethodModel,
    pub body: BodyKind,
    /// Go statements for flow and inline bodies
    pub code: String,
    /// Custom block qualifier, `<Service>.<Method>`
    pub qualifier: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceImplContext<'a> {
    #[serde(flatten)]
    pub header: Header<'a>,
    pub service: &'a ServiceModel,
    /// Methods without a manual override, in name order
    pub methods: Vec<ImplMethod<'a>>,
    pub overrides: Vec<String>,
    pub imports: Imports,
}

#[derive(Debug, Serialize)]
pub struct CachedServiceContext<'a> {
    #[serde(flatten)]
    pub header: Header<'a>,
    pub service: &'a ServiceModel,
    pub imports: Imports,
}

#[derive(Debug, Serialize)]
pub struct RepoContext<'a> {
    #[serde(flatten)]
    pub header: Header<'a>,
    pub repo: &'a RepositoryModel,
    /// Standard methods followed by finders
    pub methods: Vec<&'a FinderSignature>,
    pub imports: Imports,
}

/// Filter condition of a document query
#[derive(Debug, Clone, Serialize)]
pub struct MongoFilter {
    pub key: String,
    pub op: String,
    pub param: String,
}

#[derive(Debug, Serialize)]
pub struct MongoFinder<'a> {
    pub finder: &'a FinderModel,
    pub sig: &'a FinderSignature,
    /// one, many, count or delete
    pub mode: &'static str,
    /// Decoded element type for one/many finders
    pub elem_type: String,
    pub filters: Vec<MongoFilter>,
    pub sort_key: String,
    pub sort_desc: bool,
}

#[derive(Debug, Serialize)]
pub struct MongoRepoContext<'a> {
    #[serde(flatten)]
    pub header: Header<'a>,
    pub repo: &'a RepositoryModel,
    pub entity: &'a EntityModel,
    pub finders: Vec<MongoFinder<'a>>,
    pub imports: Imports,
}

/// In-memory finder: `mode` is empty when it only returns zero values
#[derive(Debug, Serialize)]
pub struct StubFinder<'a> {
    pub sig: &'a FinderSignature,
    pub mode: &'static str,
    /// Go boolean expressions over the stored value `v`
    pub conds: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StubRepoContext<'a> {
    #[serde(flatten)]
    pub header: Header<'a>,
    pub repo: &'a RepositoryModel,
    pub entity: &'a EntityModel,
    pub finders: Vec<StubFinder<'a>>,
    pub imports: Imports,
}

#[derive(Debug, Serialize)]
pub struct MongoHelpersContext<'a> {
    #[serde(flatten)]
    pub header: Header<'a>,
    pub entities: Vec<&'a EntityModel>,
}

#[derive(Debug, Serialize)]
pub struct ContractContext<'a> {
    #[serde(flatten)]
    pub header: Header<'a>,
    pub suite: &'a ContractSuite,
    pub has_auth_bootstrap: bool,
    pub has_ws: bool,
}

/// Repository wired into a main
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoWiring {
    pub entity: String,
    /// Go variable holding the repository
    pub var: String,
    pub repo: String,
    pub storage: String,
}

/// Service constructed in a main
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceWiring {
    pub name: String,
    pub var: String,
    /// Constructor arguments in parameter order
    pub args: Vec<String>,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct MainContext<'a> {
    #[serde(flatten)]
    pub header: Header<'a>,
    /// Owning service of a microservice main; `None` for the monolith
    pub service: Option<&'a str>,
    pub services: Vec<&'a ServiceModel>,
    pub endpoints: Vec<&'a EndpointModel>,
    pub repos: Vec<RepoWiring>,
    pub wiring: Vec<ServiceWiring>,
    pub requires: Requirements,
    /// Some service publishes events
    pub publisher: bool,
    pub ws_services: Vec<String>,
    pub ws_events: BTreeMap<String, Vec<String>>,
    pub events: &'a [EventModel],
    pub auth: Option<&'a AuthModel>,
    /// This process serves login/refresh
    pub auth_owner: bool,
    pub has_cache: bool,
    pub schedules: Vec<&'a ScheduleModel>,
    pub imports: Imports,
}
