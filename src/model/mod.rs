//! Template-facing model
//!
//! [`project`] lowers a migrated [`Schema`](crate::ir::Schema) into flat
//! records with resolved Go types, stable ordering and denormalized
//! cross-references. Model values are immutable after projection; templates
//! only ever read them.

mod graph;
mod project;
mod types;

pub use graph::{order_services_by_dependencies, validate_service_dependencies};
pub use project::project;
pub use types::{lower_type, TypeFlavor};

use crate::flow::Step;
use crate::ir::{
    CircuitBreaker, Constraints, EndpointAuth, Fsm, Index, Metadata, Pagination, RateLimit,
    Requirements, Retry, TestHints, WhereClause,
};
use crate::signature::{FinderSignature, MethodSignature};
use serde::Serialize;
use std::collections::BTreeMap;

/// Storage backend assumed when an entity carries no `storage` hint
pub const DEFAULT_STORAGE: &str = "sql";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Model {
    pub project: ProjectModel,
    pub entities: Vec<EntityModel>,
    pub services: Vec<ServiceModel>,
    pub events: Vec<EventModel>,
    pub errors: Vec<ErrorModel>,
    pub endpoints: Vec<EndpointModel>,
    pub repos: Vec<RepositoryModel>,
    pub schedules: Vec<ScheduleModel>,
    pub auth: Option<AuthModel>,
    /// Service names in dependency order
    pub service_order: Vec<String>,
    /// Services exposing at least one WS endpoint
    pub ws_services: Vec<String>,
    /// service -> events deliverable over its WS endpoints
    pub ws_event_map: BTreeMap<String, Vec<String>>,
}

impl Model {
    pub fn entity(&self, name: &str) -> Option<&EntityModel> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn service(&self, name: &str) -> Option<&ServiceModel> {
        self.services.iter().find(|s| s.name == name)
    }

    /// `true` when `name` is declared as a DTO-only entity
    pub fn is_dto(&self, name: &str) -> bool {
        self.entity(name).is_some_and(|e| e.is_dto)
    }

    /// Storage backend of an entity (`sql` for unknown entities)
    pub fn storage_of(&self, name: &str) -> &str {
        self.entity(name)
            .map(|e| e.storage.as_str())
            .unwrap_or(DEFAULT_STORAGE)
    }

    /// Whether any non-DTO entity is stored in MongoDB
    pub fn has_mongo_entities(&self) -> bool {
        self.entities
            .iter()
            .any(|e| !e.is_dto && e.storage == "mongo")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectModel {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityModel {
    pub name: String,
    pub description: String,
    pub owner: String,
    pub fields: Vec<FieldModel>,
    pub metadata: Metadata,
    pub indexes: Vec<Index>,
    pub ui: Option<serde_json::Value>,
    pub fsm: Option<Fsm>,
    pub source: String,
    /// DTO-only record: never persisted
    pub is_dto: bool,
    pub storage: String,
    /// Document collection name
    pub collection: String,
    /// Go name of the primary-key field
    pub primary_key: String,
    pub has_time: bool,
    pub has_constraints: bool,
    pub has_files: bool,
}

impl EntityModel {
    /// Fields that survive into the DTO artifact
    pub fn dto_fields(&self) -> impl Iterator<Item = &FieldModel> {
        self.fields.iter().filter(|f| !f.skip_domain)
    }

    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldModel {
    pub name: String,
    /// Exported Go identifier
    pub go_name: String,
    pub json_name: String,
    pub db_name: String,
    /// Go type in the domain model
    pub go_type: String,
    /// Go type in the DTO model
    pub dto_type: String,
    pub optional: bool,
    pub is_list: bool,
    pub item_type_name: String,
    pub item_fields: Vec<FieldModel>,
    pub is_secret: bool,
    pub is_pii: bool,
    pub skip_domain: bool,
    /// Raw validation rule
    pub validate_tag: String,
    /// Struct-tag ready rule (`omitempty,` prefixed for optional fields)
    pub binding: String,
    pub default: Option<String>,
    pub env_var: String,
    pub constraints: Option<Constraints>,
    pub db: DbMeta,
    pub file: Option<FileMeta>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DbMeta {
    #[serde(rename = "type")]
    pub sql_type: String,
    pub primary_key: bool,
    pub unique: bool,
    pub index: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileMeta {
    pub kind: String,
    pub thumbnail: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceModel {
    pub name: String,
    pub description: String,
    pub methods: Vec<MethodModel>,
    pub publishes: Vec<String>,
    pub subscribes: Vec<Subscription>,
    pub uses: Vec<String>,
    pub requires: Requirements,
    pub metadata: Metadata,
    pub source: String,
    /// Any method opens a transaction
    pub needs_tx: bool,
    /// Any method publishes an event
    pub publishes_events: bool,
    /// Non-DTO entities read through repositories, sorted
    pub repo_entities: Vec<String>,
    /// Any method declares a cache TTL
    pub has_cache: bool,
}

impl ServiceModel {
    pub fn method(&self, name: &str) -> Option<&MethodModel> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Subscription {
    pub event: String,
    pub handler: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MethodModel {
    pub name: String,
    pub description: String,
    pub input: Option<EntityModel>,
    pub output: Option<EntityModel>,
    pub sources: Vec<SourceModel>,
    /// Normalized flow
    pub flow: Vec<Step>,
    /// Go statements for the flow, present when every step is supported
    pub flow_code: Option<String>,
    pub impl_code: String,
    pub impl_imports: Vec<String>,
    /// Runs inside a transaction (inline code asks for one or the flow has a `tx.Block`)
    pub requires_tx: bool,
    pub pagination: Option<Pagination>,
    pub cache_ttl: String,
    pub cache_tags: Vec<String>,
    pub throws: Vec<String>,
    pub publishes: Vec<String>,
    pub broadcasts: Vec<String>,
    pub idempotent: bool,
    pub dedupe_key: String,
    pub outbox: bool,
    pub metadata: Metadata,
    pub source: String,
    /// Signature as written inside the `port` package
    pub port_signature: MethodSignature,
    /// Signature as written outside the `port` package
    pub impl_signature: MethodSignature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceModel {
    pub name: String,
    pub kind: String,
    pub entity: String,
    pub collection: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventModel {
    pub name: String,
    pub fields: Vec<FieldModel>,
    pub metadata: Metadata,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorModel {
    pub name: String,
    pub code: i64,
    pub http_status: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EndpointModel {
    /// Upper-cased HTTP verb or `WS`
    pub method: String,
    pub path: String,
    pub service: String,
    pub rpc: String,
    pub description: String,
    pub messages: Vec<String>,
    pub room_param: String,
    /// Exported Go name of the WS room key, empty for HTTP endpoints
    pub room_field: String,
    pub auth: Option<EndpointAuth>,
    pub rate_limit: Option<RateLimit>,
    pub circuit_breaker: Option<CircuitBreaker>,
    pub retry: Option<Retry>,
    pub pagination: Option<Pagination>,
    pub cache: String,
    pub cache_tags: Vec<String>,
    pub invalidate: Vec<String>,
    pub timeout: String,
    pub errors: Vec<String>,
    pub test_hints: Option<TestHints>,
    pub metadata: Metadata,
    pub path_params: Vec<String>,
    pub is_ws: bool,
    /// list, get, create, update, delete, action or other
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepositoryModel {
    pub name: String,
    pub entity: String,
    pub finders: Vec<FinderModel>,
    pub source: String,
    pub is_dto: bool,
    pub storage: String,
    /// Standard methods not shadowed by a finder
    pub methods: Vec<FinderSignature>,
    pub has_time: bool,
}

impl RepositoryModel {
    /// Standard methods followed by the finders: the full port surface
    pub fn method_set(&self) -> Vec<&FinderSignature> {
        self.methods
            .iter()
            .chain(self.finders.iter().map(|f| &f.signature))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinderModel {
    pub name: String,
    pub action: String,
    pub returns: String,
    pub return_type: String,
    #[serde(rename = "where")]
    pub filters: Vec<WhereClause>,
    pub order_by: String,
    pub limit: i64,
    pub for_update: bool,
    pub custom_sql: String,
    pub source: String,
    pub signature: FinderSignature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleModel {
    pub name: String,
    pub service: String,
    pub action: String,
    pub at: String,
    pub every: String,
    pub publish: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthModel {
    pub kind: String,
    pub service: String,
    pub issuer: String,
}
