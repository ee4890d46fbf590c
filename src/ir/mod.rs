//! Intermediate representation consumed by the emission core
//!
//! The IR is produced by an external parser and handed over as JSON or YAML.
//! Every collection defaults to empty, so partial documents deserialize and
//! projection never has to deal with missing lists.

pub mod migrate;

use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub use migrate::{migrate_to_current, CURRENT_IR_VERSION};

/// Free-form metadata bag attached to most IR nodes
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Root of the IR tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Schema {
    /// Schema version, normalized by [`migrate_to_current`]
    pub ir_version: String,
    pub project: Project,
    pub entities: Vec<Entity>,
    pub services: Vec<Service>,
    pub events: Vec<Event>,
    pub errors: Vec<ErrorDef>,
    pub endpoints: Vec<Endpoint>,
    #[serde(alias = "repositories")]
    pub repos: Vec<Repository>,
    pub auth: Option<Auth>,
    pub schedules: Vec<Schedule>,
    pub metadata: Metadata,
}

impl Schema {
    /// Parse a schema from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a schema from YAML text
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_norway::from_str(text)?)
    }

    /// Load a schema file, choosing the decoder by extension
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            Some("yaml") | Some("yml") => Self::from_yaml(&text),
            other => Err(Error::Config(format!(
                "unsupported schema extension {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub name: String,
    pub version: String,
}

/// Domain entity, DTO or value object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Entity {
    pub name: String,
    pub description: String,
    /// Service that owns the entity
    pub owner: String,
    pub fields: Vec<Field>,
    pub metadata: Metadata,
    pub indexes: Vec<Index>,
    pub ui: Option<serde_json::Value>,
    pub fsm: Option<Fsm>,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: TypeRef,
    pub optional: bool,
    pub default: Option<serde_json::Value>,
    pub is_secret: bool,
    #[serde(rename = "isPII", alias = "isPii")]
    pub is_pii: bool,
    /// DTO/UI-only field, dropped from the DTO artifact
    pub skip_domain: bool,
    pub validate_tag: String,
    pub env_var: String,
    pub constraints: Option<Constraints>,
    pub attributes: Vec<Attribute>,
    pub ui: Option<serde_json::Value>,
    pub metadata: Metadata,
    pub source: String,
}

/// Language-agnostic type reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeRef {
    pub kind: TypeKind,
    /// Entity or enum name for named kinds
    pub name: String,
    pub item_type: Option<Box<TypeRef>>,
    pub key_type: Option<Box<TypeRef>>,
    /// Inline struct definition for list items
    pub inline_fields: Vec<Field>,
}

impl TypeRef {
    pub fn of(kind: TypeKind) -> Self {
        TypeRef {
            kind,
            ..Default::default()
        }
    }

    pub fn entity(name: &str) -> Self {
        TypeRef {
            kind: TypeKind::Entity,
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn list(item: TypeRef) -> Self {
        TypeRef {
            kind: TypeKind::List,
            item_type: Some(Box::new(item)),
            ..Default::default()
        }
    }
}

/// Fundamental data kinds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    String,
    Int,
    Int64,
    Float,
    Bool,
    Time,
    Uuid,
    Json,
    #[default]
    Any,
    List,
    Map,
    Entity,
    Enum,
    File,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Constraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_len: Option<i64>,
    pub max_len: Option<i64>,
    pub regex: String,
    #[serde(rename = "enum")]
    pub enum_values: Vec<String>,
}

/// Attribute such as `@db`, `@validate`, `@image`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Attribute {
    pub name: String,
    pub args: BTreeMap<String, serde_json::Value>,
}

/// Finite state machine over a status field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Fsm {
    pub field: String,
    pub states: Vec<String>,
    pub transitions: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Index {
    pub fields: Vec<String>,
    pub unique: bool,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Service {
    pub name: String,
    pub description: String,
    pub methods: Vec<Method>,
    pub publishes: Vec<String>,
    /// event -> handler method
    pub subscribes: BTreeMap<String, String>,
    /// Services this one depends on
    pub uses: Vec<String>,
    pub requires: Requirements,
    pub metadata: Metadata,
    pub source: String,
}

/// Infrastructure a service needs at runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Requirements {
    pub sql: bool,
    pub mongo: bool,
    pub redis: bool,
    pub nats: bool,
    pub s3: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Method {
    pub name: String,
    pub description: String,
    pub input: Option<Entity>,
    pub output: Option<Entity>,
    pub sources: Vec<Source>,
    pub flow: Vec<FlowStep>,
    #[serde(rename = "impl")]
    pub implementation: Option<Impl>,
    pub pagination: Option<Pagination>,
    #[serde(rename = "cacheTTL", alias = "cacheTtl")]
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
}

/// Repository or collection read performed by a method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Source {
    pub name: String,
    /// "sql", "mongo", "cache", "external"
    pub kind: String,
    pub entity: String,
    pub collection: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    /// "cursor" or "offset"
    #[serde(rename = "type")]
    pub kind: String,
    pub default_limit: i64,
    pub max_limit: i64,
}

/// Inline implementation escape hatch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Impl {
    pub lang: String,
    pub code: String,
    pub imports: Vec<String>,
    pub requires_tx: bool,
}

/// Declarative step of a method flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowStep {
    pub action: String,
    pub params: Vec<String>,
    pub args: BTreeMap<String, serde_json::Value>,
    pub steps: Vec<FlowStep>,
    pub if_new: Vec<FlowStep>,
    pub if_exists: Vec<FlowStep>,
    pub then: Vec<FlowStep>,
    #[serde(rename = "else")]
    pub otherwise: Vec<FlowStep>,
    pub cases: BTreeMap<String, Vec<FlowStep>>,
    pub default: Vec<FlowStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub name: String,
    pub fields: Vec<Field>,
    pub metadata: Metadata,
    pub source: String,
}

/// Business error
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorDef {
    pub name: String,
    pub code: i64,
    pub http_status: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Endpoint {
    /// GET, POST, PUT, PATCH, DELETE or WS
    pub method: String,
    pub path: String,
    pub service: String,
    pub rpc: String,
    pub description: String,
    /// Event names accepted on a WS endpoint
    pub messages: Vec<String>,
    pub room_param: String,
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
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointAuth {
    /// "jwt", "api_key", "none"
    #[serde(rename = "type")]
    pub kind: String,
    pub permission: String,
    pub roles: Vec<String>,
    pub check: Vec<String>,
    /// Input fields filled from the auth context
    pub inject: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RateLimit {
    pub rps: i64,
    pub burst: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CircuitBreaker {
    pub threshold: i64,
    pub timeout: String,
    pub half_open_max: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Retry {
    pub attempts: i64,
    pub backoff: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TestHints {
    pub happy_path: String,
    pub error_cases: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Repository {
    pub name: String,
    pub entity: String,
    pub finders: Vec<Finder>,
    pub source: String,
}

/// Repository query method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Finder {
    pub name: String,
    /// find, list, count, delete or custom
    pub action: String,
    /// one, many, count or a type expression
    pub returns: String,
    /// Explicit return type, used verbatim
    pub return_type: String,
    #[serde(rename = "where")]
    pub filters: Vec<WhereClause>,
    pub order_by: String,
    pub limit: i64,
    pub for_update: bool,
    #[serde(rename = "customSQL", alias = "customSql")]
    pub custom_sql: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WhereClause {
    pub field: String,
    /// eq, ne, gt, gte, lt, lte, in, like
    pub op: String,
    pub param: String,
    pub param_type: String,
}

/// Authentication settings; `service` owns the login/refresh operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Auth {
    #[serde(rename = "type")]
    pub kind: String,
    pub service: String,
    pub issuer: String,
    pub access_ttl: String,
    pub refresh_ttl: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Schedule {
    pub name: String,
    pub service: String,
    pub action: String,
    pub at: String,
    pub every: String,
    pub publish: String,
}
