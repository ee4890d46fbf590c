//! IR to model projection
//!
//! Projection is total: nothing is rejected, unknown kinds lower to `any` and
//! entity references stay by-name, so reference cycles are never followed.

use super::types::{item_type_name, lower_type, TypeFlavor};
use super::*;
use crate::flow;
use crate::ir::{self, Schema};
use crate::signature::{standard_repository_methods, FinderSignature, MethodSignature};
use crate::util::{db_name, export_name, json_name};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Project a migrated schema into the template model
pub fn project(schema: &Schema) -> Model {
    let mut entities: Vec<EntityModel> = schema.entities.iter().map(project_entity).collect();
    entities.sort_by(|a, b| a.name.cmp(&b.name));

    let dto_names: BTreeSet<&str> = entities
        .iter()
        .filter(|e| e.is_dto)
        .map(|e| e.name.as_str())
        .collect();

    let mut services: Vec<ServiceModel> = schema
        .services
        .iter()
        .map(|s| project_service(s, &dto_names))
        .collect();
    services.sort_by(|a, b| a.name.cmp(&b.name));

    let mut endpoints: Vec<EndpointModel> = schema
        .endpoints
        .iter()
        .map(|ep| project_endpoint(ep, &services))
        .collect();
    endpoints.sort_by(|a, b| {
        (&a.service, &a.path, &a.method, &a.rpc).cmp(&(&b.service, &b.path, &b.method, &b.rpc))
    });

    let mut repos: Vec<RepositoryModel> = schema
        .repos
        .iter()
        .map(|r| project_repository(r, &entities))
        .collect();
    repos.sort_by(|a, b| a.name.cmp(&b.name));

    let mut events: Vec<EventModel> = schema
        .events
        .iter()
        .map(|e| EventModel {
            name: e.name.clone(),
            fields: project_fields(&e.fields),
            metadata: e.metadata.clone(),
            source: e.source.clone(),
        })
        .collect();
    events.sort_by(|a, b| a.name.cmp(&b.name));

    let mut errors: Vec<ErrorModel> = schema
        .errors
        .iter()
        .map(|e| ErrorModel {
            name: e.name.clone(),
            code: e.code,
            http_status: e.http_status,
            message: e.message.clone(),
        })
        .collect();
    errors.sort_by(|a, b| a.name.cmp(&b.name));

    let mut schedules: Vec<ScheduleModel> = schema
        .schedules
        .iter()
        .map(|s| ScheduleModel {
            name: s.name.clone(),
            service: s.service.clone(),
            action: s.action.clone(),
            at: s.at.clone(),
            every: s.every.clone(),
            publish: s.publish.clone(),
        })
        .collect();
    schedules.sort_by(|a, b| a.name.cmp(&b.name));

    let mut ws_event_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for ep in endpoints.iter().filter(|ep| ep.is_ws) {
        let events = ws_event_map.entry(ep.service.clone()).or_default();
        for msg in &ep.messages {
            if !events.contains(msg) {
                events.push(msg.clone());
            }
        }
        events.sort();
    }
    let ws_services = ws_event_map.keys().cloned().collect();
    let service_order = order_services_by_dependencies(&services);

    Model {
        project: ProjectModel {
            name: schema.project.name.clone(),
            version: schema.project.version.clone(),
        },
        entities,
        services,
        events,
        errors,
        endpoints,
        repos,
        schedules,
        auth: schema.auth.as_ref().map(|a| AuthModel {
            kind: a.kind.clone(),
            service: a.service.clone(),
            issuer: a.issuer.clone(),
        }),
        service_order,
        ws_services,
        ws_event_map,
    }
}

fn project_entity(e: &ir::Entity) -> EntityModel {
    let fields = project_fields(&e.fields);
    let is_dto = e
        .metadata
        .get("dto")
        .is_some_and(metadata_flag);
    let storage = e
        .metadata
        .get("storage")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_STORAGE)
        .to_string();
    let primary_key = fields
        .iter()
        .find(|f| f.db.primary_key)
        .or_else(|| fields.iter().find(|f| f.name.eq_ignore_ascii_case("id")))
        .map(|f| f.go_name.clone())
        .unwrap_or_else(|| "ID".to_string());
    EntityModel {
        name: e.name.clone(),
        description: e.description.clone(),
        owner: e.owner.clone(),
        has_time: fields.iter().any(|f| f.go_type.contains("time.Time")),
        has_constraints: fields.iter().any(|f| f.constraints.is_some()),
        has_files: fields.iter().any(|f| f.file.is_some()),
        fields,
        metadata: e.metadata.clone(),
        indexes: e.indexes.clone(),
        ui: e.ui.clone(),
        fsm: e.fsm.clone(),
        source: e.source.clone(),
        is_dto,
        storage,
        collection: format!("{}s", e.name.to_lowercase()),
        primary_key,
    }
}

/// Metadata booleans arrive either as JSON bools or as strings (`"true"`)
fn metadata_flag(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn project_fields(fields: &[ir::Field]) -> Vec<FieldModel> {
    fields.iter().map(project_field).collect()
}

fn project_field(f: &ir::Field) -> FieldModel {
    let mut field = FieldModel {
        name: f.name.clone(),
        go_name: export_name(&f.name),
        json_name: json_name(&f.name),
        db_name: db_name(&f.name),
        go_type: lower_type(&f.typ, &f.name, TypeFlavor::Domain),
        dto_type: lower_type(&f.typ, &f.name, TypeFlavor::Dto),
        optional: f.optional,
        is_list: f.typ.kind == ir::TypeKind::List,
        item_type_name: item_type_name(&f.typ, &f.name),
        item_fields: project_fields(&f.typ.inline_fields),
        is_secret: f.is_secret,
        is_pii: f.is_pii,
        skip_domain: f.skip_domain,
        validate_tag: f.validate_tag.clone(),
        binding: String::new(),
        default: f.default.as_ref().and_then(|v| v.as_str()).map(str::to_string),
        env_var: f.env_var.clone(),
        constraints: f.constraints.clone(),
        db: DbMeta::default(),
        file: None,
        metadata: f.metadata.clone(),
    };

    for attr in &f.attributes {
        let str_arg = |k: &str| {
            attr.args
                .get(k)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let bool_arg = |k: &str| attr.args.get(k).and_then(|v| v.as_bool()).unwrap_or(false);
        match attr.name.as_str() {
            "db" => {
                field.db = DbMeta {
                    sql_type: str_arg("type"),
                    primary_key: bool_arg("primary_key"),
                    unique: bool_arg("unique"),
                    index: bool_arg("index"),
                }
            }
            "validate" => field.validate_tag = str_arg("rule"),
            "env" => {
                if let Some(name) = attr.args.keys().next() {
                    field.env_var = name.clone();
                }
            }
            "image" => {
                field.file = Some(FileMeta {
                    kind: "image".into(),
                    thumbnail: true,
                })
            }
            "file" => {
                field.file = Some(FileMeta {
                    kind: str_arg("kind"),
                    thumbnail: bool_arg("thumbnail"),
                })
            }
            _ => {}
        }
    }

    // Metadata only fills slots the attributes left empty
    let meta = &f.metadata;
    if field.validate_tag.is_empty() {
        if let Some(v) = meta.get("validate_tag").and_then(|v| v.as_str()) {
            field.validate_tag = v.to_string();
        }
    }
    if field.db.sql_type.is_empty() {
        if let Some(v) = meta.get("sql_type").and_then(|v| v.as_str()) {
            field.db.sql_type = v.to_string();
        }
    }
    if meta.get("primary_key").is_some_and(metadata_flag) {
        field.db.primary_key = true;
    }
    if let Some(kind) = meta.get("file_kind").and_then(|v| v.as_str()) {
        field.file.get_or_insert_with(FileMeta::default).kind = kind.to_string();
    }
    if let Some(thumb) = meta.get("generate_thumbnail").and_then(|v| v.as_bool()) {
        field.file.get_or_insert_with(FileMeta::default).thumbnail = thumb;
    }

    if field.db.primary_key {
        field.optional = false;
    }
    field.binding = binding_tag(&field);
    field
}

/// Struct-tag form of the validation rule
fn binding_tag(field: &FieldModel) -> String {
    let mut tag = if field.validate_tag.is_empty() {
        field
            .metadata
            .get("validate")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    } else {
        field.validate_tag.clone()
    };
    if tag.is_empty() {
        return tag;
    }
    if let Some(rule) = tag.strip_prefix("rule=") {
        tag = rule.trim_matches('"').to_string();
    }
    if field.optional && !tag.contains("omitempty") {
        tag = format!("omitempty,{}", tag);
    }
    tag
}

fn project_service(s: &ir::Service, dto_names: &BTreeSet<&str>) -> ServiceModel {
    let mut methods: Vec<MethodModel> = s.methods.iter().map(project_method).collect();
    methods.sort_by(|a, b| a.name.cmp(&b.name));

    let mut repo_entities = BTreeSet::new();
    for m in &methods {
        for src in &m.sources {
            if !src.entity.is_empty() {
                repo_entities.insert(export_name(&src.entity));
            }
        }
        flow::collect_repo_sources(&m.flow, &mut repo_entities);
    }
    let repo_entities = repo_entities
        .into_iter()
        .map(|name| export_name(&name))
        .filter(|name| !dto_names.contains(name.as_str()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut subscribes: Vec<Subscription> = s
        .subscribes
        .iter()
        .map(|(event, handler)| Subscription {
            event: event.clone(),
            handler: handler.clone(),
        })
        .collect();
    subscribes.sort_by(|a, b| a.event.cmp(&b.event));

    ServiceModel {
        name: s.name.clone(),
        description: s.description.clone(),
        needs_tx: methods.iter().any(|m| m.requires_tx),
        publishes_events: methods.iter().any(|m| flow::publishes_events(&m.flow)),
        has_cache: methods.iter().any(|m| !m.cache_ttl.is_empty()),
        repo_entities,
        methods,
        publishes: s.publishes.clone(),
        subscribes,
        uses: s.uses.clone(),
        requires: s.requires,
        metadata: s.metadata.clone(),
        source: s.source.clone(),
    }
}

fn project_method(m: &ir::Method) -> MethodModel {
    let flow_steps = flow::normalize(&m.flow);
    let output = m
        .output
        .as_ref()
        .filter(|e| !e.name.is_empty())
        .map(project_entity);
    let flow_code = if !flow_steps.is_empty() && flow::renderable(&flow_steps) {
        Some(flow::render(&flow_steps, output.is_some()))
    } else {
        None
    };
    let (impl_code, impl_imports, requires_tx) = match &m.implementation {
        Some(imp) => (
            clean_impl_code(&imp.code, output.as_ref().map(|o| o.name.as_str())),
            normalize_imports(&imp.imports),
            imp.requires_tx,
        ),
        None => (String::new(), Vec::new(), false),
    };
    let requires_tx = requires_tx || flow::contains_tx(&flow_steps);
    MethodModel {
        name: m.name.clone(),
        description: m.description.clone(),
        input: m
            .input
            .as_ref()
            .filter(|e| !e.name.is_empty())
            .map(project_entity),
        output,
        sources: m
            .sources
            .iter()
            .map(|s| SourceModel {
                name: s.name.clone(),
                kind: s.kind.clone(),
                entity: s.entity.clone(),
                collection: s.collection.clone(),
            })
            .collect(),
        flow: flow_steps,
        flow_code,
        impl_code,
        impl_imports,
        requires_tx,
        pagination: m.pagination.clone(),
        cache_ttl: m.cache_ttl.clone(),
        cache_tags: m.cache_tags.clone(),
        throws: m.throws.clone(),
        publishes: m.publishes.clone(),
        broadcasts: m.broadcasts.clone(),
        idempotent: m.idempotent,
        dedupe_key: m.dedupe_key.clone(),
        outbox: m.outbox,
        metadata: m.metadata.clone(),
        source: m.source.clone(),
        port_signature: MethodSignature::compute(m, ""),
        impl_signature: MethodSignature::compute(m, "port."),
    }
}

/// Adapt inline code to a body with named `resp`/`err` results
fn clean_impl_code(code: &str, output: Option<&str>) -> String {
    let cleaned = code.trim_start_matches('\n');
    if cleaned.trim().is_empty() {
        return String::new();
    }
    let resp_decl = output.map(|o| format!("var resp port.{}", o));
    let mut removed_resp = false;
    let mut lines = Vec::new();
    for line in cleaned.lines() {
        let trimmed = line.trim();
        if !removed_resp && resp_decl.as_deref() == Some(trimmed) {
            removed_resp = true;
            continue;
        }
        if trimmed == "var err error" {
            continue;
        }
        let mut line = line.to_string();
        if trimmed.starts_with("err := ") {
            line = line.replacen("err :=", "err =", 1);
        }
        if output.is_some() && trimmed.starts_with("resp := port.") {
            line = line.replacen("resp :=", "resp =", 1);
        }
        lines.push(line);
    }
    lines.join("\n").trim_end().to_string()
}

fn normalize_imports(imports: &[String]) -> Vec<String> {
    let set: BTreeSet<String> = imports
        .iter()
        .map(|i| i.trim().trim_matches('"').to_string())
        .filter(|i| !i.is_empty())
        .map(|i| match i.as_str() {
            "http" => "net/http".to_string(),
            "uuid" => "github.com/google/uuid".to_string(),
            _ => i,
        })
        .collect();
    set.into_iter().collect()
}

fn path_param_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([a-zA-Z0-9_]+)\}").expect("static pattern"))
}

/// `{name}` tokens of an endpoint path, in order
pub fn path_params(path: &str) -> Vec<String> {
    path_param_pattern()
        .captures_iter(path)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

fn endpoint_kind(method: &str, path: &str) -> &'static str {
    let ends_with_param = path.ends_with('}');
    if method == "POST" && !ends_with_param {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() >= 2 && parts[parts.len() - 2].starts_with('{') {
            return "action";
        }
    }
    match (ends_with_param, method) {
        (true, "GET") => "get",
        (true, "PATCH") | (true, "PUT") => "update",
        (true, "DELETE") => "delete",
        (false, "GET") => "list",
        (false, "POST") => "create",
        _ => "other",
    }
}

fn project_endpoint(ep: &ir::Endpoint, services: &[ServiceModel]) -> EndpointModel {
    let method = ep.method.to_uppercase();
    let is_ws = method == "WS";
    let params = path_params(&ep.path);
    let room_field = if is_ws {
        room_field(ep, &params, services)
    } else {
        String::new()
    };
    EndpointModel {
        kind: endpoint_kind(&method, &ep.path).to_string(),
        method,
        path: ep.path.clone(),
        service: ep.service.clone(),
        rpc: ep.rpc.clone(),
        description: ep.description.clone(),
        messages: ep.messages.clone(),
        room_param: ep.room_param.clone(),
        room_field,
        auth: ep.auth.clone(),
        rate_limit: ep.rate_limit.clone(),
        circuit_breaker: ep.circuit_breaker.clone(),
        retry: ep.retry.clone(),
        pagination: ep.pagination.clone(),
        cache: ep.cache.clone(),
        cache_tags: ep.cache_tags.clone(),
        invalidate: ep.invalidate.clone(),
        timeout: ep.timeout.clone(),
        errors: ep.errors.clone(),
        test_hints: ep.test_hints.clone(),
        metadata: ep.metadata.clone(),
        path_params: params,
        is_ws,
    }
}

/// Room key of a WS endpoint: explicit room param, else first path param,
/// else `UserID` when the RPC input carries a user id
fn room_field(ep: &ir::Endpoint, params: &[String], services: &[ServiceModel]) -> String {
    let room = if ep.room_param.is_empty() {
        params.first().map(String::as_str).unwrap_or_default()
    } else {
        ep.room_param.as_str()
    };
    if !room.is_empty() {
        return export_name(room);
    }
    let has_user_id = services
        .iter()
        .find(|s| s.name == ep.service)
        .and_then(|s| s.method(&ep.rpc))
        .and_then(|m| m.input.as_ref())
        .is_some_and(|input| input.field("userId").is_some());
    if has_user_id {
        "UserID".to_string()
    } else {
        String::new()
    }
}

fn project_repository(r: &ir::Repository, entities: &[EntityModel]) -> RepositoryModel {
    let entity = entities.iter().find(|e| e.name == r.entity);
    let mut ir_finders = r.finders.clone();
    ir_finders.sort_by(|a, b| a.name.cmp(&b.name));
    let finders: Vec<FinderModel> = ir_finders
        .iter()
        .map(|f| FinderModel {
            name: f.name.clone(),
            action: f.action.clone(),
            returns: f.returns.clone(),
            return_type: f.return_type.clone(),
            filters: f.filters.clone(),
            order_by: f.order_by.clone(),
            limit: f.limit,
            for_update: f.for_update,
            custom_sql: f.custom_sql.clone(),
            source: f.source.clone(),
            signature: FinderSignature::compute(&r.entity, f, ""),
        })
        .collect();
    RepositoryModel {
        name: r.name.clone(),
        entity: r.entity.clone(),
        has_time: finders.iter().any(|f| f.signature.has_time),
        methods: standard_repository_methods(&r.entity, &ir_finders),
        finders,
        source: r.source.clone(),
        is_dto: entity.is_some_and(|e| e.is_dto),
        storage: entity
            .map(|e| e.storage.clone())
            .unwrap_or_else(|| DEFAULT_STORAGE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::from_json(
            &json!({
                "entities": [
                    {"name": "Tender", "fields": [
                        {"name": "id", "type": {"kind": "uuid"},
                         "attributes": [{"name": "db", "args": {"primary_key": true, "type": "UUID"}}],
                         "optional": true},
                        {"name": "title", "type": {"kind": "string"}, "validateTag": "rule=\"required\"", "optional": true},
                        {"name": "closesAt", "type": {"kind": "time"}},
                        {"name": "logo", "type": {"kind": "file"}, "attributes": [{"name": "image", "args": {}}]}
                    ]},
                    {"name": "TenderParticipantReport", "metadata": {"dto": true}, "fields": [
                        {"name": "count", "type": {"kind": "int"}}
                    ]},
                    {"name": "AuditLog", "metadata": {"storage": "mongo"}, "fields": [
                        {"name": "message", "type": {"kind": "string"}}
                    ]}
                ],
                "services": [
                    {"name": "Tenders", "uses": ["Users"], "methods": [
                        {"name": "Report", "sources": [{"entity": "TenderParticipantReport"}]},
                        {"name": "Close", "output": {"name": "CloseResponse"}, "flow": [
                            {"action": "tx.Block", "steps": [
                                {"action": "repo.Save", "args": {"source": "tender", "input": "t"}}
                            ]}
                        ]}
                    ]},
                    {"name": "Users", "methods": [
                        {"name": "Subscribe", "input": {"name": "SubscribeRequest", "fields": [
                            {"name": "userId", "type": {"kind": "string"}}
                        ]}}
                    ]}
                ],
                "endpoints": [
                    {"method": "post", "path": "/tenders/{id}/close", "service": "Tenders", "rpc": "Close"},
                    {"method": "ws", "path": "/ws", "service": "Users", "rpc": "Subscribe", "messages": ["UserUpdated"]},
                    {"method": "get", "path": "/tenders", "service": "Tenders", "rpc": "List"}
                ],
                "repos": [
                    {"name": "TenderRepository", "entity": "Tender", "finders": [
                        {"name": "ListOpen", "returns": "many"},
                        {"name": "FindByTitle", "returns": "one",
                         "where": [{"field": "title", "op": "eq", "param": "title", "paramType": "string"}]}
                    ]}
                ]
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_entities_sorted_with_flags() {
        let model = project(&schema());
        let names: Vec<_> = model.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["AuditLog", "Tender", "TenderParticipantReport"]);
        assert!(model.is_dto("TenderParticipantReport"));
        assert_eq!(model.storage_of("AuditLog"), "mongo");
        assert_eq!(model.storage_of("Tender"), "sql");
        assert!(model.has_mongo_entities());
        assert_eq!(model.entity("AuditLog").unwrap().collection, "auditlogs");
    }

    #[test]
    fn test_dto_flag_accepts_string_form() {
        let schema = Schema::from_json(
            &json!({
                "entities": [
                    {"name": "Summary", "metadata": {"dto": "true"}},
                    {"name": "Draft", "metadata": {"dto": "false"}},
                    {"name": "Ledger", "metadata": {"dto": 1}}
                ]
            })
            .to_string(),
        )
        .unwrap();
        let model = project(&schema);
        assert!(model.is_dto("Summary"));
        assert!(!model.is_dto("Draft"));
        assert!(!model.is_dto("Ledger"));
    }

    #[test]
    fn test_field_enrichment() {
        let model = project(&schema());
        let tender = model.entity("Tender").unwrap();
        let id = tender.field("id").unwrap();
        assert!(id.db.primary_key);
        assert!(!id.optional);
        assert_eq!(id.db.sql_type, "UUID");
        assert_eq!(id.go_name, "ID");
        assert_eq!(tender.primary_key, "ID");

        let title = tender.field("title").unwrap();
        assert_eq!(title.binding, "omitempty,required");

        let logo = tender.field("logo").unwrap();
        assert_eq!(
            logo.file,
            Some(FileMeta {
                kind: "image".into(),
                thumbnail: true
            })
        );
        assert!(tender.has_time);
        assert!(tender.has_files);
    }

    #[test]
    fn test_service_derivations() {
        let model = project(&schema());
        let tenders = model.service("Tenders").unwrap();
        assert!(tenders.needs_tx);
        assert_eq!(tenders.repo_entities, vec!["Tender".to_string()]);
        let methods: Vec<_> = tenders.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["Close", "Report"]);
        let close = tenders.method("Close").unwrap();
        assert!(close.flow_code.as_deref().unwrap().contains("s.TenderRepo.Save(ctx, t)"));
        assert_eq!(close.impl_signature.named_results, "(resp port.CloseResponse, err error)");
        assert_eq!(model.service_order, vec!["Users", "Tenders"]);
    }

    #[test]
    fn test_endpoints_sorted_and_ws() {
        let model = project(&schema());
        let order: Vec<_> = model
            .endpoints
            .iter()
            .map(|e| format!("{} {}", e.method, e.path))
            .collect();
        assert_eq!(order, vec!["GET /tenders", "POST /tenders/{id}/close", "WS /ws"]);
        assert_eq!(model.endpoints[1].kind, "action");
        assert_eq!(model.endpoints[1].path_params, vec!["id".to_string()]);
        assert_eq!(model.endpoints[2].room_field, "UserID");
        assert_eq!(model.ws_services, vec!["Users".to_string()]);
        assert_eq!(model.ws_event_map["Users"], vec!["UserUpdated".to_string()]);
    }

    #[test]
    fn test_repository_projection() {
        let model = project(&schema());
        let repo = &model.repos[0];
        let finders: Vec<_> = repo.finders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(finders, vec!["FindByTitle", "ListOpen"]);
        assert_eq!(repo.finders[1].signature.return_type, "[]domain.Tender");
        assert_eq!(repo.methods.len(), 4);
        assert_eq!(repo.storage, "sql");
    }

    #[test]
    fn test_clean_impl_code() {
        let code = "\nvar resp port.Out\nvar err error\nerr := doIt()\nresp := port.Out{}\nreturn resp, err\n";
        assert_eq!(
            clean_impl_code(code, Some("Out")),
            "err = doIt()\nresp = port.Out{}\nreturn resp, err"
        );
        assert_eq!(clean_impl_code("  \n", None), "");
    }

    #[test]
    fn test_normalize_imports() {
        let imports = vec!["\"http\"".to_string(), "uuid".into(), "strings".into(), "strings".into()];
        assert_eq!(
            normalize_imports(&imports),
            vec!["github.com/google/uuid", "net/http", "strings"]
        );
    }
}
