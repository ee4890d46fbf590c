//! Template helpers
//!
//! Helpers only look at their arguments. Model lists are passed in from the
//! template context (`has_service(services, "Users")`), so re-rendering the
//! same context always yields the same bytes.

use crate::signature;
use crate::util;
use minijinja::value::Value;
use minijinja::{Environment, Error, ErrorKind};
use std::collections::BTreeSet;

/// Helper sets layered on top of the shared one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperKit {
    Shared,
    /// Go type mapping (`go_type`, `dto_type`, `zero_value`)
    GoTypes,
    /// Go types plus BSON helpers for document repositories
    Mongo,
}

pub fn register(env: &mut Environment<'_>, kit: HelperKit) {
    register_shared(env);
    if matches!(kit, HelperKit::GoTypes | HelperKit::Mongo) {
        env.add_filter("go_type", go_type);
        env.add_filter("dto_type", dto_type);
        env.add_filter("zero_value", zero_value);
    }
    if kit == HelperKit::Mongo {
        env.add_filter("mongo_bson_name", mongo_bson_name);
        env.add_filter("mongo_value_expr", mongo_value_expr);
    }
}

fn register_shared(env: &mut Environment<'_>) {
    env.add_filter("snake", snake);
    env.add_filter("title", title);
    env.add_filter("export", export);
    env.add_filter("json_name", json_name);
    env.add_filter("lower_first", lower_first);
    env.add_filter("go_quote", go_quote);
    env.add_filter("unqualify", unqualify);
    env.add_filter("indent_go", indent_go);

    env.add_function("has_service", has_service);
    env.add_function("has_method", has_method);
    env.add_function("has_entity", has_entity);
    env.add_function("has_non_user_entities", has_non_user_entities);
    env.add_function("has_repo_entities", has_repo_entities);
    env.add_function("unique_repo_entities", unique_repo_entities);
    env.add_function("all_repo_entities", all_repo_entities);
    env.add_function("has_event_field", has_event_field);
    env.add_function("room_field_for_event", room_field_for_event);
    env.add_function("has_tx_services", has_tx_services);
    env.add_function("fail", fail);
}

fn items(list: &Value) -> Vec<Value> {
    list.try_iter().map(|it| it.collect()).unwrap_or_default()
}

fn attr_str(value: &Value, name: &str) -> String {
    value
        .get_attr(name)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn attr_bool(value: &Value, name: &str) -> bool {
    value.get_attr(name).map(|v| v.is_true()).unwrap_or(false)
}

fn method_source_entities(services: &Value) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for svc in items(services) {
        for method in items(&svc.get_attr("methods").unwrap_or_default()) {
            for source in items(&method.get_attr("sources").unwrap_or_default()) {
                let entity = attr_str(&source, "entity");
                if !entity.is_empty() {
                    out.insert(entity);
                }
            }
        }
        for name in items(&svc.get_attr("repo_entities").unwrap_or_default()) {
            if let Some(name) = name.as_str() {
                out.insert(name.to_string());
            }
        }
    }
    out
}

fn dto_entities(entities: &Value) -> BTreeSet<String> {
    items(entities)
        .iter()
        .filter(|e| attr_bool(e, "is_dto"))
        .map(|e| attr_str(e, "name"))
        .collect()
}

fn snake(s: &str) -> String {
    util::to_snake_case(s)
}

fn title(s: &str) -> String {
    util::to_title(s)
}

fn export(s: &str) -> String {
    util::export_name(s)
}

fn json_name(s: &str) -> String {
    util::json_name(s)
}

fn lower_first(s: &str) -> String {
    util::lower_first(s)
}

fn go_quote(s: &str) -> String {
    util::go_quote(s)
}

/// Strip the `domain.` or `port.` qualifier, for use inside that package
fn unqualify(go_type: &str) -> String {
    go_type.replace("domain.", "").replace("port.", "")
}

/// Indent every non-empty line by `depth` tabs
fn indent_go(code: &str, depth: usize) -> String {
    let pad = "\t".repeat(depth);
    code.lines()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                format!("{pad}{l}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn has_service(services: Value, name: &str) -> bool {
    items(&services).iter().any(|s| attr_str(s, "name") == name)
}

fn has_method(services: Value, service: &str, method: &str) -> bool {
    items(&services)
        .iter()
        .filter(|s| attr_str(s, "name") == service)
        .flat_map(|s| items(&s.get_attr("methods").unwrap_or_default()))
        .any(|m| attr_str(&m, "name") == method)
}

/// Whether any method of `services` reads `entity`
fn has_entity(services: Value, entity: &str) -> bool {
    method_source_entities(&services).contains(entity)
}

fn has_non_user_entities(services: Value) -> bool {
    method_source_entities(&services)
        .iter()
        .any(|e| e != "User")
}

/// Persisted entities read by `services`: DTO-only entities are excluded
pub fn unique_repo_entities(services: Value, entities: Value) -> Vec<String> {
    let dtos = dto_entities(&entities);
    method_source_entities(&services)
        .into_iter()
        .map(|e| util::export_name(&e))
        .filter(|e| !dtos.contains(e))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn has_repo_entities(services: Value, entities: Value) -> bool {
    !unique_repo_entities(services, entities).is_empty()
}

/// Every non-DTO entity name, sorted
fn all_repo_entities(entities: Value) -> Vec<String> {
    let mut out: Vec<String> = items(&entities)
        .iter()
        .filter(|e| !attr_bool(e, "is_dto"))
        .map(|e| attr_str(e, "name"))
        .collect();
    out.sort();
    out
}

fn has_event_field(events: Value, event: &str, field: &str) -> bool {
    if field.is_empty() {
        return false;
    }
    items(&events)
        .iter()
        .filter(|e| attr_str(e, "name") == event)
        .flat_map(|e| items(&e.get_attr("fields").unwrap_or_default()))
        .any(|f| attr_str(&f, "name").eq_ignore_ascii_case(field))
}

/// Room key of the first WS endpoint of `service` that delivers `event`
fn room_field_for_event(endpoints: Value, service: &str, event: &str) -> String {
    items(&endpoints)
        .iter()
        .filter(|ep| attr_bool(ep, "is_ws") && attr_str(ep, "service") == service)
        .find(|ep| {
            items(&ep.get_attr("messages").unwrap_or_default())
                .iter()
                .any(|m| m.as_str() == Some(event))
        })
        .map(|ep| attr_str(ep, "room_field"))
        .unwrap_or_default()
}

fn has_tx_services(services: Value) -> bool {
    items(&services).iter().any(|s| attr_bool(s, "needs_tx"))
}

/// Abort rendering with `message`
fn fail(message: &str) -> Result<Value, Error> {
    Err(Error::new(ErrorKind::InvalidOperation, message.to_string()))
}

/// Go type of a field value as seen from outside the `domain` package
fn go_type(field: Value) -> String {
    attr_str(&field, "go_type")
}

/// DTO spelling of a domain type expression: `[]domain.User` -> `[]UserDTO`
pub fn dto_type(go_type: &str) -> String {
    let mut out = String::with_capacity(go_type.len() + 3);
    let mut rest = go_type;
    while let Some(idx) = rest.find("domain.") {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx + "domain.".len()..];
        let end = tail
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(tail.len());
        out.push_str(&tail[..end]);
        out.push_str("DTO");
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}

fn zero_value(go_type: &str) -> String {
    signature::zero_value(go_type)
}

/// BSON key of a field: `id` maps to `_id`
pub fn mongo_bson_name(name: &str) -> String {
    if name.eq_ignore_ascii_case("id") {
        "_id".to_string()
    } else {
        util::json_name(name)
    }
}

/// Expression storing `entity.<Field>` in a document; string timestamps are
/// normalized first
fn mongo_value_expr(field: Value) -> String {
    let expr = format!("entity.{}", attr_str(&field, "go_name"));
    let sql_type = field
        .get_attr("db")
        .map(|db| attr_str(&db, "type"))
        .unwrap_or_default();
    if attr_str(&field, "go_type") == "string" && sql_type.to_uppercase().contains("TIMESTAMP") {
        format!("normalizeTime({})", expr)
    } else {
        expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Schema;
    use crate::model::project;
    use serde_json::json;

    fn render(src: &str, ctx: serde_json::Value) -> String {
        let mut env = Environment::new();
        register(&mut env, HelperKit::Mongo);
        env.render_str(src, ctx).unwrap()
    }

    fn tender_schema(sources: &[&str]) -> Schema {
        let sources: Vec<_> = sources.iter().map(|s| json!({"entity": s})).collect();
        Schema::from_json(
            &json!({
                "entities": [
                    {"name": "Tender"},
                    {"name": "TenderParticipantReport", "metadata": {"dto": true}}
                ],
                "services": [{"name": "Tenders", "methods": [{"name": "Report", "sources": sources}]}]
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_has_repo_entities_skips_dto() {
        let model = project(&tender_schema(&["TenderParticipantReport"]));
        let services = Value::from_serialize(&model.services);
        let entities = Value::from_serialize(&model.entities);
        assert!(!has_repo_entities(services, entities));

        let model = project(&tender_schema(&["TenderParticipantReport", "Tender"]));
        let services = Value::from_serialize(&model.services);
        let entities = Value::from_serialize(&model.entities);
        assert!(has_repo_entities(services.clone(), entities.clone()));
        assert_eq!(unique_repo_entities(services, entities), vec!["Tender".to_string()]);
    }

    #[test]
    fn test_name_predicates_in_templates() {
        let model = project(&tender_schema(&["Tender"]));
        let out = render(
            "{% if has_service(services, 'Tenders') %}svc{% endif %} \
             {% if has_method(services, 'Tenders', 'Report') %}method{% endif %} \
             {% if has_entity(services, 'Tender') %}entity{% endif %} \
             {% if has_non_user_entities(services) %}non-user{% endif %} \
             {% if not has_service(services, 'Bids') %}no-bids{% endif %} \
             {{ all_repo_entities(entities) | join(',') }}",
            json!({"services": model.services, "entities": model.entities}),
        );
        assert_eq!(out, "svc method entity non-user no-bids Tender");
    }

    #[test]
    fn test_filters() {
        let out = render(
            "{{ 'user_id' | export }} {{ 'UserID' | json_name }} {{ 'domain.User' | unqualify }} {{ 'a\"b' | go_quote }}",
            json!({}),
        );
        assert_eq!(out, r#"UserID userId User "a\"b""#);
        assert_eq!(dto_type("[]domain.User"), "[]UserDTO");
        assert_eq!(dto_type("map[string]*domain.Bid"), "map[string]*BidDTO");
        assert_eq!(dto_type("int64"), "int64");
        assert_eq!(indent_go("a\n\nb", 1), "\ta\n\n\tb");
    }

    #[test]
    fn test_mongo_helpers() {
        assert_eq!(mongo_bson_name("ID"), "_id");
        assert_eq!(mongo_bson_name("createdAt"), "createdAt");
        let field = Value::from_serialize(json!({"go_name": "ClosesAt", "go_type": "string", "db": {"type": "TIMESTAMPTZ"}}));
        assert_eq!(mongo_value_expr(field), "normalizeTime(entity.ClosesAt)");
        let field = Value::from_serialize(json!({"go_name": "Title", "go_type": "string", "db": {"type": ""}}));
        assert_eq!(mongo_value_expr(field), "entity.Title");
    }

    #[test]
    fn test_ws_correlation() {
        let ctx = json!({
            "endpoints": [
                {"is_ws": true, "service": "Chat", "messages": ["MessageSent"], "room_field": "RoomID"},
                {"is_ws": false, "service": "Chat", "messages": [], "room_field": ""}
            ],
            "events": [{"name": "MessageSent", "fields": [{"name": "roomId"}]}]
        });
        let out = render(
            "{{ room_field_for_event(endpoints, 'Chat', 'MessageSent') }}|{{ room_field_for_event(endpoints, 'Chat', 'Other') }}|{% if has_event_field(events, 'MessageSent', 'RoomID') %}field{% endif %}|{% if has_event_field(events, 'MessageSent', 'UserID') %}field{% endif %}",
            ctx,
        );
        assert_eq!(out, "RoomID||field|");
    }

    #[test]
    fn test_fail_aborts() {
        let mut env = Environment::new();
        register(&mut env, HelperKit::Shared);
        let err = env.render_str("{{ fail('no entity') }}", json!({})).unwrap_err();
        assert!(err.to_string().contains("no entity"));
    }
}
