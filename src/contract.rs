//! Contract-test request synthesis
//!
//! Derives a minimal valid request for every endpoint from the input entity
//! of its RPC: required fields only, with values that satisfy the common
//! validation rules.

use crate::model::{EndpointModel, FieldModel, Model};
use crate::util::export_name;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Timestamp used for every time-like field
pub const SAMPLE_TIME: &str = "2026-01-01T00:00:00Z";

/// Names filled even when optional
const FORCED_FIELDS: [&str; 2] = ["companyname", "password"];

/// One endpoint under test
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContractCase {
    /// Go test function suffix, unique within the suite
    pub name: String,
    pub method: String,
    pub path: String,
    pub service: String,
    pub rpc: String,
    pub is_ws: bool,
    pub has_input: bool,
    pub has_required: bool,
    /// Request carries a JSON body (neither GET nor WS)
    pub has_body: bool,
    /// Raw JSON text of the body
    pub body_json: String,
    /// `?k=v&...`, empty when nothing is needed
    pub query: String,
    pub has_auth: bool,
    pub path_params: Vec<String>,
}

/// Endpoints the auth bootstrap of the suite talks to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthEndpoints {
    pub register_method: String,
    pub register_path: String,
    pub login_method: String,
    pub login_path: String,
    pub refresh_method: String,
    pub refresh_path: String,
}

impl AuthEndpoints {
    pub fn is_empty(&self) -> bool {
        self.login_path.is_empty() && self.register_path.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContractSuite {
    pub cases: Vec<ContractCase>,
    pub auth: AuthEndpoints,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Rules {
    required: bool,
    email: bool,
    url: bool,
    min: Option<f64>,
    gte: Option<f64>,
}

fn parse_rules(tag: &str) -> Rules {
    let mut rules = Rules::default();
    for part in tag.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part {
            "required" => rules.required = true,
            "email" => rules.email = true,
            "url" => rules.url = true,
            _ => {
                let Some((key, value)) = part.split_once('=') else {
                    continue;
                };
                let Ok(num) = value.trim().parse::<f64>() else {
                    continue;
                };
                match key.trim() {
                    "min" => rules.min = Some(num),
                    "gte" => rules.gte = Some(num),
                    _ => {}
                }
            }
        }
    }
    rules
}

fn field_rules(field: &FieldModel) -> Rules {
    let tag = if field.binding.is_empty() {
        &field.validate_tag
    } else {
        &field.binding
    };
    parse_rules(tag)
}

fn lower_bound(rules: &Rules) -> f64 {
    [rules.min, rules.gte]
        .into_iter()
        .flatten()
        .fold(1.0, f64::max)
}

fn is_time_name(lower: &str) -> bool {
    lower.ends_with("at") || lower == "startsat" || lower == "endsat"
}

/// Path parameters plus injected auth fields, lower-cased
pub fn excluded_fields(endpoint: &EndpointModel) -> BTreeSet<String> {
    let mut out: BTreeSet<String> = endpoint.path_params.iter().map(|p| p.to_lowercase()).collect();
    if let Some(auth) = &endpoint.auth {
        out.extend(auth.inject.iter().map(|f| f.to_lowercase()));
    }
    out
}

/// Whether any non-excluded field must be sent
pub fn has_required(fields: &[FieldModel], exclude: &BTreeSet<String>) -> bool {
    fields
        .iter()
        .filter(|f| !exclude.contains(&f.name.to_lowercase()))
        .any(|f| !f.optional || field_rules(f).required)
}

fn sample_value(field: &FieldModel, rules: &Rules) -> Value {
    let lower = field.name.to_lowercase();
    if rules.email {
        return json!("user@example.com");
    }
    if rules.url {
        return json!("https://example.com");
    }
    if is_time_name(&lower) {
        return json!(SAMPLE_TIME);
    }
    match field.go_type.as_str() {
        "string" => match lower.as_str() {
            "password" => json!("test1234"),
            "companyname" => json!("Test Company"),
            _ => json!("test"),
        },
        "int" | "int64" => json!(lower_bound(rules) as i64),
        "float64" => json!(lower_bound(rules)),
        "bool" => json!(true),
        "time.Time" => json!(SAMPLE_TIME),
        t if t.starts_with("map[") => json!({}),
        t if t.starts_with("[]") => json!([]),
        _ => json!({}),
    }
}

/// Minimal JSON body: one entry per required (or forced) field, keyed by the
/// lower-cased field name. A single surviving field yields its bare value.
pub fn minimal_body(fields: &[FieldModel], exclude: &BTreeSet<String>) -> String {
    let mut body = Map::new();
    let mut kept = Vec::new();
    for field in fields {
        let lower = field.name.to_lowercase();
        if exclude.contains(&lower) {
            continue;
        }
        let rules = field_rules(field);
        if field.optional && !rules.required && !FORCED_FIELDS.contains(&lower.as_str()) {
            continue;
        }
        body.insert(lower.clone(), sample_value(field, &rules));
        kept.push(lower);
    }
    if let [only] = kept.as_slice() {
        if let Some(value) = body.get(only) {
            return value.to_string();
        }
    }
    Value::Object(body).to_string()
}

fn format_float(v: f64) -> String {
    let s = format!("{:.6}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Minimal query string for GET endpoints
pub fn minimal_query(fields: &[FieldModel], endpoint: &EndpointModel, exclude: &BTreeSet<String>) -> String {
    let mut parts = Vec::new();
    for field in fields {
        let lower = field.name.to_lowercase();
        if exclude.contains(&lower) {
            continue;
        }
        let rules = field_rules(field);
        if field.optional && !rules.required {
            continue;
        }
        if rules.email {
            parts.push(format!("{}=user@example.com", lower));
            continue;
        }
        if rules.url {
            parts.push(format!("{}=https%3A%2F%2Fexample.com", lower));
            continue;
        }
        match field.go_type.as_str() {
            "string" => parts.push(format!("{}=test", lower)),
            "int" | "int64" => parts.push(format!("{}={}", lower, lower_bound(&rules) as i64)),
            "float64" => parts.push(format!("{}={}", lower, format_float(lower_bound(&rules)))),
            "bool" => parts.push(format!("{}=true", lower)),
            _ => {}
        }
    }
    if let Some(p) = &endpoint.pagination {
        let limit = if p.default_limit > 0 { p.default_limit } else { 10 };
        parts.push(format!("limit={}", limit));
        if p.kind == "offset" {
            parts.push("offset=0".to_string());
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

/// Build the contract suite for every endpoint of `model`
pub fn synthesize(model: &Model) -> ContractSuite {
    let mut suite = ContractSuite::default();
    let mut names: BTreeMap<String, usize> = BTreeMap::new();

    for ep in &model.endpoints {
        let mut case = ContractCase {
            method: ep.method.clone(),
            path: ep.path.clone(),
            service: ep.service.clone(),
            rpc: ep.rpc.clone(),
            is_ws: ep.is_ws,
            has_auth: ep
                .auth
                .as_ref()
                .is_some_and(|a| a.kind.eq_ignore_ascii_case("jwt")),
            path_params: ep.path_params.clone(),
            ..Default::default()
        };

        let input = model
            .service(&ep.service)
            .and_then(|s| s.method(&ep.rpc))
            .and_then(|m| m.input.as_ref());
        if let Some(input) = input {
            let exclude = excluded_fields(ep);
            case.has_input = true;
            case.has_required = has_required(&input.fields, &exclude);
            case.body_json = minimal_body(&input.fields, &exclude);
            case.query = minimal_query(&input.fields, ep, &exclude);
        }
        case.has_body = case.has_input && ep.method != "GET" && !ep.is_ws;

        match ep.rpc.as_str() {
            "RegisterUser" => {
                suite.auth.register_method = ep.method.clone();
                suite.auth.register_path = ep.path.clone();
            }
            "LoginUser" => {
                suite.auth.login_method = ep.method.clone();
                suite.auth.login_path = ep.path.clone();
            }
            "RefreshToken" => {
                suite.auth.refresh_method = ep.method.clone();
                suite.auth.refresh_path = ep.path.clone();
            }
            _ => {}
        }

        let base = format!(
            "{}{}{}",
            export_name(&ep.service),
            export_name(&ep.rpc),
            export_name(&ep.method.to_lowercase())
        );
        let seen = names.entry(base.clone()).or_insert(0);
        *seen += 1;
        case.name = if *seen == 1 { base } else { format!("{}{}", base, seen) };
        suite.cases.push(case);
    }
    suite
}
