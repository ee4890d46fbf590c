//! Finder and method signature synthesis
//!
//! Every artifact that mentions a repository finder or a service method gets
//! its parameter list and result type from here, so the port, the
//! implementations and the mocks can never disagree.

use crate::ir::{Finder, Method};
use serde::Serialize;

/// Canonical Go signature of a repository method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinderSignature {
    pub name: String,
    /// `save`, `find_by_id`, `list_all`, `delete` or `finder`
    pub kind: String,
    /// `param type` pairs, comma separated
    pub params_sig: String,
    pub arg_names: String,
    /// Empty when the return type could not be resolved
    pub return_type: String,
    pub return_zero: String,
    pub return_slice: bool,
    pub has_time: bool,
    /// Parameter list including the leading context
    pub call_params: String,
    /// Argument list including the leading context
    pub call_args: String,
    /// Result list: `(T, error)` or `error`
    pub results: String,
}

impl FinderSignature {
    /// Compute the signature of `finder` on a repository of `entity`.
    ///
    /// `fallback_return_type` is used when the finder declares neither an
    /// explicit return type nor a `returns` kind.
    pub fn compute(entity: &str, finder: &Finder, fallback_return_type: &str) -> Self {
        let mut has_time = false;
        let mut params = Vec::with_capacity(finder.filters.len());
        let mut args = Vec::with_capacity(finder.filters.len());
        for w in &finder.filters {
            let typ = match w.param_type.trim() {
                "time" | "time.Time" => {
                    has_time = true;
                    "time.Time"
                }
                other => other,
            };
            params.push(format!("{} {}", w.param, typ));
            args.push(w.param.clone());
        }
        let (return_type, return_zero, return_slice) =
            resolve_return(entity, finder, fallback_return_type);
        Self::assemble(
            crate::util::export_name(&finder.name),
            "finder",
            params.join(", "),
            args.join(", "),
            return_type,
            return_zero,
            return_slice,
            has_time,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        name: String,
        kind: &str,
        params_sig: String,
        arg_names: String,
        return_type: String,
        return_zero: String,
        return_slice: bool,
        has_time: bool,
    ) -> Self {
        let call_params = if params_sig.is_empty() {
            "ctx context.Context".to_string()
        } else {
            format!("ctx context.Context, {}", params_sig)
        };
        let call_args = if arg_names.is_empty() {
            "ctx".to_string()
        } else {
            format!("ctx, {}", arg_names)
        };
        let results = if return_type.is_empty() {
            "error".to_string()
        } else {
            format!("({}, error)", return_type)
        };
        FinderSignature {
            name,
            kind: kind.to_string(),
            params_sig,
            arg_names,
            return_type,
            return_zero,
            return_slice,
            has_time,
            call_params,
            call_args,
            results,
        }
    }

    fn standard(name: &str, kind: &str, param: Option<(&str, &str)>, return_type: String) -> Self {
        let (params_sig, arg_names) = match param {
            Some((p, t)) => (format!("{} {}", p, t), p.to_string()),
            None => (String::new(), String::new()),
        };
        let return_slice = return_type.starts_with("[]");
        let return_zero = if return_type.is_empty() {
            String::new()
        } else {
            zero_value(&return_type)
        };
        Self::assemble(
            name.to_string(),
            kind,
            params_sig,
            arg_names,
            return_type,
            return_zero,
            return_slice,
            false,
        )
    }
}

fn resolve_return(entity: &str, finder: &Finder, fallback: &str) -> (String, String, bool) {
    if !finder.return_type.is_empty() {
        let rt = finder.return_type.clone();
        let slice = rt.starts_with("[]");
        return (rt, "nil".to_string(), slice);
    }
    if finder.action == "delete" {
        return ("int64".into(), "0".into(), false);
    }
    let returns = finder.returns.as_str();
    if returns == "one" || returns == entity || returns.strip_prefix('*') == Some(entity) {
        return (format!("*domain.{}", entity), "nil".into(), false);
    }
    if returns == "many" || returns.strip_prefix("[]") == Some(entity) {
        return (format!("[]domain.{}", entity), "nil".into(), true);
    }
    match returns {
        "count" => ("int64".into(), "0".into(), false),
        "" if !fallback.is_empty() => (fallback.to_string(), "nil".into(), fallback.starts_with("[]")),
        "" => (String::new(), String::new(), false),
        other => (other.to_string(), zero_value(other), other.starts_with("[]")),
    }
}

/// Zero value of a Go type expression
pub fn zero_value(go_type: &str) -> String {
    if go_type.starts_with('*') || go_type.starts_with("[]") || go_type.starts_with("map") {
        return "nil".into();
    }
    match go_type {
        "int" | "int64" | "int32" | "float64" | "float32" => "0".into(),
        "string" => "\"\"".into(),
        "bool" => "false".into(),
        "time.Time" => "time.Time{}".into(),
        _ => "nil".into(),
    }
}

/// Standard repository methods (`Save`, `FindByID`, `ListAll`, `Delete`).
/// A finder with the same exported name replaces the standard method.
pub fn standard_repository_methods(entity: &str, finders: &[Finder]) -> Vec<FinderSignature> {
    let ptr = format!("*domain.{}", entity);
    let candidates = [
        FinderSignature::standard("Save", "save", Some(("entity", ptr.as_str())), String::new()),
        FinderSignature::standard("FindByID", "find_by_id", Some(("id", "string")), ptr.clone()),
        FinderSignature::standard("ListAll", "list_all", None, format!("[]domain.{}", entity)),
        FinderSignature::standard("Delete", "delete", Some(("id", "string")), String::new()),
    ];
    candidates
        .into_iter()
        .filter(|m| {
            !finders
                .iter()
                .any(|f| crate::util::export_name(&f.name) == m.name)
        })
        .collect()
}

/// Canonical Go signature of a service method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MethodSignature {
    pub name: String,
    /// `ctx context.Context[, req <Input>]`
    pub params: String,
    /// `(<Output>, error)` or `error`
    pub results: String,
    /// `(resp <Output>, err error)` or `(err error)`
    pub named_results: String,
    /// `ctx[, req]`
    pub args: String,
    pub input_type: String,
    pub output_type: String,
}

impl MethodSignature {
    /// `qualifier` is prepended to input and output type names (`""` inside
    /// the port package, `"port."` elsewhere).
    pub fn compute(method: &Method, qualifier: &str) -> Self {
        let input_type = method
            .input
            .as_ref()
            .filter(|e| !e.name.is_empty())
            .map(|e| format!("{}{}", qualifier, e.name))
            .unwrap_or_default();
        let output_type = method
            .output
            .as_ref()
            .filter(|e| !e.name.is_empty())
            .map(|e| format!("{}{}", qualifier, e.name))
            .unwrap_or_default();
        let (params, args) = if input_type.is_empty() {
            ("ctx context.Context".to_string(), "ctx".to_string())
        } else {
            (
                format!("ctx context.Context, req {}", input_type),
                "ctx, req".to_string(),
            )
        };
        let (results, named_results) = if output_type.is_empty() {
            ("error".to_string(), "(err error)".to_string())
        } else {
            (
                format!("({}, error)", output_type),
                format!("(resp {}, err error)", output_type),
            )
        };
        MethodSignature {
            name: method.name.clone(),
            params,
            results,
            named_results,
            args,
            input_type,
            output_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Entity, WhereClause};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn clause(param: &str, typ: &str) -> WhereClause {
        WhereClause {
            field: param.into(),
            op: "eq".into(),
            param: param.into(),
            param_type: typ.into(),
        }
    }

    #[test]
    fn test_find_by_email_signature() {
        let finder = Finder {
            name: "FindByEmail".into(),
            returns: "one".into(),
            filters: vec![clause("email", "string"), clause("createdAfter", "time")],
            ..Default::default()
        };
        let sig = FinderSignature::compute("User", &finder, "");
        assert_eq!(sig.name, "FindByEmail");
        assert_eq!(sig.params_sig, "email string, createdAfter time.Time");
        assert_eq!(sig.arg_names, "email, createdAfter");
        assert_eq!(sig.return_type, "*domain.User");
        assert_eq!(sig.return_zero, "nil");
        assert!(!sig.return_slice);
        assert!(sig.has_time);
        assert_eq!(
            sig.call_params,
            "ctx context.Context, email string, createdAfter time.Time"
        );
        assert_eq!(sig.results, "(*domain.User, error)");
    }

    #[test]
    fn test_param_types_are_trimmed() {
        let finder = Finder {
            name: "FindSince".into(),
            returns: "many".into(),
            filters: vec![clause("since", " time "), clause("owner", "string ")],
            ..Default::default()
        };
        let sig = FinderSignature::compute("Bid", &finder, "");
        assert!(sig.has_time);
        assert_eq!(sig.params_sig, "since time.Time, owner string");
    }

    #[test]
    fn test_fallback_return_type() {
        let finder = Finder {
            name: "FindAllCustom".into(),
            ..Default::default()
        };
        let sig = FinderSignature::compute("Notification", &finder, "[]domain.Notification");
        assert_eq!(sig.return_type, "[]domain.Notification");
        assert!(sig.return_slice);
        assert_eq!(sig.call_params, "ctx context.Context");
    }

    #[rstest]
    #[case("", "many", "", "[]domain.Order", "nil", true)]
    #[case("", "[]Order", "", "[]domain.Order", "nil", true)]
    #[case("", "*Order", "", "*domain.Order", "nil", false)]
    #[case("", "Order", "", "*domain.Order", "nil", false)]
    #[case("", "count", "", "int64", "0", false)]
    #[case("delete", "one", "", "int64", "0", false)]
    #[case("", "one", "*domain.OrderSummary", "*domain.OrderSummary", "nil", false)]
    #[case("", "map[string]int", "", "map[string]int", "nil", false)]
    #[case("", "bool", "", "bool", "false", false)]
    #[case("", "", "", "", "", false)]
    fn test_return_resolution(
        #[case] action: &str,
        #[case] returns: &str,
        #[case] return_type: &str,
        #[case] expected_type: &str,
        #[case] expected_zero: &str,
        #[case] expected_slice: bool,
    ) {
        let finder = Finder {
            name: "Q".into(),
            action: action.into(),
            returns: returns.into(),
            return_type: return_type.into(),
            ..Default::default()
        };
        let sig = FinderSignature::compute("Order", &finder, "");
        assert_eq!(sig.return_type, expected_type);
        assert_eq!(sig.return_zero, expected_zero);
        assert_eq!(sig.return_slice, expected_slice);
    }

    #[test]
    fn test_unresolved_return_is_error_only() {
        let sig = FinderSignature::compute("Order", &Finder::default(), "");
        assert_eq!(sig.results, "error");
    }

    #[test]
    fn test_standard_methods_yield_to_finders() {
        let finders = vec![Finder {
            name: "ListAll".into(),
            returns: "many".into(),
            ..Default::default()
        }];
        let names: Vec<String> = standard_repository_methods("User", &finders)
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Save", "FindByID", "Delete"]);
        let save = &standard_repository_methods("User", &[])[0];
        assert_eq!(save.call_params, "ctx context.Context, entity *domain.User");
        assert_eq!(save.results, "error");
    }

    #[test]
    fn test_method_signature_qualifiers() {
        let method = Method {
            name: "CreateOrder".into(),
            input: Some(Entity {
                name: "CreateOrderRequest".into(),
                ..Default::default()
            }),
            output: Some(Entity {
                name: "CreateOrderResponse".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let port = MethodSignature::compute(&method, "");
        let imp = MethodSignature::compute(&method, "port.");
        assert_eq!(port.params, "ctx context.Context, req CreateOrderRequest");
        assert_eq!(port.results, "(CreateOrderResponse, error)");
        assert_eq!(imp.named_results, "(resp port.CreateOrderResponse, err error)");

        let bare = MethodSignature::compute(&Method::default(), "port.");
        assert_eq!(bare.params, "ctx context.Context");
        assert_eq!(bare.results, "error");
        assert_eq!(bare.args, "ctx");
    }

    proptest! {
        #[test]
        fn prop_signature_is_deterministic(
            params in proptest::collection::vec(
                ("[a-z]{1,8}", prop_oneof![Just("string"), Just("int"), Just("time")]),
                0..5,
            ),
            returns in prop_oneof![Just("one"), Just("many"), Just("count"), Just(""), Just("[]domain.X")],
        ) {
            let finder = Finder {
                name: "findSomething".into(),
                returns: returns.to_string(),
                filters: params.iter().map(|(p, t)| clause(p, t)).collect(),
                ..Default::default()
            };
            let a = FinderSignature::compute("Thing", &finder, "[]domain.Thing");
            let b = FinderSignature::compute("Thing", &finder.clone(), "[]domain.Thing");
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.has_time, params.iter().any(|(_, t)| *t == "time"));
        }
    }
}
