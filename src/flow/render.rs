//! Lowering of normalized flows to Go statements
//!
//! The generated code lives inside a service method with named results
//! `resp` (when the method has an output) and `err`. Steps missing a required
//! argument lower to nothing.

use super::{Step, DEFAULT, DO, ELSE, IF_EXISTS, IF_NEW, THEN};
use crate::util::{export_name, go_quote};
use std::collections::BTreeSet;
use std::fmt::Write;

const SUPPORTED: &[&str] = &[
    "logic.Check",
    "repo.Find",
    "repo.Get",
    "repo.GetForUpdate",
    "repo.List",
    "repo.Save",
    "repo.Delete",
    "mapping.Assign",
    "flow.If",
    "if",
    "branch",
    "flow.Switch",
    "switch",
    "upsert",
    "flow.For",
    "flow.Block",
    "tx.Block",
    "list.Filter",
    "list.Paginate",
    "list.Append",
    "list.Sort",
    "str.Normalize",
    "event.Publish",
];

/// Whether every step, at every depth, has a Go lowering
pub fn renderable(steps: &[Step]) -> bool {
    steps.iter().all(|step| {
        SUPPORTED.contains(&step.action.as_str())
            && step.children().into_iter().all(renderable)
    })
}

/// Lower a flow to Go statements at indentation level zero
pub fn render(steps: &[Step], has_output: bool) -> String {
    let mut state = RenderState {
        declared: ["resp", "err"].iter().map(|s| s.to_string()).collect(),
        ret: if has_output { "resp, " } else { "" },
    };
    let mut out = String::new();
    state.steps(&mut out, steps, 0);
    out
}

struct RenderState {
    declared: BTreeSet<String>,
    /// Leading return values before the error
    ret: &'static str,
}

impl RenderState {
    /// Record `name` as declared, reporting whether it is new
    fn declare(&mut self, name: &str) -> bool {
        self.declared.insert(name.to_string())
    }

    fn steps(&mut self, out: &mut String, steps: &[Step], indent: usize) {
        for step in steps {
            self.step(out, step, indent);
        }
    }

    fn step(&mut self, out: &mut String, step: &Step, indent: usize) {
        let pad = "\t".repeat(indent);
        let ret = self.ret;
        // Writing into a String cannot fail
        let _ = match step.action.as_str() {
            "logic.Check" => {
                let cond = step.arg("condition");
                if cond.is_empty() {
                    return;
                }
                let throw = match step.arg("throw") {
                    "" => "validation failed",
                    t => t,
                };
                write!(
                    out,
                    "{pad}if !({cond}) {{\n{pad}\treturn {ret}errors.New(http.StatusBadRequest, \"Validation Error\", {})\n{pad}}}\n",
                    go_quote(throw)
                )
            }
            "repo.Get" | "repo.Find" | "repo.GetForUpdate" | "repo.List" => {
                let source = step.arg("source");
                if source.is_empty() {
                    return;
                }
                let method = match (step.arg("method"), step.action.as_str()) {
                    ("", "repo.List") => "ListAll",
                    ("", "repo.GetForUpdate") => "GetByIDForUpdate",
                    ("", _) => "FindByID",
                    (m, _) => m,
                };
                let call = call_args(step.arg("input"));
                let repo = export_name(source);
                let output = step.arg("output");
                if output.is_empty() {
                    write!(
                        out,
                        "{pad}if _, err := s.{repo}Repo.{method}({call}); err != nil {{\n{pad}\treturn {ret}err\n{pad}}}\n"
                    )
                } else {
                    let assign = if self.declare(output) { ":=" } else { "=" };
                    write!(
                        out,
                        "{pad}{output}, err {assign} s.{repo}Repo.{method}({call})\n{pad}if err != nil {{\n{pad}\treturn {ret}err\n{pad}}}\n"
                    )
                }
            }
            "repo.Save" | "repo.Delete" => {
                let source = step.arg("source");
                if source.is_empty() {
                    return;
                }
                let method = match (step.arg("method"), step.action.as_str()) {
                    ("", "repo.Save") => "Save",
                    ("", _) => "Delete",
                    (m, _) => m,
                };
                let call = call_args(step.arg("input"));
                let repo = export_name(source);
                write!(
                    out,
                    "{pad}if err := s.{repo}Repo.{method}({call}); err != nil {{\n{pad}\treturn {ret}err\n{pad}}}\n"
                )
            }
            "mapping.Assign" => {
                let (to, value) = (step.arg("to"), step.arg("value"));
                if to.is_empty() || value.is_empty() {
                    return;
                }
                let op = if step.arg_bool("declare") && self.declare(to) {
                    ":="
                } else {
                    "="
                };
                writeln!(out, "{pad}{to} {op} {value}")
            }
            "flow.If" | "if" | "branch" => {
                let cond = step.arg("condition");
                if cond.is_empty() {
                    return;
                }
                self.conditional(out, cond, step.branch(THEN), step.branch(ELSE), indent);
                Ok(())
            }
            "upsert" => {
                let target = step.arg("target");
                if target.is_empty() {
                    return;
                }
                let cond = format!("{} == nil", target);
                self.conditional(out, &cond, step.branch(IF_NEW), step.branch(IF_EXISTS), indent);
                Ok(())
            }
            "flow.Switch" | "switch" => {
                let value = step.arg("value");
                if value.is_empty() {
                    return;
                }
                let _ = writeln!(out, "{pad}switch {value} {{");
                if let Some(cases) = step.cases() {
                    for (label, branch) in cases {
                        let _ = writeln!(out, "{pad}case {}:", case_label(label));
                        self.steps(out, branch, indent + 1);
                    }
                }
                let fallback = step.branch(DEFAULT);
                if !fallback.is_empty() {
                    let _ = writeln!(out, "{pad}default:");
                    self.steps(out, fallback, indent + 1);
                }
                writeln!(out, "{pad}}}")
            }
            "flow.For" => {
                let each = step.arg("each");
                if each.is_empty() {
                    return;
                }
                let item = match step.arg("as") {
                    "" => "item",
                    a => a,
                };
                let _ = writeln!(out, "{pad}for _, {item} := range {each} {{");
                self.steps(out, step.branch(DO), indent + 1);
                writeln!(out, "{pad}}}")
            }
            "flow.Block" | "tx.Block" => {
                self.steps(out, step.branch(DO), indent);
                Ok(())
            }
            "list.Filter" => {
                let (from, cond, output) =
                    (step.arg("from"), step.arg("condition"), step.arg("output"));
                if from.is_empty() || cond.is_empty() || output.is_empty() {
                    return;
                }
                let item = match step.arg("as") {
                    "" => "item",
                    a => a,
                };
                self.declare(output);
                write!(
                    out,
                    "{pad}{output} := {from}[:0]\n{pad}for _, {item} := range {from} {{\n{pad}\tif {cond} {{\n{pad}\t\t{output} = append({output}, {item})\n{pad}\t}}\n{pad}}}\n"
                )
            }
            "list.Paginate" => {
                let (input, offset, limit, output) = (
                    step.arg("input"),
                    step.arg("offset"),
                    step.arg("limit"),
                    step.arg("output"),
                );
                if input.is_empty() || offset.is_empty() || limit.is_empty() || output.is_empty() {
                    return;
                }
                let default_limit = step.arg_int("defaultLimit").unwrap_or(50);
                self.declare(output);
                write!(
                    out,
                    "{pad}_off := {offset}\n\
                     {pad}if _off < 0 {{ _off = 0 }}\n\
                     {pad}_lim := {limit}\n\
                     {pad}if _lim <= 0 {{ _lim = {default_limit} }}\n\
                     {pad}_start := _off\n\
                     {pad}if _start > len({input}) {{ _start = len({input}) }}\n\
                     {pad}_end := _start + _lim\n\
                     {pad}if _end > len({input}) {{ _end = len({input}) }}\n\
                     {pad}{output} := {input}[_start:_end]\n"
                )
            }
            "list.Append" => {
                let (to, item) = (step.arg("to"), step.arg("item"));
                if to.is_empty() || item.is_empty() {
                    return;
                }
                writeln!(out, "{pad}{to} = append({to}, {item})")
            }
            "list.Sort" => {
                let (input, output, by) = (step.arg("input"), step.arg("output"), step.arg("by"));
                if input.is_empty() || output.is_empty() || by.is_empty() {
                    return;
                }
                let cmp = if step.arg("order").eq_ignore_ascii_case("desc") {
                    ">"
                } else {
                    "<"
                };
                self.declare(output);
                write!(
                    out,
                    "{pad}{output} := append({input}[:0:0], {input}...)\n{pad}sort.Slice({output}, func(i, j int) bool {{ return {output}[i].{by} {cmp} {output}[j].{by} }})\n"
                )
            }
            "str.Normalize" => {
                let (input, output) = (step.arg("input"), step.arg("output"));
                if input.is_empty() || output.is_empty() {
                    return;
                }
                self.declare(output);
                if step.arg("mode").eq_ignore_ascii_case("trim") {
                    writeln!(out, "{pad}{output} := strings.TrimSpace({input})")
                } else {
                    writeln!(out, "{pad}{output} := strings.ToLower(strings.TrimSpace({input}))")
                }
            }
            "event.Publish" => {
                let event = step.arg("event");
                if event.is_empty() {
                    return;
                }
                let payload = match step.arg("payload") {
                    "" => "nil",
                    p => p,
                };
                write!(
                    out,
                    "{pad}if err := s.publisher.Publish(ctx, {}, {payload}); err != nil {{\n{pad}\treturn {ret}err\n{pad}}}\n",
                    go_quote(event)
                )
            }
            _ => Ok(()),
        };
    }

    fn conditional(
        &mut self,
        out: &mut String,
        cond: &str,
        then: &[Step],
        otherwise: &[Step],
        indent: usize,
    ) {
        let pad = "\t".repeat(indent);
        let _ = writeln!(out, "{pad}if {cond} {{");
        self.steps(out, then, indent + 1);
        out.push_str(&pad);
        out.push('}');
        if !otherwise.is_empty() {
            out.push_str(" else {\n");
            self.steps(out, otherwise, indent + 1);
            out.push_str(&pad);
            out.push('}');
        }
        out.push('\n');
    }
}

fn call_args(input: &str) -> String {
    if input.is_empty() {
        "ctx".to_string()
    } else {
        format!("ctx, {}", input)
    }
}

/// Numeric and boolean labels stay bare, anything else is a string literal
fn case_label(label: &str) -> String {
    if label.parse::<f64>().is_ok() || label == "true" || label == "false" {
        label.to_string()
    } else {
        go_quote(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::normalize;
    use crate::ir::FlowStep;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn step(action: &str, args: serde_json::Value) -> FlowStep {
        FlowStep {
            action: action.into(),
            args: serde_json::from_value(args).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_check_and_repo_get() {
        let flow = normalize(&[
            step("logic.Check", json!({"condition": "req.Email != \"\"", "throw": "email required"})),
            step("repo.Get", json!({"source": "user", "input": "req.ID", "output": "user"})),
            step("repo.Get", json!({"source": "user", "input": "req.ID", "output": "user"})),
        ]);
        let code = render(&flow, true);
        assert_eq!(
            code,
            "if !(req.Email != \"\") {\n\
             \treturn resp, errors.New(http.StatusBadRequest, \"Validation Error\", \"email required\")\n\
             }\n\
             user, err := s.UserRepo.FindByID(ctx, req.ID)\n\
             if err != nil {\n\
             \treturn resp, err\n\
             }\n\
             user, err = s.UserRepo.FindByID(ctx, req.ID)\n\
             if err != nil {\n\
             \treturn resp, err\n\
             }\n"
        );
    }

    #[test]
    fn test_no_output_returns_err_only() {
        let flow = normalize(&[step("repo.Delete", json!({"source": "Order", "input": "req.ID"}))]);
        assert_eq!(
            render(&flow, false),
            "if err := s.OrderRepo.Delete(ctx, req.ID); err != nil {\n\treturn err\n}\n"
        );
    }

    #[test]
    fn test_if_else_and_nested_tx() {
        let mut cond = step("flow.If", json!({"condition": "req.Force"}));
        let mut tx = step("tx.Block", json!({}));
        tx.steps = vec![step("repo.Save", json!({"source": "Order", "input": "order"}))];
        cond.then = vec![tx];
        cond.otherwise = vec![step("mapping.Assign", json!({"to": "resp.Skipped", "value": "true"}))];
        let code = render(&normalize(&[cond]), true);
        assert_eq!(
            code,
            "if req.Force {\n\
             \tif err := s.OrderRepo.Save(ctx, order); err != nil {\n\
             \t\treturn resp, err\n\
             \t}\n\
             } else {\n\
             \tresp.Skipped = true\n\
             }\n"
        );
    }

    #[test]
    fn test_switch_labels_sorted() {
        let mut sw = step("switch", json!({"value": "req.Kind"}));
        sw.cases.insert("b".into(), vec![step("mapping.Assign", json!({"to": "x", "value": "2"}))]);
        sw.cases.insert("a".into(), vec![step("mapping.Assign", json!({"to": "x", "value": "1"}))]);
        sw.default = vec![step("mapping.Assign", json!({"to": "x", "value": "0"}))];
        let code = render(&normalize(&[sw]), true);
        assert_eq!(
            code,
            "switch req.Kind {\ncase \"a\":\n\tx = 1\ncase \"b\":\n\tx = 2\ndefault:\n\tx = 0\n}\n"
        );
    }

    #[test]
    fn test_assign_declares_once() {
        let flow = normalize(&[
            step("mapping.Assign", json!({"to": "total", "value": "0", "declare": true})),
            step("mapping.Assign", json!({"to": "total", "value": "1", "declare": "true"})),
        ]);
        assert_eq!(render(&flow, true), "total := 0\ntotal = 1\n");
    }

    #[test]
    fn test_missing_args_render_nothing() {
        let flow = normalize(&[
            step("repo.Get", json!({})),
            step("flow.For", json!({})),
            step("list.Sort", json!({"input": "xs"})),
        ]);
        assert_eq!(render(&flow, true), "");
    }

    #[test]
    fn test_renderable() {
        let mut block = step("flow.Block", json!({}));
        block.steps = vec![step("repo.Save", json!({"source": "X"}))];
        assert!(renderable(&normalize(&[block.clone()])));
        block.steps.push(step("http.Call", json!({})));
        assert!(!renderable(&normalize(&[block])));
        assert!(renderable(&[]));
    }

    #[test]
    fn test_sort_and_normalize() {
        let flow = normalize(&[
            step("list.Sort", json!({"input": "items", "output": "sorted", "by": "CreatedAt", "order": "DESC"})),
            step("str.Normalize", json!({"input": "req.Email", "output": "email"})),
        ]);
        assert_eq!(
            render(&flow, true),
            "sorted := append(items[:0:0], items...)\n\
             sort.Slice(sorted, func(i, j int) bool { return sorted[i].CreatedAt > sorted[j].CreatedAt })\n\
             email := strings.ToLower(strings.TrimSpace(req.Email))\n"
        );
    }
}
