//! Flow normalization
//!
//! IR flow steps carry their branches in dedicated slots (`steps`, `then`,
//! `cases`, ...). Templates and the Go lowering in [`render`] work on a single
//! uniform shape instead: every branch list lives in `args` under one of the
//! well-known keys below.

pub mod render;

use crate::ir::FlowStep;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub use render::{render, renderable};

pub const DO: &str = "_do";
pub const IF_NEW: &str = "_ifNew";
pub const IF_EXISTS: &str = "_ifExists";
pub const THEN: &str = "_then";
pub const ELSE: &str = "_else";
pub const CASES: &str = "_cases";
pub const DEFAULT: &str = "_default";

/// Branch keys holding a plain step list, in traversal order
const BRANCH_KEYS: [&str; 6] = [DO, IF_NEW, IF_EXISTS, THEN, ELSE, DEFAULT];

/// Normalized flow step
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Step {
    pub action: String,
    pub params: Vec<String>,
    pub args: BTreeMap<String, StepArg>,
}

/// Value stored under a step argument
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepArg {
    Steps(Vec<Step>),
    Cases(BTreeMap<String, Vec<Step>>),
    Value(serde_json::Value),
}

/// Translate IR steps into the uniform shape, recursively
pub fn normalize(steps: &[FlowStep]) -> Vec<Step> {
    steps.iter().map(normalize_step).collect()
}

fn normalize_step(step: &FlowStep) -> Step {
    let mut args: BTreeMap<String, StepArg> = step
        .args
        .iter()
        .map(|(k, v)| (k.clone(), StepArg::Value(v.clone())))
        .collect();
    let branches = [
        (DO, &step.steps),
        (IF_NEW, &step.if_new),
        (IF_EXISTS, &step.if_exists),
        (THEN, &step.then),
        (ELSE, &step.otherwise),
        (DEFAULT, &step.default),
    ];
    for (key, branch) in branches {
        if !branch.is_empty() {
            args.insert(key.to_string(), StepArg::Steps(normalize(branch)));
        }
    }
    if !step.cases.is_empty() {
        let cases = step
            .cases
            .iter()
            .map(|(label, branch)| (label.clone(), normalize(branch)))
            .collect();
        args.insert(CASES.to_string(), StepArg::Cases(cases));
    }
    Step {
        action: step.action.clone(),
        params: step.params.clone(),
        args,
    }
}

impl Step {
    /// Trimmed string argument; empty when absent or not a string
    pub fn arg(&self, name: &str) -> &str {
        match self.args.get(name) {
            Some(StepArg::Value(serde_json::Value::String(s))) => s.trim(),
            _ => "",
        }
    }

    /// Integer argument, accepting JSON numbers and numeric strings
    pub fn arg_int(&self, name: &str) -> Option<i64> {
        match self.args.get(name)? {
            StepArg::Value(serde_json::Value::Number(n)) => {
                n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))
            }
            StepArg::Value(serde_json::Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean argument, accepting `true` and `"true"` (any case)
    pub fn arg_bool(&self, name: &str) -> bool {
        match self.args.get(name) {
            Some(StepArg::Value(serde_json::Value::Bool(b))) => *b,
            Some(StepArg::Value(serde_json::Value::String(s))) => {
                s.trim().eq_ignore_ascii_case("true")
            }
            _ => false,
        }
    }

    /// Branch list stored under `key`
    pub fn branch(&self, key: &str) -> &[Step] {
        match self.args.get(key) {
            Some(StepArg::Steps(steps)) => steps,
            _ => &[],
        }
    }

    pub fn cases(&self) -> Option<&BTreeMap<String, Vec<Step>>> {
        match self.args.get(CASES) {
            Some(StepArg::Cases(cases)) => Some(cases),
            _ => None,
        }
    }

    /// All non-empty child lists; cases follow in label order
    pub fn children(&self) -> Vec<&[Step]> {
        let mut out: Vec<&[Step]> = BRANCH_KEYS
            .iter()
            .map(|k| self.branch(k))
            .filter(|b| !b.is_empty())
            .collect();
        if let Some(cases) = self.cases() {
            out.extend(
                cases
                    .values()
                    .map(Vec::as_slice)
                    .filter(|b| !b.is_empty()),
            );
        }
        out
    }
}

/// Whether any step at any depth has the given action
pub fn contains_action(steps: &[Step], action: &str) -> bool {
    steps
        .iter()
        .any(|s| s.action == action || s.children().into_iter().any(|c| contains_action(c, action)))
}

/// Whether the flow opens a transactional scope anywhere
pub fn contains_tx(steps: &[Step]) -> bool {
    contains_action(steps, "tx.Block")
}

/// Whether the flow publishes an event anywhere
pub fn publishes_events(steps: &[Step]) -> bool {
    contains_action(steps, "event.Publish")
}

/// Collect the `source` argument of every `repo.*` step
pub fn collect_repo_sources(steps: &[Step], out: &mut BTreeSet<String>) {
    for step in steps {
        if step.action.starts_with("repo.") {
            let source = step.arg("source");
            if !source.is_empty() {
                out.insert(source.to_string());
            }
        }
        for child in step.children() {
            collect_repo_sources(child, out);
        }
    }
}
