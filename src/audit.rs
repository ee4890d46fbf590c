//! Service implementation audit
//!
//! Records methods that have no declarative flow, no inline implementation
//! and no manual override. The audit is advisory: it never fails emission.

use crate::model::{MethodModel, ServiceModel};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// A service method nobody implemented
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingImpl {
    pub service: String,
    pub method: String,
    /// Schema location of the method declaration
    pub source: String,
}

impl fmt::Display for MissingImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source.is_empty() {
            write!(f, "{}.{}", self.service, self.method)
        } else {
            write!(f, "{}.{} ({})", self.service, self.method, self.source)
        }
    }
}

/// Whether `method` is implemented by flow, inline code or manual override
pub fn has_implementation(method: &MethodModel, overrides: &BTreeSet<String>) -> bool {
    !method.flow.is_empty() || !method.impl_code.trim().is_empty() || overrides.contains(&method.name)
}

/// Append-only accumulator, deduplicated by `service.method|source`
#[derive(Debug, Default, Clone)]
pub struct ImplAudit {
    entries: Vec<MissingImpl>,
    seen: HashSet<String>,
}

impl ImplAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a missing implementation; returns `false` for duplicates
    pub fn record(&mut self, entry: MissingImpl) -> bool {
        let key = format!("{}.{}|{}", entry.service, entry.method, entry.source);
        if !self.seen.insert(key) {
            return false;
        }
        tracing::warn!(
            service = %entry.service,
            method = %entry.method,
            source = %entry.source,
            "method has no flow, implementation or manual override"
        );
        self.entries.push(entry);
        true
    }

    /// Audit every method of `service` against its override set
    pub fn audit_service(&mut self, service: &ServiceModel, overrides: &BTreeSet<String>) {
        for method in &service.methods {
            if has_implementation(method, overrides) {
                continue;
            }
            self.record(MissingImpl {
                service: service.name.clone(),
                method: method.name.clone(),
                source: method.source.clone(),
            });
        }
    }

    /// Fold another accumulator in, keeping first-seen order
    pub fn merge(&mut self, other: ImplAudit) {
        for entry in other.entries {
            self.record(entry);
        }
    }

    pub fn entries(&self) -> &[MissingImpl] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Human-readable report, one method per line
    pub fn report(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let mut out = format!("Missing implementations ({}):\n", self.entries.len());
        for entry in &self.entries {
            out.push_str(&format!("  - {}\n", entry));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::Step;

    fn method(name: &str) -> MethodModel {
        MethodModel {
            name: name.into(),
            source: format!("schema/orders.cue:{}", name.len()),
            ..Default::default()
        }
    }

    fn orders() -> ServiceModel {
        let mut with_flow = method("ListOrders");
        with_flow.flow = vec![Step {
            action: "repo.List".into(),
            ..Default::default()
        }];
        let mut with_code = method("Ping");
        with_code.impl_code = "return resp, nil".into();
        ServiceModel {
            name: "Orders".into(),
            methods: vec![method("CreateOrder"), with_flow, with_code, method("CancelOrder")],
            ..Default::default()
        }
    }

    #[test]
    fn test_override_respected() {
        let mut audit = ImplAudit::new();
        let overrides: BTreeSet<String> = ["CreateOrder".to_string()].into();
        audit.audit_service(&orders(), &overrides);
        let missing: Vec<_> = audit.entries().iter().map(|m| m.method.as_str()).collect();
        assert_eq!(missing, vec!["CancelOrder"]);
    }

    #[test]
    fn test_deduplicated_across_passes() {
        let mut audit = ImplAudit::new();
        audit.audit_service(&orders(), &BTreeSet::new());
        audit.audit_service(&orders(), &BTreeSet::new());
        assert_eq!(audit.entries().len(), 2);
    }

    #[test]
    fn test_merge_and_report() {
        let mut a = ImplAudit::new();
        a.audit_service(&orders(), &BTreeSet::new());
        let mut b = ImplAudit::new();
        b.record(MissingImpl {
            service: "Users".into(),
            method: "Login".into(),
            source: String::new(),
        });
        b.audit_service(&orders(), &BTreeSet::new());
        a.merge(b);
        assert_eq!(a.entries().len(), 3);
        let report = a.report();
        assert!(report.starts_with("Missing implementations (3):"));
        assert!(report.contains("  - Users.Login\n"));
        assert!(report.contains("Orders.CreateOrder (schema/orders.cue:11)"));
        assert!(ImplAudit::new().report().is_empty());
    }
}
