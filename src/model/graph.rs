//! Service dependency graph (`uses` edges)

use super::ServiceModel;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

struct DependencyGraph<'a> {
    in_degree: BTreeMap<&'a str, usize>,
    dependents: BTreeMap<&'a str, Vec<&'a str>>,
    unknown: Vec<String>,
}

impl<'a> DependencyGraph<'a> {
    fn build(services: &'a [ServiceModel]) -> Self {
        let mut in_degree: BTreeMap<&str, usize> =
            services.iter().map(|s| (s.name.as_str(), 0)).collect();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut unknown = Vec::new();
        for svc in services {
            for dep in &svc.uses {
                if !in_degree.contains_key(dep.as_str()) {
                    unknown.push(format!("{} -> {}", svc.name, dep));
                    continue;
                }
                dependents
                    .entry(dep.as_str())
                    .or_default()
                    .push(svc.name.as_str());
                if let Some(d) = in_degree.get_mut(svc.name.as_str()) {
                    *d += 1;
                }
            }
        }
        unknown.sort();
        DependencyGraph {
            in_degree,
            dependents,
            unknown,
        }
    }

    /// Kahn's algorithm with a sorted ready set. Returns the visit order and
    /// the names left with unresolved dependencies.
    fn drain(mut self) -> (Vec<&'a str>, Vec<&'a str>) {
        let mut ready: BTreeSet<&str> = self
            .in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| *n)
            .collect();
        let mut order = Vec::with_capacity(self.in_degree.len());
        while let Some(name) = ready.pop_first() {
            order.push(name);
            for next in self.dependents.get(name).cloned().unwrap_or_default() {
                if let Some(d) = self.in_degree.get_mut(next) {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(next);
                    }
                }
            }
        }
        let stuck = self
            .in_degree
            .iter()
            .filter(|(_, d)| **d > 0)
            .map(|(n, _)| *n)
            .collect();
        (order, stuck)
    }
}

/// Order services so every service comes after the services it uses.
///
/// Unknown dependencies are ignored; services caught in a cycle are appended
/// in declaration order.
pub fn order_services_by_dependencies(services: &[ServiceModel]) -> Vec<String> {
    let (order, _) = DependencyGraph::build(services).drain();
    let mut result: Vec<String> = order.iter().map(|s| s.to_string()).collect();
    for svc in services {
        if !result.contains(&svc.name) {
            result.push(svc.name.clone());
        }
    }
    result
}

/// Reject unknown `uses` targets and dependency cycles
pub fn validate_service_dependencies(services: &[ServiceModel]) -> Result<()> {
    let graph = DependencyGraph::build(services);
    if !graph.unknown.is_empty() {
        return Err(Error::ServiceDependencies(format!(
            "unknown service dependencies: {}",
            graph.unknown.join(", ")
        )));
    }
    let (_, stuck) = graph.drain();
    if !stuck.is_empty() {
        return Err(Error::ServiceDependencies(format!(
            "cycle detected among services: {}",
            stuck.join(", ")
        )));
    }
    Ok(())
}
