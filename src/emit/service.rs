//! Service ports, implementations and cache decorators

use super::{file_stem, imports_for, nested_types, EmitReport, Emitter};
use crate::error::Result;
use crate::model::{MethodModel, Model, ServiceModel};
use crate::overrides::{scan_overrides, SERVICE_IMPL_DIR};
use crate::templates::context::{
    BodyKind, CachedServiceContext, ImplMethod, ServiceImplContext, ServicePortContext, TypeDecl,
};
use crate::templates::helpers::HelperKit;
use std::collections::BTreeSet;

pub const PORT_DIR: &str = "internal/port";

impl Emitter {
    /// `internal/port/<svc>.go`: request/response types and the service interface
    pub(super) fn emit_service_ports(&self, model: &Model, report: &mut EmitReport) -> Result<()> {
        for service in &model.services {
            let rel = format!("{}/{}.go", PORT_DIR, file_stem(&service.name));
            let types = port_types(service);
            let spelled: String = types
                .iter()
                .flat_map(|t| t.fields.iter().map(|f| f.go_type.as_str()))
                .collect::<Vec<_>>()
                .join("\n");
            let ctx = ServicePortContext {
                header: self.header(),
                service,
                imports: imports_for(&spelled, &self.config.go_module, &["context"]),
                types,
            };
            self.write_artifact(report, &rel, "service", HelperKit::GoTypes, &ctx)?;
        }
        Ok(())
    }

    /// `internal/service/<svc>.go`. Methods the user implemented in
    /// `<svc>.manual.go` are left out; the rest are audited.
    pub(super) fn emit_service_impls(&mut self, model: &Model, report: &mut EmitReport) -> Result<()> {
        for service in &model.services {
            let overrides = scan_overrides(&self.config.output_dir, &service.name);
            self.audit.audit_service(service, &overrides);

            let rel = format!("{}/{}.go", SERVICE_IMPL_DIR, file_stem(&service.name));
            let methods: Vec<ImplMethod<'_>> = service
                .methods
                .iter()
                .filter(|m| !overrides.contains(&m.name))
                .map(|m| impl_method(service, m))
                .collect();

            let code: Vec<&str> = methods.iter().map(|m| m.code.as_str()).collect();
            let port_pkg = self.module_path("internal/port");
            let domain_pkg = self.module_path("internal/domain");
            let mut extra: Vec<&str> = vec!["context", port_pkg.as_str()];
            if service.publishes_events {
                extra.push(domain_pkg.as_str());
            }
            extra.extend(
                methods
                    .iter()
                    .flat_map(|m| m.method.impl_imports.iter().map(String::as_str)),
            );

            let ctx = ServiceImplContext {
                header: self.header(),
                service,
                imports: imports_for(&code.join("\n"), &self.config.go_module, &extra),
                overrides: overrides.into_iter().collect(),
                methods,
            };
            self.write_artifact(report, &rel, "service_impl", HelperKit::GoTypes, &ctx)?;
        }
        Ok(())
    }

    /// `internal/service/<svc>_cached.go`: read-through decorator for methods
    /// with a cache TTL
    pub(super) fn emit_cached_services(&self, model: &Model, report: &mut EmitReport) -> Result<()> {
        for service in &model.services {
            let rel = format!(
                "{}/{}_cached.go",
                SERVICE_IMPL_DIR,
                file_stem(&service.name)
            );
            let keyed = service
                .methods
                .iter()
                .any(|m| is_cached(m) && m.input.is_some());
            let port_pkg = self.module_path("internal/port");
            let mut extra = vec!["context", "time", port_pkg.as_str()];
            if keyed {
                extra.push("fmt");
            }
            let ctx = CachedServiceContext {
                header: self.header(),
                service,
                imports: imports_for("", &self.config.go_module, &extra),
            };
            self.write_artifact(report, &rel, "service_cached", HelperKit::GoTypes, &ctx)?;
        }
        Ok(())
    }
}

/// Only methods returning something can be served from cache
fn is_cached(method: &MethodModel) -> bool {
    !method.cache_ttl.is_empty() && method.output.is_some()
}

/// Request/response types of `service`, deduplicated by name, with their
/// nested item types
fn port_types(service: &ServiceModel) -> Vec<TypeDecl<'_>> {
    let mut seen = BTreeSet::new();
    let mut types = Vec::new();
    let mut nested = Vec::new();
    for method in &service.methods {
        for entity in method.input.iter().chain(method.output.iter()) {
            if !seen.insert(entity.name.as_str()) {
                continue;
            }
            types.push(TypeDecl {
                name: entity.name.clone(),
                description: &entity.description,
                fields: entity.fields.iter().collect(),
            });
            nested_types(&entity.fields, &mut nested);
        }
    }
    types.sort_by(|a, b| a.name.cmp(&b.name));
    for decl in nested {
        if !seen.contains(decl.name.as_str()) {
            types.push(decl);
        }
    }
    types
}

fn impl_method<'a>(service: &ServiceModel, method: &'a MethodModel) -> ImplMethod<'a> {
    let qualifier = format!("{}.{}", service.name, method.name);
    let ret = if method.output.is_some() { "resp, " } else { "" };
    let (body, code) = if let Some(flow) = &method.flow_code {
        let mut code = flow.trim_end().to_string();
        code.push_str(&format!("\nreturn {}nil", ret));
        (BodyKind::Flow, code)
    } else if !method.impl_code.trim().is_empty() {
        (BodyKind::Inline, method.impl_code.clone())
    } else {
        (
            BodyKind::Custom,
            format!(
                "return {}errors.New(http.StatusNotImplemented, \"Not Implemented\", {})",
                ret,
                crate::util::go_quote(&format!("{} is not implemented", qualifier))
            ),
        )
    };
    ImplMethod {
        method,
        body,
        code,
        qualifier,
    }
}
