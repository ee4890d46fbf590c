//! Contract tests and process entry points

use super::{file_stem, EmitReport, Emitter};
use crate::contract;
use crate::error::Result;
use crate::ir::Requirements;
use crate::model::{Model, ScheduleModel, ServiceModel};
use crate::templates::context::{ContractContext, Imports, MainContext, RepoWiring, ServiceWiring};
use crate::templates::helpers::{unique_repo_entities, HelperKit};
use crate::util::lower_first;
use minijinja::Value;

pub const CONTRACT_TEST_PATH: &str = "tests/contract/contract_test.go";
pub const MONOLITH_MAIN_PATH: &str = "cmd/server/main.go";

impl Emitter {
    /// `tests/contract/contract_test.go`: one minimal request per endpoint
    pub(super) fn emit_contract_tests(&self, model: &Model, report: &mut EmitReport) -> Result<()> {
        let suite = contract::synthesize(model);
        let ctx = ContractContext {
            header: self.header(),
            has_auth_bootstrap: !suite.auth.is_empty(),
            has_ws: suite.cases.iter().any(|c| c.is_ws),
            suite: &suite,
        };
        self.write_artifact(report, CONTRACT_TEST_PATH, "contract_tests", HelperKit::Shared, &ctx)
    }

    /// `cmd/server/main.go` wiring every service into one process
    pub(super) fn emit_monolith_main(&self, model: &Model, report: &mut EmitReport) -> Result<()> {
        let services = ordered_services(model);
        let ctx = self.main_context(model, None, services);
        self.write_artifact(report, MONOLITH_MAIN_PATH, "main_server", HelperKit::Shared, &ctx)
    }

    /// `cmd/services/<svc>/main.go` per service; each process claims only its
    /// own infrastructure, websocket routes and auth ownership
    pub(super) fn emit_service_mains(&self, model: &Model, report: &mut EmitReport) -> Result<()> {
        for service in ordered_services(model) {
            let rel = format!("cmd/services/{}/main.go", file_stem(&service.name));
            let ctx = self.main_context(model, Some(service.name.as_str()), vec![service]);
            self.write_artifact(report, &rel, "main_server", HelperKit::Shared, &ctx)?;
        }
        Ok(())
    }

    fn main_context<'a>(
        &'a self,
        model: &'a Model,
        owner: Option<&'a str>,
        services: Vec<&'a ServiceModel>,
    ) -> MainContext<'a> {
        let claims = |name: &str| services.iter().any(|s| s.name == name);

        let repos: Vec<RepoWiring> = unique_repo_entities(
            Value::from_serialize(&services),
            Value::from_serialize(&model.entities),
        )
        .into_iter()
        .filter(|entity| model.repos.iter().any(|r| !r.is_dto && r.entity == *entity))
        .map(|entity| RepoWiring {
            var: format!("{}Repo", lower_first(&entity)),
            repo: format!("{}Repository", entity),
            storage: model.storage_of(&entity).to_string(),
            entity,
        })
        .collect();

        let wiring: Vec<ServiceWiring> = services
            .iter()
            .map(|svc| {
                let mut args: Vec<String> = svc
                    .repo_entities
                    .iter()
                    .map(|e| match repos.iter().find(|r| r.entity == *e) {
                        Some(r) => r.var.clone(),
                        None => "nil".to_string(),
                    })
                    .collect();
                if svc.needs_tx {
                    args.push("tx".into());
                }
                if svc.publishes_events {
                    args.push("publisher".into());
                }
                ServiceWiring {
                    name: svc.name.clone(),
                    var: format!("{}Svc", lower_first(&svc.name)),
                    args,
                    cached: svc.has_cache,
                }
            })
            .collect();

        let mut requires = services.iter().fold(Requirements::default(), |acc, s| Requirements {
            sql: acc.sql || s.requires.sql,
            mongo: acc.mongo || s.requires.mongo,
            redis: acc.redis || s.requires.redis,
            nats: acc.nats || s.requires.nats,
            s3: acc.s3 || s.requires.s3,
        });
        requires.sql |= repos.iter().any(|r| r.storage == "sql");
        requires.mongo |= repos.iter().any(|r| r.storage == "mongo");

        let auth = model.auth.as_ref();
        let auth_owner = match owner {
            None => auth.is_some(),
            Some(svc) => auth.is_some_and(|a| a.service == svc),
        };

        let module = &self.config.go_module;
        let mut paths = vec![
            "context".to_string(),
            "log/slog".into(),
            "os".into(),
            "os/signal".into(),
            "syscall".into(),
            format!("{}/internal/platform", module),
            format!("{}/internal/transport/http", module),
        ];
        if !wiring.is_empty() {
            paths.push(format!("{}/internal/service", module));
        }
        let schedules: Vec<&ScheduleModel> = model
            .schedules
            .iter()
            .filter(|s| claims(&s.service))
            .collect();
        let scheduled_input = schedules.iter().any(|sch| {
            services
                .iter()
                .filter(|s| s.name == sch.service)
                .filter_map(|s| s.method(&sch.action))
                .any(|m| m.input.is_some())
        });
        if scheduled_input {
            paths.push(format!("{}/internal/port", module));
        }
        if repos.iter().any(|r| r.storage == "mongo") {
            paths.push(format!("{}/internal/adapter/repository/mongo", module));
        }
        if repos.iter().any(|r| r.storage != "mongo") {
            paths.push(format!("{}/internal/adapter/repository/memory", module));
        }

        MainContext {
            header: self.header(),
            service: owner,
            endpoints: model.endpoints.iter().filter(|e| claims(&e.service)).collect(),
            ws_services: model
                .ws_services
                .iter()
                .filter(|s| claims(s))
                .cloned()
                .collect(),
            ws_events: model
                .ws_event_map
                .iter()
                .filter(|(s, _)| claims(s))
                .map(|(s, events)| (s.clone(), events.clone()))
                .collect(),
            events: &model.events,
            auth,
            auth_owner,
            publisher: services.iter().any(|s| s.publishes_events),
            has_cache: services.iter().any(|s| s.has_cache),
            schedules,
            imports: Imports::from_paths(paths),
            requires,
            repos,
            wiring,
            services,
        }
    }
}

/// Services in dependency order, so constructors see their dependencies first
fn ordered_services(model: &Model) -> Vec<&ServiceModel> {
    model
        .service_order
        .iter()
        .filter_map(|name| model.service(name))
        .collect()
}
