//! Repository ports, document and in-memory adapters, and test mocks
//!
//! Persistence artifacts skip DTO-only entities. Document repositories are
//! only produced for entities stored in MongoDB.

use super::{file_stem, imports_for, EmitReport, Emitter};
use crate::error::{Error, Result};
use crate::model::{EntityModel, FinderModel, Model, RepositoryModel};
use crate::templates::context::{
    Imports, MongoFilter, MongoFinder, MongoHelpersContext, MongoRepoContext, RepoContext,
    StubFinder, StubRepoContext,
};
use crate::templates::helpers::{mongo_bson_name, HelperKit};

pub const MONGO_DIR: &str = "internal/adapter/repository/mongo";
pub const MEMORY_DIR: &str = "internal/adapter/repository/memory";

const MONGO_DRIVER: &str = "go.mongodb.org/mongo-driver";

impl Emitter {
    /// `internal/port/<repo>.go` for every persisted repository
    pub(super) fn emit_repo_ports(&self, model: &Model, report: &mut EmitReport) -> Result<()> {
        for repo in persisted(model) {
            let rel = format!("{}/{}.go", super::service::PORT_DIR, file_stem(&repo.name));
            let ctx = self.repo_context(repo);
            self.write_artifact(report, &rel, "repo_port", HelperKit::GoTypes, &ctx)?;
        }
        Ok(())
    }

    /// `internal/port/mock_<entity>_test.go` for every persisted repository
    pub(super) fn emit_repo_mocks(&self, model: &Model, report: &mut EmitReport) -> Result<()> {
        for repo in persisted(model) {
            let rel = format!(
                "{}/mock_{}_test.go",
                super::service::PORT_DIR,
                file_stem(&repo.entity)
            );
            let ctx = self.repo_context(repo);
            self.write_artifact(report, &rel, "mock_repo", HelperKit::GoTypes, &ctx)?;
        }
        Ok(())
    }

    /// `internal/adapter/repository/mongo/<repo>.go` for repositories whose
    /// entity is stored in MongoDB
    pub(super) fn emit_mongo_repos(&self, model: &Model, report: &mut EmitReport) -> Result<()> {
        for repo in persisted(model).filter(|r| r.storage == "mongo") {
            let Some(entity) = model.entity(&repo.entity) else {
                tracing::warn!(repository = %repo.name, entity = %repo.entity, "repository entity is not declared, skipping");
                continue;
            };
            let finders = repo
                .finders
                .iter()
                .map(|f| mongo_finder(repo, f))
                .collect::<Result<Vec<_>>>()?;

            let methods = repo.method_set();
            let needs_errors = methods.iter().any(|m| m.kind == "find_by_id")
                || finders.iter().any(|f| f.mode == "one");
            let needs_options = methods.iter().any(|m| m.kind == "save")
                || finders
                    .iter()
                    .any(|f| !f.sort_key.is_empty() || f.finder.limit > 0);

            let mut paths = vec![
                "context".to_string(),
                self.module_path("internal/domain"),
                format!("{}/bson", MONGO_DRIVER),
                format!("{}/mongo", MONGO_DRIVER),
            ];
            if needs_errors {
                paths.push("errors".into());
            }
            if needs_options {
                paths.push(format!("{}/mongo/options", MONGO_DRIVER));
            }
            if methods.iter().any(|m| m.has_time) {
                paths.push("time".into());
            }

            let rel = format!("{}/{}.go", MONGO_DIR, file_stem(&repo.name));
            let ctx = MongoRepoContext {
                header: self.header(),
                repo,
                entity,
                finders,
                imports: Imports::from_paths(paths),
            };
            self.write_artifact(report, &rel, "mongo_repo", HelperKit::Mongo, &ctx)?;
        }
        Ok(())
    }

    /// `internal/adapter/repository/mongo/helpers.go`, once, when any entity
    /// lives in MongoDB
    pub(super) fn emit_mongo_helpers(&self, model: &Model, report: &mut EmitReport) -> Result<()> {
        if !model.has_mongo_entities() {
            return Ok(());
        }
        let rel = format!("{}/helpers.go", MONGO_DIR);
        let ctx = MongoHelpersContext {
            header: self.header(),
            entities: model
                .entities
                .iter()
                .filter(|e| !e.is_dto && e.storage == "mongo")
                .collect(),
        };
        self.write_artifact(report, &rel, "mongo_helpers", HelperKit::Mongo, &ctx)
    }

    /// `internal/adapter/repository/memory/<repo>.go` for every persisted
    /// repository, whatever its backend
    pub(super) fn emit_stub_repos(&self, model: &Model, report: &mut EmitReport) -> Result<()> {
        for repo in persisted(model) {
            let Some(entity) = model.entity(&repo.entity) else {
                tracing::warn!(repository = %repo.name, entity = %repo.entity, "repository entity is not declared, skipping");
                continue;
            };
            let finders: Vec<StubFinder<'_>> =
                repo.finders.iter().map(|f| stub_finder(entity, f)).collect();

            let methods = repo.method_set();
            let conds: Vec<&str> = finders
                .iter()
                .flat_map(|f| f.conds.iter().map(String::as_str))
                .collect();
            let mut extra = vec!["context", "sync"];
            if methods.iter().any(|m| m.kind == "save") {
                extra.push("fmt");
            }
            if methods.iter().any(|m| m.has_time) {
                extra.push("time");
            }
            if conds.iter().any(|c| c.contains("slices.")) {
                extra.push("slices");
            }
            let domain_pkg = self.module_path("internal/domain");
            extra.push(domain_pkg.as_str());

            let rel = format!("{}/{}.go", MEMORY_DIR, file_stem(&repo.name));
            let ctx = StubRepoContext {
                header: self.header(),
                repo,
                entity,
                imports: imports_for(&conds.join("\n"), &self.config.go_module, &extra),
                finders,
            };
            self.write_artifact(report, &rel, "stub_repo", HelperKit::GoTypes, &ctx)?;
        }
        Ok(())
    }

    fn repo_context<'a>(&'a self, repo: &'a RepositoryModel) -> RepoContext<'a> {
        let methods = repo.method_set();
        let spelled: Vec<String> = methods
            .iter()
            .map(|m| format!("{} {}", m.call_params, m.results))
            .collect();
        RepoContext {
            header: self.header(),
            repo,
            imports: imports_for(&spelled.join("\n"), &self.config.go_module, &["context"]),
            methods,
        }
    }
}

/// Repositories of persisted entities
fn persisted(model: &Model) -> impl Iterator<Item = &RepositoryModel> {
    model.repos.iter().filter(|r| !r.is_dto)
}

/// How a finder's result is produced, from its resolved return type
fn finder_mode(finder: &FinderModel) -> Option<&'static str> {
    let rt = finder.signature.return_type.as_str();
    if finder.action == "delete" && rt == "int64" {
        Some("delete")
    } else if rt.starts_with("*domain.") {
        Some("one")
    } else if rt.starts_with("[]domain.") {
        Some("many")
    } else if rt == "int64" {
        Some("count")
    } else {
        None
    }
}

/// `createdAt desc`, `-createdAt` or `createdAt`
fn parse_order(order_by: &str) -> (String, bool) {
    let order_by = order_by.trim();
    if let Some(field) = order_by.strip_prefix('-') {
        return (field.trim().to_string(), true);
    }
    let mut parts = order_by.split_whitespace();
    let field = parts.next().unwrap_or_default().to_string();
    let desc = parts.next().is_some_and(|d| d.eq_ignore_ascii_case("desc"));
    (field, desc)
}

fn mongo_finder<'a>(repo: &RepositoryModel, finder: &'a FinderModel) -> Result<MongoFinder<'a>> {
    let Some(mode) = finder_mode(finder) else {
        let returns = if finder.returns.is_empty() {
            finder.signature.return_type.clone()
        } else {
            finder.returns.clone()
        };
        return Err(Error::UnsupportedFinder {
            backend: "mongo".into(),
            repository: repo.name.clone(),
            finder: finder.name.clone(),
            returns,
        });
    };
    let rt = &finder.signature.return_type;
    let elem_type = match mode {
        "one" => rt.trim_start_matches('*').to_string(),
        "many" => rt.trim_start_matches("[]").to_string(),
        _ => String::new(),
    };
    let filters = finder
        .filters
        .iter()
        .map(|w| {
            let field = if w.field.is_empty() { &w.param } else { &w.field };
            MongoFilter {
                key: mongo_bson_name(field),
                op: if w.op.is_empty() { "eq".into() } else { w.op.clone() },
                param: w.param.clone(),
            }
        })
        .collect();
    let (sort_field, sort_desc) = parse_order(&finder.order_by);
    Ok(MongoFinder {
        finder,
        sig: &finder.signature,
        mode,
        elem_type,
        filters,
        sort_key: if sort_field.is_empty() {
            String::new()
        } else {
            mongo_bson_name(&sort_field)
        },
        sort_desc,
    })
}

/// In-memory lowering of a finder; falls back to zero values when a filter
/// cannot be expressed over the stored struct
fn stub_finder<'a>(entity: &EntityModel, finder: &'a FinderModel) -> StubFinder<'a> {
    let zero = StubFinder {
        sig: &finder.signature,
        mode: "",
        conds: Vec::new(),
    };
    let rt = finder.signature.return_type.as_str();
    let mode = match finder_mode(finder) {
        Some("one") if rt == format!("*domain.{}", entity.name) => "one",
        Some("many") if rt == format!("[]domain.{}", entity.name) => "many",
        Some(m @ ("count" | "delete")) => m,
        _ => return zero,
    };

    let mut conds = Vec::with_capacity(finder.filters.len());
    for w in &finder.filters {
        let name = if w.field.is_empty() { &w.param } else { &w.field };
        let Some(field) = entity.field(name) else {
            return zero;
        };
        match stub_condition(&field.go_name, &field.go_type, &w.op, &w.param) {
            Some(cond) => conds.push(cond),
            None => return zero,
        }
    }
    StubFinder {
        sig: &finder.signature,
        mode,
        conds,
    }
}

fn stub_condition(go_name: &str, go_type: &str, op: &str, param: &str) -> Option<String> {
    let value = format!("v.{}", go_name);
    if go_type.starts_with("[]") || go_type.starts_with("map[") || go_type == "any" || go_type == "json.RawMessage" {
        return None;
    }
    if go_type == "time.Time" {
        return Some(match op {
            "" | "eq" => format!("{value}.Equal({param})"),
            "ne" => format!("!{value}.Equal({param})"),
            "gt" => format!("{value}.After({param})"),
            "gte" => format!("!{value}.Before({param})"),
            "lt" => format!("{value}.Before({param})"),
            "lte" => format!("!{value}.After({param})"),
            _ => return None,
        });
    }
    let cmp = match op {
        "" | "eq" => "==",
        "ne" => "!=",
        "gt" => ">",
        "gte" => ">=",
        "lt" => "<",
        "lte" => "<=",
        "in" => return Some(format!("slices.Contains({param}, {value})")),
        "like" if go_type == "string" => {
            return Some(format!(
                "strings.Contains(strings.ToLower({value}), strings.ToLower({param}))"
            ))
        }
        _ => return None,
    };
    if go_type == "bool" && !matches!(cmp, "==" | "!=") {
        return None;
    }
    Some(format!("{value} {cmp} {param}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmitterConfig;
    use crate::emit::ArtifactFamily;
    use crate::ir::Schema;
    use crate::model::project;
    use crate::stamp::Stamp;
    use rstest::rstest;
    use serde_json::json;

    fn model(report_returns: &str) -> Model {
        project(
            &Schema::from_json(
                &json!({
                    "entities": [
                        {"name": "Tender", "metadata": {"storage": "mongo"}, "fields": [
                            {"name": "id", "type": {"kind": "uuid"}},
                            {"name": "title", "type": {"kind": "string"}},
                            {"name": "status", "type": {"kind": "string"}},
                            {"name": "closesAt", "type": {"kind": "time"}}
                        ]},
                        {"name": "Bid", "fields": [
                            {"name": "id", "type": {"kind": "uuid"}},
                            {"name": "tenderId", "type": {"kind": "string"}},
                            {"name": "amount", "type": {"kind": "float"}}
                        ]},
                        {"name": "TenderReport", "metadata": {"dto": true, "storage": "mongo"}, "fields": [
                            {"name": "total", "type": {"kind": "int"}}
                        ]}
                    ],
                    "repos": [
                        {"name": "TenderRepository", "entity": "Tender", "finders": [
                            {"name": "FindOpen", "returns": "many", "orderBy": "closesAt desc", "limit": 20,
                             "where": [{"field": "status", "op": "eq", "param": "status", "paramType": "string"},
                                       {"field": "closesAt", "op": "gt", "param": "after", "paramType": "time"}]},
                            {"name": "CountByStatus", "returns": "count",
                             "where": [{"field": "status", "param": "status", "paramType": "string"}]},
                            {"name": "Report", "returns": report_returns}
                        ]},
                        {"name": "BidRepository", "entity": "Bid", "finders": [
                            {"name": "FindByTender", "returns": "many",
                             "where": [{"field": "tenderId", "param": "tenderID", "paramType": "string"}]},
                            {"name": "DeleteByTender", "action": "delete",
                             "where": [{"field": "tenderId", "param": "tenderID", "paramType": "string"}]}
                        ]},
                        {"name": "TenderReportRepository", "entity": "TenderReport"}
                    ]
                })
                .to_string(),
            )
            .unwrap(),
        )
    }

    fn emitter(dir: &std::path::Path) -> Emitter {
        Emitter::new(
            EmitterConfig {
                output_dir: dir.to_path_buf(),
                ..Default::default()
            },
            Stamp::default(),
        )
    }

    #[rstest]
    #[case("createdAt desc", "createdAt", true)]
    #[case("-createdAt", "createdAt", true)]
    #[case("title", "title", false)]
    #[case("title ASC", "title", false)]
    #[case("", "", false)]
    fn test_parse_order(#[case] input: &str, #[case] field: &str, #[case] desc: bool) {
        assert_eq!(parse_order(input), (field.to_string(), desc));
    }

    #[test]
    fn test_stub_conditions() {
        assert_eq!(stub_condition("Status", "string", "eq", "status").unwrap(), "v.Status == status");
        assert_eq!(stub_condition("ClosesAt", "time.Time", "gt", "after").unwrap(), "v.ClosesAt.After(after)");
        assert_eq!(stub_condition("ID", "string", "in", "ids").unwrap(), "slices.Contains(ids, v.ID)");
        assert!(stub_condition("Tags", "[]string", "eq", "tags").is_none());
        assert!(stub_condition("Active", "bool", "gt", "x").is_none());
    }

    #[test]
    fn test_mongo_only_for_mongo_non_dto() {
        let dir = tempfile::tempdir().unwrap();
        let mut emitter = emitter(dir.path());
        let model = model("[]domain.Tender");
        let report = emitter.emit(ArtifactFamily::MongoRepos, &model).unwrap();
        assert_eq!(report.written, vec!["internal/adapter/repository/mongo/tenderrepository.go"]);

        let code = std::fs::read_to_string(dir.path().join(&report.written[0])).unwrap();
        assert!(code.contains("ReplaceOne"));
        assert!(code.contains("SetUpsert(true)"));
        assert!(code.contains("\"_id\": entity.ID"));
        assert!(code.contains("CountDocuments"));
        assert!(code.contains("mongoCond(\"gt\", after)"));
        assert!(code.contains("SetSort(bson.D{bson.E{Key: \"closesAt\", Value: -1}})"));

        let helpers = emitter.emit(ArtifactFamily::MongoHelpers, &model).unwrap();
        assert_eq!(helpers.written, vec!["internal/adapter/repository/mongo/helpers.go"]);
    }

    #[test]
    fn test_unsupported_mongo_finder() {
        let dir = tempfile::tempdir().unwrap();
        let mut emitter = emitter(dir.path());
        let err = emitter
            .emit(ArtifactFamily::MongoRepos, &model("map[string]int"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "mongo repo unsupported return type: map[string]int (TenderRepository.Report)"
        );
    }

    #[test]
    fn test_stubs_ports_and_mocks_skip_dto() {
        let dir = tempfile::tempdir().unwrap();
        let mut emitter = emitter(dir.path());
        let model = model("map[string]int");

        let stubs = emitter.emit(ArtifactFamily::StubRepos, &model).unwrap();
        assert_eq!(
            stubs.written,
            vec![
                "internal/adapter/repository/memory/bidrepository.go",
                "internal/adapter/repository/memory/tenderrepository.go",
            ]
        );
        let bid = std::fs::read_to_string(dir.path().join(&stubs.written[0])).unwrap();
        assert!(bid.contains("sync.RWMutex"));
        assert!(bid.contains("v.TenderID == tenderID"));

        let ports = emitter.emit(ArtifactFamily::RepositoryPorts, &model).unwrap();
        assert_eq!(ports.len(), 2);
        let port = std::fs::read_to_string(dir.path().join("internal/port/tenderrepository.go")).unwrap();
        assert!(port.contains("type TenderRepository interface"));
        assert!(port.contains("FindOpen(ctx context.Context, status string, after time.Time) ([]domain.Tender, error)"));
        assert!(port.contains("Report(ctx context.Context) (map[string]int, error)"));

        let mocks = emitter.emit(ArtifactFamily::RepoMocks, &model).unwrap();
        assert_eq!(
            mocks.written,
            vec!["internal/port/mock_bid_test.go", "internal/port/mock_tender_test.go"]
        );
        for path in stubs.written.iter().chain(&mocks.written) {
            let text = std::fs::read_to_string(dir.path().join(path)).unwrap();
            assert!(!text.contains("TenderReport"), "{path} references a DTO");
        }
    }
}
