//! Domain entities, DTOs and event structs

use super::{file_stem, imports_for, nested_types, EmitReport, Emitter};
use crate::error::Result;
use crate::model::{EntityModel, Model};
use crate::templates::context::{EntityContext, EventsContext};
use crate::templates::helpers::{dto_type, HelperKit};

pub const DOMAIN_DIR: &str = "internal/domain";
pub const DTO_DIR: &str = "internal/dto";

impl Emitter {
    /// `internal/domain/<entity>.go` for every entity with fields
    pub(super) fn emit_domain(&self, model: &Model, report: &mut EmitReport) -> Result<()> {
        for entity in model.entities.iter().filter(|e| !e.fields.is_empty()) {
            let rel = format!("{}/{}.go", DOMAIN_DIR, file_stem(&entity.name));
            let ctx = self.entity_context(entity, entity.fields.iter().collect(), false);
            self.write_artifact(report, &rel, "domain", HelperKit::Mongo, &ctx)?;
        }
        Ok(())
    }

    /// `internal/dto/<entity>.go` for every entity with DTO-visible fields
    pub(super) fn emit_dto(&self, model: &Model, report: &mut EmitReport) -> Result<()> {
        for entity in &model.entities {
            let fields: Vec<_> = entity.dto_fields().collect();
            if fields.is_empty() {
                continue;
            }
            let rel = format!("{}/{}.go", DTO_DIR, file_stem(&entity.name));
            let ctx = self.entity_context(entity, fields, true);
            self.write_artifact(report, &rel, "dto", HelperKit::GoTypes, &ctx)?;
        }
        Ok(())
    }

    /// `internal/domain/events.go`, always present: it also declares the
    /// publisher port used by services
    pub(super) fn emit_events(&self, model: &Model, report: &mut EmitReport) -> Result<()> {
        let rel = format!("{}/events.go", DOMAIN_DIR);
        let types: String = model
            .events
            .iter()
            .flat_map(|e| e.fields.iter().map(|f| f.go_type.as_str()))
            .collect::<Vec<_>>()
            .join("\n")
            .replace("domain.", "");
        let ctx = EventsContext {
            header: self.header(),
            events: &model.events,
            imports: imports_for(&types, &self.config.go_module, &["context"]),
        };
        self.write_artifact(report, &rel, "events", HelperKit::GoTypes, &ctx)
    }

    fn entity_context<'a>(
        &'a self,
        entity: &'a EntityModel,
        fields: Vec<&'a crate::model::FieldModel>,
        dto: bool,
    ) -> EntityContext<'a> {
        let mut nested = Vec::new();
        nested_types(fields.iter().copied(), &mut nested);

        // Types as they will be spelled inside the package
        let spelled: Vec<String> = fields
            .iter()
            .copied()
            .chain(nested.iter().flat_map(|t| t.fields.iter().copied()))
            .map(|f| {
                if dto {
                    dto_type(&f.go_type)
                } else {
                    f.go_type.replace("domain.", "")
                }
            })
            .collect();
        let imports = imports_for(&spelled.join("\n"), &self.config.go_module, &[]);

        EntityContext {
            header: self.header(),
            entity,
            fields,
            nested,
            imports,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EmitterConfig;
    use crate::emit::{ArtifactFamily, Emitter};
    use crate::ir::Schema;
    use crate::model::project;
    use crate::stamp::Stamp;
    use serde_json::json;

    fn emitter(dir: &std::path::Path) -> Emitter {
        let config = EmitterConfig {
            output_dir: dir.to_path_buf(),
            go_module: "github.com/acme/market".into(),
            ..Default::default()
        };
        Emitter::new(config, Stamp::default())
    }

    fn model() -> crate::model::Model {
        project(
            &Schema::from_json(
                &json!({
                    "entities": [
                        {"name": "Order", "fields": [
                            {"name": "id", "type": {"kind": "uuid"}},
                            {"name": "placedAt", "type": {"kind": "time"}},
                            {"name": "status", "type": {"kind": "string"}},
                            {"name": "lines", "type": {"kind": "list", "inlineFields": [
                                {"name": "sku", "type": {"kind": "string"}},
                                {"name": "qty", "type": {"kind": "int"}}
                            ]}},
                            {"name": "buyer", "type": {"kind": "entity", "name": "User"}},
                            {"name": "draftNote", "type": {"kind": "string"}, "skipDomain": true}
                        ], "fsm": {"field": "status", "states": ["new", "paid"], "transitions": {"new": ["paid"]}}},
                        {"name": "User", "fields": [{"name": "id", "type": {"kind": "uuid"}}]},
                        {"name": "Empty"}
                    ],
                    "events": [{"name": "OrderPlaced", "fields": [
                        {"name": "orderId", "type": {"kind": "string"}},
                        {"name": "at", "type": {"kind": "time"}}
                    ]}]
                })
                .to_string(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_domain_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut emitter = emitter(dir.path());
        let report = emitter.emit(ArtifactFamily::Domain, &model()).unwrap();
        assert_eq!(
            report.written,
            vec!["internal/domain/order.go", "internal/domain/user.go"]
        );

        let order = std::fs::read_to_string(dir.path().join("internal/domain/order.go")).unwrap();
        assert!(order.contains("package domain"));
        assert!(order.contains("\"time\""));
        assert!(order.contains("type LinesItem struct"));
        assert!(order.contains("Buyer User"));
        assert!(!order.contains("domain.User"));
        assert!(order.contains("CanTransitionTo"));
    }

    #[test]
    fn test_dto_skips_domain_only_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut emitter = emitter(dir.path());
        emitter.emit(ArtifactFamily::Dto, &model()).unwrap();
        let dto = std::fs::read_to_string(dir.path().join("internal/dto/order.go")).unwrap();
        assert!(dto.contains("package dto"));
        assert!(dto.contains("type OrderDTO struct"));
        assert!(dto.contains("Buyer UserDTO"));
        assert!(!dto.contains("DraftNote"));
    }

    #[test]
    fn test_events_file_declares_publisher() {
        let dir = tempfile::tempdir().unwrap();
        let mut emitter = emitter(dir.path());
        emitter.emit(ArtifactFamily::Events, &model()).unwrap();
        let events = std::fs::read_to_string(dir.path().join("internal/domain/events.go")).unwrap();
        assert!(events.contains("type OrderPlaced struct"));
        assert!(events.contains("type Publisher interface"));
        assert!(events.contains("\"time\""));
    }
}
