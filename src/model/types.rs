//! Type lowering from IR type references to Go type expressions

use crate::ir::{TypeKind, TypeRef};
use crate::util::export_name;

/// Which model a type is lowered for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFlavor {
    /// Entity references qualified with the `domain` package
    Domain,
    /// Entity references suffixed with `DTO`
    Dto,
}

/// Lower a type reference; `field` names the owning field and is used to
/// name anonymous list items
pub fn lower_type(t: &TypeRef, field: &str, flavor: TypeFlavor) -> String {
    match t.kind {
        TypeKind::String | TypeKind::Uuid | TypeKind::Enum | TypeKind::File => "string".into(),
        TypeKind::Int => "int".into(),
        TypeKind::Int64 => "int64".into(),
        TypeKind::Float => "float64".into(),
        TypeKind::Bool => "bool".into(),
        TypeKind::Time => "time.Time".into(),
        TypeKind::Json => "json.RawMessage".into(),
        TypeKind::Any | TypeKind::Unknown => "any".into(),
        TypeKind::List => {
            if !t.inline_fields.is_empty() {
                return format!("[]{}", inline_item_name(t, field));
            }
            match &t.item_type {
                Some(item) => format!("[]{}", lower_type(item, field, flavor)),
                None => "[]any".into(),
            }
        }
        TypeKind::Map => {
            let key = t
                .key_type
                .as_ref()
                .map(|k| lower_type(k, field, flavor))
                .unwrap_or_else(|| "string".into());
            let value = t
                .item_type
                .as_ref()
                .map(|v| lower_type(v, field, flavor))
                .unwrap_or_else(|| "any".into());
            format!("map[{}]{}", key, value)
        }
        TypeKind::Entity => {
            if t.name.is_empty() {
                return "any".into();
            }
            match flavor {
                TypeFlavor::Domain => format!("domain.{}", t.name),
                TypeFlavor::Dto => format!("{}DTO", t.name),
            }
        }
    }
}

/// Name of the item type of a list, empty for non-list types
pub fn item_type_name(t: &TypeRef, field: &str) -> String {
    if t.kind != TypeKind::List {
        return String::new();
    }
    if !t.inline_fields.is_empty() {
        return inline_item_name(t, field);
    }
    t.item_type
        .as_ref()
        .map(|item| item.name.clone())
        .unwrap_or_default()
}

fn inline_item_name(t: &TypeRef, field: &str) -> String {
    match t.item_type.as_ref().map(|i| i.name.as_str()) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{}Item", export_name(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Field;
    use rstest::rstest;

    #[rstest]
    #[case(TypeKind::String, "string")]
    #[case(TypeKind::Int, "int")]
    #[case(TypeKind::Int64, "int64")]
    #[case(TypeKind::Float, "float64")]
    #[case(TypeKind::Bool, "bool")]
    #[case(TypeKind::Time, "time.Time")]
    #[case(TypeKind::Uuid, "string")]
    #[case(TypeKind::Json, "json.RawMessage")]
    #[case(TypeKind::Enum, "string")]
    #[case(TypeKind::File, "string")]
    #[case(TypeKind::Unknown, "any")]
    fn test_scalar_lowering(#[case] kind: TypeKind, #[case] expected: &str) {
        assert_eq!(
            lower_type(&TypeRef::of(kind), "f", TypeFlavor::Domain),
            expected
        );
    }

    #[test]
    fn test_entity_flavors() {
        let t = TypeRef::entity("User");
        assert_eq!(lower_type(&t, "owner", TypeFlavor::Domain), "domain.User");
        assert_eq!(lower_type(&t, "owner", TypeFlavor::Dto), "UserDTO");
        assert_eq!(
            lower_type(&TypeRef::of(TypeKind::Entity), "x", TypeFlavor::Domain),
            "any"
        );
    }

    #[test]
    fn test_list_lowering() {
        let entities = TypeRef::list(TypeRef::entity("Tag"));
        assert_eq!(
            lower_type(&entities, "tags", TypeFlavor::Domain),
            "[]domain.Tag"
        );
        assert_eq!(lower_type(&entities, "tags", TypeFlavor::Dto), "[]TagDTO");
        assert_eq!(
            lower_type(&TypeRef::of(TypeKind::List), "x", TypeFlavor::Domain),
            "[]any"
        );
        assert_eq!(item_type_name(&entities, "tags"), "Tag");
    }

    #[test]
    fn test_inline_list_items() {
        let t = TypeRef {
            kind: TypeKind::List,
            inline_fields: vec![Field {
                name: "sku".into(),
                typ: TypeRef::of(TypeKind::String),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            lower_type(&t, "line_items", TypeFlavor::Domain),
            "[]LineItemsItem"
        );
        assert_eq!(item_type_name(&t, "line_items"), "LineItemsItem");
    }

    #[test]
    fn test_map_defaults() {
        let t = TypeRef::of(TypeKind::Map);
        assert_eq!(lower_type(&t, "m", TypeFlavor::Domain), "map[string]any");
        let typed = TypeRef {
            kind: TypeKind::Map,
            key_type: Some(Box::new(TypeRef::of(TypeKind::String))),
            item_type: Some(Box::new(TypeRef::of(TypeKind::Int64))),
            ..Default::default()
        };
        assert_eq!(lower_type(&typed, "m", TypeFlavor::Domain), "map[string]int64");
    }
}
