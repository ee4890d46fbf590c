//! Manual override discovery
//!
//! Users implement service methods by hand in `<svc>.manual.go` next to the
//! generated implementation. Only the names of receiver methods are read;
//! the file body is otherwise opaque.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tree_sitter::Parser;

/// Directory, relative to the output root, holding service implementations
pub const SERVICE_IMPL_DIR: &str = "internal/service";

/// Location of the manual override file for `service`
pub fn manual_file_path(output_dir: &Path, service: &str) -> PathBuf {
    output_dir
        .join(SERVICE_IMPL_DIR)
        .join(format!("{}.manual.go", service.to_lowercase()))
}

/// Method names the user implemented by hand for `service`.
///
/// A missing or unparsable file yields an empty set.
pub fn scan_overrides(output_dir: &Path, service: &str) -> BTreeSet<String> {
    let path = manual_file_path(output_dir, service);
    let source = match std::fs::read_to_string(&path) {
        Ok(source) => source,
        Err(_) => return BTreeSet::new(),
    };
    match receiver_methods(&source) {
        Some(names) => {
            tracing::debug!(service, path = %path.display(), count = names.len(), "manual overrides found");
            names
        }
        None => {
            tracing::debug!(service, path = %path.display(), "manual file does not parse, ignoring");
            BTreeSet::new()
        }
    }
}

/// Names of top-level functions declared with a receiver, or `None` when the
/// source is not valid Go
pub fn receiver_methods(source: &str) -> Option<BTreeSet<String>> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_go::LANGUAGE.into()).ok()?;
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();
    if root.has_error() {
        return None;
    }

    let mut names = BTreeSet::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() != "method_declaration" {
            continue;
        }
        if let Some(name) = child
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source.as_bytes()).ok())
        {
            names.insert(name.to_string());
        }
    }
    Some(names)
}
