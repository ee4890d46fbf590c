//! Regeneration stamps
//!
//! Every artifact header carries the generator version and two short digests,
//! so a regeneration caused by a schema or generator change shows up in diffs.

use crate::ir::Schema;
use crate::templates;
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stamp {
    pub ang_version: String,
    pub input_hash: String,
    pub compiler_hash: String,
}

impl Stamp {
    /// Fill every empty slot from the schema and the bundled templates
    pub fn resolve(
        schema: &Schema,
        ang_version: Option<&str>,
        input_hash: Option<&str>,
        compiler_hash: Option<&str>,
    ) -> Self {
        let given = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_string);
        Stamp {
            ang_version: given(ang_version).unwrap_or_else(|| crate::VERSION.to_string()),
            input_hash: given(input_hash).unwrap_or_else(|| input_hash_of(schema)),
            compiler_hash: given(compiler_hash).unwrap_or_else(compiler_hash_of),
        }
    }
}

fn short_digest(hasher: Sha256) -> String {
    format!("sha256:{}", hex::encode(&hasher.finalize()[..8]))
}

/// Digest of the canonical JSON encoding of a migrated schema
pub fn input_hash_of(schema: &Schema) -> String {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(schema).unwrap_or_default());
    short_digest(hasher)
}

/// Digest of the crate version and every bundled template
pub fn compiler_hash_of() -> String {
    let mut hasher = Sha256::new();
    hasher.update(crate::VERSION.as_bytes());
    for (name, src) in templates::BUNDLED {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(src.as_bytes());
    }
    short_digest(hasher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_shape() {
        let h = input_hash_of(&Schema::default());
        assert!(h.starts_with("sha256:"));
        assert_eq!(h.len(), "sha256:".len() + 16);
        assert_eq!(h, input_hash_of(&Schema::default()));
    }

    #[test]
    fn test_input_hash_tracks_schema() {
        let mut schema = Schema::default();
        let before = input_hash_of(&schema);
        schema.project.name = "tenders".into();
        assert_ne!(before, input_hash_of(&schema));
    }

    #[test]
    fn test_resolve_prefers_given_values() {
        let stamp = Stamp::resolve(&Schema::default(), Some("1.2.3"), Some(""), Some("sha256:abc"));
        assert_eq!(stamp.ang_version, "1.2.3");
        assert_eq!(stamp.input_hash, input_hash_of(&Schema::default()));
        assert_eq!(stamp.compiler_hash, "sha256:abc");
        assert_eq!(Stamp::resolve(&Schema::default(), None, None, None).ang_version, crate::VERSION);
    }
}
