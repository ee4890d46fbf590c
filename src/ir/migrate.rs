//! IR version migration
//!
//! Runs before projection. Older documents carry an empty or `"0"` version.

use super::Schema;
use crate::error::{Error, Result};

pub const CURRENT_IR_VERSION: &str = "1";

/// Bring a schema up to [`CURRENT_IR_VERSION`]
pub fn migrate_to_current(schema: &mut Schema) -> Result<()> {
    match schema.ir_version.trim() {
        "" | "0" => {
            schema.ir_version = CURRENT_IR_VERSION.to_string();
            Ok(())
        }
        v if v == CURRENT_IR_VERSION => Ok(()),
        other => Err(Error::SchemaMigration {
            found: other.to_string(),
            current: CURRENT_IR_VERSION.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("0")]
    #[case("1")]
    fn test_accepted_versions(#[case] version: &str) {
        let mut schema = Schema {
            ir_version: version.to_string(),
            ..Default::default()
        };
        migrate_to_current(&mut schema).unwrap();
        assert_eq!(schema.ir_version, "1");
    }

    #[test]
    fn test_future_version_rejected() {
        let mut schema = Schema {
            ir_version: "2".to_string(),
            ..Default::default()
        };
        let err = migrate_to_current(&mut schema).unwrap_err();
        assert!(err.to_string().contains("unsupported ir_version \"2\""));
    }
}
