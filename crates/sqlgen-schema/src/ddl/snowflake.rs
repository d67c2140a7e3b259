//! Snowflake DDL syntax.

use sqlgen_core::{Attribute, DialectKind};

use super::SchemaGeneratorOps;

#[derive(Debug, Clone, Copy, Default)]
pub struct SnowflakeDdlOps;

impl SchemaGeneratorOps for SnowflakeDdlOps {
    fn kind(&self) -> DialectKind {
        DialectKind::Snowflake
    }

    /// Snowflake tables have no secondary indexes.
    fn supports_indexes(&self) -> bool {
        false
    }

    fn auto_increment_type(&self, type_sql: &str, _attribute: &Attribute) -> String {
        format!("{type_sql} AUTOINCREMENT")
    }
}
