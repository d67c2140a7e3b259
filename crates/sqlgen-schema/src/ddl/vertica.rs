//! Vertica DDL syntax.

use sqlgen_core::{Attribute, DialectKind, Result, TableRef};

use super::{PostgresDdlOps, SchemaGeneratorOps};
use crate::generator::SchemaGenerator;

#[derive(Debug, Clone, Copy, Default)]
pub struct VerticaDdlOps;

impl SchemaGeneratorOps for VerticaDdlOps {
    fn kind(&self) -> DialectKind {
        DialectKind::Vertica
    }

    /// `IDENTITY` replaces the column type.
    fn auto_increment_type(&self, _type_sql: &str, _attribute: &Attribute) -> String {
        "IDENTITY(1,1)".to_string()
    }

    /// Same `SET SCHEMA` then `RENAME TO` sequence as PostgreSQL.
    fn rename_table(&self, generator: &SchemaGenerator, before: &TableRef, after: &TableRef) -> Result<String> {
        PostgresDdlOps.rename_table(generator, before, after)
    }
}
