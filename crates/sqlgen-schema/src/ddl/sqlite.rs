//! SQLite DDL syntax.

use sqlgen_core::{Attribute, DataType, DialectKind, Error, Result, TableRef};

use super::SchemaGeneratorOps;
use crate::generator::SchemaGenerator;
use crate::options::ColumnChange;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDdlOps;

impl SchemaGeneratorOps for SqliteDdlOps {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    /// Only an `INTEGER PRIMARY KEY` column can auto-increment.
    fn auto_increment_type(&self, type_sql: &str, attribute: &Attribute) -> String {
        if self.inlines_primary_key(attribute) {
            "INTEGER PRIMARY KEY AUTOINCREMENT".to_string()
        } else {
            type_sql.to_string()
        }
    }

    fn inlines_primary_key(&self, attribute: &Attribute) -> bool {
        attribute.primary_key
            && attribute.auto_increment
            && matches!(
                attribute.data_type,
                DataType::Integer | DataType::BigInt | DataType::SmallInt | DataType::TinyInt
            )
    }

    /// SQLite has no comment syntax.
    fn comment_statements(
        &self,
        generator: &SchemaGenerator,
        table: &TableRef,
        table_comment: Option<&str>,
        column_comments: &[(&str, &str)],
    ) -> Vec<String> {
        if table_comment.is_some() || !column_comments.is_empty() {
            tracing::debug!(
                dialect = generator.dialect_name(),
                table = %table.table_name,
                comments = column_comments.len(),
                "dropping column comments"
            );
        }
        Vec::new()
    }

    fn change_column(
        &self,
        generator: &SchemaGenerator,
        _table: &TableRef,
        _column: &str,
        _change: &ColumnChange,
    ) -> Result<String> {
        Err(Error::unsupported(
            generator.dialect_name(),
            "changeColumn",
            "changeColumnQuery is not supported by sqlite; the table must be recreated",
        ))
    }
}
