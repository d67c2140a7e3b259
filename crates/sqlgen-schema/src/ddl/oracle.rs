//! Oracle DDL syntax.
//!
//! Oracle has no `IF [NOT] EXISTS`; create and drop run inside PL/SQL
//! blocks that swallow the "already exists" and "does not exist" errors.

use sqlgen_core::{Attribute, DialectKind, Result, TableRef};

use super::{SchemaGeneratorOps, plsql_ignoring};
use crate::generator::SchemaGenerator;
use crate::options::{ColumnChange, DropTableOptions};

/// ORA-00955: name is already used by an existing object
const ALREADY_EXISTS: i32 = -955;
/// ORA-00942: table or view does not exist
const DOES_NOT_EXIST: i32 = -942;

#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDdlOps;

impl SchemaGeneratorOps for OracleDdlOps {
    fn kind(&self) -> DialectKind {
        DialectKind::Oracle
    }

    fn auto_increment_type(&self, type_sql: &str, _attribute: &Attribute) -> String {
        format!("{type_sql} GENERATED BY DEFAULT ON NULL AS IDENTITY")
    }

    fn create_table(
        &self,
        _gen: &SchemaGenerator,
        _table: &TableRef,
        table_sql: &str,
        body: &str,
        table_options: &str,
    ) -> String {
        plsql_ignoring(
            &format!("CREATE TABLE {table_sql} ({body}){table_options}"),
            ALREADY_EXISTS,
        )
    }

    /// `MODIFY (column ...)` with every changed property in one clause.
    fn change_column(
        &self,
        generator: &SchemaGenerator,
        table: &TableRef,
        column: &str,
        change: &ColumnChange,
    ) -> Result<String> {
        let query = generator.query();
        let mut requested = Vec::new();
        if change.auto_increment.is_some() {
            requested.push(("autoIncrement", false));
        }
        query.reject_invalid_options("changeColumnQuery", &requested)?;

        let column_sql = query.quote_identifier(column);
        let mut definition = vec![column_sql.clone()];
        if let Some(data_type) = &change.data_type {
            definition.push(generator.column_type(data_type)?);
        }
        if let Some(value) = &change.default_value {
            definition.push(format!(
                "DEFAULT {}",
                query.escaper().value(value, change.data_type.as_ref())?
            ));
        } else if change.drop_default {
            definition.push("DEFAULT NULL".to_string());
        }
        match change.allow_null {
            Some(false) => definition.push("NOT NULL".to_string()),
            Some(true) => definition.push("NULL".to_string()),
            None => {}
        }
        if change.unique {
            definition.push("UNIQUE".to_string());
        }

        let mut clauses = Vec::new();
        if definition.len() > 1 {
            clauses.push(format!("MODIFY ({})", definition.join(" ")));
        }
        if let Some(reference) = &change.references {
            clauses.push(format!(
                "ADD FOREIGN KEY ({column_sql}) {}",
                generator.references_sql(reference)?
            ));
        }
        Ok(generator.finish_column_change(table, column, change, &clauses, " "))
    }

    fn drop_table(&self, _gen: &SchemaGenerator, table_sql: &str, options: &DropTableOptions) -> String {
        let cascade = if options.cascade { " CASCADE CONSTRAINTS" } else { "" };
        plsql_ignoring(&format!("DROP TABLE {table_sql}{cascade} PURGE"), DOES_NOT_EXIST)
    }

    /// The new name cannot be schema-qualified.
    fn rename_table(&self, generator: &SchemaGenerator, before: &TableRef, after: &TableRef) -> Result<String> {
        let query = generator.query();
        Ok(format!(
            "ALTER TABLE {} RENAME TO {}",
            query.quote_table_name(before),
            query.quote_identifier(&after.table_name)
        ))
    }
}
