//! Db2 and IBM i DDL syntax.

use sqlgen_core::{Attribute, DialectKind, Error, Result, TableRef};

use super::{SchemaGeneratorOps, sqlpl_ignoring};
use crate::generator::SchemaGenerator;
use crate::options::{ColumnChange, DropTableOptions};

/// SQLSTATE 42710: duplicate object
const DUPLICATE_OBJECT: &str = "42710";
/// SQLSTATE 42891: duplicate unique constraint
const DUPLICATE_CONSTRAINT: &str = "42891";
/// SQLSTATE 42704: undefined object
const UNDEFINED_OBJECT: &str = "42704";

/// Shared by Db2 for LUW and IBM i; `ibmi` selects the reported kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct Db2DdlOps {
    pub ibmi: bool,
}

impl SchemaGeneratorOps for Db2DdlOps {
    fn kind(&self) -> DialectKind {
        if self.ibmi {
            DialectKind::Ibmi
        } else {
            DialectKind::Db2
        }
    }

    /// Indexes are schema objects of their own; qualify them like the table.
    fn index_name(&self, generator: &SchemaGenerator, table: &TableRef, name: &str) -> String {
        let query = generator.query();
        match generator.effective_schema(table) {
            Some(schema) => format!(
                "{}.{}",
                query.quote_identifier(schema),
                query.quote_identifier(name)
            ),
            None => query.quote_identifier(name),
        }
    }

    fn unique_index(
        &self,
        _gen: &SchemaGenerator,
        table_sql: &str,
        name_sql: &str,
        fields_sql: &str,
    ) -> Option<String> {
        self.ibmi.then(|| {
            sqlpl_ignoring(
                &format!("ALTER TABLE {table_sql} ADD CONSTRAINT {name_sql} UNIQUE ({fields_sql})"),
                DUPLICATE_CONSTRAINT,
            )
        })
    }

    fn check_include(&self, generator: &SchemaGenerator, unique: bool) -> Result<()> {
        if unique {
            return Ok(());
        }
        Err(Error::unsupported(
            generator.dialect_name(),
            "include",
            "DB2 does not support non-unique indexes with INCLUDE syntax.",
        ))
    }

    fn auto_increment_type(&self, type_sql: &str, _attribute: &Attribute) -> String {
        format!("{type_sql} GENERATED BY DEFAULT AS IDENTITY(START WITH 1, INCREMENT BY 1)")
    }

    fn create_table(
        &self,
        _gen: &SchemaGenerator,
        _table: &TableRef,
        table_sql: &str,
        body: &str,
        table_options: &str,
    ) -> String {
        let sql = format!("CREATE TABLE {table_sql} ({body}){table_options}");
        if self.ibmi {
            sqlpl_ignoring(&sql, DUPLICATE_OBJECT)
        } else {
            format!("{sql};")
        }
    }

    /// Several `ALTER COLUMN` clauses follow each other without commas.
    fn change_column(
        &self,
        generator: &SchemaGenerator,
        table: &TableRef,
        column: &str,
        change: &ColumnChange,
    ) -> Result<String> {
        let clauses = generator.alter_column_clauses(column, change, "SET DATA TYPE")?;
        Ok(generator.finish_column_change(table, column, change, &clauses, " "))
    }

    fn drop_table(&self, _gen: &SchemaGenerator, table_sql: &str, _options: &DropTableOptions) -> String {
        let sql = format!("DROP TABLE {table_sql}");
        if self.ibmi {
            sqlpl_ignoring(&sql, UNDEFINED_OBJECT)
        } else {
            sql
        }
    }

    fn rename_table(&self, generator: &SchemaGenerator, before: &TableRef, after: &TableRef) -> Result<String> {
        let query = generator.query();
        Ok(format!(
            "RENAME TABLE {} TO {}",
            query.quote_table_name(before),
            query.quote_identifier(&after.table_name)
        ))
    }
}
