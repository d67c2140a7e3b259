//! PostgreSQL DDL syntax.

use sqlgen_core::{Attribute, DataType, DialectKind, Result, TableRef};

use super::SchemaGeneratorOps;
use crate::generator::SchemaGenerator;
use crate::options::{ColumnChange, RemoveIndexOptions};

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDdlOps;

impl SchemaGeneratorOps for PostgresDdlOps {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    /// Indexes live in their table's schema, so the name is qualified.
    fn drop_index(
        &self,
        generator: &SchemaGenerator,
        table: &TableRef,
        name: &str,
        options: &RemoveIndexOptions,
    ) -> String {
        let query = generator.query();
        let mut sql = "DROP INDEX ".to_string();
        if options.concurrently {
            sql.push_str("CONCURRENTLY ");
        }
        if options.if_exists {
            sql.push_str("IF EXISTS ");
        }
        if let Some(schema) = generator.effective_schema(table) {
            sql.push_str(&query.quote_identifier(schema));
            sql.push('.');
        }
        sql.push_str(&query.quote_identifier(name));
        if options.cascade {
            sql.push_str(" CASCADE");
        }
        sql
    }

    /// `SERIAL` pseudo types.
    fn auto_increment_type(&self, type_sql: &str, attribute: &Attribute) -> String {
        match attribute.data_type {
            DataType::SmallInt | DataType::TinyInt => "SMALLSERIAL".to_string(),
            DataType::BigInt => "BIGSERIAL".to_string(),
            DataType::Integer => "SERIAL".to_string(),
            _ => format!("{type_sql} GENERATED BY DEFAULT AS IDENTITY"),
        }
    }

    fn add_column_keyword(&self) -> &'static str {
        "ADD COLUMN"
    }

    fn change_column(
        &self,
        generator: &SchemaGenerator,
        table: &TableRef,
        column: &str,
        change: &ColumnChange,
    ) -> Result<String> {
        let clauses = generator.alter_column_clauses(column, change, "TYPE")?;
        Ok(generator.finish_column_change(table, column, change, &clauses, ", "))
    }

    /// Moves the table first, then renames it inside the new schema.
    fn rename_table(&self, generator: &SchemaGenerator, before: &TableRef, after: &TableRef) -> Result<String> {
        let query = generator.query();
        let mut statements = Vec::new();
        let mut current = before.clone();
        let target_schema = generator.effective_schema(after).map(str::to_string);
        if generator.effective_schema(before) != target_schema.as_deref() {
            let schema = target_schema
                .clone()
                .or_else(|| query.dialect().default_schema().map(str::to_string))
                .unwrap_or_default();
            statements.push(format!(
                "ALTER TABLE {} SET SCHEMA {}",
                query.quote_table_name(&current),
                query.quote_identifier(&schema)
            ));
            current.schema = Some(schema);
        }
        if before.table_name != after.table_name {
            statements.push(format!(
                "ALTER TABLE {} RENAME TO {}",
                query.quote_table_name(&current),
                query.quote_identifier(&after.table_name)
            ));
        }
        Ok(statements.join("; "))
    }
}
