//! SQL Server DDL syntax.

use sqlgen_core::{Attribute, DialectKind, Error, Result, TableRef, ValidationErrorKind};

use super::SchemaGeneratorOps;
use crate::generator::SchemaGenerator;
use crate::options::{ColumnChange, RemoveIndexOptions};

#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDdlOps;

impl SchemaGeneratorOps for MssqlDdlOps {
    fn kind(&self) -> DialectKind {
        DialectKind::Mssql
    }

    fn drop_index(
        &self,
        generator: &SchemaGenerator,
        table: &TableRef,
        name: &str,
        options: &RemoveIndexOptions,
    ) -> String {
        let query = generator.query();
        let if_exists = if options.if_exists { "IF EXISTS " } else { "" };
        format!(
            "DROP INDEX {if_exists}{} ON {}",
            query.quote_identifier(name),
            query.quote_table_name(table)
        )
    }

    fn auto_increment_type(&self, type_sql: &str, _attribute: &Attribute) -> String {
        format!("{type_sql} IDENTITY(1,1)")
    }

    /// Comments are `MS_Description` extended properties.
    fn comment_statements(
        &self,
        generator: &SchemaGenerator,
        table: &TableRef,
        table_comment: Option<&str>,
        column_comments: &[(&str, &str)],
    ) -> Vec<String> {
        let escaper = generator.query().escaper();
        let schema = generator.effective_schema(table).unwrap_or("dbo");
        let property = |comment: &str, column: Option<&str>| {
            let mut sql = format!(
                "EXEC sp_addextendedproperty @name = N'MS_Description', @value = {}, @level0type = N'Schema', @level0name = {}, @level1type = N'Table', @level1name = {}",
                escaper.string(comment),
                escaper.string(schema),
                escaper.string(&table.table_name)
            );
            if let Some(column) = column {
                sql.push_str(&format!(
                    ", @level2type = N'Column', @level2name = {}",
                    escaper.string(column)
                ));
            }
            sql.push(';');
            sql
        };
        let mut out: Vec<String> = table_comment.map(|c| property(c, None)).into_iter().collect();
        out.extend(
            column_comments
                .iter()
                .map(|(column, comment)| property(comment, Some(column))),
        );
        out
    }

    fn create_table(
        &self,
        generator: &SchemaGenerator,
        _table: &TableRef,
        table_sql: &str,
        body: &str,
        table_options: &str,
    ) -> String {
        format!(
            "IF OBJECT_ID({}, 'U') IS NULL CREATE TABLE {table_sql} ({body}){table_options};",
            generator.query().escaper().string(table_sql)
        )
    }

    /// One statement per changed property; defaults are added as
    /// constraints.
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
        if change.drop_default {
            requested.push(("dropDefault", false));
        }
        query.reject_invalid_options("changeColumnQuery", &requested)?;

        let table_sql = query.quote_table_name(table);
        let column_sql = query.quote_identifier(column);
        let mut statements = Vec::new();
        match (&change.data_type, change.allow_null) {
            (Some(data_type), allow_null) => {
                let type_sql = generator.column_type(data_type)?;
                let null = if allow_null == Some(false) { "NOT NULL" } else { "NULL" };
                statements.push(format!(
                    "ALTER TABLE {table_sql} ALTER COLUMN {column_sql} {type_sql} {null};"
                ));
            }
            (None, Some(_)) => {
                return Err(Error::validation(
                    ValidationErrorKind::MissingColumns,
                    "Changing the nullability of a column in mssql requires its `type`",
                ));
            }
            (None, None) => {}
        }
        if let Some(value) = &change.default_value {
            statements.push(format!(
                "ALTER TABLE {table_sql} ADD DEFAULT {} FOR {column_sql};",
                query.escaper().value(value, change.data_type.as_ref())?
            ));
        }
        if change.unique {
            statements.push(format!("ALTER TABLE {table_sql} ADD UNIQUE ({column_sql});"));
        }
        if let Some(reference) = &change.references {
            statements.push(format!(
                "ALTER TABLE {table_sql} ADD FOREIGN KEY ({column_sql}) {};",
                generator.references_sql(reference)?
            ));
        }
        if let Some(comment) = &change.comment {
            statements.extend(self.comment_statements(generator, table, None, &[(column, comment.as_str())]));
        }
        Ok(statements.join(" "))
    }

    fn rename_column(&self, generator: &SchemaGenerator, table: &TableRef, before: &str, after: &str) -> String {
        let query = generator.query();
        let escaper = query.escaper();
        format!(
            "EXEC sp_rename {}, {}, N'COLUMN'",
            escaper.string(&format!(
                "{}.{}",
                query.quote_table_name(table),
                query.quote_identifier(before)
            )),
            escaper.string(after)
        )
    }

    /// Schema moves and renames are separate procedures; at most one of
    /// them applies per call.
    fn rename_table(&self, generator: &SchemaGenerator, before: &TableRef, after: &TableRef) -> Result<String> {
        let query = generator.query();
        let target_schema = generator.effective_schema(after);
        if generator.effective_schema(before) != target_schema {
            return Ok(format!(
                "ALTER SCHEMA {} TRANSFER {}",
                query.quote_identifier(target_schema.unwrap_or("dbo")),
                query.quote_table_name(before)
            ));
        }
        let escaper = query.escaper();
        Ok(format!(
            "EXEC sp_rename {}, {}",
            escaper.string(&query.quote_table_name(before)),
            escaper.string(&after.table_name)
        ))
    }
}
