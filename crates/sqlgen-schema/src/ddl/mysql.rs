//! MySQL and MariaDB DDL syntax.

use sqlgen_core::{Attribute, DialectKind, Error, Result, TableRef, ValidationErrorKind};

use super::SchemaGeneratorOps;
use crate::generator::SchemaGenerator;
use crate::options::{ColumnChange, CreateTableOptions, RemoveIndexOptions};

/// Shared by MySQL and MariaDB; `mariadb` selects the reported kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDdlOps {
    pub mariadb: bool,
}

impl SchemaGeneratorOps for MysqlDdlOps {
    fn kind(&self) -> DialectKind {
        if self.mariadb {
            DialectKind::Mariadb
        } else {
            DialectKind::Mysql
        }
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
        format!("{type_sql} AUTO_INCREMENT")
    }

    fn inline_column_comment(&self) -> bool {
        true
    }

    fn comment_statements(
        &self,
        _gen: &SchemaGenerator,
        _table: &TableRef,
        _table_comment: Option<&str>,
        _column_comments: &[(&str, &str)],
    ) -> Vec<String> {
        Vec::new()
    }

    fn table_options(&self, generator: &SchemaGenerator, options: &CreateTableOptions) -> Result<String> {
        let engine = options.engine.as_deref().unwrap_or("InnoDB");
        generator.check_word(engine, "storage engine")?;
        let mut sql = format!(" ENGINE={engine}");
        if let Some(charset) = &options.charset {
            generator.check_word(charset, "character set")?;
            sql.push_str(&format!(" DEFAULT CHARSET={charset}"));
        }
        if let Some(collate) = &options.collate {
            generator.check_word(collate, "collation")?;
            sql.push_str(&format!(" COLLATE {collate}"));
        }
        if let Some(row_format) = &options.row_format {
            generator.check_word(row_format, "row format")?;
            sql.push_str(&format!(" ROW_FORMAT={row_format}"));
        }
        Ok(sql)
    }

    /// `MODIFY` replaces the whole column definition, so the type and
    /// nullability must both be given.
    fn change_column(
        &self,
        generator: &SchemaGenerator,
        table: &TableRef,
        column: &str,
        change: &ColumnChange,
    ) -> Result<String> {
        let (Some(data_type), Some(allow_null)) = (&change.data_type, change.allow_null) else {
            return Err(Error::validation(
                ValidationErrorKind::MissingColumns,
                format!(
                    "changeColumnQuery in {} replaces the whole column definition; `type` and `allowNull` must be specified",
                    generator.dialect_name()
                ),
            ));
        };
        let mut attribute = Attribute::new(column, data_type.clone());
        attribute.allow_null = allow_null;
        attribute.auto_increment = change.auto_increment.unwrap_or(false);
        attribute.default_value = change.default_value.clone();
        attribute.unique = change.unique;
        attribute.comment = change.comment.clone();

        let query = generator.query();
        let mut clauses = vec![format!(
            "MODIFY {} {}",
            query.quote_identifier(column),
            generator.attribute_to_sql(&attribute, false)?
        )];
        if let Some(reference) = &change.references {
            clauses.push(format!(
                "ADD FOREIGN KEY ({}) {}",
                query.quote_identifier(column),
                generator.references_sql(reference)?
            ));
        }
        Ok(generator.finish_column_change(table, column, change, &clauses, ", "))
    }

    fn rename_table(&self, generator: &SchemaGenerator, before: &TableRef, after: &TableRef) -> Result<String> {
        let query = generator.query();
        Ok(format!(
            "RENAME TABLE {} TO {}",
            query.quote_table_name(before),
            query.quote_table_name(after)
        ))
    }
}
