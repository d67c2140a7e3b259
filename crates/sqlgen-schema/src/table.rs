//! `CREATE TABLE`, `DROP TABLE` and table renames.

use sqlgen_core::identifiers::generate_index_name;
use sqlgen_core::{Attribute, Error, ModelDefinition, Result, TableRef, ValidationErrorKind};

use crate::generator::SchemaGenerator;
use crate::options::{CreateTableOptions, DropTableOptions, RenameTableOptions};

impl SchemaGenerator {
    /// Build `CREATE TABLE IF NOT EXISTS` for the given columns.
    ///
    /// Primary key columns are collected into a trailing `PRIMARY KEY (...)`
    /// unless the column syntax already declares them (sqlite
    /// `AUTOINCREMENT`). Table and column comments follow as separate
    /// statements on dialects without inline comments.
    pub fn create_table_query(
        &self,
        table: &TableRef,
        attributes: &[Attribute],
        options: &CreateTableOptions,
    ) -> Result<String> {
        if attributes.is_empty() {
            return Err(Error::validation(
                ValidationErrorKind::MissingColumns,
                format!("createTableQuery requires at least one attribute for {}", table.table_name),
            ));
        }
        let query = self.query();
        let ops = self.ops();
        query.check_identifier_length(&table.table_name)?;

        let mut definitions = Vec::with_capacity(attributes.len() + 1);
        let mut primary_keys = Vec::new();
        let mut column_comments = Vec::new();
        for attribute in attributes {
            query.check_identifier_length(&attribute.column_name)?;
            let column_sql = query.quote_identifier(&attribute.column_name);
            definitions.push(format!("{column_sql} {}", self.attribute_to_sql(attribute, false)?));
            if attribute.primary_key
                && !(attribute.auto_increment && ops.inlines_primary_key(attribute))
            {
                primary_keys.push(column_sql);
            }
            if let Some(comment) = &attribute.comment {
                if !ops.inline_column_comment() {
                    column_comments.push((attribute.column_name.as_str(), comment.as_str()));
                }
            }
        }

        if !options.unique_keys.is_empty() {
            query.require("createTable.uniqueKeys", || {
                format!("Unique keys are not supported by {} dialect", self.dialect_name())
            })?;
        }
        for key in &options.unique_keys {
            let name = match &key.name {
                Some(name) => {
                    query.check_identifier_length(name)?;
                    name.clone()
                }
                None => self.fit_identifier(generate_index_name(&table.table_name, &key.fields, true)),
            };
            definitions.push(format!(
                "CONSTRAINT {} UNIQUE ({})",
                query.quote_identifier(&name),
                self.quote_columns(&key.fields)
            ));
        }
        if !primary_keys.is_empty() {
            definitions.push(format!("PRIMARY KEY ({})", primary_keys.join(", ")));
        }

        let mut table_options = ops.table_options(self, options)?;
        let table_comment = match &options.comment {
            Some(comment) if ops.inline_column_comment() => {
                table_options.push_str(&format!(" COMMENT {}", query.escaper().string(comment)));
                None
            }
            Some(comment) => {
                query.require("createTable.comment", || {
                    format!("Table comments are not supported by {} dialect", self.dialect_name())
                })?;
                Some(comment.as_str())
            }
            None => None,
        };

        let table_sql = query.quote_table_name(table);
        let mut statements = vec![ops.create_table(
            self,
            table,
            &table_sql,
            &definitions.join(", "),
            &table_options,
        )];
        statements.extend(ops.comment_statements(self, table, table_comment, &column_comments));
        let sql = statements.join(" ");
        self.log_ddl("createTableQuery", &table.table_name, &sql);
        Ok(sql)
    }

    /// `CREATE TABLE` for a model's table and attributes.
    pub fn create_table_from_model(
        &self,
        model: &ModelDefinition,
        options: &CreateTableOptions,
    ) -> Result<String> {
        self.create_table_query(&model.table, &model.attributes, options)
    }

    pub fn drop_table_query(&self, table: &TableRef, options: &DropTableOptions) -> Result<String> {
        let query = self.query();
        if options.cascade {
            query.reject_invalid_options(
                "dropTableQuery",
                &[("cascade", query.supports().enabled("dropTable.cascade"))],
            )?;
        }
        let sql = self.ops().drop_table(self, &query.quote_table_name(table), options);
        self.log_ddl("dropTableQuery", &table.table_name, &sql);
        Ok(sql)
    }

    /// Rename a table, or move it to another schema.
    ///
    /// A move must be requested explicitly through `change_schema`.
    pub fn rename_table_query(
        &self,
        before: &TableRef,
        after: &TableRef,
        options: &RenameTableOptions,
    ) -> Result<String> {
        let query = self.query();
        let dialect = self.dialect_name();
        if self.effective_schema(before) != self.effective_schema(after) {
            if !options.change_schema {
                return Err(Error::validation(
                    ValidationErrorKind::Invalid,
                    "To move a table between schemas, you must set `options.changeSchema` to true.",
                ));
            }
            query.require("renameTable.changeSchema", || {
                format!("Moving tables between schemas is not supported by {dialect} dialect.")
            })?;
            if before.table_name != after.table_name {
                query.require("renameTable.changeSchemaAndTable", || {
                    format!(
                        "Renaming a table and moving it to a different schema is not supported by {dialect}."
                    )
                })?;
            }
        }
        query.check_identifier_length(&after.table_name)?;

        let sql = self.ops().rename_table(self, before, after)?;
        self.log_ddl("renameTableQuery", &before.table_name, &sql);
        Ok(sql)
    }
}
