//! Column definitions and the `ALTER TABLE` column statements.

use sqlgen_core::{
    Attribute, DataType, Error, ForeignKeyReference, ReferentialAction, Result, TableRef,
    ValidationErrorKind,
};

use crate::generator::SchemaGenerator;
use crate::options::{AddColumnOptions, ColumnChange, RemoveColumnOptions};

impl SchemaGenerator {
    /// Add a column: `ALTER TABLE t ADD "c" ...;`.
    pub fn add_column_query(
        &self,
        table: &TableRef,
        attribute: &Attribute,
        options: &AddColumnOptions,
    ) -> Result<String> {
        let query = self.query();
        if options.if_not_exists {
            query.reject_invalid_options(
                "addColumnQuery",
                &[("ifNotExists", query.supports().enabled("addColumn.ifNotExists"))],
            )?;
        }
        query.check_identifier_length(&attribute.column_name)?;

        let mut sql = format!(
            "ALTER TABLE {} {} {}{} {};",
            query.quote_table_name(table),
            self.ops().add_column_keyword(),
            if options.if_not_exists { "IF NOT EXISTS " } else { "" },
            query.quote_identifier(&attribute.column_name),
            self.attribute_to_sql(attribute, true)?
        );
        if let Some(comment) = &attribute.comment {
            if !self.ops().inline_column_comment() {
                let comments = [(attribute.column_name.as_str(), comment.as_str())];
                for statement in self.ops().comment_statements(self, table, None, &comments) {
                    sql.push(' ');
                    sql.push_str(&statement);
                }
            }
        }
        self.log_ddl("addColumnQuery", &table.table_name, &sql);
        Ok(sql)
    }

    /// Drop a column: `ALTER TABLE t DROP COLUMN "c"`.
    pub fn remove_column_query(
        &self,
        table: &TableRef,
        column: &str,
        options: &RemoveColumnOptions,
    ) -> Result<String> {
        let query = self.query();
        let supports = query.supports();
        let mut requested = Vec::new();
        if options.cascade {
            requested.push(("cascade", supports.enabled("removeColumn.cascade")));
        }
        if options.if_exists {
            requested.push(("ifExists", supports.enabled("removeColumn.ifExists")));
        }
        query.reject_invalid_options("removeColumnQuery", &requested)?;

        let sql = format!(
            "ALTER TABLE {} DROP COLUMN {}{}{}",
            query.quote_table_name(table),
            if options.if_exists { "IF EXISTS " } else { "" },
            query.quote_identifier(column),
            if options.cascade { " CASCADE" } else { "" }
        );
        self.log_ddl("removeColumnQuery", &table.table_name, &sql);
        Ok(sql)
    }

    /// Alter the type, nullability, default or references of a column.
    pub fn change_column_query(
        &self,
        table: &TableRef,
        column: &str,
        change: &ColumnChange,
    ) -> Result<String> {
        if change.is_empty() {
            return Err(Error::validation(
                ValidationErrorKind::MissingColumns,
                format!("changeColumnQuery requires at least one change to {column}"),
            ));
        }
        let sql = self.ops().change_column(self, table, column, change)?;
        self.log_ddl("changeColumnQuery", &table.table_name, &sql);
        Ok(sql)
    }

    pub fn rename_column_query(&self, table: &TableRef, before: &str, after: &str) -> Result<String> {
        self.query().check_identifier_length(after)?;
        let sql = self.ops().rename_column(self, table, before, after);
        self.log_ddl("renameColumnQuery", &table.table_name, &sql);
        Ok(sql)
    }

    // ==================== Column definitions ====================

    /// SQL type name, checking that the dialect has the type.
    pub(crate) fn column_type(&self, data_type: &DataType) -> Result<String> {
        if let Some(key) = data_type.capability_key() {
            let name = key.trim_start_matches("dataTypes.");
            self.query().require(key, || {
                format!("{name} is not supported by the {} dialect", self.dialect_name())
            })?;
        }
        Ok(data_type.to_sql(self.kind()))
    }

    /// Column definition without the column name.
    ///
    /// `add_column` declares the primary key inline, as there is no table
    /// body to declare it in.
    pub(crate) fn attribute_to_sql(&self, attribute: &Attribute, add_column: bool) -> Result<String> {
        let ops = self.ops();
        let query = self.query();
        let type_sql = self.column_type(&attribute.data_type)?;
        let inlined_pk = attribute.auto_increment && ops.inlines_primary_key(attribute);

        let mut parts = vec![if attribute.auto_increment {
            ops.auto_increment_type(&type_sql, attribute)
        } else {
            type_sql
        }];
        if !attribute.allow_null && !inlined_pk {
            parts.push("NOT NULL".to_string());
        }
        if let Some(value) = &attribute.default_value {
            if !attribute.auto_increment {
                parts.push(format!(
                    "DEFAULT {}",
                    query.escaper().value(value, Some(&attribute.data_type))?
                ));
            }
        }
        if attribute.unique {
            parts.push("UNIQUE".to_string());
        }
        if add_column && attribute.primary_key && !inlined_pk {
            parts.push("PRIMARY KEY".to_string());
        }
        if let Some(comment) = &attribute.comment {
            if ops.inline_column_comment() {
                parts.push(format!("COMMENT {}", query.escaper().string(comment)));
            }
        }
        if let Some(reference) = &attribute.references {
            parts.push(self.references_sql(reference)?);
        }
        Ok(parts.join(" "))
    }

    /// `REFERENCES t (k) ON DELETE ... ON UPDATE ... DEFERRABLE ...`.
    pub(crate) fn references_sql(&self, reference: &ForeignKeyReference) -> Result<String> {
        let query = self.query();
        let mut sql = format!(
            "REFERENCES {} ({})",
            query.quote_table_name(&reference.table),
            query.quote_identifier(&reference.key)
        );
        sql.push_str(&self.referential_actions(reference.on_delete, reference.on_update)?);
        if let Some(deferrable) = reference.deferrable {
            self.require_deferrable()?;
            sql.push(' ');
            sql.push_str(deferrable.as_sql());
        }
        Ok(sql)
    }

    /// ` ON DELETE x ON UPDATE y`, each checked against the dialect.
    pub(crate) fn referential_actions(
        &self,
        on_delete: Option<ReferentialAction>,
        on_update: Option<ReferentialAction>,
    ) -> Result<String> {
        let query = self.query();
        let dialect = self.dialect_name();
        let restrict = [on_delete, on_update].contains(&Some(ReferentialAction::Restrict));
        if restrict {
            query.require("constraints.restrict", || {
                format!("ON DELETE/ON UPDATE RESTRICT is not supported by {dialect} dialect")
            })?;
        }
        let mut sql = String::new();
        if let Some(action) = on_delete {
            sql.push_str(&format!(" ON DELETE {}", action.as_sql()));
        }
        if let Some(action) = on_update {
            query.require("constraints.onUpdate", || {
                format!("Foreign key constraint with onUpdate is not supported by {dialect} dialect")
            })?;
            sql.push_str(&format!(" ON UPDATE {}", action.as_sql()));
        }
        Ok(sql)
    }

    pub(crate) fn require_deferrable(&self) -> Result<()> {
        self.query().require("constraints.deferrable", || {
            format!("Deferrable constraints are not supported by {} dialect", self.dialect_name())
        })
    }

    // ==================== ALTER COLUMN helpers ====================

    /// Standard `ALTER COLUMN` clauses, one per changed property.
    pub(crate) fn alter_column_clauses(
        &self,
        column: &str,
        change: &ColumnChange,
        type_keyword: &str,
    ) -> Result<Vec<String>> {
        let query = self.query();
        if change.auto_increment.is_some() {
            query.reject_invalid_options("changeColumnQuery", &[("autoIncrement", false)])?;
        }

        let column_sql = query.quote_identifier(column);
        let mut clauses = Vec::new();
        if let Some(data_type) = &change.data_type {
            clauses.push(format!(
                "ALTER COLUMN {column_sql} {type_keyword} {}",
                self.column_type(data_type)?
            ));
        }
        match change.allow_null {
            Some(false) => clauses.push(format!("ALTER COLUMN {column_sql} SET NOT NULL")),
            Some(true) => clauses.push(format!("ALTER COLUMN {column_sql} DROP NOT NULL")),
            None => {}
        }
        if let Some(value) = &change.default_value {
            clauses.push(format!(
                "ALTER COLUMN {column_sql} SET DEFAULT {}",
                query.escaper().value(value, change.data_type.as_ref())?
            ));
        } else if change.drop_default {
            clauses.push(format!("ALTER COLUMN {column_sql} DROP DEFAULT"));
        }
        if change.unique {
            query.require("alterColumn.unique", || {
                format!(
                    "Adding a unique constraint while altering a column is not supported by {} dialect",
                    self.dialect_name()
                )
            })?;
            clauses.push(format!("ADD UNIQUE ({column_sql})"));
        }
        if let Some(reference) = &change.references {
            clauses.push(format!(
                "ADD FOREIGN KEY ({column_sql}) {}",
                self.references_sql(reference)?
            ));
        }
        Ok(clauses)
    }

    /// `ALTER TABLE t <clauses>;` followed by any comment statements.
    pub(crate) fn finish_column_change(
        &self,
        table: &TableRef,
        column: &str,
        change: &ColumnChange,
        clauses: &[String],
        separator: &str,
    ) -> String {
        let mut statements = Vec::new();
        if !clauses.is_empty() {
            statements.push(format!(
                "ALTER TABLE {} {};",
                self.query().quote_table_name(table),
                clauses.join(separator)
            ));
        }
        if let Some(comment) = &change.comment {
            if !self.ops().inline_column_comment() {
                statements.extend(self.ops().comment_statements(
                    self,
                    table,
                    None,
                    &[(column, comment.as_str())],
                ));
            }
        }
        statements.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlgen_core::{DialectKind, Value};

    fn generator(kind: DialectKind) -> SchemaGenerator {
        SchemaGenerator::for_kind(kind).unwrap()
    }

    // ==================== addColumnQuery ====================

    #[test]
    fn test_add_column() {
        let attribute = Attribute::new("name", DataType::string()).not_null();
        let options = AddColumnOptions::default();
        assert_eq!(
            generator(DialectKind::Postgres).add_column_query(&"users".into(), &attribute, &options).unwrap(),
            "ALTER TABLE \"users\" ADD COLUMN \"name\" VARCHAR(255) NOT NULL;"
        );
        assert_eq!(
            generator(DialectKind::Mysql).add_column_query(&"users".into(), &attribute, &options).unwrap(),
            "ALTER TABLE `users` ADD `name` VARCHAR(255) NOT NULL;"
        );
        assert_eq!(
            generator(DialectKind::Mssql).add_column_query(&"users".into(), &attribute, &options).unwrap(),
            "ALTER TABLE [users] ADD [name] NVARCHAR(255) NOT NULL;"
        );
    }

    #[test]
    fn test_add_column_if_not_exists() {
        let attribute = Attribute::new("age", DataType::Integer).default_value(0);
        let options = AddColumnOptions { if_not_exists: true };
        assert_eq!(
            generator(DialectKind::Postgres).add_column_query(&"users".into(), &attribute, &options).unwrap(),
            "ALTER TABLE \"users\" ADD COLUMN IF NOT EXISTS \"age\" INTEGER DEFAULT 0;"
        );
        let err = generator(DialectKind::Mysql)
            .add_column_query(&"users".into(), &attribute, &options)
            .unwrap_err();
        assert_eq!(err.unsupported_options(), ["ifNotExists"]);
    }

    #[test]
    fn test_add_column_with_reference() {
        let attribute = Attribute::new("ownerId", DataType::Integer).references(
            ForeignKeyReference::new("users", "id").on_delete(ReferentialAction::Cascade),
        );
        assert_eq!(
            generator(DialectKind::Sqlite)
                .add_column_query(&"projects".into(), &attribute, &AddColumnOptions::default())
                .unwrap(),
            "ALTER TABLE `projects` ADD `ownerId` INTEGER REFERENCES `users` (`id`) ON DELETE CASCADE;"
        );
    }

    #[test]
    fn test_add_column_primary_key_inline() {
        let attribute = Attribute::primary_key("id");
        assert_eq!(
            generator(DialectKind::Postgres)
                .add_column_query(&"users".into(), &attribute, &AddColumnOptions::default())
                .unwrap(),
            "ALTER TABLE \"users\" ADD COLUMN \"id\" SERIAL NOT NULL PRIMARY KEY;"
        );
        assert_eq!(
            generator(DialectKind::Sqlite)
                .add_column_query(&"users".into(), &attribute, &AddColumnOptions::default())
                .unwrap(),
            "ALTER TABLE `users` ADD `id` INTEGER PRIMARY KEY AUTOINCREMENT;"
        );
    }

    #[test]
    fn test_add_column_comment() {
        let attribute = Attribute::new("bio", DataType::Text).comment("About me");
        assert_eq!(
            generator(DialectKind::Postgres)
                .add_column_query(&"users".into(), &attribute, &AddColumnOptions::default())
                .unwrap(),
            "ALTER TABLE \"users\" ADD COLUMN \"bio\" TEXT; COMMENT ON COLUMN \"users\".\"bio\" IS 'About me';"
        );
        assert_eq!(
            generator(DialectKind::Mysql)
                .add_column_query(&"users".into(), &attribute, &AddColumnOptions::default())
                .unwrap(),
            "ALTER TABLE `users` ADD `bio` TEXT COMMENT 'About me';"
        );
    }

    #[test]
    fn test_add_column_type_capability() {
        let attribute = Attribute::new("tags", DataType::Array(Box::new(DataType::Text)));
        assert_eq!(
            generator(DialectKind::Postgres)
                .add_column_query(&"posts".into(), &attribute, &AddColumnOptions::default())
                .unwrap(),
            "ALTER TABLE \"posts\" ADD COLUMN \"tags\" TEXT[];"
        );
        let err = generator(DialectKind::Mysql)
            .add_column_query(&"posts".into(), &attribute, &AddColumnOptions::default())
            .unwrap_err();
        assert!(err.is_capability());
        assert_eq!(err.unsupported_options(), ["dataTypes.ARRAY"]);
    }

    // ==================== removeColumnQuery ====================

    #[test]
    fn test_remove_column() {
        let options = RemoveColumnOptions::default();
        assert_eq!(
            generator(DialectKind::Postgres).remove_column_query(&"users".into(), "age", &options).unwrap(),
            "ALTER TABLE \"users\" DROP COLUMN \"age\""
        );
        let options = RemoveColumnOptions {
            if_exists: true,
            cascade: true,
        };
        assert_eq!(
            generator(DialectKind::Postgres).remove_column_query(&"users".into(), "age", &options).unwrap(),
            "ALTER TABLE \"users\" DROP COLUMN IF EXISTS \"age\" CASCADE"
        );
        let err = generator(DialectKind::Mssql)
            .remove_column_query(&"users".into(), "age", &options)
            .unwrap_err();
        assert_eq!(err.unsupported_options(), ["cascade"]);
    }

    // ==================== changeColumnQuery ====================

    #[test]
    fn test_change_column_postgres() {
        let change = ColumnChange::new()
            .data_type(DataType::string())
            .allow_null(false)
            .default_value("n/a");
        assert_eq!(
            generator(DialectKind::Postgres).change_column_query(&"users".into(), "name", &change).unwrap(),
            "ALTER TABLE \"users\" ALTER COLUMN \"name\" TYPE VARCHAR(255), ALTER COLUMN \"name\" SET NOT NULL, ALTER COLUMN \"name\" SET DEFAULT 'n/a';"
        );
        let drop = ColumnChange::new().allow_null(true).drop_default();
        assert_eq!(
            generator(DialectKind::Postgres).change_column_query(&"users".into(), "name", &drop).unwrap(),
            "ALTER TABLE \"users\" ALTER COLUMN \"name\" DROP NOT NULL, ALTER COLUMN \"name\" DROP DEFAULT;"
        );
    }

    #[test]
    fn test_change_column_with_comment_and_reference() {
        let change = ColumnChange::new()
            .references(ForeignKeyReference::new("users", "id"))
            .comment("owner");
        assert_eq!(
            generator(DialectKind::Postgres).change_column_query(&"posts".into(), "ownerId", &change).unwrap(),
            "ALTER TABLE \"posts\" ADD FOREIGN KEY (\"ownerId\") REFERENCES \"users\" (\"id\"); COMMENT ON COLUMN \"posts\".\"ownerId\" IS 'owner';"
        );
    }

    #[test]
    fn test_change_column_mysql_modify() {
        let change = ColumnChange::new()
            .data_type(DataType::Integer)
            .allow_null(false)
            .default_value(1);
        assert_eq!(
            generator(DialectKind::Mysql).change_column_query(&"users".into(), "level", &change).unwrap(),
            "ALTER TABLE `users` MODIFY `level` INTEGER NOT NULL DEFAULT 1;"
        );
        let partial = ColumnChange::new().default_value(1);
        let err = generator(DialectKind::Mysql)
            .change_column_query(&"users".into(), "level", &partial)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_change_column_mssql() {
        let change = ColumnChange::new()
            .data_type(DataType::string())
            .allow_null(false)
            .default_value(Value::from("x"));
        assert_eq!(
            generator(DialectKind::Mssql).change_column_query(&"users".into(), "name", &change).unwrap(),
            "ALTER TABLE [users] ALTER COLUMN [name] NVARCHAR(255) NOT NULL; ALTER TABLE [users] ADD DEFAULT N'x' FOR [name];"
        );
        let err = generator(DialectKind::Mssql)
            .change_column_query(&"users".into(), "name", &ColumnChange::new().drop_default())
            .unwrap_err();
        assert_eq!(err.unsupported_options(), ["dropDefault"]);
    }

    #[test]
    fn test_change_column_other_dialects() {
        let change = ColumnChange::new().data_type(DataType::BigInt).allow_null(false);
        assert_eq!(
            generator(DialectKind::Oracle).change_column_query(&"users".into(), "n", &change).unwrap(),
            "ALTER TABLE \"users\" MODIFY (\"n\" NUMBER(19) NOT NULL);"
        );
        assert_eq!(
            generator(DialectKind::Db2).change_column_query(&"users".into(), "n", &change).unwrap(),
            "ALTER TABLE \"users\" ALTER COLUMN \"n\" SET DATA TYPE BIGINT ALTER COLUMN \"n\" SET NOT NULL;"
        );
        assert_eq!(
            generator(DialectKind::Snowflake).change_column_query(&"users".into(), "n", &change).unwrap(),
            "ALTER TABLE \"users\" ALTER COLUMN \"n\" SET DATA TYPE BIGINT, ALTER COLUMN \"n\" SET NOT NULL;"
        );
    }

    #[test]
    fn test_change_column_unsupported() {
        let change = ColumnChange::new().data_type(DataType::Text);
        let err = generator(DialectKind::Sqlite)
            .change_column_query(&"users".into(), "bio", &change)
            .unwrap_err();
        assert!(err.is_capability());
        let err = generator(DialectKind::Postgres)
            .change_column_query(&"users".into(), "bio", &ColumnChange::new())
            .unwrap_err();
        assert!(err.is_validation());
    }

    // ==================== renameColumnQuery ====================

    #[test]
    fn test_rename_column() {
        assert_eq!(
            generator(DialectKind::Postgres).rename_column_query(&"users".into(), "name", "fullName").unwrap(),
            "ALTER TABLE \"users\" RENAME COLUMN \"name\" TO \"fullName\""
        );
        assert_eq!(
            generator(DialectKind::Mssql).rename_column_query(&"users".into(), "name", "fullName").unwrap(),
            "EXEC sp_rename N'[users].[name]', N'fullName', N'COLUMN'"
        );
    }

    // ==================== references ====================

    #[test]
    fn test_references_capabilities() {
        let restrict = ForeignKeyReference::new("users", "id").on_delete(ReferentialAction::Restrict);
        let attribute = Attribute::new("ownerId", DataType::Integer).references(restrict);
        let err = generator(DialectKind::Oracle)
            .add_column_query(&"posts".into(), &attribute, &AddColumnOptions::default())
            .unwrap_err();
        assert_eq!(err.unsupported_options(), ["constraints.restrict"]);

        let on_update = ForeignKeyReference::new("users", "id").on_update(ReferentialAction::Cascade);
        let attribute = Attribute::new("ownerId", DataType::Integer).references(on_update);
        let err = generator(DialectKind::Db2)
            .add_column_query(&"posts".into(), &attribute, &AddColumnOptions::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Foreign key constraint with onUpdate is not supported by db2 dialect"
        );
    }
}
