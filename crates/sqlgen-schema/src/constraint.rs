//! `ADD CONSTRAINT`, `DROP CONSTRAINT` and `SET CONSTRAINTS`.

use sqlgen_core::identifiers::generate_constraint_name;
use sqlgen_core::{Error, Result, TableRef, ValidationErrorKind};
use sqlgen_query::RenderContext;

use crate::generator::SchemaGenerator;
use crate::options::{
    ConstraintChecking, ConstraintKind, ConstraintOptions, RemoveConstraintOptions,
};

impl SchemaGenerator {
    /// `ALTER TABLE t ADD CONSTRAINT name ...`.
    ///
    /// Unnamed constraints are called `{table}_{fields}_{ck|uk|df|pk|fk}`.
    pub fn add_constraint_query(&self, table: &TableRef, options: &ConstraintOptions) -> Result<String> {
        let query = self.query();
        let dialect = self.dialect_name();
        query.require("constraints.add", || {
            format!("Add constraint queries are not supported by {dialect} dialect")
        })?;
        let (path, label) = match &options.kind {
            ConstraintKind::Check(_) => ("constraints.check", "Check"),
            ConstraintKind::Unique => ("constraints.unique", "Unique"),
            ConstraintKind::Default(_) => ("constraints.default", "Default"),
            ConstraintKind::PrimaryKey => ("constraints.primaryKey", "Primary key"),
            ConstraintKind::ForeignKey { .. } => ("constraints.foreignKey", "Foreign key"),
        };
        query.require(path, || format!("{label} constraints are not supported by {dialect} dialect"))?;
        if options.fields.is_empty() {
            return Err(Error::validation(
                ValidationErrorKind::MissingColumns,
                format!("{label} constraints require at least one field"),
            ));
        }
        if options.deferrable.is_some() {
            self.require_deferrable()?;
        }

        let name = match &options.name {
            Some(name) => {
                query.check_identifier_length(name)?;
                name.clone()
            }
            None => self.fit_identifier(generate_constraint_name(
                &table.table_name,
                &options.fields,
                options.kind.name_suffix(),
            )),
        };
        let fields_sql = self.quote_columns(&options.fields);
        let mut body = match &options.kind {
            ConstraintKind::Check(where_) => {
                format!("CHECK ({})", query.where_items(where_, &mut RenderContext::new())?)
            }
            ConstraintKind::Unique => format!("UNIQUE ({fields_sql})"),
            ConstraintKind::Default(value) => {
                if options.fields.len() > 1 {
                    return Err(Error::validation(
                        ValidationErrorKind::Invalid,
                        "Default constraints apply to exactly one field",
                    ));
                }
                format!("DEFAULT ({}) FOR {fields_sql}", query.escape(value)?)
            }
            ConstraintKind::PrimaryKey => format!("PRIMARY KEY ({fields_sql})"),
            ConstraintKind::ForeignKey {
                references,
                on_delete,
                on_update,
            } => {
                if references.table.table_name.is_empty() || references.fields.is_empty() {
                    return Err(Error::validation(
                        ValidationErrorKind::MissingColumns,
                        "Invalid foreign key constraint options. `references` object with `table` and `field` must be specified",
                    ));
                }
                if references.fields.len() != options.fields.len() {
                    return Err(Error::validation(
                        ValidationErrorKind::Invalid,
                        format!(
                            "Foreign key {name} has {} fields but references {}",
                            options.fields.len(),
                            references.fields.len()
                        ),
                    ));
                }
                format!(
                    "FOREIGN KEY ({fields_sql}) REFERENCES {} ({}){}",
                    query.quote_table_name(&references.table),
                    self.quote_columns(&references.fields),
                    self.referential_actions(*on_delete, *on_update)?
                )
            }
        };
        if let Some(deferrable) = options.deferrable {
            body.push(' ');
            body.push_str(deferrable.as_sql());
        }

        let sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} {body}",
            query.quote_table_name(table),
            query.quote_identifier(&name)
        );
        self.log_ddl("addConstraintQuery", &table.table_name, &sql);
        Ok(sql)
    }

    pub fn remove_constraint_query(
        &self,
        table: &TableRef,
        name: &str,
        options: &RemoveConstraintOptions,
    ) -> Result<String> {
        let query = self.query();
        let supports = query.supports();
        query.require("constraints.remove", || {
            format!("Remove constraint queries are not supported by {} dialect", self.dialect_name())
        })?;
        let mut requested = Vec::new();
        if options.cascade {
            requested.push(("cascade", supports.enabled("constraints.removeOptions.cascade")));
        }
        if options.if_exists {
            requested.push(("ifExists", supports.enabled("constraints.removeOptions.ifExists")));
        }
        query.reject_invalid_options("removeConstraintQuery", &requested)?;

        let sql = format!(
            "ALTER TABLE {} DROP CONSTRAINT {}{}{}",
            query.quote_table_name(table),
            if options.if_exists { "IF EXISTS " } else { "" },
            query.quote_identifier(name),
            if options.cascade { " CASCADE" } else { "" }
        );
        self.log_ddl("removeConstraintQuery", &table.table_name, &sql);
        Ok(sql)
    }

    /// `SET CONSTRAINTS ALL DEFERRED`, or the named constraints.
    pub fn set_constraint_checking_query(&self, checking: &ConstraintChecking) -> Result<String> {
        self.require_deferrable()?;
        let names = checking.constraints();
        let target = if names.is_empty() {
            "ALL".to_string()
        } else {
            self.quote_columns(names)
        };
        let sql = format!("SET CONSTRAINTS {target} {}", checking.as_sql());
        self.log_ddl("setConstraintCheckingQuery", "", &sql);
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ConstraintReference;
    use sqlgen_core::{Deferrable, DialectKind, ReferentialAction, Value};
    use sqlgen_query::{Op, Operand, Where};

    fn generator(kind: DialectKind) -> SchemaGenerator {
        SchemaGenerator::for_kind(kind).unwrap()
    }

    fn age_check() -> ConstraintOptions {
        ConstraintOptions::check(["age"], Where::op("age", Op::Gte, Operand::value(Value::Int(10))))
    }

    // ==================== addConstraintQuery ====================

    #[test]
    fn test_add_check_constraint() {
        assert_eq!(
            generator(DialectKind::Mssql).add_constraint_query(&"myTable".into(), &age_check()).unwrap(),
            "ALTER TABLE [myTable] ADD CONSTRAINT [myTable_age_ck] CHECK ([age] >= 10)"
        );
        assert_eq!(
            generator(DialectKind::Postgres).add_constraint_query(&"myTable".into(), &age_check()).unwrap(),
            "ALTER TABLE \"myTable\" ADD CONSTRAINT \"myTable_age_ck\" CHECK (\"age\" >= 10)"
        );
        let err = generator(DialectKind::Snowflake)
            .add_constraint_query(&"myTable".into(), &age_check())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Check constraints are not supported by snowflake dialect"
        );
    }

    #[test]
    fn test_add_unique_and_primary_key() {
        let unique = ConstraintOptions::unique(["email", "tenantId"]).with_name("uniq_email");
        assert_eq!(
            generator(DialectKind::Postgres).add_constraint_query(&"users".into(), &unique).unwrap(),
            "ALTER TABLE \"users\" ADD CONSTRAINT \"uniq_email\" UNIQUE (\"email\", \"tenantId\")"
        );
        let pk = ConstraintOptions::primary_key(["id"]);
        assert_eq!(
            generator(DialectKind::Mysql).add_constraint_query(&"users".into(), &pk).unwrap(),
            "ALTER TABLE `users` ADD CONSTRAINT `users_id_pk` PRIMARY KEY (`id`)"
        );
    }

    #[test]
    fn test_add_default_constraint() {
        let default = ConstraintOptions::default_value("status", "draft");
        assert_eq!(
            generator(DialectKind::Mssql).add_constraint_query(&"posts".into(), &default).unwrap(),
            "ALTER TABLE [posts] ADD CONSTRAINT [posts_status_df] DEFAULT (N'draft') FOR [status]"
        );
        let err = generator(DialectKind::Postgres)
            .add_constraint_query(&"posts".into(), &default)
            .unwrap_err();
        assert_eq!(err.to_string(), "Default constraints are not supported by postgres dialect");
    }

    #[test]
    fn test_add_foreign_key_constraint() {
        let fk = ConstraintOptions::foreign_key(["ownerId"], ConstraintReference::new("users", ["id"]))
            .on_delete(ReferentialAction::Cascade)
            .on_update(ReferentialAction::Cascade);
        assert_eq!(
            generator(DialectKind::Postgres).add_constraint_query(&"projects".into(), &fk).unwrap(),
            "ALTER TABLE \"projects\" ADD CONSTRAINT \"projects_ownerId_fk\" FOREIGN KEY (\"ownerId\") REFERENCES \"users\" (\"id\") ON DELETE CASCADE ON UPDATE CASCADE"
        );
        let err = generator(DialectKind::Oracle)
            .add_constraint_query(&"projects".into(), &fk)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Foreign key constraint with onUpdate is not supported by oracle dialect"
        );
    }

    #[test]
    fn test_add_foreign_key_requires_references() {
        let fk = ConstraintOptions::foreign_key(["ownerId"], ConstraintReference::new("users", Vec::<String>::new()));
        let err = generator(DialectKind::Postgres)
            .add_constraint_query(&"projects".into(), &fk)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid foreign key constraint options. `references` object with `table` and `field` must be specified"
        );
    }

    #[test]
    fn test_add_deferrable_constraint() {
        let fk = ConstraintOptions::foreign_key(["ownerId"], ConstraintReference::new("users", ["id"]))
            .deferrable(Deferrable::InitiallyDeferred);
        assert_eq!(
            generator(DialectKind::Postgres).add_constraint_query(&"projects".into(), &fk).unwrap(),
            "ALTER TABLE \"projects\" ADD CONSTRAINT \"projects_ownerId_fk\" FOREIGN KEY (\"ownerId\") REFERENCES \"users\" (\"id\") DEFERRABLE INITIALLY DEFERRED"
        );
        let err = generator(DialectKind::Mysql)
            .add_constraint_query(&"projects".into(), &fk)
            .unwrap_err();
        assert_eq!(err.to_string(), "Deferrable constraints are not supported by mysql dialect");
    }

    #[test]
    fn test_add_constraint_unsupported() {
        let err = generator(DialectKind::Sqlite)
            .add_constraint_query(&"users".into(), &ConstraintOptions::unique(["email"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Add constraint queries are not supported by sqlite dialect");
        let err = generator(DialectKind::Postgres)
            .add_constraint_query(&"users".into(), &ConstraintOptions::unique(Vec::<String>::new()))
            .unwrap_err();
        assert!(err.is_validation());
    }

    // ==================== removeConstraintQuery ====================

    #[test]
    fn test_remove_constraint() {
        let options = RemoveConstraintOptions::default();
        assert_eq!(
            generator(DialectKind::Postgres)
                .remove_constraint_query(&"users".into(), "users_email_uk", &options)
                .unwrap(),
            "ALTER TABLE \"users\" DROP CONSTRAINT \"users_email_uk\""
        );
        let options = RemoveConstraintOptions {
            if_exists: true,
            cascade: true,
        };
        assert_eq!(
            generator(DialectKind::Postgres)
                .remove_constraint_query(&"users".into(), "users_email_uk", &options)
                .unwrap(),
            "ALTER TABLE \"users\" DROP CONSTRAINT IF EXISTS \"users_email_uk\" CASCADE"
        );
        let err = generator(DialectKind::Mssql)
            .remove_constraint_query(&"users".into(), "users_email_uk", &options)
            .unwrap_err();
        assert_eq!(err.unsupported_options(), ["cascade"]);
        let err = generator(DialectKind::Sqlite)
            .remove_constraint_query(&"users".into(), "users_email_uk", &RemoveConstraintOptions::default())
            .unwrap_err();
        assert!(err.is_capability());
    }

    // ==================== setConstraintCheckingQuery ====================

    #[test]
    fn test_set_constraint_checking() {
        assert_eq!(
            generator(DialectKind::Postgres)
                .set_constraint_checking_query(&ConstraintChecking::Deferred(Vec::new()))
                .unwrap(),
            "SET CONSTRAINTS ALL DEFERRED"
        );
        assert_eq!(
            generator(DialectKind::Oracle)
                .set_constraint_checking_query(&ConstraintChecking::Immediate(vec![
                    "a_fk".to_string(),
                    "b_fk".to_string()
                ]))
                .unwrap(),
            "SET CONSTRAINTS \"a_fk\", \"b_fk\" IMMEDIATE"
        );
        assert!(
            generator(DialectKind::Mssql)
                .set_constraint_checking_query(&ConstraintChecking::Deferred(Vec::new()))
                .is_err()
        );
    }
}
