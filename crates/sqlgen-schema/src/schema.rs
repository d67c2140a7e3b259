//! `CREATE SCHEMA` and `DROP SCHEMA`.

use sqlgen_core::{Error, Result, ValidationErrorKind};

use crate::generator::SchemaGenerator;
use crate::options::{CreateSchemaOptions, DropSchemaOptions};

impl SchemaGenerator {
    pub fn create_schema_query(&self, schema: &str, options: &CreateSchemaOptions) -> Result<String> {
        let query = self.query();
        let supports = query.supports();
        self.require_schemas()?;

        let mut requested = Vec::new();
        let flags = [
            ("authorization", options.authorization.is_some()),
            ("charset", options.charset.is_some()),
            ("collate", options.collate.is_some()),
            ("comment", options.comment.is_some()),
            ("ifNotExists", options.if_not_exists),
            ("replace", options.replace),
        ];
        for (name, set) in flags {
            if set {
                requested.push((name, supports.enabled(&format!("createSchema.{name}"))));
            }
        }
        query.reject_invalid_options("createSchemaQuery", &requested)?;
        if options.replace && options.if_not_exists {
            return Err(Error::validation(
                ValidationErrorKind::ConflictingOptions,
                "Options `replace` and `ifNotExists` in createSchemaQuery are mutually exclusive",
            ));
        }
        query.check_identifier_length(schema)?;

        let escaper = query.escaper();
        let mut sql = format!(
            "CREATE {}SCHEMA {}{}",
            if options.replace { "OR REPLACE " } else { "" },
            if options.if_not_exists { "IF NOT EXISTS " } else { "" },
            query.quote_identifier(schema)
        );
        if let Some(authorization) = &options.authorization {
            sql.push_str(&format!(" AUTHORIZATION {}", query.quote_identifier(authorization)));
        }
        if let Some(charset) = &options.charset {
            sql.push_str(&format!(" DEFAULT CHARACTER SET {}", escaper.string(charset)));
        }
        if let Some(collate) = &options.collate {
            sql.push_str(&format!(" DEFAULT COLLATE {}", escaper.string(collate)));
        }
        if let Some(comment) = &options.comment {
            sql.push_str(&format!(" COMMENT {}", escaper.string(comment)));
        }
        self.log_ddl("createSchemaQuery", schema, &sql);
        Ok(sql)
    }

    pub fn drop_schema_query(&self, schema: &str, options: &DropSchemaOptions) -> Result<String> {
        let query = self.query();
        let supports = query.supports();
        self.require_schemas()?;

        let mut requested = Vec::new();
        if options.cascade {
            requested.push(("cascade", supports.enabled("dropSchema.cascade")));
        }
        if options.if_exists {
            requested.push(("ifExists", supports.enabled("dropSchema.ifExists")));
        }
        query.reject_invalid_options("dropSchemaQuery", &requested)?;

        let sql = format!(
            "DROP SCHEMA {}{}{}",
            if options.if_exists { "IF EXISTS " } else { "" },
            query.quote_identifier(schema),
            if options.cascade { " CASCADE" } else { "" }
        );
        self.log_ddl("dropSchemaQuery", schema, &sql);
        Ok(sql)
    }

    fn require_schemas(&self) -> Result<()> {
        self.query()
            .require("schemas", || format!("Schemas are not supported in {}.", self.dialect_name()))
    }
}
