//! `CREATE INDEX` and `DROP INDEX` generation.

use sqlgen_core::identifiers::generate_index_name;
use sqlgen_core::{Error, Result, TableRef, ValidationErrorKind};
use sqlgen_query::RenderContext;

use crate::generator::SchemaGenerator;
use crate::options::{IndexField, IndexOptions, IndexTarget, RemoveIndexOptions};

/// Where the dialect writes `USING method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UsingPosition {
    /// After the index name (`INDEX name USING BTREE`)
    AfterName,
    /// After the table (`ON table USING gist`)
    AfterTable,
}

impl SchemaGenerator {
    /// Build a `CREATE INDEX`, or `ALTER TABLE ... ADD INDEX` where the
    /// dialect creates indexes through `ALTER TABLE`.
    ///
    /// Every requested option the dialect cannot honor is reported in one
    /// error.
    pub fn add_index_query(&self, table: &TableRef, options: &IndexOptions) -> Result<String> {
        self.check_indexes_supported()?;
        if options.fields.is_empty() {
            return Err(Error::validation(
                ValidationErrorKind::MissingColumns,
                "addIndexQuery requires at least one field",
            ));
        }
        self.check_index_options(options)?;
        if !options.include.is_empty() {
            self.ops().check_include(self, options.unique)?;
        }

        let query = self.query();
        let name = self.index_name_for(table, options)?;
        let name_sql = self.ops().index_name(self, table, &name);
        let table_sql = query.quote_table_name(table);
        let fields_sql = options
            .fields
            .iter()
            .map(|field| self.index_field(field, options.operator.as_deref()))
            .collect::<Result<Vec<_>>>()?
            .join(", ");

        if options.unique {
            if let Some(sql) = self.ops().unique_index(self, &table_sql, &name_sql, &fields_sql) {
                self.log_ddl("addIndexQuery", &table.table_name, &sql);
                return Ok(sql);
            }
        }

        let via_alter = query.supports().enabled("indexViaAlter");
        let using_position = match query.supports().number("index.using") {
            Some(2) => UsingPosition::AfterTable,
            _ => UsingPosition::AfterName,
        };

        let mut sql = if via_alter {
            format!("ALTER TABLE {table_sql} ADD ")
        } else {
            "CREATE ".to_string()
        };
        if options.unique {
            sql.push_str("UNIQUE ");
        }
        if let Some(index_type) = &options.index_type {
            sql.push_str(index_type);
            sql.push(' ');
        }
        sql.push_str("INDEX ");
        if options.concurrently {
            sql.push_str("CONCURRENTLY ");
        }
        if options.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&name_sql);
        let using = options.using.as_ref().map(|using| format!(" USING {using}"));
        if using_position == UsingPosition::AfterName {
            sql.push_str(using.as_deref().unwrap_or_default());
        }
        if !via_alter {
            sql.push_str(&format!(" ON {table_sql}"));
        }
        if using_position == UsingPosition::AfterTable {
            sql.push_str(using.as_deref().unwrap_or_default());
        }
        sql.push_str(&format!(" ({fields_sql})"));
        if let Some(parser) = &options.parser {
            sql.push_str(&format!(" WITH PARSER {parser}"));
        }
        if !options.include.is_empty() {
            let mut ctx = RenderContext::new();
            let include = options
                .include
                .iter()
                .map(|expr| query.format_expr(expr, &mut ctx))
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(&format!(" INCLUDE ({})", include.join(", ")));
        }
        if let Some(where_) = &options.where_ {
            let where_sql = query.where_query(where_, &mut RenderContext::new())?;
            if !where_sql.is_empty() {
                sql.push(' ');
                sql.push_str(&where_sql);
            }
        }

        self.log_ddl("addIndexQuery", &table.table_name, &sql);
        Ok(sql)
    }

    /// Build a `DROP INDEX` for a named index, or for the index created
    /// with a generated name over `fields`.
    pub fn remove_index_query(
        &self,
        table: &TableRef,
        target: &IndexTarget,
        options: &RemoveIndexOptions,
    ) -> Result<String> {
        self.check_indexes_supported()?;
        let query = self.query();
        let supports = query.supports();
        let mut requested = Vec::new();
        if options.cascade {
            requested.push(("cascade", supports.enabled("removeIndex.cascade")));
        }
        if options.concurrently {
            requested.push(("concurrently", supports.enabled("removeIndex.concurrently")));
        }
        if options.if_exists {
            requested.push(("ifExists", supports.enabled("removeIndex.ifExists")));
        }
        query.reject_invalid_options("removeIndexQuery", &requested)?;
        if options.concurrently && options.cascade {
            return Err(Error::validation(
                ValidationErrorKind::ConflictingOptions,
                "Cannot specify both concurrently and cascade options",
            ));
        }

        let name = match target {
            IndexTarget::Name(name) => {
                query.check_identifier_length(name)?;
                name.clone()
            }
            IndexTarget::Fields(fields) => {
                self.fit_identifier(generate_index_name(&table.table_name, fields, false))
            }
        };
        let sql = self.ops().drop_index(self, table, &name, options);
        self.log_ddl("removeIndexQuery", &table.table_name, &sql);
        Ok(sql)
    }

    fn check_indexes_supported(&self) -> Result<()> {
        if self.ops().supports_indexes() {
            return Ok(());
        }
        tracing::debug!(dialect = self.dialect_name(), "indexes rejected");
        Err(Error::unsupported(
            self.dialect_name(),
            "index",
            format!("Indexes are not supported by the {} dialect.", self.dialect_name()),
        ))
    }

    fn check_index_options(&self, options: &IndexOptions) -> Result<()> {
        let supports = self.query().supports();
        let columns = || {
            options.fields.iter().filter_map(|f| match f {
                IndexField::Column(column) => Some(column),
                IndexField::Expr(_) => None,
            })
        };

        let mut requested = Vec::new();
        if columns().any(|c| c.collate.is_some()) {
            requested.push(("collate", supports.enabled("index.collate")));
        }
        if options.concurrently {
            requested.push(("concurrently", supports.enabled("index.concurrently")));
        }
        if options.fields.iter().any(|f| matches!(f, IndexField::Expr(_))) {
            requested.push(("functionBased", supports.enabled("index.functionBased")));
        }
        if options.if_not_exists {
            requested.push(("ifNotExists", supports.enabled("index.ifNotExists")));
        }
        if !options.include.is_empty() {
            requested.push(("include", supports.enabled("index.include")));
        }
        if columns().any(|c| c.length.is_some()) {
            requested.push(("length", supports.enabled("index.length")));
        }
        if options.operator.is_some() || columns().any(|c| c.operator.is_some()) {
            requested.push(("operator", supports.enabled("index.operator")));
        }
        if options.parser.is_some() {
            requested.push(("parser", supports.enabled("index.parser")));
        }
        if options.index_type.is_some() {
            requested.push(("type", supports.enabled("index.type")));
        }
        if options.using.is_some() {
            requested.push(("using", supports.enabled("index.using")));
        }
        if options.where_.is_some() {
            requested.push(("where", supports.enabled("index.where")));
        }
        self.query().reject_invalid_options("addIndexQuery", &requested)?;

        let words = [
            options.index_type.as_deref(),
            options.using.as_deref(),
            options.operator.as_deref(),
            options.parser.as_deref(),
        ];
        let column_words = columns().filter_map(|c| c.operator.as_deref());
        for word in words.into_iter().flatten().chain(column_words) {
            self.check_word(word, "index option")?;
        }
        Ok(())
    }

    fn index_name_for(&self, table: &TableRef, options: &IndexOptions) -> Result<String> {
        if let Some(name) = &options.name {
            self.query().check_identifier_length(name)?;
            return Ok(name.clone());
        }
        let fields = options
            .fields
            .iter()
            .map(|field| match field {
                IndexField::Column(column) => Ok(column.name.as_str()),
                IndexField::Expr(_) => Err(Error::validation(
                    ValidationErrorKind::Invalid,
                    "The index name must be specified when indexing an expression",
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        let prefix = options
            .prefix
            .as_deref()
            .map_or_else(|| table.table_name.clone(), |p| p.replace('.', "_"));
        Ok(self.fit_identifier(generate_index_name(&prefix, &fields, options.unique)))
    }

    fn index_field(&self, field: &IndexField, operator: Option<&str>) -> Result<String> {
        let query = self.query();
        let column = match field {
            IndexField::Expr(expr) => return query.format_expr(expr, &mut RenderContext::new()),
            IndexField::Column(column) => column,
        };
        let mut sql = query.quote_identifier(&column.name);
        if let Some(collate) = &column.collate {
            sql.push_str(&format!(" COLLATE {}", query.quote_identifier(collate)));
        }
        if let Some(length) = column.length {
            sql.push_str(&format!("({length})"));
        }
        if let Some(operator) = column.operator.as_deref().or(operator) {
            sql.push(' ');
            sql.push_str(operator);
        }
        if let Some(order) = column.order {
            sql.push(' ');
            sql.push_str(order.as_sql());
        }
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::IndexColumn;
    use sqlgen_core::{DialectKind, Value};
    use sqlgen_query::{Direction, Expr, Op, Operand, Where};

    fn generator(kind: DialectKind) -> SchemaGenerator {
        SchemaGenerator::for_kind(kind).unwrap()
    }

    // ==================== addIndexQuery ====================

    #[test]
    fn test_add_index_default_name() {
        let options = IndexOptions::new(["column1", "column2"]);
        assert_eq!(
            generator(DialectKind::Postgres).add_index_query(&"table".into(), &options).unwrap(),
            "CREATE INDEX \"table_column1_column2\" ON \"table\" (\"column1\", \"column2\")"
        );
        assert_eq!(
            generator(DialectKind::Mssql).add_index_query(&"table".into(), &options).unwrap(),
            "CREATE INDEX [table_column1_column2] ON [table] ([column1], [column2])"
        );
    }

    #[test]
    fn test_add_index_via_alter_table() {
        let options = IndexOptions::new(["column1", "column2"]);
        assert_eq!(
            generator(DialectKind::Mysql).add_index_query(&"table".into(), &options).unwrap(),
            "ALTER TABLE `table` ADD INDEX `table_column1_column2` (`column1`, `column2`)"
        );
        let fulltext = IndexOptions::new(["title"]).with_type("FULLTEXT");
        assert_eq!(
            generator(DialectKind::Mariadb).add_index_query(&"posts".into(), &fulltext).unwrap(),
            "ALTER TABLE `posts` ADD FULLTEXT INDEX `posts_title` (`title`)"
        );
    }

    #[test]
    fn test_add_index_name_from_camel_case() {
        let options = IndexOptions::new(["userId"]).unique();
        assert_eq!(
            generator(DialectKind::Sqlite).add_index_query(&"myTable".into(), &options).unwrap(),
            "CREATE UNIQUE INDEX `my_table_user_id_unique` ON `myTable` (`userId`)"
        );
    }

    #[test]
    fn test_add_index_prefix_and_explicit_name() {
        let prefixed = IndexOptions::new(["a"]).with_prefix("schema.table");
        assert_eq!(
            generator(DialectKind::Postgres).add_index_query(&"table".into(), &prefixed).unwrap(),
            "CREATE INDEX \"schema_table_a\" ON \"table\" (\"a\")"
        );
        let named = IndexOptions::new(["a"]).with_name("my_index");
        assert_eq!(
            generator(DialectKind::Postgres).add_index_query(&"table".into(), &named).unwrap(),
            "CREATE INDEX \"my_index\" ON \"table\" (\"a\")"
        );
    }

    #[test]
    fn test_add_index_collate() {
        let options = IndexOptions::new([IndexColumn::new("column1").collate("en_US")]);
        assert_eq!(
            generator(DialectKind::Sqlite).add_index_query(&"table".into(), &options).unwrap(),
            "CREATE INDEX `table_column1` ON `table` (`column1` COLLATE `en_US`)"
        );
        let err = generator(DialectKind::Mssql)
            .add_index_query(&"table".into(), &options)
            .unwrap_err();
        assert!(err.is_capability());
        assert_eq!(err.unsupported_options(), ["collate"]);
        assert_eq!(
            err.to_string(),
            "The following options are not supported by addIndexQuery in mssql: collate"
        );
    }

    #[test]
    fn test_add_index_reports_every_unsupported_option() {
        let options = IndexOptions::new([IndexColumn::new("a").collate("C").length(4)])
            .concurrently()
            .with_where(Where::eq("a", 1));
        let err = generator(DialectKind::Mssql)
            .add_index_query(&"t".into(), &options)
            .unwrap_err();
        assert_eq!(err.unsupported_options(), ["collate", "concurrently", "length"]);
    }

    #[test]
    fn test_add_index_length_and_order() {
        let options = IndexOptions::new([IndexColumn::new("title").length(7).order(Direction::Desc)]);
        assert_eq!(
            generator(DialectKind::Mysql).add_index_query(&"posts".into(), &options).unwrap(),
            "ALTER TABLE `posts` ADD INDEX `posts_title` (`title`(7) DESC)"
        );
    }

    #[test]
    fn test_add_index_using() {
        let options = IndexOptions::new(["a"]).with_using("BTREE");
        assert_eq!(
            generator(DialectKind::Mysql).add_index_query(&"t".into(), &options).unwrap(),
            "ALTER TABLE `t` ADD INDEX `t_a` USING BTREE (`a`)"
        );
        let options = IndexOptions::new(["area"]).with_using("gist");
        assert_eq!(
            generator(DialectKind::Postgres).add_index_query(&"t".into(), &options).unwrap(),
            "CREATE INDEX \"t_area\" ON \"t\" USING gist (\"area\")"
        );
        let err = generator(DialectKind::Sqlite)
            .add_index_query(&"t".into(), &options)
            .unwrap_err();
        assert_eq!(err.unsupported_options(), ["using"]);
    }

    #[test]
    fn test_add_index_rejects_invalid_words() {
        let options = IndexOptions::new(["a"]).with_using("gist; DROP TABLE t");
        let err = generator(DialectKind::Postgres)
            .add_index_query(&"t".into(), &options)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_add_index_postgres_options() {
        let options = IndexOptions::new(["status"])
            .concurrently()
            .if_not_exists()
            .with_where(Where::eq("status", "active"));
        assert_eq!(
            generator(DialectKind::Postgres).add_index_query(&"orders".into(), &options).unwrap(),
            "CREATE INDEX CONCURRENTLY IF NOT EXISTS \"orders_status\" ON \"orders\" (\"status\") WHERE \"status\" = 'active'"
        );
        let partial = IndexOptions::new(["total"])
            .with_where(Where::op("total", Op::Gt, Operand::value(Value::Int(100))));
        assert_eq!(
            generator(DialectKind::Sqlite).add_index_query(&"orders".into(), &partial).unwrap(),
            "CREATE INDEX `orders_total` ON `orders` (`total`) WHERE `total` > 100"
        );
    }

    #[test]
    fn test_add_index_operator_class() {
        let options = IndexOptions::new(["ip"]).with_operator("inet_ops");
        assert_eq!(
            generator(DialectKind::Postgres).add_index_query(&"hosts".into(), &options).unwrap(),
            "CREATE INDEX \"hosts_ip\" ON \"hosts\" (\"ip\" inet_ops)"
        );
        let mixed = IndexOptions::new([
            IndexColumn::new("a").operator("text_pattern_ops"),
            IndexColumn::new("b"),
        ])
        .with_operator("varchar_ops");
        assert_eq!(
            generator(DialectKind::Postgres).add_index_query(&"t".into(), &mixed).unwrap(),
            "CREATE INDEX \"t_a_b\" ON \"t\" (\"a\" text_pattern_ops, \"b\" varchar_ops)"
        );
    }

    #[test]
    fn test_add_index_include() {
        let options = IndexOptions::new(["a"]).unique().with_include([Expr::col("b")]);
        assert_eq!(
            generator(DialectKind::Postgres).add_index_query(&"t".into(), &options).unwrap(),
            "CREATE UNIQUE INDEX \"t_a_unique\" ON \"t\" (\"a\") INCLUDE (\"b\")"
        );
        let err = generator(DialectKind::Mysql)
            .add_index_query(&"t".into(), &options)
            .unwrap_err();
        assert_eq!(err.unsupported_options(), ["include"]);
    }

    #[test]
    fn test_add_index_db2_include_requires_unique() {
        let options = IndexOptions::new(["a"]).with_include([Expr::col("b")]);
        let err = generator(DialectKind::Db2)
            .add_index_query(&"t".into(), &options)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "DB2 does not support non-unique indexes with INCLUDE syntax."
        );
        assert_eq!(
            generator(DialectKind::Db2)
                .add_index_query(&"t".into(), &options.unique())
                .unwrap(),
            "CREATE UNIQUE INDEX \"t_a_unique\" ON \"t\" (\"a\") INCLUDE (\"b\")"
        );
    }

    #[test]
    fn test_add_index_function_based() {
        let options = IndexOptions::new([Expr::func("lower", [Expr::col("email")])])
            .with_name("users_lower_email");
        assert_eq!(
            generator(DialectKind::Postgres).add_index_query(&"users".into(), &options).unwrap(),
            "CREATE INDEX \"users_lower_email\" ON \"users\" (lower(\"email\"))"
        );
        let unnamed = IndexOptions::new([Expr::func("lower", [Expr::col("email")])]);
        assert!(
            generator(DialectKind::Postgres)
                .add_index_query(&"users".into(), &unnamed)
                .unwrap_err()
                .is_validation()
        );
        let err = generator(DialectKind::Mysql)
            .add_index_query(&"users".into(), &options)
            .unwrap_err();
        assert_eq!(err.unsupported_options(), ["functionBased"]);
    }

    #[test]
    fn test_add_index_long_name_is_shortened() {
        let fields: Vec<String> = (0..8).map(|i| format!("a_rather_long_column_{i}")).collect();
        let options = IndexOptions::new(fields.clone());
        let sql = generator(DialectKind::Postgres)
            .add_index_query(&"t".into(), &options)
            .unwrap();
        let name = sql
            .strip_prefix("CREATE INDEX \"")
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        assert_eq!(name.len(), 63);
        assert!(name.starts_with("t_a_rather_long_column_0"));
        assert_eq!(
            sql,
            generator(DialectKind::Postgres).add_index_query(&"t".into(), &options).unwrap()
        );
    }

    #[test]
    fn test_add_index_explicit_name_too_long() {
        let options = IndexOptions::new(["a"]).with_name("x".repeat(70));
        let err = generator(DialectKind::Postgres)
            .add_index_query(&"t".into(), &options)
            .unwrap_err();
        assert!(err.is_identifier_length());
    }

    #[test]
    fn test_add_index_db2_schema_qualified_name() {
        let table = TableRef::new("t").with_schema("app");
        assert_eq!(
            generator(DialectKind::Db2)
                .add_index_query(&table, &IndexOptions::new(["a"]))
                .unwrap(),
            "CREATE INDEX \"app\".\"t_a\" ON \"app\".\"t\" (\"a\")"
        );
    }

    #[test]
    fn test_add_index_ibmi_unique_uses_constraint() {
        let options = IndexOptions::new(["a"]).unique();
        assert_eq!(
            generator(DialectKind::Ibmi).add_index_query(&"t".into(), &options).unwrap(),
            "BEGIN DECLARE CONTINUE HANDLER FOR SQLSTATE VALUE '42891' BEGIN END; ALTER TABLE \"t\" ADD CONSTRAINT \"t_a_unique\" UNIQUE (\"a\"); END"
        );
    }

    #[test]
    fn test_add_index_snowflake() {
        let err = generator(DialectKind::Snowflake)
            .add_index_query(&"t".into(), &IndexOptions::new(["a"]))
            .unwrap_err();
        assert!(err.is_capability());
        assert_eq!(err.to_string(), "Indexes are not supported by the snowflake dialect.");
    }

    #[test]
    fn test_add_index_requires_fields() {
        let err = generator(DialectKind::Postgres)
            .add_index_query(&"t".into(), &IndexOptions::default())
            .unwrap_err();
        assert!(err.is_validation());
    }

    // ==================== removeIndexQuery ====================

    #[test]
    fn test_remove_index_by_name() {
        let options = RemoveIndexOptions::default();
        let target = IndexTarget::from("t_a");
        assert_eq!(
            generator(DialectKind::Postgres).remove_index_query(&"t".into(), &target, &options).unwrap(),
            "DROP INDEX \"t_a\""
        );
        assert_eq!(
            generator(DialectKind::Mysql).remove_index_query(&"t".into(), &target, &options).unwrap(),
            "DROP INDEX `t_a` ON `t`"
        );
        assert_eq!(
            generator(DialectKind::Mssql).remove_index_query(&"t".into(), &target, &options).unwrap(),
            "DROP INDEX [t_a] ON [t]"
        );
        assert_eq!(
            generator(DialectKind::Sqlite).remove_index_query(&"t".into(), &target, &options).unwrap(),
            "DROP INDEX `t_a`"
        );
    }

    #[test]
    fn test_remove_index_by_fields() {
        let target = IndexTarget::Fields(vec!["column1".into(), "column2".into()]);
        assert_eq!(
            generator(DialectKind::Sqlite)
                .remove_index_query(&"table".into(), &target, &RemoveIndexOptions::default())
                .unwrap(),
            "DROP INDEX `table_column1_column2`"
        );
    }

    #[test]
    fn test_remove_index_postgres_options() {
        let table = TableRef::new("t").with_schema("app");
        let options = RemoveIndexOptions {
            concurrently: true,
            if_exists: true,
            cascade: false,
        };
        assert_eq!(
            generator(DialectKind::Postgres)
                .remove_index_query(&table, &IndexTarget::from("t_a"), &options)
                .unwrap(),
            "DROP INDEX CONCURRENTLY IF EXISTS \"app\".\"t_a\""
        );
        let options = RemoveIndexOptions {
            cascade: true,
            ..RemoveIndexOptions::default()
        };
        assert_eq!(
            generator(DialectKind::Postgres)
                .remove_index_query(&"t".into(), &IndexTarget::from("t_a"), &options)
                .unwrap(),
            "DROP INDEX \"t_a\" CASCADE"
        );
    }

    #[test]
    fn test_remove_index_conflicting_and_unsupported() {
        let both = RemoveIndexOptions {
            concurrently: true,
            cascade: true,
            if_exists: false,
        };
        let err = generator(DialectKind::Postgres)
            .remove_index_query(&"t".into(), &IndexTarget::from("t_a"), &both)
            .unwrap_err();
        assert!(err.is_validation());

        let if_exists = RemoveIndexOptions {
            if_exists: true,
            ..RemoveIndexOptions::default()
        };
        let err = generator(DialectKind::Mysql)
            .remove_index_query(&"t".into(), &IndexTarget::from("t_a"), &if_exists)
            .unwrap_err();
        assert_eq!(err.unsupported_options(), ["ifExists"]);
        assert_eq!(
            generator(DialectKind::Mariadb)
                .remove_index_query(&"t".into(), &IndexTarget::from("t_a"), &if_exists)
                .unwrap(),
            "DROP INDEX IF EXISTS `t_a` ON `t`"
        );
    }
}
