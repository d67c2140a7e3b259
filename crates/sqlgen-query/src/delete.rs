//! DELETE and TRUNCATE generation.

use sqlgen_core::{ModelDefinition, Result, TableRef};

use crate::bind::{BindCollector, Statement};
use crate::expr::RenderContext;
use crate::generator::QueryGenerator;
use crate::options::{DeleteOptions, TruncateOptions};
use crate::where_clause::Where;

impl QueryGenerator {
    /// Build a `DELETE FROM ... WHERE ...`.
    ///
    /// A limit is only accepted where the dialect can bound a delete.
    pub fn delete_query(
        &self,
        table: &TableRef,
        where_: &Where,
        model: Option<&ModelDefinition>,
        options: &DeleteOptions,
    ) -> Result<Statement> {
        if options.limit.is_some() {
            self.reject_invalid_options(
                "deleteQuery",
                &[("limit", self.supports().enabled("delete.limit"))],
            )?;
        }

        let mut binds = BindCollector::new();
        let where_sql = {
            let mut ctx = RenderContext {
                model,
                prefix: None,
                binds: self.options().bind_param.then_some(&mut binds),
                aliases: None,
            };
            self.where_query(where_, &mut ctx)?
        };

        let mut sql =
            self.ops()
                .delete_statement(&self.quote_table_name(table), &where_sql, options.limit);
        if !sql.ends_with(';') {
            sql.push(';');
        }
        let statement = binds.finish(sql);
        self.log_statement("deleteQuery", &table.table_name, &statement);
        Ok(statement)
    }

    /// Statements emptying a table, in execution order.
    pub fn truncate_table_query(
        &self,
        table: &TableRef,
        options: &TruncateOptions,
    ) -> Result<Vec<String>> {
        let supports = self.supports();
        let mut requested = Vec::new();
        if options.cascade {
            requested.push(("cascade", supports.enabled("truncate.cascade")));
        }
        if options.restart_identity {
            requested.push(("restartIdentity", supports.enabled("truncate.restartIdentity")));
        }
        self.reject_invalid_options("truncateTableQuery", &requested)?;

        let statements = self
            .ops()
            .truncate_table(self, &self.quote_table_name(table), options)?;
        tracing::debug!(
            dialect = self.dialect_name(),
            table = %table.table_name,
            statements = statements.len(),
            "generating truncate"
        );
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlgen_core::{Dialect, DialectKind, GeneratorOptions, Value};

    fn generator(kind: DialectKind) -> QueryGenerator {
        QueryGenerator::for_kind(kind).unwrap()
    }

    // ==================== deleteQuery ====================

    #[test]
    fn test_delete_with_where() {
        let statement = generator(DialectKind::Postgres)
            .delete_query(&"users".into(), &Where::eq("id", 1), None, &DeleteOptions::default())
            .unwrap();
        assert_eq!(statement.sql, "DELETE FROM \"users\" WHERE \"id\" = $sequelize_1;");
        assert_eq!(statement.bind, vec![("sequelize_1".to_string(), Value::Int(1))]);
    }

    #[test]
    fn test_delete_everything() {
        let statement = generator(DialectKind::Sqlite)
            .delete_query(&"users".into(), &Where::and(vec![]), None, &DeleteOptions::default())
            .unwrap();
        assert_eq!(statement.sql, "DELETE FROM `users`;");
    }

    #[test]
    fn test_delete_limit() {
        let options = DeleteOptions::default().with_limit(10);
        let gen_inline = |kind| {
            QueryGenerator::new(
                Dialect::new(kind).unwrap(),
                GeneratorOptions::default().with_bind_param(false),
            )
            .unwrap()
        };
        assert_eq!(
            gen_inline(DialectKind::Mysql)
                .delete_query(&"users".into(), &Where::eq("id", 1), None, &options)
                .unwrap()
                .sql,
            "DELETE FROM `users` WHERE `id` = 1 LIMIT 10;"
        );
        assert_eq!(
            gen_inline(DialectKind::Mssql)
                .delete_query(&"users".into(), &Where::eq("id", 1), None, &options)
                .unwrap()
                .sql,
            "DELETE TOP(10) FROM [users] WHERE [id] = 1; SELECT @@ROWCOUNT AS AFFECTEDROWS;"
        );
        let err = generator(DialectKind::Postgres)
            .delete_query(&"users".into(), &Where::eq("id", 1), None, &options)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The following options are not supported by deleteQuery in postgres: limit"
        );
    }

    #[test]
    fn test_mssql_reports_row_count() {
        let statement = generator(DialectKind::Mssql)
            .delete_query(&"users".into(), &Where::eq("id", 1), None, &DeleteOptions::default())
            .unwrap();
        assert_eq!(
            statement.sql,
            "DELETE FROM [users] WHERE [id] = $sequelize_1; SELECT @@ROWCOUNT AS AFFECTEDROWS;"
        );
    }

    // ==================== truncateTableQuery ====================

    #[test]
    fn test_truncate() {
        let options = TruncateOptions::default();
        assert_eq!(
            generator(DialectKind::Postgres).truncate_table_query(&"users".into(), &options).unwrap(),
            ["TRUNCATE \"users\""]
        );
        assert_eq!(
            generator(DialectKind::Sqlite).truncate_table_query(&"users".into(), &options).unwrap(),
            ["DELETE FROM `users`"]
        );
    }

    #[test]
    fn test_truncate_options() {
        let options = TruncateOptions {
            cascade: true,
            restart_identity: true,
        };
        assert_eq!(
            generator(DialectKind::Postgres).truncate_table_query(&"users".into(), &options).unwrap(),
            ["TRUNCATE \"users\" RESTART IDENTITY CASCADE"]
        );
        let err = generator(DialectKind::Sqlite)
            .truncate_table_query(&"users".into(), &options)
            .unwrap_err();
        assert_eq!(err.unsupported_options(), ["cascade"]);
        let err = generator(DialectKind::Mysql)
            .truncate_table_query(&"users".into(), &options)
            .unwrap_err();
        assert_eq!(err.unsupported_options(), ["cascade", "restartIdentity"]);
    }
}
