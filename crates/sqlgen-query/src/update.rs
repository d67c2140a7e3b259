//! UPDATE and arithmetic UPDATE generation.

use sqlgen_core::{Error, ModelDefinition, Result, TableRef, ValidationErrorKind, Value};

use crate::bind::{BindCollector, Statement};
use crate::expr::RenderContext;
use crate::generator::QueryGenerator;
use crate::insert::ReturnClause;
use crate::options::{ArithmeticOp, UpdateOptions};
use crate::where_clause::Where;

impl QueryGenerator {
    /// Build an `UPDATE ... SET ... WHERE ...`.
    ///
    /// Auto-increment columns are skipped on dialects that cannot update
    /// identity columns. Fails when nothing is left to set.
    pub fn update_query(
        &self,
        table: &TableRef,
        values: &[(String, Value)],
        where_: &Where,
        model: Option<&ModelDefinition>,
        options: &UpdateOptions,
    ) -> Result<Statement> {
        self.check_update_options("updateQuery", options)?;
        let supports = self.supports();
        let omit_null = self.options().omit_null;

        let mut binds = BindCollector::with_caller_binds(&options.bind)?;
        let sql = {
            let mut ctx = RenderContext {
                model,
                prefix: None,
                binds: self.options().bind_param.then_some(&mut binds),
                aliases: None,
            };

            let mut sets = Vec::new();
            for (key, value) in values {
                if omit_null && value.is_null() {
                    continue;
                }
                let attribute = model.and_then(|m| m.get(key).or_else(|| m.by_column(key)));
                if attribute.is_some_and(|a| a.auto_increment)
                    && !supports.enabled("autoIncrement.update")
                {
                    continue;
                }
                let column = attribute.map_or(key.as_str(), |a| a.column_name.as_str());
                let sql = self.render_value(value, attribute.map(|a| &a.data_type), &mut ctx)?;
                sets.push(format!("{}={sql}", self.quote_identifier(column)));
            }
            if sets.is_empty() {
                return Err(Error::validation(
                    ValidationErrorKind::MissingColumns,
                    format!("No values to update in {}", table.table_name),
                ));
            }

            let where_sql = self.where_query(where_, &mut ctx)?;
            let limit = options.limit.map(|n| format!(" LIMIT {n}"));
            self.assemble_update(table, &sets, &where_sql, limit.as_deref(), model, options)?
        };

        let statement = binds.finish(sql);
        self.log_statement("updateQuery", &table.table_name, &statement);
        Ok(statement)
    }

    /// Build an increment or decrement: `SET "col"="col"+ $sequelize_1`.
    ///
    /// `extra` holds plain assignments applied in the same statement.
    #[allow(clippy::too_many_arguments)]
    pub fn arithmetic_query(
        &self,
        op: ArithmeticOp,
        table: &TableRef,
        where_: &Where,
        amounts: &[(String, Value)],
        extra: &[(String, Value)],
        model: Option<&ModelDefinition>,
        options: &UpdateOptions,
    ) -> Result<Statement> {
        self.check_update_options("arithmeticQuery", options)?;
        let omit_null = self.options().omit_null;

        let mut binds = BindCollector::with_caller_binds(&options.bind)?;
        let sql = {
            let mut ctx = RenderContext {
                model,
                prefix: None,
                binds: self.options().bind_param.then_some(&mut binds),
                aliases: None,
            };

            let mut sets = Vec::new();
            for (key, amount) in amounts {
                let column = self.quote_identifier(model.map_or(key.as_str(), |m| m.column_for(key)));
                let amount = self.render_value(amount, None, &mut ctx)?;
                sets.push(format!("{column}={column}{} {amount}", op.as_sql()));
            }
            for (key, value) in extra {
                if omit_null && value.is_null() {
                    continue;
                }
                let attribute = model.and_then(|m| m.get(key));
                let column = attribute.map_or(key.as_str(), |a| a.column_name.as_str());
                let sql = self.render_value(value, attribute.map(|a| &a.data_type), &mut ctx)?;
                sets.push(format!("{}={sql}", self.quote_identifier(column)));
            }
            if sets.is_empty() {
                return Err(Error::validation(
                    ValidationErrorKind::MissingColumns,
                    "An arithmetic update needs at least one amount",
                ));
            }

            let where_sql = self.where_query(where_, &mut ctx)?;
            self.assemble_update(table, &sets, &where_sql, None, model, options)?
        };

        let statement = binds.finish(sql);
        self.log_statement("arithmeticQuery", &table.table_name, &statement);
        Ok(statement)
    }

    fn check_update_options(&self, operation: &str, options: &UpdateOptions) -> Result<()> {
        let supports = self.supports();
        let mut requested = Vec::new();
        if options.returning.is_some() {
            requested.push((
                "returning",
                supports.enabled("returnValues") || supports.enabled("finalTable"),
            ));
        }
        if options.limit.is_some() {
            requested.push(("limit", supports.enabled("LIMIT ON UPDATE")));
        }
        self.reject_invalid_options(operation, &requested)
    }

    fn assemble_update(
        &self,
        table: &TableRef,
        sets: &[String],
        where_sql: &str,
        limit: Option<&str>,
        model: Option<&ModelDefinition>,
        options: &UpdateOptions,
    ) -> Result<String> {
        let returning = match &options.returning {
            Some(returning) => self.return_clause(returning, model, false)?,
            None => ReturnClause::default(),
        };
        let mut sql = format!(
            "UPDATE {} SET {}{}",
            self.quote_table_name(table),
            sets.join(","),
            returning.output
        );
        if !where_sql.is_empty() {
            sql.push(' ');
            sql.push_str(where_sql);
        }
        sql.push_str(limit.unwrap_or_default());
        sql.push_str(&returning.returning);

        if self.supports().enabled("finalTable") {
            let columns = if returning.final_columns.is_empty() {
                "*"
            } else {
                returning.final_columns.as_str()
            };
            return Ok(format!("SELECT {columns} FROM FINAL TABLE ({sql});"));
        }
        Ok(format!("{sql};"))
    }
}
