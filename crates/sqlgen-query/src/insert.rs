//! INSERT, bulk INSERT and upsert generation.
//!
//! Values are keyed by attribute name or column name; with a model, keys
//! are resolved to columns and typed by their attribute.

use sqlgen_core::{
    Attribute, DataType, Error, ModelDefinition, Result, TableRef, ValidationErrorKind, Value,
};

use crate::bind::{BindCollector, Statement};
use crate::expr::RenderContext;
use crate::generator::QueryGenerator;
use crate::options::{InsertOptions, Returning};

const ON_CONFLICT_DO_UPDATE: &str = " ON CONFLICT DO UPDATE SET";

/// A returned column and its type, when known.
#[derive(Debug)]
struct ReturnField {
    sql: String,
    data_type: Option<DataType>,
}

/// The pieces a `returning` request adds around an INSERT.
#[derive(Debug, Default)]
pub(crate) struct ReturnClause {
    /// `DECLARE @output_table ...;` prepended to the statement
    pub declare: String,
    /// ` OUTPUT INSERTED...` placed before `VALUES`
    pub output: String,
    /// ` RETURNING ...` appended to the statement
    pub returning: String,
    /// `;SELECT * FROM @output_table` appended after the statement
    pub tail: String,
    /// Column list of `SELECT ... FROM FINAL TABLE (...)`
    pub final_columns: String,
}

fn resolve<'m>(model: Option<&'m ModelDefinition>, key: &str) -> Option<&'m Attribute> {
    model.and_then(|m| m.get(key).or_else(|| m.by_column(key)))
}

/// The value a bulk row holds for `column`.
fn cell<'r>(model: Option<&ModelDefinition>, row: &'r [(String, Value)], column: &str) -> Option<&'r Value> {
    row.iter()
        .find(|(key, _)| column_of(model, key) == column)
        .map(|(_, value)| value)
}

fn column_of<'a>(model: Option<&'a ModelDefinition>, key: &'a str) -> &'a str {
    resolve(model, key).map_or(key, |a| a.column_name.as_str())
}

impl QueryGenerator {
    /// Build a single-row `INSERT`.
    ///
    /// A `NULL` auto-increment column becomes `DEFAULT` (or is dropped where
    /// the dialect cannot name it); an explicit value for it on MSSQL wraps
    /// the statement in `SET IDENTITY_INSERT`.
    pub fn insert_query(
        &self,
        table: &TableRef,
        values: &[(String, Value)],
        model: Option<&ModelDefinition>,
        options: &InsertOptions,
    ) -> Result<Statement> {
        let statement = self.build_insert("insertQuery", table, values, model, options)?;
        self.log_statement("insertQuery", &table.table_name, &statement);
        Ok(statement)
    }

    /// Build a multi-row `INSERT`. Values are always inlined.
    ///
    /// The column list is the union of every row's keys in first-seen order;
    /// a row without a column gets `DEFAULT`, or `NULL` on dialects without
    /// the keyword.
    pub fn bulk_insert_query(
        &self,
        table: &TableRef,
        rows: &[Vec<(String, Value)>],
        model: Option<&ModelDefinition>,
        options: &InsertOptions,
    ) -> Result<Statement> {
        self.check_insert_options("bulkInsertQuery", options)?;
        let supports = self.supports();
        let omit_null = self.options().omit_null;

        let mut columns: Vec<&str> = Vec::new();
        for row in rows {
            for (key, value) in row {
                if omit_null && value.is_null() {
                    continue;
                }
                let column = column_of(model, key);
                if !columns.contains(&column) {
                    columns.push(column);
                }
            }
        }
        if columns.is_empty() {
            return Err(Error::validation(
                ValidationErrorKind::MissingColumns,
                "No columns were defined",
            ));
        }

        let mut identity_insert = false;
        if supports.enabled("autoIncrement.identityInsert") {
            for &column in &columns {
                if !resolve(model, column).is_some_and(|a| a.auto_increment) {
                    continue;
                }
                let present = rows
                    .iter()
                    .filter(|row| cell(model, row, column).is_some_and(|v| !v.is_null()))
                    .count();
                if present > 0 && present < rows.len() {
                    return Err(Error::validation(
                        ValidationErrorKind::Invalid,
                        format!(
                            "Cannot insert a mixture of null and non-null values into an autoIncrement column ({column})."
                        ),
                    ));
                }
                identity_insert |= present > 0;
            }
        }

        let default = if supports.enabled("DEFAULT") { "DEFAULT" } else { "NULL" };
        let escaper = self.escaper();
        let mut tuples = Vec::with_capacity(rows.len());
        for row in rows {
            let mut cells = Vec::with_capacity(columns.len());
            for &column in &columns {
                let attribute = resolve(model, column);
                let sql = match cell(model, row, column) {
                    None => default.to_string(),
                    Some(value) if value.is_null() && attribute.is_some_and(|a| a.auto_increment) => {
                        default.to_string()
                    }
                    Some(value) => escaper.value(value, attribute.map(|a| &a.data_type))?,
                };
                cells.push(sql);
            }
            tuples.push(format!("({})", cells.join(",")));
        }

        let returning = match &options.returning {
            Some(returning) => self.return_clause(returning, model, true)?,
            None => ReturnClause::default(),
        };

        let column_sql: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();
        let mut sql = format!(
            "{}INSERT{} INTO {} ({}){} VALUES {}",
            returning.declare,
            self.ignore_keyword(options),
            self.quote_table_name(table),
            column_sql.join(","),
            returning.output,
            tuples.join(",")
        );
        sql.push_str(&self.conflict_clause(options, model, None, &mut RenderContext::new())?);
        sql.push_str(&self.do_nothing_clause(options));
        sql.push_str(&returning.returning);
        sql.push_str(&returning.tail);

        let sql = self.finish_insert(
            sql,
            table,
            options.returning.is_some(),
            &returning,
            identity_insert,
        );
        let statement = Statement::new(sql);
        self.log_statement("bulkInsertQuery", &table.table_name, &statement);
        Ok(statement)
    }

    /// Build a single-row insert-or-update.
    ///
    /// `update_values` names the columns overwritten when the row exists.
    /// The conflict target is `options.upsert_keys`, or the model's primary
    /// key.
    pub fn upsert_query(
        &self,
        table: &TableRef,
        insert_values: &[(String, Value)],
        update_values: &[(String, Value)],
        model: Option<&ModelDefinition>,
        options: &InsertOptions,
    ) -> Result<Statement> {
        let statement =
            self.ops()
                .upsert(self, table, insert_values, update_values, model, options)?;
        self.log_statement("upsertQuery", &table.table_name, &statement);
        Ok(statement)
    }

    /// Upsert as an `INSERT` with an `ON CONFLICT` or `ON DUPLICATE KEY`
    /// clause.
    pub(crate) fn upsert_via_insert(
        &self,
        table: &TableRef,
        insert_values: &[(String, Value)],
        update_values: &[(String, Value)],
        model: Option<&ModelDefinition>,
        options: &InsertOptions,
    ) -> Result<Statement> {
        self.require("upserts", || {
            format!("Upserts are not supported by {}.", self.dialect_name())
        })?;
        let mut options = options.clone();
        options.update_on_duplicate = Some(
            update_values
                .iter()
                .map(|(key, _)| column_of(model, key).to_string())
                .collect(),
        );
        if options.upsert_keys.is_empty() {
            options.upsert_keys = model
                .map(|m| {
                    m.primary_key_attributes()
                        .map(|a| a.column_name.clone())
                        .collect()
                })
                .unwrap_or_default();
        }
        if options.upsert_keys.is_empty() {
            return Err(Error::validation(
                ValidationErrorKind::MissingColumns,
                "Primary Key or Unique key should be passed to upsert query",
            ));
        }
        self.build_insert("upsertQuery", table, insert_values, model, &options)
    }

    fn build_insert(
        &self,
        operation: &str,
        table: &TableRef,
        values: &[(String, Value)],
        model: Option<&ModelDefinition>,
        options: &InsertOptions,
    ) -> Result<Statement> {
        self.check_insert_options(operation, options)?;
        let supports = self.supports();
        let omit_null = self.options().omit_null;

        let mut binds = BindCollector::with_caller_binds(&options.bind)?;
        let mut columns: Vec<(String, String)> = Vec::new();
        let mut identity_insert = false;
        let sql = {
            let mut ctx = RenderContext {
                model,
                prefix: None,
                binds: self.options().bind_param.then_some(&mut binds),
                aliases: None,
            };

            for (key, value) in values {
                if omit_null && value.is_null() {
                    continue;
                }
                let attribute = resolve(model, key);
                let column = attribute.map_or(key.as_str(), |a| a.column_name.as_str());
                if attribute.is_some_and(|a| a.auto_increment) {
                    if value.is_null() {
                        if !supports.enabled("autoIncrement.defaultValue") {
                            continue;
                        }
                        let default = if supports.enabled("DEFAULT") { "DEFAULT" } else { "NULL" };
                        columns.push((column.to_string(), default.to_string()));
                        continue;
                    }
                    identity_insert = true;
                }
                let sql = self.render_value(value, attribute.map(|a| &a.data_type), &mut ctx)?;
                columns.push((column.to_string(), sql));
            }

            let returning = match &options.returning {
                Some(returning) => self.return_clause(returning, model, options.has_trigger)?,
                None => ReturnClause::default(),
            };

            let mut sql = format!(
                "{}INSERT{} INTO {}",
                returning.declare,
                self.ignore_keyword(options),
                self.quote_table_name(table)
            );
            if columns.is_empty() {
                sql.push_str(&returning.output);
                if supports.enabled("DEFAULT VALUES") {
                    sql.push_str(" DEFAULT VALUES");
                } else if supports.enabled("VALUES ()") {
                    sql.push_str(" VALUES ()");
                } else {
                    return Err(Error::validation(
                        ValidationErrorKind::MissingColumns,
                        format!(
                            "{} cannot insert a row without any column values",
                            self.dialect_name()
                        ),
                    ));
                }
            } else {
                let names: Vec<String> =
                    columns.iter().map(|(c, _)| self.quote_identifier(c)).collect();
                let values: Vec<&str> = columns.iter().map(|(_, v)| v.as_str()).collect();
                sql.push_str(&format!(
                    " ({}){} VALUES ({})",
                    names.join(","),
                    returning.output,
                    values.join(",")
                ));
            }
            sql.push_str(&self.conflict_clause(options, model, Some(columns.as_slice()), &mut ctx)?);
            sql.push_str(&self.do_nothing_clause(options));
            sql.push_str(&returning.returning);
            sql.push_str(&returning.tail);

            self.finish_insert(sql, table, true, &returning, identity_insert)
        };

        Ok(binds.finish(sql))
    }

    /// Reject every insert option the dialect cannot honor in one error.
    fn check_insert_options(&self, operation: &str, options: &InsertOptions) -> Result<()> {
        let supports = self.supports();
        let mut requested = Vec::new();
        if options.ignore_duplicates {
            requested.push((
                "ignoreDuplicates",
                supports.enabled("inserts.ignoreDuplicates")
                    || supports.enabled("inserts.onConflictDoNothing"),
            ));
        }
        if options.update_on_duplicate.is_some() {
            requested.push(("updateOnDuplicate", supports.enabled("inserts.updateOnDuplicate")));
        }
        if options.returning.is_some() {
            requested.push((
                "returning",
                supports.enabled("returnValues") || supports.enabled("finalTable"),
            ));
        }
        if options.conflict_where.as_ref().is_some_and(|w| !w.is_empty()) {
            requested.push(("conflictWhere", supports.enabled("inserts.onConflictWhere")));
        }
        self.reject_invalid_options(operation, &requested)?;

        if options.ignore_duplicates && options.update_on_duplicate.is_some() {
            return Err(Error::validation(
                ValidationErrorKind::ConflictingOptions,
                "Options ignoreDuplicates and updateOnDuplicate cannot be used together",
            ));
        }
        Ok(())
    }

    fn ignore_keyword(&self, options: &InsertOptions) -> &str {
        if options.ignore_duplicates {
            self.supports().text("inserts.ignoreDuplicates").unwrap_or_default()
        } else {
            ""
        }
    }

    fn do_nothing_clause(&self, options: &InsertOptions) -> String {
        if options.ignore_duplicates {
            self.supports()
                .text("inserts.onConflictDoNothing")
                .unwrap_or_default()
                .to_string()
        } else {
            String::new()
        }
    }

    /// `ON CONFLICT (...) DO UPDATE SET` or `ON DUPLICATE KEY UPDATE`.
    ///
    /// `inserted` holds the rendered values of a single-row insert; MySQL
    /// reuses them, bulk inserts refer to `VALUES(col)` instead.
    fn conflict_clause(
        &self,
        options: &InsertOptions,
        model: Option<&ModelDefinition>,
        inserted: Option<&[(String, String)]>,
        ctx: &mut RenderContext<'_>,
    ) -> Result<String> {
        let Some(update) = &options.update_on_duplicate else {
            return Ok(String::new());
        };
        let keyword = self
            .supports()
            .text("inserts.updateOnDuplicate")
            .unwrap_or_default();
        let update: Vec<String> = update
            .iter()
            .map(|c| self.quote_identifier(column_of(model, c)))
            .collect();
        let keys: Vec<String> = options
            .upsert_keys
            .iter()
            .map(|c| self.quote_identifier(column_of(model, c)))
            .collect();

        if keyword == ON_CONFLICT_DO_UPDATE {
            if keys.is_empty() {
                return Err(Error::validation(
                    ValidationErrorKind::MissingColumns,
                    "updateOnDuplicate requires upsertKeys to name the conflict target",
                ));
            }
            let mut sql = format!(" ON CONFLICT ({})", keys.join(","));
            if let Some(where_) = options.conflict_where.as_ref().filter(|w| !w.is_empty()) {
                sql.push(' ');
                sql.push_str(&self.where_query(where_, ctx)?);
            }
            if update.is_empty() {
                sql.push_str(" DO NOTHING");
            } else {
                let sets: Vec<String> = update.iter().map(|c| format!("{c}=EXCLUDED.{c}")).collect();
                sql.push_str(&format!(" DO UPDATE SET {}", sets.join(",")));
            }
            return Ok(sql);
        }

        let mut sets: Vec<String> = options
            .update_on_duplicate
            .iter()
            .flatten()
            .zip(&update)
            .map(|(name, quoted)| {
                let column = column_of(model, name);
                let value = inserted
                    .and_then(|cols| cols.iter().find(|(c, _)| c == column))
                    .map_or_else(|| format!("VALUES({quoted})"), |(_, v)| v.clone());
                format!("{quoted}={value}")
            })
            .collect();
        if sets.is_empty() {
            sets = keys.iter().map(|k| format!("{k}={k}")).collect();
        }
        if sets.is_empty() {
            return Err(Error::validation(
                ValidationErrorKind::MissingColumns,
                "No update values found for ON DUPLICATE KEY UPDATE clause, and no identifier fields could be found to use instead.",
            ));
        }
        Ok(format!("{keyword} {}", sets.join(",")))
    }

    /// Columns a `returning` request names: the listed columns, or every
    /// model column, or `*`.
    fn return_fields(
        &self,
        returning: &Returning,
        model: Option<&ModelDefinition>,
    ) -> Vec<ReturnField> {
        match returning {
            Returning::Columns(columns) => columns
                .iter()
                .map(|c| {
                    let attribute = resolve(model, c);
                    let column = attribute.map_or(c.as_str(), |a| a.column_name.as_str());
                    ReturnField {
                        sql: if column == "*" {
                            column.to_string()
                        } else {
                            self.quote_identifier(column)
                        },
                        data_type: attribute.map(|a| a.data_type.clone()),
                    }
                })
                .collect(),
            Returning::All => model
                .map(|m| {
                    m.attributes
                        .iter()
                        .map(|a| ReturnField {
                            sql: self.quote_identifier(&a.column_name),
                            data_type: Some(a.data_type.clone()),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Render a `returning` request for the dialect.
    ///
    /// With `capture` set, MSSQL routes `OUTPUT` into a table variable so
    /// tables with triggers (and multi-row inserts) can return rows.
    pub(crate) fn return_clause(
        &self,
        returning: &Returning,
        model: Option<&ModelDefinition>,
        capture: bool,
    ) -> Result<ReturnClause> {
        let fields = self.return_fields(returning, model);
        let named = !fields.is_empty() && fields.iter().all(|f| f.sql != "*");
        let list = if fields.is_empty() {
            "*".to_string()
        } else {
            fields.iter().map(|f| f.sql.as_str()).collect::<Vec<_>>().join(", ")
        };

        let mut clause = ReturnClause::default();
        match self.supports().text("returnValues") {
            Some("returning") => clause.returning = format!(" RETURNING {list}"),
            Some("output") => {
                if !named && capture {
                    return Err(Error::validation(
                        ValidationErrorKind::MissingColumns,
                        "Cannot use \"returning\" option with no attributes",
                    ));
                }
                if !named {
                    clause.output = " OUTPUT INSERTED.*".to_string();
                    return Ok(clause);
                }
                let inserted: Vec<String> =
                    fields.iter().map(|f| format!("INSERTED.{}", f.sql)).collect();
                clause.output = format!(" OUTPUT {}", inserted.join(", "));
                if capture && self.supports().enabled("tmpTableTrigger") {
                    let declared: Vec<String> = fields
                        .iter()
                        .map(|f| {
                            let sql_type = f
                                .data_type
                                .as_ref()
                                .unwrap_or(&DataType::Text)
                                .to_sql(self.kind());
                            format!("{} {sql_type}", f.sql)
                        })
                        .collect();
                    clause.declare =
                        format!("DECLARE @output_table TABLE ({});", declared.join(", "));
                    clause.output.push_str(" INTO @output_table");
                    clause.tail = ";SELECT * FROM @output_table".to_string();
                }
            }
            _ => clause.final_columns = list,
        }
        Ok(clause)
    }

    /// Terminate an INSERT and apply the statement-level wrappers.
    fn finish_insert(
        &self,
        sql: String,
        table: &TableRef,
        wrap_final: bool,
        returning: &ReturnClause,
        identity_insert: bool,
    ) -> String {
        let supports = self.supports();
        let mut sql = if wrap_final && supports.enabled("finalTable") {
            let columns = if returning.final_columns.is_empty() {
                "*"
            } else {
                returning.final_columns.as_str()
            };
            format!("SELECT {columns} FROM FINAL TABLE ({sql});")
        } else {
            format!("{sql};")
        };
        if identity_insert && supports.enabled("autoIncrement.identityInsert") {
            let table_sql = self.quote_table_name(table);
            sql = format!(
                "SET IDENTITY_INSERT {table_sql} ON; {sql} SET IDENTITY_INSERT {table_sql} OFF;"
            );
        }
        sql
    }
}
