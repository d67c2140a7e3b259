//! The query generator and its per-dialect hooks.
//!
//! [`QueryGenerator`] holds everything a statement needs: the dialect with
//! its capability tree, the generator options and the dialect's
//! [`QueryGeneratorOps`]. Shared statement assembly lives on the generator;
//! only the syntax that differs per dialect goes through the ops trait.

mod db2;
mod mssql;
mod mysql;
mod oracle;
mod postgres;
mod snowflake;
mod sqlite;
mod vertica;

use std::fmt;
use std::sync::LazyLock;

use chrono::FixedOffset;
use regex::Regex;
use sqlgen_core::{
    CapabilityError, CapabilityTree, Dialect, DialectKind, Error, GeneratorOptions,
    IdentifierLengthError, ModelDefinition, Result, TableRef, Value,
};

use crate::bind::Statement;
use crate::escape::Escaper;
use crate::expr::JsonSegment;
use crate::options::{
    InsertOptions, IsolationLevel, StartTransactionOptions, TruncateOptions,
};

pub use db2::Db2Ops;
pub use mssql::MssqlOps;
pub use mysql::{MariadbOps, MysqlOps};
pub use oracle::OracleOps;
pub use postgres::PostgresOps;
pub use snowflake::SnowflakeOps;
pub use sqlite::SqliteOps;
pub use vertica::VerticaOps;

static BARE_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("static regex"));

static BARE_JSON_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"));

/// Words that stay quoted even when identifier quoting is off.
const RESERVED_WORDS: &[&str] = &[
    "all", "and", "as", "asc", "between", "by", "case", "check", "column", "constraint",
    "create", "default", "delete", "desc", "distinct", "drop", "else", "end", "from", "group",
    "having", "in", "index", "insert", "into", "is", "join", "key", "like", "limit", "not",
    "null", "offset", "on", "or", "order", "primary", "references", "select", "set", "table",
    "then", "to", "union", "unique", "update", "user", "using", "values", "when", "where",
];

/// Dialect-specific statement syntax.
///
/// Every hook has a default that matches the most common syntax; each
/// dialect overrides what it spells differently.
pub trait QueryGeneratorOps: Send + Sync + fmt::Debug {
    fn kind(&self) -> DialectKind;

    /// Pagination suffix including its leading space.
    fn limit_fragment(
        &self,
        _gen: &QueryGenerator,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<String> {
        let offset = offset.filter(|o| *o > 0);
        Ok(match (limit, offset) {
            (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!(" LIMIT {limit}"),
            (None, Some(offset)) => format!(" OFFSET {offset}"),
            (None, None) => String::new(),
        })
    }

    /// ORDER BY term used when pagination needs an order and nothing else
    /// provides one.
    fn fallback_order(&self) -> Option<&'static str> {
        None
    }

    /// Extract `path` from the JSON document `sql`.
    fn json_path_extraction(
        &self,
        generator: &QueryGenerator,
        _sql: &str,
        _path: &[JsonSegment],
        _unquote: bool,
    ) -> Result<String> {
        Err(json_unsupported(generator))
    }

    /// Unquote the JSON document `sql` into SQL text.
    fn unquote_json(&self, generator: &QueryGenerator, _sql: &str) -> Result<String> {
        Err(json_unsupported(generator))
    }

    /// Seconds since the epoch of a date-time expression.
    fn unix_timestamp(&self, generator: &QueryGenerator, _sql: &str) -> Result<String> {
        Err(Error::unsupported(
            generator.dialect_name(),
            "unixTimestamp",
            format!("unix timestamps are not supported by {}", generator.dialect_name()),
        ))
    }

    /// Statements emptying `table` (already quoted).
    fn truncate_table(
        &self,
        _gen: &QueryGenerator,
        table: &str,
        options: &TruncateOptions,
    ) -> Result<Vec<String>> {
        let mut sql = format!("TRUNCATE {table}");
        if options.restart_identity {
            sql.push_str(" RESTART IDENTITY");
        }
        if options.cascade {
            sql.push_str(" CASCADE");
        }
        Ok(vec![sql])
    }

    /// `DELETE` statement for an already compiled WHERE fragment.
    fn delete_statement(&self, table: &str, where_sql: &str, limit: Option<u64>) -> String {
        let mut sql = format!("DELETE FROM {table}");
        if !where_sql.is_empty() {
            sql.push(' ');
            sql.push_str(where_sql);
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql
    }

    fn start_transaction(
        &self,
        generator: &QueryGenerator,
        options: &StartTransactionOptions,
    ) -> Result<String> {
        generator.default_start_transaction(options)
    }

    fn commit_transaction(&self, generator: &QueryGenerator) -> Result<String> {
        generator.reject_connection_transactions("commitTransactionQuery")?;
        Ok("COMMIT".to_string())
    }

    fn rollback_transaction(&self, generator: &QueryGenerator) -> Result<String> {
        generator.reject_connection_transactions("rollbackTransactionQuery")?;
        Ok("ROLLBACK".to_string())
    }

    fn create_savepoint(&self, generator: &QueryGenerator, name: &str) -> Result<String> {
        generator.require_savepoints()?;
        Ok(format!("SAVEPOINT {}", generator.quote_identifier(name)))
    }

    fn rollback_savepoint(&self, generator: &QueryGenerator, name: &str) -> Result<String> {
        generator.require_savepoints()?;
        Ok(format!("ROLLBACK TO SAVEPOINT {}", generator.quote_identifier(name)))
    }

    fn set_isolation_level(&self, generator: &QueryGenerator, level: IsolationLevel) -> Result<String> {
        generator.default_isolation_level(level)
    }

    /// Single-row insert-or-update.
    fn upsert(
        &self,
        generator: &QueryGenerator,
        table: &TableRef,
        insert_values: &[(String, Value)],
        update_values: &[(String, Value)],
        model: Option<&ModelDefinition>,
        options: &InsertOptions,
    ) -> Result<Statement> {
        generator.upsert_via_insert(table, insert_values, update_values, model, options)
    }
}

/// `$.a[0]."b c"` style path string used by the SQL/JSON path functions.
pub(crate) fn json_path(path: &[JsonSegment]) -> String {
    let mut out = String::from("$");
    for segment in path {
        match segment {
            JsonSegment::Index(i) => out.push_str(&format!("[{i}]")),
            JsonSegment::Key(key) if BARE_JSON_KEY.is_match(key) => {
                out.push('.');
                out.push_str(key);
            }
            JsonSegment::Key(key) => {
                out.push('.');
                out.push_str(&serde_json::Value::String(key.clone()).to_string());
            }
        }
    }
    out
}

fn json_unsupported(generator: &QueryGenerator) -> Error {
    Error::unsupported(
        generator.dialect_name(),
        "jsonOperations",
        format!("JSON operations are not supported by {}", generator.dialect_name()),
    )
}

static POSTGRES: PostgresOps = PostgresOps;
static MYSQL: MysqlOps = MysqlOps;
static MARIADB: MariadbOps = MariadbOps;
static SQLITE: SqliteOps = SqliteOps;
static MSSQL: MssqlOps = MssqlOps;
static ORACLE: OracleOps = OracleOps;
static DB2: Db2Ops = Db2Ops { ibmi: false };
static IBMI: Db2Ops = Db2Ops { ibmi: true };
static SNOWFLAKE: SnowflakeOps = SnowflakeOps;
static VERTICA: VerticaOps = VerticaOps;

/// The ops implementation of a dialect.
pub fn ops_for(kind: DialectKind) -> &'static dyn QueryGeneratorOps {
    match kind {
        DialectKind::Postgres => &POSTGRES,
        DialectKind::Mysql => &MYSQL,
        DialectKind::Mariadb => &MARIADB,
        DialectKind::Sqlite => &SQLITE,
        DialectKind::Mssql => &MSSQL,
        DialectKind::Oracle => &ORACLE,
        DialectKind::Db2 => &DB2,
        DialectKind::Ibmi => &IBMI,
        DialectKind::Snowflake => &SNOWFLAKE,
        DialectKind::Vertica => &VERTICA,
    }
}

/// Generates DML for one dialect.
///
/// A generator is immutable and can be shared between threads; every call
/// owns its bind collector and alias map.
#[derive(Debug, Clone)]
pub struct QueryGenerator {
    dialect: Dialect,
    options: GeneratorOptions,
    timezone: FixedOffset,
    ops: &'static dyn QueryGeneratorOps,
}

impl QueryGenerator {
    /// Create a generator; fails if the configured timezone is malformed.
    pub fn new(dialect: Dialect, options: GeneratorOptions) -> Result<Self> {
        let timezone = options.offset()?;
        let ops = ops_for(dialect.kind());
        Ok(Self {
            dialect,
            options,
            timezone,
            ops,
        })
    }

    /// A generator with the built-in capabilities and default options.
    pub fn for_kind(kind: DialectKind) -> Result<Self> {
        Self::new(Dialect::new(kind)?, GeneratorOptions::default())
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn kind(&self) -> DialectKind {
        self.dialect.kind()
    }

    pub fn dialect_name(&self) -> &'static str {
        self.dialect.name()
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn supports(&self) -> &CapabilityTree {
        self.dialect.supports()
    }

    pub(crate) fn ops(&self) -> &'static dyn QueryGeneratorOps {
        self.ops
    }

    pub fn escaper(&self) -> Escaper<'_> {
        Escaper::new(&self.dialect, self.timezone)
    }

    /// Escape a value as an inline literal.
    pub fn escape(&self, value: &Value) -> Result<String> {
        self.escaper().value(value, None)
    }

    // ==================== Identifiers ====================

    /// Quote one identifier.
    ///
    /// With `quote_identifiers` off, lowercase names that are not reserved
    /// words are left bare.
    pub fn quote_identifier(&self, name: &str) -> String {
        if !self.options.quote_identifiers
            && BARE_IDENTIFIER.is_match(name)
            && !RESERVED_WORDS.contains(&name)
        {
            return name.to_string();
        }
        self.dialect.quote_identifier(name)
    }

    /// Quote a generated alias; always quoted.
    pub fn quote_alias(&self, alias: &str) -> String {
        self.dialect.quote_identifier(alias)
    }

    /// Quote a dotted identifier segment by segment. `*` is kept as is.
    pub fn quote_identifiers(&self, name: &str) -> String {
        name.split('.')
            .map(|part| {
                if part == "*" {
                    part.to_string()
                } else {
                    self.quote_identifier(part)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote a table reference, including its alias when it has one.
    ///
    /// The dialect's default schema is omitted. Dialects without schemas
    /// get `schema`, delimiter and table joined into a single identifier.
    pub fn quote_table(&self, table: &TableRef) -> String {
        let mut out = self.quote_table_name(table);
        if let Some(alias) = &table.alias {
            out.push_str(" AS ");
            out.push_str(&self.quote_alias(alias));
        }
        out
    }

    /// Quote a table reference without its alias.
    pub fn quote_table_name(&self, table: &TableRef) -> String {
        let schema = table
            .schema
            .as_deref()
            .or(self.options.schema.as_deref())
            .filter(|s| !s.is_empty() && Some(*s) != self.dialect.default_schema());
        match schema {
            None => self.quote_identifier(&table.table_name),
            Some(schema) if self.supports().enabled("schemas") => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(&table.table_name)
            ),
            Some(schema) => self.quote_identifier(&format!(
                "{}{}{}",
                schema,
                table.delimiter(),
                table.table_name
            )),
        }
    }

    /// Escape a table name as a string literal (for catalog lookups).
    pub fn escape_table(&self, table: &TableRef) -> String {
        self.escaper().string(&table.table_name)
    }

    /// Reject a generated identifier that exceeds the dialect limit.
    pub fn check_identifier_length(&self, identifier: &str) -> Result<()> {
        if !self.options.check_identifier_length {
            return Ok(());
        }
        match self.dialect.max_identifier_length() {
            Some(max) if identifier.len() > max => {
                Err(Error::IdentifierLength(IdentifierLengthError {
                    dialect: self.dialect_name().to_string(),
                    identifier: identifier.to_string(),
                    length: identifier.len(),
                    max,
                }))
            }
            _ => Ok(()),
        }
    }

    // ==================== Capability checks ====================

    /// Fail with one aggregated error naming every requested option the
    /// dialect cannot honor.
    ///
    /// `requested` lists `(option, supported)` for each option the caller
    /// actually set.
    pub fn reject_invalid_options(
        &self,
        operation: &str,
        requested: &[(&str, bool)],
    ) -> Result<()> {
        let unsupported: Vec<String> = requested
            .iter()
            .filter(|(_, supported)| !supported)
            .map(|(name, _)| (*name).to_string())
            .collect();
        if unsupported.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            dialect = self.dialect_name(),
            operation,
            options = ?unsupported,
            "unsupported options"
        );
        Err(CapabilityError::invalid_options(operation, self.dialect_name(), unsupported).into())
    }

    /// Single-feature capability check.
    pub fn require(&self, path: &str, message: impl FnOnce() -> String) -> Result<()> {
        if self.supports().enabled(path) {
            return Ok(());
        }
        tracing::debug!(dialect = self.dialect_name(), capability = path, "capability rejected");
        Err(Error::unsupported(self.dialect_name(), path, message()))
    }

    pub(crate) fn log_statement(&self, operation: &str, table: &str, statement: &Statement) {
        tracing::debug!(dialect = %self.dialect_name(), table = %table, operation, "generating statement");
        tracing::trace!(sql = %statement.sql, binds = statement.bind.len(), "generated statement");
    }
}
