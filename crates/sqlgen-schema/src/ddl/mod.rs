//! Per-dialect DDL syntax.
//!
//! [`SchemaGeneratorOps`] carries the statement shapes that differ between
//! dialects. Capability checks and naming happen on the
//! [`SchemaGenerator`](crate::SchemaGenerator) before a hook is called, so a
//! hook only decides spelling.

mod db2;
mod mssql;
mod mysql;
mod oracle;
mod postgres;
mod snowflake;
mod sqlite;
mod vertica;

use std::fmt;

use sqlgen_core::{Attribute, DialectKind, Result, TableRef};

use crate::generator::SchemaGenerator;
use crate::options::{ColumnChange, CreateTableOptions, DropTableOptions, RemoveIndexOptions};

pub use db2::Db2DdlOps;
pub use mssql::MssqlDdlOps;
pub use mysql::MysqlDdlOps;
pub use oracle::OracleDdlOps;
pub use postgres::PostgresDdlOps;
pub use snowflake::SnowflakeDdlOps;
pub use sqlite::SqliteDdlOps;
pub use vertica::VerticaDdlOps;

/// Dialect-specific DDL syntax.
///
/// Defaults follow the ANSI spelling shared by most dialects.
pub trait SchemaGeneratorOps: Send + Sync + fmt::Debug {
    fn kind(&self) -> DialectKind;

    // ==================== Indexes ====================

    /// Whether the dialect has secondary indexes at all.
    fn supports_indexes(&self) -> bool {
        true
    }

    /// The index name as written in `CREATE INDEX`.
    fn index_name(&self, generator: &SchemaGenerator, _table: &TableRef, name: &str) -> String {
        generator.query().quote_identifier(name)
    }

    /// A replacement statement for unique indexes, for dialects that
    /// express them as constraints.
    fn unique_index(
        &self,
        _gen: &SchemaGenerator,
        _table_sql: &str,
        _name_sql: &str,
        _fields_sql: &str,
    ) -> Option<String> {
        None
    }

    /// Extra validation of an index with covering columns.
    fn check_include(&self, _gen: &SchemaGenerator, _unique: bool) -> Result<()> {
        Ok(())
    }

    fn drop_index(
        &self,
        generator: &SchemaGenerator,
        table: &TableRef,
        name: &str,
        options: &RemoveIndexOptions,
    ) -> String {
        let if_exists = if options.if_exists { "IF EXISTS " } else { "" };
        format!("DROP INDEX {if_exists}{}", self.index_name(generator, table, name))
    }

    // ==================== Columns ====================

    /// Type plus auto-increment syntax of an auto-increment column.
    fn auto_increment_type(&self, type_sql: &str, _attribute: &Attribute) -> String {
        format!("{type_sql} GENERATED BY DEFAULT AS IDENTITY")
    }

    /// The auto-increment syntax already declares the primary key.
    fn inlines_primary_key(&self, _attribute: &Attribute) -> bool {
        false
    }

    /// Column comments are part of the column definition.
    fn inline_column_comment(&self) -> bool {
        false
    }

    /// Statements attaching comments after the table or column exists.
    fn comment_statements(
        &self,
        generator: &SchemaGenerator,
        table: &TableRef,
        table_comment: Option<&str>,
        column_comments: &[(&str, &str)],
    ) -> Vec<String> {
        let query = generator.query();
        let table_sql = query.quote_table_name(table);
        let mut out = Vec::new();
        if let Some(comment) = table_comment {
            out.push(format!(
                "COMMENT ON TABLE {table_sql} IS {};",
                query.escaper().string(comment)
            ));
        }
        for (column, comment) in column_comments {
            out.push(format!(
                "COMMENT ON COLUMN {table_sql}.{} IS {};",
                query.quote_identifier(column),
                query.escaper().string(comment)
            ));
        }
        out
    }

    /// Trailing table options (`ENGINE=...`); fails for options the
    /// dialect has no syntax for.
    fn table_options(&self, generator: &SchemaGenerator, options: &CreateTableOptions) -> Result<String> {
        let requested: Vec<(&str, bool)> = [
            ("charset", options.charset.is_some()),
            ("collate", options.collate.is_some()),
            ("engine", options.engine.is_some()),
            ("rowFormat", options.row_format.is_some()),
        ]
        .into_iter()
        .filter(|(_, set)| *set)
        .map(|(name, _)| (name, false))
        .collect();
        generator.query().reject_invalid_options("createTableQuery", &requested)?;
        Ok(String::new())
    }

    fn create_table(
        &self,
        _gen: &SchemaGenerator,
        _table: &TableRef,
        table_sql: &str,
        body: &str,
        table_options: &str,
    ) -> String {
        format!("CREATE TABLE IF NOT EXISTS {table_sql} ({body}){table_options};")
    }

    fn add_column_keyword(&self) -> &'static str {
        "ADD"
    }

    /// `ALTER TABLE ...` altering an existing column.
    fn change_column(
        &self,
        generator: &SchemaGenerator,
        table: &TableRef,
        column: &str,
        change: &ColumnChange,
    ) -> Result<String> {
        let clauses = generator.alter_column_clauses(column, change, "SET DATA TYPE")?;
        Ok(generator.finish_column_change(table, column, change, &clauses, ", "))
    }

    fn rename_column(&self, generator: &SchemaGenerator, table: &TableRef, before: &str, after: &str) -> String {
        let query = generator.query();
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            query.quote_table_name(table),
            query.quote_identifier(before),
            query.quote_identifier(after)
        )
    }

    // ==================== Tables ====================

    fn drop_table(&self, _gen: &SchemaGenerator, table_sql: &str, options: &DropTableOptions) -> String {
        let cascade = if options.cascade { " CASCADE" } else { "" };
        format!("DROP TABLE IF EXISTS {table_sql}{cascade}")
    }

    /// Rename and/or move a table. Capability and option checks are done.
    fn rename_table(&self, generator: &SchemaGenerator, before: &TableRef, after: &TableRef) -> Result<String> {
        let query = generator.query();
        Ok(format!(
            "ALTER TABLE {} RENAME TO {}",
            query.quote_table_name(before),
            query.quote_table_name(after)
        ))
    }
}

static POSTGRES: PostgresDdlOps = PostgresDdlOps;
static MYSQL: MysqlDdlOps = MysqlDdlOps { mariadb: false };
static MARIADB: MysqlDdlOps = MysqlDdlOps { mariadb: true };
static SQLITE: SqliteDdlOps = SqliteDdlOps;
static MSSQL: MssqlDdlOps = MssqlDdlOps;
static ORACLE: OracleDdlOps = OracleDdlOps;
static DB2: Db2DdlOps = Db2DdlOps { ibmi: false };
static IBMI: Db2DdlOps = Db2DdlOps { ibmi: true };
static SNOWFLAKE: SnowflakeDdlOps = SnowflakeDdlOps;
static VERTICA: VerticaDdlOps = VerticaDdlOps;

/// The DDL ops of a dialect.
pub fn ops_for(kind: DialectKind) -> &'static dyn SchemaGeneratorOps {
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

/// Wrap a statement in a PL/SQL block that ignores one error code.
pub(crate) fn plsql_ignoring(sql: &str, sqlcode: i32) -> String {
    format!(
        "BEGIN EXECUTE IMMEDIATE '{}'; EXCEPTION WHEN OTHERS THEN IF SQLCODE != {sqlcode} THEN RAISE; END IF; END;",
        sql.replace('\'', "''")
    )
}

/// Wrap a statement in an SQL PL block that ignores one SQLSTATE.
pub(crate) fn sqlpl_ignoring(sql: &str, sqlstate: &str) -> String {
    format!("BEGIN DECLARE CONTINUE HANDLER FOR SQLSTATE VALUE '{sqlstate}' BEGIN END; {sql}; END")
}
