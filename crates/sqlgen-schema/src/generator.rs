//! The DDL generator.

use std::sync::LazyLock;

use regex::Regex;
use sqlgen_core::identifiers::shorten_identifier;
use sqlgen_core::{
    Dialect, DialectKind, Error, GeneratorOptions, Result, TableRef, ValidationErrorKind,
};
use sqlgen_query::QueryGenerator;

use crate::ddl::{SchemaGeneratorOps, ops_for};

/// Keywords spliced into DDL unquoted (index methods, charsets, engines).
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"));

/// Generates DDL for one dialect.
///
/// Quoting, escaping and capability checks are shared with the wrapped
/// [`QueryGenerator`]; only DDL spelling goes through
/// [`SchemaGeneratorOps`]. Like the query generator it holds no per-call
/// state.
#[derive(Debug, Clone)]
pub struct SchemaGenerator {
    query: QueryGenerator,
    ops: &'static dyn SchemaGeneratorOps,
}

impl SchemaGenerator {
    pub fn new(dialect: Dialect, options: GeneratorOptions) -> Result<Self> {
        Ok(Self::from(QueryGenerator::new(dialect, options)?))
    }

    /// A generator with the built-in capabilities and default options.
    pub fn for_kind(kind: DialectKind) -> Result<Self> {
        Ok(Self::from(QueryGenerator::for_kind(kind)?))
    }

    /// The query generator used for quoting and escaping.
    pub fn query(&self) -> &QueryGenerator {
        &self.query
    }

    pub fn kind(&self) -> DialectKind {
        self.query.kind()
    }

    pub fn dialect_name(&self) -> &'static str {
        self.query.dialect_name()
    }

    pub(crate) fn ops(&self) -> &'static dyn SchemaGeneratorOps {
        self.ops
    }

    /// The schema a table lives in, unless it is the dialect default.
    pub(crate) fn effective_schema<'a>(&'a self, table: &'a TableRef) -> Option<&'a str> {
        table
            .schema
            .as_deref()
            .or(self.query.options().schema.as_deref())
            .filter(|s| !s.is_empty() && Some(*s) != self.query.dialect().default_schema())
    }

    /// `"a", "b"`
    pub(crate) fn quote_columns<S: AsRef<str>>(&self, columns: &[S]) -> String {
        columns
            .iter()
            .map(|c| self.query.quote_identifier(c.as_ref()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Shorten a generated name to the dialect limit.
    pub(crate) fn fit_identifier(&self, name: String) -> String {
        match self.query.dialect().max_identifier_length() {
            Some(max) if name.len() > max => {
                let short = shorten_identifier(&name, max);
                tracing::debug!(dialect = self.dialect_name(), name = %name, short = %short, "shortened identifier");
                short
            }
            _ => name,
        }
    }

    /// Reject a keyword option that would be written into the statement
    /// verbatim unless it is a single word.
    pub(crate) fn check_word(&self, word: &str, what: &str) -> Result<()> {
        if WORD.is_match(word) {
            return Ok(());
        }
        Err(Error::validation(
            ValidationErrorKind::InvalidIdentifier,
            format!("{word} is not a valid {what}"),
        ))
    }

    pub(crate) fn log_ddl(&self, operation: &str, table: &str, sql: &str) {
        tracing::debug!(dialect = %self.dialect_name(), table = %table, operation, "generating ddl");
        tracing::trace!(sql = %sql, "generated ddl");
    }
}

impl From<QueryGenerator> for SchemaGenerator {
    fn from(query: QueryGenerator) -> Self {
        let ops = ops_for(query.kind());
        Self { query, ops }
    }
}
