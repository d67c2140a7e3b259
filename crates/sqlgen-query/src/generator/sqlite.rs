//! SQLite statement syntax.

use sqlgen_core::{DialectKind, Result};

use super::{json_path, QueryGenerator, QueryGeneratorOps};
use crate::expr::JsonSegment;
use crate::options::{StartTransactionOptions, TransactionType, TruncateOptions};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteOps;

impl QueryGeneratorOps for SqliteOps {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    /// SQLite only accepts OFFSET after a LIMIT; `-1` means no limit.
    fn limit_fragment(
        &self,
        _gen: &QueryGenerator,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<String> {
        let offset = offset.filter(|o| *o > 0);
        let mut out = String::new();
        match limit {
            Some(limit) => out.push_str(&format!(" LIMIT {limit}")),
            None if offset.is_some() => out.push_str(" LIMIT -1"),
            None => {}
        }
        if let Some(offset) = offset {
            out.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(out)
    }

    fn json_path_extraction(
        &self,
        generator: &QueryGenerator,
        sql: &str,
        path: &[JsonSegment],
        unquote: bool,
    ) -> Result<String> {
        let extracted = format!(
            "json_extract({sql},{})",
            generator.escaper().string(&json_path(path))
        );
        Ok(if unquote {
            format!("json_unquote({extracted})")
        } else {
            extracted
        })
    }

    fn unquote_json(&self, _gen: &QueryGenerator, sql: &str) -> Result<String> {
        Ok(format!("json_unquote({sql})"))
    }

    fn unix_timestamp(&self, _gen: &QueryGenerator, sql: &str) -> Result<String> {
        Ok(format!("CAST(strftime('%s', {sql}) AS INTEGER)"))
    }

    /// There is no TRUNCATE; the autoincrement counter lives in
    /// `sqlite_sequence`.
    fn truncate_table(
        &self,
        generator: &QueryGenerator,
        table: &str,
        options: &TruncateOptions,
    ) -> Result<Vec<String>> {
        let mut statements = vec![format!("DELETE FROM {table}")];
        if options.restart_identity {
            let name = table.trim_matches('`').replace("``", "`");
            statements.push(format!(
                "DELETE FROM {} WHERE {} = {}",
                generator.quote_alias("sqlite_sequence"),
                generator.quote_alias("name"),
                generator.escaper().string(&name)
            ));
        }
        Ok(statements)
    }

    fn start_transaction(
        &self,
        generator: &QueryGenerator,
        options: &StartTransactionOptions,
    ) -> Result<String> {
        generator.check_start_transaction_options(options)?;
        let kind = options.transaction_type.unwrap_or(TransactionType::Deferred);
        Ok(format!("BEGIN {} TRANSACTION", kind.as_sql()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> QueryGenerator {
        QueryGenerator::for_kind(DialectKind::Sqlite).unwrap()
    }

    #[test]
    fn test_limit_and_offset() {
        let generator = generator();
        assert_eq!(SqliteOps.limit_fragment(&generator, None, Some(3)).unwrap(), " LIMIT -1 OFFSET 3");
        assert_eq!(SqliteOps.limit_fragment(&generator, Some(2), Some(3)).unwrap(), " LIMIT 2 OFFSET 3");
    }

    #[test]
    fn test_truncate_restarts_sequence() {
        let generator = generator();
        let options = TruncateOptions {
            restart_identity: true,
            ..TruncateOptions::default()
        };
        assert_eq!(
            SqliteOps.truncate_table(&generator, "`users`", &options).unwrap(),
            [
                "DELETE FROM `users`",
                "DELETE FROM `sqlite_sequence` WHERE `name` = 'users'"
            ]
        );
    }

    #[test]
    fn test_begin_transaction_types() {
        let generator = generator();
        assert_eq!(
            SqliteOps
                .start_transaction(&generator, &StartTransactionOptions::default())
                .unwrap(),
            "BEGIN DEFERRED TRANSACTION"
        );
        let options = StartTransactionOptions {
            transaction_type: Some(TransactionType::Immediate),
            ..StartTransactionOptions::default()
        };
        assert_eq!(
            SqliteOps.start_transaction(&generator, &options).unwrap(),
            "BEGIN IMMEDIATE TRANSACTION"
        );
    }
}
