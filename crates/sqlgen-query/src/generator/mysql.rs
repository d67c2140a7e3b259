//! MySQL and MariaDB statement syntax.

use sqlgen_core::{DialectKind, Result};

use super::{json_path, QueryGenerator, QueryGeneratorOps};
use crate::expr::JsonSegment;
use crate::options::TruncateOptions;

/// MySQL requires a LIMIT before OFFSET; this is the largest row count it
/// accepts.
const MAX_ROWS: &str = "18446744073709551615";

fn limit_with_max_rows(limit: Option<u64>, offset: Option<u64>) -> String {
    let offset = offset.filter(|o| *o > 0);
    let mut out = String::new();
    match limit {
        Some(limit) => out.push_str(&format!(" LIMIT {limit}")),
        None if offset.is_some() => out.push_str(&format!(" LIMIT {MAX_ROWS}")),
        None => {}
    }
    if let Some(offset) = offset {
        out.push_str(&format!(" OFFSET {offset}"));
    }
    out
}

fn json_extract(generator: &QueryGenerator, sql: &str, path: &[JsonSegment]) -> String {
    format!("json_extract({sql},{})", generator.escaper().string(&json_path(path)))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlOps;

impl QueryGeneratorOps for MysqlOps {
    fn kind(&self) -> DialectKind {
        DialectKind::Mysql
    }

    fn limit_fragment(
        &self,
        _gen: &QueryGenerator,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<String> {
        Ok(limit_with_max_rows(limit, offset))
    }

    fn json_path_extraction(
        &self,
        generator: &QueryGenerator,
        sql: &str,
        path: &[JsonSegment],
        unquote: bool,
    ) -> Result<String> {
        let extracted = json_extract(generator, sql, path);
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
        Ok(format!("UNIX_TIMESTAMP({sql})"))
    }

    fn truncate_table(
        &self,
        _gen: &QueryGenerator,
        table: &str,
        _options: &TruncateOptions,
    ) -> Result<Vec<String>> {
        Ok(vec![format!("TRUNCATE {table}")])
    }
}

/// MariaDB follows MySQL except that extracted JSON is compacted so values
/// compare the same way regardless of source formatting.
#[derive(Debug, Clone, Copy, Default)]
pub struct MariadbOps;

impl QueryGeneratorOps for MariadbOps {
    fn kind(&self) -> DialectKind {
        DialectKind::Mariadb
    }

    fn limit_fragment(
        &self,
        _gen: &QueryGenerator,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<String> {
        Ok(limit_with_max_rows(limit, offset))
    }

    fn json_path_extraction(
        &self,
        generator: &QueryGenerator,
        sql: &str,
        path: &[JsonSegment],
        unquote: bool,
    ) -> Result<String> {
        let extracted = json_extract(generator, sql, path);
        Ok(if unquote {
            format!("json_unquote({extracted})")
        } else {
            format!("json_compact({extracted})")
        })
    }

    fn unquote_json(&self, _gen: &QueryGenerator, sql: &str) -> Result<String> {
        Ok(format!("json_unquote({sql})"))
    }

    fn unix_timestamp(&self, _gen: &QueryGenerator, sql: &str) -> Result<String> {
        Ok(format!("UNIX_TIMESTAMP({sql})"))
    }

    fn truncate_table(
        &self,
        _gen: &QueryGenerator,
        table: &str,
        _options: &TruncateOptions,
    ) -> Result<Vec<String>> {
        Ok(vec![format!("TRUNCATE {table}")])
    }
}
