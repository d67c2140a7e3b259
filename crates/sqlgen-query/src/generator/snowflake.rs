//! Snowflake statement syntax.

use sqlgen_core::{DialectKind, Result};

use super::{QueryGenerator, QueryGeneratorOps};
use crate::options::TruncateOptions;

#[derive(Debug, Clone, Copy, Default)]
pub struct SnowflakeOps;

impl QueryGeneratorOps for SnowflakeOps {
    fn kind(&self) -> DialectKind {
        DialectKind::Snowflake
    }

    fn limit_fragment(
        &self,
        _gen: &QueryGenerator,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<String> {
        Ok(match (limit, offset.filter(|o| *o > 0)) {
            (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (None, Some(offset)) => format!(" LIMIT NULL OFFSET {offset}"),
            (Some(limit), None) => format!(" LIMIT {limit}"),
            (None, None) => String::new(),
        })
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
