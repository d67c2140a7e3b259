//! Oracle statement syntax.

use sqlgen_core::{DialectKind, Result};

use super::{QueryGenerator, QueryGeneratorOps};
use crate::options::{IsolationLevel, TruncateOptions};

#[derive(Debug, Clone, Copy, Default)]
pub struct OracleOps;

impl QueryGeneratorOps for OracleOps {
    fn kind(&self) -> DialectKind {
        DialectKind::Oracle
    }

    fn limit_fragment(
        &self,
        _gen: &QueryGenerator,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<String> {
        if limit.is_none() && offset.is_none() {
            return Ok(String::new());
        }
        let mut out = format!(" OFFSET {} ROWS", offset.unwrap_or(0));
        if let Some(limit) = limit {
            out.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
        }
        Ok(out)
    }

    fn truncate_table(
        &self,
        _gen: &QueryGenerator,
        table: &str,
        _options: &TruncateOptions,
    ) -> Result<Vec<String>> {
        Ok(vec![format!("TRUNCATE TABLE {table}")])
    }

    fn commit_transaction(&self, _gen: &QueryGenerator) -> Result<String> {
        Ok("COMMIT TRANSACTION".to_string())
    }

    fn rollback_transaction(&self, generator: &QueryGenerator) -> Result<String> {
        generator.reject_connection_transactions("rollbackTransactionQuery")?;
        Ok("ROLLBACK TRANSACTION".to_string())
    }

    /// Oracle only has READ COMMITTED and SERIALIZABLE; weaker and stronger
    /// levels round to the nearest of the two.
    fn set_isolation_level(&self, generator: &QueryGenerator, level: IsolationLevel) -> Result<String> {
        let level = match level {
            IsolationLevel::ReadUncommitted | IsolationLevel::ReadCommitted => {
                IsolationLevel::ReadCommitted
            }
            IsolationLevel::RepeatableRead | IsolationLevel::Serializable => {
                IsolationLevel::Serializable
            }
        };
        generator.default_isolation_level(level)
    }
}
