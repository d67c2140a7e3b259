//! Db2 and IBM i statement syntax.

use sqlgen_core::{DialectKind, Result};

use super::{QueryGenerator, QueryGeneratorOps};
use crate::options::TruncateOptions;

/// Shared by Db2 for LUW and IBM i; `ibmi` selects the reported kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct Db2Ops {
    pub ibmi: bool,
}

impl QueryGeneratorOps for Db2Ops {
    fn kind(&self) -> DialectKind {
        if self.ibmi {
            DialectKind::Ibmi
        } else {
            DialectKind::Db2
        }
    }

    fn limit_fragment(
        &self,
        _gen: &QueryGenerator,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<String> {
        let mut out = String::new();
        if let Some(offset) = offset.filter(|o| *o > 0) {
            out.push_str(&format!(" OFFSET {offset} ROWS"));
        }
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
        Ok(vec![format!("TRUNCATE TABLE {table} IMMEDIATE")])
    }

    fn create_savepoint(&self, generator: &QueryGenerator, name: &str) -> Result<String> {
        generator.require_savepoints()?;
        Ok(format!(
            "SAVEPOINT {} ON ROLLBACK RETAIN CURSORS",
            generator.quote_identifier(name)
        ))
    }
}
