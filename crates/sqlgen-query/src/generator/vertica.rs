//! Vertica statement syntax.

use sqlgen_core::{DialectKind, Result};

use super::{QueryGenerator, QueryGeneratorOps};
use crate::options::TruncateOptions;

#[derive(Debug, Clone, Copy, Default)]
pub struct VerticaOps;

impl QueryGeneratorOps for VerticaOps {
    fn kind(&self) -> DialectKind {
        DialectKind::Vertica
    }

    fn truncate_table(
        &self,
        _gen: &QueryGenerator,
        table: &str,
        _options: &TruncateOptions,
    ) -> Result<Vec<String>> {
        Ok(vec![format!("TRUNCATE TABLE {table}")])
    }
}
