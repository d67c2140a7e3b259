//! PostgreSQL statement syntax.

use sqlgen_core::{DialectKind, Result};

use super::{QueryGenerator, QueryGeneratorOps};
use crate::expr::JsonSegment;

/// PostgreSQL hooks. Everything not listed here uses the default syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresOps;

impl QueryGeneratorOps for PostgresOps {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn json_path_extraction(
        &self,
        generator: &QueryGenerator,
        sql: &str,
        path: &[JsonSegment],
        unquote: bool,
    ) -> Result<String> {
        if let [segment] = path {
            let operator = if unquote { "->>" } else { "->" };
            let key = match segment {
                JsonSegment::Index(i) => i.to_string(),
                JsonSegment::Key(key) => generator.escaper().string(key),
            };
            return Ok(format!("{sql}{operator}{key}"));
        }
        let operator = if unquote { "#>>" } else { "#>" };
        let segments: Vec<String> = path
            .iter()
            .map(|segment| match segment {
                JsonSegment::Index(i) => generator.escaper().string(&i.to_string()),
                JsonSegment::Key(key) => generator.escaper().string(key),
            })
            .collect();
        Ok(format!(
            "{sql}{operator}ARRAY[{}]::VARCHAR(255)[]",
            segments.join(",")
        ))
    }

    fn unquote_json(&self, _gen: &QueryGenerator, sql: &str) -> Result<String> {
        Ok(format!("{sql}#>>ARRAY[]::TEXT[]"))
    }

    fn unix_timestamp(&self, _gen: &QueryGenerator, sql: &str) -> Result<String> {
        Ok(format!("EXTRACT(EPOCH FROM {sql})"))
    }
}
