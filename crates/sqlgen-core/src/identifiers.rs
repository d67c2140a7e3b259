//! Identifier naming helpers.
//!
//! Default index and constraint names are derived from table and column
//! names. These helpers keep that derivation deterministic and inside the
//! dialect's identifier length limit.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

static ACRONYM_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("static regex"));
static WORD_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("static regex"));

/// Convert a camelCase or PascalCase name to snake_case.
///
/// Hyphens become underscores; everything is lowercased.
///
/// # Examples
///
/// ```
/// use sqlgen_core::identifiers::underscore;
///
/// assert_eq!(underscore("myTable"), "my_table");
/// assert_eq!(underscore("HTMLParser"), "html_parser");
/// assert_eq!(underscore("my-models"), "my_models");
/// ```
pub fn underscore(name: &str) -> String {
    let step = ACRONYM_BOUNDARY.replace_all(name, "${1}_${2}");
    let step = WORD_BOUNDARY.replace_all(&step, "${1}_${2}");
    step.replace('-', "_").to_lowercase()
}

/// Default index name: `{table}_{field1}_{field2}` in snake_case, with a
/// `_unique` suffix for unique indexes.
pub fn generate_index_name<S: AsRef<str>>(table: &str, fields: &[S], unique: bool) -> String {
    let mut out = String::from(table);
    for field in fields {
        out.push('_');
        out.push_str(field.as_ref());
    }
    if unique {
        out.push_str("_unique");
    }
    underscore(&out)
}

/// Default constraint name: `{table}_{field1}_{field2}_{suffix}`.
pub fn generate_constraint_name<S: AsRef<str>>(table: &str, fields: &[S], suffix: &str) -> String {
    let mut out = String::from(table);
    for field in fields {
        out.push('_');
        out.push_str(field.as_ref());
    }
    out.push('_');
    out.push_str(suffix);
    out
}

/// Shorten `name` to at most `max` bytes.
///
/// Names that already fit are returned unchanged. Longer names keep a prefix
/// and gain an `_` plus the first eight hex digits of the SHA-256 of the full name,
/// so two long names that share a prefix still map to distinct identifiers.
pub fn shorten_identifier(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    let digest = Sha256::digest(name.as_bytes());
    let mut suffix = String::from("_");
    for byte in &digest[..4] {
        suffix.push_str(&format!("{byte:02x}"));
    }
    let mut keep = max.saturating_sub(suffix.len());
    while keep > 0 && !name.is_char_boundary(keep) {
        keep -= 1;
    }
    let mut out = name[..keep].to_string();
    out.push_str(&suffix);
    out
}
