//! Alias minification.
//!
//! Deeply nested includes produce aliases such as
//! `projects->tasks->assignee.firstName` that quickly outgrow the identifier
//! limit of Postgres (63 bytes). When minification is enabled, the select
//! generator swaps every such alias for a short token and records the
//! mapping so result columns can be translated back.

/// Token prefix for table (join) aliases.
const TABLE_PREFIX: &str = "t";
/// Token prefix for column aliases.
const COLUMN_PREFIX: &str = "_";

/// Full alias to short token mapping for one statement.
///
/// Tokens are handed out in first-seen order. The same full alias always
/// gets the same token within one map, and two different aliases never
/// share a token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    tables: Vec<(String, String)>,
    columns: Vec<(String, String)>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a table alias, allocating one on first use.
    pub fn table(&mut self, full: &str) -> String {
        Self::intern(&mut self.tables, TABLE_PREFIX, full)
    }

    /// Token for a column alias, allocating one on first use.
    pub fn column(&mut self, full: &str) -> String {
        Self::intern(&mut self.columns, COLUMN_PREFIX, full)
    }

    fn intern(entries: &mut Vec<(String, String)>, prefix: &str, full: &str) -> String {
        if let Some((_, short)) = entries.iter().find(|(f, _)| f == full) {
            return short.clone();
        }
        let short = format!("{prefix}{}", entries.len());
        entries.push((full.to_string(), short.clone()));
        short
    }

    /// Previously allocated token for a table alias.
    pub fn table_token(&self, full: &str) -> Option<&str> {
        self.tables
            .iter()
            .find(|(f, _)| f == full)
            .map(|(_, s)| s.as_str())
    }

    /// The full alias a token (table or column) stands for.
    pub fn unminify(&self, short: &str) -> Option<&str> {
        self.tables
            .iter()
            .chain(&self.columns)
            .find(|(_, s)| s == short)
            .map(|(f, _)| f.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len() + self.columns.len()
    }

    /// `(full, short)` pairs of column aliases in allocation order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(f, s)| (f.as_str(), s.as_str()))
    }

    /// `(full, short)` pairs of table aliases in allocation order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tables.iter().map(|(f, s)| (f.as_str(), s.as_str()))
    }
}
