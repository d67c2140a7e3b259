//! Bind parameter collection and placeholder mapping.
//!
//! Generated statements always use named `$sequelize_N` placeholders. The
//! [`Statement`] can later be rewritten into the placeholder style of the
//! target driver with [`Statement::to_positional`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use sqlgen_core::{BindStyle, DialectKind, Error, Result, ValidationErrorKind, Value};

use crate::alias::AliasMap;

/// Prefix of every generated bind parameter name.
pub const BIND_PREFIX: &str = "sequelize_";

static RESERVED_BIND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sequelize_\d+$").expect("static regex"));
static BIND_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$([A-Za-z_][0-9A-Za-z_]*|[1-9][0-9]*)(?:\]|\)|,|$|\s|::|;)")
        .expect("static regex")
});
static DOLLAR_QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$([A-Za-z_][0-9A-Za-z_]*)?\$").expect("static regex"));
static REPLACEMENT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:([A-Za-z_][0-9A-Za-z_]*)(?:\)|,|$|\s|::|;|\])").expect("static regex")
});

/// A finished SQL statement and the values of its named bind parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub sql: String,
    /// `(name, value)` pairs in the order they were collected; names carry no `$`
    pub bind: Vec<(String, Value)>,
    /// Minified aliases used by a SELECT, empty otherwise
    pub aliases: AliasMap,
}

impl Statement {
    /// A statement without bind parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            bind: Vec::new(),
            aliases: AliasMap::default(),
        }
    }

    pub fn with_bind(sql: impl Into<String>, bind: Vec<(String, Value)>) -> Self {
        Self {
            sql: sql.into(),
            bind,
            aliases: AliasMap::default(),
        }
    }

    /// Look up a bind value by name.
    pub fn bind_value(&self, name: &str) -> Option<&Value> {
        self.bind.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Rewrite the named placeholders into the bind style of `kind` and
    /// return the values in placeholder order.
    ///
    /// Placeholders inside string literals, quoted identifiers, comments and
    /// dollar-quoted strings are left untouched. `?`-style dialects receive
    /// one value per occurrence; numbered styles reuse the number of a name
    /// that appears more than once.
    pub fn to_positional(&self, kind: DialectKind) -> Result<(String, Vec<Value>)> {
        let style = kind.bind_style();
        let values: HashMap<&str, &Value> =
            self.bind.iter().map(|(n, v)| (n.as_str(), v)).collect();
        let mut order: Vec<String> = Vec::new();
        let mut out_values: Vec<Value> = Vec::new();

        let sql = map_placeholders(&self.sql, kind, &mut |token| {
            let Token::Bind(name) = token else {
                return Ok(None);
            };
            let value = values.get(name).ok_or_else(|| {
                Error::validation(
                    ValidationErrorKind::Invalid,
                    format!("Bind parameter \"${name}\" has no value"),
                )
            })?;
            let rendered = match style {
                BindStyle::Question => {
                    out_values.push((*value).clone());
                    "?".to_string()
                }
                BindStyle::Numbered | BindStyle::ColonNumbered => {
                    let index = match order.iter().position(|n| n == name) {
                        Some(i) => i + 1,
                        None => {
                            order.push(name.to_string());
                            out_values.push((*value).clone());
                            order.len()
                        }
                    };
                    if style == BindStyle::Numbered {
                        format!("${index}")
                    } else {
                        format!(":{index}")
                    }
                }
                BindStyle::DollarNamed | BindStyle::AtNamed => {
                    if !order.iter().any(|n| n == name) {
                        order.push(name.to_string());
                        out_values.push((*value).clone());
                    }
                    if style == BindStyle::DollarNamed {
                        format!("${name}")
                    } else {
                        format!("@{name}")
                    }
                }
            };
            Ok(Some(rendered))
        })?;
        Ok((sql, out_values))
    }
}

/// Collects values for one statement and hands out their placeholders.
///
/// A collector belongs to exactly one generation call.
#[derive(Debug, Clone, Default)]
pub struct BindCollector {
    binds: Vec<(String, Value)>,
    caller: Vec<(String, Value)>,
}

impl BindCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from bind parameters supplied by the caller (referenced from
    /// raw literals as `$name`).
    ///
    /// Names of the form `sequelize_N` are reserved for generated
    /// parameters and rejected.
    pub fn with_caller_binds(caller: &[(String, Value)]) -> Result<Self> {
        for (name, _) in caller {
            if RESERVED_BIND.is_match(name) {
                return Err(Error::validation(
                    ValidationErrorKind::BindCollision,
                    format!(
                        "Bind parameter \"{name}\" uses a reserved name. Names starting with \"{BIND_PREFIX}\" followed by a number are used by generated parameters"
                    ),
                ));
            }
        }
        Ok(Self {
            binds: Vec::new(),
            caller: caller.to_vec(),
        })
    }

    /// Add a value and return its placeholder text.
    pub fn collect(&mut self, value: Value) -> String {
        let name = format!("{BIND_PREFIX}{}", self.binds.len() + 1);
        let placeholder = format!("${name}");
        self.binds.push((name, value));
        placeholder
    }

    pub fn len(&self) -> usize {
        self.binds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binds.is_empty()
    }

    /// Generated binds followed by the caller's.
    pub fn into_binds(self) -> Vec<(String, Value)> {
        let mut binds = self.binds;
        binds.extend(self.caller);
        binds
    }

    /// Finish a statement.
    pub fn finish(self, sql: impl Into<String>) -> Statement {
        Statement::with_bind(sql, self.into_binds())
    }
}

/// A placeholder found while scanning SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `$name` or `$1`
    Bind(&'a str),
    /// `:name`
    Replacement(&'a str),
}

/// Scan `sql` for bind and replacement tokens outside literals, identifiers
/// and comments, replacing each with what `on_token` returns (`None` keeps
/// the token as written).
pub fn map_placeholders(
    sql: &str,
    kind: DialectKind,
    on_token: &mut dyn FnMut(Token<'_>) -> Result<Option<String>>,
) -> Result<String> {
    let (_, tick_right) = kind.quote_chars();
    let tick_left = kind.quote_chars().0;
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    let mut i = 0;

    enum State<'s> {
        Normal,
        Identifier,
        Str { backslash: bool },
        DollarQuoted(&'s str),
        LineComment,
        BlockComment,
    }
    let mut state = State::Normal;

    while i < bytes.len() {
        let c = bytes[i];
        match state {
            State::Identifier => {
                if c as char == tick_right {
                    state = State::Normal;
                }
            }
            State::Str { backslash } => {
                if c == b'\\' && backslash {
                    i += 1;
                } else if c == b'\'' {
                    state = State::Normal;
                }
            }
            State::DollarQuoted(tag) => {
                if c == b'$' {
                    if let Some(m) = sql.get(i..).and_then(|rest| DOLLAR_QUOTE.captures(rest)) {
                        let found = m.get(1).map_or("", |g| g.as_str());
                        let len = m.get(0).map_or(1, |g| g.len());
                        if found == tag {
                            state = State::Normal;
                            i += len;
                            continue;
                        }
                    }
                }
            }
            State::LineComment => {
                if c == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if c == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    state = State::Normal;
                    i += 1;
                }
            }
            State::Normal => {
                let prev = if i == 0 { None } else { Some(bytes[i - 1]) };
                if c as char == tick_left {
                    state = State::Identifier;
                } else if c == b'\'' {
                    let e_prefix = matches!(prev, Some(b'E' | b'e'))
                        && kind == DialectKind::Postgres
                        && (i < 2 || can_precede_token(Some(bytes[i - 2])));
                    state = State::Str {
                        backslash: kind.backslash_escapes() || e_prefix,
                    };
                } else if bytes[i..].starts_with(b"-- ") {
                    state = State::LineComment;
                } else if bytes[i..].starts_with(b"/*") {
                    state = State::BlockComment;
                    i += 1;
                } else if c == b'$' && !prev.is_some_and(|p| p.is_ascii_alphanumeric() || p == b'_') {
                    if let Some(m) = sql.get(i..).and_then(|rest| DOLLAR_QUOTE.captures(rest)) {
                        let len = m.get(0).map_or(1, |g| g.len());
                        state = State::DollarQuoted(m.get(1).map_or("", |g| g.as_str()));
                        i += len;
                        continue;
                    }
                    if can_precede_token(prev) {
                        let token = sql
                            .get(i..)
                            .and_then(|rest| BIND_TOKEN.captures(rest))
                            .and_then(|m| m.get(1));
                        if let Some(name) = token {
                            let name = name.as_str();
                            if let Some(replacement) = on_token(Token::Bind(name))? {
                                out.push_str(&sql[last..i]);
                                out.push_str(&replacement);
                                last = i + 1 + name.len();
                            }
                            i += 1 + name.len();
                            continue;
                        }
                    }
                } else if c == b':' && (can_precede_token(prev) || prev == Some(b'[')) {
                    let token = sql
                        .get(i..)
                        .and_then(|rest| REPLACEMENT_TOKEN.captures(rest))
                        .and_then(|m| m.get(1));
                    if let Some(name) = token {
                        let name = name.as_str();
                        if let Some(replacement) = on_token(Token::Replacement(name))? {
                            out.push_str(&sql[last..i]);
                            out.push_str(&replacement);
                            last = i + 1 + name.len();
                        }
                        i += 1 + name.len();
                        continue;
                    }
                }
            }
        }
        i += 1;
    }

    if matches!(state, State::Str { .. }) {
        return Err(Error::validation(
            ValidationErrorKind::Invalid,
            format!("The following SQL query includes an unterminated string literal:\n{sql}"),
        ));
    }
    out.push_str(&sql[last..]);
    Ok(out)
}

fn can_precede_token(prev: Option<u8>) -> bool {
    match prev {
        None => true,
        Some(c) => c.is_ascii_whitespace() || matches!(c, b'(' | b'[' | b'>' | b',' | b'='),
    }
}
