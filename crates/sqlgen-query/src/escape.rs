//! Literal escaping.
//!
//! Every value that ends up inside statement text goes through this module.
//! Identifiers are quoted by [`Dialect::quote_identifier`]; everything else
//! (strings, numbers, dates, buffers, JSON documents) is rendered here.

use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Timelike};
use regex::Regex;
use sqlgen_core::{
    DataType, Dialect, DialectKind, Error, Result, ValidationError, ValidationErrorKind, Value,
};

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?([eE][-+]?\d+)?$").expect("static regex"));

/// Escape a string as a quoted SQL string literal.
///
/// Quotes are doubled. On MySQL and MariaDB, where backslash is an escape
/// character, control characters, quotes and backslashes are
/// backslash-escaped instead. MSSQL literals get the `N` prefix. Postgres
/// cannot store NUL characters in text, so they are dropped.
///
/// # Examples
///
/// ```
/// use sqlgen_core::DialectKind;
/// use sqlgen_query::escape::escape_string;
///
/// assert_eq!(escape_string(DialectKind::Postgres, "it's"), "'it''s'");
/// assert_eq!(escape_string(DialectKind::Mssql, "abc"), "N'abc'");
/// assert_eq!(escape_string(DialectKind::Mysql, "it's"), r"'it\'s'");
/// ```
pub fn escape_string(kind: DialectKind, value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 3);
    if kind.national_strings() {
        out.push('N');
    }
    out.push('\'');
    if kind.backslash_escapes() {
        for c in value.chars() {
            match c {
                '\0' => out.push_str("\\0"),
                '\u{8}' => out.push_str("\\b"),
                '\t' => out.push_str("\\t"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\u{1a}' => out.push_str("\\Z"),
                '"' => out.push_str("\\\""),
                '\'' => out.push_str("\\'"),
                '\\' => out.push_str("\\\\"),
                c => out.push(c),
            }
        }
    } else {
        for c in value.chars() {
            match c {
                '\'' => out.push_str("''"),
                '\0' if kind == DialectKind::Postgres => {}
                c => out.push(c),
            }
        }
    }
    out.push('\'');
    out
}

/// Escape a binary buffer.
pub fn escape_bytes(kind: DialectKind, bytes: &[u8]) -> String {
    let hex = hex(bytes);
    match kind {
        DialectKind::Postgres => format!("'\\x{hex}'"),
        DialectKind::Mssql => format!("0x{hex}"),
        DialectKind::Db2 | DialectKind::Ibmi => format!("BLOB(X'{hex}')"),
        _ => format!("X'{hex}'"),
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Format a date-time as `YYYY-MM-DD HH:MM:SS[.fff][ +HH:MM]`.
///
/// `digits` is the number of fractional second digits (0..=6). The offset
/// suffix is only written for dialects that store it.
pub fn format_datetime(kind: DialectKind, value: &DateTime<FixedOffset>, digits: u8) -> String {
    let mut out = value.format("%Y-%m-%d %H:%M:%S").to_string();
    push_fraction(&mut out, value.nanosecond(), digits);
    if kind.dates_with_offset() {
        out.push(' ');
        out.push_str(&value.format("%:z").to_string());
    }
    out
}

fn format_time(value: &NaiveTime, digits: u8) -> String {
    let mut out = value.format("%H:%M:%S").to_string();
    if value.nanosecond() != 0 {
        push_fraction(&mut out, value.nanosecond(), digits);
    }
    out
}

fn push_fraction(out: &mut String, nanos: u32, digits: u8) {
    if digits == 0 {
        return;
    }
    let digits = u32::from(digits.min(6));
    // Leap seconds are carried as nanos >= 1e9; clamp them to the last fraction.
    let nanos = nanos.min(999_999_999);
    let scaled = nanos / 10u32.pow(9 - digits);
    let _ = write!(out, ".{scaled:0width$}", width = digits as usize);
}

/// Escapes values for one dialect and one session timezone.
#[derive(Debug, Clone, Copy)]
pub struct Escaper<'a> {
    dialect: &'a Dialect,
    timezone: FixedOffset,
}

impl<'a> Escaper<'a> {
    pub fn new(dialect: &'a Dialect, timezone: FixedOffset) -> Self {
        Self { dialect, timezone }
    }

    pub fn kind(&self) -> DialectKind {
        self.dialect.kind()
    }

    /// Escape a string literal.
    pub fn string(&self, value: &str) -> String {
        escape_string(self.kind(), value)
    }

    /// Escape `value` as an inline literal, formatted for `data_type` when
    /// one is known.
    pub fn value(&self, value: &Value, data_type: Option<&DataType>) -> Result<String> {
        if let Some(data_type) = data_type {
            if data_type.is_json() {
                return self.json_document(value);
            }
            self.check_type(value, data_type)?;
        }
        let kind = self.kind();
        match value {
            Value::Null => Ok("NULL".to_string()),
            Value::Default => Ok("DEFAULT".to_string()),
            Value::Bool(b) => Ok(kind.boolean_literal(*b).to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(f) => self.float(*f, data_type),
            Value::Decimal(d) => {
                if DECIMAL.is_match(d) {
                    Ok(d.clone())
                } else {
                    Err(invalid_number(format!("{d} is not a valid decimal")))
                }
            }
            Value::Text(s) => Ok(self.string(s)),
            Value::Bytes(b) => Ok(escape_bytes(kind, b)),
            Value::Date(d) => Ok(self.string(&d.format("%Y-%m-%d").to_string())),
            Value::Time(t) => {
                let digits = data_type.map_or(3, DataType::fractional_digits);
                Ok(self.string(&format_time(t, digits)))
            }
            Value::Timestamp(naive) => {
                let local = self.timezone.from_local_datetime(naive).single().ok_or_else(|| {
                    Error::validation(
                        ValidationErrorKind::Invalid,
                        format!("{naive} does not exist in the configured timezone"),
                    )
                })?;
                Ok(self.datetime(&local, data_type))
            }
            Value::DateTime(dt) => Ok(self.datetime(&dt.with_timezone(&self.timezone), data_type)),
            Value::Uuid(bytes) => Ok(self.string(&Value::uuid_string(bytes))),
            Value::Json(json) => Ok(self.string(&serde_json::to_string(json)?)),
            Value::Array(items) => self.array(items, data_type),
        }
    }

    fn datetime(&self, value: &DateTime<FixedOffset>, data_type: Option<&DataType>) -> String {
        if matches!(data_type, Some(DataType::DateOnly)) {
            return self.string(&value.format("%Y-%m-%d").to_string());
        }
        let digits = data_type.map_or(3, DataType::fractional_digits);
        self.string(&format_datetime(self.kind(), value, digits))
    }

    fn float(&self, value: f64, data_type: Option<&DataType>) -> Result<String> {
        if value.is_finite() {
            return Ok(value.to_string());
        }
        let key = match data_type {
            Some(DataType::Float) => "dataTypes.FLOAT",
            Some(DataType::Real) => "dataTypes.REAL",
            Some(DataType::Double) => "dataTypes.DOUBLE",
            Some(DataType::Decimal { .. }) => "dataTypes.DECIMAL",
            _ => "",
        };
        let supports = self.dialect.supports();
        if value.is_nan() {
            if !key.is_empty() && supports.enabled(&format!("{key}.NaN")) {
                return Ok(self.string("NaN"));
            }
            return Err(invalid_number("NaN is not a valid number"));
        }
        if !key.is_empty() && supports.enabled(&format!("{key}.infinity")) {
            let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
            return Ok(self.string(text));
        }
        Err(invalid_number(format!("{value} is not a valid number")))
    }

    fn array(&self, items: &[Value], data_type: Option<&DataType>) -> Result<String> {
        if !self.dialect.supports().enabled("dataTypes.ARRAY") {
            return Err(Error::unsupported(
                self.dialect.name(),
                "dataTypes.ARRAY",
                format!("{} does not support array literals", self.dialect.name()),
            ));
        }
        let element = match data_type {
            Some(DataType::Array(inner)) => Some(inner.as_ref()),
            _ => None,
        };
        let parts = items
            .iter()
            .map(|item| self.value(item, element))
            .collect::<Result<Vec<_>>>()?;
        let mut out = format!("ARRAY[{}]", parts.join(","));
        match element {
            Some(element) if items.is_empty() || element.is_text() => {
                let _ = write!(out, "::{}[]", element.to_sql(self.kind()));
            }
            None if items.is_empty() => out.push_str("::TEXT[]"),
            _ => {}
        }
        Ok(out)
    }

    /// Serialize `value` as a JSON document literal.
    ///
    /// MySQL compares JSON by value only once the literal is cast.
    pub fn json_document(&self, value: &Value) -> Result<String> {
        let json = value_to_json(value);
        let literal = self.string(&serde_json::to_string(&json)?);
        Ok(match self.kind() {
            DialectKind::Mysql => format!("CAST({literal} AS JSON)"),
            _ => literal,
        })
    }

    /// Reject values whose shape cannot be stored in a column of `data_type`.
    fn check_type(&self, value: &Value, data_type: &DataType) -> Result<()> {
        let ok = match data_type {
            DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt => {
                matches!(value, Value::Int(_) | Value::Null | Value::Default)
                    || value.as_str().is_some_and(|s| s.parse::<i64>().is_ok())
            }
            DataType::Array(_) => matches!(value, Value::Array(_) | Value::Null | Value::Default),
            _ => !matches!(value, Value::Array(_)) || matches!(data_type, DataType::Custom(_)),
        };
        if ok {
            Ok(())
        } else {
            Err(ValidationError::new(
                ValidationErrorKind::InvalidOperand,
                format!(
                    "{} is not a valid {}",
                    describe(value),
                    data_type_label(data_type)
                ),
            )
            .into())
        }
    }
}

/// Short human rendering of a value for error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Text(s) | Value::Decimal(s) => format!("'{s}'"),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(describe).collect();
            format!("[ {} ]", parts.join(", "))
        }
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        other => other.type_name().to_lowercase(),
    }
}

fn data_type_label(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt => "integer",
        DataType::Array(_) => "array",
        DataType::Boolean => "boolean",
        d if d.is_temporal() => "date",
        d if d.is_numeric() => "number",
        _ => "value",
    }
}

/// Convert a value to the JSON document it represents.
pub(crate) fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::Null | Value::Default => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Decimal(s) | Value::Text(s) => Json::String(s.clone()),
        Value::Bytes(b) => Json::String(hex(b)),
        Value::Date(d) => Json::String(d.format("%Y-%m-%d").to_string()),
        Value::Time(t) => Json::String(t.format("%H:%M:%S%.3f").to_string()),
        Value::Timestamp(t) => Json::String(t.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()),
        Value::DateTime(t) => Json::String(t.to_rfc3339()),
        Value::Uuid(bytes) => Json::String(Value::uuid_string(bytes)),
        Value::Json(json) => json.clone(),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
    }
}

fn invalid_number(message: impl Into<String>) -> Error {
    Error::validation(ValidationErrorKind::InvalidNumber, message)
}
