//! Filter trees and their compilation to SQL predicates.
//!
//! A [`Where`] is the statement-level tree (attribute keys, `AND`, `OR`,
//! `NOT`); a [`Cond`] is what one attribute is compared against. Trees can
//! be built in code or parsed from a JSON filter document with `$op` keys:
//!
//! ```
//! use sqlgen_query::Where;
//! use serde_json::json;
//!
//! let filter = Where::from_json(&json!({
//!     "age": { "$gte": 18 },
//!     "$or": [{ "role": "admin" }, { "role": "owner" }]
//! }))
//! .unwrap();
//! assert!(!filter.is_empty());
//! ```

use serde_json::Value as JsonValue;
use sqlgen_core::{DataType, DialectKind, Error, Result, ValidationError, ValidationErrorKind, Value};

use crate::expr::{Expr, JsonSegment, Literal, RenderContext, Rendered};
use crate::generator::QueryGenerator;
use crate::operator::Op;

/// A filter over rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    And(Vec<Where>),
    Or(Vec<Where>),
    Not(Box<Where>),
    /// `key` is an attribute name with optional JSON path, `:unquote` and
    /// `::type` suffixes, or a `$assoc.attr$` association reference.
    Attr { key: String, cond: Cond },
    Compare { left: Expr, cond: Cond },
    /// A boolean expression used as is
    Expr(Expr),
}

/// What an attribute is compared against.
#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    /// Implicit comparison: `=`, `IS NULL` for null, `IN` for lists.
    Value(Expr),
    Op(Op, Operand),
    And(Vec<Cond>),
    Or(Vec<Cond>),
    Not(Box<Cond>),
    /// Nested JSON keys of the attribute
    Object(Vec<(String, Cond)>),
}

/// Right-hand side of an operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Expr(Expr),
    List(Vec<Expr>),
    Any(ArraySource),
    All(ArraySource),
}

/// Source of `ANY (...)` / `ALL (...)`.
#[derive(Debug, Clone, PartialEq)]
pub enum ArraySource {
    Array(Vec<Expr>),
    Values(Vec<Expr>),
    Literal(Expr),
}

impl From<Expr> for Operand {
    fn from(expr: Expr) -> Self {
        Operand::Expr(expr)
    }
}

impl Operand {
    pub fn value(value: impl Into<Value>) -> Self {
        Operand::Expr(Expr::Value(value.into()))
    }

    pub fn list<T: Into<Expr>>(items: impl IntoIterator<Item = T>) -> Self {
        Operand::List(items.into_iter().map(Into::into).collect())
    }

    pub fn col(name: impl Into<String>) -> Self {
        Operand::Expr(Expr::col(name))
    }
}

impl Cond {
    pub fn value(value: impl Into<Expr>) -> Self {
        Cond::Value(value.into())
    }

    pub fn op(op: Op, operand: impl Into<Operand>) -> Self {
        Cond::Op(op, operand.into())
    }

    pub fn and(items: impl IntoIterator<Item = Cond>) -> Self {
        Cond::And(items.into_iter().collect())
    }

    pub fn or(items: impl IntoIterator<Item = Cond>) -> Self {
        Cond::Or(items.into_iter().collect())
    }

    pub fn not(cond: Cond) -> Self {
        Cond::Not(Box::new(cond))
    }

    /// Parse the value side of a JSON filter entry.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        match json {
            JsonValue::Array(items) => Ok(Cond::Value(Expr::List(
                items.iter().map(operand_expr).collect::<Result<_>>()?,
            ))),
            JsonValue::Object(map) if is_expression_object(map) => Ok(Cond::Value(operand_expr(json)?)),
            JsonValue::Object(map) => {
                let mut conds = Vec::new();
                let mut nested = Vec::new();
                for (key, value) in map {
                    match key.as_str() {
                        "$and" => conds.push(Cond::And(cond_list(value)?)),
                        "$or" => conds.push(Cond::Or(cond_list(value)?)),
                        "$not" => conds.push(match value {
                            JsonValue::Object(map) if !is_expression_object(map) => {
                                Cond::Not(Box::new(Cond::from_json(value)?))
                            }
                            JsonValue::Null | JsonValue::Bool(_) => {
                                Cond::Op(Op::IsNot, Operand::Expr(operand_expr(value)?))
                            }
                            _ => Cond::Op(Op::Ne, operand_from_json(Op::Ne, value)?),
                        }),
                        k if k.starts_with('$') => {
                            let op: Op = k.parse()?;
                            conds.push(Cond::Op(op, operand_from_json(op, value)?));
                        }
                        _ => nested.push((key.clone(), Cond::from_json(value)?)),
                    }
                }
                if !nested.is_empty() {
                    conds.push(Cond::Object(nested));
                }
                Ok(if conds.len() == 1 {
                    conds.remove(0)
                } else {
                    Cond::And(conds)
                })
            }
            scalar => Ok(Cond::Value(Expr::Value(json_scalar(scalar)))),
        }
    }
}

impl Where {
    pub fn and(items: impl IntoIterator<Item = Where>) -> Self {
        Where::And(items.into_iter().collect())
    }

    pub fn or(items: impl IntoIterator<Item = Where>) -> Self {
        Where::Or(items.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(where_: Where) -> Self {
        Where::Not(Box::new(where_))
    }

    pub fn attr(key: impl Into<String>, cond: Cond) -> Self {
        Where::Attr {
            key: key.into(),
            cond,
        }
    }

    /// `key = value` (or `IS NULL` / `IN (...)` depending on the value).
    pub fn eq(key: impl Into<String>, value: impl Into<Expr>) -> Self {
        Where::attr(key, Cond::Value(value.into()))
    }

    pub fn op(key: impl Into<String>, op: Op, operand: impl Into<Operand>) -> Self {
        Where::attr(key, Cond::Op(op, operand.into()))
    }

    pub fn compare(left: impl Into<Expr>, cond: Cond) -> Self {
        Where::Compare {
            left: left.into(),
            cond,
        }
    }

    pub fn literal(sql: impl Into<String>) -> Self {
        Where::Expr(Expr::Literal(Literal::new(sql)))
    }

    /// True when the filter renders nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Where::And(items) | Where::Or(items) => items.iter().all(Where::is_empty),
            Where::Not(inner) => inner.is_empty(),
            _ => false,
        }
    }

    /// Parse a JSON filter document.
    ///
    /// Objects AND their keys, arrays AND their elements, and `$and`,
    /// `$or`, `$not` combine nested filters.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        match json {
            JsonValue::Object(map) => {
                let mut items = map
                    .iter()
                    .map(|(key, value)| Where::from_json_entry(key, value))
                    .collect::<Result<Vec<_>>>()?;
                Ok(if items.len() == 1 {
                    items.remove(0)
                } else {
                    Where::And(items)
                })
            }
            JsonValue::Array(items) => Ok(Where::And(
                items.iter().map(Where::from_json).collect::<Result<_>>()?,
            )),
            other => Err(Error::validation(
                ValidationErrorKind::Invalid,
                format!("A filter must be an object or an array, got {other}"),
            )),
        }
    }

    fn from_json_entry(key: &str, value: &JsonValue) -> Result<Self> {
        match key {
            "$and" => Ok(Where::And(where_list(value)?)),
            "$or" => Ok(Where::Or(where_list(value)?)),
            "$not" => Ok(Where::Not(Box::new(Where::from_json(value)?))),
            k if k.starts_with('$') && !is_association_key(k) => {
                let op: Op = k.parse()?;
                Err(ValidationError::new(
                    ValidationErrorKind::Invalid,
                    format!("{op} must be used on an attribute, not at the top level of a filter"),
                )
                .with_operator(op.to_string())
                .into())
            }
            _ => Ok(Where::Attr {
                key: key.to_string(),
                cond: Cond::from_json(value)?,
            }),
        }
    }
}

/// `{ "$col": "name" }` and `{ "$literal": "sql" }` stand for expressions.
fn is_expression_object(map: &serde_json::Map<String, JsonValue>) -> bool {
    map.len() == 1 && (map.contains_key("$col") || map.contains_key("$literal"))
}

fn is_association_key(key: &str) -> bool {
    key.len() > 2 && key[1..].contains('$')
}

fn where_list(json: &JsonValue) -> Result<Vec<Where>> {
    match json {
        JsonValue::Array(items) => items.iter().map(Where::from_json).collect(),
        JsonValue::Object(map) => map
            .iter()
            .map(|(key, value)| Where::from_json_entry(key, value))
            .collect(),
        other => Err(Error::validation(
            ValidationErrorKind::Invalid,
            format!("$and and $or expect an array or an object, got {other}"),
        )),
    }
}

fn cond_list(json: &JsonValue) -> Result<Vec<Cond>> {
    match json {
        JsonValue::Array(items) => items.iter().map(Cond::from_json).collect(),
        JsonValue::Object(map) => map
            .iter()
            .map(|(key, value)| {
                let mut single = serde_json::Map::new();
                single.insert(key.clone(), value.clone());
                Cond::from_json(&JsonValue::Object(single))
            })
            .collect(),
        other => Ok(vec![Cond::from_json(other)?]),
    }
}

fn operand_from_json(op: Op, json: &JsonValue) -> Result<Operand> {
    match json {
        JsonValue::Array(items) => Ok(Operand::List(
            items.iter().map(operand_expr).collect::<Result<_>>()?,
        )),
        JsonValue::Object(map) if map.len() == 1 && map.contains_key("$any") => {
            Ok(Operand::Any(array_source(&map["$any"])?))
        }
        JsonValue::Object(map) if map.len() == 1 && map.contains_key("$all") => {
            Ok(Operand::All(array_source(&map["$all"])?))
        }
        JsonValue::String(name) if op == Op::Col => Ok(Operand::Expr(Expr::col(name.clone()))),
        other => Ok(Operand::Expr(operand_expr(other)?)),
    }
}

fn array_source(json: &JsonValue) -> Result<ArraySource> {
    match json {
        JsonValue::Array(items) => Ok(ArraySource::Array(
            items.iter().map(operand_expr).collect::<Result<_>>()?,
        )),
        JsonValue::Object(map) if map.len() == 1 && map.contains_key("$values") => {
            match &map["$values"] {
                JsonValue::Array(items) => Ok(ArraySource::Values(
                    items.iter().map(operand_expr).collect::<Result<_>>()?,
                )),
                single => Ok(ArraySource::Values(vec![operand_expr(single)?])),
            }
        }
        JsonValue::Object(map) if is_expression_object(map) => Ok(ArraySource::Literal(operand_expr(json)?)),
        other => Err(Error::validation(
            ValidationErrorKind::InvalidOperand,
            format!("$any and $all expect an array, $values or a literal, got {other}"),
        )),
    }
}

fn operand_expr(json: &JsonValue) -> Result<Expr> {
    match json {
        JsonValue::Object(map) if map.len() == 1 => {
            if let Some(name) = map.get("$col") {
                return match name {
                    JsonValue::String(name) => Ok(Expr::col(name.clone())),
                    other => Err(Error::validation(
                        ValidationErrorKind::InvalidOperand,
                        format!("$col expects a column name, got {other}"),
                    )),
                };
            }
            if let Some(sql) = map.get("$literal") {
                return match sql {
                    JsonValue::String(sql) => Ok(Expr::literal(sql.clone())),
                    other => Err(Error::validation(
                        ValidationErrorKind::InvalidOperand,
                        format!("$literal expects SQL text, got {other}"),
                    )),
                };
            }
            Ok(Expr::Value(Value::Json(json.clone())))
        }
        JsonValue::Object(_) => Ok(Expr::Value(Value::Json(json.clone()))),
        JsonValue::Array(items) => Ok(Expr::Value(Value::Array(
            items.iter().map(json_scalar).collect(),
        ))),
        scalar => Ok(Expr::Value(json_scalar(scalar))),
    }
}

fn json_scalar(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::Int(i),
            (None, Some(f)) if n.is_f64() => Value::Float(f),
            _ => Value::Decimal(n.to_string()),
        },
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Array(items) => Value::Array(items.iter().map(json_scalar).collect()),
        JsonValue::Object(_) => Value::Json(json.clone()),
    }
}

// ==================== Key parsing ====================

/// Split `a.b[0]` style JSON path text into segments.
fn parse_segments(mut rest: &str, key: &str) -> Result<Vec<JsonSegment>> {
    let mut segments = Vec::new();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('.') {
            let end = after.find(['.', '[']).unwrap_or(after.len());
            if end == 0 {
                return Err(invalid_key(key));
            }
            segments.push(JsonSegment::Key(after[..end].to_string()));
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix('[') {
            let end = after.find(']').ok_or_else(|| invalid_key(key))?;
            let index = after[..end].parse::<u64>().map_err(|_| invalid_key(key))?;
            segments.push(JsonSegment::Index(index));
            rest = &after[end + 1..];
        } else {
            return Err(invalid_key(key));
        }
    }
    Ok(segments)
}

fn invalid_key(key: &str) -> Error {
    ValidationError::new(
        ValidationErrorKind::InvalidIdentifier,
        format!("{key} is not a valid attribute path"),
    )
    .with_attribute(key)
    .into()
}

/// Split `::type` casts and the `:unquote` modifier off a key.
fn split_modifiers(key: &str) -> Result<(&str, bool, Vec<&str>)> {
    let mut parts = key.split("::");
    let main = parts.next().unwrap_or_default();
    let casts: Vec<&str> = parts.collect();
    if casts.iter().any(|c| c.is_empty()) {
        return Err(invalid_key(key));
    }
    match main.strip_suffix(":unquote") {
        Some(main) => Ok((main, true, casts)),
        None => Ok((main, false, casts)),
    }
}

fn apply_modifiers(mut expr: Expr, unquote: bool, casts: &[&str]) -> Expr {
    if unquote {
        expr = match expr {
            Expr::Json { base, path, .. } => Expr::Json {
                base,
                path,
                unquote: true,
            },
            other => Expr::unquote(other),
        };
    }
    for cast in casts {
        expr = Expr::cast(expr, *cast);
    }
    expr
}

/// Turn a filter key into the left operand.
pub(crate) fn parse_key(key: &str) -> Result<Expr> {
    let (main, unquote, casts) = split_modifiers(key)?;

    let (head, rest) = if let Some(inner) = main.strip_prefix('$') {
        let close = inner.find('$').ok_or_else(|| invalid_key(key))?;
        let mut parts: Vec<&str> = inner[..close].split('.').collect();
        let attribute = parts.pop().filter(|a| !a.is_empty()).ok_or_else(|| invalid_key(key))?;
        let head = if parts.is_empty() {
            Expr::attr(attribute)
        } else {
            Expr::assoc(parts, attribute)
        };
        (head, &inner[close + 1..])
    } else {
        let end = main.find(['.', '[']).unwrap_or(main.len());
        if end == 0 {
            return Err(invalid_key(key));
        }
        (Expr::attr(&main[..end]), &main[end..])
    };

    let path = parse_segments(rest, key)?;
    let expr = if path.is_empty() {
        head
    } else {
        Expr::Json {
            base: Box::new(head),
            path,
            unquote: false,
        }
    };
    Ok(apply_modifiers(expr, unquote, &casts))
}

/// Descend into a nested JSON key of `left`.
fn extend_json(left: &Expr, key: &str) -> Result<Expr> {
    let (main, unquote, casts) = split_modifiers(key)?;
    let path_text = if main.starts_with('[') {
        main.to_string()
    } else {
        format!(".{main}")
    };
    let mut segments = parse_segments(&path_text, key)?;
    let expr = match left {
        Expr::Json {
            base,
            path,
            unquote: false,
        } => {
            let mut path = path.clone();
            path.append(&mut segments);
            Expr::Json {
                base: base.clone(),
                path,
                unquote: false,
            }
        }
        other => Expr::Json {
            base: Box::new(other.clone()),
            path: segments,
            unquote: false,
        },
    };
    Ok(apply_modifiers(expr, unquote, &casts))
}

// ==================== Compilation ====================

/// A compiled predicate; `compound` marks SQL that needs parentheses when
/// combined with siblings.
#[derive(Debug, Default)]
struct Fragment {
    sql: String,
    compound: bool,
}

impl Fragment {
    fn simple(sql: String) -> Self {
        Self {
            sql,
            compound: false,
        }
    }
}

fn join_group(parts: Vec<Fragment>, separator: &str) -> Fragment {
    let mut parts: Vec<Fragment> = parts.into_iter().filter(|p| !p.sql.is_empty()).collect();
    match parts.len() {
        0 => Fragment::default(),
        1 => parts.remove(0),
        _ => Fragment {
            sql: parts
                .into_iter()
                .map(|p| if p.compound { format!("({})", p.sql) } else { p.sql })
                .collect::<Vec<_>>()
                .join(separator),
            compound: true,
        },
    }
}

fn operand_error(op: Op, message: &str) -> Error {
    ValidationError::new(ValidationErrorKind::InvalidOperand, message)
        .with_operator(op.to_string())
        .into()
}

fn with_attribute(err: Error, key: &str) -> Error {
    match err {
        Error::Validation(mut e) if e.attribute.is_none() => {
            e.attribute = Some(key.to_string());
            Error::Validation(e)
        }
        other => other,
    }
}

fn escape_like(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Data type of the elements compared against `left`.
fn element_type(left: &Rendered) -> Option<&DataType> {
    match &left.data_type {
        Some(DataType::Array(inner)) => Some(inner),
        other => other.as_ref(),
    }
}

impl QueryGenerator {
    /// `WHERE ...`, or an empty string when the filter renders nothing.
    pub fn where_query(&self, where_: &Where, ctx: &mut RenderContext<'_>) -> Result<String> {
        let sql = self.where_items(where_, ctx)?;
        if sql.is_empty() {
            Ok(sql)
        } else {
            Ok(format!("WHERE {sql}"))
        }
    }

    /// The predicate without the `WHERE` keyword.
    pub fn where_items(&self, where_: &Where, ctx: &mut RenderContext<'_>) -> Result<String> {
        Ok(self.compile_where(where_, ctx)?.sql)
    }

    /// The predicate, parenthesized when it has more than one term.
    pub(crate) fn where_group(&self, where_: &Where, ctx: &mut RenderContext<'_>) -> Result<String> {
        let fragment = self.compile_where(where_, ctx)?;
        if fragment.compound {
            Ok(format!("({})", fragment.sql))
        } else {
            Ok(fragment.sql)
        }
    }

    fn compile_where(&self, where_: &Where, ctx: &mut RenderContext<'_>) -> Result<Fragment> {
        match where_ {
            Where::And(items) | Where::Or(items) => {
                let separator = if matches!(where_, Where::And(_)) { " AND " } else { " OR " };
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(self.compile_where(item, ctx)?);
                }
                Ok(join_group(parts, separator))
            }
            Where::Not(inner) => {
                let inner = self.compile_where(inner, ctx)?;
                if inner.sql.is_empty() {
                    return Ok(inner);
                }
                Ok(Fragment::simple(format!("NOT ({})", inner.sql)))
            }
            Where::Attr { key, cond } => {
                let left = parse_key(key).map_err(|e| with_attribute(e, key))?;
                self.compile_cond(&left, cond, ctx)
                    .map_err(|e| with_attribute(e, key))
            }
            Where::Compare { left, cond } => self.compile_cond(left, cond, ctx),
            Where::Expr(expr) => Ok(Fragment::simple(self.format_expr(expr, ctx)?)),
        }
    }

    fn compile_cond(&self, left: &Expr, cond: &Cond, ctx: &mut RenderContext<'_>) -> Result<Fragment> {
        match cond {
            Cond::And(items) | Cond::Or(items) => {
                let separator = if matches!(cond, Cond::And(_)) { " AND " } else { " OR " };
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(self.compile_cond(left, item, ctx)?);
                }
                Ok(join_group(parts, separator))
            }
            Cond::Not(inner) => {
                let inner = self.compile_cond(left, inner, ctx)?;
                if inner.sql.is_empty() {
                    return Ok(inner);
                }
                Ok(Fragment::simple(format!("NOT ({})", inner.sql)))
            }
            Cond::Object(entries) => {
                let mut parts = Vec::with_capacity(entries.len());
                for (key, cond) in entries {
                    let nested = extend_json(left, key)?;
                    parts.push(self.compile_cond(&nested, cond, ctx)?);
                }
                Ok(join_group(parts, " AND "))
            }
            Cond::Value(expr) => self.compile_implicit(left, expr, ctx),
            Cond::Op(op, operand) => self.compile_op(left, *op, operand, ctx),
        }
    }

    fn compile_implicit(&self, left: &Expr, right: &Expr, ctx: &mut RenderContext<'_>) -> Result<Fragment> {
        match right {
            Expr::Value(Value::Null) => {
                let l = self.render_expr(left, ctx)?;
                if l.json || matches!(left, Expr::Json { unquote: false, .. }) {
                    return Err(Error::validation(
                        ValidationErrorKind::InvalidOperand,
                        "When comparing against a JSON column, null can mean either the JSON 'null' \
                         or the SQL NULL. You must be explicit about which one you mean by using \
                         Op.is for the SQL NULL or Op.eq for the JSON 'null'.",
                    ));
                }
                Ok(Fragment::simple(format!("{} IS NULL", l.sql)))
            }
            Expr::List(items) => {
                let l = self.render_expr(left, ctx)?;
                let all_values = items.iter().all(|i| matches!(i, Expr::Value(_)));
                if matches!(l.data_type, Some(DataType::Array(_))) && all_values {
                    let values = items
                        .iter()
                        .filter_map(|i| match i {
                            Expr::Value(v) => Some(v.clone()),
                            _ => None,
                        })
                        .collect();
                    let rhs = self.render_value(&Value::Array(values), l.data_type.as_ref(), ctx)?;
                    return Ok(Fragment::simple(format!("{} = {rhs}", l.sql)));
                }
                self.compile_in(&l, Op::In, items, ctx)
            }
            Expr::Value(Value::Array(values)) => {
                let items: Vec<Expr> = values.iter().cloned().map(Expr::Value).collect();
                self.compile_implicit(left, &Expr::List(items), ctx)
            }
            other => self.compile_op(left, Op::Eq, &Operand::Expr(other.clone()), ctx),
        }
    }

    fn compile_in(&self, left: &Rendered, op: Op, items: &[Expr], ctx: &mut RenderContext<'_>) -> Result<Fragment> {
        if items.is_empty() {
            let sql = if op == Op::In { "0 = 1" } else { "1 = 1" };
            return Ok(Fragment::simple(sql.to_string()));
        }
        let data_type = element_type(left).cloned();
        let mut rendered = Vec::with_capacity(items.len());
        for item in items {
            rendered.push(self.render_operand(item, data_type.as_ref(), ctx)?);
        }
        Ok(Fragment::simple(format!(
            "{} {} ({})",
            left.sql,
            op.keyword(self.kind()),
            rendered.join(", ")
        )))
    }

    fn render_operand(&self, expr: &Expr, data_type: Option<&DataType>, ctx: &mut RenderContext<'_>) -> Result<String> {
        match expr {
            Expr::Value(value) => self.render_value(value, data_type, ctx),
            other => self.format_expr(other, ctx),
        }
    }

    fn render_array_source(
        &self,
        source: &ArraySource,
        left: &Rendered,
        ctx: &mut RenderContext<'_>,
    ) -> Result<String> {
        let data_type = element_type(left).cloned();
        match source {
            ArraySource::Array(items) => {
                let mut rendered = Vec::with_capacity(items.len());
                for item in items {
                    rendered.push(self.render_operand(item, data_type.as_ref(), ctx)?);
                }
                if rendered.is_empty() {
                    let element = data_type.map_or_else(
                        || "TEXT".to_string(),
                        |t| t.to_sql(self.kind()),
                    );
                    return Ok(format!("ARRAY[]::{element}[]"));
                }
                Ok(format!("ARRAY[{}]", rendered.join(",")))
            }
            ArraySource::Values(items) => {
                let mut rendered = Vec::with_capacity(items.len());
                for item in items {
                    rendered.push(format!(
                        "({})",
                        self.render_operand(item, data_type.as_ref(), ctx)?
                    ));
                }
                Ok(format!("VALUES {}", rendered.join(", ")))
            }
            ArraySource::Literal(expr) => self.format_expr(expr, ctx),
        }
    }

    fn compile_op(&self, left: &Expr, op: Op, operand: &Operand, ctx: &mut RenderContext<'_>) -> Result<Fragment> {
        op.check_supported(self.dialect())?;
        if matches!(op, Op::And | Op::Or) {
            return Err(operand_error(op, &format!("{op} cannot be used as a comparison operator")));
        }
        let kind = self.kind();
        let l = self.render_expr(left, ctx)?;

        match op {
            Op::Is | Op::IsNot | Op::Not => {
                let rhs = match operand {
                    Operand::Expr(Expr::Value(Value::Null)) => "NULL".to_string(),
                    Operand::Expr(Expr::Value(Value::Bool(b))) => kind.boolean_literal(*b).to_string(),
                    Operand::Expr(expr @ Expr::Literal(_)) => self.format_expr(expr, ctx)?,
                    _ => {
                        return Err(operand_error(
                            op,
                            "Operators Op.is and Op.isNot can only be used with null, true, false or a literal.",
                        ))
                    }
                };
                Ok(Fragment::simple(format!("{} {} {rhs}", l.sql, op.keyword(kind))))
            }
            Op::In | Op::NotIn => match operand {
                Operand::List(items) => self.compile_in(&l, op, items, ctx),
                Operand::Expr(Expr::List(items)) => self.compile_in(&l, op, items, ctx),
                Operand::Expr(Expr::Value(Value::Array(values))) => {
                    let items: Vec<Expr> = values.iter().cloned().map(Expr::Value).collect();
                    self.compile_in(&l, op, &items, ctx)
                }
                Operand::Expr(expr @ Expr::Literal(_)) => Ok(Fragment::simple(format!(
                    "{} {} {}",
                    l.sql,
                    op.keyword(kind),
                    self.format_expr(expr, ctx)?
                ))),
                _ => Err(operand_error(
                    op,
                    "Operators Op.in and Op.notIn must be called with an array of values, or a literal",
                )),
            },
            Op::Between | Op::NotBetween => {
                let bounds: Option<Vec<Expr>> = match operand {
                    Operand::List(items) | Operand::Expr(Expr::List(items)) => Some(items.clone()),
                    Operand::Expr(Expr::Value(Value::Array(values))) => {
                        Some(values.iter().cloned().map(Expr::Value).collect())
                    }
                    _ => None,
                };
                let rhs = match (bounds, operand) {
                    (Some(bounds), _) if bounds.len() == 2 => {
                        let data_type = l.data_type.clone();
                        let low = self.render_operand(&bounds[0], data_type.as_ref(), ctx)?;
                        let high = self.render_operand(&bounds[1], data_type.as_ref(), ctx)?;
                        format!("{low} AND {high}")
                    }
                    (None, Operand::Expr(expr @ Expr::Literal(_))) => self.format_expr(expr, ctx)?,
                    _ => {
                        return Err(operand_error(
                            op,
                            "Operators Op.between and Op.notBetween must be used with an array of two values, or a literal.",
                        ))
                    }
                };
                Ok(Fragment {
                    sql: format!("{} {} {rhs}", l.sql, op.keyword(kind)),
                    compound: true,
                })
            }
            Op::StartsWith | Op::EndsWith | Op::Substring => {
                let rhs = match operand {
                    Operand::Expr(Expr::Value(Value::Text(text))) => {
                        let escaped = escape_like(text);
                        let pattern = match op {
                            Op::StartsWith => format!("{escaped}%"),
                            Op::EndsWith => format!("%{escaped}"),
                            _ => format!("%{escaped}%"),
                        };
                        let value = self.render_value(&Value::Text(pattern), None, ctx)?;
                        if matches!(kind, DialectKind::Mysql | DialectKind::Mariadb) {
                            value
                        } else {
                            format!("{value} ESCAPE '\\'")
                        }
                    }
                    Operand::Expr(expr) => {
                        let inner = self.format_expr(expr, ctx)?;
                        let percent = self.escaper().string("%");
                        match op {
                            Op::StartsWith => format!("CONCAT({inner}, {percent})"),
                            Op::EndsWith => format!("CONCAT({percent}, {inner})"),
                            _ => format!("CONCAT({percent}, {inner}, {percent})"),
                        }
                    }
                    _ => {
                        return Err(operand_error(
                            op,
                            &format!("{op} must be used with a string or an expression"),
                        ))
                    }
                };
                Ok(Fragment::simple(format!("{} LIKE {rhs}", l.sql)))
            }
            Op::Col => {
                let rhs = match operand {
                    Operand::Expr(Expr::Value(Value::Text(name))) => self.quote_identifiers(name),
                    Operand::Expr(expr) => self.format_expr(expr, ctx)?,
                    _ => return Err(operand_error(op, "Op.col must be used with a column name")),
                };
                Ok(Fragment::simple(format!("{} = {rhs}", l.sql)))
            }
            Op::Any | Op::All => {
                let source = match operand {
                    Operand::List(items) | Operand::Expr(Expr::List(items)) => {
                        ArraySource::Array(items.clone())
                    }
                    Operand::Expr(Expr::Value(Value::Array(values))) => {
                        ArraySource::Array(values.iter().cloned().map(Expr::Value).collect())
                    }
                    Operand::Expr(expr @ Expr::Literal(_)) => ArraySource::Literal(expr.clone()),
                    Operand::Any(source) | Operand::All(source) => source.clone(),
                    Operand::Expr(_) => {
                        return Err(operand_error(op, &format!("{op} must be used with an array of values")))
                    }
                };
                let word = if op == Op::Any { "ANY" } else { "ALL" };
                let rhs = self.render_array_source(&source, &l, ctx)?;
                Ok(Fragment::simple(format!("{} = {word} ({rhs})", l.sql)))
            }
            _ => self.compile_comparison(&l, op, operand, ctx),
        }
    }

    /// Binary operators whose right side is a single value or expression.
    fn compile_comparison(&self, l: &Rendered, op: Op, operand: &Operand, ctx: &mut RenderContext<'_>) -> Result<Fragment> {
        let kind = self.kind();
        let keyword = op.keyword(kind);
        let typed = !matches!(
            op,
            Op::Like | Op::NotLike | Op::ILike | Op::NotILike | Op::Regexp | Op::NotRegexp | Op::IRegexp | Op::NotIRegexp | Op::Match
        );
        let data_type = if typed { l.data_type.clone() } else { None };

        let rhs = match operand {
            Operand::Any(source) | Operand::All(source) => {
                Op::Any.check_supported(self.dialect())?;
                let word = if matches!(operand, Operand::Any(_)) { "ANY" } else { "ALL" };
                format!("{word} ({})", self.render_array_source(source, l, ctx)?)
            }
            Operand::List(items) => {
                let values: Option<Vec<Value>> = items
                    .iter()
                    .map(|i| match i {
                        Expr::Value(v) => Some(v.clone()),
                        _ => None,
                    })
                    .collect();
                let array_like = op.is_range() || matches!(data_type, Some(DataType::Array(_)));
                match values {
                    Some(values) if array_like => {
                        self.render_value(&Value::Array(values), data_type.as_ref(), ctx)?
                    }
                    _ => {
                        return Err(operand_error(
                            op,
                            &format!("{op} cannot be used with a list of values"),
                        ))
                    }
                }
            }
            Operand::Expr(Expr::Value(value)) if l.json && !l.data_type.as_ref().is_some_and(|t| !t.is_json()) => {
                match (op, value.is_null()) {
                    (Op::Eq | Op::Ne, _) | (_, false) => self.escaper().json_document(value)?,
                    _ => "NULL".to_string(),
                }
            }
            Operand::Expr(Expr::Value(Value::Null)) if matches!(op, Op::Eq | Op::Ne) => {
                let keyword = if op == Op::Eq { "IS" } else { "IS NOT" };
                return Ok(Fragment::simple(format!("{} {keyword} NULL", l.sql)));
            }
            Operand::Expr(expr) => self.render_operand(expr, data_type.as_ref(), ctx)?,
        };
        Ok(Fragment::simple(format!("{} {keyword} {rhs}", l.sql)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::BindCollector;
    use serde_json::json;
    use sqlgen_core::{Attribute, ModelDefinition};

    fn generator(kind: DialectKind) -> QueryGenerator {
        QueryGenerator::for_kind(kind).unwrap()
    }

    fn sql(kind: DialectKind, filter: serde_json::Value) -> String {
        let where_ = Where::from_json(&filter).unwrap();
        generator(kind).where_query(&where_, &mut RenderContext::new()).unwrap()
    }

    fn pg(filter: serde_json::Value) -> String {
        sql(DialectKind::Postgres, filter)
    }

    fn pg_err(filter: serde_json::Value) -> Error {
        let where_ = match Where::from_json(&filter) {
            Ok(w) => w,
            Err(e) => return e,
        };
        generator(DialectKind::Postgres)
            .where_query(&where_, &mut RenderContext::new())
            .unwrap_err()
    }

    // ==================== Basics ====================

    #[test]
    fn test_implicit_equality() {
        assert_eq!(pg(json!({ "id": 1 })), "WHERE \"id\" = 1");
        assert_eq!(pg(json!({ "name": "Ada" })), "WHERE \"name\" = 'Ada'");
        assert_eq!(pg(json!({ "deletedAt": null })), "WHERE \"deletedAt\" IS NULL");
    }

    #[test]
    fn test_empty_filter() {
        assert_eq!(pg(json!({})), "");
        assert_eq!(pg(json!({ "$or": [] })), "");
        assert_eq!(pg(json!({ "$not": {} })), "");
    }

    #[test]
    fn test_implicit_and_of_siblings() {
        assert_eq!(
            pg(json!({ "a": 5, "b": 6 })),
            "WHERE \"a\" = 5 AND \"b\" = 6"
        );
    }

    #[test]
    fn test_or_on_attribute_values() {
        assert_eq!(
            sql(DialectKind::Mssql, json!({ "type": { "$or": ["group", "private"] } })),
            "WHERE [type] = N'group' OR [type] = N'private'"
        );
    }

    #[test]
    fn test_nested_groups_are_parenthesized() {
        assert_eq!(
            pg(json!({ "$or": [{ "a": 5, "b": 6 }, { "c": 7 }], "d": 1 })),
            "WHERE ((\"a\" = 5 AND \"b\" = 6) OR \"c\" = 7) AND \"d\" = 1"
        );
    }

    #[test]
    fn test_not() {
        assert_eq!(
            pg(json!({ "$not": { "a": 1, "b": 2 } })),
            "WHERE NOT (\"a\" = 1 AND \"b\" = 2)"
        );
        assert_eq!(pg(json!({ "a": { "$not": true } })), "WHERE \"a\" IS NOT true");
        assert_eq!(pg(json!({ "a": { "$not": 3 } })), "WHERE \"a\" != 3");
    }

    // ==================== Operators ====================

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            pg(json!({ "age": { "$gte": 18, "$lt": 65 } })),
            "WHERE \"age\" >= 18 AND \"age\" < 65"
        );
        assert_eq!(pg(json!({ "a": { "$ne": null } })), "WHERE \"a\" IS NOT NULL");
        assert_eq!(pg(json!({ "a": { "$eq": null } })), "WHERE \"a\" IS NULL");
    }

    #[test]
    fn test_in_and_empty_in() {
        assert_eq!(pg(json!({ "id": [1, 2, 3] })), "WHERE \"id\" IN (1, 2, 3)");
        assert_eq!(pg(json!({ "id": { "$in": [] } })), "WHERE 0 = 1");
        assert_eq!(pg(json!({ "id": { "$notIn": [] } })), "WHERE 1 = 1");
        assert_eq!(pg(json!({ "id": { "$notIn": [4] } })), "WHERE \"id\" NOT IN (4)");
        assert_eq!(pg(json!({ "id": [] })), "WHERE 0 = 1");
    }

    #[test]
    fn test_in_requires_list() {
        let err = pg_err(json!({ "id": { "$in": 5 } }));
        assert_eq!(
            err.to_string(),
            "Operators Op.in and Op.notIn must be called with an array of values, or a literal"
        );
        match err {
            Error::Validation(e) => {
                assert_eq!(e.attribute.as_deref(), Some("id"));
                assert_eq!(e.operator.as_deref(), Some("Op.in"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_between() {
        assert_eq!(
            pg(json!({ "age": { "$between": [1, 10] } })),
            "WHERE \"age\" BETWEEN 1 AND 10"
        );
        assert_eq!(
            pg(json!({ "age": { "$notBetween": [1, 10] }, "b": 1 })),
            "WHERE (\"age\" NOT BETWEEN 1 AND 10) AND \"b\" = 1"
        );
        let err = pg_err(json!({ "age": { "$between": [1] } }));
        assert_eq!(
            err.to_string(),
            "Operators Op.between and Op.notBetween must be used with an array of two values, or a literal."
        );
    }

    #[test]
    fn test_is_operator() {
        assert_eq!(pg(json!({ "a": { "$is": null } })), "WHERE \"a\" IS NULL");
        assert_eq!(
            sql(DialectKind::Sqlite, json!({ "a": { "$isNot": false } })),
            "WHERE `a` IS NOT 0"
        );
        let err = pg_err(json!({ "a": { "$is": 5 } }));
        assert_eq!(
            err.to_string(),
            "Operators Op.is and Op.isNot can only be used with null, true, false or a literal."
        );
    }

    #[test]
    fn test_like_helpers_escape_wildcards() {
        assert_eq!(
            pg(json!({ "name": { "$startsWith": "50%_off" } })),
            "WHERE \"name\" LIKE '50\\%\\_off%' ESCAPE '\\'"
        );
        assert_eq!(
            sql(DialectKind::Mysql, json!({ "name": { "$endsWith": "x" } })),
            "WHERE `name` LIKE '%x'"
        );
        assert_eq!(
            sql(DialectKind::Mssql, json!({ "name": { "$substring": { "$col": "other" } } })),
            "WHERE [name] LIKE CONCAT(N'%', [other], N'%')"
        );
    }

    #[test]
    fn test_col_renders_identifier() {
        assert_eq!(
            pg(json!({ "a": { "$col": "b" } })),
            "WHERE \"a\" = \"b\""
        );
        assert_eq!(
            pg(json!({ "a": { "$gt": { "$col": "User.b" } } })),
            "WHERE \"a\" > \"User\".\"b\""
        );
        assert_eq!(pg(json!({ "a": "b" })), "WHERE \"a\" = 'b'");
    }

    #[test]
    fn test_regexp_and_ilike_gating() {
        assert_eq!(
            pg(json!({ "name": { "$iLike": "%a%" } })),
            "WHERE \"name\" ILIKE '%a%'"
        );
        assert_eq!(
            sql(DialectKind::Mysql, json!({ "name": { "$regexp": "^a" } })),
            "WHERE `name` REGEXP '^a'"
        );
        let where_ = Where::from_json(&json!({ "name": { "$iLike": "a" } })).unwrap();
        let err = generator(DialectKind::Sqlite)
            .where_query(&where_, &mut RenderContext::new())
            .unwrap_err();
        assert!(err.is_capability());
    }

    #[test]
    fn test_any_and_values() {
        assert_eq!(
            pg(json!({ "id": { "$any": [2, 3] } })),
            "WHERE \"id\" = ANY (ARRAY[2,3])"
        );
        assert_eq!(
            pg(json!({ "name": { "$like": { "$any": ["a%", "b%"] } } })),
            "WHERE \"name\" LIKE ANY (ARRAY['a%','b%'])"
        );
        assert_eq!(
            pg(json!({ "id": { "$ne": { "$all": { "$values": [1, 2] } } } })),
            "WHERE \"id\" != ALL (VALUES (1), (2))"
        );
    }

    #[test]
    fn test_array_operators() {
        assert_eq!(
            pg(json!({ "tags": { "$overlap": ["a", "b"] } })),
            "WHERE \"tags\" && ARRAY['a','b']"
        );
        let where_ = Where::from_json(&json!({ "tags": { "$contains": ["a"] } })).unwrap();
        assert!(generator(DialectKind::Mysql)
            .where_query(&where_, &mut RenderContext::new())
            .unwrap_err()
            .is_capability());
    }

    #[test]
    fn test_unknown_operator() {
        let err = pg_err(json!({ "a": { "$explode": 1 } }));
        match err {
            Error::Validation(e) => assert_eq!(e.kind, ValidationErrorKind::UnknownOperator),
            other => panic!("unexpected {other:?}"),
        }
    }

    // ==================== Typed attributes ====================

    fn model() -> ModelDefinition {
        ModelDefinition::new("User", "users")
            .attribute(Attribute::primary_key("id"))
            .attribute(Attribute::new("tags", DataType::Array(Box::new(DataType::string()))))
            .attribute(Attribute::new("meta", DataType::JsonB))
    }

    fn typed(filter: serde_json::Value) -> Result<String> {
        let model = model();
        let where_ = Where::from_json(&filter)?;
        generator(DialectKind::Postgres).where_query(
            &where_,
            &mut RenderContext::new().with_model(&model).with_prefix("\"User\""),
        )
    }

    #[test]
    fn test_typed_attributes() {
        assert_eq!(typed(json!({ "id": 1 })).unwrap(), "WHERE \"User\".\"id\" = 1");
        assert!(typed(json!({ "id": "abc" })).unwrap_err().is_validation());
        assert_eq!(
            typed(json!({ "tags": ["a", "b"] })).unwrap(),
            "WHERE \"User\".\"tags\" = ARRAY['a','b']::VARCHAR(255)[]"
        );
    }

    #[test]
    fn test_json_paths() {
        assert_eq!(
            typed(json!({ "meta.name": "x" })).unwrap(),
            "WHERE \"User\".\"meta\"->'name' = '\"x\"'"
        );
        assert_eq!(
            typed(json!({ "meta": { "address": { "city": "Oslo" } } })).unwrap(),
            "WHERE \"User\".\"meta\"#>ARRAY['address','city']::VARCHAR(255)[] = '\"Oslo\"'"
        );
        assert_eq!(
            typed(json!({ "meta.name:unquote": "x" })).unwrap(),
            "WHERE \"User\".\"meta\"->>'name' = 'x'"
        );
        assert_eq!(
            typed(json!({ "meta.age::integer": { "$gt": 3 } })).unwrap(),
            "WHERE CAST(\"User\".\"meta\"->'age' AS INTEGER) > 3"
        );
        assert_eq!(
            typed(json!({ "meta.list[0]": 1 })).unwrap(),
            "WHERE \"User\".\"meta\"#>ARRAY['list','0']::VARCHAR(255)[] = '1'"
        );
    }

    #[test]
    fn test_json_null_must_be_explicit() {
        assert!(typed(json!({ "meta": null })).unwrap_err().is_validation());
        assert_eq!(typed(json!({ "meta": { "$is": null } })).unwrap(), "WHERE \"User\".\"meta\" IS NULL");
        assert_eq!(
            typed(json!({ "meta": { "$eq": null } })).unwrap(),
            "WHERE \"User\".\"meta\" = 'null'"
        );
    }

    #[test]
    fn test_json_values_on_mysql_are_cast() {
        assert_eq!(
            sql(DialectKind::Mysql, json!({ "meta.name": "x" })),
            "WHERE json_extract(`meta`,'$.name') = CAST('\\\"x\\\"' AS JSON)"
        );
    }

    #[test]
    fn test_association_keys() {
        assert_eq!(
            pg(json!({ "$projects.tasks.title$": "x" })),
            "WHERE \"projects->tasks\".\"title\" = 'x'"
        );
    }

    // ==================== Binding ====================

    #[test]
    fn test_values_are_bound_in_order() {
        let where_ = Where::from_json(&json!({ "a": 1, "b": { "$in": ["x", "y"] } })).unwrap();
        let mut binds = BindCollector::new();
        let sql = generator(DialectKind::Postgres)
            .where_query(&where_, &mut RenderContext::new().with_binds(&mut binds))
            .unwrap();
        assert_eq!(
            sql,
            "WHERE \"a\" = $sequelize_1 AND \"b\" IN ($sequelize_2, $sequelize_3)"
        );
        let binds = binds.into_binds();
        assert_eq!(binds[1], ("sequelize_2".to_string(), Value::from("x")));
    }

    #[test]
    fn test_is_never_binds() {
        let where_ = Where::op("a", Op::Is, Operand::value(true));
        let mut binds = BindCollector::new();
        let sql = generator(DialectKind::Postgres)
            .where_query(&where_, &mut RenderContext::new().with_binds(&mut binds))
            .unwrap();
        assert_eq!(sql, "WHERE \"a\" IS true");
        assert!(binds.is_empty());
    }

    // ==================== Builders ====================

    #[test]
    fn test_builder_api() {
        let where_ = Where::and([
            Where::eq("status", "active"),
            Where::or([
                Where::op("age", Op::Gt, Operand::value(30)),
                Where::compare(Expr::func("LOWER", [Expr::col("name")]), Cond::value("ada")),
            ]),
            Where::literal("1 = 1"),
        ]);
        assert_eq!(
            generator(DialectKind::Postgres)
                .where_query(&where_, &mut RenderContext::new())
                .unwrap(),
            "WHERE \"status\" = 'active' AND (\"age\" > 30 OR LOWER(\"name\") = 'ada') AND 1 = 1"
        );
    }

    #[test]
    fn test_injection_in_values_is_escaped() {
        assert_eq!(
            pg(json!({ "name": "x'; DROP TABLE users; --" })),
            "WHERE \"name\" = 'x''; DROP TABLE users; --'"
        );
    }
}
