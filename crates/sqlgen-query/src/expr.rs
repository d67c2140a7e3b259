//! SQL expression nodes and their rendering.
//!
//! Every value that reaches SQL text goes through one of three paths:
//! a bind placeholder, an escaped literal, or an explicit [`Literal`]
//! fragment written by the caller. Identifiers and values are distinct
//! node types, so a string can never turn into a column reference by
//! accident.

use std::sync::LazyLock;

use regex::Regex;
use sqlgen_core::{
    DataType, Error, ModelDefinition, Result, ValidationError, ValidationErrorKind, Value,
};

use crate::alias::AliasMap;
use crate::bind::{map_placeholders, BindCollector, Token};
use crate::generator::QueryGenerator;
use crate::where_clause::Where;

static FUNCTION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("static regex"));

static CAST_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_ ]*(\([0-9, ]+\))?(\[\])?$").expect("static regex"));

/// One step of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonSegment {
    Key(String),
    Index(u64),
}

impl From<&str> for JsonSegment {
    fn from(key: &str) -> Self {
        JsonSegment::Key(key.to_string())
    }
}

impl From<u64> for JsonSegment {
    fn from(index: u64) -> Self {
        JsonSegment::Index(index)
    }
}

/// Functions whose SQL differs per dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum DialectFn {
    /// JSON document to SQL text
    Unquote(Box<Expr>),
    /// Seconds since the epoch
    UnixTimestamp(Box<Expr>),
}

/// Raw SQL written by the caller.
///
/// `:name` placeholders are replaced with escaped values from
/// `replacements`; `$name` bind placeholders are left for the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub sql: String,
    pub replacements: Vec<(String, Value)>,
}

impl Literal {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            replacements: Vec::new(),
        }
    }

    pub fn with_replacement(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.replacements.push((name.into(), value.into()));
        self
    }
}

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Bound or escaped value
    Value(Value),
    /// Physical column, possibly dotted (`User.id`)
    Column(String),
    /// Identifier given as already-split parts
    Identifier(Vec<String>),
    /// Logical attribute of the current model
    Attribute(String),
    /// Attribute of an included association, e.g. `$projects.tasks.title$`
    AssociationPath { path: Vec<String>, attribute: String },
    Func { name: String, args: Vec<Expr> },
    DialectFn(DialectFn),
    Cast { expr: Box<Expr>, type_name: String },
    Literal(Literal),
    List(Vec<Expr>),
    Json {
        base: Box<Expr>,
        path: Vec<JsonSegment>,
        unquote: bool,
    },
    Where(Box<Where>),
}

impl Expr {
    pub fn col(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    pub fn attr(name: impl Into<String>) -> Self {
        Expr::Attribute(name.into())
    }

    pub fn identifier<S: Into<String>>(parts: impl IntoIterator<Item = S>) -> Self {
        Expr::Identifier(parts.into_iter().map(Into::into).collect())
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Expr::Value(value.into())
    }

    pub fn literal(sql: impl Into<String>) -> Self {
        Expr::Literal(Literal::new(sql))
    }

    pub fn func(name: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Func {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn cast(expr: impl Into<Expr>, type_name: impl Into<String>) -> Self {
        Expr::Cast {
            expr: Box::new(expr.into()),
            type_name: type_name.into(),
        }
    }

    pub fn json<S: Into<JsonSegment>>(base: impl Into<Expr>, path: impl IntoIterator<Item = S>) -> Self {
        Expr::Json {
            base: Box::new(base.into()),
            path: path.into_iter().map(Into::into).collect(),
            unquote: false,
        }
    }

    /// JSON extraction returning SQL text instead of a JSON document.
    pub fn json_unquoted<S: Into<JsonSegment>>(
        base: impl Into<Expr>,
        path: impl IntoIterator<Item = S>,
    ) -> Self {
        Expr::Json {
            base: Box::new(base.into()),
            path: path.into_iter().map(Into::into).collect(),
            unquote: true,
        }
    }

    pub fn assoc<S: Into<String>>(path: impl IntoIterator<Item = S>, attribute: impl Into<String>) -> Self {
        Expr::AssociationPath {
            path: path.into_iter().map(Into::into).collect(),
            attribute: attribute.into(),
        }
    }

    pub fn list(items: impl IntoIterator<Item = Expr>) -> Self {
        Expr::List(items.into_iter().collect())
    }

    pub fn unquote(expr: impl Into<Expr>) -> Self {
        Expr::DialectFn(DialectFn::Unquote(Box::new(expr.into())))
    }

    pub fn unix_timestamp(expr: impl Into<Expr>) -> Self {
        Expr::DialectFn(DialectFn::UnixTimestamp(Box::new(expr.into())))
    }

    pub fn is_null_value(&self) -> bool {
        matches!(self, Expr::Value(Value::Null))
    }
}

macro_rules! impl_from_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Expr::Value(value.into())
                }
            }
        )*
    };
}

impl_from_value!(bool, i32, i64, f64, &str, String, Value);

impl From<Literal> for Expr {
    fn from(literal: Literal) -> Self {
        Expr::Literal(literal)
    }
}

impl From<Where> for Expr {
    fn from(where_: Where) -> Self {
        Expr::Where(Box::new(where_))
    }
}

/// Per-call rendering state.
///
/// The bind collector and alias map belong to the statement being built;
/// without a collector, values are inlined as escaped literals.
#[derive(Debug, Default)]
pub struct RenderContext<'a> {
    pub model: Option<&'a ModelDefinition>,
    /// Quoted alias qualifying attribute references
    pub prefix: Option<String>,
    pub binds: Option<&'a mut BindCollector>,
    pub aliases: Option<&'a mut AliasMap>,
}

impl<'a> RenderContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: &'a ModelDefinition) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_binds(mut self, binds: &'a mut BindCollector) -> Self {
        self.binds = Some(binds);
        self
    }

    pub fn with_aliases(mut self, aliases: &'a mut AliasMap) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// A context for another model sharing this one's binds and aliases.
    pub(crate) fn scoped<'b>(
        &'b mut self,
        model: Option<&'b ModelDefinition>,
        prefix: Option<String>,
    ) -> RenderContext<'b> {
        RenderContext {
            model,
            prefix,
            binds: self.binds.as_deref_mut(),
            aliases: self.aliases.as_deref_mut(),
        }
    }
}

/// Rendered SQL plus what is known about its type.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Rendered {
    pub sql: String,
    pub data_type: Option<DataType>,
    /// The expression produces a JSON document.
    pub json: bool,
}

impl Rendered {
    fn plain(sql: String) -> Self {
        Self {
            sql,
            data_type: None,
            json: false,
        }
    }
}

impl QueryGenerator {
    /// Render an expression to SQL.
    pub fn format_expr(&self, expr: &Expr, ctx: &mut RenderContext<'_>) -> Result<String> {
        Ok(self.render_expr(expr, ctx)?.sql)
    }

    pub(crate) fn render_expr(&self, expr: &Expr, ctx: &mut RenderContext<'_>) -> Result<Rendered> {
        match expr {
            Expr::Value(value) => Ok(Rendered::plain(self.render_value(value, None, ctx)?)),
            Expr::Column(name) => Ok(Rendered::plain(self.quote_identifiers(name))),
            Expr::Identifier(parts) => Ok(Rendered::plain(
                parts
                    .iter()
                    .map(|p| self.quote_identifier(p))
                    .collect::<Vec<_>>()
                    .join("."),
            )),
            Expr::Attribute(name) => Ok(self.render_attribute(name, ctx)),
            Expr::AssociationPath { path, attribute } => {
                let full = path.join("->");
                let alias = match ctx.aliases.as_deref_mut() {
                    Some(aliases) if self.options().minify_aliases => aliases.table(&full),
                    _ => full,
                };
                Ok(Rendered::plain(format!(
                    "{}.{}",
                    self.quote_alias(&alias),
                    self.quote_identifier(attribute)
                )))
            }
            Expr::Func { name, args } => {
                if !FUNCTION_NAME.is_match(name) {
                    return Err(invalid_identifier(format!(
                        "{name} is not a valid function name"
                    )));
                }
                let args = args
                    .iter()
                    .map(|a| self.format_expr(a, ctx))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Rendered::plain(format!("{name}({})", args.join(", "))))
            }
            Expr::DialectFn(DialectFn::Unquote(inner)) => {
                let inner = self.format_expr(inner, ctx)?;
                Ok(Rendered::plain(self.ops().unquote_json(self, &inner)?))
            }
            Expr::DialectFn(DialectFn::UnixTimestamp(inner)) => {
                let inner = self.format_expr(inner, ctx)?;
                Ok(Rendered::plain(self.ops().unix_timestamp(self, &inner)?))
            }
            Expr::Cast { expr, type_name } => {
                let type_name = type_name.trim().to_uppercase();
                if !CAST_TYPE.is_match(&type_name) {
                    return Err(invalid_identifier(format!(
                        "{type_name} is not a valid type name"
                    )));
                }
                let inner = self.format_expr(expr, ctx)?;
                let data_type = cast_data_type(&type_name);
                Ok(Rendered {
                    sql: format!("CAST({inner} AS {type_name})"),
                    json: data_type.is_json(),
                    data_type: Some(data_type),
                })
            }
            Expr::Literal(literal) => Ok(Rendered::plain(self.render_literal(literal)?)),
            Expr::List(items) => {
                let items = items
                    .iter()
                    .map(|i| self.format_expr(i, ctx))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Rendered::plain(format!("({})", items.join(", "))))
            }
            Expr::Json {
                base,
                path,
                unquote,
            } => {
                self.require("jsonOperations", || {
                    format!("JSON operations are not supported by {}", self.dialect_name())
                })?;
                let base = self.format_expr(base, ctx)?;
                let sql = match (path.is_empty(), unquote) {
                    (true, false) => base,
                    (true, true) => self.ops().unquote_json(self, &base)?,
                    (false, _) => self.ops().json_path_extraction(self, &base, path, *unquote)?,
                };
                Ok(Rendered {
                    sql,
                    data_type: None,
                    json: !unquote,
                })
            }
            Expr::Where(where_) => Ok(Rendered::plain(self.where_items(where_, ctx)?)),
        }
    }

    fn render_attribute(&self, name: &str, ctx: &RenderContext<'_>) -> Rendered {
        let attribute = ctx
            .model
            .and_then(|m| m.get(name).or_else(|| m.by_column(name)));
        let column = attribute.map_or(name, |a| a.column_name.as_str());
        let quoted = self.quote_identifier(column);
        let sql = match &ctx.prefix {
            Some(prefix) => format!("{prefix}.{quoted}"),
            None => quoted,
        };
        let data_type = attribute.map(|a| a.data_type.clone());
        Rendered {
            sql,
            json: data_type.as_ref().is_some_and(DataType::is_json),
            data_type,
        }
    }

    /// Bind or inline a value.
    ///
    /// `NULL` and `DEFAULT` are always inlined. Other values are validated
    /// against `data_type` even when they end up bound.
    pub(crate) fn render_value(
        &self,
        value: &Value,
        data_type: Option<&DataType>,
        ctx: &mut RenderContext<'_>,
    ) -> Result<String> {
        if value.is_null() || value.is_default() {
            return self.escaper().value(value, None);
        }
        let inline = self.escaper().value(value, data_type)?;
        match ctx.binds.as_deref_mut() {
            Some(binds) => Ok(binds.collect(value.clone())),
            None => Ok(inline),
        }
    }

    /// Resolve `:name` replacements of a raw fragment.
    fn render_literal(&self, literal: &Literal) -> Result<String> {
        if literal.replacements.is_empty() {
            return Ok(literal.sql.clone());
        }
        let escaper = self.escaper();
        map_placeholders(&literal.sql, self.kind(), &mut |token| match token {
            Token::Bind(_) => Ok(None),
            Token::Replacement(name) => {
                let value = literal
                    .replacements
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| v)
                    .ok_or_else(|| {
                        Error::validation(
                            ValidationErrorKind::Invalid,
                            format!(
                                "Named replacement \":{name}\" has no entry in the replacement map."
                            ),
                        )
                    })?;
                let sql = match value {
                    Value::Array(items) => items
                        .iter()
                        .map(|v| escaper.value(v, None))
                        .collect::<Result<Vec<_>>>()?
                        .join(", "),
                    other => escaper.value(other, None)?,
                };
                Ok(Some(sql))
            }
        })
    }
}

fn invalid_identifier(message: String) -> Error {
    ValidationError::new(ValidationErrorKind::InvalidIdentifier, message).into()
}

/// Logical type of a `CAST` target.
fn cast_data_type(type_name: &str) -> DataType {
    match type_name {
        "INT" | "INTEGER" => DataType::Integer,
        "BIGINT" => DataType::BigInt,
        "SMALLINT" => DataType::SmallInt,
        "TEXT" => DataType::Text,
        "STRING" | "VARCHAR" => DataType::string(),
        "BOOLEAN" | "BOOL" => DataType::Boolean,
        "DATE" => DataType::DateOnly,
        "TIMESTAMP" | "TIMESTAMPTZ" | "DATETIME" => DataType::date(),
        "JSON" => DataType::Json,
        "JSONB" => DataType::JsonB,
        "FLOAT" => DataType::Float,
        "DOUBLE" | "DOUBLE PRECISION" => DataType::Double,
        "DECIMAL" | "NUMERIC" => DataType::Decimal {
            precision: None,
            scale: None,
        },
        other => DataType::Custom(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlgen_core::{Attribute, DialectKind};

    fn generator(kind: DialectKind) -> QueryGenerator {
        QueryGenerator::for_kind(kind).unwrap()
    }

    fn render(kind: DialectKind, expr: &Expr) -> String {
        generator(kind).format_expr(expr, &mut RenderContext::new()).unwrap()
    }

    // ==================== Values ====================

    #[test]
    fn test_strings_are_values_not_columns() {
        assert_eq!(render(DialectKind::Postgres, &"name".into()), "'name'");
        assert_eq!(render(DialectKind::Postgres, &Expr::col("name")), "\"name\"");
    }

    #[test]
    fn test_values_bind_when_collector_present() {
        let generator = generator(DialectKind::Postgres);
        let mut binds = BindCollector::new();
        let sql = generator
            .format_expr(
                &Expr::list([Expr::value(1), Expr::value("a"), Expr::value(Value::Null)]),
                &mut RenderContext::new().with_binds(&mut binds),
            )
            .unwrap();
        assert_eq!(sql, "($sequelize_1, $sequelize_2, NULL)");
        assert_eq!(binds.len(), 2);
    }

    // ==================== Identifiers ====================

    #[test]
    fn test_dotted_columns_and_identifiers() {
        assert_eq!(render(DialectKind::Mysql, &Expr::col("User.id")), "`User`.`id`");
        assert_eq!(
            render(DialectKind::Mssql, &Expr::identifier(["dbo", "users.x"])),
            "[dbo].[users.x]"
        );
    }

    #[test]
    fn test_attribute_resolves_column_and_prefix() {
        let generator = generator(DialectKind::Postgres);
        let model = ModelDefinition::new("User", "users")
            .attribute(Attribute::new("firstName", DataType::string()).column("first_name"));
        let mut ctx = RenderContext::new().with_model(&model).with_prefix("\"User\"");
        assert_eq!(
            generator.format_expr(&Expr::attr("firstName"), &mut ctx).unwrap(),
            "\"User\".\"first_name\""
        );
    }

    #[test]
    fn test_association_path() {
        assert_eq!(
            render(DialectKind::Postgres, &Expr::assoc(["projects", "tasks"], "title")),
            "\"projects->tasks\".\"title\""
        );
    }

    // ==================== Functions ====================

    #[test]
    fn test_function_and_cast() {
        let expr = Expr::func("LOWER", [Expr::col("name")]);
        assert_eq!(render(DialectKind::Postgres, &expr), "LOWER(\"name\")");
        let cast = Expr::cast(Expr::col("age"), "int");
        assert_eq!(render(DialectKind::Postgres, &cast), "CAST(\"age\" AS INT)");
    }

    #[test]
    fn test_function_name_is_validated() {
        let err = generator(DialectKind::Postgres)
            .format_expr(&Expr::func("x(); DROP", []), &mut RenderContext::new())
            .unwrap_err();
        assert!(err.is_validation());
        let err = generator(DialectKind::Postgres)
            .format_expr(&Expr::cast(Expr::col("a"), "int); DROP"), &mut RenderContext::new())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_dialect_functions() {
        assert_eq!(
            render(DialectKind::Mysql, &Expr::unix_timestamp(Expr::col("createdAt"))),
            "UNIX_TIMESTAMP(`createdAt`)"
        );
        assert_eq!(
            render(DialectKind::Postgres, &Expr::unquote(Expr::col("data"))),
            "\"data\"#>>ARRAY[]::TEXT[]"
        );
    }

    // ==================== Literals ====================

    #[test]
    fn test_literal_replacements_are_escaped() {
        let literal = Literal::new("name = :name AND tag IN (:tags)")
            .with_replacement("name", "O'Brien")
            .with_replacement("tags", Value::Array(vec!["a".into(), "b".into()]));
        assert_eq!(
            render(DialectKind::Postgres, &literal.into()),
            "name = 'O''Brien' AND tag IN ('a', 'b')"
        );
    }

    #[test]
    fn test_literal_missing_replacement() {
        let literal = Literal::new("a = :a AND b = :b").with_replacement("a", 1);
        let err = generator(DialectKind::Postgres)
            .format_expr(&literal.into(), &mut RenderContext::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Named replacement \":b\" has no entry in the replacement map."
        );
    }

    #[test]
    fn test_literal_keeps_bind_placeholders() {
        let literal = Literal::new("a = $a AND b = :b").with_replacement("b", 2);
        assert_eq!(render(DialectKind::Postgres, &literal.into()), "a = $a AND b = 2");
    }

    #[test]
    fn test_literal_with_non_ascii_text() {
        let literal = Literal::new("prénom = :x AND größe > :y")
            .with_replacement("x", 1)
            .with_replacement("y", "ß");
        assert_eq!(
            render(DialectKind::Postgres, &literal.into()),
            "prénom = 1 AND größe > 'ß'"
        );
    }

    // ==================== JSON ====================

    #[test]
    fn test_json_extraction_per_dialect() {
        let expr = Expr::json(Expr::col("data"), ["name"]);
        assert_eq!(render(DialectKind::Postgres, &expr), "\"data\"->'name'");
        assert_eq!(render(DialectKind::Sqlite, &expr), "json_extract(`data`,'$.name')");
        let unquoted = Expr::json_unquoted(Expr::col("data"), ["name"]);
        assert_eq!(
            render(DialectKind::Mysql, &unquoted),
            "json_unquote(json_extract(`data`,'$.name'))"
        );
    }

    #[test]
    fn test_json_requires_capability() {
        let err = generator(DialectKind::Oracle)
            .format_expr(&Expr::json(Expr::col("data"), ["name"]), &mut RenderContext::new())
            .unwrap_err();
        assert_eq!(err.unsupported_options(), ["jsonOperations"]);
    }
}
