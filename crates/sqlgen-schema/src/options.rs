//! Operation options for the DDL generators.
//!
//! Plain flag records derive serde so migration tooling can store them
//! next to the operation that produced them.

use serde::{Deserialize, Serialize};
use sqlgen_core::{DataType, Deferrable, ForeignKeyReference, ReferentialAction, TableRef, Value};
use sqlgen_query::{Direction, Expr, Where};

// ==================== Indexes ====================

/// One column of an index, with its optional modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexColumn {
    pub name: String,
    pub collate: Option<String>,
    /// Prefix length (`col(7)`)
    pub length: Option<u32>,
    pub order: Option<Direction>,
    /// Operator class (`inet_ops`)
    pub operator: Option<String>,
}

impl IndexColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn collate(mut self, collate: impl Into<String>) -> Self {
        self.collate = Some(collate.into());
        self
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn order(mut self, order: Direction) -> Self {
        self.order = Some(order);
        self
    }

    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }
}

/// An index field: a column or an expression (function-based index).
#[derive(Debug, Clone, PartialEq)]
pub enum IndexField {
    Column(IndexColumn),
    Expr(Expr),
}

impl From<&str> for IndexField {
    fn from(name: &str) -> Self {
        IndexField::Column(IndexColumn::new(name))
    }
}

impl From<String> for IndexField {
    fn from(name: String) -> Self {
        IndexField::Column(IndexColumn::new(name))
    }
}

impl From<IndexColumn> for IndexField {
    fn from(column: IndexColumn) -> Self {
        IndexField::Column(column)
    }
}

impl From<Expr> for IndexField {
    fn from(expr: Expr) -> Self {
        IndexField::Expr(expr)
    }
}

/// Options of `CREATE INDEX`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexOptions {
    pub fields: Vec<IndexField>,
    /// Explicit index name; generated from the prefix and fields otherwise
    pub name: Option<String>,
    /// Prefix of the generated name (defaults to the table name)
    pub prefix: Option<String>,
    pub unique: bool,
    pub concurrently: bool,
    pub if_not_exists: bool,
    /// Covering columns (`INCLUDE (...)`)
    pub include: Vec<Expr>,
    /// Index kind such as `SPATIAL` or `FULLTEXT`
    pub index_type: Option<String>,
    /// Access method (`BTREE`, `gist`)
    pub using: Option<String>,
    /// Operator class applied to every column without its own
    pub operator: Option<String>,
    /// Full-text parser
    pub parser: Option<String>,
    /// Partial index predicate
    pub where_: Option<Where>,
}

impl IndexOptions {
    pub fn new<F: Into<IndexField>>(fields: impl IntoIterator<Item = F>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn concurrently(mut self) -> Self {
        self.concurrently = true;
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn with_include(mut self, include: impl IntoIterator<Item = Expr>) -> Self {
        self.include = include.into_iter().collect();
        self
    }

    pub fn with_type(mut self, index_type: impl Into<String>) -> Self {
        self.index_type = Some(index_type.into());
        self
    }

    pub fn with_using(mut self, using: impl Into<String>) -> Self {
        self.using = Some(using.into());
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    pub fn with_parser(mut self, parser: impl Into<String>) -> Self {
        self.parser = Some(parser.into());
        self
    }

    pub fn with_where(mut self, where_: Where) -> Self {
        self.where_ = Some(where_);
        self
    }
}

/// Which index `DROP INDEX` targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexTarget {
    Name(String),
    /// Fields of an index created with a generated name
    Fields(Vec<String>),
}

impl From<&str> for IndexTarget {
    fn from(name: &str) -> Self {
        IndexTarget::Name(name.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveIndexOptions {
    pub concurrently: bool,
    pub if_exists: bool,
    pub cascade: bool,
}

// ==================== Constraints ====================

/// Columns referenced by a foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintReference {
    pub table: TableRef,
    pub fields: Vec<String>,
}

impl ConstraintReference {
    pub fn new<S: Into<String>>(table: impl Into<TableRef>, fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            table: table.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// The kind-specific part of a table constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    Check(Where),
    Unique,
    /// Column default (mssql)
    Default(Value),
    PrimaryKey,
    ForeignKey {
        references: ConstraintReference,
        on_delete: Option<ReferentialAction>,
        on_update: Option<ReferentialAction>,
    },
}

impl ConstraintKind {
    /// Suffix of generated constraint names.
    pub const fn name_suffix(&self) -> &'static str {
        match self {
            ConstraintKind::Check(_) => "ck",
            ConstraintKind::Unique => "uk",
            ConstraintKind::Default(_) => "df",
            ConstraintKind::PrimaryKey => "pk",
            ConstraintKind::ForeignKey { .. } => "fk",
        }
    }
}

/// Options of `ALTER TABLE ... ADD CONSTRAINT`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintOptions {
    pub kind: ConstraintKind,
    pub fields: Vec<String>,
    pub name: Option<String>,
    pub deferrable: Option<Deferrable>,
}

impl ConstraintOptions {
    pub fn new<S: Into<String>>(kind: ConstraintKind, fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            kind,
            fields: fields.into_iter().map(Into::into).collect(),
            name: None,
            deferrable: None,
        }
    }

    pub fn check<S: Into<String>>(fields: impl IntoIterator<Item = S>, where_: Where) -> Self {
        Self::new(ConstraintKind::Check(where_), fields)
    }

    pub fn unique<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self::new(ConstraintKind::Unique, fields)
    }

    pub fn default_value(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(ConstraintKind::Default(value.into()), [field.into()])
    }

    pub fn primary_key<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self::new(ConstraintKind::PrimaryKey, fields)
    }

    pub fn foreign_key<S: Into<String>>(
        fields: impl IntoIterator<Item = S>,
        references: ConstraintReference,
    ) -> Self {
        Self::new(
            ConstraintKind::ForeignKey {
                references,
                on_delete: None,
                on_update: None,
            },
            fields,
        )
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn deferrable(mut self, deferrable: Deferrable) -> Self {
        self.deferrable = Some(deferrable);
        self
    }

    /// Set `ON DELETE`; ignored for non foreign key constraints.
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        if let ConstraintKind::ForeignKey { on_delete, .. } = &mut self.kind {
            *on_delete = Some(action);
        }
        self
    }

    /// Set `ON UPDATE`; ignored for non foreign key constraints.
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        if let ConstraintKind::ForeignKey { on_update, .. } = &mut self.kind {
            *on_update = Some(action);
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveConstraintOptions {
    pub if_exists: bool,
    pub cascade: bool,
}

/// `SET CONSTRAINTS ... DEFERRED | IMMEDIATE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintChecking {
    /// Named constraints, or all of them when empty
    Deferred(Vec<String>),
    Immediate(Vec<String>),
}

impl ConstraintChecking {
    pub fn constraints(&self) -> &[String] {
        match self {
            ConstraintChecking::Deferred(names) | ConstraintChecking::Immediate(names) => names,
        }
    }

    pub const fn as_sql(&self) -> &'static str {
        match self {
            ConstraintChecking::Deferred(_) => "DEFERRED",
            ConstraintChecking::Immediate(_) => "IMMEDIATE",
        }
    }
}

// ==================== Tables and columns ====================

/// A named composite unique key declared with the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueKey {
    pub name: Option<String>,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTableOptions {
    /// Storage engine (mysql family, defaults to InnoDB)
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collate: Option<String>,
    pub row_format: Option<String>,
    /// Table comment
    pub comment: Option<String>,
    pub unique_keys: Vec<UniqueKey>,
}

impl CreateTableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn with_collate(mut self, collate: impl Into<String>) -> Self {
        self.collate = Some(collate.into());
        self
    }

    pub fn with_row_format(mut self, row_format: impl Into<String>) -> Self {
        self.row_format = Some(row_format.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_unique_key<S: Into<String>>(
        mut self,
        name: Option<&str>,
        fields: impl IntoIterator<Item = S>,
    ) -> Self {
        self.unique_keys.push(UniqueKey {
            name: name.map(str::to_string),
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTableOptions {
    pub cascade: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameTableOptions {
    /// Allow the rename to move the table to another schema
    pub change_schema: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddColumnOptions {
    pub if_not_exists: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveColumnOptions {
    pub if_exists: bool,
    pub cascade: bool,
}

/// The parts of a column definition `changeColumnQuery` should alter.
///
/// Unset fields are left as they are, on dialects that can alter column
/// properties one at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnChange {
    pub data_type: Option<DataType>,
    pub allow_null: Option<bool>,
    /// New default; `Value::Null` sets `DEFAULT NULL`
    pub default_value: Option<Value>,
    pub drop_default: bool,
    pub auto_increment: Option<bool>,
    pub unique: bool,
    pub comment: Option<String>,
    pub references: Option<ForeignKeyReference>,
}

impl ColumnChange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = Some(allow_null);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn drop_default(mut self) -> Self {
        self.drop_default = true;
        self
    }

    pub fn auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = Some(auto_increment);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn references(mut self, reference: ForeignKeyReference) -> Self {
        self.references = Some(reference);
        self
    }

    /// True when nothing is requested.
    pub fn is_empty(&self) -> bool {
        self.data_type.is_none()
            && self.allow_null.is_none()
            && self.default_value.is_none()
            && !self.drop_default
            && self.auto_increment.is_none()
            && !self.unique
            && self.comment.is_none()
            && self.references.is_none()
    }
}

// ==================== Schemas ====================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSchemaOptions {
    /// Owner role
    pub authorization: Option<String>,
    pub charset: Option<String>,
    pub collate: Option<String>,
    pub comment: Option<String>,
    pub if_not_exists: bool,
    pub replace: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropSchemaOptions {
    pub cascade: bool,
    pub if_exists: bool,
}
