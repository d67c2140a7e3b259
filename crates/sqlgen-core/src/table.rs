//! Table, attribute and association metadata.
//!
//! These describe the physical shape of a model. They are supplied by the
//! model layer and treated as read-only input by every generator.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::DataType;
use crate::value::Value;

// ==================== Table references ====================

/// Names a table, optionally schema-qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub table_name: String,
    pub schema: Option<String>,
    /// Joins schema and table on dialects without schema support (default `.`)
    pub delimiter: Option<String>,
    /// Alias used in SELECT and JOIN clauses
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            schema: None,
            delimiter: None,
            alias: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The schema delimiter, defaulting to `.`.
    pub fn delimiter(&self) -> &str {
        self.delimiter.as_deref().unwrap_or(".")
    }
}

impl From<&str> for TableRef {
    fn from(name: &str) -> Self {
        TableRef::new(name)
    }
}

impl From<String> for TableRef {
    fn from(name: String) -> Self {
        TableRef::new(name)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table_name),
            None => f.write_str(&self.table_name),
        }
    }
}

// ==================== Attributes ====================

/// Referential action for foreign key ON DELETE / ON UPDATE clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }

    /// Parse a referential action from a string (case-insensitive).
    ///
    /// Returns `None` if the string is not a recognized action.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NO ACTION" | "NOACTION" | "NO_ACTION" => Some(ReferentialAction::NoAction),
            "RESTRICT" => Some(ReferentialAction::Restrict),
            "CASCADE" => Some(ReferentialAction::Cascade),
            "SET NULL" | "SETNULL" | "SET_NULL" => Some(ReferentialAction::SetNull),
            "SET DEFAULT" | "SETDEFAULT" | "SET_DEFAULT" => Some(ReferentialAction::SetDefault),
            _ => None,
        }
    }
}

/// When a deferrable constraint is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Deferrable {
    InitiallyDeferred,
    InitiallyImmediate,
    Not,
}

impl Deferrable {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Deferrable::InitiallyDeferred => "DEFERRABLE INITIALLY DEFERRED",
            Deferrable::InitiallyImmediate => "DEFERRABLE INITIALLY IMMEDIATE",
            Deferrable::Not => "NOT DEFERRABLE",
        }
    }
}

/// Foreign key target of an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyReference {
    pub table: TableRef,
    pub key: String,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
    pub deferrable: Option<Deferrable>,
}

impl ForeignKeyReference {
    pub fn new(table: impl Into<TableRef>, key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key: key.into(),
            on_delete: None,
            on_update: None,
            deferrable: None,
        }
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// One model attribute and its physical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Logical attribute name
    pub name: String,
    /// Physical column name
    pub column_name: String,
    pub data_type: DataType,
    pub allow_null: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub default_value: Option<Value>,
    pub unique: bool,
    pub comment: Option<String>,
    pub references: Option<ForeignKeyReference>,
}

impl Attribute {
    /// An attribute whose column has the same name.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        Self {
            column_name: name.clone(),
            name,
            data_type,
            allow_null: true,
            primary_key: false,
            auto_increment: false,
            default_value: None,
            unique: false,
            comment: None,
            references: None,
        }
    }

    /// Auto-incrementing integer primary key.
    pub fn primary_key(name: impl Into<String>) -> Self {
        let mut attr = Self::new(name, DataType::Integer);
        attr.primary_key = true;
        attr.auto_increment = true;
        attr.allow_null = false;
        attr
    }

    pub fn column(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = column_name.into();
        self
    }

    pub fn not_null(mut self) -> Self {
        self.allow_null = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
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
}

// ==================== Models ====================

/// Resolved metadata of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Model name, used as the main alias in SELECT
    pub name: String,
    pub table: TableRef,
    /// Attributes in declaration order
    pub attributes: Vec<Attribute>,
}

impl ModelDefinition {
    pub fn new(name: impl Into<String>, table: impl Into<TableRef>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Look up an attribute by its logical name.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Look up an attribute by its column name.
    pub fn by_column(&self, column: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.column_name == column)
    }

    /// Physical column for a logical attribute; unknown names pass through.
    pub fn column_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).map_or(name, |a| a.column_name.as_str())
    }

    pub fn primary_key_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.primary_key)
    }

    /// The first primary key attribute, if the model has one.
    pub fn primary_key(&self) -> Option<&Attribute> {
        self.primary_key_attributes().next()
    }

    pub fn auto_increment_attribute(&self) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.auto_increment)
    }
}

// ==================== Associations ====================

/// Association kinds understood by the join builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssociationKind {
    BelongsTo,
    HasOne,
    HasMany,
    BelongsToMany,
}

/// Join table of a many-to-many association.
#[derive(Debug, Clone, PartialEq)]
pub struct Through {
    pub model: Arc<ModelDefinition>,
    /// Column in the join table referencing the source model
    pub foreign_key: String,
    /// Column in the join table referencing the target model
    pub other_key: String,
}

/// An association from a source model to a target model.
///
/// For `BelongsTo` the foreign key lives on the source; for `HasOne` and
/// `HasMany` it lives on the target.
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    pub kind: AssociationKind,
    /// Alias (`as`) of the association; used as the join alias
    pub as_name: String,
    pub target: Arc<ModelDefinition>,
    pub foreign_key: String,
    /// Key on the source model (HasOne / HasMany / BelongsToMany)
    pub source_key: String,
    /// Key on the target model (BelongsTo / BelongsToMany)
    pub target_key: String,
    pub through: Option<Through>,
}

impl Association {
    pub fn belongs_to(
        as_name: impl Into<String>,
        target: Arc<ModelDefinition>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::build(AssociationKind::BelongsTo, as_name, target, foreign_key)
    }

    pub fn has_one(
        as_name: impl Into<String>,
        target: Arc<ModelDefinition>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::build(AssociationKind::HasOne, as_name, target, foreign_key)
    }

    pub fn has_many(
        as_name: impl Into<String>,
        target: Arc<ModelDefinition>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::build(AssociationKind::HasMany, as_name, target, foreign_key)
    }

    pub fn belongs_to_many(
        as_name: impl Into<String>,
        target: Arc<ModelDefinition>,
        through: Arc<ModelDefinition>,
        foreign_key: impl Into<String>,
        other_key: impl Into<String>,
    ) -> Self {
        let foreign_key = foreign_key.into();
        let mut assoc = Self::build(
            AssociationKind::BelongsToMany,
            as_name,
            target,
            foreign_key.clone(),
        );
        assoc.through = Some(Through {
            model: through,
            foreign_key,
            other_key: other_key.into(),
        });
        assoc
    }

    fn build(
        kind: AssociationKind,
        as_name: impl Into<String>,
        target: Arc<ModelDefinition>,
        foreign_key: impl Into<String>,
    ) -> Self {
        let target_key = target
            .primary_key()
            .map_or_else(|| "id".to_string(), |a| a.name.clone());
        Self {
            kind,
            as_name: as_name.into(),
            target,
            foreign_key: foreign_key.into(),
            source_key: "id".to_string(),
            target_key,
            through: None,
        }
    }

    pub fn with_source_key(mut self, key: impl Into<String>) -> Self {
        self.source_key = key.into();
        self
    }

    pub fn with_target_key(mut self, key: impl Into<String>) -> Self {
        self.target_key = key.into();
        self
    }

    pub fn is_multi(&self) -> bool {
        matches!(
            self.kind,
            AssociationKind::HasMany | AssociationKind::BelongsToMany
        )
    }
}
