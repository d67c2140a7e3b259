//! Operation options for the DML generators.
//!
//! Every struct implements `Default` and has `with_*` builders so callers
//! only spell out what they use.

use sqlgen_core::{Association, Value};

use crate::expr::Expr;
use crate::where_clause::Where;

// ==================== Ordering ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Placement of NULLs in ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nulls {
    First,
    Last,
}

impl Nulls {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Nulls::First => "NULLS FIRST",
            Nulls::Last => "NULLS LAST",
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: Expr,
    pub direction: Option<Direction>,
    pub nulls: Option<Nulls>,
}

impl OrderItem {
    pub fn new(expr: impl Into<OrderTarget>) -> Self {
        Self {
            expr: expr.into().0,
            direction: None,
            nulls: None,
        }
    }

    pub fn asc(expr: impl Into<OrderTarget>) -> Self {
        Self::new(expr).with_direction(Direction::Asc)
    }

    pub fn desc(expr: impl Into<OrderTarget>) -> Self {
        Self::new(expr).with_direction(Direction::Desc)
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(Nulls::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(Nulls::Last);
        self
    }
}

/// Something to order or group by. Strings name model attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTarget(pub Expr);

impl From<&str> for OrderTarget {
    fn from(name: &str) -> Self {
        OrderTarget(Expr::Attribute(name.to_string()))
    }
}

impl From<String> for OrderTarget {
    fn from(name: String) -> Self {
        OrderTarget(Expr::Attribute(name))
    }
}

impl From<Expr> for OrderTarget {
    fn from(expr: Expr) -> Self {
        OrderTarget(expr)
    }
}

// ==================== Select ====================

/// One entry of the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectAttribute {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectAttribute {
    pub fn new(expr: impl Into<OrderTarget>) -> Self {
        Self {
            expr: expr.into().0,
            alias: None,
        }
    }

    /// `expr AS alias`.
    pub fn aliased(expr: impl Into<OrderTarget>, alias: impl Into<String>) -> Self {
        Self {
            expr: expr.into().0,
            alias: Some(alias.into()),
        }
    }
}

impl From<&str> for SelectAttribute {
    fn from(name: &str) -> Self {
        SelectAttribute::new(name)
    }
}

/// Row lock strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStrength {
    Update,
    Share,
    KeyShare,
    NoKeyUpdate,
}

/// `FOR UPDATE` and friends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    pub strength: LockStrength,
    /// Lock only the rows of this table alias (`OF`)
    pub of: Option<String>,
    pub skip_locked: bool,
}

impl Lock {
    pub fn update() -> Self {
        Self {
            strength: LockStrength::Update,
            of: None,
            skip_locked: false,
        }
    }

    pub fn share() -> Self {
        Self {
            strength: LockStrength::Share,
            ..Self::update()
        }
    }

    pub fn key_share() -> Self {
        Self {
            strength: LockStrength::KeyShare,
            ..Self::update()
        }
    }

    pub fn no_key_update() -> Self {
        Self {
            strength: LockStrength::NoKeyUpdate,
            ..Self::update()
        }
    }

    pub fn of(mut self, alias: impl Into<String>) -> Self {
        self.of = Some(alias.into());
        self
    }

    pub fn skip_locked(mut self) -> Self {
        self.skip_locked = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexHintKind {
    Use,
    Force,
    Ignore,
}

impl IndexHintKind {
    pub const fn as_sql(self) -> &'static str {
        match self {
            IndexHintKind::Use => "USE",
            IndexHintKind::Force => "FORCE",
            IndexHintKind::Ignore => "IGNORE",
        }
    }
}

/// `USE INDEX (...)` style hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHint {
    pub kind: IndexHintKind,
    pub indexes: Vec<String>,
}

impl IndexHint {
    pub fn new<S: Into<String>>(kind: IndexHintKind, indexes: impl IntoIterator<Item = S>) -> Self {
        Self {
            kind,
            indexes: indexes.into_iter().map(Into::into).collect(),
        }
    }
}

/// MSSQL table hints rendered as `WITH (...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableHint {
    NoLock,
    ReadUncommitted,
    UpdLock,
    HoldLock,
    RowLock,
    TabLock,
    NoWait,
}

impl TableHint {
    pub const fn as_sql(self) -> &'static str {
        match self {
            TableHint::NoLock => "NOLOCK",
            TableHint::ReadUncommitted => "READUNCOMMITTED",
            TableHint::UpdLock => "UPDLOCK",
            TableHint::HoldLock => "HOLDLOCK",
            TableHint::RowLock => "ROWLOCK",
            TableHint::TabLock => "TABLOCK",
            TableHint::NoWait => "NOWAIT",
        }
    }
}

/// An association to join into a SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    pub association: Association,
    /// Columns of the target to select; `None` selects every attribute
    pub attributes: Option<Vec<String>>,
    pub where_: Option<Where>,
    /// INNER JOIN instead of LEFT OUTER JOIN
    pub required: bool,
    /// RIGHT OUTER JOIN
    pub right: bool,
    /// Loaded by a follow-up query; not joined here
    pub separate: bool,
    pub include: Vec<Include>,
}

impl Include {
    pub fn new(association: Association) -> Self {
        Self {
            association,
            attributes: None,
            where_: None,
            required: false,
            right: false,
            separate: false,
            include: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn right(mut self) -> Self {
        self.right = true;
        self
    }

    pub fn separate(mut self) -> Self {
        self.separate = true;
        self
    }

    pub fn with_where(mut self, where_: Where) -> Self {
        self.where_ = Some(where_);
        self
    }

    pub fn with_attributes<S: Into<String>>(mut self, attributes: impl IntoIterator<Item = S>) -> Self {
        self.attributes = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_include(mut self, include: Include) -> Self {
        self.include.push(include);
        self
    }

    /// Alias of the joined table.
    pub fn as_name(&self) -> &str {
        &self.association.as_name
    }
}

/// Options of [`select_query`](crate::QueryGenerator::select_query).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOptions {
    /// `None` selects every model attribute, or `*` without a model
    pub attributes: Option<Vec<SelectAttribute>>,
    pub where_: Option<Where>,
    pub include: Vec<Include>,
    pub order: Vec<OrderItem>,
    pub group: Vec<Expr>,
    pub having: Option<Where>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub lock: Option<Lock>,
    pub distinct: bool,
    /// Force (or forbid) wrapping the main table in a subquery
    pub sub_query: Option<bool>,
    pub index_hints: Vec<IndexHint>,
    pub table_hints: Vec<TableHint>,
    /// MySQL `MAX_EXECUTION_TIME` optimizer hint, in milliseconds
    pub max_execution_time: Option<u64>,
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attributes<A: Into<SelectAttribute>>(mut self, attributes: impl IntoIterator<Item = A>) -> Self {
        self.attributes = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_where(mut self, where_: Where) -> Self {
        self.where_ = Some(where_);
        self
    }

    pub fn with_include(mut self, include: Include) -> Self {
        self.include.push(include);
        self
    }

    pub fn with_order(mut self, order: OrderItem) -> Self {
        self.order.push(order);
        self
    }

    pub fn with_group(mut self, group: impl Into<OrderTarget>) -> Self {
        self.group.push(group.into().0);
        self
    }

    pub fn with_having(mut self, having: Where) -> Self {
        self.having = Some(having);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_lock(mut self, lock: Lock) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn with_sub_query(mut self, sub_query: bool) -> Self {
        self.sub_query = Some(sub_query);
        self
    }

    pub fn with_index_hint(mut self, hint: IndexHint) -> Self {
        self.index_hints.push(hint);
        self
    }

    pub fn with_table_hint(mut self, hint: TableHint) -> Self {
        self.table_hints.push(hint);
        self
    }

    pub fn with_max_execution_time(mut self, millis: u64) -> Self {
        self.max_execution_time = Some(millis);
        self
    }
}

// ==================== Insert / update / delete ====================

/// Columns to hand back from a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Returning {
    /// Every model attribute, or `*` without a model
    All,
    Columns(Vec<String>),
}

/// Options of the insert, bulk insert and upsert generators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertOptions {
    pub returning: Option<Returning>,
    pub ignore_duplicates: bool,
    /// Columns to overwrite when the row already exists
    pub update_on_duplicate: Option<Vec<String>>,
    /// Conflict target columns (`ON CONFLICT (...)`)
    pub upsert_keys: Vec<String>,
    /// Partial-index predicate of the conflict target
    pub conflict_where: Option<Where>,
    /// The table has triggers; MSSQL must capture OUTPUT into a table variable
    pub has_trigger: bool,
    /// Caller bind parameters referenced from literals as `$name`
    pub bind: Vec<(String, Value)>,
}

impl InsertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_returning(mut self, returning: Returning) -> Self {
        self.returning = Some(returning);
        self
    }

    pub fn ignore_duplicates(mut self) -> Self {
        self.ignore_duplicates = true;
        self
    }

    pub fn with_update_on_duplicate<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.update_on_duplicate = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_upsert_keys<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.upsert_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_conflict_where(mut self, where_: Where) -> Self {
        self.conflict_where = Some(where_);
        self
    }

    pub fn with_trigger(mut self) -> Self {
        self.has_trigger = true;
        self
    }

    pub fn with_bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bind.push((name.into(), value.into()));
        self
    }
}

/// Options of the update and arithmetic generators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOptions {
    pub returning: Option<Returning>,
    pub limit: Option<u64>,
    pub bind: Vec<(String, Value)>,
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_returning(mut self, returning: Returning) -> Self {
        self.returning = Some(returning);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bind.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOptions {
    pub limit: Option<u64>,
}

impl DeleteOptions {
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TruncateOptions {
    pub cascade: bool,
    pub restart_identity: bool,
}

/// `+` for increment, `-` for decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
}

impl ArithmeticOp {
    pub const fn as_sql(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
        }
    }
}

// ==================== Transactions ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub const fn as_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// SQLite transaction locking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Deferred,
    Immediate,
    Exclusive,
}

impl TransactionType {
    pub const fn as_sql(self) -> &'static str {
        match self {
            TransactionType::Deferred => "DEFERRED",
            TransactionType::Immediate => "IMMEDIATE",
            TransactionType::Exclusive => "EXCLUSIVE",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartTransactionOptions {
    pub read_only: bool,
    pub transaction_type: Option<TransactionType>,
}
