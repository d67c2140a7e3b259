//! Dialect-neutral operation descriptors.

use sqlgen_core::{Attribute, TableRef, Value};
use sqlgen_query::{
    ArithmeticOp, DeleteOptions, InsertOptions, IsolationLevel, SelectOptions,
    StartTransactionOptions, TruncateOptions, UpdateOptions, Where,
};
use sqlgen_schema::{
    AddColumnOptions, ColumnChange, ConstraintChecking, ConstraintOptions, CreateSchemaOptions,
    CreateTableOptions, DropSchemaOptions, DropTableOptions, IndexOptions, IndexTarget,
    RemoveColumnOptions, RemoveConstraintOptions, RemoveIndexOptions, RenameTableOptions,
};

/// Column/value pairs of one row, in column order.
pub type Row = Vec<(String, Value)>;

/// One statement request, consumed by [`Generator::generate`](crate::Generator::generate).
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    // DML
    Select {
        table: TableRef,
        options: SelectOptions,
    },
    Insert {
        table: TableRef,
        values: Row,
        options: InsertOptions,
    },
    BulkInsert {
        table: TableRef,
        rows: Vec<Row>,
        options: InsertOptions,
    },
    Upsert {
        table: TableRef,
        insert_values: Row,
        update_values: Row,
        options: InsertOptions,
    },
    Update {
        table: TableRef,
        values: Row,
        where_: Where,
        options: UpdateOptions,
    },
    /// `increment` / `decrement`
    Arithmetic {
        op: ArithmeticOp,
        table: TableRef,
        where_: Where,
        amounts: Row,
        extra: Row,
        options: UpdateOptions,
    },
    Delete {
        table: TableRef,
        where_: Where,
        options: DeleteOptions,
    },
    Truncate {
        table: TableRef,
        options: TruncateOptions,
    },

    // Indexes and constraints
    AddIndex {
        table: TableRef,
        options: IndexOptions,
    },
    RemoveIndex {
        table: TableRef,
        target: IndexTarget,
        options: RemoveIndexOptions,
    },
    AddConstraint {
        table: TableRef,
        options: ConstraintOptions,
    },
    RemoveConstraint {
        table: TableRef,
        name: String,
        options: RemoveConstraintOptions,
    },
    SetConstraintChecking(ConstraintChecking),

    // Tables and columns
    CreateTable {
        table: TableRef,
        /// Falls back to the model's attributes when empty
        attributes: Vec<Attribute>,
        options: CreateTableOptions,
    },
    DropTable {
        table: TableRef,
        options: DropTableOptions,
    },
    RenameTable {
        before: TableRef,
        after: TableRef,
        options: RenameTableOptions,
    },
    AddColumn {
        table: TableRef,
        attribute: Attribute,
        options: AddColumnOptions,
    },
    RemoveColumn {
        table: TableRef,
        column: String,
        options: RemoveColumnOptions,
    },
    ChangeColumn {
        table: TableRef,
        column: String,
        change: ColumnChange,
    },
    RenameColumn {
        table: TableRef,
        before: String,
        after: String,
    },

    // Schemas
    CreateSchema {
        name: String,
        options: CreateSchemaOptions,
    },
    DropSchema {
        name: String,
        options: DropSchemaOptions,
    },

    // Transactions
    StartTransaction(StartTransactionOptions),
    CommitTransaction,
    RollbackTransaction,
    CreateSavepoint(String),
    RollbackSavepoint(String),
    SetIsolationLevel(IsolationLevel),
}

impl Operation {
    /// The generator entry point this operation maps to, as it appears in
    /// capability error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Operation::Select { .. } => "selectQuery",
            Operation::Insert { .. } => "insertQuery",
            Operation::BulkInsert { .. } => "bulkInsertQuery",
            Operation::Upsert { .. } => "upsertQuery",
            Operation::Update { .. } => "updateQuery",
            Operation::Arithmetic { .. } => "arithmeticQuery",
            Operation::Delete { .. } => "deleteQuery",
            Operation::Truncate { .. } => "truncateTableQuery",
            Operation::AddIndex { .. } => "addIndexQuery",
            Operation::RemoveIndex { .. } => "removeIndexQuery",
            Operation::AddConstraint { .. } => "addConstraintQuery",
            Operation::RemoveConstraint { .. } => "removeConstraintQuery",
            Operation::SetConstraintChecking(_) => "setConstraintCheckingQuery",
            Operation::CreateTable { .. } => "createTableQuery",
            Operation::DropTable { .. } => "dropTableQuery",
            Operation::RenameTable { .. } => "renameTableQuery",
            Operation::AddColumn { .. } => "addColumnQuery",
            Operation::RemoveColumn { .. } => "removeColumnQuery",
            Operation::ChangeColumn { .. } => "changeColumnQuery",
            Operation::RenameColumn { .. } => "renameColumnQuery",
            Operation::CreateSchema { .. } => "createSchemaQuery",
            Operation::DropSchema { .. } => "dropSchemaQuery",
            Operation::StartTransaction(_) => "startTransactionQuery",
            Operation::CommitTransaction => "commitTransactionQuery",
            Operation::RollbackTransaction => "rollbackTransactionQuery",
            Operation::CreateSavepoint(_) => "createSavepointQuery",
            Operation::RollbackSavepoint(_) => "rollbackSavepointQuery",
            Operation::SetIsolationLevel(_) => "setIsolationLevelQuery",
        }
    }

    /// Whether the operation produces DDL rather than DML.
    pub const fn is_ddl(&self) -> bool {
        matches!(
            self,
            Operation::AddIndex { .. }
                | Operation::RemoveIndex { .. }
                | Operation::AddConstraint { .. }
                | Operation::RemoveConstraint { .. }
                | Operation::SetConstraintChecking(_)
                | Operation::CreateTable { .. }
                | Operation::DropTable { .. }
                | Operation::RenameTable { .. }
                | Operation::AddColumn { .. }
                | Operation::RemoveColumn { .. }
                | Operation::ChangeColumn { .. }
                | Operation::RenameColumn { .. }
                | Operation::CreateSchema { .. }
                | Operation::DropSchema { .. }
        )
    }

    /// The table the operation targets, if any.
    pub fn table(&self) -> Option<&TableRef> {
        match self {
            Operation::Select { table, .. }
            | Operation::Insert { table, .. }
            | Operation::BulkInsert { table, .. }
            | Operation::Upsert { table, .. }
            | Operation::Update { table, .. }
            | Operation::Arithmetic { table, .. }
            | Operation::Delete { table, .. }
            | Operation::Truncate { table, .. }
            | Operation::AddIndex { table, .. }
            | Operation::RemoveIndex { table, .. }
            | Operation::AddConstraint { table, .. }
            | Operation::RemoveConstraint { table, .. }
            | Operation::CreateTable { table, .. }
            | Operation::DropTable { table, .. }
            | Operation::AddColumn { table, .. }
            | Operation::RemoveColumn { table, .. }
            | Operation::ChangeColumn { table, .. }
            | Operation::RenameColumn { table, .. } => Some(table),
            Operation::RenameTable { before, .. } => Some(before),
            _ => None,
        }
    }
}
