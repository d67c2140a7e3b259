//! sqlgen - dialect-aware SQL generation for ORMs.
//!
//! sqlgen turns dialect-neutral descriptions of database operations into
//! the exact SQL text (and bind parameters) expected by PostgreSQL, MySQL,
//! MariaDB, SQLite, SQL Server, Oracle, Db2, Db2 for IBM i, Snowflake and
//! Vertica. It does not connect to anything: executing the statements is
//! the caller's business.
//!
//! - Quoting and escaping of identifiers and literals per dialect
//! - SELECT with includes, grouping, locking and index/table hints
//! - INSERT, bulk INSERT and upsert with RETURNING emulation
//! - UPDATE, increment/decrement, DELETE and TRUNCATE
//! - Index, constraint, table, column and schema DDL
//! - Transaction and savepoint statements
//!
//! Every dialect carries a capability tree. Requested options the target
//! dialect cannot honor are rejected up front with all offending options
//! named in one error.
//!
//! # Quick Start
//!
//! ```
//! use sqlgen::prelude::*;
//!
//! let generator = Generator::for_kind(DialectKind::Postgres).unwrap();
//!
//! let select = Operation::Select {
//!     table: "heroes".into(),
//!     options: SelectOptions::new().with_where(Where::eq("id", 1)).with_limit(1),
//! };
//! let statements = generator.generate(&select, None).unwrap();
//! assert_eq!(
//!     statements[0].sql,
//!     "SELECT * FROM \"heroes\" WHERE \"id\" = $sequelize_1 LIMIT 1;"
//! );
//! assert_eq!(statements[0].bind_value("sequelize_1"), Some(&Value::Int(1)));
//! ```
//!
//! The per-layer generators are available directly through
//! [`Generator::query`] and [`Generator::schema`], or from the
//! `sqlgen-query` and `sqlgen-schema` crates.

pub mod generator;
pub mod operation;

pub use generator::Generator;
pub use operation::{Operation, Row};

// Core types
pub use sqlgen_core::{
    Association, AssociationKind, Attribute, BindStyle, CapabilityTree, DataType, Deferrable,
    Dialect, DialectKind, Error, ForeignKeyReference, GeneratorOptions, ModelDefinition,
    ReferentialAction, Result, TableRef, Through, Value, ValidationErrorKind,
};

// Statements
pub use sqlgen_query::{
    AliasMap, ArithmeticOp, ArraySource, Cond, DeleteOptions, DialectFn, Direction, Escaper, Expr,
    Include, IndexHint, IndexHintKind, InsertOptions, IsolationLevel, JsonSegment, Literal, Lock,
    LockStrength, Nulls, Op, Operand, OrderItem, QueryGenerator, Returning, SelectAttribute,
    SelectOptions, StartTransactionOptions, Statement, TableHint, TransactionType,
    TruncateOptions, UpdateOptions, Where,
};

// DDL
pub use sqlgen_schema::{
    AddColumnOptions, ColumnChange, ConstraintChecking, ConstraintKind, ConstraintOptions,
    ConstraintReference, CreateSchemaOptions, CreateTableOptions, DropSchemaOptions,
    DropTableOptions, IndexColumn, IndexField, IndexOptions, IndexTarget, RemoveColumnOptions,
    RemoveConstraintOptions, RemoveIndexOptions, RenameTableOptions, SchemaGenerator, UniqueKey,
};

/// Everything needed to describe and generate operations.
pub mod prelude {
    pub use crate::{
        // Entry point
        Generator,
        Operation,
        // Metadata
        Attribute,
        DataType,
        Dialect,
        DialectKind,
        Error,
        GeneratorOptions,
        ModelDefinition,
        Result,
        TableRef,
        Value,
        // Statements
        Expr,
        Statement,
        Where,
        // Options
        DeleteOptions,
        IndexOptions,
        InsertOptions,
        SelectOptions,
        UpdateOptions,
    };
}
