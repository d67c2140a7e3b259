//! Dialect-aware DML generation for sqlgen.
//!
//! `sqlgen-query` is the **statement layer**. It turns dialect-neutral
//! operation descriptions into SQL text plus bind parameters for one target
//! dialect.
//!
//! # Role In The Architecture
//!
//! - **Escaping and binding**: `Escaper` renders literals, `BindCollector`
//!   hands out `$sequelize_N` placeholders.
//! - **Expressions and filters**: `Expr` and `Where` describe values and
//!   predicates; the WHERE compiler checks each operator against the
//!   dialect's capabilities.
//! - **Generators**: `QueryGenerator` builds SELECT, INSERT, bulk INSERT,
//!   upsert, UPDATE, DELETE, TRUNCATE and transaction statements. Syntax
//!   that differs per dialect goes through `QueryGeneratorOps`.
//!
//! ```
//! use sqlgen_core::DialectKind;
//! use sqlgen_query::{QueryGenerator, SelectOptions, Where};
//!
//! let generator = QueryGenerator::for_kind(DialectKind::Postgres).unwrap();
//! let options = SelectOptions::new().with_where(Where::eq("id", 1)).with_limit(1);
//! let statement = generator.select_query(&"users".into(), &options, None).unwrap();
//! assert_eq!(statement.sql, "SELECT * FROM \"users\" WHERE \"id\" = $sequelize_1 LIMIT 1;");
//! ```
//!
//! Generators hold no per-call state and can be shared between threads.

pub mod alias;
pub mod bind;
pub mod delete;
pub mod escape;
pub mod expr;
pub mod generator;
pub mod insert;
pub mod operator;
pub mod options;
pub mod select;
pub mod transaction;
pub mod update;
pub mod where_clause;

pub use alias::AliasMap;
pub use bind::{BindCollector, Statement};
pub use escape::Escaper;
pub use expr::{DialectFn, Expr, JsonSegment, Literal, RenderContext};
pub use generator::{QueryGenerator, QueryGeneratorOps, ops_for};
pub use operator::Op;
pub use options::{
    ArithmeticOp, DeleteOptions, Direction, Include, IndexHint, IndexHintKind, InsertOptions,
    IsolationLevel, Lock, LockStrength, Nulls, OrderItem, Returning, SelectAttribute,
    SelectOptions, StartTransactionOptions, TableHint, TransactionType, TruncateOptions,
    UpdateOptions,
};
pub use where_clause::{ArraySource, Cond, Operand, Where};
