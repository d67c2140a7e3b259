//! Dialect-aware DDL generation for sqlgen.
//!
//! `sqlgen-schema` is the **schema layer** next to the statement layer in
//! `sqlgen-query`. It builds the DDL text for:
//!
//! - indexes (`add_index_query`, `remove_index_query`)
//! - constraints (`add_constraint_query`, `remove_constraint_query`,
//!   `set_constraint_checking_query`)
//! - tables and columns (`create_table_query`, `drop_table_query`,
//!   `rename_table_query`, `add_column_query`, `change_column_query`, ...)
//! - schemas (`create_schema_query`, `drop_schema_query`)
//!
//! Requested options are checked against the dialect's capability tree
//! first; every unsupported option of a call is reported in one error.
//!
//! ```
//! use sqlgen_core::DialectKind;
//! use sqlgen_schema::{IndexOptions, SchemaGenerator};
//!
//! let generator = SchemaGenerator::for_kind(DialectKind::Postgres).unwrap();
//! let sql = generator
//!     .add_index_query(&"users".into(), &IndexOptions::new(["email"]).unique())
//!     .unwrap();
//! assert_eq!(sql, "CREATE UNIQUE INDEX \"users_email_unique\" ON \"users\" (\"email\")");
//! ```

pub mod ddl;
pub mod generator;
pub mod options;

mod column;
mod constraint;
mod index;
mod schema;
mod table;

pub use ddl::{SchemaGeneratorOps, ops_for};
pub use generator::SchemaGenerator;
pub use options::{
    AddColumnOptions, ColumnChange, ConstraintChecking, ConstraintKind, ConstraintOptions,
    ConstraintReference, CreateSchemaOptions, CreateTableOptions, DropSchemaOptions,
    DropTableOptions, IndexColumn, IndexField, IndexOptions, IndexTarget, RemoveColumnOptions,
    RemoveConstraintOptions, RemoveIndexOptions, RenameTableOptions, UniqueKey,
};
