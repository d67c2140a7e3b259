//! Core types for sqlgen.
//!
//! This crate provides the foundations shared by the query and schema
//! generators:
//!
//! - `Value` for literal and bound values
//! - `DataType` for logical column types
//! - `Dialect` and the `CapabilityTree` describing what each database supports
//! - `TableRef`, `Attribute`, `ModelDefinition` and `Association` metadata
//! - `GeneratorOptions` configuration
//! - The `Error` taxonomy

#![recursion_limit = "256"]

pub mod capability;
pub mod config;
pub mod dialect;
pub mod error;
pub mod identifiers;
pub mod table;
pub mod types;
pub mod value;

pub use capability::CapabilityTree;
pub use config::GeneratorOptions;
pub use dialect::{BindStyle, Dialect, DialectKind};
pub use error::{
    CapabilityError, ConfigError, Error, IdentifierLengthError, Result, ValidationError,
    ValidationErrorKind,
};
pub use table::{
    Association, AssociationKind, Attribute, Deferrable, ForeignKeyReference, ModelDefinition,
    ReferentialAction, TableRef, Through,
};
pub use types::DataType;
pub use value::Value;
