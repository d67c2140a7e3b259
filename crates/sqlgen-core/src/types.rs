//! Logical data types and their per-dialect SQL names.

use serde::{Deserialize, Serialize};

use crate::dialect::DialectKind;

/// Logical column types, independent of any dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    // Integer types
    TinyInt,
    SmallInt,
    Integer,
    BigInt,

    // Floating point
    Float,
    Real,
    Double,

    // Fixed precision
    Decimal {
        precision: Option<u8>,
        scale: Option<u8>,
    },

    Boolean,

    // String types
    String {
        length: Option<u32>,
    },
    Char(u32),
    Text,
    CiText,

    Blob,

    // Date/time types
    /// Date and time; `precision` is the number of fractional second digits.
    DateTime {
        precision: Option<u8>,
    },
    DateOnly,
    Time,

    Uuid,

    Json,
    JsonB,

    Array(Box<DataType>),
    Enum(Vec<String>),

    /// Verbatim type name
    Custom(String),
}

impl DataType {
    /// `VARCHAR(255)` equivalent.
    pub const fn string() -> Self {
        DataType::String { length: None }
    }

    /// Date-time with the default millisecond precision.
    pub const fn date() -> Self {
        DataType::DateTime { precision: None }
    }

    /// Render the SQL type name for `kind`.
    pub fn to_sql(&self, kind: DialectKind) -> String {
        use DialectKind as D;
        match self {
            DataType::TinyInt => match kind {
                D::Postgres | D::Db2 | D::Ibmi | D::Oracle => "SMALLINT".to_string(),
                _ => "TINYINT".to_string(),
            },
            DataType::SmallInt => "SMALLINT".to_string(),
            DataType::Integer => match kind {
                D::Oracle => "NUMBER(10)".to_string(),
                _ => "INTEGER".to_string(),
            },
            DataType::BigInt => match kind {
                D::Oracle => "NUMBER(19)".to_string(),
                _ => "BIGINT".to_string(),
            },
            DataType::Float => "FLOAT".to_string(),
            DataType::Real => "REAL".to_string(),
            DataType::Double => match kind {
                D::Postgres | D::Db2 | D::Ibmi | D::Oracle | D::Vertica => {
                    "DOUBLE PRECISION".to_string()
                }
                D::Mssql => "FLOAT".to_string(),
                _ => "DOUBLE".to_string(),
            },
            DataType::Decimal { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("DECIMAL({p}, {s})"),
                (Some(p), None) => format!("DECIMAL({p})"),
                _ => "DECIMAL".to_string(),
            },
            DataType::Boolean => match kind {
                D::Mysql | D::Mariadb => "TINYINT(1)".to_string(),
                D::Mssql => "BIT".to_string(),
                D::Sqlite => "INTEGER".to_string(),
                D::Oracle => "CHAR(1)".to_string(),
                D::Ibmi => "SMALLINT".to_string(),
                _ => "BOOLEAN".to_string(),
            },
            DataType::String { length } => {
                let length = length.unwrap_or(255);
                match kind {
                    D::Mssql => format!("NVARCHAR({length})"),
                    D::Oracle => format!("NVARCHAR2({length})"),
                    _ => format!("VARCHAR({length})"),
                }
            }
            DataType::Char(length) => match kind {
                D::Mssql => format!("NCHAR({length})"),
                _ => format!("CHAR({length})"),
            },
            DataType::Text => match kind {
                D::Mssql => "NVARCHAR(MAX)".to_string(),
                D::Oracle => "CLOB".to_string(),
                D::Db2 | D::Ibmi => "CLOB(2147483647)".to_string(),
                _ => "TEXT".to_string(),
            },
            DataType::CiText => match kind {
                D::Postgres => "CITEXT".to_string(),
                D::Sqlite => "TEXT COLLATE NOCASE".to_string(),
                _ => DataType::Text.to_sql(kind),
            },
            DataType::Blob => match kind {
                D::Postgres => "BYTEA".to_string(),
                D::Mssql => "VARBINARY(MAX)".to_string(),
                D::Snowflake => "BINARY".to_string(),
                _ => "BLOB".to_string(),
            },
            DataType::DateTime { precision } => {
                let suffix = precision.map(|p| format!("({p})")).unwrap_or_default();
                match kind {
                    D::Postgres => format!("TIMESTAMP{suffix} WITH TIME ZONE"),
                    D::Mssql => format!("DATETIMEOFFSET{suffix}"),
                    D::Mysql | D::Mariadb => format!("DATETIME{suffix}"),
                    D::Sqlite => "TEXT".to_string(),
                    D::Oracle => format!("TIMESTAMP{suffix} WITH LOCAL TIME ZONE"),
                    D::Snowflake => format!("TIMESTAMP_TZ{suffix}"),
                    _ => format!("TIMESTAMP{suffix}"),
                }
            }
            DataType::DateOnly => "DATE".to_string(),
            DataType::Time => "TIME".to_string(),
            DataType::Uuid => match kind {
                D::Postgres | D::Vertica => "UUID".to_string(),
                D::Mssql => "UNIQUEIDENTIFIER".to_string(),
                D::Mysql | D::Mariadb => "CHAR(36) BINARY".to_string(),
                D::Sqlite => "TEXT".to_string(),
                _ => "CHAR(36)".to_string(),
            },
            DataType::Json => match kind {
                D::Mssql => "NVARCHAR(MAX)".to_string(),
                D::Snowflake => "VARIANT".to_string(),
                _ => "JSON".to_string(),
            },
            DataType::JsonB => match kind {
                D::Postgres => "JSONB".to_string(),
                _ => DataType::Json.to_sql(kind),
            },
            DataType::Array(inner) => format!("{}[]", inner.to_sql(kind)),
            DataType::Enum(values) => match kind {
                D::Mysql | D::Mariadb => {
                    let list: Vec<String> = values
                        .iter()
                        .map(|v| format!("'{}'", v.replace('\'', "''")))
                        .collect();
                    format!("ENUM({})", list.join(", "))
                }
                _ => DataType::string().to_sql(kind),
            },
            DataType::Custom(name) => name.clone(),
        }
    }

    /// Capability key under `dataTypes` that must be enabled to use this type,
    /// if any.
    pub fn capability_key(&self) -> Option<&'static str> {
        match self {
            DataType::CiText => Some("dataTypes.CITEXT"),
            DataType::Json => Some("dataTypes.JSON"),
            DataType::JsonB => Some("dataTypes.JSONB"),
            DataType::Array(_) => Some("dataTypes.ARRAY"),
            _ => None,
        }
    }

    /// Fractional second digits used when formatting values of this type.
    pub fn fractional_digits(&self) -> u8 {
        match self {
            DataType::DateTime { precision } => precision.unwrap_or(3).min(6),
            _ => 3,
        }
    }

    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::TinyInt
                | DataType::SmallInt
                | DataType::Integer
                | DataType::BigInt
                | DataType::Float
                | DataType::Real
                | DataType::Double
                | DataType::Decimal { .. }
        )
    }

    /// Check if this type is a string type.
    pub const fn is_text(&self) -> bool {
        matches!(
            self,
            DataType::String { .. } | DataType::Char(_) | DataType::Text | DataType::CiText
        )
    }

    /// Check if this type is a date/time type.
    pub const fn is_temporal(&self) -> bool {
        matches!(
            self,
            DataType::DateTime { .. } | DataType::DateOnly | DataType::Time
        )
    }

    /// Check if this type stores JSON documents.
    pub const fn is_json(&self) -> bool {
        matches!(self, DataType::Json | DataType::JsonB)
    }
}
