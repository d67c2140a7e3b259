//! Dialect descriptors.
//!
//! A [`Dialect`] pairs a [`DialectKind`] with its resolved [`CapabilityTree`].
//! Dialects are built once and shared read-only between generation calls.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use crate::capability::CapabilityTree;
use crate::error::{ConfigError, Result};

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Postgres,
    Mysql,
    Mariadb,
    Sqlite,
    Mssql,
    Oracle,
    Db2,
    Ibmi,
    Snowflake,
    Vertica,
}

/// How a dialect's driver expects bind parameters to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindStyle {
    /// `$1`, `$2`, ...
    Numbered,
    /// `?`
    Question,
    /// `$name`
    DollarNamed,
    /// `@name`
    AtNamed,
    /// `:1`, `:2`, ...
    ColonNumbered,
}

impl DialectKind {
    /// Every dialect, in a stable order.
    pub const ALL: [DialectKind; 10] = [
        DialectKind::Postgres,
        DialectKind::Mysql,
        DialectKind::Mariadb,
        DialectKind::Sqlite,
        DialectKind::Mssql,
        DialectKind::Oracle,
        DialectKind::Db2,
        DialectKind::Ibmi,
        DialectKind::Snowflake,
        DialectKind::Vertica,
    ];

    /// Lowercase dialect name used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            DialectKind::Postgres => "postgres",
            DialectKind::Mysql => "mysql",
            DialectKind::Mariadb => "mariadb",
            DialectKind::Sqlite => "sqlite",
            DialectKind::Mssql => "mssql",
            DialectKind::Oracle => "oracle",
            DialectKind::Db2 => "db2",
            DialectKind::Ibmi => "ibmi",
            DialectKind::Snowflake => "snowflake",
            DialectKind::Vertica => "vertica",
        }
    }

    /// Left and right identifier delimiters.
    pub const fn quote_chars(self) -> (char, char) {
        match self {
            DialectKind::Mysql | DialectKind::Mariadb | DialectKind::Sqlite => ('`', '`'),
            DialectKind::Mssql => ('[', ']'),
            _ => ('"', '"'),
        }
    }

    /// Maximum identifier length in bytes, if the dialect has one.
    pub const fn max_identifier_length(self) -> Option<usize> {
        match self {
            DialectKind::Postgres => Some(63),
            DialectKind::Mysql | DialectKind::Mariadb => Some(64),
            DialectKind::Snowflake => Some(255),
            DialectKind::Sqlite => None,
            _ => Some(128),
        }
    }

    pub const fn bind_style(self) -> BindStyle {
        match self {
            DialectKind::Postgres | DialectKind::Vertica => BindStyle::Numbered,
            DialectKind::Sqlite => BindStyle::DollarNamed,
            DialectKind::Mssql => BindStyle::AtNamed,
            DialectKind::Oracle => BindStyle::ColonNumbered,
            _ => BindStyle::Question,
        }
    }

    /// Schema that is implied when a table reference names none.
    pub const fn default_schema(self) -> Option<&'static str> {
        match self {
            DialectKind::Postgres | DialectKind::Vertica => Some("public"),
            DialectKind::Mssql => Some("dbo"),
            DialectKind::Snowflake => Some("PUBLIC"),
            _ => None,
        }
    }

    /// Backslashes in string literals are escape characters.
    pub const fn backslash_escapes(self) -> bool {
        matches!(self, DialectKind::Mysql | DialectKind::Mariadb)
    }

    /// String literals carry the `N` (national character) prefix.
    pub const fn national_strings(self) -> bool {
        matches!(self, DialectKind::Mssql)
    }

    /// Boolean literal as written inline.
    pub const fn boolean_literal(self, value: bool) -> &'static str {
        match (self.native_booleans_inline(), value) {
            (true, true) => "true",
            (true, false) => "false",
            (false, true) => "1",
            (false, false) => "0",
        }
    }

    const fn native_booleans_inline(self) -> bool {
        !matches!(
            self,
            DialectKind::Sqlite | DialectKind::Mssql | DialectKind::Ibmi | DialectKind::Oracle
        )
    }

    /// Booleans are bound as booleans rather than as `1`/`0`.
    pub const fn binds_native_booleans(self) -> bool {
        matches!(
            self,
            DialectKind::Postgres | DialectKind::Db2 | DialectKind::Snowflake | DialectKind::Vertica
        )
    }

    /// Date-time literals carry an explicit `+HH:MM` offset.
    pub const fn dates_with_offset(self) -> bool {
        matches!(
            self,
            DialectKind::Postgres
                | DialectKind::Sqlite
                | DialectKind::Mssql
                | DialectKind::Oracle
                | DialectKind::Vertica
        )
    }

    /// Capability deltas applied over the default tree.
    fn capability_overrides(self) -> JsonValue {
        match self {
            DialectKind::Postgres => json!({
                "DEFAULT VALUES": true,
                "EXCEPTION": true,
                "ON DUPLICATE KEY": false,
                "ORDER NULLS": true,
                "forShare": "FOR SHARE",
                "lock": true,
                "lockOf": true,
                "lockKey": true,
                "lockOuterJoinFailure": true,
                "skipLocked": true,
                "returnValues": "returning",
                "bulkDefault": true,
                "schemas": true,
                "multiDatabases": true,
                "jsonOperations": true,
                "REGEXP": true,
                "IREGEXP": true,
                "searchPath": true,
                "escapeStringConstants": true,
                "globalTimeZoneConfig": true,
                "uuidV1Generation": true,
                "uuidV4Generation": true,
                "delete": { "limit": false },
                "startTransaction": { "readOnly": true },
                "inserts": {
                    "onConflictDoNothing": " ON CONFLICT DO NOTHING",
                    "updateOnDuplicate": " ON CONFLICT DO UPDATE SET",
                    "conflictFields": true,
                    "onConflictWhere": true
                },
                "constraints": {
                    "deferrable": true,
                    "removeOptions": { "cascade": true, "ifExists": true }
                },
                "index": {
                    "concurrently": true,
                    "using": 2,
                    "where": true,
                    "functionBased": true,
                    "operator": true,
                    "include": true,
                    "ifNotExists": true
                },
                "dataTypes": {
                    "CITEXT": true,
                    "FLOAT": { "NaN": true, "infinity": true },
                    "REAL": { "NaN": true, "infinity": true },
                    "DOUBLE": { "NaN": true, "infinity": true },
                    "DECIMAL": { "unconstrained": true, "NaN": true, "infinity": true },
                    "CIDR": true,
                    "MACADDR": true,
                    "MACADDR8": true,
                    "INET": true,
                    "JSON": true,
                    "JSONB": true,
                    "ARRAY": true,
                    "RANGE": true,
                    "GEOMETRY": true,
                    "GEOGRAPHY": true,
                    "HSTORE": true,
                    "TSVECTOR": true,
                    "DATETIME": { "infinity": true },
                    "DATEONLY": { "infinity": true }
                },
                "jsonExtraction": { "unquoted": true, "quoted": true },
                "dropTable": { "cascade": true },
                "truncate": { "cascade": true, "restartIdentity": true },
                "removeColumn": { "cascade": true, "ifExists": true },
                "createSchema": { "authorization": true, "ifNotExists": true },
                "dropSchema": { "cascade": true, "ifExists": true },
                "addColumn": { "ifNotExists": true },
                "removeIndex": { "concurrently": true, "ifExists": true, "cascade": true },
                "createTable": { "comment": true }
            }),
            DialectKind::Mysql | DialectKind::Mariadb => {
                let mut base = json!({
                    "VALUES ()": true,
                    "LIMIT ON UPDATE": true,
                    "forShare": "LOCK IN SHARE MODE",
                    "lock": true,
                    "schemas": true,
                    "multiDatabases": true,
                    "settingIsolationLevelDuringTransaction": false,
                    "indexViaAlter": true,
                    "indexHints": true,
                    "jsonOperations": true,
                    "REGEXP": true,
                    "globalTimeZoneConfig": true,
                    "uuidV1Generation": true,
                    "startTransaction": { "readOnly": true },
                    "inserts": {
                        "ignoreDuplicates": " IGNORE",
                        "updateOnDuplicate": " ON DUPLICATE KEY UPDATE"
                    },
                    "constraints": { "foreignKeyChecksDisableable": true },
                    "index": {
                        "collate": false,
                        "length": true,
                        "parser": true,
                        "type": true,
                        "using": 1
                    },
                    "dataTypes": {
                        "COLLATE_BINARY": true,
                        "GEOMETRY": true,
                        "JSON": true,
                        "INTS": { "zerofill": true, "unsigned": true },
                        "FLOAT": { "zerofill": true, "unsigned": true, "scaleAndPrecision": true },
                        "REAL": { "zerofill": true, "unsigned": true, "scaleAndPrecision": true },
                        "DOUBLE": { "zerofill": true, "unsigned": true, "scaleAndPrecision": true },
                        "DECIMAL": { "zerofill": true, "unsigned": true }
                    },
                    "jsonExtraction": { "unquoted": true, "quoted": true },
                    "createSchema": { "charset": true, "collate": true, "ifNotExists": true },
                    "dropSchema": { "ifExists": true }
                });
                let delta = if self == DialectKind::Mysql {
                    json!({ "maxExecutionTimeHint": { "select": true } })
                } else {
                    json!({
                        "index": { "ifNotExists": true },
                        "removeColumn": { "ifExists": true },
                        "addColumn": { "ifNotExists": true },
                        "removeIndex": { "ifExists": true },
                        "constraints": { "removeOptions": { "ifExists": true } }
                    })
                };
                merge_json(&mut base, delta);
                base
            }
            DialectKind::Sqlite => json!({
                "DEFAULT": false,
                "DEFAULT VALUES": true,
                "UNION ALL": false,
                "RIGHT JOIN": false,
                "returnValues": "returning",
                "isolationLevels": false,
                "settingIsolationLevelDuringTransaction": false,
                "groupedLimit": false,
                "jsonOperations": true,
                "delete": { "limit": false },
                "startTransaction": { "useBegin": true, "transactionType": true },
                "inserts": {
                    "ignoreDuplicates": " OR IGNORE",
                    "updateOnDuplicate": " ON CONFLICT DO UPDATE SET",
                    "conflictFields": true,
                    "onConflictWhere": true
                },
                "constraints": {
                    "add": false,
                    "remove": false,
                    "foreignKeyChecksDisableable": true
                },
                "index": {
                    "using": false,
                    "where": true,
                    "functionBased": true,
                    "ifNotExists": true
                },
                "dataTypes": {
                    "CHAR": false,
                    "COLLATE_BINARY": true,
                    "CITEXT": true,
                    "JSON": true,
                    "DECIMAL": { "constrained": false, "NaN": true },
                    "FLOAT": { "NaN": true },
                    "REAL": { "NaN": true },
                    "DOUBLE": { "NaN": true }
                },
                "jsonExtraction": { "unquoted": true, "quoted": true },
                "truncate": { "restartIdentity": true },
                "renameTable": { "changeSchema": false, "changeSchemaAndTable": false },
                "removeIndex": { "ifExists": true }
            }),
            DialectKind::Mssql => json!({
                "DEFAULT VALUES": true,
                "ON DUPLICATE KEY": false,
                "EXCEPTION": true,
                "returnValues": "output",
                "schemas": true,
                "multiDatabases": true,
                "tmpTableTrigger": true,
                "tableHints": true,
                "connectionTransactionMethods": true,
                "settingIsolationLevelDuringTransaction": false,
                "jsonOperations": true,
                "uuidV4Generation": true,
                "autoIncrement": { "identityInsert": true, "defaultValue": false, "update": false },
                "constraints": {
                    "restrict": false,
                    "default": true,
                    "removeOptions": { "ifExists": true }
                },
                "index": {
                    "collate": false,
                    "type": true,
                    "using": false,
                    "where": true,
                    "include": true
                },
                "dataTypes": { "JSON": true },
                "jsonExtraction": { "unquoted": true },
                "removeColumn": { "ifExists": true },
                "renameTable": { "changeSchemaAndTable": false },
                "createSchema": { "authorization": true },
                "removeIndex": { "ifExists": true }
            }),
            DialectKind::Oracle => json!({
                "ON DUPLICATE KEY": false,
                "ORDER NULLS": true,
                "lock": true,
                "lockOuterJoinFailure": true,
                "skipLocked": true,
                "bulkDefault": true,
                "schemas": true,
                "groupedLimit": false,
                "delete": { "limit": false },
                "constraints": { "restrict": false, "onUpdate": false, "deferrable": true },
                "index": { "collate": false, "using": false, "functionBased": true },
                "dataTypes": { "JSON": true, "DECIMAL": { "unconstrained": true } },
                "dropTable": { "cascade": true },
                "renameTable": { "changeSchema": false }
            }),
            DialectKind::Db2 | DialectKind::Ibmi => {
                let mut base = json!({
                    "ON DUPLICATE KEY": false,
                    "finalTable": true,
                    "schemas": true,
                    "tmpTableTrigger": true,
                    "migrations": false,
                    "groupedLimit": false,
                    "delete": { "limit": false },
                    "autoIncrement": { "defaultValue": false, "update": false },
                    "constraints": { "onUpdate": false },
                    "index": {
                        "collate": false,
                        "using": false,
                        "where": true,
                        "functionBased": true
                    },
                    "renameTable": { "changeSchema": false }
                });
                let delta = if self == DialectKind::Db2 {
                    json!({
                        "VALUES ()": true,
                        "index": { "include": true },
                        "dataTypes": { "BIGINT": true }
                    })
                } else {
                    json!({
                        "DEFAULT VALUES": true,
                        "isolationLevels": false,
                        "constraints": { "removeOptions": { "ifExists": true } }
                    })
                };
                merge_json(&mut base, delta);
                base
            }
            DialectKind::Snowflake => json!({
                "VALUES ()": true,
                "ON DUPLICATE KEY": false,
                "schemas": true,
                "multiDatabases": true,
                "indexHints": true,
                "globalTimeZoneConfig": true,
                "delete": { "limit": false },
                "constraints": { "check": false, "restrict": false },
                "index": { "collate": false, "using": false },
                "dataTypes": { "JSON": true },
                "renameTable": { "changeSchema": false }
            }),
            DialectKind::Vertica => json!({
                "DEFAULT VALUES": true,
                "ON DUPLICATE KEY": false,
                "schemas": true,
                "groupedLimit": false,
                "delete": { "limit": false },
                "constraints": { "deferrable": false, "onUpdate": false },
                "index": { "collate": false, "using": false }
            }),
        }
    }
}

/// Plain recursive merge used to assemble dialect families before the
/// validated overlay runs.
fn merge_json(target: &mut JsonValue, delta: JsonValue) {
    match (target, delta) {
        (JsonValue::Object(target), JsonValue::Object(delta)) => {
            for (key, value) in delta {
                match target.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_json(existing, value);
                    }
                    _ => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, delta) => *target = delta,
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DialectKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DialectKind::Postgres),
            "mysql" => Ok(DialectKind::Mysql),
            "mariadb" => Ok(DialectKind::Mariadb),
            "sqlite" | "sqlite3" => Ok(DialectKind::Sqlite),
            "mssql" => Ok(DialectKind::Mssql),
            "oracle" => Ok(DialectKind::Oracle),
            "db2" => Ok(DialectKind::Db2),
            "ibmi" => Ok(DialectKind::Ibmi),
            "snowflake" => Ok(DialectKind::Snowflake),
            "vertica" => Ok(DialectKind::Vertica),
            other => Err(ConfigError::new(format!("unknown dialect \"{other}\""))),
        }
    }
}

/// A registered dialect: its kind plus the resolved capability tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dialect {
    kind: DialectKind,
    supports: CapabilityTree,
}

impl Dialect {
    /// Build a dialect with its built-in capability overrides.
    pub fn new(kind: DialectKind) -> Result<Self> {
        let supports = CapabilityTree::defaults().overlay(&kind.capability_overrides())?;
        tracing::debug!(dialect = %kind, "registered dialect");
        Ok(Self { kind, supports })
    }

    /// Build a dialect and then overlay caller-supplied capability deltas.
    ///
    /// The deltas go through the same key validation as the built-in ones.
    pub fn with_overrides(kind: DialectKind, overrides: &JsonValue) -> Result<Self> {
        let mut dialect = Self::new(kind)?;
        dialect.supports = dialect.supports.overlay(overrides)?;
        Ok(dialect)
    }

    pub const fn kind(&self) -> DialectKind {
        self.kind
    }

    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// The resolved capability tree.
    pub fn supports(&self) -> &CapabilityTree {
        &self.supports
    }

    /// Quote a single identifier, doubling any embedded closing delimiter.
    pub fn quote_identifier(&self, name: &str) -> String {
        let (left, right) = self.kind.quote_chars();
        let mut out = String::with_capacity(name.len() + 2);
        out.push(left);
        for c in name.chars() {
            if c == right {
                out.push(right);
            }
            out.push(c);
        }
        out.push(right);
        out
    }

    pub const fn default_schema(&self) -> Option<&'static str> {
        self.kind.default_schema()
    }

    pub const fn max_identifier_length(&self) -> Option<usize> {
        self.kind.max_identifier_length()
    }
}
