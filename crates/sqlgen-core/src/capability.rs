//! The capability tree: what SQL features a dialect supports.
//!
//! Every dialect starts from [`CapabilityTree::defaults`] and overlays a delta
//! with [`CapabilityTree::overlay`]. Overlays may only touch keys that exist in
//! the default tree, so every lookup against a finished tree resolves without a
//! presence check.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};

use crate::error::{ConfigError, Result};

/// Path separator used by [`CapabilityTree::get`] and friends.
pub const PATH_SEPARATOR: char = '.';

/// An immutable, nested record of boolean/string/number capability flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CapabilityTree {
    root: Map<String, JsonValue>,
}

impl CapabilityTree {
    /// The default tree every dialect starts from.
    pub fn defaults() -> Self {
        let mut root = Map::new();

        let top_level = [
            ("DEFAULT", json!(true)),
            ("DEFAULT VALUES", json!(false)),
            ("VALUES ()", json!(false)),
            ("LIMIT ON UPDATE", json!(false)),
            ("ON DUPLICATE KEY", json!(true)),
            ("ORDER NULLS", json!(false)),
            ("UNION", json!(true)),
            ("UNION ALL", json!(true)),
            ("RIGHT JOIN", json!(true)),
            ("EXCEPTION", json!(false)),
            ("forShare", json!(false)),
            ("lock", json!(false)),
            ("lockOf", json!(false)),
            ("lockKey", json!(false)),
            ("lockOuterJoinFailure", json!(false)),
            ("skipLocked", json!(false)),
            ("finalTable", json!(false)),
            ("returnValues", json!(false)),
            ("bulkDefault", json!(false)),
            ("schemas", json!(false)),
            ("multiDatabases", json!(false)),
            ("transactions", json!(true)),
            ("savepoints", json!(true)),
            ("isolationLevels", json!(true)),
            ("connectionTransactionMethods", json!(false)),
            ("settingIsolationLevelDuringTransaction", json!(true)),
            ("migrations", json!(true)),
            ("upserts", json!(true)),
            ("groupedLimit", json!(true)),
            ("indexViaAlter", json!(false)),
            ("jsonOperations", json!(false)),
            ("REGEXP", json!(false)),
            ("IREGEXP", json!(false)),
            ("tmpTableTrigger", json!(false)),
            ("indexHints", json!(false)),
            ("tableHints", json!(false)),
            ("searchPath", json!(false)),
            ("escapeStringConstants", json!(false)),
            ("globalTimeZoneConfig", json!(false)),
            ("uuidV1Generation", json!(false)),
            ("uuidV4Generation", json!(false)),
            ("maxExecutionTimeHint", json!({ "select": false })),
            ("delete", json!({ "limit": true })),
            ("alterColumn", json!({ "unique": true })),
        ];
        for (key, value) in top_level {
            root.insert(key.to_string(), value);
        }

        root.insert(
            "autoIncrement".to_string(),
            json!({ "identityInsert": false, "defaultValue": true, "update": true }),
        );
        root.insert(
            "startTransaction".to_string(),
            json!({ "useBegin": false, "readOnly": false, "transactionType": false }),
        );
        root.insert(
            "inserts".to_string(),
            json!({
                "ignoreDuplicates": "",
                "updateOnDuplicate": false,
                "onConflictDoNothing": "",
                "onConflictWhere": false,
                "conflictFields": false
            }),
        );
        root.insert(
            "constraints".to_string(),
            json!({
                "restrict": true,
                "deferrable": false,
                "unique": true,
                "default": false,
                "check": true,
                "foreignKey": true,
                "foreignKeyChecksDisableable": false,
                "primaryKey": true,
                "onUpdate": true,
                "add": true,
                "remove": true,
                "removeOptions": { "cascade": false, "ifExists": false }
            }),
        );
        root.insert(
            "index".to_string(),
            json!({
                "collate": true,
                "length": false,
                "parser": false,
                "concurrently": false,
                "type": false,
                "using": true,
                "functionBased": false,
                "operator": false,
                "where": false,
                "include": false,
                "ifNotExists": false
            }),
        );
        root.insert("dataTypes".to_string(), default_data_types());
        root.insert(
            "jsonExtraction".to_string(),
            json!({ "unquoted": false, "quoted": false }),
        );
        root.insert("dropTable".to_string(), json!({ "cascade": false }));
        root.insert(
            "truncate".to_string(),
            json!({ "cascade": false, "restartIdentity": false }),
        );
        root.insert(
            "removeColumn".to_string(),
            json!({ "cascade": false, "ifExists": false }),
        );
        root.insert(
            "renameTable".to_string(),
            json!({ "changeSchema": true, "changeSchemaAndTable": true }),
        );
        root.insert(
            "createSchema".to_string(),
            json!({
                "authorization": false,
                "charset": false,
                "collate": false,
                "comment": false,
                "ifNotExists": false,
                "replace": false
            }),
        );
        root.insert(
            "dropSchema".to_string(),
            json!({ "cascade": false, "ifExists": false }),
        );
        root.insert("addColumn".to_string(), json!({ "ifNotExists": false }));
        root.insert(
            "removeIndex".to_string(),
            json!({ "concurrently": false, "ifExists": false, "cascade": false }),
        );
        root.insert(
            "createTable".to_string(),
            json!({ "comment": false, "uniqueKeys": true }),
        );

        Self { root }
    }

    /// Deep-merge `delta` onto a copy of this tree.
    ///
    /// Nested objects merge key by key; leaves are replaced. A key absent from
    /// this tree, or an object where a leaf is expected (or the reverse), is a
    /// registration error.
    pub fn overlay(&self, delta: &JsonValue) -> Result<Self> {
        let JsonValue::Object(delta) = delta else {
            return Err(ConfigError::new("capability overrides must be a JSON object").into());
        };
        let mut root = self.root.clone();
        merge_into(&mut root, delta, "")?;
        Ok(Self { root })
    }

    /// Look up a dotted path such as `index.collate`.
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let mut segments = path.split(PATH_SEPARATOR);
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Whether the flag at `path` is truthy.
    ///
    /// Strings count as enabled when non-empty, numbers when non-zero.
    pub fn enabled(&self, path: &str) -> bool {
        match self.get(path) {
            Some(JsonValue::Bool(b)) => *b,
            Some(JsonValue::String(s)) => !s.is_empty(),
            Some(JsonValue::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            Some(JsonValue::Object(_)) => true,
            _ => false,
        }
    }

    /// The string value at `path`, if it is a string.
    pub fn text(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(JsonValue::as_str)
    }

    /// The numeric value at `path`, if it is a number.
    pub fn number(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(JsonValue::as_i64)
    }

    /// Every leaf path in the tree, depth-first in declaration order.
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_paths(&self.root, "", &mut out);
        out
    }

    /// The tree as a JSON value.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.root.clone())
    }
}

impl Default for CapabilityTree {
    fn default() -> Self {
        Self::defaults()
    }
}

fn default_data_types() -> JsonValue {
    let numeric = json!({
        "NaN": false,
        "infinity": false,
        "zerofill": false,
        "unsigned": false,
        "scaleAndPrecision": false
    });
    json!({
        "CHAR": true,
        "COLLATE_BINARY": false,
        "CITEXT": false,
        "BIGINT": true,
        "INTS": { "zerofill": false, "unsigned": false },
        "FLOAT": numeric.clone(),
        "REAL": numeric.clone(),
        "DOUBLE": numeric,
        "DECIMAL": {
            "constrained": true,
            "unconstrained": false,
            "NaN": false,
            "infinity": false,
            "zerofill": false,
            "unsigned": false
        },
        "CIDR": false,
        "MACADDR": false,
        "MACADDR8": false,
        "INET": false,
        "JSON": false,
        "JSONB": false,
        "ARRAY": false,
        "RANGE": false,
        "GEOMETRY": false,
        "GEOGRAPHY": false,
        "HSTORE": false,
        "TSVECTOR": false,
        "DATETIME": { "infinity": false },
        "DATEONLY": { "infinity": false },
        "TIME": { "precision": true }
    })
}

fn merge_into(
    target: &mut Map<String, JsonValue>,
    delta: &Map<String, JsonValue>,
    prefix: &str,
) -> Result<()> {
    for (key, value) in delta {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{PATH_SEPARATOR}{key}")
        };
        let Some(existing) = target.get_mut(key) else {
            return Err(ConfigError::new(format!(
                "unknown capability \"{path}\": extend the default capability tree first"
            ))
            .into());
        };
        match (existing, value) {
            (JsonValue::Object(existing), JsonValue::Object(value)) => {
                merge_into(existing, value, &path)?;
            }
            (JsonValue::Object(_), _) => {
                return Err(ConfigError::new(format!(
                    "capability \"{path}\" is a group and cannot be replaced by a single value"
                ))
                .into());
            }
            (_, JsonValue::Object(_)) => {
                return Err(ConfigError::new(format!(
                    "capability \"{path}\" is a flag and cannot be replaced by a group"
                ))
                .into());
            }
            (existing, value) => *existing = value.clone(),
        }
    }
    Ok(())
}

fn collect_paths(map: &Map<String, JsonValue>, prefix: &str, out: &mut Vec<String>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{PATH_SEPARATOR}{key}")
        };
        match value {
            JsonValue::Object(inner) => collect_paths(inner, &path, out),
            _ => out.push(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve_nested_paths() {
        let tree = CapabilityTree::defaults();
        assert!(tree.enabled("index.collate"));
        assert!(!tree.enabled("index.length"));
        assert!(!tree.enabled("constraints.removeOptions.cascade"));
        assert_eq!(tree.text("inserts.ignoreDuplicates"), Some(""));
        assert!(!tree.enabled("inserts.ignoreDuplicates"));
        assert!(tree.enabled("DEFAULT"));
        assert_eq!(tree.get("index.nope"), None);
    }

    #[test]
    fn test_overlay_replaces_leaves_and_merges_groups() {
        let tree = CapabilityTree::defaults()
            .overlay(&json!({
                "returnValues": "returning",
                "index": { "using": 2, "where": true }
            }))
            .unwrap();
        assert_eq!(tree.text("returnValues"), Some("returning"));
        assert_eq!(tree.number("index.using"), Some(2));
        assert!(tree.enabled("index.where"));
        // untouched siblings survive the merge
        assert!(tree.enabled("index.collate"));
    }

    #[test]
    fn test_overlay_rejects_unknown_keys() {
        let err = CapabilityTree::defaults()
            .overlay(&json!({ "index": { "colate": false } }))
            .unwrap_err();
        assert!(err.to_string().contains("index.colate"));
    }

    #[test]
    fn test_overlay_rejects_shape_mismatch() {
        let tree = CapabilityTree::defaults();
        assert!(tree.overlay(&json!({ "index": false })).is_err());
        assert!(tree.overlay(&json!({ "schemas": { "x": true } })).is_err());
        assert!(tree.overlay(&json!(true)).is_err());
    }

    #[test]
    fn test_paths_cover_every_leaf() {
        let tree = CapabilityTree::defaults();
        let paths = tree.paths();
        assert!(paths.contains(&"constraints.removeOptions.ifExists".to_string()));
        assert!(paths.contains(&"DEFAULT VALUES".to_string()));
        for path in &paths {
            assert!(tree.get(path).is_some(), "{path} should resolve");
        }
    }

    #[test]
    fn test_overlay_keeps_key_set() {
        let base = CapabilityTree::defaults();
        let tree = base
            .overlay(&json!({ "dataTypes": { "JSON": true } }))
            .unwrap();
        assert_eq!(base.paths(), tree.paths());
    }
}
