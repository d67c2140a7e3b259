//! Every flag of the default capability tree is either a gate, rejecting a
//! named option where it is disabled, or explicitly listed as not gating
//! anything.

use std::sync::Arc;

use serde_json::{Map, Value as JsonValue, json};
use sqlgen::{
    AddColumnOptions, Association, Attribute, CapabilityTree, ColumnChange, Cond,
    ConstraintOptions, ConstraintReference, CreateSchemaOptions, CreateTableOptions, DataType,
    Deferrable, DeleteOptions, Dialect, DialectKind, DropSchemaOptions, DropTableOptions, Expr,
    Generator, GeneratorOptions, Include, IndexColumn, IndexHint, IndexHintKind, IndexOptions,
    IndexTarget, InsertOptions, IsolationLevel, Lock, ModelDefinition, Op, Operand, Operation,
    OrderItem, ReferentialAction, RemoveColumnOptions, RemoveConstraintOptions,
    RemoveIndexOptions, RenameTableOptions, Returning, SelectOptions, StartTransactionOptions,
    TableHint, TableRef, TransactionType, TruncateOptions, UpdateOptions, Value, Where,
};

use sqlgen::DialectKind::{Db2, Mariadb, Mssql, Mysql, Postgres, Snowflake, Sqlite};

/// Snowflake rejects index DDL before reading any index option.
const NO_INDEXES: &[DialectKind] = &[Snowflake];
/// SQL Server transactions live on the connection, so every transaction
/// statement is rejected up front.
const DRIVER_TRANSACTIONS: &[DialectKind] = &[Mssql];
/// The MySQL family writes table comments as a `COMMENT=` table option.
const INLINE_TABLE_COMMENT: &[DialectKind] = &[Mysql, Mariadb];

/// Flags that select syntax or describe the dialect to callers. None of
/// them turns a requested option into an error. Entries ending in `.` cover
/// every path below them.
const NOT_GATED: &[(&str, &str)] = &[
    ("DEFAULT", "DEFAULT or NULL for columns missing from a bulk insert row"),
    ("DEFAULT VALUES", "INSERT ... DEFAULT VALUES for rows without columns"),
    ("VALUES ()", "INSERT ... VALUES () for rows without columns"),
    ("ON DUPLICATE KEY", "upsert spelling"),
    ("UNION", "read by callers composing statements"),
    ("UNION ALL", "read by callers composing statements"),
    ("EXCEPTION", "PL/SQL style exception blocks in generated DDL"),
    ("lockOuterJoinFailure", "read by callers building includes under a lock"),
    ("bulkDefault", "read by callers filling bulk defaults"),
    ("multiDatabases", "read by callers"),
    ("transactions", "read by callers"),
    ("connectionTransactionMethods", "enabling it rejects every transaction statement"),
    ("settingIsolationLevelDuringTransaction", "read by callers"),
    ("migrations", "read by callers"),
    ("groupedLimit", "read by callers"),
    ("indexViaAlter", "ALTER TABLE ... ADD INDEX instead of CREATE INDEX"),
    ("tmpTableTrigger", "OUTPUT INTO a table variable for tables with triggers"),
    ("searchPath", "read by callers"),
    ("escapeStringConstants", "read by callers"),
    ("globalTimeZoneConfig", "read by callers"),
    ("uuidV1Generation", "read by callers"),
    ("uuidV4Generation", "read by callers"),
    ("autoIncrement.", "identity column spelling in INSERT and UPDATE"),
    ("startTransaction.useBegin", "BEGIN instead of START TRANSACTION"),
    ("inserts.conflictFields", "read by callers"),
    ("constraints.foreignKeyChecksDisableable", "read by callers"),
    ("jsonExtraction.", "extraction forms the dialect can spell"),
    ("dataTypes.", "type spelling and literal formatting"),
];

struct Gate {
    /// Capability path consulted by the generator
    path: &'static str,
    /// Option name reported when the capability is missing
    option: &'static str,
    /// Capabilities that also lift the rejection
    alternatives: Vec<&'static str>,
    /// Capabilities that must hold before the option is even considered
    prerequisites: Vec<&'static str>,
    /// Dialects that reject the operation as a whole
    skip: &'static [DialectKind],
    /// Dialect the operation is otherwise valid on
    base: DialectKind,
    operation: fn() -> Operation,
}

impl Gate {
    fn new(path: &'static str, option: &'static str, base: DialectKind, operation: fn() -> Operation) -> Self {
        Self {
            path,
            option,
            alternatives: Vec::new(),
            prerequisites: Vec::new(),
            skip: &[],
            base,
            operation,
        }
    }

    fn or(mut self, alternative: &'static str) -> Self {
        self.alternatives.push(alternative);
        self
    }

    fn after(mut self, prerequisite: &'static str) -> Self {
        self.prerequisites.push(prerequisite);
        self
    }

    fn skip(mut self, kinds: &'static [DialectKind]) -> Self {
        self.skip = kinds;
        self
    }

    fn enabled(&self, supports: &CapabilityTree) -> bool {
        supports.enabled(self.path) || self.alternatives.iter().any(|a| supports.enabled(a))
    }

    fn reachable(&self, kind: DialectKind, supports: &CapabilityTree) -> bool {
        !self.skip.contains(&kind) && self.prerequisites.iter().all(|p| supports.enabled(p))
    }
}

// ==================== Operations ====================

fn select(options: SelectOptions) -> Operation {
    Operation::Select {
        table: "heroes".into(),
        options,
    }
}

fn insert(options: InsertOptions) -> Operation {
    Operation::Insert {
        table: "heroes".into(),
        values: vec![("name".to_string(), Value::from("Deadpond"))],
        options,
    }
}

fn add_index(options: IndexOptions) -> Operation {
    Operation::AddIndex {
        table: "heroes".into(),
        options,
    }
}

fn remove_index(options: RemoveIndexOptions) -> Operation {
    Operation::RemoveIndex {
        table: "heroes".into(),
        target: IndexTarget::Name("heroes_name".to_string()),
        options,
    }
}

fn add_constraint(options: ConstraintOptions) -> Operation {
    Operation::AddConstraint {
        table: "heroes".into(),
        options,
    }
}

fn foreign_key() -> ConstraintOptions {
    ConstraintOptions::foreign_key(["team_id"], ConstraintReference::new("teams", ["id"]))
}

fn add_column(data_type: DataType) -> Operation {
    Operation::AddColumn {
        table: "heroes".into(),
        attribute: Attribute::new("power", data_type),
        options: AddColumnOptions::default(),
    }
}

fn create_table(options: CreateTableOptions) -> Operation {
    Operation::CreateTable {
        table: "heroes".into(),
        attributes: vec![
            Attribute::primary_key("id"),
            Attribute::new("name", DataType::string()),
        ],
        options,
    }
}

fn create_schema(options: CreateSchemaOptions) -> Operation {
    Operation::CreateSchema {
        name: "league".to_string(),
        options,
    }
}

fn rename_table(after: TableRef) -> Operation {
    Operation::RenameTable {
        before: "heroes".into(),
        after,
        options: RenameTableOptions { change_schema: true },
    }
}

fn start_transaction(options: StartTransactionOptions) -> Operation {
    Operation::StartTransaction(options)
}

fn teams_include() -> Include {
    let team = ModelDefinition::new("Team", "teams").attribute(Attribute::primary_key("id"));
    Include::new(Association::has_many("teams", Arc::new(team), "heroId"))
}

fn gates() -> Vec<Gate> {
    vec![
        // ==================== DML ====================
        Gate::new("delete.limit", "limit", Mysql, || Operation::Delete {
            table: "heroes".into(),
            where_: Where::eq("id", 1),
            options: DeleteOptions::default().with_limit(1),
        }),
        Gate::new("LIMIT ON UPDATE", "limit", Mysql, || Operation::Update {
            table: "heroes".into(),
            values: vec![("name".to_string(), Value::from("Deadpond"))],
            where_: Where::eq("id", 1),
            options: UpdateOptions::new().with_limit(1),
        }),
        Gate::new("truncate.cascade", "cascade", Postgres, || Operation::Truncate {
            table: "heroes".into(),
            options: TruncateOptions {
                cascade: true,
                ..TruncateOptions::default()
            },
        }),
        Gate::new("truncate.restartIdentity", "restartIdentity", Postgres, || {
            Operation::Truncate {
                table: "heroes".into(),
                options: TruncateOptions {
                    restart_identity: true,
                    ..TruncateOptions::default()
                },
            }
        }),
        Gate::new("returnValues", "returning", Postgres, || {
            insert(InsertOptions::new().with_returning(Returning::All))
        })
        .or("finalTable"),
        Gate::new("finalTable", "returning", Db2, || {
            insert(InsertOptions::new().with_returning(Returning::All))
        })
        .or("returnValues"),
        Gate::new("inserts.ignoreDuplicates", "ignoreDuplicates", Mysql, || {
            insert(InsertOptions::new().ignore_duplicates())
        })
        .or("inserts.onConflictDoNothing"),
        Gate::new("inserts.onConflictDoNothing", "ignoreDuplicates", Postgres, || {
            insert(InsertOptions::new().ignore_duplicates())
        })
        .or("inserts.ignoreDuplicates"),
        Gate::new("inserts.updateOnDuplicate", "updateOnDuplicate", Mysql, || {
            insert(InsertOptions::new().with_update_on_duplicate(["name"]))
        }),
        Gate::new("inserts.onConflictWhere", "conflictWhere", Postgres, || {
            insert(InsertOptions::new().with_conflict_where(Where::eq("active", 1)))
        }),
        Gate::new("upserts", "upserts", Postgres, || Operation::Upsert {
            table: "heroes".into(),
            insert_values: vec![
                ("id".to_string(), Value::Int(1)),
                ("name".to_string(), Value::from("Deadpond")),
            ],
            update_values: vec![("name".to_string(), Value::from("Deadpond"))],
            options: InsertOptions::new().with_upsert_keys(["id"]),
        }),
        // ==================== SELECT ====================
        Gate::new("lock", "lock", Postgres, || {
            select(SelectOptions::new().with_lock(Lock::update()))
        }),
        Gate::new("forShare", "forShare", Postgres, || {
            select(SelectOptions::new().with_lock(Lock::share()))
        }),
        Gate::new("lockKey", "lockKey", Postgres, || {
            select(SelectOptions::new().with_lock(Lock::key_share()))
        }),
        Gate::new("lockOf", "lockOf", Postgres, || {
            select(SelectOptions::new().with_lock(Lock::update().of("heroes")))
        }),
        Gate::new("skipLocked", "skipLocked", Postgres, || {
            select(SelectOptions::new().with_lock(Lock::update().skip_locked()))
        }),
        Gate::new("ORDER NULLS", "ORDER NULLS", Postgres, || {
            select(SelectOptions::new().with_order(OrderItem::asc("name").nulls_first()))
        }),
        Gate::new("RIGHT JOIN", "RIGHT JOIN", Postgres, || {
            select(SelectOptions::new().with_include(teams_include().right()))
        }),
        Gate::new("maxExecutionTimeHint.select", "maxExecutionTimeHint", Mysql, || {
            select(SelectOptions::new().with_max_execution_time(100))
        }),
        Gate::new("indexHints", "indexHints", Mysql, || {
            select(SelectOptions::new().with_index_hint(IndexHint::new(IndexHintKind::Use, ["heroes_name"])))
        }),
        Gate::new("tableHints", "tableHints", Mssql, || {
            select(SelectOptions::new().with_table_hint(TableHint::NoLock))
        }),
        Gate::new("REGEXP", "REGEXP", Postgres, || {
            select(SelectOptions::new().with_where(Where::op("name", Op::Regexp, Operand::value("^D"))))
        }),
        Gate::new("IREGEXP", "IREGEXP", Postgres, || {
            select(SelectOptions::new().with_where(Where::op("name", Op::IRegexp, Operand::value("^d"))))
        }),
        Gate::new("jsonOperations", "jsonOperations", Postgres, || {
            let name = Expr::json(Expr::col("profile"), ["name"]);
            select(SelectOptions::new().with_where(Where::compare(name, Cond::value("Deadpond"))))
        }),
        Gate::new("dataTypes.RANGE", "dataTypes.RANGE", Postgres, || {
            select(SelectOptions::new().with_where(Where::op("active_during", Op::Adjacent, Operand::value(1))))
        }),
        Gate::new("dataTypes.TSVECTOR", "dataTypes.TSVECTOR", Postgres, || {
            select(SelectOptions::new().with_where(Where::op("search", Op::Match, Operand::value("hero"))))
        }),
        // ==================== Column types ====================
        Gate::new("dataTypes.ARRAY", "dataTypes.ARRAY", Postgres, || {
            add_column(DataType::Array(Box::new(DataType::Integer)))
        }),
        Gate::new("dataTypes.CITEXT", "dataTypes.CITEXT", Postgres, || add_column(DataType::CiText)),
        Gate::new("dataTypes.JSON", "dataTypes.JSON", Postgres, || add_column(DataType::Json)),
        Gate::new("dataTypes.JSONB", "dataTypes.JSONB", Postgres, || add_column(DataType::JsonB)),
        // ==================== Transactions ====================
        Gate::new("startTransaction.readOnly", "readOnly", Postgres, || {
            start_transaction(StartTransactionOptions {
                read_only: true,
                ..StartTransactionOptions::default()
            })
        })
        .skip(DRIVER_TRANSACTIONS),
        Gate::new("startTransaction.transactionType", "transactionType", Sqlite, || {
            start_transaction(StartTransactionOptions {
                transaction_type: Some(TransactionType::Immediate),
                ..StartTransactionOptions::default()
            })
        })
        .skip(DRIVER_TRANSACTIONS),
        Gate::new("savepoints", "savepoints", Postgres, || {
            Operation::CreateSavepoint("before_battle".to_string())
        }),
        Gate::new("isolationLevels", "isolationLevels", Postgres, || {
            Operation::SetIsolationLevel(IsolationLevel::Serializable)
        }),
        // ==================== Indexes ====================
        Gate::new("index.collate", "collate", Postgres, || {
            add_index(IndexOptions::new([IndexColumn::new("name").collate("C")]))
        })
        .skip(NO_INDEXES),
        Gate::new("index.concurrently", "concurrently", Postgres, || {
            add_index(IndexOptions::new(["name"]).concurrently())
        })
        .skip(NO_INDEXES),
        Gate::new("index.functionBased", "functionBased", Postgres, || {
            add_index(IndexOptions::new([Expr::func("lower", [Expr::col("name")])]))
        })
        .skip(NO_INDEXES),
        Gate::new("index.ifNotExists", "ifNotExists", Postgres, || {
            add_index(IndexOptions::new(["name"]).if_not_exists())
        })
        .skip(NO_INDEXES),
        Gate::new("index.include", "include", Postgres, || {
            add_index(IndexOptions::new(["name"]).unique().with_include([Expr::col("power")]))
        })
        .skip(NO_INDEXES),
        Gate::new("index.length", "length", Mysql, || {
            add_index(IndexOptions::new([IndexColumn::new("name").length(10)]))
        })
        .skip(NO_INDEXES),
        Gate::new("index.operator", "operator", Postgres, || {
            add_index(IndexOptions::new(["name"]).with_operator("text_pattern_ops"))
        })
        .skip(NO_INDEXES),
        Gate::new("index.parser", "parser", Mysql, || {
            add_index(IndexOptions::new(["name"]).with_type("FULLTEXT").with_parser("ngram"))
        })
        .skip(NO_INDEXES),
        Gate::new("index.type", "type", Mysql, || {
            add_index(IndexOptions::new(["name"]).with_type("FULLTEXT"))
        })
        .skip(NO_INDEXES),
        Gate::new("index.using", "using", Postgres, || {
            add_index(IndexOptions::new(["name"]).with_using("BTREE"))
        })
        .skip(NO_INDEXES),
        Gate::new("index.where", "where", Postgres, || {
            add_index(IndexOptions::new(["name"]).with_where(Where::eq("active", 1)))
        })
        .skip(NO_INDEXES),
        Gate::new("removeIndex.concurrently", "concurrently", Postgres, || {
            remove_index(RemoveIndexOptions {
                concurrently: true,
                ..RemoveIndexOptions::default()
            })
        })
        .skip(NO_INDEXES),
        Gate::new("removeIndex.ifExists", "ifExists", Postgres, || {
            remove_index(RemoveIndexOptions {
                if_exists: true,
                ..RemoveIndexOptions::default()
            })
        })
        .skip(NO_INDEXES),
        Gate::new("removeIndex.cascade", "cascade", Postgres, || {
            remove_index(RemoveIndexOptions {
                cascade: true,
                ..RemoveIndexOptions::default()
            })
        })
        .skip(NO_INDEXES),
        // ==================== Constraints ====================
        Gate::new("constraints.add", "constraints.add", Postgres, || {
            add_constraint(ConstraintOptions::unique(["name"]))
        }),
        Gate::new("constraints.unique", "constraints.unique", Postgres, || {
            add_constraint(ConstraintOptions::unique(["name"]))
        })
        .after("constraints.add"),
        Gate::new("constraints.check", "constraints.check", Postgres, || {
            add_constraint(ConstraintOptions::check(
                ["power"],
                Where::op("power", Op::Gt, Operand::value(0)),
            ))
        })
        .after("constraints.add"),
        Gate::new("constraints.default", "constraints.default", Mssql, || {
            add_constraint(ConstraintOptions::default_value("power", 0))
        })
        .after("constraints.add"),
        Gate::new("constraints.primaryKey", "constraints.primaryKey", Postgres, || {
            add_constraint(ConstraintOptions::primary_key(["id"]))
        })
        .after("constraints.add"),
        Gate::new("constraints.foreignKey", "constraints.foreignKey", Postgres, || {
            add_constraint(foreign_key())
        })
        .after("constraints.add"),
        Gate::new("constraints.deferrable", "constraints.deferrable", Postgres, || {
            add_constraint(ConstraintOptions::unique(["name"]).deferrable(Deferrable::InitiallyDeferred))
        })
        .after("constraints.add")
        .after("constraints.unique"),
        Gate::new("constraints.restrict", "constraints.restrict", Postgres, || {
            add_constraint(foreign_key().on_delete(ReferentialAction::Restrict))
        })
        .after("constraints.add")
        .after("constraints.foreignKey"),
        Gate::new("constraints.onUpdate", "constraints.onUpdate", Postgres, || {
            add_constraint(foreign_key().on_update(ReferentialAction::Cascade))
        })
        .after("constraints.add")
        .after("constraints.foreignKey"),
        Gate::new("constraints.remove", "constraints.remove", Postgres, || {
            Operation::RemoveConstraint {
                table: "heroes".into(),
                name: "heroes_name_uk".to_string(),
                options: RemoveConstraintOptions::default(),
            }
        }),
        Gate::new("constraints.removeOptions.cascade", "cascade", Postgres, || {
            Operation::RemoveConstraint {
                table: "heroes".into(),
                name: "heroes_name_uk".to_string(),
                options: RemoveConstraintOptions {
                    cascade: true,
                    ..RemoveConstraintOptions::default()
                },
            }
        })
        .after("constraints.remove"),
        Gate::new("constraints.removeOptions.ifExists", "ifExists", Postgres, || {
            Operation::RemoveConstraint {
                table: "heroes".into(),
                name: "heroes_name_uk".to_string(),
                options: RemoveConstraintOptions {
                    if_exists: true,
                    ..RemoveConstraintOptions::default()
                },
            }
        })
        .after("constraints.remove"),
        // ==================== Tables and columns ====================
        Gate::new("createTable.comment", "createTable.comment", Postgres, || {
            create_table(CreateTableOptions::new().with_comment("Every hero"))
        })
        .skip(INLINE_TABLE_COMMENT),
        Gate::new("createTable.uniqueKeys", "createTable.uniqueKeys", Postgres, || {
            create_table(CreateTableOptions::new().with_unique_key(None, ["name"]))
        }),
        Gate::new("dropTable.cascade", "cascade", Postgres, || Operation::DropTable {
            table: "heroes".into(),
            options: DropTableOptions { cascade: true },
        }),
        Gate::new("renameTable.changeSchema", "renameTable.changeSchema", Postgres, || {
            rename_table(TableRef::new("heroes").with_schema("archive"))
        }),
        Gate::new("renameTable.changeSchemaAndTable", "renameTable.changeSchemaAndTable", Postgres, || {
            rename_table(TableRef::new("retired_heroes").with_schema("archive"))
        })
        .after("renameTable.changeSchema"),
        Gate::new("addColumn.ifNotExists", "ifNotExists", Postgres, || Operation::AddColumn {
            table: "heroes".into(),
            attribute: Attribute::new("power", DataType::string()),
            options: AddColumnOptions { if_not_exists: true },
        }),
        Gate::new("removeColumn.cascade", "cascade", Postgres, || Operation::RemoveColumn {
            table: "heroes".into(),
            column: "power".to_string(),
            options: RemoveColumnOptions {
                cascade: true,
                ..RemoveColumnOptions::default()
            },
        }),
        Gate::new("removeColumn.ifExists", "ifExists", Postgres, || Operation::RemoveColumn {
            table: "heroes".into(),
            column: "power".to_string(),
            options: RemoveColumnOptions {
                if_exists: true,
                ..RemoveColumnOptions::default()
            },
        }),
        Gate::new("alterColumn.unique", "alterColumn.unique", Postgres, || Operation::ChangeColumn {
            table: "heroes".into(),
            column: "name".to_string(),
            change: ColumnChange::new().unique(),
        }),
        // ==================== Schemas ====================
        Gate::new("schemas", "schemas", Postgres, || create_schema(CreateSchemaOptions::default())),
        Gate::new("createSchema.authorization", "authorization", Postgres, || {
            create_schema(CreateSchemaOptions {
                authorization: Some("admin".to_string()),
                ..CreateSchemaOptions::default()
            })
        })
        .after("schemas"),
        Gate::new("createSchema.charset", "charset", Mysql, || {
            create_schema(CreateSchemaOptions {
                charset: Some("utf8mb4".to_string()),
                ..CreateSchemaOptions::default()
            })
        })
        .after("schemas"),
        Gate::new("createSchema.collate", "collate", Mysql, || {
            create_schema(CreateSchemaOptions {
                collate: Some("utf8mb4_bin".to_string()),
                ..CreateSchemaOptions::default()
            })
        })
        .after("schemas"),
        Gate::new("createSchema.comment", "comment", Postgres, || {
            create_schema(CreateSchemaOptions {
                comment: Some("Retired heroes".to_string()),
                ..CreateSchemaOptions::default()
            })
        })
        .after("schemas"),
        Gate::new("createSchema.ifNotExists", "ifNotExists", Postgres, || {
            create_schema(CreateSchemaOptions {
                if_not_exists: true,
                ..CreateSchemaOptions::default()
            })
        })
        .after("schemas"),
        Gate::new("createSchema.replace", "replace", Postgres, || {
            create_schema(CreateSchemaOptions {
                replace: true,
                ..CreateSchemaOptions::default()
            })
        })
        .after("schemas"),
        Gate::new("dropSchema.cascade", "cascade", Postgres, || Operation::DropSchema {
            name: "league".to_string(),
            options: DropSchemaOptions {
                cascade: true,
                ..DropSchemaOptions::default()
            },
        })
        .after("schemas"),
        Gate::new("dropSchema.ifExists", "ifExists", Postgres, || Operation::DropSchema {
            name: "league".to_string(),
            options: DropSchemaOptions {
                if_exists: true,
                ..DropSchemaOptions::default()
            },
        })
        .after("schemas"),
    ]
}

fn not_gated(path: &str) -> bool {
    NOT_GATED.iter().any(|(entry, _)| {
        if entry.ends_with('.') {
            path.starts_with(entry)
        } else {
            path == *entry
        }
    })
}

/// Overrides setting every path in `paths` to `flag`.
fn setting(paths: &[&str], flag: bool) -> JsonValue {
    let mut root = Map::new();
    for path in paths {
        let mut segments: Vec<&str> = path.split('.').collect();
        let leaf = segments.pop().unwrap();
        let mut node = &mut root;
        for segment in segments {
            node = node
                .entry(segment)
                .or_insert_with(|| json!({}))
                .as_object_mut()
                .unwrap();
        }
        node.insert(leaf.to_string(), json!(flag));
    }
    JsonValue::Object(root)
}

fn names_option(result: &sqlgen::Result<Vec<sqlgen::Statement>>, option: &str) -> bool {
    result
        .as_ref()
        .err()
        .is_some_and(|err| err.is_capability() && err.unsupported_options().iter().any(|o| o == option))
}

#[test]
fn test_every_capability_is_classified() {
    let gated: Vec<&str> = gates().iter().map(|g| g.path).collect();
    let unmapped: Vec<String> = CapabilityTree::defaults()
        .paths()
        .into_iter()
        .filter(|path| !gated.contains(&path.as_str()) && !not_gated(path))
        .collect();
    assert!(unmapped.is_empty(), "capabilities neither gated nor listed: {unmapped:?}");
}

#[test]
fn test_classification_names_existing_capabilities() {
    let defaults = CapabilityTree::defaults();
    let paths = defaults.paths();
    for gate in gates() {
        for path in std::iter::once(&gate.path).chain(&gate.alternatives).chain(&gate.prerequisites) {
            assert!(paths.iter().any(|p| p == path), "{path} is not a capability");
        }
        let exact = NOT_GATED.iter().any(|(entry, _)| *entry == gate.path);
        assert!(!exact, "{} is both gated and listed as not gated", gate.path);
    }
    for (entry, _) in NOT_GATED {
        let covered = if entry.ends_with('.') {
            paths.iter().any(|p| p.starts_with(entry))
        } else {
            paths.iter().any(|p| p == entry)
        };
        assert!(covered, "{entry} matches no capability");
    }
}

#[test]
fn test_disabled_capability_rejects_its_option() {
    for gate in gates() {
        let mut disabled = vec![gate.path];
        disabled.extend(&gate.alternatives);
        let dialect = Dialect::with_overrides(gate.base, &setting(&disabled, false)).unwrap();
        let generator = Generator::new(dialect, GeneratorOptions::default()).unwrap();
        let result = generator.generate(&(gate.operation)(), None);
        assert!(
            names_option(&result, gate.option),
            "{:?} without {} should reject {}: {result:?}",
            gate.base,
            gate.path,
            gate.option
        );
    }
}

#[test]
fn test_enabled_capability_lifts_the_rejection() {
    for gate in gates() {
        let mut dialect = Dialect::new(gate.base).unwrap();
        // Flags no built-in dialect enables are switched on explicitly
        if !gate.enabled(dialect.supports()) {
            dialect = Dialect::with_overrides(gate.base, &setting(&[gate.path], true)).unwrap();
        }
        let generator = Generator::new(dialect, GeneratorOptions::default()).unwrap();
        let supports = generator.query().supports();
        assert!(gate.reachable(gate.base, supports), "{:?} cannot reach {}", gate.base, gate.path);
        let result = generator.generate(&(gate.operation)(), None);
        assert!(
            !names_option(&result, gate.option),
            "{:?} enables {} but rejected {}: {result:?}",
            gate.base,
            gate.path,
            gate.option
        );
    }
}

#[test]
fn test_gated_options_follow_builtin_capabilities() {
    for kind in DialectKind::ALL {
        let generator = Generator::for_kind(kind).unwrap();
        let supports = generator.query().supports();
        for gate in gates() {
            if !gate.reachable(kind, supports) {
                continue;
            }
            let result = generator.generate(&(gate.operation)(), None);
            if gate.enabled(supports) {
                assert!(!names_option(&result, gate.option), "{kind:?} should accept {}: {result:?}", gate.path);
            } else {
                assert!(names_option(&result, gate.option), "{kind:?} should reject {}: {result:?}", gate.path);
            }
        }
    }
}

#[test]
fn test_schemas_gate_whole_operation() {
    for kind in DialectKind::ALL {
        let generator = Generator::for_kind(kind).unwrap();
        if generator.query().supports().enabled("schemas") {
            continue;
        }
        let err = generator
            .generate(&create_schema(CreateSchemaOptions::default()), None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Schemas are not supported in {}.", generator.dialect_name())
        );
    }
}
