//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use sqlgen::{
    ArithmeticOp, Attribute, CreateTableOptions, DataType, DeleteOptions, DropTableOptions,
    Generator, IndexOptions, InsertOptions, IsolationLevel, ModelDefinition, Op, Operand,
    Operation, OrderItem, SelectOptions, StartTransactionOptions, Statement, TruncateOptions,
    UpdateOptions, Value, Where,
};

pub fn heroes() -> ModelDefinition {
    ModelDefinition::new("Hero", "heroes")
        .attribute(Attribute::primary_key("id"))
        .attribute(Attribute::new("name", DataType::string()).not_null())
        .attribute(Attribute::new("age", DataType::Integer))
}

fn row(name: &str, age: i64) -> Vec<(String, Value)> {
    vec![
        ("name".to_string(), Value::from(name)),
        ("age".to_string(), Value::from(age)),
    ]
}

/// A mix of DML, DDL and transaction operations.
pub fn sample_operations() -> Vec<Operation> {
    vec![
        Operation::Select {
            table: "heroes".into(),
            options: SelectOptions::new()
                .with_attributes(["id", "name"])
                .with_where(Where::and([
                    Where::op("age", Op::Gt, Operand::value(18)),
                    Where::eq("name", "Spider-Man"),
                ]))
                .with_order(OrderItem::desc("age"))
                .with_limit(10)
                .with_offset(5),
        },
        Operation::Insert {
            table: "heroes".into(),
            values: row("Spider-Man", 25),
            options: InsertOptions::default(),
        },
        Operation::BulkInsert {
            table: "heroes".into(),
            rows: vec![row("Deadpond", 30), row("Rusty-Man", 48)],
            options: InsertOptions::default(),
        },
        Operation::Update {
            table: "heroes".into(),
            values: vec![("age".to_string(), Value::from(26_i64))],
            where_: Where::eq("id", 1),
            options: UpdateOptions::default(),
        },
        Operation::Arithmetic {
            op: ArithmeticOp::Add,
            table: "heroes".into(),
            where_: Where::eq("id", 1),
            amounts: vec![("age".to_string(), Value::from(1_i64))],
            extra: Vec::new(),
            options: UpdateOptions::default(),
        },
        Operation::Delete {
            table: "heroes".into(),
            where_: Where::eq("name", "Deadpond"),
            options: DeleteOptions::default(),
        },
        Operation::Truncate {
            table: "heroes".into(),
            options: TruncateOptions::default(),
        },
        Operation::CreateTable {
            table: "heroes".into(),
            attributes: Vec::new(),
            options: CreateTableOptions::new(),
        },
        Operation::AddIndex {
            table: "heroes".into(),
            options: IndexOptions::new(["name", "age"]).unique(),
        },
        Operation::DropTable {
            table: "heroes".into(),
            options: DropTableOptions::default(),
        },
        Operation::StartTransaction(StartTransactionOptions::default()),
        Operation::CreateSavepoint("before_update".to_string()),
        Operation::SetIsolationLevel(IsolationLevel::ReadCommitted),
        Operation::CommitTransaction,
    ]
}

/// Generate every operation, keeping errors as their messages so results
/// can be compared.
pub fn render(generator: &Generator, operations: &[Operation]) -> Vec<Result<Vec<Statement>, String>> {
    let model = heroes();
    operations
        .iter()
        .map(|op| generator.generate(op, Some(&model)).map_err(|e| e.to_string()))
        .collect()
}
