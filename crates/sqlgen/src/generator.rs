//! The single entry point over the query and schema generators.

use sqlgen_core::{Dialect, DialectKind, GeneratorOptions, ModelDefinition, Result};
use sqlgen_query::{QueryGenerator, Statement};
use sqlgen_schema::SchemaGenerator;

use crate::operation::Operation;

/// Generates SQL for any [`Operation`] in one dialect.
///
/// The generator is immutable once built; share it by reference (or clone
/// it) across threads.
#[derive(Debug, Clone)]
pub struct Generator {
    schema: SchemaGenerator,
}

impl Generator {
    pub fn new(dialect: Dialect, options: GeneratorOptions) -> Result<Self> {
        Ok(Self {
            schema: SchemaGenerator::new(dialect, options)?,
        })
    }

    /// A generator with the built-in capabilities and default options.
    pub fn for_kind(kind: DialectKind) -> Result<Self> {
        Ok(Self {
            schema: SchemaGenerator::for_kind(kind)?,
        })
    }

    pub fn kind(&self) -> DialectKind {
        self.schema.kind()
    }

    pub fn dialect_name(&self) -> &'static str {
        self.schema.dialect_name()
    }

    /// The DML generator.
    pub fn query(&self) -> &QueryGenerator {
        self.schema.query()
    }

    /// The DDL generator.
    pub fn schema(&self) -> &SchemaGenerator {
        &self.schema
    }

    /// Generate the statements for one operation.
    ///
    /// Most operations produce exactly one statement; `TRUNCATE` on
    /// dialects that reset sequences separately produces more. DDL and
    /// transaction statements never carry bind parameters.
    pub fn generate(
        &self,
        operation: &Operation,
        model: Option<&ModelDefinition>,
    ) -> Result<Vec<Statement>> {
        tracing::debug!(
            dialect = %self.dialect_name(),
            operation = operation.name(),
            model = model.map(|m| m.name.as_str()),
            "generating operation"
        );
        let query = self.query();
        let schema = &self.schema;

        let statement = match operation {
            Operation::Select { table, options } => query.select_query(table, options, model)?,
            Operation::Insert {
                table,
                values,
                options,
            } => query.insert_query(table, values, model, options)?,
            Operation::BulkInsert {
                table,
                rows,
                options,
            } => query.bulk_insert_query(table, rows, model, options)?,
            Operation::Upsert {
                table,
                insert_values,
                update_values,
                options,
            } => query.upsert_query(table, insert_values, update_values, model, options)?,
            Operation::Update {
                table,
                values,
                where_,
                options,
            } => query.update_query(table, values, where_, model, options)?,
            Operation::Arithmetic {
                op,
                table,
                where_,
                amounts,
                extra,
                options,
            } => query.arithmetic_query(*op, table, where_, amounts, extra, model, options)?,
            Operation::Delete {
                table,
                where_,
                options,
            } => query.delete_query(table, where_, model, options)?,
            Operation::Truncate { table, options } => {
                return Ok(query
                    .truncate_table_query(table, options)?
                    .into_iter()
                    .map(Statement::new)
                    .collect());
            }

            Operation::AddIndex { table, options } => {
                Statement::new(schema.add_index_query(table, options)?)
            }
            Operation::RemoveIndex {
                table,
                target,
                options,
            } => Statement::new(schema.remove_index_query(table, target, options)?),
            Operation::AddConstraint { table, options } => {
                Statement::new(schema.add_constraint_query(table, options)?)
            }
            Operation::RemoveConstraint {
                table,
                name,
                options,
            } => Statement::new(schema.remove_constraint_query(table, name, options)?),
            Operation::SetConstraintChecking(checking) => {
                Statement::new(schema.set_constraint_checking_query(checking)?)
            }
            Operation::CreateTable {
                table,
                attributes,
                options,
            } => {
                let sql = match model {
                    Some(model) if attributes.is_empty() => {
                        schema.create_table_query(table, &model.attributes, options)?
                    }
                    _ => schema.create_table_query(table, attributes, options)?,
                };
                Statement::new(sql)
            }
            Operation::DropTable { table, options } => {
                Statement::new(schema.drop_table_query(table, options)?)
            }
            Operation::RenameTable {
                before,
                after,
                options,
            } => Statement::new(schema.rename_table_query(before, after, options)?),
            Operation::AddColumn {
                table,
                attribute,
                options,
            } => Statement::new(schema.add_column_query(table, attribute, options)?),
            Operation::RemoveColumn {
                table,
                column,
                options,
            } => Statement::new(schema.remove_column_query(table, column, options)?),
            Operation::ChangeColumn {
                table,
                column,
                change,
            } => Statement::new(schema.change_column_query(table, column, change)?),
            Operation::RenameColumn {
                table,
                before,
                after,
            } => Statement::new(schema.rename_column_query(table, before, after)?),
            Operation::CreateSchema { name, options } => {
                Statement::new(schema.create_schema_query(name, options)?)
            }
            Operation::DropSchema { name, options } => {
                Statement::new(schema.drop_schema_query(name, options)?)
            }

            Operation::StartTransaction(options) => {
                Statement::new(query.start_transaction_query(options)?)
            }
            Operation::CommitTransaction => Statement::new(query.commit_transaction_query()?),
            Operation::RollbackTransaction => Statement::new(query.rollback_transaction_query()?),
            Operation::CreateSavepoint(name) => Statement::new(query.create_savepoint_query(name)?),
            Operation::RollbackSavepoint(name) => {
                Statement::new(query.rollback_savepoint_query(name)?)
            }
            Operation::SetIsolationLevel(level) => {
                Statement::new(query.set_isolation_level_query(*level)?)
            }
        };
        Ok(vec![statement])
    }

    /// Generate an operation and keep only the SQL text.
    pub fn generate_sql(
        &self,
        operation: &Operation,
        model: Option<&ModelDefinition>,
    ) -> Result<Vec<String>> {
        Ok(self
            .generate(operation, model)?
            .into_iter()
            .map(|statement| statement.sql)
            .collect())
    }
}
