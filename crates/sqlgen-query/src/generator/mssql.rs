//! SQL Server statement syntax.

use sqlgen_core::{
    DialectKind, Error, ModelDefinition, Result, TableRef, ValidationErrorKind, Value,
};

use super::{json_path, QueryGenerator, QueryGeneratorOps};
use crate::bind::Statement;
use crate::expr::JsonSegment;
use crate::options::{InsertOptions, TruncateOptions};

#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlOps;

impl QueryGeneratorOps for MssqlOps {
    fn kind(&self) -> DialectKind {
        DialectKind::Mssql
    }

    /// `OFFSET ... FETCH` pagination. The caller guarantees an ORDER BY.
    fn limit_fragment(
        &self,
        generator: &QueryGenerator,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<String> {
        if limit == Some(0) {
            return Err(Error::validation(
                ValidationErrorKind::Invalid,
                format!("LIMIT 0 is not supported by {}", generator.dialect_name()),
            ));
        }
        if limit.is_none() && offset.is_none() {
            return Ok(String::new());
        }
        let mut out = format!(" OFFSET {} ROWS", offset.unwrap_or(0));
        if let Some(limit) = limit {
            out.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
        }
        Ok(out)
    }

    fn fallback_order(&self) -> Option<&'static str> {
        Some("(SELECT NULL)")
    }

    fn json_path_extraction(
        &self,
        generator: &QueryGenerator,
        sql: &str,
        path: &[JsonSegment],
        unquote: bool,
    ) -> Result<String> {
        if !unquote {
            return Err(Error::unsupported(
                generator.dialect_name(),
                "jsonExtraction.quoted",
                format!(
                    "JSON Paths are not supported in {} without unquoting the JSON value.",
                    generator.dialect_name()
                ),
            ));
        }
        Ok(format!(
            "JSON_VALUE({sql}, {})",
            generator.escaper().string(&json_path(path))
        ))
    }

    fn unquote_json(&self, _gen: &QueryGenerator, sql: &str) -> Result<String> {
        Ok(format!("JSON_VALUE({sql})"))
    }

    fn unix_timestamp(&self, _gen: &QueryGenerator, sql: &str) -> Result<String> {
        Ok(format!("DATEDIFF(s, '1970-01-01', {sql})"))
    }

    fn truncate_table(
        &self,
        _gen: &QueryGenerator,
        table: &str,
        _options: &TruncateOptions,
    ) -> Result<Vec<String>> {
        Ok(vec![format!("TRUNCATE TABLE {table}")])
    }

    fn delete_statement(&self, table: &str, where_sql: &str, limit: Option<u64>) -> String {
        let mut sql = String::from("DELETE");
        if let Some(limit) = limit {
            sql.push_str(&format!(" TOP({limit})"));
        }
        sql.push_str(" FROM ");
        sql.push_str(table);
        if !where_sql.is_empty() {
            sql.push(' ');
            sql.push_str(where_sql);
        }
        sql.push_str("; SELECT @@ROWCOUNT AS AFFECTEDROWS;");
        sql
    }

    fn create_savepoint(&self, generator: &QueryGenerator, name: &str) -> Result<String> {
        generator.require_savepoints()?;
        Ok(format!("SAVE TRANSACTION {}", generator.quote_identifier(name)))
    }

    fn rollback_savepoint(&self, generator: &QueryGenerator, name: &str) -> Result<String> {
        generator.require_savepoints()?;
        Ok(format!("ROLLBACK TRANSACTION {}", generator.quote_identifier(name)))
    }

    /// Upserts become a `MERGE` joined on the conflict keys.
    fn upsert(
        &self,
        generator: &QueryGenerator,
        table: &TableRef,
        insert_values: &[(String, Value)],
        update_values: &[(String, Value)],
        model: Option<&ModelDefinition>,
        options: &InsertOptions,
    ) -> Result<Statement> {
        let table_sql = generator.quote_table_name(table);
        let target = generator.quote_alias(&format!("{}_target", table.table_name));
        let source = generator.quote_alias(&format!("{}_source", table.table_name));

        let identity_columns: Vec<&str> = model
            .map(|m| {
                m.attributes
                    .iter()
                    .filter(|a| a.auto_increment)
                    .map(|a| a.column_name.as_str())
                    .collect()
            })
            .unwrap_or_default();

        let keys: Vec<String> = if options.upsert_keys.is_empty() {
            model
                .map(|m| {
                    m.primary_key_attributes()
                        .map(|a| a.column_name.clone())
                        .collect()
                })
                .unwrap_or_default()
        } else {
            options
                .upsert_keys
                .iter()
                .map(|k| model.map_or(k.as_str(), |m| m.column_for(k)).to_string())
                .collect()
        };
        let keys: Vec<String> = keys
            .into_iter()
            .filter(|k| {
                insert_values
                    .iter()
                    .any(|(column, value)| column == k && !value.is_null())
            })
            .collect();
        if keys.is_empty() {
            return Err(Error::validation(
                ValidationErrorKind::MissingColumns,
                "Primary Key or Unique key should be passed to upsert query",
            ));
        }

        let escape = |column: &str, value: &Value| {
            let data_type = model
                .and_then(|m| m.by_column(column))
                .map(|a| &a.data_type);
            generator.escaper().value(value, data_type)
        };

        let columns: Vec<String> = insert_values
            .iter()
            .map(|(column, _)| generator.quote_identifier(column))
            .collect();
        let columns = columns.join(", ");
        let values = insert_values
            .iter()
            .map(|(column, value)| escape(column, value))
            .collect::<Result<Vec<_>>>()?
            .join(", ");

        let join_condition = keys
            .iter()
            .map(|k| {
                let k = generator.quote_identifier(k);
                format!("{target}.{k} = {source}.{k}")
            })
            .collect::<Vec<_>>()
            .join(" AND ");

        let updates = update_values
            .iter()
            .filter(|(column, _)| !identity_columns.contains(&column.as_str()))
            .map(|(column, value)| {
                Ok(format!(
                    "{target}.{} = {}",
                    generator.quote_identifier(column),
                    escape(column, value)?
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut sql = format!(
            "MERGE INTO {table_sql} WITH(HOLDLOCK) AS {target} USING (VALUES({values})) AS {source}({columns}) ON {join_condition}"
        );
        if !updates.is_empty() {
            sql.push_str(" WHEN MATCHED THEN UPDATE SET ");
            sql.push_str(&updates.join(", "));
        }
        sql.push_str(&format!(
            " WHEN NOT MATCHED THEN INSERT ({columns}) VALUES({values}) OUTPUT $action, INSERTED.*;"
        ));

        let identity_insert = insert_values.iter().any(|(column, value)| {
            identity_columns.contains(&column.as_str()) && !value.is_null()
        });
        if identity_insert {
            sql = format!(
                "SET IDENTITY_INSERT {table_sql} ON; {sql} SET IDENTITY_INSERT {table_sql} OFF;"
            );
        }
        Ok(Statement::new(sql))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlgen_core::{Attribute, DataType};

    fn generator() -> QueryGenerator {
        QueryGenerator::for_kind(DialectKind::Mssql).unwrap()
    }

    fn user() -> ModelDefinition {
        ModelDefinition::new("User", "users")
            .attribute(Attribute::primary_key("id").auto_increment())
            .attribute(Attribute::new("name", DataType::string()))
    }

    #[test]
    fn test_offset_fetch() {
        let generator = generator();
        assert_eq!(
            MssqlOps.limit_fragment(&generator, Some(10), None).unwrap(),
            " OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        assert_eq!(
            MssqlOps.limit_fragment(&generator, Some(10), Some(5)).unwrap(),
            " OFFSET 5 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        assert_eq!(MssqlOps.limit_fragment(&generator, None, Some(5)).unwrap(), " OFFSET 5 ROWS");
        assert!(MssqlOps.limit_fragment(&generator, Some(0), None).is_err());
    }

    #[test]
    fn test_json_requires_unquote() {
        let generator = generator();
        let path = [JsonSegment::Key("name".into())];
        assert_eq!(
            MssqlOps.json_path_extraction(&generator, "[data]", &path, true).unwrap(),
            "JSON_VALUE([data], N'$.name')"
        );
        let err = MssqlOps.json_path_extraction(&generator, "[data]", &path, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "JSON Paths are not supported in mssql without unquoting the JSON value."
        );
    }

    #[test]
    fn test_delete_top() {
        assert_eq!(
            MssqlOps.delete_statement("[users]", "WHERE [id] = 1", Some(1)),
            "DELETE TOP(1) FROM [users] WHERE [id] = 1; SELECT @@ROWCOUNT AS AFFECTEDROWS;"
        );
    }

    #[test]
    fn test_merge_upsert() {
        let generator = generator();
        let model = user();
        let insert = vec![
            ("id".to_string(), Value::Int(1)),
            ("name".to_string(), Value::from("Ada")),
        ];
        let update = vec![("name".to_string(), Value::from("Ada"))];
        let statement = MssqlOps
            .upsert(&generator, &"users".into(), &insert, &update, Some(&model), &InsertOptions::default())
            .unwrap();
        assert_eq!(
            statement.sql,
            "SET IDENTITY_INSERT [users] ON; MERGE INTO [users] WITH(HOLDLOCK) AS [users_target] \
             USING (VALUES(1, N'Ada')) AS [users_source]([id], [name]) \
             ON [users_target].[id] = [users_source].[id] \
             WHEN MATCHED THEN UPDATE SET [users_target].[name] = N'Ada' \
             WHEN NOT MATCHED THEN INSERT ([id], [name]) VALUES(1, N'Ada') \
             OUTPUT $action, INSERTED.*; SET IDENTITY_INSERT [users] OFF;"
        );
    }

    #[test]
    fn test_merge_requires_keys() {
        let generator = generator();
        let insert = vec![("name".to_string(), Value::from("Ada"))];
        let err = MssqlOps
            .upsert(&generator, &"users".into(), &insert, &insert, Some(&user()), &InsertOptions::default())
            .unwrap_err();
        assert!(err.is_validation());
    }
}
