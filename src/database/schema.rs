// Schema collaborator: derives column metadata from model values

use serde_json::{Map, Value};

use crate::error::DbError;

pub const PRIMARY_KEY: &str = "id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const DELETED_AT: &str = "deleted_at";

/// Column metadata discovered from a model value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    /// Column names, sorted
    pub fields: Vec<String>,
    pub primary_key: Option<String>,
}

impl Schema {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.binary_search_by(|f| f.as_str().cmp(name)).is_ok()
    }

    pub fn has_created_at(&self) -> bool {
        self.has_field(CREATED_AT)
    }

    pub fn has_updated_at(&self) -> bool {
        self.has_field(UPDATED_AT)
    }

    /// Models carrying `deleted_at` are soft-deleted and scoped out of queries
    pub fn soft_delete(&self) -> bool {
        self.has_field(DELETED_AT)
    }
}

pub trait SchemaParser: Send + Sync {
    fn parse(&self, model: &Value) -> Result<Schema, DbError>;
}

/// Parses JSON objects (or arrays of objects) into a schema
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaParser;

impl JsonSchemaParser {
    fn collect_fields(map: &Map<String, Value>, fields: &mut Vec<String>) -> Result<(), DbError> {
        for key in map.keys() {
            validate_column(key)?;
            fields.push(key.clone());
        }
        Ok(())
    }
}

impl SchemaParser for JsonSchemaParser {
    fn parse(&self, model: &Value) -> Result<Schema, DbError> {
        let mut fields = Vec::new();

        match model {
            Value::Object(map) => Self::collect_fields(map, &mut fields)?,
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::Object(map) => Self::collect_fields(map, &mut fields)?,
                        other => {
                            return Err(DbError::Schema(format!(
                                "list models must hold objects, found {}",
                                type_name(other)
                            )))
                        }
                    }
                }
            }
            other => return Err(DbError::UnsupportedDataType(type_name(other).to_string())),
        }

        fields.sort();
        fields.dedup();
        let primary_key = fields
            .iter()
            .any(|f| f == PRIMARY_KEY)
            .then(|| PRIMARY_KEY.to_string());

        Ok(Schema { fields, primary_key })
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

pub fn validate_table(name: &str) -> Result<(), DbError> {
    if name.is_empty() {
        return Err(DbError::InvalidTableName("Table name cannot be empty".to_string()));
    }
    if !is_identifier(name) {
        return Err(DbError::InvalidTableName(format!("Invalid table name format: {}", name)));
    }
    Ok(())
}

pub fn validate_column(name: &str) -> Result<(), DbError> {
    if name.is_empty() {
        return Err(DbError::InvalidColumn("Column name cannot be empty".to_string()));
    }
    if !is_identifier(name) {
        return Err(DbError::InvalidColumn(format!("Invalid column name format: {}", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_fields_are_sorted() {
        let schema = JsonSchemaParser
            .parse(&json!({"name": "Alice", "id": 1, "deleted_at": null}))
            .unwrap();
        assert_eq!(schema.fields, vec!["deleted_at", "id", "name"]);
        assert_eq!(schema.primary_key.as_deref(), Some("id"));
        assert!(schema.soft_delete());
        assert!(!schema.has_created_at());
    }

    #[test]
    fn list_fields_are_merged() {
        let schema = JsonSchemaParser
            .parse(&json!([{"a": 1}, {"b": 2, "a": 3}]))
            .unwrap();
        assert_eq!(schema.fields, vec!["a", "b"]);
        assert!(schema.primary_key.is_none());
    }

    #[test]
    fn scalars_are_unsupported() {
        for value in [json!(1), json!("x"), json!(true), Value::Null] {
            let err = JsonSchemaParser.parse(&value).unwrap_err();
            assert!(err.is_unsupported_data_type(), "{value}: {err}");
        }
    }

    #[test]
    fn mixed_lists_are_schema_errors() {
        let err = JsonSchemaParser.parse(&json!([{"a": 1}, 2])).unwrap_err();
        assert!(matches!(err, DbError::Schema(_)));
    }

    #[test]
    fn rejects_bad_identifiers() {
        let err = JsonSchemaParser.parse(&json!({"bad name": 1})).unwrap_err();
        assert!(matches!(err, DbError::InvalidColumn(_)));
        assert!(validate_table("users_2").is_ok());
        assert!(validate_table("2users").is_err());
        assert!(validate_table("users; DROP").is_err());
        assert!(validate_table("").is_err());
    }
}
