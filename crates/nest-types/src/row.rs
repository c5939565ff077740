use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Dynamic field value. Rows are schemaless, so every field is plain JSON.
pub type Value = serde_json::Value;

/// Ordered field map backing a [`Row`].
pub type Fields = serde_json::Map<String, Value>;

/// Unique identifier for a row (UUID v7 for time-ordering).
///
/// Only generated identifiers use this type. Callers may supply any JSON
/// value as `id`; the store never rewrites one it did not assign.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(uuid::Uuid);

impl RowId {
    /// Generate a new time-ordered row ID (UUID v7).
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowId({})", &self.0.to_string()[..8])
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RowId> for Value {
    fn from(id: RowId) -> Self {
        Value::String(id.to_string())
    }
}

/// A single schemaless record.
///
/// Field order is insertion order. The `id` and `created_at` fields are
/// ordinary fields; the store fills them in at insert time when absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Fields);

impl Row {
    /// Name of the identifier field.
    pub const ID: &'static str = "id";
    /// Name of the creation timestamp field.
    pub const CREATED_AT: &'static str = "created_at";

    /// Create an empty row.
    pub fn new() -> Self {
        Self(Fields::new())
    }

    pub fn from_fields(fields: Fields) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field, returning the previous value if there was one.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Builder-style [`Row::set`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// The `id` field, if present.
    pub fn id(&self) -> Option<&Value> {
        self.get(Self::ID)
    }

    /// The `id` field as a string slice, if it is a string.
    pub fn id_str(&self) -> Option<&str> {
        self.id().and_then(Value::as_str)
    }

    /// Look up a string field.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &Fields {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Shallow-merge `patch` into this row.
    ///
    /// Every field of `patch` overwrites the field of the same name. The
    /// `id` field is never overwritten: identifiers are immutable once
    /// assigned.
    pub fn merge(&mut self, patch: &Row) {
        for (field, value) in patch.iter() {
            if field == Self::ID && self.contains(Self::ID) {
                continue;
            }
            self.0.insert(field.clone(), value.clone());
        }
    }

    /// Copy of this row restricted to `columns`, in the order given.
    ///
    /// Columns the row does not carry are skipped rather than filled with null.
    pub fn project<S: AsRef<str>>(&self, columns: &[S]) -> Row {
        let mut out = Fields::new();
        for column in columns {
            let column = column.as_ref();
            if let Some(value) = self.0.get(column) {
                out.insert(column.to_string(), value.clone());
            }
        }
        Row(out)
    }

    pub fn into_fields(self) -> Fields {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Fields> for Row {
    fn from(fields: Fields) -> Self {
        Self(fields)
    }
}

impl From<Row> for Value {
    fn from(row: Row) -> Self {
        row.into_value()
    }
}

impl TryFrom<Value> for Row {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            Value::Null => Err(TypeError::NotAnObject("null")),
            Value::Bool(_) => Err(TypeError::NotAnObject("boolean")),
            Value::Number(_) => Err(TypeError::NotAnObject("number")),
            Value::String(_) => Err(TypeError::NotAnObject("string")),
            Value::Array(_) => Err(TypeError::NotAnObject("array")),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_macro_builds_fields_in_order() {
        let row = crate::row! { "b": 2, "a": "x", "nested": {"email": "a@b.c"} };
        let keys: Vec<&String> = row.fields().keys().collect();
        assert_eq!(keys, vec!["b", "a", "nested"]);
        assert_eq!(row.get("nested"), Some(&json!({"email": "a@b.c"})));
    }

    #[test]
    fn row_ids_are_unique() {
        let a = RowId::new();
        let b = RowId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn row_id_converts_to_string_value() {
        let id = RowId::new();
        let value: Value = id.into();
        assert_eq!(value.as_str(), Some(id.to_string().as_str()));
    }

    #[test]
    fn merge_overwrites_fields_but_not_id() {
        let mut row = crate::row! { "id": "r1", "status": "planning", "name": "Rome" };
        let patch = crate::row! { "id": "other", "status": "done", "extra": true };
        row.merge(&patch);
        assert_eq!(row.id_str(), Some("r1"));
        assert_eq!(row.str_field("status"), Some("done"));
        assert_eq!(row.str_field("name"), Some("Rome"));
        assert_eq!(row.get("extra"), Some(&json!(true)));
    }

    #[test]
    fn project_keeps_requested_columns_in_order() {
        let row = crate::row! { "id": "r1", "a": 1, "b": 2 };
        let projected = row.project(&["b", "id", "missing"]);
        let keys: Vec<&String> = projected.fields().keys().collect();
        assert_eq!(keys, vec!["b", "id"]);
    }

    #[test]
    fn try_from_rejects_non_objects() {
        assert_eq!(
            Row::try_from(json!([1, 2])).unwrap_err(),
            TypeError::NotAnObject("array")
        );
        assert!(Row::try_from(json!({"a": 1})).is_ok());
    }

    #[test]
    fn serde_is_transparent() {
        let row = crate::row! { "id": "r1", "cost": 12.5 };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"id":"r1","cost":12.5}"#);
        let parsed: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, row);
    }
}
