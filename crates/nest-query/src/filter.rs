//! Row predicates accumulated by the query builder.

use nest_types::{Row, Value};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// A predicate narrowing which rows a read or write touches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Filter {
    /// `row[field] == value`.
    Eq { field: String, value: Value },
    /// `row[field]` is one of `values`. An empty list matches nothing.
    In { field: String, values: Vec<Value> },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Eq { field, .. } | Self::In { field, .. } => field,
        }
    }

    /// A row missing `field` matches no filter, not even `eq(field, null)`.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(actual) = row.get(self.field()) else {
            return false;
        };
        match self {
            Self::Eq { value, .. } => values_equal(actual, value),
            Self::In { values, .. } => values.iter().any(|v| values_equal(actual, v)),
        }
    }
}

/// Logical AND over `filters`; an empty list matches every row.
pub fn matches_all(filters: &[Filter], row: &Row) -> bool {
    filters.iter().all(|f| f.matches(row))
}

/// Equality with numbers compared by value, so `1` equals `1.0`.
///
/// Two integers compare exactly; `f64` is used only when either side is a
/// float.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (integer_value(x), integer_value(y)) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

/// `n` widened to `i128` when it is an integer of either sign.
pub(crate) fn integer_value(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}
