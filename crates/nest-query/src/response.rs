use nest_types::Row;
use serde::Serialize;

use crate::error::ApiError;

/// Result payload: one row for `single()` plans, otherwise a collection.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Data {
    Row(Row),
    Rows(Vec<Row>),
}

/// The `{ data, error }` pair every executed plan resolves to.
///
/// `error` is only ever set for expected failures (see [`ApiError`]); when it
/// is set, `data` is `None`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Response {
    pub data: Option<Data>,
    pub error: Option<ApiError>,
}

impl Response {
    pub fn row(row: Row) -> Self {
        Self {
            data: Some(Data::Row(row)),
            error: None,
        }
    }

    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            data: Some(Data::Rows(rows)),
            error: None,
        }
    }

    /// Success with no payload (deletes, single writes that touched nothing).
    pub fn empty() -> Self {
        Self {
            data: None,
            error: None,
        }
    }

    pub fn failed(error: ApiError) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Borrow the payload as a slice of rows, whatever its shape.
    pub fn as_rows(&self) -> &[Row] {
        match &self.data {
            Some(Data::Row(row)) => std::slice::from_ref(row),
            Some(Data::Rows(rows)) => rows,
            None => &[],
        }
    }

    /// The payload of a `single()` plan.
    pub fn as_row(&self) -> Option<&Row> {
        match &self.data {
            Some(Data::Row(row)) => Some(row),
            _ => None,
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self.data {
            Some(Data::Row(row)) => vec![row],
            Some(Data::Rows(rows)) => rows,
            None => Vec::new(),
        }
    }

    pub fn into_row(self) -> Option<Row> {
        match self.data {
            Some(Data::Row(row)) => Some(row),
            _ => None,
        }
    }

    /// Fold the pair into a `Result` for `?`-style callers.
    pub fn into_result(self) -> Result<Option<Data>, ApiError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }
}
