use nest_types::Row;
use serde::Serialize;

use crate::filter::Filter;
use crate::order::OrderBy;
use crate::relation::Relation;
use crate::select::Selection;

/// Rows handed to `insert`: one row or several.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct InsertRows(pub Vec<Row>);

impl From<Row> for InsertRows {
    fn from(row: Row) -> Self {
        Self(vec![row])
    }
}

impl From<Vec<Row>> for InsertRows {
    fn from(rows: Vec<Row>) -> Self {
        Self(rows)
    }
}

impl<const N: usize> From<[Row; N]> for InsertRows {
    fn from(rows: [Row; N]) -> Self {
        Self(rows.into())
    }
}

/// Pending write. At most one per plan; a later write call replaces an
/// earlier one.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Write {
    /// Unconditional append; filters are ignored.
    Insert(Vec<Row>),
    /// Shallow merge into every row the filters match.
    Update(Row),
    /// Remove every row the filters match.
    Delete,
}

/// A relation embedded under `field`, resolved and ready to execute.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Embed {
    pub field: String,
    pub relation: Relation,
    pub columns: Option<Vec<String>>,
}

/// Everything a builder has accumulated, consumed exactly once on execution.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryPlan {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
    pub single: bool,
    pub selection: Selection,
    /// Relations attached explicitly with `embed`.
    pub embeds: Vec<Embed>,
    pub write: Option<Write>,
}

impl QueryPlan {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order_by: Vec::new(),
            single: false,
            selection: Selection::all(),
            embeds: Vec::new(),
            write: None,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self.write {
            Some(Write::Insert(_)) => "insert",
            Some(Write::Update(_)) => "update",
            Some(Write::Delete) => "delete",
            None => "select",
        }
    }
}
