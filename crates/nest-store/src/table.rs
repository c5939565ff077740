use std::collections::HashMap;
use std::sync::RwLock;

use nest_types::Row;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Read-only view over every table, valid while the read lock is held.
pub struct TablesView<'a> {
    tables: &'a HashMap<String, Vec<Row>>,
}

impl<'a> TablesView<'a> {
    /// Rows of `name` in insertion order, or an empty slice for a table that
    /// has never been written to.
    pub fn table(&self, name: &str) -> &'a [Row] {
        self.tables.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}

/// Process-wide mapping from table name to an ordered sequence of rows.
///
/// The store exposes no row-level mutation API of its own. Executors borrow
/// a table's `Vec` through [`TableStore::write_table`] and append, merge or
/// remove rows directly while the write lock is held.
pub struct TableStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl TableStore {
    /// Create a store with no tables.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Snapshot of a table's rows (get-or-default: never creates the table).
    pub fn get_table(&self, name: &str) -> StoreResult<Vec<Row>> {
        self.read(|view| view.table(name).to_vec())
    }

    /// Run `f` against a consistent view of every table.
    pub fn read<R>(&self, f: impl FnOnce(&TablesView<'_>) -> R) -> StoreResult<R> {
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(f(&TablesView { tables: &tables }))
    }

    /// Run `f` with exclusive access to the rows of `name`.
    ///
    /// An absent table is handed over as an empty `Vec`; it is kept only if
    /// `f` leaves at least one row in it.
    pub fn write_table<R>(&self, name: &str, f: impl FnOnce(&mut Vec<Row>) -> R) -> StoreResult<R> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        if let Some(rows) = tables.get_mut(name) {
            return Ok(f(rows));
        }

        let mut rows = Vec::new();
        let out = f(&mut rows);
        if !rows.is_empty() {
            debug!(table = name, rows = rows.len(), "table created");
            tables.insert(name.to_string(), rows);
        }
        Ok(out)
    }

    /// Whether `name` has ever been written to.
    pub fn has_table(&self, name: &str) -> StoreResult<bool> {
        self.read(|view| view.has_table(name))
    }

    /// Sorted list of existing table names.
    pub fn table_names(&self) -> StoreResult<Vec<String>> {
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Number of rows in `name` (zero for an absent table).
    pub fn row_count(&self, name: &str) -> StoreResult<usize> {
        self.read(|view| view.table(name).len())
    }

    /// Drop every table.
    pub fn clear(&self) -> StoreResult<()> {
        self.tables
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?
            .clear();
        Ok(())
    }
}

impl Default for TableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self.table_names().unwrap_or_default();
        f.debug_struct("TableStore").field("tables", &names).finish()
    }
}
