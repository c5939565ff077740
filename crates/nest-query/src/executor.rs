//! Synchronous plan execution against a [`TableStore`].
//!
//! Each entry point takes the store lock once and runs to completion, so a
//! plan's reads and writes are atomic with respect to every other plan.

use nest_store::{TableStore, TablesView};
use nest_types::{Row, RowId, Timestamp, Value};
use tracing::debug;

use crate::error::{ApiError, QueryResult};
use crate::filter::matches_all;
use crate::order::sort_rows;
use crate::plan::{Embed, QueryPlan, Write};
use crate::relation::RelationRegistry;
use crate::response::Response;

/// Execute `plan`, writes first: a pending write short-circuits the read path.
pub fn execute_plan(
    plan: QueryPlan,
    store: &TableStore,
    relations: &RelationRegistry,
) -> QueryResult<Response> {
    let kind = plan.kind();
    let response = match plan.write.clone() {
        Some(Write::Insert(rows)) => run_insert(&plan, rows, store)?,
        Some(Write::Update(patch)) => run_update(&plan, &patch, store)?,
        Some(Write::Delete) => run_delete(&plan, store)?,
        None => run_select(&plan, store, relations)?,
    };
    debug!(
        table = %plan.table,
        op = kind,
        rows = response.as_rows().len(),
        ok = response.is_ok(),
        "query executed"
    );
    Ok(response)
}

fn run_insert(plan: &QueryPlan, rows: Vec<Row>, store: &TableStore) -> QueryResult<Response> {
    let created_at = Timestamp::now();
    let created: Vec<Row> = rows
        .into_iter()
        .map(|mut row| {
            if is_blank(row.id()) {
                row.set(Row::ID, RowId::new());
            }
            if is_blank(row.get(Row::CREATED_AT)) {
                row.set(Row::CREATED_AT, created_at);
            }
            row
        })
        .collect();

    store.write_table(&plan.table, |table| table.extend(created.iter().cloned()))?;

    if plan.single {
        Ok(created
            .into_iter()
            .next()
            .map(Response::row)
            .unwrap_or_else(Response::empty))
    } else {
        Ok(Response::rows(created))
    }
}

fn run_update(plan: &QueryPlan, patch: &Row, store: &TableStore) -> QueryResult<Response> {
    let updated = store.write_table(&plan.table, |table| {
        let mut updated = Vec::new();
        for row in table.iter_mut().filter(|row| matches_all(&plan.filters, row)) {
            row.merge(patch);
            updated.push(row.clone());
        }
        updated
    })?;

    if plan.single {
        Ok(updated
            .into_iter()
            .next()
            .map(Response::row)
            .unwrap_or_else(Response::empty))
    } else {
        Ok(Response::rows(updated))
    }
}

fn run_delete(plan: &QueryPlan, store: &TableStore) -> QueryResult<Response> {
    store.write_table(&plan.table, |table| {
        let doomed: Vec<Value> = table
            .iter()
            .filter(|row| matches_all(&plan.filters, row))
            .filter_map(|row| row.id().cloned())
            .collect();
        table.retain(|row| {
            let hit = matches_all(&plan.filters, row);
            let same_id = row.id().is_some_and(|id| doomed.contains(id));
            !(hit || same_id)
        });
    })?;
    Ok(Response::empty())
}

fn run_select(
    plan: &QueryPlan,
    store: &TableStore,
    relations: &RelationRegistry,
) -> QueryResult<Response> {
    let (columns, embeds) = resolve_shape(plan, relations);

    let rows = store.read(|view| {
        let mut rows: Vec<Row> = view
            .table(&plan.table)
            .iter()
            .filter(|row| matches_all(&plan.filters, row))
            .cloned()
            .collect();
        sort_rows(&mut rows, &plan.order_by);
        if plan.single {
            rows.truncate(1);
        }
        rows.into_iter()
            .map(|row| shape_row(row, columns.as_deref(), &embeds, view))
            .collect::<Vec<Row>>()
    })?;

    if plan.single {
        return Ok(match rows.into_iter().next() {
            Some(row) => Response::row(row),
            None => Response::failed(ApiError::not_found(&plan.table)),
        });
    }
    Ok(Response::rows(rows))
}

/// Work out the projected columns and the embeds to attach.
///
/// Bare selected names that match a registered relation are embeds, not
/// columns.
fn resolve_shape(plan: &QueryPlan, relations: &RelationRegistry) -> (Option<Vec<String>>, Vec<Embed>) {
    let mut columns = plan.selection.columns.clone();
    let mut embeds = Vec::new();

    for name in plan.selection.bare.iter().filter(|n| relations.contains(n)) {
        embeds.push(Embed {
            field: name.clone(),
            relation: relations.resolve(name),
            columns: None,
        });
        if let Some(cols) = columns.as_mut() {
            cols.retain(|c| c != name);
        }
    }
    if columns.as_ref().is_some_and(Vec::is_empty) {
        columns = None;
    }

    for request in &plan.selection.embeds {
        embeds.push(Embed {
            field: request.field.clone(),
            relation: relations.resolve(&request.relation),
            columns: request.columns.clone(),
        });
    }
    embeds.extend(plan.embeds.iter().cloned());
    (columns, embeds)
}

fn shape_row(row: Row, columns: Option<&[String]>, embeds: &[Embed], view: &TablesView<'_>) -> Row {
    // Foreign keys are read before projection may drop them.
    let embedded: Vec<(String, Value)> = embeds
        .iter()
        .map(|e| {
            let related = view.table(&e.relation.table);
            (e.field.clone(), e.relation.resolve(&row, related, e.columns.as_deref()))
        })
        .collect();

    let mut shaped = match columns {
        Some(cols) => row.project(cols),
        None => row,
    };
    for (field, value) in embedded {
        shaped.set(field, value);
    }
    shaped
}

/// `id` and `created_at` are (re)assigned when absent, null or empty.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}
