use std::sync::Arc;
use std::time::Duration;

use nest_store::TableStore;
use nest_types::{Row, Value};

use crate::error::QueryResult;
use crate::executor::execute_plan;
use crate::filter::Filter;
use crate::order::OrderBy;
use crate::plan::{Embed, InsertRows, QueryPlan, Write};
use crate::relation::{Relation, RelationRegistry};
use crate::response::Response;
use crate::select::Selection;

/// Shared state every builder of one client executes against.
#[derive(Clone, Debug)]
pub struct QueryContext {
    pub store: Arc<TableStore>,
    pub relations: Arc<RelationRegistry>,
    /// Simulated network delay before a plan runs.
    pub latency: Duration,
}

impl QueryContext {
    pub fn new(store: Arc<TableStore>) -> Self {
        Self {
            store,
            relations: Arc::new(RelationRegistry::new()),
            latency: Duration::ZERO,
        }
    }

    pub fn with_relations(mut self, relations: Arc<RelationRegistry>) -> Self {
        self.relations = relations;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

/// Chainable, deferred query against one table.
///
/// Chain methods only record intent; nothing touches the store until
/// [`execute`](QueryBuilder::execute) is awaited. `execute` takes the builder
/// by value, so a plan runs at most once.
///
/// ```rust,no_run
/// # async fn demo(ctx: nest_query::QueryContext) -> nest_query::QueryResult<()> {
/// use nest_query::QueryBuilder;
///
/// let response = QueryBuilder::new(ctx, "activities")
///     .select("*")
///     .filter_eq("day_id", "d1")
///     .order("start_time")
///     .execute()
///     .await?;
/// println!("{} activities", response.as_rows().len());
/// # Ok(())
/// # }
/// ```
#[must_use = "a query does nothing until `execute` is awaited"]
#[derive(Clone, Debug)]
pub struct QueryBuilder {
    ctx: QueryContext,
    plan: QueryPlan,
}

impl QueryBuilder {
    pub fn new(ctx: QueryContext, table: impl Into<String>) -> Self {
        Self {
            ctx,
            plan: QueryPlan::new(table),
        }
    }

    /// Shape results; see [`Selection`] for the accepted column list.
    pub fn select(mut self, columns: &str) -> Self {
        self.plan.selection = Selection::parse(columns);
        self
    }

    /// Embed `relation` under its own name.
    pub fn embed(mut self, relation: Relation) -> Self {
        self.plan.embeds.push(Embed {
            field: relation.name.clone(),
            relation,
            columns: None,
        });
        self
    }

    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.plan.filters.push(Filter::eq(field, value));
        self
    }

    pub fn filter_in<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.plan.filters.push(Filter::is_in(field, values));
        self
    }

    /// Add a sort key. The first key added is the primary one.
    pub fn order_by(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.plan.order_by.push(OrderBy {
            field: field.into(),
            ascending,
        });
        self
    }

    /// Ascending shorthand for [`order_by`](QueryBuilder::order_by).
    pub fn order(self, field: impl Into<String>) -> Self {
        self.order_by(field, true)
    }

    /// Expect exactly one row back.
    pub fn single(mut self) -> Self {
        self.plan.single = true;
        self
    }

    pub fn insert(mut self, rows: impl Into<InsertRows>) -> Self {
        self.plan.write = Some(Write::Insert(rows.into().0));
        self
    }

    pub fn update(mut self, patch: Row) -> Self {
        self.plan.write = Some(Write::Update(patch));
        self
    }

    pub fn delete(mut self) -> Self {
        self.plan.write = Some(Write::Delete);
        self
    }

    pub fn table(&self) -> &str {
        &self.plan.table
    }

    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    /// Run the plan after the configured latency.
    ///
    /// The delay is the only suspension point; the plan itself runs
    /// synchronously under the store lock.
    pub async fn execute(self) -> QueryResult<Response> {
        if !self.ctx.latency.is_zero() {
            tokio::time::sleep(self.ctx.latency).await;
        }
        execute_plan(self.plan, &self.ctx.store, &self.ctx.relations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nest_types::row;
    use std::time::Instant;

    fn ctx() -> QueryContext {
        QueryContext::new(Arc::new(TableStore::new()))
    }

    #[test]
    fn chaining_records_intent_without_touching_store() {
        let ctx = ctx();
        let builder = QueryBuilder::new(ctx.clone(), "trips")
            .insert(row! { "name": "Oslo" })
            .filter_eq("a", 1)
            .order_by("name", false)
            .single();
        assert_eq!(builder.plan().kind(), "insert");
        assert!(builder.plan().single);
        assert_eq!(builder.plan().order_by, vec![OrderBy::desc("name")]);
        assert!(!ctx.store.has_table("trips").unwrap());
    }

    #[test]
    fn later_write_replaces_earlier() {
        let builder = QueryBuilder::new(ctx(), "trips")
            .update(row! { "a": 1 })
            .delete();
        assert_eq!(builder.plan().write, Some(Write::Delete));
    }

    #[tokio::test]
    async fn dropped_builder_has_no_effect() {
        let ctx = ctx();
        let pending = QueryBuilder::new(ctx.clone(), "trips").insert(row! { "name": "Oslo" });
        drop(pending);
        assert_eq!(ctx.store.row_count("trips").unwrap(), 0);

        QueryBuilder::new(ctx.clone(), "trips")
            .insert(row! { "name": "Oslo" })
            .execute()
            .await
            .unwrap();
        assert_eq!(ctx.store.row_count("trips").unwrap(), 1);
    }

    #[tokio::test]
    async fn cloned_builder_executes_independently() {
        let ctx = ctx();
        let insert = QueryBuilder::new(ctx.clone(), "trips").insert(row! { "name": "Oslo" });
        insert.clone().execute().await.unwrap();
        insert.execute().await.unwrap();
        assert_eq!(ctx.store.row_count("trips").unwrap(), 2);
    }

    #[tokio::test]
    async fn execute_waits_for_latency() {
        let ctx = ctx().with_latency(Duration::from_millis(20));
        let started = Instant::now();
        QueryBuilder::new(ctx, "trips").execute().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn trip_planner_flow() {
        let ctx = ctx();
        let trip = QueryBuilder::new(ctx.clone(), "trips")
            .insert(row! { "name": "Kyoto", "owner_id": "u1" })
            .single()
            .execute()
            .await
            .unwrap()
            .into_row()
            .unwrap();
        let trip_id = trip.id().cloned().unwrap();

        QueryBuilder::new(ctx.clone(), "activities")
            .insert(vec![
                row! { "trip_id": (trip_id.clone()), "title": "Temple", "start_time": "11:00" },
                row! { "trip_id": (trip_id.clone()), "title": "Market", "start_time": "08:00" },
                row! { "trip_id": "other", "title": "Elsewhere", "start_time": "07:00" },
            ])
            .execute()
            .await
            .unwrap();

        let rows = QueryBuilder::new(ctx.clone(), "activities")
            .select("title")
            .filter_eq("trip_id", trip_id)
            .order("start_time")
            .execute()
            .await
            .unwrap()
            .into_rows();
        let titles: Vec<&str> = rows.iter().filter_map(|r| r.str_field("title")).collect();
        assert_eq!(titles, vec!["Market", "Temple"]);
        assert_eq!(rows[0].len(), 1);
    }

    #[tokio::test]
    async fn concurrent_inserts_all_land() {
        let ctx = ctx();
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    QueryBuilder::new(ctx, "activity_comments")
                        .insert(row! { "n": (i) })
                        .execute()
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(ctx.store.row_count("activity_comments").unwrap(), 16);
    }
}
