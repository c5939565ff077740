//! Chainable, deferred queries over the Nest table store.
//!
//! A [`QueryBuilder`] accumulates a [`QueryPlan`] and runs it once, when
//! [`QueryBuilder::execute`] is awaited. Execution resolves to one of two
//! channels:
//!
//! - `Ok(Response)` with `{ data, error }`, where `error` carries expected
//!   failures such as the single-row not-found [`ApiError`]
//! - `Err(QueryError)` for anything unexpected (a poisoned store lock)
//!
//! # Key Types
//!
//! - [`QueryBuilder`] — Chain `select`, filters, ordering and one write
//! - [`QueryContext`] — Store, relation registry and latency shared by builders
//! - [`Filter`] / [`OrderBy`] — Row predicates and sort keys
//! - [`Relation`] / [`RelationRegistry`] — Emulated embedded joins
//! - [`Response`] — The `{ data, error }` pair

pub mod builder;
pub mod error;
pub mod executor;
pub mod filter;
pub mod order;
pub mod plan;
pub mod relation;
pub mod response;
pub mod select;

pub use builder::{QueryBuilder, QueryContext};
pub use error::{ApiError, QueryError, QueryResult, NOT_FOUND_CODE};
pub use executor::execute_plan;
pub use filter::Filter;
pub use order::OrderBy;
pub use plan::{Embed, InsertRows, QueryPlan, Write};
pub use relation::{Relation, RelationKind, RelationRegistry};
pub use response::{Data, Response};
pub use select::{EmbedRequest, Selection};
