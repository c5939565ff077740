//! Table storage for the Nest mock backend.
//!
//! This crate owns every row the emulator holds. It is deliberately dumb: a
//! table is an ordered `Vec` of schemaless [`Row`](nest_types::Row)s, and the
//! store hands that `Vec` to whoever executes a query plan. All filtering,
//! ordering and write semantics live in `nest-query`.
//!
//! # Storage Backends
//!
//! - [`TableStore`] -- process-wide tables behind a single `RwLock`
//! - [`KeyValueStore`] -- the local, single-client snapshot seam, with
//!   [`InMemoryKeyValueStore`] and the file-backed [`FileKeyValueStore`]
//!
//! # Design Rules
//!
//! 1. Absent tables read as empty; a table exists only once a row is written.
//! 2. A write closure runs under the write lock, so one plan's effect is
//!    atomic with respect to every other plan.
//! 3. No schema, foreign-key or uniqueness enforcement.
//! 4. Lock poisoning and I/O failures are errors, never panics.

pub mod error;
pub mod kv;
pub mod table;

pub use error::{StoreError, StoreResult};
pub use kv::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore};
pub use table::{TableStore, TablesView};
