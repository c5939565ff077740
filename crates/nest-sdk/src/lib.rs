//! Mock backend client for the Nest trip planner.
//!
//! [`MockClient`] bundles the table store, the query builder, the auth
//! emulator and an object storage stand-in behind one handle. This is the
//! main entry point for applications running without a hosted backend.

pub mod client;
pub mod config;
pub mod error;
pub mod storage;

pub use client::{MockClient, DEMO_EMAIL, DEMO_USER_ID};
pub use config::ClientConfig;
pub use error::{SdkError, SdkResult};
pub use storage::{Bucket, StorageClient, UploadedObject};

// Re-export key types
pub use nest_auth::{AuthEmulator, Subscription};
pub use nest_query::{ApiError, Data, QueryBuilder, QueryError, Relation, Response};
pub use nest_types::{row, tables, AuthEvent, Row, Session, User, Value};
