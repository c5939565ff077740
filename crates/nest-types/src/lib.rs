//! Foundation types for the Nest mock backend.
//!
//! This crate provides the record, identity, and temporal types shared by the
//! table store, the query builder, and the auth emulator. Every other Nest
//! crate depends on `nest-types`.
//!
//! # Key Types
//!
//! - [`Row`] — Schemaless record: an ordered mapping from field name to JSON value
//! - [`RowId`] — UUID v7 identifier assigned to rows inserted without an `id`
//! - [`Timestamp`] — UTC instant rendered as an RFC 3339 string (`created_at`)
//! - [`User`] / [`Session`] — The signed-in identity held by the auth emulator
//! - [`AuthEvent`] — Identity change notification kind

pub mod error;
pub mod identity;
pub mod row;
pub mod temporal;

pub use error::TypeError;
pub use identity::{AuthEvent, Role, Session, User};
pub use row::{Fields, Row, RowId, Value};
pub use temporal::Timestamp;

/// Re-exported so the [`row!`] macro resolves `json!` from any crate.
pub use serde_json;

/// Well-known table names used by the trip planner.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const TRIPS: &str = "trips";
    pub const DAYS: &str = "days";
    pub const ACTIVITIES: &str = "activities";
    pub const TRIP_MEMBERS: &str = "trip_members";
    pub const ACTIVITY_COMMENTS: &str = "activity_comments";
}

/// Build a [`Row`] from `"field": value` pairs.
///
/// Each value is a single token tree handed to `serde_json::json!`, so
/// literals, arrays and nested objects work directly; wrap anything longer
/// (a negative number, a variable expression) in parentheses.
///
/// ```rust
/// use nest_types::row;
///
/// let trip = row! { "name": "Lisbon", "days": 4, "tags": ["food", "kids"] };
/// assert_eq!(trip.len(), 3);
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::Row::new()
    };
    ($($field:literal : $value:tt),+ $(,)?) => {{
        let mut row = $crate::Row::new();
        $( row.set($field, $crate::serde_json::json!($value)); )+
        row
    }};
}
