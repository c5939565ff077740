//! Declared relations used to emulate embedded joins.
//!
//! A relation says how to find the rows of another table that belong to a
//! result row. Lookups never fail: a to-one relation with no match yields its
//! placeholder, a to-many relation with no match yields an empty array.

use std::collections::HashMap;

use nest_types::{Row, Value};
use serde::{Deserialize, Serialize};

use crate::filter::values_equal;

/// Direction of the foreign key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    /// This row carries `foreign_key`; it names the `id` of one related row.
    BelongsTo,
    /// Related rows carry `foreign_key`; it names this row's `id`.
    HasMany,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// Name used in `select` and as the default output field.
    pub name: String,
    /// Table holding the related rows.
    pub table: String,
    pub foreign_key: String,
    pub kind: RelationKind,
    /// Embedded when a to-one lookup finds nothing.
    pub placeholder: Value,
}

impl Relation {
    /// To-one relation: `self[foreign_key] == table.id`.
    pub fn belongs_to(
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            foreign_key: foreign_key.into(),
            kind: RelationKind::BelongsTo,
            placeholder: Value::Null,
        }
    }

    /// To-many relation: `table[foreign_key] == self.id`.
    pub fn has_many(
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            foreign_key: foreign_key.into(),
            kind: RelationKind::HasMany,
            placeholder: Value::Array(Vec::new()),
        }
    }

    /// To-one relation by naming convention: `<table>_id` references `table`.
    pub fn by_convention(table: impl Into<String>) -> Self {
        let table = table.into();
        let foreign_key = format!("{table}_id");
        Self::belongs_to(table.clone(), table, foreign_key)
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<Value>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// The value embedded for `row`, looked up in `related` (the rows of
    /// [`Relation::table`]).
    ///
    /// Embedded rows are projected to `columns` when given; the placeholder
    /// is returned as-is.
    pub fn resolve(&self, row: &Row, related: &[Row], columns: Option<&[String]>) -> Value {
        let shape = |r: &Row| match columns {
            Some(cols) => r.project(cols).into_value(),
            None => r.clone().into_value(),
        };
        match self.kind {
            RelationKind::BelongsTo => {
                let Some(key) = row.get(&self.foreign_key) else {
                    return self.placeholder.clone();
                };
                related
                    .iter()
                    .find(|r| r.id().is_some_and(|id| values_equal(id, key)))
                    .map(shape)
                    .unwrap_or_else(|| self.placeholder.clone())
            }
            RelationKind::HasMany => {
                let Some(id) = row.id() else {
                    return self.placeholder.clone();
                };
                let matches: Vec<Value> = related
                    .iter()
                    .filter(|r| r.get(&self.foreign_key).is_some_and(|fk| values_equal(fk, id)))
                    .map(shape)
                    .collect();
                Value::Array(matches)
            }
        }
    }
}

/// Relations known to a client, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct RelationRegistry {
    relations: HashMap<String, Relation>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `relation`, replacing any relation of the same name.
    pub fn register(&mut self, relation: Relation) -> Option<Relation> {
        self.relations.insert(relation.name.clone(), relation)
    }

    pub fn get(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// Registered relation, or the `<name>_id` convention when none is.
    pub fn resolve(&self, name: &str) -> Relation {
        self.get(name)
            .cloned()
            .unwrap_or_else(|| Relation::by_convention(name))
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
