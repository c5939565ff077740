//! Column lists passed to `select`.
//!
//! The accepted grammar is the small subset the trip planner uses:
//!
//! ```text
//! selection := item ("," item)*
//! item      := "*" | column | [alias ":"] relation "(" selection? ")"
//! ```
//!
//! Column lists shape results; they never decide which rows match.

use serde::{Deserialize, Serialize};

/// A request to embed a related row under `field`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// Output field name (the alias, or the relation name).
    pub field: String,
    /// Registered relation to resolve at execution time.
    pub relation: String,
    /// Columns kept on the embedded row; `None` keeps all of them.
    pub columns: Option<Vec<String>>,
}

/// Parsed `select` argument.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Columns kept on each result row; `None` keeps all of them.
    pub columns: Option<Vec<String>>,
    /// Embeds requested with the `relation(...)` form.
    pub embeds: Vec<EmbedRequest>,
    /// Plain names that may turn out to be relations once the registry is
    /// consulted.
    pub bare: Vec<String>,
}

impl Selection {
    /// Every column, nothing embedded.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn parse(spec: &str) -> Self {
        let mut plain = Vec::new();
        let mut embeds = Vec::new();
        let mut star = false;

        for item in split_top_level(spec) {
            if item == "*" {
                star = true;
                continue;
            }
            match item.find('(') {
                Some(open) if item.ends_with(')') => {
                    let head = item[..open].trim();
                    let inner = &item[open + 1..item.len() - 1];
                    let (field, relation) = match head.split_once(':') {
                        Some((alias, relation)) => (alias.trim(), relation.trim()),
                        None => (head, head),
                    };
                    if relation.is_empty() {
                        continue;
                    }
                    embeds.push(EmbedRequest {
                        field: field.to_string(),
                        relation: relation.to_string(),
                        columns: Self::parse(inner).columns,
                    });
                }
                _ => plain.push(item.to_string()),
            }
        }

        let columns = if star || plain.is_empty() {
            None
        } else {
            Some(plain.clone())
        };
        Self {
            columns,
            embeds,
            bare: plain,
        }
    }

    pub fn is_all(&self) -> bool {
        self.columns.is_none() && self.embeds.is_empty()
    }
}

/// Split on commas that are not nested inside parentheses; trims items and
/// drops empty ones.
fn split_top_level(spec: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in spec.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(spec[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(spec[start..].trim());
    items.retain(|s| !s.is_empty());
    items
}
