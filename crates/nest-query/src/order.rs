//! Multi-key stable ordering of result rows.

use std::cmp::Ordering;

use nest_types::{Row, Value};
use serde::{Deserialize, Serialize};

use crate::filter::integer_value;

/// One sort key. Earlier directives take precedence over later ones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }
}

/// Sort `rows` in place by `order_by`, keeping ties in their prior order.
pub fn sort_rows(rows: &mut [Row], order_by: &[OrderBy]) {
    if order_by.is_empty() {
        return;
    }
    rows.sort_by(|a, b| compare_rows(a, b, order_by));
}

fn compare_rows(a: &Row, b: &Row, order_by: &[OrderBy]) -> Ordering {
    for key in order_by {
        let cmp = compare_values(a.get(&key.field), b.get(&key.field));
        if cmp != Ordering::Equal {
            return if key.ascending { cmp } else { cmp.reverse() };
        }
    }
    Ordering::Equal
}

/// Total order over optional JSON values.
///
/// Values of different kinds order by kind: missing < null < bool < number <
/// string < array < object. Within a kind, numbers compare numerically and
/// strings lexicographically; arrays and objects are all equal to each other.
/// Integer pairs compare exactly, even beyond the `f64` mantissa.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let by_kind = kind_rank(a).cmp(&kind_rank(b));
    if by_kind != Ordering::Equal {
        return by_kind;
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            match (integer_value(x), integer_value(y)) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => {
                    let x = x.as_f64().unwrap_or(f64::NAN);
                    let y = y.as_f64().unwrap_or(f64::NAN);
                    x.total_cmp(&y)
                }
            }
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn kind_rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nest_types::row;
    use proptest::prelude::*;
    use serde_json::json;

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter()
            .map(|r| r.get("id").and_then(Value::as_i64).unwrap())
            .collect()
    }

    #[test]
    fn ascending_and_descending() {
        let mut rows = vec![
            row! { "id": 1, "cost": 30 },
            row! { "id": 2, "cost": 10 },
            row! { "id": 3, "cost": 20 },
        ];
        sort_rows(&mut rows, &[OrderBy::asc("cost")]);
        assert_eq!(ids(&rows), vec![2, 3, 1]);
        sort_rows(&mut rows, &[OrderBy::desc("cost")]);
        assert_eq!(ids(&rows), vec![1, 3, 2]);
    }

    #[test]
    fn first_directive_is_primary_key() {
        let mut rows = vec![
            row! { "id": 1, "day": 2, "start": "09:00" },
            row! { "id": 2, "day": 1, "start": "12:00" },
            row! { "id": 3, "day": 1, "start": "08:00" },
            row! { "id": 4, "day": 2, "start": "07:00" },
        ];
        sort_rows(&mut rows, &[OrderBy::asc("day"), OrderBy::asc("start")]);
        assert_eq!(ids(&rows), vec![3, 2, 4, 1]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut rows = vec![
            row! { "id": 1, "k": "b" },
            row! { "id": 2, "k": "a" },
            row! { "id": 3, "k": "b" },
            row! { "id": 4, "k": "a" },
        ];
        sort_rows(&mut rows, &[OrderBy::asc("k")]);
        assert_eq!(ids(&rows), vec![2, 4, 1, 3]);
    }

    #[test]
    fn descending_ties_also_keep_insertion_order() {
        let mut rows = vec![
            row! { "id": 1, "k": 1 },
            row! { "id": 2, "k": 2 },
            row! { "id": 3, "k": 1 },
        ];
        sort_rows(&mut rows, &[OrderBy::desc("k")]);
        assert_eq!(ids(&rows), vec![2, 1, 3]);
    }

    #[test]
    fn mixed_kinds_order_by_kind() {
        let missing = None;
        let null = json!(null);
        let num = json!(3);
        let text = json!("3");
        assert_eq!(compare_values(missing, Some(&null)), Ordering::Less);
        assert_eq!(compare_values(Some(&null), Some(&num)), Ordering::Less);
        assert_eq!(compare_values(Some(&num), Some(&text)), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(2.5)), Some(&num)), Ordering::Less);
    }

    #[test]
    fn large_integer_ids_are_not_ties() {
        let big = 9_007_199_254_740_992u64;
        let mut rows = vec![
            Row::new().with("id", 1).with("k", big + 1),
            Row::new().with("id", 2).with("k", big),
        ];
        sort_rows(&mut rows, &[OrderBy::asc("k")]);
        assert_eq!(ids(&rows), vec![2, 1]);
        assert_eq!(
            compare_values(Some(&json!(-1)), Some(&json!(u64::MAX))),
            Ordering::Less
        );
    }

    #[test]
    fn no_directives_leave_rows_untouched() {
        let mut rows = vec![row! { "id": 2 }, row! { "id": 1 }];
        sort_rows(&mut rows, &[]);
        assert_eq!(ids(&rows), vec![2, 1]);
    }

    proptest! {
        #[test]
        fn sort_is_stable_on_duplicate_keys(keys in proptest::collection::vec(0u8..4, 0..40)) {
            let mut rows: Vec<Row> = keys
                .iter()
                .enumerate()
                .map(|(i, k)| Row::new().with("id", i as i64).with("k", *k))
                .collect();
            sort_rows(&mut rows, &[OrderBy::asc("k")]);
            for pair in rows.windows(2) {
                let (ka, kb) = (pair[0].get("k").and_then(Value::as_u64), pair[1].get("k").and_then(Value::as_u64));
                prop_assert!(ka <= kb);
                if ka == kb {
                    let (ia, ib) = (pair[0].get("id").and_then(Value::as_i64), pair[1].get("id").and_then(Value::as_i64));
                    prop_assert!(ia < ib);
                }
            }
        }
    }
}
