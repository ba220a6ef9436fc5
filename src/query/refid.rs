//! Ref id allocation for query lists
//!
//! Ref ids follow spreadsheet column naming: `A`..`Z`, then `AA`..`AZ`,
//! `BA`.. and so on. The allocator is stateless; every call looks at the
//! current list and returns the lowest free id, so deleting `C` from
//! `A`..`E` makes the next allocation reuse `C`.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::metrics;
use crate::types::Query;

/// Identifier for position `index` in the allocation order
///
/// `id(0..=25) = 'A'..='Z'`, `id(n >= 26) = id(n / 26 - 1) + id(n % 26)`.
///
/// ```rust
/// use kuba_templating::query::refid::ref_id_for_index;
///
/// assert_eq!(ref_id_for_index(0), "A");
/// assert_eq!(ref_id_for_index(25), "Z");
/// assert_eq!(ref_id_for_index(26), "AA");
/// assert_eq!(ref_id_for_index(52), "BA");
/// ```
pub fn ref_id_for_index(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index;
    loop {
        letters.push((b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Lowest free ref id for a new query
///
/// `prefix` is prepended to every candidate and collisions are checked on
/// the prefixed string.
///
/// ```rust
/// use kuba_templating::query::refid::next_ref_id;
/// use kuba_templating::types::Query;
///
/// let queries: Vec<Query> = ["A", "B", "D", "E"].into_iter().map(Query::new).collect();
/// assert_eq!(next_ref_id(&queries, None), "C");
/// assert_eq!(next_ref_id(&[], Some("T-")), "T-A");
/// ```
pub fn next_ref_id(existing: &[Query], prefix: Option<&str>) -> String {
    next_ref_id_from(existing.iter().map(|q| q.ref_id.as_str()), prefix)
}

/// Same as [`next_ref_id`] over bare identifiers
pub fn next_ref_id_from<'a, I>(existing: I, prefix: Option<&str>) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<&str> = existing.into_iter().collect();
    let prefix = prefix.unwrap_or_default();

    // At most taken.len() candidates can collide, so this always terminates.
    let mut index = 0;
    loop {
        let suffix = ref_id_for_index(index);
        let candidate = format!("{}{}", prefix, suffix);
        if !taken.contains(candidate.as_str()) {
            metrics::record_ref_id(suffix.len());
            debug!(ref_id = %candidate, "Allocated ref id");
            return candidate;
        }
        index += 1;
    }
}

/// Append `query` to `queries`, assigning a ref id if it has none
///
/// Returns the ref id the query ended up with.
pub fn add_query(queries: &mut Vec<Query>, mut query: Query) -> String {
    if query.ref_id.is_empty() {
        query.ref_id = next_ref_id(queries, None);
    }
    let ref_id = query.ref_id.clone();
    queries.push(query);
    ref_id
}

/// Ref ids that appear more than once, in order of first appearance
///
/// The allocator never produces duplicates; they only come from user edits.
pub fn duplicate_ref_ids(queries: &[Query]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for query in queries {
        *counts.entry(query.ref_id.as_str()).or_default() += 1;
    }

    let mut seen = HashSet::new();
    queries
        .iter()
        .map(|q| q.ref_id.as_str())
        .filter(|id| counts[id] > 1 && seen.insert(*id))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queries(ids: &[&str]) -> Vec<Query> {
        ids.iter().map(|id| Query::new(*id)).collect()
    }

    #[test]
    fn test_empty_list_returns_a() {
        assert_eq!(next_ref_id(&[], None), "A");
    }

    #[test]
    fn test_gap_is_filled() {
        assert_eq!(next_ref_id(&queries(&["A", "B", "D", "E"]), None), "C");
    }

    #[test]
    fn test_order_of_existing_does_not_matter() {
        assert_eq!(next_ref_id(&queries(&["B", "A"]), None), "C");
        assert_eq!(next_ref_id(&queries(&["B"]), None), "A");
    }

    #[test]
    fn test_overflow_to_two_letters() {
        let ids: Vec<String> = (0..26).map(ref_id_for_index).collect();
        let existing: Vec<Query> = ids.iter().map(|id| Query::new(id.as_str())).collect();
        assert_eq!(next_ref_id(&existing, None), "AA");
    }

    #[test]
    fn test_sequence_boundaries() {
        let expected = [
            (0, "A"),
            (1, "B"),
            (25, "Z"),
            (26, "AA"),
            (27, "AB"),
            (51, "AZ"),
            (52, "BA"),
            (701, "ZZ"),
            (702, "AAA"),
        ];
        for (index, id) in expected {
            assert_eq!(ref_id_for_index(index), id, "index {}", index);
        }
    }

    #[test]
    fn test_sequence_is_unique() {
        let ids: HashSet<String> = (0..2000).map(ref_id_for_index).collect();
        assert_eq!(ids.len(), 2000);
    }

    #[test]
    fn test_prefix_checks_full_string() {
        let existing = queries(&["A", "T-A", "T-B"]);
        assert_eq!(next_ref_id(&existing, Some("T-")), "T-C");
        assert_eq!(next_ref_id(&existing, None), "B");
    }

    #[test]
    fn test_delete_then_add_two() {
        let mut list = queries(&["A", "B", "C", "D", "E"]);
        list.retain(|q| q.ref_id != "C");

        assert_eq!(add_query(&mut list, Query::default()), "C");
        assert_eq!(add_query(&mut list, Query::default()), "F");
    }

    #[test]
    fn test_add_query_keeps_explicit_ref_id() {
        let mut list = queries(&["A"]);
        assert_eq!(add_query(&mut list, Query::new("custom")), "custom");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_duplicate_ref_ids() {
        let list = queries(&["A", "B", "A", "C", "B", "A"]);
        assert_eq!(duplicate_ref_ids(&list), vec!["A", "B"]);
        assert!(duplicate_ref_ids(&queries(&["A", "B"])).is_empty());
    }
}
