//! Group partitioning and group-boundary queries.
//!
//! Everything here is a pure function of the row list it is given. Boundary
//! answers are derived from the current order on every call; nothing is
//! cached across re-orderings.

use crate::entity::Entity;
use crate::row::Row;
use std::cmp::Ordering;
use std::ops::Range;

#[derive(Debug, Clone)]
pub struct Group<'a, E, K> {
    pub key: K,
    pub rows: Vec<&'a Row<E>>,
}

impl<'a, E: Entity, K> Group<'a, E, K> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn representatives(&self) -> Vec<&'a Row<E>> {
        self.rows
            .iter()
            .copied()
            .filter(|row| row.payload().is_representative() == Some(true))
            .collect()
    }
}

/// Partitions rows by `group_key`, groups in ascending key order.
pub fn partition<'a, E, K, F>(rows: impl IntoIterator<Item = &'a Row<E>>, group_key: F) -> Vec<Group<'a, E, K>>
where
    E: Entity + 'a,
    K: Ord,
    F: Fn(&E) -> K,
{
    partition_with(rows, group_key, K::cmp)
}

/// Partitions rows by `group_key` using a caller-supplied key order. Inside
/// a group, representative rows come first, then ascending sequence; ties
/// keep their input order.
pub fn partition_with<'a, E, K, F, C>(
    rows: impl IntoIterator<Item = &'a Row<E>>,
    group_key: F,
    compare: C,
) -> Vec<Group<'a, E, K>>
where
    E: Entity + 'a,
    F: Fn(&E) -> K,
    C: Fn(&K, &K) -> Ordering,
{
    let mut keyed: Vec<(K, &'a Row<E>)> = rows.into_iter().map(|row| (group_key(row.payload()), row)).collect();
    keyed.sort_by(|(a, _), (b, _)| compare(a, b));

    let mut groups: Vec<Group<'a, E, K>> = Vec::new();
    for (key, row) in keyed {
        match groups.last_mut() {
            Some(group) if compare(&group.key, &key) == Ordering::Equal => group.rows.push(row),
            _ => groups.push(Group { key, rows: vec![row] }),
        }
    }
    for group in &mut groups {
        group.rows.sort_by(|a, b| intra_group_order(a, b));
    }
    groups
}

/// Partitions by the entity's own group key.
pub fn partition_by_group<'a, E>(rows: impl IntoIterator<Item = &'a Row<E>>) -> Vec<Group<'a, E, Option<E::GroupKey>>>
where
    E: Entity + 'a,
{
    partition(rows, |entity: &E| entity.group_key())
}

/// Flattened presentation order: groups by key, then representative-first,
/// then sequence.
pub fn ordered<'a, E>(rows: impl IntoIterator<Item = &'a Row<E>>) -> Vec<&'a Row<E>>
where
    E: Entity + 'a,
{
    partition_by_group(rows).into_iter().flat_map(|group| group.rows).collect()
}

// A row marked for deletion no longer leads its group.
fn leads_group<E: Entity>(row: &Row<E>) -> bool {
    row.is_live() && row.payload().is_representative() == Some(true)
}

fn intra_group_order<E: Entity>(a: &Row<E>, b: &Row<E>) -> Ordering {
    leads_group(b)
        .cmp(&leads_group(a))
        .then_with(|| a.payload().sequence().cmp(&b.payload().sequence()))
}

/// True iff `index` is the last element of its run of equal keys. The final
/// item is always a boundary; an out-of-range index never is.
pub fn is_group_boundary<T, K, F>(items: &[T], index: usize, key: F) -> bool
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    match (items.get(index), items.get(index + 1)) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(current), Some(next)) => key(current) != key(next),
    }
}

/// Boundary query over rows keyed by their entity group key.
pub fn is_row_group_boundary<E: Entity>(rows: &[&Row<E>], index: usize) -> bool {
    is_group_boundary(rows, index, |row| row.payload().group_key())
}

/// Index ranges of adjacent equal-key runs, used to merge cells of a group.
pub fn merge_spans<T, K, F>(items: &[T], key: F) -> Vec<Range<usize>>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut spans = Vec::new();
    let mut start = 0;
    for index in 0..items.len() {
        if is_group_boundary(items, index, &key) {
            spans.push(start..index + 1);
            start = index + 1;
        }
    }
    spans
}
