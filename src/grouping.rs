//! Bucketed row grouping for grid-style lists.
//!
//! A flat, ordered list is split into contiguous runs sharing a bucket
//! (a month, a day, a section), each run gets a header and is chunked into
//! fixed-width rows. The resulting entries are `Keyed`, so consecutive
//! groupings can be handed straight to the reconciler.
use crate::errors::ReconcilerError;
use crate::types::Keyed;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Items per row.
    pub per_row: usize,
    /// Emit a header before the first bucket too.
    pub leading_header: bool,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        GroupingConfig {
            per_row: 3,
            leading_header: true,
        }
    }
}

/// Where a row sits inside its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowPosition {
    Single,
    First,
    Inner,
    Last,
}

impl RowPosition {
    fn of(index: usize, count: usize) -> Self {
        if count == 1 {
            RowPosition::Single
        } else if index == 0 {
            RowPosition::First
        } else if index + 1 == count {
            RowPosition::Last
        } else {
            RowPosition::Inner
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry<B, T: Keyed> {
    Header {
        bucket: B,
    },
    Row {
        /// Key of the first item in the row.
        id: T::Key,
        bucket: B,
        items: Vec<T>,
        position: RowPosition,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey<B, K> {
    Header(B),
    Row(K),
}

impl<B, T> Keyed for Entry<B, T>
where
    B: Eq + Hash + Clone + fmt::Debug,
    T: Keyed,
{
    type Key = EntryKey<B, T::Key>;

    fn key(&self) -> Self::Key {
        match self {
            Entry::Header { bucket } => EntryKey::Header(bucket.clone()),
            Entry::Row { id, .. } => EntryKey::Row(id.clone()),
        }
    }

    fn same_content(&self, other: &Self) -> bool {
        match (self, other) {
            (Entry::Header { bucket: a }, Entry::Header { bucket: b }) => a == b,
            (
                Entry::Row { bucket: a_bucket, items: a_items, position: a_pos, .. },
                Entry::Row { bucket: b_bucket, items: b_items, position: b_pos, .. },
            ) => {
                a_bucket == b_bucket
                    && a_pos == b_pos
                    && a_items.len() == b_items.len()
                    && a_items
                        .iter()
                        .zip(b_items)
                        .all(|(a, b)| a.key() == b.key() && a.same_content(b))
            }
            _ => false,
        }
    }
}

/// Fold `items` into headers and rows according to `bucket_of`.
pub fn group_entries<B, T, F>(
    items: &[T],
    config: &GroupingConfig,
    mut bucket_of: F,
) -> Result<Vec<Entry<B, T>>, ReconcilerError>
where
    B: PartialEq + Clone,
    T: Keyed + Clone,
    F: FnMut(&T) -> B,
{
    if config.per_row == 0 {
        return Err(ReconcilerError::InvalidConfig {
            details: "per_row must be at least 1".into(),
        });
    }

    let mut runs: Vec<(B, Vec<T>)> = Vec::new();
    for item in items {
        let bucket = bucket_of(item);
        match runs.last_mut() {
            Some((last, run)) if *last == bucket => run.push(item.clone()),
            _ => runs.push((bucket, vec![item.clone()])),
        }
    }

    let mut entries = Vec::new();
    for (i, (bucket, run)) in runs.into_iter().enumerate() {
        if i > 0 || config.leading_header {
            entries.push(Entry::Header { bucket: bucket.clone() });
        }
        let count = run.len().div_ceil(config.per_row);
        for (j, chunk) in run.chunks(config.per_row).enumerate() {
            entries.push(Entry::Row {
                id: chunk[0].key(),
                bucket: bucket.clone(),
                items: chunk.to_vec(),
                position: RowPosition::of(j, count),
            });
        }
    }
    Ok(entries)
}
