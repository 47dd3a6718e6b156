//! Ordered-list diffing with identity matching and LIS-based move detection
use super::errors::{ReconcilerError, Side};
use super::types::*;
use indexmap::IndexMap;
use log::{debug, trace};
use std::collections::HashSet;

/// Reconcile two revisions, resolving duplicate keys last-wins.
pub fn reconcile<T: Keyed + Clone>(left: &[T], right: &[T]) -> EditScript<T> {
    DiffEngine::new(left, right, &ReconcilerConfig::default()).diff()
}

pub fn reconcile_with<T: Keyed + Clone>(
    left: &[T],
    right: &[T],
    config: &ReconcilerConfig,
) -> Result<EditScript<T>, ReconcilerError> {
    DiffEngine::new(left, right, config).reconcile()
}

/// Where a right-sequence item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    New,
    Stationary(usize),
    Moved(usize),
}

pub struct DiffEngine<'a, T: Keyed> {
    left: &'a [T],
    right: &'a [T],
    config: &'a ReconcilerConfig,
}

impl<'a, T: Keyed + Clone> DiffEngine<'a, T> {
    pub fn new(left: &'a [T], right: &'a [T], config: &'a ReconcilerConfig) -> Self {
        DiffEngine { left, right, config }
    }

    /// Diff under the configured policy; only `Reject` can fail.
    pub fn reconcile(&self) -> Result<EditScript<T>, ReconcilerError> {
        if self.config.duplicate_policy == DuplicatePolicy::Reject {
            ensure_unique(self.left, Side::Left)?;
            ensure_unique(self.right, Side::Right)?;
        }
        Ok(self.diff())
    }

    /// Diff resolving any duplicates; with unique keys on both sides every policy agrees.
    pub fn diff(&self) -> EditScript<T> {
        let index = self.index_left();
        let matched = self.match_right(&index);
        let placements = place(&matched);

        let mut kept = vec![false; self.left.len()];
        let mut script = EditScript::default();

        for (position, placement) in placements.iter().enumerate() {
            let item = &self.right[position];
            match *placement {
                Placement::New => {
                    trace!("DiffEngine: insert key={:?} at {}", item.key(), position);
                    script.inserted.push(Insertion { position, item: item.clone(), previous_position: None });
                }
                Placement::Moved(from) => {
                    trace!("DiffEngine: move key={:?} {} -> {}", item.key(), from, position);
                    script.inserted.push(Insertion {
                        position,
                        item: item.clone(),
                        previous_position: Some(from),
                    });
                }
                Placement::Stationary(from) => {
                    kept[from] = true;
                    if !self.left[from].same_content(item) {
                        trace!("DiffEngine: update key={:?} at {}", item.key(), position);
                        script.updated.push(Update { position, item: item.clone() });
                    }
                }
            }
        }

        script.deleted = (0..self.left.len()).rev().filter(|&i| !kept[i]).collect();

        debug!(
            "DiffEngine: left={} right={} -> deleted={} inserted={} (moves={}) updated={}",
            self.left.len(),
            self.right.len(),
            script.deleted.len(),
            script.inserted.len(),
            script.moves().count(),
            script.updated.len(),
        );
        script
    }

    /// Identity key -> left position. Only `FirstWins` keeps the earliest duplicate.
    fn index_left(&self) -> IndexMap<T::Key, usize> {
        let mut index = IndexMap::with_capacity(self.left.len());
        for (position, item) in self.left.iter().enumerate() {
            if self.config.duplicate_policy == DuplicatePolicy::FirstWins {
                index.entry(item.key()).or_insert(position);
            } else {
                index.insert(item.key(), position);
            }
        }
        index
    }

    /// For each right position, the left position it matches (if any).
    ///
    /// A left item is claimed at most once; later right duplicates become new items.
    fn match_right(&self, index: &IndexMap<T::Key, usize>) -> Vec<Option<usize>> {
        let mut claimed = vec![false; self.left.len()];
        self.right
            .iter()
            .map(|item| match index.get(&item.key()) {
                Some(&from) if !claimed[from] => {
                    claimed[from] = true;
                    Some(from)
                }
                _ => None,
            })
            .collect()
    }
}

fn ensure_unique<T: Keyed>(items: &[T], side: Side) -> Result<(), ReconcilerError> {
    let mut seen = HashSet::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let key = item.key();
        if !seen.insert(key.clone()) {
            return Err(ReconcilerError::DuplicateKey {
                side,
                key: format!("{:?}", key),
                position,
            });
        }
    }
    Ok(())
}

/// Keep the longest run of matches already in left order; everything else moves.
fn place(matched: &[Option<usize>]) -> Vec<Placement> {
    let stationary = in_order_run(matched);
    matched
        .iter()
        .map(|m| match *m {
            None => Placement::New,
            Some(from) if stationary.contains(&from) => Placement::Stationary(from),
            Some(from) => Placement::Moved(from),
        })
        .collect()
}

/// Left positions of one longest run of matches whose left positions increase
/// in right order. Patience sorting, O(n log n).
fn in_order_run(matched: &[Option<usize>]) -> HashSet<usize> {
    // tails[n]: right position ending the best run of length n + 1 found so far
    let mut tails: Vec<usize> = Vec::new();
    let mut back: Vec<Option<usize>> = vec![None; matched.len()];

    for (at, from) in matched.iter().enumerate() {
        let Some(from) = *from else { continue };
        let len = tails.partition_point(|&t| matched[t].is_some_and(|f| f < from));
        back[at] = len.checked_sub(1).map(|prev| tails[prev]);
        if len == tails.len() {
            tails.push(at);
        } else {
            tails[len] = at;
        }
    }

    let mut run = HashSet::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(at) = cursor {
        run.extend(matched[at]);
        cursor = back[at];
    }
    run
}
