//! Retained revisions: the "previous" side of each reconciliation
use crate::diff_engine::reconcile_with;
use crate::errors::ReconcilerError;
use crate::types::{EditScript, Keyed, ReconcilerConfig};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub const MAIN_CONTEXT: &str = "main";

/// Holds the last revision handed out so the next one can be diffed against it.
#[derive(Debug, Clone)]
pub struct RevisionTracker<T> {
    previous: Vec<T>,
    revision: u64,
    config: ReconcilerConfig,
}

impl<T> Default for RevisionTracker<T> {
    fn default() -> Self {
        RevisionTracker::new(ReconcilerConfig::default())
    }
}

impl<T> RevisionTracker<T> {
    pub fn new(config: ReconcilerConfig) -> Self {
        RevisionTracker {
            previous: Vec::new(),
            revision: 0,
            config,
        }
    }

    pub fn current(&self) -> &[T] {
        &self.previous
    }

    /// Number of revisions accepted so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn reset(&mut self) {
        self.previous.clear();
        self.revision = 0;
    }
}

impl<T: Keyed + Clone> RevisionTracker<T> {
    /// Diff `next` against the retained revision and retain `next`.
    ///
    /// On error the retained revision is left untouched.
    pub fn advance(&mut self, next: Vec<T>) -> Result<EditScript<T>, ReconcilerError> {
        let script = reconcile_with(&self.previous, &next, &self.config)?;
        self.previous = next;
        self.revision += 1;
        Ok(script)
    }
}

/// Named revision trackers shared behind a lock.
pub struct ContextStore<T> {
    contexts: Arc<Mutex<HashMap<String, RevisionTracker<T>>>>,
    config: ReconcilerConfig,
}

impl<T> Clone for ContextStore<T> {
    fn clone(&self) -> Self {
        ContextStore {
            contexts: Arc::clone(&self.contexts),
            config: self.config.clone(),
        }
    }
}

impl<T> Default for ContextStore<T> {
    fn default() -> Self {
        ContextStore::new(ReconcilerConfig::default())
    }
}

impl<T> ContextStore<T> {
    pub fn new(config: ReconcilerConfig) -> Self {
        let mut contexts = HashMap::new();
        contexts.insert(MAIN_CONTEXT.to_string(), RevisionTracker::new(config.clone()));

        ContextStore {
            contexts: Arc::new(Mutex::new(contexts)),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RevisionTracker<T>>> {
        // A panic mid-reconcile leaves every tracker consistent, so poisoning is ignored.
        self.contexts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn clear_context(&self, context_key: &str) {
        self.lock().remove(context_key);
        debug!("ContextStore: cleared context '{}'", context_key);
    }

    pub fn clear_all_contexts(&self) {
        let mut contexts = self.lock();
        contexts.clear();
        contexts.insert(MAIN_CONTEXT.to_string(), RevisionTracker::new(self.config.clone()));
        debug!("ContextStore: cleared all contexts");
    }

    /// Known context keys, sorted.
    pub fn contexts(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl<T: Keyed + Clone> ContextStore<T> {
    /// Advance `context_key` to `next`, creating the context on first use.
    pub fn reconcile(&self, context_key: &str, next: Vec<T>) -> Result<EditScript<T>, ReconcilerError> {
        let mut contexts = self.lock();
        let tracker = contexts
            .entry(context_key.to_string())
            .or_insert_with(|| RevisionTracker::new(self.config.clone()));
        let script = tracker.advance(next)?;
        debug!(
            "ContextStore: context '{}' at revision {} ({} instructions)",
            context_key,
            tracker.revision(),
            script.len()
        );
        Ok(script)
    }

    /// Snapshot of the retained revision for `context_key`.
    pub fn current(&self, context_key: &str) -> Option<Vec<T>> {
        self.lock().get(context_key).map(|tracker| tracker.current().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DuplicatePolicy, Item};

    fn rev(keys: &[u32]) -> Vec<Item<u32, u32>> {
        keys.iter().map(|&k| Item::new(k, k * 10)).collect()
    }

    #[test]
    fn tracker_diffs_against_the_previous_revision() {
        let mut tracker = RevisionTracker::default();

        let first = tracker.advance(rev(&[1, 2])).unwrap();
        assert_eq!(first.inserted.len(), 2);
        assert_eq!(tracker.revision(), 1);

        let second = tracker.advance(rev(&[2, 3])).unwrap();
        assert_eq!(second.deleted, vec![0]);
        assert_eq!(second.inserted[0].position, 1);
        assert_eq!(tracker.current(), rev(&[2, 3]).as_slice());

        tracker.reset();
        assert!(tracker.current().is_empty());
        assert_eq!(tracker.revision(), 0);
    }

    #[test]
    fn failed_advance_keeps_the_retained_revision() {
        let config = ReconcilerConfig::default().with_duplicate_policy(DuplicatePolicy::Reject);
        let mut tracker = RevisionTracker::new(config);
        tracker.advance(rev(&[1])).unwrap();

        assert!(tracker.advance(rev(&[2, 2])).is_err());
        assert_eq!(tracker.current(), rev(&[1]).as_slice());
        assert_eq!(tracker.revision(), 1);
    }

    #[test]
    fn contexts_are_independent() {
        let store = ContextStore::default();
        store.reconcile(MAIN_CONTEXT, rev(&[1, 2])).unwrap();
        let other = store.reconcile("overlay", rev(&[1])).unwrap();
        assert_eq!(other.inserted.len(), 1);

        assert_eq!(store.contexts(), vec!["main".to_string(), "overlay".to_string()]);
        assert_eq!(store.current(MAIN_CONTEXT), Some(rev(&[1, 2])));

        let again = store.reconcile(MAIN_CONTEXT, rev(&[1, 2])).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn clearing_resets_contexts() {
        let store = ContextStore::default();
        store.reconcile("grid", rev(&[1])).unwrap();
        store.clear_context("grid");
        assert_eq!(store.current("grid"), None);
        assert_eq!(store.reconcile("grid", rev(&[1])).unwrap().inserted.len(), 1);

        store.reconcile(MAIN_CONTEXT, rev(&[4])).unwrap();
        store.clear_all_contexts();
        assert_eq!(store.contexts(), vec!["main".to_string()]);
        assert_eq!(store.current(MAIN_CONTEXT), Some(Vec::new()));
    }

    #[test]
    fn clones_share_state() {
        let store = ContextStore::default();
        let handle = store.clone();
        handle.reconcile(MAIN_CONTEXT, rev(&[9])).unwrap();
        assert_eq!(store.current(MAIN_CONTEXT), Some(rev(&[9])));
    }
}
