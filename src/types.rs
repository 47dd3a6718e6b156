//! Keyed items, edit scripts and reconciler configuration
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// A value with a stable identity that survives content changes.
pub trait Keyed {
    type Key: Eq + Hash + Clone + fmt::Debug;

    fn key(&self) -> Self::Key;

    /// Content equality for two items that already share a key.
    fn same_content(&self, other: &Self) -> bool;
}

/// Ready-made keyed value: identity plus payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item<K, P> {
    pub key: K,
    pub payload: P,
}

impl<K, P> Item<K, P> {
    pub fn new(key: K, payload: P) -> Self {
        Item { key, payload }
    }
}

impl<K, P> Keyed for Item<K, P>
where
    K: Eq + Hash + Clone + fmt::Debug,
    P: PartialEq,
{
    type Key = K;

    fn key(&self) -> K {
        self.key.clone()
    }

    fn same_content(&self, other: &Self) -> bool {
        self.payload == other.payload
    }
}

/// Item keyed by a string identity with an arbitrary JSON payload.
pub type JsonItem = Item<String, serde_json::Value>;

/// An item placed at `position` in the right sequence.
///
/// `previous_position` is set when the item already existed on the left but
/// had to be taken out and re-placed to restore order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insertion<T> {
    pub position: usize,
    pub item: T,
    pub previous_position: Option<usize>,
}

impl<T> Insertion<T> {
    pub fn is_move(&self) -> bool {
        self.previous_position.is_some()
    }
}

/// In-place content refresh at a right-sequence position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update<T> {
    pub position: usize,
    pub item: T,
}

/// Delete/insert/update instructions turning one revision into the next.
///
/// Replay order: `deleted` as listed (descending), then `inserted` as listed
/// (ascending), then `updated` in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditScript<T> {
    pub deleted: Vec<usize>,
    pub inserted: Vec<Insertion<T>>,
    pub updated: Vec<Update<T>>,
}

impl<T> Default for EditScript<T> {
    fn default() -> Self {
        EditScript {
            deleted: Vec::new(),
            inserted: Vec::new(),
            updated: Vec::new(),
        }
    }
}

impl<T> EditScript<T> {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.inserted.is_empty() && self.updated.is_empty()
    }

    /// Total number of instructions; a move counts twice (remove + insert).
    pub fn len(&self) -> usize {
        self.deleted.len() + self.inserted.len() + self.updated.len()
    }

    pub fn moves(&self) -> impl Iterator<Item = &Insertion<T>> {
        self.inserted.iter().filter(|ins| ins.is_move())
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> EditScript<U> {
        EditScript {
            deleted: self.deleted,
            inserted: self
                .inserted
                .into_iter()
                .map(|ins| Insertion {
                    position: ins.position,
                    item: f(ins.item),
                    previous_position: ins.previous_position,
                })
                .collect(),
            updated: self
                .updated
                .into_iter()
                .map(|upd| Update {
                    position: upd.position,
                    item: f(upd.item),
                })
                .collect(),
        }
    }
}

impl<T: Clone> EditScript<T> {
    /// Flatten into a single patch stream in replay order.
    pub fn patches(&self) -> Vec<Patch<T>> {
        let mut patches = Vec::with_capacity(self.len());
        patches.extend(self.deleted.iter().map(|&position| Patch {
            action: PatchAction::Remove,
            position,
            item: None,
            previous_position: None,
        }));
        patches.extend(self.inserted.iter().map(|ins| Patch {
            action: if ins.is_move() { PatchAction::Move } else { PatchAction::Insert },
            position: ins.position,
            item: Some(ins.item.clone()),
            previous_position: ins.previous_position,
        }));
        patches.extend(self.updated.iter().map(|upd| Patch {
            action: PatchAction::Update,
            position: upd.position,
            item: Some(upd.item.clone()),
            previous_position: None,
        }));
        patches
    }
}

/// Patch action enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PatchAction {
    Remove,
    Insert,
    Move,
    Update,
}

impl fmt::Display for PatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatchAction::Remove => "REMOVE",
            PatchAction::Insert => "INSERT",
            PatchAction::Move => "MOVE",
            PatchAction::Update => "UPDATE",
        };
        f.write_str(name)
    }
}

/// One step of a flattened edit script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch<T> {
    pub action: PatchAction,
    pub position: usize,
    pub item: Option<T>,
    pub previous_position: Option<usize>,
}

/// How repeated identity keys within one sequence are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The last left occurrence is matched; earlier ones are deleted.
    #[default]
    LastWins,
    /// The first left occurrence is matched; later ones are deleted.
    FirstWins,
    /// Duplicates on either side fail the reconciliation.
    Reject,
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = crate::errors::ReconcilerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last_wins" => Ok(DuplicatePolicy::LastWins),
            "first_wins" => Ok(DuplicatePolicy::FirstWins),
            "reject" => Ok(DuplicatePolicy::Reject),
            other => Err(crate::errors::ReconcilerError::InvalidConfig {
                details: format!("unknown duplicate policy '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub duplicate_policy: DuplicatePolicy,
}

impl ReconcilerConfig {
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script() -> EditScript<Item<u32, &'static str>> {
        EditScript {
            deleted: vec![3, 0],
            inserted: vec![
                Insertion { position: 0, item: Item::new(7, "g"), previous_position: None },
                Insertion { position: 2, item: Item::new(4, "d"), previous_position: Some(3) },
            ],
            updated: vec![Update { position: 1, item: Item::new(2, "B") }],
        }
    }

    #[test]
    fn patches_follow_replay_order() {
        let actions: Vec<_> = script().patches().into_iter().map(|p| p.action).collect();
        assert_eq!(
            actions,
            vec![
                PatchAction::Remove,
                PatchAction::Remove,
                PatchAction::Insert,
                PatchAction::Move,
                PatchAction::Update,
            ]
        );
    }

    #[test]
    fn moves_are_insertions_with_a_previous_position() {
        let s = script();
        let moved: Vec<_> = s.moves().map(|ins| ins.item.key).collect();
        assert_eq!(moved, vec![4]);
        assert_eq!(s.len(), 5);
        assert!(!s.is_empty());
        assert!(EditScript::<Item<u32, ()>>::default().is_empty());
    }

    #[test]
    fn map_keeps_positions() {
        let mapped = script().map(|item| item.payload.to_uppercase());
        assert_eq!(mapped.deleted, vec![3, 0]);
        assert_eq!(mapped.inserted[1].item, "D");
        assert_eq!(mapped.inserted[1].previous_position, Some(3));
        assert_eq!(mapped.updated[0].position, 1);
    }

    #[test]
    fn script_serializes_with_camel_case_fields() {
        let value = serde_json::to_value(script()).unwrap();
        assert_eq!(value["inserted"][1]["previousPosition"], 3);
        assert_eq!(value["deleted"], serde_json::json!([3, 0]));
        let patch = serde_json::to_value(&script().patches()[3]).unwrap();
        assert_eq!(patch["action"], "MOVE");
    }

    #[test]
    fn config_parses_from_json_and_str() {
        let config: ReconcilerConfig =
            serde_json::from_str(r#"{"duplicate_policy": "reject"}"#).unwrap();
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        let empty: ReconcilerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ReconcilerConfig::default());
        assert_eq!("first_wins".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::FirstWins);
        assert!("sometimes".parse::<DuplicatePolicy>().is_err());
    }
}
