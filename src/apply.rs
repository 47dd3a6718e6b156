//! Replay an edit script onto a concrete list
use crate::errors::ReconcilerError;
use crate::types::{EditScript, PatchAction};

/// Apply `script` to `left`, returning the resulting revision.
pub fn apply<T: Clone>(mut left: Vec<T>, script: &EditScript<T>) -> Result<Vec<T>, ReconcilerError> {
    apply_in_place(&mut left, script)?;
    Ok(left)
}

/// Removes by descending index, inserts by ascending index, then refreshes in place.
///
/// Every position is checked before `list` is touched, so a failed apply leaves it as it was.
pub fn apply_in_place<T: Clone>(list: &mut Vec<T>, script: &EditScript<T>) -> Result<(), ReconcilerError> {
    check_positions(list.len(), script)?;

    for &position in &script.deleted {
        list.remove(position);
    }
    for insertion in &script.inserted {
        list.insert(insertion.position, insertion.item.clone());
    }
    for update in &script.updated {
        list[update.position] = update.item.clone();
    }
    Ok(())
}

/// Walk the script against the list length alone.
fn check_positions<T>(mut len: usize, script: &EditScript<T>) -> Result<(), ReconcilerError> {
    for &position in &script.deleted {
        if position >= len {
            return Err(out_of_range(PatchAction::Remove, position, len));
        }
        len -= 1;
    }

    for insertion in &script.inserted {
        if insertion.position > len {
            let action = if insertion.is_move() { PatchAction::Move } else { PatchAction::Insert };
            return Err(out_of_range(action, insertion.position, len));
        }
        len += 1;
    }

    match script.updated.iter().find(|update| update.position >= len) {
        Some(update) => Err(out_of_range(PatchAction::Update, update.position, len)),
        None => Ok(()),
    }
}

fn out_of_range(action: PatchAction, position: usize, len: usize) -> ReconcilerError {
    ReconcilerError::IndexOutOfRange {
        action: action.to_string(),
        position,
        len,
    }
}
