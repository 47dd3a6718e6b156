//! Keyed ordered-list reconciliation: delete/insert/update scripts between revisions
pub mod apply;
pub mod converters;
pub mod diff_engine;
pub mod errors;
pub mod grouping;
pub mod revision;
pub mod types;

#[cfg(feature = "python")]
mod bindings;

pub use apply::{apply, apply_in_place};
pub use diff_engine::{reconcile, reconcile_with, DiffEngine};
pub use errors::{ReconcilerError, Side};
pub use grouping::{group_entries, Entry, EntryKey, GroupingConfig, RowPosition};
pub use revision::{ContextStore, RevisionTracker, MAIN_CONTEXT};
pub use types::{
    DuplicatePolicy, EditScript, Insertion, Item, JsonItem, Keyed, Patch, PatchAction, ReconcilerConfig, Update,
};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn list_reconciler(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<bindings::Reconciler>()?;
    m.add_function(wrap_pyfunction!(bindings::reconcile_lists, m)?)?;

    // Export patch types as constants
    m.add("INSERT", "INSERT")?;
    m.add("REMOVE", "REMOVE")?;
    m.add("UPDATE", "UPDATE")?;
    m.add("MOVE", "MOVE")?;

    Ok(())
}
