//! Python-facing reconciler with per-context revision retention
use crate::converters::{json_to_pyobject, py_list_to_items, script_to_json};
use crate::diff_engine::reconcile_with;
use crate::revision::{ContextStore, MAIN_CONTEXT};
use crate::types::{DuplicatePolicy, JsonItem, ReconcilerConfig};
use log::info;
use pyo3::prelude::*;
use pyo3::types::PyList;

#[pyclass]
pub struct Reconciler {
    store: ContextStore<JsonItem>,
}

fn config_from(duplicate_policy: Option<&str>) -> PyResult<ReconcilerConfig> {
    let policy = match duplicate_policy {
        Some(name) => name.parse::<DuplicatePolicy>()?,
        None => DuplicatePolicy::default(),
    };
    Ok(ReconcilerConfig::default().with_duplicate_policy(policy))
}

#[pymethods]
impl Reconciler {
    #[new]
    #[pyo3(signature = (duplicate_policy=None))]
    fn new(duplicate_policy: Option<&str>) -> PyResult<Self> {
        let config = config_from(duplicate_policy)?;
        info!("Reconciler initialized ({:?})", config.duplicate_policy);
        Ok(Reconciler {
            store: ContextStore::new(config),
        })
    }

    /// Diff `items` against the revision retained for `context_key`, then retain `items`.
    #[pyo3(signature = (items, context_key=MAIN_CONTEXT.to_string()))]
    fn reconcile<'py>(
        &self,
        py: Python<'py>,
        items: Py<PyList>,
        context_key: String,
    ) -> PyResult<Bound<'py, PyAny>> {
        let next = py_list_to_items(py, items.bind(py))?;
        let script = self.store.reconcile(&context_key, next)?;
        json_to_pyobject(py, &script_to_json(&script)?)
    }

    fn clear_context(&self, context_key: String) {
        self.store.clear_context(&context_key);
    }

    fn clear_all_contexts(&self) {
        self.store.clear_all_contexts();
    }

    fn contexts(&self) -> Vec<String> {
        self.store.contexts()
    }
}

/// Stateless diff of two lists of dicts.
#[pyfunction]
#[pyo3(signature = (left, right, duplicate_policy=None))]
pub fn reconcile_lists<'py>(
    py: Python<'py>,
    left: Py<PyList>,
    right: Py<PyList>,
    duplicate_policy: Option<&str>,
) -> PyResult<Bound<'py, PyAny>> {
    let config = config_from(duplicate_policy)?;
    let left = py_list_to_items(py, left.bind(py))?;
    let right = py_list_to_items(py, right.bind(py))?;
    let script = reconcile_with(&left, &right, &config)?;
    json_to_pyobject(py, &script_to_json(&script)?)
}
