//! Conversions between host values and keyed JSON items
use crate::errors::ReconcilerError;
use crate::types::{EditScript, JsonItem};
#[cfg(feature = "python")]
use pyo3::prelude::*;
#[cfg(feature = "python")]
use pyo3::types::{PyDict, PyList, PyModule};

/// Field holding an item's identity.
pub const KEY_FIELD: &str = "key";

/// Identity text for a JSON key: its JSON text, so `"7"` and `7` stay distinct.
pub fn key_text(value: &serde_json::Value) -> String {
    value.to_string()
}

/// Wrap a JSON object as an item keyed by its `"key"` field.
pub fn json_item(value: serde_json::Value) -> Result<JsonItem, ReconcilerError> {
    let key = match &value {
        serde_json::Value::Object(map) => match map.get(KEY_FIELD) {
            Some(serde_json::Value::Null) | None => {
                return Err(ReconcilerError::KeyError {
                    details: format!("item {} has no '{}' field", value, KEY_FIELD),
                });
            }
            Some(key) => key_text(key),
        },
        other => {
            return Err(ReconcilerError::TypeConversionError {
                expected: "object".into(),
                actual: other.to_string(),
            });
        }
    };
    Ok(JsonItem::new(key, value))
}

pub fn json_items(values: Vec<serde_json::Value>) -> Result<Vec<JsonItem>, ReconcilerError> {
    values.into_iter().map(json_item).collect()
}

/// Edit script as a JSON object carrying payloads only, plus the flattened patch stream.
pub fn script_to_json(script: &EditScript<JsonItem>) -> Result<serde_json::Value, ReconcilerError> {
    let patches = serde_json::to_value(script.patches())?;
    let payloads = script.clone().map(|item| item.payload);
    let mut value = serde_json::to_value(payloads)?;
    if let serde_json::Value::Object(map) = &mut value {
        map.insert("patches".into(), strip_keys(patches));
    }
    Ok(value)
}

fn strip_keys(mut patches: serde_json::Value) -> serde_json::Value {
    if let serde_json::Value::Array(list) = &mut patches {
        for patch in list {
            if let Some(item) = patch.get_mut("item") {
                if let Some(payload) = item.get_mut("payload").map(serde_json::Value::take) {
                    *item = payload;
                }
            }
        }
    }
    patches
}

/// Convert a Python list of dicts to keyed items
#[cfg(feature = "python")]
pub fn py_list_to_items<'py>(
    py: Python<'py>,
    list: &Bound<'py, PyList>,
) -> Result<Vec<JsonItem>, ReconcilerError> {
    let mut items = Vec::with_capacity(list.len());
    for entry in list.iter() {
        let dict = entry.cast::<PyDict>().map_err(|e| ReconcilerError::TypeConversionError {
            expected: "dict".into(),
            actual: e.to_string(),
        })?;
        items.push(json_item(python_to_json(py, dict.as_any())?)?);
    }
    Ok(items)
}

/// Convert Python object to JSON with full type support
#[cfg(feature = "python")]
pub fn python_to_json<'py>(
    py: Python<'py>,
    obj: &Bound<'py, PyAny>,
) -> Result<serde_json::Value, ReconcilerError> {
    let json_mod = PyModule::import(py, "json")?;
    let dumps = json_mod.getattr("dumps")?;
    let dumped = dumps.call1((obj,))?;
    let s: String = dumped.extract()?;
    serde_json::from_str(&s).map_err(|e| ReconcilerError::TypeConversionError {
        expected: "JSON-serializable type".into(),
        actual: e.to_string(),
    })
}

/// Convert JSON back to Python with proper type mapping
#[cfg(feature = "python")]
pub fn json_to_pyobject<'py>(
    py: Python<'py>,
    value: &serde_json::Value,
) -> PyResult<Bound<'py, PyAny>> {
    match value {
        serde_json::Value::Null => Ok(py.None().into_bound(py).into_any()),
        serde_json::Value::Bool(b) => Ok((*b).into_pyobject(py)?.to_owned().into_any()),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.into_pyobject(py)?.into_any())
            } else if let Some(f) = n.as_f64() {
                Ok(f.into_pyobject(py)?.into_any())
            } else {
                Ok(n.to_string().into_pyobject(py)?.into_any())
            }
        }
        serde_json::Value::String(s) => Ok(s.as_str().into_pyobject(py)?.into_any()),
        serde_json::Value::Array(arr) => {
            let list = PyList::empty(py);
            for v in arr {
                list.append(json_to_pyobject(py, v)?)?;
            }
            Ok(list.into_any())
        }
        serde_json::Value::Object(map) => {
            let dict = PyDict::new(py);
            for (k, v) in map {
                dict.set_item(k, json_to_pyobject(py, v)?)?;
            }
            Ok(dict.into_any())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff_engine::reconcile;
    use serde_json::json;

    #[test]
    fn keys_come_from_the_key_field() {
        assert_eq!(json_item(json!({"key": "a", "n": 1})).unwrap().key, "\"a\"");
        assert_eq!(json_item(json!({"key": 7})).unwrap().key, "7");
        assert!(matches!(json_item(json!({"n": 1})), Err(ReconcilerError::KeyError { .. })));
        assert!(matches!(json_item(json!({"key": null})), Err(ReconcilerError::KeyError { .. })));
        assert!(matches!(json_item(json!([1])), Err(ReconcilerError::TypeConversionError { .. })));
    }

    #[test]
    fn string_and_number_keys_are_distinct_identities() {
        let left = json_items(vec![json!({"key": "7", "v": "str"})]).unwrap();
        let right = json_items(vec![json!({"key": 7, "v": "num"})]).unwrap();
        assert_ne!(left[0].key, right[0].key);

        let script = reconcile(&left, &right);
        assert_eq!(script.deleted, vec![0]);
        assert_eq!(script.inserted.len(), 1);
        assert!(!script.inserted[0].is_move());
        assert!(script.updated.is_empty());

        let config = crate::types::ReconcilerConfig::default()
            .with_duplicate_policy(crate::types::DuplicatePolicy::Reject);
        let both = json_items(vec![json!({"key": "7"}), json!({"key": 7})]).unwrap();
        assert!(crate::diff_engine::reconcile_with(&both, &both, &config).is_ok());
    }

    #[test]
    fn script_json_exposes_payloads_and_patches() {
        let left = json_items(vec![json!({"key": 1, "v": "a"}), json!({"key": 2, "v": "b"})]).unwrap();
        let right = json_items(vec![json!({"key": 2, "v": "B"}), json!({"key": 3, "v": "c"})]).unwrap();
        let value = script_to_json(&reconcile(&left, &right)).unwrap();

        assert_eq!(value["deleted"], json!([0]));
        assert_eq!(value["inserted"][0]["item"], json!({"key": 3, "v": "c"}));
        assert_eq!(value["updated"][0], json!({"position": 0, "item": {"key": 2, "v": "B"}}));
        assert_eq!(value["patches"][0]["action"], "REMOVE");
        assert_eq!(value["patches"][1]["item"], json!({"key": 3, "v": "c"}));
        assert_eq!(value["patches"][2]["action"], "UPDATE");
    }
}
