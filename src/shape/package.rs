//! Package/price tables: an array of objects like
//! `{"name": "베이직", "price": "50,000", "duration": "1시간"}`.

use super::is_numeric_like;
use crate::error::{Result, TranscacheError};
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct PackagePlan {
    rows: Vec<Map<String, Value>>,
    /// (row index, key) for each atom.
    slots: Vec<(usize, String)>,
}

pub(crate) fn decompose(value: &Value) -> Result<(Vec<String>, PackagePlan)> {
    let items = value.as_array().ok_or_else(|| {
        TranscacheError::Shape("package table must be a JSON array".to_string())
    })?;

    let mut rows = Vec::with_capacity(items.len());
    let mut atoms = Vec::new();
    let mut slots = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let row = item.as_object().ok_or_else(|| {
            TranscacheError::Shape(format!("package row {} is not an object", index))
        })?;

        for (key, cell) in row {
            if let Value::String(text) = cell {
                if !text.trim().is_empty() && !is_numeric_like(text) {
                    atoms.push(text.clone());
                    slots.push((index, key.clone()));
                }
            }
        }
        rows.push(row.clone());
    }

    Ok((atoms, PackagePlan { rows, slots }))
}

impl PackagePlan {
    pub(crate) fn reassemble(&self, translated: &[String]) -> Value {
        let mut rows = self.rows.clone();
        for ((index, key), text) in self.slots.iter().zip(translated) {
            if let Some(row) = rows.get_mut(*index) {
                row.insert(key.clone(), Value::String(text.clone()));
            }
        }
        Value::Array(rows.into_iter().map(Value::Object).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_prose_is_collected() {
        let value = json!([{"name": "X", "price": "1000", "duration": "1h"}]);
        let (atoms, _) = decompose(&value).unwrap();
        assert_eq!(atoms.len(), 2);
        assert!(atoms.contains(&"X".to_string()));
        assert!(atoms.contains(&"1h".to_string()));
    }

    #[test]
    fn test_reassemble_keeps_keys_and_numbers() {
        let value = json!([
            {"name": "베이직", "price": 50000, "duration": "1시간", "notes": ""},
            {"name": "프리미엄", "price": "80,000원", "description": "메이크업 포함"}
        ]);
        let (atoms, plan) = decompose(&value).unwrap();
        let translated: Vec<String> = atoms.iter().map(|a| format!("T({})", a)).collect();
        let output = plan.reassemble(&translated);

        let rows = output.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], json!("T(베이직)"));
        assert_eq!(rows[0]["price"], json!(50000));
        assert_eq!(rows[0]["notes"], json!(""));
        assert_eq!(rows[1]["price"], json!("80,000원"));
        assert_eq!(rows[1]["description"], json!("T(메이크업 포함)"));

        for (before, after) in value.as_array().unwrap().iter().zip(rows) {
            let before_keys: Vec<&String> = before.as_object().unwrap().keys().collect();
            let after_keys: Vec<&String> = after.as_object().unwrap().keys().collect();
            assert_eq!(before_keys, after_keys);
        }
    }

    #[test]
    fn test_rejects_non_object_rows() {
        assert!(decompose(&json!(["베이직"])).is_err());
        assert!(decompose(&json!("베이직")).is_err());
    }
}
