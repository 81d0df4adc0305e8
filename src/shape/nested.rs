//! Arbitrary JSON content. Every non-blank, non-numeric string leaf is an
//! atom addressed by its path from the root.

use super::is_numeric_like;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone)]
pub struct NestedPlan {
    original: Value,
    paths: Vec<Vec<Segment>>,
}

pub(crate) fn decompose(value: &Value) -> (Vec<String>, NestedPlan) {
    let mut atoms = Vec::new();
    let mut paths = Vec::new();
    collect(value, &mut Vec::new(), &mut atoms, &mut paths);
    (
        atoms,
        NestedPlan {
            original: value.clone(),
            paths,
        },
    )
}

fn collect(
    value: &Value,
    path: &mut Vec<Segment>,
    atoms: &mut Vec<String>,
    paths: &mut Vec<Vec<Segment>>,
) {
    match value {
        Value::String(text) => {
            if !text.trim().is_empty() && !is_numeric_like(text) {
                atoms.push(text.clone());
                paths.push(path.clone());
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                path.push(Segment::Index(i));
                collect(item, path, atoms, paths);
                path.pop();
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                path.push(Segment::Key(key.clone()));
                collect(item, path, atoms, paths);
                path.pop();
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn lookup_mut<'a>(value: &'a mut Value, path: &[Segment]) -> Option<&'a mut Value> {
    path.iter().try_fold(value, |node, segment| match segment {
        Segment::Key(key) => node.get_mut(key.as_str()),
        Segment::Index(i) => node.get_mut(*i),
    })
}

impl NestedPlan {
    pub(crate) fn reassemble(&self, translated: &[String]) -> Value {
        let mut output = self.original.clone();
        for (path, text) in self.paths.iter().zip(translated) {
            if let Some(slot) = lookup_mut(&mut output, path) {
                *slot = Value::String(text.clone());
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collects_string_leaves_by_path() {
        let value = json!({
            "title": "이용 안내",
            "sections": [
                {"heading": "예약", "items": ["전화 예약", "온라인 예약"]},
                {"heading": "요금", "price": "30,000", "count": 3}
            ]
        });
        let (atoms, plan) = decompose(&value);
        assert_eq!(atoms.len(), 5);

        let translated: Vec<String> = atoms.iter().map(|a| format!("[{}]", a)).collect();
        let output = plan.reassemble(&translated);
        assert_eq!(output["title"], json!("[이용 안내]"));
        assert_eq!(output["sections"][0]["items"][1], json!("[온라인 예약]"));
        assert_eq!(output["sections"][1]["price"], json!("30,000"));
        assert_eq!(output["sections"][1]["count"], json!(3));
    }

    #[test]
    fn test_scalar_root() {
        let (atoms, plan) = decompose(&json!("안내"));
        assert_eq!(atoms, vec!["안내"]);
        assert_eq!(plan.reassemble(&["Guide".to_string()]), json!("Guide"));
    }
}
