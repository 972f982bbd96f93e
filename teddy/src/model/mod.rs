//! Render models
//!
//! Callers hand the engine anything `Serialize`. Before a render the value is
//! converted to JSON and every mapping key is lower-cased so that template
//! lookups are case-insensitive. Lookups, truthiness and comparisons follow
//! the loose rules templates were written against: `0` and `""` are false,
//! `"1"` equals `1`, and so on.

mod serializer;

use serde::Serialize;
use serde_json::{Map, Value};

/// Nesting depth past which a model is treated as cyclic and dropped
pub const MAX_MODEL_DEPTH: usize = 128;

pub type Model = Map<String, Value>;

/// Serialise and flatten a caller model.
///
/// Serialisation failures (non-string map keys, failing `Serialize` impls)
/// and over-deep inputs yield an empty model rather than an error. The depth
/// limit is enforced while serialising, so a self-referential `Serialize`
/// impl is cut off instead of exhausting the stack.
pub fn flatten<T: Serialize + ?Sized>(model: &T) -> Model {
    match serializer::to_value(model, MAX_MODEL_DEPTH) {
        Ok(value) => flatten_model(&value),
        Err(e) => {
            log::warn!("Model could not be serialised, rendering with an empty model: {}", e);
            Model::new()
        }
    }
}

/// Lower-case every key of `value` and of every mapping nested in it.
/// Sequences are copied as they are, including mappings inside them.
pub fn flatten_model(value: &Value) -> Model {
    let Value::Object(map) = value else {
        return Model::new();
    };
    if exceeds_depth(value, MAX_MODEL_DEPTH) {
        log::warn!(
            "Model is nested deeper than {} levels and looks cyclic, rendering with an empty model",
            MAX_MODEL_DEPTH
        );
        return Model::new();
    }
    lower_keys(map)
}

fn lower_keys(map: &Model) -> Model {
    map.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Object(inner) => Value::Object(lower_keys(inner)),
                other => other.clone(),
            };
            (key.to_lowercase(), value)
        })
        .collect()
}

fn exceeds_depth(value: &Value, limit: usize) -> bool {
    let mut stack = vec![(value, 1usize)];
    while let Some((current, depth)) = stack.pop() {
        if depth > limit {
            return true;
        }
        match current {
            Value::Object(map) => stack.extend(map.values().map(|v| (v, depth + 1))),
            Value::Array(items) => stack.extend(items.iter().map(|v| (v, depth + 1))),
            _ => {}
        }
    }
    false
}

/// Resolve a dot path such as `user.address.city` or `items.0`.
///
/// The first segment is matched against the flattened (lower-case) keys.
/// Nested mappings are matched exactly first and then case-insensitively,
/// since mappings inside sequences keep their original casing. Sequences
/// and strings also answer `length`.
pub fn lookup(model: &Model, path: &str) -> Option<Value> {
    if path.is_empty() {
        return None;
    }
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = model.get(&segments[0].to_lowercase())?;

    for (i, segment) in segments.iter().enumerate().skip(1) {
        let last = i + 1 == segments.len();
        match current {
            Value::Object(map) => {
                current = match map.get(*segment) {
                    Some(v) => v,
                    None => map
                        .iter()
                        .find(|(k, _)| k.eq_ignore_ascii_case(segment))
                        .map(|(_, v)| v)?,
                };
            }
            Value::Array(items) if *segment == "length" => {
                return last.then(|| Value::from(items.len()));
            }
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                current = items.get(index)?;
            }
            Value::String(s) if *segment == "length" => {
                return last.then(|| Value::from(s.chars().count()));
            }
            _ => return None,
        }
    }
    Some(current.clone())
}

/// Loose truthiness: missing, `null`, `false`, `0`, NaN and `""` are false.
/// Empty sequences and mappings are true.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Compare a model value with a literal taken from template markup.
///
/// Strings compare exactly, numbers numerically against the trimmed literal.
/// Booleans match `1`/`0` and, unlike a plain loose `==`, also the words
/// `true`/`false`, so `<if flag="true">` reads as written. Missing and `null`
/// values never match. Sequences and mappings compare through their string
/// form.
pub fn loose_eq(value: Option<&Value>, literal: &str) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => s == literal,
        Some(Value::Number(n)) => match (n.as_f64(), parse_number(literal)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        Some(Value::Bool(b)) => match literal.trim() {
            "true" | "1" => *b,
            "false" | "0" => !*b,
            _ => false,
        },
        Some(other) => value_to_string(other) == literal,
    }
}

fn parse_number(literal: &str) -> Option<f64> {
    let trimmed = literal.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|f| !f.is_nan())
}

/// String form used when a value is written into markup
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_f64() {
                n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string())
            } else {
                n.to_string()
            }
        }
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => value_to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_flatten_lowercases_nested_mappings() {
        let model = flatten(&json!({
            "Title": "Home",
            "User": { "FirstName": "Ada", "Tags": [{ "Key": "x" }] }
        }));

        assert_eq!(model["title"], "Home");
        assert_eq!(model["user"]["firstname"], "Ada");
        // mappings inside sequences keep their casing
        assert_eq!(model["user"]["tags"][0]["Key"], "x");
    }

    #[test]
    fn test_flatten_non_mapping_is_empty() {
        assert!(flatten(&json!([1, 2, 3])).is_empty());
        assert!(flatten(&json!("text")).is_empty());
        assert!(flatten(&()).is_empty());
    }

    #[test]
    fn test_flatten_rejects_unserialisable_model() {
        let mut bad: HashMap<(u8, u8), &str> = HashMap::new();
        bad.insert((1, 2), "pair keys are not JSON keys");
        assert!(flatten(&bad).is_empty());
    }

    /// Serialises as `{"me": <itself>}` forever
    struct Cyclic;

    impl Serialize for Cyclic {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            use serde::ser::SerializeMap;
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry("me", self)?;
            map.end()
        }
    }

    #[test]
    fn test_flatten_rejects_self_referential_model() {
        assert!(flatten(&Cyclic).is_empty());
        assert!(flatten(&json!({ "me": { "me": {} } })).contains_key("me"));
    }

    #[test]
    fn test_flatten_rejects_runaway_depth() {
        let mut value = json!("leaf");
        for _ in 0..200 {
            value = json!({ "next": value });
        }
        assert!(flatten_model(&value).is_empty());

        let mut shallow = json!("leaf");
        for _ in 0..10 {
            shallow = json!({ "next": shallow });
        }
        assert!(!flatten_model(&shallow).is_empty());
    }

    #[test]
    fn test_lookup_paths() {
        let model = flatten(&json!({
            "a": { "b": "v" },
            "items": ["x", "y"],
            "rows": [{ "Name": "first" }],
            "word": "héllo"
        }));

        assert_eq!(lookup(&model, "a.b"), Some(json!("v")));
        assert_eq!(lookup(&model, "A.B"), Some(json!("v")));
        assert_eq!(lookup(&model, "a.c"), None);
        assert_eq!(lookup(&model, "items.1"), Some(json!("y")));
        assert_eq!(lookup(&model, "items.2"), None);
        assert_eq!(lookup(&model, "items.length"), Some(json!(2)));
        assert_eq!(lookup(&model, "rows.0.name"), Some(json!("first")));
        assert_eq!(lookup(&model, "word.length"), Some(json!(5)));
        assert_eq!(lookup(&model, "a.b.c"), None);
        assert_eq!(lookup(&model, ""), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(0.0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(is_truthy(Some(&json!([]))));
        assert!(is_truthy(Some(&json!({}))));
        assert!(is_truthy(Some(&json!("0"))));
        assert!(is_truthy(Some(&json!(-1))));
    }

    #[test]
    fn test_loose_equality() {
        assert!(loose_eq(Some(&json!("abc")), "abc"));
        assert!(!loose_eq(Some(&json!("abc")), "ABC"));
        assert!(loose_eq(Some(&json!(5)), "5"));
        assert!(loose_eq(Some(&json!(5)), " 5.0 "));
        assert!(!loose_eq(Some(&json!(5)), "five"));
        assert!(loose_eq(Some(&json!(true)), "true"));
        assert!(loose_eq(Some(&json!(true)), "1"));
        assert!(loose_eq(Some(&json!(false)), "0"));
        assert!(!loose_eq(Some(&json!(false)), "true"));
        assert!(!loose_eq(None, "anything"));
        assert!(!loose_eq(Some(&json!(null)), "null"));
        assert!(loose_eq(Some(&json!(["a", "b"])), "a,b"));
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("x")), "x");
        assert_eq!(value_to_string(&json!(3)), "3");
        assert_eq!(value_to_string(&json!(2.0)), "2");
        assert_eq!(value_to_string(&json!(2.5)), "2.5");
        assert_eq!(value_to_string(&json!(true)), "true");
        assert_eq!(value_to_string(&json!(null)), "null");
        assert_eq!(value_to_string(&json!([1, null, "z"])), "1,,z");
        assert_eq!(value_to_string(&json!({ "k": 1 })), "[object Object]");
    }
}
