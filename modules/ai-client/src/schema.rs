use schemars::{schema_for, JsonSchema};
use serde_json::{Map, Value};

/// JSON Schema for `T`, self-contained so it can be pasted into a prompt.
///
/// `$ref`s into `definitions` are replaced by the definition itself and the
/// `$schema`/`definitions` bookkeeping keys are dropped. Models follow an
/// inlined schema far more reliably than one that points elsewhere.
pub fn prompt_schema<T: JsonSchema>() -> Value {
    let root = schema_for!(T);
    let mut value = serde_json::to_value(root).unwrap_or_default();

    let definitions = match &mut value {
        Value::Object(map) => {
            map.remove("$schema");
            match map.remove("definitions") {
                Some(Value::Object(defs)) => defs,
                _ => Map::new(),
            }
        }
        _ => Map::new(),
    };

    resolve(&mut value, &definitions, 0);
    value
}

const MAX_DEPTH: usize = 32;

fn resolve(value: &mut Value, definitions: &Map<String, Value>, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }
    match value {
        Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix("#/definitions/"))
                .and_then(|name| definitions.get(name))
                .cloned();
            if let Some(def) = target {
                *value = def;
                resolve(value, definitions, depth + 1);
                return;
            }
            for child in map.values_mut() {
                resolve(child, definitions, depth + 1);
            }
        }
        Value::Array(items) => {
            for item in items {
                resolve(item, definitions, depth + 1);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[allow(dead_code)]
    #[derive(JsonSchema)]
    struct Body {
        quote: String,
        score: f64,
    }

    #[allow(dead_code)]
    #[derive(JsonSchema)]
    struct Envelope {
        entries: Vec<BTreeMap<String, Body>>,
    }

    #[test]
    fn nested_definitions_are_inlined() {
        let schema = prompt_schema::<Envelope>();
        let text = serde_json::to_string(&schema).unwrap();

        assert!(!text.contains("$ref"));
        assert!(!text.contains("definitions"));
        assert!(!text.contains("$schema"));
        assert!(text.contains("\"quote\""));
    }
}
