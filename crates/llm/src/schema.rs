//! Strict JSON Schema transform.
//!
//! Structured-output validators of some providers only accept "strict"
//! schemas: every object node must forbid undeclared properties and list all
//! of its declared properties as required. [`strictify`] rewrites an
//! arbitrary schema into that dialect.

use serde_json::{Map, Value};

/// Keywords whose value is a map of name to subschema.
const SCHEMA_MAP_KEYWORDS: [&str; 3] = ["properties", "$defs", "definitions"];

/// Keywords whose value is an array of subschemas.
const SCHEMA_LIST_KEYWORDS: [&str; 3] = ["oneOf", "anyOf", "allOf"];

/// Produce the strict form of `schema`.
///
/// For every node typed `object`:
/// - `additionalProperties` is set to `false` when absent; an explicit value
///   is kept.
/// - `required` becomes the union of the existing `required` list and every
///   key of `properties`, deduplicated, existing entries first.
///
/// The walk descends into `properties`, `items`, `oneOf`, `anyOf`, `allOf`,
/// `$defs` and `definitions`. Other nodes are copied unchanged.
///
/// The input is never modified and the result shares nothing with it.
/// Applying the transform twice yields the same tree as applying it once.
///
/// # Example
/// ```
/// use scout_llm::schema::strictify;
/// use serde_json::json;
///
/// let strict = strictify(&json!({
///     "type": "object",
///     "properties": { "name": { "type": "string" } }
/// }));
/// assert_eq!(strict["additionalProperties"], json!(false));
/// assert_eq!(strict["required"], json!(["name"]));
/// ```
pub fn strictify(schema: &Value) -> Value {
    let Value::Object(node) = schema else {
        return schema.clone();
    };

    let mut out = Map::with_capacity(node.len() + 2);

    for (key, value) in node {
        let child = if SCHEMA_MAP_KEYWORDS.contains(&key.as_str()) {
            strictify_map(value)
        } else if SCHEMA_LIST_KEYWORDS.contains(&key.as_str()) {
            strictify_list(value)
        } else if key == "items" {
            // Tuple-style `items` is an array of schemas
            match value {
                Value::Array(_) => strictify_list(value),
                _ => strictify(value),
            }
        } else {
            value.clone()
        };
        out.insert(key.clone(), child);
    }

    if is_object_node(node) {
        if !out.contains_key("additionalProperties") {
            out.insert("additionalProperties".to_string(), Value::Bool(false));
        }
        let required = required_union(node);
        out.insert("required".to_string(), Value::Array(required));
    }

    Value::Object(out)
}

/// Whether a node declares `type: "object"`, alone or within a type list.
fn is_object_node(node: &Map<String, Value>) -> bool {
    match node.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("object")),
        _ => false,
    }
}

fn required_union(node: &Map<String, Value>) -> Vec<Value> {
    let mut required: Vec<String> = Vec::new();

    let existing = node
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);

    let declared = node
        .get("properties")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|props| props.keys().map(String::as_str));

    for name in existing.chain(declared) {
        if !required.iter().any(|r| r == name) {
            required.push(name.to_string());
        }
    }

    required.into_iter().map(Value::String).collect()
}

fn strictify_map(value: &Value) -> Value {
    match value {
        Value::Object(children) => Value::Object(
            children
                .iter()
                .map(|(name, child)| (name.clone(), strictify(child)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn strictify_list(value: &Value) -> Value {
    match value {
        Value::Array(children) => Value::Array(children.iter().map(strictify).collect()),
        other => other.clone(),
    }
}
