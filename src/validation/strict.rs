//! Rewrites a schema so object-shaped nodes reject undeclared properties

use serde_json::Value;

/// Keywords whose value is a single sub-schema
const SCHEMA_KEYWORDS: &[&str] = &[
    "items",
    "additionalItems",
    "additionalProperties",
    "not",
    "if",
    "then",
    "else",
    "contains",
    "propertyNames",
    "unevaluatedItems",
];

/// Keywords whose value is a list of sub-schemas
const SCHEMA_LIST_KEYWORDS: &[&str] = &["oneOf", "anyOf", "allOf", "prefixItems"];

/// Keywords whose value maps names to sub-schemas
const SCHEMA_MAP_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "definitions",
    "$defs",
    "dependentSchemas",
];

/// True if the node describes an object: `type: object` (alone or in a type
/// list) or a `properties` keyword
pub fn is_object_schema(schema: &Value) -> bool {
    let Some(map) = schema.as_object() else {
        return false;
    };
    if map.contains_key("properties") {
        return true;
    }
    match map.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t == "object"),
        _ => false,
    }
}

/// Set `additionalProperties: false` on every object-shaped node, recursively
///
/// Descends through property schemas, array item schemas, every branch of
/// the combinators, conditionals and definitions. Applying it twice gives
/// the same tree as applying it once.
pub fn enforce_no_additional_properties(schema: &mut Value) {
    if is_object_schema(schema)
        && let Some(map) = schema.as_object_mut()
    {
        map.insert("additionalProperties".to_string(), Value::Bool(false));
    }

    let Some(map) = schema.as_object_mut() else {
        return;
    };

    for (keyword, value) in map.iter_mut() {
        let keyword = keyword.as_str();
        if SCHEMA_MAP_KEYWORDS.contains(&keyword) {
            if let Some(children) = value.as_object_mut() {
                children.values_mut().for_each(enforce_no_additional_properties);
            }
        } else if SCHEMA_LIST_KEYWORDS.contains(&keyword) {
            if let Some(branches) = value.as_array_mut() {
                branches.iter_mut().for_each(enforce_no_additional_properties);
            }
        } else if SCHEMA_KEYWORDS.contains(&keyword) {
            match value {
                // Draft 4-7 tuple form of `items`
                Value::Array(items) => items.iter_mut().for_each(enforce_no_additional_properties),
                other => enforce_no_additional_properties(other),
            }
        }
    }
}

/// Owned form of [`enforce_no_additional_properties`]
pub fn strictify(mut schema: Value) -> Value {
    enforce_no_additional_properties(&mut schema);
    schema
}
