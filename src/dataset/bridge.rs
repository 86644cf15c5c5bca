//! Conversion between datasets and the nested mapping shape of a document tree
//!
//! The intermediate shape is a mapping whose entries are either coordinates
//! (a raw array or scalar) or variables (`{dims, data, attrs}`).
//!
//! Fallback policy:
//! - Forward, empty attribute mappings are dropped, as is any nested mapping
//!   that ends up empty. Dataset-level attributes are not emitted.
//! - Reverse, an array coordinate gets a single dimension named after
//!   itself and a scalar coordinate gets none. A variable whose `dims` is
//!   missing or not a sequence gets positional names `dim_0`, `dim_1`, ...
//!   taken from the shape of its data. Ragged data cannot be given a shape
//!   and is rejected.

use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

use super::error::{DatasetError, FormatError};
use super::model::{ArrayValues, AttrValue, Attrs, Dataset, Variable};
use crate::loader::scalar::number_value;

const DIMS: &str = "dims";
const DATA: &str = "data";
const ATTRS: &str = "attrs";

/// Dataset to nested mapping
pub fn dataset_to_mapping(dataset: &Dataset) -> Result<Value, FormatError> {
    let mut out = Map::new();

    for (name, coord) in &dataset.coords {
        coord.check(name)?;
        out.insert(name.clone(), nest(&element_values(&coord.values), &coord.shape));
    }

    for (name, variable) in &dataset.data_vars {
        variable.check(name)?;
        let mut entry = Map::new();
        entry.insert(
            DIMS.to_string(),
            Value::Array(variable.dims.iter().cloned().map(Value::String).collect()),
        );
        entry.insert(
            DATA.to_string(),
            nest(&element_values(&variable.values), &variable.shape),
        );
        entry.insert(ATTRS.to_string(), attrs_to_value(&variable.attrs));
        out.insert(name.clone(), Value::Object(entry));
    }

    Ok(prune_empty(Value::Object(out)))
}

/// Nested mapping to dataset, written to `output` when given
pub fn mapping_to_dataset(doc: &Value, output: Option<&Path>) -> Result<Dataset, DatasetError> {
    let Value::Object(entries) = doc else {
        return Err(FormatError::NotAMapping {
            found: type_name(doc),
        }
        .into());
    };

    let mut coords = Vec::new();
    let mut variables = Vec::new();
    for (name, value) in entries {
        match as_variable(value) {
            Some(fields) => variables.push((name, fields)),
            None => coords.push((name, value)),
        }
    }

    let mut dataset = Dataset::new();
    for (name, value) in coords {
        dataset.add_coord(name, coordinate(name, value)?)?;
    }
    for (name, fields) in variables {
        dataset.add_variable(name, variable(name, fields)?)?;
    }

    if let Some(path) = output {
        debug!("Writing dataset to {}", path.display());
        dataset.write_to(path)?;
    }
    Ok(dataset)
}

/// Drop every nested mapping that is empty once its own children are pruned
pub fn prune_empty(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, prune_empty(value)))
                .filter(|(_, value)| !matches!(value, Value::Object(m) if m.is_empty()))
                .collect(),
        ),
        other => other,
    }
}

/// The fields of an entry shaped like `{dims, data, attrs}`
fn as_variable(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Object(map)
            if map.contains_key(DATA)
                && (map.contains_key(DIMS)
                    || map.keys().all(|k| matches!(k.as_str(), DIMS | DATA | ATTRS))) =>
        {
            Some(map)
        }
        _ => None,
    }
}

fn coordinate(name: &str, value: &Value) -> Result<Variable, FormatError> {
    match value {
        Value::Array(_) => {
            let (shape, values) = infer_array(name, value)?;
            if shape.len() != 1 {
                return Err(FormatError::DimensionMismatch {
                    name: name.to_string(),
                    dims: 1,
                    ndim: shape.len(),
                });
            }
            Variable::new(name, vec![name.to_string()], shape, values, Attrs::new())
        }
        Value::Object(_) => Err(FormatError::InvalidCoordinate {
            name: name.to_string(),
        }),
        scalar => Ok(Variable::scalar(collect_elements(name, &[scalar])?)),
    }
}

fn variable(name: &str, map: &Map<String, Value>) -> Result<Variable, FormatError> {
    let data = map.get(DATA).unwrap_or(&Value::Null);
    let (shape, values) = infer_array(name, data)?;

    let dims = match map.get(DIMS) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(dim) => Ok(dim.clone()),
                _ => Err(FormatError::InvalidDims {
                    name: name.to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(Value::String(dim)) => vec![dim.clone()],
        _ => {
            debug!("Variable '{name}' has no dims, naming them from its shape");
            (0..shape.len()).map(|i| format!("dim_{i}")).collect()
        }
    };

    let attrs = match map.get(ATTRS) {
        None | Some(Value::Null) => Attrs::new(),
        Some(Value::Object(attrs)) => attrs
            .iter()
            .map(|(key, value)| Ok((key.clone(), attr_value(name, key, value)?)))
            .collect::<Result<Attrs, FormatError>>()?,
        Some(other) => {
            return Err(FormatError::UnsupportedAttribute {
                name: name.to_string(),
                attr: ATTRS.to_string(),
                reason: format!("expected a mapping, found {}", type_name(other)),
            });
        }
    };

    Variable::new(name, dims, shape, values, attrs)
}

/// Shape and row-major elements of a (possibly nested) array value
fn infer_array(name: &str, value: &Value) -> Result<(Vec<usize>, ArrayValues), FormatError> {
    let mut shape = Vec::new();
    let mut cursor = value;
    while let Value::Array(items) = cursor {
        shape.push(items.len());
        match items.first() {
            Some(first) => cursor = first,
            None => break,
        }
    }

    let mut leaves = Vec::new();
    flatten(name, value, &shape, 0, &mut leaves)?;
    Ok((shape, collect_elements(name, &leaves)?))
}

fn flatten<'v>(
    name: &str,
    value: &'v Value,
    shape: &[usize],
    depth: usize,
    out: &mut Vec<&'v Value>,
) -> Result<(), FormatError> {
    match (value, shape.get(depth)) {
        (Value::Array(items), Some(&len)) if items.len() == len => {
            for item in items {
                flatten(name, item, shape, depth + 1, out)?;
            }
            Ok(())
        }
        (Value::Array(_), _) => Err(FormatError::RaggedArray {
            name: name.to_string(),
            depth,
        }),
        (_, Some(_)) => Err(FormatError::RaggedArray {
            name: name.to_string(),
            depth,
        }),
        (leaf, None) => {
            out.push(leaf);
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Bool,
    Int,
    Float,
    Text,
}

impl Kind {
    fn of(name: &str, value: &Value) -> Result<Self, FormatError> {
        match value {
            Value::Bool(_) => Ok(Kind::Bool),
            Value::Number(n) if n.as_i64().is_some() => Ok(Kind::Int),
            Value::Number(_) | Value::Null => Ok(Kind::Float),
            Value::String(_) => Ok(Kind::Text),
            other => Err(FormatError::UnsupportedElement {
                name: name.to_string(),
                reason: format!("{} inside array data", type_name(other)),
            }),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Kind::Bool => "boolean",
            Kind::Int => "integer",
            Kind::Float => "float",
            Kind::Text => "text",
        }
    }

    fn join(self, other: Kind, name: &str) -> Result<Kind, FormatError> {
        match (self, other) {
            (a, b) if a == b => Ok(a),
            (Kind::Int, Kind::Float) | (Kind::Float, Kind::Int) => Ok(Kind::Float),
            (a, b) => Err(FormatError::MixedTypes {
                name: name.to_string(),
                first: a.label(),
                second: b.label(),
            }),
        }
    }
}

fn collect_elements(name: &str, leaves: &[&Value]) -> Result<ArrayValues, FormatError> {
    let mut kind: Option<Kind> = None;
    for leaf in leaves {
        let next = Kind::of(name, leaf)?;
        kind = Some(match kind {
            Some(current) => current.join(next, name)?,
            None => next,
        });
    }

    Ok(match kind.unwrap_or(Kind::Float) {
        Kind::Bool => ArrayValues::Bool(leaves.iter().filter_map(|v| v.as_bool()).collect()),
        Kind::Int => ArrayValues::Int(leaves.iter().filter_map(|v| v.as_i64()).collect()),
        Kind::Float => ArrayValues::Float(
            leaves
                .iter()
                .map(|v| v.as_f64().unwrap_or(f64::NAN))
                .collect(),
        ),
        Kind::Text => ArrayValues::Text(
            leaves
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
    })
}

fn element_values(values: &ArrayValues) -> Vec<Value> {
    match values {
        ArrayValues::Float(v) => v.iter().copied().map(number_value).collect(),
        ArrayValues::Int(v) => v.iter().copied().map(Value::from).collect(),
        ArrayValues::Bool(v) => v.iter().copied().map(Value::Bool).collect(),
        ArrayValues::Text(v) => v.iter().cloned().map(Value::String).collect(),
    }
}

fn nest(flat: &[Value], shape: &[usize]) -> Value {
    match shape.split_first() {
        None => flat.first().cloned().unwrap_or(Value::Null),
        Some((&len, rest)) => {
            let stride: usize = rest.iter().product();
            Value::Array(
                (0..len)
                    .map(|i| nest(&flat[i * stride..(i + 1) * stride], rest))
                    .collect(),
            )
        }
    }
}

fn attrs_to_value(attrs: &Attrs) -> Value {
    Value::Object(
        attrs
            .iter()
            .map(|(key, value)| (key.clone(), attr_to_value(value)))
            .collect(),
    )
}

fn attr_to_value(value: &AttrValue) -> Value {
    match value {
        AttrValue::Text(s) => Value::String(s.clone()),
        AttrValue::Int(i) => Value::from(*i),
        AttrValue::Float(f) => number_value(*f),
        AttrValue::Bool(b) => Value::Bool(*b),
        AttrValue::List(items) => Value::Array(items.iter().map(attr_to_value).collect()),
    }
}

fn attr_value(name: &str, attr: &str, value: &Value) -> Result<AttrValue, FormatError> {
    let unsupported = |reason: &str| FormatError::UnsupportedAttribute {
        name: name.to_string(),
        attr: attr.to_string(),
        reason: reason.to_string(),
    };

    match value {
        Value::String(s) => Ok(AttrValue::Text(s.clone())),
        Value::Bool(b) => Ok(AttrValue::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(AttrValue::Int(i)),
            None => n
                .as_f64()
                .map(AttrValue::Float)
                .ok_or_else(|| unsupported("number out of range")),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| attr_value(name, attr, item))
            .collect::<Result<Vec<_>, _>>()
            .map(AttrValue::List),
        Value::Null => Err(unsupported("null")),
        Value::Object(_) => Err(unsupported("nested mapping")),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> Dataset {
        let mut ds = Dataset::new();
        ds.add_coord(
            "height",
            Variable::new(
                "height",
                vec!["height".into()],
                vec![3],
                ArrayValues::Float(vec![10.0, 50.5, 100.0]),
                Attrs::new(),
            )
            .unwrap(),
        )
        .unwrap();
        ds.add_coord(
            "direction",
            Variable::new(
                "direction",
                vec!["direction".into()],
                vec![2],
                ArrayValues::Int(vec![0, 180]),
                Attrs::new(),
            )
            .unwrap(),
        )
        .unwrap();
        ds.add_coord("site", Variable::scalar(ArrayValues::Text(vec!["north".into()])))
            .unwrap();
        ds.add_variable(
            "speed",
            Variable::new(
                "speed",
                vec!["height".into(), "direction".into()],
                vec![3, 2],
                ArrayValues::Float(vec![1.5, 2.5, 3.5, 4.5, 5.5, 6.5]),
                Attrs::new(),
            )
            .unwrap(),
        )
        .unwrap();
        ds
    }

    #[test]
    fn test_forward_emits_coordinates_and_variables() {
        let mapping = dataset_to_mapping(&sample()).unwrap();
        assert_eq!(
            mapping,
            json!({
                "height": [10.0, 50.5, 100.0],
                "direction": [0, 180],
                "site": "north",
                "speed": {
                    "dims": ["height", "direction"],
                    "data": [[1.5, 2.5], [3.5, 4.5], [5.5, 6.5]]
                }
            })
        );
    }

    #[test]
    fn test_forward_keeps_non_empty_attrs() {
        let mut ds = sample();
        ds.data_vars
            .get_mut("speed")
            .unwrap()
            .attrs
            .insert("units".into(), AttrValue::Text("m/s".into()));
        let mapping = dataset_to_mapping(&ds).unwrap();
        assert_eq!(mapping["speed"]["attrs"], json!({"units": "m/s"}));
    }

    #[test]
    fn test_round_trip_without_attrs() {
        let original = sample();
        let mapping = dataset_to_mapping(&original).unwrap();
        let rebuilt = mapping_to_dataset(&mapping, None).unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_reverse_synthesizes_missing_dims() {
        let doc = json!({
            "power": {"data": [[1, 2, 3], [4, 5, 6]]},
            "thrust": {"dims": null, "data": [0.1, 0.2]}
        });
        let ds = mapping_to_dataset(&doc, None).unwrap();
        assert_eq!(ds.data_vars["power"].dims, vec!["dim_0", "dim_1"]);
        assert_eq!(ds.data_vars["power"].shape, vec![2, 3]);
        assert_eq!(ds.data_vars["power"].values, ArrayValues::Int(vec![1, 2, 3, 4, 5, 6]));
        assert_eq!(ds.data_vars["thrust"].dims, vec!["dim_0"]);
        assert!(ds.coords.is_empty());
    }

    #[test]
    fn test_reverse_rejects_dims_mismatch() {
        let doc = json!({"v": {"dims": ["x"], "data": [[1, 2], [3, 4]]}});
        let err = mapping_to_dataset(&doc, None).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Format(FormatError::DimensionMismatch { dims: 1, ndim: 2, .. })
        ));
    }

    #[test]
    fn test_reverse_rejects_ragged_data() {
        let doc = json!({"v": {"dims": ["x", "y"], "data": [[1, 2], [3]]}});
        let err = mapping_to_dataset(&doc, None).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Format(FormatError::RaggedArray { depth: 1, .. })
        ));
    }

    #[test]
    fn test_reverse_checks_coordinate_lengths() {
        let doc = json!({
            "x": [0, 1, 2],
            "v": {"dims": ["x"], "data": [1.0, 2.0]}
        });
        let err = mapping_to_dataset(&doc, None).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Format(FormatError::ConflictingDimension { .. })
        ));
    }

    #[test]
    fn test_reverse_mixed_types() {
        let doc = json!({"x": [1, "two"]});
        let err = mapping_to_dataset(&doc, None).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Format(FormatError::MixedTypes { .. })
        ));
    }

    #[test]
    fn test_reverse_persists_when_output_given() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.bds");
        let doc = json!({
            "x": [0.0, 0.5, 1.0],
            "v": {"dims": ["x"], "data": [1, 2, 3], "attrs": {"units": "kW", "scale": [1, 2]}}
        });

        let ds = mapping_to_dataset(&doc, Some(path.as_path())).unwrap();
        let read = Dataset::read_from(&path).unwrap();
        assert_eq!(read, ds);
        assert_eq!(
            read.data_vars["v"].attrs["scale"],
            AttrValue::List(vec![AttrValue::Int(1), AttrValue::Int(2)])
        );
    }

    #[test]
    fn test_prune_empty_is_recursive() {
        let pruned = prune_empty(json!({"a": {"b": {}}, "c": [{}], "d": 1}));
        assert_eq!(pruned, json!({"c": [{}], "d": 1}));
    }
}
