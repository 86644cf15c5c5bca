//! In-memory dataset model: named coordinates and variables over shared dimensions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::FormatError;

/// Flat, row-major element storage for one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayValues {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
    Text(Vec<String>),
}

impl ArrayValues {
    pub fn len(&self) -> usize {
        match self {
            ArrayValues::Float(v) => v.len(),
            ArrayValues::Int(v) => v.len(),
            ArrayValues::Bool(v) => v.len(),
            ArrayValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ArrayValues::Float(_) => "float",
            ArrayValues::Int(_) => "integer",
            ArrayValues::Bool(_) => "boolean",
            ArrayValues::Text(_) => "text",
        }
    }
}

/// Metadata value attached to a variable or the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<AttrValue>),
}

pub type Attrs = BTreeMap<String, AttrValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub dims: Vec<String>,
    pub shape: Vec<usize>,
    pub values: ArrayValues,
    pub attrs: Attrs,
}

impl Variable {
    /// Build a variable, checking that dims, shape and element count agree
    pub fn new(
        name: &str,
        dims: Vec<String>,
        shape: Vec<usize>,
        values: ArrayValues,
        attrs: Attrs,
    ) -> Result<Self, FormatError> {
        let variable = Self {
            dims,
            shape,
            values,
            attrs,
        };
        variable.check(name)?;
        Ok(variable)
    }

    /// A zero-dimensional variable
    pub fn scalar(values: ArrayValues) -> Self {
        Self {
            dims: Vec::new(),
            shape: Vec::new(),
            values,
            attrs: Attrs::new(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn check(&self, name: &str) -> Result<(), FormatError> {
        if self.dims.len() != self.shape.len() {
            return Err(FormatError::DimensionMismatch {
                name: name.to_string(),
                dims: self.dims.len(),
                ndim: self.shape.len(),
            });
        }
        let expected: usize = self.shape.iter().product();
        if expected != self.values.len() {
            return Err(FormatError::ShapeMismatch {
                name: name.to_string(),
                shape: self.shape.clone(),
                len: self.values.len(),
                expected,
            });
        }
        Ok(())
    }
}

/// Coordinates and data variables sharing a set of named dimensions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub coords: BTreeMap<String, Variable>,
    pub data_vars: BTreeMap<String, Variable>,
    pub attrs: Attrs,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_coord(&mut self, name: &str, variable: Variable) -> Result<(), FormatError> {
        self.check_dims(name, &variable)?;
        self.coords.insert(name.to_string(), variable);
        Ok(())
    }

    pub fn add_variable(&mut self, name: &str, variable: Variable) -> Result<(), FormatError> {
        self.check_dims(name, &variable)?;
        self.data_vars.insert(name.to_string(), variable);
        Ok(())
    }

    /// Length of every dimension used by the dataset
    pub fn dims(&self) -> BTreeMap<String, usize> {
        let mut dims = BTreeMap::new();
        for variable in self.coords.values().chain(self.data_vars.values()) {
            for (dim, len) in variable.dims.iter().zip(&variable.shape) {
                dims.entry(dim.clone()).or_insert(*len);
            }
        }
        dims
    }

    /// Verify every variable and the dimension lengths they share
    pub fn check(&self) -> Result<(), FormatError> {
        let mut seen = Dataset::new();
        for (name, variable) in &self.coords {
            seen.add_coord(name, variable.clone())?;
        }
        for (name, variable) in &self.data_vars {
            seen.add_variable(name, variable.clone())?;
        }
        Ok(())
    }

    fn check_dims(&self, name: &str, variable: &Variable) -> Result<(), FormatError> {
        variable.check(name)?;
        let known = self.dims();
        for (dim, len) in variable.dims.iter().zip(&variable.shape) {
            if let Some(expected) = known.get(dim)
                && expected != len
            {
                return Err(FormatError::ConflictingDimension {
                    dim: dim.clone(),
                    name: name.to_string(),
                    expected: *expected,
                    found: *len,
                });
            }
        }
        Ok(())
    }
}
