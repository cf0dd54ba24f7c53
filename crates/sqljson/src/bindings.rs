//! Parameter bindings for path variables
//!
//! Built once per call from the `PASSING` parameters row, then only read.
//! Variables are resolved by name (`$name`) or by their position in the row.

use indexmap::IndexMap;
use thiserror::Error;

use crate::item::Item;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    #[error("duplicate path parameter name: {0}")]
    DuplicateName(String),

    #[error("no value bound to path variable ${0}")]
    Unbound(String),

    #[error("no path parameter at position {0}")]
    UnboundPosition(usize),
}

/// A parameters row: ordered `(name, value)` pairs from the SQL side
pub type ParameterRow = Vec<(String, Item)>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBindings {
    params: IndexMap<String, Item>,
}

impl ParameterBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parameters row, rejecting repeated names
    pub fn from_row(row: ParameterRow) -> Result<Self, BindingError> {
        let mut params = IndexMap::with_capacity(row.len());
        for (name, value) in row {
            if params.contains_key(&name) {
                return Err(BindingError::DuplicateName(name));
            }
            params.insert(name, value);
        }
        Ok(Self { params })
    }

    /// Add or replace a single binding
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Item>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Result<&Item, BindingError> {
        self.params
            .get(name)
            .ok_or_else(|| BindingError::Unbound(name.to_string()))
    }

    pub fn get_index(&self, index: usize) -> Result<&Item, BindingError> {
        self.params
            .get_index(index)
            .map(|(_, value)| value)
            .ok_or(BindingError::UnboundPosition(index))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Name of the first parameter carrying the input-error sentinel
    pub fn first_input_error(&self) -> Option<&str> {
        self.params
            .iter()
            .find(|(_, value)| value.contains_input_error())
            .map(|(name, _)| name.as_str())
    }
}
