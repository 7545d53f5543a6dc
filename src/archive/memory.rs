//! In-memory archives for tests and the synthetic demo data set.

use std::collections::BTreeMap;

use super::{Archive, Parameter};
use crate::error::{PipelineError, Result};

/// Archive holding its symbols in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    name: String,
    parameters: BTreeMap<String, Parameter>,
    sets: BTreeMap<String, Vec<String>>,
}

impl MemoryArchive {
    /// Creates an empty archive.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Adds (or replaces) a parameter from `(labels, value)` records.
    pub fn with_parameter<I, K>(mut self, symbol: &str, dims: &[&str], records: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        let records = records
            .into_iter()
            .map(|(key, v)| (key.into_iter().map(Into::into).collect(), v))
            .collect();
        self.parameters.insert(
            symbol.to_string(),
            Parameter {
                name: symbol.to_string(),
                dims: dims.iter().map(|d| d.to_string()).collect(),
                records,
            },
        );
        self
    }

    /// Adds a zero-dimensional parameter.
    pub fn with_scalar(self, symbol: &str, value: f64) -> Self {
        self.with_parameter(symbol, &[], [(Vec::<String>::new(), value)])
    }

    /// Adds (or replaces) a set.
    pub fn with_set(mut self, symbol: &str, labels: &[&str]) -> Self {
        self.sets.insert(
            symbol.to_string(),
            labels.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    fn missing(&self, symbol: &str) -> PipelineError {
        PipelineError::MissingSymbol {
            archive: self.name.clone(),
            symbol: symbol.to_string(),
        }
    }
}

impl Archive for MemoryArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameter(&self, symbol: &str) -> Result<Parameter> {
        self.parameters
            .get(symbol)
            .cloned()
            .ok_or_else(|| self.missing(symbol))
    }

    fn set(&self, symbol: &str) -> Result<Vec<String>> {
        self.sets.get(symbol).cloned().ok_or_else(|| self.missing(symbol))
    }
}
