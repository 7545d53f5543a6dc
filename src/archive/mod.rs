//! Access to model result archives.
//!
//! The model writes one archive per scenario holding named parameters
//! (sparse numeric tables over named domains) and sets (ordered label
//! lists). This module defines the [`Archive`] seam the pipeline reads
//! through; decoding the binary container itself is left to the model's own
//! tooling, which exports each symbol to CSV.

pub mod dump;
pub mod memory;

pub use dump::DumpArchive;
pub use memory::MemoryArchive;

use crate::data::array::LabeledArray;
use crate::error::Result;

/// A named parameter read from an archive.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Symbol name.
    pub name: String,
    /// Domain (axis) names in declaration order.
    pub dims: Vec<String>,
    /// Sparse records: one label per domain, then the value.
    pub records: Vec<(Vec<String>, f64)>,
}

impl Parameter {
    /// Densifies the parameter into a labeled array.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Shape` if a record's arity does not match
    /// the domain count.
    pub fn to_array(&self) -> Result<LabeledArray> {
        LabeledArray::from_records(&self.dims, self.records.iter().cloned())
    }

    /// Value of a scalar (zero-dimensional) parameter.
    pub fn scalar(&self) -> Option<f64> {
        match self.records.as_slice() {
            [(key, value)] if key.is_empty() => Some(*value),
            _ => None,
        }
    }
}

/// Read access to one model archive.
pub trait Archive {
    /// Human-readable archive name used in error messages.
    fn name(&self) -> &str;

    /// Reads a parameter.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingSymbol` if the archive has no such
    /// parameter.
    fn parameter(&self, symbol: &str) -> Result<Parameter>;

    /// Reads the elements of a set, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingSymbol` if the archive has no such set.
    fn set(&self, symbol: &str) -> Result<Vec<String>>;

    /// Reads a parameter and densifies it.
    ///
    /// # Errors
    ///
    /// Propagates [`Archive::parameter`] and [`Parameter::to_array`] errors.
    fn extract(&self, symbol: &str) -> Result<LabeledArray> {
        self.parameter(symbol)?.to_array()
    }
}
