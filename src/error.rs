//! Error types for the data-preparation pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Pipeline error types.
///
/// Every variant aborts the run; there is no recovery or retry path.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A parameter or set is not present in an archive.
    #[error("symbol `{symbol}` not found in archive `{archive}`")]
    MissingSymbol { archive: String, symbol: String },
    /// An operation referenced an axis the array does not have.
    #[error("array has no axis `{axis}` (axes: {available})")]
    MissingAxis { axis: String, available: String },
    /// A coordinate label was requested that the axis does not carry.
    #[error("label `{label}` not found on axis `{axis}`")]
    LabelNotFound { axis: String, label: String },
    /// Two arrays (or an array and the reference index) disagree on the
    /// labels of a shared axis.
    #[error("labels of axis `{axis}` do not match in {context}: expected [{expected}], found [{found}]")]
    LabelMismatch {
        axis: String,
        context: String,
        expected: String,
        found: String,
    },
    /// A region label cannot be used as an output directory name.
    #[error("region label `{0}` is reserved or not a plain directory name")]
    InvalidRegion(String),
    /// Array data does not fit the declared coordinates.
    #[error("shape error: {0}")]
    Shape(String),
    /// A worksheet header cell does not follow the `year` / `year_tag` convention.
    #[error("worksheet `{sheet}`: unrecognised column header `{header}`")]
    SheetHeader { sheet: String, header: String },
    /// A worksheet cell that should hold a number does not.
    #[error("worksheet `{sheet}` row {row}: `{value}` is not a number")]
    SheetValue {
        sheet: String,
        row: usize,
        value: String,
    },
    /// A worksheet required by the configuration is absent.
    #[error("worksheet `{0}` not found in workbook")]
    MissingSheet(String),
    /// A symbol dump file could not be interpreted.
    #[error("malformed symbol dump {}: {message}", path.display())]
    MalformedDump { path: PathBuf, message: String },
    /// Two pipeline stages produced a variable with the same name.
    #[error("variable `{0}` defined twice")]
    DuplicateVariable(String),
    /// A regional variable has no rule for its national value.
    #[error("no national aggregation rule for variable `{0}`")]
    NoNationalRule(String),
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Filesystem failure.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// CSV read or write failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// JSON encoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Wraps an I/O error with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds a `LabelMismatch` from two label lists.
    pub fn label_mismatch(
        axis: &str,
        context: impl Into<String>,
        expected: &[String],
        found: &[String],
    ) -> Self {
        Self::LabelMismatch {
            axis: axis.to_string(),
            context: context.into(),
            expected: expected.join(", "),
            found: found.join(", "),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
