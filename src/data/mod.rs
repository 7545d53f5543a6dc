//! Labeled arrays, variable extraction and indicator computation.

pub mod array;
pub mod catalog;
pub mod dataset;
pub mod extract;
pub mod indicators;
pub mod national;
pub mod pipeline;
pub mod pollution;

pub use array::{Coord, LabeledArray};
pub use catalog::{Catalog, VarMeta};
pub use dataset::{Aggregation, Dataset, Index, Variable};
pub use pipeline::{Prepared, Scenario};
