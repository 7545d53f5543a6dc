//! Named collection of aligned variables over a shared index.

use std::collections::BTreeMap;

use super::array::LabeledArray;
use crate::error::{PipelineError, Result};

/// Axis names with a reference coordinate.
pub const CASE: &str = "case";
pub const REGION: &str = "r";
pub const TIME: &str = "t";

/// Reference coordinate labels shared by every variable of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Index {
    pub cases: Vec<String>,
    pub regions: Vec<String>,
    pub time: Vec<String>,
}

impl Index {
    fn labels(&self, axis: &str) -> Option<&[String]> {
        match axis {
            CASE => Some(&self.cases),
            REGION => Some(&self.regions),
            TIME => Some(&self.time),
            _ => None,
        }
    }
}

/// How a regional variable becomes a national one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Summed over regions.
    Sum,
    /// Computed again from national components.
    Recompute,
}

/// One variable held by a [`Dataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub data: LabeledArray,
    pub aggregation: Aggregation,
}

impl Variable {
    pub fn new(name: &str, data: LabeledArray, aggregation: Aggregation) -> Self {
        Self {
            name: name.to_string(),
            data,
            aggregation,
        }
    }
}

/// Variables keyed by name; iteration order is the canonical
/// (lexicographic) column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    index: Index,
    variables: BTreeMap<String, Variable>,
}

impl Dataset {
    pub fn new(index: Index) -> Self {
        Self {
            index,
            variables: BTreeMap::new(),
        }
    }

    /// Builds a dataset from variables.
    ///
    /// # Errors
    ///
    /// See [`Dataset::insert`].
    pub fn assemble(index: Index, variables: impl IntoIterator<Item = Variable>) -> Result<Self> {
        let mut ds = Self::new(index);
        for v in variables {
            ds.insert(v)?;
        }
        Ok(ds)
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Adds a variable, conforming it to the index.
    ///
    /// The time axis is truncated to the index's time labels; the case and
    /// region axes must already equal the index.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateVariable` for a repeated name, `LabelMismatch` if an
    /// indexed axis disagrees with the index, and `Shape` for an axis outside
    /// `{case, r, t}`.
    pub fn insert(&mut self, mut var: Variable) -> Result<()> {
        if self.variables.contains_key(&var.name) {
            return Err(PipelineError::DuplicateVariable(var.name));
        }
        let dims: Vec<String> = var.data.dims().map(str::to_string).collect();
        for axis in &dims {
            let Some(expected) = self.index.labels(axis) else {
                return Err(PipelineError::Shape(format!(
                    "variable `{}` has unindexed axis `{axis}`",
                    var.name
                )));
            };
            let found = var.data.labels(axis)?;
            if axis == TIME {
                if !expected.iter().all(|t| found.contains(t)) {
                    return Err(PipelineError::label_mismatch(axis, &var.name, expected, found));
                }
                if found != expected {
                    var.data = var.data.select(TIME, expected)?;
                }
            } else if found != expected {
                return Err(PipelineError::label_mismatch(axis, &var.name, expected, found));
            }
        }
        self.variables.insert(var.name.clone(), var);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Data of a variable.
    ///
    /// # Errors
    ///
    /// Returns `MissingSymbol` naming the dataset if the variable is absent.
    pub fn data(&self, name: &str) -> Result<&LabeledArray> {
        self.get(name)
            .map(|v| &v.data)
            .ok_or_else(|| PipelineError::MissingSymbol {
                archive: "dataset".to_string(),
                symbol: name.to_string(),
            })
    }

    /// Variable names in canonical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.variables.len()
    }

    /// Value of `name` at one `(case, region, time)` point.
    ///
    /// Selectors for axes the variable does not carry are ignored, so a
    /// time-only variable has the same value in every case and region.
    /// Returns `None` for an unknown variable or label.
    pub fn value(&self, name: &str, case: &str, region: Option<&str>, time: &str) -> Option<f64> {
        let data = &self.get(name)?.data;
        let mut at = Vec::with_capacity(3);
        for axis in data.dims() {
            match axis {
                CASE => at.push((CASE, case)),
                REGION => at.push((REGION, region?)),
                TIME => at.push((TIME, time)),
                _ => return None,
            }
        }
        data.get(&at)
    }

    /// Extends the case axis with `extra` cases filled with `NaN`.
    ///
    /// # Errors
    ///
    /// Propagates reindexing errors from the array layer.
    pub fn with_cases(&self, extra: &[String]) -> Result<Self> {
        let mut index = self.index.clone();
        index.cases.extend(extra.iter().cloned());
        let mut variables = BTreeMap::new();
        for (name, var) in &self.variables {
            let data = if var.data.has_axis(CASE) {
                var.data.reindex(CASE, &index.cases)?
            } else {
                var.data.clone()
            };
            variables.insert(
                name.clone(),
                Variable {
                    data,
                    ..var.clone()
                },
            );
        }
        Ok(Self { index, variables })
    }

    /// Replaces the data of an existing variable, keeping its aggregation.
    ///
    /// # Errors
    ///
    /// Returns `MissingSymbol` if the variable is absent, and the errors of
    /// [`Dataset::insert`] if the new data does not fit the index.
    pub fn replace(&mut self, name: &str, data: LabeledArray) -> Result<()> {
        let var = self.variables.remove(name).ok_or_else(|| PipelineError::MissingSymbol {
            archive: "dataset".to_string(),
            symbol: name.to_string(),
        })?;
        self.insert(Variable { data, ..var })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::array::Coord;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn index() -> Index {
        Index {
            cases: strings(&["bau", "x"]),
            regions: strings(&["BJ", "GD"]),
            time: strings(&["2010", "2015"]),
        }
    }

    fn full(value: f64) -> LabeledArray {
        LabeledArray::filled(
            vec![
                Coord::new(CASE, ["bau", "x"]),
                Coord::new(REGION, ["BJ", "GD"]),
                Coord::new(TIME, ["2010", "2015", "2020"]),
            ],
            value,
        )
    }

    #[test]
    fn insert_truncates_time() {
        let mut ds = Dataset::new(index());
        ds.insert(Variable::new("GDP", full(1.0), Aggregation::Sum))
            .expect("insert should succeed");
        let data = ds.data("GDP").expect("GDP present");
        assert_eq!(data.labels(TIME).ok(), Some(strings(&["2010", "2015"]).as_slice()));
    }

    #[test]
    fn insert_rejects_region_mismatch() {
        let mut ds = Dataset::new(index());
        let data = full(1.0)
            .select(REGION, &["GD", "BJ"])
            .expect("select should succeed");
        let err = ds
            .insert(Variable::new("GDP", data, Aggregation::Sum))
            .expect_err("region order differs");
        assert!(matches!(err, PipelineError::LabelMismatch { .. }));
    }

    #[test]
    fn insert_rejects_duplicate() {
        let mut ds = Dataset::new(index());
        ds.insert(Variable::new("GDP", full(1.0), Aggregation::Sum))
            .expect("first insert should succeed");
        let err = ds
            .insert(Variable::new("GDP", full(2.0), Aggregation::Sum))
            .expect_err("second insert duplicates");
        assert!(matches!(err, PipelineError::DuplicateVariable(_)));
    }

    #[test]
    fn value_ignores_missing_axes() {
        let mut ds = Dataset::new(index());
        let price = LabeledArray::filled(
            vec![Coord::new(CASE, ["bau", "x"]), Coord::new(TIME, ["2010", "2015"])],
            7.0,
        );
        ds.insert(Variable::new("CO2_price", price, Aggregation::Sum))
            .expect("insert should succeed");
        assert_eq!(ds.value("CO2_price", "x", Some("GD"), "2015"), Some(7.0));
        assert_eq!(ds.value("CO2_price", "x", None, "2015"), Some(7.0));
        assert_eq!(ds.value("nope", "x", None, "2015"), None);
    }

    #[test]
    fn with_cases_adds_nan_cases() {
        let mut ds = Dataset::new(index());
        ds.insert(Variable::new("GDP", full(1.0), Aggregation::Sum))
            .expect("insert should succeed");
        let wide = ds.with_cases(&strings(&["bau_nh3"])).expect("extend should succeed");
        assert_eq!(wide.index().cases.len(), 3);
        let v = wide.value("GDP", "bau_nh3", Some("BJ"), "2010");
        assert!(v.is_some_and(f64::is_nan));
        assert_eq!(wide.value("GDP", "bau", Some("BJ"), "2010"), Some(1.0));
    }
}
