//! API response and query types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::catalog::VarMeta;
use crate::viz::NationalTable;

/// One row of the variable list. Metadata fields are omitted for variables
/// without a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableRecord {
    pub name: String,
    #[serde(flatten)]
    pub meta: Option<VarMeta>,
}

impl VariableRecord {
    pub fn new(name: &str, meta: Option<&VarMeta>) -> Self {
        Self {
            name: name.to_string(),
            meta: meta.cloned(),
        }
    }
}

/// National time series of one case. Missing values are `null`.
#[derive(Debug, Serialize)]
pub struct NationalResponse {
    pub case: String,
    pub time: Vec<String>,
    pub series: BTreeMap<String, Vec<Option<f64>>>,
}

impl NationalResponse {
    /// Collects every series of `case`; `None` if the case is unknown.
    pub fn from_table(table: &NationalTable, case: &str) -> Option<Self> {
        if !table.cases().iter().any(|c| c == case) {
            return None;
        }
        let series = table
            .variables(case)
            .filter_map(|name| {
                let values = table.series(case, name)?;
                let values = values.iter().map(|v| v.is_finite().then_some(*v)).collect();
                Some((name.to_string(), values))
            })
            .collect();
        Some(Self {
            case: case.to_string(),
            time: table.time().to_vec(),
            series,
        })
    }
}

/// Query of the chart endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct VizQuery {
    /// Include the low-NH₃ variants.
    #[serde(default)]
    pub nh3: bool,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog;

    #[test]
    fn variable_record_flattens_metadata() {
        let with = serde_json::to_value(VariableRecord::new("GDP", Some(&catalog::gdp()))).ok();
        let with = with.unwrap_or_default();
        assert_eq!(with["name"], "GDP");
        assert_eq!(with["desc"], "Gross domestic product");

        let without = serde_json::to_value(VariableRecord::new("x", None)).ok().unwrap_or_default();
        assert_eq!(without["name"], "x");
        assert!(without.get("desc").is_none());
    }
}
