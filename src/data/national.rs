//! National aggregates.
//!
//! Additive variables are summed over regions. Ratios cannot be summed, so
//! they are recomputed from the national components. PM₂.₅ series come from
//! the workbook's national row and an external exposure table.

use tracing::info;

use super::array::{Coord, LabeledArray};
use super::dataset::{Aggregation, CASE, Dataset, Index, REGION, TIME, Variable};
use super::extract::Auxiliary;
use super::indicators::{self, interpolate_years};
use super::pollution::PollutionTables;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

/// Inputs to national aggregation beyond the regional dataset.
pub struct NationalInputs<'a> {
    pub auxiliary: &'a Auxiliary,
    pub pollution: &'a PollutionTables,
    pub full_time: &'a [String],
    pub period: f64,
}

/// Computes the national dataset from the regional one.
///
/// # Errors
///
/// Returns `NoNationalRule` for a recomputed variable without a rule,
/// `MissingSheet` if a national PM₂.₅ sheet is absent, and `LabelNotFound`
/// if its national row is missing.
pub fn aggregate(regional: &Dataset, inputs: &NationalInputs<'_>, config: &PipelineConfig) -> Result<Dataset> {
    let index = Index {
        regions: Vec::new(),
        ..regional.index().clone()
    };
    let baseline = &config.pipeline.baseline;
    let national_gdp = inputs.auxiliary.gdp.sum(REGION)?;
    let sum = |name: &str| -> Result<LabeledArray> { regional.data(name)?.sum(REGION) };

    let mut national = Dataset::new(index);
    for var in regional.variables() {
        let data = if !var.data.has_axis(REGION) && var.aggregation == Aggregation::Sum {
            var.data.clone()
        } else if var.aggregation == Aggregation::Sum {
            var.data.sum(REGION)?
        } else {
            match var.name.as_str() {
                "GDP_aagr" => indicators::growth_rate(&national_gdp, TIME, inputs.period)?,
                "GDP_delta" => indicators::delta_vs_baseline(&national_gdp, baseline)?,
                "penergy_nonfossil_share" => {
                    indicators::share(&sum("energy_nonfossil")?, &sum("energy_total")?)?
                }
                "COL_share" => {
                    indicators::share(&inputs.auxiliary.coal_output.sum(REGION)?, &national_gdp)?
                }
                "energy_nonfossil_share" => inputs.auxiliary.nonfossil_share_national.clone(),
                "PM25_conc" => pm_national(inputs, config, &config.pollution.national_concentration_sheet)?,
                "PM25_exposure" => pm_national(inputs, config, &config.pollution.national_exposure_sheet)?,
                "PM25_exposed_frac" => exposed_fraction(config, &regional.index().cases, inputs.full_time)?,
                other => return Err(PipelineError::NoNationalRule(other.to_string())),
            }
        };
        national.insert(Variable::new(&var.name, data, var.aggregation))?;
    }
    info!(variables = national.len(), "computed national aggregates");
    Ok(national)
}

/// National PM₂.₅ from a region-level sheet's national row, with the
/// missing years filled by interpolation.
fn pm_national(inputs: &NationalInputs<'_>, config: &PipelineConfig, sheet: &str) -> Result<LabeledArray> {
    let pol = &config.pollution;
    let table = inputs
        .pollution
        .others
        .get(sheet)
        .ok_or_else(|| PipelineError::MissingSheet(sheet.to_string()))?;
    let row = table
        .sel(REGION, &pol.national_region)?
        .align(TIME, inputs.full_time, sheet)?;
    interpolate_years(&row, TIME, &pol.interpolate_from, &pol.interpolate_to)
}

/// National exposed-population fraction from the configured table, with
/// the placeholder year copied from the baseline.
fn exposed_fraction(config: &PipelineConfig, cases: &[String], full_time: &[String]) -> Result<LabeledArray> {
    let mut out = LabeledArray::filled(
        vec![Coord::new(CASE, cases.iter().cloned()), Coord::new(TIME, full_time.iter().cloned())],
        f64::NAN,
    );
    for entry in &config.pollution.exposed_fraction {
        out.set(&[(CASE, entry.case.as_str()), (TIME, entry.year.as_str())], entry.value)?;
    }
    let year = &config.pollution.placeholder_year;
    let baseline_value = out
        .get(&[(CASE, config.pipeline.baseline.as_str()), (TIME, year.as_str())])
        .unwrap_or(f64::NAN);
    for case in cases {
        out.set(&[(CASE, case.as_str()), (TIME, year.as_str())], baseline_value)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::config::ExposedFraction;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn config() -> PipelineConfig {
        let mut cfg = PipelineConfig::cop21();
        cfg.cases.truncate(2);
        cfg.pollution.exposed_fraction = vec![
            ExposedFraction {
                case: "bau".to_string(),
                year: "2010".to_string(),
                value: 66.0,
            },
            ExposedFraction {
                case: "3".to_string(),
                year: "2030".to_string(),
                value: 70.0,
            },
        ];
        cfg
    }

    fn crt(values: [[f64; 2]; 2]) -> LabeledArray {
        // case x r, single time step
        let mut records = Vec::new();
        for (ci, case) in ["bau", "3"].iter().enumerate() {
            for (ri, region) in ["BJ", "GD"].iter().enumerate() {
                records.push((strings(&[*case, *region, "2010"]), values[ci][ri]));
            }
        }
        LabeledArray::from_records(&strings(&["case", "r", "t"]), records).expect("records should build")
    }

    #[test]
    fn exposed_fraction_fills_placeholder_from_baseline() {
        let cfg = config();
        let cases = strings(&["bau", "3"]);
        let time = strings(&["2007", "2010", "2030"]);
        let a = exposed_fraction(&cfg, &cases, &time).expect("table should build");
        assert_eq!(a.get(&[("case", "3"), ("t", "2010")]), Some(66.0));
        assert_eq!(a.get(&[("case", "3"), ("t", "2030")]), Some(70.0));
        assert!(a.get(&[("case", "bau"), ("t", "2030")]).is_some_and(f64::is_nan));
    }

    #[test]
    fn shares_are_recomputed_not_averaged() {
        let cfg = config();
        let index = Index {
            cases: strings(&["bau", "3"]),
            regions: strings(&["BJ", "GD"]),
            time: strings(&["2010"]),
        };
        let nonfossil = crt([[1.0, 9.0], [2.0, 2.0]]);
        let total = crt([[10.0, 90.0], [4.0, 16.0]]);
        let share = indicators::share(&nonfossil, &total).expect("share should compute");
        let regional = Dataset::assemble(
            index,
            [
                Variable::new("energy_nonfossil", nonfossil, Aggregation::Sum),
                Variable::new("energy_total", total, Aggregation::Sum),
                Variable::new("penergy_nonfossil_share", share, Aggregation::Recompute),
            ],
        )
        .expect("dataset should assemble");

        let gdp = crt([[1.0, 1.0], [1.0, 1.0]]);
        let auxiliary = Auxiliary {
            gdp: gdp.clone(),
            coal_output: gdp,
            nonfossil_share_national: LabeledArray::scalar(f64::NAN),
        };
        let pollution = PollutionTables {
            concentration: LabeledArray::scalar(f64::NAN),
            exposure: LabeledArray::scalar(f64::NAN),
            others: BTreeMap::new(),
        };
        let time = strings(&["2010"]);
        let inputs = NationalInputs {
            auxiliary: &auxiliary,
            pollution: &pollution,
            full_time: &time,
            period: 5.0,
        };
        let national = aggregate(&regional, &inputs, &cfg).expect("aggregation should succeed");

        // case 3: (2 + 2) / (4 + 16) = 20%, while the regional shares 50% and 12.5% average 31.25%
        assert_eq!(national.value("penergy_nonfossil_share", "3", None, "2010"), Some(20.0));
        assert_eq!(national.value("energy_total", "3", None, "2010"), Some(20.0));
        assert_eq!(national.value("penergy_nonfossil_share", "bau", None, "2010"), Some(10.0));
    }

    #[test]
    fn unknown_recomputed_variable_is_an_error() {
        let cfg = config();
        let index = Index {
            cases: strings(&["bau", "3"]),
            regions: strings(&["BJ", "GD"]),
            time: strings(&["2010"]),
        };
        let regional = Dataset::assemble(
            index,
            [Variable::new("mystery_ratio", crt([[1.0; 2]; 2]), Aggregation::Recompute)],
        )
        .expect("dataset should assemble");
        let aux = Auxiliary {
            gdp: crt([[1.0; 2]; 2]),
            coal_output: crt([[1.0; 2]; 2]),
            nonfossil_share_national: LabeledArray::scalar(f64::NAN),
        };
        let pollution = PollutionTables {
            concentration: LabeledArray::scalar(f64::NAN),
            exposure: LabeledArray::scalar(f64::NAN),
            others: BTreeMap::new(),
        };
        let time = strings(&["2010"]);
        let inputs = NationalInputs {
            auxiliary: &aux,
            pollution: &pollution,
            full_time: &time,
            period: 5.0,
        };
        let err = aggregate(&regional, &inputs, &cfg).expect_err("no rule for mystery_ratio");
        assert!(matches!(err, PipelineError::NoNationalRule(_)));
    }
}
