//! National time series by case and variable.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::data::dataset::Dataset;
use crate::error::{PipelineError, Result};

/// `(case, variable) → series` over a shared time axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NationalTable {
    time: Vec<String>,
    cases: Vec<String>,
    series: BTreeMap<(String, String), Vec<f64>>,
}

impl NationalTable {
    /// Builds the table from a national dataset.
    pub fn from_dataset(ds: &Dataset) -> Self {
        let time = ds.index().time.clone();
        let cases = ds.index().cases.clone();
        let mut series = BTreeMap::new();
        for case in &cases {
            for name in ds.names() {
                let values = time
                    .iter()
                    .map(|t| ds.value(name, case, None, t).unwrap_or(f64::NAN))
                    .collect();
                series.insert((case.clone(), name.to_string()), values);
            }
        }
        Self { time, cases, series }
    }

    /// Reads `<dir>/<case>.csv` for every case, as written by the exporter.
    ///
    /// # Errors
    ///
    /// Returns `Io` for a missing file, `MalformedDump` for a non-numeric
    /// cell, and `LabelMismatch` if the files disagree on the time steps.
    pub fn load(dir: &Path, cases: &[String]) -> Result<Self> {
        let mut table = Self {
            cases: cases.to_vec(),
            ..Self::default()
        };
        for (i, case) in cases.iter().enumerate() {
            let path = dir.join(format!("{case}.csv"));
            let file = File::open(&path).map_err(|e| PipelineError::io(&path, e))?;
            let mut reader = csv::Reader::from_reader(BufReader::new(file));
            let names: Vec<String> = reader.headers()?.iter().skip(1).map(str::to_string).collect();

            let mut time = Vec::new();
            let mut columns = vec![Vec::new(); names.len()];
            for record in reader.records() {
                let record = record?;
                time.push(record.get(0).unwrap_or_default().to_string());
                for (column, raw) in columns.iter_mut().zip(record.iter().skip(1)) {
                    column.push(parse_cell(raw).ok_or_else(|| PipelineError::MalformedDump {
                        path: path.clone(),
                        message: format!("`{raw}` is not a number"),
                    })?);
                }
            }

            if i == 0 {
                table.time = time;
            } else if time != table.time {
                return Err(PipelineError::label_mismatch("t", case.as_str(), &table.time, &time));
            }
            for (name, values) in names.into_iter().zip(columns) {
                table.series.insert((case.clone(), name), values);
            }
            debug!(case = %case, path = %path.display(), "loaded national table");
        }
        Ok(table)
    }

    pub fn time(&self) -> &[String] {
        &self.time
    }

    pub fn cases(&self) -> &[String] {
        &self.cases
    }

    /// Variable names available for `case`, sorted.
    pub fn variables<'a>(&'a self, case: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.series
            .keys()
            .filter(move |(c, _)| c == case)
            .map(|(_, v)| v.as_str())
    }

    /// Series of `variable` in `case`, aligned with [`NationalTable::time`].
    pub fn series(&self, case: &str, variable: &str) -> Option<&[f64]> {
        self.series
            .get(&(case.to_string(), variable.to_string()))
            .map(Vec::as_slice)
    }
}

fn parse_cell(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() { Some(f64::NAN) } else { raw.parse().ok() }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn load_reads_empty_cells_as_nan() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        fs::write(tmp.path().join("bau.csv"), "t,CO2_emi,NOX_emi\n2010,8000,30\n2015,,32.5\n")
            .expect("fixture write should succeed");
        let table = NationalTable::load(tmp.path(), &["bau".to_string()]).expect("table should load");
        assert_eq!(table.time(), ["2010", "2015"]);
        assert_eq!(table.series("bau", "NOX_emi"), Some([30.0, 32.5].as_slice()));
        let co2 = table.series("bau", "CO2_emi").unwrap_or_default();
        assert!(co2[1].is_nan());
        assert_eq!(table.variables("bau").collect::<Vec<_>>(), vec!["CO2_emi", "NOX_emi"]);
    }

    #[test]
    fn load_rejects_mismatched_time() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        fs::write(tmp.path().join("bau.csv"), "t,x\n2010,1\n").expect("fixture write should succeed");
        fs::write(tmp.path().join("3.csv"), "t,x\n2015,1\n").expect("fixture write should succeed");
        let err = NationalTable::load(tmp.path(), &["bau".to_string(), "3".to_string()])
            .expect_err("time steps differ");
        assert!(matches!(err, PipelineError::LabelMismatch { .. }));
    }

    #[test]
    fn load_rejects_text_cells() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        fs::write(tmp.path().join("bau.csv"), "t,x\n2010,abc\n").expect("fixture write should succeed");
        let err = NationalTable::load(tmp.path(), &["bau".to_string()]).expect_err("abc is not numeric");
        assert!(matches!(err, PipelineError::MalformedDump { .. }));
    }
}
