//! CSV export of prepared datasets and their metadata.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::data::catalog::Catalog;
use crate::data::dataset::Dataset;
use crate::data::pipeline::{Prepared, Scenario};
use crate::error::{PipelineError, Result};

/// Directory name of the national tables.
pub const NATIONAL_DIR: &str = "national";

/// Variables written without descriptive metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataReport {
    pub missing: Vec<String>,
}

impl MetadataReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

impl fmt::Display for MetadataReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Missing dimension info:")?;
        if self.missing.is_empty() {
            writeln!(f, "  (None)")?;
        }
        for name in &self.missing {
            writeln!(f, "   {name}")?;
        }
        Ok(())
    }
}

/// Formats a value for output: `NaN` is an empty field, everything else
/// uses the shortest representation that parses back to the same `f64`.
pub fn format_value(v: f64) -> String {
    if v.is_nan() { String::new() } else { v.to_string() }
}

/// Writes `scenarios.csv` content.
///
/// # Errors
///
/// Returns `Csv` if writing fails.
pub fn write_scenarios(scenarios: &[Scenario], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);
    wtr.write_record(["case", "description"])?;
    for s in scenarios {
        wtr.write_record([s.case.as_str(), s.description.as_str()])?;
    }
    wtr.flush().map_err(|e| PipelineError::io("scenarios.csv", e))?;
    Ok(())
}

/// Writes `variables.csv` content for `names`, returning the names that
/// have no catalog entry. Such rows are written with empty fields.
///
/// # Errors
///
/// Returns `Csv` if writing fails.
pub fn write_variables<'a>(
    names: impl IntoIterator<Item = &'a str>,
    catalog: &Catalog,
    writer: impl Write,
) -> Result<MetadataReport> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);
    wtr.write_record(["Variable", "desc", "unit_long", "unit_short"])?;
    let mut report = MetadataReport::default();
    for name in names {
        match catalog.get(name) {
            Some(m) => wtr.write_record([name, m.desc.as_str(), m.unit_long.as_str(), m.unit_short.as_str()])?,
            None => {
                report.missing.push(name.to_string());
                wtr.write_record([name, "", "", ""])?;
            }
        }
    }
    wtr.flush().map_err(|e| PipelineError::io("variables.csv", e))?;
    Ok(report)
}

/// Writes one case (and region, for regional data) as a time-indexed table:
/// column `t`, then one column per variable in canonical order.
///
/// # Errors
///
/// Returns `Csv` if writing fails.
pub fn write_table(ds: &Dataset, case: &str, region: Option<&str>, writer: impl Write) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let names: Vec<&str> = ds.names().collect();
    wtr.write_record(std::iter::once("t").chain(names.iter().copied()))?;
    for t in &ds.index().time {
        let mut row = Vec::with_capacity(names.len() + 1);
        row.push(t.clone());
        for name in &names {
            row.push(format_value(ds.value(name, case, region, t).unwrap_or(f64::NAN)));
        }
        wtr.write_record(&row)?;
    }
    wtr.flush().map_err(|e| PipelineError::io("table", e))?;
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(BufWriter::new(file))
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| PipelineError::io(path, e))
}

/// Writes every output below `out_dir`:
///
/// ```text
/// scenarios.csv
/// variables.csv
/// <region>/<case>.csv
/// national/<case>.csv
/// ```
///
/// Writes are not transactional; a failure leaves earlier files in place.
///
/// # Errors
///
/// Returns `Io` or `Csv` for the first failed write.
pub fn export_all(prepared: &Prepared, out_dir: &Path) -> Result<MetadataReport> {
    create_dir(out_dir)?;
    write_scenarios(&prepared.scenarios, create(&out_dir.join("scenarios.csv"))?)?;

    let report = write_variables(prepared.variable_names(), &prepared.catalog, create(&out_dir.join("variables.csv"))?)?;
    if !report.is_complete() {
        warn!(missing = ?report.missing, "variables without metadata");
    }

    let regional = &prepared.regional;
    for region in &regional.index().regions {
        let dir = out_dir.join(region);
        create_dir(&dir)?;
        for case in &regional.index().cases {
            let path = dir.join(format!("{case}.csv"));
            write_table(regional, case, Some(region.as_str()), create(&path)?)?;
        }
    }

    let dir = out_dir.join(NATIONAL_DIR);
    create_dir(&dir)?;
    for case in &prepared.national.index().cases {
        let path = dir.join(format!("{case}.csv"));
        write_table(&prepared.national, case, None, create(&path)?)?;
    }

    info!(
        out_dir = %out_dir.display(),
        regions = regional.index().regions.len(),
        cases = regional.index().cases.len(),
        "wrote CSV outputs"
    );
    Ok(report)
}
