//! Archives exported as one CSV file per symbol.
//!
//! Layout of a dump directory:
//!
//! ```text
//! result_urban_exo/
//!   gdp_ref.csv     "rs","t","Val"
//!   lp.csv          "Val"
//!   r.csv           "r"   (one element per row; extra columns ignored)
//! ```
//!
//! Parameter files list their domain names in the header followed by a
//! value column named `Val` or `value`. Set files carry the element labels
//! in their first column.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Archive, Parameter};
use crate::error::{PipelineError, Result};

/// Accepted names of the value column.
const VALUE_COLUMNS: &[&str] = &["Val", "value"];

/// Archive backed by a directory of symbol dumps.
#[derive(Debug, Clone)]
pub struct DumpArchive {
    name: String,
    dir: PathBuf,
}

impl DumpArchive {
    /// Opens a dump directory.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Io` if `dir` is not a readable directory.
    pub fn open(dir: &Path) -> Result<Self> {
        let meta = std::fs::metadata(dir).map_err(|e| PipelineError::io(dir, e))?;
        if !meta.is_dir() {
            return Err(PipelineError::io(
                dir,
                std::io::Error::new(std::io::ErrorKind::NotADirectory, "archive dump must be a directory"),
            ));
        }
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        debug!(archive = %name, "opened archive dump");
        Ok(Self {
            name,
            dir: dir.to_path_buf(),
        })
    }

    fn symbol_reader(&self, symbol: &str) -> Result<(PathBuf, csv::Reader<BufReader<File>>)> {
        let path = self.dir.join(format!("{symbol}.csv"));
        if !path.is_file() {
            return Err(PipelineError::MissingSymbol {
                archive: self.name.clone(),
                symbol: symbol.to_string(),
            });
        }
        let file = File::open(&path).map_err(|e| PipelineError::io(&path, e))?;
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));
        Ok((path, reader))
    }
}

impl Archive for DumpArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameter(&self, symbol: &str) -> Result<Parameter> {
        let (path, mut reader) = self.symbol_reader(symbol)?;
        let headers = reader.headers()?.clone();
        let Some(last) = headers.iter().last() else {
            return Err(PipelineError::MalformedDump {
                path,
                message: "empty header".to_string(),
            });
        };
        if !VALUE_COLUMNS.contains(&last) {
            return Err(PipelineError::MalformedDump {
                path,
                message: format!("last column is `{last}`, expected one of {VALUE_COLUMNS:?}"),
            });
        }
        let dims: Vec<String> = headers
            .iter()
            .take(headers.len() - 1)
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let raw = record.get(dims.len()).unwrap_or("");
            let value = parse_value(raw).ok_or_else(|| PipelineError::MalformedDump {
                path: path.clone(),
                message: format!("row {}: `{raw}` is not a number", row + 1),
            })?;
            let key = record.iter().take(dims.len()).map(str::to_string).collect();
            records.push((key, value));
        }

        debug!(archive = %self.name, symbol, records = records.len(), "read parameter");
        Ok(Parameter {
            name: symbol.to_string(),
            dims,
            records,
        })
    }

    fn set(&self, symbol: &str) -> Result<Vec<String>> {
        let (_, mut reader) = self.symbol_reader(symbol)?;
        let mut labels = Vec::new();
        for record in reader.records() {
            if let Some(label) = record?.get(0) {
                labels.push(label.to_string());
            }
        }
        Ok(labels)
    }
}

/// Parses a dumped value, mapping the model's special values.
///
/// `Eps` is the model's explicit zero; `NA`, `Undf` and the infinities are
/// kept as non-finite values for later masking.
fn parse_value(raw: &str) -> Option<f64> {
    match raw.to_ascii_lowercase().as_str() {
        "eps" => Some(0.0),
        "na" | "undf" | "" => Some(f64::NAN),
        "inf" | "+inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        other => other.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).expect("fixture write should succeed");
    }

    #[test]
    fn reads_parameter_with_domains() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        write(tmp.path(), "gdp_ref.csv", "\"rs\",\"t\",\"Val\"\nBJ,2010,10.5\nGD,2010,20\n");
        let archive = DumpArchive::open(tmp.path()).expect("dump should open");
        let p = archive.parameter("gdp_ref").expect("parameter should read");
        assert_eq!(p.dims, vec!["rs", "t"]);
        assert_eq!(p.records.len(), 2);
        assert_eq!(p.records[0], (vec!["BJ".to_string(), "2010".to_string()], 10.5));
    }

    #[test]
    fn reads_scalar_and_set() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        write(tmp.path(), "lp.csv", "Val\n5\n");
        write(tmp.path(), "t.csv", "t,Text\n2007,\n2010,\n");
        let archive = DumpArchive::open(tmp.path()).expect("dump should open");
        assert_eq!(archive.parameter("lp").ok().and_then(|p| p.scalar()), Some(5.0));
        assert_eq!(archive.set("t").ok(), Some(vec!["2007".to_string(), "2010".to_string()]));
    }

    #[test]
    fn missing_symbol_names_the_variable() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        let archive = DumpArchive::open(tmp.path()).expect("dump should open");
        let err = archive.parameter("sectem").expect_err("symbol is absent");
        assert!(err.to_string().contains("sectem"), "error should name symbol: {err}");
        assert!(matches!(err, PipelineError::MissingSymbol { .. }));
    }

    #[test]
    fn special_values_are_mapped() {
        assert_eq!(parse_value("Eps"), Some(0.0));
        assert!(parse_value("NA").is_some_and(f64::is_nan));
        assert_eq!(parse_value("+Inf"), Some(f64::INFINITY));
        assert_eq!(parse_value("1e3"), Some(1000.0));
        assert_eq!(parse_value("abc"), None);
    }

    #[test]
    fn rejects_unknown_value_column() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        write(tmp.path(), "bad.csv", "r,amount\nBJ,1\n");
        let archive = DumpArchive::open(tmp.path()).expect("dump should open");
        let err = archive.parameter("bad").expect_err("value column is wrong");
        assert!(matches!(err, PipelineError::MalformedDump { .. }));
    }
}
