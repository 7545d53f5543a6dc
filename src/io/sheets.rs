//! Workbooks exported as one CSV file per worksheet.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::error::{PipelineError, Result};

/// One worksheet: a title and its raw cells. Blank cells are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub title: String,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Sheet {
    /// Builds a sheet from string cells; empty (after trimming) cells become
    /// `None`.
    pub fn from_rows<R, C>(title: &str, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            title: title.to_string(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|c| cell(c.as_ref())).collect())
                .collect(),
        }
    }

    /// Header row, if any.
    pub fn header(&self) -> &[Option<String>] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }
}

fn cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Ordered collection of worksheets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Reads every `<title>.csv` in `dir` as a worksheet, ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be listed or a file opened, and
    /// `Csv` for unreadable content.
    pub fn open_dir(dir: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))? {
            let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut sheets = Vec::with_capacity(paths.len());
        for path in paths {
            let title = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let file = File::open(&path).map_err(|e| PipelineError::io(&path, e))?;
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(BufReader::new(file));
            let mut rows = Vec::new();
            for record in reader.records() {
                rows.push(record?.iter().map(cell).collect());
            }
            debug!(sheet = %title, rows = rows.len(), "read worksheet");
            sheets.push(Sheet { title, rows });
        }
        Ok(Self { sheets })
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Worksheet by title.
    ///
    /// # Errors
    ///
    /// Returns `MissingSheet` if no worksheet has that title.
    #[cfg(test)]
    pub(crate) fn sheet(&self, title: &str) -> Result<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.title == title)
            .ok_or_else(|| PipelineError::MissingSheet(title.to_string()))
    }
}
