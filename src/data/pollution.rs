//! PM₂.₅ tables from the pollution workbook.
//!
//! Column headers name the scenario and year of each column: a bare year
//! (`2010`) belongs to the baseline, `<year>_<tag>` to the case whose sheet
//! tag is `<tag>`. The first column holds region labels.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::array::LabeledArray;
use super::dataset::{CASE, REGION, TIME};
use crate::config::{CaseConfig, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::io::sheets::{Sheet, Workbook};

/// Workbook tables reshaped to `(case, r, t)` arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct PollutionTables {
    /// Province-wide average concentration, aligned to the reference regions.
    pub concentration: LabeledArray,
    /// Population-weighted exposure, aligned to the reference regions.
    pub exposure: LabeledArray,
    /// Remaining sheets by title, with the sheet's own region labels.
    pub others: BTreeMap<String, LabeledArray>,
}

/// Maps a header cell to its `(case, year)`.
///
/// Returns `Ok(None)` for a blank header.
///
/// # Errors
///
/// Returns `SheetHeader` if the cell is neither a year nor `<year>_<tag>`
/// with a known tag.
pub fn parse_header(
    sheet: &str,
    header: Option<&str>,
    cases: &[CaseConfig],
    baseline: &str,
) -> Result<Option<(String, String)>> {
    let Some(header) = header else {
        return Ok(None);
    };
    let bad = || PipelineError::SheetHeader {
        sheet: sheet.to_string(),
        header: header.to_string(),
    };
    let (year, tag) = match header.split_once('_') {
        Some((year, tag)) => (year, Some(tag)),
        None => (header, None),
    };
    if year.is_empty() || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad());
    }
    let case = match tag {
        None => baseline.to_string(),
        Some(tag) => cases
            .iter()
            .find(|c| c.sheet_tag == tag)
            .map(|c| c.code.clone())
            .ok_or_else(bad)?,
    };
    Ok(Some((case, year.to_string())))
}

/// Reshapes one worksheet into a `(case, r, t)` array.
///
/// Rows without a region label and columns with a blank header or no
/// values are dropped. The case axis lists every configured case, in order.
///
/// # Errors
///
/// Returns `SheetHeader` for an unrecognised header and `SheetValue` for a
/// non-numeric cell.
pub fn sheet_to_array(sheet: &Sheet, config: &PipelineConfig) -> Result<LabeledArray> {
    let baseline = &config.pipeline.baseline;
    let columns = sheet
        .header()
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, h)| Ok((i, parse_header(&sheet.title, h.as_deref(), &config.cases, baseline)?)))
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::new();
    for (row_no, row) in sheet.rows.iter().enumerate().skip(1) {
        let Some(Some(region)) = row.first() else {
            continue;
        };
        for (col, key) in &columns {
            let Some((case, year)) = key else { continue };
            let Some(Some(raw)) = row.get(*col) else { continue };
            let value: f64 = raw.parse().map_err(|_| PipelineError::SheetValue {
                sheet: sheet.title.clone(),
                row: row_no + 1,
                value: raw.clone(),
            })?;
            records.push((vec![case.clone(), region.clone(), year.clone()], value));
        }
    }
    debug!(sheet = %sheet.title, cells = records.len(), "reshaped worksheet");

    let dims = [CASE, REGION, TIME].map(str::to_string);
    let array = LabeledArray::from_records(&dims, records)?;
    if array.labels(CASE)?.is_empty() {
        return Err(PipelineError::Shape(format!("worksheet `{}` holds no values", sheet.title)));
    }
    array.reindex(CASE, &config.case_codes())
}

/// Copies the baseline's value at `year` to every case.
///
/// # Errors
///
/// Returns `LabelNotFound` if the array lacks `year` or the baseline.
pub fn fill_placeholder(a: &LabeledArray, baseline: &str, year: &str) -> Result<LabeledArray> {
    let mut plane = a.sel(TIME, year)?;
    for case in a.labels(CASE)?.to_vec() {
        plane.copy_sel(CASE, baseline, &case)?;
    }
    let mut out = a.clone();
    out.assign_sel(TIME, year, &plane)?;
    Ok(out)
}

/// Reads every worksheet, fills the placeholder year and separates the
/// provincial tables from the others.
///
/// # Errors
///
/// Returns `MissingSheet` if a provincial sheet is absent, `LabelMismatch`
/// if it names a region or year outside the reference sets, and the
/// errors of [`sheet_to_array`].
pub fn read_pollution(
    workbook: &Workbook,
    config: &PipelineConfig,
    regions: &[String],
    full_time: &[String],
) -> Result<PollutionTables> {
    let pol = &config.pollution;
    let mut tables = BTreeMap::new();
    for sheet in workbook.sheets() {
        let array = sheet_to_array(sheet, config)?;
        let array = fill_placeholder(&array, &config.pipeline.baseline, &pol.placeholder_year)?;
        tables.insert(sheet.title.clone(), array);
    }

    let mut take = |title: &str| -> Result<LabeledArray> {
        let a = tables
            .remove(title)
            .ok_or_else(|| PipelineError::MissingSheet(title.to_string()))?;
        a.align(REGION, regions, title)?.align(TIME, full_time, title)
    };
    let concentration = take(&pol.concentration_sheet)?;
    let exposure = take(&pol.exposure_sheet)?;
    info!(sheets = workbook.sheets().len(), "merged pollution workbook");
    Ok(PollutionTables {
        concentration,
        exposure,
        others: tables,
    })
}
