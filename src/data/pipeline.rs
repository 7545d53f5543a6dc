//! End-to-end data preparation: archives and workbook in, datasets out.

use tracing::info;

use super::array::{Coord, LabeledArray};
use super::catalog::{self, Catalog};
use super::dataset::{Aggregation, CASE, Dataset, TIME, Variable};
use super::extract::{self, CaseArchives};
use super::national::{self, NationalInputs};
use super::pollution;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::io::export::{self, MetadataReport};
use crate::io::sheets::Workbook;

/// Suffix of the low-ammonia variant cases.
pub const NH3_SUFFIX: &str = "_nh3";

/// Variables carried into the low-ammonia variants; everything else is `NaN`.
const NH3_CARRIED: &[&str] = &["PM25_conc"];

/// One scenario row of `scenarios.csv`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Scenario {
    pub case: String,
    pub description: String,
}

/// Prepared regional and national data with their metadata.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub scenarios: Vec<Scenario>,
    pub regional: Dataset,
    pub national: Dataset,
    pub catalog: Catalog,
}

impl Prepared {
    /// Names of all regional and national variables, sorted and unique.
    pub fn variable_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.regional.names().chain(self.national.names()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Loads inputs from disk, prepares the datasets and writes all CSV
/// outputs to `config.paths.out_dir`.
///
/// # Errors
///
/// Returns the first error of loading, preparation or export.
pub fn run(config: &PipelineConfig) -> Result<(Prepared, MetadataReport)> {
    let cases = extract::load_cases(config)?;
    let workbook = Workbook::open_dir(&config.workbook_dir())?;
    run_with(config, &cases, &workbook)
}

/// Prepares and exports from already opened inputs.
///
/// # Errors
///
/// See [`run`].
pub fn run_with(
    config: &PipelineConfig,
    cases: &[CaseArchives],
    workbook: &Workbook,
) -> Result<(Prepared, MetadataReport)> {
    let prepared = prepare(config, cases, workbook)?;
    let report = export::export_all(&prepared, &config.paths.out_dir)?;
    Ok((prepared, report))
}

/// Builds the regional and national datasets.
///
/// # Errors
///
/// Returns `Config` for an invalid configuration, `MissingSymbol` for an
/// absent archive symbol, `InvalidRegion` for a region label that cannot
/// name an output directory, `LabelMismatch` for misaligned coordinates, and
/// the workbook errors of [`pollution::read_pollution`].
pub fn prepare(config: &PipelineConfig, cases: &[CaseArchives], workbook: &Workbook) -> Result<Prepared> {
    if let Some(err) = config.validate().into_iter().next() {
        return Err(err.into());
    }
    let codes = config.case_codes();
    let found: Vec<String> = cases.iter().map(|c| c.code.clone()).collect();
    if found != codes {
        return Err(PipelineError::label_mismatch(CASE, "loaded archives", &codes, &found));
    }
    let baseline = &config.pipeline.baseline;
    let reference_case = cases
        .iter()
        .find(|c| &c.code == baseline)
        .ok_or_else(|| PipelineError::LabelNotFound {
            axis: CASE.to_string(),
            label: baseline.clone(),
        })?;

    let reference = extract::read_reference(&*reference_case.main, codes, &config.pipeline)?;
    let extraction = extract::extract_all(cases, &reference, &config.pipeline)?;

    let tables = pollution::read_pollution(
        workbook,
        config,
        &reference.index.regions,
        &reference.full_time,
    )?;
    let catalog = extraction.catalog.merge(pm25_catalog());

    let placeholder = LabeledArray::filled(
        vec![Coord::new(TIME, reference.full_time.iter().cloned())],
        f64::NAN,
    );
    let pm_variables = [
        Variable::new("PM25_conc", tables.concentration.clone(), Aggregation::Recompute),
        Variable::new("PM25_exposure", tables.exposure.clone(), Aggregation::Recompute),
        Variable::new("PM25_exposed_frac", placeholder, Aggregation::Recompute),
    ];
    let regional = Dataset::assemble(
        reference.index.clone(),
        extraction.variables.into_iter().chain(pm_variables),
    )?;

    let inputs = NationalInputs {
        auxiliary: &extraction.auxiliary,
        pollution: &tables,
        full_time: &reference.full_time,
        period: reference.period,
    };
    let national = national::aggregate(&regional, &inputs, config)?;

    let mut scenarios: Vec<Scenario> = config
        .cases
        .iter()
        .map(|c| Scenario {
            case: c.code.clone(),
            description: c.description.clone(),
        })
        .collect();

    let (regional, national) = if config.pipeline.nh3_variants {
        let variants: Vec<Scenario> = scenarios.iter().map(nh3_scenario).collect();
        scenarios.extend(variants);
        (with_nh3_variants(&regional)?, with_nh3_variants(&national)?)
    } else {
        (regional, national)
    };

    info!(
        cases = scenarios.len(),
        regions = regional.index().regions.len(),
        variables = regional.len(),
        "prepared datasets"
    );
    Ok(Prepared {
        scenarios,
        regional,
        national,
        catalog,
    })
}

/// Metadata of the variables read from the pollution workbook.
fn pm25_catalog() -> Catalog {
    let mut pm = Catalog::new();
    pm.insert("PM25_conc", catalog::pm25_concentration());
    pm.insert("PM25_exposure", catalog::pm25_exposure());
    pm.insert("PM25_exposed_frac", catalog::pm25_exposed_fraction());
    pm
}

fn nh3_scenario(base: &Scenario) -> Scenario {
    Scenario {
        case: format!("{}{NH3_SUFFIX}", base.case),
        description: format!("{} (with low NH₃ emissions)", base.description),
    }
}

/// Adds a `<case>_nh3` variant of every case. Variants are `NaN` except
/// for the variables in `NH3_CARRIED`, which copy the base case.
///
/// # Errors
///
/// Propagates array errors; none occur for a well-formed dataset.
pub fn with_nh3_variants(ds: &Dataset) -> Result<Dataset> {
    let base = ds.index().cases.clone();
    let variants: Vec<String> = base.iter().map(|c| format!("{c}{NH3_SUFFIX}")).collect();
    let mut out = ds.with_cases(&variants)?;
    for name in NH3_CARRIED {
        let Some(var) = out.get(name) else { continue };
        if !var.data.has_axis(CASE) {
            continue;
        }
        let mut data = var.data.clone();
        for (b, v) in base.iter().zip(&variants) {
            data.copy_sel(CASE, b, v)?;
        }
        out.replace(name, data)?;
    }
    Ok(out)
}
