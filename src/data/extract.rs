//! Extraction of model variables from per-case archives.
//!
//! Every quantity is read once per case and the per-case arrays are stacked
//! along a leading `case` axis. Region-domain axes (`rs`) are restricted to
//! the reference region set and renamed `r`; region and time axes are
//! aligned to the reference archive's sets.

use tracing::{debug, info};

use super::array::LabeledArray;
use super::catalog::{self, Catalog, VarMeta};
use super::dataset::{Aggregation, CASE, Index, REGION, TIME, Variable};
use super::indicators::{
    self, FOSSIL, NONFOSSIL, coal_equivalent, convert_energy, parse_year, zero_special,
};
use crate::archive::{Archive, DumpArchive};
use crate::config::{PipelineConfig, PipelineSettings};
use crate::error::{PipelineError, Result};
use crate::io::export::NATIONAL_DIR;

/// Region-domain axis name used by some model parameters.
const REGION_DOMAIN: &str = "rs";

/// Pollutants reported by the model but not published.
const SKIPPED_POLLUTANTS: &[&str] = &["PM10", "PM25"];

/// The two archives of one case.
pub struct CaseArchives {
    pub code: String,
    pub main: Box<dyn Archive>,
    pub extra: Box<dyn Archive>,
}

impl CaseArchives {
    pub fn new(code: &str, main: impl Archive + 'static, extra: impl Archive + 'static) -> Self {
        Self {
            code: code.to_string(),
            main: Box::new(main),
            extra: Box::new(extra),
        }
    }
}

/// Opens the `(main, extra)` dump archives of every configured case, in
/// configuration order.
///
/// # Errors
///
/// Returns `Io` if an archive directory is missing.
pub fn load_cases(config: &PipelineConfig) -> Result<Vec<CaseArchives>> {
    let dir = &config.paths.gdx_dir;
    config
        .cases
        .iter()
        .map(|case| {
            let main = DumpArchive::open(&dir.join(&case.file))?;
            let extra = DumpArchive::open(&dir.join(case.extra_file()))?;
            Ok(CaseArchives::new(&case.code, main, extra))
        })
        .collect()
}

/// Coordinates read from the reference (baseline) archive.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// Output index: cases, regions and time truncated to the horizon.
    pub index: Index,
    /// Full time set, used while computing and before truncation.
    pub full_time: Vec<String>,
    /// Model period length in years.
    pub period: f64,
}

/// Reads the region set, time set and period length from `archive`.
///
/// # Errors
///
/// Returns `MissingSymbol` for an absent set or period, `InvalidRegion` for
/// a region label that cannot name an output directory, and `Shape` if the
/// period is not a scalar or a time label is not a year.
pub fn read_reference(
    archive: &dyn Archive,
    cases: Vec<String>,
    settings: &PipelineSettings,
) -> Result<Reference> {
    let regions = archive.set(&settings.region_set)?;
    if let Some(bad) = regions.iter().find(|r| !is_directory_label(r)) {
        return Err(PipelineError::InvalidRegion(bad.clone()));
    }
    let full_time = archive.set(&settings.time_set)?;
    let horizon = i64::from(settings.horizon);
    let mut time = Vec::new();
    for t in &full_time {
        if i64::from(parse_year(t)?) <= horizon {
            time.push(t.clone());
        }
    }
    let period = archive
        .parameter(&settings.period_symbol)?
        .scalar()
        .ok_or_else(|| {
            PipelineError::Shape(format!("`{}` is not a scalar", settings.period_symbol))
        })?;
    info!(
        archive = archive.name(),
        regions = regions.len(),
        steps = time.len(),
        period,
        "read reference coordinates"
    );
    Ok(Reference {
        index: Index {
            cases,
            regions,
            time,
        },
        full_time,
        period,
    })
}

/// Regional tables are written to one directory per region, next to the
/// national one.
fn is_directory_label(label: &str) -> bool {
    !matches!(label, "" | "." | "..")
        && label != NATIONAL_DIR
        && !label.contains(['/', '\\'])
}

/// Intermediate series needed for national recomputation but not
/// published as regional variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Auxiliary {
    /// GDP over the full time set, `(case, r, t)`.
    pub gdp: LabeledArray,
    /// Coal sector output, `(case, r, t)`.
    pub coal_output: LabeledArray,
    /// National non-fossil share in percent, `(case, t)`.
    pub nonfossil_share_national: LabeledArray,
}

/// Everything read from the archives.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub variables: Vec<Variable>,
    pub catalog: Catalog,
    pub auxiliary: Auxiliary,
}

impl Extraction {
    fn push(&mut self, name: &str, data: LabeledArray, aggregation: Aggregation, meta: Option<VarMeta>) {
        debug!(variable = name, shape = %data, "extracted");
        if let Some(meta) = meta {
            self.catalog.insert(name, meta);
        }
        self.variables.push(Variable::new(name, data, aggregation));
    }
}

/// Per-case extraction context.
struct Extractor<'a> {
    cases: &'a [CaseArchives],
    reference: &'a Reference,
}

impl Extractor<'_> {
    /// Applies `read` to every case and stacks the results along `case`.
    fn per_case(
        &self,
        read: impl Fn(&CaseArchives) -> Result<LabeledArray>,
    ) -> Result<LabeledArray> {
        let arrays = self
            .cases
            .iter()
            .map(|c| read(c).and_then(|a| self.conform(a, &c.code)))
            .collect::<Result<Vec<_>>>()?;
        let arrays = union_labels(arrays)?;
        LabeledArray::concat(CASE, &self.reference.index.cases, &arrays)
    }

    /// Restricts `rs` to the reference regions, then aligns `r` and `t`.
    ///
    /// Every reference region must be present on `rs`; labels outside the
    /// reference set (national aggregates) are dropped.
    fn conform(&self, a: LabeledArray, case: &str) -> Result<LabeledArray> {
        let regions = &self.reference.index.regions;
        let mut a = if a.has_axis(REGION_DOMAIN) {
            let found = a.labels(REGION_DOMAIN)?;
            if regions.iter().any(|r| !found.contains(r)) {
                return Err(PipelineError::label_mismatch(REGION, case, regions, found));
            }
            a.select(REGION_DOMAIN, regions)?.rename(REGION_DOMAIN, REGION)?
        } else {
            a
        };
        if a.has_axis(REGION) {
            a = a.align(REGION, regions, case)?;
        }
        if a.has_axis(TIME) {
            a = a.align(TIME, &self.reference.full_time, case)?;
        }
        Ok(a)
    }

    /// Reads one symbol of one archive, conformed to the reference.
    fn load(&self, archive: &dyn Archive, symbol: &str) -> Result<LabeledArray> {
        self.conform(archive.extract(symbol)?, archive.name())
    }

    fn main(&self, symbol: &str) -> Result<LabeledArray> {
        self.per_case(|c| c.main.extract(symbol))
    }

    fn extra(&self, symbol: &str) -> Result<LabeledArray> {
        self.per_case(|c| c.extra.extract(symbol))
    }
}

/// Gives every array the union of labels on each shared non-indexed axis
/// (e.g. the pollutant or energy type), so sparse archives that omit a
/// label in one case still stack.
fn union_labels(arrays: Vec<LabeledArray>) -> Result<Vec<LabeledArray>> {
    let Some(first) = arrays.first() else {
        return Ok(arrays);
    };
    let axes: Vec<String> = first
        .dims()
        .filter(|d| ![REGION, TIME].contains(d))
        .map(str::to_string)
        .collect();
    let mut out = arrays;
    for axis in axes {
        let mut union: Vec<String> = Vec::new();
        for a in &out {
            for label in a.labels(&axis)? {
                if !union.contains(label) {
                    union.push(label.clone());
                }
            }
        }
        out = out
            .into_iter()
            .map(|a| {
                if a.labels(&axis)? == union.as_slice() {
                    Ok(a)
                } else {
                    a.reindex(&axis, &union)
                }
            })
            .collect::<Result<Vec<_>>>()?;
    }
    Ok(out)
}

/// Extracts every archive-backed variable.
///
/// # Errors
///
/// Returns `MissingSymbol` naming the first absent parameter, and
/// `LabelMismatch` if a case's coordinates disagree with the reference.
pub fn extract_all(
    cases: &[CaseArchives],
    reference: &Reference,
    settings: &PipelineSettings,
) -> Result<Extraction> {
    let x = Extractor { cases, reference };
    let empty = LabeledArray::scalar(f64::NAN);
    let mut out = Extraction {
        variables: Vec::new(),
        catalog: Catalog::new(),
        auxiliary: Auxiliary {
            gdp: empty.clone(),
            coal_output: empty.clone(),
            nonfossil_share_national: empty,
        },
    };

    // GDP and its derived rates
    let gdp = x.main("gdp_ref")?;
    let aagr = indicators::growth_rate(&gdp, TIME, reference.period)?;
    let delta = indicators::delta_vs_baseline(&gdp, &settings.baseline)?;
    out.push("GDP", gdp.clone(), Aggregation::Sum, Some(catalog::gdp()));
    out.push("GDP_aagr", aagr, Aggregation::Recompute, Some(catalog::gdp_aagr()));
    out.push(
        "GDP_delta",
        delta,
        Aggregation::Recompute,
        Some(catalog::gdp_delta(&settings.baseline)),
    );

    // CO2 emissions: sectoral plus household
    let co2 = x.per_case(|c| {
        x.load(&*c.main, "sectem")?
            .sum("g")?
            .add(&x.load(&*c.main, "houem")?)
    })?;
    out.push("CO2_emi", co2, Aggregation::Sum, Some(catalog::co2_emissions()));

    // Air pollutant emissions, one variable per pollutant
    let urban = x.per_case(|c| x.load(&*c.main, "urban")?.sum("*"))?;
    for pollutant in urban.labels("urb")?.to_vec() {
        if SKIPPED_POLLUTANTS.contains(&pollutant.as_str()) {
            continue;
        }
        out.push(
            &format!("{pollutant}_emi"),
            urban.sel("urb", &pollutant)?,
            Aggregation::Sum,
            Some(catalog::pollutant_emissions(&pollutant)),
        );
    }

    out.push("CO2_price", x.extra("ptcarb_t")?, Aggregation::Sum, Some(catalog::co2_price()));
    out.push("cons", x.extra("cons_t")?, Aggregation::Sum, Some(catalog::consumption()));

    // Primary energy in coal equivalent
    let factor = settings.nonfossil_factor;
    let energy = zero_special(&x.extra("pe_t")?);
    let converted = convert_energy(&energy, "e", |l| coal_equivalent(l, factor))?;
    for label in converted.labels("e")?.to_vec() {
        out.push(
            &format!("{label}_energy"),
            converted.sel("e", &label)?,
            Aggregation::Sum,
            catalog::primary_energy(&label),
        );
    }
    let fossil = energy.reindex("e", &to_strings(FOSSIL))?.sum("e")?.map(zero_nan);
    let nonfossil = energy
        .reindex("e", &to_strings(NONFOSSIL))?
        .sum("e")?
        .map(zero_nan)
        .scale(factor);
    let total = fossil.add(&nonfossil)?;
    let share = indicators::share(&nonfossil, &total)?;
    out.push("energy_fossil", fossil, Aggregation::Sum, Some(catalog::energy_fossil()));
    out.push("energy_nonfossil", nonfossil, Aggregation::Sum, Some(catalog::energy_nonfossil()));
    out.push("energy_total", total, Aggregation::Sum, Some(catalog::energy_total()));
    out.push(
        "penergy_nonfossil_share",
        share,
        Aggregation::Recompute,
        Some(catalog::nonfossil_share()),
    );

    // Model-reported non-fossil share
    out.push(
        "energy_nonfossil_share",
        x.extra("nhw_share")?.scale(100.0),
        Aggregation::Recompute,
        Some(catalog::nonfossil_share()),
    );
    let nonfossil_share_national = x.extra("nhw_share_CN")?.scale(100.0);

    // Population: 2007 level times index, in millions
    let pop = x.per_case(|c| {
        let base = x.load(&*c.main, "pop2007")?.sel("g", "c")?;
        Ok(base.mul(&x.load(&*c.main, "pop")?)?.scale(1e-2))
    })?;
    out.push("pop", pop, Aggregation::Sum, Some(catalog::population()));

    // Coal output share of GDP
    let coal_output = x.per_case(|c| x.load(&*c.main, "sect_prod")?.sel("g", "COL"))?;
    // each case against its own output, not the baseline's
    let coal_share = indicators::share(&coal_output, &gdp)?;
    out.push("COL_share", coal_share, Aggregation::Recompute, Some(catalog::coal_share()));

    out.auxiliary = Auxiliary {
        gdp,
        coal_output,
        nonfossil_share_national,
    };
    info!(variables = out.variables.len(), cases = cases.len(), "extracted archive variables");
    Ok(out)
}

/// Sum over an empty label set is `NaN`; energy totals treat it as zero.
fn zero_nan(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v }
}

fn to_strings(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}
