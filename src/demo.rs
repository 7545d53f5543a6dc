//! Synthetic inputs for the `demo` preset.
//!
//! Builds in-memory archives and a pollution workbook shaped like the real
//! model output, so the whole pipeline can run without model results on
//! disk. Values follow simple growth paths with seeded noise; they are
//! plausible in magnitude and nothing more.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::info;

use crate::archive::MemoryArchive;
use crate::config::{CaseConfig, PipelineConfig};
use crate::data::extract::CaseArchives;
use crate::io::sheets::{Sheet, Workbook};

/// Default seed of the demo data set.
pub const DEFAULT_SEED: u64 = 2015;

/// Provinces of the demo region set.
pub const REGIONS: &[&str] = &["BJ", "GD", "JS", "SC"];

/// Model years of the demo time set.
pub const YEARS: &[u32] = &[2007, 2010, 2015, 2020, 2025, 2030, 2035];

const BASE_YEAR: u32 = 2007;
const POLICY_YEAR: u32 = 2010;
const PERIOD: f64 = 5.0;

/// 2007 GDP (billion yuan) and population (millions) per region.
const REGION_PROFILE: &[(f64, f64)] = &[(1_000.0, 16.3), (3_100.0, 94.5), (2_600.0, 76.3), (1_050.0, 81.3)];

const SECTORS: &[(&str, f64)] = &[("COL", 0.12), ("ELE", 0.46), ("IND", 0.32), ("SER", 0.10)];
const SOURCES: &[&str] = &["ELE", "IND", "HOU"];
const POLLUTANTS: &[(&str, f64)] = &[("SO2", 4.5e-3), ("NOX", 3.8e-3), ("PM10", 1.9e-3), ("PM25", 1.2e-3)];
const ENERGY_MIX: &[(&str, f64)] = &[
    ("COL", 0.70),
    ("GAS", 0.04),
    ("OIL", 0.18),
    ("NUC", 0.01),
    ("WND", 0.02),
    ("SOL", 0.01),
    ("HYD", 0.04),
];
const PM_AREAS: &[&str] = &["North", "South"];

const HOUSEHOLD_CO2: f64 = 0.1;
const COAL_OUTPUT_SHARE: f64 = 0.035;
const CONSUMPTION_SHARE: f64 = 0.45;
const CO2_INTENSITY: f64 = 0.9;
const NOISE: f64 = 0.04;

/// In-memory archives for every configured case plus the workbook.
pub struct DemoData {
    pub cases: Vec<CaseArchives>,
    pub workbook: Workbook,
}

/// Scenario levers derived from a case code such as `4_lo`: the yearly
/// carbon-intensity cut after 2010 and whether GDP grows more slowly.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Levers {
    cut: f64,
    low_growth: bool,
}

impl Levers {
    fn from_code(code: &str) -> Self {
        let mut parts = code.split('_');
        let cut = parts
            .next()
            .and_then(|p| p.parse::<f64>().ok())
            .map_or(0.0, |pct| pct / 100.0);
        Self {
            cut,
            low_growth: parts.any(|p| p == "lo"),
        }
    }

    fn gdp_growth(self) -> f64 {
        if self.low_growth { 0.06 } else { 0.07 }
    }

    /// Multiplier on the baseline carbon intensity in `year`.
    fn intensity(self, year: u32) -> f64 {
        let bau = 0.98_f64.powf(years_since(year, BASE_YEAR));
        bau * (1.0 - self.cut).powf(years_since(year, POLICY_YEAR))
    }

    fn nonfossil_boost(self, year: u32) -> f64 {
        1.0 + 10.0 * self.cut * years_since(year, POLICY_YEAR) / 20.0
    }
}

fn years_since(year: u32, from: u32) -> f64 {
    f64::from(year.saturating_sub(from))
}

/// Seeded multiplicative noise.
struct Noise(StdRng);

impl Noise {
    fn sample(&mut self) -> f64 {
        1.0 + NOISE * (self.0.random::<f64>() - 0.5)
    }
}

/// Regional model outputs of one case in one year.
#[derive(Debug, Clone, Copy)]
struct Cell {
    gdp: f64,
    co2: f64,
    energy: f64,
    nonfossil_boost: f64,
    population: f64,
}

fn cell(levers: Levers, region: usize, year: u32, noise: &mut Noise) -> Cell {
    let (gdp0, pop0) = REGION_PROFILE[region];
    let t = years_since(year, BASE_YEAR);
    let policy_drag = 1.0 - 0.2 * levers.cut * years_since(year, POLICY_YEAR) / 20.0;
    let gdp = gdp0 * (1.0 + levers.gdp_growth()).powf(t) * policy_drag * noise.sample();
    let co2 = gdp * CO2_INTENSITY * levers.intensity(year) * noise.sample();
    Cell {
        gdp,
        co2,
        energy: co2 / 2.4,
        nonfossil_boost: levers.nonfossil_boost(year),
        population: pop0 * 1.005_f64.powf(t),
    }
}

fn key<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Builds the `(main, extra)` archives of one case.
fn case_archives(config: &PipelineConfig, case: &CaseConfig, noise: &mut Noise) -> CaseArchives {
    let settings = &config.pipeline;
    let levers = Levers::from_code(&case.code);
    let years: Vec<String> = YEARS.iter().map(u32::to_string).collect();
    let year_refs: Vec<&str> = years.iter().map(String::as_str).collect();

    let mut gdp = Vec::new();
    let mut sectem = Vec::new();
    let mut houem = Vec::new();
    let mut urban = Vec::new();
    let mut pop2007 = Vec::new();
    let mut pop = Vec::new();
    let mut sect_prod = Vec::new();
    let mut cons = Vec::new();
    let mut pe = Vec::new();
    let mut nhw_share = Vec::new();
    let mut national_energy = vec![(0.0, 0.0); YEARS.len()];

    for (ri, region) in REGIONS.iter().copied().enumerate() {
        pop2007.push((key(["c", region]), REGION_PROFILE[ri].1));
        for (yi, (&year, &t)) in YEARS.iter().zip(&year_refs).enumerate() {
            let c = cell(levers, ri, year, noise);
            gdp.push((key([region, t]), c.gdp));
            houem.push((key([region, t]), c.co2 * HOUSEHOLD_CO2));
            for &(sector, share) in SECTORS {
                sectem.push((key([sector, region, t]), c.co2 * (1.0 - HOUSEHOLD_CO2) * share));
            }
            for &(pollutant, rate) in POLLUTANTS {
                let total = c.co2 * rate * 0.97_f64.powf(years_since(year, BASE_YEAR));
                for &source in SOURCES {
                    urban.push((key([source, region, t, pollutant]), total / SOURCES.len() as f64));
                }
            }
            pop.push((key([region, t]), 100.0 * c.population / REGION_PROFILE[ri].1));
            sect_prod.push((key(["COL", region, t]), c.gdp * COAL_OUTPUT_SHARE * levers.intensity(year)));
            sect_prod.push((key(["SER", region, t]), c.gdp * 0.4));
            cons.push((key([region, t]), c.gdp * CONSUMPTION_SHARE * noise.sample()));

            let mut fossil = 0.0;
            let mut nonfossil = 0.0;
            for &(carrier, share) in ENERGY_MIX {
                let is_fossil = crate::data::indicators::FOSSIL.contains(&carrier);
                let amount = if is_fossil {
                    c.energy * share
                } else {
                    c.energy * share * c.nonfossil_boost
                };
                if is_fossil {
                    fossil += amount;
                } else {
                    nonfossil += amount;
                }
                pe.push((key([carrier, region, t]), amount));
            }
            nhw_share.push((key([region, t]), nonfossil / (fossil + nonfossil)));
            national_energy[yi].0 += fossil;
            national_energy[yi].1 += nonfossil;
        }
    }

    let price: Vec<(Vec<String>, f64)> = YEARS
        .iter()
        .zip(&year_refs)
        .map(|(&year, &t)| (key([t]), levers.cut * 2_000.0 * years_since(year, POLICY_YEAR) / 20.0))
        .collect();
    let nhw_share_cn: Vec<(Vec<String>, f64)> = year_refs
        .iter()
        .zip(&national_energy)
        .map(|(&t, &(fossil, nonfossil))| (key([t]), nonfossil / (fossil + nonfossil)))
        .collect();

    let main = MemoryArchive::new(&case.file)
        .with_set(&settings.region_set, REGIONS)
        .with_set(&settings.time_set, &year_refs)
        .with_scalar(&settings.period_symbol, PERIOD)
        .with_parameter("gdp_ref", &["rs", "t"], gdp)
        .with_parameter("sectem", &["g", "r", "t"], sectem)
        .with_parameter("houem", &["r", "t"], houem)
        .with_parameter("urban", &["*", "rs", "t", "urb"], urban)
        .with_parameter("pop2007", &["g", "rs"], pop2007)
        .with_parameter("pop", &["rs", "t"], pop)
        .with_parameter("sect_prod", &["g", "rs", "t"], sect_prod);
    let extra = MemoryArchive::new(&case.extra_file())
        .with_parameter("ptcarb_t", &["t"], price)
        .with_parameter("cons_t", &["r", "t"], cons)
        .with_parameter("pe_t", &["e", "r", "t"], pe)
        .with_parameter("nhw_share", &["r", "t"], nhw_share)
        .with_parameter("nhw_share_CN", &["t"], nhw_share_cn);
    CaseArchives::new(&case.code, main, extra)
}

/// PM₂.₅ sheet with one row per area: a placeholder-year column, then
/// one horizon column per case.
fn pm_sheet(config: &PipelineConfig, title: &str, areas: &[&str], level: f64, noise: &mut Noise) -> Sheet {
    let pol = &config.pollution;
    let mut header = vec!["region".to_string(), pol.placeholder_year.clone()];
    header.extend(
        config
            .cases
            .iter()
            .map(|c| format!("{}_{}", pol.interpolate_to, c.sheet_tag)),
    );
    let mut rows = vec![header];
    for area in areas {
        let base = level * noise.sample();
        let mut row = vec![area.to_string(), format!("{base:.2}")];
        for case in &config.cases {
            let levers = Levers::from_code(&case.code);
            let growth = if levers.low_growth { 1.05 } else { 1.10 };
            let value = base * growth * (1.0 - 8.0 * levers.cut) * noise.sample();
            row.push(format!("{value:.2}"));
        }
        rows.push(row);
    }
    Sheet::from_rows(title, rows)
}

/// Generates archives for every case in `config` and a matching workbook.
pub fn generate(config: &PipelineConfig, seed: u64) -> DemoData {
    let mut noise = Noise(StdRng::seed_from_u64(seed));
    let cases = config
        .cases
        .iter()
        .map(|case| case_archives(config, case, &mut noise))
        .collect();

    let pol = &config.pollution;
    let mut national_areas: Vec<&str> = PM_AREAS.to_vec();
    national_areas.push(pol.national_region.as_str());
    let workbook = Workbook::new(vec![
        pm_sheet(config, &pol.concentration_sheet, REGIONS, 72.0, &mut noise),
        pm_sheet(config, &pol.exposure_sheet, REGIONS, 80.0, &mut noise),
        pm_sheet(config, &pol.national_concentration_sheet, &national_areas, 61.0, &mut noise),
        pm_sheet(config, &pol.national_exposure_sheet, &national_areas, 68.0, &mut noise),
    ]);
    info!(seed, cases = config.cases.len(), regions = REGIONS.len(), "generated demo inputs");
    DemoData { cases, workbook }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Archive;

    fn labels(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn levers_follow_case_codes() {
        assert_eq!(Levers::from_code("bau"), Levers { cut: 0.0, low_growth: false });
        assert_eq!(Levers::from_code("4_lo"), Levers { cut: 0.04, low_growth: true });
        assert_eq!(Levers::from_code("bau_lo").gdp_growth(), 0.06);
    }

    #[test]
    fn policy_lowers_intensity_after_policy_year() {
        let bau = Levers::from_code("bau");
        let p = Levers::from_code("5");
        assert_eq!(bau.intensity(POLICY_YEAR), p.intensity(POLICY_YEAR));
        assert!(p.intensity(2030) < bau.intensity(2030));
    }

    #[test]
    fn same_seed_same_data() {
        let cfg = PipelineConfig::demo();
        let a = generate(&cfg, 7);
        let b = generate(&cfg, 7);
        let c = generate(&cfg, 8);
        let gdp = |d: &DemoData| d.cases[1].main.parameter("gdp_ref").map(|p| p.records).ok();
        assert_eq!(gdp(&a), gdp(&b));
        assert_ne!(gdp(&a), gdp(&c));
        assert_eq!(a.workbook, b.workbook);
    }

    #[test]
    fn archives_carry_reference_sets() {
        let cfg = PipelineConfig::demo();
        let data = generate(&cfg, DEFAULT_SEED);
        assert_eq!(data.cases.len(), cfg.cases.len());
        let main = &data.cases[0].main;
        assert_eq!(main.set("r").ok(), Some(labels(REGIONS)));
        assert_eq!(main.set("t").map(|t| t.len()).ok(), Some(YEARS.len()));
        assert!(data.cases[0].extra.parameter("nhw_share_CN").is_ok());
    }

    #[test]
    fn workbook_has_national_row() {
        let cfg = PipelineConfig::demo();
        let data = generate(&cfg, DEFAULT_SEED);
        let sheet = data
            .workbook
            .sheet(&cfg.pollution.national_concentration_sheet)
            .expect("sheet should exist");
        assert!(
            sheet
                .rows
                .iter()
                .any(|r| r.first().and_then(Option::as_deref) == Some("Whole China"))
        );
        assert_eq!(sheet.header()[2].as_deref(), Some("2030_BAU"));
    }
}
