//! TOML-based pipeline configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Top-level pipeline configuration parsed from TOML.
///
/// All sections have defaults matching the COP21 website run. Load from
/// TOML with [`PipelineConfig::from_toml_file`] or use
/// [`PipelineConfig::cop21`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Global extraction settings.
    #[serde(default)]
    pub pipeline: PipelineSettings,
    /// Scenarios, in output order.
    #[serde(default = "cop21_cases")]
    pub cases: Vec<CaseConfig>,
    /// Pollution workbook layout and national PM₂.₅ inputs.
    #[serde(default)]
    pub pollution: PollutionConfig,
    /// Chart settings for the website fragments.
    #[serde(default)]
    pub site: SiteConfig,
}

/// Input and output locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory holding one archive dump per case (and its `_extra` twin).
    pub gdx_dir: PathBuf,
    /// Output directory for CSV files.
    pub out_dir: PathBuf,
    /// Workbook directory name, relative to `gdx_dir`.
    pub workbook: String,
    /// Directory of HTML templates; the built-in templates are used when unset.
    pub template_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            gdx_dir: PathBuf::from("../crem/gdx"),
            out_dir: PathBuf::from("../cecp-cop21-data"),
            workbook: "pm".to_string(),
            template_dir: None,
        }
    }
}

/// Global extraction settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSettings {
    /// Code of the baseline case; its main archive is the coordinate reference.
    pub baseline: String,
    /// Last year (inclusive) kept on the time axis.
    pub horizon: u32,
    /// Name of the region set in the reference archive.
    pub region_set: String,
    /// Name of the time set in the reference archive.
    pub time_set: String,
    /// Scalar parameter holding the model period length in years.
    pub period_symbol: String,
    /// Coal-equivalent factor applied to non-fossil electricity.
    pub nonfossil_factor: f64,
    /// Emit `<case>_nh3` low-ammonia variants of every case.
    pub nh3_variants: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            baseline: "bau".to_string(),
            horizon: 2030,
            region_set: "r".to_string(),
            time_set: "t".to_string(),
            period_symbol: "lp".to_string(),
            nonfossil_factor: 0.356 / 0.12,
            nh3_variants: true,
        }
    }
}

/// One scenario: archive location, workbook column tag and description.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CaseConfig {
    /// Short case code used in file names (e.g. `"bau"`, `"4_lo"`).
    pub code: String,
    /// Main archive name under `paths.gdx_dir`.
    pub file: String,
    /// Extra archive name; defaults to `<file>_extra`.
    #[serde(default)]
    pub extra_file: Option<String>,
    /// Tag used in workbook column headers (`2030_<tag>`).
    pub sheet_tag: String,
    /// Human-readable description written to `scenarios.csv`.
    pub description: String,
}

impl CaseConfig {
    fn new(code: &str, file: &str, sheet_tag: &str, description: &str) -> Self {
        Self {
            code: code.to_string(),
            file: file.to_string(),
            extra_file: None,
            sheet_tag: sheet_tag.to_string(),
            description: description.to_string(),
        }
    }

    /// Name of the extra archive.
    pub fn extra_file(&self) -> String {
        self.extra_file
            .clone()
            .unwrap_or_else(|| format!("{}_extra", self.file))
    }
}

/// National share of population exposed above the PM₂.₅ threshold.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExposedFraction {
    /// Case code.
    pub case: String,
    /// Year label.
    pub year: String,
    /// Percent of population.
    pub value: f64,
}

/// Pollution workbook layout and national PM₂.₅ inputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollutionConfig {
    /// Sheet of province-wide average concentrations.
    pub concentration_sheet: String,
    /// Sheet of population-weighted province exposures.
    pub exposure_sheet: String,
    /// Sheet of region-level average concentrations (holds the national row).
    pub national_concentration_sheet: String,
    /// Sheet of region-level population-weighted exposures.
    pub national_exposure_sheet: String,
    /// Row label of the national average in the region-level sheets.
    pub national_region: String,
    /// Year whose value is shared by all cases, copied from the baseline.
    pub placeholder_year: String,
    /// First known year of the national PM₂.₅ series.
    pub interpolate_from: String,
    /// Last known year of the national PM₂.₅ series.
    pub interpolate_to: String,
    /// National exposed-population fractions.
    pub exposed_fraction: Vec<ExposedFraction>,
}

impl Default for PollutionConfig {
    fn default() -> Self {
        let frac = |case: &str, year: &str, value: f64| ExposedFraction {
            case: case.to_string(),
            year: year.to_string(),
            value,
        };
        Self {
            concentration_sheet: "prv_actual_average".to_string(),
            exposure_sheet: "prv_pop_average".to_string(),
            national_concentration_sheet: "region_actual_average".to_string(),
            national_exposure_sheet: "region_pop_average".to_string(),
            national_region: "Whole China".to_string(),
            placeholder_year: "2010".to_string(),
            interpolate_from: "2010".to_string(),
            interpolate_to: "2030".to_string(),
            exposed_fraction: vec![
                frac("bau", "2010", 66.37),
                frac("bau", "2030", 84.78),
                frac("3", "2030", 78.64),
                frac("4", "2030", 71.23),
                frac("5", "2030", 60.87),
            ],
        }
    }
}

/// Chart settings for the website fragments.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Case codes drawn in the charts, in legend order.
    pub scenarios: Vec<String>,
    /// Chart width in pixels.
    pub plot_width: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            scenarios: ["bau", "3", "4", "5", "bau_lo", "3_lo", "4_lo", "5_lo"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            plot_width: 400,
        }
    }
}

fn cop21_cases() -> Vec<CaseConfig> {
    vec![
        CaseConfig::new("bau", "result_urban_exo", "BAU", "BAU: Business-as-usual"),
        CaseConfig::new(
            "3",
            "result_cint_n_3",
            "cint3",
            "Policy: Reduce carbon-intensity of GDP by 3%/year from BAU",
        ),
        CaseConfig::new(
            "4",
            "result_cint_n_4",
            "cint4",
            "Policy: Reduce carbon-intensity of GDP by 4%/year from BAU",
        ),
        CaseConfig::new(
            "5",
            "result_cint_n_5",
            "cint5",
            "Policy: Reduce carbon-intensity of GDP by 5%/year from BAU",
        ),
        CaseConfig::new(
            "bau_lo",
            "result_urban_exo_lessGDP",
            "BAU_lessGDP",
            "LO: BAU with 1% lower annual GDP growth",
        ),
        CaseConfig::new(
            "3_lo",
            "result_cint_n_3_lessGDP",
            "cint3_lessGDP",
            "Policy: Reduce carbon-intensity of GDP by 3%/year from LO",
        ),
        CaseConfig::new(
            "4_lo",
            "result_cint_n_4_lessGDP",
            "cint4_lessGDP",
            "Policy: Reduce carbon-intensity of GDP by 4%/year from LO",
        ),
        CaseConfig::new(
            "5_lo",
            "result_cint_n_5_lessGDP",
            "cint5_lessGDP",
            "Policy: Reduce carbon-intensity of GDP by 5%/year from LO",
        ),
    ]
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"pipeline.baseline"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl PipelineConfig {
    /// Returns the COP21 website configuration: eight cases, horizon 2030.
    pub fn cop21() -> Self {
        Self {
            paths: PathsConfig::default(),
            pipeline: PipelineSettings::default(),
            cases: cop21_cases(),
            pollution: PollutionConfig::default(),
            site: SiteConfig::default(),
        }
    }

    /// Returns the demo preset: three cases over synthetic archives.
    pub fn demo() -> Self {
        let cases: Vec<CaseConfig> = cop21_cases().into_iter().take(3).collect();
        Self {
            paths: PathsConfig {
                gdx_dir: PathBuf::from("demo-data"),
                out_dir: PathBuf::from("demo-out"),
                ..PathsConfig::default()
            },
            pipeline: PipelineSettings::default(),
            site: SiteConfig {
                scenarios: cases.iter().map(|c| c.code.clone()).collect(),
                ..SiteConfig::default()
            },
            pollution: PollutionConfig {
                exposed_fraction: PollutionConfig::default()
                    .exposed_fraction
                    .into_iter()
                    .filter(|f| cases.iter().any(|c| c.code == f.case))
                    .collect(),
                ..PollutionConfig::default()
            },
            cases,
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["cop21", "demo"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "cop21" => Ok(Self::cop21()),
            "demo" => Ok(Self::demo()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Case codes in configuration order.
    pub fn case_codes(&self) -> Vec<String> {
        self.cases.iter().map(|c| c.code.clone()).collect()
    }

    /// Directory of the pollution workbook.
    pub fn workbook_dir(&self) -> PathBuf {
        self.paths.gdx_dir.join(&self.paths.workbook)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let p = &self.pipeline;

        if self.cases.is_empty() {
            errors.push(ConfigError::new("cases", "at least one case is required"));
        }
        for (i, case) in self.cases.iter().enumerate() {
            if case.code.is_empty() || case.code.contains(['/', '\\']) {
                errors.push(ConfigError::new(
                    format!("cases[{i}].code"),
                    format!("must be a non-empty file name, got \"{}\"", case.code),
                ));
            }
            if self.cases[..i].iter().any(|c| c.code == case.code) {
                errors.push(ConfigError::new(
                    format!("cases[{i}].code"),
                    format!("duplicate case \"{}\"", case.code),
                ));
            }
            if self.cases[..i].iter().any(|c| c.sheet_tag == case.sheet_tag) {
                errors.push(ConfigError::new(
                    format!("cases[{i}].sheet_tag"),
                    format!("duplicate sheet tag \"{}\"", case.sheet_tag),
                ));
            }
            if p.nh3_variants && case.code.ends_with("_nh3") {
                errors.push(ConfigError::new(
                    format!("cases[{i}].code"),
                    "`_nh3` suffix is reserved for generated variants",
                ));
            }
        }
        if !self.cases.iter().any(|c| c.code == p.baseline) {
            errors.push(ConfigError::new(
                "pipeline.baseline",
                format!("\"{}\" is not a configured case", p.baseline),
            ));
        }
        if p.horizon == 0 {
            errors.push(ConfigError::new("pipeline.horizon", "must be > 0"));
        }
        if !(p.nonfossil_factor.is_finite() && p.nonfossil_factor > 0.0) {
            errors.push(ConfigError::new(
                "pipeline.nonfossil_factor",
                "must be a finite number > 0",
            ));
        }

        let pol = &self.pollution;
        let from = pol.interpolate_from.parse::<i32>();
        let to = pol.interpolate_to.parse::<i32>();
        match (from, to) {
            (Ok(a), Ok(b)) if a < b => {}
            (Ok(_), Ok(_)) => errors.push(ConfigError::new(
                "pollution.interpolate_from",
                "must be < pollution.interpolate_to",
            )),
            _ => errors.push(ConfigError::new(
                "pollution.interpolate_from",
                "interpolation endpoints must be integer years",
            )),
        }
        if pol.placeholder_year.parse::<i32>().is_err() {
            errors.push(ConfigError::new(
                "pollution.placeholder_year",
                format!("must be an integer year, got \"{}\"", pol.placeholder_year),
            ));
        }
        for (i, frac) in pol.exposed_fraction.iter().enumerate() {
            if !self.cases.iter().any(|c| c.code == frac.case) {
                errors.push(ConfigError::new(
                    format!("pollution.exposed_fraction[{i}].case"),
                    format!("\"{}\" is not a configured case", frac.case),
                ));
            }
            if !frac.value.is_finite() {
                errors.push(ConfigError::new(
                    format!("pollution.exposed_fraction[{i}].value"),
                    "must be finite",
                ));
            }
        }

        for (i, key) in self.site.scenarios.iter().enumerate() {
            if !self.cases.iter().any(|c| &c.code == key) {
                errors.push(ConfigError::new(
                    format!("site.scenarios[{i}]"),
                    format!("\"{key}\" is not a configured case"),
                ));
            }
        }
        if self.site.plot_width == 0 {
            errors.push(ConfigError::new("site.plot_width", "must be > 0"));
        }

        errors
    }
}
