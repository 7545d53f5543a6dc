//! Shared test fixtures for integration tests.
//!
//! A two-case, two-region model run small enough to check by hand:
//! national GDP is `bau = [100, 110]` and `x = [100, 105]` over 2010/2015.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use crem_site::archive::MemoryArchive;
use crem_site::config::PipelineConfig;
use crem_site::data::extract::CaseArchives;
use crem_site::io::sheets::{Sheet, Workbook};

pub const CASES: [&str; 2] = ["bau", "x"];
pub const REGIONS: [&str; 2] = ["A", "B"];
pub const YEARS: [&str; 2] = ["2010", "2015"];

/// Fixture configuration as TOML, writing to `out_dir`.
pub fn config_toml(out_dir: &Path) -> String {
    format!(
        r#"
[paths]
gdx_dir = "gdx"
out_dir = "{}"

[pipeline]
nh3_variants = false

[[cases]]
code = "bau"
file = "result_bau"
sheet_tag = "BAU"
description = "BAU: Business-as-usual"

[[cases]]
code = "x"
file = "result_x"
sheet_tag = "X"
description = "Policy: X"

[pollution]
interpolate_to = "2015"
exposed_fraction = [
    {{ case = "bau", year = "2010", value = 66.0 }},
    {{ case = "x", year = "2015", value = 60.0 }},
]

[site]
scenarios = ["bau", "x"]
"#,
        out_dir.display().to_string().replace('\\', "/")
    )
}

/// Fixture configuration, writing to `out_dir`.
pub fn config(out_dir: &Path) -> PipelineConfig {
    PipelineConfig::from_toml_str(&config_toml(out_dir)).expect("fixture config should parse")
}

/// One parameter: symbol, domains and dense records.
pub struct Symbol {
    pub name: &'static str,
    pub dims: Vec<&'static str>,
    pub records: Vec<(Vec<String>, f64)>,
}

pub fn symbol(name: &'static str, dims: &[&'static str], records: Vec<(Vec<&str>, f64)>) -> Symbol {
    Symbol {
        name,
        dims: dims.to_vec(),
        records: records
            .into_iter()
            .map(|(k, v)| (k.into_iter().map(str::to_string).collect(), v))
            .collect(),
    }
}

/// `(region, year) → f(region index, year index)` records.
pub fn by_region_year(f: impl Fn(usize, usize) -> f64) -> Vec<(Vec<&'static str>, f64)> {
    let mut out = Vec::new();
    for (ri, r) in REGIONS.iter().enumerate() {
        for (ti, t) in YEARS.iter().enumerate() {
            out.push((vec![*r, *t], f(ri, ti)));
        }
    }
    out
}

fn prefixed(prefix: &'static str, records: Vec<(Vec<&'static str>, f64)>) -> Vec<(Vec<&'static str>, f64)> {
    records
        .into_iter()
        .map(|(mut k, v)| {
            k.insert(0, prefix);
            (k, v)
        })
        .collect()
}

/// Regional GDP of a case: rows are regions, columns years.
pub fn gdp_of(case: &str) -> [[f64; 2]; 2] {
    match case {
        "bau" => [[60.0, 66.0], [40.0, 44.0]],
        _ => [[60.0, 63.0], [40.0, 42.0]],
    }
}

/// Main-archive parameters of `case`.
pub fn main_symbols(case: &str) -> Vec<Symbol> {
    let gdp = gdp_of(case);
    let cut = if case == "bau" { 1.0 } else { 0.8 };
    let urban: Vec<(Vec<&str>, f64)> = by_region_year(|r, t| (10.0 + r as f64 + t as f64) * cut)
        .into_iter()
        .flat_map(|(k, v)| {
            ["NOX", "SO2", "PM25"].map(|p| {
                let mut key = vec!["ELE"];
                key.extend(k.iter().copied());
                key.push(p);
                (key, v)
            })
        })
        .collect();
    vec![
        symbol("gdp_ref", &["rs", "t"], by_region_year(|r, t| gdp[r][t])),
        symbol("sectem", &["g", "r", "t"], prefixed("ELE", by_region_year(|r, _| 900.0 * cut + r as f64))),
        symbol("houem", &["r", "t"], by_region_year(|_, _| 100.0)),
        symbol("urban", &["*", "rs", "t", "urb"], urban),
        symbol("pop2007", &["g", "rs"], vec![(vec!["c", "A"], 20.0), (vec!["c", "B"], 30.0)]),
        symbol("pop", &["rs", "t"], by_region_year(|_, t| 100.0 + 5.0 * t as f64)),
        symbol("sect_prod", &["g", "rs", "t"], prefixed("COL", by_region_year(|r, t| gdp[r][t] / 10.0))),
    ]
}

/// Extra-archive parameters of `case`.
pub fn extra_symbols(case: &str) -> Vec<Symbol> {
    let price = if case == "bau" { 0.0 } else { 50.0 };
    let coal = [30.0, 90.0];
    let wind = [10.0, 2.0];
    let mut pe = prefixed("COL", by_region_year(|r, _| coal[r]));
    pe.extend(prefixed("WND", by_region_year(|r, _| wind[r])));
    vec![
        symbol("ptcarb_t", &["t"], YEARS.iter().map(|t| (vec![*t], price)).collect()),
        symbol("cons_t", &["r", "t"], by_region_year(|r, t| 10.0 * (r + t + 1) as f64)),
        symbol("pe_t", &["e", "r", "t"], pe),
        symbol("nhw_share", &["r", "t"], by_region_year(|r, _| [0.25, 0.02][r])),
        symbol("nhw_share_CN", &["t"], YEARS.iter().map(|t| (vec![*t], 0.1)).collect()),
    ]
}

fn memory_archive(name: &str, symbols: Vec<Symbol>) -> MemoryArchive {
    symbols.into_iter().fold(MemoryArchive::new(name), |a, s| {
        a.with_parameter(s.name, &s.dims, s.records)
    })
}

/// In-memory archives of one case from explicit symbol lists.
pub fn case_from(case: &str, main: Vec<Symbol>, extra: Vec<Symbol>) -> CaseArchives {
    let main = memory_archive(&format!("result_{case}"), main)
        .with_set("r", &REGIONS)
        .with_set("t", &YEARS)
        .with_scalar("lp", 5.0);
    let extra = memory_archive(&format!("result_{case}_extra"), extra);
    CaseArchives::new(case, main, extra)
}

/// In-memory archives of every fixture case.
pub fn cases() -> Vec<CaseArchives> {
    CASES
        .iter()
        .map(|case| case_from(case, main_symbols(case), extra_symbols(case)))
        .collect()
}

pub fn pm_rows(areas: &[&str], level: f64) -> Vec<Vec<String>> {
    let mut rows = vec![["region", "2010", "2015_BAU", "2015_X"].map(str::to_string).to_vec()];
    for (i, area) in areas.iter().enumerate() {
        let base = level + i as f64;
        rows.push(vec![
            area.to_string(),
            base.to_string(),
            (base + 4.0).to_string(),
            (base - 6.0).to_string(),
        ]);
    }
    rows
}

/// The four pollution sheets.
pub fn workbook() -> Workbook {
    Workbook::new(sheets())
}

pub fn sheets() -> Vec<Sheet> {
    vec![
        Sheet::from_rows("prv_actual_average", pm_rows(&REGIONS, 50.0)),
        Sheet::from_rows("prv_pop_average", pm_rows(&REGIONS, 60.0)),
        Sheet::from_rows("region_actual_average", pm_rows(&["Whole China", "North"], 40.0)),
        Sheet::from_rows("region_pop_average", pm_rows(&["Whole China", "North"], 45.0)),
    ]
}

fn write_symbol(dir: &Path, symbol: &Symbol) {
    let mut body = symbol
        .dims
        .iter()
        .map(|d| format!("\"{d}\""))
        .chain(std::iter::once("\"Val\"".to_string()))
        .collect::<Vec<_>>()
        .join(",");
    body.push('\n');
    for (key, value) in &symbol.records {
        let mut fields: Vec<String> = key.iter().map(|k| format!("\"{k}\"")).collect();
        fields.push(value.to_string());
        body.push_str(&fields.join(","));
        body.push('\n');
    }
    fs::write(dir.join(format!("{}.csv", symbol.name)), body).expect("dump write should succeed");
}

fn write_set(dir: &Path, name: &str, labels: &[&str]) {
    let mut body = format!("\"{name}\",\"Text\"\n");
    for l in labels {
        body.push_str(&format!("\"{l}\",\"\"\n"));
    }
    fs::write(dir.join(format!("{name}.csv")), body).expect("set write should succeed");
}

/// Writes the fixture as archive dumps and workbook sheets below `gdx_dir`,
/// laid out as [`config`] expects.
pub fn write_inputs(gdx_dir: &Path) {
    for case in CASES {
        let main = gdx_dir.join(format!("result_{case}"));
        let extra = gdx_dir.join(format!("result_{case}_extra"));
        fs::create_dir_all(&main).expect("dir should be created");
        fs::create_dir_all(&extra).expect("dir should be created");
        for s in main_symbols(case) {
            write_symbol(&main, &s);
        }
        for s in extra_symbols(case) {
            write_symbol(&extra, &s);
        }
        write_set(&main, "r", &REGIONS);
        write_set(&main, "t", &YEARS);
        fs::write(main.join("lp.csv"), "\"Val\"\n5\n").expect("scalar write should succeed");
    }

    let workbook = gdx_dir.join("pm");
    fs::create_dir_all(&workbook).expect("dir should be created");
    for sheet in sheets() {
        let body: String = sheet
            .rows
            .iter()
            .map(|row| {
                let cells: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("")).collect();
                format!("{}\n", cells.join(","))
            })
            .collect();
        fs::write(workbook.join(format!("{}.csv", sheet.title)), body).expect("sheet write should succeed");
    }
}

pub fn strings(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}
