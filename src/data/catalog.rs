//! Descriptive metadata for output variables.

use std::collections::BTreeMap;

use serde::Serialize;

use super::indicators::subscript_digits;

const USD: (&str, &str) = ("billions of U.S. dollars, constant at 2007", "10⁹ USD");
const MTCE: (&str, &str) = ("millions of tonnes of coal equivalent", "Mtce");
const PERCENT: (&str, &str) = ("percent", "%");
const UG_M3: (&str, &str) = ("micrograms per cubic metre", "μg/m³");

/// Description and units of one variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarMeta {
    pub desc: String,
    pub unit_long: String,
    pub unit_short: String,
}

impl VarMeta {
    pub fn new(desc: impl Into<String>, unit_long: impl Into<String>, unit_short: impl Into<String>) -> Self {
        Self {
            desc: desc.into(),
            unit_long: unit_long.into(),
            unit_short: unit_short.into(),
        }
    }

    fn with_units(desc: impl Into<String>, (long, short): (&str, &str)) -> Self {
        Self::new(desc, long, short)
    }
}

/// Mapping from variable name to its metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: BTreeMap<String, VarMeta>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one entry.
    pub fn insert(&mut self, name: &str, meta: VarMeta) {
        self.entries.insert(name.to_string(), meta);
    }

    pub fn get(&self, name: &str) -> Option<&VarMeta> {
        self.entries.get(name)
    }

    /// Merges `other` into this catalog; entries of `other` win.
    pub fn merge(mut self, other: Catalog) -> Self {
        self.entries.extend(other.entries);
        self
    }
}

pub fn gdp() -> VarMeta {
    VarMeta::with_units("Gross domestic product", USD)
}

pub fn gdp_aagr() -> VarMeta {
    VarMeta::with_units("Gross domestic product, average annual growth rate", PERCENT)
}

pub fn gdp_delta(baseline: &str) -> VarMeta {
    VarMeta::with_units(
        format!(
            "Change in gross domestic product relative to {}",
            baseline.to_uppercase()
        ),
        PERCENT,
    )
}

pub fn co2_emissions() -> VarMeta {
    VarMeta::new("Annual CO₂ emissions", "millions of tonnes of CO₂", "Mt")
}

/// Metadata of `<pollutant>_emi`, with digits rendered as subscripts.
pub fn pollutant_emissions(pollutant: &str) -> VarMeta {
    let pretty = subscript_digits(pollutant);
    VarMeta::new(
        format!("Annual {pretty} emissions"),
        format!("millions of tonnes of {pretty}"),
        "Mt",
    )
}

pub fn co2_price() -> VarMeta {
    VarMeta::new(
        "Price of CO₂ emissions permit",
        "2007 US dollars per tonne CO₂",
        "2007 USD/t",
    )
}

pub fn consumption() -> VarMeta {
    VarMeta::with_units("Household consumption", USD)
}

/// Metadata of `<E>_energy`.
///
/// Returns `None` for an energy label without a known long name; such a
/// variable is still written and shows up in the metadata report.
pub fn primary_energy(label: &str) -> Option<VarMeta> {
    let name = match label {
        "COL" => "Coal",
        "GAS" => "Natural gas",
        "OIL" => "Crude oil",
        "NUC" => "Nuclear",
        "WND" => "Wind",
        "SOL" => "Solar",
        "HYD" => "Hydroelectricity",
        _ => return None,
    };
    Some(VarMeta::with_units(format!("Primary energy from {name}"), MTCE))
}

pub fn energy_fossil() -> VarMeta {
    VarMeta::with_units("Primary energy from fossil fuels", MTCE)
}

pub fn energy_nonfossil() -> VarMeta {
    VarMeta::with_units("Primary energy from non-fossil sources", MTCE)
}

pub fn energy_total() -> VarMeta {
    VarMeta::with_units("Primary energy, total", MTCE)
}

/// Shared by the computed and the model-reported non-fossil share.
pub fn nonfossil_share() -> VarMeta {
    VarMeta::with_units("Share of non-fossil sources in final energy", PERCENT)
}

pub fn population() -> VarMeta {
    VarMeta::new("Population", "millions", "10⁶")
}

pub fn coal_share() -> VarMeta {
    VarMeta::with_units("Share of coal production in provincial GDP", PERCENT)
}

pub fn pm25_concentration() -> VarMeta {
    VarMeta::with_units("Province-wide average PM2.5", UG_M3)
}

pub fn pm25_exposure() -> VarMeta {
    VarMeta::with_units("Population-weighted exposure to PM2.5", UG_M3)
}

pub fn pm25_exposed_fraction() -> VarMeta {
    VarMeta::with_units(
        "Population exposed to PM2.5 concentrations greater than 35 μg/m³",
        PERCENT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pollutant_labels_get_subscripts() {
        let meta = pollutant_emissions("SO2");
        assert_eq!(meta.desc, "Annual SO₂ emissions");
        assert_eq!(meta.unit_long, "millions of tonnes of SO₂");
        assert_eq!(pollutant_emissions("NH3").desc, "Annual NH₃ emissions");
    }

    #[test]
    fn unknown_energy_label_has_no_metadata() {
        assert!(primary_energy("COL").is_some());
        assert!(primary_energy("BIO").is_none());
    }

    #[test]
    fn merge_prefers_right_hand_side() {
        let mut a = Catalog::new();
        a.insert("GDP", gdp());
        let mut b = Catalog::new();
        b.insert("GDP", population());
        b.insert("cons", consumption());
        let merged = a.merge(b);
        assert_eq!(merged.get("GDP").map(|m| m.desc.as_str()), Some("Population"));
        assert!(merged.get("cons").is_some());
    }

    #[test]
    fn delta_names_the_baseline() {
        assert_eq!(
            gdp_delta("bau").desc,
            "Change in gross domestic product relative to BAU"
        );
    }
}
