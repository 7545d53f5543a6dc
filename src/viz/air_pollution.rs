//! Linked NOₓ and CO₂ emission charts with a scenario highlight input.
//!
//! Typing a comma-separated list of scenario keys into the input dims every
//! line and brings the listed scenarios forward in both charts.

use tracing::info;

use super::chart::LinePlot;
use super::table::NationalTable;
use super::template::{AIR_POLLUTION_TEMPLATE, TemplateEnv};
use crate::config::SiteConfig;
use crate::data::pipeline::NH3_SUFFIX;
use crate::error::Result;

const AP_PREFIX: &str = "ap";
const CO2_PREFIX: &str = "co2";
const INPUT_ID: &str = "scenario-highlight";
const DIMMED: f64 = 0.1;
const HIGHLIGHTED: f64 = 0.8;

/// The two charts of the fragment.
#[derive(Debug, Clone)]
pub struct AirPollutionCharts {
    pub ap: LinePlot,
    pub co2: LinePlot,
    /// Scenario keys in drawing order, including any `_nh3` variants.
    pub keys: Vec<String>,
}

impl AirPollutionCharts {
    /// Builds both charts for the site scenarios. With `with_nh3`, every
    /// scenario also gets a dashed `<key>_nh3` line.
    ///
    /// # Errors
    ///
    /// Returns `MissingSymbol` if the table lacks a series.
    pub fn build(table: &NationalTable, site: &SiteConfig, with_nh3: bool) -> Result<Self> {
        let keys = &site.scenarios;
        let mut ap = LinePlot::national_scenarios(
            table,
            "NOX_emi",
            keys,
            &[25.0, 35.0, 45.0],
            "NOx emissions",
            site.plot_width,
            AP_PREFIX,
        )?;
        let mut co2 = LinePlot::national_scenarios(
            table,
            "CO2_emi",
            keys,
            &[7000.0, 10000.0, 13000.0, 16000.0],
            "CO₂ emissions",
            site.plot_width,
            CO2_PREFIX,
        )?;
        let mut all = keys.clone();
        if with_nh3 {
            ap.add_lines(table, keys, NH3_SUFFIX, true)?;
            co2.add_lines(table, keys, NH3_SUFFIX, true)?;
            all.extend(keys.iter().map(|k| format!("{k}{NH3_SUFFIX}")));
        }
        Ok(Self { ap, co2, keys: all })
    }

    /// Line ids of both charts, interleaved per scenario.
    pub fn prefixed_keys(&self) -> Vec<String> {
        self.keys
            .iter()
            .flat_map(|k| [format!("{AP_PREFIX}_{k}"), format!("{CO2_PREFIX}_{k}")])
            .collect()
    }

    /// Markup of both charts and the text input.
    pub fn plot_div(&self) -> String {
        format!(
            "<div class=\"plots\">\n{co2}{ap}</div>\n<input type=\"text\" id=\"{INPUT_ID}\" placeholder=\"bau,4_lo\">\n",
            co2 = self.co2.to_svg(),
            ap = self.ap.to_svg(),
        )
    }

    /// Highlight script bound to the text input.
    ///
    /// # Errors
    ///
    /// Returns `Json` if the key list cannot be encoded.
    pub fn plot_script(&self) -> Result<String> {
        let lines = serde_json::to_string(&self.prefixed_keys())?.replace("</", "<\\/");
        Ok(format!(
            r#"<script>
(function () {{
  var lines = {lines},
      input = document.getElementById("{INPUT_ID}");
  function setAlpha(id, alpha) {{
    var el = document.getElementById(id);
    if (el) {{ el.setAttribute("stroke-opacity", alpha); }}
  }}
  input.addEventListener("change", function () {{
    lines.forEach(function (id) {{ setAlpha(id, "{DIMMED}"); }});
    input.value.split(",").forEach(function (key) {{
      key = key.trim();
      setAlpha("{AP_PREFIX}_" + key, "{HIGHLIGHTED}");
      setAlpha("{CO2_PREFIX}_" + key, "{HIGHLIGHTED}");
    }});
  }});
}})();
</script>
"#
        ))
    }
}

fn render(table: &NationalTable, site: &SiteConfig, env: &TemplateEnv, with_nh3: bool) -> Result<String> {
    let charts = AirPollutionCharts::build(table, site, with_nh3)?;
    let script = charts.plot_script()?;
    let div = charts.plot_div();
    let html = env
        .get_template(AIR_POLLUTION_TEMPLATE)?
        .render(&[("plot_script", script.as_str()), ("plot_div", div.as_str())]);
    info!(scenarios = charts.keys.len(), with_nh3, "rendered air pollution charts");
    Ok(html)
}

/// Fragment with the base scenarios.
///
/// # Errors
///
/// Returns `MissingSymbol` for an absent series and `Io` if the template
/// cannot be loaded.
pub fn render_1(table: &NationalTable, site: &SiteConfig, env: &TemplateEnv) -> Result<String> {
    render(table, site, env, false)
}

/// Fragment with the base scenarios and their low-NH₃ variants dashed.
///
/// # Errors
///
/// See [`render_1`]; additionally fails if the table has no `_nh3` cases.
pub fn render_2(table: &NationalTable, site: &SiteConfig, env: &TemplateEnv) -> Result<String> {
    render(table, site, env, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::array::{Coord, LabeledArray};
    use crate::data::dataset::{Aggregation, Dataset, Index, Variable};
    use crate::error::PipelineError;

    fn table(cases: &[&str]) -> NationalTable {
        let index = Index {
            cases: cases.iter().map(|c| c.to_string()).collect(),
            regions: Vec::new(),
            time: vec!["2010".to_string(), "2030".to_string()],
        };
        let coords = || vec![Coord::new("case", cases.iter().copied()), Coord::new("t", ["2010", "2030"])];
        let ds = Dataset::assemble(
            index,
            [
                Variable::new("NOX_emi", LabeledArray::filled(coords(), 30.0), Aggregation::Sum),
                Variable::new("CO2_emi", LabeledArray::filled(coords(), 9000.0), Aggregation::Sum),
            ],
        )
        .expect("dataset should assemble");
        NationalTable::from_dataset(&ds)
    }

    fn site() -> SiteConfig {
        SiteConfig {
            scenarios: vec!["bau".to_string(), "4_lo".to_string()],
            plot_width: 400,
        }
    }

    #[test]
    fn keys_interleave_both_charts() {
        let charts = AirPollutionCharts::build(&table(&["bau", "4_lo"]), &site(), false).expect("charts should build");
        assert_eq!(charts.prefixed_keys(), vec!["ap_bau", "co2_bau", "ap_4_lo", "co2_4_lo"]);
    }

    #[test]
    fn render_1_fills_template() {
        let html = render_1(&table(&["bau", "4_lo"]), &site(), &TemplateEnv::default()).expect("render should succeed");
        assert!(html.contains(r#"var lines = ["ap_bau","co2_bau","ap_4_lo","co2_4_lo"]"#));
        assert!(html.contains(r#"id="co2_4_lo""#));
        assert!(html.contains(r#"id="scenario-highlight""#));
        assert!(!html.contains("{{"));
        assert!(!html.contains("stroke-dasharray"));
    }

    #[test]
    fn render_2_adds_dashed_variants() {
        let t = table(&["bau", "4_lo", "bau_nh3", "4_lo_nh3"]);
        let html = render_2(&t, &site(), &TemplateEnv::default()).expect("render should succeed");
        assert!(html.contains(r#"id="ap_4_lo_nh3""#));
        assert_eq!(html.matches("stroke-dasharray").count(), 4);
    }

    #[test]
    fn render_2_needs_variants() {
        let err = render_2(&table(&["bau", "4_lo"]), &site(), &TemplateEnv::default()).expect_err("no _nh3 cases");
        assert!(matches!(err, PipelineError::MissingSymbol { .. }));
    }
}
