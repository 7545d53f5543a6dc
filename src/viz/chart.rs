//! Scenario line charts rendered as standalone SVG.

use std::fmt::Write as _;

use super::table::NationalTable;
use crate::error::{PipelineError, Result};

const HEIGHT: u32 = 300;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 12.0;
const MARGIN_TOP: f64 = 12.0;
const MARGIN_BOTTOM: f64 = 32.0;
const LINE_ALPHA: f64 = 0.8;

/// Line colours in scenario order.
const PALETTE: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
];

/// One scenario line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Scenario key (e.g. `"bau"`, `"4_lo"`).
    pub key: String,
    pub values: Vec<f64>,
    pub color: &'static str,
    pub dashed: bool,
}

/// A time-series chart with one line per scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePlot {
    /// Element id prefix; line `k` gets id `<prefix>_<k>`.
    pub prefix: String,
    pub parameter: String,
    pub y_label: String,
    pub y_ticks: Vec<f64>,
    pub width: u32,
    pub years: Vec<f64>,
    pub x_labels: Vec<String>,
    pub lines: Vec<Line>,
}

impl LinePlot {
    /// Chart of `parameter` with one line per key, coloured by position.
    ///
    /// # Errors
    ///
    /// Returns `MissingSymbol` if the table lacks a key's series, and
    /// `Shape` if a time label is not a year.
    pub fn national_scenarios(
        table: &NationalTable,
        parameter: &str,
        keys: &[String],
        y_ticks: &[f64],
        y_label: &str,
        width: u32,
        prefix: &str,
    ) -> Result<Self> {
        let years = table
            .time()
            .iter()
            .map(|t| crate::data::indicators::parse_year(t).map(f64::from))
            .collect::<Result<Vec<_>>>()?;
        let mut plot = Self {
            prefix: prefix.to_string(),
            parameter: parameter.to_string(),
            y_label: y_label.to_string(),
            y_ticks: y_ticks.to_vec(),
            width,
            years,
            x_labels: table.time().to_vec(),
            lines: Vec::new(),
        };
        plot.add_lines(table, keys, "", false)?;
        Ok(plot)
    }

    /// Adds a line for every `<key><suffix>`, reusing the colour of `key`.
    ///
    /// # Errors
    ///
    /// Returns `MissingSymbol` if the table lacks a series.
    pub fn add_lines(&mut self, table: &NationalTable, keys: &[String], suffix: &str, dashed: bool) -> Result<()> {
        for (i, key) in keys.iter().enumerate() {
            let key = format!("{key}{suffix}");
            let values = table
                .series(&key, &self.parameter)
                .ok_or_else(|| PipelineError::MissingSymbol {
                    archive: "national table".to_string(),
                    symbol: format!("{}[{key}]", self.parameter),
                })?
                .to_vec();
            self.lines.push(Line {
                key,
                values,
                color: PALETTE[i % PALETTE.len()],
                dashed,
            });
        }
        Ok(())
    }

    /// Element ids of all lines, in drawing order.
    #[cfg(test)]
    pub(crate) fn line_ids(&self) -> Vec<String> {
        self.lines.iter().map(|l| self.line_id(&l.key)).collect()
    }

    fn line_id(&self, key: &str) -> String {
        format!("{}_{key}", self.prefix)
    }

    fn y_range(&self) -> (f64, f64) {
        let finite = self
            .lines
            .iter()
            .flat_map(|l| l.values.iter().copied())
            .chain(self.y_ticks.iter().copied())
            .filter(|v| v.is_finite());
        let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if !lo.is_finite() {
            (0.0, 1.0)
        } else if hi > lo {
            (lo, hi)
        } else {
            (lo - 1.0, hi + 1.0)
        }
    }

    fn x_range(&self) -> (f64, f64) {
        match (self.years.first(), self.years.last()) {
            (Some(&a), Some(&b)) if b > a => (a, b),
            (Some(&a), _) => (a - 1.0, a + 1.0),
            _ => (0.0, 1.0),
        }
    }

    /// Renders the chart as an `<svg>` element.
    pub fn to_svg(&self) -> String {
        let w = f64::from(self.width);
        let h = f64::from(HEIGHT);
        let (x0, x1) = self.x_range();
        let (y0, y1) = self.y_range();
        let px = |x: f64| MARGIN_LEFT + (x - x0) / (x1 - x0) * (w - MARGIN_LEFT - MARGIN_RIGHT);
        let py = |y: f64| h - MARGIN_BOTTOM - (y - y0) / (y1 - y0) * (h - MARGIN_TOP - MARGIN_BOTTOM);

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" id="{prefix}_plot" width="{w}" height="{h}" font-family="sans-serif" font-size="11">
  <rect width="100%" height="100%" fill="white"/>
"#,
            prefix = self.prefix,
        );

        // Axes
        let _ = writeln!(
            svg,
            r##"  <line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="#444"/>
  <line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="#444"/>"##,
            l = MARGIN_LEFT,
            r = w - MARGIN_RIGHT,
            t = MARGIN_TOP,
            b = h - MARGIN_BOTTOM,
        );
        for tick in &self.y_ticks {
            let y = py(*tick);
            let _ = writeln!(
                svg,
                r##"  <line x1="{}" y1="{y:.1}" x2="{}" y2="{y:.1}" stroke="#ddd"/>
  <text x="{}" y="{:.1}" text-anchor="end">{tick}</text>"##,
                MARGIN_LEFT,
                w - MARGIN_RIGHT,
                MARGIN_LEFT - 4.0,
                y + 4.0,
            );
        }
        for (year, label) in self.years.iter().zip(&self.x_labels) {
            let _ = writeln!(
                svg,
                r#"  <text x="{:.1}" y="{}" text-anchor="middle">{}</text>"#,
                px(*year),
                h - MARGIN_BOTTOM + 14.0,
                escape(label),
            );
        }
        let _ = writeln!(
            svg,
            r#"  <text transform="translate(14,{:.1}) rotate(-90)" text-anchor="middle">{}</text>"#,
            (h - MARGIN_BOTTOM + MARGIN_TOP) / 2.0,
            escape(&self.y_label),
        );

        // Lines; a NaN breaks the path
        for line in &self.lines {
            let mut d = String::new();
            let mut pen_down = false;
            for (x, v) in self.years.iter().zip(&line.values) {
                if v.is_finite() {
                    let _ = write!(d, "{}{:.1} {:.1} ", if pen_down { "L" } else { "M" }, px(*x), py(*v));
                    pen_down = true;
                } else {
                    pen_down = false;
                }
            }
            let dash = if line.dashed { r#" stroke-dasharray="6 4""# } else { "" };
            let _ = writeln!(
                svg,
                r#"  <path id="{id}" class="scenario-line" data-key="{key}" d="{d}" fill="none" stroke="{color}" stroke-width="2" stroke-opacity="{LINE_ALPHA}"{dash}/>"#,
                id = escape(&self.line_id(&line.key)),
                key = escape(&line.key),
                d = d.trim_end(),
                color = line.color,
            );
        }

        svg.push_str("</svg>\n");
        svg
    }
}

/// Escapes text for use in SVG content and attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::array::{Coord, LabeledArray};
    use crate::data::dataset::{Aggregation, Dataset, Index, Variable};

    fn table() -> NationalTable {
        let index = Index {
            cases: vec!["bau".to_string(), "3".to_string()],
            regions: Vec::new(),
            time: vec!["2010".to_string(), "2020".to_string(), "2030".to_string()],
        };
        let mut nox = LabeledArray::filled(
            vec![Coord::new("case", ["bau", "3"]), Coord::new("t", ["2010", "2020", "2030"])],
            30.0,
        );
        nox.set(&[("case", "3"), ("t", "2020")], f64::NAN).ok();
        let ds = Dataset::assemble(index, [Variable::new("NOX_emi", nox, Aggregation::Sum)])
            .expect("dataset should assemble");
        NationalTable::from_dataset(&ds)
    }

    fn keys() -> Vec<String> {
        vec!["bau".to_string(), "3".to_string()]
    }

    #[test]
    fn one_path_per_scenario_with_prefixed_id() {
        let plot = LinePlot::national_scenarios(&table(), "NOX_emi", &keys(), &[25.0, 35.0, 45.0], "NOx emissions", 400, "ap")
            .expect("plot should build");
        assert_eq!(plot.line_ids(), vec!["ap_bau", "ap_3"]);
        let svg = plot.to_svg();
        assert_eq!(svg.matches("<path ").count(), 2);
        assert!(svg.contains(r#"id="ap_bau""#));
        assert!(svg.contains(r#"width="400""#));
        assert!(svg.contains(">NOx emissions</text>"));
    }

    #[test]
    fn nan_breaks_the_line() {
        let plot = LinePlot::national_scenarios(&table(), "NOX_emi", &keys(), &[25.0], "NOx", 400, "ap")
            .expect("plot should build");
        let svg = plot.to_svg();
        let path = svg
            .lines()
            .find(|l| l.contains(r#"id="ap_3""#))
            .unwrap_or_default();
        // two isolated points: both segments start with a move
        assert_eq!(path.matches('M').count(), 2);
        assert!(!path.contains('L'));
    }

    #[test]
    fn missing_series_is_an_error() {
        let err = LinePlot::national_scenarios(&table(), "CO2_emi", &keys(), &[], "CO2", 400, "co2")
            .expect_err("CO2_emi absent");
        assert!(matches!(err, PipelineError::MissingSymbol { .. }));
    }

    #[test]
    fn dashed_lines_reuse_colors() {
        let mut plot = LinePlot::national_scenarios(&table(), "NOX_emi", &keys()[..1], &[], "NOx", 400, "ap")
            .expect("plot should build");
        plot.add_lines(&table(), &keys()[1..], "", true).expect("lines should add");
        assert!(plot.to_svg().contains("stroke-dasharray"));
        assert_eq!(plot.lines[1].color, PALETTE[0]);
    }

    #[test]
    fn escape_markup() {
        assert_eq!(escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}
