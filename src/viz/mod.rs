//! Website charts built from the national tables.

pub mod air_pollution;
pub mod chart;
pub mod table;
pub mod template;

pub use air_pollution::{AirPollutionCharts, render_1, render_2};
pub use chart::LinePlot;
pub use table::NationalTable;
pub use template::{Template, TemplateEnv};
