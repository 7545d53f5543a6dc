//! crem-site entry point: configuration, pipeline run, chart output.

use std::fs;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{error, info};

use crem_site::cli::Args;
use crem_site::data::pipeline;
use crem_site::demo;
use crem_site::logging::init_logging;
use crem_site::viz::{NationalTable, TemplateEnv, render_1, render_2};

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = args.load_config()?;
    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        bail!("invalid configuration ({} errors)", errors.len());
    }

    let (prepared, report) = if args.uses_demo_data() {
        let data = demo::generate(&config, args.seed);
        pipeline::run_with(&config, &data.cases, &data.workbook)
    } else {
        pipeline::run(&config)
    }
    .context("data preparation failed")?;

    print!("{report}");
    info!(out_dir = %config.paths.out_dir.display(), "outputs written");

    let templates = TemplateEnv::new(config.paths.template_dir.clone());
    if let Some(path) = &args.viz_out {
        let table = NationalTable::from_dataset(&prepared.national);
        let html = if args.with_nh3 {
            render_2(&table, &config.site, &templates)
        } else {
            render_1(&table, &config.site, &templates)
        }
        .context("chart rendering failed")?;
        fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "chart fragment written");
    }

    #[cfg(feature = "api")]
    if args.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(crem_site::api::AppState::new(&prepared, config.site.clone(), templates));
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
        rt.block_on(crem_site::api::serve(state, addr))
            .with_context(|| format!("preview server on {addr} failed"))?;
    }

    Ok(())
}
