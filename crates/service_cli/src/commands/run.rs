//! Run command implementation
//!
//! Prices the configured European call and put and reports prices, standard
//! errors and numeric diagnostics.

use clap::ValueEnum;
use pricer_heston::mc::PriceEstimate;
use pricer_heston::{simulate, SimulationConfig, SimulationResult};
use serde::Serialize;
use tracing::info;

use crate::Result;

/// Output formats of the run command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Serialize)]
struct RunReport<'a> {
    config: &'a SimulationConfig,
    result: &'a SimulationResult,
}

/// Run the pricing command
pub fn run(config: &SimulationConfig, format: OutputFormat) -> Result<()> {
    info!(
        n_paths = config.n_paths(),
        n_blocks = config.n_blocks(),
        n_steps = config.n_steps(),
        "Starting pricing..."
    );

    let result = simulate(config)?;

    let rendered = match format {
        OutputFormat::Table => render_table(config, &result),
        OutputFormat::Json => render_json(config, &result)?,
    };
    println!("{}", rendered);

    info!("Pricing complete");
    Ok(())
}

fn render_json(config: &SimulationConfig, result: &SimulationResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(&RunReport { config, result })?)
}

fn price_row(label: &str, estimate: PriceEstimate) -> String {
    let (lo, hi) = estimate.interval(1.96);
    format!(
        "│ {:<6} │ {:>10.6} │ {:>10.6} │ [{:>9.6}, {:>9.6}] │",
        label, estimate.price, estimate.std_error, lo, hi
    )
}

fn render_table(config: &SimulationConfig, result: &SimulationResult) -> String {
    let agg = &result.aggregate;
    let diagnostics = &result.diagnostics;
    let mut lines = Vec::new();

    lines.push(format!(
        "Heston Monte Carlo: seed {}, {} blocks x {} paths, {} steps",
        result.seed,
        config.n_blocks(),
        config.n_paths(),
        config.n_steps()
    ));
    lines.push("┌────────┬────────────┬────────────┬────────────────────────┐".to_string());
    lines.push("│ Option │ Price      │ Std Error  │ 95% CI                 │".to_string());
    lines.push("├────────┼────────────┼────────────┼────────────────────────┤".to_string());
    lines.push(price_row("Call", agg.call()));
    lines.push(price_row("Put", agg.put()));
    lines.push("└────────┴────────────┴────────────┴────────────────────────┘".to_string());

    lines.push(format!(
        "Put-call parity gap: {:.6} (C+P std errors: {:.6})",
        agg.parity_gap(config),
        agg.parity_tolerance()
    ));
    lines.push(format!(
        "Variance floor hits: {} of {} updates ({:.3}%), Feller condition {}",
        diagnostics.clamped_updates,
        diagnostics.total_updates,
        diagnostics.clamp_ratio() * 100.0,
        if diagnostics.feller_satisfied {
            "satisfied"
        } else {
            "violated"
        }
    ));
    for warning in &diagnostics.warnings {
        lines.push(format!("Warning: {}", warning));
    }
    if let Some(paths) = &result.paths {
        lines.push(format!(
            "Exported paths: block {} ({} x {}); use --format json to retrieve them",
            paths.block_index,
            paths.variance.n_rows(),
            paths.variance.n_paths()
        ));
    }

    lines.join("\n")
}
