//! Check command implementation
//!
//! Prints the resolved configuration and its derived quantities without
//! simulating.

use pricer_heston::SimulationConfig;
use tracing::info;

use crate::Result;

/// Run the check command
pub fn run(config: &SimulationConfig) -> Result<()> {
    println!("{}", render(config));
    info!(feller = config.satisfies_feller(), "Configuration is valid");
    Ok(())
}

fn render(config: &SimulationConfig) -> String {
    let seed = config
        .seed()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "entropy".to_string());
    let feller_lhs = 2.0 * config.kappa() * config.theta();
    let feller_rhs = config.epsilon() * config.epsilon();

    [
        "Configuration OK".to_string(),
        format!(
            "  model:     kappa={} theta={} epsilon={} v0={} rho={}",
            config.kappa(),
            config.theta(),
            config.epsilon(),
            config.v0(),
            config.rho()
        ),
        format!(
            "  contract:  S0={} K={} r={} q={} T={}",
            config.spot(),
            config.strike(),
            config.rate(),
            config.dividend_yield(),
            config.maturity()
        ),
        format!(
            "  sampling:  {} blocks x {} paths, {} steps (dt={:.6}), seed {}, {}",
            config.n_blocks(),
            config.n_paths(),
            config.n_steps(),
            config.dt(),
            seed,
            config.execution()
        ),
        format!(
            "  derived:   mu={} discount factor={:.6}",
            config.mu(),
            config.discount_factor()
        ),
        format!(
            "  feller:    2*kappa*theta={:.6} {} epsilon^2={:.6}",
            feller_lhs,
            if config.satisfies_feller() { ">=" } else { "<" },
            feller_rhs
        ),
    ]
    .join("\n")
}
