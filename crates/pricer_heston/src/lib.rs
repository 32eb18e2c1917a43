//! # Heston Monte Carlo Pricer
//!
//! Prices European calls and puts under the Heston stochastic-volatility
//! model by simulating correlated price/variance paths in independent
//! blocks and reporting batched-means standard errors.
//!
//! ## Modules
//!
//! - [`rng`]: seeded generator and per-block sub-seed derivation
//! - [`mc`]: configuration, path simulation, payoffs, block statistics and
//!   the block-parallel pricer
//!
//! ## Usage Example
//!
//! ```rust
//! use pricer_heston::{simulate, SimulationConfig};
//!
//! let config = SimulationConfig::builder()
//!     .kappa(3.0)
//!     .theta(0.1)
//!     .epsilon(0.25)
//!     .v0(0.08)
//!     .rho(-0.8)
//!     .spot(1.0)
//!     .strike(1.1)
//!     .rate(0.02)
//!     .maturity(1.0)
//!     .n_paths(1_000)
//!     .n_blocks(8)
//!     .n_steps(50)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! let result = simulate(&config).unwrap();
//! assert!(result.aggregate.call_stderr.is_finite());
//! ```
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` for the configuration builder,
//!   results, diagnostics and path exports

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod mc;
pub mod rng;

pub use mc::{
    simulate, simulate_with_cancellation, AggregateResult, ConfigError, PricingError,
    SimulationConfig, SimulationConfigBuilder, SimulationResult,
};
