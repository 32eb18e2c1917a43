//! Heston Monte Carlo engine for European options.
//!
//! # Architecture
//!
//! ```text
//! HestonPricer
//! ├── SimulationConfig   (model, contract, discretisation, engine knobs)
//! ├── BlockWorkspace     (per-worker buffers, reused across blocks)
//! └── per block b, seeded with derive_block_seed(master, b)
//!     ├── VariatePair::fill()        correlated normals X1, X2
//!     ├── simulate_variance()        moment-matched scheme, floored at 0
//!     ├── accumulate_log_returns()   log-price driven by V
//!     ├── terminal_prices()          S0 exp(X[nsteps])
//!     └── block_payoff()             discounted call/put means
//! aggregate_blocks()                 batched means + standard errors
//! ```
//!
//! Blocks run on the rayon pool by default ([`ExecutionMode::Parallel`]) or
//! on the calling thread ([`ExecutionMode::Sequential`]); the two are
//! bit-identical for the same seed.
//!
//! # Examples
//!
//! ```rust
//! use pricer_heston::mc::{simulate, SimulationConfigBuilder};
//!
//! let config = SimulationConfigBuilder::sample()
//!     .n_paths(2_000)
//!     .n_blocks(10)
//!     .n_steps(50)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let result = simulate(&config).unwrap();
//! let call = result.aggregate.call();
//!
//! println!("Call: {:.5} +/- {:.5}", call.price, call.confidence_95());
//! assert!(result.aggregate.put_price > result.aggregate.call_price);
//! ```

mod config;
mod diagnostics;
mod error;
mod log_price;
mod matrix;
mod payoff;
mod pricer;
mod stats;
mod variance;
mod variates;
mod workspace;

pub use config::{
    ExecutionMode, SimulationConfig, SimulationConfigBuilder, DEFAULT_CLAMP_WARNING_THRESHOLD,
    MAX_BLOCKS, MAX_MATRIX_ENTRIES, MAX_PATHS, MAX_STEPS, MIN_BLOCKS,
};
pub use diagnostics::{NumericWarning, SimulationDiagnostics};
pub use error::{ConfigError, PricingError};
pub use log_price::{
    accumulate_log_returns, integrate_log_price_path, terminal_prices, LogPriceIntegrator,
};
pub use matrix::PathMatrix;
pub use payoff::{block_payoff, BlockEstimate, BlockPayoff};
pub use pricer::{
    simulate, simulate_with_cancellation, CancellationToken, HestonPricer, PathExport,
    SimulationResult,
};
pub use stats::{aggregate_blocks, AggregateResult, PriceEstimate};
pub use variance::{simulate_variance, VarianceScheme};
pub use variates::{generate_variates, VariatePair};
pub use workspace::BlockWorkspace;
