//! # Random Number Generation
//!
//! Seeded random number generation for the Monte Carlo engine.
//!
//! ## Design
//!
//! - **Reproducibility**: every generator is constructed from an explicit seed
//! - **Block independence**: [`derive_block_seed`] maps `(master, block)` to a
//!   distinct stream, so blocks may run on any thread in any order
//! - **Efficiency**: zero-allocation batch fills via `&mut [f64]` slices
//!
//! ## Usage Example
//!
//! ```rust
//! use pricer_heston::rng::{derive_block_seed, PricerRng};
//!
//! let master = 2024;
//! let mut rng = PricerRng::from_seed(derive_block_seed(master, 0));
//!
//! let mut buffer = vec![0.0; 1000];
//! rng.fill_normal(&mut buffer);
//! ```

mod prng;

pub use prng::{derive_block_seed, entropy_seed, PricerRng};

#[cfg(test)]
mod tests;
