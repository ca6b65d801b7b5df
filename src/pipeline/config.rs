//! Run configuration for conformer generation.

use super::embed::EmbedOptions;
use super::error::Error;

/// Seed used when the caller does not supply one; runs are reproducible by
/// default.
pub const DEFAULT_SEED: u64 = 0x00C0_FFEE;

/// Tunables for a full generation run.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Embedding trials requested; the ensemble may end up smaller.
    pub num_conformers: usize,
    /// Iteration cap shared by both force-field optimization passes.
    pub max_iterations: usize,
    /// Worker threads; 0 means all available cores.
    pub parallelism: usize,
    /// Base RNG seed; trial `t` uses `base_seed + t`.
    pub base_seed: u64,
    /// Embedder tunables.
    pub embed: EmbedOptions,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            num_conformers: 100,
            max_iterations: 200,
            parallelism: 0,
            base_seed: DEFAULT_SEED,
            embed: EmbedOptions::default(),
        }
    }
}

impl GenerateConfig {
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] when a count that must be positive is zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.num_conformers == 0 {
            return Err(Error::InvalidConfig(
                "number of conformers must be at least 1".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig(
                "maximum iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
