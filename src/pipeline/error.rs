//! Error type for the conformer generation pipeline.
//!
//! Only structural problems with the input molecule or the run configuration
//! abort a run. Per-trial embedding failures and per-conformer optimization
//! failures are absorbed into the run summary, never escalated.

use thiserror::Error;

/// Errors that can occur while generating a conformer ensemble.
#[derive(Debug, Error)]
pub enum Error {
    /// The input molecule has no atoms.
    #[error("input molecule is empty: at least one atom is required")]
    EmptyMolecule,

    /// The input molecule carries no reference conformer.
    ///
    /// Hydrogen completion derives new positions from the existing geometry,
    /// so a molecule without any coordinates cannot enter the pipeline.
    #[error("input molecule has no reference conformer")]
    MissingReference,

    /// A bond references an atom outside the molecule.
    #[error("invalid bond between atoms {i} and {j}: {detail}")]
    InvalidBond {
        /// First atom index.
        i: usize,
        /// Second atom index.
        j: usize,
        /// Description of the problem.
        detail: String,
    },

    /// A configuration value is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The bounded worker pool could not be constructed.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    /// A conformer violated the coordinate-count invariant.
    #[error("conformer mismatch: {0}")]
    Conformer(#[from] crate::model::molecule::ConformerMismatch),
}

impl Error {
    pub fn invalid_bond(i: usize, j: usize, details: impl Into<String>) -> Self {
        Self::InvalidBond {
            i,
            j,
            detail: details.into(),
        }
    }
}
