//! Structure file I/O.
//!
//! The pipeline reads one molecule (topology plus reference geometry) from an
//! SDF V2000 record and writes the final ensemble back out as a multi-record
//! SDF, one record per conformer with an `RMSD` data field.

use std::fmt;

pub mod error;
pub mod util;

pub mod sdf;

pub use error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Sdf,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Sdf => write!(f, "SDF"),
        }
    }
}
