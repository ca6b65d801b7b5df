//! Core data structures for molecules and their conformers.
//!
//! - [`atom`] – Positionless atom (coordinates are conformer-relative).
//! - [`types`] – Supported elements and bond order classifications.
//! - [`molecule`] – Molecular topology owning zero or more conformers.
//! - [`conformer`] – Coordinate overlays with optional RMSD/energy metadata.
//!
//! The topology ([`Molecule`]) is frozen once hydrogens have been completed;
//! the pipeline only ever creates, copies, and transforms [`Conformer`]
//! overlays attached to it.
//!
//! [`Molecule`]: molecule::Molecule
//! [`Conformer`]: conformer::Conformer

pub mod atom;
pub mod conformer;
pub mod molecule;
pub mod types;
