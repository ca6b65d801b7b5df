//! Small-molecule conformer ensemble generation.
//!
//! Reads a molecule from SDF, completes its hydrogens, embeds a set of 3D
//! conformers with distance geometry, refines copies of them under two
//! independent empirical force fields, merges the survivors into one rigidly
//! aligned ensemble, and annotates every conformer with its RMSD against the
//! reference.
//!
//! # Example
//!
//! ```
//! use conf_forge::model::atom::Atom;
//! use conf_forge::model::conformer::Conformer;
//! use conf_forge::model::molecule::Molecule;
//! use conf_forge::model::types::Element;
//! use conf_forge::pipeline::{self, GenerateConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut molecule = Molecule::new();
//! molecule.atoms.push(Atom::new(Element::C));
//! molecule.add_conformer(Conformer::new(vec![[0.0; 3]]))?;
//!
//! let config = GenerateConfig {
//!     num_conformers: 2,
//!     max_iterations: 100,
//!     parallelism: 1,
//!     ..Default::default()
//! };
//! let ensemble = pipeline::generate(&molecule, &config)?;
//! // one carbon becomes methane before embedding
//! assert_eq!(ensemble.summary.hydrogens_added, 4);
//! # Ok(())
//! # }
//! ```

pub mod io;
pub mod model;
pub mod pipeline;
