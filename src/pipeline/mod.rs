//! The conformer generation pipeline.
//!
//! Stages, in order: hydrogen completion, distance-geometry embedding of the
//! requested number of trials, two independent force-field optimization
//! passes (UFF and MMFF) over copies of the embedded set, a merge of the
//! embedded conformers with the converged survivors of each pass, rigid
//! alignment of the combined ensemble onto its first conformer, and RMSD
//! annotation against that reference.
//!
//! All per-trial and per-conformer work runs on a bounded rayon pool; the
//! merge is the single synchronization barrier. Individual trial or
//! optimization failures are absorbed into the [`GenerateSummary`], never
//! escalated; only structural problems with the input abort a run.

pub mod align;
pub mod config;
pub mod embed;
pub mod error;
pub mod forcefield;
pub(crate) mod geom;
pub mod hydro;
pub mod rmsd;
pub mod topology;

use self::embed::Embedder;
use self::forcefield::OptimizeOutcome;
use crate::model::molecule::Molecule;

pub use self::config::GenerateConfig;
pub use self::error::Error;

/// Counters describing what happened during a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateSummary {
    /// Embedding trials requested.
    pub requested: usize,
    /// Trials that produced a usable conformer.
    pub embedded: usize,
    /// Hydrogens appended before embedding.
    pub hydrogens_added: usize,
    pub uff_converged: usize,
    pub uff_failed: usize,
    pub mmff_converged: usize,
    pub mmff_failed: usize,
}

impl GenerateSummary {
    /// Conformers in the final ensemble.
    pub fn total(&self) -> usize {
        self.embedded + self.uff_converged + self.mmff_converged
    }
}

/// A generated, aligned, RMSD-annotated conformer ensemble.
#[derive(Debug, Clone)]
pub struct Ensemble {
    pub molecule: Molecule,
    pub summary: GenerateSummary,
}

/// Runs the full pipeline over `molecule`.
///
/// The input is left untouched; hydrogen completion happens on an internal
/// copy. An ensemble with zero conformers is a valid result, reported
/// through the summary.
///
/// # Errors
///
/// Configuration and structural input problems only; see
/// [`Error`](error::Error).
pub fn generate(molecule: &Molecule, config: &GenerateConfig) -> Result<Ensemble, Error> {
    config.validate()?;

    let mut prepared = molecule.clone();
    let hydrogens_added = hydro::complete_hydrogens(&mut prepared)?;
    let topology = topology::Topology::from_molecule(&prepared)?;

    // rayon maps zero threads to the number of available cores.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.parallelism)
        .build()
        .map_err(|e| Error::ThreadPool(e.to_string()))?;

    let embedder = embed::DistanceGeometry::new(config.embed.clone());
    let (report, uff_result, mmff_result) = pool.install(|| {
        let report = embedder.embed(&prepared, &topology, config.num_conformers, config.base_seed);

        let mut embedded = prepared.topology_clone();
        for conformer in &report.conformers {
            embedded.add_conformer(conformer.clone())?;
        }

        // Both passes read the same frozen embedded set through their own
        // deep copies.
        let (uff_result, mmff_result) = rayon::join(
            || {
                forcefield::optimize_all(
                    &embedded,
                    &topology,
                    &forcefield::uff::Uff,
                    config.max_iterations,
                )
            },
            || {
                forcefield::optimize_all(
                    &embedded,
                    &topology,
                    &forcefield::mmff::Mmff,
                    config.max_iterations,
                )
            },
        );
        Ok::<_, Error>((report, uff_result, mmff_result))
    })?;

    let (uff_converged, uff_failed) = tally(&uff_result.1);
    let (mmff_converged, mmff_failed) = tally(&mmff_result.1);
    let summary = GenerateSummary {
        requested: report.requested,
        embedded: report.conformers.len(),
        hydrogens_added,
        uff_converged,
        uff_failed,
        mmff_converged,
        mmff_failed,
    };

    let mut merged = align::merge_and_align(&prepared, report.conformers, uff_result, mmff_result)?;
    rmsd::rank(&mut merged);

    Ok(Ensemble {
        molecule: merged,
        summary,
    })
}

fn tally(outcomes: &[OptimizeOutcome]) -> (usize, usize) {
    let converged = outcomes.iter().filter(|o| o.is_converged()).count();
    (converged, outcomes.len() - converged)
}
