//! RMSD annotation against the ensemble reference.
//!
//! Distances are taken as-is, without re-fitting: the ensemble is expected
//! to be rigidly aligned already, so the stored values are prealigned RMSDs
//! against the first conformer.

use crate::model::molecule::Molecule;

/// Annotates every conformer with its RMSD to conformer 0.
///
/// The reference gets exactly 0. A molecule without conformers is left
/// untouched.
pub fn rank(molecule: &mut Molecule) {
    let Some((reference, rest)) = molecule.conformers.split_first_mut() else {
        return;
    };
    reference.rmsd = Some(0.0);

    let n = reference.coords.len();
    for conformer in rest {
        let sum: f64 = conformer
            .coords
            .iter()
            .zip(reference.coords.iter())
            .map(|(p, q)| {
                (p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2) + (p[2] - q[2]).powi(2)
            })
            .sum();
        conformer.rmsd = Some((sum / n as f64).sqrt());
    }
}
