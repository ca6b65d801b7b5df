//! Ensemble merging and rigid-body alignment.
//!
//! The combined ensemble keeps every embedded conformer, then appends the
//! optimized conformers that actually converged, per field, in their
//! original order. The first conformer of the combined set defines the
//! common frame; every later conformer is superposed onto it with the
//! Kabsch algorithm (centroid translation plus least-squares rotation, with
//! the usual reflection correction). The reference itself is never moved.

use nalgebra::{Matrix3, Vector3};

use super::error::Error;
use super::forcefield::OptimizeOutcome;
use super::geom::Vec3;
use crate::model::conformer::Conformer;
use crate::model::molecule::Molecule;

/// Builds the combined molecule and aligns it in place.
///
/// `template` supplies atoms and bonds; conformer survivors are moved in.
/// Runs strictly after embedding and both optimization passes.
pub fn merge_and_align(
    template: &Molecule,
    embedded: Vec<Conformer>,
    uff: (Vec<Conformer>, Vec<OptimizeOutcome>),
    mmff: (Vec<Conformer>, Vec<OptimizeOutcome>),
) -> Result<Molecule, Error> {
    let mut merged = template.topology_clone();

    for conformer in embedded {
        merged.add_conformer(conformer)?;
    }
    for (conformers, outcomes) in [uff, mmff] {
        for (conformer, outcome) in conformers.into_iter().zip(outcomes) {
            if outcome.is_converged() {
                merged.add_conformer(conformer)?;
            }
        }
    }

    align_onto_first(&mut merged);
    Ok(merged)
}

/// Superposes every conformer after the first onto the first.
pub fn align_onto_first(molecule: &mut Molecule) {
    let Some((reference, rest)) = molecule.conformers.split_first_mut() else {
        return;
    };
    let ref_centroid = reference.centroid();
    let ref_centered: Vec<Vec3> = reference
        .coords
        .iter()
        .map(|p| [p[0] - ref_centroid[0], p[1] - ref_centroid[1], p[2] - ref_centroid[2]])
        .collect();

    for conformer in rest {
        superpose(conformer, &ref_centered, ref_centroid);
    }
}

/// Kabsch superposition of `conformer` onto the centered reference cloud.
fn superpose(conformer: &mut Conformer, ref_centered: &[Vec3], ref_centroid: Vec3) {
    let centroid = conformer.centroid();

    let mut covariance = Matrix3::<f64>::zeros();
    for (p, q) in conformer.coords.iter().zip(ref_centered.iter()) {
        let moving = Vector3::new(p[0] - centroid[0], p[1] - centroid[1], p[2] - centroid[2]);
        let target = Vector3::new(q[0], q[1], q[2]);
        covariance += moving * target.transpose();
    }

    let svd = covariance.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return;
    };
    let v = v_t.transpose();
    let d = (v * u.transpose()).determinant().signum();
    let rotation = v * Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, d)) * u.transpose();

    for p in conformer.coords.iter_mut() {
        let moving = Vector3::new(p[0] - centroid[0], p[1] - centroid[1], p[2] - centroid[2]);
        let rotated = rotation * moving;
        *p = [
            rotated[0] + ref_centroid[0],
            rotated[1] + ref_centroid[1],
            rotated[2] + ref_centroid[2],
        ];
    }
}
