//! Distance-geometry conformer embedding.
//!
//! Each trial samples a random distance matrix inside the smoothed bounds,
//! converts it to a metric matrix, and extracts 3D coordinates from the top
//! three eigenpairs (classical multidimensional scaling), then refines the
//! result against the original bounds. Trials are independent and seeded
//! individually, so they parallelize freely and reproduce exactly for a
//! fixed base seed.

pub mod bounds;
pub mod refine;

use nalgebra::{DMatrix, SymmetricEigen};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use self::bounds::BoundsMatrix;
use super::geom::Vec3;
use super::topology::Topology;
use crate::model::conformer::Conformer;
use crate::model::molecule::Molecule;

/// Tunables for the distance-geometry embedder.
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    /// Gradient-descent steps spent refining each embedded trial.
    pub refine_steps: usize,
    /// Resampling attempts per trial before the trial is dropped.
    pub max_retries: usize,
    /// Largest acceptable residual bound violation, in Ångströms.
    pub violation_tolerance: f64,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            refine_steps: 300,
            max_retries: 4,
            violation_tolerance: 0.5,
        }
    }
}

/// Outcome of an embedding run: the surviving conformers in trial order,
/// plus how many trials were dropped.
#[derive(Debug, Clone, Default)]
pub struct EmbedReport {
    pub conformers: Vec<Conformer>,
    pub requested: usize,
    pub failed_trials: usize,
}

/// Produces initial 3D conformers from topology alone.
pub trait Embedder {
    fn embed(
        &self,
        molecule: &Molecule,
        topology: &Topology,
        requested: usize,
        base_seed: u64,
    ) -> EmbedReport;
}

/// The distance-geometry embedder.
#[derive(Debug, Clone, Default)]
pub struct DistanceGeometry {
    options: EmbedOptions,
}

impl DistanceGeometry {
    pub fn new(options: EmbedOptions) -> Self {
        Self { options }
    }

    fn run_trial(
        &self,
        bounds: &BoundsMatrix,
        topology: &Topology,
        seed: u64,
    ) -> Option<Vec<Vec3>> {
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..=self.options.max_retries {
            let distances = sample_distances(bounds, &mut rng);
            let Some(mut coords) = metric_embed(&distances) else {
                continue;
            };
            let residual = refine::refine(&mut coords, bounds, topology, self.options.refine_steps);
            if residual <= self.options.violation_tolerance {
                return Some(coords);
            }
        }
        None
    }
}

impl Embedder for DistanceGeometry {
    fn embed(
        &self,
        molecule: &Molecule,
        topology: &Topology,
        requested: usize,
        base_seed: u64,
    ) -> EmbedReport {
        let mut matrix = BoundsMatrix::from_topology(molecule, topology);
        if matrix.smooth().is_err() {
            // Infeasible constraints sink every trial at once.
            return EmbedReport {
                conformers: Vec::new(),
                requested,
                failed_trials: requested,
            };
        }

        // Collected by trial index, so output order never depends on
        // scheduling.
        let results: Vec<Option<Vec<Vec3>>> = (0..requested)
            .into_par_iter()
            .map(|trial| {
                self.run_trial(&matrix, topology, base_seed.wrapping_add(trial as u64))
            })
            .collect();

        let failed_trials = results.iter().filter(|r| r.is_none()).count();
        let conformers = results
            .into_iter()
            .flatten()
            .map(Conformer::new)
            .collect();

        EmbedReport {
            conformers,
            requested,
            failed_trials,
        }
    }
}

/// Uniform sample of each pair distance inside its bounds window.
fn sample_distances(bounds: &BoundsMatrix, rng: &mut StdRng) -> DMatrix<f64> {
    let n = bounds.atom_count();
    let mut distances = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let lo = bounds.lower(i, j);
            let hi = bounds.upper(i, j);
            let d = if hi > lo { rng.random_range(lo..=hi) } else { lo };
            distances[(i, j)] = d;
            distances[(j, i)] = d;
        }
    }
    distances
}

/// Classical MDS: double-centered squared distances, eigendecomposed, top
/// three eigenpairs as coordinates. `None` when the metric matrix has no
/// positive spectrum to build from.
fn metric_embed(distances: &DMatrix<f64>) -> Option<Vec<Vec3>> {
    let n = distances.nrows();
    if n == 1 {
        return Some(vec![[0.0; 3]]);
    }

    let sq = distances.map(|d| d * d);
    let row_means: Vec<f64> = (0..n).map(|i| sq.row(i).sum() / n as f64).collect();
    let grand_mean = row_means.iter().sum::<f64>() / n as f64;

    let metric = DMatrix::from_fn(n, n, |i, j| {
        -0.5 * (sq[(i, j)] - row_means[i] - row_means[j] + grand_mean)
    });

    let eigen = SymmetricEigen::new(metric);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[b]
            .partial_cmp(&eigen.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if eigen.eigenvalues[order[0]] <= 0.0 {
        return None;
    }

    let mut coords = vec![[0.0_f64; 3]; n];
    for (axis, &col) in order.iter().take(3).enumerate() {
        let scale = eigen.eigenvalues[col].max(0.0).sqrt();
        for (i, pos) in coords.iter_mut().enumerate() {
            pos[axis] = eigen.eigenvectors[(i, col)] * scale;
        }
    }
    Some(coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;
    use crate::model::molecule::Bond;
    use crate::model::types::{BondOrder, Element};
    use crate::pipeline::hydro;

    fn make_embedded_ethanol() -> (Molecule, Topology) {
        let mut mol = Molecule::new();
        mol.atoms.push(Atom::new(Element::C));
        mol.atoms.push(Atom::new(Element::C));
        mol.atoms.push(Atom::new(Element::O));
        mol.bonds.push(Bond::new(0, 1, BondOrder::Single));
        mol.bonds.push(Bond::new(1, 2, BondOrder::Single));
        mol.add_conformer(Conformer::new(vec![
            [-0.888, 0.167, 0.0],
            [0.470, -0.510, 0.0],
            [1.552, 0.410, 0.0],
        ]))
        .unwrap();
        hydro::complete_hydrogens(&mut mol).unwrap();
        let topo = Topology::from_molecule(&mol).unwrap();
        (mol, topo)
    }

    #[test]
    fn embeds_requested_count_or_fewer() {
        let (mol, topo) = make_embedded_ethanol();
        let embedder = DistanceGeometry::default();
        let report = embedder.embed(&mol, &topo, 5, 7);
        assert_eq!(report.requested, 5);
        assert!(report.conformers.len() <= 5);
        assert_eq!(report.conformers.len() + report.failed_trials, 5);
        for conformer in &report.conformers {
            assert_eq!(conformer.len(), mol.atom_count());
        }
    }

    #[test]
    fn same_seed_reproduces_coordinates() {
        let (mol, topo) = make_embedded_ethanol();
        let embedder = DistanceGeometry::default();
        let a = embedder.embed(&mol, &topo, 3, 42);
        let b = embedder.embed(&mol, &topo, 3, 42);
        assert_eq!(a.conformers.len(), b.conformers.len());
        for (x, y) in a.conformers.iter().zip(b.conformers.iter()) {
            assert_eq!(x.coords, y.coords);
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let (mol, topo) = make_embedded_ethanol();
        let embedder = DistanceGeometry::default();
        let a = embedder.embed(&mol, &topo, 1, 1);
        let b = embedder.embed(&mol, &topo, 1, 2);
        if let (Some(x), Some(y)) = (a.conformers.first(), b.conformers.first()) {
            assert_ne!(x.coords, y.coords);
        }
    }

    #[test]
    fn embedded_bonds_stay_near_natural_length() {
        let (mol, topo) = make_embedded_ethanol();
        let embedder = DistanceGeometry::default();
        let report = embedder.embed(&mol, &topo, 2, 11);
        assert!(!report.conformers.is_empty());

        let tolerance = DistanceGeometry::default().options.violation_tolerance;
        for conformer in &report.conformers {
            for &(i, j, _) in &topo.bonds {
                let d = conformer.distance(i, j);
                let r0 = mol.atoms[i].element.covalent_radius()
                    + mol.atoms[j].element.covalent_radius();
                assert!(
                    (d - r0).abs() < r0 * 0.02 + tolerance,
                    "bond {i}-{j} length {d} vs natural {r0}"
                );
            }
        }
    }

    #[test]
    fn metric_embed_recovers_a_triangle() {
        // 3-4-5 right triangle distances embed exactly.
        let mut distances = DMatrix::zeros(3, 3);
        distances[(0, 1)] = 3.0;
        distances[(1, 0)] = 3.0;
        distances[(0, 2)] = 4.0;
        distances[(2, 0)] = 4.0;
        distances[(1, 2)] = 5.0;
        distances[(2, 1)] = 5.0;
        let coords = metric_embed(&distances).unwrap();
        let d = |a: Vec3, b: Vec3| {
            ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
        };
        assert!((d(coords[0], coords[1]) - 3.0).abs() < 1e-6);
        assert!((d(coords[0], coords[2]) - 4.0).abs() < 1e-6);
        assert!((d(coords[1], coords[2]) - 5.0).abs() < 1e-6);
    }
}
