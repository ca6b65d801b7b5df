//! Violation refinement for freshly embedded coordinates.
//!
//! Classical MDS reproduces the sampled distance matrix only approximately,
//! so embedded coordinates usually violate some of the original bounds. This
//! stage runs plain gradient descent on the sum of squared bound violations,
//! with a planarity penalty keeping sp2 centers in the plane of their three
//! neighbors, and reports the worst remaining violation so the embedder can
//! decide whether the trial survives.

use super::bounds::BoundsMatrix;
use crate::pipeline::geom::{self, Vec3};
use crate::pipeline::topology::Topology;

const STEP_SIZE: f64 = 0.02;
const PLANARITY_WEIGHT: f64 = 2.0;

/// Refines `coords` in place and returns the largest absolute bound
/// violation (in Ångströms) remaining after `steps` descent steps.
pub fn refine(
    coords: &mut [Vec3],
    bounds: &BoundsMatrix,
    topology: &Topology,
    steps: usize,
) -> f64 {
    let planar: Vec<(usize, [usize; 3])> = topology
        .planar_centers()
        .into_iter()
        .map(|c| {
            let nb = &topology.neighbors[c];
            (c, [nb[0], nb[1], nb[2]])
        })
        .collect();

    let mut gradient = vec![[0.0; 3]; coords.len()];
    for _ in 0..steps {
        for g in gradient.iter_mut() {
            *g = [0.0; 3];
        }
        let violated = accumulate_gradient(coords, bounds, &planar, &mut gradient);
        if !violated {
            break;
        }
        for (pos, g) in coords.iter_mut().zip(gradient.iter()) {
            *pos = geom::sub(*pos, geom::scale(*g, STEP_SIZE));
        }
    }

    max_violation(coords, bounds)
}

/// Adds the violation gradient to `gradient`; returns whether any bound was
/// violated this pass.
fn accumulate_gradient(
    coords: &[Vec3],
    bounds: &BoundsMatrix,
    planar: &[(usize, [usize; 3])],
    gradient: &mut [Vec3],
) -> bool {
    let n = coords.len();
    let mut violated = false;

    for i in 0..n {
        for j in (i + 1)..n {
            let delta = geom::sub(coords[j], coords[i]);
            let d = geom::norm(delta).max(1e-6);
            let excess = if d > bounds.upper(i, j) {
                d - bounds.upper(i, j)
            } else if d < bounds.lower(i, j) {
                d - bounds.lower(i, j)
            } else {
                continue;
            };
            violated = true;
            // dE/dd = 2 * excess, distributed along the pair axis.
            let push = geom::scale(delta, 2.0 * excess / d);
            gradient[i] = geom::sub(gradient[i], push);
            gradient[j] = geom::add(gradient[j], push);
        }
    }

    for &(center, [a, b, c]) in planar {
        let Some(normal) = geom::normalize(geom::cross(
            geom::sub(coords[b], coords[a]),
            geom::sub(coords[c], coords[a]),
        )) else {
            continue;
        };
        let offset = geom::dot(geom::sub(coords[center], coords[a]), normal);
        if offset.abs() < 1e-9 {
            continue;
        }
        violated = true;
        let pull = geom::scale(normal, 2.0 * PLANARITY_WEIGHT * offset);
        gradient[center] = geom::add(gradient[center], pull);
        // Counter-push keeps the fragment centroid stationary.
        let share = geom::scale(pull, -1.0 / 3.0);
        for nb in [a, b, c] {
            gradient[nb] = geom::add(gradient[nb], share);
        }
    }

    violated
}

/// Largest absolute violation of any pair bound.
pub fn max_violation(coords: &[Vec3], bounds: &BoundsMatrix) -> f64 {
    let n = coords.len();
    let mut worst = 0.0_f64;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = geom::norm(geom::sub(coords[j], coords[i]));
            let over = d - bounds.upper(i, j);
            let under = bounds.lower(i, j) - d;
            worst = worst.max(over).max(under);
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;
    use crate::model::conformer::Conformer;
    use crate::model::molecule::{Bond, Molecule};
    use crate::model::types::{BondOrder, Element};

    fn make_stretched_pair() -> (Molecule, Topology, Vec<Vec3>) {
        let mut mol = Molecule::new();
        mol.atoms.push(Atom::new(Element::C));
        mol.atoms.push(Atom::new(Element::C));
        mol.bonds.push(Bond::new(0, 1, BondOrder::Single));
        mol.add_conformer(Conformer::new(vec![[0.0; 3]; 2])).unwrap();
        let topo = Topology::from_molecule(&mol).unwrap();
        // Start far outside the bond window.
        let coords = vec![[0.0, 0.0, 0.0], [4.0, 0.0, 0.0]];
        (mol, topo, coords)
    }

    #[test]
    fn refinement_reduces_violations() {
        let (mol, topo, mut coords) = make_stretched_pair();
        let mut bounds = BoundsMatrix::from_topology(&mol, &topo);
        bounds.smooth().unwrap();

        let before = max_violation(&coords, &bounds);
        let after = refine(&mut coords, &bounds, &topo, 500);
        assert!(before > 1.0);
        assert!(after < before);
        assert!(after < 0.1, "residual violation {after}");
    }

    #[test]
    fn satisfied_bounds_are_left_alone() {
        let (mol, topo, _) = make_stretched_pair();
        let mut bounds = BoundsMatrix::from_topology(&mol, &topo);
        bounds.smooth().unwrap();

        let r0 = 2.0 * Element::C.covalent_radius();
        let mut coords = vec![[0.0, 0.0, 0.0], [r0, 0.0, 0.0]];
        let snapshot = coords.clone();
        let residual = refine(&mut coords, &bounds, &topo, 100);
        assert_eq!(coords, snapshot);
        assert!(residual.abs() < 1e-12);
    }

    #[test]
    fn planar_center_is_flattened() {
        // formaldehyde-like sp2 carbon pushed out of its neighbor plane
        let mut mol = Molecule::new();
        mol.atoms.push(Atom::new(Element::C));
        mol.atoms.push(Atom::new(Element::O));
        mol.atoms.push(Atom::new(Element::H));
        mol.atoms.push(Atom::new(Element::H));
        mol.bonds.push(Bond::new(0, 1, BondOrder::Double));
        mol.bonds.push(Bond::new(0, 2, BondOrder::Single));
        mol.bonds.push(Bond::new(0, 3, BondOrder::Single));
        mol.add_conformer(Conformer::new(vec![[0.0; 3]; 4])).unwrap();
        let topo = Topology::from_molecule(&mol).unwrap();
        let mut bounds = BoundsMatrix::from_topology(&mol, &topo);
        bounds.smooth().unwrap();

        let mut coords = vec![
            [0.0, 0.0, 0.45],
            [1.21, 0.0, 0.0],
            [-0.55, 0.94, 0.0],
            [-0.55, -0.94, 0.0],
        ];
        refine(&mut coords, &bounds, &topo, 800);

        let a = coords[1];
        let normal = geom::normalize(geom::cross(
            geom::sub(coords[2], a),
            geom::sub(coords[3], a),
        ))
        .unwrap();
        let offset = geom::dot(geom::sub(coords[0], a), normal);
        assert!(offset.abs() < 0.1, "out-of-plane offset {offset}");
    }
}
