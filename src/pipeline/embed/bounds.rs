//! Distance-bounds matrix for distance-geometry embedding.
//!
//! Bounds come from the covalent topology: bonded pairs get tight windows
//! around their natural lengths, 1-3 pairs follow the law of cosines at the
//! central atom's ideal angle, 1-4 pairs span the cis..trans range of their
//! torsion, and everything further apart gets a van der Waals floor and a
//! molecular-extent ceiling. Triangle smoothing then tightens every pair
//! against all two-leg paths and detects infeasible inputs.

use crate::model::molecule::Molecule;
use crate::model::types::BondOrder;
use crate::pipeline::topology::Topology;

/// Bond-length tolerance applied symmetrically around the natural length.
const BOND_TOLERANCE: f64 = 0.01;
/// Tolerance on 1-3 distances derived from ideal angles.
const ANGLE_TOLERANCE: f64 = 0.05;
/// Slack below the cis 1-4 distance.
const TORSION_SLACK: f64 = 0.05;
/// Fraction of the summed van der Waals radii used as the non-bonded floor.
const VDW_FLOOR: f64 = 0.7;

/// A lower bound that exceeded its upper bound after smoothing.
///
/// Signals an infeasible set of constraints; the owning embedding trial is
/// dropped, never the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InconsistentBounds {
    pub i: usize,
    pub j: usize,
}

/// Symmetric per-pair distance bounds, row-major over atom indices.
#[derive(Debug, Clone)]
pub struct BoundsMatrix {
    n: usize,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl BoundsMatrix {
    /// Derives the full bounds matrix from the molecule's topology.
    pub fn from_topology(molecule: &Molecule, topology: &Topology) -> Self {
        let n = topology.atom_count();

        // Ceiling: no pair can be further apart than the chain of all bonds.
        let extent: f64 = topology
            .bonds
            .iter()
            .map(|&(i, j, order)| natural_length(molecule, i, j, order))
            .sum::<f64>()
            .max(2.0);

        let mut matrix = Self {
            n,
            lower: vec![0.0; n * n],
            upper: vec![extent; n * n],
        };
        for i in 0..n {
            matrix.upper[i * n + i] = 0.0;
        }

        // Non-bonded floor. Bonded and angle-coupled pairs sit well inside
        // their summed vdW radii, so the floor only applies from 1-4 out.
        for i in 0..n {
            for j in (i + 1)..n {
                if topology.separation(i, j) < 3 {
                    continue;
                }
                let floor = VDW_FLOOR
                    * (molecule.atoms[i].element.vdw_radius()
                        + molecule.atoms[j].element.vdw_radius());
                matrix.raise_lower(i, j, floor);
            }
        }

        for &(i, j, order) in &topology.bonds {
            let r0 = natural_length(molecule, i, j, order);
            matrix.set_window(i, j, r0 * (1.0 - BOND_TOLERANCE), r0 * (1.0 + BOND_TOLERANCE));
        }

        for &[i, j, k] in &topology.angles {
            let r_ij = natural_length_of(molecule, topology, i, j);
            let r_jk = natural_length_of(molecule, topology, j, k);
            let theta = topology.ideal_angle(j, molecule.atoms[j].element);
            let d13 =
                (r_ij * r_ij + r_jk * r_jk - 2.0 * r_ij * r_jk * theta.cos()).max(0.0).sqrt();
            matrix.set_window(i, k, d13 * (1.0 - ANGLE_TOLERANCE), d13 * (1.0 + ANGLE_TOLERANCE));
        }

        for &[i, j, k, l] in &topology.torsions {
            if topology.separation(i, l) != 3 {
                // Ring closures put the pair in a tighter class already.
                continue;
            }
            let r1 = natural_length_of(molecule, topology, i, j);
            let r2 = natural_length_of(molecule, topology, j, k);
            let r3 = natural_length_of(molecule, topology, k, l);
            let theta_j = topology.ideal_angle(j, molecule.atoms[j].element);
            let theta_k = topology.ideal_angle(k, molecule.atoms[k].element);
            let cis = torsion_distance(r1, r2, r3, theta_j, theta_k, 0.0);
            let trans = torsion_distance(r1, r2, r3, theta_j, theta_k, std::f64::consts::PI);
            matrix.set_window(i, l, cis * (1.0 - TORSION_SLACK), trans * (1.0 + BOND_TOLERANCE));
        }

        matrix
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn lower(&self, i: usize, j: usize) -> f64 {
        self.lower[i * self.n + j]
    }

    #[inline]
    pub fn upper(&self, i: usize, j: usize) -> f64 {
        self.upper[i * self.n + j]
    }

    fn set_window(&mut self, i: usize, j: usize, lo: f64, hi: f64) {
        let a = i * self.n + j;
        let b = j * self.n + i;
        // Windows from independent paths are intersected.
        let lo = self.lower[a].max(lo);
        let hi = self.upper[a].min(hi);
        self.lower[a] = lo;
        self.lower[b] = lo;
        self.upper[a] = hi;
        self.upper[b] = hi;
    }

    fn raise_lower(&mut self, i: usize, j: usize, lo: f64) {
        let a = i * self.n + j;
        let b = j * self.n + i;
        let lo = self.lower[a].max(lo);
        self.lower[a] = lo;
        self.lower[b] = lo;
    }

    /// Triangle smoothing: upper bounds shrink to the shortest two-leg path,
    /// lower bounds grow to the inverse-triangle limit. Reports the first
    /// pair whose window becomes empty.
    pub fn smooth(&mut self) -> Result<(), InconsistentBounds> {
        let n = self.n;
        for k in 0..n {
            for i in 0..n {
                let u_ik = self.upper[i * n + k];
                for j in 0..n {
                    let via = u_ik + self.upper[k * n + j];
                    if via < self.upper[i * n + j] {
                        self.upper[i * n + j] = via;
                    }
                }
            }
        }
        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    let limit = (self.lower[i * n + k] - self.upper[k * n + j])
                        .max(self.lower[k * n + j] - self.upper[i * n + k]);
                    if limit > self.lower[i * n + j] {
                        self.lower[i * n + j] = limit;
                    }
                }
            }
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if self.lower[i * n + j] > self.upper[i * n + j] + 1e-9 {
                    return Err(InconsistentBounds { i, j });
                }
            }
        }
        Ok(())
    }
}

/// Natural bond length: covalent radii sum with a multiple-bond contraction.
fn natural_length(molecule: &Molecule, i: usize, j: usize, order: BondOrder) -> f64 {
    let base =
        molecule.atoms[i].element.covalent_radius() + molecule.atoms[j].element.covalent_radius();
    let correction = match order {
        BondOrder::Single => 0.0,
        BondOrder::Double => 0.14,
        BondOrder::Triple => 0.24,
        BondOrder::Aromatic => 0.07,
    };
    (base - correction).max(0.6)
}

fn natural_length_of(molecule: &Molecule, topology: &Topology, i: usize, j: usize) -> f64 {
    let order = topology.bond_order(i, j).unwrap_or_default();
    natural_length(molecule, i, j, order)
}

/// Distance between the terminal atoms of an `i-j-k-l` chain with the given
/// bond lengths, bend angles, and dihedral.
fn torsion_distance(r1: f64, r2: f64, r3: f64, theta_j: f64, theta_k: f64, phi: f64) -> f64 {
    // j at the origin, k along +x; i in the xy plane.
    let i_pos = [r1 * theta_j.cos(), r1 * theta_j.sin(), 0.0];
    let l_pos = [
        r2 - r3 * theta_k.cos(),
        r3 * theta_k.sin() * phi.cos(),
        r3 * theta_k.sin() * phi.sin(),
    ];
    let d = [l_pos[0] - i_pos[0], l_pos[1] - i_pos[1], l_pos[2] - i_pos[2]];
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;
    use crate::model::conformer::Conformer;
    use crate::model::molecule::Bond;
    use crate::model::types::Element;

    fn make_propane_heavy() -> (Molecule, Topology) {
        let mut mol = Molecule::new();
        for _ in 0..3 {
            mol.atoms.push(Atom::new(Element::C));
        }
        mol.bonds.push(Bond::new(0, 1, BondOrder::Single));
        mol.bonds.push(Bond::new(1, 2, BondOrder::Single));
        mol.add_conformer(Conformer::new(vec![[0.0; 3]; 3])).unwrap();
        let topo = Topology::from_molecule(&mol).unwrap();
        (mol, topo)
    }

    #[test]
    fn bonded_pair_gets_tight_window() {
        let (mol, topo) = make_propane_heavy();
        let bounds = BoundsMatrix::from_topology(&mol, &topo);
        let r0 = 2.0 * Element::C.covalent_radius();
        assert!((bounds.lower(0, 1) - r0 * 0.99).abs() < 1e-9);
        assert!((bounds.upper(0, 1) - r0 * 1.01).abs() < 1e-9);
        assert_eq!(bounds.lower(0, 1), bounds.lower(1, 0));
    }

    #[test]
    fn one_three_pair_follows_law_of_cosines() {
        let (mol, topo) = make_propane_heavy();
        let bounds = BoundsMatrix::from_topology(&mol, &topo);
        let r = 2.0 * Element::C.covalent_radius();
        let theta = 109.47_f64.to_radians();
        let d13 = (2.0 * r * r * (1.0 - theta.cos())).sqrt();
        assert!(bounds.lower(0, 2) < d13 && d13 < bounds.upper(0, 2));
    }

    #[test]
    fn torsion_distance_is_monotone_in_dihedral() {
        let theta = 109.47_f64.to_radians();
        let cis = torsion_distance(1.5, 1.5, 1.5, theta, theta, 0.0);
        let gauche = torsion_distance(1.5, 1.5, 1.5, theta, theta, 60.0_f64.to_radians());
        let trans = torsion_distance(1.5, 1.5, 1.5, theta, theta, std::f64::consts::PI);
        assert!(cis < gauche && gauche < trans);
    }

    #[test]
    fn smoothing_caps_distant_pairs() {
        let mut mol = Molecule::new();
        for _ in 0..4 {
            mol.atoms.push(Atom::new(Element::C));
        }
        mol.bonds.push(Bond::new(0, 1, BondOrder::Single));
        mol.bonds.push(Bond::new(1, 2, BondOrder::Single));
        mol.bonds.push(Bond::new(2, 3, BondOrder::Single));
        mol.add_conformer(Conformer::new(vec![[0.0; 3]; 4])).unwrap();
        let topo = Topology::from_molecule(&mol).unwrap();

        let mut bounds = BoundsMatrix::from_topology(&mol, &topo);
        bounds.smooth().unwrap();

        // After smoothing the 0..3 upper bound cannot exceed the two-leg
        // path through the 1-3 windows.
        let via = bounds.upper(0, 2) + bounds.upper(2, 3);
        assert!(bounds.upper(0, 3) <= via + 1e-9);
        assert!(bounds.lower(0, 3) <= bounds.upper(0, 3));
    }

    #[test]
    fn vdw_floor_starts_at_torsion_range() {
        // n-pentane heavy chain: pair (0, 4) sits beyond any torsion window
        let mut mol = Molecule::new();
        for _ in 0..5 {
            mol.atoms.push(Atom::new(Element::C));
        }
        for i in 0..4 {
            mol.bonds.push(Bond::new(i, i + 1, BondOrder::Single));
        }
        mol.add_conformer(Conformer::new(vec![[0.0; 3]; 5])).unwrap();
        let topo = Topology::from_molecule(&mol).unwrap();

        let bounds = BoundsMatrix::from_topology(&mol, &topo);
        let floor = VDW_FLOOR * 2.0 * Element::C.vdw_radius();
        assert_eq!(bounds.lower(0, 4), floor);
        // the bonded and 1-3 windows stay below the floor
        assert!(bounds.upper(0, 1) < floor);
        assert!(bounds.lower(0, 2) < floor);
    }

    #[test]
    fn hydrogenated_alcohol_bounds_are_feasible() {
        // isopropanol skeleton with completed hydrogens must survive
        // smoothing, otherwise every embedding trial dies at once
        let mut mol = Molecule::new();
        mol.atoms.push(Atom::new(Element::C));
        mol.atoms.push(Atom::new(Element::C));
        mol.atoms.push(Atom::new(Element::C));
        mol.atoms.push(Atom::new(Element::O));
        mol.bonds.push(Bond::new(0, 1, BondOrder::Single));
        mol.bonds.push(Bond::new(1, 2, BondOrder::Single));
        mol.bonds.push(Bond::new(1, 3, BondOrder::Single));
        mol.add_conformer(Conformer::new(vec![
            [-1.2622, 0.7076, 0.0],
            [0.0, -0.1537, 0.0],
            [1.2622, 0.7076, 0.0],
            [0.0, -0.86, 1.14],
        ]))
        .unwrap();
        crate::pipeline::hydro::complete_hydrogens(&mut mol).unwrap();
        let topo = Topology::from_molecule(&mol).unwrap();

        let mut bounds = BoundsMatrix::from_topology(&mol, &topo);
        assert!(bounds.smooth().is_ok());
        for &(i, j, _) in &topo.bonds {
            assert!(
                bounds.lower(i, j) <= bounds.upper(i, j),
                "empty window on bond {i}-{j}"
            );
        }
    }

    #[test]
    fn smoothing_detects_infeasible_windows() {
        let (mol, topo) = make_propane_heavy();
        let mut bounds = BoundsMatrix::from_topology(&mol, &topo);
        // Demand atoms 0 and 2 sit further apart than the bonds allow.
        bounds.set_window(0, 2, 50.0, 60.0);
        assert!(bounds.smooth().is_err());
    }
}
