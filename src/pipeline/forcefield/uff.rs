//! UFF-style force field.
//!
//! Broad element coverage: natural bond lengths from covalent radii with
//! bond-order and electronegativity corrections, stretch force constants
//! from the effective-charge formula, cosine-Fourier angle bending, periodic
//! torsions keyed on hybridization, and a 12-6 van der Waals potential. No
//! electrostatics.

use std::collections::HashMap;

use super::{
    AngleForm, AngleTerm, BondTerm, FieldError, ForceField, Hybridization, PairTerm, TermSet,
    TorsionTerm, VdwStyle, hybridization,
};
use crate::model::molecule::Molecule;
use crate::model::types::Element;
use crate::pipeline::topology::{NONBONDED_SEPARATION, Topology};

/// Stretch force-constant prefactor, kcal/(mol·Å³).
const STRETCH_PREFACTOR: f64 = 664.12;
/// Bond-order contraction coefficient.
const ORDER_COEFF: f64 = 0.1332;
/// 1-4 van der Waals scaling.
const VDW_14_SCALE: f64 = 0.5;

/// Per-element parameters: vdW minimum distance `x` (Å), well depth `d`
/// (kcal/mol), effective charge `z`, and sp3 torsional barrier `v`
/// (kcal/mol).
struct Params {
    x: f64,
    d: f64,
    z: f64,
    v: f64,
}

fn params(element: Element) -> Params {
    let (x, d, z, v) = match element {
        Element::H => (2.886, 0.044, 0.712, 0.0),
        Element::B => (4.083, 0.180, 1.755, 4.02),
        Element::C => (3.851, 0.105, 1.912, 2.119),
        Element::N => (3.660, 0.069, 2.544, 0.450),
        Element::O => (3.500, 0.060, 2.300, 0.018),
        Element::F => (3.364, 0.050, 1.735, 0.0),
        Element::Na => (2.983, 0.030, 1.081, 0.0),
        Element::Mg => (3.021, 0.111, 1.787, 0.0),
        Element::Al => (4.499, 0.505, 1.792, 0.0),
        Element::Si => (4.295, 0.402, 2.323, 1.225),
        Element::P => (4.147, 0.305, 2.863, 2.400),
        Element::S => (4.035, 0.274, 2.703, 0.484),
        Element::Cl => (3.947, 0.227, 2.348, 0.0),
        Element::K => (3.812, 0.035, 1.165, 0.0),
        Element::Ca => (3.399, 0.238, 2.141, 0.0),
        Element::Zn => (2.763, 0.124, 1.308, 0.0),
        Element::Ga => (4.383, 0.415, 1.821, 0.0),
        Element::Ge => (4.280, 0.379, 2.789, 0.701),
        Element::As => (4.230, 0.309, 2.864, 1.5),
        Element::Se => (4.205, 0.291, 2.764, 0.335),
        Element::Br => (4.189, 0.251, 2.519, 0.0),
        Element::Sn => (4.392, 0.567, 2.961, 0.199),
        Element::Sb => (4.420, 0.449, 2.704, 1.1),
        Element::Te => (4.470, 0.398, 2.882, 0.3),
        Element::I => (4.500, 0.339, 2.650, 0.0),
    };
    Params { x, d, z, v }
}

/// The UFF-style field. Stateless; parameters are compiled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uff;

impl Uff {
    /// Natural bond length: covalent radii corrected for bond order and the
    /// electronegativity mismatch of the partners.
    fn natural_length(&self, molecule: &Molecule, topology: &Topology, i: usize, j: usize) -> f64 {
        let (ei, ej) = (molecule.atoms[i].element, molecule.atoms[j].element);
        let (ri, rj) = (ei.covalent_radius(), ej.covalent_radius());
        let order = topology.bond_order(i, j).unwrap_or_default().numeric();
        let r_order = -ORDER_COEFF * (ri + rj) * order.ln();
        let (chi_i, chi_j) = (ei.electronegativity(), ej.electronegativity());
        let r_en =
            ri * rj * (chi_i.sqrt() - chi_j.sqrt()).powi(2) / (chi_i * ri + chi_j * rj);
        ri + rj + r_order - r_en
    }
}

impl ForceField for Uff {
    fn name(&self) -> &'static str {
        "UFF"
    }

    fn parameterize(
        &self,
        molecule: &Molecule,
        topology: &Topology,
    ) -> Result<TermSet, FieldError> {
        let mut bonds = Vec::with_capacity(topology.bonds.len());
        for &(i, j, _) in &topology.bonds {
            let r0 = self.natural_length(molecule, topology, i, j);
            let zi = params(molecule.atoms[i].element).z;
            let zj = params(molecule.atoms[j].element).z;
            bonds.push(BondTerm {
                i,
                j,
                r0,
                k: STRETCH_PREFACTOR * zi * zj / (r0 * r0 * r0),
                cubic: 0.0,
            });
        }

        let mut angles = Vec::with_capacity(topology.angles.len());
        for &[i, j, k] in &topology.angles {
            let theta0 = topology.ideal_angle(j, molecule.atoms[j].element);
            let r_ij = self.natural_length(molecule, topology, i, j);
            let r_jk = self.natural_length(molecule, topology, j, k);
            let cos_t0 = theta0.cos();
            let r_ik_sq = r_ij * r_ij + r_jk * r_jk - 2.0 * r_ij * r_jk * cos_t0;
            let r_ik = r_ik_sq.max(0.0).sqrt();
            let zi = params(molecule.atoms[i].element).z;
            let zk = params(molecule.atoms[k].element).z;
            let force = STRETCH_PREFACTOR * zi * zk / r_ik.powi(5)
                * (3.0 * r_ij * r_jk * (1.0 - cos_t0 * cos_t0) - r_ik_sq * cos_t0);

            let form = if theta0.sin() < 1e-3 {
                // Linear center: single-minimum form with its minimum at pi.
                AngleForm::CosineFourier {
                    c0: 1.0,
                    c1: 1.0,
                    c2: 0.0,
                    k: force,
                }
            } else {
                let c2 = 1.0 / (4.0 * theta0.sin().powi(2));
                let c1 = -4.0 * c2 * cos_t0;
                let c0 = c2 * (2.0 * cos_t0 * cos_t0 + 1.0);
                AngleForm::CosineFourier {
                    c0,
                    c1,
                    c2,
                    k: force,
                }
            };
            angles.push(AngleTerm {
                atoms: [i, j, k],
                form,
            });
        }

        // The barrier of a central bond is shared across every torsion that
        // runs through it.
        let mut torsions_per_bond: HashMap<(usize, usize), usize> = HashMap::new();
        for &[_, j, k, _] in &topology.torsions {
            *torsions_per_bond.entry((j.min(k), j.max(k))).or_insert(0) += 1;
        }

        let mut torsions = Vec::new();
        for &[i, j, k, l] in &topology.torsions {
            let (hj, hk) = (hybridization(topology, j), hybridization(topology, k));
            if hj == Hybridization::Sp || hk == Hybridization::Sp {
                continue;
            }
            let (barrier, n, sign) = match (hj, hk) {
                (Hybridization::Sp3, Hybridization::Sp3) => {
                    let vj = params(molecule.atoms[j].element).v;
                    let vk = params(molecule.atoms[k].element).v;
                    ((vj * vk).sqrt(), 3.0, -1.0)
                }
                (Hybridization::Sp2, Hybridization::Sp2) => {
                    let order = topology.bond_order(j, k).unwrap_or_default().numeric();
                    (5.0 * (1.0 + 4.18 * order.ln()), 2.0, 1.0)
                }
                _ => (1.0, 6.0, 1.0),
            };
            if barrier <= 0.0 {
                continue;
            }
            let shared = torsions_per_bond[&(j.min(k), j.max(k))] as f64;
            torsions.push(TorsionTerm {
                atoms: [i, j, k, l],
                v_half: 0.5 * barrier / shared,
                n,
                sign,
            });
        }

        let n = topology.atom_count();
        let mut pairs = Vec::new();
        for i in 0..n {
            let pi = params(molecule.atoms[i].element);
            for j in (i + 1)..n {
                let separation = topology.separation(i, j);
                if separation < 3 {
                    continue;
                }
                let pj = params(molecule.atoms[j].element);
                pairs.push(PairTerm {
                    i,
                    j,
                    r_ref: (pi.x * pj.x).sqrt(),
                    depth: (pi.d * pj.d).sqrt(),
                    qq: 0.0,
                    scale: if separation < NONBONDED_SEPARATION {
                        VDW_14_SCALE
                    } else {
                        1.0
                    },
                });
            }
        }

        Ok(TermSet {
            bonds,
            angles,
            torsions,
            pairs,
            vdw: VdwStyle::LennardJones,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;
    use crate::model::conformer::Conformer;
    use crate::model::molecule::Bond;
    use crate::model::types::BondOrder;

    fn make_ethane() -> (Molecule, Topology) {
        let mut mol = Molecule::new();
        mol.atoms.push(Atom::new(Element::C));
        mol.atoms.push(Atom::new(Element::C));
        for _ in 0..6 {
            mol.atoms.push(Atom::new(Element::H));
        }
        mol.bonds.push(Bond::new(0, 1, BondOrder::Single));
        for h in 2..5 {
            mol.bonds.push(Bond::new(0, h, BondOrder::Single));
        }
        for h in 5..8 {
            mol.bonds.push(Bond::new(1, h, BondOrder::Single));
        }
        mol.add_conformer(Conformer::new(vec![[0.0; 3]; 8])).unwrap();
        let topo = Topology::from_molecule(&mol).unwrap();
        (mol, topo)
    }

    #[test]
    fn carbon_carbon_single_bond_length() {
        let (mol, topo) = make_ethane();
        let r0 = Uff.natural_length(&mol, &topo, 0, 1);
        // Same element, so no electronegativity correction applies.
        assert!((r0 - 2.0 * Element::C.covalent_radius()).abs() < 1e-12);
    }

    #[test]
    fn double_bond_is_shorter_than_single() {
        let mut mol = Molecule::new();
        mol.atoms.push(Atom::new(Element::C));
        mol.atoms.push(Atom::new(Element::C));
        mol.bonds.push(Bond::new(0, 1, BondOrder::Double));
        mol.add_conformer(Conformer::new(vec![[0.0; 3]; 2])).unwrap();
        let topo = Topology::from_molecule(&mol).unwrap();

        let single = 2.0 * Element::C.covalent_radius();
        let double = Uff.natural_length(&mol, &topo, 0, 1);
        assert!(double < single);
    }

    #[test]
    fn ethane_term_counts() {
        let (mol, topo) = make_ethane();
        let terms = Uff.parameterize(&mol, &topo).unwrap();
        assert_eq!(terms.bonds.len(), 7);
        assert_eq!(terms.angles.len(), 12);
        assert_eq!(terms.torsions.len(), 9);
        // H-H pairs across the C-C bond are the only non-bonded pairs.
        assert_eq!(terms.pairs.len(), 9);
        assert!(terms.pairs.iter().all(|p| p.qq == 0.0));
        assert!(terms.pairs.iter().all(|p| p.scale == VDW_14_SCALE));
        assert_eq!(terms.vdw, VdwStyle::LennardJones);
    }

    #[test]
    fn torsion_barrier_is_shared_across_the_bond() {
        let (mol, topo) = make_ethane();
        let terms = Uff.parameterize(&mol, &topo).unwrap();
        let full = params(Element::C).v;
        for torsion in &terms.torsions {
            assert!((torsion.v_half - 0.5 * full / 9.0).abs() < 1e-12);
            assert_eq!(torsion.n, 3.0);
        }
    }

    #[test]
    fn stretch_constants_are_positive() {
        let (mol, topo) = make_ethane();
        let terms = Uff.parameterize(&mol, &topo).unwrap();
        assert!(terms.bonds.iter().all(|b| b.k > 0.0 && b.r0 > 0.0));
    }
}
