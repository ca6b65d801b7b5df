//! MMFF-style force field.
//!
//! Organic-subset coverage only: the element table is deliberately narrow,
//! and anything outside it fails parameterization instead of guessing.
//! Cubic-corrected stretches, harmonic bends, periodic torsions, buffered
//! 14-7 van der Waals, and buffered Coulomb electrostatics over
//! bond-increment partial charges.

use std::collections::HashMap;

use super::{
    AngleForm, AngleTerm, BondTerm, FieldError, ForceField, Hybridization, PairTerm, TermSet,
    TorsionTerm, VdwStyle, hybridization,
};
use crate::model::molecule::Molecule;
use crate::model::types::{BondOrder, Element};
use crate::pipeline::topology::{NONBONDED_SEPARATION, Topology};

/// Cubic stretch correction, 1/Å.
const CUBIC_STRETCH: f64 = -2.0;
/// Harmonic bend force constant, kcal/(mol·rad²).
const BEND_FORCE: f64 = 70.0;
/// Charge transferred per unit electronegativity difference.
const CHARGE_INCREMENT: f64 = 0.16;
/// 1-4 scaling applied to both van der Waals and Coulomb parts.
const SCALE_14: f64 = 0.75;

/// vdW minimum radius (Å) and well depth (kcal/mol); `None` marks an element
/// the field refuses to describe.
fn vdw_params(element: Element) -> Option<(f64, f64)> {
    match element {
        Element::H => Some((1.50, 0.022)),
        Element::C => Some((1.96, 0.070)),
        Element::N => Some((1.79, 0.078)),
        Element::O => Some((1.72, 0.059)),
        Element::F => Some((1.64, 0.055)),
        Element::P => Some((2.22, 0.168)),
        Element::S => Some((2.09, 0.270)),
        Element::Cl => Some((2.05, 0.240)),
        Element::Br => Some((2.12, 0.320)),
        Element::I => Some((2.36, 0.380)),
        _ => None,
    }
}

fn stretch_force(order: BondOrder) -> f64 {
    match order {
        BondOrder::Single => 600.0,
        BondOrder::Aromatic => 800.0,
        BondOrder::Double => 1000.0,
        BondOrder::Triple => 1400.0,
    }
}

fn natural_length(molecule: &Molecule, i: usize, j: usize, order: BondOrder) -> f64 {
    let base =
        molecule.atoms[i].element.covalent_radius() + molecule.atoms[j].element.covalent_radius();
    let correction = match order {
        BondOrder::Single => 0.0,
        BondOrder::Double => 0.14,
        BondOrder::Triple => 0.24,
        BondOrder::Aromatic => 0.07,
    };
    base - correction
}

/// Bond-increment partial charges: each bond shifts charge toward its more
/// electronegative end. Sums to zero over the molecule.
fn partial_charges(molecule: &Molecule, topology: &Topology) -> Vec<f64> {
    let mut charges = vec![0.0; topology.atom_count()];
    for &(i, j, _) in &topology.bonds {
        let chi_i = molecule.atoms[i].element.electronegativity();
        let chi_j = molecule.atoms[j].element.electronegativity();
        let delta = CHARGE_INCREMENT * (chi_j - chi_i);
        charges[i] += delta;
        charges[j] -= delta;
    }
    charges
}

/// The MMFF-style field. Stateless; parameters are compiled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mmff;

impl ForceField for Mmff {
    fn name(&self) -> &'static str {
        "MMFF"
    }

    fn parameterize(
        &self,
        molecule: &Molecule,
        topology: &Topology,
    ) -> Result<TermSet, FieldError> {
        for (index, atom) in molecule.atoms.iter().enumerate() {
            if vdw_params(atom.element).is_none() {
                return Err(FieldError::UnsupportedElement {
                    field: self.name(),
                    symbol: atom.element.symbol(),
                    index,
                });
            }
        }

        let bonds = topology
            .bonds
            .iter()
            .map(|&(i, j, order)| BondTerm {
                i,
                j,
                r0: natural_length(molecule, i, j, order),
                k: stretch_force(order),
                cubic: CUBIC_STRETCH,
            })
            .collect();

        let angles = topology
            .angles
            .iter()
            .map(|&[i, j, k]| AngleTerm {
                atoms: [i, j, k],
                form: AngleForm::Harmonic {
                    theta0: topology.ideal_angle(j, molecule.atoms[j].element),
                    k: BEND_FORCE,
                },
            })
            .collect();

        let mut torsions_per_bond: HashMap<(usize, usize), usize> = HashMap::new();
        for &[_, j, k, _] in &topology.torsions {
            *torsions_per_bond.entry((j.min(k), j.max(k))).or_insert(0) += 1;
        }

        let mut torsions = Vec::new();
        for &[i, j, k, l] in &topology.torsions {
            if hybridization(topology, j) == Hybridization::Sp
                || hybridization(topology, k) == Hybridization::Sp
            {
                continue;
            }
            let (barrier, n, sign) = match topology.bond_order(j, k) {
                Some(BondOrder::Double) | Some(BondOrder::Aromatic) => (6.0, 2.0, 1.0),
                _ => (0.8, 3.0, -1.0),
            };
            let shared = torsions_per_bond[&(j.min(k), j.max(k))] as f64;
            torsions.push(TorsionTerm {
                atoms: [i, j, k, l],
                v_half: 0.5 * barrier / shared,
                n,
                sign,
            });
        }

        let charges = partial_charges(molecule, topology);
        let n = topology.atom_count();
        let mut pairs = Vec::new();
        for i in 0..n {
            // Checked above, so the unwrap_or fallback never fires.
            let (ri, di) = vdw_params(molecule.atoms[i].element).unwrap_or((2.0, 0.1));
            for j in (i + 1)..n {
                let separation = topology.separation(i, j);
                if separation < 3 {
                    continue;
                }
                let (rj, dj) = vdw_params(molecule.atoms[j].element).unwrap_or((2.0, 0.1));
                pairs.push(PairTerm {
                    i,
                    j,
                    r_ref: ri + rj,
                    depth: (di * dj).sqrt(),
                    qq: charges[i] * charges[j],
                    scale: if separation < NONBONDED_SEPARATION {
                        SCALE_14
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
            vdw: VdwStyle::Buffered14_7,
        })
    }
}
