//! Hydrogen completion.
//!
//! Adds explicit hydrogens for every heavy atom whose bond-order sum falls
//! short of its typical valence, with initial positions derived from the
//! existing geometry around the parent atom (tetrahedral, trigonal, or linear
//! placement depending on the parent's bonding environment). Hydrogens are
//! appended, so existing atom indices stay valid; every attached conformer is
//! extended consistently. Running this is a precondition for embedding, which
//! defines distance bounds over the complete atom set.

use std::f64::consts::TAU;

use super::error::Error;
use super::geom::{self, Vec3};
use crate::model::atom::Atom;
use crate::model::molecule::{Bond, Molecule};
use crate::model::types::{BondOrder, Element};

/// Adds missing hydrogens in place and returns how many were added.
///
/// # Errors
///
/// [`Error::EmptyMolecule`] if the molecule has no atoms,
/// [`Error::MissingReference`] if it has no conformer to derive positions
/// from, or [`Error::InvalidBond`] for out-of-range bond indices.
pub fn complete_hydrogens(molecule: &mut Molecule) -> Result<usize, Error> {
    let n_heavy = molecule.atom_count();
    if n_heavy == 0 {
        return Err(Error::EmptyMolecule);
    }
    if molecule.conformers.is_empty() {
        return Err(Error::MissingReference);
    }

    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n_heavy];
    let mut valence_sum = vec![0.0_f64; n_heavy];
    let mut double_count = vec![0_u8; n_heavy];
    let mut has_triple = vec![false; n_heavy];
    let mut has_multiple = vec![false; n_heavy];

    for bond in &molecule.bonds {
        if bond.i >= n_heavy || bond.j >= n_heavy {
            return Err(Error::invalid_bond(
                bond.i,
                bond.j,
                format!("atom index out of bounds (n_atoms = {})", n_heavy),
            ));
        }
        neighbors[bond.i].push(bond.j);
        neighbors[bond.j].push(bond.i);
        let contribution = bond.order.valence_contribution();
        valence_sum[bond.i] += contribution;
        valence_sum[bond.j] += contribution;
        match bond.order {
            BondOrder::Double => {
                double_count[bond.i] += 1;
                double_count[bond.j] += 1;
            }
            BondOrder::Triple => {
                has_triple[bond.i] = true;
                has_triple[bond.j] = true;
            }
            _ => {}
        }
        if !matches!(bond.order, BondOrder::Single) {
            has_multiple[bond.i] = true;
            has_multiple[bond.j] = true;
        }
    }

    let mut added = 0usize;
    for parent in 0..n_heavy {
        let element = molecule.atoms[parent].element;
        if element == Element::H {
            continue;
        }
        let Some(target) = element.typical_valence() else {
            continue;
        };
        let bonded = valence_sum[parent].round() as i64;
        let missing = (target as i64 - bonded).max(0) as usize;
        if missing == 0 {
            continue;
        }

        let angle = placement_angle(
            element,
            has_multiple[parent],
            has_triple[parent] || double_count[parent] >= 2,
        );
        let bond_length = element.covalent_radius() + Element::H.covalent_radius();

        // Directions are derived per conformer so every attached coordinate
        // set stays chemically plausible.
        let mut per_conformer_positions: Vec<Vec<Vec3>> = Vec::new();
        for conformer in &molecule.conformers {
            let parent_pos = conformer.coords[parent];
            let existing: Vec<Vec3> = neighbors[parent]
                .iter()
                .filter_map(|&nb| geom::normalize(geom::sub(conformer.coords[nb], parent_pos)))
                .collect();
            let dirs = hydrogen_directions(&existing, missing, angle);
            per_conformer_positions.push(
                dirs.into_iter()
                    .map(|d| geom::add(parent_pos, geom::scale(d, bond_length)))
                    .collect(),
            );
        }

        for h in 0..missing {
            let new_index = molecule.atoms.len();
            molecule.atoms.push(Atom::new(Element::H));
            molecule
                .bonds
                .push(Bond::new(parent, new_index, BondOrder::Single));
            for (conformer, positions) in molecule
                .conformers
                .iter_mut()
                .zip(per_conformer_positions.iter())
            {
                conformer.coords.push(positions[h]);
            }
            added += 1;
        }
    }

    Ok(added)
}

fn placement_angle(element: Element, has_multiple: bool, linear: bool) -> f64 {
    if linear {
        return std::f64::consts::PI;
    }
    if has_multiple {
        return 120.0_f64.to_radians();
    }
    match element {
        Element::O | Element::S | Element::Se | Element::Te => 104.5_f64.to_radians(),
        Element::N | Element::P | Element::As | Element::Sb => 107.0_f64.to_radians(),
        _ => 109.47_f64.to_radians(),
    }
}

/// Unit directions for `n_h` new hydrogens around a parent with the given
/// existing bond directions, keeping X-parent-H angles near `theta`.
fn hydrogen_directions(existing: &[Vec3], n_h: usize, theta: f64) -> Vec<Vec3> {
    let mut dirs = Vec::with_capacity(n_h);
    match existing.len() {
        0 => {
            // Bare atom: canonical tetrahedron vertices.
            let t = 1.0 / 3.0_f64.sqrt();
            let canonical = [
                [t, t, t],
                [t, -t, -t],
                [-t, t, -t],
                [-t, -t, t],
            ];
            for k in 0..n_h {
                dirs.push(canonical[k % 4]);
            }
        }
        1 => {
            let a = existing[0];
            let u = geom::any_perpendicular(a);
            let (sin_t, cos_t) = theta.sin_cos();
            for k in 0..n_h {
                let phi = TAU * k as f64 / n_h.max(1) as f64;
                let ring = geom::rotate_about_axis(u, a, phi);
                dirs.push(geom::add(geom::scale(a, cos_t), geom::scale(ring, sin_t)));
            }
        }
        2 => {
            let a = existing[0];
            let b = existing[1];
            let bisector = geom::normalize(geom::scale(geom::add(a, b), -1.0))
                .unwrap_or_else(|| geom::any_perpendicular(a));
            let out_of_plane = geom::normalize(geom::cross(a, b))
                .unwrap_or_else(|| geom::any_perpendicular(bisector));
            if n_h == 1 {
                dirs.push(bisector);
            } else {
                let half = theta / 2.0;
                let (sin_h, cos_h) = half.sin_cos();
                dirs.push(geom::add(
                    geom::scale(bisector, cos_h),
                    geom::scale(out_of_plane, sin_h),
                ));
                dirs.push(geom::add(
                    geom::scale(bisector, cos_h),
                    geom::scale(out_of_plane, -sin_h),
                ));
                for _ in 2..n_h {
                    dirs.push(bisector);
                }
            }
        }
        _ => {
            let mut sum = [0.0; 3];
            for e in existing {
                sum = geom::add(sum, *e);
            }
            let dir = geom::normalize(geom::scale(sum, -1.0))
                .unwrap_or_else(|| geom::any_perpendicular(existing[0]));
            for _ in 0..n_h {
                dirs.push(dir);
            }
        }
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::conformer::Conformer;

    fn make_bare_carbon() -> Molecule {
        let mut mol = Molecule::new();
        mol.atoms.push(Atom::new(Element::C));
        mol.add_conformer(Conformer::new(vec![[0.0; 3]])).unwrap();
        mol
    }

    fn make_heavy_ethanol() -> Molecule {
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
        mol
    }

    #[test]
    fn methane_from_bare_carbon() {
        let mut mol = make_bare_carbon();
        let added = complete_hydrogens(&mut mol).unwrap();
        assert_eq!(added, 4);
        assert_eq!(mol.atom_count(), 5);
        assert_eq!(mol.bond_count(), 4);
        assert_eq!(mol.conformers[0].len(), 5);

        let expected = Element::C.covalent_radius() + Element::H.covalent_radius();
        for h in 1..5 {
            assert!((mol.conformers[0].distance(0, h) - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn ethanol_gains_six_hydrogens() {
        let mut mol = make_heavy_ethanol();
        let added = complete_hydrogens(&mut mol).unwrap();
        assert_eq!(added, 6); // CH3, CH2, OH
        assert_eq!(mol.atom_count(), 9);
        assert_eq!(mol.molecular_formula(), "C2H6O");
    }

    #[test]
    fn heavy_atom_indices_are_preserved() {
        let mut mol = make_heavy_ethanol();
        let before = mol.conformers[0].coords.clone();
        complete_hydrogens(&mut mol).unwrap();
        for (i, pos) in before.iter().enumerate() {
            assert_eq!(&mol.conformers[0].coords[i], pos);
            assert_ne!(mol.atoms[i].element, Element::H);
        }
    }

    #[test]
    fn saturated_molecule_is_untouched() {
        // formaldehyde with explicit hydrogens
        let mut mol = Molecule::new();
        mol.atoms.push(Atom::new(Element::C));
        mol.atoms.push(Atom::new(Element::O));
        mol.atoms.push(Atom::new(Element::H));
        mol.atoms.push(Atom::new(Element::H));
        mol.bonds.push(Bond::new(0, 1, BondOrder::Double));
        mol.bonds.push(Bond::new(0, 2, BondOrder::Single));
        mol.bonds.push(Bond::new(0, 3, BondOrder::Single));
        mol.add_conformer(Conformer::new(vec![
            [0.0, 0.0, 0.0],
            [1.21, 0.0, 0.0],
            [-0.55, 0.94, 0.0],
            [-0.55, -0.94, 0.0],
        ]))
        .unwrap();

        assert_eq!(complete_hydrogens(&mut mol).unwrap(), 0);
        assert_eq!(mol.atom_count(), 4);
    }

    #[test]
    fn aromatic_carbon_gets_single_hydrogen() {
        // benzene ring, heavy atoms only
        let mut mol = Molecule::new();
        let mut coords = Vec::new();
        for i in 0..6 {
            let angle = (i as f64) * std::f64::consts::PI / 3.0;
            mol.atoms.push(Atom::new(Element::C));
            coords.push([1.39 * angle.cos(), 1.39 * angle.sin(), 0.0]);
        }
        for i in 0..6 {
            mol.bonds.push(Bond::new(i, (i + 1) % 6, BondOrder::Aromatic));
        }
        mol.add_conformer(Conformer::new(coords)).unwrap();

        assert_eq!(complete_hydrogens(&mut mol).unwrap(), 6);
        assert_eq!(mol.molecular_formula(), "C6H6");
        // ring hydrogens stay in the ring plane
        for h in 6..12 {
            assert!(mol.conformers[0].coords[h][2].abs() < 1e-9);
        }
    }

    #[test]
    fn requires_a_reference_conformer() {
        let mut mol = Molecule::new();
        mol.atoms.push(Atom::new(Element::C));
        assert!(matches!(
            complete_hydrogens(&mut mol),
            Err(Error::MissingReference)
        ));
    }
}
