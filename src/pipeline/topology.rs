//! Covalent topology derived from a molecule's atoms and bonds.
//!
//! The pipeline stages all consume the same frozen [`Topology`]: neighbor
//! lists, enumerated angle and torsion quadruples, and a capped graph
//! separation table used to classify atom pairs as 1-2, 1-3, 1-4, or
//! non-bonded.

use std::collections::VecDeque;

use super::error::Error;
use crate::model::molecule::Molecule;
use crate::model::types::{BondOrder, Element};

/// Graph separation beyond which a pair is treated as fully non-bonded.
pub const NONBONDED_SEPARATION: u8 = 4;

#[derive(Debug, Clone)]
pub struct Topology {
    n_atoms: usize,
    /// Bonded neighbor indices per atom.
    pub neighbors: Vec<Vec<usize>>,
    /// `(i, j, order)` per bond, with `i < j`.
    pub bonds: Vec<(usize, usize, BondOrder)>,
    /// Angle triples `[i, j, k]` with `j` the central atom.
    pub angles: Vec<[usize; 3]>,
    /// Proper torsion quadruples `[i, j, k, l]` around the `j-k` bond.
    pub torsions: Vec<[usize; 4]>,
    /// Whether the atom participates in a double, triple, or aromatic bond.
    pub has_multiple_bond: Vec<bool>,
    separation: Vec<u8>,
}

impl Topology {
    /// Builds the topology, validating bond indices.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyMolecule`] for an atom-free molecule, or
    /// [`Error::InvalidBond`] for out-of-bounds or self-referencing bonds.
    pub fn from_molecule(molecule: &Molecule) -> Result<Self, Error> {
        let n = molecule.atom_count();
        if n == 0 {
            return Err(Error::EmptyMolecule);
        }

        let mut neighbors = vec![Vec::new(); n];
        let mut bonds = Vec::with_capacity(molecule.bond_count());
        let mut has_multiple_bond = vec![false; n];

        for bond in &molecule.bonds {
            if bond.i >= n || bond.j >= n {
                return Err(Error::invalid_bond(
                    bond.i,
                    bond.j,
                    format!("atom index out of bounds (n_atoms = {})", n),
                ));
            }
            if bond.i == bond.j {
                return Err(Error::invalid_bond(bond.i, bond.j, "self bond"));
            }
            neighbors[bond.i].push(bond.j);
            neighbors[bond.j].push(bond.i);
            if !matches!(bond.order, BondOrder::Single) {
                has_multiple_bond[bond.i] = true;
                has_multiple_bond[bond.j] = true;
            }
            bonds.push((bond.i, bond.j, bond.order));
        }

        let separation = build_separation(n, &neighbors);
        let angles = enumerate_angles(&neighbors);
        let torsions = enumerate_torsions(&bonds, &neighbors);

        Ok(Self {
            n_atoms: n,
            neighbors,
            bonds,
            angles,
            torsions,
            has_multiple_bond,
            separation,
        })
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.n_atoms
    }

    /// Graph separation between two atoms, capped at
    /// [`NONBONDED_SEPARATION`]: 0 = same atom, 1 = bonded, 2 = 1-3,
    /// 3 = 1-4, 4 = anything further.
    #[inline]
    pub fn separation(&self, i: usize, j: usize) -> u8 {
        self.separation[i * self.n_atoms + j]
    }

    /// Bond order between two bonded atoms, if any.
    pub fn bond_order(&self, i: usize, j: usize) -> Option<BondOrder> {
        let (a, b) = (i.min(j), i.max(j));
        self.bonds
            .iter()
            .find(|(x, y, _)| *x == a && *y == b)
            .map(|(_, _, order)| *order)
    }

    /// Ideal bond angle (radians) at the given central atom, from its bonding
    /// environment: linear for sp centers, trigonal for multiply-bonded
    /// centers, otherwise tetrahedral narrowed by lone pairs.
    pub fn ideal_angle(&self, center: usize, element: Element) -> f64 {
        let degree = self.neighbors[center].len();
        let triple_or_cumulated = self
            .neighbors[center]
            .iter()
            .filter(|&&nb| {
                matches!(
                    self.bond_order(center, nb),
                    Some(BondOrder::Triple) | Some(BondOrder::Double)
                )
            })
            .count();

        if degree <= 1 {
            return 109.47_f64.to_radians();
        }
        if degree == 2
            && (triple_or_cumulated >= 2
                || self
                    .neighbors[center]
                    .iter()
                    .any(|&nb| matches!(self.bond_order(center, nb), Some(BondOrder::Triple))))
        {
            return std::f64::consts::PI;
        }
        if self.has_multiple_bond[center] {
            return 120.0_f64.to_radians();
        }

        match element {
            Element::O | Element::S | Element::Se | Element::Te => 104.5_f64.to_radians(),
            Element::N | Element::P | Element::As | Element::Sb => 107.0_f64.to_radians(),
            _ => 109.47_f64.to_radians(),
        }
    }

    /// sp² centers that embedding refinement keeps planar: three neighbors
    /// and at least one double or aromatic bond.
    pub fn planar_centers(&self) -> Vec<usize> {
        (0..self.n_atoms)
            .filter(|&i| self.neighbors[i].len() == 3 && self.has_multiple_bond[i])
            .collect()
    }
}

fn build_separation(n: usize, neighbors: &[Vec<usize>]) -> Vec<u8> {
    let mut table = vec![NONBONDED_SEPARATION; n * n];
    for start in 0..n {
        table[start * n + start] = 0;
        let mut queue = VecDeque::new();
        queue.push_back((start, 0u8));
        while let Some((node, depth)) = queue.pop_front() {
            if depth >= NONBONDED_SEPARATION - 1 {
                continue;
            }
            for &next in &neighbors[node] {
                let entry = &mut table[start * n + next];
                if *entry == NONBONDED_SEPARATION && next != start {
                    *entry = depth + 1;
                    queue.push_back((next, depth + 1));
                }
            }
        }
    }
    table
}

fn enumerate_angles(neighbors: &[Vec<usize>]) -> Vec<[usize; 3]> {
    let mut angles = Vec::new();
    for (j, nbrs) in neighbors.iter().enumerate() {
        for a in 0..nbrs.len() {
            for b in (a + 1)..nbrs.len() {
                angles.push([nbrs[a], j, nbrs[b]]);
            }
        }
    }
    angles
}

fn enumerate_torsions(
    bonds: &[(usize, usize, BondOrder)],
    neighbors: &[Vec<usize>],
) -> Vec<[usize; 4]> {
    let mut torsions = Vec::new();
    for &(j, k, _) in bonds {
        for &i in &neighbors[j] {
            if i == k {
                continue;
            }
            for &l in &neighbors[k] {
                if l == j || l == i {
                    continue;
                }
                torsions.push([i, j, k, l]);
            }
        }
    }
    torsions
}
