use std::collections::BTreeMap;

use thiserror::Error;

use super::atom::Atom;
use super::conformer::Conformer;
use super::types::BondOrder;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("conformer has {got} coordinates but the molecule has {expected} atoms")]
pub struct ConformerMismatch {
    pub expected: usize,
    pub got: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub i: usize,
    pub j: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(idx1: usize, idx2: usize, order: BondOrder) -> Self {
        if idx1 <= idx2 {
            Self {
                i: idx1,
                j: idx2,
                order,
            }
        } else {
            Self {
                i: idx2,
                j: idx1,
                order,
            }
        }
    }
}

/// A molecular topology with zero or more conformers attached.
///
/// Atoms and bonds are fixed once hydrogen completion has run; conformers are
/// interchangeable coordinate overlays and every attached conformer carries
/// exactly `atom_count()` coordinates in atom order.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    pub conformers: Vec<Conformer>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    #[inline]
    pub fn conformer_count(&self) -> usize {
        self.conformers.len()
    }

    /// Attaches a conformer, enforcing the coordinate-count invariant.
    /// Returns the index of the new conformer.
    pub fn add_conformer(&mut self, conformer: Conformer) -> Result<usize, ConformerMismatch> {
        if conformer.len() != self.atom_count() {
            return Err(ConformerMismatch {
                expected: self.atom_count(),
                got: conformer.len(),
            });
        }
        self.conformers.push(conformer);
        Ok(self.conformers.len() - 1)
    }

    /// Returns a topology-only copy: same atoms and bonds, no conformers.
    pub fn topology_clone(&self) -> Molecule {
        Molecule {
            atoms: self.atoms.clone(),
            bonds: self.bonds.clone(),
            conformers: Vec::new(),
        }
    }

    /// Molecular formula in Hill notation (carbon, then hydrogen, then the
    /// remaining elements alphabetically).
    pub fn molecular_formula(&self) -> String {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for atom in &self.atoms {
            *counts.entry(atom.element.symbol()).or_insert(0) += 1;
        }

        let mut formula = String::new();
        let mut append = |symbol: &str, count: usize| {
            formula.push_str(symbol);
            if count > 1 {
                formula.push_str(&count.to_string());
            }
        };

        if let Some(c) = counts.remove("C") {
            append("C", c);
            if let Some(h) = counts.remove("H") {
                append("H", h);
            }
        }
        for (symbol, count) in counts {
            append(symbol, count);
        }
        formula
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::Element;

    fn make_formaldehyde() -> Molecule {
        let mut mol = Molecule::new();
        mol.atoms.push(Atom::new(Element::C));
        mol.atoms.push(Atom::new(Element::O));
        mol.atoms.push(Atom::new(Element::H));
        mol.atoms.push(Atom::new(Element::H));
        mol.bonds.push(Bond::new(0, 1, BondOrder::Double));
        mol.bonds.push(Bond::new(0, 2, BondOrder::Single));
        mol.bonds.push(Bond::new(0, 3, BondOrder::Single));
        mol
    }

    #[test]
    fn bond_normalizes_index_order() {
        let bond = Bond::new(5, 2, BondOrder::Single);
        assert_eq!((bond.i, bond.j), (2, 5));
    }

    #[test]
    fn add_conformer_enforces_atom_count() {
        let mut mol = make_formaldehyde();
        assert!(mol.add_conformer(Conformer::new(vec![[0.0; 3]; 4])).is_ok());
        let err = mol
            .add_conformer(Conformer::new(vec![[0.0; 3]; 3]))
            .unwrap_err();
        assert_eq!(err.expected, 4);
        assert_eq!(err.got, 3);
        assert_eq!(mol.conformer_count(), 1);
    }

    #[test]
    fn topology_clone_drops_conformers() {
        let mut mol = make_formaldehyde();
        mol.add_conformer(Conformer::new(vec![[0.0; 3]; 4])).unwrap();
        let topo = mol.topology_clone();
        assert_eq!(topo.atom_count(), 4);
        assert_eq!(topo.bond_count(), 3);
        assert_eq!(topo.conformer_count(), 0);
    }

    #[test]
    fn hill_formula_orders_carbon_first() {
        let mol = make_formaldehyde();
        assert_eq!(mol.molecular_formula(), "CH2O");
    }

    #[test]
    fn hill_formula_without_carbon_is_alphabetical() {
        let mut mol = Molecule::new();
        mol.atoms.push(Atom::new(Element::O));
        mol.atoms.push(Atom::new(Element::H));
        mol.atoms.push(Atom::new(Element::H));
        assert_eq!(mol.molecular_formula(), "H2O");
    }
}
