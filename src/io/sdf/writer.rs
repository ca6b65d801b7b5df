use crate::io::error::Error;
use crate::model::{conformer::Conformer, molecule::Molecule};
use std::io::Write;

/// Writes one V2000 record: the molecule's topology with this conformer's
/// coordinates, annotated with an `RMSD` data field when the conformer
/// carries one.
pub fn write_record<W: Write>(
    mut writer: W,
    molecule: &Molecule,
    conformer: &Conformer,
) -> Result<(), Error> {
    if conformer.len() != molecule.atom_count() {
        return Err(Error::ConformerMismatch(
            crate::model::molecule::ConformerMismatch {
                expected: molecule.atom_count(),
                got: conformer.len(),
            },
        ));
    }

    writeln!(writer, "SDF Export")?;
    writeln!(writer, "conf-forge")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
        molecule.atom_count(),
        molecule.bond_count()
    )?;

    for (atom, pos) in molecule.atoms.iter().zip(conformer.coords.iter()) {
        writeln!(
            writer,
            "{:>10.4}{:>10.4}{:>10.4} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0",
            pos[0],
            pos[1],
            pos[2],
            atom.element.symbol()
        )?;
    }

    for bond in &molecule.bonds {
        writeln!(
            writer,
            "{:>3}{:>3}{:>3}  0  0  0  0",
            bond.i + 1,
            bond.j + 1,
            crate::io::util::bond_order_to_ctfile(bond.order)
        )?;
    }

    writeln!(writer, "M  END")?;

    if let Some(rmsd) = conformer.rmsd {
        writeln!(writer, "> <RMSD>")?;
        writeln!(writer, "{:.4}", rmsd)?;
        writeln!(writer)?;
    }

    writeln!(writer, "$$$$")?;
    Ok(())
}

/// Writes every conformer of the molecule as an independent record, in
/// conformer insertion order.
pub fn write_ensemble<W: Write>(mut writer: W, molecule: &Molecule) -> Result<(), Error> {
    for conformer in &molecule.conformers {
        write_record(&mut writer, molecule, conformer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sdf::reader;
    use crate::model::{
        atom::Atom,
        molecule::Bond,
        types::{BondOrder, Element},
    };
    use std::io::Cursor;

    fn make_water() -> Molecule {
        let mut mol = Molecule::new();
        mol.atoms.push(Atom::new(Element::O));
        mol.atoms.push(Atom::new(Element::H));
        mol.atoms.push(Atom::new(Element::H));
        mol.bonds.push(Bond::new(0, 1, BondOrder::Single));
        mol.bonds.push(Bond::new(0, 2, BondOrder::Single));
        mol.add_conformer(Conformer::new(vec![
            [0.0, 0.0, 0.0],
            [0.96, 0.0, 0.0],
            [-0.24, 0.93, 0.0],
        ]))
        .unwrap();
        mol
    }

    #[test]
    fn writes_and_reads_roundtrip() {
        let mol = make_water();

        let mut buf = Vec::new();
        write_record(&mut buf, &mol, &mol.conformers[0]).expect("write sdf");
        let parsed = reader::read(Cursor::new(buf)).expect("read sdf");

        assert_eq!(parsed.atom_count(), mol.atom_count());
        assert_eq!(parsed.bond_count(), mol.bond_count());
        for (a, b) in mol.atoms.iter().zip(parsed.atoms.iter()) {
            assert_eq!(a.element, b.element);
        }
        for (a, b) in mol.conformers[0]
            .coords
            .iter()
            .zip(parsed.conformers[0].coords.iter())
        {
            for k in 0..3 {
                assert!((a[k] - b[k]).abs() < 1e-4);
            }
        }
        assert_eq!(parsed.bonds, mol.bonds);
    }

    #[test]
    fn annotates_rmsd_data_field() {
        let mut mol = make_water();
        mol.conformers[0].rmsd = Some(1.25);

        let mut buf = Vec::new();
        write_record(&mut buf, &mol, &mol.conformers[0]).expect("write sdf");
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("> <RMSD>"));
        assert!(text.contains("1.2500"));
        assert!(text.trim_end().ends_with("$$$$"));
    }

    #[test]
    fn ensemble_emits_one_record_per_conformer() {
        let mut mol = make_water();
        let extra = Conformer::new(vec![[1.0; 3]; 3]);
        mol.add_conformer(extra).unwrap();

        let mut buf = Vec::new();
        write_ensemble(&mut buf, &mol).expect("write sdf");
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.matches("$$$$").count(), 2);
    }

    #[test]
    fn rejects_mismatched_conformer() {
        let mol = make_water();
        let bad = Conformer::new(vec![[0.0; 3]; 2]);
        let mut buf = Vec::new();
        assert!(matches!(
            write_record(&mut buf, &mol, &bad),
            Err(Error::ConformerMismatch(_))
        ));
    }
}
