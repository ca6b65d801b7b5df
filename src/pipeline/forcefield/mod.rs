//! Force-field refinement of embedded conformers.
//!
//! A [`ForceField`] turns a molecule's topology into a flat [`TermSet`] of
//! bonded and non-bonded interaction terms; the term set evaluates total
//! energy and its analytic gradient for any coordinate set of the right
//! size. Minimization itself is field-agnostic ([`minimize`]).
//!
//! Two fields are provided: a broad-coverage UFF-style field ([`uff`]) and a
//! narrower MMFF-style field with partial-charge electrostatics ([`mmff`]).

pub mod minimize;
pub mod mmff;
pub mod uff;

use rayon::prelude::*;
use thiserror::Error;

use super::geom::{self, Vec3};
use super::topology::Topology;
use crate::model::conformer::Conformer;
use crate::model::molecule::Molecule;
use crate::model::types::BondOrder;

/// Coulomb constant in kcal·Å/(mol·e²).
const COULOMB: f64 = 332.0716;
/// Distance buffering added to the Coulomb denominator.
const COULOMB_BUFFER: f64 = 0.05;

/// Why a force field could not parameterize a molecule.
#[derive(Debug, Clone, Error)]
pub enum FieldError {
    /// The field has no parameters for an element in the molecule.
    #[error("{field} has no parameters for element {symbol} (atom {index})")]
    UnsupportedElement {
        field: &'static str,
        symbol: &'static str,
        index: usize,
    },
}

/// Per-conformer result of an optimization pass.
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizeOutcome {
    /// Gradient converged below tolerance; final energy in kcal/mol.
    Converged { energy: f64 },
    /// Iteration budget exhausted before convergence.
    NotConverged,
    /// The conformer never entered minimization.
    Failed { reason: String },
}

impl OptimizeOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, OptimizeOutcome::Converged { .. })
    }
}

/// Harmonic or cosine-Fourier angle bending.
#[derive(Debug, Clone, Copy)]
pub enum AngleForm {
    Harmonic { theta0: f64, k: f64 },
    /// `k * (c0 + c1 cos(theta) + c2 cos(2 theta))`
    CosineFourier { c0: f64, c1: f64, c2: f64, k: f64 },
}

/// `0.5 k dr^2 (1 + cs dr + 7/12 cs^2 dr^2)`; `cubic == 0` is harmonic.
#[derive(Debug, Clone, Copy)]
pub struct BondTerm {
    pub i: usize,
    pub j: usize,
    pub r0: f64,
    pub k: f64,
    pub cubic: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct AngleTerm {
    pub atoms: [usize; 3],
    pub form: AngleForm,
}

/// `v_half * (1 - sign * cos(n phi))`
#[derive(Debug, Clone, Copy)]
pub struct TorsionTerm {
    pub atoms: [usize; 4],
    pub v_half: f64,
    pub n: f64,
    pub sign: f64,
}

/// How a [`PairTerm`] evaluates its van der Waals part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VdwStyle {
    /// 12-6 potential with minimum at `r_ref`.
    LennardJones,
    /// MMFF-style buffered 14-7 potential.
    Buffered14_7,
}

/// Non-bonded pair: van der Waals plus buffered Coulomb over `qq`.
#[derive(Debug, Clone, Copy)]
pub struct PairTerm {
    pub i: usize,
    pub j: usize,
    pub r_ref: f64,
    pub depth: f64,
    pub qq: f64,
    /// 1-4 pairs carry a fractional scale; full strength otherwise.
    pub scale: f64,
}

/// Flat interaction list produced by [`ForceField::parameterize`].
#[derive(Debug, Clone)]
pub struct TermSet {
    pub bonds: Vec<BondTerm>,
    pub angles: Vec<AngleTerm>,
    pub torsions: Vec<TorsionTerm>,
    pub pairs: Vec<PairTerm>,
    pub vdw: VdwStyle,
}

impl TermSet {
    /// Total energy with the gradient accumulated into `gradient`
    /// (overwritten, not added to).
    pub fn energy_and_gradient(&self, coords: &[Vec3], gradient: &mut [Vec3]) -> f64 {
        for g in gradient.iter_mut() {
            *g = [0.0; 3];
        }
        let mut energy = 0.0;

        for bond in &self.bonds {
            let delta = geom::sub(coords[bond.j], coords[bond.i]);
            let r = geom::norm(delta).max(1e-9);
            let dr = r - bond.r0;
            let cs = bond.cubic;
            energy += 0.5 * bond.k * dr * dr * (1.0 + cs * dr + 7.0 / 12.0 * cs * cs * dr * dr);
            let de_dr =
                bond.k * dr * (1.0 + 1.5 * cs * dr + 7.0 / 6.0 * cs * cs * dr * dr);
            let push = geom::scale(delta, de_dr / r);
            gradient[bond.i] = geom::sub(gradient[bond.i], push);
            gradient[bond.j] = geom::add(gradient[bond.j], push);
        }

        for angle in &self.angles {
            let [i, j, k] = angle.atoms;
            let u = geom::sub(coords[i], coords[j]);
            let v = geom::sub(coords[k], coords[j]);
            let (nu, nv) = (geom::norm(u).max(1e-9), geom::norm(v).max(1e-9));
            let cos_t = (geom::dot(u, v) / (nu * nv)).clamp(-1.0, 1.0);
            let theta = cos_t.acos();
            let sin_t = theta.sin();

            let (e, de_dt) = match angle.form {
                AngleForm::Harmonic { theta0, k } => {
                    let dt = theta - theta0;
                    (0.5 * k * dt * dt, k * dt)
                }
                AngleForm::CosineFourier { c0, c1, c2, k } => (
                    k * (c0 + c1 * theta.cos() + c2 * (2.0 * theta).cos()),
                    -k * (c1 * sin_t + 2.0 * c2 * (2.0 * theta).sin()),
                ),
            };
            energy += e;
            if sin_t < 1e-6 {
                continue;
            }

            let u_hat = geom::scale(u, 1.0 / nu);
            let v_hat = geom::scale(v, 1.0 / nv);
            let dt_di = geom::scale(
                geom::sub(geom::scale(u_hat, cos_t), v_hat),
                1.0 / (nu * sin_t),
            );
            let dt_dk = geom::scale(
                geom::sub(geom::scale(v_hat, cos_t), u_hat),
                1.0 / (nv * sin_t),
            );
            gradient[i] = geom::add(gradient[i], geom::scale(dt_di, de_dt));
            gradient[k] = geom::add(gradient[k], geom::scale(dt_dk, de_dt));
            gradient[j] = geom::sub(
                gradient[j],
                geom::scale(geom::add(dt_di, dt_dk), de_dt),
            );
        }

        for torsion in &self.torsions {
            let [i, j, k, l] = torsion.atoms;
            let b1 = geom::sub(coords[j], coords[i]);
            let b2 = geom::sub(coords[k], coords[j]);
            let b3 = geom::sub(coords[l], coords[k]);
            let n1 = geom::cross(b1, b2);
            let n2 = geom::cross(b2, b3);
            let (sq1, sq2) = (geom::dot(n1, n1), geom::dot(n2, n2));
            let b2_norm = geom::norm(b2);
            if sq1 < 1e-12 || sq2 < 1e-12 || b2_norm < 1e-9 {
                continue;
            }

            let phi = geom::dot(geom::cross(n1, n2), geom::scale(b2, 1.0 / b2_norm))
                .atan2(geom::dot(n1, n2));
            energy += torsion.v_half * (1.0 - torsion.sign * (torsion.n * phi).cos());
            let de_dphi = torsion.v_half * torsion.sign * torsion.n * (torsion.n * phi).sin();

            let p = geom::scale(n1, -b2_norm / sq1);
            let q = geom::scale(n2, b2_norm / sq2);
            let c1 = geom::dot(b1, b2) / (b2_norm * b2_norm);
            let c3 = geom::dot(b3, b2) / (b2_norm * b2_norm);
            // Inner-atom derivatives from the terminal ones; the four sum to
            // zero, so the torsion exerts no net force.
            let dphi_dj = geom::add(geom::scale(p, -(1.0 + c1)), geom::scale(q, c3));
            let dphi_dk = geom::sub(geom::scale(p, c1), geom::scale(q, 1.0 + c3));

            gradient[i] = geom::add(gradient[i], geom::scale(p, de_dphi));
            gradient[j] = geom::add(gradient[j], geom::scale(dphi_dj, de_dphi));
            gradient[k] = geom::add(gradient[k], geom::scale(dphi_dk, de_dphi));
            gradient[l] = geom::add(gradient[l], geom::scale(q, de_dphi));
        }

        for pair in &self.pairs {
            let delta = geom::sub(coords[pair.j], coords[pair.i]);
            let r = geom::norm(delta).max(1e-6);

            let (vdw_e, vdw_de) = match self.vdw {
                VdwStyle::LennardJones => {
                    let x6 = (pair.r_ref / r).powi(6);
                    let x12 = x6 * x6;
                    (
                        pair.depth * (x12 - 2.0 * x6),
                        12.0 * pair.depth * (x6 - x12) / r,
                    )
                }
                VdwStyle::Buffered14_7 => {
                    let rr = pair.r_ref;
                    let a = 1.07 * rr / (r + 0.07 * rr);
                    let r7 = r.powi(7);
                    let rr7 = rr.powi(7);
                    let b = 1.12 * rr7 / (r7 + 0.12 * rr7) - 2.0;
                    let da = -a / (r + 0.07 * rr);
                    let db = -1.12 * rr7 * 7.0 * r.powi(6) / (r7 + 0.12 * rr7).powi(2);
                    let a7 = a.powi(7);
                    (
                        pair.depth * a7 * b,
                        pair.depth * (7.0 * a.powi(6) * da * b + a7 * db),
                    )
                }
            };

            let buffered = r + COULOMB_BUFFER;
            let coulomb_e = COULOMB * pair.qq / buffered;
            let coulomb_de = -COULOMB * pair.qq / (buffered * buffered);

            energy += pair.scale * (vdw_e + coulomb_e);
            let de_dr = pair.scale * (vdw_de + coulomb_de);
            let push = geom::scale(delta, de_dr / r);
            gradient[pair.i] = geom::sub(gradient[pair.i], push);
            gradient[pair.j] = geom::add(gradient[pair.j], push);
        }

        energy
    }

    pub fn energy(&self, coords: &[Vec3]) -> f64 {
        let mut scratch = vec![[0.0; 3]; coords.len()];
        self.energy_and_gradient(coords, &mut scratch)
    }
}

/// Bonding environment of an atom, inferred from its bond orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hybridization {
    Sp,
    Sp2,
    Sp3,
}

pub(crate) fn hybridization(topology: &Topology, atom: usize) -> Hybridization {
    let mut doubles = 0usize;
    let mut triple = false;
    let mut aromatic = false;
    for &nb in &topology.neighbors[atom] {
        match topology.bond_order(atom, nb) {
            Some(BondOrder::Triple) => triple = true,
            Some(BondOrder::Double) => doubles += 1,
            Some(BondOrder::Aromatic) => aromatic = true,
            _ => {}
        }
    }
    if triple || doubles >= 2 {
        Hybridization::Sp
    } else if doubles == 1 || aromatic {
        Hybridization::Sp2
    } else {
        Hybridization::Sp3
    }
}

/// An empirical force field that can parameterize a molecule.
pub trait ForceField: Sync {
    fn name(&self) -> &'static str;

    fn parameterize(
        &self,
        molecule: &Molecule,
        topology: &Topology,
    ) -> Result<TermSet, FieldError>;
}

/// Minimizes a deep copy of every conformer of `molecule` under `field`.
///
/// The input molecule is never touched; the returned conformers pair up with
/// the outcomes index by index. A parameterization failure marks every
/// conformer `Failed` with the same reason.
pub fn optimize_all(
    molecule: &Molecule,
    topology: &Topology,
    field: &dyn ForceField,
    max_iterations: usize,
) -> (Vec<Conformer>, Vec<OptimizeOutcome>) {
    let terms = match field.parameterize(molecule, topology) {
        Ok(terms) => terms,
        Err(err) => {
            let reason = err.to_string();
            return (
                molecule.conformers.clone(),
                vec![
                    OptimizeOutcome::Failed { reason };
                    molecule.conformer_count()
                ],
            );
        }
    };

    molecule
        .conformers
        .par_iter()
        .map(|original| {
            let mut conformer = original.clone();
            let result = minimize::fire(&terms, &mut conformer.coords, max_iterations);
            let outcome = if result.converged {
                conformer.energy = Some(result.energy);
                OptimizeOutcome::Converged {
                    energy: result.energy,
                }
            } else {
                OptimizeOutcome::NotConverged
            };
            (conformer, outcome)
        })
        .unzip()
}
