//! FIRE local minimizer.
//!
//! Fast inertial relaxation engine: velocity-Verlet steps with velocity
//! mixing toward the force direction, timestep acceleration while the power
//! stays positive, and a hard reset when it turns negative. Convergence is
//! judged on the root-mean-square gradient.

use super::TermSet;
use crate::pipeline::geom::{self, Vec3};

const DT_START: f64 = 0.02;
const DT_MAX: f64 = 0.2;
const ALPHA_START: f64 = 0.1;
const F_INC: f64 = 1.1;
const F_DEC: f64 = 0.5;
const F_ALPHA: f64 = 0.99;
const N_MIN: usize = 5;
/// Per-step displacement cap, in Ångströms.
const MAX_DISPLACEMENT: f64 = 0.1;
/// Gradient RMS convergence threshold, kcal/(mol·Å).
const GRADIENT_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy)]
pub struct MinimizeResult {
    /// Energy at the final geometry, kcal/mol.
    pub energy: f64,
    pub converged: bool,
    pub iterations: usize,
}

/// Relaxes `coords` in place under `terms` for at most `max_iterations`
/// steps.
pub fn fire(terms: &TermSet, coords: &mut [Vec3], max_iterations: usize) -> MinimizeResult {
    let n = coords.len();
    let mut gradient = vec![[0.0_f64; 3]; n];
    let mut velocity = vec![[0.0_f64; 3]; n];

    let mut dt = DT_START;
    let mut alpha = ALPHA_START;
    let mut steps_uphill_free = 0usize;

    let mut energy = terms.energy_and_gradient(coords, &mut gradient);

    for iteration in 0..max_iterations {
        if gradient_rms(&gradient) < GRADIENT_TOLERANCE {
            return MinimizeResult {
                energy,
                converged: true,
                iterations: iteration,
            };
        }

        // Power of the current velocity along the force.
        let power: f64 = velocity
            .iter()
            .zip(gradient.iter())
            .map(|(v, g)| -geom::dot(*v, *g))
            .sum();

        if power > 0.0 {
            steps_uphill_free += 1;
            if steps_uphill_free > N_MIN {
                dt = (dt * F_INC).min(DT_MAX);
                alpha *= F_ALPHA;
            }
            // Mix the velocity toward the force direction.
            let v_norm = total_norm(&velocity);
            let f_norm = total_norm(&gradient).max(1e-12);
            for (v, g) in velocity.iter_mut().zip(gradient.iter()) {
                let force = geom::scale(*g, -1.0);
                *v = geom::add(
                    geom::scale(*v, 1.0 - alpha),
                    geom::scale(force, alpha * v_norm / f_norm),
                );
            }
        } else {
            velocity.iter_mut().for_each(|v| *v = [0.0; 3]);
            dt *= F_DEC;
            alpha = ALPHA_START;
            steps_uphill_free = 0;
        }

        for ((pos, v), g) in coords.iter_mut().zip(velocity.iter_mut()).zip(gradient.iter()) {
            *v = geom::add(*v, geom::scale(*g, -dt));
            let mut step = geom::scale(*v, dt);
            let length = geom::norm(step);
            if length > MAX_DISPLACEMENT {
                step = geom::scale(step, MAX_DISPLACEMENT / length);
            }
            *pos = geom::add(*pos, step);
        }

        energy = terms.energy_and_gradient(coords, &mut gradient);
    }

    MinimizeResult {
        energy,
        converged: gradient_rms(&gradient) < GRADIENT_TOLERANCE,
        iterations: max_iterations,
    }
}

fn gradient_rms(gradient: &[Vec3]) -> f64 {
    let sum: f64 = gradient.iter().map(|g| geom::dot(*g, *g)).sum();
    (sum / (3.0 * gradient.len() as f64)).sqrt()
}

fn total_norm(vectors: &[Vec3]) -> f64 {
    vectors.iter().map(|v| geom::dot(*v, *v)).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::forcefield::{BondTerm, TermSet, VdwStyle};

    fn harmonic_diatomic(r0: f64) -> TermSet {
        TermSet {
            bonds: vec![BondTerm {
                i: 0,
                j: 1,
                r0,
                k: 500.0,
                cubic: 0.0,
            }],
            angles: Vec::new(),
            torsions: Vec::new(),
            pairs: Vec::new(),
            vdw: VdwStyle::LennardJones,
        }
    }

    #[test]
    fn stretched_diatomic_relaxes_to_equilibrium() {
        let terms = harmonic_diatomic(1.5);
        let mut coords = vec![[0.0, 0.0, 0.0], [2.3, 0.0, 0.0]];
        let start_energy = terms.energy(&coords);

        let result = fire(&terms, &mut coords, 2000);
        assert!(result.converged, "did not converge in {} steps", result.iterations);
        assert!(result.energy < start_energy);

        let d = ((coords[1][0] - coords[0][0]).powi(2)
            + (coords[1][1] - coords[0][1]).powi(2)
            + (coords[1][2] - coords[0][2]).powi(2))
        .sqrt();
        assert!((d - 1.5).abs() < 1e-2, "final separation {d}");
    }

    #[test]
    fn equilibrium_geometry_converges_immediately() {
        let terms = harmonic_diatomic(1.5);
        let mut coords = vec![[0.0, 0.0, 0.0], [1.5, 0.0, 0.0]];
        let result = fire(&terms, &mut coords, 100);
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn zero_iteration_budget_reports_not_converged() {
        let terms = harmonic_diatomic(1.5);
        let mut coords = vec![[0.0, 0.0, 0.0], [2.5, 0.0, 0.0]];
        let result = fire(&terms, &mut coords, 0);
        assert!(!result.converged);
    }
}
