//! Conservation tests for the box-model operators and the phosphorus cycle.
//!
//! These tests verify that the physical conservation laws are satisfied:
//! - zero divergence of a spatially uniform field under the circulation
//! - total tracer mass conservation of both operator families
//! - closure of the phosphorus budget up to the geological restoring term
//! - consistency of dual-number derivatives with finite differences

use approx::assert_relative_eq;
use ndarray::Array1;
use obgc_components::boxmodel::BoxModel;
use obgc_components::components::phosphorus::{phosphorus_parameters, PhosphorusModel};
use obgc_core::dual::Dual;
use obgc_core::linalg::{apply, volume_weighted_column_sums};
use obgc_core::scalar::TracerScalar;
use obgc_core::sinking::{sinking_operator, LinearVelocity};

fn model() -> PhosphorusModel {
    PhosphorusModel::new(BoxModel::five_box().unwrap())
}

fn test_state(m: usize) -> (Array1<f64>, Array1<f64>) {
    let dip = Array1::from_shape_fn(m, |i| 2.0e-3 + 1.0e-4 * i as f64);
    let pop = Array1::from_shape_fn(m, |i| 1.0e-5 + 2.0e-6 * i as f64);
    (dip, pop)
}

mod operator_conservation {
    use super::*;

    /// A spatially uniform tracer field has zero divergence under the
    /// combined circulation.
    #[test]
    fn circulation_annihilates_uniform_fields() {
        let model = model();
        let p = phosphorus_parameters().finalize().unwrap().defaults();
        let op = model.boxmodel().circulation(&p).unwrap();

        let uniform = Array1::from_elem(model.n_boxes(), 1.0);
        let rates = apply(&op, &uniform).unwrap();
        for r in rates {
            assert_relative_eq!(r, 0.0, epsilon = 1e-12);
        }
    }

    /// Total tracer mass is invariant under the circulation whatever the
    /// state: every volume-weighted column sum vanishes.
    #[test]
    fn circulation_conserves_total_mass() {
        let model = model();
        let p = phosphorus_parameters().finalize().unwrap().defaults();
        let op = model.boxmodel().circulation(&p).unwrap();

        let volumes = model.boxmodel().grid().wet_volumes();
        let sums = volume_weighted_column_sums(&op, &volumes).unwrap();
        for s in sums {
            assert_relative_eq!(s, 0.0, epsilon = 1e-6);
        }
    }

    /// The sinking operator conserves column mass: nothing enters through
    /// the surface and nothing leaves through the seafloor.
    #[test]
    fn sinking_conserves_column_mass() {
        let model = model();
        let p = phosphorus_parameters().finalize().unwrap().defaults();
        let velocity = LinearVelocity::new(
            p.get("sinking_speed").unwrap(),
            p.get("sinking_gradient").unwrap(),
        );
        let op = sinking_operator(model.boxmodel().grid(), |z| velocity.at(z)).unwrap();

        let volumes = model.boxmodel().grid().wet_volumes();
        let sums = volume_weighted_column_sums(&op, &volumes).unwrap();
        for s in sums {
            assert_relative_eq!(s, 0.0, epsilon = 1e-12);
        }
    }
}

mod phosphorus_budget {
    use super::*;

    /// Transport, uptake, sinking and remineralization all conserve total
    /// phosphorus; the only source/sink left in the budget is the
    /// geological restoring term.
    #[test]
    fn budget_closes_up_to_geological_restoring() {
        let model = model();
        let p = phosphorus_parameters().finalize().unwrap().defaults();
        let (dip, pop) = test_state(model.n_boxes());

        let (d_dip, d_pop) = model.state_function(&dip, &pop, &p).unwrap();
        let budget_rate = model.total_phosphorus(&d_dip, &d_pop).unwrap();

        let lambda = p.get("geo_restoring").unwrap();
        let mean = p.get("mean_phosphate").unwrap();
        let volumes = model.boxmodel().grid().wet_volumes();
        let geological: f64 = volumes
            .iter()
            .zip(dip.iter())
            .map(|(v, x)| v * lambda * (mean - x))
            .sum();

        assert_relative_eq!(budget_rate, geological, max_relative = 1e-6);
    }
}

mod jacobian_consistency {
    use super::*;

    /// A dual-seeded parameter evaluation of the stacked residual must
    /// match a central finite difference through the nonlinear uptake term.
    #[test]
    fn dual_derivative_matches_finite_difference() {
        let model = model();
        let layout = phosphorus_parameters().finalize().unwrap();
        let p = layout.defaults();
        let m = model.n_boxes();
        let (dip, pop) = test_state(m);

        let mut x = Array1::from_elem(2 * m, 0.0);
        for i in 0..m {
            x[i] = dip[i];
            x[m + i] = pop[i];
        }

        // Dual evaluation, seeding the half-saturation constant.
        let pos = layout.position("half_saturation").unwrap();
        let mut p_dual = p.map(Dual::from_f64);
        let mut values = p_dual.values().to_vec();
        values[pos] = Dual::seed(values[pos].re);
        p_dual.replace(values).unwrap();

        let x_dual = x.mapv(Dual::from_f64);
        let residual_dual = model.stacked_state_function(&x_dual, &p_dual).unwrap();

        // Central finite difference in the same parameter.
        let k = p.get_at(pos).unwrap();
        let h = k * 1.0e-4;
        let perturbed = |value: f64| {
            let mut q = p.clone();
            let mut vals = q.values().to_vec();
            vals[pos] = value;
            q.replace(vals).unwrap();
            model.stacked_state_function(&x, &q).unwrap()
        };
        let plus = perturbed(k + h);
        let minus = perturbed(k - h);

        for i in 0..2 * m {
            let fd = (plus[i] - minus[i]) / (2.0 * h);
            assert_relative_eq!(residual_dual[i].eps, fd, max_relative = 1e-5, epsilon = 1e-22);
        }
    }
}
