//! Two-tracer phosphorus cycle
//!
//! Dissolved inorganic phosphorus (DIP) is carried by the circulation,
//! consumed by biological uptake in the euphotic zone and restored toward
//! the geological mean on a very long timescale. Particulate organic
//! phosphorus (POP) is produced by that uptake, sinks with a
//! depth-dependent velocity and remineralizes back to DIP at a first-order
//! rate:
//!
//! ```text
//! dDIP/dt = T·DIP − U(DIP) + κ·POP + λ·(x̄ − DIP)
//! dPOP/dt = S·POP + U(DIP) − κ·POP
//! ```
//!
//! where `T` is the circulation operator, `S` the sinking operator,
//! `U(DIP) = uₘₐₓ·DIP/(DIP + k)` inside the euphotic zone and zero below
//! it. At steady state the right-hand sides vanish; that residual is what
//! [`PhosphorusModel::state_function`] evaluates, and what an external
//! Newton-type solver drives to zero. Everything is generic over the scalar
//! type, so the same code evaluates dual-number Jacobian columns.

use crate::boxmodel::BoxModel;
use ndarray::Array1;
use obgc_core::errors::{OBGCError, OBGCResult};
use obgc_core::linalg::apply;
use obgc_core::params::{ParameterEntry, ParameterTable, ParameterVector};
use obgc_core::scalar::TracerScalar;
use obgc_core::sinking::{sinking_operator, LinearVelocity};

/// Depth above which biological uptake operates (m), a fixed property of
/// the model rather than a calibrated parameter so the state function stays
/// smooth in `p`.
const DEFAULT_EUPHOTIC_DEPTH: f64 = 100.0;

/// The canonical parameter table of the phosphorus cycle.
///
/// Circulation flows come first, then the biogeochemical rates. The
/// biological constants are flagged optimizable with observation variances
/// for calibration; the geological closure terms are not.
pub fn phosphorus_parameters() -> ParameterTable {
    let mut table = ParameterTable::new();
    let entries = [
        ParameterEntry::new(
            "overturning",
            2.0e7,
            "m3 s-1",
            "Volume transport of the overturning loop",
        ),
        ParameterEntry::new(
            "deep_mixing",
            1.0e7,
            "m3 s-1",
            "Diffusive exchange between low-latitude mid and deep boxes",
        ),
        ParameterEntry::new(
            "ventilation",
            5.0e6,
            "m3 s-1",
            "High-latitude ventilation exchange",
        ),
        ParameterEntry::new(
            "uptake_max",
            1.0e-10,
            "mol m-3 s-1",
            "Maximum euphotic phosphorus uptake rate",
        )
        .optimizable(Some(0.1)),
        ParameterEntry::new(
            "half_saturation",
            5.0e-4,
            "mol m-3",
            "Uptake half-saturation DIP concentration",
        )
        .optimizable(Some(0.2)),
        ParameterEntry::new(
            "remin_rate",
            4.0e-7,
            "s-1",
            "First-order POP remineralization rate",
        )
        .optimizable(Some(0.1)),
        ParameterEntry::new(
            "sinking_speed",
            1.1574e-3,
            "m s-1",
            "POP sinking speed at the surface",
        )
        .optimizable(Some(0.25)),
        ParameterEntry::new(
            "sinking_gradient",
            1.0e-5,
            "s-1",
            "Increase of POP sinking speed per metre of depth",
        )
        .optimizable(Some(0.25)),
        ParameterEntry::new(
            "geo_restoring",
            3.0e-14,
            "s-1",
            "Geological restoring rate of DIP toward the global mean",
        ),
        ParameterEntry::new(
            "mean_phosphate",
            2.17e-3,
            "mol m-3",
            "Global mean phosphate concentration",
        ),
    ];
    for entry in entries {
        table
            .add(entry)
            .expect("phosphorus parameter names are unique");
    }
    table
}

/// The assembled two-tracer steady-state model.
#[derive(Debug, Clone)]
pub struct PhosphorusModel {
    boxmodel: BoxModel,
    euphotic_depth: f64,
}

impl PhosphorusModel {
    pub fn new(boxmodel: BoxModel) -> Self {
        Self {
            boxmodel,
            euphotic_depth: DEFAULT_EUPHOTIC_DEPTH,
        }
    }

    pub fn with_euphotic_depth(mut self, depth: f64) -> Self {
        self.euphotic_depth = depth;
        self
    }

    pub fn boxmodel(&self) -> &BoxModel {
        &self.boxmodel
    }

    /// Number of wet boxes, i.e. the length of each tracer vector.
    pub fn n_boxes(&self) -> usize {
        self.boxmodel.grid().n_wet()
    }

    /// Saturating biological uptake, nonzero only above the euphotic depth.
    fn uptake<T: TracerScalar>(
        &self,
        dip: &Array1<T>,
        p: &ParameterVector<T>,
    ) -> OBGCResult<Array1<T>> {
        let u_max = p.get("uptake_max")?;
        let k = p.get("half_saturation")?;
        let depths = self.boxmodel.grid().wet_depths();
        let mut u = Array1::from_elem(dip.len(), T::zero());
        for (i, &depth) in depths.iter().enumerate() {
            if depth < self.euphotic_depth {
                u[i] = u_max * dip[i] / (dip[i] + k);
            }
        }
        Ok(u)
    }

    /// Evaluate the steady-state residual of both tracers.
    ///
    /// Returns `(dDIP/dt, dPOP/dt)` over the wet subspace. Both operators
    /// are rebuilt from `p` on every call, keeping the whole evaluation a
    /// pure function of the parameter vector.
    pub fn state_function<T: TracerScalar>(
        &self,
        dip: &Array1<T>,
        pop: &Array1<T>,
        p: &ParameterVector<T>,
    ) -> OBGCResult<(Array1<T>, Array1<T>)> {
        let m = self.n_boxes();
        if dip.len() != m {
            return Err(OBGCError::StateLengthMismatch {
                len: dip.len(),
                expected: m,
            });
        }
        if pop.len() != m {
            return Err(OBGCError::StateLengthMismatch {
                len: pop.len(),
                expected: m,
            });
        }

        let circulation = self.boxmodel.circulation(p)?;
        let velocity = LinearVelocity::new(p.get("sinking_speed")?, p.get("sinking_gradient")?);
        let sinking = sinking_operator(self.boxmodel.grid(), |z| velocity.at(z))?;

        let uptake = self.uptake(dip, p)?;
        let kappa = p.get("remin_rate")?;
        let lambda = p.get("geo_restoring")?;
        let mean = p.get("mean_phosphate")?;

        let mut d_dip = apply(&circulation, dip)?;
        let mut d_pop = apply(&sinking, pop)?;
        for i in 0..m {
            let remin = kappa * pop[i];
            d_dip[i] = d_dip[i] - uptake[i] + remin + lambda * (mean - dip[i]);
            d_pop[i] = d_pop[i] + uptake[i] - remin;
        }
        Ok((d_dip, d_pop))
    }

    /// The solver-facing form: one stacked residual vector `[DIP; POP]`.
    pub fn stacked_state_function<T: TracerScalar>(
        &self,
        x: &Array1<T>,
        p: &ParameterVector<T>,
    ) -> OBGCResult<Array1<T>> {
        let m = self.n_boxes();
        if x.len() != 2 * m {
            return Err(OBGCError::StateLengthMismatch {
                len: x.len(),
                expected: 2 * m,
            });
        }
        let dip = x.slice(ndarray::s![..m]).to_owned();
        let pop = x.slice(ndarray::s![m..]).to_owned();
        let (d_dip, d_pop) = self.state_function(&dip, &pop, p)?;

        let mut out = Array1::from_elem(2 * m, T::zero());
        for i in 0..m {
            out[i] = d_dip[i];
            out[m + i] = d_pop[i];
        }
        Ok(out)
    }

    /// Total phosphorus inventory `Σᵢ Vᵢ·(DIPᵢ + POPᵢ)` (mol).
    pub fn total_phosphorus<T: TracerScalar>(
        &self,
        dip: &Array1<T>,
        pop: &Array1<T>,
    ) -> OBGCResult<T> {
        let m = self.n_boxes();
        if dip.len() != m || pop.len() != m {
            return Err(OBGCError::StateLengthMismatch {
                len: dip.len().max(pop.len()),
                expected: m,
            });
        }
        let volumes = self.boxmodel.grid().wet_volumes();
        let mut total = T::zero();
        for i in 0..m {
            total += T::from_f64(volumes[i]) * (dip[i] + pop[i]);
        }
        Ok(total)
    }
}
