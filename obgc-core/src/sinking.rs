//! Sinking particle flux divergence (PFD) operators
//!
//! Particulate tracers fall through the water column at a depth-dependent
//! velocity. The divergence of that flux is discretized per column with an
//! upwind scheme: the flux through the interface between a box and the box
//! beneath it carries the concentration of the box above, because sinking
//! only ever moves material downward. Columns are closed at both ends (no
//! supply through the surface, no export through the seafloor), so each
//! column conserves its total tracer mass exactly; whatever reaches the
//! bottom box stays there until reaction terms consume it.
//!
//! The operator is built directly on the wet subspace, in the same wet
//! ordering the [mask reducer](crate::mask) produces, so the two operator
//! families can be summed without index translation. A dry box below a wet
//! box acts as the seafloor.

use crate::errors::{OBGCError, OBGCResult};
use crate::grid::BoxGrid;
use crate::scalar::TracerScalar;
use log::debug;
use nalgebra_sparse::coo::CooMatrix;
use nalgebra_sparse::csr::CsrMatrix;
use serde::{Deserialize, Serialize};

/// The reference sinking velocity law, affine in depth:
/// `w(z) = w₀ + w′·z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearVelocity<T> {
    /// Velocity at the surface (m/s)
    pub w0: T,
    /// Velocity increase per metre of depth (1/s)
    pub slope: T,
}

impl<T: TracerScalar> LinearVelocity<T> {
    pub fn new(w0: T, slope: T) -> Self {
        Self { w0, slope }
    }

    pub fn at(&self, depth: f64) -> T {
        self.w0 + self.slope * T::from_f64(depth)
    }
}

/// Build the upwind sinking divergence operator over the wet subspace.
///
/// `velocity` is evaluated once per box interface, at the midpoint of the
/// two adjacent box depths. A negative velocity anywhere is a configuration
/// error: the upwind choice of the shallower box is only correct for
/// downward transport.
pub fn sinking_operator<T, F>(grid: &BoxGrid, velocity: F) -> OBGCResult<CsrMatrix<T>>
where
    T: TracerScalar,
    F: Fn(f64) -> T,
{
    let m = grid.n_wet();
    let mut coo = CooMatrix::new(m, m);

    for (pos, &b) in grid.wet_indices().iter().enumerate() {
        let Some(lower) = grid.below(b) else {
            continue;
        };
        if !grid.is_wet(lower) {
            // Seafloor: the column ends here, nothing leaves through it.
            continue;
        }
        let lower_pos = grid
            .wet_position(lower)
            .expect("wet box must have a wet position");

        let z_interface = 0.5 * (grid.depth(b) + grid.depth(lower));
        let w = velocity(z_interface);
        if w.re() < 0.0 {
            return Err(OBGCError::NegativeSinkingVelocity {
                depth: z_interface,
                velocity: w.re(),
            });
        }

        // Upwind: the interface flux carries the upper box's concentration.
        coo.push(pos, pos, -w / T::from_f64(grid.volume(b)));
        coo.push(lower_pos, pos, w / T::from_f64(grid.volume(lower)));
    }

    let op = CsrMatrix::from(&coo);
    debug!(
        "assembled sinking operator: {} wet boxes, {} nonzeros",
        m,
        op.nnz()
    );
    Ok(op)
}
