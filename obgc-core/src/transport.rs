//! Flux-network divergence operators
//!
//! A circulation is described as a set of [`Pathway`]s: closed loops of
//! boxes, each carrying a single volumetric flow rate. Every consecutive
//! pair along a loop moves water (and with it, tracer) from the earlier box
//! into the later one; the loop closes back on its first box, so whatever a
//! box exports along the loop is imported by the next box and total tracer
//! mass is conserved exactly.
//!
//! For a pathway with flow `ϕ` the rate of change it induces at box `bᵢ` is
//!
//! ```text
//! (D x)[bᵢ] = ϕ / V(bᵢ) · (x[bᵢ₋₁] − x[bᵢ])
//! ```
//!
//! i.e. the flux brought in from the upstream box minus the flux carried on
//! downstream, divided by the receiving volume. A two-box loop degenerates
//! to plain bidirectional exchange under the same formula, which is how
//! diffusive mixing terms are expressed here.

use crate::errors::{OBGCError, OBGCResult};
use crate::grid::BoxGrid;
use crate::scalar::TracerScalar;
use log::debug;
use nalgebra_sparse::coo::CooMatrix;
use nalgebra_sparse::csr::CsrMatrix;
use serde::{Deserialize, Serialize};

/// A closed advective loop of box indices.
///
/// The cycle is stored without the repeated closing index; the wrap-around
/// from the last box back to the first is implied. The ordering encodes the
/// flow direction: water moves from each box to the next one listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pathway {
    boxes: Vec<usize>,
}

impl Pathway {
    /// Create a pathway from a loop of box indices.
    ///
    /// Fails if fewer than two boxes are given. Index-range and wet-mask
    /// checks happen against the grid when the operator is built.
    pub fn new(boxes: Vec<usize>) -> OBGCResult<Self> {
        if boxes.len() < 2 {
            return Err(OBGCError::PathwayTooShort(boxes.len()));
        }
        Ok(Self { boxes })
    }

    /// The degenerate two-box loop: bidirectional exchange between `a` and
    /// `b` at the pathway's flow rate.
    pub fn mixing(a: usize, b: usize) -> Self {
        Self { boxes: vec![a, b] }
    }

    pub fn boxes(&self) -> &[usize] {
        &self.boxes
    }
}

/// Validate a pathway against the grid and add its divergence contribution
/// to the accumulator.
fn push_pathway<T: TracerScalar>(
    coo: &mut CooMatrix<T>,
    grid: &BoxGrid,
    pathway: &Pathway,
    flow: T,
) -> OBGCResult<()> {
    let boxes = pathway.boxes();
    if boxes.len() < 2 {
        return Err(OBGCError::PathwayTooShort(boxes.len()));
    }
    if flow.re() <= 0.0 {
        return Err(OBGCError::NonPositiveFlow(flow.re()));
    }
    for &b in boxes {
        if b >= grid.n_boxes() {
            return Err(OBGCError::BoxIndexOutOfRange {
                index: b,
                n_boxes: grid.n_boxes(),
            });
        }
        if !grid.is_wet(b) {
            return Err(OBGCError::FluxThroughDryBox(b));
        }
    }

    let n = boxes.len();
    for i in 0..n {
        let cur = boxes[i];
        let prev = boxes[(i + n - 1) % n];
        let rate = flow / T::from_f64(grid.volume(cur));
        coo.push(cur, prev, rate);
        coo.push(cur, cur, -rate);
    }
    Ok(())
}

/// Build the full-lattice divergence operator of a single pathway.
pub fn pathway_operator<T: TracerScalar>(
    grid: &BoxGrid,
    pathway: &Pathway,
    flow: T,
) -> OBGCResult<CsrMatrix<T>> {
    let n = grid.n_boxes();
    let mut coo = CooMatrix::new(n, n);
    push_pathway(&mut coo, grid, pathway, flow)?;
    Ok(CsrMatrix::from(&coo))
}

/// Build the full-lattice circulation operator from a set of pathways.
///
/// Each pathway is validated before it contributes; the contributions are
/// summed, and since matrix addition commutes the pathway order does not
/// matter. The result maps a full-lattice concentration vector to its rate
/// of change under the combined circulation.
pub fn circulation_operator<T: TracerScalar>(
    grid: &BoxGrid,
    pathways: &[(Pathway, T)],
) -> OBGCResult<CsrMatrix<T>> {
    let n = grid.n_boxes();
    let mut coo = CooMatrix::new(n, n);
    for (pathway, flow) in pathways {
        push_pathway(&mut coo, grid, pathway, *flow)?;
    }
    let op = CsrMatrix::from(&coo);
    debug!(
        "assembled circulation operator: {} boxes, {} pathways, {} nonzeros",
        n,
        pathways.len(),
        op.nnz()
    );
    Ok(op)
}
