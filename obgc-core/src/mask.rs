//! Wet-mask reduction of full-lattice operators
//!
//! Dry boxes carry no tracer and contribute no flux, so a full-lattice
//! operator can be restricted to the principal submatrix over the wet index
//! set without losing anything. The restriction is only valid when that
//! assumption actually holds: any nonzero entry coupling a dry box means
//! flux would be silently discarded, which breaks conservation, so the
//! reducer fails instead of dropping it.

use crate::errors::{OBGCError, OBGCResult};
use crate::grid::BoxGrid;
use crate::scalar::TracerScalar;
use nalgebra_sparse::coo::CooMatrix;
use nalgebra_sparse::csr::CsrMatrix;
use num::Zero;

/// Restrict a full-lattice operator to the wet subspace.
///
/// Rows and columns are kept in the grid's wet ordering (ascending box
/// index), the same ordering the sinking builder uses, so reduced operators
/// from both families can be summed directly. The input operator is not
/// modified.
///
/// Fails with [`OBGCError::FluxThroughDryBox`] if a structurally nonzero
/// entry has a dry row or column, and with
/// [`OBGCError::OperatorShapeMismatch`] if the operator does not match the
/// grid's full lattice.
pub fn reduce_to_wet<T: TracerScalar>(
    op: &CsrMatrix<T>,
    grid: &BoxGrid,
) -> OBGCResult<CsrMatrix<T>> {
    let n = grid.n_boxes();
    if op.nrows() != n || op.ncols() != n {
        return Err(OBGCError::OperatorShapeMismatch {
            rows: op.nrows(),
            cols: op.ncols(),
            expected: n,
        });
    }

    let m = grid.n_wet();
    let mut coo = CooMatrix::new(m, m);
    for (i, j, v) in op.triplet_iter() {
        if v.is_zero() {
            continue;
        }
        match (grid.wet_position(i), grid.wet_position(j)) {
            (Some(wi), Some(wj)) => coo.push(wi, wj, *v),
            (None, _) => return Err(OBGCError::FluxThroughDryBox(i)),
            (_, None) => return Err(OBGCError::FluxThroughDryBox(j)),
        }
    }
    Ok(CsrMatrix::from(&coo))
}
