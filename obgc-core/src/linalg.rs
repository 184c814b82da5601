//! Sparse operator helpers.

use crate::errors::{OBGCError, OBGCResult};
use crate::scalar::TracerScalar;
use nalgebra_sparse::csr::CsrMatrix;
use ndarray::Array1;

/// Apply a sparse operator to a per-box state vector: `y = D x`.
pub fn apply<T: TracerScalar>(op: &CsrMatrix<T>, x: &Array1<T>) -> OBGCResult<Array1<T>> {
    if x.len() != op.ncols() {
        return Err(OBGCError::StateLengthMismatch {
            len: x.len(),
            expected: op.ncols(),
        });
    }
    let mut y = Array1::from_elem(op.nrows(), T::zero());
    for (i, j, v) in op.triplet_iter() {
        y[i] += *v * x[j];
    }
    Ok(y)
}

/// Volume-weighted column sums `Σᵢ Vᵢ·D[i,j]` of an operator.
///
/// For a mass-conserving divergence operator every entry of the result is
/// zero: the total tracer mass `Σᵢ Vᵢ·xᵢ` is then invariant under `dx/dt =
/// D x` whatever the state. This is the conservation diagnostic used by the
/// test suites for both operator families.
pub fn volume_weighted_column_sums<T: TracerScalar>(
    op: &CsrMatrix<T>,
    volumes: &[f64],
) -> OBGCResult<Vec<T>> {
    if volumes.len() != op.nrows() {
        return Err(OBGCError::StateLengthMismatch {
            len: volumes.len(),
            expected: op.nrows(),
        });
    }
    let mut sums = vec![T::zero(); op.ncols()];
    for (i, j, v) in op.triplet_iter() {
        sums[j] += T::from_f64(volumes[i]) * *v;
    }
    Ok(sums)
}
