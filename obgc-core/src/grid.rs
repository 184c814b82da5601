//! Box grid: volumes, depths, wet/dry mask and column adjacency
//!
//! A [`BoxGrid`] describes the full (possibly non-contiguous) lattice of
//! control volumes a circulation is discretized on. Boxes are indexed by
//! position in a flat enumeration; each carries a volume (m³) and a depth
//! (m, positive downward), a wet/dry flag, and optionally the index of the
//! box directly beneath it in the same water column.
//!
//! The wet index set is computed once at construction and every operator
//! builder reads it from here. This is what keeps the reduced circulation
//! operator and the sinking operator on the same index ordering, so the two
//! can be summed by the state-function assembler without translation.

use crate::errors::{OBGCError, OBGCResult};
use log::debug;
use serde::{Deserialize, Serialize};

/// One cell of a column lattice, used by [`BoxGrid::from_columns`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Depth of the cell centre (m, positive downward)
    pub depth: f64,
    /// Cell volume (m³)
    pub volume: f64,
    /// Whether the cell participates in transport
    pub wet: bool,
}

/// The full-lattice grid and volume model.
///
/// Immutable after construction; the wet/dry partition cannot change once a
/// grid exists.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxGrid {
    volumes: Vec<f64>,
    depths: Vec<f64>,
    wet: Vec<bool>,
    below: Vec<Option<usize>>,
    /// Wet box indices in ascending order; fixes the reduced-space ordering.
    wet_indices: Vec<usize>,
    /// Full index → position in `wet_indices`, `None` for dry boxes.
    wet_positions: Vec<Option<usize>>,
}

impl BoxGrid {
    /// Create a grid from per-box data.
    ///
    /// `below[i]` names the box directly beneath box `i` in the same water
    /// column, if any. All four slices must agree in length; volumes must be
    /// strictly positive; a box listed as `below` must be strictly deeper
    /// than its parent.
    pub fn new(
        volumes: Vec<f64>,
        depths: Vec<f64>,
        wet: Vec<bool>,
        below: Vec<Option<usize>>,
    ) -> OBGCResult<Self> {
        let n = volumes.len();
        if depths.len() != n || wet.len() != n || below.len() != n {
            return Err(OBGCError::GridShapeMismatch {
                volumes: n,
                depths: depths.len(),
                wet: wet.len(),
                below: below.len(),
            });
        }
        for (index, &volume) in volumes.iter().enumerate() {
            if volume <= 0.0 {
                return Err(OBGCError::NonPositiveVolume { index, volume });
            }
        }
        for (index, b) in below.iter().enumerate() {
            if let Some(b) = *b {
                if b >= n {
                    return Err(OBGCError::BoxIndexOutOfRange {
                        index: b,
                        n_boxes: n,
                    });
                }
                if depths[b] <= depths[index] {
                    return Err(OBGCError::InvalidColumnAdjacency {
                        index,
                        below: b,
                        depth_above: depths[index],
                        depth_below: depths[b],
                    });
                }
            }
        }

        let wet_indices: Vec<usize> = (0..n).filter(|&i| wet[i]).collect();
        let mut wet_positions = vec![None; n];
        for (pos, &i) in wet_indices.iter().enumerate() {
            wet_positions[i] = Some(pos);
        }
        debug!(
            "constructed grid with {} boxes ({} wet)",
            n,
            wet_indices.len()
        );

        Ok(Self {
            volumes,
            depths,
            wet,
            below,
            wet_indices,
            wet_positions,
        })
    }

    /// Build a grid from water columns of cells ordered top to bottom.
    ///
    /// Boxes are enumerated column-major (all cells of the first column,
    /// then the second, ...); each cell's `below` neighbour is the next cell
    /// in its column.
    pub fn from_columns(columns: &[Vec<Cell>]) -> OBGCResult<Self> {
        let n: usize = columns.iter().map(|c| c.len()).sum();
        let mut volumes = Vec::with_capacity(n);
        let mut depths = Vec::with_capacity(n);
        let mut wet = Vec::with_capacity(n);
        let mut below = Vec::with_capacity(n);

        let mut offset = 0;
        for column in columns {
            for (k, cell) in column.iter().enumerate() {
                volumes.push(cell.volume);
                depths.push(cell.depth);
                wet.push(cell.wet);
                below.push(if k + 1 < column.len() {
                    Some(offset + k + 1)
                } else {
                    None
                });
            }
            offset += column.len();
        }

        Self::new(volumes, depths, wet, below)
    }

    /// Total number of boxes in the lattice.
    pub fn n_boxes(&self) -> usize {
        self.volumes.len()
    }

    /// Number of wet boxes.
    pub fn n_wet(&self) -> usize {
        self.wet_indices.len()
    }

    /// Wet box indices in ascending order.
    ///
    /// This ordering defines the reduced (wet) subspace used by the wet-mask
    /// reducer and the sinking operator alike.
    pub fn wet_indices(&self) -> &[usize] {
        &self.wet_indices
    }

    /// Position of a box in the wet ordering, `None` for dry boxes.
    pub fn wet_position(&self, index: usize) -> Option<usize> {
        self.wet_positions.get(index).copied().flatten()
    }

    pub fn is_wet(&self, index: usize) -> bool {
        self.wet[index]
    }

    pub fn volume(&self, index: usize) -> f64 {
        self.volumes[index]
    }

    pub fn depth(&self, index: usize) -> f64 {
        self.depths[index]
    }

    /// The box directly beneath `index` in the same column, if any.
    pub fn below(&self, index: usize) -> Option<usize> {
        self.below[index]
    }

    /// Volumes of the wet boxes, in wet ordering.
    pub fn wet_volumes(&self) -> Vec<f64> {
        self.wet_indices.iter().map(|&i| self.volumes[i]).collect()
    }

    /// Depths of the wet boxes, in wet ordering.
    pub fn wet_depths(&self) -> Vec<f64> {
        self.wet_indices.iter().map(|&i| self.depths[i]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_column_grid() -> BoxGrid {
        // Column 0: three wet cells; column 1: two wet cells over a dry one.
        BoxGrid::from_columns(&[
            vec![
                Cell {
                    depth: 50.0,
                    volume: 1.0e16,
                    wet: true,
                },
                Cell {
                    depth: 300.0,
                    volume: 3.0e16,
                    wet: true,
                },
                Cell {
                    depth: 1500.0,
                    volume: 1.0e17,
                    wet: true,
                },
            ],
            vec![
                Cell {
                    depth: 50.0,
                    volume: 5.0e15,
                    wet: true,
                },
                Cell {
                    depth: 300.0,
                    volume: 1.5e16,
                    wet: true,
                },
                Cell {
                    depth: 1500.0,
                    volume: 4.0e16,
                    wet: false,
                },
            ],
        ])
        .unwrap()
    }

    #[test]
    fn column_lattice_adjacency() {
        let grid = two_column_grid();
        assert_eq!(grid.n_boxes(), 6);
        assert_eq!(grid.below(0), Some(1));
        assert_eq!(grid.below(1), Some(2));
        assert_eq!(grid.below(2), None);
        assert_eq!(grid.below(3), Some(4));
        assert_eq!(grid.below(4), Some(5));
        assert_eq!(grid.below(5), None);
    }

    #[test]
    fn wet_set_is_fixed_at_construction() {
        let grid = two_column_grid();
        assert_eq!(grid.n_wet(), 5);
        assert_eq!(grid.wet_indices(), &[0, 1, 2, 3, 4]);
        assert_eq!(grid.wet_position(4), Some(4));
        assert_eq!(grid.wet_position(5), None);
        assert!(!grid.is_wet(5));
    }

    #[test]
    fn wet_volumes_follow_wet_ordering() {
        let grid = two_column_grid();
        assert_eq!(
            grid.wet_volumes(),
            vec![1.0e16, 3.0e16, 1.0e17, 5.0e15, 1.5e16]
        );
        assert_eq!(grid.wet_depths(), vec![50.0, 300.0, 1500.0, 50.0, 300.0]);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let err = BoxGrid::new(
            vec![1.0, 1.0],
            vec![10.0],
            vec![true, true],
            vec![None, None],
        )
        .unwrap_err();
        assert!(matches!(err, OBGCError::GridShapeMismatch { .. }));
    }

    #[test]
    fn rejects_non_positive_volume() {
        let err = BoxGrid::new(
            vec![1.0, 0.0],
            vec![10.0, 20.0],
            vec![true, true],
            vec![Some(1), None],
        )
        .unwrap_err();
        assert_eq!(
            err,
            OBGCError::NonPositiveVolume {
                index: 1,
                volume: 0.0
            }
        );
    }

    #[test]
    fn rejects_below_box_that_is_not_deeper() {
        let err = BoxGrid::new(
            vec![1.0, 1.0],
            vec![20.0, 10.0],
            vec![true, true],
            vec![Some(1), None],
        )
        .unwrap_err();
        assert!(matches!(err, OBGCError::InvalidColumnAdjacency { .. }));
    }

    #[test]
    fn rejects_below_index_out_of_range() {
        let err = BoxGrid::new(
            vec![1.0, 1.0],
            vec![10.0, 20.0],
            vec![true, true],
            vec![Some(7), None],
        )
        .unwrap_err();
        assert_eq!(
            err,
            OBGCError::BoxIndexOutOfRange {
                index: 7,
                n_boxes: 2
            }
        );
    }
}
