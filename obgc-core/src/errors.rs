use thiserror::Error;

/// Error type for invalid operations.
///
/// Every variant is a construction-time configuration error: builders fail
/// eagerly with one of these instead of producing a silently-wrong operator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OBGCError {
    #[error("{0}")]
    Error(String),
    #[error("grid arrays disagree in length: volumes={volumes}, depths={depths}, wet={wet}, below={below}")]
    GridShapeMismatch {
        volumes: usize,
        depths: usize,
        wet: usize,
        below: usize,
    },
    #[error("box {index} has non-positive volume {volume}")]
    NonPositiveVolume { index: usize, volume: f64 },
    #[error("box {index} (depth {depth_above}) lists box {below} (depth {depth_below}) directly beneath it, but it is not deeper")]
    InvalidColumnAdjacency {
        index: usize,
        below: usize,
        depth_above: f64,
        depth_below: f64,
    },
    #[error("pathway must visit at least two boxes, got {0}")]
    PathwayTooShort(usize),
    #[error("pathway flow rate must be strictly positive, got {0}")]
    NonPositiveFlow(f64),
    #[error("box index {index} is outside the grid of {n_boxes} boxes")]
    BoxIndexOutOfRange { index: usize, n_boxes: usize },
    #[error("box {0} is dry but would carry flux")]
    FluxThroughDryBox(usize),
    #[error("sinking velocity is negative ({velocity}) at depth {depth}")]
    NegativeSinkingVelocity { depth: f64, velocity: f64 },
    #[error("operator is {rows}x{cols} but {expected}x{expected} was expected")]
    OperatorShapeMismatch {
        rows: usize,
        cols: usize,
        expected: usize,
    },
    #[error("state vector has length {len} but the operator expects {expected}")]
    StateLengthMismatch { len: usize, expected: usize },
    #[error("parameter {0} is already defined")]
    DuplicateParameter(String),
    #[error("unknown parameter {0}")]
    UnknownParameter(String),
    #[error("parameter position {position} is out of range for a table of {len} entries")]
    ParameterIndexOutOfRange { position: usize, len: usize },
    #[error("parameter table has already been finalized")]
    TableAlreadyFinalized,
    #[error("replacement values have length {len} but the layout has {expected} parameters")]
    ParameterLengthMismatch { len: usize, expected: usize },
}

/// Convenience type for `Result<T, OBGCError>`.
pub type OBGCResult<T> = Result<T, OBGCError>;
