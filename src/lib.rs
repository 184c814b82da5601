//! Steady-state ocean biogeochemistry box models.
//!
//! The heavy lifting lives in [`obgc_core`] (operator builders, parameter
//! vectors, dual numbers) and [`obgc_components`] (the worked five-box
//! circulation and phosphorus cycle); this crate re-exports the surface
//! most users need.

pub use obgc_components::boxmodel::{BoxModel, BoxModelConfig, FIVE_BOX_CONFIG};
pub use obgc_components::components::phosphorus::{phosphorus_parameters, PhosphorusModel};
pub use obgc_core::dual::{Dual, HyperDual};
pub use obgc_core::errors::{OBGCError, OBGCResult};
pub use obgc_core::grid::{BoxGrid, Cell};
pub use obgc_core::mask::reduce_to_wet;
pub use obgc_core::params::{ParameterEntry, ParameterLayout, ParameterTable, ParameterVector};
pub use obgc_core::scalar::TracerScalar;
pub use obgc_core::sinking::{sinking_operator, LinearVelocity};
pub use obgc_core::transport::{circulation_operator, pathway_operator, Pathway};
