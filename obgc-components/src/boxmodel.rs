//! The worked coarse-resolution ocean box model
//!
//! A [`BoxModel`] couples a column-lattice grid to a set of named advective
//! pathways whose flow rates are looked up in a parameter vector at
//! operator-build time, so the circulation operator is a pure function of
//! the parameters. The lattice and pathway routing are described by a
//! [`BoxModelConfig`], which round-trips through TOML.

use log::debug;
use nalgebra_sparse::csr::CsrMatrix;
use obgc_core::errors::{OBGCError, OBGCResult};
use obgc_core::grid::{BoxGrid, Cell};
use obgc_core::mask::reduce_to_wet;
use obgc_core::params::ParameterVector;
use obgc_core::scalar::TracerScalar;
use obgc_core::transport::{circulation_operator, Pathway};
use serde::{Deserialize, Serialize};

/// The canonical five-wet-box, two-column demonstration ocean.
///
/// Column one is a deep low-latitude column (surface, mid, deep); column
/// two is a shallower high-latitude column whose deepest cell is dry
/// seafloor. One overturning loop spans both columns, and each column pair
/// of adjacent boxes that exchanges water diffusively does so through a
/// two-box mixing loop.
pub const FIVE_BOX_CONFIG: &str = r#"
[[columns]]
cells = [
    { depth = 50.0, volume = 1.0e16, wet = true },
    { depth = 300.0, volume = 3.0e16, wet = true },
    { depth = 1500.0, volume = 1.0e17, wet = true },
]

[[columns]]
cells = [
    { depth = 50.0, volume = 5.0e15, wet = true },
    { depth = 300.0, volume = 1.5e16, wet = true },
    { depth = 1500.0, volume = 4.0e16, wet = false },
]

[[pathways]]
route = [0, 3, 4, 2, 1]
flow = "overturning"

[[pathways]]
route = [1, 2]
flow = "deep_mixing"

[[pathways]]
route = [3, 4]
flow = "ventilation"
"#;

/// One water column, cells ordered top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub cells: Vec<Cell>,
}

/// One advective loop with the name of the parameter carrying its flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayConfig {
    /// Box indices along the loop (column-major lattice enumeration)
    pub route: Vec<usize>,
    /// Name of the flow-rate parameter (m³/s)
    pub flow: String,
}

/// Serializable description of a box model: lattice plus pathway routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxModelConfig {
    pub columns: Vec<ColumnConfig>,
    pub pathways: Vec<PathwayConfig>,
}

/// A grid plus named pathways, ready to build circulation operators.
#[derive(Debug, Clone)]
pub struct BoxModel {
    grid: BoxGrid,
    pathways: Vec<(Pathway, String)>,
}

impl BoxModel {
    /// Validate a configuration into a model.
    pub fn from_config(config: &BoxModelConfig) -> OBGCResult<Self> {
        let columns: Vec<Vec<Cell>> = config.columns.iter().map(|c| c.cells.clone()).collect();
        let grid = BoxGrid::from_columns(&columns)?;
        let pathways = config
            .pathways
            .iter()
            .map(|p| Ok((Pathway::new(p.route.clone())?, p.flow.clone())))
            .collect::<OBGCResult<Vec<_>>>()?;
        debug!(
            "built box model: {} boxes ({} wet), {} pathways",
            grid.n_boxes(),
            grid.n_wet(),
            pathways.len()
        );
        Ok(Self { grid, pathways })
    }

    /// Parse a TOML configuration and build the model from it.
    pub fn from_toml(source: &str) -> OBGCResult<Self> {
        let config: BoxModelConfig = toml::from_str(source)
            .map_err(|e| OBGCError::Error(format!("failed to parse box model configuration: {e}")))?;
        Self::from_config(&config)
    }

    /// The canonical five-wet-box demonstration model.
    pub fn five_box() -> OBGCResult<Self> {
        Self::from_toml(FIVE_BOX_CONFIG)
    }

    pub fn grid(&self) -> &BoxGrid {
        &self.grid
    }

    pub fn pathways(&self) -> &[(Pathway, String)] {
        &self.pathways
    }

    /// Build the wet-space circulation operator for a parameter vector.
    ///
    /// Each pathway's flow rate is looked up by name; the full-lattice
    /// operator is assembled and reduced onto the wet subspace. Pure in
    /// `p`: evaluating with a dual-valued vector yields the operator's
    /// sensitivity to the flow parameters.
    pub fn circulation<T: TracerScalar>(
        &self,
        p: &ParameterVector<T>,
    ) -> OBGCResult<CsrMatrix<T>> {
        let resolved = self
            .pathways
            .iter()
            .map(|(pathway, flow)| Ok((pathway.clone(), p.get(flow)?)))
            .collect::<OBGCResult<Vec<_>>>()?;
        let full = circulation_operator(&self.grid, &resolved)?;
        reduce_to_wet(&full, &self.grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use obgc_core::linalg::apply;
    use obgc_core::params::{ParameterEntry, ParameterTable};
    use ndarray::Array1;

    fn flow_parameters() -> ParameterVector<f64> {
        let mut table = ParameterTable::new();
        table
            .add(ParameterEntry::new(
                "overturning",
                2.0e7,
                "m3 s-1",
                "Overturning volume transport",
            ))
            .unwrap();
        table
            .add(ParameterEntry::new(
                "deep_mixing",
                1.0e7,
                "m3 s-1",
                "Low-latitude deep exchange",
            ))
            .unwrap();
        table
            .add(ParameterEntry::new(
                "ventilation",
                5.0e6,
                "m3 s-1",
                "High-latitude ventilation exchange",
            ))
            .unwrap();
        table.finalize().unwrap().defaults()
    }

    #[test]
    fn five_box_model_builds() {
        let model = BoxModel::five_box().unwrap();
        assert_eq!(model.grid().n_boxes(), 6);
        assert_eq!(model.grid().n_wet(), 5);
        assert_eq!(model.pathways().len(), 3);
    }

    #[test]
    fn circulation_lives_on_the_wet_subspace() {
        let model = BoxModel::five_box().unwrap();
        let op = model.circulation(&flow_parameters()).unwrap();
        assert_eq!(op.nrows(), 5);
        assert_eq!(op.ncols(), 5);

        let uniform = Array1::from_elem(5, 1.0);
        let rates = apply(&op, &uniform).unwrap();
        for r in rates {
            assert!(is_close!(r, 0.0, abs_tol = 1e-12));
        }
    }

    #[test]
    fn missing_flow_parameter_is_an_error() {
        let model = BoxModel::five_box().unwrap();
        let mut table = ParameterTable::new();
        table
            .add(ParameterEntry::new("overturning", 2.0e7, "m3 s-1", ""))
            .unwrap();
        let p = table.finalize().unwrap().defaults();
        let err = model.circulation(&p).unwrap_err();
        assert_eq!(err, OBGCError::UnknownParameter("deep_mixing".to_string()));
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let config: BoxModelConfig = toml::from_str(FIVE_BOX_CONFIG).unwrap();
        let serialized = toml::to_string(&config).unwrap();
        let reparsed: BoxModelConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(config, reparsed);
    }

    #[test]
    fn pathway_through_dry_cell_is_rejected_at_operator_build() {
        let mut config: BoxModelConfig = toml::from_str(FIVE_BOX_CONFIG).unwrap();
        // Reroute the overturning through the dry seafloor cell.
        config.pathways[0].route = vec![0, 3, 5, 2];
        let model = BoxModel::from_config(&config).unwrap();
        let err = model.circulation(&flow_parameters()).unwrap_err();
        assert_eq!(err, OBGCError::FluxThroughDryBox(5));
    }
}
