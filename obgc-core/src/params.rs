//! Parameter tables and frozen parameter vectors
//!
//! Model coefficients are declared once in a [`ParameterTable`] (name,
//! default, unit tag, optimizable flag, optional observation variance and a
//! description) and then frozen into a [`ParameterLayout`] whose order and
//! names never change. Concrete values live in a [`ParameterVector<T>`]
//! over that layout.
//!
//! The vector is generic over [`TracerScalar`]: every downstream
//! computation (operator construction, reaction terms, objective
//! evaluation) accepts a `ParameterVector<Dual>` just as well as a
//! `ParameterVector<f64>`, which is how a single code path serves both
//! forward simulation and exact Jacobian evaluation. Multiplying a default
//! vector by a dual unit is the conformance check for that property.

use crate::errors::{OBGCError, OBGCResult};
use crate::scalar::TracerScalar;
use serde::{Deserialize, Serialize};
use std::ops::Mul;
use std::sync::Arc;

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEntry {
    pub name: String,
    pub default: f64,
    /// Physical unit tag, e.g. `"m3 s-1"`. Informational only; no unit
    /// conversion happens in this crate.
    pub unit: String,
    /// Whether a calibration is allowed to vary this entry.
    pub optimizable: bool,
    /// Observation variance used to weight this entry during calibration.
    pub variance_obs: Option<f64>,
    pub description: String,
}

impl ParameterEntry {
    pub fn new(name: &str, default: f64, unit: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            default,
            unit: unit.to_string(),
            optimizable: false,
            variance_obs: None,
            description: description.to_string(),
        }
    }

    /// Mark the entry as adjustable by a calibration, optionally with an
    /// observation variance.
    pub fn optimizable(mut self, variance_obs: Option<f64>) -> Self {
        self.optimizable = true;
        self.variance_obs = variance_obs;
        self
    }
}

/// A mutable table of parameter declarations.
///
/// Entries are appended with [`add`](Self::add) and removed with
/// [`delete`](Self::delete)/[`delete_at`](Self::delete_at);
/// [`finalize`](Self::finalize) freezes the table into a layout exactly
/// once. Any mutation or second finalize after that is an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterTable {
    entries: Vec<ParameterEntry>,
    finalized: bool,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Fails on a duplicate name or a finalized table.
    pub fn add(&mut self, entry: ParameterEntry) -> OBGCResult<()> {
        if self.finalized {
            return Err(OBGCError::TableAlreadyFinalized);
        }
        if self.entries.iter().any(|e| e.name == entry.name) {
            return Err(OBGCError::DuplicateParameter(entry.name));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Remove an entry by name.
    pub fn delete(&mut self, name: &str) -> OBGCResult<ParameterEntry> {
        if self.finalized {
            return Err(OBGCError::TableAlreadyFinalized);
        }
        match self.entries.iter().position(|e| e.name == name) {
            Some(position) => Ok(self.entries.remove(position)),
            None => Err(OBGCError::UnknownParameter(name.to_string())),
        }
    }

    /// Remove an entry by position.
    pub fn delete_at(&mut self, position: usize) -> OBGCResult<ParameterEntry> {
        if self.finalized {
            return Err(OBGCError::TableAlreadyFinalized);
        }
        if position >= self.entries.len() {
            return Err(OBGCError::ParameterIndexOutOfRange {
                position,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(position))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the table into a fixed-order layout.
    ///
    /// The layout can be generated at most once per table; a second call
    /// fails with [`OBGCError::TableAlreadyFinalized`].
    pub fn finalize(&mut self) -> OBGCResult<ParameterLayout> {
        if self.finalized {
            return Err(OBGCError::TableAlreadyFinalized);
        }
        self.finalized = true;
        Ok(ParameterLayout {
            entries: Arc::new(self.entries.clone()),
        })
    }
}

/// The frozen, fixed-order parameter layout shared by every vector built
/// from the same table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterLayout {
    entries: Arc<Vec<ParameterEntry>>,
}

impl ParameterLayout {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ParameterEntry] {
        &self.entries
    }

    /// Position of a named entry, if present.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Positions of the entries a calibration may vary.
    pub fn optimizable_positions(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.optimizable)
            .map(|(i, _)| i)
            .collect()
    }

    /// A vector populated with every entry's default value.
    pub fn defaults(&self) -> ParameterVector<f64> {
        ParameterVector {
            layout: self.clone(),
            values: self.entries.iter().map(|e| e.default).collect(),
        }
    }
}

/// Concrete parameter values over a frozen layout.
///
/// Entries are read-only; the only mutation is whole-vector replacement
/// (e.g. by an optimization step proposing a new point).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterVector<T: TracerScalar> {
    layout: ParameterLayout,
    values: Vec<T>,
}

impl<T: TracerScalar> ParameterVector<T> {
    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a value by name.
    pub fn get(&self, name: &str) -> OBGCResult<T> {
        self.layout
            .position(name)
            .map(|i| self.values[i])
            .ok_or_else(|| OBGCError::UnknownParameter(name.to_string()))
    }

    /// Look up a value by position.
    pub fn get_at(&self, position: usize) -> OBGCResult<T> {
        self.values.get(position).copied().ok_or(
            OBGCError::ParameterIndexOutOfRange {
                position,
                len: self.values.len(),
            },
        )
    }

    /// Replace every value at once, keeping the layout.
    pub fn replace(&mut self, values: Vec<T>) -> OBGCResult<()> {
        if values.len() != self.values.len() {
            return Err(OBGCError::ParameterLengthMismatch {
                len: values.len(),
                expected: self.values.len(),
            });
        }
        self.values = values;
        Ok(())
    }

    /// Map every value through `f`, producing a vector of another scalar
    /// type over the same layout.
    pub fn map<U, F>(&self, f: F) -> ParameterVector<U>
    where
        U: TracerScalar,
        F: Fn(T) -> U,
    {
        ParameterVector {
            layout: self.layout.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }
}

/// Elementwise scalar-type substitution: multiplying a plain vector by a
/// composite unit (dual, hyper-dual) lifts every entry into that scalar
/// type. This is the genericity conformance operation: if it compiles and
/// the products are right, every arithmetic path downstream accepts the
/// composite type too.
impl<T: TracerScalar> Mul<T> for &ParameterVector<f64> {
    type Output = ParameterVector<T>;

    fn mul(self, rhs: T) -> ParameterVector<T> {
        self.map(|v| T::from_f64(v) * rhs)
    }
}

impl<T: TracerScalar> Mul<T> for ParameterVector<f64> {
    type Output = ParameterVector<T>;

    fn mul(self, rhs: T) -> ParameterVector<T> {
        &self * rhs
    }
}
