// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Accelerator
//!
//! Adaptive Anderson (DIIS) acceleration of damped fixed-point iterations
//! xₙ₊₁ = xₙ + αₙ·Pf(xₙ), where Pf is a preconditioned residual supplied by the calling solver.
//!
//! A bounded history of past iterates and residuals is mixed into each step. Two safeguards
//! keep the least-squares mixing system well posed without hand tuning of the history depth:
//! - entries whose residual norm exceeds `error_factor` times the smallest known residual norm
//!   are discarded ([Chupin, Dupuy, Legendre, Séré 2021](https://doi.org/10.1051/m2an/2021069)),
//! - the oldest entries are discarded while the condition number of the mixing system exceeds
//!   `maximum_condition_number`.
//!
//! ```
//! use nalgebra::DVector;
//! use transporter_anderson::Accelerator;
//!
//! let mut accelerator = Accelerator::new(1, f64::INFINITY, f64::INFINITY);
//! let x = accelerator.apply(&DVector::from_element(1, 0.), 1., &DVector::from_element(1, 1.))?;
//! assert_eq!(x[0], 1.);
//! let x = accelerator.apply(&x, 1., &DVector::from_element(1, 0.5))?;
//! assert!((x[0] - 2.).abs() < 1e-12);
//! # Ok::<(), transporter_anderson::AccelerationError>(())
//! ```

mod history;
mod mixing;

pub use history::HistoryEntry;

use crate::{AccelerationError, Iterate};
use history::History;
use mixing::{difference_matrix, MixingSystem};
use nalgebra::{DVector, RealField};
use serde::Deserialize;

/// The configurable parameters of an `Accelerator`
#[derive(Clone, Debug, Deserialize)]
pub struct AcceleratorConfiguration<T> {
    /// Maximum number of retained history entries, `m`
    pub history_depth: usize,
    /// Largest tolerated condition number of the mixing system
    pub maximum_condition_number: T,
    /// Largest tolerated ratio of an entry's residual norm to the smallest residual norm
    pub error_factor: T,
}

impl<T: Copy + RealField> Default for AcceleratorConfiguration<T> {
    fn default() -> Self {
        Self {
            history_depth: 10,
            maximum_condition_number: nalgebra::convert(1e6),
            error_factor: nalgebra::convert(1e4),
        }
    }
}

/// Adaptive Anderson accelerator for a single fixed-point solve.
///
/// An `Accelerator` is exclusively owned by the loop it accelerates, independent solves
/// each need their own instance.
#[derive(Clone, Debug)]
pub struct Accelerator<T: RealField> {
    history: History<T>,
    maximum_condition_number: T,
    error_factor: T,
    /// Flattened length of the vectors in the history, fixed by the first accelerated call
    dimension: Option<usize>,
    /// Condition number of the mixing system used by the most recent step
    condition_number: Option<T>,
}

impl<T: Copy + RealField> Default for Accelerator<T> {
    fn default() -> Self {
        Self::from(&AcceleratorConfiguration::default())
    }
}

impl<T: Copy + RealField> From<&AcceleratorConfiguration<T>> for Accelerator<T> {
    fn from(configuration: &AcceleratorConfiguration<T>) -> Self {
        Self::new(
            configuration.history_depth,
            configuration.maximum_condition_number,
            configuration.error_factor,
        )
    }
}

impl<T: Copy + RealField> Accelerator<T> {
    /// Create an accelerator with an empty history.
    ///
    /// A `history_depth` of zero, or either threshold at or below one, disables acceleration:
    /// every call then returns the plain damped step.
    pub fn new(history_depth: usize, maximum_condition_number: T, error_factor: T) -> Self {
        Self {
            history: History::with_capacity(history_depth),
            maximum_condition_number,
            error_factor,
            dimension: None,
            condition_number: None,
        }
    }

    /// A builder starting from the default parameters
    pub fn builder() -> AcceleratorBuilder<T> {
        AcceleratorBuilder::new()
    }

    /// Whether the configuration reduces every step to plain damped iteration
    pub fn is_disabled(&self) -> bool {
        self.history.capacity() == 0
            || self.error_factor <= T::one()
            || self.maximum_condition_number <= T::one()
    }

    /// Number of history entries currently held
    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// Maximum number of history entries
    pub fn history_depth(&self) -> usize {
        self.history.capacity()
    }

    /// Condition number of the mixing system used in the last accelerated step.
    ///
    /// `None` when the last step had no history to mix against. The value may be infinite
    /// when the last system was singular.
    pub fn condition_number(&self) -> Option<T> {
        self.condition_number
    }

    /// Flattened length of the iterates, once established
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// The retained entries, oldest first
    pub fn history(&self) -> impl ExactSizeIterator<Item = &HistoryEntry<T>> {
        self.history.iter()
    }

    /// Forget all history, the next call may establish a new dimension
    pub fn clear(&mut self) {
        self.history.clear();
        self.dimension = None;
        self.condition_number = None;
    }

    /// Compute the accelerated iterate xₙ₊₁ from xₙ, the damping αₙ and the preconditioned
    /// residual Pf(xₙ), and record xₙ in the history.
    ///
    /// The result has the shape of `iterate`. The iterate and residual must share a shape, and
    /// their flattened length must match that of earlier calls.
    pub fn apply<X: Iterate<T>>(
        &mut self,
        iterate: &X,
        damping: T,
        residual: &X,
    ) -> Result<X, AccelerationError> {
        let shape = iterate.shape();
        let residual_shape = residual.shape();
        if shape != residual_shape {
            return Err(AccelerationError::IncompatibleShapes {
                iterate: format!("{shape:?}"),
                residual: format!("{residual_shape:?}"),
            });
        }
        let next = self.apply_flat(iterate.to_flat(), damping, residual.to_flat())?;
        X::from_flat(next, &shape)
    }

    /// As `apply`, for flat vectors. Ownership of the vectors passes into the history.
    pub fn apply_flat(
        &mut self,
        iterate: DVector<T>,
        damping: T,
        residual: DVector<T>,
    ) -> Result<DVector<T>, AccelerationError> {
        if iterate.len() != residual.len() {
            return Err(AccelerationError::ShapeMismatch {
                argument: "residual",
                expected: iterate.len(),
                found: residual.len(),
            });
        }

        let mut next = &iterate + &residual * damping;
        if self.is_disabled() {
            return Ok(next);
        }

        if let Some(dimension) = self.dimension {
            if iterate.len() != dimension {
                return Err(AccelerationError::ShapeMismatch {
                    argument: "iterate",
                    expected: dimension,
                    found: iterate.len(),
                });
            }
        }
        self.dimension = Some(iterate.len());

        self.prune_by_error(residual.norm());
        if self.history.is_empty() || iterate.is_empty() {
            self.condition_number = None;
            self.record(iterate, residual)?;
            return Ok(next);
        }

        let system = self.prune_by_condition(difference_matrix(self.history.iter(), &residual));
        self.condition_number = Some(system.condition_number());

        let coefficients = system.solve(&residual).unwrap_or_else(|| {
            tracing::warn!(
                depth = system.ncols(),
                "Singular mixing system, falling back to the damped step"
            );
            DVector::zeros(system.ncols())
        });

        for (entry, &beta) in self.history.iter().zip(coefficients.iter()) {
            let mut correction = entry.iterate() - &iterate;
            correction.axpy(damping, &(entry.residual() - &residual), T::one());
            next.axpy(beta, &correction, T::one());
        }

        self.record(iterate, residual)?;
        Ok(next)
    }

    /// Drop every entry whose error norm exceeds `error_factor` times the smallest error norm
    /// among the history and the current residual
    fn prune_by_error(&mut self, current_error: T) -> usize {
        let minimum_error = self
            .history
            .minimum_error()
            .map_or(current_error, |error| error.min(current_error));
        let pruned = self.history.prune_above(self.error_factor * minimum_error);
        if pruned > 0 {
            tracing::debug!(
                pruned,
                remaining = self.history.len(),
                "Pruned history by residual norm"
            );
        }
        pruned
    }

    /// Drop the oldest entries until the mixing system is acceptably conditioned or a single
    /// entry remains
    fn prune_by_condition(&mut self, matrix: nalgebra::DMatrix<T>) -> MixingSystem<T> {
        let mut system = MixingSystem::factorise(matrix);
        let mut pruned = 0;
        while system.ncols() > 1 && system.is_ill_conditioned(self.maximum_condition_number) {
            self.history.pop_front();
            system = system.without_oldest();
            pruned += 1;
        }
        if pruned > 0 {
            tracing::debug!(
                pruned,
                remaining = self.history.len(),
                "Pruned history by condition number"
            );
        }
        tracing::trace!(depth = system.ncols(), "Mixing against history");
        system
    }

    fn record(&mut self, iterate: DVector<T>, residual: DVector<T>) -> Result<(), AccelerationError> {
        let dimension = iterate.len();
        self.history.push(HistoryEntry::new(iterate, residual));
        self.history.check_invariants(dimension)
    }
}

/// Builder for an `Accelerator`, starting from the default parameters
pub struct AcceleratorBuilder<T> {
    configuration: AcceleratorConfiguration<T>,
}

impl<T: Copy + RealField> Default for AcceleratorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + RealField> AcceleratorBuilder<T> {
    /// Initialise a builder with a depth of 10, a condition bound of 1e6 and an error factor of 1e4
    pub fn new() -> Self {
        Self {
            configuration: AcceleratorConfiguration::default(),
        }
    }

    /// Set the maximum number of retained history entries
    pub fn with_history_depth(mut self, history_depth: usize) -> Self {
        self.configuration.history_depth = history_depth;
        self
    }

    /// Set the largest tolerated condition number of the mixing system
    pub fn with_maximum_condition_number(mut self, maximum_condition_number: T) -> Self {
        self.configuration.maximum_condition_number = maximum_condition_number;
        self
    }

    /// Set the largest tolerated ratio of residual norms
    pub fn with_error_factor(mut self, error_factor: T) -> Self {
        self.configuration.error_factor = error_factor;
        self
    }

    /// Build out the accelerator with an empty history
    pub fn build(self) -> Accelerator<T> {
        Accelerator::from(&self.configuration)
    }
}
