// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Solver
//!
//! A damped fixed-point loop xₙ₊₁ = xₙ + αₙ·Pf(xₙ), accelerated by an `Accelerator`.
//! The loop owns the decision of when to stop, the accelerator never does.

mod convergence;

pub use convergence::Convergence;

use crate::{Accelerator, Iterate, SolverError};
use nalgebra::RealField;
use std::marker::PhantomData;

/// A problem whose solution is a fixed point x = g(x)
pub trait FixedPointProblem<T: RealField> {
    /// The representation of an iterate
    type Iterate: Iterate<T>;

    /// Evaluate the preconditioned residual Pf(x) at the given iterate
    fn preconditioned_residual(
        &mut self,
        iterate: &Self::Iterate,
    ) -> Result<Self::Iterate, SolverError>;
}

/// The outcome of a converged loop
#[derive(Clone, Debug)]
pub struct FixedPointSolution<T, X> {
    /// The final iterate
    pub solution: X,
    /// The number of accelerated steps taken
    pub iterations: usize,
    /// The residual norm at every iterate, starting from the initial guess
    pub residual_norms: Vec<T>,
}

/// Builder struct for the fixed-point loop
pub struct FixedPointLoopBuilder<T: RealField, RefConvergence, Problem> {
    convergence: RefConvergence,
    accelerator: Option<Accelerator<T>>,
    problem: Problem,
    marker: PhantomData<T>,
}

impl<T: Copy + RealField> FixedPointLoopBuilder<T, (), ()> {
    /// Initialise an empty builder
    pub fn new() -> Self {
        Self {
            convergence: (),
            accelerator: None,
            problem: (),
            marker: PhantomData,
        }
    }
}

impl<T: Copy + RealField> Default for FixedPointLoopBuilder<T, (), ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, RefConvergence, Problem> FixedPointLoopBuilder<T, RefConvergence, Problem>
where
    T: Copy + RealField,
{
    /// Attach the convergence settings
    pub fn with_convergence_settings<C>(
        self,
        convergence: &C,
    ) -> FixedPointLoopBuilder<T, &C, Problem> {
        FixedPointLoopBuilder {
            convergence,
            accelerator: self.accelerator,
            problem: self.problem,
            marker: PhantomData,
        }
    }

    /// Attach the problem to solve
    pub fn with_problem<P>(self, problem: P) -> FixedPointLoopBuilder<T, RefConvergence, P> {
        FixedPointLoopBuilder {
            convergence: self.convergence,
            accelerator: self.accelerator,
            problem,
            marker: PhantomData,
        }
    }

    /// Use the given accelerator, if none is attached the default parameters are used
    pub fn with_accelerator(mut self, accelerator: Accelerator<T>) -> Self {
        self.accelerator = Some(accelerator);
        self
    }
}

impl<'a, T, P> FixedPointLoopBuilder<T, &'a Convergence<T>, P>
where
    T: Copy + RealField,
    P: FixedPointProblem<T>,
{
    /// Build out the loop
    pub fn build(self) -> FixedPointLoop<'a, T, P> {
        FixedPointLoop {
            convergence: self.convergence,
            accelerator: self.accelerator.unwrap_or_default(),
            problem: self.problem,
        }
    }
}

/// An accelerated fixed-point loop
pub struct FixedPointLoop<'a, T: RealField, P> {
    convergence: &'a Convergence<T>,
    accelerator: Accelerator<T>,
    problem: P,
}

/// The state of a running loop
struct LoopTracker<T, X> {
    iterate: X,
    residual: X,
    residual_norms: Vec<T>,
}

impl<T: Copy + RealField, X: Iterate<T>> LoopTracker<T, X> {
    fn new(iterate: X, residual: X) -> Self {
        let residual_norms = vec![residual.norm()];
        Self {
            iterate,
            residual,
            residual_norms,
        }
    }

    fn iterations(&self) -> usize {
        self.residual_norms.len() - 1
    }

    fn residual_norm(&self) -> T {
        self.residual_norms[self.residual_norms.len() - 1]
    }

    fn update(&mut self, iterate: X, residual: X) {
        self.residual_norms.push(residual.norm());
        self.iterate = iterate;
        self.residual = residual;
    }

    fn into_solution(self) -> FixedPointSolution<T, X> {
        FixedPointSolution {
            iterations: self.iterations(),
            solution: self.iterate,
            residual_norms: self.residual_norms,
        }
    }
}

impl<T, P> FixedPointLoop<'_, T, P>
where
    T: Copy + RealField,
    P: FixedPointProblem<T>,
{
    /// The accelerator driving the loop
    pub fn accelerator(&self) -> &Accelerator<T> {
        &self.accelerator
    }

    /// The problem being solved
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Run the loop from `initial` until the preconditioned residual is within tolerance
    pub fn run_loop(
        &mut self,
        initial: P::Iterate,
    ) -> Result<FixedPointSolution<T, P::Iterate>, SolverError> {
        let residual = self.problem.preconditioned_residual(&initial)?;
        let mut tracker = LoopTracker::new(initial, residual);
        tracing::info!(residual_norm = ?tracker.residual_norm(), "Initial guess");

        while !self.is_loop_converged(&tracker) {
            if tracker.iterations() >= self.convergence.maximum_iterations() {
                return Err(SolverError::Unconverged {
                    iterations: tracker.iterations(),
                    residual_norm: nalgebra::try_convert(tracker.residual_norm())
                        .unwrap_or(f64::NAN),
                });
            }
            self.single_iteration(&mut tracker)?;
        }
        tracing::info!(
            iterations = tracker.iterations(),
            "Fixed-point loop converged"
        );
        Ok(tracker.into_solution())
    }

    fn is_loop_converged(&self, tracker: &LoopTracker<T, P::Iterate>) -> bool {
        tracker.residual_norm() < self.convergence.tolerance()
    }

    fn single_iteration(
        &mut self,
        tracker: &mut LoopTracker<T, P::Iterate>,
    ) -> Result<(), SolverError> {
        let next = self.accelerator.apply(
            &tracker.iterate,
            self.convergence.damping(),
            &tracker.residual,
        )?;
        let residual = self.problem.preconditioned_residual(&next)?;
        tracker.update(next, residual);
        tracing::info!(
            iteration = tracker.iterations(),
            residual_norm = ?tracker.residual_norm(),
            depth = self.accelerator.depth(),
            "Fixed-point step"
        );
        Ok(())
    }
}
