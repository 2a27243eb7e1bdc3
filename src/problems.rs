// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Problems
//!
//! Reference fixed-point problems, used to exercise the accelerator from the command line
//! and in tests. Neither is preconditioned, so Pf(x) = g(x) − x.

use crate::{FixedPointProblem, SolverError};
use nalgebra::{DVector, RealField};
use ndarray::Array1;

/// The affine problem x = A·x + b for a diagonal contraction A
#[derive(Clone, Debug)]
pub struct LinearProblem<T: RealField> {
    contraction: DVector<T>,
    source: DVector<T>,
}

impl<T: Copy + RealField> LinearProblem<T> {
    /// Create the problem from the diagonal of A and the source b
    pub fn new(contraction: DVector<T>, source: DVector<T>) -> Result<Self, SolverError> {
        if contraction.len() != source.len() {
            return Err(SolverError::Problem(format!(
                "contraction has {} elements but the source has {}",
                contraction.len(),
                source.len()
            )));
        }
        Ok(Self {
            contraction,
            source,
        })
    }

    /// A contraction whose eigenvalues are spread evenly over `[0, spectral_radius]`, with a
    /// unit source.
    ///
    /// Plain damped iteration converges at the rate of the spectral radius, the slowest mode.
    pub fn evenly_spread(dimension: usize, spectral_radius: T) -> Self {
        let denominator: T = nalgebra::convert(dimension.max(2) as f64 - 1.);
        let contraction = DVector::from_iterator(
            dimension,
            (0..dimension).map(|idx| {
                let index: T = nalgebra::convert(idx as f64);
                spectral_radius * index / denominator
            }),
        );
        Self {
            contraction,
            source: DVector::from_element(dimension, T::one()),
        }
    }

    /// Number of unknowns
    pub fn dimension(&self) -> usize {
        self.source.len()
    }

    /// The fixed point (I − A)⁻¹·b, if A has no unit eigenvalue
    pub fn exact_solution(&self) -> Option<DVector<T>> {
        let denominator = self.contraction.map(|value| T::one() - value);
        if denominator.iter().any(|value| *value == T::zero()) {
            return None;
        }
        Some(self.source.component_div(&denominator))
    }
}

impl<T: Copy + RealField> FixedPointProblem<T> for LinearProblem<T> {
    type Iterate = DVector<T>;

    fn preconditioned_residual(
        &mut self,
        iterate: &DVector<T>,
    ) -> Result<DVector<T>, SolverError> {
        if iterate.len() != self.source.len() {
            return Err(SolverError::Problem(format!(
                "iterate has {} elements, the problem has {}",
                iterate.len(),
                self.source.len()
            )));
        }
        Ok(self.contraction.component_mul(iterate) + &self.source - iterate)
    }
}

/// The nonlinear chain xᵢ = ½·cos(xᵢ) + c·(xᵢ₋₁ + xᵢ₊₁) with zero boundary values.
///
/// The map contracts for |c| < 1/4.
#[derive(Clone, Debug)]
pub struct TrigonometricProblem<T> {
    dimension: usize,
    coupling: T,
}

impl<T: Copy + RealField> TrigonometricProblem<T> {
    /// Create a chain of `dimension` sites coupled to their neighbours with strength `coupling`
    pub fn new(dimension: usize, coupling: T) -> Self {
        Self {
            dimension,
            coupling,
        }
    }

    /// Number of unknowns
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl<T: Copy + RealField> FixedPointProblem<T> for TrigonometricProblem<T> {
    type Iterate = Array1<T>;

    fn preconditioned_residual(
        &mut self,
        iterate: &Array1<T>,
    ) -> Result<Array1<T>, SolverError> {
        if iterate.len() != self.dimension {
            return Err(SolverError::Problem(format!(
                "iterate has {} elements, the problem has {}",
                iterate.len(),
                self.dimension
            )));
        }
        let half: T = nalgebra::convert(0.5);
        Ok(Array1::from_shape_fn(self.dimension, |idx| {
            let left = if idx > 0 { iterate[idx - 1] } else { T::zero() };
            let right = if idx + 1 < self.dimension {
                iterate[idx + 1]
            } else {
                T::zero()
            };
            half * iterate[idx].cos() + self.coupling * (left + right) - iterate[idx]
        }))
    }
}

#[cfg(test)]
mod test {
    use super::{LinearProblem, TrigonometricProblem};
    use crate::FixedPointProblem;
    use nalgebra::DVector;

    #[test]
    fn exact_solution_has_zero_residual() {
        let mut problem = LinearProblem::<f64>::new(
            DVector::from_vec(vec![0., 0.5, 0.75]),
            DVector::from_vec(vec![1., 1., 1.]),
        )
        .unwrap();
        let exact = problem.exact_solution().unwrap();
        assert_eq!(exact, DVector::from_vec(vec![1., 2., 4.]));
        let residual = problem.preconditioned_residual(&exact).unwrap();
        assert!(residual.iter().all(|value| value.abs() < 1e-14));
    }

    #[test]
    fn evenly_spread_contraction_reaches_the_spectral_radius() {
        let problem = LinearProblem::<f64>::evenly_spread(5, 0.8);
        assert_eq!(problem.dimension(), 5);
        approx::assert_relative_eq!(problem.contraction[4], 0.8);
        approx::assert_relative_eq!(problem.contraction[0], 0.);
        assert_eq!(problem.source, DVector::from_element(5, 1.));
    }

    #[test]
    fn unit_eigenvalue_has_no_fixed_point() {
        let problem =
            LinearProblem::<f64>::new(DVector::from_vec(vec![1.]), DVector::from_vec(vec![1.]))
                .unwrap();
        assert!(problem.exact_solution().is_none());
    }

    #[test]
    fn trigonometric_residual_at_the_origin() {
        let mut problem = TrigonometricProblem::<f64>::new(3, 0.1);
        let residual = problem
            .preconditioned_residual(&ndarray::Array1::zeros(3))
            .unwrap();
        assert_eq!(residual, ndarray::array![0.5, 0.5, 0.5]);
    }

    #[test]
    fn wrong_sizes_are_rejected() {
        let mut problem = TrigonometricProblem::<f64>::new(3, 0.1);
        assert!(problem
            .preconditioned_residual(&ndarray::Array1::zeros(2))
            .is_err());
        assert!(LinearProblem::new(DVector::<f64>::zeros(2), DVector::zeros(3)).is_err());
    }
}
