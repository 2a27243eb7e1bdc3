// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Mixing
//!
//! Dense linear algebra for the Anderson step. The mixing coefficients β minimise
//! ‖Pf(xₙ) + M·β‖ where column `i` of `M` is Pf(xᵢ) − Pf(xₙ). The problem is solved through a
//! QR factorisation of `M`, the normal equations are never formed. When the history holds more
//! entries than the vectors have elements the minimum-norm solution is taken from an SVD.

use super::history::HistoryEntry;
use nalgebra::{linalg::QR, DMatrix, DVector, Dynamic, RealField};

/// Assemble the matrix of residual differences, one column per history entry, oldest first
pub(crate) fn difference_matrix<'a, T, I>(entries: I, residual: &DVector<T>) -> DMatrix<T>
where
    T: Copy + RealField,
    I: ExactSizeIterator<Item = &'a HistoryEntry<T>>,
{
    let mut matrix = DMatrix::zeros(residual.len(), entries.len());
    for (mut column, entry) in matrix.column_iter_mut().zip(entries) {
        column.copy_from(entry.residual());
        column -= residual;
    }
    matrix
}

/// A factorised difference matrix
pub(crate) struct MixingSystem<T: RealField> {
    matrix: DMatrix<T>,
    qr: QR<T, Dynamic, Dynamic>,
    smallest_singular_value: T,
    largest_singular_value: T,
}

impl<T: Copy + RealField> MixingSystem<T> {
    pub(crate) fn factorise(matrix: DMatrix<T>) -> Self {
        let qr = matrix.clone().qr();
        // The singular values of R coincide with those of M, and R is at most m × m
        let singular_values = qr.r().singular_values();
        let (smallest_singular_value, largest_singular_value) = singular_values
            .iter()
            .fold(None, |bounds: Option<(T, T)>, &value| match bounds {
                None => Some((value, value)),
                Some((smallest, largest)) => Some((smallest.min(value), largest.max(value))),
            })
            .unwrap_or((T::zero(), T::zero()));
        Self {
            matrix,
            qr,
            smallest_singular_value,
            largest_singular_value,
        }
    }

    /// Number of history entries taking part in the mix
    pub(crate) fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Ratio of the largest to the smallest singular value, infinite for singular systems
    pub(crate) fn condition_number(&self) -> T {
        self.largest_singular_value / self.smallest_singular_value
    }

    /// Whether the system should shed its oldest column before it is solved.
    ///
    /// The condition number is taken over the min(n, k) singular values of the triangular factor.
    /// The comparison is strict: a condition number equal to the bound is accepted. A numerically
    /// rank deficient system exceeds every bound, including an infinite one.
    pub(crate) fn is_ill_conditioned(&self, maximum_condition_number: T) -> bool {
        self.is_rank_deficient()
            || self.largest_singular_value > maximum_condition_number * self.smallest_singular_value
    }

    /// Whether the smallest singular value is lost in the rounding of the largest
    fn is_rank_deficient(&self) -> bool {
        let size: T = nalgebra::convert(self.matrix.nrows().max(self.matrix.ncols()) as f64);
        self.smallest_singular_value <= self.largest_singular_value * T::default_epsilon() * size
    }

    /// Drop the column belonging to the oldest history entry and refactorise
    pub(crate) fn without_oldest(self) -> Self {
        Self::factorise(self.matrix.remove_column(0))
    }

    /// Solve for β in the least-squares sense, `None` when the system is singular
    pub(crate) fn solve(&self, residual: &DVector<T>) -> Option<DVector<T>> {
        let ncols = self.matrix.ncols();
        let mut rhs = -residual;
        if ncols > self.matrix.nrows() {
            return self
                .matrix
                .clone()
                .svd(true, true)
                .solve(&rhs, T::default_epsilon())
                .ok();
        }
        self.qr.q_tr_mul(&mut rhs);
        self.qr.r().solve_upper_triangular(&rhs.rows(0, ncols))
    }
}
