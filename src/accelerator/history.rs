// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # History
//!
//! The bounded record of past iterates. Entries enter at the back and leave from the front
//! on overflow or when the condition number is too large. Error based pruning may remove
//! entries from anywhere, but never changes the relative order of the survivors.

use crate::AccelerationError;
use nalgebra::{DVector, RealField};
use std::collections::VecDeque;

/// A single retained iterate
#[derive(Clone, Debug)]
pub struct HistoryEntry<T: RealField> {
    iterate: DVector<T>,
    residual: DVector<T>,
    error_norm: T,
}

impl<T: Copy + RealField> HistoryEntry<T> {
    /// Takes ownership of the flattened iterate and residual, caching the residual norm
    pub(crate) fn new(iterate: DVector<T>, residual: DVector<T>) -> Self {
        let error_norm = residual.norm();
        Self {
            iterate,
            residual,
            error_norm,
        }
    }

    /// The flattened iterate xᵢ
    pub fn iterate(&self) -> &DVector<T> {
        &self.iterate
    }

    /// The flattened preconditioned residual Pf(xᵢ)
    pub fn residual(&self) -> &DVector<T> {
        &self.residual
    }

    /// The Euclidean norm of the residual, computed on insertion
    pub fn error_norm(&self) -> T {
        self.error_norm
    }
}

#[derive(Clone, Debug)]
pub(crate) struct History<T: RealField> {
    capacity: usize,
    entries: VecDeque<HistoryEntry<T>>,
}

impl<T: Copy + RealField> History<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first
    pub(crate) fn iter(&self) -> impl ExactSizeIterator<Item = &HistoryEntry<T>> {
        self.entries.iter()
    }

    /// Append an entry, evicting the oldest when the capacity is exceeded
    pub(crate) fn push(&mut self, entry: HistoryEntry<T>) -> Option<HistoryEntry<T>> {
        self.entries.push_back(entry);
        if self.entries.len() > self.capacity {
            return self.entries.pop_front();
        }
        None
    }

    pub(crate) fn pop_front(&mut self) -> Option<HistoryEntry<T>> {
        self.entries.pop_front()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// The smallest cached error norm, if any entries are held
    pub(crate) fn minimum_error(&self) -> Option<T> {
        self.entries
            .iter()
            .map(|entry| entry.error_norm)
            .reduce(|a, b| a.min(b))
    }

    /// Remove every entry with an error norm strictly above `threshold`, returning how many went
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub(crate) fn prune_above(&mut self, threshold: T) -> usize {
        let before = self.entries.len();
        // A NaN threshold (infinite factor times a zero error) keeps everything
        self.entries.retain(|entry| !(entry.error_norm > threshold));
        before - self.entries.len()
    }

    pub(crate) fn check_invariants(&self, dimension: usize) -> Result<(), AccelerationError> {
        if self.entries.len() > self.capacity {
            return Err(AccelerationError::InvariantViolation(format!(
                "{} entries held with a capacity of {}",
                self.entries.len(),
                self.capacity
            )));
        }
        if let Some((index, entry)) = self.entries.iter().enumerate().find(|(_, entry)| {
            entry.iterate.len() != dimension || entry.residual.len() != dimension
        }) {
            return Err(AccelerationError::InvariantViolation(format!(
                "entry {index} holds an iterate of length {} and a residual of length {}, expected {dimension}",
                entry.iterate.len(),
                entry.residual.len(),
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{History, HistoryEntry};
    use nalgebra::DVector;

    fn entry(value: f64) -> HistoryEntry<f64> {
        HistoryEntry::new(
            DVector::from_element(2, value),
            DVector::from_vec(vec![value, 0.]),
        )
    }

    fn held_values(history: &History<f64>) -> Vec<f64> {
        history.iter().map(|entry| entry.iterate()[0]).collect()
    }

    #[test]
    fn overflow_evicts_the_oldest_entry() {
        let mut history = History::with_capacity(3);
        for value in [1., 2., 3.] {
            assert!(history.push(entry(value)).is_none());
        }
        let evicted = history.push(entry(4.)).unwrap();
        assert_eq!(evicted.iterate()[0], 1.);
        assert_eq!(held_values(&history), vec![2., 3., 4.]);
    }

    #[test]
    fn error_norm_is_cached_on_insertion() {
        let entry = HistoryEntry::new(DVector::zeros(2), DVector::from_vec(vec![3., 4.]));
        approx::assert_relative_eq!(entry.error_norm(), 5.);
    }

    #[test]
    fn pruning_keeps_survivors_in_insertion_order() {
        let mut history = History::with_capacity(5);
        for value in [1., 10., 2., 20., 3.] {
            history.push(entry(value));
        }
        assert_eq!(history.prune_above(5.), 2);
        assert_eq!(held_values(&history), vec![1., 2., 3.]);
        assert_eq!(history.minimum_error(), Some(1.));
    }

    #[test]
    fn pruning_at_the_threshold_keeps_the_entry() {
        let mut history = History::with_capacity(2);
        history.push(entry(2.));
        assert_eq!(history.prune_above(2.), 0);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn mismatched_entry_lengths_are_reported() {
        let mut history = History::with_capacity(2);
        history.push(entry(1.));
        assert!(history.check_invariants(2).is_ok());
        assert!(history.check_invariants(3).is_err());
    }
}
