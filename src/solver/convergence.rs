// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use nalgebra::RealField;
use serde::Deserialize;

/// Settings for a damped fixed-point loop
#[derive(Clone, Debug, Deserialize)]
pub struct Convergence<T> {
    pub(crate) tolerance: T,
    pub(crate) maximum_iterations: usize,
    pub(crate) damping: T,
}

impl<T: Copy + RealField> Convergence<T> {
    /// Iterate until ‖Pf(x)‖ falls below `tolerance`, taking steps of size `damping`
    pub fn new(tolerance: T, maximum_iterations: usize, damping: T) -> Self {
        Self {
            tolerance,
            maximum_iterations,
            damping,
        }
    }

    /// The residual norm below which the loop terminates
    pub fn tolerance(&self) -> T {
        self.tolerance
    }

    /// The number of steps after which the loop gives up
    pub fn maximum_iterations(&self) -> usize {
        self.maximum_iterations
    }

    /// The damping αₙ applied on every step
    pub fn damping(&self) -> T {
        self.damping
    }
}
