// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use nalgebra::DVector;
use rand::{thread_rng, Rng};

pub fn random_vector(num_rows: usize) -> DVector<f64> {
    let mut rng = thread_rng();
    DVector::from_iterator(num_rows, (0..num_rows).map(|_| rng.gen::<f64>()))
}

/// Diagonal of a contraction with eigenvalues spread evenly over `[0, spectral_radius]`
pub fn construct_test_contraction(num_rows: usize, spectral_radius: f64) -> DVector<f64> {
    let denominator = (num_rows.max(2) - 1) as f64;
    DVector::from_iterator(
        num_rows,
        (0..num_rows).map(|idx| spectral_radius * idx as f64 / denominator),
    )
}

/// A sequence of iterates and residuals whose residual norms decay geometrically,
/// the way a converging self-consistent loop produces them
pub fn construct_decaying_sequence(
    num_rows: usize,
    length: usize,
    decay: f64,
) -> Vec<(DVector<f64>, DVector<f64>)> {
    let mut rng = thread_rng();
    (0..length)
        .map(|step| {
            let scale = decay.powi(step as i32);
            let iterate = random_vector(num_rows);
            let residual = DVector::from_iterator(
                num_rows,
                (0..num_rows).map(|_| scale * (rng.gen::<f64>() - 0.5)),
            );
            (iterate, residual)
        })
        .collect()
}
