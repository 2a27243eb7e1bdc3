// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Transporter-Anderson accelerates the self-consistent loops of the Transporter solvers
//!
//! # Overview
//! Self-consistent calculations, such as the coupled Poisson and Schrodinger problem solved by
//! `transporter-negf`, are fixed-point iterations xₙ₊₁ = xₙ + αₙ·Pf(xₙ) where Pf is a
//! preconditioned residual. Plain damped iteration converges at the rate of the slowest mode,
//! which for realistic devices can take hundreds of steps.
//!
//! The [`Accelerator`] implements adaptive Anderson acceleration (also known as DIIS). It
//! keeps a bounded history of iterates and residuals and mixes them to minimise the residual
//! of the next step. The history depth adapts on its own: entries whose residual is far larger
//! than the best one available are dropped, and so are the oldest entries whenever the mixing
//! system becomes ill-conditioned.
//!
//! # Usage
//! The accelerator is a library component, owned by the loop it accelerates:
//!
//! ```
//! use nalgebra::DVector;
//! use transporter_anderson::Accelerator;
//!
//! let mut accelerator = Accelerator::builder().with_history_depth(5).build();
//! let mut x = DVector::from_element(3, 0.);
//! for _ in 0..10 {
//!     let residual = x.map(|value: f64| 0.5 * value.cos() - value);
//!     x = accelerator.apply(&x, 0.8, &residual)?;
//! }
//! # Ok::<(), transporter_anderson::AccelerationError>(())
//! ```
//!
//! The crate also ships a small command line driver which solves reference problems
//! configured in `.config/default.toml`.

#![warn(missing_docs)]

/// The adaptive Anderson accelerator
pub mod accelerator;

/// The command line application, configuration and tracing
pub mod app;

/// Error handling
mod error;

/// The seam between caller arrays and the flat vectors of the accelerator
mod iterate;

/// Reference fixed-point problems
pub mod problems;

/// An accelerated fixed-point loop
pub mod solver;

pub use accelerator::{Accelerator, AcceleratorBuilder, AcceleratorConfiguration, HistoryEntry};
pub use error::{AccelerationError, SolverError};
pub use iterate::Iterate;
pub use solver::{
    Convergence, FixedPointLoop, FixedPointLoopBuilder, FixedPointProblem, FixedPointSolution,
};
