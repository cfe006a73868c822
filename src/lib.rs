//! Recursive (IIR) second-order-section filters evaluated across SIMD lanes.
//!
//! A second-order section computes `y[n] = x[n] + b1·x[n-1] + b2·x[n-2] + a1·y[n-1] + a2·y[n-2]`.
//! The feedback makes every output depend on the previous one, so the recurrence is split into a
//! forced response, computed with zero output history, and a correction that propagates the
//! carried output history. The correction across the lanes of a vector is solved with recursive
//! doubling over powers of the 2×2 state transition matrix, which turns `W` serial steps into
//! `log2(W)` vector steps.
//!
//! Every evaluation strategy produces the output of the plain sample-by-sample recurrence (up to
//! floating point rounding) and leaves the same state behind, so strategies can be mixed freely
//! on one stream.
//!
//! ## Example
//!
//! ```rust
//! use simd_iir::{Filter, Strategy};
//!
//! // Two sections, row format [1, b1, b2, a1, a2] and [x[-1], x[-2], y[-1], y[-2]].
//! let mut filter = Filter::<f32, 8>::from_arrays(
//!     &[[1.0, 0.1, -0.5, 0.2, 0.3], [1.0, 0.0, 0.0, 0.5, -0.25]],
//!     &[[0.0; 4], [0.0; 4]],
//!     Strategy::default(),
//! )
//! .unwrap();
//!
//! let mut signal = vec![0.0f32; 1024];
//! signal[0] = 1.0;
//! let processed = filter.process_in_place(&mut signal);
//! assert_eq!(processed, 1024);
//! ```
#![cfg_attr(all(feature = "no_std", not(test)), no_std)]

extern crate alloc;

mod cascade;
mod core;
pub mod design;
mod error;
mod filter;
mod icc;
mod lanes;
mod sample;
mod shift_reg;
pub mod transpose;
mod zic;

pub use cascade::Cascade;
pub use crate::core::{Coefficients, InitialConditions, SecondOrderCore};
pub use error::FilterError;
pub use filter::{Filter, Strategy};
pub use icc::{IccMethod, InitialConditionCorrection};
pub use lanes::{Lanes, Matrix, SUPPORTED_WIDTHS, is_supported_width};
pub use sample::Sample;
pub use shift_reg::ShiftRegister;
pub use zic::ZeroInitCondition;
