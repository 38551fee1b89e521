//! Double-precision-equivalent arithmetic built out of `f32` pairs.
//!
//! Each number is stored as a value plus the rounding remainder the
//! value could not hold, and every operation re-establishes that
//! non-overlapping split. Aimed at data-parallel kernels where `f64`
//! is unavailable or slow: all operations are pure, allocation-free
//! functions over plain `Copy` values.

mod float;
mod math;
mod two_float;

// For convenience, re-export.
pub use float::{next_float_down, next_float_up, ulp, Float};
pub use math::{fast_two_sum, split, two_prod, two_sum};
pub use two_float::{recombine, TwoFloat};
