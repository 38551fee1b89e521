//! A two-component floating-point expansion and its arithmetic.
//!
//! Every operation returns a freshly normalized pair. Nothing here
//! allocates or touches shared state, so the whole module is safe to
//! call from any number of parallel execution contexts.

use std::fmt;
use std::ops::Add;

use auto_ops::{impl_op_ex, impl_op_ex_commutative};
use log::warn;

use crate::float::Float;
use crate::math::{self, fast_two_sum, two_prod, two_sum};

/// Multiplier for splitting a double-precision scalar, at the wide
/// precision. Same shift as the storage-level split in [`math`].
const WIDE_SPLIT_MULTIPLIER: f64 = ((1u64 << math::SPLIT_SHIFT) + 1) as f64;

/// Terms after which [`TwoFloat::exp`] gives up on convergence. Sits
/// just under the point where splitting the running factorial would
/// overflow storage and poison the sum with NaN.
const MAX_EXP_TERMS: u32 = 29;

/// An extended-precision number stored as the exact sum `v + err` of
/// two storage floats.
///
/// `v` carries the value rounded to storage precision and `err` the
/// rounding remainder. The pair is kept non-overlapping: after every
/// normalizing operation, `|err| <= ulp(v)`, so together the
/// components behave like a float with twice the mantissa width.
/// Useful where only single precision is fast (or available at all)
/// but double-precision results are needed.
///
/// Arithmetic assumes finite, non-degenerate inputs; there is no
/// NaN/Inf checking anywhere, and degenerate values propagate the way
/// the underlying IEEE scalar ops propagate them.
///
/// Operators mix only with [`Float`] scalars. Any other scalar type
/// has to come through an explicit conversion first, so a lossy
/// promotion cannot happen silently:
///
/// ```compile_fail
/// use expanse::TwoFloat;
///
/// let x = TwoFloat::ONE;
/// let _ = x * 3i32; // no implicit numeric promotion
/// ```
///
/// See Thall, "Extended-Precision Floating-Point Numbers for GPU
/// Computation"; these pairs are the two-component case of Shewchuk's
/// expansions.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[repr(C, align(8))] // passed by value across host/kernel boundaries
pub struct TwoFloat {
    pub v: Float,
    pub err: Float,
}

impl TwoFloat {
    pub const ZERO: TwoFloat = TwoFloat { v: 0.0, err: 0.0 };
    pub const ONE: TwoFloat = TwoFloat { v: 1.0, err: 0.0 };

    #[inline]
    pub const fn new(v: Float, err: Float) -> TwoFloat {
        TwoFloat { v, err }
    }

    /// Splits a double-precision scalar into a storage pair.
    ///
    /// Veltkamp's splitting, run at the input's precision with each
    /// part rounded to storage precision: the pair reconstructs `a` to
    /// within the pair's own rounding unit. Unguarded against overflow
    /// of the multiplier product; inputs must stay comfortably inside
    /// the storage type's range.
    pub fn split(a: f64) -> TwoFloat {
        let c = WIDE_SPLIT_MULTIPLIER * a;
        let ab = c - a;
        let v = (c - ab) as Float;
        let err = (a - v as f64) as Float;
        TwoFloat { v, err }
    }

    /// The pair collapsed to one `f64`.
    ///
    /// Both components are exactly representable in `f64`, so this is
    /// the single-pair case of [`recombine`].
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.v as f64 + self.err as f64
    }

    /// Raises the pair to a non-negative integer power by repeated
    /// multiplication. Cost is linear in `n`.
    pub fn powi(self, n: u32) -> TwoFloat {
        match n {
            0 => TwoFloat::ONE,
            1 => self,
            _ => {
                let mut res = self;
                for _ in 2..=n {
                    res = res * self;
                }
                res
            }
        }
    }

    /// Square root by one Newton step in the expansion domain,
    /// starting from the storage-precision reciprocal square root.
    ///
    /// Expects a positive `v` component; zero and negative inputs
    /// propagate IEEE NaN/inf out of the initial estimate.
    pub fn sqrt(self) -> TwoFloat {
        let xn = 1.0 / self.v.sqrt();
        let yn = TwoFloat::new(self.v * xn, 0.0);
        let ynsq = yn.powi(2);

        let diff = (self - ynsq).v;
        let prod = two_prod(xn, diff) / TwoFloat::new(2.0, 0.0);

        yn + prod
    }

    /// `e^x` by Taylor series in the expansion domain.
    ///
    /// Terms are folded in until the next one drops below
    /// `1e-20 * exp(v)`, estimated once in storage precision. The loop
    /// is also capped: one more term and the running factorial's
    /// splitting would overflow the storage range, so slowly-converging
    /// inputs get a truncated (warned-about) sum instead of a NaN.
    /// The truncated tail is below the pair's own rounding unit for
    /// every input that stays inside the splitting range; keep `|v|`
    /// small.
    pub fn exp(self) -> TwoFloat {
        let thresh = 1.0e-20 * Float::exp(self.v);

        let mut s = TwoFloat::ONE + self;
        let mut p = self * self;
        let mut m = 2.0;
        let mut f = TwoFloat::new(2.0, 0.0);
        let mut t = p / f;

        let mut terms = 0;
        while Float::abs(t.v) > thresh {
            terms += 1;
            if terms > MAX_EXP_TERMS {
                warn!(
                    "exp({}) did not converge within {} Taylor terms; truncating",
                    self.v, MAX_EXP_TERMS
                );
                break;
            }
            s = s + t;
            p = p * self;
            m += 1.0;
            f = f * TwoFloat::new(m, 0.0);
            t = p / f;
        }
        s + t
    }

    /// Fused scale-then-grow: `self * scale + grow` in one call, with
    /// the scaled pair feeding straight into the expansion addition.
    pub fn mul_add(self, scale: Float, grow: Float) -> TwoFloat {
        self * scale + grow
    }
}

impl From<Float> for TwoFloat {
    fn from(v: Float) -> TwoFloat {
        TwoFloat::new(v, 0.0)
    }
}

impl From<f64> for TwoFloat {
    fn from(v: f64) -> TwoFloat {
        TwoFloat::split(v)
    }
}

impl fmt::Display for TwoFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:e} + {:e})", self.v, self.err)
    }
}

impl_op_ex!(-|a: &TwoFloat| -> TwoFloat { TwoFloat::new(-a.v, -a.err) });

// Pair + pair. The two values and the two remainders are summed
// error-free and independently; folding the second sum in takes two
// renormalization passes, because a single carry propagation does not
// re-establish the non-overlapping invariant when both remainders are
// non-negligible.
impl_op_ex!(+|a: &TwoFloat, b: &TwoFloat| -> TwoFloat {
    let s = two_sum(a.v, b.v);
    let t = two_sum(a.err, b.err);
    let s = fast_two_sum(s.v, s.err + t.v);
    fast_two_sum(s.v, s.err + t.err)
});

// Pair + scalar: the scalar joins at the remainder end, then the
// combined low part is summed against the value.
impl_op_ex_commutative!(+|a: &TwoFloat, b: &Float| -> TwoFloat {
    let t = two_sum(*b, a.err);
    two_sum(t.v, a.v)
});

impl_op_ex!(-|a: &TwoFloat, b: &TwoFloat| -> TwoFloat { a + (-b) });
impl_op_ex!(-|a: &TwoFloat, b: &Float| -> TwoFloat { a + (-*b) });
impl_op_ex!(-|a: &Float, b: &TwoFloat| -> TwoFloat { *a + (-b) });

// Pair * pair. The cross terms are second-order small, so they are
// folded into the remainder with plain adds; only the dominant product
// is error-corrected. Cheaper and slightly looser than the
// pair-by-scalar form below.
impl_op_ex!(*|a: &TwoFloat, b: &TwoFloat| -> TwoFloat {
    let p = two_prod(a.v, b.v);
    let err = p.err + a.v * b.err + a.err * b.v;
    fast_two_sum(p.v, err)
});

// Pair * scalar: both component products are error-free, and the four
// terms combine low-to-high so cancellation cannot eat the remainder.
impl_op_ex_commutative!(*|a: &TwoFloat, b: &Float| -> TwoFloat {
    let lo = two_prod(a.err, *b);
    let hi = two_prod(a.v, *b);
    let t = two_sum(lo.v, hi.err);
    two_sum(t.v, hi.v)
});

// Pair / pair, by one Newton-Raphson step against the storage-
// precision reciprocal estimate. A denominator whose value component
// is zero is not handled: the estimate goes infinite and IEEE
// inf/NaN propagate through the refinement.
impl_op_ex!(/|num: &TwoFloat, den: &TwoFloat| -> TwoFloat {
    let xn = 1.0 / den.v;
    let yn = TwoFloat::new(num.v * xn, 0.0);

    let diff = (num - den * yn).v;
    let p = two_prod(xn, diff);

    yn + p
});

impl_op_ex!(/|a: &TwoFloat, b: &Float| -> TwoFloat { a / TwoFloat::new(*b, 0.0) });
impl_op_ex!(/|a: &Float, b: &TwoFloat| -> TwoFloat { TwoFloat::new(*a, 0.0) / b });

impl_op_ex!(+=|a: &mut TwoFloat, b: &TwoFloat| { *a = *a + b });
impl_op_ex!(+=|a: &mut TwoFloat, b: &Float| { *a = *a + b });
impl_op_ex!(-=|a: &mut TwoFloat, b: &TwoFloat| { *a = *a - b });
impl_op_ex!(-=|a: &mut TwoFloat, b: &Float| { *a = *a - b });
impl_op_ex!(*=|a: &mut TwoFloat, b: &TwoFloat| { *a = *a * b });
impl_op_ex!(*=|a: &mut TwoFloat, b: &Float| { *a = *a * b });
impl_op_ex!(/=|a: &mut TwoFloat, b: &TwoFloat| { *a = *a / b });
impl_op_ex!(/=|a: &mut TwoFloat, b: &Float| { *a = *a / b });

/// Collapses one or more pairs into a single wider scalar.
///
/// Every component of every pair is cast to `T` and summed in argument
/// order. No error correction happens here; this is a boundary
/// conversion for output and comparison, never an arithmetic step.
pub fn recombine<T>(terms: &[TwoFloat]) -> T
where
    T: From<Float> + Add<Output = T> + Default,
{
    terms
        .iter()
        .fold(T::default(), |acc, t| acc + T::from(t.v) + T::from(t.err))
}

// TODO Compensated dot product and matrix-vector kernels are the
// natural next additions; both need a running-accumulator variant of
// the pair-plus-scalar addition.
