use core::{
    fmt::Debug,
    ops::{Add, Mul, Neg, Sub},
};

use crate::transpose::{self, TransposeFn};

/// Floating point element type a filter operates on.
///
/// Implemented for `f32` and `f64`.
pub trait Sample:
    Copy
    + Debug
    + Default
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + Send
    + Sync
    + 'static
{
    const ZERO: Self;
    const ONE: Self;

    /// Computes `self * a + b`.
    ///
    /// Fused when the target has FMA, otherwise a multiply followed by an add.
    fn fma(self, a: Self, b: Self) -> Self;

    fn from_f64(value: f64) -> Self;

    fn to_f64(self) -> f64;

    /// Returns the fastest available transpose for a `W`×`W` matrix of this element type.
    fn transpose_kernel<const W: usize>() -> TransposeFn<Self, W> {
        transpose::transpose_butterfly::<Self, W>
    }
}

impl Sample for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    #[inline(always)]
    fn fma(self, a: Self, b: Self) -> Self {
        #[cfg(all(
            any(target_feature = "fma", target_arch = "aarch64"),
            not(feature = "no_std")
        ))]
        {
            self.mul_add(a, b)
        }

        #[cfg(all(
            any(target_feature = "fma", target_arch = "aarch64"),
            feature = "no_std"
        ))]
        {
            libm::fmaf(self, a, b)
        }

        #[cfg(not(any(target_feature = "fma", target_arch = "aarch64")))]
        {
            self * a + b
        }
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn transpose_kernel<const W: usize>() -> TransposeFn<Self, W> {
        transpose::select_f32_kernel::<W>()
    }
}

impl Sample for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    #[inline(always)]
    fn fma(self, a: Self, b: Self) -> Self {
        #[cfg(all(
            any(target_feature = "fma", target_arch = "aarch64"),
            not(feature = "no_std")
        ))]
        {
            self.mul_add(a, b)
        }

        #[cfg(all(
            any(target_feature = "fma", target_arch = "aarch64"),
            feature = "no_std"
        ))]
        {
            libm::fma(self, a, b)
        }

        #[cfg(not(any(target_feature = "fma", target_arch = "aarch64")))]
        {
            self * a + b
        }
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self
    }
}
