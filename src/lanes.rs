//! Fixed-width lane vectors and the lane index patterns used to shuffle them.
//!
//! [`Lanes`] is the vector abstraction the filter kernels are written against. Every shuffle is
//! expressed as a constant index pattern, generated per width by the `const fn`s below, so the
//! compiler can lower them to native shuffle/blend instructions once `W` is fixed.

use core::{
    array,
    ops::{Add, Index},
};

use crate::Sample;

/// Widths the filter kernels are specialised for (128, 256 and 512 bit registers of f32).
pub const SUPPORTED_WIDTHS: [usize; 3] = [4, 8, 16];

/// Upper bound of `log2(W)` over all supported widths.
pub(crate) const MAX_LEVELS: usize = 4;

/// A vector of `W` lanes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(transparent)]
pub struct Lanes<T, const W: usize>(pub(crate) [T; W]);

/// `W` vectors of `W` lanes, one vector per row.
pub type Matrix<T, const W: usize> = [Lanes<T, W>; W];

impl<T: Sample, const W: usize> Lanes<T, W> {
    #[inline(always)]
    pub const fn from_array(values: [T; W]) -> Self {
        Self(values)
    }

    #[inline(always)]
    pub fn splat(value: T) -> Self {
        Self([value; W])
    }

    #[inline(always)]
    pub fn zero() -> Self {
        Self([T::ZERO; W])
    }

    /// Loads the first `W` values of `src`.
    ///
    /// Panics if `src` is shorter than `W`.
    #[inline(always)]
    pub fn load(src: &[T]) -> Self {
        let mut values = [T::ZERO; W];
        values.copy_from_slice(&src[..W]);
        Self(values)
    }

    /// Stores all lanes into the first `W` values of `dst`.
    ///
    /// Panics if `dst` is shorter than `W`.
    #[inline(always)]
    pub fn store(self, dst: &mut [T]) {
        dst[..W].copy_from_slice(&self.0);
    }

    #[inline(always)]
    pub fn to_array(self) -> [T; W] {
        self.0
    }

    #[inline(always)]
    pub fn as_array(&self) -> &[T; W] {
        &self.0
    }

    #[inline(always)]
    #[cfg_attr(not(target_arch = "x86_64"), allow(dead_code))]
    pub(crate) fn as_ptr(&self) -> *const T {
        self.0.as_ptr()
    }

    #[inline(always)]
    #[cfg_attr(not(target_arch = "x86_64"), allow(dead_code))]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        self.0.as_mut_ptr()
    }

    #[inline(always)]
    pub fn extract(&self, lane: usize) -> T {
        self.0[lane]
    }

    #[inline(always)]
    pub fn insert(mut self, lane: usize, value: T) -> Self {
        self.0[lane] = value;
        self
    }

    /// Lane-wise `self * b + c`.
    #[inline(always)]
    pub fn mul_add(self, b: Self, c: Self) -> Self {
        Self(array::from_fn(|i| self.0[i].fma(b.0[i], c.0[i])))
    }

    /// Lane-wise `self * b + c` with a broadcast multiplier.
    #[inline(always)]
    pub fn mul_add_scalar(self, b: T, c: Self) -> Self {
        Self(array::from_fn(|i| self.0[i].fma(b, c.0[i])))
    }

    #[inline(always)]
    pub fn scale(self, factor: T) -> Self {
        Self(array::from_fn(|i| self.0[i] * factor))
    }

    /// Rearranges lanes by `pattern`. Lane `i` receives lane `pattern[i]`, or zero for `-1`.
    #[inline(always)]
    pub fn permute(self, pattern: &[i8; W]) -> Self {
        Self(array::from_fn(|i| {
            let source = pattern[i];
            if source < 0 {
                T::ZERO
            } else {
                self.0[source as usize]
            }
        }))
    }

    /// Selects lanes from the concatenation `self ++ other` by `pattern`.
    #[inline(always)]
    pub fn blend(self, other: Self, pattern: &[u8; W]) -> Self {
        Self(array::from_fn(|i| {
            let source = pattern[i] as usize;
            if source < W {
                self.0[source]
            } else {
                other.0[source - W]
            }
        }))
    }

    /// Moves every lane up by one and places `fill` in lane 0. The top lane is dropped.
    #[inline(always)]
    pub fn shift_in(self, fill: T) -> Self {
        Self(array::from_fn(|i| if i == 0 { fill } else { self.0[i - 1] }))
    }

    /// Moves every lane down by one and places `value` in the top lane. Lane 0 is dropped.
    #[inline(always)]
    pub fn push_back(self, value: T) -> Self {
        Self(array::from_fn(|i| {
            if i + 1 == W {
                value
            } else {
                self.0[i + 1]
            }
        }))
    }
}

impl<T: Sample, const W: usize> Default for Lanes<T, W> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<T: Sample, const W: usize> Add for Lanes<T, W> {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self(array::from_fn(|i| self.0[i] + rhs.0[i]))
    }
}

impl<T, const W: usize> Index<usize> for Lanes<T, W> {
    type Output = T;

    #[inline(always)]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Returns `true` if the kernels are available for `width` lanes.
pub const fn is_supported_width(width: usize) -> bool {
    matches!(width, 4 | 8 | 16)
}

/// `log2(W)` for a power of two `W`.
pub(crate) const fn levels(width: usize) -> usize {
    width.trailing_zeros() as usize
}

/// Pattern moving every lane up by `distance`, zero filling the bottom lanes.
pub(crate) const fn shift_pattern<const W: usize>(distance: usize) -> [i8; W] {
    let mut pattern = [-1i8; W];
    let mut i = distance;
    while i < W {
        pattern[i] = (i - distance) as i8;
        i += 1;
    }
    pattern
}

/// Pattern keeping lane 0 and zeroing all others.
pub(crate) const fn first_lane_pattern<const W: usize>() -> [i8; W] {
    let mut pattern = [-1i8; W];
    if W > 0 {
        pattern[0] = 0;
    }
    pattern
}

/// Const-evaluated patterns shared by the kernels.
pub(crate) struct Patterns<const W: usize>;

impl<const W: usize> Patterns<W> {
    pub(crate) const FIRST_LANE: [i8; W] = first_lane_pattern::<W>();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iota<const W: usize>() -> Lanes<f32, W> {
        Lanes(array::from_fn(|i| i as f32 + 1.0))
    }

    #[test]
    fn test_shift_pattern() {
        assert_eq!(shift_pattern::<4>(1), [-1, 0, 1, 2]);
        assert_eq!(shift_pattern::<8>(2), [-1, -1, 0, 1, 2, 3, 4, 5]);
        assert_eq!(shift_pattern::<4>(4), [-1, -1, -1, -1]);
    }

    #[test]
    fn test_first_lane_pattern() {
        assert_eq!(first_lane_pattern::<4>(), [0, -1, -1, -1]);
    }

    #[test]
    fn test_permute_zero_fills() {
        let v = iota::<4>().permute(&[-1, 0, -1, 2]);
        assert_eq!(v.to_array(), [0.0, 1.0, 0.0, 3.0]);
    }

    #[test]
    fn test_blend_selects_from_both() {
        let a = iota::<4>();
        let b = Lanes::<f32, 4>::splat(10.0);
        let v = a.blend(b, &[0, 4, 2, 7]);
        assert_eq!(v.to_array(), [1.0, 10.0, 3.0, 10.0]);
    }

    #[test]
    fn test_shift_in_and_push_back() {
        let v = iota::<4>();
        assert_eq!(v.shift_in(9.0).to_array(), [9.0, 1.0, 2.0, 3.0]);
        assert_eq!(v.push_back(9.0).to_array(), [2.0, 3.0, 4.0, 9.0]);
    }

    #[test]
    fn test_mul_add() {
        let v = iota::<8>();
        let r = v.mul_add(Lanes::splat(2.0), Lanes::splat(1.0));
        for i in 0..8 {
            assert_eq!(r[i], (i as f32 + 1.0) * 2.0 + 1.0);
        }
        let r = v.mul_add_scalar(3.0, Lanes::zero());
        assert_eq!(r[7], 24.0);
    }

    #[test]
    fn test_load_store() {
        let data: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let v = Lanes::<f64, 16>::load(&data[2..]);
        assert_eq!(v[0], 2.0);
        assert_eq!(v[15], 17.0);

        let mut out = vec![0.0f64; 16];
        v.store(&mut out);
        assert_eq!(&out[..], &data[2..18]);
    }

    #[test]
    fn test_supported_widths() {
        for width in SUPPORTED_WIDTHS {
            assert!(is_supported_width(width));
        }
        assert!(!is_supported_width(2));
        assert!(!is_supported_width(32));
        assert_eq!(levels(16), 4);
        assert!(levels(16) <= MAX_LEVELS);
    }
}
