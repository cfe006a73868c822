//! Transposition of a `W`×`W` matrix held as `W` lane vectors.
//!
//! The portable path is a butterfly network of `log2(W)` stages. Stage `s` pairs row `r` with row
//! `r + s` (for every `r` with bit `s` clear) and exchanges the `s`×`s` off-diagonal sub-blocks of
//! each pair using two blend patterns. The patterns follow from the bit rule alone, so every
//! supported width runs the same code.

#[cfg(all(
    target_arch = "x86_64",
    any(not(feature = "no_std"), target_feature = "avx")
))]
mod avx;
#[cfg(target_arch = "x86_64")]
mod sse;

use crate::{FilterError, Matrix, Sample, is_supported_width, lanes::MAX_LEVELS};

/// Signature of a transpose kernel.
pub type TransposeFn<T, const W: usize> = fn(&Matrix<T, W>) -> Matrix<T, W>;

/// Blend pattern producing the upper row of a butterfly pair for block size `span`.
///
/// Lane `j` keeps its own value if bit `span` of `j` is clear, otherwise it takes lane
/// `j - span` of the partner row.
const fn butterfly_low<const W: usize>(span: usize) -> [u8; W] {
    let mut pattern = [0u8; W];
    let mut j = 0;
    while j < W {
        let source = if j & span == 0 { j } else { W + j - span };
        pattern[j] = source as u8;
        j += 1;
    }
    pattern
}

/// Blend pattern producing the lower row of a butterfly pair for block size `span`.
///
/// Lane `j` takes lane `j + span` of its own row if bit `span` of `j` is clear, otherwise it
/// keeps the partner row's value.
const fn butterfly_high<const W: usize>(span: usize) -> [u8; W] {
    let mut pattern = [0u8; W];
    let mut j = 0;
    while j < W {
        let source = if j & span == 0 { j + span } else { W + j };
        pattern[j] = source as u8;
        j += 1;
    }
    pattern
}

const fn butterfly_stages<const W: usize, const HIGH: bool>() -> [[u8; W]; MAX_LEVELS] {
    let mut stages = [[0u8; W]; MAX_LEVELS];
    let mut level = 0;
    let mut span = W / 2;
    while span > 0 && level < MAX_LEVELS {
        stages[level] = if HIGH {
            butterfly_high::<W>(span)
        } else {
            butterfly_low::<W>(span)
        };
        span /= 2;
        level += 1;
    }
    stages
}

struct Butterfly<const W: usize>;

impl<const W: usize> Butterfly<W> {
    /// Low patterns per stage, stage 0 being the widest span `W / 2`.
    const LOW: [[u8; W]; MAX_LEVELS] = butterfly_stages::<W, false>();
    const HIGH: [[u8; W]; MAX_LEVELS] = butterfly_stages::<W, true>();
}

/// Portable butterfly transpose, valid for every supported width and element type.
pub fn transpose_butterfly<T: Sample, const W: usize>(matrix: &Matrix<T, W>) -> Matrix<T, W> {
    let mut current = *matrix;
    let mut next = *matrix;

    let mut level = 0;
    let mut span = W / 2;
    while span > 0 {
        let low = &Butterfly::<W>::LOW[level];
        let high = &Butterfly::<W>::HIGH[level];

        for row in (0..W).filter(|row| row & span == 0) {
            let upper = current[row];
            let lower = current[row + span];
            next[row] = upper.blend(lower, low);
            next[row + span] = upper.blend(lower, high);
        }

        current = next;
        span /= 2;
        level += 1;
    }

    current
}

/// Transposes `matrix` with the fastest kernel available for `T` and `W`.
///
/// Returns [`FilterError::UnsupportedWidth`] unless `W` is 4, 8 or 16.
pub fn try_transpose<T: Sample, const W: usize>(
    matrix: &Matrix<T, W>,
) -> Result<Matrix<T, W>, FilterError> {
    if !is_supported_width(W) {
        return Err(FilterError::UnsupportedWidth(W));
    }
    Ok(T::transpose_kernel::<W>()(matrix))
}

/// Transposes `matrix` with the fastest kernel available for `T` and `W`.
///
/// `W` is fixed at compile time, so an unsupported width is a bug in the calling code rather
/// than bad input. Use [`try_transpose`] to get an error instead.
///
/// # Panics
///
/// Panics if `W` is not a supported width.
pub fn transpose<T: Sample, const W: usize>(matrix: &Matrix<T, W>) -> Matrix<T, W> {
    match try_transpose(matrix) {
        Ok(transposed) => transposed,
        Err(error) => panic!("unsupported transpose width: {error}"),
    }
}

#[cfg(target_arch = "x86_64")]
fn transpose_sse_wrapper<const W: usize>(matrix: &Matrix<f32, W>) -> Matrix<f32, W> {
    let mut output = *matrix;
    // Safety: SSE is part of the x86_64 baseline and the wrapper is only selected for W == 4.
    unsafe { sse::transpose_4x4(matrix, &mut output) };
    output
}

#[cfg(all(
    target_arch = "x86_64",
    any(not(feature = "no_std"), target_feature = "avx")
))]
fn transpose_avx_wrapper<const W: usize>(matrix: &Matrix<f32, W>) -> Matrix<f32, W> {
    let mut output = *matrix;
    // Safety: The wrapper is only selected for W == 8 when AVX is available.
    unsafe { avx::transpose_8x8(matrix, &mut output) };
    output
}

/// Selects the transpose kernel for a `W`×`W` f32 matrix.
#[cfg(all(target_arch = "x86_64", not(feature = "no_std")))]
pub(crate) fn select_f32_kernel<const W: usize>() -> TransposeFn<f32, W> {
    if W == 4 {
        log::debug!("Using SSE transpose kernel for 4x4 f32");
        transpose_sse_wrapper::<W>
    } else if W == 8 && std::arch::is_x86_feature_detected!("avx") {
        log::debug!("Using AVX transpose kernel for 8x8 f32");
        transpose_avx_wrapper::<W>
    } else {
        log::debug!("Using butterfly transpose for {W}x{W} f32");
        transpose_butterfly::<f32, W>
    }
}

/// Selects the transpose kernel for a `W`×`W` f32 matrix.
#[cfg(any(not(target_arch = "x86_64"), feature = "no_std"))]
pub(crate) fn select_f32_kernel<const W: usize>() -> TransposeFn<f32, W> {
    #[cfg(target_arch = "x86_64")]
    {
        if W == 4 {
            return transpose_sse_wrapper::<W>;
        }
        #[cfg(target_feature = "avx")]
        if W == 8 {
            return transpose_avx_wrapper::<W>;
        }
    }

    transpose_butterfly::<f32, W>
}
