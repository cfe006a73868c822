//! AVX transpose of an 8×8 f32 matrix.

use core::arch::x86_64::*;

use crate::Matrix;

/// Transposes the leading 8×8 block of `input` into `output`.
///
/// Interleaves row pairs, then row quadruples inside each 128-bit half, and finally swaps the
/// off-diagonal 128-bit halves.
///
/// # Safety
///
/// - AVX must be available.
/// - `W >= 8`.
#[target_feature(enable = "avx")]
pub(super) unsafe fn transpose_8x8<const W: usize>(
    input: &Matrix<f32, W>,
    output: &mut Matrix<f32, W>,
) {
    debug_assert!(W >= 8);

    unsafe {
        let row0 = _mm256_loadu_ps(input[0].as_ptr());
        let row1 = _mm256_loadu_ps(input[1].as_ptr());
        let row2 = _mm256_loadu_ps(input[2].as_ptr());
        let row3 = _mm256_loadu_ps(input[3].as_ptr());
        let row4 = _mm256_loadu_ps(input[4].as_ptr());
        let row5 = _mm256_loadu_ps(input[5].as_ptr());
        let row6 = _mm256_loadu_ps(input[6].as_ptr());
        let row7 = _mm256_loadu_ps(input[7].as_ptr());

        let pair0 = _mm256_unpacklo_ps(row0, row1);
        let pair1 = _mm256_unpackhi_ps(row0, row1);
        let pair2 = _mm256_unpacklo_ps(row2, row3);
        let pair3 = _mm256_unpackhi_ps(row2, row3);
        let pair4 = _mm256_unpacklo_ps(row4, row5);
        let pair5 = _mm256_unpackhi_ps(row4, row5);
        let pair6 = _mm256_unpacklo_ps(row6, row7);
        let pair7 = _mm256_unpackhi_ps(row6, row7);

        // Columns (0, 4), (1, 5), (2, 6) and (3, 7) of rows 0..4 and rows 4..8.
        let quad0 = _mm256_shuffle_ps(pair0, pair2, 0b01_00_01_00);
        let quad1 = _mm256_shuffle_ps(pair0, pair2, 0b11_10_11_10);
        let quad2 = _mm256_shuffle_ps(pair1, pair3, 0b01_00_01_00);
        let quad3 = _mm256_shuffle_ps(pair1, pair3, 0b11_10_11_10);
        let quad4 = _mm256_shuffle_ps(pair4, pair6, 0b01_00_01_00);
        let quad5 = _mm256_shuffle_ps(pair4, pair6, 0b11_10_11_10);
        let quad6 = _mm256_shuffle_ps(pair5, pair7, 0b01_00_01_00);
        let quad7 = _mm256_shuffle_ps(pair5, pair7, 0b11_10_11_10);

        _mm256_storeu_ps(
            output[0].as_mut_ptr(),
            _mm256_permute2f128_ps(quad0, quad4, 0x20),
        );
        _mm256_storeu_ps(
            output[1].as_mut_ptr(),
            _mm256_permute2f128_ps(quad1, quad5, 0x20),
        );
        _mm256_storeu_ps(
            output[2].as_mut_ptr(),
            _mm256_permute2f128_ps(quad2, quad6, 0x20),
        );
        _mm256_storeu_ps(
            output[3].as_mut_ptr(),
            _mm256_permute2f128_ps(quad3, quad7, 0x20),
        );
        _mm256_storeu_ps(
            output[4].as_mut_ptr(),
            _mm256_permute2f128_ps(quad0, quad4, 0x31),
        );
        _mm256_storeu_ps(
            output[5].as_mut_ptr(),
            _mm256_permute2f128_ps(quad1, quad5, 0x31),
        );
        _mm256_storeu_ps(
            output[6].as_mut_ptr(),
            _mm256_permute2f128_ps(quad2, quad6, 0x31),
        );
        _mm256_storeu_ps(
            output[7].as_mut_ptr(),
            _mm256_permute2f128_ps(quad3, quad7, 0x31),
        );
    }
}
