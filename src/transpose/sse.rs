//! SSE transpose of a 4×4 f32 matrix.

use core::arch::x86_64::*;

use crate::Matrix;

/// Transposes the leading 4×4 block of `input` into `output`.
///
/// # Safety
///
/// - SSE must be available (always true on x86_64).
/// - `W >= 4`.
#[target_feature(enable = "sse")]
pub(super) unsafe fn transpose_4x4<const W: usize>(
    input: &Matrix<f32, W>,
    output: &mut Matrix<f32, W>,
) {
    debug_assert!(W >= 4);

    unsafe {
        let row0 = _mm_loadu_ps(input[0].as_ptr());
        let row1 = _mm_loadu_ps(input[1].as_ptr());
        let row2 = _mm_loadu_ps(input[2].as_ptr());
        let row3 = _mm_loadu_ps(input[3].as_ptr());

        // [r0[0], r1[0], r0[1], r1[1]] and [r2[0], r3[0], r2[1], r3[1]].
        let low01 = _mm_unpacklo_ps(row0, row1);
        let low23 = _mm_unpacklo_ps(row2, row3);
        // [r0[2], r1[2], r0[3], r1[3]] and [r2[2], r3[2], r2[3], r3[3]].
        let high01 = _mm_unpackhi_ps(row0, row1);
        let high23 = _mm_unpackhi_ps(row2, row3);

        _mm_storeu_ps(output[0].as_mut_ptr(), _mm_movelh_ps(low01, low23));
        _mm_storeu_ps(output[1].as_mut_ptr(), _mm_movehl_ps(low23, low01));
        _mm_storeu_ps(output[2].as_mut_ptr(), _mm_movelh_ps(high01, high23));
        _mm_storeu_ps(output[3].as_mut_ptr(), _mm_movehl_ps(high23, high01));
    }
}
