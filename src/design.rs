//! Coefficients from pole and zero locations.
//!
//! Only the polynomial expansion needed to build sections from roots. No filter design.

use alloc::{vec, vec::Vec};

use num_complex::Complex;

use crate::{Coefficients, Sample};

/// Expands `∏ (1 - r·z⁻¹)` over `roots` into recurrence coefficients.
///
/// Returns `[1, c1, …, cN]` with the signs negated after the leading one, so that the
/// polynomial as a denominator gives `y[n] = x[n] + c1·y[n-1] + … + cN·y[n-N]`. Complex roots
/// must come in conjugate pairs for the result to be real; imaginary residue is dropped.
pub fn coefficients_from_roots(roots: &[Complex<f64>]) -> Vec<f64> {
    let mut polynomial = vec![Complex::new(0.0, 0.0); roots.len() + 1];
    polynomial[0] = Complex::new(1.0, 0.0);

    for (order, root) in roots.iter().enumerate() {
        for j in (1..=order + 1).rev() {
            let lower = polynomial[j - 1];
            polynomial[j] -= root * lower;
        }
    }

    let mut coefficients = Vec::with_capacity(polynomial.len());
    coefficients.push(1.0);
    coefficients.extend(polynomial[1..].iter().map(|c| -c.re));
    coefficients
}

impl<T: Sample> Coefficients<T> {
    /// Builds a section with two poles and two zeros.
    ///
    /// Poles at the origin are allowed and make the section purely feed-forward, zeros at the
    /// origin make it purely recursive.
    pub fn from_roots(poles: &[Complex<f64>; 2], zeros: &[Complex<f64>; 2]) -> Self {
        let a = coefficients_from_roots(poles);
        let b = coefficients_from_roots(zeros);
        Self::new(
            T::from_f64(-b[1]),
            T::from_f64(-b[2]),
            T::from_f64(a[1]),
            T::from_f64(a[2]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cascade, Filter, InitialConditions, Strategy, core::tests::assert_close};

    fn c(re: f64, im: f64) -> Complex<f64> {
        Complex::new(re, im)
    }

    fn first_pair() -> [Complex<f64>; 2] {
        let im = 11.0f64.sqrt() / 7.0;
        [c(3.0 / 7.0, im), c(3.0 / 7.0, -im)]
    }

    fn second_pair() -> [Complex<f64>; 2] {
        let im = 23.0f64.sqrt() / 5.0;
        [c(-0.1, im), c(-0.1, -im)]
    }

    fn impulse(len: usize) -> Vec<f64> {
        let mut x = vec![0.0; len];
        x[0] = 1.0;
        x
    }

    #[test]
    fn test_expand_real_roots() {
        assert_eq!(
            coefficients_from_roots(&[c(2.0, 0.0), c(3.0, 0.0)]),
            vec![1.0, 5.0, -6.0]
        );
        assert_eq!(coefficients_from_roots(&[]), vec![1.0]);
    }

    #[test]
    fn test_expand_conjugate_pair() {
        let [p, q] = first_pair();
        let a = coefficients_from_roots(&[p, q]);
        assert_close(&a, &[1.0, (p + q).re, -(p * q).re]);
    }

    #[test]
    fn test_from_roots_sign_convention() {
        let zeros = [c(0.0, 0.5), c(0.0, -0.5)];
        let coefficients = Coefficients::<f64>::from_roots(&first_pair(), &zeros);
        // (1 - 0.5i·z⁻¹)(1 + 0.5i·z⁻¹) = 1 + 0.25·z⁻²
        assert_close(&[coefficients.b1, coefficients.b2], &[0.0, 0.25]);
        assert_close(&[coefficients.a1, coefficients.a2], &[6.0 / 7.0, -20.0 / 49.0]);
    }

    #[test]
    fn test_impulse_response_matches_poles() {
        let poles = first_pair();
        let zeros = [c(-0.25, 0.85), c(-0.25, -0.85)];
        let coefficients = Coefficients::<f64>::from_roots(&poles, &zeros);
        let (b1, b2) = (coefficients.b1, coefficients.b2);

        // Impulse response of the poles alone: (p^(n+1) - q^(n+1)) / (p - q).
        let [p, q] = poles;
        let mut p_power = p;
        let mut q_power = q;
        let mut h0 = Vec::new();
        for _ in 0..128 {
            h0.push(((p_power - q_power) / (p - q)).re);
            p_power *= p;
            q_power *= q;
        }
        let delayed = |n: usize, k: usize| if n >= k { h0[n - k] } else { 0.0 };
        let expected: Vec<f64> = (0..128)
            .map(|n| delayed(n, 0) + b1 * delayed(n, 1) + b2 * delayed(n, 2))
            .collect();

        for strategy in [
            Strategy::Scalar,
            Strategy::Block,
            Strategy::Mixed,
            Strategy::MultiBlock,
        ] {
            let cascade =
                Cascade::<f64, 8>::from_sections(&[(coefficients, InitialConditions::default())])
                    .unwrap();
            let mut filter = Filter::new(cascade, strategy);
            let mut output = vec![0.0; 128];
            assert_eq!(filter.process(&impulse(128), &mut output), Ok(128));
            assert_close(&output, &expected);
        }
    }

    #[test]
    fn test_fourth_order_cascade_matches_direct_form() {
        let origin = [c(0.0, 0.0), c(0.0, 0.0)];
        let sections = [
            (
                Coefficients::<f64>::from_roots(&first_pair(), &origin),
                InitialConditions::default(),
            ),
            (
                Coefficients::<f64>::from_roots(&second_pair(), &origin),
                InitialConditions::default(),
            ),
        ];

        let [p1, p2] = first_pair();
        let [p3, p4] = second_pair();
        let a = coefficients_from_roots(&[p1, p2, p3, p4]);
        assert_eq!(a.len(), 5);

        let len = 4 * 64;
        let mut expected = vec![0.0f64; len];
        for n in 0..len {
            let mut y = if n == 0 { 1.0 } else { 0.0 };
            for k in 1..=4 {
                if n >= k {
                    y += a[k] * expected[n - k];
                }
            }
            expected[n] = y;
        }

        let cascade = Cascade::<f64, 8>::from_sections(&sections).unwrap();
        let mut filter = Filter::new(cascade, Strategy::MultiBlock);
        let mut output = vec![0.0; len];
        assert_eq!(filter.process(&impulse(len), &mut output), Ok(len));
        assert_close(&output, &expected);
    }
}
