//! One second-order section built from a forced-response and a correction evaluator.

use crate::{
    FilterError, Lanes, Matrix, Sample, icc::IccMethod, icc::InitialConditionCorrection,
    is_supported_width, transpose::TransposeFn, zic::ZeroInitCondition,
};

/// Coefficients of `y[n] = x[n] + b1·x[n-1] + b2·x[n-2] + a1·y[n-1] + a2·y[n-2]`.
///
/// Note the sign convention: `a1` and `a2` are added, so a transfer function denominator
/// `1 + α1·z⁻¹ + α2·z⁻²` maps to `a1 = -α1` and `a2 = -α2`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Coefficients<T> {
    pub b1: T,
    pub b2: T,
    pub a1: T,
    pub a2: T,
}

impl<T: Sample> Coefficients<T> {
    pub fn new(b1: T, b2: T, a1: T, a2: T) -> Self {
        Self { b1, b2, a1, a2 }
    }

    /// Reads a `[1, b1, b2, a1, a2]` row.
    pub fn from_array(row: &[T; 5]) -> Result<Self, FilterError> {
        if row[0] != T::ONE {
            return Err(FilterError::NonUnitLeadingCoefficient);
        }
        Ok(Self::new(row[1], row[2], row[3], row[4]))
    }

    pub fn to_array(&self) -> [T; 5] {
        [T::ONE, self.b1, self.b2, self.a1, self.a2]
    }
}

/// The state of a section: the last two inputs and outputs, most recent first.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct InitialConditions<T> {
    pub x1: T,
    pub x2: T,
    pub y1: T,
    pub y2: T,
}

impl<T: Sample> InitialConditions<T> {
    pub fn new(x1: T, x2: T, y1: T, y2: T) -> Self {
        Self { x1, x2, y1, y2 }
    }

    /// Reads a `[x[-1], x[-2], y[-1], y[-2]]` row.
    pub fn from_array(row: &[T; 4]) -> Self {
        Self::new(row[0], row[1], row[2], row[3])
    }

    pub fn to_array(&self) -> [T; 4] {
        [self.x1, self.x2, self.y1, self.y2]
    }
}

/// A second-order section evaluating `W` or `W`² samples per call.
///
/// All options compute the same recurrence and leave the same state behind. They differ in the
/// data layout they work on:
///
/// - [`option1`](Self::option1): one block of `W` samples, forced response and correction both
///   in block mode.
/// - [`option2`](Self::option2): `W` blocks, forced response across blocks in lane-major layout,
///   correction block by block.
/// - [`option3`](Self::option3): `W` blocks, both parts in lane-major layout.
///
/// A matrix is time-major when row `j` holds block `j`, and lane-major (transposed) when row `n`
/// holds sample `n` of every block. The `head`, `tail` and `middle` variants skip the transposes
/// that cancel between adjacent sections of a cascade.
#[derive(Debug, Clone)]
pub struct SecondOrderCore<T, const W: usize> {
    coefficients: Coefficients<T>,
    zic: ZeroInitCondition<T, W>,
    icc: InitialConditionCorrection<T, W>,
    icc_method: IccMethod,
    transpose: TransposeFn<T, W>,
}

impl<T: Sample, const W: usize> SecondOrderCore<T, W> {
    /// Creates a section with the given coefficients and state.
    ///
    /// Returns [`FilterError::UnsupportedWidth`] unless `W` is 4, 8 or 16.
    pub fn new(
        coefficients: Coefficients<T>,
        initial_conditions: InitialConditions<T>,
    ) -> Result<Self, FilterError> {
        if !is_supported_width(W) {
            return Err(FilterError::UnsupportedWidth(W));
        }

        let InitialConditions { x1, x2, y1, y2 } = initial_conditions;
        Ok(Self {
            coefficients,
            zic: ZeroInitCondition::new(&coefficients, x1, x2)?,
            icc: InitialConditionCorrection::new(&coefficients, y1, y2)?,
            icc_method: IccMethod::default(),
            transpose: T::transpose_kernel::<W>(),
        })
    }

    /// Creates a section from a `[1, b1, b2, a1, a2]` row and a `[x[-1], x[-2], y[-1], y[-2]]`
    /// row.
    pub fn from_arrays(
        coefficients: &[T; 5],
        initial_conditions: &[T; 4],
    ) -> Result<Self, FilterError> {
        Self::new(
            Coefficients::from_array(coefficients)?,
            InitialConditions::from_array(initial_conditions),
        )
    }

    /// Selects the algorithm [`option3`](Self::option3) and its variants use for the correction.
    pub fn with_icc_method(mut self, method: IccMethod) -> Self {
        self.icc_method = method;
        self
    }

    pub fn icc_method(&self) -> IccMethod {
        self.icc_method
    }

    pub fn coefficients(&self) -> &Coefficients<T> {
        &self.coefficients
    }

    /// The current state, as the last two inputs and outputs seen.
    pub fn state(&self) -> InitialConditions<T> {
        let (x1, x2) = self.zic.history();
        let (y1, y2) = self.icc.history();
        InitialConditions { x1, x2, y1, y2 }
    }

    /// Evaluates one sample with the plain recurrence. Serves as the reference for all options.
    #[inline(always)]
    pub fn scalar(&mut self, x: T) -> T {
        let Coefficients { b1, b2, a1, a2 } = self.coefficients;
        let InitialConditions { x1, x2, y1, y2 } = self.state();

        let y = a2.fma(y2, a1.fma(y1, b2.fma(x2, b1.fma(x1, x))));

        self.zic.history_mut().push(x);
        self.icc.history_mut().push(y);
        y
    }

    /// Evaluates one block of `W` consecutive samples.
    #[inline(always)]
    pub fn option1(&mut self, x: Lanes<T, W>) -> Lanes<T, W> {
        let w = self.zic.eval_block(x);
        self.icc.eval_block(w)
    }

    /// Evaluates `W` blocks, time-major in and out.
    #[inline(always)]
    pub fn option2(&mut self, x: &Matrix<T, W>) -> Matrix<T, W> {
        let xt = (self.transpose)(x);
        self.option2_tail(&xt)
    }

    /// Evaluates `W` blocks, lane-major in and time-major out.
    #[inline(always)]
    pub fn option2_tail(&mut self, xt: &Matrix<T, W>) -> Matrix<T, W> {
        let wt = self.zic.eval_transposed(xt);
        let w = (self.transpose)(&wt);

        let mut y = w;
        for block in y.iter_mut() {
            *block = self.icc.eval_block(*block);
        }
        y
    }

    /// Evaluates `W` blocks, time-major in and out.
    #[inline(always)]
    pub fn option3(&mut self, x: &Matrix<T, W>) -> Matrix<T, W> {
        let yt = self.option3_head(x);
        (self.transpose)(&yt)
    }

    /// Evaluates `W` blocks, time-major in and lane-major out.
    #[inline(always)]
    pub fn option3_head(&mut self, x: &Matrix<T, W>) -> Matrix<T, W> {
        let xt = (self.transpose)(x);
        self.option3_middle(&xt)
    }

    /// Evaluates `W` blocks, lane-major in and time-major out.
    #[inline(always)]
    pub fn option3_tail(&mut self, xt: &Matrix<T, W>) -> Matrix<T, W> {
        let yt = self.option3_middle(xt);
        (self.transpose)(&yt)
    }

    /// Evaluates `W` blocks, lane-major in and out.
    #[inline(always)]
    pub fn option3_middle(&mut self, xt: &Matrix<T, W>) -> Matrix<T, W> {
        let wt = self.zic.eval_transposed(xt);
        self.icc.eval(self.icc_method, &wt)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use core::array;

    use super::*;
    use crate::transpose::transpose_butterfly;

    pub(crate) fn seed_coefficients<T: Sample>() -> Coefficients<T> {
        Coefficients::new(
            T::from_f64(0.1),
            T::from_f64(-0.5),
            T::from_f64(0.2),
            T::from_f64(0.3),
        )
    }

    pub(crate) fn seed_state<T: Sample>() -> InitialConditions<T> {
        InitialConditions::new(
            T::from_f64(2.0),
            T::from_f64(3.0),
            T::from_f64(-0.5),
            T::from_f64(1.5),
        )
    }

    /// Runs the recurrence in f64, returning the output and the final state.
    pub(crate) fn reference<T: Sample>(
        c: &Coefficients<T>,
        state: &InitialConditions<T>,
        x: &[T],
    ) -> (Vec<f64>, [f64; 4]) {
        let (b1, b2, a1, a2) = (c.b1.to_f64(), c.b2.to_f64(), c.a1.to_f64(), c.a2.to_f64());
        let [mut x1, mut x2, mut y1, mut y2] = state.to_array().map(Sample::to_f64);
        let y = x
            .iter()
            .map(|xn| {
                let xn = xn.to_f64();
                let y = xn + b1 * x1 + b2 * x2 + a1 * y1 + a2 * y2;
                (x2, x1) = (x1, xn);
                (y2, y1) = (y1, y);
                y
            })
            .collect();
        (y, [x1, x2, y1, y2])
    }

    pub(crate) fn assert_close<T: Sample>(actual: &[T], expected: &[f64]) {
        let tolerance = if size_of::<T>() == 4 { 1e-5 } else { 1e-9 };
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            let a = a.to_f64();
            assert!(
                (a - e).abs() <= tolerance * e.abs().max(1.0),
                "Mismatch at {i}: expected {e}, got {a}"
            );
        }
    }

    fn iota<T: Sample>(len: usize) -> Vec<T> {
        (0..len).map(|i| T::from_f64(i as f64)).collect()
    }

    fn to_matrix<T: Sample, const W: usize>(x: &[T]) -> Matrix<T, W> {
        array::from_fn(|j| Lanes::load(&x[j * W..]))
    }

    fn flatten<T: Sample, const W: usize>(m: &Matrix<T, W>, out: &mut Vec<T>) {
        m.iter().for_each(|row| out.extend_from_slice(row.as_array()));
    }

    fn new_core<T: Sample, const W: usize>() -> SecondOrderCore<T, W> {
        SecondOrderCore::new(seed_coefficients(), seed_state()).unwrap()
    }

    fn check_state<T: Sample, const W: usize>(core: &SecondOrderCore<T, W>, expected: [f64; 4]) {
        assert_close(&core.state().to_array(), &expected);
    }

    /// Runs `evaluate` over two matrices of iota input and compares with the reference.
    fn check_matrix_option<T: Sample, const W: usize>(
        evaluate: impl Fn(&mut SecondOrderCore<T, W>, &Matrix<T, W>) -> Matrix<T, W>,
    ) {
        let x = iota::<T>(2 * W * W);
        let (expected, state) = reference(&seed_coefficients(), &seed_state(), &x);

        let mut core = new_core::<T, W>();
        let mut y = Vec::new();
        for chunk in x.chunks_exact(W * W) {
            flatten(&evaluate(&mut core, &to_matrix(chunk)), &mut y);
        }

        assert_close(&y, &expected);
        check_state(&core, state);
    }

    fn check_all_options<T: Sample, const W: usize>() {
        check_matrix_option::<T, W>(|core, x| core.option2(x));
        check_matrix_option::<T, W>(|core, x| core.option3(x));
        check_matrix_option::<T, W>(|core, x| core.option2_tail(&transpose_butterfly(x)));
        check_matrix_option::<T, W>(|core, x| transpose_butterfly(&core.option3_head(x)));
        check_matrix_option::<T, W>(|core, x| core.option3_tail(&transpose_butterfly(x)));
        check_matrix_option::<T, W>(|core, x| {
            transpose_butterfly(&core.option3_middle(&transpose_butterfly(x)))
        });
        for method in [
            IccMethod::RecursiveDoubling,
            IccMethod::RecursiveDoublingBroadcast,
            IccMethod::MatrixMultiply,
        ] {
            check_matrix_option::<T, W>(move |core, x| {
                core.icc_method = method;
                core.option3(x)
            });
        }
    }

    #[test]
    fn test_seed_scenario_scalar() {
        let x = iota::<f64>(64);
        let (expected, state) = reference(&seed_coefficients(), &seed_state(), &x);

        let mut core = new_core::<f64, 8>();
        let y: Vec<f64> = x.iter().map(|&xn| core.scalar(xn)).collect();
        assert_close(&y, &expected);
        check_state(&core, state);
    }

    #[test]
    fn test_seed_scenario_option1() {
        let x = iota::<f32>(64);
        let (expected, state) = reference(&seed_coefficients(), &seed_state(), &x);

        let mut core = new_core::<f32, 8>();
        let mut y = vec![0.0f32; 64];
        for (input, output) in x.chunks_exact(8).zip(y.chunks_exact_mut(8)) {
            core.option1(Lanes::load(input)).store(output);
        }
        assert_close(&y, &expected);
        check_state(&core, state);
    }

    #[test]
    fn test_seed_scenario_option3() {
        let x = iota::<f32>(64);
        let (expected, _) = reference(&seed_coefficients(), &seed_state(), &x);

        let mut core = new_core::<f32, 8>();
        let mut y = Vec::new();
        flatten(&core.option3(&to_matrix::<f32, 8>(&x)), &mut y);
        assert_close(&y, &expected);
    }

    #[test]
    fn test_all_options_f32() {
        check_all_options::<f32, 4>();
        check_all_options::<f32, 8>();
        check_all_options::<f32, 16>();
    }

    #[test]
    fn test_all_options_f64() {
        check_all_options::<f64, 4>();
        check_all_options::<f64, 8>();
        check_all_options::<f64, 16>();
    }

    #[test]
    fn test_options_share_state() {
        let x = iota::<f64>(3 * 64);
        let (expected, state) = reference(&seed_coefficients(), &seed_state(), &x);

        let mut core = new_core::<f64, 8>();
        let mut y = Vec::new();
        flatten(&core.option3(&to_matrix::<f64, 8>(&x[..64])), &mut y);
        for chunk in x[64..128].chunks_exact(8) {
            y.extend_from_slice(core.option1(Lanes::load(chunk)).as_array());
        }
        flatten(&core.option2(&to_matrix::<f64, 8>(&x[128..])), &mut y);

        assert_close(&y, &expected);
        check_state(&core, state);
    }

    #[test]
    fn test_unsupported_width() {
        let result = SecondOrderCore::<f32, 2>::new(seed_coefficients(), seed_state());
        assert_eq!(result.err(), Some(FilterError::UnsupportedWidth(2)));

        let result = SecondOrderCore::<f64, 32>::new(seed_coefficients(), seed_state());
        assert_eq!(result.err(), Some(FilterError::UnsupportedWidth(32)));
    }

    #[test]
    fn test_from_arrays() {
        let core = SecondOrderCore::<f64, 4>::from_arrays(
            &[1.0, 0.1, -0.5, 0.2, 0.3],
            &[2.0, 3.0, -0.5, 1.5],
        )
        .unwrap();
        assert_eq!(*core.coefficients(), seed_coefficients());
        assert_eq!(core.state(), seed_state());

        let result =
            SecondOrderCore::<f64, 4>::from_arrays(&[2.0, 0.1, -0.5, 0.2, 0.3], &[0.0; 4]);
        assert_eq!(result.err(), Some(FilterError::NonUnitLeadingCoefficient));
    }

    #[test]
    fn test_unstable_section_diverges_like_scalar() {
        let c = Coefficients::new(0.0, 0.0, 1.5, 0.2);
        let state = InitialConditions::new(0.0, 0.0, 1.0, 0.0);
        let x = vec![0.0f64; 64];
        let (expected, _) = reference(&c, &state, &x);

        let mut core = SecondOrderCore::<f64, 8>::new(c, state).unwrap();
        let mut y = Vec::new();
        flatten(&core.option3(&to_matrix::<f64, 8>(&x)), &mut y);
        assert_close(&y, &expected);
        assert!(expected[63] > 1e10);
    }
}
