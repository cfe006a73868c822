//! Homogeneous response of a second-order section.
//!
//! Given the forced response `w` of a block, the initial condition correction (ICC) adds the
//! free decay of the carried output history, the solution of `y[n] = a1·y[n-1] + a2·y[n-2]`
//! started from `y[-1]` and `y[-2]`.
//!
//! Within one block the correction is a closed form in `y[-1]` and `y[-2]`. Across the `W`
//! blocks of a lane-major matrix it is a first-order recurrence on the state pair
//! `s_j = (y_j[W-2], y_j[W-1])`:
//!
//! ```text
//! s_j = w_j + C · s_{j-1},    C = | h2[W-2]  h1[W-2] |
//!                                 | h2[W-1]  h1[W-1] |
//! ```
//!
//! which is solved in `log2(W)` steps by recursive doubling over the lane-wise powers of `C`.

use crate::{
    FilterError, Lanes, Matrix, Sample,
    core::Coefficients,
    is_supported_width,
    lanes::{MAX_LEVELS, Patterns, levels, shift_pattern},
    shift_reg::ShiftRegister,
};

/// Algorithm used to propagate the carried state across the blocks of a matrix.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IccMethod {
    /// Recursive doubling where every lane combines with the last lane of the preceding
    /// half-group (Sklansky tree). Uses lane-local weights only.
    #[default]
    RecursiveDoubling,
    /// Recursive doubling where every lane combines with the lane a power-of-two distance below
    /// (Kogge-Stone tree), using a broadcast weight per step.
    RecursiveDoublingBroadcast,
    /// Explicit lower-triangular Toeplitz matrix-vector product. `O(W)` instead of `O(log W)`.
    MatrixMultiply,
}

/// Response of `h[n] = a1·h[n-1] + a2·h[n-2]` to a unit impulse, `h[0] = 1`.
pub(crate) fn homogeneous_response<T: Sample, const W: usize>(a1: T, a2: T) -> Lanes<T, W> {
    let mut h = [T::ZERO; W];
    for i in 0..W {
        h[i] = match i {
            0 => T::ONE,
            1 => a1,
            _ => a1.fma(h[i - 1], a2 * h[i - 2]),
        };
    }
    Lanes::from_array(h)
}

/// Lane each lane `i` reads from in the Sklansky step combining half-groups of size `half`.
///
/// Lanes in the upper half of a `2·half` group read the last lane of the lower half, the others
/// read nothing.
const fn doubling_source<const W: usize>(half: usize) -> [i8; W] {
    let mut pattern = [-1i8; W];
    let mut i = 0;
    while i < W {
        if i & half != 0 {
            pattern[i] = ((i & !(2 * half - 1)) + half - 1) as i8;
        }
        i += 1;
    }
    pattern
}

/// Power of `C` (as a lane index into the power vectors) lane `i` needs in the same step.
const fn doubling_weight<const W: usize>(half: usize) -> [i8; W] {
    let mut pattern = [-1i8; W];
    let mut i = 0;
    while i < W {
        if i & half != 0 {
            pattern[i] = (i & (half - 1)) as i8;
        }
        i += 1;
    }
    pattern
}

const fn doubling_stages<const W: usize, const WEIGHT: bool>() -> [[i8; W]; MAX_LEVELS] {
    let mut stages = [[-1i8; W]; MAX_LEVELS];
    let mut level = 0;
    while level < MAX_LEVELS && (1 << level) < W {
        let half = 1 << level;
        stages[level] = if WEIGHT {
            doubling_weight::<W>(half)
        } else {
            doubling_source::<W>(half)
        };
        level += 1;
    }
    stages
}

struct Doubling<const W: usize>;

impl<const W: usize> Doubling<W> {
    const SOURCE: [[i8; W]; MAX_LEVELS] = doubling_stages::<W, false>();
    const WEIGHT: [[i8; W]; MAX_LEVELS] = doubling_stages::<W, true>();
}

/// Entries of `C^(n+1)` in lane `n`.
#[derive(Debug, Clone, Copy)]
struct Powers<T, const W: usize> {
    h22: Lanes<T, W>,
    h12: Lanes<T, W>,
    h21: Lanes<T, W>,
    h11: Lanes<T, W>,
}

impl<T: Sample, const W: usize> Powers<T, W> {
    fn new(h1: &Lanes<T, W>, h2: &Lanes<T, W>) -> Self {
        let (c22, c12) = (h2[W - 2], h1[W - 2]);
        let (c21, c11) = (h2[W - 1], h1[W - 1]);

        let mut h22 = [T::ZERO; W];
        let mut h12 = [T::ZERO; W];
        let mut h21 = [T::ZERO; W];
        let mut h11 = [T::ZERO; W];
        (h22[0], h12[0], h21[0], h11[0]) = (c22, c12, c21, c11);

        for n in 1..W {
            h22[n] = h22[n - 1].fma(c22, h12[n - 1] * c21);
            h12[n] = h22[n - 1].fma(c12, h12[n - 1] * c11);
            h21[n] = h21[n - 1].fma(c22, h11[n - 1] * c21);
            h11[n] = h21[n - 1].fma(c12, h11[n - 1] * c11);
        }

        Self {
            h22: Lanes::from_array(h22),
            h12: Lanes::from_array(h12),
            h21: Lanes::from_array(h21),
            h11: Lanes::from_array(h11),
        }
    }

    fn permute(&self, pattern: &[i8; W]) -> Self {
        Self {
            h22: self.h22.permute(pattern),
            h12: self.h12.permute(pattern),
            h21: self.h21.permute(pattern),
            h11: self.h11.permute(pattern),
        }
    }

    /// Returns `(C^(lane+1) · (y2, y1))` row by row.
    #[inline(always)]
    fn apply(&self, y2: Lanes<T, W>, y1: Lanes<T, W>) -> (Lanes<T, W>, Lanes<T, W>) {
        (
            y2.mul_add(self.h22, y1.mul_add(self.h12, Lanes::zero())),
            y2.mul_add(self.h21, y1.mul_add(self.h11, Lanes::zero())),
        )
    }

    /// Entries of `C^(lane+1)` as scalars.
    #[inline(always)]
    fn at(&self, lane: usize) -> [T; 4] {
        [
            self.h22[lane],
            self.h12[lane],
            self.h21[lane],
            self.h11[lane],
        ]
    }
}

/// Columns of the Toeplitz matrices of `C^(j-n)`, used by [`IccMethod::MatrixMultiply`].
#[derive(Debug, Clone, Copy)]
struct PowerToeplitz<T, const W: usize> {
    t22: Matrix<T, W>,
    t12: Matrix<T, W>,
    t21: Matrix<T, W>,
    t11: Matrix<T, W>,
}

impl<T: Sample, const W: usize> PowerToeplitz<T, W> {
    fn new(powers: &Powers<T, W>) -> Self {
        let column = |first: Lanes<T, W>| {
            let mut columns = [first; W];
            for n in 1..W {
                columns[n] = columns[n - 1].shift_in(T::ZERO);
            }
            columns
        };

        // Lane 0 of column 0 is C^0 = I.
        Self {
            t22: column(powers.h22.shift_in(T::ONE)),
            t12: column(powers.h12.shift_in(T::ZERO)),
            t21: column(powers.h21.shift_in(T::ZERO)),
            t11: column(powers.h11.shift_in(T::ONE)),
        }
    }
}

/// Evaluates the homogeneous correction of one section.
#[derive(Debug, Clone)]
pub struct InitialConditionCorrection<T, const W: usize> {
    /// Response to `y[-1] = 1`.
    h1: Lanes<T, W>,
    /// Response to `y[-2] = 1`.
    h2: Lanes<T, W>,
    powers: Powers<T, W>,
    /// Powers restricted to lane 0, seeding the first block with the carried state.
    first: Powers<T, W>,
    /// Powers gathered per doubling level.
    steps: [Powers<T, W>; MAX_LEVELS],
    toeplitz: PowerToeplitz<T, W>,
    history: ShiftRegister<T, W>,
}

impl<T: Sample, const W: usize> InitialConditionCorrection<T, W> {
    /// Creates the evaluator with the output history `y[-1] = y1` and `y[-2] = y2`.
    ///
    /// Returns [`FilterError::UnsupportedWidth`] unless `W` is 4, 8 or 16.
    pub fn new(coefficients: &Coefficients<T>, y1: T, y2: T) -> Result<Self, FilterError> {
        if !is_supported_width(W) {
            return Err(FilterError::UnsupportedWidth(W));
        }

        let Coefficients { a1, a2, .. } = *coefficients;
        let h0 = homogeneous_response::<T, W>(a1, a2);

        let h1 = Lanes::from_array(core::array::from_fn(|i| {
            if i + 1 < W {
                h0[i + 1]
            } else {
                a1.fma(h0[W - 1], a2 * h0[W - 2])
            }
        }));
        let h2 = h0.scale(a2);

        let powers = Powers::new(&h1, &h2);
        let first = powers.permute(&Patterns::<W>::FIRST_LANE);
        let steps = core::array::from_fn(|level| powers.permute(&Doubling::<W>::WEIGHT[level]));
        let toeplitz = PowerToeplitz::new(&powers);

        Ok(Self {
            h1,
            h2,
            powers,
            first,
            steps,
            toeplitz,
            history: ShiftRegister::with_history(y1, y2)?,
        })
    }

    /// Corrects the forced response of `W` consecutive samples. The history is replaced by the
    /// output block.
    #[inline(always)]
    pub fn eval_block(&mut self, w: Lanes<T, W>) -> Lanes<T, W> {
        let y = self.h2.mul_add_scalar(
            self.history.read(-2),
            self.h1.mul_add_scalar(self.history.read(-1), w),
        );
        self.history.replace(y);
        y
    }

    /// Corrects the forced responses of `W` blocks in lane-major layout with `method`.
    #[inline(always)]
    pub fn eval(&mut self, method: IccMethod, w: &Matrix<T, W>) -> Matrix<T, W> {
        match method {
            IccMethod::RecursiveDoubling => self.eval_transposed(w),
            IccMethod::RecursiveDoublingBroadcast => self.eval_transposed_broadcast(w),
            IccMethod::MatrixMultiply => self.eval_transposed_matmul(w),
        }
    }

    /// Lane-major correction using the Sklansky recursive doubling tree.
    pub fn eval_transposed(&mut self, w: &Matrix<T, W>) -> Matrix<T, W> {
        let (s2, s1) = (self.history.read(-2), self.history.read(-1));

        let (seed2, seed1) = self
            .first
            .apply(Lanes::splat(s2), Lanes::splat(s1));
        let mut y2 = w[W - 2] + seed2;
        let mut y1 = w[W - 1] + seed1;

        for level in 0..levels(W) {
            let source = &Doubling::<W>::SOURCE[level];
            let (carry2, carry1) = self.steps[level].apply(y2.permute(source), y1.permute(source));
            y2 = y2 + carry2;
            y1 = y1 + carry1;
        }

        self.finish(w, y2, y1)
    }

    /// Lane-major correction using the Kogge-Stone recursive doubling tree.
    ///
    /// Every step reaches back by a power-of-two distance `d` and multiplies with the broadcast
    /// entries of `C^d`.
    pub fn eval_transposed_broadcast(&mut self, w: &Matrix<T, W>) -> Matrix<T, W> {
        let state2 = Lanes::zero().insert(0, self.history.read(-2));
        let state1 = Lanes::zero().insert(0, self.history.read(-1));

        let [c22, c12, c21, c11] = self.powers.at(0);
        let mut y2 = state2.mul_add_scalar(c22, state1.mul_add_scalar(c12, w[W - 2]));
        let mut y1 = state2.mul_add_scalar(c21, state1.mul_add_scalar(c11, w[W - 1]));

        let mut distance = 1;
        while distance < W {
            let pattern = shift_pattern::<W>(distance);
            let carry2 = y2.permute(&pattern);
            let carry1 = y1.permute(&pattern);

            let [c22, c12, c21, c11] = self.powers.at(distance - 1);
            y2 = carry2.mul_add_scalar(c22, carry1.mul_add_scalar(c12, y2));
            y1 = carry2.mul_add_scalar(c21, carry1.mul_add_scalar(c11, y1));
            distance *= 2;
        }

        self.finish(w, y2, y1)
    }

    /// Lane-major correction as one lower-triangular matrix-vector product per state entry.
    pub fn eval_transposed_matmul(&mut self, w: &Matrix<T, W>) -> Matrix<T, W> {
        let (s2, s1) = (self.history.read(-2), self.history.read(-1));

        let mut y2 = self
            .powers
            .h22
            .mul_add_scalar(s2, self.powers.h12.scale(s1));
        let mut y1 = self
            .powers
            .h21
            .mul_add_scalar(s2, self.powers.h11.scale(s1));

        let t = &self.toeplitz;
        for n in 0..W {
            let (w2, w1) = (w[W - 2][n], w[W - 1][n]);
            y2 = t.t22[n].mul_add_scalar(w2, t.t12[n].mul_add_scalar(w1, y2));
            y1 = t.t21[n].mul_add_scalar(w2, t.t11[n].mul_add_scalar(w1, y1));
        }

        self.finish(w, y2, y1)
    }

    /// Fills rows `0..W-2` from the finished boundary rows and updates the history.
    #[inline(always)]
    fn finish(&mut self, w: &Matrix<T, W>, y2: Lanes<T, W>, y1: Lanes<T, W>) -> Matrix<T, W> {
        let previous2 = y2.shift_in(self.history.read(-2));
        let previous1 = y1.shift_in(self.history.read(-1));

        let mut y = [Lanes::zero(); W];
        for i in 0..W - 2 {
            y[i] = previous2.mul_add_scalar(self.h2[i], previous1.mul_add_scalar(self.h1[i], w[i]));
        }
        y[W - 2] = y2;
        y[W - 1] = y1;

        self.history.push(y2[W - 1]);
        self.history.push(y1[W - 1]);
        y
    }

    /// Carried output history `(y[-1], y[-2])`.
    pub fn history(&self) -> (T, T) {
        (self.history.read(-1), self.history.read(-2))
    }

    pub(crate) fn history_mut(&mut self) -> &mut ShiftRegister<T, W> {
        &mut self.history
    }
}
