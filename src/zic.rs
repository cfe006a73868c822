//! Forced response of a second-order section.
//!
//! The zero-initial-condition (ZIC) part of `y[n] = x[n] + b1·x[n-1] + b2·x[n-2] + a1·y[n-1] +
//! a2·y[n-2]` is the output the section would produce if its output history were zero. The input
//! history is real and carried from block to block.

use crate::{
    FilterError, Lanes, Matrix, Sample, core::Coefficients, icc::homogeneous_response,
    is_supported_width, shift_reg::ShiftRegister,
};

/// Evaluates the forced response of one section, one block or one matrix at a time.
#[derive(Debug, Clone)]
pub struct ZeroInitCondition<T, const W: usize> {
    b1: T,
    b2: T,
    a1: T,
    a2: T,
    /// Column `n` of the lower-triangular Toeplitz matrix, the response to `x[n] = 1`.
    toeplitz: Matrix<T, W>,
    /// Response to `x[-1] = 1`.
    p1: Lanes<T, W>,
    /// Response to `x[-2] = 1`.
    p2: Lanes<T, W>,
    history: ShiftRegister<T, W>,
}

impl<T: Sample, const W: usize> ZeroInitCondition<T, W> {
    /// Creates the evaluator with the input history `x[-1] = x1` and `x[-2] = x2`.
    ///
    /// Returns [`FilterError::UnsupportedWidth`] unless `W` is 4, 8 or 16.
    pub fn new(coefficients: &Coefficients<T>, x1: T, x2: T) -> Result<Self, FilterError> {
        if !is_supported_width(W) {
            return Err(FilterError::UnsupportedWidth(W));
        }

        let Coefficients { b1, b2, a1, a2 } = *coefficients;
        let h0 = homogeneous_response::<T, W>(a1, a2);

        // Lane `i` of the response to a unit sample `k` positions back.
        let delayed = |k: usize, i: usize| if i >= k { h0[i - k] } else { T::ZERO };

        let first_column = Lanes::from_array(core::array::from_fn(|i| {
            h0[i] + b1 * delayed(1, i) + b2 * delayed(2, i)
        }));
        let p1 = Lanes::from_array(core::array::from_fn(|i| b1 * h0[i] + b2 * delayed(1, i)));
        let p2 = h0.scale(b2);

        let mut toeplitz = [first_column; W];
        for n in 1..W {
            toeplitz[n] = toeplitz[n - 1].shift_in(T::ZERO);
        }

        Ok(Self {
            b1,
            b2,
            a1,
            a2,
            toeplitz,
            p1,
            p2,
            history: ShiftRegister::with_history(x1, x2)?,
        })
    }

    /// Forced response of `W` consecutive samples.
    ///
    /// A single mat-vec product with the Toeplitz matrix plus the contribution of the carried
    /// input history. The history is replaced by `x` afterwards.
    #[inline(always)]
    pub fn eval_block(&mut self, x: Lanes<T, W>) -> Lanes<T, W> {
        let mut w = self.p2.mul_add_scalar(
            self.history.read(-2),
            self.p1.scale(self.history.read(-1)),
        );
        for n in 0..W {
            w = self.toeplitz[n].mul_add_scalar(x[n], w);
        }

        self.history.replace(x);
        w
    }

    /// Forced responses of `W` blocks in lane-major layout.
    ///
    /// Row `n` of `x` holds sample `n` of every block, block `j` in lane `j`. Each lane runs the
    /// recurrence on its own block with zero output history. The input history of block `j` is
    /// the tail of block `j - 1`, or the carried history for block 0.
    #[inline(always)]
    pub fn eval_transposed(&mut self, x: &Matrix<T, W>) -> Matrix<T, W> {
        let previous2 = x[W - 2].shift_in(self.history.read(-2));
        let previous1 = x[W - 1].shift_in(self.history.read(-1));

        let mut w = [Lanes::zero(); W];
        w[0] = previous2.mul_add_scalar(self.b2, previous1.mul_add_scalar(self.b1, x[0]));
        w[1] = previous1.mul_add_scalar(self.b2, x[0].mul_add_scalar(self.b1, x[1]));
        w[1] = w[0].mul_add_scalar(self.a1, w[1]);

        for n in 2..W {
            let forced = x[n - 2].mul_add_scalar(self.b2, x[n - 1].mul_add_scalar(self.b1, x[n]));
            w[n] = w[n - 2].mul_add_scalar(self.a2, w[n - 1].mul_add_scalar(self.a1, forced));
        }

        self.history.push(x[W - 2][W - 1]);
        self.history.push(x[W - 1][W - 1]);
        w
    }

    /// Carried input history `(x[-1], x[-2])`.
    pub fn history(&self) -> (T, T) {
        (self.history.read(-1), self.history.read(-2))
    }

    pub(crate) fn history_mut(&mut self) -> &mut ShiftRegister<T, W> {
        &mut self.history
    }
}
