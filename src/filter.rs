use core::array;

use crate::{Cascade, FilterError, Lanes, Matrix, Sample};

/// How the streaming driver evaluates the cascade.
///
/// Defaults to [`Strategy::MultiBlock`].
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// One sample at a time with the plain recurrence.
    Scalar,
    /// One block of `W` samples per call (option 1).
    Block,
    /// `W` blocks per call, forced response across blocks and correction per block (option 2).
    Mixed,
    /// `W` blocks per call, both parts across blocks with one transpose pair for the whole
    /// cascade (option 3).
    #[default]
    MultiBlock,
}

impl Strategy {
    /// Number of samples the strategy consumes per step for `width` lanes.
    pub const fn granularity(self, width: usize) -> usize {
        match self {
            Strategy::Scalar => 1,
            Strategy::Block => width,
            Strategy::Mixed | Strategy::MultiBlock => width * width,
        }
    }
}

/// Streams a sample buffer through a [`Cascade`].
///
/// The filter keeps the cascade state between calls, so a long signal can be processed in
/// pieces. Each call only consumes whole steps of [`Strategy::granularity`] samples; the
/// remainder is left for the caller.
#[derive(Debug, Clone)]
pub struct Filter<T, const W: usize> {
    cascade: Cascade<T, W>,
    strategy: Strategy,
}

impl<T: Sample, const W: usize> Filter<T, W> {
    pub fn new(cascade: Cascade<T, W>, strategy: Strategy) -> Self {
        log::debug!(
            "Created filter: {} stages, width {W}, strategy {strategy:?}",
            cascade.len()
        );
        Self { cascade, strategy }
    }

    /// Builds the cascade from coefficient and initial condition rows, see
    /// [`Cascade::from_arrays`].
    pub fn from_arrays(
        coefficients: &[[T; 5]],
        initial_conditions: &[[T; 4]],
        strategy: Strategy,
    ) -> Result<Self, FilterError> {
        let cascade = Cascade::from_arrays(coefficients, initial_conditions)?;
        Ok(Self::new(cascade, strategy))
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Number of samples consumed per step.
    pub fn granularity(&self) -> usize {
        self.strategy.granularity(W)
    }

    pub fn cascade(&self) -> &Cascade<T, W> {
        &self.cascade
    }

    pub fn cascade_mut(&mut self) -> &mut Cascade<T, W> {
        &mut self.cascade
    }

    /// Filters `input` into `output`.
    ///
    /// Processes the longest prefix of `input` that is a multiple of the granularity and returns
    /// its length. The output past that prefix is left untouched.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use simd_iir::{Filter, Strategy};
    ///
    /// let mut filter = Filter::<f32, 8>::from_arrays(
    ///     &[[1.0, 0.1, -0.5, 0.2, 0.3]],
    ///     &[[0.0; 4]],
    ///     Strategy::MultiBlock,
    /// )
    /// .unwrap();
    ///
    /// let input = vec![1.0f32; 200];
    /// let mut output = vec![0.0f32; 200];
    ///
    /// match filter.process(&input, &mut output) {
    ///     Ok(written) => assert_eq!(written, 192),
    ///     Err(error) => eprintln!("Filter error: {error:?}"),
    /// }
    /// ```
    pub fn process(&mut self, input: &[T], output: &mut [T]) -> Result<usize, FilterError> {
        let length = self.processable(input.len());
        if output.len() < length {
            return Err(FilterError::OutputBufferSize);
        }

        let output = &mut output[..length];
        output.copy_from_slice(&input[..length]);
        self.run(output);
        Ok(length)
    }

    /// Filters `data` in place. Returns the number of samples processed, see
    /// [`process`](Self::process).
    pub fn process_in_place(&mut self, data: &mut [T]) -> usize {
        let length = self.processable(data.len());
        self.run(&mut data[..length]);
        length
    }

    fn processable(&self, available: usize) -> usize {
        let granularity = self.granularity();
        let length = available - available % granularity;
        if length != available {
            log::trace!(
                "Leaving {} trailing samples unprocessed (granularity {granularity})",
                available - length
            );
        }
        length
    }

    /// Runs the cascade over `data`, whose length is a multiple of the granularity.
    fn run(&mut self, data: &mut [T]) {
        let cascade = &mut self.cascade;
        match self.strategy {
            Strategy::Scalar => {
                for sample in data.iter_mut() {
                    *sample = cascade.scalar(*sample);
                }
            }
            Strategy::Block => {
                for block in data.chunks_exact_mut(W) {
                    cascade.option1(Lanes::load(block)).store(block);
                }
            }
            Strategy::Mixed => {
                for chunk in data.chunks_exact_mut(W * W) {
                    let y = cascade.option2(&load_matrix(chunk));
                    store_matrix(&y, chunk);
                }
            }
            Strategy::MultiBlock => {
                for chunk in data.chunks_exact_mut(W * W) {
                    let y = cascade.option3(&load_matrix(chunk));
                    store_matrix(&y, chunk);
                }
            }
        }
    }
}

/// Loads `W` consecutive blocks, block `j` into row `j`.
#[inline(always)]
fn load_matrix<T: Sample, const W: usize>(src: &[T]) -> Matrix<T, W> {
    array::from_fn(|j| Lanes::load(&src[j * W..]))
}

#[inline(always)]
fn store_matrix<T: Sample, const W: usize>(matrix: &Matrix<T, W>, dst: &mut [T]) {
    for (row, block) in matrix.iter().zip(dst.chunks_exact_mut(W)) {
        row.store(block);
    }
}
