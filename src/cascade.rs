use alloc::vec::Vec;

use crate::{
    FilterError, IccMethod, Lanes, Matrix, Sample,
    core::{Coefficients, InitialConditions, SecondOrderCore},
};

/// Second-order sections applied in series, stage 0 first.
///
/// Every call threads the output of stage `i` into stage `i + 1`. The matrix options pick the
/// section variants so that the transposes between adjacent stages cancel.
#[derive(Debug, Clone)]
pub struct Cascade<T, const W: usize> {
    stages: Vec<SecondOrderCore<T, W>>,
}

impl<T: Sample, const W: usize> Cascade<T, W> {
    /// Creates a cascade from already built sections.
    pub fn new(stages: Vec<SecondOrderCore<T, W>>) -> Result<Self, FilterError> {
        if stages.is_empty() {
            return Err(FilterError::EmptyCascade);
        }

        log::debug!("Created cascade of {} stages with width {W}", stages.len());
        Ok(Self { stages })
    }

    /// Creates a cascade from `(coefficients, initial conditions)` pairs.
    pub fn from_sections(
        sections: &[(Coefficients<T>, InitialConditions<T>)],
    ) -> Result<Self, FilterError> {
        let stages = sections
            .iter()
            .map(|&(coefficients, initial_conditions)| {
                SecondOrderCore::new(coefficients, initial_conditions)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(stages)
    }

    /// Creates a cascade from `[1, b1, b2, a1, a2]` rows and `[x[-1], x[-2], y[-1], y[-2]]` rows,
    /// row `i` describing stage `i`.
    pub fn from_arrays(
        coefficients: &[[T; 5]],
        initial_conditions: &[[T; 4]],
    ) -> Result<Self, FilterError> {
        if coefficients.len() != initial_conditions.len() {
            return Err(FilterError::StageCountMismatch {
                coefficients: coefficients.len(),
                initial_conditions: initial_conditions.len(),
            });
        }

        let stages = coefficients
            .iter()
            .zip(initial_conditions)
            .map(|(c, i)| SecondOrderCore::from_arrays(c, i))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(stages)
    }

    /// Selects the correction algorithm of every stage.
    pub fn with_icc_method(mut self, method: IccMethod) -> Self {
        self.stages = self
            .stages
            .into_iter()
            .map(|stage| stage.with_icc_method(method))
            .collect();
        self
    }

    /// Number of stages. Never zero.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[SecondOrderCore<T, W>] {
        &self.stages
    }

    /// The state of every stage, stage 0 first.
    pub fn states(&self) -> Vec<InitialConditions<T>> {
        self.stages.iter().map(SecondOrderCore::state).collect()
    }

    /// Evaluates one sample with the plain recurrence of every stage.
    #[inline(always)]
    pub fn scalar(&mut self, x: T) -> T {
        self.stages
            .iter_mut()
            .fold(x, |sample, stage| stage.scalar(sample))
    }

    /// Evaluates one block of `W` consecutive samples.
    #[inline(always)]
    pub fn option1(&mut self, x: Lanes<T, W>) -> Lanes<T, W> {
        self.stages
            .iter_mut()
            .fold(x, |block, stage| stage.option1(block))
    }

    /// Evaluates `W` blocks, time-major, with option 2 in every stage.
    #[inline(always)]
    pub fn option2(&mut self, x: &Matrix<T, W>) -> Matrix<T, W> {
        self.stages
            .iter_mut()
            .fold(*x, |matrix, stage| stage.option2(&matrix))
    }

    /// Evaluates `W` blocks, time-major, transposing only on entry and exit.
    #[inline(always)]
    pub fn option3(&mut self, x: &Matrix<T, W>) -> Matrix<T, W> {
        let Some((first, rest)) = self.stages.split_first_mut() else {
            return *x;
        };

        match rest.split_last_mut() {
            None => first.option3(x),
            Some((last, middle)) => {
                let yt = middle
                    .iter_mut()
                    .fold(first.option3_head(x), |matrix, stage| {
                        stage.option3_middle(&matrix)
                    });
                last.option3_tail(&yt)
            }
        }
    }

    /// Evaluates `W` blocks given and returned in lane-major layout, without any transpose.
    #[inline(always)]
    pub fn option3_transposed(&mut self, xt: &Matrix<T, W>) -> Matrix<T, W> {
        self.stages
            .iter_mut()
            .fold(*xt, |matrix, stage| stage.option3_middle(&matrix))
    }
}
