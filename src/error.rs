/// Errors the filter constructors and the streaming driver can return.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterError {
    /// The lane count is not one of the supported SIMD widths (4, 8 or 16).
    UnsupportedWidth(usize),
    /// The coefficient rows and the initial condition rows of a cascade differ in count.
    StageCountMismatch {
        coefficients: usize,
        initial_conditions: usize,
    },
    /// The first entry of a `[1, b1, b2, a1, a2]` coefficient row is not 1.
    NonUnitLeadingCoefficient,
    /// A cascade needs at least one stage.
    EmptyCascade,
    /// Output buffer is smaller than the processed input.
    OutputBufferSize,
}

impl core::fmt::Display for FilterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnsupportedWidth(width) => {
                write!(f, "Unsupported SIMD width {width} (supported: 4, 8, 16)")
            }
            Self::StageCountMismatch {
                coefficients,
                initial_conditions,
            } => write!(
                f,
                "Stage count mismatch: {coefficients} coefficient rows but {initial_conditions} initial condition rows"
            ),
            Self::NonUnitLeadingCoefficient => f.write_str("Leading coefficient must be 1"),
            Self::EmptyCascade => f.write_str("Cascade has no stages"),
            Self::OutputBufferSize => f.write_str("Output buffer size is too small"),
        }
    }
}

impl core::fmt::Debug for FilterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self, f)
    }
}

#[cfg(not(feature = "no_std"))]
impl std::error::Error for FilterError {}
