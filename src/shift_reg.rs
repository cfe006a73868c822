use crate::{FilterError, Lanes, Sample, is_supported_width};

/// Holds the `W` most recent values of a signal in one vector.
///
/// The newest value lives in the top lane, so `read(-1)` is the most recent value and
/// `read(-W)` the oldest one still held.
#[derive(Debug, Clone, Copy)]
pub struct ShiftRegister<T, const W: usize> {
    buffer: Lanes<T, W>,
}

impl<T: Sample, const W: usize> ShiftRegister<T, W> {
    /// Creates a register with every slot set to zero.
    ///
    /// Returns [`FilterError::UnsupportedWidth`] unless `W` is 4, 8 or 16.
    pub fn new() -> Result<Self, FilterError> {
        if !is_supported_width(W) {
            return Err(FilterError::UnsupportedWidth(W));
        }

        Ok(Self {
            buffer: Lanes::zero(),
        })
    }

    /// Creates a register whose two most recent values are `previous1` (newest) and `previous2`.
    pub fn with_history(previous1: T, previous2: T) -> Result<Self, FilterError> {
        let mut register = Self::new()?;
        register.push(previous2);
        register.push(previous1);
        Ok(register)
    }

    /// Shifts every held value back by one position and stores `value` as the newest.
    #[inline(always)]
    pub fn push(&mut self, value: T) {
        self.buffer = self.buffer.push_back(value);
    }

    /// Replaces the whole content with a block of `W` consecutive values, oldest in lane 0.
    #[inline(always)]
    pub fn replace(&mut self, block: Lanes<T, W>) {
        self.buffer = block;
    }

    /// Reads the value `-offset` positions back, `offset` in `-W..=-1`.
    ///
    /// Non-negative offsets index the buffer from the oldest slot.
    #[inline(always)]
    pub fn read(&self, offset: isize) -> T {
        if offset < 0 {
            self.buffer[(W as isize + offset) as usize]
        } else {
            self.buffer[offset as usize]
        }
    }

    /// The buffer as a vector, oldest value in lane 0.
    #[inline(always)]
    pub fn lanes(&self) -> Lanes<T, W> {
        self.buffer
    }
}
