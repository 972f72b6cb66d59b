use derive_getters::Getters;
use std::num::NonZeroU32;

/// Newline injection every `line_length` output units, counted from the start of the stream and
/// stable across arbitrarily sized writes. A newline is emitted lazily, right before the unit that
/// starts the next line, so the stream never ends with a newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Getters)]
pub struct LineWrap {
    #[getter(copy)]
    line_length: u32,
    // Units that still fit on the current line. Zero means the line is full and the next unit must
    // be preceded by a newline.
    #[getter(copy)]
    until_newline: u32,
}

impl LineWrap {
    pub fn new(line_length: NonZeroU32) -> Self {
        Self {
            line_length: line_length.get(),
            until_newline: line_length.get(),
        }
    }

    /// Number of newlines interleaved when writing the next `units` units.
    pub fn newlines(&self, units: u64) -> u64 {
        let pending = self.until_newline as u64;
        if units > pending {
            (units - pending - 1) / self.line_length as u64 + 1
        } else {
            0
        }
    }

    /// Output bytes required to write the next `units` units.
    pub fn output_len(&self, units: u64) -> u64 {
        units + self.newlines(units)
    }

    /// Largest number of units, at most `available`, whose output fits into `budget` bytes.
    pub fn capacity(&self, budget: usize, available: u64) -> u64 {
        let budget = budget as u64;
        let pending = self.until_newline as u64;

        let units = if budget <= pending {
            budget
        } else {
            // Every following line costs a newline plus up to `line_length` units
            let line = self.line_length as u64 + 1;
            let rest = budget - pending;
            pending + (rest / line) * (line - 1) + (rest % line).saturating_sub(1)
        };
        units.min(available)
    }

    /// Emit the newline ending a full line on its own and start the next line. Used when the budget
    /// can't hold the newline together with the unit after it. Returns false if the current line
    /// still has room.
    pub fn break_line(&mut self, out: &mut Vec<u8>) -> bool {
        if self.until_newline > 0 {
            return false;
        }
        out.push(b'\n');
        self.until_newline = self.line_length;
        true
    }

    /// Append units to the output, injecting newlines where lines end.
    pub fn push(&mut self, mut units: &[u8], out: &mut Vec<u8>) {
        while !units.is_empty() {
            if self.until_newline == 0 {
                out.push(b'\n');
                self.until_newline = self.line_length;
            }
            let take = (self.until_newline as usize).min(units.len());
            out.extend_from_slice(&units[..take]);
            self.until_newline -= take as u32;
            units = &units[take..];
        }
    }
}
