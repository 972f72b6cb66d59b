use std::fmt::Display;

use derive_getters::{Dissolve, Getters};
use eyre::{ensure, Result};

use super::interval::Interval;

/// Segment is a closed, 0-based range [start, end] within a single sequence together with its
/// cached length. Segments are the building blocks of discontiguous regions and never change
/// after construction.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Dissolve, Getters)]
pub struct Segment {
    #[getter(copy)]
    start: u32,
    #[getter(copy)]
    end: u32,
    #[getter(copy)]
    length: u32,
}

impl Segment {
    pub fn new(start: u32, end: u32) -> Result<Self> {
        ensure!(end >= start, "Invalid segment: end {end} < start {start}");
        // A closed range spanning the whole u32 space would not fit into u32 length
        let length = (end - start)
            .checked_add(1)
            .ok_or_else(|| eyre::eyre!("Segment {start}-{end} is too long"))?;
        Ok(Self { start, end, length })
    }

    /// Half-open interval for `length` bases starting `offset` bases into the segment.
    pub fn slice(&self, offset: u32, length: u32) -> Result<Interval<u64>> {
        ensure!(
            length > 0 && offset as u64 + length as u64 <= self.length as u64,
            "Slice {offset}+{length} is out of bounds for segment {self}"
        );
        let start = self.start as u64 + offset as u64;
        Interval::new(start, start + length as u64)
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loc::IntervalOp;

    #[test]
    fn test_construct() {
        let segment = Segment::new(0, 10).unwrap();
        assert_eq!((segment.start(), segment.end(), segment.length()), (0, 10, 11));
        assert_eq!(Segment::new(7, 7).unwrap().length(), 1);
        assert!(Segment::new(1, 0).is_err());
        assert!(Segment::new(0, u32::MAX).is_err());
    }

    #[test]
    fn test_slice() {
        let segment = Segment::new(100, 109).unwrap();
        let slice = segment.slice(0, 10).unwrap();
        assert_eq!((slice.start(), slice.end()), (100, 110));

        let slice = segment.slice(3, 2).unwrap();
        assert_eq!((slice.start(), slice.end()), (103, 105));

        assert!(segment.slice(9, 2).is_err());
        assert!(segment.slice(0, 0).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Segment::new(1, 2).unwrap().to_string(), "[1, 2]");
    }
}
