use std::fmt::Display;

use crate::num::PrimInt;
use derive_getters::Dissolve;
use eyre::{eyre, Result};
use impl_tools::autoimpl;

/// Half-open range [start, end) of a sequence, the form in which bases are requested from
/// storage. Empty (start == end) and inverted (start > end) intervals can't be constructed.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Dissolve)]
pub struct Interval<Idx: PrimInt> {
    start: Idx,
    end: Idx,
}

/// Anything that spans a half-open range of a sequence.
#[autoimpl(for <T: trait + ?Sized> &T, Box<T>)]
#[allow(clippy::len_without_is_empty)]
pub trait IntervalOp {
    type Idx: PrimInt;

    fn start(&self) -> Self::Idx;

    fn end(&self) -> Self::Idx;

    /// Number of positions covered.
    fn len(&self) -> Self::Idx {
        self.end() - self.start()
    }
}

impl<T: PrimInt> IntervalOp for Interval<T> {
    type Idx = T;

    #[inline(always)]
    fn start(&self) -> Self::Idx {
        self.start
    }
    #[inline(always)]
    fn end(&self) -> Self::Idx {
        self.end
    }
}

impl<Idx: PrimInt> Interval<Idx> {
    pub fn new(start: Idx, end: Idx) -> Result<Self> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(eyre!("Invalid interval: [{:?}, {:?})", start, end))
        }
    }
}

impl<Idx: PrimInt + Display> Display for Interval<Idx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
