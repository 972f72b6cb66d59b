use derive_getters::Getters;
use refslice_core_rs::loc::Segment;

/// Position of an iterator within its region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Getters)]
pub struct Cursor {
    #[getter(copy)]
    segment: usize,
    #[getter(copy)]
    offset: u32,
    // Bases already served, from either end of the region depending on the strand
    #[getter(copy)]
    consumed: u64,
}

impl Cursor {
    /// Move to base `bp` of the region (0-based, counted over the concatenated segments). Returns
    /// false if `bp` is past the end of the region. At `bp == total` the cursor points past the
    /// last segment.
    pub fn seek(&mut self, segments: &[Segment], bp: u64) -> bool {
        let mut before = 0u64;
        for (index, segment) in segments.iter().enumerate() {
            let length = segment.length() as u64;
            if bp < before + length {
                self.segment = index;
                self.offset = (bp - before) as u32;
                return true;
            }
            before += length;
        }

        if bp == before {
            self.segment = segments.len();
            self.offset = 0;
            true
        } else {
            false
        }
    }

    /// Move forward by `bases` bases that were just read starting at the cursor.
    pub(crate) fn advance(&mut self, segments: &[Segment], mut bases: u64) {
        self.consumed += bases;
        while bases > 0 {
            let left = (segments[self.segment].length() - self.offset) as u64;
            if bases < left {
                self.offset += bases as u32;
                return;
            }
            bases -= left;
            self.segment += 1;
            self.offset = 0;
        }
    }

    pub(crate) fn with_consumed(mut self, consumed: u64) -> Self {
        self.consumed = consumed;
        self
    }
}
