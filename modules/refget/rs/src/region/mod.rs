pub use parse::{parse_locations, split_name, CoordSystem};

mod parse;

use crate::error::{Error, RegionError};
use derive_getters::{Dissolve, Getters};
use eyre::Result;
use itertools::Itertools;
use refslice_core_rs::loc::{Segment, Strand};
use refslice_io_rs::fasta::IndexedReaderMutOp;
use std::fmt::Display;

/// A named sequence plus the ordered segments to serve from it. Segments are kept in the order
/// they were requested; the strand applies to the assembled bases, not to the segment order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Dissolve, Getters)]
pub struct Region {
    seqid: String,
    segments: Vec<Segment>,
    #[getter(copy)]
    total_length: u64,
    #[getter(copy)]
    strand: Strand,
}

impl Region {
    pub fn new(seqid: String, segments: Vec<Segment>, strand: Strand) -> Self {
        let total_length = segments.iter().map(|x| x.length() as u64).sum();
        Self {
            seqid,
            segments,
            total_length,
            strand,
        }
    }

    /// The whole sequence on the forward strand.
    pub fn whole(seqid: String, length: u32) -> Result<Self> {
        let segments = match length.checked_sub(1) {
            Some(last) => vec![Segment::new(0, last)?],
            None => Vec::new(),
        };
        Ok(Self::new(seqid, segments, Strand::Forward))
    }

    /// Parse a region of a sequence with the given length. `None` selects the whole sequence,
    /// otherwise the text is `start-end[,start-end...][:strand]`.
    pub fn parse(
        seqid: String,
        spec: Option<&str>,
        length: u32,
        coords: CoordSystem,
    ) -> Result<Self> {
        match spec {
            None => Self::whole(seqid, length),
            Some(spec) => {
                let (segments, strand) = parse_locations(spec, length, coords)?;
                Ok(Self::new(seqid, segments, strand.unwrap_or_default()))
            }
        }
    }

    /// Parse a region of a sequence known to the source.
    pub fn from_source(
        source: &dyn IndexedReaderMutOp,
        seqid: &str,
        spec: Option<&str>,
        coords: CoordSystem,
    ) -> Result<Self> {
        let length = source
            .length(seqid)
            .ok_or_else(|| Error::BadRegion(RegionError::BadRange(seqid.to_string())))?;
        let length = u32::try_from(length).map_err(|_| {
            Error::BadRegion(RegionError::BadRange(format!(
                "{seqid} is too long for 32-bit coordinates"
            )))
        })?;
        Self::parse(seqid.to_string(), spec, length, coords)
    }

    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }
}

/// 1-based location string, e.g. `11-20,31-40:-1`.
impl Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let segments = self
            .segments
            .iter()
            .map(|x| format!("{}-{}", x.start() as u64 + 1, x.end() as u64 + 1))
            .join(",");
        write!(f, "{}:{}", segments, self.strand.sign())
    }
}
