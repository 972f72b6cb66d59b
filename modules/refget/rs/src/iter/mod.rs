pub use cursor::Cursor;

mod cursor;

use crate::codec::{revcomp, translate, LineWrap};
use crate::error::Error;
use crate::region::{CoordSystem, Region};
use derive_getters::{Dissolve, Getters};
use eyre::{ensure, Result, WrapErr};
use refslice_core_rs::loc::{IntervalOp, Segment};
use refslice_io_rs::fasta::IndexedReaderMutOp;
use std::fmt::Display;
use std::io::Write;
use std::num::NonZeroU32;

/// Streams the bases (or amino acids) of a region in chunks bounded by the caller's output budget.
///
/// The iterator owns no storage handle: every call borrows the sequence source, which lets the
/// handle cache close and reopen files between calls. Line-wrap state is carried across calls so
/// newlines land every `line_length` output units from the start of the region regardless of the
/// budgets used. A failed call leaves the iterator untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Dissolve, Getters)]
pub struct RegionIter {
    region: Region,
    #[getter(copy)]
    cursor: Cursor,
    #[getter(copy)]
    translate: bool,
    #[getter(copy)]
    wrap: Option<LineWrap>,
}

impl RegionIter {
    pub fn new(region: Region, translate: bool, line_length: Option<NonZeroU32>) -> Self {
        Self {
            region,
            cursor: Cursor::default(),
            translate,
            wrap: line_length.map(LineWrap::new),
        }
    }

    /// Untranslated, unwrapped iterator over a region of a sequence known to the source.
    pub fn create(
        source: &dyn IndexedReaderMutOp,
        seqid: &str,
        spec: Option<&str>,
        coords: CoordSystem,
    ) -> Result<Self> {
        Ok(Self::new(
            Region::from_source(source, seqid, spec, coords)?,
            false,
            None,
        ))
    }

    pub fn with_translate(mut self, translate: bool) -> Self {
        self.translate = translate;
        self
    }

    pub fn with_line_length(mut self, line_length: Option<NonZeroU32>) -> Self {
        self.wrap = line_length.map(LineWrap::new);
        self
    }

    pub fn locations(&self) -> &[Segment] {
        self.region.segments()
    }

    /// Bases left to serve, or amino acids when `translated`. A trailing partial codon counts as
    /// one amino acid.
    pub fn remaining(&self, translated: bool) -> u64 {
        let bases = self.region.total_length() - self.cursor.consumed();
        if translated {
            translate::translated_len(bases)
        } else {
            bases
        }
    }

    /// Amino acids left, not counting a trailing partial codon.
    pub fn remaining_translated_unpadded(&self) -> u64 {
        self.remaining(false) / 3
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining(false) == 0
    }

    /// Exact number of bytes the rest of the iteration will produce, newlines included.
    pub fn remaining_output_len(&self) -> u64 {
        let units = self.remaining(self.translate);
        match &self.wrap {
            Some(wrap) => wrap.output_len(units),
            None => units,
        }
    }

    /// Fetch raw or translated output depending on how the iterator was set up.
    pub fn fetch(
        &mut self,
        source: &mut dyn IndexedReaderMutOp,
        budget: usize,
        out: &mut Vec<u8>,
    ) -> Result<usize> {
        if self.translate {
            self.fetch_translated(source, budget, out)
        } else {
            self.fetch_raw(source, budget, out)
        }
    }

    /// Append at most `budget` bytes of bases (plus newlines, if wrapping) to the output and return
    /// the number of bytes appended. Zero means the region is exhausted. Fewer than `budget` bytes
    /// are produced only at the end of the region or when a newline and the base after it don't
    /// fit. A one-byte budget at the end of a full line returns the newline alone.
    pub fn fetch_raw(
        &mut self,
        source: &mut dyn IndexedReaderMutOp,
        budget: usize,
        out: &mut Vec<u8>,
    ) -> Result<usize> {
        let remaining = self.remaining(false);
        if remaining == 0 {
            return Ok(0);
        }

        let bases = match &self.wrap {
            Some(wrap) => wrap.capacity(budget, remaining),
            None => remaining.min(budget as u64),
        };
        if bases == 0 && budget > 0 && self.break_line(out) {
            return Ok(1);
        }
        ensure!(bases > 0, Error::BudgetTooSmall(budget));

        let before = out.len();
        let mut wrap = self.wrap;
        let cursor = match self.read(source, bases, &mut wrap, out) {
            Ok(cursor) => cursor,
            Err(err) => {
                out.truncate(before);
                return Err(err);
            }
        };
        if self.region.strand().is_reverse() {
            revcomp::revcomp_in_place(&mut out[before..]);
        }

        self.cursor = cursor;
        self.wrap = wrap;
        Ok(out.len() - before)
    }

    /// Append at most `budget` bytes of amino acids (plus newlines, if wrapping) to the output and
    /// return the number of bytes appended. Bases are consumed in whole codons; only the very end
    /// of the region may hold a partial one, which translates to `X`.
    pub fn fetch_translated(
        &mut self,
        source: &mut dyn IndexedReaderMutOp,
        budget: usize,
        out: &mut Vec<u8>,
    ) -> Result<usize> {
        let remaining = self.remaining(true);
        if remaining == 0 {
            return Ok(0);
        }

        let amino_acids = match &self.wrap {
            Some(wrap) => wrap.capacity(budget, remaining),
            None => remaining.min(budget as u64),
        };
        if amino_acids == 0 && budget > 0 && self.break_line(out) {
            return Ok(1);
        }
        ensure!(amino_acids > 0, Error::BudgetTooSmall(budget));
        let bases = (amino_acids * 3).min(self.remaining(false));

        let mut raw = Vec::with_capacity(bases as usize);
        let cursor = self.read(source, bases, &mut None, &mut raw)?;

        let mut translated = Vec::with_capacity(amino_acids as usize);
        if self.region.strand().is_reverse() {
            translate::translate_revcomp(&raw, &mut translated);
        } else {
            translate::translate(&raw, &mut translated);
        }
        debug_assert_eq!(translated.len() as u64, amino_acids);

        let before = out.len();
        match &mut self.wrap {
            Some(wrap) => wrap.push(&translated, out),
            None => out.extend_from_slice(&translated),
        }

        self.cursor = cursor;
        Ok(out.len() - before)
    }

    /// Drive the iterator to exhaustion, writing chunks of at most `chunk` bytes. Returns the total
    /// number of bytes written.
    pub fn write_to(
        &mut self,
        source: &mut dyn IndexedReaderMutOp,
        writer: &mut impl Write,
        chunk: usize,
    ) -> Result<u64> {
        let chunk = chunk.max(1);

        let (mut buffer, mut written) = (Vec::with_capacity(chunk), 0);
        loop {
            buffer.clear();
            let bytes = self.fetch(source, chunk, &mut buffer)?;
            if bytes == 0 {
                break;
            }
            writer.write_all(&buffer)?;
            written += bytes as u64;
        }
        writer.flush()?;
        Ok(written)
    }

    // A full line with a one-byte budget: only the newline fits, the next call starts past it
    fn break_line(&mut self, out: &mut Vec<u8>) -> bool {
        self.wrap.as_mut().is_some_and(|wrap| wrap.break_line(out))
    }

    // Read the next `bases` bases of the region in storage order and append them to the output,
    // through the line wrapper if one is given. Returns the cursor after the read; nothing is
    // committed here.
    fn read(
        &self,
        source: &mut dyn IndexedReaderMutOp,
        bases: u64,
        wrap: &mut Option<LineWrap>,
        out: &mut Vec<u8>,
    ) -> Result<Cursor> {
        let segments = self.region.segments();
        let seqid = self.region.seqid();

        // The reverse strand is served from the end of the region, but storage is always read
        // forward: jump to the start of the window.
        let mut cursor = self.cursor;
        let reverse = self.region.strand().is_reverse();
        if reverse {
            let remaining = self.remaining(false);
            ensure!(
                cursor.seek(segments, remaining - bases),
                "Failed to seek to base {} of {}",
                remaining - bases,
                self.region
            );
        }
        let (mut segment, mut offset) = (cursor.segment(), cursor.offset());

        let mut chunk = Vec::new();
        let mut left = bases;
        while left > 0 {
            assert!(
                segment < segments.len(),
                "Segments of {seqid} are inconsistent with the region length"
            );
            let current = &segments[segment];
            let take = left.min((current.length() - offset) as u64) as u32;
            let interval = current.slice(offset, take)?;

            log::trace!("Reading {}:{} for {}", seqid, interval, self.region);
            let target = if wrap.is_some() { &mut chunk } else { &mut *out };
            let before = target.len();
            source
                .fetch(seqid, interval, target)
                .wrap_err_with(|| Error::StorageRead(format!("{seqid}:{interval}")))?;
            ensure!(
                (target.len() - before) as u64 == interval.len(),
                Error::StorageRead(format!("{seqid}:{interval}"))
            );

            if let Some(wrap) = wrap.as_mut() {
                wrap.push(&chunk, out);
                chunk.clear();
            }

            left -= take as u64;
            offset += take;
            if offset == current.length() {
                segment += 1;
                offset = 0;
            }
        }

        if reverse {
            Ok(cursor.with_consumed(self.cursor.consumed() + bases))
        } else {
            cursor.advance(segments, bases);
            Ok(cursor)
        }
    }
}

impl Display for RegionIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.region)
    }
}
