use super::index::{self, Record};
use crate::compression::decode;
use ahash::AHashMap;
use derive_getters::{Dissolve, Getters};
use eyre::{ensure, eyre, Result, WrapErr};
use impl_tools::autoimpl;
use refslice_core_rs::loc::{Interval, IntervalOp};
use std::fs::File;
use std::io::{BufRead, Read, Seek, SeekFrom};
use std::path::Path;

/// Random access to the sequences of an indexed FASTA file.
#[autoimpl(for<T: trait + ?Sized> Box<T>)]
pub trait IndexedReaderMutOp {
    /// IDs of the reference sequences in the order they appear in the file.
    fn seqids(&self) -> &[String];

    /// Total length of the given sequence, in bases.
    fn length(&self, seqid: &str) -> Option<u64>;

    fn contains(&self, seqid: &str) -> bool {
        self.length(seqid).is_some()
    }

    /// Append the bases of the interval to the buffer. Exactly `interval.len()` bases are appended
    /// on success; on failure the buffer is left as it was.
    fn fetch(&mut self, seqid: &str, interval: Interval<u64>, buffer: &mut Vec<u8>) -> Result<()>;

    /// Append the full reference sequence with the given ID to the buffer.
    fn fetch_full_seq(&mut self, seqid: &str, buffer: &mut Vec<u8>) -> Result<()> {
        let length = self
            .length(seqid)
            .ok_or_else(|| eyre!("Reference sequence ID not found in the index: {}", seqid))?;
        self.fetch(seqid, Interval::new(0, length)?, buffer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Dissolve, Getters)]
pub struct IndexedReader<R> {
    reader: R,
    ids: Vec<String>,
    records: Vec<Record>,
    index: AHashMap<String, usize>,
}

impl IndexedReader<()> {
    /// Open an indexed FASTA file. The index is expected next to it (`{path}.fai`), as well as the
    /// `{path}.gzi` index for BGZF compressed files.
    pub fn from_path(
        fasta: impl AsRef<Path>,
        compression: &decode::Config,
    ) -> Result<Box<dyn IndexedReaderMutOp + Send>> {
        let path = fasta.as_ref();
        let stream = decode::Stream::open(path, compression)?;

        let fai = decode::sidecar(path, "fai");
        ensure!(fai.exists(), "fai index does not exist: {:?}", fai);
        let index = std::io::BufReader::new(File::open(&fai)?);

        let reader = IndexedReader::new(stream, index)
            .wrap_err_with(|| format!("Failed to load the FASTA index {}", fai.display()))?;
        log::trace!(
            "Opened indexed FASTA {} with {} sequences",
            path.display(),
            reader.ids.len()
        );
        Ok(Box::new(reader))
    }
}

impl<R: Read + Seek> IndexedReader<R> {
    pub fn new<I: BufRead>(reader: R, index: I) -> Result<IndexedReader<R>> {
        Self::from_records(reader, index::read(index)?)
    }

    pub fn from_records(reader: R, records: Vec<Record>) -> Result<IndexedReader<R>> {
        let mut index = AHashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            ensure!(
                index.insert(record.name().clone(), i).is_none(),
                "Duplicated sequence ID in the FASTA index: {}",
                record.name()
            );
        }
        let ids = records.iter().map(|x| x.name().clone()).collect();

        Ok(Self {
            reader,
            ids,
            records,
            index,
        })
    }

    fn sanitize(&self, seqid: &str, interval: &Interval<u64>) -> Result<&Record> {
        let record = self
            .index
            .get(seqid)
            .map(|x| &self.records[*x])
            .ok_or_else(|| eyre!("Reference sequence ID not found in the index: {}", seqid))?;

        ensure!(
            interval.end() <= record.length(),
            "Interval {} is out of bounds for {} of length {}",
            interval,
            seqid,
            record.length()
        );
        Ok(record)
    }

    fn read_bases(
        &mut self,
        record: &Record,
        interval: Interval<u64>,
        buffer: &mut Vec<u8>,
    ) -> Result<()> {
        let (start, end) = (interval.start(), interval.end());
        let bases_per_line = record.bases_per_line();

        buffer.try_reserve(interval.len() as usize)?;
        self.reader.seek(SeekFrom::Start(record.byte_offset(start)))?;

        let mut line_start = (start / bases_per_line) * bases_per_line;
        let mut position = start;
        while position < end {
            let line_end = (line_start + bases_per_line).min(end);
            let to_read = line_end - position;
            let read = self.reader.by_ref().take(to_read).read_to_end(buffer)? as u64;
            ensure!(
                read == to_read,
                "Unexpected end of the FASTA file while reading {}:{}",
                record.name(),
                interval
            );
            position = line_end;
            line_start += bases_per_line;

            if position < end {
                // Skip the line terminator; BGZF streams only seek to absolute positions
                let terminator = &mut self.reader.by_ref().take(record.endline_bytes());
                std::io::copy(terminator, &mut std::io::sink())?;
            }
        }
        Ok(())
    }
}

impl<R: Read + Seek> IndexedReaderMutOp for IndexedReader<R> {
    fn seqids(&self) -> &[String] {
        &self.ids
    }

    fn length(&self, seqid: &str) -> Option<u64> {
        self.index.get(seqid).map(|x| self.records[*x].length())
    }

    fn fetch(&mut self, seqid: &str, interval: Interval<u64>, buffer: &mut Vec<u8>) -> Result<()> {
        let record = self.sanitize(seqid, &interval)?.clone();

        let before = buffer.len();
        let result = self.read_bases(&record, interval, buffer);
        if result.is_err() {
            buffer.truncate(before);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const FASTA: &str = "\
>chr1 test sequence
ACGTACGTAC
GGGGCCCCAA
TTN
>chr2
acgtn
AC
>chr3
A
";

    fn reader() -> Result<IndexedReader<Cursor<Vec<u8>>>> {
        let records = index::build(FASTA.as_bytes())?;
        IndexedReader::from_records(Cursor::new(FASTA.as_bytes().to_vec()), records)
    }

    #[test]
    fn test_full_sequences() -> Result<()> {
        let mut reader = reader()?;
        assert_eq!(reader.seqids(), ["chr1", "chr2", "chr3"]);

        for (seqid, expected) in [
            ("chr1", "ACGTACGTACGGGGCCCCAATTN"),
            ("chr2", "acgtnAC"),
            ("chr3", "A"),
        ] {
            let mut buffer = Vec::new();
            reader.fetch_full_seq(seqid, &mut buffer)?;
            assert_eq!(String::from_utf8(buffer)?, expected, "ID: {seqid}");
            assert_eq!(reader.length(seqid), Some(expected.len() as u64));
        }
        assert!(!reader.contains("chr4"));
        Ok(())
    }

    #[test]
    fn test_intervals() -> Result<()> {
        let mut reader = reader()?;
        let chr1 = "ACGTACGTACGGGGCCCCAATTN";

        for range in [0..1, 0..10, 9..11, 10..20, 5..23, 20..23, 22..23, 0..23] {
            let mut buffer = Vec::new();
            let interval = Interval::new(range.start as u64, range.end as u64)?;
            reader.fetch("chr1", interval, &mut buffer)?;
            assert_eq!(String::from_utf8(buffer)?, &chr1[range.clone()], "Range: {range:?}");
        }
        Ok(())
    }

    #[test]
    fn test_fetch_appends() -> Result<()> {
        let mut reader = reader()?;
        let mut buffer = b"xx".to_vec();
        reader.fetch("chr2", Interval::new(3, 7)?, &mut buffer)?;
        reader.fetch("chr1", Interval::new(0, 2)?, &mut buffer)?;
        assert_eq!(buffer, b"xxtnACAC");
        Ok(())
    }

    #[test]
    fn test_invalid_requests() -> Result<()> {
        let mut reader = reader()?;
        let mut buffer = b"keep".to_vec();
        assert!(reader.fetch("chr2", Interval::new(0, 8)?, &mut buffer).is_err());
        assert!(reader.fetch("chr4", Interval::new(0, 1)?, &mut buffer).is_err());
        assert_eq!(buffer, b"keep");
        Ok(())
    }

    #[test]
    fn test_truncated_file() -> Result<()> {
        let records = index::build(FASTA.as_bytes())?;
        let truncated = FASTA.as_bytes()[..30].to_vec();
        let mut reader = IndexedReader::from_records(Cursor::new(truncated), records)?;

        let mut buffer = Vec::new();
        assert!(reader.fetch("chr1", Interval::new(0, 20)?, &mut buffer).is_err());
        assert!(buffer.is_empty());
        Ok(())
    }

    #[test]
    fn test_from_path() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("refslice-faidx-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("genome.fa");
        std::fs::write(&path, FASTA)?;

        let missing = IndexedReader::from_path(&path, &decode::Config::Uncompressed);
        assert!(missing.is_err());

        let records = index::build(FASTA.as_bytes())?;
        index::write(&records, File::create(dir.join("genome.fa.fai"))?)?;

        let mut reader = IndexedReader::from_path(&path, &decode::Config::infer_from_path(&path))?;
        let mut buffer = Vec::new();
        reader.fetch("chr1", Interval::new(8, 12)?, &mut buffer)?;
        std::fs::remove_dir_all(&dir)?;

        assert_eq!(buffer, b"ACGG");
        Ok(())
    }
}
