//! FASTA index (`.fai`) records: parsing, building from a FASTA stream and writing.

use derive_getters::{Dissolve, Getters};
use eyre::{ensure, eyre, Result, WrapErr};
use std::io::{BufRead, Write};

/// A single line of a `.fai` index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Dissolve, Getters)]
pub struct Record {
    name: String,
    // Total length of the sequence, in bases
    #[getter(copy)]
    length: u64,
    // Offset in the FASTA file of the first base
    #[getter(copy)]
    offset: u64,
    #[getter(copy)]
    bases_per_line: u64,
    // Including the line terminator
    #[getter(copy)]
    bytes_per_line: u64,
}

impl Record {
    pub fn new(
        name: String,
        length: u64,
        offset: u64,
        bases_per_line: u64,
        bytes_per_line: u64,
    ) -> Result<Self> {
        ensure!(!name.is_empty(), "Sequence name in the FASTA index cannot be empty");
        ensure!(
            length > 0,
            "Length of the reference sequence must be greater than zero: {name}"
        );
        ensure!(
            bases_per_line > 0,
            "Bases per line must be greater than zero: {name}"
        );
        ensure!(
            bytes_per_line > bases_per_line,
            "Bytes per line must be greater than bases per line: {name}"
        );
        Ok(Self {
            name,
            length,
            offset,
            bases_per_line,
            bytes_per_line,
        })
    }

    /// Number of line-terminator bytes at the end of each full line.
    pub fn endline_bytes(&self) -> u64 {
        self.bytes_per_line - self.bases_per_line
    }

    /// Byte offset in the FASTA file of the base at 0-based position `pos`.
    pub fn byte_offset(&self, pos: u64) -> u64 {
        self.offset + (pos / self.bases_per_line) * self.bytes_per_line + pos % self.bases_per_line
    }
}

/// Parse a `.fai` index.
pub fn read(mut index: impl BufRead) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut buffer = String::new();
    while index.read_line(&mut buffer)? > 0 {
        let line = buffer.trim_end_matches(&['\r', '\n'] as &[char]);
        if line.is_empty() {
            buffer.clear();
            continue;
        }

        let err = || eyre!("Invalid FASTA index line: {}", line);
        let mut parts = line.split('\t');

        let name = parts.next().ok_or_else(err)?.to_string();
        let mut number = || -> Result<u64> {
            parts
                .next()
                .ok_or_else(err)?
                .parse::<u64>()
                .wrap_err_with(err)
        };
        let (length, offset, bases_per_line, bytes_per_line) =
            (number()?, number()?, number()?, number()?);
        ensure!(
            parts.next().is_none(),
            "Extra fields in the FASTA index, line: {}",
            line
        );

        records.push(
            Record::new(name, length, offset, bases_per_line, bytes_per_line)
                .wrap_err_with(err)?,
        );
        buffer.clear();
    }
    Ok(records)
}

/// Build the index of a FASTA stream. Every line of a sequence except the last one must have the
/// same length, as required for random access.
pub fn build(mut fasta: impl BufRead) -> Result<Vec<Record>> {
    struct Open {
        name: String,
        length: u64,
        offset: u64,
        bases_per_line: u64,
        bytes_per_line: u64,
        short_line_seen: bool,
    }

    fn close(open: Option<Open>, records: &mut Vec<Record>) -> Result<()> {
        if let Some(open) = open {
            records.push(Record::new(
                open.name,
                open.length,
                open.offset,
                open.bases_per_line,
                open.bytes_per_line,
            )?);
        }
        Ok(())
    }

    let mut records = Vec::new();
    let mut current: Option<Open> = None;
    let mut position = 0u64;
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = fasta.read_until(b'\n', &mut line)? as u64;
        if read == 0 {
            break;
        }

        if line[0] == b'>' {
            close(current.take(), &mut records)?;
            let header = std::str::from_utf8(&line[1..])?.trim_end();
            let name = header.split_whitespace().next().unwrap_or_default();
            current = Some(Open {
                name: name.to_string(),
                length: 0,
                offset: position + read,
                bases_per_line: 0,
                bytes_per_line: 0,
                short_line_seen: false,
            });
        } else {
            let open = current
                .as_mut()
                .ok_or_else(|| eyre!("Sequence data before the first FASTA header"))?;
            let bases = line
                .iter()
                .take_while(|x| **x != b'\n' && **x != b'\r')
                .count() as u64;
            if bases > 0 {
                ensure!(
                    !open.short_line_seen,
                    "Sequence {} has lines of different lengths",
                    open.name
                );
                if open.bases_per_line == 0 {
                    open.bases_per_line = bases;
                    // The last line of a file may lack the terminator
                    open.bytes_per_line = bases + (read - bases).max(1);
                } else if bases != open.bases_per_line {
                    ensure!(
                        bases < open.bases_per_line,
                        "Sequence {} has lines of different lengths",
                        open.name
                    );
                    open.short_line_seen = true;
                }
                open.length += bases;
            }
        }
        position += read;
    }
    close(current, &mut records)?;
    Ok(records)
}

/// Write records in the `.fai` format.
pub fn write(records: &[Record], mut into: impl Write) -> Result<()> {
    for record in records {
        writeln!(
            into,
            "{}\t{}\t{}\t{}\t{}",
            record.name, record.length, record.offset, record.bases_per_line, record.bytes_per_line
        )?;
    }
    into.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FASTA: &str = ">chr1 description\nACGTA\nCGTAC\nGT\n>chr2\nTTTT\nTT\n";

    #[test]
    fn test_build() -> Result<()> {
        let records = build(FASTA.as_bytes())?;
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].name(), "chr1");
        assert_eq!(records[0].length(), 12);
        assert_eq!(records[0].offset(), 18);
        assert_eq!(records[0].bases_per_line(), 5);
        assert_eq!(records[0].bytes_per_line(), 6);

        assert_eq!(records[1].name(), "chr2");
        assert_eq!(records[1].length(), 6);
        assert_eq!(records[1].offset(), 39);
        assert_eq!(records[1].bases_per_line(), 4);

        assert_eq!(&FASTA[18..23], "ACGTA");
        assert_eq!(&FASTA[39..43], "TTTT");
        Ok(())
    }

    #[test]
    fn test_write_then_read() -> Result<()> {
        let records = build(FASTA.as_bytes())?;
        let mut fai = Vec::new();
        write(&records, &mut fai)?;

        assert_eq!(
            String::from_utf8(fai.clone())?,
            "chr1\t12\t18\t5\t6\nchr2\t6\t39\t4\t5\n"
        );
        assert_eq!(read(fai.as_slice())?, records);
        Ok(())
    }

    #[test]
    fn test_byte_offset() -> Result<()> {
        let records = build(FASTA.as_bytes())?;
        let chr1 = &records[0];
        for (pos, expected) in [(0, b'A'), (4, b'A'), (5, b'C'), (10, b'G'), (11, b'T')] {
            assert_eq!(FASTA.as_bytes()[chr1.byte_offset(pos) as usize], expected);
        }
        Ok(())
    }

    #[test]
    fn test_invalid() {
        assert!(build(">chr1\nACGT\nAC\nACGT\n".as_bytes()).is_err());
        assert!(build(">chr1\nACGT\nACGTAA\n".as_bytes()).is_err());
        assert!(build("ACGT\n".as_bytes()).is_err());
        assert!(read("chr1\t10\t6\t4\n".as_bytes()).is_err());
        assert!(read("chr1\t10\t6\t4\t5\t7\n".as_bytes()).is_err());
        assert!(read("chr1\t10\t6\t4\t4\n".as_bytes()).is_err());
        assert!(read("chr1\t0\t6\t4\t5\n".as_bytes()).is_err());
    }
}
