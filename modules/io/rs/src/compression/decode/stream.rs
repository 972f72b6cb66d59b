use super::config::Config;
use eyre::{ensure, eyre, Result, WrapErr};
use noodles::bgzf;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A seekable stream over the decompressed bytes of a sequence file.
pub enum Stream {
    Raw(File),
    Bgzf(bgzf::io::indexed_reader::IndexedReader<File>),
}

impl Stream {
    pub fn open(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).wrap_err_with(|| format!("Failed to open {}", path.display()))?;

        match config {
            Config::Uncompressed => Ok(Stream::Raw(file)),
            Config::Bgzf => {
                ensure_bgzf(path)?;

                let gzi = sidecar(path, "gzi");
                ensure!(gzi.exists(), "gzi index does not exist: {:?}", gzi);
                let index = bgzf::gzi::fs::read(&gzi)
                    .wrap_err_with(|| format!("Failed to read gzi index {}", gzi.display()))?;

                Ok(Stream::Bgzf(
                    bgzf::io::indexed_reader::IndexedReader::new(file, index),
                ))
            }
        }
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Stream::Raw(r) => r.read(buf),
            Stream::Bgzf(r) => r.read(buf),
        }
    }
}

impl Seek for Stream {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            Stream::Raw(r) => r.seek(pos),
            Stream::Bgzf(r) => r.seek(pos),
        }
    }
}

/// Path of an index file stored next to `path`, e.g. `genome.fa.gz` -> `genome.fa.gz.gzi`.
pub(crate) fn sidecar(path: &Path, extension: &str) -> PathBuf {
    let mut sidecar = path.as_os_str().to_owned();
    sidecar.push(".");
    sidecar.push(extension);
    PathBuf::from(sidecar)
}

// Plain gzip can't be seeked into, only BGZF members carry the 'BC' extra subfield
fn ensure_bgzf(path: &Path) -> Result<()> {
    let decoder = flate2::read::GzDecoder::new(File::open(path)?);
    let header = decoder
        .header()
        .ok_or_else(|| eyre!("Not a gzip file: {}", path.display()))?;
    ensure!(
        has_bgzf_subfield(header.extra().unwrap_or_default()),
        "{} is a plain gzip file, indexed access requires BGZF (recompress with bgzip)",
        path.display()
    );
    Ok(())
}

fn has_bgzf_subfield(mut extra: &[u8]) -> bool {
    while extra.len() >= 4 {
        let length = u16::from_le_bytes([extra[2], extra[3]]) as usize;
        if extra[0] == b'B' && extra[1] == b'C' && length == 2 {
            return true;
        }
        extra = extra.get(4 + length..).unwrap_or_default();
    }
    false
}
