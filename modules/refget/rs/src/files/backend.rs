use eyre::Result;
use refslice_io_rs::compression::decode;
use refslice_io_rs::fasta::{IndexedReader, IndexedReaderMutOp};
use std::path::Path;

/// An open storage handle.
pub type Handle = Box<dyn IndexedReaderMutOp + Send>;

/// Storage formats sequence files can be served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// FASTA with a samtools `.fai` index, plain or BGZF compressed.
    #[default]
    Faidx,
}

impl Backend {
    pub fn infer_from_path(_path: impl AsRef<Path>) -> Self {
        Backend::Faidx
    }

    pub fn open(&self, path: impl AsRef<Path>) -> Result<Handle> {
        let path = path.as_ref();
        match self {
            Backend::Faidx => {
                IndexedReader::from_path(path, &decode::Config::infer_from_path(path))
            }
        }
    }
}
