//! Registry of sequence files with a bounded number of open storage handles.

pub use backend::{Backend, Handle};
pub use fingerprint::Fingerprint;
pub use manager::{FilesManager, DEFAULT_CACHE_SIZE, MAX_CACHE_SIZE};
pub use seqfile::{Alias, SeqFile, SequenceMeta};

mod backend;
mod fingerprint;
mod manager;
mod seqfile;
