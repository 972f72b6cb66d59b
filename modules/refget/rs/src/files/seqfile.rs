use super::backend::{Backend, Handle};
use super::fingerprint::Fingerprint;
use crate::error::Error;
use ahash::AHashMap;
use derive_getters::Getters;
use derive_more::Constructor;
use eyre::{Result, WrapErr};
use refslice_io_rs::fasta::IndexedReaderMutOp;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Alternative name of a sequence, typically a checksum of a given kind (`md5`, `trunc512`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Constructor, Getters)]
pub struct Alias {
    alias: String,
    kind: String,
}

/// What is known about a sequence without opening its file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters)]
pub struct SequenceMeta {
    name: String,
    #[getter(copy)]
    length: u64,
    aliases: Vec<Alias>,
}

impl SequenceMeta {
    pub fn new(name: String, length: u64) -> Self {
        Self {
            name,
            length,
            aliases: Vec::new(),
        }
    }

    // Returns false if the alias is already attached
    pub(super) fn add_alias(&mut self, alias: Alias) -> bool {
        if self.aliases.contains(&alias) {
            return false;
        }
        self.aliases.push(alias);
        true
    }
}

/// A registered sequence file. Metadata is scanned once, when the file is registered, and stays
/// available while the storage handle is closed.
#[derive(Getters)]
pub struct SeqFile {
    path: PathBuf,
    #[getter(copy)]
    fingerprint: Fingerprint,
    #[getter(copy)]
    backend: Backend,
    sequences: Vec<SequenceMeta>,
    #[getter(skip)]
    by_name: AHashMap<String, usize>,

    #[getter(skip)]
    pub(super) handle: Option<Handle>,
    // Neighbours in the recency list, only meaningful while the handle is open
    #[getter(skip)]
    pub(super) prev: Option<usize>,
    #[getter(skip)]
    pub(super) next: Option<usize>,
}

impl SeqFile {
    /// Open the file once to record its sequences, then close it.
    pub fn scan(path: impl AsRef<Path>, backend: Backend) -> Result<Self> {
        let path = path.as_ref();
        let handle = backend
            .open(path)
            .wrap_err_with(|| Error::StorageOpen(path.display().to_string()))?;

        let mut sequences = Vec::with_capacity(handle.seqids().len());
        for seqid in handle.seqids() {
            let length = handle
                .length(seqid)
                .ok_or_else(|| Error::UnknownSequence(seqid.clone()))?;
            sequences.push(SequenceMeta::new(seqid.clone(), length));
        }
        let by_name = sequences
            .iter()
            .enumerate()
            .map(|(i, x)| (x.name().clone(), i))
            .collect();
        log::debug!(
            "Scanned {} with {} sequences",
            path.display(),
            sequences.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            fingerprint: Fingerprint::of_path(path),
            backend,
            sequences,
            by_name,
            handle: None,
            prev: None,
            next: None,
        })
    }

    pub fn sequence(&self, name: &str) -> Option<&SequenceMeta> {
        self.by_name.get(name).map(|x| &self.sequences[*x])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// The storage handle, if the file is currently open.
    pub fn handle_mut(&mut self) -> Option<&mut Handle> {
        self.handle.as_mut()
    }

    pub(super) fn add_alias(&mut self, name: &str, alias: Alias) -> Result<bool> {
        let index = *self
            .by_name
            .get(name)
            .ok_or_else(|| Error::UnknownSequence(name.to_string()))?;
        Ok(self.sequences[index].add_alias(alias))
    }
}

impl Debug for SeqFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeqFile")
            .field("path", &self.path)
            .field("fingerprint", &self.fingerprint)
            .field("backend", &self.backend)
            .field("sequences", &self.sequences)
            .field("open", &self.is_open())
            .finish()
    }
}
