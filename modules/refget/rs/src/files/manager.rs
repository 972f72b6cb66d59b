use super::backend::Backend;
use super::fingerprint::Fingerprint;
use super::seqfile::{Alias, SeqFile};
use crate::error::Error;
use ahash::AHashMap;
use eyre::{Result, WrapErr};
use std::path::Path;

pub const DEFAULT_CACHE_SIZE: usize = 100;
pub const MAX_CACHE_SIZE: usize = 4096;

/// Registered sequence files with at most `capacity` storage handles open at once.
///
/// Entries live in an arena and are never removed; open entries are additionally threaded through
/// an intrusive recency list (most recently used at the head). Only `use_seqfile` refreshes the
/// recency of an entry, metadata lookups never open or touch anything.
pub struct FilesManager {
    files: Vec<SeqFile>,
    index: AHashMap<Fingerprint, usize>,

    head: Option<usize>,
    tail: Option<usize>,
    open: usize,
    capacity: usize,
}

impl FilesManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            files: Vec::new(),
            index: AHashMap::new(),
            head: None,
            tail: None,
            open: 0,
            capacity: capacity.clamp(1, MAX_CACHE_SIZE),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of currently open handles.
    pub fn open_count(&self) -> usize {
        self.open
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Register a sequence file and scan its sequences. Registering the same path again returns
    /// the existing fingerprint without touching the file.
    pub fn add(&mut self, path: impl AsRef<Path>) -> Result<Fingerprint> {
        let path = path.as_ref();
        let fingerprint = Fingerprint::of_path(path);
        if self.index.contains_key(&fingerprint) {
            log::warn!("Sequence file {} is already registered", path.display());
            return Ok(fingerprint);
        }

        let file = SeqFile::scan(path, Backend::infer_from_path(path))?;
        self.index.insert(fingerprint, self.files.len());
        self.files.push(file);
        log::debug!("Registered {} as {}", path.display(), fingerprint);
        Ok(fingerprint)
    }

    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<&SeqFile> {
        self.index.get(fingerprint).map(|x| &self.files[*x])
    }

    pub fn lookup_by_path(&self, path: impl AsRef<Path>) -> Option<&SeqFile> {
        self.lookup(&Fingerprint::of_path(path))
    }

    /// Registered files in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SeqFile> {
        self.files.iter()
    }

    /// Fingerprints of the open files, most recently used first.
    pub fn recency(&self) -> Vec<Fingerprint> {
        let mut result = Vec::with_capacity(self.open);
        let mut current = self.head;
        while let Some(index) = current {
            result.push(self.files[index].fingerprint());
            current = self.files[index].next;
        }
        result
    }

    /// Make sure the file is open and mark it as the most recently used one. Opening a file when
    /// the cache is full closes the least recently used file first. If the file can't be opened
    /// the cache is left as it was.
    pub fn use_seqfile(&mut self, fingerprint: &Fingerprint) -> Result<&mut SeqFile> {
        let index = *self
            .index
            .get(fingerprint)
            .ok_or_else(|| Error::UnknownFile(fingerprint.to_string()))?;

        if self.files[index].is_open() {
            self.touch(index);
        } else {
            let file = &self.files[index];
            let handle = file
                .backend()
                .open(file.path())
                .wrap_err_with(|| Error::StorageOpen(file.path().display().to_string()))?;

            if self.open >= self.capacity {
                self.evict();
            }
            self.files[index].handle = Some(handle);
            self.push_front(index);
            self.open += 1;
            log::debug!(
                "Opened {} ({}/{} handles)",
                self.files[index].path().display(),
                self.open,
                self.capacity
            );
        }
        Ok(&mut self.files[index])
    }

    /// Change the number of handles allowed to stay open, closing the least recently used ones if
    /// needed. Returns the effective capacity.
    pub fn resize(&mut self, capacity: usize) -> usize {
        if capacity > MAX_CACHE_SIZE {
            log::warn!("Cache size {capacity} exceeds the maximum, using {MAX_CACHE_SIZE}");
        }
        self.capacity = capacity.clamp(1, MAX_CACHE_SIZE);
        while self.open > self.capacity {
            self.evict();
        }
        log::debug!("Resized the handle cache to {}", self.capacity);
        self.capacity
    }

    /// Close the file's handle if it is open. Metadata stays registered.
    pub fn close(&mut self, fingerprint: &Fingerprint) {
        if let Some(index) = self.index.get(fingerprint).copied() {
            self.close_at(index);
        }
    }

    /// Close every open handle.
    pub fn close_all(&mut self) {
        while let Some(tail) = self.tail {
            self.close_at(tail);
        }
    }

    /// Close all handles and release the registry.
    pub fn destroy(mut self) {
        self.close_all();
    }

    /// Attach an alias to a sequence of a registered file.
    pub fn add_alias(
        &mut self,
        fingerprint: &Fingerprint,
        seqname: &str,
        alias: Alias,
    ) -> Result<bool> {
        let index = *self
            .index
            .get(fingerprint)
            .ok_or_else(|| Error::UnknownFile(fingerprint.to_string()))?;
        self.files[index].add_alias(seqname, alias)
    }

    fn evict(&mut self) {
        if let Some(tail) = self.tail {
            log::debug!("Evicting {}", self.files[tail].path().display());
            self.close_at(tail);
        }
    }

    fn close_at(&mut self, index: usize) {
        if self.files[index].handle.take().is_none() {
            return;
        }
        self.unlink(index);
        self.open -= 1;
        log::debug!("Closed {}", self.files[index].path().display());
    }

    fn touch(&mut self, index: usize) {
        if self.head != Some(index) {
            self.unlink(index);
            self.push_front(index);
        }
    }

    fn push_front(&mut self, index: usize) {
        self.files[index].prev = None;
        self.files[index].next = self.head;
        match self.head {
            Some(head) => self.files[head].prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
    }

    fn unlink(&mut self, index: usize) {
        let (prev, next) = (self.files[index].prev, self.files[index].next);
        match prev {
            Some(prev) => self.files[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.files[next].prev = prev,
            None => self.tail = prev,
        }
        self.files[index].prev = None;
        self.files[index].next = None;
    }
}

impl Default for FilesManager {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

impl Drop for FilesManager {
    fn drop(&mut self) {
        self.close_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refslice_core_rs::loc::Interval;
    use refslice_io_rs::fasta::{index, IndexedReaderMutOp};
    use std::fs::File;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_fasta(dir: &TempDir, name: &str, sequences: &[(&str, &str)]) -> Result<PathBuf> {
        let fasta: String = sequences
            .iter()
            .map(|(id, seq)| format!(">{id}\n{seq}\n"))
            .collect();
        let path = dir.path().join(name);
        std::fs::write(&path, &fasta)?;
        let records = index::build(fasta.as_bytes())?;
        index::write(&records, File::create(dir.path().join(format!("{name}.fai")))?)?;
        Ok(path)
    }

    fn files(dir: &TempDir, count: usize) -> Result<(FilesManager, Vec<Fingerprint>)> {
        let mut manager = FilesManager::new(count);
        let mut fingerprints = Vec::new();
        for i in 0..count {
            let path = write_fasta(dir, &format!("{i}.fa"), &[("chr1", "ACGT")])?;
            fingerprints.push(manager.add(path)?);
        }
        Ok((manager, fingerprints))
    }

    #[test]
    fn test_add_is_idempotent() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_fasta(&dir, "genome.fa", &[("chr1", "ACGTACGT"), ("chr2", "AC")])?;

        let mut manager = FilesManager::default();
        let fingerprint = manager.add(&path)?;

        let file = manager.lookup(&fingerprint).unwrap();
        assert_eq!(file.path(), &path);
        assert_eq!(file.sequences().len(), 2);
        assert_eq!(file.sequence("chr1").map(|x| x.length()), Some(8));
        assert_eq!(file.sequence("chr2").map(|x| x.length()), Some(2));
        assert!(!file.is_open());

        // The second registration must not look at the file at all
        std::fs::remove_file(&path)?;
        assert_eq!(manager.add(&path)?, fingerprint);
        assert_eq!(manager.len(), 1);
        assert!(manager.lookup_by_path(&path).is_some());
        assert_eq!(manager.open_count(), 0);
        Ok(())
    }

    #[test]
    fn test_add_missing_file() -> Result<()> {
        let dir = TempDir::new()?;
        let mut manager = FilesManager::default();

        let err = manager.add(dir.path().join("missing.fa")).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::StorageOpen(_))));
        assert!(manager.is_empty());
        Ok(())
    }

    #[test]
    fn test_use_opens_and_reads() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_fasta(&dir, "genome.fa", &[("chr1", "ACGTACGT")])?;
        let mut manager = FilesManager::default();
        let fingerprint = manager.add(&path)?;

        let file = manager.use_seqfile(&fingerprint)?;
        assert!(file.is_open());
        let mut buffer = Vec::new();
        file.handle_mut()
            .unwrap()
            .fetch("chr1", Interval::new(2, 6)?, &mut buffer)?;
        assert_eq!(buffer, b"GTAC");
        assert_eq!(manager.open_count(), 1);

        // Reusing an open file doesn't reopen it
        manager.use_seqfile(&fingerprint)?;
        assert_eq!(manager.open_count(), 1);

        let unknown = Fingerprint::of_path("unknown.fa");
        let err = manager.use_seqfile(&unknown).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::UnknownFile(_))));
        Ok(())
    }

    #[test]
    fn test_lru_eviction() -> Result<()> {
        let dir = TempDir::new()?;
        let (mut manager, fps) = files(&dir, 4)?;
        manager.resize(3);

        for fp in &fps[..3] {
            manager.use_seqfile(fp)?;
        }
        assert_eq!(manager.recency(), [fps[2], fps[1], fps[0]]);

        // Touch the oldest one, then overflow the cache
        manager.use_seqfile(&fps[0])?;
        assert_eq!(manager.recency(), [fps[0], fps[2], fps[1]]);
        manager.use_seqfile(&fps[3])?;

        assert_eq!(manager.open_count(), 3);
        assert_eq!(manager.recency(), [fps[3], fps[0], fps[2]]);
        assert!(!manager.lookup(&fps[1]).unwrap().is_open());

        // Lookups never change the recency
        manager.lookup(&fps[2]);
        assert_eq!(manager.recency(), [fps[3], fps[0], fps[2]]);
        Ok(())
    }

    #[test]
    fn test_failed_open_keeps_cache() -> Result<()> {
        let dir = TempDir::new()?;
        let (mut manager, fps) = files(&dir, 3)?;
        manager.resize(2);
        manager.use_seqfile(&fps[0])?;
        manager.use_seqfile(&fps[1])?;

        std::fs::remove_file(dir.path().join("2.fa"))?;
        let err = manager.use_seqfile(&fps[2]).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::StorageOpen(_))));

        assert_eq!(manager.recency(), [fps[1], fps[0]]);
        assert!(!manager.lookup(&fps[2]).unwrap().is_open());
        Ok(())
    }

    #[test]
    fn test_resize_and_close() -> Result<()> {
        let dir = TempDir::new()?;
        let (mut manager, fps) = files(&dir, 5)?;
        for fp in &fps {
            manager.use_seqfile(fp)?;
        }
        assert_eq!(manager.open_count(), 5);

        assert_eq!(manager.resize(2), 2);
        assert_eq!(manager.open_count(), 2);
        assert_eq!(manager.recency(), [fps[4], fps[3]]);
        for fp in &fps[..3] {
            assert!(!manager.lookup(fp).unwrap().is_open());
        }

        manager.close(&fps[4]);
        manager.close(&fps[4]);
        manager.close(&fps[0]);
        assert_eq!(manager.recency(), [fps[3]]);
        assert_eq!(manager.open_count(), 1);
        assert_eq!(manager.lookup(&fps[4]).unwrap().sequences().len(), 1);

        assert_eq!(manager.resize(100_000), MAX_CACHE_SIZE);
        manager.close_all();
        assert_eq!(manager.open_count(), 0);
        assert!(manager.recency().is_empty());
        manager.destroy();
        Ok(())
    }

    #[test]
    fn test_aliases() -> Result<()> {
        let dir = TempDir::new()?;
        let (mut manager, fps) = files(&dir, 1)?;

        let alias = Alias::new("abc".into(), "md5".into());
        assert!(manager.add_alias(&fps[0], "chr1", alias.clone())?);
        assert!(!manager.add_alias(&fps[0], "chr1", alias.clone())?);
        assert!(manager.add_alias(&fps[0], "chr2", alias.clone()).is_err());
        assert!(manager
            .add_alias(&Fingerprint::of_path("other"), "chr1", alias.clone())
            .is_err());

        let meta = manager.lookup(&fps[0]).unwrap().sequence("chr1").unwrap();
        assert_eq!(meta.aliases(), &[alias]);
        Ok(())
    }
}
