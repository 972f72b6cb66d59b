use crate::error::Error;
use crate::files::{Alias, FilesManager, Fingerprint};
use ahash::{AHashMap, AHashSet};
use derive_getters::Getters;
use derive_more::Constructor;
use eyre::Result;

/// Where a checksum points to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Constructor, Getters)]
pub struct ChecksumRecord {
    kind: String,
    #[getter(copy)]
    file: Fingerprint,
    seqname: String,
}

/// Checksums served by the host, each resolving to a sequence of a registered file, plus the set
/// of checksum kinds ("labels") seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    records: AHashMap<String, ChecksumRecord>,
    labels: AHashSet<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `checksum` as an alias of the sequence. The first registration of a checksum wins,
    /// later ones are ignored and reported as `false`.
    pub fn register(
        &mut self,
        files: &mut FilesManager,
        file: Fingerprint,
        seqname: &str,
        kind: &str,
        checksum: &str,
    ) -> Result<bool> {
        if let Some(existing) = self.records.get(checksum) {
            log::warn!(
                "Checksum {} is already registered for {} in {}, ignoring",
                checksum,
                existing.seqname(),
                existing.file()
            );
            return Ok(false);
        }

        files.add_alias(
            &file,
            seqname,
            Alias::new(checksum.to_string(), kind.to_string()),
        )?;
        self.records.insert(
            checksum.to_string(),
            ChecksumRecord::new(kind.to_string(), file, seqname.to_string()),
        );
        self.labels.insert(kind.to_string());
        Ok(true)
    }

    /// Find the sequence a checksum refers to. When `kind` is given, the checksum must have been
    /// registered with that kind.
    pub fn resolve(&self, checksum: &str, kind: Option<&str>) -> Result<&ChecksumRecord> {
        match self.records.get(checksum) {
            Some(record) if kind.is_none_or(|x| x == record.kind()) => Ok(record),
            _ => Err(Error::UnknownChecksum(checksum.to_string()).into()),
        }
    }

    pub fn contains(&self, checksum: &str) -> bool {
        self.records.contains_key(checksum)
    }

    pub fn has_label(&self, kind: &str) -> bool {
        self.labels.contains(kind)
    }

    /// Checksum kinds in sorted order.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<_> = self.labels.iter().map(|x| x.as_str()).collect();
        labels.sort_unstable();
        labels
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
