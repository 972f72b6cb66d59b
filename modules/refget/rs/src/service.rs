use crate::catalog::Catalog;
use crate::error::{Error, RegionError};
use crate::files::{Alias, FilesManager, Fingerprint, Handle};
use crate::iter::RegionIter;
use crate::region::{CoordSystem, Region};
use crate::settings::Settings;
use derive_getters::{Dissolve, Getters};
use eyre::Result;
use refslice_core_rs::loc::Strand;
use std::io::Write;
use std::num::NonZeroU32;
use std::path::Path;

/// Parameters of a sequence request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Request {
    /// Locations, `start-end[,start-end...][:strand]`.
    pub region: Option<String>,
    /// 1-based inclusive bounds; an alternative to `region`.
    pub start: Option<u32>,
    pub end: Option<u32>,
    /// Must be 1 or -1.
    pub strand: Option<i32>,
    pub translate: bool,
    /// Overrides the default line length of the service.
    pub line_length: Option<NonZeroU32>,
    /// Convention of `region`, the service default if not given.
    pub coords: Option<CoordSystem>,
}

/// Description of a served sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Dissolve, Getters)]
pub struct Metadata {
    id: String,
    #[getter(copy)]
    length: u64,
    aliases: Vec<Alias>,
}

/// The host-facing surface: sequence files, their checksums and iterators over their sequences.
pub struct Service {
    settings: Settings,
    files: FilesManager,
    catalog: Catalog,
}

impl Service {
    pub fn new(settings: Settings) -> Self {
        Self {
            files: FilesManager::new(settings.cache_size()),
            catalog: Catalog::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn files(&self) -> &FilesManager {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut FilesManager {
        &mut self.files
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn add_seqfile(&mut self, path: impl AsRef<Path>) -> Result<Fingerprint> {
        self.files.add(path)
    }

    /// Serve the sequence under the given checksum.
    pub fn register(
        &mut self,
        file: Fingerprint,
        seqname: &str,
        kind: &str,
        checksum: &str,
    ) -> Result<bool> {
        self.catalog
            .register(&mut self.files, file, seqname, kind, checksum)
    }

    pub fn resize_cache(&mut self, capacity: usize) -> usize {
        let capacity = self.files.resize(capacity);
        self.settings = self.settings.with_cache_size(capacity);
        capacity
    }

    /// Metadata of the sequence behind a checksum. Doesn't open the sequence file.
    pub fn metadata(&self, checksum: &str) -> Result<Metadata> {
        let record = self.catalog.resolve(checksum, None)?;
        let meta = self
            .files
            .lookup(&record.file())
            .ok_or_else(|| Error::UnknownFile(record.file().to_string()))?
            .sequence(record.seqname())
            .ok_or_else(|| Error::UnknownSequence(record.seqname().clone()))?;

        Ok(Metadata {
            id: checksum.to_string(),
            length: meta.length(),
            aliases: meta.aliases().clone(),
        })
    }

    /// Open storage handle for the sequence behind a checksum.
    pub fn source(&mut self, checksum: &str) -> Result<&mut Handle> {
        let file = self.catalog.resolve(checksum, None)?.file();
        let seqfile = self.files.use_seqfile(&file)?;
        let path = seqfile.path().display().to_string();
        seqfile
            .handle_mut()
            .ok_or_else(|| Error::StorageOpen(path).into())
    }

    /// Build an iterator for a request. Drive it with the handle returned by `source`.
    pub fn create_iterator(&mut self, checksum: &str, request: &Request) -> Result<RegionIter> {
        let strand = match request.strand {
            None => Strand::Forward,
            Some(token) => Strand::try_from(token).map_err(|_| {
                Error::BadRegion(RegionError::Malformed(format!("strand {token}")))
            })?,
        };

        let seqname = self.catalog.resolve(checksum, None)?.seqname().clone();
        let coords = request.coords.unwrap_or(self.settings.coords());
        let source = self.source(checksum)?;

        let region = match (&request.region, request.start, request.end) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(Error::BadRegion(RegionError::Malformed(
                    "both a region and start/end are given".to_string(),
                ))
                .into());
            }
            (None, None, None) => {
                Region::from_source(&**source, &seqname, None, coords)?.with_strand(strand)
            }
            (Some(text), None, None) => {
                let text = if request.strand.is_some() && !text.contains(':') {
                    format!("{text}:{}", strand.sign())
                } else {
                    text.clone()
                };
                Region::from_source(&**source, &seqname, Some(&text), coords)?
            }
            (None, start, end) => {
                let length = source
                    .length(&seqname)
                    .ok_or_else(|| Error::UnknownSequence(seqname.clone()))?;
                let text = format!(
                    "{}-{}:{}",
                    start.unwrap_or(1),
                    end.map_or(length, u64::from),
                    strand.sign()
                );
                Region::from_source(
                    &**source,
                    &seqname,
                    Some(&text),
                    CoordSystem::OneBasedInclusive,
                )?
            }
        };

        log::debug!("Serving {}:{} for {}", seqname, region, checksum);
        Ok(RegionIter::new(
            region,
            request.translate,
            request.line_length.or(self.settings.line_length()),
        ))
    }

    /// Write the whole response for a request, in chunks of the configured size. Returns the
    /// number of bytes written.
    pub fn stream(
        &mut self,
        checksum: &str,
        request: &Request,
        writer: &mut impl Write,
    ) -> Result<u64> {
        let mut iter = self.create_iterator(checksum, request)?;
        let chunk = self.settings.chunk_size();
        let source = self.source(checksum)?;
        iter.write_to(source, writer, chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refslice_io_rs::fasta::index;
    use std::fs::File;
    use tempfile::TempDir;

    // chr1 is 20bp in lines of 8
    const FASTA: &str = ">chr1\nACGTTGCA\nAGGCTTAA\nCCGG\n>chr2\nATGAAATAG\n";

    fn service(dir: &TempDir, settings: Settings) -> Result<Service> {
        let path = dir.path().join("genome.fa");
        std::fs::write(&path, FASTA)?;
        index::write(
            &index::build(FASTA.as_bytes())?,
            File::create(dir.path().join("genome.fa.fai"))?,
        )?;

        let mut service = Service::new(settings);
        let fp = service.add_seqfile(&path)?;
        service.register(fp, "chr1", "md5", "c1")?;
        service.register(fp, "chr2", "md5", "c2")?;
        service.register(fp, "chr2", "trunc512", "t2")?;
        Ok(service)
    }

    fn serve(service: &mut Service, checksum: &str, request: &Request) -> Result<String> {
        let mut out = Vec::new();
        let written = service.stream(checksum, request, &mut out)?;
        assert_eq!(written as usize, out.len());
        Ok(String::from_utf8(out)?)
    }

    fn bad_region(report: &eyre::Report) -> bool {
        matches!(report.downcast_ref::<Error>(), Some(Error::BadRegion(_)))
    }

    #[test]
    fn test_metadata() -> Result<()> {
        let dir = TempDir::new()?;
        let service = service(&dir, Settings::default())?;

        let meta = service.metadata("t2")?;
        assert_eq!(meta.id(), "t2");
        assert_eq!(meta.length(), 9);
        assert_eq!(
            meta.aliases(),
            &[
                Alias::new("c2".into(), "md5".into()),
                Alias::new("t2".into(), "trunc512".into())
            ]
        );
        assert_eq!(service.files().open_count(), 0);

        let err = service.metadata("missing").unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::UnknownChecksum("missing".into()))
        );
        Ok(())
    }

    #[test]
    fn test_whole_sequence() -> Result<()> {
        let dir = TempDir::new()?;
        let mut service = service(&dir, Settings::default())?;

        let request = Request::default();
        assert_eq!(serve(&mut service, "c1", &request)?, "ACGTTGCAAGGCTTAACCGG");

        let request = Request {
            strand: Some(-1),
            ..Default::default()
        };
        assert_eq!(serve(&mut service, "c1", &request)?, "CCGGTTAAGCCTTGCAACGT");

        let iter = service.create_iterator("c1", &request)?;
        assert_eq!(iter.to_string(), "1-20:-1");
        assert_eq!(iter.remaining(false), 20);
        Ok(())
    }

    #[test]
    fn test_region_text() -> Result<()> {
        let dir = TempDir::new()?;
        let mut service = service(&dir, Settings::default())?;

        let request = Request {
            region: Some("0-3,8-9".into()),
            ..Default::default()
        };
        assert_eq!(serve(&mut service, "c1", &request)?, "ACGTAG");

        // The request strand applies when the text has none
        let request = Request {
            region: Some("0-3,8-9".into()),
            strand: Some(-1),
            ..Default::default()
        };
        assert_eq!(serve(&mut service, "c1", &request)?, "CTACGT");

        // The text wins otherwise
        let request = Request {
            region: Some("0-3:1".into()),
            strand: Some(-1),
            ..Default::default()
        };
        assert_eq!(serve(&mut service, "c1", &request)?, "ACGT");

        let request = Request {
            region: Some("1-4".into()),
            coords: Some(CoordSystem::OneBasedInclusive),
            ..Default::default()
        };
        assert_eq!(serve(&mut service, "c1", &request)?, "ACGT");
        Ok(())
    }

    #[test]
    fn test_start_end() -> Result<()> {
        let dir = TempDir::new()?;
        let mut service = service(&dir, Settings::default())?;

        let request = Request {
            start: Some(17),
            ..Default::default()
        };
        assert_eq!(serve(&mut service, "c1", &request)?, "CCGG");

        let request = Request {
            start: Some(2),
            end: Some(5),
            strand: Some(-1),
            ..Default::default()
        };
        assert_eq!(serve(&mut service, "c1", &request)?, "AACG");

        let request = Request {
            end: Some(3),
            ..Default::default()
        };
        assert_eq!(serve(&mut service, "c2", &request)?, "ATG");
        Ok(())
    }

    #[test]
    fn test_translate_and_wrap() -> Result<()> {
        let dir = TempDir::new()?;
        let settings = Settings::default()
            .with_line_length(NonZeroU32::new(4))
            .with_chunk_size(3);
        let mut service = service(&dir, settings)?;

        assert_eq!(
            serve(&mut service, "c1", &Request::default())?,
            "ACGT\nTGCA\nAGGC\nTTAA\nCCGG"
        );

        let request = Request {
            translate: true,
            line_length: NonZeroU32::new(2),
            ..Default::default()
        };
        assert_eq!(serve(&mut service, "c2", &request)?, "MK\n*");
        Ok(())
    }

    #[test]
    fn test_bad_requests() -> Result<()> {
        let dir = TempDir::new()?;
        let mut service = service(&dir, Settings::default())?;

        let requests = [
            Request {
                strand: Some(0),
                ..Default::default()
            },
            Request {
                strand: Some(2),
                ..Default::default()
            },
            Request {
                region: Some("0-3".into()),
                start: Some(1),
                ..Default::default()
            },
            Request {
                region: Some("0-20".into()),
                ..Default::default()
            },
            Request {
                region: Some("3-1".into()),
                ..Default::default()
            },
            Request {
                region: Some("abc".into()),
                ..Default::default()
            },
            Request {
                start: Some(0),
                ..Default::default()
            },
            Request {
                end: Some(21),
                ..Default::default()
            },
        ];
        for request in &requests {
            let err = service.create_iterator("c1", request).unwrap_err();
            assert!(bad_region(&err), "{request:?}: {err:?}");
        }

        let err = service
            .create_iterator("nope", &Request::default())
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::UnknownChecksum("nope".into()))
        );
        Ok(())
    }

    #[test]
    fn test_resize_cache() -> Result<()> {
        let dir = TempDir::new()?;
        let mut service = service(&dir, Settings::default().with_cache_size(3))?;
        assert_eq!(service.files().capacity(), 3);

        service.source("c1")?;
        assert_eq!(service.files().open_count(), 1);
        assert_eq!(service.resize_cache(0), 1);
        assert_eq!(service.settings().cache_size(), 1);
        assert_eq!(service.files().open_count(), 1);

        service.files_mut().close_all();
        assert_eq!(service.files().open_count(), 0);
        assert_eq!(serve(&mut service, "c2", &Request::default())?, "ATGAAATAG");
        Ok(())
    }
}
