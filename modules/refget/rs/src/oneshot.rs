use crate::iter::RegionIter;
use crate::region::{split_name, CoordSystem, Region};
use eyre::Result;
use refslice_io_rs::fasta::IndexedReaderMutOp;

fn whole(
    source: &mut dyn IndexedReaderMutOp,
    spec: &str,
    coords: CoordSystem,
    translate: bool,
) -> Result<Vec<u8>> {
    let (seqid, locations) = split_name(spec)?;
    let region = Region::from_source(&*source, &seqid, Some(&locations), coords)?;
    let mut iter = RegionIter::new(region, translate, None);

    let budget = usize::try_from(iter.remaining(translate))?;
    let mut out = Vec::with_capacity(budget);
    iter.fetch(source, budget, &mut out)?;
    Ok(out)
}

/// Bases of a `name:start-end[,start-end...][:strand]` region in a single call.
pub fn fetch_region(
    source: &mut dyn IndexedReaderMutOp,
    spec: &str,
    coords: CoordSystem,
) -> Result<Vec<u8>> {
    whole(source, spec, coords, false)
}

/// Amino acids of a `name:start-end[,start-end...][:strand]` region in a single call.
pub fn translate_region(
    source: &mut dyn IndexedReaderMutOp,
    spec: &str,
    coords: CoordSystem,
) -> Result<String> {
    let amino_acids = whole(source, spec, coords, true)?;
    Ok(String::from_utf8(amino_acids)?)
}
