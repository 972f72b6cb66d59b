use crate::error::{Error, RegionError};
use eyre::Result;
use refslice_core_rs::loc::{Segment, Strand};

/// Convention of the coordinates in a region text. Ends are inclusive in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CoordSystem {
    #[default]
    ZeroBased,
    /// Ensembl-style locations, `1-10` are the first ten bases.
    OneBasedInclusive,
}

fn malformed(what: impl Into<String>) -> Error {
    Error::BadRegion(RegionError::Malformed(what.into()))
}

/// Split `name:locations` at the first colon.
pub fn split_name(spec: &str) -> Result<(String, String)> {
    let compact = compact(spec);
    match compact.split_once(':') {
        Some((name, locations)) if !name.is_empty() && !locations.is_empty() => {
            Ok((name.to_string(), locations.to_string()))
        }
        _ => Err(malformed(spec).into()),
    }
}

/// Parse `start-end[,start-end...][:strand]` into 0-based closed segments, kept in the order they
/// are listed. Whitespace is ignored anywhere. The strand token is an integer: `1` is the forward
/// strand, anything else the reverse one.
pub fn parse_locations(
    spec: &str,
    length: u32,
    coords: CoordSystem,
) -> Result<(Vec<Segment>, Option<Strand>)> {
    let compact = compact(spec);
    if compact.is_empty() {
        return Err(malformed(spec).into());
    }

    let (locations, strand) = match compact.split_once(':') {
        None => (compact.as_str(), None),
        Some((locations, token)) => {
            let token = token.parse::<i64>().map_err(|_| malformed(spec))?;
            (locations, Some(Strand::from_token(token)))
        }
    };

    let segments = locations
        .split(',')
        .map(|x| parse_segment(x, length, coords))
        .collect::<Result<Vec<_>>>()?;
    Ok((segments, strand))
}

fn compact(spec: &str) -> String {
    spec.chars().filter(|x| !x.is_whitespace()).collect()
}

fn parse_segment(text: &str, length: u32, coords: CoordSystem) -> Result<Segment> {
    let bad = || Error::BadRegion(RegionError::BadSegment(text.to_string()));

    let (start, end) = text.split_once('-').ok_or_else(|| malformed(text))?;
    let (mut start, mut end) = (
        start.parse::<u32>().map_err(|_| malformed(text))?,
        end.parse::<u32>().map_err(|_| malformed(text))?,
    );
    if coords == CoordSystem::OneBasedInclusive {
        start = start.checked_sub(1).ok_or_else(bad)?;
        end = end.checked_sub(1).ok_or_else(bad)?;
    }

    if end < start || end >= length {
        return Err(bad().into());
    }
    Segment::new(start, end).map_err(|_| bad().into())
}
