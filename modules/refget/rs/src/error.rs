use derive_more::Display;

/// Reasons a region specification is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum RegionError {
    /// The sequence the region refers to is unknown to the sequence source.
    #[display("sequence {_0} is not available")]
    BadRange(String),
    /// Inverted or out of bounds segment.
    #[display("invalid segment {_0}")]
    BadSegment(String),
    /// The text can't be parsed as a region at all.
    #[display("malformed region {_0:?}")]
    Malformed(String),
}

impl std::error::Error for RegionError {}

/// Failures surfaced to the host. They are either the root cause or the outermost context of the
/// returned `eyre::Report`, so hosts can classify them with `report.downcast_ref::<Error>()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum Error {
    #[display("Unknown sequence: {_0}")]
    UnknownSequence(String),
    #[display("Unknown sequence file: {_0}")]
    UnknownFile(String),
    #[display("Unknown checksum: {_0}")]
    UnknownChecksum(String),
    #[display("Bad region: {_0}")]
    BadRegion(RegionError),
    #[display("Failed to open the sequence file {_0}")]
    StorageOpen(String),
    #[display("Failed to read {_0} from the sequence file")]
    StorageRead(String),
    #[display("Output budget of {_0} bytes is too small to make progress")]
    BudgetTooSmall(usize),
}

impl std::error::Error for Error {}

impl From<RegionError> for Error {
    fn from(value: RegionError) -> Self {
        Self::BadRegion(value)
    }
}
