pub use catalog::{Catalog, ChecksumRecord};
pub use error::{Error, RegionError};
pub use iter::{Cursor, RegionIter};
pub use oneshot::{fetch_region, translate_region};
pub use region::{CoordSystem, Region};
pub use service::{Metadata, Request, Service};
pub use settings::Settings;

pub mod codec;
pub mod files;
pub mod region;

mod catalog;
mod error;
mod iter;
mod oneshot;
mod service;
mod settings;
