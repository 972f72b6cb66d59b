use crate::files::{DEFAULT_CACHE_SIZE, MAX_CACHE_SIZE};
use crate::region::CoordSystem;
use derive_getters::{Dissolve, Getters};
use derive_more::Constructor;
use std::num::NonZeroU32;

pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Server-wide knobs of the refget service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Constructor, Dissolve, Getters)]
pub struct Settings {
    // Maximum number of simultaneously open sequence files
    #[getter(copy)]
    cache_size: usize,
    // Output budget per iterator call when streaming a response
    #[getter(copy)]
    chunk_size: usize,
    #[getter(copy)]
    line_length: Option<NonZeroU32>,
    // Convention of the region text when the request doesn't say
    #[getter(copy)]
    coords: CoordSystem,
}

impl Settings {
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        if cache_size > MAX_CACHE_SIZE {
            log::warn!("Cache size {cache_size} exceeds the maximum, using {MAX_CACHE_SIZE}");
        }
        self.cache_size = cache_size.clamp(1, MAX_CACHE_SIZE);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_line_length(mut self, line_length: Option<NonZeroU32>) -> Self {
        self.line_length = line_length;
        self
    }

    pub fn with_coords(mut self, coords: CoordSystem) -> Self {
        self.coords = coords;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            line_length: None,
            coords: CoordSystem::default(),
        }
    }
}
