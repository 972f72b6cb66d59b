mod config;
mod stream;

pub use config::Config;
pub use stream::Stream;
pub(crate) use stream::sidecar;
