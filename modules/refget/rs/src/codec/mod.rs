//! Streaming transformations applied to fetched bases.

pub use linewrap::LineWrap;

pub mod linewrap;
pub mod revcomp;
pub mod translate;
