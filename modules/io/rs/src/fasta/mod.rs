pub mod index;
mod indexed_reader;

pub use indexed_reader::{IndexedReader, IndexedReaderMutOp};
