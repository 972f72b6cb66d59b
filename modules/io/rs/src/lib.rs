pub mod compression;
pub mod fasta;
