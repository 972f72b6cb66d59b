use std::path::Path;

/// How the bytes of an indexed sequence file are stored on disk. Only layouts that support
/// random access are representable: plain text and BGZF (blocked gzip with a `.gzi` index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Config {
    #[default]
    Uncompressed,
    Bgzf,
}

impl Config {
    pub fn infer_from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| match ext {
                "gz" | "gzip" | "bgz" | "bgzf" => Config::Bgzf,
                _ => Config::Uncompressed,
            })
            .unwrap_or(Config::Uncompressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_from_path() {
        for (path, expected) in [
            ("genome.fa", Config::Uncompressed),
            ("genome.fasta", Config::Uncompressed),
            ("genome", Config::Uncompressed),
            ("genome.fa.gz", Config::Bgzf),
            ("genome.fa.bgz", Config::Bgzf),
            ("/data/Homo_sapiens.sample.fa.gz", Config::Bgzf),
        ] {
            assert_eq!(Config::infer_from_path(path), expected, "Path: {path}");
        }
    }
}
