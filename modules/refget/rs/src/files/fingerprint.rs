use derive_more::{From, Into};
use md5::{Digest, Md5};
use std::fmt::{Debug, Display};
use std::path::Path;

/// Stable identity of a sequence file: the MD5 digest of its path.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    pub fn of_path(path: impl AsRef<Path>) -> Self {
        let digest = Md5::digest(path.as_ref().as_os_str().as_encoded_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}
