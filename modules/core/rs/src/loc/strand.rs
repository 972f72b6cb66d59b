use std::fmt::Display;

/// Orientation in which the bases of a sequence are served.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[repr(i8)]
pub enum Strand {
    /// Bases as stored in the sequence file.
    #[default]
    Forward = 1,
    /// Reverse-complement of the stored bases.
    Reverse = -1,
}

impl Strand {
    /// Lenient reading of a numeric strand token: `1` is the forward strand, anything else the
    /// reverse one. `Strand::try_from` accepts only `1` and `-1`.
    pub fn from_token(token: i64) -> Self {
        match token {
            1 => Self::Forward,
            _ => Self::Reverse,
        }
    }

    /// The token form, `1` or `-1`.
    pub fn sign(&self) -> i8 {
        *self as i8
    }

    pub fn is_reverse(&self) -> bool {
        matches!(self, Self::Reverse)
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.sign())
    }
}

impl TryFrom<i64> for Strand {
    type Error = ();

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Forward),
            -1 => Ok(Self::Reverse),
            _ => Err(()),
        }
    }
}

impl TryFrom<i32> for Strand {
    type Error = ();

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::try_from(value as i64)
    }
}
