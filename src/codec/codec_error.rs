use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    ValueOutOfRange {
        value: i64,
        width: usize,
    },
    UnsupportedWidth {
        width: usize,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueOutOfRange { value, width } => {
                write!(f, "Value {} does not fit in a {}-byte slot", value, width)
            }
            Self::UnsupportedWidth { width } => {
                write!(
                    f,
                    "Unsupported slot width {} bytes: must be 1, 2, 4, or 8",
                    width
                )
            }
        }
    }
}

impl std::error::Error for CodecError {}
