use crate::codec::CodecError;
use std::fmt;
use std::io;
use std::time::Duration;

#[derive(Debug)]
pub enum QueueError {
    InvalidCapacity {
        capacity: usize,
        reason: &'static str,
    },
    InvalidItemSize {
        item_size: usize,
        reason: &'static str,
    },
    Allocation {
        source: io::Error,
    },
    NameInUse {
        name: String,
    },
    Encoding(CodecError),
    Decoding(CodecError),
    Timeout {
        waited: Duration,
    },
    Closed,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCapacity { capacity, reason } => {
                write!(f, "Invalid capacity {}: {}", capacity, reason)
            }
            Self::InvalidItemSize { item_size, reason } => {
                write!(f, "Invalid item size {}: {}", item_size, reason)
            }
            Self::Allocation { source } => {
                write!(f, "Failed to allocate shared memory segment: {}", source)
            }
            Self::NameInUse { name } => {
                write!(f, "Segment name {:?} is already in use", name)
            }
            Self::Encoding(e) => {
                write!(f, "Failed to encode item: {}", e)
            }
            Self::Decoding(e) => {
                write!(f, "Failed to decode slot: {}", e)
            }
            Self::Timeout { waited } => {
                write!(f, "Operation timed out after {:?}", waited)
            }
            Self::Closed => {
                write!(f, "Queue is closed")
            }
        }
    }
}

impl std::error::Error for QueueError {}
