/// Crate-level error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Incompatible key: {0}")]
    KeyIncompatible(String),

    #[error("Bit index {index} out of bounds for a key of {len} bits")]
    BitIndexOutOfBounds { index: usize, len: usize },

    #[error("Key out of range for this view")]
    ArgumentOutOfRange,

    #[error("Invalid range: lower bound is greater than upper bound")]
    InvalidRange,

    #[error("Trie was structurally modified during iteration")]
    ConcurrentModification,

    #[error("Invalid iterator state: {0}")]
    IteratorState(&'static str),

    #[error("Stream corrupted: {0}")]
    StreamCorrupted(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
