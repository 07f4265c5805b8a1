/// Core error types for Disc Deck
use thiserror::Error;

/// Result type alias using `MdError`
pub type Result<T> = std::result::Result<T, MdError>;

/// Core error type for Disc Deck
#[derive(Error, Debug)]
pub enum MdError {
    /// A caller-side precondition was violated; nothing was sent to the device
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The device or its link failed to carry out a command
    #[error("Transport error: {0}")]
    Transport(String),

    /// The device explicitly refused a command
    #[error("Rejected: {0}")]
    Rejected(String),

    /// The on-device directory could not be parsed
    #[error("Corrupted disc directory: {0}")]
    CorruptedDirectory(String),

    /// The audio export collaborator failed
    #[error("Export error: {0}")]
    Export(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl MdError {
    /// Create a precondition error
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a rejection error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create an export error
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error is the device refusing a command, as opposed to a
    /// link or parsing failure
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::Rejected(_) => true,
            Self::Transport(msg) => msg.starts_with("Rejected"),
            _ => false,
        }
    }
}
