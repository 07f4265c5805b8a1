use md_core::MdError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, UploadError>;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Core(#[from] MdError),

    /// The file looks like device-native audio in a layout the device
    /// cannot take
    #[error("Unsupported source: {0}")]
    Unsupported(String),

    #[error("Conversion task failed: {0}")]
    Pipeline(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
