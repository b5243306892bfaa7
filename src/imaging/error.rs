use super::backend::BackendError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by [`ImageFactory`](super::ImageFactory) and
/// [`RasterHandle`](super::RasterHandle).
///
/// Operations on a closed handle never produce one of these; they are
/// silent no-ops or `None`/`false` sentinels.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image could not be created: {0}")]
    Creation(String),
    #[error("Given image data are empty")]
    EmptyInput,
    #[error("Given image data could not be decoded: {0}")]
    Decode(#[source] BackendError),
    #[error("Image type is unknown or unsupported: {0:?}")]
    UnsupportedFormat(String),
    #[error("Image does not exist or is not readable: {}", path.display())]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{operation} failed: {source}")]
    Transform {
        operation: &'static str,
        #[source]
        source: BackendError,
    },
    #[error("Image could not be {action}. Make sure the target is writable: {source}")]
    Encode {
        action: &'static str,
        #[source]
        source: BackendError,
    },
}

impl ImageError {
    /// Name of the failing transformation, if this is a transform error.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            ImageError::Transform { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}
