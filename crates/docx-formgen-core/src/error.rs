//! Error types for template generation.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for template operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while filling a template.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading the template or writing the output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The package archive is missing or corrupt.
    #[error("Package archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A required package part is absent.
    #[error("Package part not found: {0}")]
    MissingPart(String),

    /// An XML part could not be parsed.
    #[error("Malformed XML in part '{part}': {source}")]
    Xml {
        part: String,
        #[source]
        source: roxmltree::Error,
    },

    /// The row-append feature needs a table and the template has none.
    #[error("No tables found in the document template")]
    NoTables,

    /// An image replacement points at a format the embedder cannot handle.
    #[error("Unsupported image format: {0}")]
    UnsupportedImage(PathBuf),

    /// An image replacement could not be read or decoded.
    #[error("Failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
