//! Engine error types

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// The step of an export during which a filesystem operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    /// Writing a compressed photo to the scratch directory
    TempWrite,
    /// Re-reading a compressed photo from the scratch directory
    TempRead,
    /// Creating the output directory
    CreateOutputDir,
    /// Writing the finished document
    Save,
}

impl fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExportPhase::TempWrite => "writing temp file",
            ExportPhase::TempRead => "reading temp file",
            ExportPhase::CreateOutputDir => "creating output directory",
            ExportPhase::Save => "saving document",
        };
        f.write_str(s)
    }
}

/// Errors from the image pipeline
#[derive(Debug, Error)]
pub enum ImageError {
    /// The source bytes are not a decodable image
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// JPEG encoding failed
    #[error("failed to encode JPEG: {0}")]
    Encode(#[source] image::ImageError),
}

/// Errors that abort an export
#[derive(Debug, Error)]
pub enum ExportError {
    /// The document could not be built (invalid or duplicate sheet name, bounds)
    #[error("document error: {0}")]
    Document(#[from] fieldreport_core::Error),

    /// A filesystem operation failed
    #[error("I/O error while {phase} ({}): {source}", path.display())]
    Io {
        phase: ExportPhase,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The workbook could not be serialized
    #[error("XLSX error: {0}")]
    Xlsx(#[from] fieldreport_xlsx::XlsxError),

    /// The export was cancelled through its [`CancelToken`](crate::CancelToken)
    #[error("export cancelled")]
    Cancelled,
}

impl ExportError {
    pub(crate) fn io(phase: ExportPhase, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            phase,
            path: path.into(),
            source,
        }
    }
}
