//! Export configuration

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use crate::error::{ExportError, Result};

/// Default corporate identifier shown in the banner of every sheet
pub const DEFAULT_BANNER_TEXT: &str = "FIELD MAINTENANCE REPORT";

/// Bounds applied to every photo before it is embedded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSettings {
    /// Longest allowed side in pixels
    pub max_dimension_px: u32,
    /// Target upper bound of the encoded JPEG size
    pub max_bytes: usize,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            max_dimension_px: 800,
            max_bytes: 500 * 1024,
        }
    }
}

/// Cooperative cancellation flag shared between the caller and an export
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the export stops at its next checkpoint
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options shared by all export orchestrators
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Directory the finished document is written to (created on demand)
    pub output_dir: PathBuf,
    /// Directory for per-session temp files
    pub scratch_dir: PathBuf,
    /// Text of the banner merged over the top of every sheet
    pub banner_text: String,
    /// Photo compression bounds
    pub image: ImageSettings,
    /// Minimum height of rows holding a photo, in points
    pub photo_row_height: f64,
    /// Minimum width of the photo column, in character units
    pub photo_column_width: f64,
    /// Fixed clock for the "Generated" row and the output file name
    pub generated_at: Option<NaiveDateTime>,
    /// Cancellation flag
    pub cancel: CancelToken,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            scratch_dir: std::env::temp_dir(),
            banner_text: DEFAULT_BANNER_TEXT.to_string(),
            image: ImageSettings::default(),
            photo_row_height: 150.0,
            photo_column_width: 50.0,
            generated_at: None,
            cancel: CancelToken::new(),
        }
    }
}

impl ExportOptions {
    /// Default options writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_banner_text(mut self, text: impl Into<String>) -> Self {
        self.banner_text = text.into();
        self
    }

    pub fn with_image_settings(mut self, image: ImageSettings) -> Self {
        self.image = image;
        self
    }

    pub fn with_photo_row_height(mut self, height: f64) -> Self {
        self.photo_row_height = height;
        self
    }

    pub fn with_photo_column_width(mut self, width: f64) -> Self {
        self.photo_column_width = width;
        self
    }

    pub fn with_generated_at(mut self, at: NaiveDateTime) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// The timestamp this export is stamped with
    pub fn timestamp(&self) -> NaiveDateTime {
        self.generated_at
            .unwrap_or_else(|| Local::now().naive_local())
    }

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_defaults() {
        let options = ExportOptions::new("/reports");
        assert_eq!(options.output_dir, PathBuf::from("/reports"));
        assert_eq!(options.scratch_dir, std::env::temp_dir());
        assert_eq!(options.banner_text, DEFAULT_BANNER_TEXT);
        assert_eq!(options.image.max_dimension_px, 800);
        assert_eq!(options.image.max_bytes, 512_000);
        assert_eq!(options.photo_row_height, 150.0);
        assert_eq!(options.photo_column_width, 50.0);
    }

    #[test]
    fn test_fixed_clock() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        assert_eq!(ExportOptions::default().with_generated_at(at).timestamp(), at);
    }

    #[test]
    fn test_cancel_token_shared_by_clones() {
        let token = CancelToken::new();
        let options = ExportOptions::default().with_cancel_token(token.clone());
        assert!(options.check_cancelled().is_ok());

        token.cancel();
        assert!(matches!(options.check_cancelled(), Err(ExportError::Cancelled)));
    }
}
