//! # fieldreport
//!
//! Report-generation engine for field maintenance data. Turns inspection,
//! control and work-order records into styled XLSX documents with photos
//! embedded inside their cells.
//!
//! ## Exports
//!
//! - [`export_general_control`]: one sheet, one row per record
//! - [`export_work_orders`]: a work-order sheet and a to-do sheet sharing
//!   the same compressed photos
//! - [`export_template`]: a user-authored free-form layout
//!
//! Photos are downscaled and re-encoded as JPEG under a byte budget. Each
//! export owns a session of temp files that is removed when the export
//! returns, whether it succeeded or not.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use fieldreport::prelude::*;
//!
//! let at = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap().and_hms_opt(9, 30, 0).unwrap();
//! let records = vec![DomainRecord::new("Oil level", at).with_status("OK")];
//! let metadata = ReportMetadata::new("Line 3 weekly control");
//!
//! let outcome = export_general_control(&records, &metadata, &ExportOptions::new("reports")).unwrap();
//! println!("{} rows -> {}", outcome.rows_written, outcome.path.display());
//! ```

pub mod embed;
pub mod error;
pub mod export;
pub mod layout;
pub mod options;
pub mod photo;
pub mod prelude;
pub mod record;
pub mod session;
pub mod style_registry;

pub use error::{ExportError, ExportPhase, ImageError, Result};
pub use export::{
    export_general_control, export_general_control_with, export_template, export_work_orders,
    export_work_orders_with, ExportOutcome, SkippedImage,
};
pub use options::{CancelToken, ExportOptions, ImageSettings};
pub use photo::{CompressedImage, ImageCompressor, JpegCompressor};
pub use record::{
    DomainRecord, Machine, RecordKind, ReportMetadata, ReportTemplate, TemplateColumn, TemplateRow,
    TemplateRowKind,
};
pub use session::ExportSession;
pub use style_registry::{StyleKind, StyleRegistry};

// Document model, for callers building sheets by hand
pub use fieldreport_core::{CellValue, Workbook, Worksheet};
pub use fieldreport_xlsx::XlsxWriter;
