//! # fieldreport-core
//!
//! In-memory document model behind the fieldreport export engine.
//!
//! This crate provides the types a report is assembled from before it is
//! serialized by `fieldreport-xlsx`:
//! - [`Workbook`] - ordered, uniquely named sheets plus the shared image table
//! - [`Worksheet`] - sparse cells, row heights, column widths, merges, pictures
//! - [`Style`] and [`StylePool`] - deduplicated cell formatting
//! - [`Picture`] and [`Anchor`] - images placed inside a single cell
//!
//! ## Example
//!
//! ```rust
//! use fieldreport_core::{CellRange, Style, Workbook};
//!
//! let mut workbook = Workbook::empty();
//! let index = workbook.add_worksheet_with_name("Checks").unwrap();
//! let sheet = workbook.worksheet_mut(index).unwrap();
//!
//! sheet.set_cell_value_at(0, 0, "Pump inspection").unwrap();
//! sheet.set_cell_style_at(0, 0, &Style::new().bold(true)).unwrap();
//! sheet.merge_cells(&CellRange::from_indices(0, 0, 0, 5)).unwrap();
//! ```

pub mod cell;
pub mod column;
pub mod error;
pub mod image;
pub mod picture;
pub mod row;
pub mod style;
pub mod workbook;
pub mod worksheet;

pub use cell::{CellAddress, CellData, CellRange, CellValue};
pub use column::ColumnSpan;
pub use error::{Error, Result};
pub use image::{ImageBlob, ImageFormat, ImageId, ImageTable};
pub use picture::{Anchor, Picture};
pub use row::Row;
pub use workbook::Workbook;
pub use worksheet::Worksheet;

pub use style::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, Color, FillStyle, FontStyle,
    HorizontalAlignment, PatternType, Style, StylePool, VerticalAlignment,
};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// English Metric Units per point (row heights are measured in points)
pub const EMU_PER_POINT: i64 = 12_700;

/// English Metric Units per pixel at 96 DPI
pub const EMU_PER_PIXEL: i64 = 9_525;

/// Convert a column width in character units to pixels.
///
/// Uses the Calibri 11 maximum digit width of 7px plus 5px of padding.
pub fn column_width_to_pixels(width: f64) -> i64 {
    if width <= 0.0 {
        return 0;
    }
    (width * 7.0 + 5.0).trunc() as i64
}
