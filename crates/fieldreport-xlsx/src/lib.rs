//! # fieldreport-xlsx
//!
//! XLSX (Office Open XML) writer for fieldreport workbooks.
//!
//! Writing only: sheets with inline strings, the shared style table, merged
//! regions, column widths, row heights, and pictures anchored through
//! drawing parts with the image blobs stored once under `xl/media/`.

pub mod error;
pub mod writer;

mod styles;

pub use error::{XlsxError, XlsxResult};
pub use writer::XlsxWriter;
