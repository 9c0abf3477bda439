//! Export orchestrators
//!
//! All three exports build on one piece of machinery: a [`SheetSchema`]
//! describes the columns of a tabular sheet (label, width and either a field
//! extractor or the photo slot) and [`ExportContext`] writes records against
//! it, handles photos through the session cache, and persists the result.

mod general;
mod template;
mod work_order;

pub use general::{export_general_control, export_general_control_with, GENERAL_CONTROL_PREFIX};
pub use template::{export_template, TEMPLATE_PREFIX};
pub use work_order::{export_work_orders, export_work_orders_with, WORK_ORDERS_PREFIX};

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use fieldreport_core::{CellValue, Workbook, Worksheet};
use fieldreport_xlsx::{XlsxError, XlsxWriter};
use tracing::{info, warn};

use crate::embed::embed;
use crate::error::{ExportError, ExportPhase, Result};
use crate::layout::{new_report_sheet, write_header_row, write_summary_row, ReportSheet, SheetLayout};
use crate::options::ExportOptions;
use crate::photo::ImageCompressor;
use crate::record::DomainRecord;
use crate::session::ExportSession;
use crate::style_registry::{StyleKind, StyleRegistry};

/// Format of record timestamps in data cells
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A photo that could not be embedded; its row was written without it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedImage {
    /// Position of the record in the caller's input
    pub record_index: usize,
    pub reason: String,
}

/// Result of a successful export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    /// The written document
    pub path: PathBuf,
    /// Data rows written, summed over all sheets
    pub rows_written: usize,
    /// Pictures placed, summed over all sheets
    pub pictures_embedded: usize,
    pub skipped_images: Vec<SkippedImage>,
}

/// A record as seen by a column's field extractor
pub(crate) struct RowContext<'a> {
    /// 1-based position among the rows of the sheet
    pub number: usize,
    pub record: &'a DomainRecord,
}

pub(crate) type FieldFn = fn(&RowContext<'_>) -> CellValue;

pub(crate) enum ColumnKind {
    Field(FieldFn),
    Photo,
}

pub(crate) struct ColumnSpec {
    pub label: &'static str,
    pub width: f64,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn field(label: &'static str, width: f64, extract: FieldFn) -> Self {
        Self {
            label,
            width,
            kind: ColumnKind::Field(extract),
        }
    }

    pub fn photo(label: &'static str, width: f64) -> Self {
        Self {
            label,
            width,
            kind: ColumnKind::Photo,
        }
    }
}

/// Column layout of one tabular sheet
pub(crate) struct SheetSchema {
    pub sheet_name: &'static str,
    pub columns: Vec<ColumnSpec>,
}

impl SheetSchema {
    fn labels(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.label).collect()
    }

    fn widths(&self) -> Vec<f64> {
        self.columns.iter().map(|c| c.width).collect()
    }

    fn photo_column(&self) -> Option<u16> {
        self.columns
            .iter()
            .position(|c| matches!(c.kind, ColumnKind::Photo))
            .map(|i| i as u16)
    }
}

/// Row-number column shared by the tabular sheets
pub(crate) fn number(ctx: &RowContext<'_>) -> CellValue {
    CellValue::from(ctx.number)
}

pub(crate) fn title(ctx: &RowContext<'_>) -> CellValue {
    CellValue::from(&ctx.record.title)
}

pub(crate) fn date(ctx: &RowContext<'_>) -> CellValue {
    CellValue::from(ctx.record.timestamp.format(DATE_FORMAT).to_string())
}

/// State of one export call: the document being built and its session
pub(crate) struct ExportContext<'a> {
    prefix: &'static str,
    options: &'a ExportOptions,
    /// Absent for exports without photos
    compressor: Option<&'a dyn ImageCompressor>,
    workbook: Workbook,
    registry: StyleRegistry,
    session: ExportSession,
    generated_at: NaiveDateTime,
    /// Records whose photo already failed to compress
    failed_photos: BTreeSet<usize>,
    rows_written: usize,
    pictures_embedded: usize,
    skipped_images: Vec<SkippedImage>,
}

impl<'a> ExportContext<'a> {
    pub fn new(
        prefix: &'static str,
        options: &'a ExportOptions,
        records: usize,
    ) -> Self {
        let session = ExportSession::new(prefix, &options.scratch_dir);
        info!(session = %session.id(), kind = prefix, records, "export started");

        Self {
            prefix,
            options,
            compressor: None,
            workbook: Workbook::empty(),
            registry: StyleRegistry::new(),
            session,
            generated_at: options.timestamp(),
            failed_photos: BTreeSet::new(),
            rows_written: 0,
            pictures_embedded: 0,
            skipped_images: Vec::new(),
        }
    }

    /// Compress photos with `compressor`; without one, photos are ignored
    pub fn with_compressor(mut self, compressor: &'a dyn ImageCompressor) -> Self {
        self.compressor = Some(compressor);
        self
    }

    pub fn options(&self) -> &'a ExportOptions {
        self.options
    }

    /// Add a scaffolded report sheet
    pub fn new_sheet(&mut self, sheet_name: &str, title: &str, widths: &[f64]) -> Result<ReportSheet> {
        let layout = SheetLayout {
            column_widths: widths,
            banner_text: &self.options.banner_text,
            generated_at: self.generated_at,
        };
        Ok(new_report_sheet(
            &mut self.workbook,
            &self.registry,
            sheet_name,
            title,
            layout,
        )?)
    }

    /// The sheet and the style registry, borrowed together
    pub fn sheet_mut(&mut self, index: usize) -> Result<(&mut Worksheet, &StyleRegistry)> {
        let count = self.workbook.sheet_count();
        let sheet = self
            .workbook
            .worksheet_mut(index)
            .ok_or(fieldreport_core::Error::SheetOutOfBounds(index, count))?;
        Ok((sheet, &self.registry))
    }

    pub fn count_row(&mut self) {
        self.rows_written += 1;
    }

    /// Write `records` as a tabular sheet described by `schema`
    ///
    /// `records` pairs each record with its position in the caller's input,
    /// which keys the session's photo cache. A summary line, when given, goes
    /// directly above the header row.
    pub fn write_schema_sheet(
        &mut self,
        schema: &SheetSchema,
        title: &str,
        records: &[(usize, &DomainRecord)],
        summary: Option<&str>,
    ) -> Result<()> {
        let report = self.new_sheet(schema.sheet_name, title, &schema.widths())?;
        let photo_col = schema.photo_column();

        let mut row = {
            let (sheet, registry) = self.sheet_mut(report.index)?;
            let mut row = report.next_row;
            if let Some(text) = summary {
                row = write_summary_row(sheet, registry, row, text, schema.columns.len() as u16)?;
            }
            write_header_row(sheet, registry, row, &schema.labels())?
        };

        for (position, &(record_index, record)) in records.iter().enumerate() {
            self.options.check_cancelled()?;

            {
                let photo_row_height = self.options.photo_row_height;
                let (sheet, registry) = self.sheet_mut(report.index)?;
                if photo_col.is_some() {
                    sheet.set_row_height(row, photo_row_height)?;
                }

                let ctx = RowContext {
                    number: position + 1,
                    record,
                };
                let style = registry.style(StyleKind::DataCell);
                for (col, spec) in schema.columns.iter().enumerate() {
                    let col = col as u16;
                    let value = match spec.kind {
                        ColumnKind::Field(extract) => extract(&ctx),
                        ColumnKind::Photo => CellValue::Empty,
                    };
                    sheet.set_cell_value_at(row, col, value)?;
                    sheet.set_cell_style_at(row, col, style)?;
                }
            }

            if let (Some(col), Some(raw)) = (photo_col, record.photo.as_deref()) {
                if let Some(bytes) = self.photo_bytes(record_index, raw)? {
                    if embed(&mut self.workbook, report.index, &bytes, row, col, self.options) {
                        self.pictures_embedded += 1;
                    }
                }
            }

            self.rows_written += 1;
            row += 1;
        }

        Ok(())
    }

    /// Compressed bytes of a record's photo, compressing at most once per record
    fn photo_bytes(&mut self, record_index: usize, raw: &[u8]) -> Result<Option<Vec<u8>>> {
        if self.session.cached(record_index).is_some() {
            return self.session.load(record_index);
        }
        if self.failed_photos.contains(&record_index) {
            return Ok(None);
        }
        let Some(compressor) = self.compressor else {
            return Ok(None);
        };

        match compressor.compress(raw) {
            Ok(compressed) => {
                self.session.store(record_index, &compressed.bytes)?;
                Ok(Some(compressed.bytes))
            }
            Err(e) => {
                warn!(session = %self.session.id(), record_index, error = %e, "photo skipped");
                self.failed_photos.insert(record_index);
                self.skipped_images.push(SkippedImage {
                    record_index,
                    reason: e.to_string(),
                });
                Ok(None)
            }
        }
    }

    /// Save the document; the session's temp files go away with `self`
    pub fn finish(self) -> Result<ExportOutcome> {
        self.options.check_cancelled()?;

        let dir = &self.options.output_dir;
        fs::create_dir_all(dir)
            .map_err(|e| ExportError::io(ExportPhase::CreateOutputDir, dir, e))?;

        let (path, file) = claim_output_file(dir, self.prefix, self.generated_at)?;
        if let Err(e) = XlsxWriter::write_buffered(&self.workbook, file) {
            if let Err(remove) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %remove, "failed to remove partial output");
            }
            return Err(match e {
                XlsxError::Io(source) => ExportError::io(ExportPhase::Save, &path, source),
                other => ExportError::Xlsx(other),
            });
        }

        info!(
            session = %self.session.id(),
            kind = self.prefix,
            rows = self.rows_written,
            pictures = self.pictures_embedded,
            skipped = self.skipped_images.len(),
            path = %path.display(),
            "export finished"
        );

        Ok(ExportOutcome {
            path,
            rows_written: self.rows_written,
            pictures_embedded: self.pictures_embedded,
            skipped_images: self.skipped_images,
        })
    }
}

/// Exclusively create `<dir>/<prefix>_<yyyyMMdd_HHmmss>.xlsx`, moving on to
/// `_2`, `_3`, ... while the name is taken
///
/// The name is claimed with `create_new`, so concurrent exports stamped with
/// the same second never share a file.
pub fn claim_output_file(dir: &Path, prefix: &str, at: NaiveDateTime) -> Result<(PathBuf, File)> {
    let stem = format!("{}_{}", prefix, at.format("%Y%m%d_%H%M%S"));
    let mut n = 1u32;
    loop {
        let candidate = if n == 1 {
            dir.join(format!("{stem}.xlsx"))
        } else {
            dir.join(format!("{stem}_{n}.xlsx"))
        };
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(ExportError::io(ExportPhase::Save, &candidate, e)),
        }
    }
}
