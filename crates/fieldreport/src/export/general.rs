//! General control export: one sheet, one row per record

use fieldreport_core::CellValue;

use super::{date, number, title, ColumnSpec, ExportContext, ExportOutcome, RowContext, SheetSchema};
use crate::error::Result;
use crate::options::ExportOptions;
use crate::photo::{ImageCompressor, JpegCompressor};
use crate::record::{DomainRecord, ReportMetadata};

/// File name prefix of general control documents
pub const GENERAL_CONTROL_PREFIX: &str = "GeneralControl";

const SHEET_NAME: &str = "General Control";

fn status(ctx: &RowContext<'_>) -> CellValue {
    CellValue::from(ctx.record.display_status())
}

fn schema(options: &ExportOptions) -> SheetSchema {
    SheetSchema {
        sheet_name: SHEET_NAME,
        columns: vec![
            ColumnSpec::field("No", 6.0, number),
            ColumnSpec::field("Title", 32.0, title),
            ColumnSpec::field("Date", 18.0, date),
            ColumnSpec::field("Status", 16.0, status),
            ColumnSpec::photo("Photo", options.photo_column_width),
        ],
    }
}

/// Export `records` as a general control report
pub fn export_general_control(
    records: &[DomainRecord],
    metadata: &ReportMetadata,
    options: &ExportOptions,
) -> Result<ExportOutcome> {
    let compressor = JpegCompressor::new(options.image);
    export_general_control_with(records, metadata, options, &compressor)
}

/// [`export_general_control`] with a caller-provided compressor
pub fn export_general_control_with(
    records: &[DomainRecord],
    metadata: &ReportMetadata,
    options: &ExportOptions,
    compressor: &dyn ImageCompressor,
) -> Result<ExportOutcome> {
    let mut ctx =
        ExportContext::new(GENERAL_CONTROL_PREFIX, options, records.len()).with_compressor(compressor);

    let rows: Vec<(usize, &DomainRecord)> = records.iter().enumerate().collect();
    ctx.write_schema_sheet(&schema(options), &metadata.title, &rows, None)?;

    ctx.finish()
}
