//! Report sheet scaffolding: banner, title, timestamp, header and summary rows
//!
//! Every function that writes rows returns the next free row; callers thread
//! that value through instead of tracking offsets themselves.

use chrono::NaiveDateTime;
use fieldreport_core::{CellRange, Workbook, Worksheet};

use crate::style_registry::{StyleKind, StyleRegistry};

/// Columns covered by the banner and title merges (A..F)
pub const BANNER_COLUMNS: u16 = 6;

/// Width given to the banner columns before the caller's widths apply
pub const DEFAULT_COLUMN_WIDTH: f64 = 18.0;

/// First row available to callers after the scaffolding
pub const FIRST_CONTENT_ROW: u32 = 5;

/// Timestamp format of the "Generated" row
pub const GENERATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Inputs of [`new_report_sheet`]
#[derive(Debug, Clone, Copy)]
pub struct SheetLayout<'a> {
    /// Widths for columns A, B, ... in character units
    pub column_widths: &'a [f64],
    pub banner_text: &'a str,
    pub generated_at: NaiveDateTime,
}

/// A freshly scaffolded sheet and its first free row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSheet {
    pub index: usize,
    pub next_row: u32,
}

/// Add a sheet with the banner, title and timestamp rows
///
/// Rows 0-1 hold the banner, row 2 the title, row 3 the timestamp, row 4
/// stays blank. The returned `next_row` is 5.
pub fn new_report_sheet(
    workbook: &mut Workbook,
    registry: &StyleRegistry,
    sheet_name: &str,
    title: &str,
    layout: SheetLayout<'_>,
) -> fieldreport_core::Result<ReportSheet> {
    let index = workbook.add_worksheet_with_name(sheet_name)?;
    let sheet = workbook
        .worksheet_mut(index)
        .ok_or(fieldreport_core::Error::SheetOutOfBounds(index, 0))?;

    for col in 0..BANNER_COLUMNS {
        sheet.set_column_width(col, DEFAULT_COLUMN_WIDTH)?;
    }
    for (col, width) in layout.column_widths.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }

    let last_col = BANNER_COLUMNS - 1;

    let banner = CellRange::from_indices(0, 0, 1, last_col);
    sheet.set_cell_value_at(0, 0, layout.banner_text)?;
    sheet.set_range_style(&banner, registry.style(StyleKind::HeaderBanner))?;
    sheet.merge_cells(&banner)?;

    let title_range = CellRange::from_indices(2, 0, 2, last_col);
    sheet.set_cell_value_at(2, 0, title)?;
    sheet.set_range_style(&title_range, registry.style(StyleKind::Title))?;
    sheet.merge_cells(&title_range)?;

    sheet.set_cell_value_at(
        3,
        0,
        format!("Generated: {}", layout.generated_at.format(GENERATED_FORMAT)),
    )?;

    Ok(ReportSheet {
        index,
        next_row: FIRST_CONTENT_ROW,
    })
}

/// Write column labels in the section banner style
pub fn write_header_row(
    sheet: &mut Worksheet,
    registry: &StyleRegistry,
    row: u32,
    labels: &[&str],
) -> fieldreport_core::Result<u32> {
    let style = registry.style(StyleKind::SectionBanner);
    for (col, label) in labels.iter().enumerate() {
        let col = col as u16;
        sheet.set_cell_value_at(row, col, *label)?;
        sheet.set_cell_style_at(row, col, style)?;
    }
    Ok(row + 1)
}

/// Write one line of text merged across the first `column_count` columns
pub fn write_summary_row(
    sheet: &mut Worksheet,
    registry: &StyleRegistry,
    row: u32,
    text: &str,
    column_count: u16,
) -> fieldreport_core::Result<u32> {
    let last_col = column_count.max(1) - 1;
    let range = CellRange::from_indices(row, 0, row, last_col);

    sheet.set_cell_value_at(row, 0, text)?;
    sheet.set_range_style(&range, registry.style(StyleKind::DataCell))?;
    if last_col > 0 {
        sheet.merge_cells(&range)?;
    }
    Ok(row + 1)
}
