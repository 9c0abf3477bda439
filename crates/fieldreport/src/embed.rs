//! Placing compressed photos inside a single cell

use fieldreport_core::{
    column_width_to_pixels, Anchor, ImageId, Picture, Workbook, Worksheet, EMU_PER_PIXEL,
    EMU_PER_POINT, MAX_COLS, MAX_ROWS,
};
use tracing::warn;

use crate::options::ExportOptions;

/// Share of the cell width/height kept free on every side of a photo
pub const INSET_RATIO: f64 = 0.03;

/// Embed `bytes` in the cell at (`row`, `column`) of sheet `sheet_index`
///
/// The cell is grown to the configured photo size (never shrunk) and the
/// picture is anchored inside it with a small inset. Returns `false` and logs
/// a warning instead of failing when the picture cannot be placed.
pub fn embed(
    workbook: &mut Workbook,
    sheet_index: usize,
    bytes: &[u8],
    row: u32,
    column: u16,
    options: &ExportOptions,
) -> bool {
    if bytes.is_empty() {
        warn!(sheet_index, row, column, "not embedding empty image");
        return false;
    }
    if row >= MAX_ROWS || column >= MAX_COLS {
        warn!(sheet_index, row, column, "image position out of bounds");
        return false;
    }
    if workbook.worksheet(sheet_index).is_none() {
        warn!(sheet_index, "cannot embed image into unknown sheet");
        return false;
    }

    let image = match workbook.register_image(bytes.to_vec()) {
        Ok(id) => id,
        Err(e) => {
            warn!(sheet_index, row, column, error = %e, "image rejected by document");
            return false;
        }
    };

    let Some(sheet) = workbook.worksheet_mut(sheet_index) else {
        return false;
    };

    match place(sheet, image, row, column, options) {
        Ok(()) => true,
        Err(e) => {
            warn!(sheet_index, row, column, error = %e, "failed to place image");
            false
        }
    }
}

fn place(
    sheet: &mut Worksheet,
    image: ImageId,
    row: u32,
    column: u16,
    options: &ExportOptions,
) -> fieldreport_core::Result<()> {
    let width = sheet.ensure_column_width(column, options.photo_column_width)?;
    let height = sheet.ensure_row_height(row, options.photo_row_height)?;

    let cell_width_emu = column_width_to_pixels(width) * EMU_PER_PIXEL;
    let cell_height_emu = (height * EMU_PER_POINT as f64).round() as i64;
    let anchor = Anchor::in_cell(row, column, inset(cell_width_emu), inset(cell_height_emu));

    sheet.add_picture(Picture::new(image, anchor))
}

fn inset(extent_emu: i64) -> i64 {
    (extent_emu as f64 * INSET_RATIO).round() as i64
}
