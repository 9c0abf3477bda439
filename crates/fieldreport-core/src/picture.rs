//! Pictures placed on a worksheet

use crate::image::ImageId;

/// Placement of a picture on the cell grid
///
/// `start_*` is the cell holding the top-left corner and `end_*` is the
/// exclusive cell boundary of the bottom-right corner. The picture is inset
/// from the grid lines by `inset_x_emu` / `inset_y_emu` on every side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub start_col: u16,
    pub start_row: u32,
    pub end_col: u16,
    pub end_row: u32,
    pub inset_x_emu: i64,
    pub inset_y_emu: i64,
}

impl Anchor {
    /// Anchor confined to the single cell at (`row`, `col`)
    pub fn in_cell(row: u32, col: u16, inset_x_emu: i64, inset_y_emu: i64) -> Self {
        Self {
            start_col: col,
            start_row: row,
            end_col: col.saturating_add(1),
            end_row: row.saturating_add(1),
            inset_x_emu: inset_x_emu.max(0),
            inset_y_emu: inset_y_emu.max(0),
        }
    }

    /// Whether the picture covers exactly one cell
    pub fn spans_single_cell(&self) -> bool {
        self.end_col == self.start_col + 1 && self.end_row == self.start_row + 1
    }
}

/// An image from the workbook blob table, anchored on a sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub image: ImageId,
    pub anchor: Anchor,
}

impl Picture {
    pub fn new(image: ImageId, anchor: Anchor) -> Self {
        Self { image, anchor }
    }

    /// Row of the cell the picture sits in
    pub fn row(&self) -> u32 {
        self.anchor.start_row
    }

    /// Column of the cell the picture sits in
    pub fn col(&self) -> u16 {
        self.anchor.start_col
    }
}
