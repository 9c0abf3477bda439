//! Row view used when serializing a sheet

use crate::cell::CellData;

/// A populated row: its index, custom height and cells in column order
#[derive(Debug)]
pub struct Row<'a> {
    /// Row index (0-based)
    pub index: u32,
    /// Custom height in points (None = default)
    pub height: Option<f64>,
    /// Cells in this row
    pub cells: Vec<(u16, &'a CellData)>,
}

impl<'a> Row<'a> {
    pub fn new(index: u32, height: Option<f64>, cells: Vec<(u16, &'a CellData)>) -> Self {
        Self {
            index,
            height,
            cells,
        }
    }

    /// Get a cell by column index
    pub fn cell(&self, col: u16) -> Option<&CellData> {
        self.cells
            .iter()
            .find(|(c, _)| *c == col)
            .map(|(_, data)| *data)
    }

    /// Whether the row carries no cells (it may still have a custom height)
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
