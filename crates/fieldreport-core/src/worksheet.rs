//! Worksheet type

use std::collections::BTreeSet;

use crate::cell::{CellAddress, CellData, CellRange, CellStorage, CellValue};
use crate::column::ColumnSpan;
use crate::error::{Error, Result};
use crate::picture::Picture;
use crate::row::Row;
use crate::style::{Style, StylePool};
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
#[derive(Debug)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Cell storage, dimensions and merges
    cells: CellStorage,
    /// Pictures in insertion order
    pictures: Vec<Picture>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: CellStorage::new(),
            pictures: Vec::new(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    // === Cell Access ===

    /// Get a cell by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(row, col)
    }

    /// Get cell value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    /// Get cell value by address string (e.g., "B7")
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Look up a style in this sheet's pool
    pub fn style_by_index(&self, style_index: u32) -> Option<&Style> {
        self.cells.style_pool().get(style_index)
    }

    /// Get the style applied to a cell, if the cell exists
    pub fn cell_style_at(&self, row: u32, col: u16) -> Option<&Style> {
        let cell = self.cells.get(row, col)?;
        self.style_by_index(cell.style_index)
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by row and column indices
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.cells.set_value(row, col, value.into());
        Ok(())
    }

    /// Set a cell style by row and column indices
    pub fn set_cell_style_at(&mut self, row: u32, col: u16, style: &Style) -> Result<()> {
        self.validate_cell_position(row, col)?;
        let style_index = self.cells.style_pool_mut().get_or_insert(style.clone());
        self.cells.set_style(row, col, style_index);
        Ok(())
    }

    /// Apply a style to every cell of a range
    pub fn set_range_style(&mut self, range: &CellRange, style: &Style) -> Result<()> {
        self.validate_cell_position(range.end.row, range.end.col)?;
        let style_index = self.cells.style_pool_mut().get_or_insert(style.clone());
        for row in range.start.row..=range.end.row {
            for col in range.start.col..=range.end.col {
                self.cells.set_style(row, col, style_index);
            }
        }
        Ok(())
    }

    /// Rows that carry cells or a custom height, in ascending order
    pub fn rows(&self) -> Vec<Row<'_>> {
        let indices: BTreeSet<u32> = self
            .cells
            .row_indices()
            .chain(self.cells.custom_row_heights().keys().copied())
            .collect();

        indices
            .into_iter()
            .map(|index| {
                let height = self.cells.custom_row_heights().get(&index).copied();
                Row::new(index, height, self.cells.iter_row(index).collect())
            })
            .collect()
    }

    /// This sheet's style pool
    pub fn style_pool(&self) -> &StylePool {
        self.cells.style_pool()
    }

    // === Row/Column Dimensions ===

    /// Height of rows without a custom height, in points
    pub fn default_row_height(&self) -> f64 {
        self.cells.default_row_height()
    }

    /// Get row height in points
    pub fn row_height(&self, row: u32) -> f64 {
        self.cells.row_height(row)
    }

    /// Set row height in points
    pub fn set_row_height(&mut self, row: u32, height: f64) -> Result<()> {
        self.validate_cell_position(row, 0)?;
        self.cells.set_row_height(row, height);
        Ok(())
    }

    /// Raise the row to at least `min_height` points; never lowers it.
    /// Returns the resulting height.
    pub fn ensure_row_height(&mut self, row: u32, min_height: f64) -> Result<f64> {
        let current = self.row_height(row);
        if min_height > current {
            self.set_row_height(row, min_height)?;
            return Ok(min_height);
        }
        Ok(current)
    }

    /// Get column width in character units
    pub fn column_width(&self, col: u16) -> f64 {
        self.cells.column_width(col)
    }

    /// Set column width in character units
    pub fn set_column_width(&mut self, col: u16, width: f64) -> Result<()> {
        self.validate_cell_position(0, col)?;
        self.cells.set_column_width(col, width);
        Ok(())
    }

    /// Widen the column to at least `min_width`; never narrows it.
    /// Returns the resulting width.
    pub fn ensure_column_width(&mut self, col: u16, min_width: f64) -> Result<f64> {
        let current = self.column_width(col);
        if min_width > current {
            self.set_column_width(col, min_width)?;
            return Ok(min_width);
        }
        Ok(current)
    }

    /// Get all custom row heights
    pub fn custom_row_heights(&self) -> &std::collections::BTreeMap<u32, f64> {
        self.cells.custom_row_heights()
    }

    /// Get all custom column widths
    pub fn custom_column_widths(&self) -> &std::collections::BTreeMap<u16, f64> {
        self.cells.custom_column_widths()
    }

    /// Custom column widths collapsed into `<cols>` spans
    pub fn column_spans(&self) -> Vec<ColumnSpan> {
        ColumnSpan::from_widths(self.cells.custom_column_widths())
    }

    // === Merged Cells ===

    /// Get merged regions
    pub fn merged_regions(&self) -> &[CellRange] {
        self.cells.merged_regions()
    }

    /// Merge cells
    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        self.validate_cell_position(range.end.row, range.end.col)?;
        for existing in self.cells.merged_regions() {
            if range.overlaps(existing) {
                return Err(Error::MergedCellConflict(range.to_string()));
            }
        }
        self.cells.add_merged_region(*range);
        Ok(())
    }

    // === Pictures ===

    /// Place a picture on the sheet
    pub fn add_picture(&mut self, picture: Picture) -> Result<()> {
        self.validate_cell_position(picture.anchor.start_row, picture.anchor.start_col)?;
        self.pictures.push(picture);
        Ok(())
    }

    /// Pictures in insertion order
    pub fn pictures(&self) -> &[Picture] {
        &self.pictures
    }

    fn validate_cell_position(&self, row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
        }
        Ok(())
    }
}
