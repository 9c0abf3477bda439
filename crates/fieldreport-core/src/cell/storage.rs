//! Sparse cell storage
//!
//! Only non-empty cells are stored, in a row-major `BTreeMap` so the writer
//! can stream rows in order.

use std::collections::BTreeMap;

use super::CellValue;
use crate::cell::CellRange;
use crate::style::StylePool;

/// Complete data for a single cell
#[derive(Debug, Clone, Default)]
pub struct CellData {
    /// The cell's value
    pub value: CellValue,
    /// Index into the sheet's style pool (0 = default style)
    pub style_index: u32,
}

impl CellData {
    /// Create a new cell with a value and default style
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            style_index: 0,
        }
    }

    /// Create a new cell with a value and style
    pub fn with_style(value: CellValue, style_index: u32) -> Self {
        Self { value, style_index }
    }

    /// Check if this cell is effectively empty (no value and default style)
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.style_index == 0
    }
}

/// Sparse row-based storage for worksheet cells
///
/// Structure: `BTreeMap<row_index, BTreeMap<col_index, CellData>>`
#[derive(Debug)]
pub struct CellStorage {
    rows: BTreeMap<u32, BTreeMap<u16, CellData>>,

    /// Shared style pool for deduplication
    pub(crate) style_pool: StylePool,

    /// Default row height in points (default: 15.0)
    default_row_height: f64,

    /// Default column width in characters (default: 8.43)
    default_column_width: f64,

    row_heights: BTreeMap<u32, f64>,
    column_widths: BTreeMap<u16, f64>,
    merged_regions: Vec<CellRange>,
}

impl CellStorage {
    /// Create a new empty cell storage
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            style_pool: StylePool::new(),
            default_row_height: 15.0,
            default_column_width: 8.43,
            row_heights: BTreeMap::new(),
            column_widths: BTreeMap::new(),
            merged_regions: Vec::new(),
        }
    }

    /// Get a cell
    pub fn get(&self, row: u32, col: u16) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Get a mutable cell
    pub fn get_mut(&mut self, row: u32, col: u16) -> Option<&mut CellData> {
        self.rows.get_mut(&row).and_then(|r| r.get_mut(&col))
    }

    /// Store a cell, removing it when the data is empty
    pub fn set(&mut self, row: u32, col: u16, data: CellData) {
        if data.is_empty() {
            self.remove(row, col);
        } else {
            self.rows.entry(row).or_default().insert(col, data);
        }
    }

    /// Set just the cell value (preserving style)
    pub fn set_value(&mut self, row: u32, col: u16, value: CellValue) {
        let style_index = self.get(row, col).map_or(0, |c| c.style_index);
        self.set(row, col, CellData::with_style(value, style_index));
    }

    /// Set just the cell style (preserving value)
    pub fn set_style(&mut self, row: u32, col: u16, style_index: u32) {
        if let Some(cell) = self.get_mut(row, col) {
            cell.style_index = style_index;
        } else if style_index != 0 {
            self.set(row, col, CellData::with_style(CellValue::Empty, style_index));
        }
    }

    /// Remove a cell
    pub fn remove(&mut self, row: u32, col: u16) -> Option<CellData> {
        let row_map = self.rows.get_mut(&row)?;
        let removed = row_map.remove(&col);
        if row_map.is_empty() {
            self.rows.remove(&row);
        }
        removed
    }

    /// Check if storage is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over cells in a specific row
    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.rows
            .get(&row)
            .into_iter()
            .flat_map(|cols| cols.iter().map(|(&col, data)| (col, data)))
    }

    /// Iterate over row indices that have cells
    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.keys().copied()
    }

    /// Get default row height
    pub fn default_row_height(&self) -> f64 {
        self.default_row_height
    }

    /// Get row height (returns default if not customized)
    pub fn row_height(&self, row: u32) -> f64 {
        self.row_heights
            .get(&row)
            .copied()
            .unwrap_or(self.default_row_height)
    }

    /// Set custom row height
    pub fn set_row_height(&mut self, row: u32, height: f64) {
        if (height - self.default_row_height).abs() < 0.001 {
            self.row_heights.remove(&row);
        } else {
            self.row_heights.insert(row, height);
        }
    }

    /// Get column width (returns default if not customized)
    pub fn column_width(&self, col: u16) -> f64 {
        self.column_widths
            .get(&col)
            .copied()
            .unwrap_or(self.default_column_width)
    }

    /// Set custom column width
    pub fn set_column_width(&mut self, col: u16, width: f64) {
        if (width - self.default_column_width).abs() < 0.001 {
            self.column_widths.remove(&col);
        } else {
            self.column_widths.insert(col, width);
        }
    }

    /// All custom row heights
    pub fn custom_row_heights(&self) -> &BTreeMap<u32, f64> {
        &self.row_heights
    }

    /// All custom column widths
    pub fn custom_column_widths(&self) -> &BTreeMap<u16, f64> {
        &self.column_widths
    }

    /// Merged regions in declaration order
    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    /// Declare a merged region
    pub fn add_merged_region(&mut self, range: CellRange) {
        self.merged_regions.push(range);
    }

    /// Get the style pool
    pub fn style_pool(&self) -> &StylePool {
        &self.style_pool
    }

    /// Get the mutable style pool
    pub fn style_pool_mut(&mut self) -> &mut StylePool {
        &mut self.style_pool
    }
}

impl Default for CellStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut storage = CellStorage::new();
        storage.set_value(4, 2, CellValue::string("Valve"));

        assert_eq!(
            storage.get(4, 2).and_then(|c| c.value.as_string()),
            Some("Valve")
        );
        assert!(storage.get(0, 0).is_none());
        assert!(!storage.is_empty());
    }

    #[test]
    fn test_empty_value_removes_unstyled_cell() {
        let mut storage = CellStorage::new();
        storage.set_value(0, 0, CellValue::Number(1.0));
        storage.set_value(0, 0, CellValue::Empty);

        assert!(storage.is_empty());
    }

    #[test]
    fn test_style_only_cell_is_kept() {
        let mut storage = CellStorage::new();
        storage.set_style(1, 3, 2);

        let cell = storage.get(1, 3).unwrap();
        assert!(cell.value.is_empty());
        assert_eq!(cell.style_index, 2);
    }

    #[test]
    fn test_row_order() {
        let mut storage = CellStorage::new();
        storage.set_value(9, 1, CellValue::Number(1.0));
        storage.set_value(2, 4, CellValue::Number(2.0));
        storage.set_value(2, 0, CellValue::Number(3.0));

        assert_eq!(storage.row_indices().collect::<Vec<_>>(), vec![2, 9]);
        let cols: Vec<u16> = storage.iter_row(2).map(|(c, _)| c).collect();
        assert_eq!(cols, vec![0, 4]);
    }

    #[test]
    fn test_dimensions() {
        let mut storage = CellStorage::new();
        assert_eq!(storage.row_height(3), 15.0);
        storage.set_row_height(3, 150.0);
        assert_eq!(storage.custom_row_heights().get(&3), Some(&150.0));
        storage.set_row_height(3, 15.0);
        assert!(storage.custom_row_heights().is_empty());

        storage.set_column_width(5, 50.0);
        assert_eq!(storage.column_width(5), 50.0);
        assert_eq!(storage.column_width(6), 8.43);
    }
}
