//! Cell-related types
//!
//! - [`CellValue`] - The scalar stored in a cell
//! - [`CellAddress`] / [`CellRange`] - Locations and rectangular regions
//! - [`CellData`] / [`CellStorage`] - Sparse per-sheet storage

mod address;
mod storage;
mod value;

pub use address::{CellAddress, CellRange};
pub use storage::{CellData, CellStorage};
pub use value::CellValue;
