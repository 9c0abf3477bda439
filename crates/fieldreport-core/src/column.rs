//! Column width spans

use std::collections::BTreeMap;

/// A run of adjacent columns sharing the same width, as written to `<cols>`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpan {
    /// First column (0-based, inclusive)
    pub min: u16,
    /// Last column (0-based, inclusive)
    pub max: u16,
    /// Width in character units
    pub width: f64,
}

impl ColumnSpan {
    /// Collapse per-column widths into spans of adjacent equal widths
    pub fn from_widths(widths: &BTreeMap<u16, f64>) -> Vec<ColumnSpan> {
        let mut spans: Vec<ColumnSpan> = Vec::new();

        for (&col, &width) in widths {
            match spans.last_mut() {
                Some(last) if last.max + 1 == col && last.width == width => last.max = col,
                _ => spans.push(ColumnSpan {
                    min: col,
                    max: col,
                    width,
                }),
            }
        }

        spans
    }
}
