//! Style pool for deduplication

use super::Style;
use ahash::AHashMap;

/// Deduplicating store of the styles used by one sheet
///
/// Cells reference styles by index; each distinct [`Style`] value is stored
/// once. Index 0 is always the default style.
#[derive(Debug)]
pub struct StylePool {
    styles: Vec<Style>,
    index_map: AHashMap<Style, u32>,
}

impl StylePool {
    /// Create a new style pool with default style at index 0
    pub fn new() -> Self {
        let mut pool = Self {
            styles: Vec::with_capacity(8),
            index_map: AHashMap::with_capacity(8),
        };
        pool.get_or_insert(Style::default());
        pool
    }

    /// Return the index of `style`, adding it if it was not seen before
    pub fn get_or_insert(&mut self, style: Style) -> u32 {
        if let Some(&idx) = self.index_map.get(&style) {
            return idx;
        }

        let idx = self.styles.len() as u32;
        self.index_map.insert(style.clone(), idx);
        self.styles.push(style);
        idx
    }

    /// Get a style by index
    pub fn get(&self, index: u32) -> Option<&Style> {
        self.styles.get(index as usize)
    }

    /// Get the number of styles, including the default
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if the pool only has the default style
    pub fn is_empty(&self) -> bool {
        self.styles.len() <= 1
    }

    /// Iterate over all styles with their indices
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Style)> {
        self.styles.iter().enumerate().map(|(i, s)| (i as u32, s))
    }
}

impl Default for StylePool {
    fn default() -> Self {
        Self::new()
    }
}
