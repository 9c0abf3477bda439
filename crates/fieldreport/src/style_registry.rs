//! The fixed vocabulary of report cell styles

use fieldreport_core::{BorderLineStyle, Color, HorizontalAlignment, Style, VerticalAlignment};

/// Kinds of cells a report is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKind {
    /// Corporate banner across the top of a sheet
    HeaderBanner,
    /// Report title row
    Title,
    /// Column labels, summary rows and template headers
    SectionBanner,
    /// Ordinary data cells
    DataCell,
}

impl StyleKind {
    pub const ALL: [StyleKind; 4] = [
        StyleKind::HeaderBanner,
        StyleKind::Title,
        StyleKind::SectionBanner,
        StyleKind::DataCell,
    ];

    fn build(self) -> Style {
        match self {
            StyleKind::HeaderBanner => Style::new()
                .bold(true)
                .font_size(16.0)
                .font_color(Color::WHITE)
                .fill_color(Color::NAVY)
                .horizontal_alignment(HorizontalAlignment::Center)
                .vertical_alignment(VerticalAlignment::Center)
                .border(BorderLineStyle::Thin, Color::BLACK),
            StyleKind::Title => Style::new()
                .bold(true)
                .font_size(14.0)
                .fill_color(Color::PALE_BLUE)
                .horizontal_alignment(HorizontalAlignment::Center)
                .vertical_alignment(VerticalAlignment::Center),
            StyleKind::SectionBanner => Style::new()
                .bold(true)
                .font_size(11.0)
                .fill_color(Color::LIGHT_GRAY)
                .border(BorderLineStyle::Thin, Color::BLACK)
                .horizontal_alignment(HorizontalAlignment::Center)
                .vertical_alignment(VerticalAlignment::Center)
                .wrap_text(true),
            StyleKind::DataCell => Style::new()
                .font_size(11.0)
                .border(BorderLineStyle::Thin, Color::BLACK)
                .horizontal_alignment(HorizontalAlignment::Left)
                .vertical_alignment(VerticalAlignment::Center)
                .wrap_text(true),
        }
    }

    fn slot(self) -> usize {
        match self {
            StyleKind::HeaderBanner => 0,
            StyleKind::Title => 1,
            StyleKind::SectionBanner => 2,
            StyleKind::DataCell => 3,
        }
    }
}

/// Styles for one document, each built once
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    styles: [Style; 4],
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self {
            styles: StyleKind::ALL.map(StyleKind::build),
        }
    }

    /// The style for `kind`; equal for every call on the same registry
    pub fn style(&self, kind: StyleKind) -> &Style {
        &self.styles[kind.slot()]
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldreport_core::FillStyle;

    #[test]
    fn test_deterministic() {
        let registry = StyleRegistry::new();
        for kind in StyleKind::ALL {
            assert_eq!(registry.style(kind), registry.style(kind));
            assert_eq!(registry.style(kind), StyleRegistry::new().style(kind));
        }
    }

    #[test]
    fn test_kinds_are_distinct() {
        let registry = StyleRegistry::new();
        for a in StyleKind::ALL {
            for b in StyleKind::ALL {
                if a != b {
                    assert_ne!(registry.style(a), registry.style(b), "{a:?} vs {b:?}");
                }
            }
        }
    }

    #[test]
    fn test_banner_style() {
        let registry = StyleRegistry::new();
        let banner = registry.style(StyleKind::HeaderBanner);
        assert!(banner.font.bold);
        assert_eq!(banner.font.size, 16.0);
        assert_eq!(banner.font.color, Color::WHITE);
        assert_eq!(banner.fill, FillStyle::Solid { color: Color::NAVY });
        assert!(!banner.border.is_empty());
    }

    #[test]
    fn test_data_cell_wraps() {
        let registry = StyleRegistry::new();
        let data = registry.style(StyleKind::DataCell);
        assert!(data.alignment.wrap_text);
        assert!(!data.font.bold);
        assert_eq!(data.alignment.horizontal, HorizontalAlignment::Left);
    }
}
