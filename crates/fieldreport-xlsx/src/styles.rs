//! styles.xml generation
//!
//! Each worksheet dedups its own styles; at write time those per-sheet pools
//! are merged into one workbook-wide `cellXfs` table and every cell's local
//! style index is remapped to its global `xfId`.

use std::collections::HashMap;

use fieldreport_core::style::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, Color, FillStyle, FontStyle,
    HorizontalAlignment, PatternType, Style, VerticalAlignment,
};
use fieldreport_core::Workbook;

#[derive(Debug)]
pub(crate) struct XlsxStyleTable {
    /// Global, deduplicated styles. Index corresponds to the cellXfs index (xfId).
    styles: Vec<Style>,
    /// Per-worksheet mapping: local worksheet style index -> global xfId.
    sheet_maps: Vec<HashMap<u32, u32>>,
}

#[derive(Debug, Clone, Copy)]
struct ResolvedXfIds {
    font_id: u32,
    fill_id: u32,
    border_id: u32,
}

impl XlsxStyleTable {
    pub(crate) fn build(workbook: &Workbook) -> Self {
        let mut styles: Vec<Style> = Vec::new();
        let mut style_to_xf: HashMap<Style, u32> = HashMap::new();

        // Index 0 is always default style
        let default = Style::default();
        styles.push(default.clone());
        style_to_xf.insert(default, 0);

        let mut sheet_maps: Vec<HashMap<u32, u32>> = Vec::with_capacity(workbook.sheet_count());

        for sheet in workbook.worksheets() {
            let mut map: HashMap<u32, u32> = HashMap::new();

            for (local_idx, style) in sheet.style_pool().iter() {
                let xf_id = *style_to_xf.entry(style.clone()).or_insert_with(|| {
                    styles.push(style.clone());
                    (styles.len() - 1) as u32
                });
                map.insert(local_idx, xf_id);
            }

            sheet_maps.push(map);
        }

        Self { styles, sheet_maps }
    }

    pub(crate) fn xf_id_for(&self, sheet_index: usize, local_style_index: u32) -> u32 {
        self.sheet_maps
            .get(sheet_index)
            .and_then(|m| m.get(&local_style_index).copied())
            .unwrap_or(0)
    }

    pub(crate) fn len(&self) -> usize {
        self.styles.len()
    }

    pub(crate) fn to_styles_xml(&self) -> String {
        let mut font_ids: HashMap<FontStyle, u32> = HashMap::new();
        let mut fonts: Vec<FontStyle> = Vec::new();

        let default_font = FontStyle::default();
        fonts.push(default_font.clone());
        font_ids.insert(default_font, 0);

        let mut fill_ids: HashMap<FillStyle, u32> = HashMap::new();
        // Excel requires the first two fills to be: none and gray125
        let mut fills: Vec<FillStyle> = vec![
            FillStyle::None,
            FillStyle::Pattern {
                pattern: PatternType::Gray125,
                foreground: Color::Auto,
                background: Color::Auto,
            },
        ];
        fill_ids.insert(FillStyle::None, 0);

        let mut border_ids: HashMap<BorderStyle, u32> = HashMap::new();
        let mut borders: Vec<BorderStyle> = Vec::new();
        let default_border = BorderStyle::default();
        borders.push(default_border.clone());
        border_ids.insert(default_border, 0);

        let mut resolved: Vec<ResolvedXfIds> = Vec::with_capacity(self.styles.len());

        for style in &self.styles {
            let font_id = *font_ids.entry(style.font.clone()).or_insert_with(|| {
                fonts.push(style.font.clone());
                (fonts.len() - 1) as u32
            });

            let fill_id = *fill_ids.entry(style.fill.clone()).or_insert_with(|| {
                fills.push(style.fill.clone());
                (fills.len() - 1) as u32
            });

            let border_id = *border_ids.entry(style.border.clone()).or_insert_with(|| {
                borders.push(style.border.clone());
                (borders.len() - 1) as u32
            });

            resolved.push(ResolvedXfIds {
                font_id,
                fill_id,
                border_id,
            });
        }

        let mut xml = String::new();
        xml.push_str(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        xml.push_str(&format!("\n  <fonts count=\"{}\">", fonts.len()));
        for font in &fonts {
            xml.push_str("\n    ");
            xml.push_str(&write_font(font));
        }
        xml.push_str("\n  </fonts>");

        xml.push_str(&format!("\n  <fills count=\"{}\">", fills.len()));
        for fill in &fills {
            xml.push_str("\n    ");
            xml.push_str(&write_fill(fill));
        }
        xml.push_str("\n  </fills>");

        xml.push_str(&format!("\n  <borders count=\"{}\">", borders.len()));
        for border in &borders {
            xml.push_str("\n    ");
            xml.push_str(&write_border(border));
        }
        xml.push_str("\n  </borders>");

        xml.push_str(
            r#"
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>"#,
        );

        xml.push_str(&format!("\n  <cellXfs count=\"{}\">", self.styles.len()));
        for (style, ids) in self.styles.iter().zip(&resolved) {
            xml.push_str("\n    ");
            xml.push_str(&write_xf(style, *ids));
        }
        xml.push_str("\n  </cellXfs>");

        xml.push_str(
            r#"
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
  <dxfs count="0"/>
  <tableStyles count="0" defaultTableStyle="TableStyleMedium9" defaultPivotStyle="PivotStyleLight16"/>
</styleSheet>"#,
        );
        xml
    }
}

/// Escape text for XML content and attribute values
///
/// Characters XML 1.0 cannot carry (C0 controls other than tab, LF and CR,
/// U+FFFE and U+FFFF) are written as Excel's `_xHHHH_` escapes. A literal
/// `_xHHHH_` in the input gets its underscore escaped as `_x005F_` so that it
/// reads back unchanged.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '_' if looks_like_excel_escape(&s[i..]) => out.push_str("_x005F_"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {
                out.push_str(&format!("_x{:04X}_", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

/// `_xHHHH_` at the start of `s`
fn looks_like_excel_escape(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 7
        && b[0] == b'_'
        && b[1] == b'x'
        && b[2..6].iter().all(u8::is_ascii_hexdigit)
        && b[6] == b'_'
}

fn color_attrs(color: &Color) -> String {
    match color {
        Color::Auto => " indexed=\"64\"".to_string(),
        other => format!(" rgb=\"{}\"", other.to_argb_hex()),
    }
}

fn write_font(font: &FontStyle) -> String {
    let mut s = String::from("<font>");
    if font.bold {
        s.push_str("<b/>");
    }
    if font.italic {
        s.push_str("<i/>");
    }
    s.push_str(&format!("<sz val=\"{}\"/>", font.size));
    if !font.color.is_auto() {
        s.push_str(&format!("<color{}/>", color_attrs(&font.color)));
    }
    s.push_str(&format!("<name val=\"{}\"/>", escape_xml(&font.name)));
    s.push_str("<family val=\"2\"/>");
    s.push_str("</font>");
    s
}

fn pattern_type_to_str(p: PatternType) -> &'static str {
    match p {
        PatternType::None => "none",
        PatternType::Solid => "solid",
        PatternType::Gray125 => "gray125",
    }
}

fn write_fill(fill: &FillStyle) -> String {
    match fill {
        FillStyle::None => "<fill><patternFill patternType=\"none\"/></fill>".to_string(),
        FillStyle::Solid { color } => format!(
            "<fill><patternFill patternType=\"solid\"><fgColor{}/><bgColor indexed=\"64\"/></patternFill></fill>",
            color_attrs(color)
        ),
        FillStyle::Pattern {
            pattern,
            foreground,
            background,
        } => {
            if foreground.is_auto() && background.is_auto() {
                format!(
                    "<fill><patternFill patternType=\"{}\"/></fill>",
                    pattern_type_to_str(*pattern)
                )
            } else {
                format!(
                    "<fill><patternFill patternType=\"{}\"><fgColor{}/><bgColor{}/></patternFill></fill>",
                    pattern_type_to_str(*pattern),
                    color_attrs(foreground),
                    color_attrs(background)
                )
            }
        }
    }
}

fn border_style_to_str(s: BorderLineStyle) -> Option<&'static str> {
    match s {
        BorderLineStyle::None => None,
        BorderLineStyle::Thin => Some("thin"),
        BorderLineStyle::Medium => Some("medium"),
        BorderLineStyle::Thick => Some("thick"),
        BorderLineStyle::Hair => Some("hair"),
    }
}

fn write_border_edge(tag: &str, edge: &Option<BorderEdge>) -> String {
    let Some((edge, style_attr)) = edge
        .as_ref()
        .and_then(|e| border_style_to_str(e.style).map(|s| (e, s)))
    else {
        return format!("<{tag}/>");
    };
    format!(
        "<{tag} style=\"{}\"><color{}/></{tag}>",
        style_attr,
        color_attrs(&edge.color)
    )
}

fn write_border(border: &BorderStyle) -> String {
    let mut s = String::from("<border>");
    s.push_str(&write_border_edge("left", &border.left));
    s.push_str(&write_border_edge("right", &border.right));
    s.push_str(&write_border_edge("top", &border.top));
    s.push_str(&write_border_edge("bottom", &border.bottom));
    s.push_str("<diagonal/>");
    s.push_str("</border>");
    s
}

fn horiz_to_str(h: HorizontalAlignment) -> &'static str {
    match h {
        HorizontalAlignment::General => "general",
        HorizontalAlignment::Left => "left",
        HorizontalAlignment::Center => "center",
        HorizontalAlignment::Right => "right",
    }
}

fn vert_to_str(v: VerticalAlignment) -> &'static str {
    match v {
        VerticalAlignment::Top => "top",
        VerticalAlignment::Center => "center",
        VerticalAlignment::Bottom => "bottom",
    }
}

fn write_alignment(al: &Alignment) -> String {
    let default = Alignment::default();
    if al == &default {
        return String::new();
    }

    let mut s = String::from("<alignment");
    if al.horizontal != default.horizontal {
        s.push_str(&format!(" horizontal=\"{}\"", horiz_to_str(al.horizontal)));
    }
    if al.vertical != default.vertical {
        s.push_str(&format!(" vertical=\"{}\"", vert_to_str(al.vertical)));
    }
    if al.wrap_text {
        s.push_str(" wrapText=\"1\"");
    }
    s.push_str("/>");
    s
}

fn write_xf(style: &Style, ids: ResolvedXfIds) -> String {
    let mut attrs = String::new();
    if style.font != FontStyle::default() {
        attrs.push_str(" applyFont=\"1\"");
    }
    if !style.fill.is_none() {
        attrs.push_str(" applyFill=\"1\"");
    }
    if !style.border.is_empty() {
        attrs.push_str(" applyBorder=\"1\"");
    }
    if style.alignment != Alignment::default() {
        attrs.push_str(" applyAlignment=\"1\"");
    }

    let mut s = format!(
        "<xf numFmtId=\"0\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"{}",
        ids.font_id, ids.fill_id, ids.border_id, attrs
    );

    let alignment_xml = write_alignment(&style.alignment);
    if alignment_xml.is_empty() {
        s.push_str("/>");
        return s;
    }

    s.push('>');
    s.push_str(&alignment_xml);
    s.push_str("</xf>");
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & <b> \"c\" 'd'"), "a &amp; &lt;b&gt; &quot;c&quot; &apos;d&apos;");
        assert_eq!(escape_xml("Pump\u{1}"), "Pump_x0001_");
        assert_eq!(escape_xml("bad\u{8}\t\n\r"), "bad_x0008_\t\n\r");
        assert_eq!(escape_xml("\u{FFFF}"), "_xFFFF_");
        assert_eq!(escape_xml("_x0041_ and _x1"), "_x005F_x0041_ and _x1");
        assert_eq!(escape_xml("Überprüfung"), "Überprüfung");
    }

    #[test]
    fn test_styles_merged_across_sheets() {
        let mut wb = Workbook::empty();
        let a = wb.add_worksheet_with_name("A").unwrap();
        let b = wb.add_worksheet_with_name("B").unwrap();

        let bold = Style::new().bold(true);
        let banner = Style::new().fill_color(Color::NAVY);
        wb.worksheet_mut(a).unwrap().set_cell_style_at(0, 0, &bold).unwrap();
        wb.worksheet_mut(b).unwrap().set_cell_style_at(0, 0, &banner).unwrap();
        wb.worksheet_mut(b).unwrap().set_cell_style_at(1, 0, &bold).unwrap();

        let table = XlsxStyleTable::build(&wb);
        assert_eq!(table.len(), 3);

        let bold_a = table.xf_id_for(a, wb.worksheet(a).unwrap().cell_at(0, 0).unwrap().style_index);
        let bold_b = table.xf_id_for(b, wb.worksheet(b).unwrap().cell_at(1, 0).unwrap().style_index);
        assert_eq!(bold_a, bold_b);
        assert_eq!(table.xf_id_for(b, 0), 0);
    }

    #[test]
    fn test_styles_xml_tables() {
        let mut wb = Workbook::empty();
        let idx = wb.add_worksheet_with_name("A").unwrap();
        let style = Style::new()
            .bold(true)
            .fill_color(Color::LIGHT_GRAY)
            .border(BorderLineStyle::Thin, Color::BLACK)
            .horizontal_alignment(HorizontalAlignment::Center)
            .wrap_text(true);
        wb.worksheet_mut(idx).unwrap().set_cell_style_at(0, 0, &style).unwrap();

        let xml = XlsxStyleTable::build(&wb).to_styles_xml();
        assert!(xml.contains("<fills count=\"3\">"));
        assert!(xml.contains("<fgColor rgb=\"FFD9D9D9\"/>"));
        assert!(xml.contains("<left style=\"thin\"><color rgb=\"FF000000\"/></left>"));
        assert!(xml.contains("<cellXfs count=\"2\">"));
        assert!(xml.contains("<alignment horizontal=\"center\" wrapText=\"1\"/>"));
    }
}
