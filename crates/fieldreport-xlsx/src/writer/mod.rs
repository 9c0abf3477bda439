//! XLSX writer

use std::collections::BTreeMap;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use fieldreport_core::image::{ImageFormat, ImageId, ImageTable};
use fieldreport_core::{
    column_width_to_pixels, Anchor, CellAddress, CellValue, Workbook, Worksheet, EMU_PER_PIXEL,
    EMU_PER_POINT,
};
use zip::write::SimpleFileOptions;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::{escape_xml, XlsxStyleTable};

const REL_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    ///
    /// The package is assembled in memory and the file is written in one go,
    /// so a failed serialization never leaves a truncated file behind.
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let mut buffer = Cursor::new(Vec::new());
        Self::write(workbook, &mut buffer)?;
        std::fs::write(path, buffer.into_inner())?;
        Ok(())
    }

    /// Assemble the package in memory, then copy it into `writer` in one go
    ///
    /// For destinations opened by the caller, such as a file claimed with
    /// `create_new`. Nothing reaches `writer` when serialization fails.
    pub fn write_buffered<W: Write>(workbook: &Workbook, mut writer: W) -> XlsxResult<()> {
        let mut buffer = Cursor::new(Vec::new());
        Self::write(workbook, &mut buffer)?;
        writer.write_all(buffer.get_ref())?;
        writer.flush()?;
        Ok(())
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        if workbook.is_empty() {
            return Err(XlsxError::InvalidFormat(
                "workbook must contain at least one worksheet".into(),
            ));
        }

        let mut zip = zip::ZipWriter::new(writer);

        // Build a workbook-wide style table.
        let style_table = XlsxStyleTable::build(workbook);

        // Sheets with pictures get drawing parts, numbered in sheet order
        let drawings = DrawingPlan::new(workbook);

        Self::write_content_types(&mut zip, workbook, &drawings)?;
        Self::write_root_rels(&mut zip)?;
        Self::write_workbook_xml(&mut zip, workbook)?;
        Self::write_workbook_rels(&mut zip, workbook)?;
        Self::write_styles_xml(&mut zip, &style_table)?;

        let mut parts = 5;
        for (i, sheet) in workbook.worksheets().enumerate() {
            let drawing = drawings.number_for(i);
            Self::write_worksheet(&mut zip, sheet, i, &style_table, drawing)?;
            parts += 1;

            if let Some(n) = drawing {
                Self::write_worksheet_rels(&mut zip, i, n)?;
                Self::write_drawing(&mut zip, sheet, workbook.images(), n)?;
                parts += 3;
            }
        }

        for (id, blob) in workbook.images().iter() {
            zip.start_file(media_path(id, blob.format()), SimpleFileOptions::default())?;
            zip.write_all(blob.bytes())?;
            parts += 1;
        }

        zip.finish()?;
        log::debug!(
            "wrote xlsx package: {} parts, {} sheets, {} images, {} cell styles",
            parts,
            workbook.sheet_count(),
            workbook.images().len(),
            style_table.len()
        );
        Ok(())
    }

    fn write_content_types<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        drawings: &DrawingPlan,
    ) -> XlsxResult<()> {
        zip.start_file("[Content_Types].xml", SimpleFileOptions::default())?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>"#,
        );

        let mut formats: Vec<ImageFormat> = Vec::new();
        for (_, blob) in workbook.images().iter() {
            if !formats.contains(&blob.format()) {
                formats.push(blob.format());
            }
        }
        for format in formats {
            content.push_str(&format!(
                r#"
    <Default Extension="{}" ContentType="{}"/>"#,
                format.extension(),
                format.content_type()
            ));
        }

        content.push_str(
            r#"
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        for n in drawings.numbers() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/drawings/drawing{}.xml" ContentType="application/vnd.openxmlformats-officedocument.drawing+xml"/>"#,
                n
            ));
        }

        content.push_str("\n</Types>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_root_rels<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        zip.start_file("_rels/.rels", SimpleFileOptions::default())?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        zip.start_file("xl/workbook.xml", SimpleFileOptions::default())?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>"#,
        );

        for (i, sheet) in workbook.worksheets().enumerate() {
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(sheet.name()),
                i + 1,
                i + 1
            ));
        }

        content.push_str(
            r#"
    </sheets>
</workbook>"#,
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        zip.start_file("xl/_rels/workbook.xml.rels", SimpleFileOptions::default())?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }

        // Styles relationship
        let styles_rid = workbook.sheet_count() + 1;
        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            styles_rid
        ));

        content.push_str("\n</Relationships>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_styles_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        style_table: &XlsxStyleTable,
    ) -> XlsxResult<()> {
        zip.start_file("xl/styles.xml", SimpleFileOptions::default())?;
        let xml = style_table.to_styles_xml();
        zip.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_worksheet<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet: &Worksheet,
        index: usize,
        style_table: &XlsxStyleTable,
        drawing: Option<usize>,
    ) -> XlsxResult<()> {
        zip.start_file(
            format!("xl/worksheets/sheet{}.xml", index + 1),
            SimpleFileOptions::default(),
        )?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );

        content.push_str(&format!(
            "\n    <sheetFormatPr defaultRowHeight=\"{}\"/>",
            sheet.default_row_height()
        ));

        let spans = sheet.column_spans();
        if !spans.is_empty() {
            content.push_str("\n    <cols>");
            for span in spans {
                content.push_str(&format!(
                    "\n        <col min=\"{}\" max=\"{}\" width=\"{}\" customWidth=\"1\"/>",
                    span.min + 1,
                    span.max + 1,
                    span.width
                ));
            }
            content.push_str("\n    </cols>");
        }

        content.push_str("\n    <sheetData>");

        // Rows are sparse; height-only rows are kept so picture rows keep their size
        for row in sheet.rows() {
            let height_attr = row
                .height
                .map(|h| format!(" ht=\"{}\" customHeight=\"1\"", h))
                .unwrap_or_default();

            if row.is_empty() {
                content.push_str(&format!(
                    "\n        <row r=\"{}\"{}/>",
                    row.index + 1,
                    height_attr
                ));
                continue;
            }

            content.push_str(&format!(
                "\n        <row r=\"{}\"{}>",
                row.index + 1,
                height_attr
            ));

            for (col, cell) in &row.cells {
                let cell_ref = CellAddress::new(row.index, *col).to_a1_string();

                let xf_id = style_table.xf_id_for(index, cell.style_index);
                let style_attr = if xf_id != 0 {
                    format!(" s=\"{}\"", xf_id)
                } else {
                    String::new()
                };

                match &cell.value {
                    CellValue::Number(n) => {
                        content.push_str(&format!(
                            "\n            <c r=\"{}\"{}><v>{}</v></c>",
                            cell_ref, style_attr, n
                        ));
                    }
                    CellValue::String(s) => {
                        content.push_str(&format!(
                            "\n            <c r=\"{}\"{} t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                            cell_ref,
                            style_attr,
                            escape_xml(s)
                        ));
                    }
                    CellValue::Empty => {
                        // Preserve style-only cells
                        if xf_id != 0 {
                            content.push_str(&format!(
                                "\n            <c r=\"{}\"{}/>",
                                cell_ref, style_attr
                            ));
                        }
                    }
                }
            }

            content.push_str("\n        </row>");
        }

        content.push_str("\n    </sheetData>");

        let merged_regions = sheet.merged_regions();
        if !merged_regions.is_empty() {
            content.push_str(&format!(
                "\n    <mergeCells count=\"{}\">",
                merged_regions.len()
            ));
            for range in merged_regions {
                content.push_str(&format!("\n        <mergeCell ref=\"{}\"/>", range));
            }
            content.push_str("\n    </mergeCells>");
        }

        content.push_str(
            "\n    <pageMargins left=\"0.7\" right=\"0.7\" top=\"0.75\" bottom=\"0.75\" header=\"0.3\" footer=\"0.3\"/>",
        );

        if drawing.is_some() {
            content.push_str("\n    <drawing r:id=\"rId1\"/>");
        }

        content.push_str("\n</worksheet>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write worksheet relationships file pointing at its drawing
    fn write_worksheet_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet_index: usize,
        drawing: usize,
    ) -> XlsxResult<()> {
        zip.start_file(
            format!("xl/worksheets/_rels/sheet{}.xml.rels", sheet_index + 1),
            SimpleFileOptions::default(),
        )?;

        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="{}" Target="../drawings/drawing{}.xml"/>
</Relationships>"#,
            REL_DRAWING, drawing
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write a drawing part and its relationships for one sheet's pictures
    fn write_drawing<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet: &Worksheet,
        images: &ImageTable,
        drawing: usize,
    ) -> XlsxResult<()> {
        // One relationship per distinct image used on this sheet
        let mut rel_ids: BTreeMap<ImageId, usize> = BTreeMap::new();
        for picture in sheet.pictures() {
            let next = rel_ids.len() + 1;
            rel_ids.entry(picture.image).or_insert(next);
        }

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );

        for (i, picture) in sheet.pictures().iter().enumerate() {
            let geometry = AnchorGeometry::resolve(sheet, &picture.anchor);
            let rel_id = rel_ids.get(&picture.image).copied().unwrap_or(1);

            content.push_str(&format!(
                r#"
    <xdr:twoCellAnchor editAs="oneCell">
        <xdr:from><xdr:col>{}</xdr:col><xdr:colOff>{}</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>{}</xdr:rowOff></xdr:from>
        <xdr:to><xdr:col>{}</xdr:col><xdr:colOff>{}</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>{}</xdr:rowOff></xdr:to>
        <xdr:pic>
            <xdr:nvPicPr><xdr:cNvPr id="{}" name="Picture {}"/><xdr:cNvPicPr><a:picLocks noChangeAspect="1"/></xdr:cNvPicPr></xdr:nvPicPr>
            <xdr:blipFill><a:blip r:embed="rId{}"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill>
            <xdr:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></xdr:spPr>
        </xdr:pic>
        <xdr:clientData/>
    </xdr:twoCellAnchor>"#,
                picture.anchor.start_col,
                picture.anchor.inset_x_emu,
                picture.anchor.start_row,
                picture.anchor.inset_y_emu,
                geometry.to_col,
                geometry.to_col_off,
                geometry.to_row,
                geometry.to_row_off,
                i + 2,
                i + 1,
                rel_id,
                geometry.extent_x,
                geometry.extent_y
            ));
        }

        content.push_str("\n</xdr:wsDr>");

        zip.start_file(
            format!("xl/drawings/drawing{}.xml", drawing),
            SimpleFileOptions::default(),
        )?;
        zip.write_all(content.as_bytes())?;

        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        let mut by_rel: Vec<(usize, ImageId)> = rel_ids.into_iter().map(|(id, r)| (r, id)).collect();
        by_rel.sort();
        for (rel_id, image) in by_rel {
            let blob = images.get(image).ok_or_else(|| {
                XlsxError::InvalidFormat(format!(
                    "sheet '{}' references unknown image {}",
                    sheet.name(),
                    image.0
                ))
            })?;
            rels.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="{}" Target="../{}"/>"#,
                rel_id,
                REL_IMAGE,
                media_path(image, blob.format()).trim_start_matches("xl/")
            ));
        }
        rels.push_str("\n</Relationships>");

        zip.start_file(
            format!("xl/drawings/_rels/drawing{}.xml.rels", drawing),
            SimpleFileOptions::default(),
        )?;
        zip.write_all(rels.as_bytes())?;
        Ok(())
    }
}

fn media_path(id: ImageId, format: ImageFormat) -> String {
    format!("xl/media/image{}.{}", id.index() + 1, format.extension())
}

/// Drawing part numbers (1-based) for sheets that carry pictures
struct DrawingPlan {
    by_sheet: Vec<Option<usize>>,
}

impl DrawingPlan {
    fn new(workbook: &Workbook) -> Self {
        let mut next = 0;
        let by_sheet = workbook
            .worksheets()
            .map(|sheet| {
                if sheet.pictures().is_empty() {
                    None
                } else {
                    next += 1;
                    Some(next)
                }
            })
            .collect();
        Self { by_sheet }
    }

    fn number_for(&self, sheet_index: usize) -> Option<usize> {
        self.by_sheet.get(sheet_index).copied().flatten()
    }

    fn numbers(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_sheet.iter().filter_map(|n| *n)
    }
}

/// The `to` marker and extent of an anchor, in EMU
#[derive(Debug, PartialEq)]
struct AnchorGeometry {
    to_col: u16,
    to_col_off: i64,
    to_row: u32,
    to_row_off: i64,
    extent_x: i64,
    extent_y: i64,
}

impl AnchorGeometry {
    /// The bottom-right corner sits inside the last covered cell, inset from
    /// its right and bottom edges, so the picture never touches grid lines.
    fn resolve(sheet: &Worksheet, anchor: &Anchor) -> Self {
        let to_col = anchor.end_col.saturating_sub(1).max(anchor.start_col);
        let to_row = anchor.end_row.saturating_sub(1).max(anchor.start_row);

        let col_emu = |col: u16| column_width_to_pixels(sheet.column_width(col)) * EMU_PER_PIXEL;
        let row_emu = |row: u32| (sheet.row_height(row) * EMU_PER_POINT as f64).round() as i64;

        let to_col_off = (col_emu(to_col) - anchor.inset_x_emu).max(0);
        let to_row_off = (row_emu(to_row) - anchor.inset_y_emu).max(0);

        let width: i64 = (anchor.start_col..to_col).map(col_emu).sum::<i64>() + to_col_off
            - anchor.inset_x_emu;
        let height: i64 = (anchor.start_row..to_row).map(row_emu).sum::<i64>() + to_row_off
            - anchor.inset_y_emu;

        Self {
            to_col,
            to_col_off,
            to_row,
            to_row_off,
            extent_x: width.max(0),
            extent_y: height.max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldreport_core::Picture;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_anchor_geometry_stays_inside_cell() {
        let mut sheet = Worksheet::new("Photos");
        sheet.set_column_width(5, 50.0).unwrap();
        sheet.set_row_height(6, 150.0).unwrap();

        // 50 chars -> 355px -> 3_381_375 EMU; 150pt -> 1_905_000 EMU
        let anchor = Anchor::in_cell(6, 5, 101_441, 57_150);
        let geometry = AnchorGeometry::resolve(&sheet, &anchor);

        assert_eq!(
            geometry,
            AnchorGeometry {
                to_col: 5,
                to_col_off: 3_381_375 - 101_441,
                to_row: 6,
                to_row_off: 1_905_000 - 57_150,
                extent_x: 3_381_375 - 2 * 101_441,
                extent_y: 1_905_000 - 2 * 57_150,
            }
        );
    }

    #[test]
    fn test_drawing_plan_numbers_only_sheets_with_pictures() {
        let mut wb = Workbook::empty();
        wb.add_worksheet_with_name("Plain").unwrap();
        let photos = wb.add_worksheet_with_name("Photos").unwrap();
        let id = wb.register_image(vec![0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        wb.worksheet_mut(photos)
            .unwrap()
            .add_picture(Picture::new(id, Anchor::in_cell(0, 0, 0, 0)))
            .unwrap();

        let plan = DrawingPlan::new(&wb);
        assert_eq!(plan.number_for(0), None);
        assert_eq!(plan.number_for(1), Some(1));
        assert_eq!(plan.numbers().collect::<Vec<_>>(), vec![1]);
    }
}
