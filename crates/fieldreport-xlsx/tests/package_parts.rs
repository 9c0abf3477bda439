//! Write workbooks and inspect the parts of the produced package

use std::io::{Cursor, Read};

use fieldreport_core::{Anchor, CellRange, Picture, Style, Workbook};
use fieldreport_xlsx::{XlsxError, XlsxWriter};
use pretty_assertions::assert_eq;

const JPEG: [u8; 6] = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

fn part_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}

fn one_sheet() -> Workbook {
    let mut wb = Workbook::empty();
    wb.add_worksheet_with_name("Sheet1").unwrap();
    wb
}

fn write(wb: &Workbook) -> Vec<u8> {
    let mut buf = Vec::new();
    XlsxWriter::write(wb, Cursor::new(&mut buf)).unwrap();
    buf
}

#[test]
fn test_cells_dimensions_and_merges() {
    let mut wb = Workbook::empty();
    let idx = wb.add_worksheet_with_name("Checks").unwrap();
    let sheet = wb.worksheet_mut(idx).unwrap();
    sheet.set_cell_value_at(0, 0, "Tank <A> & B").unwrap();
    sheet.set_cell_style_at(0, 0, &Style::new().bold(true)).unwrap();
    sheet.set_cell_value_at(1, 1, 42).unwrap();
    sheet.merge_cells(&CellRange::from_indices(0, 0, 0, 5)).unwrap();
    sheet.set_column_width(0, 6.0).unwrap();
    sheet.set_column_width(1, 6.0).unwrap();
    sheet.set_column_width(2, 30.0).unwrap();
    sheet.set_row_height(4, 150.0).unwrap();

    let buf = write(&wb);
    let xml = read_part(&buf, "xl/worksheets/sheet1.xml");

    assert!(xml.contains("<col min=\"1\" max=\"2\" width=\"6\" customWidth=\"1\"/>"));
    assert!(xml.contains("<col min=\"3\" max=\"3\" width=\"30\" customWidth=\"1\"/>"));
    assert!(xml.contains("Tank &lt;A&gt; &amp; B"));
    assert!(xml.contains("<c r=\"B2\"><v>42</v></c>"));
    assert!(xml.contains("<row r=\"5\" ht=\"150\" customHeight=\"1\"/>"));
    assert!(xml.contains("<mergeCell ref=\"A1:F1\"/>"));
    assert!(!xml.contains("<drawing"));

    let workbook_xml = read_part(&buf, "xl/workbook.xml");
    assert!(workbook_xml.contains("<sheet name=\"Checks\" sheetId=\"1\" r:id=\"rId1\"/>"));
}

#[test]
fn test_pictures_share_one_media_part() {
    let mut wb = Workbook::empty();
    let first = wb.add_worksheet_with_name("Work Orders").unwrap();
    let second = wb.add_worksheet_with_name("To-Do").unwrap();

    let a = wb.register_image(JPEG.to_vec()).unwrap();
    let b = wb.register_image(JPEG.to_vec()).unwrap();
    assert_eq!(a, b);

    for idx in [first, second] {
        let sheet = wb.worksheet_mut(idx).unwrap();
        sheet.set_row_height(6, 150.0).unwrap();
        sheet.set_column_width(5, 50.0).unwrap();
        sheet
            .add_picture(Picture::new(a, Anchor::in_cell(6, 5, 101_441, 57_150)))
            .unwrap();
    }

    let buf = write(&wb);

    assert_eq!(
        part_names(&buf),
        vec![
            "[Content_Types].xml",
            "_rels/.rels",
            "xl/_rels/workbook.xml.rels",
            "xl/drawings/_rels/drawing1.xml.rels",
            "xl/drawings/_rels/drawing2.xml.rels",
            "xl/drawings/drawing1.xml",
            "xl/drawings/drawing2.xml",
            "xl/media/image1.jpeg",
            "xl/styles.xml",
            "xl/workbook.xml",
            "xl/worksheets/_rels/sheet1.xml.rels",
            "xl/worksheets/_rels/sheet2.xml.rels",
            "xl/worksheets/sheet1.xml",
            "xl/worksheets/sheet2.xml",
        ]
    );

    let sheet_xml = read_part(&buf, "xl/worksheets/sheet2.xml");
    assert!(sheet_xml.contains("<drawing r:id=\"rId1\"/>"));

    let drawing = read_part(&buf, "xl/drawings/drawing1.xml");
    assert!(drawing.contains(
        "<xdr:from><xdr:col>5</xdr:col><xdr:colOff>101441</xdr:colOff><xdr:row>6</xdr:row><xdr:rowOff>57150</xdr:rowOff></xdr:from>"
    ));
    assert!(drawing.contains("<xdr:to><xdr:col>5</xdr:col>"));
    assert!(drawing.contains("<xdr:row>6</xdr:row><xdr:rowOff>1847850</xdr:rowOff></xdr:to>"));

    let rels = read_part(&buf, "xl/drawings/_rels/drawing2.xml.rels");
    assert!(rels.contains("Target=\"../media/image1.jpeg\""));

    let types = read_part(&buf, "[Content_Types].xml");
    assert!(types.contains("<Default Extension=\"jpeg\" ContentType=\"image/jpeg\"/>"));
    assert!(types.contains("/xl/drawings/drawing2.xml"));
}

#[test]
fn test_write_file_creates_complete_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xlsx");

    XlsxWriter::write_file(&one_sheet(), &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(part_names(&bytes).contains(&"xl/styles.xml".to_string()));
}

#[test]
fn test_empty_workbook_rejected() {
    let mut buf = Vec::new();
    let err = XlsxWriter::write(&Workbook::empty(), Cursor::new(&mut buf)).unwrap_err();
    assert!(matches!(err, XlsxError::InvalidFormat(_)));
}

#[test]
fn test_write_file_missing_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("report.xlsx");

    let err = XlsxWriter::write_file(&one_sheet(), &path).unwrap_err();
    assert!(matches!(err, XlsxError::Io(_)));
}

#[test]
fn test_control_characters_are_escaped() {
    let mut wb = Workbook::empty();
    let idx = wb.add_worksheet_with_name("Checks").unwrap();
    let sheet = wb.worksheet_mut(idx).unwrap();
    sheet.set_cell_value_at(0, 0, "Pump\u{1}").unwrap();
    sheet.set_cell_value_at(0, 1, "bad\u{8}").unwrap();
    sheet.set_cell_value_at(0, 2, "line\tone\nline two").unwrap();

    let xml = read_part(&write(&wb), "xl/worksheets/sheet1.xml");

    let forbidden: Vec<char> = xml
        .chars()
        .filter(|&c| (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r'))
        .collect();
    assert_eq!(forbidden, Vec::<char>::new());
    assert!(xml.contains(">Pump_x0001_<"));
    assert!(xml.contains(">bad_x0008_<"));
    assert!(xml.contains(">line\tone\nline two<"));
}

#[test]
fn test_write_buffered_into_claimed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("claimed.xlsx");
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .unwrap();

    XlsxWriter::write_buffered(&one_sheet(), file).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(part_names(&bytes).contains(&"xl/workbook.xml".to_string()));
}

#[test]
fn test_write_buffered_leaves_writer_untouched_on_error() {
    let mut out = Vec::new();
    let err = XlsxWriter::write_buffered(&Workbook::empty(), &mut out).unwrap_err();
    assert!(matches!(err, XlsxError::InvalidFormat(_)));
    assert!(out.is_empty());
}
