//! Shared fixtures for the export tests
#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};
use fieldreport::{
    CancelToken, CompressedImage, ExportOptions, ImageCompressor, ImageError, JpegCompressor,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

pub fn at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(10, 15, 0)
        .unwrap()
}

/// A gradient PNG of the given size
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Bytes that start like a JPEG and then stop
pub fn corrupt_photo() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00]
}

/// Output and scratch directories that live as long as the value
pub struct Dirs {
    _root: TempDir,
    pub output: PathBuf,
    pub scratch: PathBuf,
}

impl Dirs {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("out");
        let scratch = root.path().join("scratch");
        Self {
            _root: root,
            output,
            scratch,
        }
    }

    pub fn options(&self) -> ExportOptions {
        ExportOptions::new(&self.output)
            .with_scratch_dir(&self.scratch)
            .with_generated_at(at())
    }

    pub fn scratch_files(&self) -> Vec<PathBuf> {
        list(&self.scratch)
    }

    pub fn output_files(&self) -> Vec<PathBuf> {
        list(&self.output)
    }
}

fn list(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries.map(|e| e.unwrap().path()).collect();
    files.sort();
    files
}

/// Wraps the real compressor, counting calls
pub struct CountingCompressor {
    inner: JpegCompressor,
    calls: AtomicUsize,
}

impl CountingCompressor {
    pub fn new() -> Self {
        Self {
            inner: JpegCompressor::default(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageCompressor for CountingCompressor {
    fn compress(&self, raw: &[u8]) -> Result<CompressedImage, ImageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.compress(raw)
    }
}

/// Records how many temp files exist each time it is called
pub struct ObservingCompressor {
    inner: JpegCompressor,
    scratch: PathBuf,
    pub seen: Mutex<Vec<usize>>,
}

impl ObservingCompressor {
    pub fn new(scratch: &Path) -> Self {
        Self {
            inner: JpegCompressor::default(),
            scratch: scratch.to_path_buf(),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl ImageCompressor for ObservingCompressor {
    fn compress(&self, raw: &[u8]) -> Result<CompressedImage, ImageError> {
        self.seen.lock().unwrap().push(list(&self.scratch).len());
        self.inner.compress(raw)
    }
}

/// Cancels the export after its first successful compression
pub struct CancellingCompressor {
    inner: JpegCompressor,
    token: CancelToken,
}

impl CancellingCompressor {
    pub fn new(token: CancelToken) -> Self {
        Self {
            inner: JpegCompressor::default(),
            token,
        }
    }
}

impl ImageCompressor for CancellingCompressor {
    fn compress(&self, raw: &[u8]) -> Result<CompressedImage, ImageError> {
        let compressed = self.inner.compress(raw)?;
        self.token.cancel();
        Ok(compressed)
    }
}

pub fn part_names(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}

pub fn read_part(path: &Path, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

pub fn read_bytes(path: &Path, name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut content = Vec::new();
    file.read_to_end(&mut content).unwrap();
    content
}

/// Text of the inline-string cell `cell_ref` in a sheet part
pub fn cell_text(sheet_xml: &str, cell_ref: &str) -> Option<String> {
    let start = sheet_xml.find(&format!("<c r=\"{cell_ref}\""))?;
    let cell = &sheet_xml[start..];
    if cell[..cell.find('>')?].ends_with('/') {
        return None;
    }
    let cell = &cell[..cell.find("</c>")?];
    let open = "<t xml:space=\"preserve\">";
    let text = &cell[cell.find(open)? + open.len()..];
    Some(text[..text.find("</t>")?].to_string())
}
