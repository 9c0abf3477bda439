//! Image blobs shared by all sheets of a workbook
//!
//! Pictures reference blobs by [`ImageId`]. Registering the same bytes twice
//! returns the same id, so a photo placed on two sheets is stored once in the
//! written package.


use ahash::{AHashMap, RandomState};

use crate::error::{Error, Result};

/// Identifier of an image within a workbook's [`ImageTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u32);

impl ImageId {
    /// 0-based position in registration order
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Encoded image formats that can be embedded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Detect the format from the leading magic bytes
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageFormat::Png)
        } else {
            None
        }
    }

    /// File extension used for the media part
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
        }
    }

    /// MIME content type
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// Encoded image bytes plus their detected format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    format: ImageFormat,
    bytes: Vec<u8>,
}

impl ImageBlob {
    /// Wrap encoded bytes, failing if the format is not recognized
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::detect(&bytes).ok_or_else(|| {
            Error::InvalidImage(format!(
                "unrecognized image signature ({} bytes)",
                bytes.len()
            ))
        })?;
        Ok(Self { format, bytes })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Content-deduplicated table of image blobs
#[derive(Debug)]
pub struct ImageTable {
    blobs: Vec<ImageBlob>,
    by_hash: AHashMap<u64, Vec<ImageId>>,
    hasher: RandomState,
}

impl ImageTable {
    pub fn new() -> Self {
        Self {
            blobs: Vec::new(),
            by_hash: AHashMap::new(),
            hasher: RandomState::new(),
        }
    }

    /// Register encoded bytes, returning the id of an identical blob if one
    /// is already stored
    pub fn register(&mut self, bytes: Vec<u8>) -> Result<ImageId> {
        let hash = self.hasher.hash_one(bytes.as_slice());

        if let Some(ids) = self.by_hash.get(&hash) {
            for &id in ids {
                if self.blobs[id.index()].bytes() == bytes.as_slice() {
                    return Ok(id);
                }
            }
        }

        let blob = ImageBlob::new(bytes)?;
        let id = ImageId(self.blobs.len() as u32);
        self.blobs.push(blob);
        self.by_hash.entry(hash).or_default().push(id);
        Ok(id)
    }

    /// Get a blob by id
    pub fn get(&self, id: ImageId) -> Option<&ImageBlob> {
        self.blobs.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Iterate over blobs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (ImageId, &ImageBlob)> {
        self.blobs
            .iter()
            .enumerate()
            .map(|(i, b)| (ImageId(i as u32), b))
    }
}

impl Default for ImageTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG_HEADER: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];
    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn jpeg(tail: u8) -> Vec<u8> {
        let mut bytes = JPEG_HEADER.to_vec();
        bytes.push(tail);
        bytes
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(ImageFormat::detect(&JPEG_HEADER), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::detect(&PNG_HEADER), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::detect(b"GIF89a"), None);
        assert_eq!(ImageFormat::detect(&[]), None);
    }

    #[test]
    fn test_register_deduplicates_identical_bytes() {
        let mut table = ImageTable::new();
        let a = table.register(jpeg(1)).unwrap();
        let b = table.register(jpeg(1)).unwrap();
        let c = table.register(jpeg(2)).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_register_rejects_unknown_format() {
        let mut table = ImageTable::new();
        let err = table.register(b"not an image".to_vec()).unwrap_err();
        assert!(matches!(err, Error::InvalidImage(_)));
        assert!(table.is_empty());
    }

    #[test]
    fn test_iter_in_registration_order() {
        let mut table = ImageTable::new();
        table.register(jpeg(9)).unwrap();
        table.register(PNG_HEADER.to_vec()).unwrap();

        let formats: Vec<_> = table.iter().map(|(_, b)| b.format()).collect();
        assert_eq!(formats, vec![ImageFormat::Jpeg, ImageFormat::Png]);
    }
}
