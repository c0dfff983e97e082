//! Content-based MIME sniffing (magic bytes, never the filename)

use std::io::Cursor;
use std::path::Path;

pub const PDF: &str = "application/pdf";
pub const PNG: &str = "image/png";
pub const JPEG: &str = "image/jpeg";
pub const TIFF: &str = "image/tiff";
pub const BMP: &str = "image/bmp";
pub const GIF: &str = "image/gif";
pub const WEBP: &str = "image/webp";
pub const DOC: &str = "application/msword";
pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const XLS: &str = "application/vnd.ms-excel";
pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const PPTX: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const ZIP: &str = "application/zip";
pub const OLE: &str = "application/x-ole-storage";
pub const TEXT: &str = "text/plain";
pub const OCTET_STREAM: &str = "application/octet-stream";

const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Sniff the MIME type of a file from its content
pub fn sniff_file(path: impl AsRef<Path>) -> std::io::Result<&'static str> {
    let data = std::fs::read(path)?;
    Ok(sniff_bytes(&data))
}

/// Sniff the MIME type of an in-memory payload
pub fn sniff_bytes(data: &[u8]) -> &'static str {
    if data.starts_with(b"%PDF-") {
        return PDF;
    }
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return PNG;
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return JPEG;
    }
    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        return TIFF;
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return GIF;
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return WEBP;
    }
    if data.len() >= 14 && data.starts_with(b"BM") {
        return BMP;
    }
    if data.starts_with(b"PK\x03\x04") {
        return sniff_zip(data);
    }
    if data.starts_with(&OLE_MAGIC) {
        return sniff_ole(data);
    }
    if looks_like_text(data) {
        return TEXT;
    }
    OCTET_STREAM
}

/// Distinguish OOXML packages by their part names
fn sniff_zip(data: &[u8]) -> &'static str {
    let archive = match zip::ZipArchive::new(Cursor::new(data)) {
        Ok(archive) => archive,
        Err(e) => {
            tracing::debug!("ZIP signature present but archive unreadable: {}", e);
            return ZIP;
        }
    };

    let mut mime = ZIP;
    for name in archive.file_names() {
        if name.starts_with("word/") {
            return DOCX;
        }
        if name.starts_with("xl/") {
            return XLSX;
        }
        if name.starts_with("ppt/") {
            mime = PPTX;
        }
    }
    mime
}

/// Distinguish legacy Office compound files by their stream names (UTF-16LE)
fn sniff_ole(data: &[u8]) -> &'static str {
    if contains_utf16(data, "WordDocument") {
        DOC
    } else if contains_utf16(data, "Workbook") || contains_utf16(data, "Book") {
        XLS
    } else {
        OLE
    }
}

fn contains_utf16(haystack: &[u8], needle: &str) -> bool {
    let encoded: Vec<u8> = needle
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect();
    haystack.windows(encoded.len()).any(|w| w == encoded.as_slice())
}

fn looks_like_text(data: &[u8]) -> bool {
    let head = &data[..data.len().min(8192)];
    if head.is_empty() || head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        // Only an incomplete character at the window edge is tolerated
        Err(e) => e.error_len().is_none(),
    }
}
