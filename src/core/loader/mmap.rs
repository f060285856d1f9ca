//! Memory-mapped reads for large source photos.
//!
//! Camera JPEGs are routinely several megabytes; mapping them avoids an
//! extra copy into a heap buffer before decoding.

use crate::error::LoadError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Read a file, mapping it when it is at least 1MB.
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, LoadError> {
    let metadata = std::fs::metadata(path).map_err(|e| io_error(path, e))?;

    if metadata.len() >= MMAP_THRESHOLD {
        let file = File::open(path).map_err(|e| io_error(path, e))?;
        // SAFETY: the mapping is read-only and dropped before the load task returns.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| io_error(path, e))?;
        Ok(FileBytes::Mmap(mmap))
    } else {
        let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
        Ok(FileBytes::Vec(bytes))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// File contents, either owned or mapped.
pub enum FileBytes {
    Vec(Vec<u8>),
    Mmap(Mmap),
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

/// Check the magic bytes of a file the decoder can handle.
pub fn has_image_header(bytes: &[u8]) -> bool {
    if bytes.len() < 8 {
        return false;
    }

    // JPEG
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return true;
    }

    // PNG
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return true;
    }

    // WebP: RIFF....WEBP
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return true;
    }

    // BMP
    if bytes.starts_with(b"BM") {
        return true;
    }

    // TIFF, little or big endian
    bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn accepts_jpeg_and_png_headers() {
        assert!(has_image_header(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46]));
        assert!(has_image_header(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]));
    }

    #[test]
    fn accepts_webp_header() {
        let webp = [
            0x52, 0x49, 0x46, 0x46, 0x00, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50,
        ];
        assert!(has_image_header(&webp));
    }

    #[test]
    fn rejects_text_and_short_input() {
        assert!(!has_image_header(b"not an image at all"));
        assert!(!has_image_header(&[0xFF, 0xD8]));
    }

    #[test]
    fn small_files_are_read_into_memory() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[1, 2, 3, 4]).unwrap();

        let bytes = read_file_bytes(file.path()).unwrap();
        assert!(matches!(bytes, FileBytes::Vec(_)));
        assert_eq!(&*bytes, &[1, 2, 3, 4]);
    }

    #[test]
    fn large_files_are_mapped() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&vec![7u8; MMAP_THRESHOLD as usize]).unwrap();

        let bytes = read_file_bytes(file.path()).unwrap();
        assert!(matches!(bytes, FileBytes::Mmap(_)));
        assert_eq!(bytes.len(), MMAP_THRESHOLD as usize);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = read_file_bytes(Path::new("/nonexistent/shot.jpg"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }
}
