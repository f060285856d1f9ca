//! # Metadata Module
//!
//! Reads the EXIF capture time used to order photos by when they were shot.
//!
//! `DateTimeOriginal` is preferred, falling back to `DateTime`. Files
//! without EXIF (PNG exports, screenshots) simply have no capture time.

use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::io::Cursor;

/// EXIF date format: "YYYY:MM:DD HH:MM:SS"
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Extract the capture time from the raw bytes of an image file
pub fn capture_time(bytes: &[u8]) -> Option<NaiveDateTime> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;

    [Tag::DateTimeOriginal, Tag::DateTime]
        .into_iter()
        .filter_map(|tag| exif.get_field(tag, In::PRIMARY))
        .find_map(|field| parse_ascii_date(&field.value))
}

fn parse_ascii_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Ascii(parts) => {
            let raw = std::str::from_utf8(parts.first()?).ok()?;
            NaiveDateTime::parse_from_str(raw.trim_end_matches('\0').trim(), EXIF_DATE_FORMAT).ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_exif_ascii_date() {
        let value = Value::Ascii(vec![b"2024:06:01 18:30:05".to_vec()]);
        let expected = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(18, 30, 5)
            .unwrap();
        assert_eq!(parse_ascii_date(&value), Some(expected));
    }

    #[test]
    fn rejects_malformed_date() {
        let value = Value::Ascii(vec![b"yesterday".to_vec()]);
        assert_eq!(parse_ascii_date(&value), None);
        assert_eq!(parse_ascii_date(&Value::Short(vec![1])), None);
    }

    #[test]
    fn non_exif_bytes_have_no_capture_time() {
        assert_eq!(capture_time(b"definitely not a jpeg"), None);
    }
}
