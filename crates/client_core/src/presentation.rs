//! Display metadata derived once when a stored file enters the local cache.

use chrono::{DateTime, Utc};
use shared::protocol::StoredFile;

const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

pub fn format_upload_date(uploaded_at: &DateTime<Utc>) -> String {
    uploaded_at.format("%Y-%m-%d %H:%M").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDisplay {
    pub formatted_size: String,
    pub formatted_upload_date: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub file: StoredFile,
    pub display: FileDisplay,
}

impl From<StoredFile> for FileEntry {
    fn from(file: StoredFile) -> Self {
        let display = FileDisplay {
            formatted_size: format_file_size(file.file_size_bytes),
            formatted_upload_date: format_upload_date(&file.uploaded_at),
        };
        Self { file, display }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10.0 MB");
    }

    #[test]
    fn upload_date_is_minute_precision() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 59).unwrap();
        assert_eq!(format_upload_date(&at), "2024-03-01 14:05");
    }
}
