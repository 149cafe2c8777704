use crate::error::AuditError;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum UnifiedReaderError {
    #[error("No data from remote file: '{0}'")]
    RemoteFileNoDataError(String),
}

/// A unified reader that can handle both local files and remote URLs
pub(crate) enum UnifiedReader {
    /// Local file reader
    Local(BufReader<File>),
    /// Downloaded or caller-supplied bytes
    Memory(Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens a document from either a local path or an http(s) URL
    pub(crate) fn new(file_name: &str) -> Result<UnifiedReader, AuditError> {
        if Self::is_remote_url(file_name) {
            Self::download(file_name)
        } else {
            let file = File::open(file_name)?;
            Ok(UnifiedReader::Local(BufReader::new(file)))
        }
    }

    /// Checks if a file name represents a remote URL
    pub(crate) fn is_remote_url(file_name: &str) -> bool {
        if let Ok(url) = Url::parse(file_name) {
            matches!(url.scheme(), "http" | "https")
        } else {
            false
        }
    }

    /// Downloads the whole document into memory; ZIP reading needs `Seek`.
    fn download(file_name: &str) -> Result<UnifiedReader, AuditError> {
        tracing::debug!(url = file_name, "downloading remote document");
        let bytes = reqwest::blocking::get(file_name)?
            .error_for_status()?
            .bytes()?
            .to_vec();
        if bytes.is_empty() {
            Err(UnifiedReaderError::RemoteFileNoDataError(file_name.to_owned()))?;
        }
        Ok(UnifiedReader::Memory(Cursor::new(bytes)))
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            UnifiedReader::Memory(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            UnifiedReader::Memory(reader) => reader.seek(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote_url() {
        // Test local files
        assert!(!UnifiedReader::is_remote_url("report.docx"));
        assert!(!UnifiedReader::is_remote_url("/path/to/report.docx"));
        assert!(!UnifiedReader::is_remote_url("./relative/report.docx"));

        // Test remote URLs
        assert!(UnifiedReader::is_remote_url("http://example.com/report.docx"));
        assert!(UnifiedReader::is_remote_url("https://example.com/report.docx"));

        // Only http(s) is downloaded
        assert!(!UnifiedReader::is_remote_url("file:///path/to/report.docx"));
        assert!(!UnifiedReader::is_remote_url("s3://bucket/report.docx"));
    }

    #[test]
    fn test_open_local_file() {
        // Test opening a local file (Cargo.toml should exist)
        let result = UnifiedReader::new("Cargo.toml");
        assert!(result.is_ok(), "Failed to open local file: {:?}", result.err());

        // Test opening a non-existent local file
        let result = UnifiedReader::new("non_existent_file.docx");
        assert!(result.is_err(), "Should fail to open non-existent file");
    }
}
