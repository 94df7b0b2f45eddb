//! Document reader module

use std::io;
use std::path::Path;

/// Loads the full text of a backing file
pub trait DocumentReader: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Reads files as UTF-8, failing on invalid byte sequences
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8Reader;

impl DocumentReader for Utf8Reader {
    fn read(&self, path: &Path) -> io::Result<String> {
        let bytes = std::fs::read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} is not valid UTF-8: {e}", path.display()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_utf8_byte_for_byte() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        let text = "Grüße\r\n\tκόσμε 🚀\n";
        std::fs::write(&path, text).unwrap();

        assert_eq!(Utf8Reader.read(&path).unwrap(), text);
    }

    #[test]
    fn test_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, [0x66, 0x6f, 0xff, 0xfe]).unwrap();

        let err = Utf8Reader.read(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Utf8Reader.read(&dir.path().join("gone.txt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
