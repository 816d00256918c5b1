//! Scoped temporary storage for uploaded PDF bytes.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::trace;

/// Uploaded bytes held in a temporary file.
///
/// The file is deleted when the spool is dropped, whichever way the caller
/// leaves its scope.
pub struct UploadSpool {
    file: NamedTempFile,
}

impl UploadSpool {
    /// Write `bytes` to a fresh file in the system temporary directory.
    pub fn write(bytes: &[u8]) -> std::io::Result<Self> {
        Self::write_in(None, bytes)
    }

    /// Write `bytes` to a fresh file in `dir`, or the system temporary
    /// directory when `dir` is `None`.
    pub fn write_in(dir: Option<&Path>, bytes: &[u8]) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("capa-upload-").suffix(".pdf");

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        trace!("Spooled {} bytes to {}", bytes.len(), file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spool_holds_bytes() {
        let spool = UploadSpool::write(b"%PDF-1.4").unwrap();
        assert_eq!(std::fs::read(spool.path()).unwrap(), b"%PDF-1.4");
        assert!(spool.path().to_string_lossy().ends_with(".pdf"));
    }

    #[test]
    fn test_spool_removed_on_drop() {
        let spool = UploadSpool::write(b"data").unwrap();
        let path = spool.path().to_path_buf();
        assert!(path.exists());

        drop(spool);
        assert!(!path.exists());
    }

    #[test]
    fn test_spool_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let spool = UploadSpool::write_in(Some(dir.path()), b"data").unwrap();

        assert_eq!(spool.path().parent(), Some(dir.path()));
        let name = spool.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("capa-upload-"));
    }
}
