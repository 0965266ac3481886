//! Error types for clockpool.

use std::fmt;

use crate::common::{FileId, FrameId, PageId};

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in clockpool.
///
/// This enum represents every error that can surface from the buffer pool or
/// the paged file layer. By having a single error type, error handling stays
/// consistent across modules.
#[derive(Debug)]
pub enum Error {
    /// I/O error from disk operations.
    ///
    /// This wraps `std::io::Error` from file read/write operations.
    Io(std::io::Error),

    /// Requested page does not exist in the file.
    PageNotFound(u32),

    /// Every buffer frame is pinned; no victim is available.
    BufferExceeded,

    /// The requested (file, page) pair is not resident in the pool.
    ///
    /// An expected outcome of a lookup; surfaced from `unpin_page`.
    PageNotResident { file: FileId, page: PageId },

    /// Attempted to unpin a resident page whose pin count is already zero.
    ///
    /// This indicates a bug in the caller - unpins must match pins.
    PageNotPinned(PageId),

    /// The operation requires the page (or every page of the file) to be
    /// unpinned, but at least one pin is outstanding.
    PagePinned(PageId),

    /// A frame's descriptor no longer matches the page table.
    BadBuffer(FrameId),

    /// The page table rejected an insert or remove it should have accepted.
    HashTable,

    /// The file token was never registered (or was already closed).
    UnknownFile(FileId),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::PageNotFound(pno) => write!(f, "Page {} not found", pno),
            Error::BufferExceeded => write!(f, "All buffer frames are pinned"),
            Error::PageNotResident { file, page } => {
                write!(f, "{} of {} is not resident", page, file)
            }
            Error::PageNotPinned(page) => write!(f, "{} is not pinned", page),
            Error::PagePinned(page) => write!(f, "{} is still pinned", page),
            Error::BadBuffer(frame) => {
                write!(f, "{} descriptor disagrees with the page table", frame)
            }
            Error::HashTable => write!(f, "Page table insert/remove failed unexpectedly"),
            Error::UnknownFile(file) => write!(f, "{} is not registered", file),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            // I/O errors have a source (the underlying std::io::Error)
            Error::Io(e) => Some(e),
            // Our own errors don't have a source
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotFound(42);
        assert_eq!(format!("{}", err), "Page 42 not found");

        let err = Error::BufferExceeded;
        assert_eq!(format!("{}", err), "All buffer frames are pinned");

        let err = Error::PageNotResident {
            file: FileId::new(1),
            page: PageId::new(9),
        };
        assert_eq!(format!("{}", err), "Page(9) of File(1) is not resident");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_result_type_alias() {
        // This function returns our Result type
        fn might_fail() -> Result<u32> {
            Ok(42)
        }

        assert_eq!(might_fail().unwrap(), 42);
    }
}
