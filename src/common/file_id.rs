//! File identity token.

use std::fmt;

/// Identifies a paged file registered with the buffer pool.
///
/// The pool never compares files by path or descriptor; the token handed out
/// by `register_file` is the sole identity. Tokens are never reused within
/// one pool, so a stale token after `close_file` cannot alias a newer file.
///
/// # Example
/// ```
/// use clockpool::FileId;
///
/// let file_id = FileId::new(3);
/// assert_eq!(file_id.0, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new FileId.
    #[inline]
    pub fn new(id: u32) -> Self {
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_equality() {
        assert_eq!(FileId::new(1), FileId::new(1));
        assert_ne!(FileId::new(1), FileId::new(2));
    }

    #[test]
    fn test_file_id_display() {
        assert_eq!(format!("{}", FileId::new(7)), "File(7)");
    }
}
