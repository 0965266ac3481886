//! The contract between the buffer pool and its backing files.

use crate::common::{PageId, Result};
use crate::storage::page::Page;

/// A file of fixed-size pages.
///
/// The buffer pool talks to storage exclusively through this trait: it never
/// sees descriptors, offsets, or free-slot bookkeeping. Implementations are
/// expected to transfer whole pages; a partial read or write is an error.
///
/// Two implementations ship with the crate: [`DiskManager`] for a real file
/// on disk and [`MemFile`] for an in-memory store.
///
/// [`DiskManager`]: crate::storage::DiskManager
/// [`MemFile`]: crate::storage::MemFile
pub trait PagedFile: Send {
    /// Read page `page_id` into `dst`, overwriting all of its bytes.
    fn read_page(&mut self, page_id: PageId, dst: &mut Page) -> Result<()>;

    /// Durably write `src` as page `page_id`.
    ///
    /// The page must have been previously allocated with `allocate_page()`.
    fn write_page(&mut self, page_id: PageId, src: &Page) -> Result<()>;

    /// Allocate a new zeroed page slot and return its number.
    ///
    /// Disposed slots may be reused before the file grows.
    fn allocate_page(&mut self) -> Result<PageId>;

    /// Free a previously allocated page slot.
    fn dispose_page(&mut self, page_id: PageId) -> Result<()>;

    /// Number of page slots in the file, including disposed ones.
    fn page_count(&self) -> u32;
}
