//! Disk Manager - low-level file I/O for pages.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages
//! - Allocating and disposing pages
//! - Managing the backing file

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::paged_file::PagedFile;

/// Manages disk I/O for a single paged file.
///
/// # File Layout
/// Pages are laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. The buffer pool serializes access
/// to each registered file.
///
/// # Durability
/// All writes are followed by `fsync()` to ensure durability.
pub struct DiskManager {
    file: File,
    /// Number of page slots in the file, including disposed ones.
    page_count: u32,
    /// Disposed slots available for reuse, most recently freed last.
    ///
    /// TODO: persist the free list in a header page so disposed slots
    /// survive reopen; today a reopened file only allocates at the end.
    free_slots: Vec<u32>,
}

impl DiskManager {
    /// Create a new paged file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            file,
            page_count: 0,
            free_slots: Vec::new(),
        })
    }

    /// Open an existing paged file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        // Calculate page count from file size
        let metadata = file.metadata()?;
        let file_size = metadata.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file,
            page_count,
            free_slots: Vec::new(),
        })
    }

    /// Open an existing paged file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Get the total size of the file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }

    fn seek_to(&mut self, page_id: PageId) -> Result<()> {
        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }
}

impl PagedFile for DiskManager {
    /// Read a page from disk into `dst`.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page doesn't exist.
    fn read_page(&mut self, page_id: PageId, dst: &mut Page) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        self.seek_to(page_id)?;
        self.file.read_exact(dst.as_mut_slice())?;

        Ok(())
    }

    /// Write a page to disk.
    ///
    /// # Durability
    /// This method calls `fsync()` after writing to ensure the data is
    /// persisted to disk.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been allocated.
    fn write_page(&mut self, page_id: PageId, src: &Page) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        self.seek_to(page_id)?;
        self.file.write_all(src.as_slice())?;
        self.file.sync_all()?; // fsync for durability

        Ok(())
    }

    /// Allocate a page slot.
    ///
    /// Reuses the most recently disposed slot if one exists, otherwise
    /// extends the file. Either way the slot is zeroed on disk before the
    /// new `PageId` is returned.
    fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = match self.free_slots.pop() {
            Some(slot) => PageId::new(slot),
            None => {
                let page_id = PageId::new(self.page_count);
                self.page_count += 1;
                page_id
            }
        };

        self.seek_to(page_id)?;
        let zeros = [0u8; PAGE_SIZE];
        self.file.write_all(&zeros)?;
        self.file.sync_all()?;

        Ok(page_id)
    }

    /// Free a page slot for later reuse.
    ///
    /// The bytes on disk are left in place; reuse zeroes them.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the slot was never allocated or is
    /// already free.
    fn dispose_page(&mut self, page_id: PageId) -> Result<()> {
        if page_id.0 >= self.page_count || self.free_slots.contains(&page_id.0) {
            return Err(Error::PageNotFound(page_id.0));
        }

        self.free_slots.push(page_id.0);
        Ok(())
    }

    #[inline]
    fn page_count(&self) -> u32 {
        self.page_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_new_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let dm = DiskManager::create(&path).unwrap();
        assert_eq!(dm.page_count(), 0);
        assert_eq!(dm.file_size(), 0);
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        DiskManager::create(&path).unwrap();
        assert!(DiskManager::create(&path).is_err());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent.db");

        assert!(DiskManager::open(&path).is_err());
    }

    #[test]
    fn test_allocate_and_read_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path).unwrap();

        // Allocate first page
        let page_id = dm.allocate_page().unwrap();
        assert_eq!(page_id, PageId::new(0));
        assert_eq!(dm.page_count(), 1);

        // Read it back (should be zeros)
        let mut page = Page::new();
        dm.read_page(page_id, &mut page).unwrap();
        assert_eq!(page.as_slice()[0], 0);
        assert_eq!(page.as_slice()[4095], 0);
    }

    #[test]
    fn test_write_and_read_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path).unwrap();
        let page_id = dm.allocate_page().unwrap();

        // Write some data
        let mut page = Page::new();
        page.as_mut_slice()[0] = 0xAB;
        page.as_mut_slice()[100] = 0xCD;
        page.as_mut_slice()[4095] = 0xEF;

        dm.write_page(page_id, &page).unwrap();

        // Read it back
        let mut read_page = Page::new();
        dm.read_page(page_id, &mut read_page).unwrap();
        assert_eq!(read_page.as_slice()[0], 0xAB);
        assert_eq!(read_page.as_slice()[100], 0xCD);
        assert_eq!(read_page.as_slice()[4095], 0xEF);
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        // Create and write
        {
            let mut dm = DiskManager::create(&path).unwrap();
            let page_id = dm.allocate_page().unwrap();

            let mut page = Page::new();
            page.as_mut_slice()[0] = 0x42;
            dm.write_page(page_id, &page).unwrap();
        }

        // Reopen and verify
        {
            let mut dm = DiskManager::open(&path).unwrap();
            assert_eq!(dm.page_count(), 1);

            let mut page = Page::new();
            dm.read_page(PageId::new(0), &mut page).unwrap();
            assert_eq!(page.as_slice()[0], 0x42);
        }
    }

    #[test]
    fn test_multiple_pages() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path).unwrap();

        // Allocate and write 10 pages
        for i in 0..10 {
            let page_id = dm.allocate_page().unwrap();
            assert_eq!(page_id.0, i);

            let mut page = Page::new();
            page.as_mut_slice()[0] = i as u8;
            dm.write_page(page_id, &page).unwrap();
        }

        assert_eq!(dm.page_count(), 10);
        assert_eq!(dm.file_size(), 10 * PAGE_SIZE as u64);

        // Read them all back
        for i in 0..10 {
            let mut page = Page::new();
            dm.read_page(PageId::new(i), &mut page).unwrap();
            assert_eq!(page.as_slice()[0], i as u8);
        }
    }

    #[test]
    fn test_read_invalid_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path).unwrap();
        dm.allocate_page().unwrap(); // Page 0 exists

        // Page 1 doesn't exist
        let mut page = Page::new();
        let result = dm.read_page(PageId::new(1), &mut page);
        assert!(result.is_err());
    }

    #[test]
    fn test_write_invalid_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path).unwrap();

        // No pages allocated yet
        let page = Page::new();
        let result = dm.write_page(PageId::new(0), &page);
        assert!(result.is_err());
    }

    #[test]
    fn test_dispose_and_reuse() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path).unwrap();
        let p0 = dm.allocate_page().unwrap();
        let p1 = dm.allocate_page().unwrap();

        let mut page = Page::new();
        page.as_mut_slice()[0] = 0x99;
        dm.write_page(p0, &page).unwrap();

        dm.dispose_page(p0).unwrap();
        assert_eq!(dm.page_count(), 2);

        // Double dispose is rejected
        assert!(dm.dispose_page(p0).is_err());

        // The freed slot comes back zeroed
        let reused = dm.allocate_page().unwrap();
        assert_eq!(reused, p0);

        let mut read_back = Page::new();
        dm.read_page(reused, &mut read_back).unwrap();
        assert_eq!(read_back.as_slice()[0], 0);

        // p1 untouched by the reuse
        dm.read_page(p1, &mut read_back).unwrap();
        assert_eq!(read_back.as_slice()[0], 0);
    }

    #[test]
    fn test_dispose_unallocated_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path).unwrap();
        assert!(dm.dispose_page(PageId::new(0)).is_err());
    }

    #[test]
    fn test_open_or_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        // First call creates
        {
            let mut dm = DiskManager::open_or_create(&path).unwrap();
            assert_eq!(dm.page_count(), 0);
            dm.allocate_page().unwrap();
        }

        // Second call opens existing
        {
            let dm = DiskManager::open_or_create(&path).unwrap();
            assert_eq!(dm.page_count(), 1);
        }
    }
}
