//! In-memory paged file.

use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::paged_file::PagedFile;

/// A paged file backed by heap memory instead of disk.
///
/// Implements the same [`PagedFile`] contract as [`DiskManager`], minus
/// durability. Useful as a scratch store and as the backing file in tests
/// that don't care about persistence.
///
/// [`DiskManager`]: crate::storage::DiskManager
///
/// # Example
/// ```
/// use clockpool::storage::{MemFile, PagedFile};
/// use clockpool::storage::page::Page;
///
/// let mut file = MemFile::new();
/// let pid = file.allocate_page().unwrap();
///
/// let mut page = Page::new();
/// page.as_mut_slice()[0] = 0xAB;
/// file.write_page(pid, &page).unwrap();
/// ```
#[derive(Default)]
pub struct MemFile {
    pages: Vec<Box<Page>>,
    free_slots: Vec<u32>,
}

impl MemFile {
    /// Create an empty in-memory file.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, page_id: PageId) -> Result<usize> {
        let index = page_id.0 as usize;
        if index >= self.pages.len() || self.free_slots.contains(&page_id.0) {
            return Err(Error::PageNotFound(page_id.0));
        }
        Ok(index)
    }
}

impl PagedFile for MemFile {
    fn read_page(&mut self, page_id: PageId, dst: &mut Page) -> Result<()> {
        let index = self.slot(page_id)?;
        dst.copy_from(&self.pages[index]);
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, src: &Page) -> Result<()> {
        let index = self.slot(page_id)?;
        self.pages[index].copy_from(src);
        Ok(())
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        match self.free_slots.pop() {
            Some(slot) => {
                self.pages[slot as usize].reset();
                Ok(PageId::new(slot))
            }
            None => {
                let page_id = PageId::new(self.pages.len() as u32);
                self.pages.push(Box::new(Page::new()));
                Ok(page_id)
            }
        }
    }

    fn dispose_page(&mut self, page_id: PageId) -> Result<()> {
        self.slot(page_id)?;
        self.free_slots.push(page_id.0);
        Ok(())
    }

    #[inline]
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }
}
