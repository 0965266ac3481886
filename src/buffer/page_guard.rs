//! RAII guards for page access.
//!
//! These guards provide safe access to pages in the buffer pool:
//! - [`PageReadGuard`] - Shared read access (multiple allowed)
//! - [`PageWriteGuard`] - Exclusive write access (marks the page dirty)
//!
//! Both guards release their pin when dropped, so a pinned page cannot leak
//! past any exit path of the caller.

use std::ops::{Deref, DerefMut};

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FileId, FrameId, PageId};
use crate::storage::page::Page;

use super::buffer_pool_manager::BufferPoolManager;

/// Guard for read-only page access.
///
/// Multiple `PageReadGuard`s can exist for the same page simultaneously.
/// The page is automatically unpinned (clean) when the guard is dropped.
///
/// # Example
/// ```ignore
/// let guard = pool.fetch_page_read(file, page_id)?;
/// let data = guard.as_slice();  // Deref to &Page
/// // guard drops here, page unpinned
/// ```
pub struct PageReadGuard<'a> {
    /// Reference back to the pool for unpin on drop.
    pool: &'a BufferPoolManager,
    /// Frame holding this page.
    frame_id: FrameId,
    /// Identity of the pinned page.
    file_id: FileId,
    page_id: PageId,
    /// Lock guard providing access to page data.
    lock: RwLockReadGuard<'a, Page>,
}

impl<'a> PageReadGuard<'a> {
    /// Create a new read guard.
    ///
    /// Called by `BufferPoolManager::fetch_page_read()`.
    pub(crate) fn new(
        pool: &'a BufferPoolManager,
        frame_id: FrameId,
        file_id: FileId,
        page_id: PageId,
        lock: RwLockReadGuard<'a, Page>,
    ) -> Self {
        Self {
            pool,
            frame_id,
            file_id,
            page_id,
            lock,
        }
    }

    /// Get the file this page belongs to.
    #[inline]
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    /// Get the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Get the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }
}

impl Deref for PageReadGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

impl Drop for PageReadGuard<'_> {
    fn drop(&mut self) {
        // Read guard: not dirty
        if let Err(e) = self.pool.unpin_page(self.file_id, self.page_id, false) {
            log::error!("unpin of {} in {} failed: {}", self.page_id, self.file_id, e);
        }
    }
}

/// Guard for exclusive write access to a page.
///
/// Only one `PageWriteGuard` can exist for a page at a time.
/// The page is marked dirty and unpinned when the guard is dropped; use
/// [`BufferPoolManager::unpin_page`] directly for pin management that needs
/// finer control over the dirty flag.
///
/// # Example
/// ```ignore
/// let mut guard = pool.fetch_page_write(file, page_id)?;
/// guard.as_mut_slice()[0] = 0xFF;  // DerefMut to &mut Page
/// // guard drops here, page marked dirty and unpinned
/// ```
pub struct PageWriteGuard<'a> {
    /// Reference back to the pool for unpin on drop.
    pool: &'a BufferPoolManager,
    /// Frame holding this page.
    frame_id: FrameId,
    /// Identity of the pinned page.
    file_id: FileId,
    page_id: PageId,
    /// Lock guard providing access to page data.
    lock: RwLockWriteGuard<'a, Page>,
}

impl<'a> PageWriteGuard<'a> {
    /// Create a new write guard.
    ///
    /// Called by `BufferPoolManager::fetch_page_write()` and `new_page()`.
    pub(crate) fn new(
        pool: &'a BufferPoolManager,
        frame_id: FrameId,
        file_id: FileId,
        page_id: PageId,
        lock: RwLockWriteGuard<'a, Page>,
    ) -> Self {
        Self {
            pool,
            frame_id,
            file_id,
            page_id,
            lock,
        }
    }

    /// Get the file this page belongs to.
    #[inline]
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    /// Get the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Get the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }
}

impl Deref for PageWriteGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

impl DerefMut for PageWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Page {
        &mut self.lock
    }
}

impl Drop for PageWriteGuard<'_> {
    fn drop(&mut self) {
        // Write guard: always dirty
        if let Err(e) = self.pool.unpin_page(self.file_id, self.page_id, true) {
            log::error!("unpin of {} in {} failed: {}", self.page_id, self.file_id, e);
        }
    }
}
