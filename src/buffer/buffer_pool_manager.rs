//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between paged files and memory
//! - Pin-based reference counting
//! - Automatic dirty page write-back
//! - Clock (second-chance) eviction

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::buffer::page_table::PageTable;
use crate::buffer::replacer::ClockReplacer;
use crate::buffer::{BufferPoolStats, Frame, PageReadGuard, PageWriteGuard};
use crate::common::{Error, FileId, FrameId, PageId, Result};
use crate::storage::PagedFile;

/// Manages a pool of buffer frames caching pages of registered files.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                     BufferPoolManager                        │
/// │  ┌───────────────────┐  ┌─────────────────────────────────┐  │
/// │  │ page_table        │  │       frames: Vec<Frame>        │  │
/// │  │(File,Page)→ Frame │─▶│  [Frame0] [Frame1] [Frame2] ... │  │
/// │  └───────────────────┘  └─────────────────────────────────┘  │
/// │  ┌───────────────────┐  ┌──────────────┐  ┌──────────────┐   │
/// │  │ files             │  │   replacer   │  │    stats     │   │
/// │  │ FileId → PagedFile│  │ClockReplacer │  │   atomics    │   │
/// │  └───────────────────┘  └──────────────┘  └──────────────┘   │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// Files are registered up front and addressed by [`FileId`] afterwards;
/// the pool needs the registry to reach a victim's owning file during
/// eviction, no matter which file the current request is for.
///
/// # Pin Discipline
/// Every successful fetch or allocation takes one pin on the frame, released
/// by the returned guard's drop (or by an explicit [`unpin_page`]). A pinned
/// frame is never chosen for eviction; leaking pins therefore shrinks the
/// usable pool until every request fails with `BufferExceeded`.
///
/// [`unpin_page`]: BufferPoolManager::unpin_page
///
/// # Concurrency
/// Operations are synchronous and the pool is intended for single-threaded
/// use; the interior mutability (`Mutex`/`RwLock`/atomics) exists so guards
/// can release pins from `Drop` with only a shared reference to the pool.
///
/// # Usage
/// ```
/// use clockpool::{BufferPoolManager, MemFile};
///
/// let pool = BufferPoolManager::new(8);
/// let file = pool.register_file(Box::new(MemFile::new()));
///
/// // Allocate a new page and write into it
/// let page_id = {
///     let mut guard = pool.new_page(file).unwrap();
///     guard.as_mut_slice()[0] = 0xAB;
///     guard.page_id()
/// }; // guard drops: page marked dirty, unpinned
///
/// // Fetch it back for reading
/// let guard = pool.fetch_page_read(file, page_id).unwrap();
/// assert_eq!(guard.as_slice()[0], 0xAB);
/// ```
pub struct BufferPoolManager {
    /// Fixed pool of frames allocated at startup.
    frames: Vec<Frame>,

    /// Maps resident (file, page) pairs to frame IDs.
    page_table: Mutex<PageTable>,

    /// Eviction policy for selecting victim frames.
    replacer: Mutex<ClockReplacer>,

    /// Registered backing files, addressed by token.
    files: RwLock<HashMap<FileId, Mutex<Box<dyn PagedFile>>>>,

    /// Next token to hand out; tokens are never reused.
    next_file_id: AtomicU32,

    /// Performance statistics.
    stats: BufferPoolStats,

    /// Number of frames in the pool (immutable after construction).
    pool_size: usize,
}

impl BufferPoolManager {
    /// Create a new buffer pool manager with `pool_size` frames.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        // Allocate all frames upfront; every frame starts empty
        let frames: Vec<Frame> = (0..pool_size).map(|_| Frame::new()).collect();

        Self {
            frames,
            page_table: Mutex::new(PageTable::new(pool_size)),
            replacer: Mutex::new(ClockReplacer::new(pool_size)),
            files: RwLock::new(HashMap::new()),
            next_file_id: AtomicU32::new(0),
            stats: BufferPoolStats::new(),
            pool_size,
        }
    }

    // ========================================================================
    // Public API: File registry
    // ========================================================================

    /// Register a backing file and return its token.
    ///
    /// All subsequent operations address the file by the returned [`FileId`].
    pub fn register_file(&self, file: Box<dyn PagedFile>) -> FileId {
        let file_id = FileId::new(self.next_file_id.fetch_add(1, Ordering::Relaxed));
        self.files.write().insert(file_id, Mutex::new(file));
        log::debug!("registered {}", file_id);
        file_id
    }

    /// Flush the file's resident pages and drop it from the registry.
    ///
    /// # Errors
    /// - `Error::PagePinned` if any of its pages is still pinned (the file
    ///   stays registered)
    /// - `Error::UnknownFile` if the token was never registered
    /// - I/O errors from the write-back
    pub fn close_file(&self, file_id: FileId) -> Result<()> {
        self.flush_file(file_id)?;
        self.files
            .write()
            .remove(&file_id)
            .ok_or(Error::UnknownFile(file_id))?;
        log::debug!("closed {}", file_id);
        Ok(())
    }

    // ========================================================================
    // Public API: Fetch pages
    // ========================================================================

    /// Fetch a page for reading (shared access).
    ///
    /// If the page is already resident the frame is pinned and returned
    /// immediately; its reference bit is set so the clock sweep spares it
    /// once. Otherwise the page is loaded from its file, evicting a victim
    /// if no frame is empty.
    ///
    /// # Errors
    /// - `Error::BufferExceeded` if all frames are pinned
    /// - `Error::Io` / `Error::PageNotFound` from the file layer
    /// - `Error::UnknownFile` if the token is not registered
    pub fn fetch_page_read(&self, file_id: FileId, page_id: PageId) -> Result<PageReadGuard<'_>> {
        let frame_id = self.fetch_frame(file_id, page_id)?;
        let lock = self.frames[frame_id.0].page();

        Ok(PageReadGuard::new(self, frame_id, file_id, page_id, lock))
    }

    /// Fetch a page for writing (exclusive access).
    ///
    /// Same as `fetch_page_read`, but returns an exclusive guard.
    /// The page is marked dirty when the guard drops.
    pub fn fetch_page_write(&self, file_id: FileId, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        let frame_id = self.fetch_frame(file_id, page_id)?;
        let lock = self.frames[frame_id.0].page_mut();

        Ok(PageWriteGuard::new(self, frame_id, file_id, page_id, lock))
    }

    // ========================================================================
    // Public API: Pin management
    // ========================================================================

    /// Release one pin on a resident page.
    ///
    /// The dirty flag is sticky: passing `true` marks the page dirty, while
    /// passing `false` never clears a mark left by an earlier unpin. Guards
    /// call this on drop; call it directly only when driving pins by hand.
    ///
    /// # Errors
    /// - `Error::PageNotResident` if the page is not in the pool
    /// - `Error::PageNotPinned` if the pin count is already zero
    pub fn unpin_page(&self, file_id: FileId, page_id: PageId, dirty: bool) -> Result<()> {
        let frame_id = self
            .page_table
            .lock()
            .lookup(file_id, page_id)
            .ok_or(Error::PageNotResident {
                file: file_id,
                page: page_id,
            })?;

        let frame = &self.frames[frame_id.0];

        if frame.pin_count() == 0 {
            return Err(Error::PageNotPinned(page_id));
        }

        if dirty {
            frame.mark_dirty();
        }
        frame.unpin();

        Ok(())
    }

    // ========================================================================
    // Public API: Create and delete pages
    // ========================================================================

    /// Allocate a new page in `file_id` and pin it in the pool.
    ///
    /// The file assigns the page number first; the pooled copy starts
    /// zeroed. Returns a write guard for the new page (its number is
    /// available via [`PageWriteGuard::page_id`]).
    ///
    /// # Errors
    /// - `Error::BufferExceeded` if all frames are pinned; the slot already
    ///   allocated in the file is not reclaimed
    /// - I/O errors from the file layer
    pub fn new_page(&self, file_id: FileId) -> Result<PageWriteGuard<'_>> {
        self.ensure_registered(file_id)?;

        let page_id = self.with_file(file_id, |file| file.allocate_page())?;

        // Get a frame (may evict)
        let frame_id = self.allocate_frame()?;
        let frame = &self.frames[frame_id.0];

        // Fresh pages start as all zeroes
        frame.page_mut().reset();

        self.page_table.lock().insert(file_id, page_id, frame_id)?;

        frame.set_owner(Some((file_id, page_id)));
        frame.pin();

        self.stats.accesses.fetch_add(1, Ordering::Relaxed);

        let lock = frame.page_mut();
        Ok(PageWriteGuard::new(self, frame_id, file_id, page_id, lock))
    }

    /// Drop a page from the pool and free its slot in the file.
    ///
    /// A resident copy is discarded without write-back; the page is being
    /// deallocated, so any dirty state is meaningless.
    ///
    /// # Errors
    /// - `Error::PagePinned` if the resident copy still has pins
    /// - I/O errors from the file layer
    pub fn dispose_page(&self, file_id: FileId, page_id: PageId) -> Result<()> {
        self.ensure_registered(file_id)?;

        {
            let mut table = self.page_table.lock();
            if let Some(frame_id) = table.lookup(file_id, page_id) {
                let frame = &self.frames[frame_id.0];
                if frame.is_pinned() {
                    return Err(Error::PagePinned(page_id));
                }
                frame.reset();
                table.remove(file_id, page_id);
            }
        }

        self.with_file(file_id, |file| file.dispose_page(page_id))
    }

    // ========================================================================
    // Public API: Flush pages
    // ========================================================================

    /// Write back and release every resident page of `file_id`.
    ///
    /// Frames are processed in index order: dirty pages are written back,
    /// then the page-table entry is removed and the frame invalidated.
    /// Encountering a pinned page aborts the pass; pages already processed
    /// stay flushed and released.
    ///
    /// # Errors
    /// - `Error::PagePinned` if a page of the file still has pins
    /// - `Error::BadBuffer` if a resident frame has no page-table entry
    /// - I/O errors from the write-back
    pub fn flush_file(&self, file_id: FileId) -> Result<()> {
        self.ensure_registered(file_id)?;

        for (index, frame) in self.frames.iter().enumerate() {
            let Some((owner, page_id)) = frame.owner() else {
                continue;
            };
            if owner != file_id {
                continue;
            }

            if frame.is_pinned() {
                return Err(Error::PagePinned(page_id));
            }

            if frame.is_dirty() {
                {
                    let page = frame.page();
                    self.with_file(file_id, |file| file.write_page(page_id, &page))?;
                }
                frame.clear_dirty();
                self.stats.disk_writes.fetch_add(1, Ordering::Relaxed);
            }

            if !self.page_table.lock().remove(file_id, page_id) {
                return Err(Error::BadBuffer(FrameId::new(index)));
            }
            frame.reset();
        }

        Ok(())
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    /// Get buffer pool statistics.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Get the pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Get the number of resident pages.
    pub fn resident_page_count(&self) -> usize {
        self.page_table.lock().len()
    }

    /// Check whether a page is resident.
    pub fn is_resident(&self, file_id: FileId, page_id: PageId) -> bool {
        self.page_table.lock().lookup(file_id, page_id).is_some()
    }

    /// Get the pin count of a resident page, or `None` if not resident.
    pub fn pin_count(&self, file_id: FileId, page_id: PageId) -> Option<u32> {
        let frame_id = self.page_table.lock().lookup(file_id, page_id)?;
        Some(self.frames[frame_id.0].pin_count())
    }

    // ========================================================================
    // Internal: Core fetch logic
    // ========================================================================

    /// Fetch a page into the pool, pin it, and return its frame ID.
    fn fetch_frame(&self, file_id: FileId, page_id: PageId) -> Result<FrameId> {
        self.ensure_registered(file_id)?;

        // Fast path: page already resident
        let hit = self.page_table.lock().lookup(file_id, page_id);
        if let Some(frame_id) = hit {
            let frame = &self.frames[frame_id.0];
            if frame.owner() != Some((file_id, page_id)) {
                return Err(Error::BadBuffer(frame_id));
            }

            frame.pin();
            frame.set_ref();
            self.stats.accesses.fetch_add(1, Ordering::Relaxed);
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(frame_id);
        }

        // Miss: bring the page in (possibly evicting)
        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        let frame_id = self.allocate_frame()?;
        let frame = &self.frames[frame_id.0];

        // On failure the frame stays empty and reusable; no page-table entry
        // exists yet, so nothing to unwind
        {
            let mut page = frame.page_mut();
            self.with_file(file_id, |file| file.read_page(page_id, &mut page))?;
        }

        self.stats.disk_reads.fetch_add(1, Ordering::Relaxed);
        self.stats.accesses.fetch_add(1, Ordering::Relaxed);

        self.page_table.lock().insert(file_id, page_id, frame_id)?;

        frame.set_owner(Some((file_id, page_id)));
        frame.pin();

        Ok(frame_id)
    }

    // ========================================================================
    // Internal: Frame allocation and eviction
    // ========================================================================

    /// Get an empty frame, evicting a victim if necessary.
    ///
    /// Order matters: write back first, then unlink from the page table,
    /// then hand the frame out for overwrite. A failed write-back leaves
    /// the occupant resident and intact.
    fn allocate_frame(&self) -> Result<FrameId> {
        let frame_id = self.replacer.lock().pick_victim(&self.frames)?;
        let frame = &self.frames[frame_id.0];

        if let Some((file_id, page_id)) = frame.owner() {
            if frame.is_dirty() {
                {
                    let page = frame.page();
                    self.with_file(file_id, |file| file.write_page(page_id, &page))?;
                }
                self.stats.disk_writes.fetch_add(1, Ordering::Relaxed);
            }

            if !self.page_table.lock().remove(file_id, page_id) {
                // The descriptor said resident but the table disagrees; the
                // page is already durable, so surface the divergence rather
                // than half-clearing the frame
                return Err(Error::HashTable);
            }

            log::trace!("evicted {} of {} from {}", page_id, file_id, frame_id);
            frame.reset();
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }

        Ok(frame_id)
    }

    // ========================================================================
    // Internal: File registry access
    // ========================================================================

    fn ensure_registered(&self, file_id: FileId) -> Result<()> {
        if self.files.read().contains_key(&file_id) {
            Ok(())
        } else {
            Err(Error::UnknownFile(file_id))
        }
    }

    /// Run `op` against a registered file.
    ///
    /// The registry locks are held only for the duration of `op`; callers
    /// must not nest `with_file` calls, or an eviction inside the outer call
    /// could self-deadlock on the file mutex.
    fn with_file<R>(
        &self,
        file_id: FileId,
        op: impl FnOnce(&mut dyn PagedFile) -> Result<R>,
    ) -> Result<R> {
        let files = self.files.read();
        let file = files.get(&file_id).ok_or(Error::UnknownFile(file_id))?;
        let mut file = file.lock();
        op(file.as_mut())
    }

    // ========================================================================
    // Test support
    // ========================================================================

    /// Walk the frame table and page table and assert they agree.
    #[cfg(test)]
    pub(crate) fn check_consistency(&self) {
        let table = self.page_table.lock();

        // Every entry names a frame that agrees with it
        for (file, page, frame_id) in table.iter() {
            assert_eq!(
                self.frames[frame_id.0].owner(),
                Some((file, page)),
                "{} disagrees with its page-table entry",
                frame_id
            );
        }

        // Every resident frame has its entry; empty frames carry no state
        let mut resident = 0;
        for (index, frame) in self.frames.iter().enumerate() {
            match frame.owner() {
                Some((file, page)) => {
                    resident += 1;
                    assert_eq!(table.lookup(file, page), Some(FrameId::new(index)));
                }
                None => {
                    assert!(!frame.is_dirty());
                    assert_eq!(frame.pin_count(), 0);
                }
            }
        }
        assert_eq!(resident, table.len());
    }
}

impl Drop for BufferPoolManager {
    /// Write back every dirty resident page.
    ///
    /// There is no error surface here; callers who need to observe failures
    /// must `flush_file` explicitly before dropping the pool. Failures are
    /// logged and the remaining frames still get their chance.
    fn drop(&mut self) {
        for frame in &self.frames {
            let Some((file_id, page_id)) = frame.owner() else {
                continue;
            };
            if !frame.is_dirty() {
                continue;
            }

            let page = frame.page();
            if let Err(e) = self.with_file(file_id, |file| file.write_page(page_id, &page)) {
                log::error!(
                    "write-back of {} in {} failed during shutdown: {}",
                    page_id,
                    file_id,
                    e
                );
            } else {
                self.stats.disk_writes.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
