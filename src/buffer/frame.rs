//! Frame - a slot in the buffer pool.
//!
//! A [`Frame`] holds a [`Page`] plus the descriptor the buffer pool needs:
//! - Which (file, page) is loaded, if any
//! - Pin count for reference counting
//! - Dirty flag for write-back tracking
//! - Reference bit consumed by the clock sweep

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FileId, PageId};
use crate::storage::page::Page;

/// A frame in the buffer pool.
///
/// Frames are the "slots" in the buffer pool. Each frame can hold one page
/// of one registered file. The pool has a fixed number of frames allocated
/// at startup.
///
/// A frame is *valid* exactly when it has an owner; every invalidation path
/// goes through [`Frame::reset`], so a frame can never keep a stale file
/// identity after it stops holding a page.
///
/// # Interior Mutability
/// - `page`: `RwLock` for read/write access to the bytes
/// - `owner`: `Mutex` for safe updates of the identity
/// - `pin_count`, `dirty`, `ref_bit`: atomics
pub struct Frame {
    /// The page data, protected by RwLock.
    page: RwLock<Page>,

    /// Which (file, page) is currently loaded, or None if the frame is empty.
    owner: Mutex<Option<(FileId, PageId)>>,

    /// Number of active references to this frame.
    pin_count: AtomicU32,

    /// Whether the page has been modified since loading.
    dirty: AtomicBool,

    /// Second-chance hint, set on every cache hit.
    ref_bit: AtomicBool,
}

impl Frame {
    /// Create a new empty frame.
    pub fn new() -> Self {
        Self {
            page: RwLock::new(Page::new()),
            owner: Mutex::new(None),
            pin_count: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
            ref_bit: AtomicBool::new(false),
        }
    }

    // ========================================================================
    // Page access (RwLock)
    // ========================================================================

    /// Acquire read lock on the page.
    #[inline]
    pub fn page(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Acquire write lock on the page.
    #[inline]
    pub fn page_mut(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }

    // ========================================================================
    // Identity management (Mutex for interior mutability)
    // ========================================================================

    /// Get the (file, page) identity of the loaded page.
    #[inline]
    pub fn owner(&self) -> Option<(FileId, PageId)> {
        *self.owner.lock()
    }

    /// Set the (file, page) identity.
    #[inline]
    pub fn set_owner(&self, owner: Option<(FileId, PageId)>) {
        *self.owner.lock() = owner;
    }

    /// Check if the frame holds a resident page.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.owner().is_some()
    }

    // ========================================================================
    // Pin count operations (Atomic)
    // ========================================================================

    /// Increment the pin count. Returns the new pin count.
    #[inline]
    pub fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Decrement the pin count. Returns the new pin count.
    ///
    /// # Panics
    /// Panics if pin count is already 0.
    #[inline]
    pub fn unpin(&self) -> u32 {
        let old = self.pin_count.fetch_sub(1, Ordering::Relaxed);
        assert!(old > 0, "pin count underflow");
        old - 1
    }

    /// Get the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Relaxed)
    }

    /// Check if the frame is currently pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    // ========================================================================
    // Dirty flag operations (Atomic)
    // ========================================================================

    /// Mark the frame as dirty (modified).
    #[inline]
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Relaxed);
    }

    /// Clear the dirty flag.
    #[inline]
    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::Relaxed);
    }

    /// Check if the frame is dirty.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }

    // ========================================================================
    // Reference bit operations (Atomic)
    // ========================================================================

    /// Set the reference bit. Called on every cache hit.
    #[inline]
    pub fn set_ref(&self) {
        self.ref_bit.store(true, Ordering::Relaxed);
    }

    /// Clear the reference bit and return its previous value.
    ///
    /// The clock sweep uses this to grant a second chance in one step.
    #[inline]
    pub fn take_ref(&self) -> bool {
        self.ref_bit.swap(false, Ordering::Relaxed)
    }

    /// Check the reference bit.
    #[inline]
    pub fn has_ref(&self) -> bool {
        self.ref_bit.load(Ordering::Relaxed)
    }

    // ========================================================================
    // Frame state transitions
    // ========================================================================

    /// Reset the descriptor to empty state.
    ///
    /// Called at every invalidation point (eviction, flush, dispose). The
    /// page bytes are left alone; the next occupant overwrites them in full.
    pub fn reset(&self) {
        self.set_owner(None);
        self.pin_count.store(0, Ordering::Relaxed);
        self.dirty.store(false, Ordering::Relaxed);
        self.ref_bit.store(false, Ordering::Relaxed);
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}
