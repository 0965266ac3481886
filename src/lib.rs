//! clockpool - a clock-replacement buffer pool over paged files.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Callers                             │
//! │        (heap files, indexes, catalogs, tests)           │
//! ├─────────────────────────────────────────────────────────┤
//! │  ┌───────────────────────────────────────────────────┐  │
//! │  │            Buffer Pool (buffer/)                  │  │
//! │  │  BufferPoolManager + Frame + PageTable            │  │
//! │  │  ClockReplacer + Statistics + RAII page guards    │  │
//! │  └───────────────────────────────────────────────────┘  │
//! │                           ↓                             │
//! │  ┌───────────────────────────────────────────────────┐  │
//! │  │            Storage Layer (storage/)               │  │
//! │  │  PagedFile trait + DiskManager + MemFile + Page   │  │
//! │  └───────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (FileId, PageId, FrameId, Error, config)
//! - [`buffer`] - Buffer pool management and clock eviction
//! - [`storage`] - Paged file I/O
//!
//! # Quick Start
//! ```no_run
//! use clockpool::{BufferPoolManager, DiskManager};
//!
//! // One pool, any number of registered files
//! let pool = BufferPoolManager::new(64);
//! let dm = DiskManager::create("my_table.db").unwrap();
//! let file = pool.register_file(Box::new(dm));
//!
//! // Allocate a page, write into it, let the guard unpin it
//! let page_id = {
//!     let mut guard = pool.new_page(file).unwrap();
//!     guard.as_mut_slice()[..5].copy_from_slice(b"hello");
//!     guard.page_id()
//! };
//!
//! // Durably write everything back
//! pool.flush_file(file).unwrap();
//! # let _ = page_id;
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, FileId, FrameId, PageId, Result};

pub use buffer::{BufferPoolManager, BufferPoolStats, Frame, StatsSnapshot};
pub use buffer::{PageReadGuard, PageWriteGuard};
pub use storage::page::Page;
pub use storage::{DiskManager, MemFile, PagedFile};
