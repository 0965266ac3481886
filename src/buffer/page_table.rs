//! Page table - maps resident (file, page) pairs to their frames.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::common::{Error, FileId, FrameId, PageId, Result};

/// Fixed-capacity hash table from `(FileId, PageId)` to [`FrameId`].
///
/// Collisions are handled with separate chaining. The bucket count is fixed
/// at construction: the table can never hold more entries than the pool has
/// frames, so it is sized once at ~1.2x the pool size and never resizes.
///
/// The buffer pool keeps this table in lockstep with the frame descriptors:
/// a resident frame has exactly one entry here, and every entry names a
/// resident frame.
pub struct PageTable {
    buckets: Vec<Vec<Entry>>,
    len: usize,
}

struct Entry {
    file: FileId,
    page: PageId,
    frame: FrameId,
}

impl PageTable {
    /// Create a table sized for a pool of `pool_size` frames.
    pub fn new(pool_size: usize) -> Self {
        let bucket_count = pool_size * 6 / 5 + 1;
        Self {
            buckets: (0..bucket_count).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    /// Find the frame holding `page` of `file`, if resident.
    pub fn lookup(&self, file: FileId, page: PageId) -> Option<FrameId> {
        self.buckets[self.bucket_of(file, page)]
            .iter()
            .find(|e| e.file == file && e.page == page)
            .map(|e| e.frame)
    }

    /// Record that `page` of `file` now lives in `frame`.
    ///
    /// # Errors
    /// Returns `Error::HashTable` if the key is already present. The pool
    /// never inserts a live duplicate; hitting this means the table and the
    /// frame descriptors have diverged.
    pub fn insert(&mut self, file: FileId, page: PageId, frame: FrameId) -> Result<()> {
        let bucket = self.bucket_of(file, page);
        if self.buckets[bucket]
            .iter()
            .any(|e| e.file == file && e.page == page)
        {
            return Err(Error::HashTable);
        }

        self.buckets[bucket].push(Entry { file, page, frame });
        self.len += 1;
        Ok(())
    }

    /// Remove the entry for `page` of `file`.
    ///
    /// Returns `true` if an entry was removed, `false` if the key was absent.
    pub fn remove(&mut self, file: FileId, page: PageId) -> bool {
        let bucket = self.bucket_of(file, page);
        let chain = &mut self.buckets[bucket];
        match chain.iter().position(|e| e.file == file && e.page == page) {
            Some(index) => {
                chain.swap_remove(index);
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over all entries as `(file, page, frame)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (FileId, PageId, FrameId)> + '_ {
        self.buckets
            .iter()
            .flat_map(|chain| chain.iter().map(|e| (e.file, e.page, e.frame)))
    }

    fn bucket_of(&self, file: FileId, page: PageId) -> usize {
        let mut hasher = DefaultHasher::new();
        (file.0, page.0).hash(&mut hasher);
        (hasher.finish() % self.buckets.len() as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(file: u32, page: u32) -> (FileId, PageId) {
        (FileId::new(file), PageId::new(page))
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut table = PageTable::new(3);
        let (f, p) = key(1, 10);

        assert_eq!(table.lookup(f, p), None);

        table.insert(f, p, FrameId::new(2)).unwrap();
        assert_eq!(table.lookup(f, p), Some(FrameId::new(2)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_same_page_number_different_files() {
        let mut table = PageTable::new(3);
        let (f1, p) = key(1, 7);
        let (f2, _) = key(2, 7);

        table.insert(f1, p, FrameId::new(0)).unwrap();
        table.insert(f2, p, FrameId::new(1)).unwrap();

        assert_eq!(table.lookup(f1, p), Some(FrameId::new(0)));
        assert_eq!(table.lookup(f2, p), Some(FrameId::new(1)));
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut table = PageTable::new(3);
        let (f, p) = key(1, 10);

        table.insert(f, p, FrameId::new(0)).unwrap();
        assert!(table.insert(f, p, FrameId::new(1)).is_err());

        // First mapping untouched
        assert_eq!(table.lookup(f, p), Some(FrameId::new(0)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut table = PageTable::new(3);
        let (f, p) = key(1, 10);

        table.insert(f, p, FrameId::new(0)).unwrap();
        assert!(table.remove(f, p));
        assert_eq!(table.lookup(f, p), None);
        assert!(table.is_empty());

        // Removing an absent key reports false
        assert!(!table.remove(f, p));
    }

    #[test]
    fn test_chains_survive_collisions() {
        // One bucket forces every key into the same chain
        let mut table = PageTable::new(0);
        assert_eq!(table.buckets.len(), 1);

        for page in 0..8 {
            let (f, p) = key(1, page);
            table.insert(f, p, FrameId::new(page as usize)).unwrap();
        }
        assert_eq!(table.len(), 8);

        for page in 0..8 {
            let (f, p) = key(1, page);
            assert_eq!(table.lookup(f, p), Some(FrameId::new(page as usize)));
        }

        let (f, p) = key(1, 3);
        assert!(table.remove(f, p));
        assert_eq!(table.lookup(f, p), None);
        assert_eq!(table.len(), 7);

        // The rest of the chain is intact
        let (f, p) = key(1, 7);
        assert_eq!(table.lookup(f, p), Some(FrameId::new(7)));
    }

    #[test]
    fn test_iter_visits_every_entry() {
        let mut table = PageTable::new(5);
        for page in 0..4 {
            let (f, p) = key(1, page);
            table.insert(f, p, FrameId::new(page as usize)).unwrap();
        }

        let mut seen: Vec<u32> = table.iter().map(|(_, p, _)| p.0).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }
}
