use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::storage::file::FileId;
use crate::storage::page::{FrameId, PageNo};

/// Bucket count for a pool of `pool_size` frames: about 1.2 times the
/// pool size, always odd.
pub fn directory_capacity(pool_size: usize) -> usize {
    (pool_size as f64 * 1.2) as usize | 1
}

/// Maps a resident (file, page) to the frame holding it.
#[derive(Debug)]
pub struct PageDirectory {
    table: HashMap<(FileId, PageNo), FrameId>,
}

impl PageDirectory {
    pub fn new(capacity: usize) -> Self {
        PageDirectory { table: HashMap::with_capacity(capacity) }
    }

    pub fn lookup(&self, file: FileId, page_no: PageNo) -> Option<FrameId> {
        self.table.get(&(file, page_no)).copied()
    }

    /// Register a binding, a (file, page) may be bound at most once.
    pub fn insert(&mut self, file: FileId, page_no: PageNo, frame_id: FrameId) -> Result<()> {
        if let Some(existing) = self.table.get(&(file, page_no)) {
            return Err(Error::PageDirectory(format!(
                "page {} of file {} already bound to frame {}",
                page_no, file, existing
            )));
        }
        self.table.insert((file, page_no), frame_id);
        Ok(())
    }

    pub fn remove(&mut self, file: FileId, page_no: PageNo) -> Result<FrameId> {
        self.table.remove(&(file, page_no)).ok_or_else(|| {
            Error::PageDirectory(format!("page {} of file {} not found", page_no, file))
        })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_capacity() {
        assert_eq!(1, directory_capacity(0));
        assert_eq!(3, directory_capacity(2));
        assert_eq!(13, directory_capacity(10));
        assert_eq!(121, directory_capacity(100));
    }

    #[test]
    fn test_page_directory() -> Result<()> {
        let (f1, f2) = (FileId::next(), FileId::next());
        let mut dir = PageDirectory::new(directory_capacity(4));
        dir.insert(f1, 7, 0)?;
        dir.insert(f2, 7, 1)?;
        assert_eq!(Some(0), dir.lookup(f1, 7));
        assert_eq!(Some(1), dir.lookup(f2, 7));
        assert_eq!(None, dir.lookup(f1, 8));

        // Scenario: duplicate bindings and missing removals are errors.
        assert!(matches!(dir.insert(f1, 7, 3), Err(Error::PageDirectory(_))));
        assert_eq!(Some(0), dir.lookup(f1, 7));
        assert_eq!(0, dir.remove(f1, 7)?);
        assert!(matches!(dir.remove(f1, 7), Err(Error::PageDirectory(_))));
        assert_eq!(1, dir.len());
        Ok(())
    }
}
