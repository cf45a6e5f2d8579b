use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::warn;

use super::bufferpool::BufferPool;
use crate::error::{Error, Result};
use crate::storage::file::FileId;
use crate::storage::page::{FrameId, Page, PageNo};

/// A pinned page. The guard is the only handle to a page buffer, it
/// holds exactly one pin which is released by [`PageGuard::unpin`] or
/// when the guard is dropped.
///
/// Writing through the guard marks the page dirty on release.
///
/// The guard pins one binding of its frame. Once the page is disposed,
/// accesses and release fail with `PageNotPinned`, even if the page number
/// is later reused.
pub struct PageGuard {
    pool: Arc<Mutex<BufferPool>>,
    file_id: FileId,
    page_no: PageNo,
    frame_id: FrameId,
    generation: u64,
    page: Arc<RwLock<Page>>,
    dirty: bool,
    released: bool,
}

impl PageGuard {
    pub(crate) fn new(
        pool: Arc<Mutex<BufferPool>>,
        file_id: FileId,
        page_no: PageNo,
        frame_id: FrameId,
        generation: u64,
        page: Arc<RwLock<Page>>,
    ) -> Self {
        PageGuard { pool, file_id, page_no, frame_id, generation, page, dirty: false, released: false }
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub fn page_no(&self) -> PageNo {
        self.page_no
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Whether the page is released as modified.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, Page>> {
        self.check_pinned()?;
        Ok(self.page.read()?)
    }

    pub fn write(&mut self) -> Result<RwLockWriteGuard<'_, Page>> {
        self.check_pinned()?;
        self.dirty = true;
        Ok(self.page.write()?)
    }

    fn check_pinned(&self) -> Result<()> {
        if !self.pool.lock()?.holds(self.frame_id, self.generation) {
            return Err(Error::PageNotPinned { file: self.file_id, page_no: self.page_no });
        }
        Ok(())
    }

    /// Release the pin, reporting `PageNotPinned` if the page was disposed
    /// in the meantime.
    pub fn unpin(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        self.released = true;
        let mut pool = self.pool.lock()?;
        pool.unpin_guard(self.file_id, self.page_no, self.frame_id, self.generation, self.dirty)
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.release() {
            warn!("failed to unpin page {} of file {}: {}", self.page_no, self.file_id, err);
        }
    }
}

impl Debug for PageGuard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageGuard")
            .field("file_id", &self.file_id)
            .field("page_no", &self.page_no)
            .field("frame_id", &self.frame_id)
            .field("generation", &self.generation)
            .field("dirty", &self.dirty)
            .finish()
    }
}
