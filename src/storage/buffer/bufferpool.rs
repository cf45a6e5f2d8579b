use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, RwLock};

use log::{debug, warn};

use super::directory::{directory_capacity, PageDirectory};
use super::frame::FrameDesc;
use super::guard::PageGuard;
use super::replacer::{ClockReplacer, Replacer};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::file::{FileId, SharedFile};
use crate::storage::page::{FrameId, Page, PageNo};

/// The buffer pool is responsible for moving physical pages back and forth
/// from main memory to the page files. The caller asks for a page by its
/// (file, page number) and does not know whether the page is already in
/// memory or has to be read from the file.
///
/// This is the single-threaded core, [`BufferPoolManager`] serializes the
/// access to it.
pub(crate) struct BufferPool {
    pool_size: usize,
    /// frame descriptors, the index is the FrameId.
    frames: Vec<FrameDesc>,
    /// page buffers, index aligned with `frames`.
    pages: Vec<Arc<RwLock<Page>>>,
    /// (file, page number) of every valid frame.
    directory: PageDirectory,
    replacer: ClockReplacer,
}

impl BufferPool {
    pub(crate) fn new(pool_size: usize) -> Result<Self> {
        if pool_size == 0 {
            return Err(Error::Value("buffer pool size must be larger than zero".to_string()));
        }
        let frames = (0..pool_size).map(FrameDesc::new).collect();
        let pages = (0..pool_size).map(|_| Arc::new(RwLock::new(Page::new()))).collect();
        let directory = PageDirectory::new(directory_capacity(pool_size));
        let replacer = ClockReplacer::new(pool_size)?;
        Ok(BufferPool { pool_size, frames, pages, directory, replacer })
    }

    /// Pick a frame for reuse with the clock replacer. A dirty victim is
    /// written back to its file first, a failed write aborts the search
    /// and leaves the victim untouched. The returned frame is free.
    fn alloc_frame(&mut self) -> Result<FrameId> {
        let frame_id =
            self.replacer.victim(&mut self.frames).ok_or(Error::BufferPoolNoAvailableFrame)?;
        let frame = &mut self.frames[frame_id];
        if frame.valid {
            let Some(file_id) = frame.file_id else {
                return Err(Error::BadBuffer(frame_id));
            };
            if frame.dirty {
                write_back(frame, &self.pages[frame_id])?;
                frame.dirty = false;
            }
            self.directory.remove(file_id, frame.page_no)?;
            debug!("evicted page {} of file {} from frame {}", frame.page_no, file_id, frame_id);
        }
        frame.clear();
        Ok(frame_id)
    }

    /// Pin the page, reading it from the file if it is not resident.
    pub(crate) fn fetch_page(&mut self, file: &SharedFile, page_no: PageNo) -> Result<FrameId> {
        let file_id = file.lock()?.id();
        if let Some(frame_id) = self.directory.lookup(file_id, page_no) {
            let frame = &mut self.frames[frame_id];
            frame.pin_count += 1;
            frame.refbit = true;
            return Ok(frame_id);
        }

        let frame_id = self.alloc_frame()?;
        {
            let mut page = self.pages[frame_id].write()?;
            file.lock()?.read_page(page_no, &mut page)?;
        }
        self.directory.insert(file_id, page_no, frame_id)?;
        self.frames[frame_id].set(Arc::clone(file), file_id, page_no);
        debug!("read page {} of file {} into frame {}", page_no, file_id, frame_id);
        Ok(frame_id)
    }

    /// Drop one pin of the page. Dirty is sticky, passing false never
    /// clears it.
    pub(crate) fn unpin_page(&mut self, file_id: FileId, page_no: PageNo, dirty: bool) -> Result<()> {
        let not_pinned = Error::PageNotPinned { file: file_id, page_no };
        let Some(frame_id) = self.directory.lookup(file_id, page_no) else {
            return Err(not_pinned);
        };
        let frame = &mut self.frames[frame_id];
        if frame.pin_count == 0 {
            return Err(not_pinned);
        }
        frame.pin_count -= 1;
        if dirty {
            frame.dirty = true;
        }
        Ok(())
    }

    /// Drop the pin held by a guard. The guard pins one binding of the
    /// frame, if the page was disposed or the frame rebound since, the pin
    /// is gone and `PageNotPinned` is reported without touching the frame.
    pub(crate) fn unpin_guard(
        &mut self,
        file_id: FileId,
        page_no: PageNo,
        frame_id: FrameId,
        generation: u64,
        dirty: bool,
    ) -> Result<()> {
        if self.directory.lookup(file_id, page_no) != Some(frame_id)
            || !self.holds(frame_id, generation)
        {
            return Err(Error::PageNotPinned { file: file_id, page_no });
        }
        self.unpin_page(file_id, page_no, dirty)
    }

    /// Whether the frame still carries the binding of the given generation.
    pub(crate) fn holds(&self, frame_id: FrameId, generation: u64) -> bool {
        let frame = &self.frames[frame_id];
        frame.valid && frame.generation == generation
    }

    /// Allocate a new page in the file and pin it into a zeroed frame.
    ///
    /// The page stays allocated in the file if no frame can be found.
    pub(crate) fn new_page(&mut self, file: &SharedFile) -> Result<(PageNo, FrameId)> {
        let (file_id, page_no) = {
            let mut f = file.lock()?;
            (f.id(), f.allocate_page()?)
        };
        let frame_id = self.alloc_frame()?;
        self.directory.insert(file_id, page_no, frame_id)?;
        self.pages[frame_id].write()?.clear();
        self.frames[frame_id].set(Arc::clone(file), file_id, page_no);
        debug!("allocated page {} of file {} in frame {}", page_no, file_id, frame_id);
        Ok((page_no, frame_id))
    }

    /// Drop the page from the pool without writing it back, then release
    /// it in the file. Only the outcome of the file release is reported,
    /// a page that is not resident is not an error.
    pub(crate) fn dispose_page(&mut self, file: &SharedFile, page_no: PageNo) -> Result<()> {
        let file_id = file.lock()?.id();
        if let Ok(frame_id) = self.directory.remove(file_id, page_no) {
            debug!("discarded page {} of file {} from frame {}", page_no, file_id, frame_id);
            self.frames[frame_id].clear();
        }
        file.lock()?.dispose_page(page_no)
    }

    /// Write back every dirty page of the file and unbind all its frames.
    ///
    /// Not atomic: hitting a pinned page or a failed write stops the scan,
    /// frames processed before stay flushed and unbound.
    pub(crate) fn flush_file(&mut self, file_id: FileId) -> Result<()> {
        for frame_id in 0..self.pool_size {
            let frame = &mut self.frames[frame_id];
            if !frame.is_bound_to(file_id) {
                continue;
            }
            if !frame.valid {
                return Err(Error::BadBuffer(frame_id));
            }
            if frame.pin_count > 0 {
                return Err(Error::PagePinned { file: file_id, page_no: frame.page_no });
            }
            if frame.dirty {
                write_back(frame, &self.pages[frame_id])?;
                frame.dirty = false;
            }
            self.directory.remove(file_id, frame.page_no)?;
            debug!("flushed page {} of file {} from frame {}", frame.page_no, file_id, frame_id);
            frame.clear();
        }
        Ok(())
    }

    pub(crate) fn page(&self, frame_id: FrameId) -> Arc<RwLock<Page>> {
        Arc::clone(&self.pages[frame_id])
    }

    pub(crate) fn frame(&self, frame_id: FrameId) -> &FrameDesc {
        &self.frames[frame_id]
    }

    pub(crate) fn lookup(&self, file_id: FileId, page_no: PageNo) -> Option<&FrameDesc> {
        self.directory.lookup(file_id, page_no).map(|frame_id| &self.frames[frame_id])
    }

    pub(crate) fn pool_size(&self) -> usize {
        self.pool_size
    }
}

fn write_back(frame: &FrameDesc, page: &RwLock<Page>) -> Result<()> {
    let Some(file) = frame.file.as_ref() else {
        return Err(Error::BadBuffer(frame.frame_id));
    };
    let page = page.read()?;
    file.lock()?.write_page(frame.page_no, &page)?;
    debug!("wrote back page {} from frame {}", frame.page_no, frame.frame_id);
    Ok(())
}

impl Drop for BufferPool {
    /// Write back all dirty pages, pinned or not. Failures can only be
    /// logged.
    fn drop(&mut self) {
        for (frame, page) in self.frames.iter().zip(self.pages.iter()) {
            if frame.valid && frame.dirty {
                if let Err(err) = write_back(frame, page) {
                    warn!("failed to write back page {} on teardown: {}", frame.page_no, err);
                }
            }
        }
    }
}

impl Display for BufferPool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "buffer pool: {} frames, clock hand at {}", self.pool_size, self.replacer.hand())?;
        for frame in &self.frames {
            write!(f, "{}\t", frame.frame_id)?;
            match frame.file_id {
                Some(file_id) if frame.valid => write!(f, "{}:{}", file_id, frame.page_no)?,
                _ => write!(f, "-")?,
            }
            write!(f, "\tpin: {}", frame.pin_count)?;
            for (set, flag) in [(frame.valid, "valid"), (frame.dirty, "dirty"), (frame.refbit, "ref")] {
                if set {
                    write!(f, " {}", flag)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Buffer pool manager wrap buffer pool with a mutex so pages can be
/// handed out as guards, basically all the heavy lifting happens in the
/// buffer pool.
///
/// Cloning the manager shares the pool. The pool writes back its dirty
/// pages when the last manager and the last page guard are dropped.
#[derive(Clone)]
pub struct BufferPoolManager {
    inner: Arc<Mutex<BufferPool>>,
    sync_on_flush: bool,
}

impl BufferPoolManager {
    pub fn new(pool_size: usize) -> Result<Self> {
        let inner = BufferPool::new(pool_size)?;
        Ok(BufferPoolManager { inner: Arc::new(Mutex::new(inner)), sync_on_flush: false })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let mut bpm = BufferPoolManager::new(cfg.pool_size)?;
        bpm.sync_on_flush = cfg.sync_on_flush;
        Ok(bpm)
    }

    /// Fetch the page, pinned until the returned guard is released.
    pub fn fetch_page(&self, file: &SharedFile, page_no: PageNo) -> Result<PageGuard> {
        let mut inner = self.inner.lock()?;
        let frame_id = inner.fetch_page(file, page_no)?;
        self.guard(&inner, frame_id)
    }

    /// Allocate a new page in the file, the guard carries its page number.
    pub fn new_page(&self, file: &SharedFile) -> Result<PageGuard> {
        let mut inner = self.inner.lock()?;
        let (_, frame_id) = inner.new_page(file)?;
        self.guard(&inner, frame_id)
    }

    /// Discard the page from the pool, even if dirty, and release it in the
    /// file. Guards still held on the page go stale: their accesses and
    /// their release report `PageNotPinned`, even once the page number is
    /// reused.
    pub fn dispose_page(&self, file: &SharedFile, page_no: PageNo) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.dispose_page(file, page_no)
    }

    /// Write back and evict every page of the file. Fails with `PagePinned`
    /// if a page of the file is still held.
    pub fn flush_file(&self, file: &SharedFile) -> Result<()> {
        let file_id = file.lock()?.id();
        self.inner.lock()?.flush_file(file_id)?;
        if self.sync_on_flush {
            file.lock()?.sync()?;
        }
        Ok(())
    }

    pub fn pool_size(&self) -> Result<usize> {
        Ok(self.inner.lock()?.pool_size())
    }

    /// Pin count of the page, None if it is not resident.
    pub fn pin_count(&self, file: &SharedFile, page_no: PageNo) -> Result<Option<u32>> {
        let file_id = file.lock()?.id();
        Ok(self.inner.lock()?.lookup(file_id, page_no).map(|f| f.pin_count))
    }

    /// Dirty flag of the page, None if it is not resident.
    pub fn is_dirty(&self, file: &SharedFile, page_no: PageNo) -> Result<Option<bool>> {
        let file_id = file.lock()?.id();
        Ok(self.inner.lock()?.lookup(file_id, page_no).map(|f| f.dirty))
    }

    fn guard(&self, inner: &BufferPool, frame_id: FrameId) -> Result<PageGuard> {
        let frame = inner.frame(frame_id);
        let file_id = frame.file_id.ok_or(Error::BadBuffer(frame_id))?;
        Ok(PageGuard::new(
            Arc::clone(&self.inner),
            file_id,
            frame.page_no,
            frame_id,
            frame.generation,
            inner.page(frame_id),
        ))
    }
}

impl Display for BufferPoolManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.inner.lock() {
            Ok(inner) => write!(f, "{}", inner),
            Err(_) => write!(f, "buffer pool: poisoned"),
        }
    }
}
