use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::storage::page::{Page, PageNo};

pub mod disk;
pub mod memory;

pub use disk::DiskFile;
pub use memory::MemoryFile;

/// Process-unique identity of a page file. Used together with a page
/// number as the key of the page directory.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

static NEXT_FILE_ID: AtomicU32 = AtomicU32::new(1);

impl FileId {
    /// Hand out a new identity, never reused within the process.
    pub fn next() -> FileId {
        FileId(NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for FileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Durable page storage keyed by page number. This is the only
/// abstraction point the buffer pool calls through.
pub trait PageFile: Debug + Send {
    fn id(&self) -> FileId;

    /// Read the page into the given buffer.
    fn read_page(&mut self, page_no: PageNo, page: &mut Page) -> Result<()>;

    /// Write the buffer as the content of the page.
    fn write_page(&mut self, page_no: PageNo, page: &Page) -> Result<()>;

    /// Allocate a new page and return its number.
    fn allocate_page(&mut self) -> Result<PageNo>;

    /// Release the storage of the page.
    fn dispose_page(&mut self, page_no: PageNo) -> Result<()>;

    /// Flushes any buffered data to underlying storage medium.
    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A page file shared between its owner and the buffer pool, the pool
/// writes dirty victims back to whichever file owns them.
pub type SharedFile = Arc<Mutex<dyn PageFile>>;

/// Wrap a page file for use with the buffer pool.
pub fn shared<F: PageFile + 'static>(file: F) -> SharedFile {
    Arc::new(Mutex::new(file))
}
