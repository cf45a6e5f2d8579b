pub mod buffer;
pub mod file;
pub mod page;

pub use buffer::{BufferPoolManager, PageGuard};
pub use file::{shared, DiskFile, FileId, MemoryFile, PageFile, SharedFile};
pub use page::{FrameId, Page, PageNo, PAGE_SIZE};
