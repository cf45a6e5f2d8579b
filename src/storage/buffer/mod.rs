pub mod bufferpool;
pub mod directory;
pub mod frame;
pub mod guard;
pub mod replacer;

pub use bufferpool::BufferPoolManager;
pub use guard::PageGuard;
