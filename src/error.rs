use std::fmt::{Display, Formatter};
use std::sync::PoisonError;

use config::ConfigError;

use crate::storage::file::FileId;
use crate::storage::page::{FrameId, PageNo};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Internal(String),
    Value(String),
    /// Every frame stayed pinned for two full sweeps of the clock hand.
    BufferPoolNoAvailableFrame,
    /// Unpin of a page that is not resident or whose pin count is already zero.
    PageNotPinned { file: FileId, page_no: PageNo },
    /// Flush found a page of the file still pinned.
    PagePinned { file: FileId, page_no: PageNo },
    /// A frame is associated with a file but not valid.
    BadBuffer(FrameId),
    /// The file does not hold the requested page.
    InvalidPage { file: FileId, page_no: PageNo },
    Io(String),
    PageDirectory(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Internal(s) | Error::Value(s) => {
                write!(f, "{}", s)
            }
            Error::BufferPoolNoAvailableFrame => {
                write!(f, "buffer pool exceeded: all frames are pinned")
            }
            Error::PageNotPinned { file, page_no } => {
                write!(f, "page {} of file {} is not pinned", page_no, file)
            }
            Error::PagePinned { file, page_no } => {
                write!(f, "page {} of file {} is pinned", page_no, file)
            }
            Error::BadBuffer(frame_id) => {
                write!(f, "bad buffer: frame {} is bound to a file but invalid", frame_id)
            }
            Error::InvalidPage { file, page_no } => {
                write!(f, "invalid page {} for file {}", page_no, file)
            }
            Error::Io(s) => write!(f, "io error: {}", s),
            Error::PageDirectory(s) => write!(f, "page directory: {}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for Error {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        Error::Internal(err.to_string())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Internal(err.to_string())
    }
}
