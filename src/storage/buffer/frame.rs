use std::fmt::{Debug, Formatter};

use crate::storage::file::{FileId, SharedFile};
use crate::storage::page::{FrameId, PageNo};

/// Per-frame bookkeeping of the buffer pool. The frame id equals the
/// position in the frame table and never changes.
pub struct FrameDesc {
    pub frame_id: FrameId,
    /// Owning file, none if the frame is free.
    pub file: Option<SharedFile>,
    pub file_id: Option<FileId>,
    /// Only meaningful while `valid`.
    pub page_no: PageNo,
    pub pin_count: u32,
    pub dirty: bool,
    pub valid: bool,
    /// Referenced since the clock hand last passed.
    pub refbit: bool,
    /// Bumped on every bind and reset, a guard pins one generation.
    pub generation: u64,
}

impl FrameDesc {
    pub fn new(frame_id: FrameId) -> Self {
        FrameDesc {
            frame_id,
            file: None,
            file_id: None,
            page_no: 0,
            pin_count: 0,
            dirty: false,
            valid: false,
            refbit: false,
            generation: 0,
        }
    }

    /// Bind the frame to a page, pinned once.
    pub fn set(&mut self, file: SharedFile, file_id: FileId, page_no: PageNo) {
        self.file = Some(file);
        self.file_id = Some(file_id);
        self.page_no = page_no;
        self.pin_count = 1;
        self.dirty = false;
        self.valid = true;
        self.refbit = true;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Reset to a free frame.
    pub fn clear(&mut self) {
        self.file = None;
        self.file_id = None;
        self.page_no = 0;
        self.pin_count = 0;
        self.dirty = false;
        self.valid = false;
        self.refbit = false;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn is_bound_to(&self, file_id: FileId) -> bool {
        self.file_id == Some(file_id)
    }
}

impl Debug for FrameDesc {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDesc")
            .field("frame_id", &self.frame_id)
            .field("file_id", &self.file_id)
            .field("page_no", &self.page_no)
            .field("pin_count", &self.pin_count)
            .field("dirty", &self.dirty)
            .field("valid", &self.valid)
            .field("refbit", &self.refbit)
            .field("generation", &self.generation)
            .finish()
    }
}
