use std::collections::HashMap;

use super::{FileId, PageFile};
use crate::error::{Error, Result};
use crate::storage::page::{Page, PageNo};

/// A page file that keeps every page in memory. Disposed page numbers
/// are handed out again before the file grows.
#[derive(Debug)]
pub struct MemoryFile {
    id: FileId,
    pages: HashMap<PageNo, Page>,
    free: Vec<PageNo>,
    next_page_no: PageNo,
    reads: usize,
    writes: usize,
}

impl MemoryFile {
    pub fn new() -> MemoryFile {
        MemoryFile {
            id: FileId::next(),
            pages: HashMap::new(),
            free: Vec::new(),
            next_page_no: 0,
            reads: 0,
            writes: 0,
        }
    }

    /// Number of page reads served so far.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Number of page writes served so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Number of allocated pages.
    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    fn invalid(&self, page_no: PageNo) -> Error {
        Error::InvalidPage { file: self.id, page_no }
    }
}

impl Default for MemoryFile {
    fn default() -> Self {
        MemoryFile::new()
    }
}

impl PageFile for MemoryFile {
    fn id(&self) -> FileId {
        self.id
    }

    fn read_page(&mut self, page_no: PageNo, page: &mut Page) -> Result<()> {
        let stored = self.pages.get(&page_no).ok_or_else(|| self.invalid(page_no))?;
        page.copy_from(stored);
        self.reads += 1;
        Ok(())
    }

    fn write_page(&mut self, page_no: PageNo, page: &Page) -> Result<()> {
        let invalid = self.invalid(page_no);
        let stored = self.pages.get_mut(&page_no).ok_or(invalid)?;
        stored.copy_from(page);
        self.writes += 1;
        Ok(())
    }

    fn allocate_page(&mut self) -> Result<PageNo> {
        let page_no = match self.free.pop() {
            Some(page_no) => page_no,
            None => {
                let page_no = self.next_page_no;
                self.next_page_no = page_no
                    .checked_add(1)
                    .ok_or_else(|| Error::Value(format!("file {} is full", self.id)))?;
                page_no
            }
        };
        self.pages.insert(page_no, Page::new());
        Ok(page_no)
    }

    fn dispose_page(&mut self, page_no: PageNo) -> Result<()> {
        if self.pages.remove(&page_no).is_none() {
            return Err(self.invalid(page_no));
        }
        self.free.push(page_no);
        Ok(())
    }
}
