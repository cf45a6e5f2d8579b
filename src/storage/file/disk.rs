use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use super::{FileId, PageFile};
use crate::error::{Error, Result};
use crate::storage::page::{Page, PageNo, PAGE_SIZE};

const MAGIC: u32 = 0x5042_5546;

/// Page 0 of every disk file. Disposed pages form a chain starting at
/// `free_head`, each free page stores the next one in its first 4 bytes,
/// 0 terminates the chain.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct FileHeader {
    magic: u32,
    /// Number of pages in the file, header included.
    page_count: u32,
    free_head: PageNo,
}

/// A page file stored on disk, data pages are numbered from 1.
///
/// The file is locked exclusively while open.
#[derive(Debug)]
pub struct DiskFile {
    id: FileId,
    path: PathBuf,
    file: File,
    header: FileHeader,
    free: HashSet<PageNo>,
}

impl DiskFile {
    /// Create a new empty page file, truncating any existing one.
    pub fn create(path: impl AsRef<Path>) -> Result<DiskFile> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).create(true).truncate(true).open(&path)?;
        file.try_lock_exclusive()?;
        let header = FileHeader { magic: MAGIC, page_count: 1, free_head: 0 };
        let mut df = DiskFile { id: FileId::next(), path, file, header, free: HashSet::new() };
        df.write_header()?;
        Ok(df)
    }

    /// Open an existing page file.
    pub fn open(path: impl AsRef<Path>) -> Result<DiskFile> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        file.try_lock_exclusive()?;

        let mut buf = Page::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut buf)?;
        let header: FileHeader = bincode::deserialize(&buf)?;
        if header.magic != MAGIC {
            return Err(Error::Value(format!("{} is not a page file", path.display())));
        }
        if header.page_count == 0 {
            return Err(Error::Value(format!("{}: header claims no pages", path.display())));
        }

        let mut df = DiskFile { id: FileId::next(), path, file, header, free: HashSet::new() };
        let mut next = df.header.free_head;
        while next != 0 {
            if next >= df.header.page_count || !df.free.insert(next) {
                return Err(Error::Value(format!(
                    "{}: corrupted free list at page {}",
                    df.path.display(),
                    next
                )));
            }
            next = df.read_next_free(next)?;
        }
        Ok(df)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data pages currently allocated.
    pub fn num_pages(&self) -> usize {
        self.header.page_count as usize - 1 - self.free.len()
    }

    fn offset(page_no: PageNo) -> u64 {
        page_no as u64 * PAGE_SIZE as u64
    }

    fn check(&self, page_no: PageNo) -> Result<()> {
        if page_no == 0 || page_no >= self.header.page_count || self.free.contains(&page_no) {
            return Err(Error::InvalidPage { file: self.id, page_no });
        }
        Ok(())
    }

    fn write_raw(&mut self, page_no: PageNo, data: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(Self::offset(page_no)))?;
        self.file.write_all(data)?;
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        let mut buf = Page::new();
        let encoded = bincode::serialize(&self.header)?;
        buf[..encoded.len()].copy_from_slice(&encoded);
        self.write_raw(0, &buf)
    }

    fn read_next_free(&mut self, page_no: PageNo) -> Result<PageNo> {
        let mut next = [0u8; 4];
        self.file.seek(SeekFrom::Start(Self::offset(page_no)))?;
        self.file.read_exact(&mut next)?;
        Ok(PageNo::from_le_bytes(next))
    }
}

impl PageFile for DiskFile {
    fn id(&self) -> FileId {
        self.id
    }

    fn read_page(&mut self, page_no: PageNo, page: &mut Page) -> Result<()> {
        self.check(page_no)?;
        self.file.seek(SeekFrom::Start(Self::offset(page_no)))?;
        self.file.read_exact(page)?;
        Ok(())
    }

    fn write_page(&mut self, page_no: PageNo, page: &Page) -> Result<()> {
        self.check(page_no)?;
        self.write_raw(page_no, page)
    }

    fn allocate_page(&mut self) -> Result<PageNo> {
        let page_no = if self.header.free_head != 0 {
            let page_no = self.header.free_head;
            self.header.free_head = self.read_next_free(page_no)?;
            self.free.remove(&page_no);
            page_no
        } else {
            let page_no = self.header.page_count;
            self.header.page_count = page_no
                .checked_add(1)
                .ok_or_else(|| Error::Value(format!("{} is full", self.path.display())))?;
            page_no
        };
        self.write_raw(page_no, &Page::new())?;
        self.write_header()?;
        Ok(page_no)
    }

    fn dispose_page(&mut self, page_no: PageNo) -> Result<()> {
        self.check(page_no)?;
        let mut buf = Page::new();
        buf[..4].copy_from_slice(&self.header.free_head.to_le_bytes());
        self.write_raw(page_no, &buf)?;
        self.header.free_head = page_no;
        self.free.insert(page_no);
        self.write_header()
    }

    fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_file_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("data.pb");

        let mut f = DiskFile::create(&path)?;
        let p1 = f.allocate_page()?;
        let p2 = f.allocate_page()?;
        let p3 = f.allocate_page()?;
        assert_eq!((1, 2, 3), (p1, p2, p3));

        let mut page = Page::new();
        page[..5].copy_from_slice(b"hello");
        f.write_page(p2, &page)?;
        f.dispose_page(p1)?;
        f.dispose_page(p3)?;
        f.sync()?;
        drop(f);

        // Scenario: content and free list survive a reopen.
        let mut f = DiskFile::open(&path)?;
        assert_eq!(1, f.num_pages());
        let mut out = Page::new();
        f.read_page(p2, &mut out)?;
        assert_eq!(page, out);
        assert!(matches!(f.read_page(p1, &mut out), Err(Error::InvalidPage { .. })));
        assert!(matches!(f.write_page(p3, &out), Err(Error::InvalidPage { .. })));
        assert!(matches!(f.read_page(0, &mut out), Err(Error::InvalidPage { .. })));

        // Scenario: free pages are reused last-disposed first, zero filled.
        assert_eq!(p3, f.allocate_page()?);
        assert_eq!(p1, f.allocate_page()?);
        assert_eq!(4, f.allocate_page()?);
        f.read_page(p3, &mut out)?;
        assert_eq!(Page::new(), out);
        assert_eq!(4, f.num_pages());

        Ok(())
    }

    #[test]
    fn test_disk_file_rejects_garbage() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("garbage");
        std::fs::write(&path, vec![0xab; PAGE_SIZE])?;
        assert!(matches!(DiskFile::open(&path), Err(Error::Value(_))));
        Ok(())
    }

    #[test]
    fn test_disk_file_rejects_empty_header() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("empty");
        let mut buf = Page::new();
        let header = FileHeader { magic: MAGIC, page_count: 0, free_head: 0 };
        let encoded = bincode::serialize(&header)?;
        buf[..encoded.len()].copy_from_slice(&encoded);
        std::fs::write(&path, &buf[..])?;
        assert!(matches!(DiskFile::open(&path), Err(Error::Value(_))));
        Ok(())
    }
}
