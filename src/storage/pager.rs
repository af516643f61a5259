//! Pager
//!
//! Owns the file handle and the page cache.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{DbError, Result};

use super::{Page, PAGE_SIZE};

/// File-backed page cache
///
/// ## Cache Model:
/// - One slot per page number below `max_pages`, filled on first access
/// - Pages are never evicted; running past `max_pages` is a
///   configuration error, not an eviction event
/// - Every buffer belongs to the pager; callers only borrow them
pub struct Pager {
    /// Path of the backing file (for logging)
    path: PathBuf,

    /// Backing file, opened read/write unless `read_only`
    file: File,

    /// Opened with [`Pager::open_read_only`]; nothing is ever written
    read_only: bool,

    /// File length at open time
    file_length: u64,

    /// Pages known to the table (on disk or allocated since open)
    num_pages: u32,

    /// Resident page buffers, indexed by page number
    pages: Vec<Option<Box<Page>>>,

    /// Cache ceiling
    max_pages: u32,
}

impl Pager {
    /// Open or create the backing file
    ///
    /// Fails if the file length is not a whole number of pages, or if the
    /// file holds more pages than the cache may ever load.
    pub fn open(path: &Path, max_pages: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Self::from_file(path, file, false, max_pages)
    }

    /// Open an existing file without write access.
    ///
    /// A missing file is an I/O error rather than a new table, and every
    /// flush is refused.
    pub fn open_read_only(path: &Path, max_pages: u32) -> Result<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        Self::from_file(path, file, true, max_pages)
    }

    fn from_file(path: &Path, file: File, read_only: bool, max_pages: u32) -> Result<Self> {
        let file_length = file.metadata()?.len();

        if file_length % PAGE_SIZE as u64 != 0 {
            return Err(DbError::Corrupted(format!(
                "{} is {} bytes, not a whole number of {}-byte pages",
                path.display(),
                file_length,
                PAGE_SIZE
            )));
        }

        let pages_on_disk = file_length / PAGE_SIZE as u64;
        if pages_on_disk > max_pages as u64 {
            return Err(DbError::Config(format!(
                "{} holds {} pages but the page cache is limited to {}",
                path.display(),
                pages_on_disk,
                max_pages
            )));
        }

        tracing::debug!(
            "Opened {} ({} bytes, {} pages{})",
            path.display(),
            file_length,
            pages_on_disk,
            if read_only { ", read-only" } else { "" }
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            read_only,
            file_length,
            num_pages: pages_on_disk as u32,
            pages: (0..max_pages).map(|_| None).collect(),
            max_pages,
        })
    }

    /// Get the buffer for page `page_num`, loading it on a cache miss
    ///
    /// Pages past the end of the file come back zeroed; asking for one
    /// grows the page count.
    pub fn get_page(&mut self, page_num: u32) -> Result<&mut Page> {
        if page_num >= self.max_pages {
            return Err(DbError::PageOutOfBounds {
                page: page_num,
                max_pages: self.max_pages,
            });
        }

        let slot = page_num as usize;
        if self.pages[slot].is_none() {
            let mut page: Box<Page> = Box::new([0u8; PAGE_SIZE]);

            let pages_on_disk = self.file_length / PAGE_SIZE as u64;
            if (page_num as u64) < pages_on_disk {
                self.file
                    .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
                self.file.read_exact(&mut page[..])?;
                tracing::trace!("Loaded page {} from disk", page_num);
            }

            self.pages[slot] = Some(page);

            if page_num >= self.num_pages {
                self.num_pages = page_num + 1;
            }
        }

        self.pages[slot]
            .as_deref_mut()
            .ok_or_else(|| DbError::Internal(format!("page {} vanished from the cache", page_num)))
    }

    /// A page number that has never been used.
    ///
    /// Rows are never deleted, so there is no free list: new pages always go
    /// at the end of the file.
    pub fn get_unused_page_num(&self) -> u32 {
        self.num_pages
    }

    /// Write resident page `page_num` back to its slot in the file
    pub fn flush(&mut self, page_num: u32) -> Result<()> {
        self.check_writable()?;
        let page = self
            .pages
            .get(page_num as usize)
            .and_then(|slot| slot.as_deref())
            .ok_or_else(|| {
                DbError::Internal(format!("tried to flush non-resident page {}", page_num))
            })?;

        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
        self.file.write_all(&page[..])?;
        Ok(())
    }

    /// Flush every resident page and sync the file
    ///
    /// Returns the number of pages written.
    pub fn flush_all(&mut self) -> Result<usize> {
        self.check_writable()?;
        let mut flushed = 0;
        for page_num in 0..self.num_pages {
            if self.is_resident(page_num) {
                self.flush(page_num)?;
                flushed += 1;
            }
        }
        self.file.sync_all()?;

        let length = self.num_pages as u64 * PAGE_SIZE as u64;
        if length > self.file_length {
            self.file_length = length;
        }

        tracing::debug!("Flushed {} pages to {}", flushed, self.path.display());
        Ok(flushed)
    }

    /// Fail with [`DbError::ReadOnly`] if this pager may not write
    pub fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(DbError::ReadOnly(format!(
                "{} was opened read-only",
                self.path.display()
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// File length as of open or the last `flush_all`
    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    pub fn is_resident(&self, page_num: u32) -> bool {
        matches!(self.pages.get(page_num as usize), Some(Some(_)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
