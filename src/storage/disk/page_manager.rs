use crate::storage::error::StorageResult;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

pub const PAGE_SIZE: usize = 8192;

/// Read-only access to the fixed-size pages of one backing file.
///
/// The heap file owns the manager (and with it the file handle) and is
/// the only caller; everything else reaches pages through the buffer
/// pool. No write interface exists on this path.
pub struct DiskManager {
    file: File,
}

impl DiskManager {
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new().read(true).open(path)?;

        Ok(Self { file })
    }

    /// Current byte length of the backing file.
    pub fn file_len(&self) -> StorageResult<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Reads the page at `page_no * PAGE_SIZE` into `buf`.
    ///
    /// A final page the file only partially covers is zero-padded to a
    /// full page image; anything short of that is an I/O error, never a
    /// silently truncated read. Callers are expected to have range-checked
    /// `page_no` already, so reading past the end of the file is reported
    /// as an I/O error here rather than a missing page.
    pub fn read_page(&mut self, page_no: u32, buf: &mut [u8; PAGE_SIZE]) -> StorageResult<()> {
        let offset = page_no as u64 * PAGE_SIZE as u64;
        let file_len = self.file_len()?;

        if offset >= file_len {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("page {} starts past end of file (len {})", page_no, file_len),
            )
            .into());
        }

        let covered = (file_len - offset).min(PAGE_SIZE as u64) as usize;

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut buf[..covered])?;
        buf[covered..].fill(0);

        Ok(())
    }
}
