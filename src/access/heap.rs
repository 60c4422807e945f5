use crate::access::scan::TableScanner;
use crate::access::tuple::TupleId;
use crate::catalog::schema::Schema;
use crate::storage::buffer::BufferPool;
use crate::storage::disk::{DiskManager, PAGE_SIZE};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{HeapPage, PageId, TableId};
use crate::transaction::TransactionId;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// An unordered table stored as consecutive fixed-size pages of one file.
///
/// The heap file is the sole authority for how many pages its table has
/// and for the mapping from page number to byte offset. It exclusively
/// owns the file handle (behind a mutex so the instance can be shared via
/// `Arc`); the schema descriptor is shared and never copied. Mutation is
/// deferred to a later layer: every write entry point fails with
/// `Unsupported`, so the page count of an open heap file never changes.
pub struct HeapFile {
    table_id: TableId,
    schema: Arc<Schema>,
    disk: Mutex<DiskManager>,
}

impl HeapFile {
    /// Opens the backing file. Normally called through the table
    /// registry, which assigns the table id and dedupes instances per
    /// physical file.
    pub fn open(path: &Path, table_id: TableId, schema: Arc<Schema>) -> StorageResult<Self> {
        let disk = DiskManager::open(path)?;
        log::debug!("opened heap file for {} at {}", table_id, path.display());

        Ok(Self {
            table_id,
            schema,
            disk: Mutex::new(disk),
        })
    }

    /// The registry-assigned identity of this table. Stable for the
    /// process lifetime.
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Number of pages implied by the current file length, counting a
    /// partially filled final page as a whole page.
    pub fn page_count(&self) -> StorageResult<u32> {
        let file_len = self.disk.lock().file_len()?;
        Ok(file_len.div_ceil(PAGE_SIZE as u64) as u32)
    }

    /// Reads one page directly from the backing file.
    ///
    /// This is the buffer pool's miss path; scans never call it, they go
    /// through the pool. A page number at or past `page_count()` (or an
    /// identifier for some other table) is `PageNotFound`; a failed read
    /// of an in-range page is `Io`.
    pub fn read_page(&self, page_id: PageId) -> StorageResult<HeapPage> {
        if page_id.table_id != self.table_id || page_id.page_no >= self.page_count()? {
            return Err(StorageError::PageNotFound(page_id));
        }

        let mut data = Box::new([0u8; PAGE_SIZE]);
        self.disk.lock().read_page(page_id.page_no, &mut data)?;

        Ok(HeapPage::from_bytes(page_id, data))
    }

    /// Writing pages belongs to the mutation path, which this storage
    /// core does not implement.
    pub fn write_page(&self, _page: &HeapPage) -> StorageResult<()> {
        Err(StorageError::Unsupported("HeapFile::write_page"))
    }

    pub fn insert_tuple(
        &self,
        _txn: Option<TransactionId>,
        _data: &[u8],
    ) -> StorageResult<TupleId> {
        Err(StorageError::Unsupported("HeapFile::insert_tuple"))
    }

    pub fn delete_tuple(
        &self,
        _txn: Option<TransactionId>,
        _tuple_id: TupleId,
    ) -> StorageResult<()> {
        Err(StorageError::Unsupported("HeapFile::delete_tuple"))
    }

    /// Creates a sequential scan over this table, sourcing every page
    /// through `buffer_pool` on behalf of `txn`. The scan starts closed;
    /// call `open` on it first.
    pub fn scan(
        self: Arc<Self>,
        buffer_pool: BufferPool,
        txn: Option<TransactionId>,
    ) -> TableScanner {
        TableScanner::new(self, buffer_pool, txn)
    }
}
