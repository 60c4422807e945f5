pub mod lru;
pub mod replacer;

use crate::catalog::registry::TableRegistry;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{HeapPage, PageId};
use crate::transaction::TransactionId;
use dashmap::DashMap;
use parking_lot::Mutex;
use replacer::Replacer;
use std::sync::Arc;

/// Declared intent of a page fetch. Interpreted by lock management
/// layered above this pool; the read path carries it through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// Shared cache of materialized pages, keyed by page identifier.
///
/// One pool serves every registered table: a fetch that misses resolves
/// the owning heap file through the table registry and reads the page
/// from it, so no caller ever reads a page from disk twice. Cached pages
/// are handed out as `Arc<HeapPage>`; evicting a page only drops the
/// pool's own reference, never one still held by a reader.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<BufferPoolInner>,
}

struct BufferPoolInner {
    page_table: DashMap<PageId, Arc<HeapPage>>,
    replacer: Mutex<Box<dyn Replacer>>,
    registry: Arc<TableRegistry>,
    max_pages: usize,
}

impl BufferPool {
    pub fn new(registry: Arc<TableRegistry>, replacer: Box<dyn Replacer>, max_pages: usize) -> Self {
        Self {
            inner: Arc::new(BufferPoolInner {
                page_table: DashMap::new(),
                replacer: Mutex::new(replacer),
                registry,
                max_pages,
            }),
        }
    }

    /// Returns the page under `page_id`, reading it from the owning heap
    /// file on a miss. The transaction handle and access mode are passed
    /// through opaquely.
    pub fn fetch_page(
        &self,
        txn: Option<TransactionId>,
        page_id: PageId,
        mode: Option<AccessMode>,
    ) -> StorageResult<Arc<HeapPage>> {
        if let Some(page) = self
            .inner
            .page_table
            .get(&page_id)
            .map(|entry| Arc::clone(entry.value()))
        {
            self.inner.replacer.lock().touch(page_id);
            return Ok(page);
        }

        let heap_file = self
            .inner
            .registry
            .heap_file(page_id.table_id)
            .ok_or(StorageError::UnknownTable(page_id.table_id))?;
        let page = Arc::new(heap_file.read_page(page_id)?);
        log::trace!("buffer pool miss on {} (txn: {:?}, mode: {:?})", page_id, txn, mode);

        {
            let mut replacer = self.inner.replacer.lock();
            while self.inner.page_table.len() >= self.inner.max_pages {
                match replacer.evict() {
                    Some(victim) => {
                        self.inner.page_table.remove(&victim);
                        log::trace!("buffer pool evicted {}", victim);
                    }
                    None => break,
                }
            }
            replacer.touch(page_id);
            self.inner.page_table.insert(page_id, Arc::clone(&page));
        }

        Ok(page)
    }

    /// Number of pages currently cached.
    pub fn cached_pages(&self) -> usize {
        self.inner.page_table.len()
    }

    pub fn contains(&self, page_id: PageId) -> bool {
        self.inner.page_table.contains_key(&page_id)
    }
}
