use crate::access::heap::HeapFile;
use crate::catalog::schema::Schema;
use crate::storage::error::StorageResult;
use crate::storage::page::TableId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Assigns table identities and retains the heap file instances.
///
/// Identity is the registry's own sequence number, not a property of the
/// file: identifiers are handed out in registration order and are unique
/// for the process lifetime. Registration is keyed by canonical path, so
/// registering the same file twice returns the same identifier and the
/// same heap file instance rather than opening a second handle.
pub struct TableRegistry {
    inner: RwLock<RegistryInner>,
}

struct RegistryInner {
    by_path: HashMap<PathBuf, TableId>,
    tables: HashMap<TableId, Arc<HeapFile>>,
    next_table_id: u32,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                by_path: HashMap::new(),
                tables: HashMap::new(),
                next_table_id: 0,
            }),
        }
    }

    /// Opens the heap file at `path` under a fresh table identity, or
    /// returns the already-registered instance for that canonical path.
    pub fn register(&self, path: &Path, schema: Arc<Schema>) -> StorageResult<Arc<HeapFile>> {
        let canonical = path.canonicalize()?;
        let mut inner = self.inner.write();

        if let Some(&table_id) = inner.by_path.get(&canonical) {
            if let Some(heap_file) = inner.tables.get(&table_id) {
                return Ok(Arc::clone(heap_file));
            }
        }

        let table_id = TableId(inner.next_table_id);
        let heap_file = Arc::new(HeapFile::open(&canonical, table_id, schema)?);
        inner.next_table_id += 1;
        inner.by_path.insert(canonical, table_id);
        inner.tables.insert(table_id, Arc::clone(&heap_file));

        log::debug!("registered {} as {}", path.display(), table_id);

        Ok(heap_file)
    }

    /// Resolves a table identity back to its heap file. Used by the
    /// buffer pool to read pages on a cache miss.
    pub fn heap_file(&self, table_id: TableId) -> Option<Arc<HeapFile>> {
        self.inner.read().tables.get(&table_id).cloned()
    }

    pub fn table_count(&self) -> usize {
        self.inner.read().tables.len()
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}
