//! Lazy sequential scan over the tuples of a heap file.

use crate::access::heap::HeapFile;
use crate::access::tuple::Tuple;
use crate::storage::buffer::{AccessMode, BufferPool};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{PageId, TupleIter};
use crate::transaction::TransactionId;
use std::sync::Arc;

/// Where a scan currently stands.
///
/// `Open(None)` is the open-but-empty case: the file had no pages when
/// the scan was opened or rewound, so there is nothing to yield but the
/// scan is not misused.
enum ScanState {
    Closed,
    Open(Option<PageCursor>),
    Exhausted,
}

struct PageCursor {
    page_id: PageId,
    tuples: TupleIter,
}

/// Scans every tuple of a heap file in page order, lazily.
///
/// Holds at most one materialized page at any time, so memory use is
/// independent of table size; each page is obtained through the buffer
/// pool, never read from disk directly. The transaction handle is passed
/// through to the pool untouched.
pub struct TableScanner {
    heap_file: Arc<HeapFile>,
    buffer_pool: BufferPool,
    txn: Option<TransactionId>,
    state: ScanState,
}

impl TableScanner {
    pub(crate) fn new(
        heap_file: Arc<HeapFile>,
        buffer_pool: BufferPool,
        txn: Option<TransactionId>,
    ) -> Self {
        Self {
            heap_file,
            buffer_pool,
            txn,
            state: ScanState::Closed,
        }
    }

    /// Positions the scan on the first page of the file. On a zero-page
    /// file the scan opens with nothing to yield.
    pub fn open(&mut self) -> StorageResult<()> {
        self.state = ScanState::Open(self.first_page_cursor()?);
        Ok(())
    }

    /// Whether a tuple is pending.
    ///
    /// When the current page is drained this advances to the following
    /// pages through the buffer pool, skipping however many empty pages
    /// it meets, until it finds a live tuple or runs out of file. Safe to
    /// call repeatedly; it is idempotent when no advancement is needed.
    pub fn has_next(&mut self) -> StorageResult<bool> {
        match &self.state {
            ScanState::Closed => return Err(StorageError::IteratorState("scan is not open")),
            ScanState::Exhausted | ScanState::Open(None) => return Ok(false),
            ScanState::Open(Some(_)) => {}
        }

        loop {
            let cursor = match &mut self.state {
                ScanState::Open(Some(cursor)) => cursor,
                _ => return Ok(false),
            };
            if cursor.tuples.has_next() {
                return Ok(true);
            }

            let next_page_no = cursor.page_id.page_no + 1;
            if next_page_no >= self.heap_file.page_count()? {
                self.state = ScanState::Exhausted;
                return Ok(false);
            }

            let cursor = self.fetch_cursor(next_page_no)?;
            self.state = ScanState::Open(Some(cursor));
        }
    }

    /// Returns the next tuple.
    ///
    /// Re-derives its precondition by calling `has_next` internally, so a
    /// caller that skipped the check still gets a clean `IteratorState`
    /// error rather than a stale tuple.
    pub fn next(&mut self) -> StorageResult<Tuple> {
        if !self.has_next()? {
            return Err(StorageError::IteratorState("scan has no pending tuple"));
        }

        match &mut self.state {
            ScanState::Open(Some(cursor)) => cursor
                .tuples
                .next()
                .ok_or(StorageError::IteratorState("scan has no pending tuple")),
            _ => Err(StorageError::IteratorState("scan has no pending tuple")),
        }
    }

    /// Restarts the scan from the first tuple of page 0, re-fetching the
    /// page through the buffer pool. Valid in every state, including
    /// closed and exhausted.
    pub fn rewind(&mut self) -> StorageResult<()> {
        self.state = ScanState::Open(self.first_page_cursor()?);
        Ok(())
    }

    /// Drops the current page reference and tuple cursor. Pages cached by
    /// the buffer pool stay cached; only the scan's own references go.
    pub fn close(&mut self) {
        self.state = ScanState::Closed;
    }

    fn first_page_cursor(&self) -> StorageResult<Option<PageCursor>> {
        if self.heap_file.page_count()? == 0 {
            return Ok(None);
        }
        Ok(Some(self.fetch_cursor(0)?))
    }

    fn fetch_cursor(&self, page_no: u32) -> StorageResult<PageCursor> {
        let page_id = PageId::new(self.heap_file.table_id(), page_no);
        let page = self
            .buffer_pool
            .fetch_page(self.txn, page_id, Some(AccessMode::ReadOnly))?;

        Ok(PageCursor {
            page_id,
            tuples: TupleIter::new(page),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::registry::TableRegistry;
    use crate::catalog::schema::Schema;
    use crate::storage::buffer::lru::LruReplacer;
    use crate::storage::page::{HeapPage, Page, TableId};
    use anyhow::Result;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Writes a heap file whose pages hold the given tuples, in order.
    fn write_heap_file(path: &Path, pages: &[Vec<&[u8]>]) -> Result<()> {
        let mut bytes = Vec::new();
        for (page_no, tuples) in pages.iter().enumerate() {
            let mut page = HeapPage::new(PageId::new(TableId(0), page_no as u32));
            for tuple in tuples {
                page.insert_tuple(tuple)?;
            }
            bytes.extend_from_slice(page.data());
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }

    struct Fixture {
        _dir: TempDir,
        pool: BufferPool,
        heap: Arc<HeapFile>,
    }

    fn fixture(pages: &[Vec<&[u8]>]) -> Result<Fixture> {
        fixture_with_pool_size(pages, 8)
    }

    fn fixture_with_pool_size(pages: &[Vec<&[u8]>], max_pages: usize) -> Result<Fixture> {
        let dir = TempDir::new()?;
        let path: PathBuf = dir.path().join("scan.db");
        write_heap_file(&path, pages)?;

        let registry = Arc::new(TableRegistry::new());
        let pool = BufferPool::new(Arc::clone(&registry), Box::new(LruReplacer::new()), max_pages);
        let heap = registry.register(&path, Arc::new(Schema::new(vec![])))?;

        Ok(Fixture {
            _dir: dir,
            pool,
            heap,
        })
    }

    fn drain(scanner: &mut TableScanner) -> Result<Vec<Vec<u8>>> {
        let mut out = Vec::new();
        while scanner.has_next()? {
            out.push(scanner.next()?.data);
        }
        Ok(out)
    }

    #[test]
    fn test_full_scan_in_page_order() -> Result<()> {
        let fx = fixture(&[
            vec![b"a0" as &[u8], b"a1"],
            vec![b"b0"],
            vec![b"c0", b"c1", b"c2"],
        ])?;

        let mut scanner = fx.heap.clone().scan(fx.pool.clone(), None);
        scanner.open()?;

        let got = drain(&mut scanner)?;
        assert_eq!(got, vec![
            b"a0".to_vec(),
            b"a1".to_vec(),
            b"b0".to_vec(),
            b"c0".to_vec(),
            b"c1".to_vec(),
            b"c2".to_vec(),
        ]);

        Ok(())
    }

    #[test]
    fn test_scan_zero_page_file() -> Result<()> {
        let fx = fixture(&[])?;

        let mut scanner = fx.heap.clone().scan(fx.pool.clone(), None);
        scanner.open()?;

        assert!(!scanner.has_next()?);
        assert!(matches!(
            scanner.next(),
            Err(StorageError::IteratorState(_))
        ));

        Ok(())
    }

    #[test]
    fn test_trailing_empty_page_terminates_cleanly() -> Result<()> {
        let fx = fixture(&[vec![b"r0" as &[u8], b"r1", b"r2"], vec![]])?;

        let mut scanner = fx.heap.clone().scan(fx.pool.clone(), None);
        scanner.open()?;

        let got = drain(&mut scanner)?;
        assert_eq!(got.len(), 3);
        assert!(!scanner.has_next()?);

        Ok(())
    }

    #[test]
    fn test_advances_across_empty_middle_pages() -> Result<()> {
        let fx = fixture(&[vec![b"first" as &[u8]], vec![], vec![], vec![b"last"]])?;

        let mut scanner = fx.heap.clone().scan(fx.pool.clone(), None);
        scanner.open()?;

        let got = drain(&mut scanner)?;
        assert_eq!(got, vec![b"first".to_vec(), b"last".to_vec()]);

        Ok(())
    }

    #[test]
    fn test_has_next_is_idempotent() -> Result<()> {
        let fx = fixture(&[vec![b"only" as &[u8]]])?;

        let mut scanner = fx.heap.clone().scan(fx.pool.clone(), None);
        scanner.open()?;

        assert!(scanner.has_next()?);
        assert!(scanner.has_next()?);
        assert!(scanner.has_next()?);
        assert_eq!(scanner.next()?.data, b"only");
        assert!(!scanner.has_next()?);
        assert!(!scanner.has_next()?);

        Ok(())
    }

    #[test]
    fn test_next_without_has_next() -> Result<()> {
        let fx = fixture(&[vec![b"x" as &[u8], b"y"]])?;

        let mut scanner = fx.heap.clone().scan(fx.pool.clone(), None);
        scanner.open()?;

        assert_eq!(scanner.next()?.data, b"x");
        assert_eq!(scanner.next()?.data, b"y");
        assert!(matches!(
            scanner.next(),
            Err(StorageError::IteratorState(_))
        ));

        Ok(())
    }

    #[test]
    fn test_operations_on_closed_scan() -> Result<()> {
        let fx = fixture(&[vec![b"x" as &[u8]]])?;

        let mut scanner = fx.heap.clone().scan(fx.pool.clone(), None);

        // Never opened
        assert!(matches!(
            scanner.has_next(),
            Err(StorageError::IteratorState(_))
        ));
        assert!(matches!(
            scanner.next(),
            Err(StorageError::IteratorState(_))
        ));

        // Closed after use
        scanner.open()?;
        assert!(scanner.has_next()?);
        scanner.close();
        assert!(matches!(
            scanner.has_next(),
            Err(StorageError::IteratorState(_))
        ));

        Ok(())
    }

    #[test]
    fn test_rewind_reproduces_full_sequence() -> Result<()> {
        let fx = fixture(&[vec![b"a" as &[u8], b"b"], vec![b"c"]])?;

        let mut scanner = fx.heap.clone().scan(fx.pool.clone(), None);
        scanner.open()?;
        let fresh = drain(&mut scanner)?;

        scanner.rewind()?;
        let replay = drain(&mut scanner)?;

        assert_eq!(fresh, replay);

        Ok(())
    }

    #[test]
    fn test_rewind_after_partial_consumption() -> Result<()> {
        let fx = fixture(&[vec![b"a" as &[u8], b"b"], vec![b"c"]])?;

        let mut scanner = fx.heap.clone().scan(fx.pool.clone(), None);
        scanner.open()?;
        assert_eq!(scanner.next()?.data, b"a");
        assert_eq!(scanner.next()?.data, b"b");

        scanner.rewind()?;
        let replay = drain(&mut scanner)?;
        assert_eq!(replay, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);

        Ok(())
    }

    #[test]
    fn test_rewind_from_closed() -> Result<()> {
        let fx = fixture(&[vec![b"a" as &[u8]]])?;

        let mut scanner = fx.heap.clone().scan(fx.pool.clone(), None);
        scanner.open()?;
        scanner.close();

        scanner.rewind()?;
        assert!(scanner.has_next()?);
        assert_eq!(scanner.next()?.data, b"a");

        Ok(())
    }

    #[test]
    fn test_rewind_on_zero_page_file() -> Result<()> {
        let fx = fixture(&[])?;

        let mut scanner = fx.heap.clone().scan(fx.pool.clone(), None);
        scanner.open()?;
        scanner.rewind()?;

        assert!(!scanner.has_next()?);

        Ok(())
    }

    #[test]
    fn test_scan_bounded_to_one_cached_page() -> Result<()> {
        let pages: Vec<Vec<&[u8]>> = (0..6).map(|_| vec![b"row" as &[u8]]).collect();
        let fx = fixture_with_pool_size(&pages, 1)?;

        let mut scanner = fx.heap.clone().scan(fx.pool.clone(), None);
        scanner.open()?;

        let mut count = 0;
        while scanner.has_next()? {
            scanner.next()?;
            count += 1;
            assert!(fx.pool.cached_pages() <= 1);
        }
        assert_eq!(count, 6);

        Ok(())
    }

    #[test]
    fn test_scan_with_transaction_handle() -> Result<()> {
        let fx = fixture(&[vec![b"t" as &[u8]]])?;

        let mut scanner = fx
            .heap
            .clone()
            .scan(fx.pool.clone(), Some(TransactionId::new(7)));
        scanner.open()?;

        assert_eq!(drain(&mut scanner)?.len(), 1);

        Ok(())
    }

    #[test]
    fn test_tuple_ids_follow_pages() -> Result<()> {
        let fx = fixture(&[vec![b"a" as &[u8]], vec![b"b"]])?;

        let mut scanner = fx.heap.clone().scan(fx.pool.clone(), None);
        scanner.open()?;

        let first = scanner.next()?;
        let second = scanner.next()?;

        assert_eq!(first.tuple_id.page_id, PageId::new(fx.heap.table_id(), 0));
        assert_eq!(second.tuple_id.page_id, PageId::new(fx.heap.table_id(), 1));
        assert!(first.tuple_id < second.tuple_id);

        Ok(())
    }
}
