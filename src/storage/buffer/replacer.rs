use crate::storage::page::PageId;
use std::fmt::Debug;

pub trait Replacer: Send + Sync + Debug {
    /// Select a page to evict. Returns None if nothing is tracked.
    fn evict(&mut self) -> Option<PageId>;

    /// Record an access, making the page the most recently used.
    fn touch(&mut self, page_id: PageId);

    /// Forget a page without evicting it.
    fn remove(&mut self, page_id: PageId);

    /// Get the number of tracked pages.
    fn size(&self) -> usize;
}
