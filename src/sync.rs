//! List synchronization.
//!
//! [`ListSync`] keeps the store's student list in step with a page number and
//! a search term. Page changes fetch immediately; search input is debounced.
//! The cursor and the active search term only change when a fetch succeeds.
//! A newer fetch does not cancel an older one still in flight, so responses
//! arriving out of order overwrite each other (last write wins).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::debounce::Debouncer;
use crate::error::Result;
use crate::model::PaginationCursor;
use crate::students::Students;

/// Default page size for the list view.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Default quiet period before a search is issued.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

struct Inner {
    students: Students,
    page_size: u32,
    cursor: Mutex<PaginationCursor>,
    search: Mutex<String>,
    in_flight: AtomicUsize,
}

/// Decrements the in-flight count however the fetch ends.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Inner {
    fn cursor(&self) -> PaginationCursor {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn search(&self) -> String {
        self.search
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetch `page` filtered by `search`. On success the search term and
    /// cursor are committed; on failure both are left as they were.
    /// Failures are logged by [`Students::fetch_page`].
    async fn fetch(&self, page: u32, search: String) -> Result<PaginationCursor> {
        let _loading = LoadingGuard::new(&self.in_flight);

        let cursor = self
            .students
            .fetch_page(page, self.page_size, &search)
            .await?;

        *self.search.lock().unwrap_or_else(PoisonError::into_inner) = search;
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner) = cursor;
        Ok(cursor)
    }
}

/// Controller for the paginated, searchable student list.
pub struct ListSync {
    inner: Arc<Inner>,
    debouncer: Debouncer,
}

impl ListSync {
    pub fn new(students: Students, page_size: u32, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                students,
                page_size,
                cursor: Mutex::new(PaginationCursor::default()),
                search: Mutex::new(String::new()),
                in_flight: AtomicUsize::new(0),
            }),
            debouncer: Debouncer::new(debounce),
        }
    }

    pub fn cursor(&self) -> PaginationCursor {
        self.inner.cursor()
    }

    /// The search term of the last successful fetch.
    pub fn search_term(&self) -> String {
        self.inner.search()
    }

    pub fn page_size(&self) -> u32 {
        self.inner.page_size
    }

    /// True while any fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Whether a debounced search is waiting to fire.
    pub fn is_search_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Fetch the current page with the current search term.
    pub async fn load(&self) -> Result<PaginationCursor> {
        let page = self.inner.cursor().page;
        self.inner.fetch(page, self.inner.search()).await
    }

    /// Fetch `page` immediately.
    ///
    /// Pages outside `[1, total_pages]` are ignored: nothing is fetched, the
    /// cursor is unchanged and `Ok(false)` is returned.
    pub async fn change_page(&self, page: u32) -> Result<bool> {
        if !self.inner.cursor().contains(page) {
            debug!(page, "Ignoring out-of-range page");
            return Ok(false);
        }
        self.inner.fetch(page, self.inner.search()).await?;
        Ok(true)
    }

    /// Fetch page 1 filtered by `term` right away, replacing any pending
    /// debounced search.
    pub async fn search_now(&self, term: &str) -> Result<PaginationCursor> {
        self.debouncer.cancel();
        self.inner.fetch(1, term.to_lowercase()).await
    }

    /// Record search input and fetch page 1 once the input has been quiet
    /// for the debounce period. Newer input replaces a pending search.
    pub fn search(&self, term: &str) {
        let term = term.to_lowercase();
        let inner = Arc::clone(&self.inner);
        self.debouncer.schedule(async move {
            // Failures are logged inside `fetch_page`.
            let _ = inner.fetch(1, term).await;
        });
    }

    /// Cancel a pending debounced search.
    pub fn cancel_pending(&self) {
        self.debouncer.cancel();
    }
}
