//! Paginated Query Module
//!
//! Client-side pagination over a query store whose underlying fetch returns
//! the entire result set for the non-paging parameters.

use std::sync::Arc;

use crate::error::Result;
use crate::query::registry::QueryRegistry;
use crate::query::store::{QueryFuture, QueryOptions, QueryState, QueryStore};

/// Default page size when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: usize = 16;

// == Page Params ==
/// Non-paging parameters plus the page window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageParams<P> {
    pub inner: P,
    pub page: usize,
    pub page_size: usize,
}

impl<P> PageParams<P> {
    pub fn new(inner: P, page: usize, page_size: usize) -> Self {
        Self {
            inner,
            page,
            page_size,
        }
    }
}

// == Paginated Result ==
/// One page sliced out of the full result set. Recomputed on every fetch,
/// never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Slices a page out of the full result set. An out-of-range page yields
/// empty items with the totals still correct; clamping is the caller's job.
pub fn paginate<T: Clone>(all: &[T], page: usize, page_size: usize) -> Paginated<T> {
    let total = all.len();
    let total_pages = if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    };
    let start = page.saturating_mul(page_size);
    let items = if start >= total || page_size == 0 {
        Vec::new()
    } else {
        all[start..start.saturating_add(page_size).min(total)].to_vec()
    };

    Paginated {
        items,
        total,
        page,
        page_size,
        total_pages,
        has_next: page + 1 < total_pages,
        has_prev: page > 0,
    }
}

// == Paginated Query Store ==
/// A [`QueryStore`] over `Paginated<T>` with page navigation helpers.
pub struct PaginatedQueryStore<P, T> {
    store: QueryStore<PageParams<P>, Paginated<T>>,
    default_page_size: usize,
}

impl<P, T> PaginatedQueryStore<P, T>
where
    P: Clone + PartialEq + Default + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Wraps `fetch_all`, which must return the entire result set for the
    /// given non-paging parameters; slicing happens here.
    pub fn new(
        key: impl Into<String>,
        registry: Arc<QueryRegistry>,
        fetch_all: Arc<dyn Fn(P) -> QueryFuture<Vec<T>> + Send + Sync>,
        default_page_size: usize,
        options: QueryOptions,
    ) -> Self {
        let store = QueryStore::new(
            key,
            registry,
            Arc::new(move |params: PageParams<P>| {
                let fetch_all = fetch_all.clone();
                Box::pin(async move {
                    let all = fetch_all(params.inner.clone()).await?;
                    Ok(paginate(&all, params.page, params.page_size))
                }) as QueryFuture<Paginated<T>>
            }),
            options,
        );
        Self {
            store,
            default_page_size,
        }
    }

    pub fn state(&self) -> QueryState<PageParams<P>, Paginated<T>> {
        self.store.state()
    }

    pub fn store(&self) -> &QueryStore<PageParams<P>, Paginated<T>> {
        &self.store
    }

    /// Fetches the first page for fresh non-paging params.
    pub async fn fetch(&self, inner: P, page: usize) -> Result<Paginated<T>> {
        self.store
            .fetch(PageParams::new(inner, page, self.default_page_size))
            .await
    }

    /// Advances one page; a no-op returning `None` on the last page.
    pub async fn next_page(&self) -> Result<Option<Paginated<T>>> {
        let state = self.store.state();
        match state.data {
            Some(current) if current.has_next => {
                let page_size = self.page_size_of(&state.params);
                let params = PageParams::new(state.params.inner, current.page + 1, page_size);
                self.store.fetch(params).await.map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Steps back one page; a no-op returning `None` on the first page.
    pub async fn prev_page(&self) -> Result<Option<Paginated<T>>> {
        let state = self.store.state();
        match state.data {
            Some(current) if current.has_prev => {
                let page_size = self.page_size_of(&state.params);
                let params = PageParams::new(state.params.inner, current.page - 1, page_size);
                self.store.fetch(params).await.map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Jumps to an arbitrary page with no bounds clamping.
    pub async fn go_to_page(&self, page: usize) -> Result<Paginated<T>> {
        let state = self.store.state();
        let page_size = self.page_size_of(&state.params);
        let params = PageParams::new(state.params.inner, page, page_size);
        self.store.fetch(params).await
    }

    pub fn invalidate(&self) {
        self.store.invalidate();
    }

    pub fn reset(&self) {
        self.store.reset();
    }

    pub fn teardown(&self) {
        self.store.teardown();
    }

    fn page_size_of(&self, params: &PageParams<P>) -> usize {
        if params.page_size == 0 {
            self.default_page_size
        } else {
            params.page_size
        }
    }
}
