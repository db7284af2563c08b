//! Continuation-link pagination.
//!
//! Both Docker Hub and the Azure resource manager return paged lists with
//! a link to the next page. [`list_all`] follows those links until the
//! last page and returns every item in order.

use std::future::Future;

/// Upper bound on pages followed in a single listing.
pub const MAX_PAGES: usize = 1000;

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Link to the next page, if any.
    pub next_link: Option<String>,
}

impl<T> Page<T> {
    /// Creates a page.
    #[must_use]
    pub fn new(items: Vec<T>, next_link: Option<String>) -> Self {
        Self { items, next_link }
    }

    /// Creates the final page of a listing.
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_link: None,
        }
    }
}

/// Accumulates `first` and every page reachable through its continuation
/// links.
///
/// Empty links end the listing. At most [`MAX_PAGES`] pages are read.
///
/// # Errors
/// Returns the first error produced by `fetch_next`.
pub async fn list_all<T, E, F, Fut>(first: Page<T>, mut fetch_next: F) -> Result<Vec<T>, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut items = first.items;
    let mut next = first.next_link;
    let mut pages = 1;

    while let Some(link) = next.take().filter(|l| !l.is_empty()) {
        if pages >= MAX_PAGES {
            tracing::warn!("pagination stopped after {} pages", pages);
            break;
        }

        let page = fetch_next(link).await?;
        items.extend(page.items);
        next = page.next_link;
        pages += 1;
    }

    Ok(items)
}
