//! Paginated listing traversal.
//!
//! [`fetch_page`] retrieves one page of the candidate index; the first page's
//! markup feeds [`discover_page_count`], and [`page_range`] turns the configured
//! start page and page selection into the list of pages to crawl.

mod error;
mod page_count;
mod paginator;

pub use error::FetchError;
pub use page_count::{PageCount, PageCountSource, PageSelection, discover_page_count, page_range};
pub use paginator::{ListingPage, fetch_page, looks_like_listing};
