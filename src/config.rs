//! Resolved run configuration consumed by the pipeline.

use std::path::PathBuf;
use std::time::Duration;

use crate::auth::AuthOptions;
use crate::http::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::listing::PageSelection;
use crate::scheduler::{DEFAULT_BATCH_PAUSE, DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY};
use crate::site::DEFAULT_BASE_URL;

/// Default export destination.
pub const DEFAULT_OUTPUT: &str = "hellojob_candidates.csv";

/// Default number of listing pages crawled.
pub const DEFAULT_PAGES: u32 = 5;

/// Page count assumed when the first page carries no pagination signal.
pub const DEFAULT_PAGE_COUNT: u32 = 5;

/// Everything one harvest run needs besides credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    /// Deployment root.
    pub base_url: String,
    /// First listing page to crawl (1-based).
    pub start_page: u32,
    /// How many pages to crawl from `start_page`.
    pub pages: PageSelection,
    /// Maximum concurrently active requests.
    pub concurrency: usize,
    /// Items per scheduler batch.
    pub batch_size: usize,
    /// Pause between scheduler batches.
    pub batch_pause: Duration,
    /// Export destination.
    pub output: PathBuf,
    /// Also fetch and export each candidate's profile page.
    pub detail: bool,
    /// Page count used when discovery finds nothing.
    pub default_page_count: u32,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub auth: AuthOptions,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            start_page: 1,
            pages: PageSelection::Count(DEFAULT_PAGES),
            concurrency: DEFAULT_CONCURRENCY,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
            output: PathBuf::from(DEFAULT_OUTPUT),
            detail: false,
            default_page_count: DEFAULT_PAGE_COUNT,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            auth: AuthOptions::default(),
        }
    }
}
