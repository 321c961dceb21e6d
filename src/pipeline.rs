//! End-to-end harvest: login, listing crawl, extraction, enrichment, export.
//!
//! Authentication is fully awaited before any listing or enrichment task is
//! spawned, so every task sees the authenticated cookie jar. Page- and
//! candidate-level failures are absorbed; only authentication and the final
//! write end a run with an error.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::auth::{AuthError, AuthenticatedSession, Credentials, authenticate};
use crate::candidate::{Candidate, CandidateSummary, DetailStatus, PhoneStatus, dedupe_by_id};
use crate::config::HarvestConfig;
use crate::enrich::{DetailEnricher, Enricher, Enrichment, PhoneEnricher};
use crate::export::{ExportError, ExportSummary, export_csv};
use crate::extract::extract_candidates;
use crate::http::{ClientError, HttpClient};
use crate::listing::{
    ListingPage, PageCount, PageCountSource, discover_page_count, fetch_page, page_range,
};
use crate::scheduler::{BatchScheduler, SchedulerError, SlotOutcome};

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The HTTP client could not be built.
    #[error("setup failed: {0}")]
    Client(#[from] ClientError),

    /// The scheduler settings are invalid or its permit pool closed.
    #[error("setup failed: {0}")]
    Scheduler(#[from] SchedulerError),

    /// No session could be established.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The export file could not be written.
    #[error("export failed after gathering {gathered} candidates: {source}")]
    Export {
        /// The underlying export error.
        #[source]
        source: ExportError,
        /// Candidates gathered before the write failed.
        gathered: usize,
    },
}

impl HarvestError {
    /// Pipeline phase the run failed in.
    #[must_use]
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Client(_) | Self::Scheduler(_) => "setup",
            Self::Auth(_) => "authentication",
            Self::Export { .. } => "export",
        }
    }

    /// Candidates gathered before the failure.
    #[must_use]
    pub fn gathered(&self) -> usize {
        match self {
            Self::Export { gathered, .. } => *gathered,
            Self::Client(_) | Self::Scheduler(_) | Self::Auth(_) => 0,
        }
    }
}

/// Pipeline stage, published for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HarvestPhase {
    Starting = 0,
    Authenticating = 1,
    Listing = 2,
    Enriching = 3,
    Exporting = 4,
    Done = 5,
}

impl HarvestPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Authenticating,
            2 => Self::Listing,
            3 => Self::Enriching,
            4 => Self::Exporting,
            5 => Self::Done,
            _ => Self::Starting,
        }
    }

    /// Short label for progress output.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Authenticating => "logging in",
            Self::Listing => "fetching listing pages",
            Self::Enriching => "enriching candidates",
            Self::Exporting => "writing export",
            Self::Done => "done",
        }
    }
}

/// Lock-free progress counters shared with the progress display.
#[derive(Debug, Default)]
pub struct HarvestProgress {
    phase: AtomicU8,
    done: AtomicUsize,
    total: AtomicUsize,
}

impl HarvestProgress {
    /// Creates counters in the starting phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> HarvestPhase {
        HarvestPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// Items finished in the current phase.
    #[must_use]
    pub fn done(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }

    /// Items scheduled in the current phase.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    fn enter(&self, phase: HarvestPhase, total: usize) {
        self.done.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
        self.phase.store(phase as u8, Ordering::SeqCst);
    }

    fn advance(&self) {
        self.done.fetch_add(1, Ordering::SeqCst);
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct HarvestReport {
    /// Page count discovered on the first listing page.
    pub page_count: PageCount,
    /// Pages selected for the crawl.
    pub pages_requested: usize,
    /// Pages fetched successfully.
    pub pages_fetched: usize,
    /// Pages that failed or were skipped.
    pub pages_failed: usize,
    /// Items extracted before deduplication.
    pub candidates_found: usize,
    /// Unique candidates exported.
    pub candidates: usize,
    /// Candidates whose phone or profile enrichment recorded an absence.
    pub enrich_failures: usize,
    /// Dispatch stopped early on interrupt.
    pub interrupted: bool,
    /// What the exporter wrote.
    pub export: ExportSummary,
}

impl HarvestReport {
    /// True when the run exported nothing or was cut short.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.export.is_empty() || self.interrupted
    }
}

/// Drives one harvest run.
#[derive(Debug)]
pub struct Harvester {
    config: HarvestConfig,
    progress: Arc<HarvestProgress>,
    interrupt: Arc<AtomicBool>,
}

impl Harvester {
    /// Creates a harvester for `config`.
    #[must_use]
    pub fn new(config: HarvestConfig) -> Self {
        Self {
            config,
            progress: Arc::new(HarvestProgress::new()),
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Uses an externally owned interrupt flag (e.g. set by a Ctrl+C handler).
    #[must_use]
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = flag;
        self
    }

    /// Shared progress counters.
    #[must_use]
    pub fn progress(&self) -> Arc<HarvestProgress> {
        Arc::clone(&self.progress)
    }

    /// Run configuration.
    #[must_use]
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Runs the pipeline to completion.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] if setup, authentication, or the export fails.
    #[instrument(skip(self, credentials), fields(base_url = %self.config.base_url))]
    pub async fn run(&self, credentials: &Credentials) -> Result<HarvestReport, HarvestError> {
        let config = &self.config;
        let client = HttpClient::with_timeouts(
            &config.base_url,
            config.connect_timeout_secs,
            config.read_timeout_secs,
        )?;
        let scheduler = BatchScheduler::new(config.concurrency, config.batch_size, config.batch_pause)?
            .with_interrupt(Arc::clone(&self.interrupt));

        self.progress.enter(HarvestPhase::Authenticating, 0);
        let session = authenticate(client, credentials, config.auth).await?;

        let crawl = self.crawl_listing(&session, &scheduler).await?;
        let candidates_found = crawl.candidates.len();
        let unique = dedupe_by_id(crawl.candidates);
        if unique.len() < candidates_found {
            debug!(
                duplicates = candidates_found - unique.len(),
                "dropped duplicate candidate ids"
            );
        }

        let (candidates, enrich_interrupted) = self.enrich(&session, &scheduler, unique).await?;
        let enrich_failures = candidates
            .iter()
            .filter(|c| {
                matches!(c.summary.phone, PhoneStatus::Unavailable(_))
                    || matches!(c.detail, DetailStatus::Unavailable(_))
            })
            .count();

        self.progress.enter(HarvestPhase::Exporting, candidates.len());
        let export = export_csv(
            &candidates,
            &config.output,
            session.client().base_url(),
            config.detail,
        )
        .map_err(|source| HarvestError::Export {
            source,
            gathered: candidates.len(),
        })?;
        self.progress.enter(HarvestPhase::Done, 0);

        let report = HarvestReport {
            page_count: crawl.page_count,
            pages_requested: crawl.pages_requested,
            pages_fetched: crawl.pages_fetched,
            pages_failed: crawl.pages_requested - crawl.pages_fetched,
            candidates_found,
            candidates: candidates.len(),
            enrich_failures,
            interrupted: crawl.interrupted || enrich_interrupted,
            export,
        };
        info!(
            pages_fetched = report.pages_fetched,
            pages_failed = report.pages_failed,
            candidates = report.candidates,
            with_phone = report.export.with_phone,
            enrich_failures = report.enrich_failures,
            interrupted = report.interrupted,
            output = %report.export.path.display(),
            "harvest complete"
        );
        Ok(report)
    }

    async fn crawl_listing(
        &self,
        session: &AuthenticatedSession,
        scheduler: &BatchScheduler,
    ) -> Result<ListingCrawl, HarvestError> {
        let config = &self.config;
        self.progress.enter(HarvestPhase::Listing, 1);

        let first = match fetch_page(session, 1).await {
            Ok(page) => Some(page),
            Err(error) => {
                warn!(error = %error, "first listing page unavailable; using default page count");
                None
            }
        };
        let page_count = first.as_ref().map_or(
            PageCount {
                total: config.default_page_count.max(1),
                source: PageCountSource::ConfiguredDefault,
            },
            |page| discover_page_count(&page.markup, config.default_page_count),
        );
        let pages = page_range(config.start_page, config.pages, page_count);
        info!(
            total_pages = page_count.total,
            source = ?page_count.source,
            start_page = config.start_page,
            selected = pages.len(),
            "listing pages selected"
        );

        let reused = first.filter(|_| pages.first() == Some(&1));
        let to_fetch: Vec<u32> = pages
            .iter()
            .copied()
            .filter(|page| reused.is_none() || *page != 1)
            .collect();

        self.progress.enter(HarvestPhase::Listing, pages.len());
        let mut listing_pages: Vec<ListingPage> = Vec::with_capacity(pages.len());
        if let Some(page) = reused {
            self.progress.advance();
            listing_pages.push(page);
        }

        let fetch_session = session.clone();
        let progress = Arc::clone(&self.progress);
        let report = scheduler
            .run(to_fetch.clone(), move |page| {
                let session = fetch_session.clone();
                let progress = Arc::clone(&progress);
                async move {
                    let result = fetch_page(&session, page).await;
                    progress.advance();
                    result
                }
            })
            .await?;

        for (page, outcome) in to_fetch.iter().zip(report.outcomes) {
            match outcome {
                SlotOutcome::Completed(listing) => listing_pages.push(listing),
                SlotOutcome::Failed(reason) => warn!(page, reason = %reason, "listing page skipped"),
                SlotOutcome::Skipped => debug!(page, "listing page not dispatched"),
            }
        }

        let mut candidates = Vec::new();
        for page in &listing_pages {
            let found = extract_candidates(&page.markup);
            if found.is_empty() {
                warn!(page = page.page, "listing page contained no candidates");
            }
            debug!(page = page.page, count = found.len(), "page extracted");
            candidates.extend(found);
        }

        Ok(ListingCrawl {
            page_count,
            pages_requested: pages.len(),
            pages_fetched: listing_pages.len(),
            interrupted: report.interrupted,
            candidates,
        })
    }

    async fn enrich(
        &self,
        session: &AuthenticatedSession,
        scheduler: &BatchScheduler,
        unique: Vec<CandidateSummary>,
    ) -> Result<(Vec<Candidate>, bool), HarvestError> {
        let enricher: Arc<dyn Enricher> = if self.config.detail {
            Arc::new(DetailEnricher::new(session.clone()))
        } else {
            Arc::new(PhoneEnricher::new(session.clone()))
        };
        self.progress.enter(HarvestPhase::Enriching, unique.len());
        info!(
            candidates = unique.len(),
            enricher = enricher.name(),
            detail = enricher.includes_detail(),
            "enriching candidates"
        );

        let ids: Vec<String> = unique.iter().map(|c| c.id.clone()).collect();
        let progress = Arc::clone(&self.progress);
        let report = scheduler
            .run(ids, move |id| {
                let enricher = Arc::clone(&enricher);
                let progress = Arc::clone(&progress);
                async move {
                    let enrichment = enricher.enrich(&id).await;
                    progress.advance();
                    Ok::<_, Infallible>(enrichment)
                }
            })
            .await?;

        let interrupted = report.interrupted;
        let candidates = unique
            .into_iter()
            .zip(report.outcomes)
            .map(|(summary, outcome)| match outcome {
                SlotOutcome::Completed(enrichment) => enrichment.apply(summary),
                SlotOutcome::Failed(reason) => Enrichment::failed(reason).apply(summary),
                SlotOutcome::Skipped => Candidate::from_summary(summary),
            })
            .collect();
        Ok((candidates, interrupted))
    }
}

struct ListingCrawl {
    page_count: PageCount,
    pages_requested: usize,
    pages_fetched: usize,
    interrupted: bool,
    candidates: Vec<CandidateSummary>,
}
