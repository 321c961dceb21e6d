//! Harvester Core Library
//!
//! Crawls the authenticated cv-pool of a hellojob.az deployment, enriches each
//! candidate with the revealed phone number (and optionally the full profile),
//! and exports the result as CSV.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`http`] - Shared HTTP client with a cookie jar and timeouts
//! - [`auth`] - Anti-forgery token discovery and the login handshake
//! - [`listing`] - Listing page fetches and page-count discovery
//! - [`extract`] - Candidate extraction from listing and profile markup
//! - [`enrich`] - Per-candidate phone and profile enrichment
//! - [`scheduler`] - Bounded-concurrency batch scheduler
//! - [`export`] - CSV export
//! - [`pipeline`] - End-to-end harvest run

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod candidate;
pub mod config;
pub mod enrich;
pub mod export;
pub mod extract;
pub mod http;
pub mod listing;
mod markup;
pub mod pipeline;
pub mod scheduler;
pub mod site;
mod user_agent;

// Re-export commonly used types
pub use auth::{AuthError, AuthOptions, AuthenticatedSession, Credentials, authenticate};
pub use candidate::{Candidate, CandidateDetail, CandidateSummary, DetailStatus, PhoneStatus};
pub use config::HarvestConfig;
pub use export::{ExportError, ExportSummary, export_csv};
pub use http::{ClientError, HttpClient};
pub use listing::{PageCount, PageSelection};
pub use pipeline::{HarvestError, HarvestPhase, HarvestProgress, HarvestReport, Harvester};
pub use scheduler::{
    BatchScheduler, DEFAULT_BATCH_PAUSE, DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY, SchedulerError,
};
