//! HTTP client context shared by every request-issuing component.
//!
//! # Features
//!
//! - One connection pool and one cookie jar per run
//! - Browser-like default headers
//! - Connect-phase and total-duration timeouts on every request
//! - Responses read fully into [`FetchedPage`] so callers can inspect
//!   status, redirects and body without holding the connection

mod client;
mod constants;
mod error;

pub use client::{FetchedPage, HttpClient};
pub use constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
pub use error::ClientError;
