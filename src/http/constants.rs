//! Timeout defaults for the shared HTTP client.

/// Default connect-phase timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default total-duration timeout per request (30 seconds).
pub const READ_TIMEOUT_SECS: u64 = 30;
