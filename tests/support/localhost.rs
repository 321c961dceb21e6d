//! Loopback access for tests that run against a mock deployment.
//!
//! Sandboxed runners may forbid binding localhost. Such tests are skipped
//! unless `HARVESTER_REQUIRE_SOCKET_TESTS` is truthy, in which case they fail.

#![allow(dead_code)]

use std::future::Future;
use std::net::{Ipv4Addr, TcpListener};
use std::panic::Location;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "HARVESTER_REQUIRE_SOCKET_TESTS";

fn localhost_required() -> bool {
    std::env::var(REQUIRE_ENV)
        .is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

fn free_loopback_port() -> Option<u16> {
    TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .ok()
}

#[track_caller]
fn skip_without_localhost() -> Option<u16> {
    if let Some(port) = free_loopback_port() {
        return Some(port);
    }
    let caller = Location::caller();
    if localhost_required() {
        panic!(
            "{}:{}: localhost cannot be bound and {REQUIRE_ENV} is set",
            caller.file(),
            caller.line()
        );
    }
    eprintln!(
        "{}:{}: localhost cannot be bound, skipping (set {REQUIRE_ENV}=1 to fail instead)",
        caller.file(),
        caller.line()
    );
    None
}

/// Starts a mock cv-pool deployment, or `None` when the test should be skipped.
#[track_caller]
pub fn start_site() -> impl Future<Output = Option<MockServer>> {
    let available = skip_without_localhost().is_some();
    async move {
        if available {
            Some(MockServer::start().await)
        } else {
            None
        }
    }
}

/// Base URL of a loopback port that was bound and released, so connections
/// to it are refused.
#[track_caller]
pub fn closed_site_url() -> Option<String> {
    skip_without_localhost().map(|port| format!("http://{}:{port}", Ipv4Addr::LOCALHOST))
}
