//! Progress UI (spinner) for harvest runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use harvester_core::{HarvestPhase, HarvestProgress};
use indicatif::{ProgressBar, ProgressStyle};

/// Spawns the progress UI (spinner) when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `use_spinner` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    use_spinner: bool,
    progress: Arc<HarvestProgress>,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !use_spinner {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_spinner_inner(progress, Arc::clone(&stop));
    (Some(handle), stop)
}

fn spawn_spinner_inner(
    progress: Arc<HarvestProgress>,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        while !stop.load(Ordering::SeqCst) {
            spinner.set_message(progress_message(
                progress.phase(),
                progress.done(),
                progress.total(),
            ));
            tokio::time::sleep(Duration::from_millis(120)).await;
        }

        spinner.finish_and_clear();
    })
}

fn progress_message(phase: HarvestPhase, done: usize, total: usize) -> String {
    if total == 0 {
        format!("{}...", capitalize(phase.label()))
    } else {
        format!("[{}/{}] {}...", done.min(total), total, capitalize(phase.label()))
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_message_with_and_without_totals() {
        assert_eq!(
            progress_message(HarvestPhase::Authenticating, 0, 0),
            "Logging in..."
        );
        assert_eq!(
            progress_message(HarvestPhase::Enriching, 7, 30),
            "[7/30] Enriching candidates..."
        );
        assert_eq!(
            progress_message(HarvestPhase::Listing, 9, 5),
            "[5/5] Fetching listing pages..."
        );
    }

    #[tokio::test]
    async fn spawn_progress_ui_when_disabled_returns_none_handle_and_stop_already_true() {
        let (handle, stop) = spawn_progress_ui(false, Arc::new(HarvestProgress::new()));

        assert!(handle.is_none());
        assert!(
            stop.load(Ordering::SeqCst),
            "stop signal should be true when spinner disabled"
        );
    }

    #[tokio::test]
    async fn spawn_progress_ui_when_enabled_returns_handle_and_stop_ends_task() {
        let (handle, stop) = spawn_progress_ui(true, Arc::new(HarvestProgress::new()));

        assert!(handle.is_some(), "handle should be Some when spinner enabled");
        assert!(!stop.load(Ordering::SeqCst), "stop should be false initially");

        stop.store(true, Ordering::SeqCst);
        let _ = handle.unwrap().await;
    }
}
