use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use harvester_core::{Credentials, HarvestError, HarvestReport, Harvester};
use tracing::{debug, error, info, warn};

use crate::ProcessExit;
use crate::app::terminal::Console;
use crate::app::{config_file, config_runtime, exit_handler, progress_manager};
use crate::cli::{Args, EMAIL_ENV, PASSWORD_ENV};

pub(crate) async fn run_harvester() -> Result<ProcessExit> {
    let (cli, cli_sources) = config_runtime::parse_cli_with_sources();
    let loaded = config_file::load_default_file_config()?;
    let args = config_runtime::apply_config_defaults(cli, &cli_sources, loaded.config.as_ref());

    let default_level = config_runtime::resolve_default_log_level(&args);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(&cli_sources);
    let console = Console::detect();
    console.init_tracing(&args, default_level, force_cli_log_level);

    if let Some(path) = loaded.path.as_deref().filter(|_| loaded.config.is_some()) {
        debug!(path = %path.display(), "Loaded config file");
    }
    info!("Harvester starting");

    let credentials = read_credentials(&args)?;
    let config = config_runtime::build_harvest_config(&args)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupted_signal.store(true, Ordering::SeqCst);
        }
    });

    let harvester = Harvester::new(config).with_interrupt(Arc::clone(&interrupted));

    let (progress_handle, progress_stop) =
        progress_manager::spawn_progress_ui(console.spinner(&args), harvester.progress());

    let result = harvester.run(&credentials).await;

    progress_stop.store(true, Ordering::SeqCst);
    if let Some(handle) = progress_handle {
        let _ = handle.await;
    }

    match result {
        Ok(report) => {
            for line in completion_summary_lines(&report) {
                println!("{line}");
            }
            if report.interrupted {
                warn!(
                    exported = report.export.rows,
                    "Interrupted. Candidates not yet enriched were exported without phones."
                );
            }
            Ok(exit_handler::report_exit_outcome(&report))
        }
        Err(err) => {
            error!(phase = err.phase(), gathered = err.gathered(), error = %err, "Harvest failed");
            eprintln!("{}", failure_line(&err));
            Ok(ProcessExit::Failure)
        }
    }
}

fn read_credentials(args: &Args) -> Result<Credentials> {
    let email = args
        .email
        .clone()
        .with_context(|| format!("No account e-mail: pass --email or set {EMAIL_ENV}"))?;
    let password = std::env::var(PASSWORD_ENV)
        .with_context(|| format!("No account password: set {PASSWORD_ENV}"))?;
    Credentials::new(email, password).context("Invalid credentials")
}

fn completion_summary_lines(report: &HarvestReport) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Exported {} candidates ({} with phone) to {}",
            report.export.rows,
            report.export.with_phone,
            report.export.path.display()
        ),
        format!(
            "Pages: {} fetched, {} failed of {} selected ({} discovered)",
            report.pages_fetched, report.pages_failed, report.pages_requested, report.page_count.total
        ),
    ];
    if report.enrich_failures > 0 {
        lines.push(format!(
            "{} candidates have no phone or profile data",
            report.enrich_failures
        ));
    }
    if report.candidates_found > report.candidates {
        lines.push(format!(
            "{} duplicate listings dropped",
            report.candidates_found - report.candidates
        ));
    }
    lines
}

fn failure_line(err: &HarvestError) -> String {
    format!(
        "Harvest failed during {} after gathering {} candidates: {err}",
        err.phase(),
        err.gathered()
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use harvester_core::export::ExportSummary;
    use harvester_core::listing::PageCountSource;
    use harvester_core::{AuthError, PageCount};

    use super::*;

    fn report() -> HarvestReport {
        HarvestReport {
            page_count: PageCount {
                total: 12,
                source: PageCountSource::PaginationControls,
            },
            pages_requested: 2,
            pages_fetched: 2,
            pages_failed: 0,
            candidates_found: 35,
            candidates: 30,
            enrich_failures: 1,
            interrupted: false,
            export: ExportSummary {
                rows: 30,
                with_phone: 29,
                path: PathBuf::from("out.csv"),
            },
        }
    }

    #[test]
    fn test_completion_summary_lines() {
        let lines = completion_summary_lines(&report());
        assert_eq!(lines[0], "Exported 30 candidates (29 with phone) to out.csv");
        assert_eq!(lines[1], "Pages: 2 fetched, 0 failed of 2 selected (12 discovered)");
        assert_eq!(lines[2], "1 candidates have no phone or profile data");
        assert_eq!(lines[3], "5 duplicate listings dropped");
    }

    #[test]
    fn test_failure_line_names_phase_and_count() {
        let err = HarvestError::Auth(AuthError::rejected("json", "Invalid credentials"));
        let line = failure_line(&err);
        assert!(line.starts_with("Harvest failed during authentication after gathering 0 candidates"));
    }
}
