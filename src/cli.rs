//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use harvester_core::config::{DEFAULT_OUTPUT, DEFAULT_PAGE_COUNT, DEFAULT_PAGES};
use harvester_core::http::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use harvester_core::site::DEFAULT_BASE_URL;
use harvester_core::{DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY, PageSelection};

/// Environment variable holding the account e-mail.
pub const EMAIL_ENV: &str = "HARVESTER_EMAIL";

/// Environment variable holding the account password. There is no flag for it.
pub const PASSWORD_ENV: &str = "HARVESTER_PASSWORD";

/// Crawl the hellojob.az cv-pool and export candidates with phone numbers.
///
/// Logs in with the account from HARVESTER_EMAIL / HARVESTER_PASSWORD, walks
/// the listing pages, reveals each candidate's phone number and writes a CSV.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,

    /// Account e-mail
    #[arg(long, env = EMAIL_ENV)]
    pub email: Option<String>,

    /// Deployment root URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// First listing page to crawl
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub start_page: u32,

    /// Number of listing pages to crawl, or "all"
    #[arg(short, long, default_value_t = PageSelection::Count(DEFAULT_PAGES))]
    pub pages: PageSelection,

    /// Maximum concurrent requests (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Items dispatched per batch (1-1000)
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE as u16, value_parser = clap::value_parser!(u16).range(1..=1000))]
    pub batch_size: u16,

    /// Pause between batches in milliseconds (0 to disable, max 60000)
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub batch_pause_ms: u64,

    /// CSV destination
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Also fetch each candidate's profile page (birth date, education, languages)
    #[arg(long)]
    pub detail: bool,

    /// Page count assumed when the first page shows no pagination
    #[arg(long, default_value_t = DEFAULT_PAGE_COUNT, value_parser = clap::value_parser!(u32).range(1..))]
    pub default_page_count: u32,

    /// Connect timeout in seconds (1-3600)
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: u64,

    /// Per-request timeout in seconds (1-3600)
    #[arg(long, default_value_t = READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: u64,

    /// Do not retry a rejected form login as JSON
    #[arg(long)]
    pub no_json_fallback: bool,

    /// Skip the GET / before the login page
    #[arg(long)]
    pub no_warm_up: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["harvester"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.base_url, "https://www.hellojob.az");
        assert_eq!(args.start_page, 1);
        assert_eq!(args.pages, PageSelection::Count(5));
        assert_eq!(args.concurrency, 10);
        assert_eq!(args.batch_size, 25);
        assert_eq!(args.batch_pause_ms, 500);
        assert_eq!(args.output, PathBuf::from("hellojob_candidates.csv"));
        assert!(!args.detail);
        assert!(!args.no_json_fallback);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["harvester", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["harvester", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_pages_accepts_all_and_counts() {
        let args = Args::try_parse_from(["harvester", "--pages", "all"]).unwrap();
        assert_eq!(args.pages, PageSelection::All);

        let args = Args::try_parse_from(["harvester", "-p", "12"]).unwrap();
        assert_eq!(args.pages, PageSelection::Count(12));

        let result = Args::try_parse_from(["harvester", "--pages", "0"]);
        assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_concurrency_range_enforced() {
        let args = Args::try_parse_from(["harvester", "-c", "100"]).unwrap();
        assert_eq!(args.concurrency, 100);

        for bad in ["0", "101"] {
            let result = Args::try_parse_from(["harvester", "-c", bad]);
            assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_start_page_must_be_positive() {
        let result = Args::try_parse_from(["harvester", "--start-page", "0"]);
        assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_batch_settings_range_enforced() {
        let result = Args::try_parse_from(["harvester", "--batch-size", "1001"]);
        assert!(result.is_err());
        let result = Args::try_parse_from(["harvester", "--batch-pause-ms", "60001"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_has_no_password_flag() {
        let result = Args::try_parse_from(["harvester", "--password", "secret"]);
        assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["harvester", "--help"]);
        assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
