use std::time::Duration;

use anyhow::{Result, bail};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use harvester_core::{AuthOptions, HarvestConfig};

use crate::app::config_file::{FileConfig, VerbositySetting};
use crate::cli::Args;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) base_url: bool,
    pub(crate) start_page: bool,
    pub(crate) pages: bool,
    pub(crate) concurrency: bool,
    pub(crate) batch_size: bool,
    pub(crate) batch_pause_ms: bool,
    pub(crate) output: bool,
    pub(crate) detail: bool,
    pub(crate) default_page_count: bool,
    pub(crate) connect_timeout: bool,
    pub(crate) read_timeout: bool,
    pub(crate) no_json_fallback: bool,
    pub(crate) no_warm_up: bool,
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    let sources = cli_value_sources(&matches);
    (args, sources)
}

fn cli_value_sources(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        base_url: is_commandline_value(matches, "base_url"),
        start_page: is_commandline_value(matches, "start_page"),
        pages: is_commandline_value(matches, "pages"),
        concurrency: is_commandline_value(matches, "concurrency"),
        batch_size: is_commandline_value(matches, "batch_size"),
        batch_pause_ms: is_commandline_value(matches, "batch_pause_ms"),
        output: is_commandline_value(matches, "output"),
        detail: is_commandline_value(matches, "detail"),
        default_page_count: is_commandline_value(matches, "default_page_count"),
        connect_timeout: is_commandline_value(matches, "connect_timeout"),
        read_timeout: is_commandline_value(matches, "read_timeout"),
        no_json_fallback: is_commandline_value(matches, "no_json_fallback"),
        no_warm_up: is_commandline_value(matches, "no_warm_up"),
        verbose: is_commandline_value(matches, "verbose"),
        quiet: is_commandline_value(matches, "quiet"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills every option not given on the command line from the config file.
pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Args {
    let Some(file_config) = file_config else {
        return args;
    };

    if !cli_sources.base_url
        && let Some(base_url) = &file_config.base_url
    {
        args.base_url.clone_from(base_url);
    }
    if !cli_sources.start_page
        && let Some(start_page) = file_config.start_page
    {
        args.start_page = start_page;
    }
    if !cli_sources.pages
        && let Some(pages) = file_config.pages
    {
        args.pages = pages;
    }
    if !cli_sources.concurrency
        && let Some(concurrency) = file_config.concurrency
    {
        args.concurrency = concurrency;
    }
    if !cli_sources.batch_size
        && let Some(batch_size) = file_config.batch_size
    {
        args.batch_size = batch_size;
    }
    if !cli_sources.batch_pause_ms
        && let Some(pause) = file_config.batch_pause_ms
    {
        args.batch_pause_ms = pause;
    }
    if !cli_sources.output
        && let Some(output) = &file_config.output
    {
        args.output.clone_from(output);
    }
    if !cli_sources.detail
        && let Some(detail) = file_config.detail
    {
        args.detail = detail;
    }
    if !cli_sources.default_page_count
        && let Some(count) = file_config.default_page_count
    {
        args.default_page_count = count;
    }
    if !cli_sources.connect_timeout
        && let Some(secs) = file_config.connect_timeout_secs
    {
        args.connect_timeout = secs;
    }
    if !cli_sources.read_timeout
        && let Some(secs) = file_config.read_timeout_secs
    {
        args.read_timeout = secs;
    }
    if !cli_sources.no_json_fallback
        && let Some(json_fallback) = file_config.json_fallback
    {
        args.no_json_fallback = !json_fallback;
    }
    if !cli_sources.no_warm_up
        && let Some(warm_up) = file_config.warm_up
    {
        args.no_warm_up = !warm_up;
    }
    if !cli_sources.verbose
        && !cli_sources.quiet
        && let Some(verbosity) = file_config.verbosity
    {
        apply_config_verbosity(&mut args, verbosity);
    }
    args
}

fn apply_config_verbosity(args: &mut Args, verbosity: VerbositySetting) {
    let (quiet, verbose) = match verbosity {
        VerbositySetting::Default => (false, 0),
        VerbositySetting::Verbose => (false, 1),
        VerbositySetting::Quiet => (true, 0),
        VerbositySetting::Debug => (false, 2),
    };
    args.quiet = quiet;
    args.verbose = verbose;
}

/// Converts the effective arguments into the pipeline configuration.
pub(crate) fn build_harvest_config(args: &Args) -> Result<HarvestConfig> {
    if !(1..=100).contains(&args.concurrency) {
        bail!(
            "Invalid effective concurrency value: {}. Expected range: 1..=100",
            args.concurrency
        );
    }
    if args.batch_pause_ms > 60_000 {
        bail!(
            "Invalid effective batch_pause_ms value: {}. Expected range: 0..=60000",
            args.batch_pause_ms
        );
    }

    Ok(HarvestConfig {
        base_url: args.base_url.clone(),
        start_page: args.start_page,
        pages: args.pages,
        concurrency: usize::from(args.concurrency),
        batch_size: usize::from(args.batch_size),
        batch_pause: Duration::from_millis(args.batch_pause_ms),
        output: args.output.clone(),
        detail: args.detail,
        default_page_count: args.default_page_count,
        connect_timeout_secs: args.connect_timeout,
        read_timeout_secs: args.read_timeout,
        auth: AuthOptions {
            warm_up: !args.no_warm_up,
            json_fallback: !args.no_json_fallback,
        },
    })
}

pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub(crate) fn should_force_cli_log_level(cli_sources: &CliValueSources) -> bool {
    cli_sources.verbose || cli_sources.quiet
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use harvester_core::PageSelection;
    use std::path::PathBuf;

    fn parse(argv: &[&str]) -> (Args, CliValueSources) {
        let matches = Args::command().try_get_matches_from(argv).unwrap();
        let args = Args::from_arg_matches(&matches).unwrap();
        (args, cli_value_sources(&matches))
    }

    #[test]
    fn test_command_line_values_win_over_file() {
        let (args, sources) = parse(&["harvester", "-c", "3", "--pages", "2"]);
        let file = FileConfig {
            concurrency: Some(20),
            pages: Some(PageSelection::All),
            output: Some(PathBuf::from("from-file.csv")),
            ..FileConfig::default()
        };
        let args = apply_config_defaults(args, &sources, Some(&file));
        assert_eq!(args.concurrency, 3);
        assert_eq!(args.pages, PageSelection::Count(2));
        assert_eq!(args.output, PathBuf::from("from-file.csv"));
    }

    #[test]
    fn test_file_booleans_map_onto_negated_flags() {
        let (args, sources) = parse(&["harvester"]);
        let file = FileConfig {
            json_fallback: Some(false),
            warm_up: Some(true),
            detail: Some(true),
            ..FileConfig::default()
        };
        let args = apply_config_defaults(args, &sources, Some(&file));
        assert!(args.no_json_fallback);
        assert!(!args.no_warm_up);
        assert!(args.detail);
    }

    #[test]
    fn test_file_verbosity_ignored_when_cli_sets_level() {
        let file = FileConfig {
            verbosity: Some(VerbositySetting::Quiet),
            ..FileConfig::default()
        };
        let (args, sources) = parse(&["harvester", "-v"]);
        let args = apply_config_defaults(args, &sources, Some(&file));
        assert!(!args.quiet);
        assert_eq!(resolve_default_log_level(&args), "debug");
        assert!(should_force_cli_log_level(&sources));

        let (args, sources) = parse(&["harvester"]);
        let args = apply_config_defaults(args, &sources, Some(&file));
        assert_eq!(resolve_default_log_level(&args), "error");
        assert!(!should_force_cli_log_level(&sources));
    }

    #[test]
    fn test_build_harvest_config_from_defaults() {
        let args = Args::try_parse_from(["harvester", "--no-warm-up", "--batch-pause-ms", "0"]).unwrap();
        let config = build_harvest_config(&args).unwrap();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.batch_pause, Duration::ZERO);
        assert!(!config.auth.warm_up);
        assert!(config.auth.json_fallback);
        assert_eq!(config.output, PathBuf::from("hellojob_candidates.csv"));
    }

    #[test]
    fn test_log_level_mapping() {
        let (args, _) = parse(&["harvester", "-vv"]);
        assert_eq!(resolve_default_log_level(&args), "trace");
        let (args, _) = parse(&["harvester", "-q"]);
        assert_eq!(resolve_default_log_level(&args), "error");
        let (args, _) = parse(&["harvester"]);
        assert_eq!(resolve_default_log_level(&args), "info");
    }
}
