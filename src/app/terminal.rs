//! Terminal capabilities of the harvester process and its log sink.

use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;

use crate::cli::Args;

/// Crates whose debug output drowns the harvest log: the HTML tokenizer reports
/// every recovered markup error, the connection pool every checkout.
const NOISY_TARGETS: [&str; 4] = ["html5ever", "selectors", "hyper_util", "rustls"];

/// What stderr can render, captured once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Console {
    stderr_is_terminal: bool,
    no_color_env: bool,
    dumb: bool,
}

impl Console {
    pub(crate) fn detect() -> Self {
        Self {
            stderr_is_terminal: io::stderr().is_terminal(),
            no_color_env: std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty()),
            dumb: std::env::var("TERM").is_ok_and(|value| value.eq_ignore_ascii_case("dumb")),
        }
    }

    /// ANSI colours in log lines, unless `--no-color`, `NO_COLOR` or `TERM=dumb`.
    pub(crate) fn colors(self, args: &Args) -> bool {
        !(args.no_color || self.no_color_env || self.dumb)
    }

    /// The harvest spinner redraws stderr in place, so it needs a real terminal.
    pub(crate) fn spinner(self, args: &Args) -> bool {
        self.stderr_is_terminal && !self.dumb && !args.quiet
    }

    /// Installs the stderr subscriber. `RUST_LOG` wins unless the level came
    /// from `-v`/`-q` on the command line.
    pub(crate) fn init_tracing(self, args: &Args, level: &str, force_cli_level: bool) {
        let filter = if force_cli_level {
            EnvFilter::new(default_directives(level))
        } else {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
        };
        let _ = tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_ansi(self.colors(args))
            .with_env_filter(filter)
            .try_init();
    }
}

/// `level` for the harvester, capped at `warn` for dependency internals.
fn default_directives(level: &str) -> String {
    NOISY_TARGETS
        .iter()
        .fold(level.to_string(), |mut directives, target| {
            directives.push_str(&format!(",{target}=warn"));
            directives
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;

    fn interactive() -> Console {
        Console {
            stderr_is_terminal: true,
            no_color_env: false,
            dumb: false,
        }
    }

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("harvester").chain(extra.iter().copied())).unwrap()
    }

    #[test]
    fn test_colors_off_for_flag_env_or_dumb_terminal() {
        assert!(interactive().colors(&args(&[])));
        assert!(!interactive().colors(&args(&["--no-color"])));
        let env_off = Console {
            no_color_env: true,
            ..interactive()
        };
        assert!(!env_off.colors(&args(&[])));
        let dumb = Console {
            dumb: true,
            ..interactive()
        };
        assert!(!dumb.colors(&args(&[])));
    }

    #[test]
    fn test_spinner_needs_interactive_stderr_and_no_quiet() {
        assert!(interactive().spinner(&args(&[])));
        assert!(!interactive().spinner(&args(&["-q"])));
        let piped = Console {
            stderr_is_terminal: false,
            ..interactive()
        };
        assert!(!piped.spinner(&args(&[])));
        let dumb = Console {
            dumb: true,
            ..interactive()
        };
        assert!(!dumb.spinner(&args(&[])));
    }

    #[test]
    fn test_default_directives_quiet_dependency_internals() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("html5ever=warn"));
        assert!(directives.contains("hyper_util=warn"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
