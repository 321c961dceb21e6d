//! CLI entry point for the cv-pool harvester.

use std::process::ExitCode;

mod app;
mod cli;

/// Process outcome mapped onto the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every phase completed and at least one candidate was exported.
    Success,
    /// The run finished but exported nothing, or was interrupted.
    Partial,
    /// Authentication, export, or configuration failed.
    Failure,
}

impl ProcessExit {
    fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Partial => 2,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match app::runtime::run_harvester().await {
        Ok(outcome) => ExitCode::from(outcome.code()),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::from(ProcessExit::Failure.code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProcessExit;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ProcessExit::Success.code(), 0);
        assert_eq!(ProcessExit::Failure.code(), 1);
        assert_eq!(ProcessExit::Partial.code(), 2);
    }
}
