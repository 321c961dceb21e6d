//! Exit code logic for the harvester process.
//!
//! Single responsibility: map a finished run onto the process exit outcome.

use harvester_core::HarvestReport;

use crate::ProcessExit;

/// Determines the process exit outcome from the exported row count and interruption.
pub(crate) fn determine_exit_outcome(exported: usize, interrupted: bool) -> ProcessExit {
    if interrupted || exported == 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Success
    }
}

pub(crate) fn report_exit_outcome(report: &HarvestReport) -> ProcessExit {
    determine_exit_outcome(report.export.rows, report.interrupted)
}
