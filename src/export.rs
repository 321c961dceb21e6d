//! CSV export of the final candidate collection.
//!
//! Column order is fixed with the phone first. Detail columns are appended only
//! in detail mode, and are written (empty) even for candidates whose profile
//! could not be fetched. A phone the reveal endpoint did not yield is written
//! as [`PHONE_UNAVAILABLE`]; a phone never requested stays empty.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

use crate::candidate::{Candidate, PhoneStatus};
use crate::site::candidate_path;

/// Columns written for every export.
pub const SUMMARY_COLUMNS: [&str; 11] = [
    "phone",
    "name",
    "age",
    "position",
    "salary",
    "location",
    "completion_percentage",
    "posted_date",
    "has_cv_file",
    "cv_id",
    "cv_url",
];

/// Columns appended in detail mode.
pub const DETAIL_COLUMNS: [&str; 3] = ["birth_date", "education", "languages"];

/// Phone cell for candidates whose number was requested but not revealed.
pub const PHONE_UNAVAILABLE: &str = "N/A";

/// Separator for multi-valued detail fields.
pub const LIST_SEPARATOR: &str = "; ";

/// Errors that prevent the export file from being written.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The destination or its parent directory could not be created.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized or flushed.
    #[error("CSV error writing to {path}: {source}")]
    Csv {
        /// The destination path.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },
}

/// What was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Data rows written (the header is not counted).
    pub rows: usize,
    /// Rows with a phone number.
    pub with_phone: usize,
    /// Destination file.
    pub path: PathBuf,
}

impl ExportSummary {
    /// Returns true if only the header was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

/// Header row for the given mode.
#[must_use]
pub fn export_columns(include_detail: bool) -> Vec<&'static str> {
    let mut columns = SUMMARY_COLUMNS.to_vec();
    if include_detail {
        columns.extend(DETAIL_COLUMNS);
    }
    columns
}

/// Writes one row per candidate to `path`, creating parent directories.
///
/// Empty input writes a header-only file and returns an empty summary.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or written.
#[instrument(skip(candidates, base_url), fields(path = %path.display(), count = candidates.len()))]
pub fn export_csv(
    candidates: &[Candidate],
    path: &Path,
    base_url: &Url,
    include_detail: bool,
) -> Result<ExportSummary, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_error = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new().from_writer(file);
    writer
        .write_record(export_columns(include_detail))
        .map_err(csv_error)?;

    let mut with_phone = 0;
    for candidate in candidates {
        if candidate.summary.phone.number().is_some() {
            with_phone += 1;
        }
        writer
            .write_record(candidate_row(candidate, base_url, include_detail))
            .map_err(csv_error)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let summary = ExportSummary {
        rows: candidates.len(),
        with_phone,
        path: path.to_path_buf(),
    };
    if summary.is_empty() {
        debug!("no candidates to export; wrote header only");
    } else {
        info!(rows = summary.rows, with_phone, "export written");
    }
    Ok(summary)
}

fn candidate_row(candidate: &Candidate, base_url: &Url, include_detail: bool) -> Vec<String> {
    let summary = &candidate.summary;
    let cv_url = base_url
        .join(&candidate_path(&summary.id))
        .map(String::from)
        .unwrap_or_default();

    let mut row = vec![
        phone_cell(&summary.phone).to_string(),
        summary.name.clone(),
        summary.age.map(|age| age.to_string()).unwrap_or_default(),
        summary.position.clone(),
        summary.salary.clone(),
        summary.location.clone(),
        summary.completion_percentage.clone(),
        summary.posted_date.clone(),
        if summary.has_file { "Yes" } else { "No" }.to_string(),
        summary.id.clone(),
        cv_url,
    ];
    if include_detail {
        let detail = candidate.detail.detail();
        row.push(detail.map(|d| d.birth_date.clone()).unwrap_or_default());
        row.push(detail.map(|d| d.education.join(LIST_SEPARATOR)).unwrap_or_default());
        row.push(detail.map(|d| d.languages.join(LIST_SEPARATOR)).unwrap_or_default());
    }
    row
}

fn phone_cell(phone: &PhoneStatus) -> &str {
    match phone {
        PhoneStatus::Found(number) => number.as_str(),
        PhoneStatus::Unavailable(_) => PHONE_UNAVAILABLE,
        PhoneStatus::NotFetched => "",
    }
}
