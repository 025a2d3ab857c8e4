use chrono::NaiveDate;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::models::{JobRecord, JobStatus};

/// Status filter of the list view; `All` is the sentinel that keeps everything
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(JobStatus),
}

impl StatusFilter {
    fn matches(self, record: &JobRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => record.status == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("All"),
            StatusFilter::Only(status) => f.write_str(status.as_str()),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseViewError {
    kind: &'static str,
    value: String,
}

impl FromStr for StatusFilter {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "All" {
            return Ok(StatusFilter::All);
        }
        s.parse::<JobStatus>()
            .map(StatusFilter::Only)
            .map_err(|_| ParseViewError {
                kind: "status filter",
                value: s.to_string(),
            })
    }
}

/// Ordering of the list view
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Descending by id, read as a creation marker
    #[default]
    Newest,
    /// Ascending by deadline, records without one last
    Deadline,
    /// Ascending by company name
    Company,
}

impl FromStr for SortKey {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortKey::Newest),
            "deadline" => Ok(SortKey::Deadline),
            "company" => Ok(SortKey::Company),
            _ => Err(ParseViewError {
                kind: "sort key",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub filter: StatusFilter,
    pub search: String,
    pub sort: SortKey,
}

/// Derive the visible list from the store's records.
///
/// Never mutates `records`; callers recompute whenever records or any
/// query parameter changes.
pub fn project(records: &[JobRecord], query: &ViewQuery) -> Vec<JobRecord> {
    let needle = query.search.to_lowercase();

    let mut view: Vec<JobRecord> = records
        .iter()
        .filter(|record| query.filter.matches(record))
        .filter(|record| needle.is_empty() || haystack(record).contains(&needle))
        .cloned()
        .collect();

    match query.sort {
        SortKey::Newest => view.sort_by(|a, b| b.id.cmp(&a.id)),
        SortKey::Deadline => view.sort_by(|a, b| deadline_order(a.deadline, b.deadline)),
        SortKey::Company => view.sort_by(|a, b| company_order(&a.company, &b.company)),
    }

    view
}

fn haystack(record: &JobRecord) -> String {
    format!("{}{}", record.company, record.role).to_lowercase()
}

fn deadline_order(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn company_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
