//! The eight job kinds tracked by the activity log.
//!
//! Each kind is persisted in its own versioned, append-only table in the
//! analytical store; `JobKind` is the tag that unifies them into the common
//! `JobRecord` projection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of work a historical job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Single-page fetch.
    Scrape,
    /// Multi-page crawl.
    Crawl,
    /// Batch fetch of an explicit URL list.
    BatchScrape,
    /// Site mapping (URL discovery without content retrieval).
    Map,
    /// Web search with optional content fetch of the hits.
    Search,
    /// Structured extraction.
    Extract,
    /// Deep research.
    DeepResearch,
    /// Autonomous browsing agent.
    Agent,
}

impl JobKind {
    pub const ALL: [JobKind; 8] = [
        JobKind::Scrape,
        JobKind::Crawl,
        JobKind::BatchScrape,
        JobKind::Map,
        JobKind::Search,
        JobKind::Extract,
        JobKind::DeepResearch,
        JobKind::Agent,
    ];

    /// Wire and storage representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Scrape => "scrape",
            JobKind::Crawl => "crawl",
            JobKind::BatchScrape => "batch_scrape",
            JobKind::Map => "map",
            JobKind::Search => "search",
            JobKind::Extract => "extract",
            JobKind::DeepResearch => "deep_research",
            JobKind::Agent => "agent",
        }
    }

    /// Parse the wire representation. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<JobKind> {
        match s {
            "scrape" => Some(JobKind::Scrape),
            "crawl" => Some(JobKind::Crawl),
            "batch_scrape" => Some(JobKind::BatchScrape),
            "map" => Some(JobKind::Map),
            "search" => Some(JobKind::Search),
            "extract" => Some(JobKind::Extract),
            "deep_research" => Some(JobKind::DeepResearch),
            "agent" => Some(JobKind::Agent),
            _ => None,
        }
    }

    /// Kinds whose jobs are composed of child single-page fetches and
    /// therefore expose an `error_count`.
    pub fn is_multi_document(&self) -> bool {
        matches!(
            self,
            JobKind::Crawl | JobKind::BatchScrape | JobKind::Search
        )
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_all_kinds_through_parse() {
        for kind in JobKind::ALL {
            assert_eq!(JobKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(JobKind::parse("croissant"), None);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&JobKind::BatchScrape).unwrap();
        assert_eq!(json, "\"batch_scrape\"");
        let back: JobKind = serde_json::from_str("\"deep_research\"").unwrap();
        assert_eq!(back, JobKind::DeepResearch);
    }

    #[test]
    fn multi_document_kinds() {
        assert!(JobKind::Crawl.is_multi_document());
        assert!(JobKind::BatchScrape.is_multi_document());
        assert!(JobKind::Search.is_multi_document());
        assert!(!JobKind::Scrape.is_multi_document());
        assert!(!JobKind::Agent.is_multi_document());
    }
}
