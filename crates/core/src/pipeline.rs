//! Query → candidates → download → validate driver.
//!
//! For each query the driver asks the fetcher for candidates, then walks them
//! in order: download, validate, and stop at the first accepted image.
//! Download failures skip to the next candidate. A query with no accepted
//! candidate is reported as failed; the cache is left alone either way.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::Error;
use crate::fetcher::{CandidateSource, ResilientFetcher};
use crate::validate::ProductPhotoValidator;

/// Download capability for candidate locations.
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    /// Store the image at `location` locally and return its path.
    async fn download(&self, location: &str, query: &str) -> Result<PathBuf, Error>;
}

/// The candidate that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedImage {
    pub location: String,
    pub path: PathBuf,
    pub background_score: f64,
}

/// Result of processing one query.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub query: String,
    pub source: CandidateSource,
    pub candidates_seen: usize,
    pub downloads_attempted: usize,
    pub accepted: Option<AcceptedImage>,
}

impl QueryOutcome {
    pub fn succeeded(&self) -> bool {
        self.accepted.is_some()
    }
}

/// Outcomes for a batch of queries, in input order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<QueryOutcome>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failures(&self) -> usize {
        self.total() - self.successes()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures() == 0
    }
}

/// Drives queries through fetch, download and validation.
pub struct Pipeline {
    fetcher: ResilientFetcher,
    downloader: Arc<dyn Downloader>,
    validator: ProductPhotoValidator,
}

impl Pipeline {
    pub fn new(fetcher: ResilientFetcher, downloader: Arc<dyn Downloader>) -> Self {
        Self { fetcher, downloader, validator: ProductPhotoValidator::default() }
    }

    pub fn with_validator(mut self, validator: ProductPhotoValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn fetcher(&self) -> &ResilientFetcher {
        &self.fetcher
    }

    /// Find the first candidate for `query` that validates as a product photo.
    pub async fn find_product_photo(&self, query: &str) -> QueryOutcome {
        let report = self.fetcher.fetch_report(query).await;
        let mut outcome = QueryOutcome {
            query: query.to_string(),
            source: report.source,
            candidates_seen: 0,
            downloads_attempted: 0,
            accepted: None,
        };

        for location in &report.candidates {
            outcome.candidates_seen += 1;
            outcome.downloads_attempted += 1;

            let path = match self.downloader.download(location, query).await {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(
                        query,
                        location = %truncate(location),
                        error = %e,
                        "download failed, trying next candidate"
                    );
                    continue;
                }
            };

            let result = self.validator.validate_path(&path).await;
            tracing::info!(
                query,
                file = %file_name(&path),
                background_score = %format!("{:.2}", result.background_score),
                accepted = result.is_product_photo,
                "validated candidate"
            );

            if result.is_product_photo {
                outcome.accepted = Some(AcceptedImage {
                    location: location.clone(),
                    path,
                    background_score: result.background_score,
                });
                break;
            }
        }

        match &outcome.accepted {
            Some(image) => tracing::info!(query, path = %image.path.display(), "valid image found"),
            None => tracing::warn!(
                query,
                candidates = report.candidates.len(),
                "no valid image found after trying all candidates"
            ),
        }

        outcome
    }

    /// Process `queries` one after another.
    pub async fn run<I, S>(&self, queries: I) -> RunSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = RunSummary::default();
        for query in queries {
            summary.outcomes.push(self.find_product_photo(query.as_ref()).await);
        }

        tracing::info!(
            total = summary.total(),
            successes = summary.successes(),
            failures = summary.failures(),
            "run complete"
        );

        summary
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string())
}

/// Keep data URIs from flooding the logs.
fn truncate(location: &str) -> &str {
    match location.char_indices().nth(96) {
        Some((idx, _)) => &location[..idx],
        None => location,
    }
}
