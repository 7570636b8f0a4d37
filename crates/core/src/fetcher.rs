//! Resilient multi-provider fetch with caching.
//!
//! ### Algorithm
//! - Cache hit: return the cached list, no provider is called.
//! - Cache miss: call providers one at a time in registration order.
//!   The first non-empty list is cached and returned; later providers are
//!   never consulted.
//! - Empty results and provider errors both fall through to the next
//!   provider. Errors are logged, never propagated.
//! - If every provider comes up empty the result is empty and nothing is
//!   cached, so the next call retries all providers.

use std::sync::Arc;

use crate::cache::ResultCache;
use crate::provider::ImageProvider;

/// Where the candidates in a [`FetchReport`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    Cache,
    Provider(String),
    /// No provider produced anything.
    Exhausted,
}

/// What happened when a single provider was tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Found(usize),
    Empty,
    Failed(String),
}

/// One provider invocation during a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAttempt {
    pub provider: String,
    pub outcome: AttemptOutcome,
}

/// Result of a fetch along with the path taken to get it.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub query: String,
    pub candidates: Vec<String>,
    pub source: CandidateSource,
    /// Providers tried, in order. Empty on a cache hit.
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchReport {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Composes a [`ResultCache`] with an ordered list of providers.
pub struct ResilientFetcher {
    providers: Vec<Arc<dyn ImageProvider>>,
    cache: ResultCache,
}

impl ResilientFetcher {
    /// Create a fetcher. Provider order is the fallback priority and is fixed
    /// for the lifetime of the fetcher.
    pub fn new(providers: Vec<Arc<dyn ImageProvider>>, cache: ResultCache) -> Self {
        Self { providers, cache }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Provider names in fallback order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Candidate locations for `query`; empty when every provider failed.
    pub async fn fetch_candidates(&self, query: &str) -> Vec<String> {
        self.fetch_report(query).await.candidates
    }

    /// Same as [`fetch_candidates`](Self::fetch_candidates), keeping the attempt trail.
    pub async fn fetch_report(&self, query: &str) -> FetchReport {
        if let Some(candidates) = self.cache.get(query).await {
            return FetchReport {
                query: query.to_string(),
                candidates,
                source: CandidateSource::Cache,
                attempts: Vec::new(),
            };
        }

        tracing::info!(query, providers = self.providers.len(), "starting resilient fetch");

        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let name = provider.name().to_string();
            tracing::info!(query, provider = %name, "trying provider");

            match provider.fetch(query).await {
                Ok(candidates) if !candidates.is_empty() => {
                    tracing::info!(query, provider = %name, count = candidates.len(), "provider returned candidates");
                    attempts.push(ProviderAttempt {
                        provider: name.clone(),
                        outcome: AttemptOutcome::Found(candidates.len()),
                    });
                    self.cache.set(query, candidates.clone()).await;
                    return FetchReport {
                        query: query.to_string(),
                        candidates,
                        source: CandidateSource::Provider(name),
                        attempts,
                    };
                }
                Ok(_) => {
                    tracing::info!(query, provider = %name, "provider returned no candidates");
                    attempts.push(ProviderAttempt { provider: name, outcome: AttemptOutcome::Empty });
                }
                Err(e) => {
                    tracing::warn!(query, provider = %name, error = %e, "provider failed");
                    attempts.push(ProviderAttempt { provider: name, outcome: AttemptOutcome::Failed(e.to_string()) });
                }
            }
        }

        tracing::warn!(query, "all providers exhausted without candidates");

        FetchReport { query: query.to_string(), candidates: Vec::new(), source: CandidateSource::Exhausted, attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records provider invocations across fakes.
    type CallLog = Arc<Mutex<Vec<String>>>;

    struct FakeProvider {
        name: &'static str,
        result: Result<Vec<String>, String>,
        calls: AtomicUsize,
        log: CallLog,
    }

    impl FakeProvider {
        fn returning(name: &'static str, items: &[&str], log: &CallLog) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Ok(items.iter().map(|s| s.to_string()).collect()),
                calls: AtomicUsize::new(0),
                log: log.clone(),
            })
        }

        fn failing(name: &'static str, reason: &str, log: &CallLog) -> Arc<Self> {
            Arc::new(Self { name, result: Err(reason.to_string()), calls: AtomicUsize::new(0), log: log.clone() })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ImageProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self, _query: &str) -> Result<Vec<String>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.log.lock().unwrap().push(self.name.to_string());
            self.result.clone().map_err(|reason| Error::provider(self.name, reason))
        }
    }

    fn as_providers(fakes: &[Arc<FakeProvider>]) -> Vec<Arc<dyn ImageProvider>> {
        fakes.iter().map(|p| p.clone() as Arc<dyn ImageProvider>).collect()
    }

    fn new_log() -> CallLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[tokio::test]
    async fn test_fallback_to_second_provider() {
        let log = new_log();
        let p1 = FakeProvider::returning("p1", &[], &log);
        let p2 = FakeProvider::returning("p2", &["x"], &log);
        let fetcher = ResilientFetcher::new(as_providers(&[p1.clone(), p2.clone()]), ResultCache::new());

        let report = fetcher.fetch_report("Be Lenka Champ").await;

        assert_eq!(report.candidates, vec!["x"]);
        assert_eq!(report.source, CandidateSource::Provider("p2".into()));
        assert_eq!(*log.lock().unwrap(), vec!["p1", "p2"]);
        assert_eq!(fetcher.cache().get("Be Lenka Champ").await, Some(vec!["x".to_string()]));
        assert_eq!(
            report.attempts,
            vec![
                ProviderAttempt { provider: "p1".into(), outcome: AttemptOutcome::Empty },
                ProviderAttempt { provider: "p2".into(), outcome: AttemptOutcome::Found(1) },
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let log = new_log();
        let p1 = FakeProvider::failing("p1", "browser crashed", &log);
        let p2 = FakeProvider::returning("p2", &["https://cdn.example.com/a.jpg"], &log);
        let fetcher = ResilientFetcher::new(as_providers(&[p1.clone(), p2.clone()]), ResultCache::new());

        let report = fetcher.fetch_report("Vivobarefoot Primus").await;

        assert_eq!(report.candidates, vec!["https://cdn.example.com/a.jpg"]);
        let first = &report.attempts[0].outcome;
        assert!(matches!(first, AttemptOutcome::Failed(reason) if reason.contains("browser crashed")));
        assert_eq!(p1.calls(), 1);
        assert_eq!(p2.calls(), 1);
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let log = new_log();
        let p1 = FakeProvider::returning("p1", &["a"], &log);
        let p2 = FakeProvider::returning("p2", &["b", "c"], &log);
        let fetcher = ResilientFetcher::new(as_providers(&[p1.clone(), p2.clone()]), ResultCache::new());

        assert_eq!(fetcher.fetch_candidates("Bohempia Herb").await, vec!["a"]);
        assert_eq!(p2.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_providers() {
        let log = new_log();
        let p1 = FakeProvider::returning("p1", &["a"], &log);
        let fetcher = ResilientFetcher::new(as_providers(&[p1.clone()]), ResultCache::new());

        fetcher.fetch_candidates("Wildling Shoes Tanuki").await;
        let report = fetcher.fetch_report("  wildling shoes   TANUKI").await;

        assert_eq!(report.source, CandidateSource::Cache);
        assert_eq!(report.candidates, vec!["a"]);
        assert!(report.attempts.is_empty());
        assert_eq!(p1.calls(), 1);
    }

    #[tokio::test]
    async fn test_preseeded_cache_is_served() {
        let log = new_log();
        let p1 = FakeProvider::returning("p1", &["fresh"], &log);
        let cache = ResultCache::new();
        cache.set("Freet Barefoot Flex", vec!["cached".to_string()]).await;
        let fetcher = ResilientFetcher::new(as_providers(&[p1.clone()]), cache);

        assert_eq!(fetcher.fetch_candidates("Freet Barefoot Flex").await, vec!["cached"]);
        assert_eq!(p1.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_results_are_not_cached() {
        let log = new_log();
        let p1 = FakeProvider::returning("p1", &[], &log);
        let p2 = FakeProvider::failing("p2", "HTTP 503", &log);
        let fetcher = ResilientFetcher::new(as_providers(&[p1.clone(), p2.clone()]), ResultCache::new());

        let first = fetcher.fetch_report("Be Lenka Champ").await;
        let second = fetcher.fetch_report("Be Lenka Champ").await;

        assert!(first.is_empty());
        assert_eq!(first.source, CandidateSource::Exhausted);
        assert!(second.is_empty());
        assert_eq!(p1.calls(), 2);
        assert_eq!(p2.calls(), 2);
        assert!(fetcher.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_no_providers() {
        let fetcher = ResilientFetcher::new(Vec::new(), ResultCache::new());
        let report = fetcher.fetch_report("anything").await;
        assert_eq!(report.source, CandidateSource::Exhausted);
        assert!(report.attempts.is_empty());
    }

    #[test]
    fn test_provider_names_in_order() {
        let log = new_log();
        let fetcher = ResilientFetcher::new(
            as_providers(&[
                FakeProvider::returning("bing-images", &[], &log),
                FakeProvider::returning("google-shopping", &[], &log),
            ]),
            ResultCache::new(),
        );
        assert_eq!(fetcher.provider_names(), vec!["bing-images", "google-shopping"]);
    }
}
