//! Remote collection fetching with loading state.
//!
//! Every page of the platform loads a collection the same way: call the
//! backend with the current language and filters, show a spinner while
//! waiting, and replace the collection or show an error. The newest request
//! always wins: responses to superseded requests are dropped.

use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::PortalError;
use crate::i18n::Lang;

/// Parameters of one collection request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadParams {
    pub lang: Lang,
    pub category: Option<String>,
    pub query: Option<String>,
    pub page: Option<u32>,
    /// Ask the backend to bypass its cache.
    pub refresh: bool,
}

impl LoadParams {
    pub fn new(lang: Lang) -> Self {
        Self {
            lang,
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn refreshing(mut self) -> Self {
        self.refresh = true;
        self
    }

    /// Query string pairs as the backend expects them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("lang", self.lang.code().to_string()),
            ("refresh", self.refresh.to_string()),
        ];
        if let Some(category) = self.category.as_deref().filter(|c| *c != "all") {
            pairs.push(("category", category.to_string()));
        }
        if let Some(query) = self.query.as_deref().filter(|q| !q.trim().is_empty()) {
            pairs.push(("query", query.trim().to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }
}

/// Anything that can produce a collection for a page.
#[async_trait]
pub trait CollectionSource<T>: Send + Sync {
    async fn fetch(&self, params: &LoadParams) -> Result<Vec<T>, PortalError>;
}

/// Observable state of a fetched collection.
#[derive(Debug, Clone)]
pub struct FetchState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<String>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            refreshing: false,
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    pub fn is_busy(&self) -> bool {
        self.loading || self.refreshing
    }
}

/// What happened to a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Failed,
    /// A newer request was issued, or the view unmounted, before this one finished.
    Discarded,
}

pub struct CollectionFetcher<T, S> {
    source: S,
    state: Mutex<FetchState<T>>,
    latest: AtomicU64,
    mounted: AtomicBool,
}

impl<T, S> CollectionFetcher<T, S>
where
    T: Clone + Send,
    S: CollectionSource<T>,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Mutex::new(FetchState::default()),
            latest: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load the collection. `refresh` loads set `refreshing`, all others set `loading`.
    ///
    /// Only the most recently issued load may touch the state when it completes.
    pub async fn load(&self, params: &LoadParams) -> LoadOutcome {
        if !self.mounted.load(Ordering::SeqCst) {
            debug!("Fetcher unmounted, ignoring load: {:?}", params);
            return LoadOutcome::Discarded;
        }
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.lock();
            state.loading = !params.refresh;
            state.refreshing = params.refresh;
        }
        debug!("Load #{} started: {:?}", token, params);

        let result = self.source.fetch(params).await;

        // Checked under the lock so a newer load cannot start in between
        let mut state = self.lock();
        if !self.mounted.load(Ordering::SeqCst) || self.latest.load(Ordering::SeqCst) != token {
            debug!("Load #{} superseded, dropping its result", token);
            return LoadOutcome::Discarded;
        }

        state.loading = false;
        state.refreshing = false;
        match result {
            Ok(items) => {
                info!("Load #{} returned {} items", token, items.len());
                state.items = items;
                state.error = None;
                LoadOutcome::Applied
            }
            Err(e) => {
                warn!("Load #{} failed: {}", token, e);
                state.items = Vec::new();
                state.error = Some(e.user_message(params.lang).to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// Stop applying results; in-flight loads are discarded when they finish.
    pub fn unmount(&self) {
        let mut state = self.lock();
        self.mounted.store(false, Ordering::SeqCst);
        state.loading = false;
        state.refreshing = false;
    }

    /// Accept loads again after [`unmount`](Self::unmount).
    pub fn remount(&self) {
        self.mounted.store(true, Ordering::SeqCst);
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FetchState<T> {
        self.lock().clone()
    }

    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.lock().items)
    }

    // A panic while holding the lock cannot leave the state half-written, so
    // a poisoned mutex is still usable.
    fn lock(&self) -> MutexGuard<'_, FetchState<T>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct FailingSource;

    #[async_trait]
    impl CollectionSource<String> for FailingSource {
        async fn fetch(&self, _params: &LoadParams) -> Result<Vec<String>, PortalError> {
            Err(PortalError::Network("connection refused".to_string()))
        }
    }

    /// Arabic requests are slow, English ones answer immediately.
    struct DelayedSource;

    #[async_trait]
    impl CollectionSource<String> for DelayedSource {
        async fn fetch(&self, params: &LoadParams) -> Result<Vec<String>, PortalError> {
            if params.lang == Lang::Ar {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            Ok(vec![format!("result-{}", params.lang)])
        }
    }

    #[tokio::test]
    async fn test_failure_clears_items_and_flags() {
        let fetcher = CollectionFetcher::new(FailingSource);
        let outcome = fetcher.load(&LoadParams::new(Lang::En)).await;

        let state = fetcher.state();
        assert_eq!(outcome, LoadOutcome::Failed);
        assert!(state.items.is_empty());
        assert!(!state.loading);
        assert!(!state.refreshing);
        assert!(!state.error.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_failure_clears_refreshing() {
        let fetcher = CollectionFetcher::new(FailingSource);
        fetcher.load(&LoadParams::new(Lang::Ar).refreshing()).await;
        let state = fetcher.state();
        assert!(!state.is_busy());
        assert!(state.error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_request_wins() {
        let fetcher = CollectionFetcher::new(DelayedSource);
        let slow = LoadParams::new(Lang::Ar);
        let fast = LoadParams::new(Lang::En);

        let (first, second) = tokio::join!(fetcher.load(&slow), fetcher.load(&fast));

        assert_eq!(first, LoadOutcome::Discarded);
        assert_eq!(second, LoadOutcome::Applied);
        assert_eq!(fetcher.state().items, vec!["result-en".to_string()]);
        assert!(!fetcher.state().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmounted_fetcher_ignores_results() {
        let fetcher = CollectionFetcher::new(DelayedSource);
        let params = LoadParams::new(Lang::Ar);

        let (outcome, _) = tokio::join!(fetcher.load(&params), async { fetcher.unmount() });

        assert_eq!(outcome, LoadOutcome::Discarded);
        assert!(fetcher.state().items.is_empty());
        assert!(!fetcher.state().loading);
    }

    #[tokio::test]
    async fn test_remount_accepts_loads_again() {
        let fetcher = CollectionFetcher::new(DelayedSource);
        fetcher.unmount();
        assert_eq!(fetcher.load(&LoadParams::new(Lang::En)).await, LoadOutcome::Discarded);
        assert!(!fetcher.state().is_busy());

        fetcher.remount();
        assert_eq!(fetcher.load(&LoadParams::new(Lang::En)).await, LoadOutcome::Applied);
        assert_eq!(fetcher.state().items, vec!["result-en".to_string()]);
        assert!(!fetcher.state().is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_sets_only_refreshing_while_pending() {
        let fetcher = CollectionFetcher::new(DelayedSource);
        let params = LoadParams::new(Lang::Ar).refreshing();

        let (outcome, _) = tokio::join!(fetcher.load(&params), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let state = fetcher.state();
            assert!(state.refreshing);
            assert!(!state.loading);
        });

        assert_eq!(outcome, LoadOutcome::Applied);
        assert!(!fetcher.state().is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_during_initial_load_swaps_flags() {
        let fetcher = CollectionFetcher::new(DelayedSource);
        let initial = LoadParams::new(Lang::Ar);
        let refresh = LoadParams::new(Lang::Ar).refreshing();

        let later = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let state = fetcher.state();
            assert!(state.loading);
            assert!(!state.refreshing);

            let (outcome, _) = tokio::join!(fetcher.load(&refresh), async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                let state = fetcher.state();
                assert!(state.refreshing);
                assert!(!state.loading);
            });
            outcome
        };
        let (first, second) = tokio::join!(fetcher.load(&initial), later);

        assert_eq!(first, LoadOutcome::Discarded);
        assert_eq!(second, LoadOutcome::Applied);
        assert!(!fetcher.state().is_busy());
    }

    #[test]
    fn test_query_pairs() {
        let params = LoadParams::new(Lang::Ar)
            .with_category("all")
            .with_query("  soup ")
            .with_page(2);
        assert_eq!(
            params.query_pairs(),
            vec![
                ("lang", "ar".to_string()),
                ("refresh", "false".to_string()),
                ("query", "soup".to_string()),
                ("page", "2".to_string()),
            ]
        );
    }
}
