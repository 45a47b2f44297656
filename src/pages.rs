//! Listing pages: a fetcher, the current filters and the visible page.

use async_trait::async_trait;
use log::{info, warn};
use serde_json::Value;
use std::marker::PhantomData;

use crate::api::{extract_collection, ApiClient, Endpoint};
use crate::error::PortalError;
use crate::fetcher::{CollectionFetcher, CollectionSource, LoadOutcome, LoadParams};
use crate::i18n::Lang;
use crate::model::{first_text, Article, Condition, Recipe};
use crate::view::{self, Listable, SortKey, ViewQuery, DEFAULT_PAGE_SIZE};

/// The listing pages of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Recipes,
    KidsMeals,
    MedicalRecipes,
    Magazine,
    PopularRecipes,
    HeroTrending,
}

impl PageKind {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            PageKind::Recipes => Endpoint::Recipes,
            PageKind::KidsMeals => Endpoint::KidsMeals,
            PageKind::MedicalRecipes => Endpoint::MedicalRecipes,
            PageKind::Magazine => Endpoint::MagazineArticles,
            PageKind::PopularRecipes => Endpoint::PopularRecipes,
            PageKind::HeroTrending => Endpoint::HeroTrending,
        }
    }

    /// Whether the backend filters by category, or the page filters locally.
    pub fn filters_category_remotely(&self) -> bool {
        matches!(
            self,
            PageKind::Recipes | PageKind::KidsMeals | PageKind::MedicalRecipes
        )
    }
}

/// A collection endpoint plus the adapter for its items.
pub struct EndpointSource<T> {
    client: ApiClient,
    endpoint: Endpoint,
    adapt: fn(&Value) -> Option<T>,
    _item: PhantomData<fn() -> T>,
}

impl<T> EndpointSource<T> {
    pub fn new(client: ApiClient, endpoint: Endpoint, adapt: fn(&Value) -> Option<T>) -> Self {
        Self {
            client,
            endpoint,
            adapt,
            _item: PhantomData,
        }
    }
}

impl EndpointSource<Recipe> {
    pub fn recipes(client: ApiClient, page: PageKind) -> Self {
        Self::new(client, page.endpoint(), Recipe::from_value)
    }
}

impl EndpointSource<Article> {
    pub fn articles(client: ApiClient) -> Self {
        Self::new(client, Endpoint::MagazineArticles, Article::from_value)
    }
}

#[async_trait]
impl<T: Send + 'static> CollectionSource<T> for EndpointSource<T> {
    async fn fetch(&self, params: &LoadParams) -> Result<Vec<T>, PortalError> {
        let envelope = self.client.fetch_collection(self.endpoint, params).await?;
        Ok(envelope.items.iter().filter_map(self.adapt).collect())
    }
}

/// What a listing page shows right now.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<String>,
}

pub struct PageController<T, S> {
    kind: PageKind,
    fetcher: CollectionFetcher<T, S>,
    lang: Lang,
    category: Option<String>,
    view: ViewQuery,
    page: usize,
    page_size: usize,
}

impl<T, S> PageController<T, S>
where
    T: Listable + Clone + Send,
    S: CollectionSource<T>,
{
    pub fn new(kind: PageKind, source: S, lang: Lang) -> Self {
        Self {
            kind,
            fetcher: CollectionFetcher::new(source),
            lang,
            category: None,
            view: ViewQuery::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Start with a category selected, without loading anything.
    pub fn with_category(mut self, category: Option<String>) -> Self {
        let category = category.filter(|c| !c.is_empty() && c != view::ALL_CATEGORIES);
        if self.kind.filters_category_remotely() {
            self.category = category;
        } else {
            self.view.category = category;
        }
        self
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub async fn mount(&mut self) -> LoadOutcome {
        info!("Mounting {:?} page ({})", self.kind, self.lang);
        self.fetcher.remount();
        self.reload(false).await
    }

    /// Switch language; reloads only when it actually changed.
    pub async fn set_lang(&mut self, lang: Lang) -> Option<LoadOutcome> {
        if lang == self.lang {
            return None;
        }
        self.lang = lang;
        self.page = 1;
        Some(self.reload(false).await)
    }

    /// Switch category. Pages filtering remotely reload, the others filter locally.
    pub async fn set_category(&mut self, category: Option<String>) -> Option<LoadOutcome> {
        let category = category.filter(|c| !c.is_empty() && c != view::ALL_CATEGORIES);
        self.page = 1;
        if !self.kind.filters_category_remotely() {
            self.view.category = category;
            return None;
        }
        if category == self.category {
            return None;
        }
        self.category = category;
        Some(self.reload(false).await)
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.view.query = query.into();
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.view.sort = sort;
    }

    /// Go to a 1-based page, clamped to the pages that exist.
    pub fn set_page(&mut self, page: usize) {
        let len = self.fetcher.with_items(|items| view::derive(items, &self.view).len());
        self.page = view::clamp_page(len, self.page_size, page);
    }

    /// Reload asking the backend to bypass its cache.
    pub async fn refresh(&mut self) -> LoadOutcome {
        self.reload(true).await
    }

    pub fn unmount(&self) {
        self.fetcher.unmount();
    }

    pub fn listing(&self) -> Listing<T> {
        let state = self.fetcher.state();
        let derived = view::derive(&state.items, &self.view);
        let page = view::clamp_page(derived.len(), self.page_size, self.page);
        let items = view::paginate(&derived, self.page_size, page)
            .iter()
            .map(|item| (*item).clone())
            .collect();

        Listing {
            items,
            page,
            total_pages: view::page_count(derived.len(), self.page_size),
            total: derived.len(),
            loading: state.loading,
            refreshing: state.refreshing,
            error: state.error,
        }
    }

    async fn reload(&self, refresh: bool) -> LoadOutcome {
        let mut params = LoadParams::new(self.lang);
        params.category = self.category.clone();
        params.refresh = refresh;
        self.fetcher.load(&params).await
    }
}

/// Sections of the landing page.
#[derive(Debug, Clone, Default)]
pub struct HomeFeed {
    pub featured: Vec<Recipe>,
    pub categories: Vec<String>,
    pub popular: Vec<Recipe>,
    pub trending: Vec<Recipe>,
}

/// Load the landing page sections concurrently; a failed section stays empty.
pub async fn fetch_home(client: &ApiClient, lang: Lang) -> HomeFeed {
    let params = LoadParams::new(lang);
    let home_query = params.query_pairs();
    let (home, popular, trending) = tokio::join!(
        client.get(Endpoint::HomePage.path(), Endpoint::HomePage, &home_query),
        client.fetch_collection(Endpoint::PopularRecipes, &params),
        client.fetch_collection(Endpoint::HeroTrending, &params),
    );

    let mut feed = HomeFeed::default();
    match home {
        Ok(body) => {
            let data = body.get("data").unwrap_or(&body);
            feed.featured = extract_collection(data, &["featured", "recipes"])
                .map(|e| e.items.iter().filter_map(Recipe::from_value).collect())
                .unwrap_or_default();
            feed.categories = data
                .get("categories")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|c| match c {
                            Value::String(s) => Some(s.clone()),
                            other => first_text(other, &["name", "strCategory", "id"]),
                        })
                        .collect()
                })
                .unwrap_or_default();
        }
        Err(e) => warn!("Home page section failed: {}", e),
    }
    match popular {
        Ok(envelope) => feed.popular = envelope.items.iter().filter_map(Recipe::from_value).collect(),
        Err(e) => warn!("Popular recipes failed: {}", e),
    }
    match trending {
        Ok(envelope) => feed.trending = envelope.items.iter().filter_map(Recipe::from_value).collect(),
        Err(e) => warn!("Trending recipes failed: {}", e),
    }
    feed
}

/// Health conditions served alongside the medical recipes.
pub async fn fetch_conditions(client: &ApiClient, lang: Lang) -> Result<Vec<Condition>, PortalError> {
    let endpoint = Endpoint::MedicalRecipes;
    let body = client
        .get(endpoint.path(), endpoint, &LoadParams::new(lang).query_pairs())
        .await?;
    let envelope = extract_collection(&body, &["conditions"])?;
    Ok(envelope.items.iter().filter_map(Condition::from_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::LocalizedText;
    use std::sync::Mutex;

    /// Serves a fixed list and records the parameters it was called with.
    struct StaticSource {
        items: Vec<Article>,
        calls: Mutex<Vec<LoadParams>>,
    }

    #[async_trait]
    impl CollectionSource<Article> for StaticSource {
        async fn fetch(&self, params: &LoadParams) -> Result<Vec<Article>, PortalError> {
            self.calls.lock().unwrap().push(params.clone());
            Ok(self.items.clone())
        }
    }

    fn source(count: usize) -> StaticSource {
        let items = (0..count)
            .map(|i| Article {
                id: i.to_string(),
                title: LocalizedText::new(if i % 5 == 0 { format!("Cake {i}") } else { format!("Tip {i}") }),
                category: Some(if i % 2 == 0 { "even" } else { "odd" }.to_string()),
                ..Default::default()
            })
            .collect();
        StaticSource {
            items,
            calls: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_mount_and_paginate() {
        let mut page = PageController::new(PageKind::Magazine, source(25), Lang::En);
        assert_eq!(page.mount().await, LoadOutcome::Applied);

        let listing = page.listing();
        assert_eq!(listing.items.len(), 12);
        assert_eq!(listing.total_pages, 3);

        page.set_page(3);
        assert_eq!(page.listing().items.len(), 1);
        page.set_page(100);
        assert_eq!(page.page(), 3);
    }

    #[tokio::test]
    async fn test_mount_after_unmount_loads_fresh_items() {
        let mut page = PageController::new(PageKind::Magazine, source(3), Lang::En);
        page.mount().await;
        page.unmount();
        page.fetcher.source().calls.lock().unwrap().clear();

        assert_eq!(page.mount().await, LoadOutcome::Applied);
        let listing = page.listing();
        assert!(!listing.loading);
        assert!(!listing.refreshing);
        assert_eq!(listing.total, 3);
        assert_eq!(page.fetcher.source().calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_after_unmount_never_spins() {
        let mut page = PageController::new(PageKind::Magazine, source(3), Lang::En);
        page.mount().await;
        page.unmount();

        assert_eq!(page.refresh().await, LoadOutcome::Discarded);
        let listing = page.listing();
        assert!(!listing.loading);
        assert!(!listing.refreshing);
    }

    #[tokio::test]
    async fn test_filter_change_resets_page() {
        let mut page = PageController::new(PageKind::Magazine, source(25), Lang::En);
        page.mount().await;
        page.set_page(2);

        page.set_query("cake");
        assert_eq!(page.page(), 1);
        let listing = page.listing();
        assert_eq!(listing.total, 5);

        page.set_page(2);
        assert!(page.set_category(Some("odd".to_string())).await.is_none());
        assert_eq!(page.page(), 1);
        assert_eq!(page.listing().total, 2);
    }

    #[tokio::test]
    async fn test_language_change_reloads_once() {
        let mut page = PageController::new(PageKind::Magazine, source(3), Lang::En);
        page.mount().await;
        assert!(page.set_lang(Lang::En).await.is_none());
        assert_eq!(page.set_lang(Lang::Ar).await, Some(LoadOutcome::Applied));

        let calls = page.fetcher.source().calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].lang, Lang::Ar);
    }

    #[tokio::test]
    async fn test_remote_category_reloads_with_param() {
        let mut page = PageController::new(PageKind::Recipes, source(3), Lang::En);
        page.mount().await;
        page.set_category(Some("Dessert".to_string())).await;
        page.set_category(Some("Dessert".to_string())).await;
        page.refresh().await;

        let calls = page.fetcher.source().calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].category.as_deref(), Some("Dessert"));
        assert!(calls[2].refresh);
    }
}
