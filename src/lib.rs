//! Client core of a bilingual (English/Arabic) recipe and health-food portal.
//!
//! The backend serves recipes, kids' meals, medical recipes, magazine
//! articles, a weekly meal plan and two AI assistants. This crate loads and
//! normalizes that data, localizes it, filters and paginates it, and keeps
//! the small amount of state the client persists (favorites, language,
//! chat history).

pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod i18n;
pub mod ingredients;
pub mod modal;
pub mod model;
pub mod pages;
pub mod planner;
pub mod render;
pub mod store;
pub mod view;
pub mod wizard;

pub use api::{ApiClient, Endpoint};
pub use config::PortalConfig;
pub use error::PortalError;
pub use fetcher::{CollectionFetcher, CollectionSource, FetchState, LoadOutcome, LoadParams};
pub use i18n::Lang;
pub use ingredients::Ingredient;
pub use model::{Article, ChatMessage, Condition, MessageContent, Nutrition, Recipe};
pub use pages::{EndpointSource, PageController, PageKind};
pub use store::{FileStore, MemoryStore, StateStore};

/// Fetch a single recipe by id, localized for `lang`.
pub async fn fetch_recipe(
    config: &PortalConfig,
    id: &str,
    lang: Lang,
) -> Result<Recipe, PortalError> {
    ApiClient::new(config)?.fetch_recipe(id, lang).await
}
