//! In-memory filtering, sorting and pagination of a fetched collection.

use crate::model::{Article, Condition, Recipe};

pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Category identifier that matches every item.
pub const ALL_CATEGORIES: &str = "all";

/// Numeric fields a list can be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Keep backend order
    #[default]
    None,
    CookTime,
    PrepTime,
    ReadTime,
}

impl SortKey {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(SortKey::None),
            "cook-time" | "time" => Some(SortKey::CookTime),
            "prep-time" => Some(SortKey::PrepTime),
            "read-time" => Some(SortKey::ReadTime),
            _ => None,
        }
    }
}

/// Items that can be shown in a filterable list.
pub trait Listable {
    /// Text matched by the search box: titles in every language and excerpts.
    fn search_text(&self) -> Vec<&str>;

    fn category_id(&self) -> Option<&str>;

    /// String holding the sort value, e.g. `"30 min"`.
    fn sort_field(&self, _key: SortKey) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub query: String,
    pub category: Option<String>,
    pub sort: SortKey,
}

impl ViewQuery {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }
}

/// Apply text and category filters, then sort.
pub fn derive<'a, T: Listable>(items: &'a [T], view: &ViewQuery) -> Vec<&'a T> {
    let needle = view.query.trim().to_lowercase();
    let category = view
        .category
        .as_deref()
        .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES);

    let mut matched: Vec<&T> = items
        .iter()
        .filter(|item| matches_text(*item, &needle))
        .filter(|item| category.map_or(true, |c| item.category_id() == Some(c)))
        .collect();

    if view.sort != SortKey::None {
        // sort_by_key is stable: ties keep backend order
        matched.sort_by_key(|item| {
            item.sort_field(view.sort)
                .and_then(leading_integer)
                .unwrap_or(u64::MAX)
        });
    }

    matched
}

fn matches_text<T: Listable>(item: &T, needle: &str) -> bool {
    needle.is_empty()
        || item
            .search_text()
            .iter()
            .any(|text| text.to_lowercase().contains(needle))
}

/// Number of pages needed for `len` items; an empty list still has one page.
pub fn page_count(len: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    len.div_ceil(page_size).max(1)
}

/// Clamp a 1-based page number into the valid range.
pub fn clamp_page(len: usize, page_size: usize, page: usize) -> usize {
    page.clamp(1, page_count(len, page_size))
}

/// The items of a 1-based page; out-of-range pages clamp instead of failing.
pub fn paginate<T>(list: &[T], page_size: usize, page: usize) -> &[T] {
    let page_size = page_size.max(1);
    let page = clamp_page(list.len(), page_size, page);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(list.len());
    &list[start.min(list.len())..end]
}

/// Parse the integer at the start of a string such as `"45 min"` or `" 1h"`.
pub fn leading_integer(text: &str) -> Option<u64> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

impl Listable for Recipe {
    fn search_text(&self) -> Vec<&str> {
        self.title
            .variants()
            .chain(self.description.variants())
            .collect()
    }

    fn category_id(&self) -> Option<&str> {
        self.category.base.as_deref()
    }

    fn sort_field(&self, key: SortKey) -> Option<&str> {
        match key {
            SortKey::CookTime => self.cook_time.as_deref(),
            SortKey::PrepTime => self.prep_time.as_deref(),
            _ => None,
        }
    }
}

impl Listable for Article {
    fn search_text(&self) -> Vec<&str> {
        self.title.variants().chain(self.excerpt.variants()).collect()
    }

    fn category_id(&self) -> Option<&str> {
        self.category.as_deref()
    }

    fn sort_field(&self, key: SortKey) -> Option<&str> {
        match key {
            SortKey::ReadTime => self.read_time.as_deref(),
            _ => None,
        }
    }
}

impl Listable for Condition {
    fn search_text(&self) -> Vec<&str> {
        self.name.variants().chain(self.description.variants()).collect()
    }

    fn category_id(&self) -> Option<&str> {
        self.category.as_deref()
    }
}
