use chrono::{DateTime, Utc};
use html_escape::decode_html_entities;
use scraper::Html;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::i18n::{Lang, LocalizedText};
use crate::ingredients::{self, Ingredient};

/// Maximum length of an excerpt derived from an article body.
pub const EXCERPT_CHARS: usize = 160;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    /// Set for values computed on the client rather than provided by the backend.
    #[serde(default)]
    pub estimated: bool,
}

impl Nutrition {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let calories = number_at(obj.get("calories"));
        let protein = number_at(obj.get("protein"));
        let carbs = number_at(obj.get("carbs").or_else(|| obj.get("carbohydrates")));
        let fat = number_at(obj.get("fat"));
        if [calories, protein, carbs, fat].iter().all(Option::is_none) {
            return None;
        }
        Some(Nutrition {
            calories: calories.unwrap_or_default(),
            protein: protein.unwrap_or_default(),
            carbs: carbs.unwrap_or_default(),
            fat: fat.unwrap_or_default(),
            estimated: false,
        })
    }
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
            estimated: self.estimated || other.estimated,
        }
    }
}

/// A recipe or meal as served by any of the recipe endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub category: LocalizedText,
    pub area: LocalizedText,
    pub image: Option<String>,
    pub instructions: Vec<String>,
    pub instructions_ar: Vec<String>,
    pub ingredients: Vec<Ingredient>,
    pub ingredients_ar: Vec<Ingredient>,
    pub nutrition: Option<Nutrition>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub tags: Vec<String>,
    pub tips: Vec<String>,
}

impl Recipe {
    /// Adapt any of the known recipe wire shapes. Returns `None` for non-objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object()?;

        let ingredients = ingredients::recipe_ingredients(value, Lang::En);
        let ingredients_ar = match value.get("ingredientsAr") {
            Some(raw) if !raw.is_null() => ingredients::normalize(raw),
            _ => ingredients::recipe_ingredients(value, Lang::Ar),
        };
        let ingredients_ar = if ingredients_ar == ingredients {
            Vec::new()
        } else {
            ingredients_ar
        };

        Some(Recipe {
            id: first_text(value, &["id", "idMeal", "_id", "slug"]).unwrap_or_default(),
            title: localized(value, &[("title", "titleAr"), ("strMeal", "strMealAr"), ("name", "nameAr")]),
            description: localized(value, &[("description", "descriptionAr"), ("summary", "summaryAr")]),
            category: localized(value, &[("category", "categoryAr"), ("strCategory", "strCategoryAr")]),
            area: localized(value, &[("area", "areaAr"), ("strArea", "strAreaAr"), ("region", "regionAr")]),
            image: first_text(value, &["image", "strMealThumb", "imageUrl", "thumbnail"]),
            instructions: steps(value, &["instructions", "strInstructions", "steps"]),
            instructions_ar: steps(value, &["instructionsAr", "strInstructionsAr", "stepsAr"]),
            ingredients,
            ingredients_ar,
            nutrition: value.get("nutrition").and_then(Nutrition::from_value),
            prep_time: first_text(value, &["prepTime", "prep_time"]),
            cook_time: first_text(value, &["cookTime", "cook_time", "time", "cookingTime"]),
            tags: string_list(value, &["tags", "strTags"]),
            tips: string_list(value, &["tips"]),
        })
    }

    pub fn instructions(&self, lang: Lang) -> &[String] {
        if lang == Lang::Ar && !self.instructions_ar.is_empty() {
            &self.instructions_ar
        } else {
            &self.instructions
        }
    }

    pub fn ingredients(&self, lang: Lang) -> &[Ingredient] {
        if lang == Lang::Ar && !self.ingredients_ar.is_empty() {
            &self.ingredients_ar
        } else {
            &self.ingredients
        }
    }
}

/// Magazine article or cooking tip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: LocalizedText,
    pub excerpt: LocalizedText,
    /// HTML body
    pub content: LocalizedText,
    pub category: Option<String>,
    pub image: Option<String>,
    pub read_time: Option<String>,
    pub published: Option<String>,
}

impl Article {
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object()?;

        let content = localized_with(value, &[("content", "contentAr"), ("body", "bodyAr")], raw_text);
        let mut excerpt = localized(value, &[("excerpt", "excerptAr"), ("summary", "summaryAr")]);
        if excerpt.base.is_none() {
            excerpt.base = content.base.as_deref().map(derive_excerpt);
        }
        if excerpt.ar.is_none() {
            excerpt.ar = content.ar.as_deref().map(derive_excerpt);
        }

        Some(Article {
            id: first_text(value, &["id", "_id", "slug"]).unwrap_or_default(),
            title: localized(value, &[("title", "titleAr")]),
            excerpt,
            content,
            category: first_text(value, &["category", "type"]),
            image: first_text(value, &["image", "imageUrl", "cover"]),
            read_time: first_text(value, &["readTime", "read_time"]),
            published: first_text(value, &["publishedAt", "date", "createdAt"]),
        })
    }
}

/// Health condition served with the medical recipes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub category: Option<String>,
}

impl Condition {
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object()?;
        Some(Condition {
            id: first_text(value, &["id", "key", "_id"]).unwrap_or_default(),
            name: localized(value, &[("name", "nameAr"), ("title", "titleAr")]),
            description: localized(value, &[("description", "descriptionAr")]),
            category: first_text(value, &["category"]),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: String },
    Recipe { recipe: Recipe },
    Suggestions {
        recommended: Vec<String>,
        avoid: Vec<String>,
        #[serde(default)]
        note: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text { text: text.into() },
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: MessageContent) -> Self {
        Self {
            role: Role::Assistant,
            content,
            timestamp: Utc::now(),
        }
    }

    /// Plain-text rendering used when sending history back to the backend.
    pub fn summary(&self, lang: Lang) -> String {
        match &self.content {
            MessageContent::Text { text } => text.clone(),
            MessageContent::Recipe { recipe } => recipe.title.get_or_empty(lang).to_string(),
            MessageContent::Suggestions {
                recommended, avoid, ..
            } => format!("+ {} / - {}", recommended.join(", "), avoid.join(", ")),
        }
    }
}

/// Strip markup from an HTML fragment and shorten it to an excerpt.
pub fn derive_excerpt(html: &str) -> String {
    let text = plain_text(html);
    if text.chars().count() <= EXCERPT_CHARS {
        return text;
    }
    let cut: String = text.chars().take(EXCERPT_CHARS).collect();
    let cut = match cut.rfind(' ') {
        Some(pos) if pos > 0 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}…", cut.trim_end())
}

/// Visible text of an HTML fragment with whitespace collapsed.
pub fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let joined = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn decode(text: &str) -> String {
    decode_html_entities(text).trim().to_string()
}

pub(crate) fn first_text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(decode(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

// Markup is kept verbatim, entities are decoded by the HTML parser later.
fn raw_text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        value
            .get(key)?
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    })
}

fn localized(value: &Value, pairs: &[(&str, &str)]) -> LocalizedText {
    localized_with(value, pairs, first_text)
}

fn localized_with(
    value: &Value,
    pairs: &[(&str, &str)],
    read: fn(&Value, &[&str]) -> Option<String>,
) -> LocalizedText {
    pairs
        .iter()
        .map(|(base, ar)| LocalizedText {
            base: read(value, &[base]),
            ar: read(value, &[ar]),
        })
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

fn steps(value: &Value, keys: &[&str]) -> Vec<String> {
    let Some(raw) = keys.iter().find_map(|key| value.get(key).filter(|v| !v.is_null())) else {
        return Vec::new();
    };

    let lines: Vec<String> = match raw {
        Value::String(s) => s.lines().map(decode).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(decode(s)),
                Value::Object(_) => first_text(item, &["text", "step", "description"]),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    lines.into_iter().filter(|l| !l.is_empty()).collect()
}

fn string_list(value: &Value, keys: &[&str]) -> Vec<String> {
    let Some(raw) = keys.iter().find_map(|key| value.get(key).filter(|v| !v.is_null())) else {
        return Vec::new();
    };

    match raw {
        Value::String(s) => s.split(',').map(decode).filter(|t| !t.is_empty()).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(decode)
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn number_at(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        _ => None,
    }
}

fn leading_number(text: &str) -> Option<f64> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().ok()
}
