//! Ingredient normalization.
//!
//! The platform returns ingredients in several shapes depending on the
//! endpoint: plain strings, keyed objects with varying key names, or the
//! legacy meal shape with twenty indexed `strIngredientN`/`strMeasureN`
//! fields. Each wire shape is adapted into an [`IngredientEntry`] and then
//! flattened into display-ready [`Ingredient`]s.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::i18n::Lang;

/// Number of indexed ingredient slots on the legacy meal shape.
pub const LEGACY_SLOTS: usize = 20;

const NAME_KEYS: &[&str] = &["ingredient", "item", "name"];
const AMOUNT_KEYS: &[&str] = &["measure", "amount", "qty", "quantity"];
const NOTES_KEYS: &[&str] = &["notes", "note", "comment"];

/// One ingredient after adapting its wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngredientEntry {
    Plain(String),
    Keyed {
        name: String,
        amount: Option<String>,
        notes: Option<String>,
    },
}

impl IngredientEntry {
    /// Flatten into a display entry; `None` when the name is blank.
    pub fn into_ingredient(self) -> Option<Ingredient> {
        let (name, amount, notes) = match self {
            IngredientEntry::Plain(name) => (name, None, None),
            IngredientEntry::Keyed {
                name,
                amount,
                notes,
            } => (name, amount, notes),
        };

        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        Some(Ingredient {
            name: name.to_string(),
            amount: non_blank(amount),
            notes: non_blank(notes),
        })
    }
}

/// Uniform ingredient ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Ingredient {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: None,
            notes: None,
        }
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    /// Single display line, e.g. `1 cup Rice (rinsed)`.
    pub fn display_line(&self) -> String {
        let mut line = match &self.amount {
            Some(amount) => format!("{} {}", amount, self.name),
            None => self.name.clone(),
        };
        if let Some(notes) = &self.notes {
            line.push_str(&format!(" ({notes})"));
        }
        line
    }
}

/// Normalize any ingredient representation using default-language fields.
pub fn normalize(raw: &Value) -> Vec<Ingredient> {
    normalize_localized(raw, Lang::En)
}

/// Normalize any ingredient representation, preferring Arabic names on the
/// legacy indexed shape when `lang` is Arabic. Never fails.
pub fn normalize_localized(raw: &Value, lang: Lang) -> Vec<Ingredient> {
    adapt(raw, lang)
        .into_iter()
        .filter_map(IngredientEntry::into_ingredient)
        .collect()
}

/// Ingredients of a whole recipe object: its `ingredients` field when set,
/// otherwise the legacy indexed fields on the recipe itself.
pub fn recipe_ingredients(recipe: &Value, lang: Lang) -> Vec<Ingredient> {
    match recipe.get("ingredients") {
        Some(raw) if !raw.is_null() => normalize_localized(raw, lang),
        _ => recipe
            .as_object()
            .filter(|obj| is_legacy_shape(obj))
            .map(|obj| {
                adapt_legacy(obj, lang)
                    .into_iter()
                    .filter_map(IngredientEntry::into_ingredient)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn adapt(raw: &Value, lang: Lang) -> Vec<IngredientEntry> {
    match raw {
        Value::Null => Vec::new(),
        Value::String(s) => vec![IngredientEntry::Plain(s.clone())],
        Value::Array(items) => items.iter().map(adapt_element).collect(),
        Value::Object(obj) if is_legacy_shape(obj) => adapt_legacy(obj, lang),
        Value::Object(obj) => vec![adapt_keyed(obj)],
        other => vec![IngredientEntry::Plain(stringify(other))],
    }
}

fn adapt_element(element: &Value) -> IngredientEntry {
    match element {
        Value::String(s) => IngredientEntry::Plain(s.clone()),
        Value::Object(obj) => adapt_keyed(obj),
        other => IngredientEntry::Plain(stringify(other)),
    }
}

fn adapt_keyed(obj: &Map<String, Value>) -> IngredientEntry {
    let name = probe(obj, NAME_KEYS)
        .or_else(|| obj.values().find(|v| !v.is_null()).map(stringify))
        .unwrap_or_default();

    IngredientEntry::Keyed {
        name,
        amount: probe(obj, AMOUNT_KEYS),
        notes: probe(obj, NOTES_KEYS),
    }
}

fn is_legacy_shape(obj: &Map<String, Value>) -> bool {
    obj.keys().any(|k| k.starts_with("strIngredient"))
}

// All slots are examined: an empty slot N says nothing about slot N + 1.
fn adapt_legacy(obj: &Map<String, Value>, lang: Lang) -> Vec<IngredientEntry> {
    (1..=LEGACY_SLOTS)
        .filter_map(|i| {
            let base = text_at(obj, &format!("strIngredient{i}"));
            let localized = text_at(obj, &format!("strIngredient{i}Ar"));
            let name = match (lang, localized) {
                (Lang::Ar, Some(ar)) => Some(ar),
                _ => base,
            }?;

            Some(IngredientEntry::Keyed {
                name,
                amount: text_at(obj, &format!("strMeasure{i}")),
                notes: None,
            })
        })
        .collect()
}

fn text_at(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .filter(|v| !v.is_null())
        .map(stringify)
        .filter(|s| !s.trim().is_empty())
}

fn probe(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text_at(obj, key))
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
