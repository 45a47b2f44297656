use serde::Serialize;

use crate::i18n::{message, Lang, Message};
use crate::ingredients::Ingredient;
use crate::model::{plain_text, Article, Nutrition, Recipe};

/// What a recipe card shows in a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeCard {
    pub id: String,
    pub heading: String,
    pub badge: Option<String>,
    pub area: Option<String>,
    pub image: Option<String>,
    pub time: Option<String>,
    pub favorite: bool,
}

impl RecipeCard {
    pub fn new(recipe: &Recipe, lang: Lang, favorite: bool) -> Self {
        Self {
            id: recipe.id.clone(),
            heading: recipe
                .title
                .get(lang)
                .unwrap_or_else(|| message(Message::Untitled, lang))
                .to_string(),
            badge: recipe.category.get(lang).map(str::to_string),
            area: recipe.area.get(lang).map(str::to_string),
            image: recipe.image.clone(),
            time: recipe.cook_time.clone().or_else(|| recipe.prep_time.clone()),
            favorite,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleCard {
    pub id: String,
    pub heading: String,
    pub excerpt: String,
    pub badge: Option<String>,
    pub image: Option<String>,
    pub read_time: Option<String>,
}

impl ArticleCard {
    pub fn new(article: &Article, lang: Lang) -> Self {
        Self {
            id: article.id.clone(),
            heading: article
                .title
                .get(lang)
                .unwrap_or_else(|| message(Message::Untitled, lang))
                .to_string(),
            excerpt: article.excerpt.get_or_empty(lang).to_string(),
            badge: article.category.clone(),
            image: article.image.clone(),
            read_time: article.read_time.clone(),
        }
    }
}

/// Everything the recipe detail modal renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeDetail {
    pub title: String,
    pub category: Option<String>,
    pub area: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    pub nutrition: Option<Nutrition>,
    pub tags: Vec<String>,
    pub tips: Vec<String>,
}

impl RecipeDetail {
    pub fn new(recipe: &Recipe, lang: Lang) -> Self {
        Self {
            title: recipe
                .title
                .get(lang)
                .unwrap_or_else(|| message(Message::Untitled, lang))
                .to_string(),
            category: recipe.category.get(lang).map(str::to_string),
            area: recipe.area.get(lang).map(str::to_string),
            image: recipe.image.clone(),
            description: recipe.description.get(lang).map(str::to_string),
            ingredients: recipe.ingredients(lang).to_vec(),
            steps: recipe.instructions(lang).to_vec(),
            nutrition: recipe.nutrition,
            tags: recipe.tags.clone(),
            tips: recipe.tips.clone(),
        }
    }

    /// Numbered instructions as one block of text, the part that collapses.
    pub fn instructions_text(&self) -> String {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Plain-text rendering used for sharing and the CLI.
    pub fn to_text(&self, lang: Lang) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        let meta: Vec<&str> = [self.category.as_deref(), self.area.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !meta.is_empty() {
            out.push_str(&format!("[{}]\n", meta.join(" · ")));
        }
        if let Some(description) = &self.description {
            out.push_str(&format!("\n{description}\n"));
        }
        if !self.ingredients.is_empty() {
            out.push('\n');
            for ingredient in &self.ingredients {
                out.push_str(&format!("- {}\n", ingredient.display_line()));
            }
        }
        if !self.steps.is_empty() {
            out.push('\n');
            out.push_str(&self.instructions_text());
            out.push('\n');
        }
        if let Some(n) = &self.nutrition {
            out.push_str(&format!(
                "\n{} kcal · {}g protein · {}g carbs · {}g fat",
                n.calories.round(),
                n.protein.round(),
                n.carbs.round(),
                n.fat.round()
            ));
            if n.estimated {
                out.push_str(&format!(" ({})", message(Message::EstimatedNutrition, lang)));
            }
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleDetail {
    pub title: String,
    pub category: Option<String>,
    pub image: Option<String>,
    pub body: String,
}

impl ArticleDetail {
    pub fn new(article: &Article, lang: Lang) -> Self {
        Self {
            title: article
                .title
                .get(lang)
                .unwrap_or_else(|| message(Message::Untitled, lang))
                .to_string(),
            category: article.category.clone(),
            image: article.image.clone(),
            body: article
                .content
                .get(lang)
                .map(plain_text)
                .unwrap_or_else(|| article.excerpt.get_or_empty(lang).to_string()),
        }
    }
}
