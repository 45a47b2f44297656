use reqwest::Method;

/// Backend endpoints consumed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Recipes,
    KidsMeals,
    MedicalRecipes,
    MagazineArticles,
    MealPlan,
    WhatToCook,
    HomePage,
    PopularRecipes,
    HeroTrending,
    HealthAssistant,
    AiRecipes,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Recipes => "/api/recipes",
            Endpoint::KidsMeals => "/api/kids-meals",
            Endpoint::MedicalRecipes => "/api/medical-recipes",
            Endpoint::MagazineArticles => "/api/magazine/articles",
            Endpoint::MealPlan => "/api/meal-planner/plan",
            Endpoint::WhatToCook => "/api/what-to-cook",
            Endpoint::HomePage => "/api/home-page",
            Endpoint::PopularRecipes => "/api/popular-recipes",
            Endpoint::HeroTrending => "/api/hero-trending",
            Endpoint::HealthAssistant => "/api/health-assistant",
            Endpoint::AiRecipes => "/api/ai-recipes/generate",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Endpoint::WhatToCook | Endpoint::HealthAssistant | Endpoint::AiRecipes => Method::POST,
            _ => Method::GET,
        }
    }

    /// Endpoints backed by AI generation get the longer timeout.
    pub fn is_generation(&self) -> bool {
        matches!(
            self,
            Endpoint::WhatToCook | Endpoint::HealthAssistant | Endpoint::AiRecipes
        )
    }

    /// Keys under which the endpoint's collection may appear, in priority order.
    pub fn collection_keys(&self) -> &'static [&'static str] {
        match self {
            Endpoint::KidsMeals => &["meals", "recipes"],
            Endpoint::MagazineArticles => &["articles", "posts"],
            Endpoint::MealPlan => &["plan", "days"],
            Endpoint::HeroTrending => &["recipes", "trending"],
            _ => &["recipes"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_endpoints_are_posts() {
        for endpoint in [Endpoint::WhatToCook, Endpoint::HealthAssistant, Endpoint::AiRecipes] {
            assert!(endpoint.is_generation());
            assert_eq!(endpoint.method(), Method::POST);
        }
        assert_eq!(Endpoint::Recipes.method(), Method::GET);
        assert!(!Endpoint::Recipes.is_generation());
    }

    #[test]
    fn test_paths_are_under_api() {
        assert!(Endpoint::MagazineArticles.path().starts_with("/api/magazine/"));
        assert!(Endpoint::MealPlan.path().starts_with("/api/meal-planner/"));
    }
}
