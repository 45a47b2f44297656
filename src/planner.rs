//! Weekly meal plan.
//!
//! The plan endpoint does not always carry nutrition, so meals without it get
//! a rough client-side estimate. The estimate is a placeholder for display
//! only and is flagged as such.

use log::{debug, info};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::api::{extract_collection, ApiClient, Endpoint};
use crate::error::PortalError;
use crate::fetcher::LoadParams;
use crate::model::{first_text, Nutrition, Recipe};

/// Relative spread applied to estimated calories.
pub const ESTIMATE_VARIATION: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealSlot {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "breakfast" => Some(MealSlot::Breakfast),
            "lunch" => Some(MealSlot::Lunch),
            "dinner" => Some(MealSlot::Dinner),
            "snack" | "snacks" => Some(MealSlot::Snack),
            _ => None,
        }
    }

    fn base_calories(&self) -> f64 {
        match self {
            MealSlot::Breakfast => 350.0,
            MealSlot::Lunch => 550.0,
            MealSlot::Dinner => 600.0,
            MealSlot::Snack => 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedMeal {
    pub slot: MealSlot,
    pub recipe: Recipe,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanDay {
    pub day: String,
    pub meals: Vec<PlannedMeal>,
}

impl PlanDay {
    /// Sum of every meal's nutrition; meals without any count as zero.
    pub fn totals(&self) -> Nutrition {
        self.meals
            .iter()
            .filter_map(|meal| meal.recipe.nutrition)
            .fold(Nutrition::default(), |acc, n| acc + n)
    }

    fn from_value(value: &Value) -> Option<Self> {
        let day = first_text(value, &["day", "name", "date"])?;
        let meals_value = value.get("meals").unwrap_or(value);
        let meals = match meals_value {
            // {"breakfast": {...}, "lunch": {...}}
            Value::Object(obj) => obj
                .iter()
                .filter_map(|(slot, raw)| {
                    Some(PlannedMeal {
                        slot: MealSlot::from_name(slot)?,
                        recipe: Recipe::from_value(raw)?,
                    })
                })
                .collect(),
            // [{"type": "breakfast", ...recipe}]
            Value::Array(items) => items
                .iter()
                .filter_map(|raw| {
                    let slot = first_text(raw, &["type", "slot", "mealType"])?;
                    Some(PlannedMeal {
                        slot: MealSlot::from_name(&slot)?,
                        recipe: Recipe::from_value(raw.get("recipe").unwrap_or(raw))?,
                    })
                })
                .collect(),
            _ => Vec::new(),
        };
        Some(PlanDay { day, meals })
    }
}

/// Rough nutrition for a meal slot: base calories with random variation and
/// fixed macro shares (25% protein, 50% carbs, 25% fat by energy).
pub fn estimate_nutrition<R: Rng>(slot: MealSlot, rng: &mut R) -> Nutrition {
    let factor = rng.gen_range((1.0 - ESTIMATE_VARIATION)..=(1.0 + ESTIMATE_VARIATION));
    let calories = (slot.base_calories() * factor).round();
    Nutrition {
        calories,
        protein: (calories * 0.25 / 4.0).round(),
        carbs: (calories * 0.50 / 4.0).round(),
        fat: (calories * 0.25 / 9.0).round(),
        estimated: true,
    }
}

/// Give every meal without nutrition an estimate. Returns how many were filled.
pub fn fill_missing_nutrition<R: Rng>(days: &mut [PlanDay], rng: &mut R) -> usize {
    let mut filled = 0;
    for meal in days.iter_mut().flat_map(|day| day.meals.iter_mut()) {
        if meal.recipe.nutrition.is_none() {
            meal.recipe.nutrition = Some(estimate_nutrition(meal.slot, rng));
            filled += 1;
        }
    }
    if filled > 0 {
        debug!("Estimated nutrition for {} meals", filled);
    }
    filled
}

/// Fetch the weekly plan and fill in missing nutrition.
pub async fn fetch_plan<R: Rng>(
    client: &ApiClient,
    params: &LoadParams,
    rng: &mut R,
) -> Result<Vec<PlanDay>, PortalError> {
    let body = client
        .get(Endpoint::MealPlan.path(), Endpoint::MealPlan, &params.query_pairs())
        .await?;
    let envelope = extract_collection(&body, Endpoint::MealPlan.collection_keys())?;
    let mut days: Vec<PlanDay> = envelope.items.iter().filter_map(PlanDay::from_value).collect();
    fill_missing_nutrition(&mut days, rng);
    info!("Meal plan loaded with {} days", days.len());
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn test_estimate_stays_within_variation() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let n = estimate_nutrition(MealSlot::Lunch, &mut rng);
            assert!(n.calories >= 467.0 && n.calories <= 633.0, "{}", n.calories);
            assert!(n.estimated);
        }
    }

    #[test]
    fn test_parse_day_with_slot_object() {
        let value = json!({
            "day": "Monday",
            "meals": {
                "breakfast": {"title": "Oats", "nutrition": {"calories": 300, "protein": 10, "carbs": 50, "fat": 6}},
                "dinner": {"title": "Fish"},
                "brunch": {"title": "Ignored"}
            }
        });
        let day = PlanDay::from_value(&value).unwrap();
        assert_eq!(day.day, "Monday");
        assert_eq!(day.meals.len(), 2);
        assert_eq!(day.meals[0].slot, MealSlot::Breakfast);
    }

    #[test]
    fn test_fill_only_missing_and_total() {
        let value = json!({
            "day": "Tuesday",
            "meals": [
                {"type": "lunch", "recipe": {"title": "Salad", "nutrition": {"calories": 400, "protein": 20, "carbs": 30, "fat": 15}}},
                {"type": "Snack", "title": "Apple"}
            ]
        });
        let mut days = vec![PlanDay::from_value(&value).unwrap()];
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(fill_missing_nutrition(&mut days, &mut rng), 1);
        assert_eq!(fill_missing_nutrition(&mut days, &mut rng), 0);

        let totals = days[0].totals();
        assert!(totals.calories > 400.0);
        assert!(totals.estimated);
        assert!(!days[0].meals[0].recipe.nutrition.unwrap().estimated);
    }

    #[tokio::test]
    async fn test_fetch_plan() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/meal-planner/plan")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"success": true, "data": {"plan": [{"day": "Friday", "meals": {"lunch": {"title": "Koshari"}}}]}}"#)
            .create_async()
            .await;

        let client = ApiClient::with_base_url(server.url());
        let mut rng = StdRng::seed_from_u64(3);
        let days = fetch_plan(&client, &LoadParams::default(), &mut rng).await.unwrap();

        assert_eq!(days.len(), 1);
        assert!(days[0].meals[0].recipe.nutrition.unwrap().estimated);
    }
}
