/*
 * Responsibility
 * - drinks の request/response DTO
 * - short 表現 (公開メニュー) は ingredient name を隠す。long は recipe 全体
 */
use serde::{Deserialize, Serialize};

use crate::repos::{Drink, Ingredient};

/// A recipe may be sent as a single ingredient or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeInput {
    Many(Vec<Ingredient>),
    One(Ingredient),
}

impl RecipeInput {
    pub fn into_vec(self) -> Vec<Ingredient> {
        match self {
            RecipeInput::Many(list) => list,
            RecipeInput::One(one) => vec![one],
        }
    }
}

fn validate_recipe(recipe: &RecipeInput) -> Result<(), &'static str> {
    let ingredients = match recipe {
        RecipeInput::Many(list) => list.as_slice(),
        RecipeInput::One(one) => std::slice::from_ref(one),
    };

    if ingredients.is_empty() {
        return Err("recipe needs at least one ingredient");
    }
    for ingredient in ingredients {
        if ingredient.name.trim().is_empty() {
            return Err("ingredient name is required");
        }
        if ingredient.color.trim().is_empty() {
            return Err("ingredient color is required");
        }
        if ingredient.parts < 1 {
            return Err("ingredient parts must be positive");
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct CreateDrinkRequest {
    pub title: String,
    pub recipe: RecipeInput,
}

impl CreateDrinkRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title is required");
        }
        validate_recipe(&self.recipe)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateDrinkRequest {
    pub title: Option<String>,
    pub recipe: Option<RecipeInput>,
}

impl UpdateDrinkRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.is_none() && self.recipe.is_none() {
            return Err("nothing to update");
        }
        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            return Err("title cannot be empty");
        }
        if let Some(recipe) = &self.recipe {
            validate_recipe(recipe)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct IngredientShort {
    pub color: String,
    pub parts: i32,
}

#[derive(Debug, Serialize)]
pub struct DrinkShort {
    pub id: i32,
    pub title: String,
    pub recipe: Vec<IngredientShort>,
}

impl From<Drink> for DrinkShort {
    fn from(drink: Drink) -> Self {
        Self {
            id: drink.id,
            title: drink.title,
            recipe: drink
                .recipe
                .into_iter()
                .map(|i| IngredientShort {
                    color: i.color,
                    parts: i.parts,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DrinkLong {
    pub id: i32,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl From<Drink> for DrinkLong {
    fn from(drink: Drink) -> Self {
        Self {
            id: drink.id,
            title: drink.title,
            recipe: drink.recipe,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    pub fn new(drinks: Vec<T>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteDrinkResponse {
    pub success: bool,
    pub delete: i32,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn recipe_accepts_object_or_list() {
        let one: CreateDrinkRequest = serde_json::from_value(json!({
            "title": "water",
            "recipe": {"name": "water", "color": "blue", "parts": 1}
        }))
        .expect("single");
        assert_eq!(one.recipe.into_vec().len(), 1);

        let many: CreateDrinkRequest = serde_json::from_value(json!({
            "title": "latte",
            "recipe": [
                {"name": "espresso", "color": "brown", "parts": 1},
                {"name": "milk", "color": "white", "parts": 3}
            ]
        }))
        .expect("list");
        assert_eq!(many.recipe.into_vec().len(), 2);
    }

    #[test]
    fn create_validation() {
        let req: CreateDrinkRequest = serde_json::from_value(json!({
            "title": "  ",
            "recipe": {"name": "water", "color": "blue", "parts": 1}
        }))
        .expect("parse");
        assert_eq!(req.validate(), Err("title is required"));

        let req: CreateDrinkRequest =
            serde_json::from_value(json!({"title": "air", "recipe": []})).expect("parse");
        assert_eq!(req.validate(), Err("recipe needs at least one ingredient"));

        let req: CreateDrinkRequest = serde_json::from_value(json!({
            "title": "ghost",
            "recipe": {"name": "water", "color": "blue", "parts": 0}
        }))
        .expect("parse");
        assert_eq!(req.validate(), Err("ingredient parts must be positive"));
    }

    #[test]
    fn update_needs_a_field() {
        let req: UpdateDrinkRequest = serde_json::from_value(json!({})).expect("parse");
        assert_eq!(req.validate(), Err("nothing to update"));

        let req: UpdateDrinkRequest =
            serde_json::from_value(json!({"title": "mocha"})).expect("parse");
        assert_eq!(req.validate(), Ok(()));
    }

    #[test]
    fn short_form_hides_ingredient_names() {
        let drink = Drink {
            id: 1,
            title: "latte".to_string(),
            recipe: vec![Ingredient {
                name: "secret syrup".to_string(),
                color: "gold".to_string(),
                parts: 2,
            }],
        };

        let short = serde_json::to_value(DrinkShort::from(drink.clone())).expect("short");
        assert_eq!(
            short,
            json!({"id": 1, "title": "latte", "recipe": [{"color": "gold", "parts": 2}]})
        );

        let long = serde_json::to_value(DrinkLong::from(drink)).expect("long");
        assert_eq!(long["recipe"][0]["name"], "secret syrup");
    }
}
