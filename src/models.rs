use std::fmt;

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, FieldErrors};

/// Upper bound for every user-supplied text field.
pub const MAX_TEXT_LEN: usize = 255;

/// A named dish owning zero or more ingredients.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Recipe {
    pub id: i32,
    pub name: String,
    pub description: String,
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An ingredient belonging to exactly one recipe.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(belongs_to(Recipe))]
#[diesel(table_name = crate::schema::ingredients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    pub recipe_id: i32,
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipe<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::ingredients)]
pub struct NewIngredient<'a> {
    pub name: &'a str,
    pub recipe_id: i32,
}

/// Scalar recipe fields of a partial update; absent fields stay untouched.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::recipes)]
pub struct RecipeChanges<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
}

impl RecipeChanges<'_> {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Wire shape of one ingredient; the id and back-reference stay internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientPayload {
    pub name: String,
}

/// Body of `POST /recipes/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeInput {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<IngredientPayload>,
}

impl RecipeInput {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut fields = FieldErrors::new();
        check_text("name", &self.name, &mut fields);
        check_text("description", &self.description, &mut fields);
        check_ingredient_names(&self.ingredients, &mut fields);
        if fields.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(fields))
        }
    }
}

/// Body of `PATCH /recipes/<id>/`. A present `ingredients` list replaces
/// the recipe's whole collection; an absent one leaves it alone. Absence
/// is expressed by omitting the field, never by JSON `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "require_non_null")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "require_non_null")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "require_non_null")]
    pub ingredients: Option<Vec<IngredientPayload>>,
}

impl RecipePatch {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut fields = FieldErrors::new();
        if let Some(name) = &self.name {
            check_text("name", name, &mut fields);
        }
        if let Some(description) = &self.description {
            check_text("description", description, &mut fields);
        }
        if let Some(ingredients) = &self.ingredients {
            check_ingredient_names(ingredients, &mut fields);
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(fields))
        }
    }
}

/// External representation of a recipe with its nested ingredients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub ingredients: Vec<IngredientPayload>,
}

impl RecipeDetail {
    pub fn from_parts(recipe: Recipe, ingredients: Vec<Ingredient>) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            description: recipe.description,
            ingredients: ingredients
                .into_iter()
                .map(|ingredient| IngredientPayload {
                    name: ingredient.name,
                })
                .collect(),
        }
    }
}

fn check_text(field: &'static str, value: &str, fields: &mut FieldErrors) {
    let value = value.trim();
    if value.is_empty() {
        fields.insert(field, "may not be blank".to_string());
    } else if value.chars().count() > MAX_TEXT_LEN {
        fields.insert(field, format!("may not exceed {MAX_TEXT_LEN} characters"));
    }
}

fn check_ingredient_names(ingredients: &[IngredientPayload], fields: &mut FieldErrors) {
    for ingredient in ingredients {
        let name = ingredient.name.trim();
        if name.is_empty() {
            fields.insert("ingredients", "ingredient names may not be blank".to_string());
        } else if name.chars().count() > MAX_TEXT_LEN {
            fields.insert(
                "ingredients",
                format!("ingredient names may not exceed {MAX_TEXT_LEN} characters"),
            );
        }
    }
}

/// Field deserializer that refuses an explicit JSON `null`, so null can
/// never stand in for an absent field.
fn require_non_null<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    match Option::<T>::deserialize(deserializer)? {
        Some(value) => Ok(Some(value)),
        None => Err(serde::de::Error::custom("may not be null")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_str_is_its_name() {
        let recipe = Recipe {
            id: 1,
            name: "Pizza".to_string(),
            description: "Put in the oven".to_string(),
        };

        assert_eq!(recipe.to_string(), recipe.name);
    }

    #[test]
    fn ingredient_str_is_its_name() {
        let ingredient = Ingredient {
            id: 1,
            name: "Mozzarela".to_string(),
            recipe_id: 1,
        };

        assert_eq!(ingredient.to_string(), ingredient.name);
    }

    #[test]
    fn blank_fields_are_collected_per_field() {
        let input = RecipeInput {
            name: "   ".to_string(),
            description: String::new(),
            ingredients: vec![IngredientPayload {
                name: String::new(),
            }],
        };

        match input.validate() {
            Err(AppError::Validation(fields)) => {
                assert!(fields.contains_key("name"));
                assert!(fields.contains_key("description"));
                assert!(fields.contains_key("ingredients"));
            }
            other => panic!("expected a validation failure, got {other:?}"),
        }
    }

    #[test]
    fn overlong_name_is_rejected() {
        let input = RecipeInput {
            name: "x".repeat(MAX_TEXT_LEN + 1),
            description: "Sample recipe description".to_string(),
            ingredients: Vec::new(),
        };

        assert!(matches!(input.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn patch_validates_only_present_fields() {
        assert!(RecipePatch::default().validate().is_ok());

        let blank_name = RecipePatch {
            name: Some(String::new()),
            ..RecipePatch::default()
        };
        assert!(blank_name.validate().is_err());
    }

    #[test]
    fn patch_rejects_explicit_null_fields() {
        let err = serde_json::from_str::<RecipePatch>(r#"{"ingredients": null}"#).unwrap_err();
        assert!(err.to_string().contains("may not be null"));

        let err = serde_json::from_str::<RecipePatch>(r#"{"name": null}"#).unwrap_err();
        assert!(err.to_string().contains("may not be null"));

        let empty: RecipePatch = serde_json::from_str("{}").unwrap();
        assert!(empty.name.is_none());
        assert!(empty.description.is_none());
        assert!(empty.ingredients.is_none());

        let default_wire = serde_json::to_value(RecipePatch::default()).unwrap();
        assert_eq!(default_wire, serde_json::json!({}));
    }

    #[test]
    fn length_is_checked_on_the_trimmed_value() {
        let input = RecipeInput {
            name: format!("  {}  ", "x".repeat(MAX_TEXT_LEN)),
            description: "Sample recipe description".to_string(),
            ingredients: Vec::new(),
        };

        assert!(input.validate().is_ok());
    }
}
