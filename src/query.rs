//! Storage operations for recipes and their ingredients.
//!
//! Every function takes the connection it should run against, so callers
//! decide pooling and transaction scope. Create and update each run as a
//! single transaction: a duplicate-name rejection rolls back any ingredient
//! rows written before it, leaving the prior state intact.

use diesel::prelude::*;

use crate::error::AppError;
use crate::models::{
    Ingredient, IngredientPayload, NewIngredient, NewRecipe, Recipe, RecipeChanges, RecipeDetail,
    RecipeInput, RecipePatch,
};
use crate::schema::{ingredients, recipes};

/// List recipes ordered by name, optionally narrowed to names containing
/// the given fragment. The fragment is matched literally: LIKE wildcards
/// inside it are escaped, so `%` only matches names with a percent sign.
pub fn find_all_recipes(
    name: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Vec<RecipeDetail>, AppError> {
    let mut query = recipes::table
        .select(Recipe::as_select())
        .order(recipes::name.asc())
        .into_boxed();

    if let Some(fragment) = name.filter(|fragment| !fragment.is_empty()) {
        let escaped = fragment
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        query = query.filter(recipes::name.like(format!("%{escaped}%")).escape('\\'));
    }

    let all_recipes = query.load::<Recipe>(conn)?;
    let grouped = Ingredient::belonging_to(&all_recipes)
        .select(Ingredient::as_select())
        .order(ingredients::id.asc())
        .load::<Ingredient>(conn)?
        .grouped_by(&all_recipes);

    Ok(all_recipes
        .into_iter()
        .zip(grouped)
        .map(|(recipe, items)| RecipeDetail::from_parts(recipe, items))
        .collect())
}

/// Fetch one recipe with its ingredients.
pub fn find_recipe(recipe_id: i32, conn: &mut SqliteConnection) -> Result<RecipeDetail, AppError> {
    let recipe = recipes::table
        .find(recipe_id)
        .select(Recipe::as_select())
        .first::<Recipe>(conn)?;
    let items = ingredients_of(&recipe, conn)?;
    Ok(RecipeDetail::from_parts(recipe, items))
}

/// Insert a recipe together with its ingredient list.
pub fn create_recipe(
    input: &RecipeInput,
    conn: &mut SqliteConnection,
) -> Result<RecipeDetail, AppError> {
    input.validate()?;

    conn.transaction(|conn| {
        let recipe: Recipe = diesel::insert_into(recipes::table)
            .values(NewRecipe {
                name: input.name.trim(),
                description: input.description.trim(),
            })
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        insert_ingredients(recipe.id, &input.ingredients, conn)?;

        let items = ingredients_of(&recipe, conn)?;
        Ok(RecipeDetail::from_parts(recipe, items))
    })
}

/// Apply a partial update. A present `ingredients` list deletes the whole
/// existing collection first and re-inserts the submitted entries; even a
/// list with the same names produces fresh rows. Scalar fields present in
/// the patch are written in the same transaction.
pub fn update_recipe(
    recipe_id: i32,
    patch: &RecipePatch,
    conn: &mut SqliteConnection,
) -> Result<RecipeDetail, AppError> {
    patch.validate()?;

    conn.transaction(|conn| {
        let recipe = recipes::table
            .find(recipe_id)
            .select(Recipe::as_select())
            .first::<Recipe>(conn)?;

        if let Some(items) = patch.ingredients.as_deref() {
            diesel::delete(Ingredient::belonging_to(&recipe)).execute(conn)?;
            insert_ingredients(recipe.id, items, conn)?;
        }

        let changes = RecipeChanges {
            name: patch.name.as_deref().map(str::trim),
            description: patch.description.as_deref().map(str::trim),
        };
        if !changes.is_empty() {
            diesel::update(&recipe).set(&changes).execute(conn)?;
        }

        find_recipe(recipe.id, conn)
    })
}

/// Delete a recipe; the storage layer cascades to its ingredients.
pub fn delete_recipe(recipe_id: i32, conn: &mut SqliteConnection) -> Result<(), AppError> {
    let deleted = diesel::delete(recipes::table.find(recipe_id)).execute(conn)?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

fn ingredients_of(recipe: &Recipe, conn: &mut SqliteConnection) -> QueryResult<Vec<Ingredient>> {
    Ingredient::belonging_to(recipe)
        .select(Ingredient::as_select())
        .order(ingredients::id.asc())
        .load(conn)
}

fn insert_ingredients(
    recipe_id: i32,
    items: &[IngredientPayload],
    conn: &mut SqliteConnection,
) -> QueryResult<usize> {
    if items.is_empty() {
        return Ok(0);
    }
    let rows: Vec<NewIngredient<'_>> = items
        .iter()
        .map(|item| NewIngredient {
            name: item.name.trim(),
            recipe_id,
        })
        .collect();
    diesel::insert_into(ingredients::table).values(&rows).execute(conn)
}
