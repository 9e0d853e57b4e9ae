//! HTTP handlers for the recipe endpoints.
//!
//! Diesel is synchronous, so every storage call runs inside `web::block`
//! with a connection checked out of the shared pool.

use actix_web::error::{JsonPayloadError, PathError};
use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::{RecipeInput, RecipePatch};
use crate::query;

#[derive(Debug, Deserialize)]
pub struct RecipeFilter {
    name: Option<String>,
}

/// List recipes ordered by name, optionally filtered by substring.
///
/// GET /recipes/?name=<fragment>
#[get("/recipes/")]
pub async fn get_all_recipes(
    filter: web::Query<RecipeFilter>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let filter = filter.into_inner();
    let recipes = web::block(move || {
        let mut conn = pool.get()?;
        query::find_all_recipes(filter.name.as_deref(), &mut conn)
    })
    .await??;
    Ok(HttpResponse::Ok().json(recipes))
}

/// Fetch a single recipe with its ingredients.
///
/// GET /recipes/{id}/
#[get("/recipes/{id}/")]
pub async fn get_recipe(
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let recipe_id = path.into_inner();
    let recipe = web::block(move || {
        let mut conn = pool.get()?;
        query::find_recipe(recipe_id, &mut conn)
    })
    .await??;
    Ok(HttpResponse::Ok().json(recipe))
}

/// Create a recipe together with its ingredient list.
///
/// POST /recipes/
#[post("/recipes/")]
pub async fn create_recipe(
    input: web::Json<RecipeInput>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let input = input.into_inner();
    let recipe = web::block(move || {
        let mut conn = pool.get()?;
        query::create_recipe(&input, &mut conn)
    })
    .await??;
    Ok(HttpResponse::Created().json(recipe))
}

/// Partially update a recipe; a present ingredient list replaces the
/// whole collection.
///
/// PATCH /recipes/{id}/
#[patch("/recipes/{id}/")]
pub async fn update_recipe(
    path: web::Path<i32>,
    patch: web::Json<RecipePatch>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let recipe_id = path.into_inner();
    let patch = patch.into_inner();
    let recipe = web::block(move || {
        let mut conn = pool.get()?;
        query::update_recipe(recipe_id, &patch, &mut conn)
    })
    .await??;
    Ok(HttpResponse::Ok().json(recipe))
}

/// Delete a recipe and, through the storage cascade, its ingredients.
///
/// DELETE /recipes/{id}/
#[delete("/recipes/{id}/")]
pub async fn delete_recipe(
    path: web::Path<i32>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, AppError> {
    let recipe_id = path.into_inner();
    web::block(move || {
        let mut conn = pool.get()?;
        query::delete_recipe(recipe_id, &mut conn)
    })
    .await??;
    Ok(HttpResponse::NoContent().finish())
}

/// Register the recipe endpoints and extractor error handling.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(get_all_recipes)
        .service(get_recipe)
        .service(create_recipe)
        .service(update_recipe)
        .service(delete_recipe);
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Malformed(err.to_string()).into()
}

// a non-numeric id segment identifies no resource, same as an unknown id
fn path_error_handler(_err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::NotFound.into()
}
