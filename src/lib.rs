//! CRUD web service for recipes and their ingredients.
//!
//! Recipes are unique by name and own an ordered list of ingredients.
//! Updating a recipe with an ingredient list present replaces the whole
//! collection; deleting a recipe cascades to its ingredients. Storage is
//! SQLite behind an r2d2 pool, configured through `DATABASE_URL`.

use actix_web::{middleware, web, App, HttpServer};

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod routes;
pub mod schema;

pub use config::Config;

/// Build the pool, apply pending migrations and serve until shutdown.
pub async fn serve(config: Config) -> std::io::Result<()> {
    let pool = db::build_pool(&config.database_url, config.pool_size)
        .expect("Failed to create pool.");

    let mut conn = pool.get().expect("Failed to get a connection from the pool.");
    db::run_migrations(&mut conn).expect("Failed to run database migrations.");
    drop(conn);

    log::info!("starting HTTP server at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            // set up DB pool to be used with web::Data<Pool> extractor
            .app_data(web::Data::new(pool.clone()))
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
