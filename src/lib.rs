pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod openapi;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_support;

use actix_web::{error::JsonPayloadError, middleware::Logger, web, App, HttpRequest, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::order_service::OrderService;
use application::review_service::ReviewService;
use auth::JwtAuth;
use errors::AppError;
use infrastructure::audit_log::DieselAuditLog;
use infrastructure::catalog_repo::DieselCatalogRepository;
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::review_repo::DieselReviewRepository;

pub use config::AppConfig;
pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("Applied {} pending migration(s)", applied.len());
    Ok(())
}

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("Rejected malformed JSON body on {}: {}", req.path(), err);
    AppError::BadRequest(format!("Invalid request body: {err}")).into()
}

/// Registers every route. Shared by the server and by HTTP-level tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    use crate::handlers::{action_logs, orders, products};

    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(orders::create_order))
            .route("", web::get().to(orders::list_orders))
            .route("/mine", web::get().to(orders::my_orders))
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}/pay", web::put().to(orders::pay_order))
            .route("/{id}/shipped", web::put().to(orders::ship_order))
            .route("/{id}/unshipped", web::put().to(orders::unship_order))
            .route("/{id}/delivered", web::put().to(orders::deliver_order))
            .route("/{id}/undelivered", web::put().to(orders::undeliver_order)),
    )
    .service(
        web::scope("/products")
            .route("/{id}", web::get().to(products::get_product))
            .route("/{id}/reviews", web::post().to(products::create_review))
            .route(
                "/{id}/reviews/{review_id}",
                web::delete().to(products::delete_review),
            ),
    )
    .route("/action-logs", web::get().to(action_logs::list_action_logs));
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    auth: JwtAuth,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let audit = DieselAuditLog::new(pool.clone());
    let orders = web::Data::new(OrderService::new(
        DieselOrderRepository::new(pool.clone()),
        audit.clone(),
    ));
    let reviews = web::Data::new(ReviewService::new(
        DieselReviewRepository::new(pool.clone()),
        audit.clone(),
    ));
    let catalog = web::Data::new(DieselCatalogRepository::new(pool));
    let audit = web::Data::new(audit);
    let auth = web::Data::new(auth);
    let api_doc = openapi::ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(orders.clone())
            .app_data(reviews.clone())
            .app_data(catalog.clone())
            .app_data(audit.clone())
            .app_data(auth.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PathConfig::default().error_handler(|err, _| {
                AppError::BadRequest(format!("Invalid path: {err}")).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _| {
                AppError::BadRequest(format!("Invalid query: {err}")).into()
            }))
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", api_doc.clone()),
            )
            .configure(configure_routes)
    })
    .bind((host.to_string(), port))?
    .run())
}
