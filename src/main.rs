use dotenvy::dotenv;
use storefront_service::auth::JwtAuth;
use storefront_service::{build_server, create_pool, run_migrations, AppConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let pool = create_pool(&config.database_url, config.db_pool_size).map_err(|e| {
        log::error!("Failed to create database connection pool: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;
    run_migrations(&pool).map_err(|e| {
        log::error!("Failed to run database migrations: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;

    let auth = JwtAuth::new(&config.jwt_secret, config.jwt_ttl_secs);

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(pool, auth, &config.host, config.port)?.await
}
