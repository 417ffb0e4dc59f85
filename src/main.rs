mod config;
mod db;
mod dtos;
mod error;
mod extract;
mod handler;
mod middleware;
mod models;
mod redisdb;
mod routes;
mod seed;
#[cfg(test)]
mod test_support;
mod tracing_config;
mod utils;

use axum::http::{
    HeaderValue, Method,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use clap::{Parser, Subcommand};
use config::Config;
use db::DBClient;
use dotenv::dotenv;
use redisdb::RedisClient;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Parser)]
#[command(name = "garden_backend")]
#[command(about = "Plant catalog, plant tracking and care reminders over a JSON API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Default)]
enum Command {
    /// Run the HTTP server (default)
    #[default]
    Serve,
    /// Insert the demo catalog and the sample users
    SeedDemo,
}

/// Shared application context, built once in `main` and cloned into handlers
#[derive(Clone)]
pub struct AppState {
    pub env: Arc<Config>,
    pub db_client: db::DBClient,
    pub redis_client: redisdb::RedisClient,
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin: {}", e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let _guard = tracing_config::init_tracing();

    let cli = Cli::parse();
    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Connection to the database is successful");
            pool
        }
        Err(err) => {
            tracing::error!("Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let db_client = DBClient::new(pool);

    if let Err(err) = db_client.run_migrations().await {
        tracing::error!("Failed to run migrations: {}", err);
        std::process::exit(1);
    }

    if let Command::SeedDemo = cli.command.unwrap_or_default() {
        if let Err(err) = seed::run(&db_client).await {
            tracing::error!("Seeding demo data failed: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let manager = match redis::Client::open(config.redis_url.clone()) {
        Ok(client) => client.get_connection_manager().await,
        Err(err) => Err(err),
    };
    let redis_client = match manager {
        Ok(manager) => RedisClient::new(manager),
        Err(err) => {
            tracing::error!("Failed to connect to redis: {}", err);
            std::process::exit(1);
        }
    };

    let cors = cors_layer(&config);

    let app_state = AppState {
        env: Arc::new(config.clone()),
        db_client,
        redis_client,
    };

    let app = routes::create_router(app_state).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("Server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
    }
}
