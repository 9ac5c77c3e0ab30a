use std::time::Instant;

pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

// Application State
pub struct AppState {
    pub db: sqlx::MySqlPool,
    pub config: config::Config,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: sqlx::MySqlPool, config: config::Config) -> Self {
        Self {
            db,
            config,
            started_at: Instant::now(),
        }
    }
}
