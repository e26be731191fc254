mod delegation_repository;
mod snapshot_repository;

pub use delegation_repository::PostgresDelegationRepository;
pub use snapshot_repository::{decode_weights, PostgresStakeSnapshot};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

pub async fn create_pool(config: &PostgresConfig) -> sqlx::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string)
        .await
}
