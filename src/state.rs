use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::{
    auth::jwt::JwtKeys,
    config::AppConfig,
    users::{InMemoryUserRepo, PgUserRepo, UserRepo},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        if config.uses_memory_store() {
            info!("using in-memory user store");
            return Ok(Self::from_parts(Arc::new(InMemoryUserRepo::new()), config));
        }

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        Ok(Self::from_parts(Arc::new(PgUserRepo::new(db)), config))
    }

    pub fn from_parts(users: Arc<dyn UserRepo>, config: AppConfig) -> Self {
        let keys = JwtKeys::from_config(&config.jwt);
        Self {
            users,
            config: Arc::new(config),
            keys,
        }
    }
}
