use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::api::error;

pub async fn connect_database(database_url: &str) -> Result<PgPool, error::SystemError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_slow_threshold(std::time::Duration::from_secs(3))
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| error::SystemError::InternalError(Box::new(e)))?;

    Ok(pool)
}

/// Secret used to validate bearer tokens, shared with the token issuer.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self { jwt_secret: jwt_secret.into() }
    }
}
