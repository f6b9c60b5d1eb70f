//! Account credential storage

use sqlx::SqlitePool;

use crate::db::models::Credentials;
use crate::Result;

/// Persist credentials after successful validation
pub async fn save_account(pool: &SqlitePool, credentials: &Credentials) -> Result<()> {
    sqlx::query("INSERT INTO account (username, password, server) VALUES (?, ?, ?)")
        .bind(&credentials.username)
        .bind(&credentials.password)
        .bind(&credentials.server)
        .execute(pool)
        .await?;

    Ok(())
}

/// Load the most recently saved credentials, if any
pub async fn load_account(pool: &SqlitePool) -> Result<Option<Credentials>> {
    let row = sqlx::query_as::<_, (String, String, String)>(
        "SELECT username, password, server FROM account ORDER BY id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(username, password, server)| Credentials {
        username,
        password,
        server,
    }))
}
