use sqlx::{SqlitePool, sqlite::SqlitePoolOptions, sqlite::SqliteConnectOptions};
use std::str::FromStr;
use std::time::Duration;

/// SQLite serializes writers, so a handful of connections covers the request load.
pub const MAX_CONNECTIONS: u32 = 4;
/// How long a writer waits on a locked database before the request fails.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Db(pub SqlitePool);
impl Db {
    pub async fn connect_and_migrate(path: &str) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(BUSY_TIMEOUT)
            .connect_with(opts).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("database ready at {} ({} connections max)", path, MAX_CONNECTIONS);
        Ok(Db(pool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn pool_enforces_foreign_keys_and_migrates_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.sqlite3");
        let path = path.to_str().unwrap();

        let db = Db::connect_and_migrate(path).await.unwrap();
        assert_eq!(db.0.options().get_max_connections(), MAX_CONNECTIONS);

        let fk: i64 = sqlx::query_scalar("PRAGMA foreign_keys").fetch_one(&db.0).await.unwrap();
        assert_eq!(fk, 1);
        let orphan = sqlx::query(
            "INSERT INTO students (name, email, class_id, created_at) VALUES ('Ada', '', 99, '2024-01-01')",
        )
        .execute(&db.0)
        .await;
        assert!(orphan.is_err());

        db.0.close().await;
        Db::connect_and_migrate(path).await.unwrap();
    }
}
