use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use tracing::info;

use crate::config::{Backend, Config};

const SQLITE_SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS worker (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        matricule TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        worker_id INTEGER NOT NULL REFERENCES worker (id) ON DELETE CASCADE,
        date TEXT NOT NULL,
        time TEXT NOT NULL,
        UNIQUE (worker_id, date)
    )
    "#,
];

const MYSQL_SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS worker (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        matricule VARCHAR(50) NOT NULL,
        name VARCHAR(100) NOT NULL,
        UNIQUE KEY uq_worker_matricule (matricule)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        worker_id BIGINT NOT NULL,
        date CHAR(10) NOT NULL,
        time CHAR(8) NOT NULL,
        UNIQUE KEY uq_attendance_worker_date (worker_id, date),
        CONSTRAINT fk_attendance_worker FOREIGN KEY (worker_id)
            REFERENCES worker (id) ON DELETE CASCADE
    )
    "#,
];

pub async fn init_db(config: &Config) -> Result<AnyPool, sqlx::Error> {
    sqlx::any::install_default_drivers();

    AnyPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
}

/// Creates the tables when missing. Safe to run on every start.
pub async fn migrate(pool: &AnyPool, backend: Backend) -> Result<(), sqlx::Error> {
    let statements = match backend {
        Backend::Sqlite => SQLITE_SCHEMA,
        Backend::MySql => MYSQL_SCHEMA,
    };

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }

    info!(?backend, "Schema ready");
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Fresh in-memory store. One connection, since every SQLite memory
    /// connection sees its own database.
    pub async fn memory_pool() -> AnyPool {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");

        migrate(&pool, Backend::Sqlite).await.expect("schema");
        pool
    }
}
