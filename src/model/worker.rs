use serde::{Deserialize, Serialize};
use sqlx::AnyPool;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::error::{AppError, is_unique_violation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "matricule": "A1",
        "name": "Alice"
    })
)]
pub struct Worker {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "A1")]
    pub matricule: String,

    #[schema(example = "Alice")]
    pub name: String,
}

/// Registration input, trimmed and checked for emptiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorker {
    matricule: String,
    name: String,
}

impl NewWorker {
    pub fn parse(matricule: &str, name: &str) -> Result<Self, AppError> {
        let matricule = matricule.trim();
        let name = name.trim();

        if matricule.is_empty() || name.is_empty() {
            return Err(AppError::Validation(
                "Matricule and name are required".to_string(),
            ));
        }

        Ok(Self {
            matricule: matricule.to_string(),
            name: name.to_string(),
        })
    }
}

impl Worker {
    pub async fn register(pool: &AnyPool, new: NewWorker) -> Result<Worker, AppError> {
        if Self::find_by_matricule(pool, &new.matricule).await?.is_some() {
            return Err(AppError::DuplicateMatricule(new.matricule));
        }

        insert(pool, &new).await?;

        let worker = Self::find_by_matricule(pool, &new.matricule)
            .await?
            .ok_or_else(|| AppError::NotFound(new.matricule.clone()))?;

        info!(matricule = %worker.matricule, id = worker.id, "Worker registered");
        Ok(worker)
    }

    pub async fn find_by_matricule(
        pool: &AnyPool,
        matricule: &str,
    ) -> Result<Option<Worker>, AppError> {
        let worker = sqlx::query_as::<_, Worker>(
            "SELECT id, matricule, name FROM worker WHERE matricule = ?",
        )
        .bind(matricule)
        .fetch_optional(pool)
        .await?;

        Ok(worker)
    }

    /// All workers keyed by matricule.
    pub async fn list_all(pool: &AnyPool) -> Result<Vec<Worker>, AppError> {
        let workers = sqlx::query_as::<_, Worker>(
            "SELECT id, matricule, name FROM worker ORDER BY matricule",
        )
        .fetch_all(pool)
        .await?;

        debug!(count = workers.len(), "Listed workers");
        Ok(workers)
    }

    pub async fn count(pool: &AnyPool) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM worker")
            .fetch_one(pool)
            .await?;

        Ok(total)
    }

    /// Removes the worker and its whole attendance history atomically.
    /// Returns how many attendance rows went with it.
    pub async fn delete_by_matricule(pool: &AnyPool, matricule: &str) -> Result<u64, AppError> {
        let mut tx = pool.begin().await?;

        let worker_id = sqlx::query_scalar::<_, i64>("SELECT id FROM worker WHERE matricule = ?")
            .bind(matricule)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(matricule.to_string()))?;

        let removed = sqlx::query("DELETE FROM attendance WHERE worker_id = ?")
            .bind(worker_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM worker WHERE id = ?")
            .bind(worker_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(matricule, attendance_removed = removed, "Worker deleted");
        Ok(removed)
    }
}

async fn insert(pool: &AnyPool, new: &NewWorker) -> Result<(), AppError> {
    let result = sqlx::query("INSERT INTO worker (matricule, name) VALUES (?, ?)")
        .bind(&new.matricule)
        .bind(&new.name)
        .execute(pool)
        .await;

    match result {
        Ok(_) => Ok(()),
        // lost a race against another registration of the same matricule
        Err(e) if is_unique_violation(&e) => {
            Err(AppError::DuplicateMatricule(new.matricule.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::memory_pool;

    async fn register(pool: &AnyPool, matricule: &str, name: &str) -> Result<Worker, AppError> {
        Worker::register(pool, NewWorker::parse(matricule, name)?).await
    }

    #[actix_web::test]
    async fn registered_worker_can_be_found_by_matricule() {
        let pool = memory_pool().await;

        let created = register(&pool, "  A1 ", " Alice  ").await.unwrap();
        let found = Worker::find_by_matricule(&pool, "A1").await.unwrap().unwrap();

        assert_eq!(created, found);
        assert_eq!(found.matricule, "A1");
        assert_eq!(found.name, "Alice");
    }

    #[actix_web::test]
    async fn duplicate_matricule_is_rejected() {
        let pool = memory_pool().await;

        register(&pool, "A1", "Alice").await.unwrap();
        let err = register(&pool, "A1", "Another Alice").await.unwrap_err();

        assert!(matches!(err, AppError::DuplicateMatricule(m) if m == "A1"));
        assert_eq!(Worker::count(&pool).await.unwrap(), 1);
        let kept = Worker::find_by_matricule(&pool, "A1").await.unwrap().unwrap();
        assert_eq!(kept.name, "Alice");
    }

    #[actix_web::test]
    async fn racing_registration_is_reported_as_duplicate() {
        let pool = memory_pool().await;
        let new = NewWorker::parse("A1", "Alice").unwrap();

        // both requests passed the availability check before either inserted
        insert(&pool, &new).await.unwrap();
        let err = insert(&pool, &new).await.unwrap_err();

        assert!(matches!(err, AppError::DuplicateMatricule(m) if m == "A1"));
        assert_eq!(Worker::count(&pool).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn blank_fields_fail_validation() {
        let pool = memory_pool().await;

        for (matricule, name) in [("", "Alice"), ("A1", ""), ("   ", "Alice"), ("A1", "\t ")] {
            let err = NewWorker::parse(matricule, name).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }

        assert_eq!(Worker::count(&pool).await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn unknown_matricule_is_absent_not_an_error() {
        let pool = memory_pool().await;

        assert!(Worker::find_by_matricule(&pool, "ZZ").await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn listing_is_ordered_by_matricule() {
        let pool = memory_pool().await;
        register(&pool, "B2", "Bob").await.unwrap();
        register(&pool, "A1", "Alice").await.unwrap();

        let matricules: Vec<_> = Worker::list_all(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.matricule)
            .collect();

        assert_eq!(matricules, vec!["A1", "B2"]);
    }

    #[actix_web::test]
    async fn deleting_worker_removes_its_attendance() {
        let pool = memory_pool().await;
        let alice = register(&pool, "A1", "Alice").await.unwrap();
        let bob = register(&pool, "B2", "Bob").await.unwrap();

        for (worker_id, date) in [
            (alice.id, "2026-03-02"),
            (alice.id, "2026-03-03"),
            (alice.id, "2026-03-04"),
            (bob.id, "2026-03-02"),
        ] {
            sqlx::query("INSERT INTO attendance (worker_id, date, time) VALUES (?, ?, '08:00:00')")
                .bind(worker_id)
                .bind(date)
                .execute(&pool)
                .await
                .unwrap();
        }

        let removed = Worker::delete_by_matricule(&pool, "A1").await.unwrap();
        assert_eq!(removed, 3);
        assert!(Worker::find_by_matricule(&pool, "A1").await.unwrap().is_none());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[actix_web::test]
    async fn deleting_unknown_worker_reports_not_found() {
        let pool = memory_pool().await;

        let err = Worker::delete_by_matricule(&pool, "ZZ").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(m) if m == "ZZ"));
    }
}
