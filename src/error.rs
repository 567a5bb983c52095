use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

use crate::model::worker::Worker;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("A worker with matricule {0} already exists")]
    DuplicateMatricule(String),

    #[error("Worker {0} not found")]
    NotFound(String),

    #[error("{} already marked present on {date}", .worker.matricule)]
    AlreadyMarked { worker: Worker, date: NaiveDate },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Stored value could not be parsed: {0}")]
    Decode(#[from] chrono::ParseError),

    #[error("Failed to render code: {0}")]
    CodeRender(String),
}

impl AppError {
    /// Expected outcomes the user can act on, as opposed to server faults.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::DuplicateMatricule(_)
                | AppError::NotFound(_)
                | AppError::AlreadyMarked { .. }
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateMatricule(_) | AppError::AlreadyMarked { .. } => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_user_facing() {
            return HttpResponse::build(self.status_code()).json(json!({
                "message": self.to_string()
            }));
        }

        tracing::error!(error = %self, "Request failed");
        HttpResponse::InternalServerError().json(json!({
            "message": "Something went wrong, Contact with system admin"
        }))
    }
}

/// True when the database rejected a write because of a UNIQUE constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            // 23000: MySQL integrity constraint, 2067/1555: SQLite unique/primary key
            db_err.is_unique_violation()
                || matches!(db_err.code().as_deref(), Some("23000" | "2067" | "1555"))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Worker {
        Worker {
            id: 1,
            matricule: "A1".into(),
            name: "Alice".into(),
        }
    }

    #[test]
    fn expected_outcomes_map_to_client_errors() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let cases = [
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::DuplicateMatricule("A1".into()), StatusCode::CONFLICT),
            (AppError::NotFound("A1".into()), StatusCode::NOT_FOUND),
            (AppError::AlreadyMarked { worker: alice(), date }, StatusCode::CONFLICT),
        ];

        for (err, status) in cases {
            assert!(err.is_user_facing());
            assert_eq!(err.status_code(), status);
        }
    }

    #[test]
    fn storage_failures_are_server_errors() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);

        assert!(!err.is_user_facing());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn already_marked_names_worker_and_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let err = AppError::AlreadyMarked { worker: alice(), date };

        assert_eq!(err.to_string(), "A1 already marked present on 2026-03-02");
    }
}
