use actix_web::{HttpResponse, web};
use chrono::Local;
use serde::Deserialize;
use sqlx::AnyPool;
use utoipa::IntoParams;

use crate::error::AppError;
use crate::model::attendance::{self, DailySummary, PresenceRecord};

#[derive(Deserialize, IntoParams)]
pub struct SummaryQuery {
    /// Day to report, YYYY-MM-DD. Defaults to today.
    #[param(example = "2026-01-01")]
    pub date: Option<String>,
}

/// Mark presence endpoint
#[utoipa::path(
    post,
    path = "/api/v1/presence/{matricule}",
    params(
        ("matricule", Path, description = "Worker matricule")
    ),
    responses(
        (status = 201, description = "Presence recorded", body = PresenceRecord),
        (status = 404, description = "Unknown matricule", body = Object, example = json!({
            "message": "Worker A1 not found"
        })),
        (status = 409, description = "Already marked present today", body = Object, example = json!({
            "message": "A1 already marked present on 2026-01-01"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn mark_presence(
    pool: web::Data<AnyPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let now = Local::now().naive_local();
    let record = attendance::mark_presence(pool.get_ref(), &path.into_inner(), now).await?;

    Ok(HttpResponse::Created().json(record))
}

/// Daily attendance summary
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Every worker with their presence for the day", body = DailySummary),
        (status = 400, description = "Unparsable date", body = Object, example = json!({
            "message": "Invalid date 01/01/2026, expected YYYY-MM-DD"
        }))
    ),
    tag = "Attendance"
)]
pub async fn daily_summary(
    pool: web::Data<AnyPool>,
    query: web::Query<SummaryQuery>,
) -> Result<HttpResponse, AppError> {
    let today = Local::now().date_naive();
    let date = attendance::parse_log_date(query.date.as_deref(), today)?;

    let summary = attendance::daily_summary(pool.get_ref(), date).await?;
    Ok(HttpResponse::Ok().json(summary))
}
