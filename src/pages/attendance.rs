use actix_web::{HttpResponse, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use chrono::Local;
use serde::Deserialize;
use sqlx::AnyPool;
use tera::{Context, Tera};

use crate::error::AppError;
use crate::model::attendance::{self, DATE_FORMAT, TIME_FORMAT};
use crate::pages::{flash, redirect, render};

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub date: Option<String>,
}

/// Target of the scanned code. Renders one of three outcomes:
/// recorded, unknown matricule, or already present today.
pub async fn presence(
    pool: web::Data<AnyPool>,
    templates: web::Data<Tera>,
    path: web::Path<String>,
) -> actix_web::Result<HttpResponse> {
    let matricule = path.into_inner();
    let now = Local::now().naive_local();

    let mut ctx = Context::new();
    match attendance::mark_presence(pool.get_ref(), &matricule, now).await {
        Ok(record) => {
            ctx.insert("success", &true);
            ctx.insert("worker", &record.worker);
            ctx.insert(
                "date",
                &record.attendance.date.format(DATE_FORMAT).to_string(),
            );
            ctx.insert(
                "time",
                &record.attendance.time.format(TIME_FORMAT).to_string(),
            );
            ctx.insert("message", "Presence recorded");
        }
        Err(AppError::NotFound(_)) => {
            ctx.insert("success", &false);
            ctx.insert("message", "Matricule not found");
        }
        Err(AppError::AlreadyMarked { worker, .. }) => {
            ctx.insert("success", &false);
            ctx.insert("worker", &worker);
            ctx.insert("message", "Already marked present today");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(render(&templates, "presence_confirmation.html", &ctx)?)
}

pub async fn attendance_log(
    pool: web::Data<AnyPool>,
    templates: web::Data<Tera>,
    query: web::Query<LogQuery>,
    messages: IncomingFlashMessages,
) -> actix_web::Result<HttpResponse> {
    let today = Local::now().date_naive();

    let date = match attendance::parse_log_date(query.date.as_deref(), today) {
        Ok(date) => date,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return Ok(redirect("/attendance_log"));
        }
    };

    let summary = attendance::daily_summary(pool.get_ref(), date).await?;
    let rows: Vec<_> = summary
        .rows
        .iter()
        .map(|row| {
            serde_json::json!({
                "matricule": row.matricule,
                "name": row.name,
                "present": row.present,
                "time": row.time.map(|t| t.format(TIME_FORMAT).to_string()),
            })
        })
        .collect();

    let mut ctx = Context::new();
    ctx.insert("flashes", &flash::collect(&messages));
    ctx.insert("attendance_data", &rows);
    ctx.insert("selected_date", &date.format(DATE_FORMAT).to_string());
    ctx.insert("total_workers", &summary.total_workers);
    ctx.insert("present_count", &summary.present_count);

    Ok(render(&templates, "attendance_log.html", &ctx)?)
}
