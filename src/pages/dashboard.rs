use actix_web::{HttpResponse, web};
use actix_web_flash_messages::IncomingFlashMessages;
use chrono::Local;
use sqlx::AnyPool;
use tera::{Context, Tera};

use crate::error::AppError;
use crate::model::{attendance, worker::Worker};
use crate::pages::{flash, render};

/// Home page: head count and today's attendance.
pub async fn index(
    pool: web::Data<AnyPool>,
    templates: web::Data<Tera>,
    messages: IncomingFlashMessages,
) -> Result<HttpResponse, AppError> {
    let today = Local::now().date_naive();

    let worker_count = Worker::count(pool.get_ref()).await?;
    let attendance_today = attendance::count_on(pool.get_ref(), today).await?;

    let mut ctx = Context::new();
    ctx.insert("flashes", &flash::collect(&messages));
    ctx.insert("worker_count", &worker_count);
    ctx.insert("attendance_today", &attendance_today);
    ctx.insert("today", &today.format(attendance::DATE_FORMAT).to_string());

    render(&templates, "index.html", &ctx)
}
