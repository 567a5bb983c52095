use actix_web::{HttpRequest, HttpResponse, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use serde::Deserialize;
use sqlx::AnyPool;
use tera::{Context, Tera};
use tracing::warn;

use crate::config::Config;
use crate::error::AppError;
use crate::model::worker::{NewWorker, Worker};
use crate::pages::{base_url, flash, redirect, render};
use crate::utils::qr;

#[derive(Debug, Default, Deserialize)]
pub struct WorkerForm {
    #[serde(default)]
    pub matricule: String,
    #[serde(default)]
    pub name: String,
}

fn form_page(
    templates: &Tera,
    form: &WorkerForm,
    error: Option<&AppError>,
) -> Result<HttpResponse, AppError> {
    let mut ctx = Context::new();
    ctx.insert("matricule", &form.matricule);
    ctx.insert("name", &form.name);
    if let Some(err) = error {
        ctx.insert(
            "flashes",
            &[flash::Flash {
                kind: "error",
                message: err.to_string(),
            }],
        );
    }

    render(templates, "add_worker.html", &ctx)
}

pub async fn add_worker_form(templates: web::Data<Tera>) -> actix_web::Result<HttpResponse> {
    Ok(form_page(&templates, &WorkerForm::default(), None)?)
}

/// Registers the worker, then sends the user to its code page.
/// Expected failures re-render the form with the submitted values.
pub async fn add_worker(
    req: HttpRequest,
    pool: web::Data<AnyPool>,
    templates: web::Data<Tera>,
    form: web::Form<WorkerForm>,
) -> actix_web::Result<HttpResponse> {
    let registered = match NewWorker::parse(&form.matricule, &form.name) {
        Ok(new) => Worker::register(pool.get_ref(), new).await,
        Err(e) => Err(e),
    };

    match registered {
        Ok(worker) => {
            FlashMessage::success(format!("Worker {} added", worker.name)).send();
            let location = req.url_for("worker_qr", [&worker.matricule])?;
            Ok(redirect(location.path()))
        }
        Err(e) if e.is_user_facing() => {
            warn!(error = %e, "Worker registration rejected");
            Ok(form_page(&templates, &form, Some(&e))?)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn view_workers(
    pool: web::Data<AnyPool>,
    templates: web::Data<Tera>,
    messages: IncomingFlashMessages,
) -> actix_web::Result<HttpResponse> {
    let workers = Worker::list_all(pool.get_ref()).await?;

    let mut ctx = Context::new();
    ctx.insert("flashes", &flash::collect(&messages));
    ctx.insert("workers", &workers);

    Ok(render(&templates, "view_workers.html", &ctx)?)
}

pub async fn worker_qr(
    req: HttpRequest,
    pool: web::Data<AnyPool>,
    templates: web::Data<Tera>,
    config: web::Data<Config>,
    path: web::Path<String>,
    messages: IncomingFlashMessages,
) -> actix_web::Result<HttpResponse> {
    let matricule = path.into_inner();

    let Some(worker) = Worker::find_by_matricule(pool.get_ref(), &matricule).await? else {
        FlashMessage::error("Worker not found").send();
        return Ok(redirect("/view_workers"));
    };

    let presence_url = qr::presence_url(&base_url(&req, &config), &worker.matricule);
    let qr_code = qr::png_base64(&presence_url)?;

    let mut ctx = Context::new();
    ctx.insert("flashes", &flash::collect(&messages));
    ctx.insert("worker", &worker);
    ctx.insert("presence_url", &presence_url);
    ctx.insert("qr_code", &qr_code);

    Ok(render(&templates, "worker_qr.html", &ctx)?)
}

pub async fn delete_worker(
    pool: web::Data<AnyPool>,
    path: web::Path<String>,
) -> actix_web::Result<HttpResponse> {
    let matricule = path.into_inner();

    match Worker::delete_by_matricule(pool.get_ref(), &matricule).await {
        Ok(_) => FlashMessage::success("Worker deleted").send(),
        Err(AppError::NotFound(_)) => FlashMessage::error("Worker not found").send(),
        Err(e) => return Err(e.into()),
    }

    Ok(redirect("/view_workers"))
}
