use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::AnyPool;
use utoipa::ToSchema;

use crate::config::Config;
use crate::error::AppError;
use crate::model::worker::{NewWorker, Worker};
use crate::pages::base_url;
use crate::utils::qr;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateWorker {
    #[schema(example = "A1")]
    pub matricule: String,
    #[schema(example = "Alice")]
    pub name: String,
}

#[derive(Serialize, ToSchema)]
pub struct WorkerCode {
    #[schema(example = "https://pointage.example.com/presence/A1")]
    pub presence_url: String,
    /// PNG image, base64 encoded
    pub png_base64: String,
}

/// Register Worker
#[utoipa::path(
    post,
    path = "/api/v1/workers",
    request_body = CreateWorker,
    responses(
        (status = 201, description = "Worker registered", body = Worker),
        (status = 400, description = "Matricule or name missing", body = Object, example = json!({
            "message": "Matricule and name are required"
        })),
        (status = 409, description = "Matricule already used", body = Object, example = json!({
            "message": "A worker with matricule A1 already exists"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Worker"
)]
pub async fn create_worker(
    pool: web::Data<AnyPool>,
    payload: web::Json<CreateWorker>,
) -> Result<HttpResponse, AppError> {
    let new = NewWorker::parse(&payload.matricule, &payload.name)?;
    let worker = Worker::register(pool.get_ref(), new).await?;

    Ok(HttpResponse::Created().json(worker))
}

#[utoipa::path(
    get,
    path = "/api/v1/workers",
    responses(
        (status = 200, description = "Every registered worker", body = Vec<Worker>)
    ),
    tag = "Worker"
)]
pub async fn list_workers(pool: web::Data<AnyPool>) -> Result<HttpResponse, AppError> {
    let workers = Worker::list_all(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(workers))
}

#[utoipa::path(
    get,
    path = "/api/v1/workers/{matricule}",
    params(
        ("matricule", Path, description = "Worker matricule")
    ),
    responses(
        (status = 200, description = "Worker found", body = Worker),
        (status = 404, description = "Worker not found", body = Object, example = json!({
            "message": "Worker A1 not found"
        }))
    ),
    tag = "Worker"
)]
pub async fn get_worker(
    pool: web::Data<AnyPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let matricule = path.into_inner();

    match Worker::find_by_matricule(pool.get_ref(), &matricule).await? {
        Some(worker) => Ok(HttpResponse::Ok().json(worker)),
        None => Err(AppError::NotFound(matricule)),
    }
}

/// Delete Worker and its attendance history
#[utoipa::path(
    delete,
    path = "/api/v1/workers/{matricule}",
    params(
        ("matricule", Path, description = "Worker matricule")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted",
            "attendance_removed": 3
        })),
        (status = 404, description = "Worker not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Worker"
)]
pub async fn delete_worker(
    pool: web::Data<AnyPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let removed = Worker::delete_by_matricule(pool.get_ref(), &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted",
        "attendance_removed": removed
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/workers/{matricule}/qr",
    params(
        ("matricule", Path, description = "Worker matricule")
    ),
    responses(
        (status = 200, description = "Scannable code for the presence URL", body = WorkerCode),
        (status = 404, description = "Worker not found")
    ),
    tag = "Worker"
)]
pub async fn worker_code(
    req: HttpRequest,
    pool: web::Data<AnyPool>,
    config: web::Data<Config>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let matricule = path.into_inner();
    let worker = Worker::find_by_matricule(pool.get_ref(), &matricule)
        .await?
        .ok_or(AppError::NotFound(matricule))?;

    let presence_url = qr::presence_url(&base_url(&req, &config), &worker.matricule);
    let png_base64 = qr::png_base64(&presence_url)?;

    Ok(HttpResponse::Ok().json(WorkerCode {
        presence_url,
        png_base64,
    }))
}
