use crate::{
    api,
    config::Config,
    error::AppError,
    pages::{attendance, dashboard, worker},
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, KeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{dev::ServiceRequest, web};
use anyhow::anyhow;

/// Rate limiting key for the presence routes: the scanned matricule.
///
/// Every worker scans from the same kiosk or site network, so the peer IP
/// would put the whole shift in one bucket.
#[derive(Debug, Clone, Copy)]
pub struct MatriculeKeyExtractor;

impl KeyExtractor for MatriculeKeyExtractor {
    type Key = String;
    type KeyExtractionError = AppError;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        req.match_info()
            .get("matricule")
            .map(str::to_owned)
            .ok_or_else(|| AppError::Validation("Missing matricule".to_string()))
    }
}

pub type Limiter = GovernorConfig<MatriculeKeyExtractor, NoOpMiddleware>;

/// Per-matricule limiter for the presence routes, shared by every worker thread.
pub fn presence_limiter(config: &Config) -> anyhow::Result<Limiter> {
    let requests_per_min = config.rate_presence_per_min.max(1);
    let per_ms = 60_000 / requests_per_min as u64;

    GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(MatriculeKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid presence rate limit: {requests_per_min}/min"))
}

pub fn configure(cfg: &mut web::ServiceConfig, limiter: &Limiter) {
    // HTML pages
    cfg.service(
        web::resource("/")
            .name("index")
            .route(web::get().to(dashboard::index)),
    )
    .service(
        web::resource("/add_worker")
            .name("add_worker")
            .route(web::get().to(worker::add_worker_form))
            .route(web::post().to(worker::add_worker)),
    )
    .service(
        web::resource("/view_workers")
            .name("view_workers")
            .route(web::get().to(worker::view_workers)),
    )
    .service(
        web::resource("/worker_qr/{matricule}")
            .name("worker_qr")
            .route(web::get().to(worker::worker_qr)),
    )
    .service(
        web::resource("/delete_worker/{matricule}")
            .name("delete_worker")
            .route(web::get().to(worker::delete_worker)),
    )
    .service(
        web::resource("/presence/{matricule}")
            .name("presence")
            .wrap(Governor::new(limiter))
            .route(web::get().to(attendance::presence)),
    )
    .service(
        web::resource("/attendance_log")
            .name("attendance_log")
            .route(web::get().to(attendance::attendance_log)),
    );

    // JSON API
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::scope("/workers")
                    // /workers
                    .service(
                        web::resource("")
                            .route(web::get().to(api::worker::list_workers))
                            .route(web::post().to(api::worker::create_worker)),
                    )
                    // /workers/{matricule}
                    .service(
                        web::resource("/{matricule}")
                            .route(web::get().to(api::worker::get_worker))
                            .route(web::delete().to(api::worker::delete_worker)),
                    )
                    // /workers/{matricule}/qr
                    .service(
                        web::resource("/{matricule}/qr")
                            .route(web::get().to(api::worker::worker_code)),
                    ),
            )
            .service(
                web::resource("/presence/{matricule}")
                    .wrap(Governor::new(limiter))
                    .route(web::post().to(api::attendance::mark_presence)),
            )
            .service(
                web::resource("/attendance").route(web::get().to(api::attendance::daily_summary)),
            ),
    );
}
