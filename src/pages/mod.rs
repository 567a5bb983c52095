//! Server-rendered HTML pages.

pub mod attendance;
pub mod dashboard;
pub mod flash;
pub mod worker;

use actix_web::{HttpRequest, HttpResponse, http::header};
use tera::{Context, Tera};

use crate::config::Config;
use crate::error::AppError;

pub fn load_templates() -> Result<Tera, tera::Error> {
    Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html"))
}

pub fn render(templates: &Tera, name: &str, ctx: &Context) -> Result<HttpResponse, AppError> {
    let body = templates.render(name, ctx)?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Root the generated codes point at. The configured public URL wins,
/// otherwise the scheme and host the request came in on (proxy headers included).
pub fn base_url(req: &HttpRequest, config: &Config) -> String {
    if let Some(url) = &config.public_base_url {
        return url.clone();
    }

    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}
