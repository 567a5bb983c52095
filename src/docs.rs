use crate::api::worker::{CreateWorker, WorkerCode};
use crate::model::attendance::{Attendance, DailySummary, PresenceRecord, SummaryRow};
use crate::model::worker::Worker;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pointage API",
        version = "0.1.0",
        description = r#"
## Worker attendance tracker

Register workers, print a scannable code per worker and record one presence per worker per day.

### Key Features
- **Workers**: register, list, look up and delete by matricule
- **Codes**: a QR code pointing at the worker's presence URL
- **Presence**: one record per worker per day, a second scan is reported as a conflict
- **Daily log**: every worker with their presence for a given day

### Response Format
- JSON bodies, errors as `{"message": "..."}`

The same operations are available as HTML pages at the site root.
"#,
    ),
    paths(
        crate::api::worker::create_worker,
        crate::api::worker::list_workers,
        crate::api::worker::get_worker,
        crate::api::worker::delete_worker,
        crate::api::worker::worker_code,

        crate::api::attendance::mark_presence,
        crate::api::attendance::daily_summary
    ),
    components(
        schemas(
            Worker,
            CreateWorker,
            WorkerCode,
            Attendance,
            PresenceRecord,
            SummaryRow,
            DailySummary
        )
    ),
    tags(
        (name = "Worker", description = "Worker management APIs"),
        (name = "Attendance", description = "Presence marking and daily log APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();

        for expected in [
            "/api/v1/workers",
            "/api/v1/workers/{matricule}",
            "/api/v1/workers/{matricule}/qr",
            "/api/v1/presence/{matricule}",
            "/api/v1/attendance",
        ] {
            assert!(paths.iter().any(|p| p == expected), "missing {expected}");
        }
    }
}
