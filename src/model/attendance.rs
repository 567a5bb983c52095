use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use sqlx::AnyPool;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::error::{AppError, is_unique_violation};
use crate::model::worker::Worker;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = 1)]
    pub worker_id: i64,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "08:15:00", value_type = String)]
    pub time: NaiveTime,
}

// Dates and times are stored as text so the same SQL runs on every backend.
#[derive(sqlx::FromRow)]
struct AttendanceRow {
    id: i64,
    worker_id: i64,
    date: String,
    time: String,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = AppError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        Ok(Attendance {
            id: row.id,
            worker_id: row.worker_id,
            date: NaiveDate::parse_from_str(&row.date, DATE_FORMAT)?,
            time: NaiveTime::parse_from_str(&row.time, TIME_FORMAT)?,
        })
    }
}

/// A successful presence marking.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PresenceRecord {
    pub worker: Worker,
    pub attendance: Attendance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SummaryRow {
    #[schema(example = "A1")]
    pub matricule: String,
    #[schema(example = "Alice")]
    pub name: String,
    pub present: bool,
    #[schema(example = "08:15:00", value_type = String, nullable = true)]
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "date": "2026-01-01",
    "rows": [
        { "matricule": "A1", "name": "Alice", "present": true, "time": "08:15:00" },
        { "matricule": "B2", "name": "Bob", "present": false, "time": null }
    ],
    "present_count": 1,
    "total_workers": 2
}))]
pub struct DailySummary {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub rows: Vec<SummaryRow>,
    pub present_count: usize,
    pub total_workers: usize,
}

#[derive(sqlx::FromRow)]
struct SummaryJoinRow {
    matricule: String,
    name: String,
    time: Option<String>,
}

/// Resolves the date asked for on the attendance log. Blank means today.
pub fn parse_log_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(today),
        Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
            AppError::Validation(format!("Invalid date {value}, expected YYYY-MM-DD"))
        }),
    }
}

pub async fn find_for(
    pool: &AnyPool,
    worker_id: i64,
    date: NaiveDate,
) -> Result<Option<Attendance>, AppError> {
    sqlx::query_as::<_, AttendanceRow>(
        "SELECT id, worker_id, date, time FROM attendance WHERE worker_id = ? AND date = ?",
    )
    .bind(worker_id)
    .bind(date.format(DATE_FORMAT).to_string())
    .fetch_optional(pool)
    .await?
    .map(Attendance::try_from)
    .transpose()
}

pub async fn count_on(pool: &AnyPool, date: NaiveDate) -> Result<i64, AppError> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance WHERE date = ?")
        .bind(date.format(DATE_FORMAT).to_string())
        .fetch_one(pool)
        .await?;

    Ok(total)
}

/// Records that the worker was present at `now`. At most once per day:
/// a second call on the same date reports `AlreadyMarked`.
pub async fn mark_presence(
    pool: &AnyPool,
    matricule: &str,
    now: NaiveDateTime,
) -> Result<PresenceRecord, AppError> {
    let worker = Worker::find_by_matricule(pool, matricule)
        .await?
        .ok_or_else(|| AppError::NotFound(matricule.to_string()))?;

    let date = now.date();
    let time = now.time().with_nanosecond(0).unwrap_or_else(|| now.time());

    if find_for(pool, worker.id, date).await?.is_some() {
        debug!(matricule, %date, "Presence already recorded");
        return Err(AppError::AlreadyMarked { worker, date });
    }

    let attendance = insert(pool, &worker, date, time).await?;

    info!(matricule, %date, time = %attendance.time, "Presence recorded");
    Ok(PresenceRecord { worker, attendance })
}

async fn insert(
    pool: &AnyPool,
    worker: &Worker,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<Attendance, AppError> {
    let result = sqlx::query("INSERT INTO attendance (worker_id, date, time) VALUES (?, ?, ?)")
        .bind(worker.id)
        .bind(date.format(DATE_FORMAT).to_string())
        .bind(time.format(TIME_FORMAT).to_string())
        .execute(pool)
        .await;

    match result {
        Ok(_) => {}
        // double scan: another request inserted between our check and this insert
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::AlreadyMarked {
                worker: worker.clone(),
                date,
            });
        }
        Err(e) => return Err(e.into()),
    }

    find_for(pool, worker.id, date)
        .await?
        .ok_or_else(|| AppError::NotFound(worker.matricule.clone()))
}

/// One row per worker for `date`, absent workers included, sorted by name.
pub async fn daily_summary(pool: &AnyPool, date: NaiveDate) -> Result<DailySummary, AppError> {
    let joined = sqlx::query_as::<_, SummaryJoinRow>(
        r#"
        SELECT w.matricule, w.name, a.time
        FROM worker w
        LEFT JOIN attendance a ON a.worker_id = w.id AND a.date = ?
        ORDER BY w.id
        "#,
    )
    .bind(date.format(DATE_FORMAT).to_string())
    .fetch_all(pool)
    .await?;

    let mut rows = joined
        .into_iter()
        .map(|row| -> Result<SummaryRow, AppError> {
            let time = row
                .time
                .map(|t| NaiveTime::parse_from_str(&t, TIME_FORMAT))
                .transpose()?;
            Ok(SummaryRow {
                matricule: row.matricule,
                name: row.name,
                present: time.is_some(),
                time,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    rows.sort_by(|a, b| a.name.cmp(&b.name));

    let present_count = rows.iter().filter(|r| r.present).count();
    let total_workers = rows.len();

    Ok(DailySummary {
        date,
        rows,
        present_count,
        total_workers,
    })
}
