use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub pwd_hash: String,
    pub is_admin: bool,
    pub created_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct OvertimePeriod {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct WorkEntry {
    pub id: i64,
    pub overtime_period_id: i64,
    pub entry_time: NaiveTime,
    pub exit_time: NaiveTime,
    pub created_at: String,
}

/// A period together with the entries recorded inside it, as rendered on the
/// dashboard and flattened by the export.
#[derive(Serialize, Debug, Clone)]
pub struct PeriodWithEntries {
    pub period: OvertimePeriod,
    pub entries: Vec<WorkEntry>,
}
