use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};

use crate::{
    errors::AppError,
    structs::{OvertimePeriod, PeriodWithEntries, User, WorkEntry},
    utils, AppState,
};

pub async fn get_all_users(state: &AppState) -> Result<Vec<User>, sqlx::Error> {
    let pool = state.db_pool.clone();
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
        .fetch_all(&pool)
        .await?;
    Ok(users)
}

pub async fn get_user_by_id(state: &AppState, id: i64) -> Result<Option<User>, sqlx::Error> {
    let pool = state.db_pool.clone();
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    Ok(user)
}

pub async fn get_user_by_username(
    state: &AppState,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    let pool = state.db_pool.clone();
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(&pool)
        .await?;
    Ok(user)
}

pub async fn create_user(
    state: &AppState,
    username: &str,
    password: &str,
    is_admin: bool,
) -> Result<User, AppError> {
    let created_at = chrono::Utc::now().to_string();
    let pwd_hash = utils::hash_password(password)?;
    let pool = state.db_pool.clone();
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, pwd_hash, is_admin, created_at) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(username)
    .bind(pwd_hash)
    .bind(is_admin)
    .bind(&created_at)
    .fetch_one(&pool)
    .await?;
    log::info!("User created: {} (id {})", user.username, user.id);
    Ok(user)
}

pub async fn set_user_admin(state: &AppState, id: i64) -> Result<Option<User>, sqlx::Error> {
    let pool = state.db_pool.clone();
    let user = sqlx::query_as::<_, User>("UPDATE users SET is_admin = 1 WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    Ok(user)
}

pub async fn create_overtime_period(
    state: &AppState,
    user_id: i64,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<OvertimePeriod, sqlx::Error> {
    let created_at = chrono::Utc::now().to_string();
    let pool = state.db_pool.clone();
    let period = sqlx::query_as::<_, OvertimePeriod>(
        "INSERT INTO overtime_periods (user_id, date, start_time, end_time, created_at) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(user_id)
    .bind(date)
    .bind(start_time)
    .bind(end_time)
    .bind(&created_at)
    .fetch_one(&pool)
    .await?;
    log::info!("Overtime period {} created for user {}", period.id, user_id);
    Ok(period)
}

pub async fn get_overtime_period_by_id(
    state: &AppState,
    id: i64,
) -> Result<Option<OvertimePeriod>, sqlx::Error> {
    let pool = state.db_pool.clone();
    let period = sqlx::query_as::<_, OvertimePeriod>("SELECT * FROM overtime_periods WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    Ok(period)
}

pub async fn list_overtime_periods(
    state: &AppState,
    user_id: i64,
) -> Result<Vec<OvertimePeriod>, sqlx::Error> {
    let pool = state.db_pool.clone();
    let periods = sqlx::query_as::<_, OvertimePeriod>(
        "SELECT * FROM overtime_periods WHERE user_id = $1 ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;
    Ok(periods)
}

pub async fn create_work_entry(
    state: &AppState,
    overtime_period_id: i64,
    entry_time: NaiveTime,
    exit_time: NaiveTime,
) -> Result<WorkEntry, sqlx::Error> {
    let created_at = chrono::Utc::now().to_string();
    let pool = state.db_pool.clone();
    let entry = sqlx::query_as::<_, WorkEntry>(
        "INSERT INTO work_entries (overtime_period_id, entry_time, exit_time, created_at) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(overtime_period_id)
    .bind(entry_time)
    .bind(exit_time)
    .bind(&created_at)
    .fetch_one(&pool)
    .await?;
    log::info!(
        "Work entry {} created under period {}",
        entry.id,
        overtime_period_id
    );
    Ok(entry)
}

/// All of a user's periods in insertion order, each with its entries attached.
pub async fn list_periods_with_entries(
    state: &AppState,
    user_id: i64,
) -> Result<Vec<PeriodWithEntries>, sqlx::Error> {
    let periods = list_overtime_periods(state, user_id).await?;

    let pool = state.db_pool.clone();
    let entries = sqlx::query_as::<_, WorkEntry>(
        "SELECT we.* FROM work_entries we \
         JOIN overtime_periods op ON op.id = we.overtime_period_id \
         WHERE op.user_id = $1 ORDER BY we.id",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let mut by_period: HashMap<i64, Vec<WorkEntry>> = HashMap::new();
    for entry in entries {
        by_period
            .entry(entry.overtime_period_id)
            .or_default()
            .push(entry);
    }

    Ok(periods
        .into_iter()
        .map(|period| {
            let entries = by_period.remove(&period.id).unwrap_or_default();
            PeriodWithEntries { period, entries }
        })
        .collect())
}
