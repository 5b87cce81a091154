use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::{Gym, GymStatus},
    error::{AppError, Result},
    repository::GymRepository,
};

#[derive(FromRow)]
struct GymRow {
    id: i64,
    name: String,
    status: String,
    created_at: NaiveDateTime,
}

pub struct SqliteGymRepository {
    pool: SqlitePool,
}

impl SqliteGymRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_gym(row: GymRow) -> Result<Gym> {
        Ok(Gym {
            id: row.id,
            name: row.name,
            status: Self::parse_status(&row.status)?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }

    fn parse_status(s: &str) -> Result<GymStatus> {
        match s {
            "active" => Ok(GymStatus::Active),
            "inactive" => Ok(GymStatus::Inactive),
            _ => Err(AppError::Database(format!("Invalid gym status: {}", s))),
        }
    }
}

#[async_trait]
impl GymRepository for SqliteGymRepository {
    async fn create(&self, name: &str, status: GymStatus) -> Result<Gym> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO gyms (name, status, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created gym".to_string()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Gym>> {
        let row = sqlx::query_as::<_, GymRow>(
            "SELECT id, name, status, created_at FROM gyms WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_gym(r)?)),
            None => Ok(None),
        }
    }

    async fn find_active(&self, id: i64) -> Result<Option<Gym>> {
        let row = sqlx::query_as::<_, GymRow>(
            "SELECT id, name, status, created_at FROM gyms WHERE id = ? AND status = 'active'",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_gym(r)?)),
            None => Ok(None),
        }
    }
}
