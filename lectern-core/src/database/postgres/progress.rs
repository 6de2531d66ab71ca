use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::database::ports::progress::ProgressRepository;
use crate::domain::materials::MaterialStatus;
use crate::domain::progress::{
    CompletionStats, FavoriteEntry, MaterialCompletion, ProgressMaterial,
};
use crate::error::{LecternError, Result};

#[derive(Debug, Clone)]
pub struct PostgresProgressRepository {
    pool: PgPool,
}

impl PostgresProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_completion(row: &PgRow) -> Result<MaterialCompletion> {
        let user_id: i64 = row
            .try_get("user_id")
            .map_err(|e| LecternError::Store(format!("Failed to read completion user: {e}")))?;
        let material_id: i64 = row
            .try_get("material_id")
            .map_err(|e| LecternError::Store(format!("Failed to read completion material: {e}")))?;
        let time_spent: i32 = row
            .try_get("time_spent")
            .map_err(|e| LecternError::Store(format!("Failed to read time spent: {e}")))?;
        let grade: Option<i16> = row
            .try_get("grade")
            .map_err(|e| LecternError::Store(format!("Failed to read grade: {e}")))?;
        let completed_at: DateTime<Utc> = row
            .try_get("completed_at")
            .map_err(|e| LecternError::Store(format!("Failed to read completed_at: {e}")))?;

        Ok(MaterialCompletion {
            user_id,
            material_id,
            time_spent,
            grade,
            completed_at,
        })
    }

    fn map_favorite(row: &PgRow) -> Result<FavoriteEntry> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| LecternError::Store(format!("Failed to read favorite id: {e}")))?;
        let title: String = row
            .try_get("title")
            .map_err(|e| LecternError::Store(format!("Failed to read favorite title: {e}")))?;
        let subject: String = row
            .try_get("subject")
            .map_err(|e| LecternError::Store(format!("Failed to read favorite subject: {e}")))?;
        let status: String = row
            .try_get("status")
            .map_err(|e| LecternError::Store(format!("Failed to read favorite status: {e}")))?;
        let status = status
            .parse::<MaterialStatus>()
            .map_err(|_| LecternError::Store(format!("Unknown material status: {status}")))?;
        let added_at: DateTime<Utc> = row
            .try_get("added_at")
            .map_err(|e| LecternError::Store(format!("Failed to read added_at: {e}")))?;

        Ok(FavoriteEntry {
            id,
            title,
            subject,
            status,
            added_at,
        })
    }
}

#[async_trait]
impl ProgressRepository for PostgresProgressRepository {
    async fn completion_stats(&self, user_id: i64) -> Result<CompletionStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS completed,
                COALESCE(SUM(time_spent), 0) AS total_minutes,
                AVG(grade)::float8 AS average_grade
            FROM material_completions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| LecternError::Store(format!("Failed to load completion stats: {e}")))?;

        let completed: i64 = row
            .try_get("completed")
            .map_err(|e| LecternError::Store(format!("Failed to read completed count: {e}")))?;
        let total_minutes: i64 = row
            .try_get("total_minutes")
            .map_err(|e| LecternError::Store(format!("Failed to read total minutes: {e}")))?;
        let average_grade: Option<f64> = row
            .try_get("average_grade")
            .map_err(|e| LecternError::Store(format!("Failed to read average grade: {e}")))?;

        Ok(CompletionStats {
            completed,
            total_minutes,
            average_grade,
        })
    }

    async fn current_materials(&self, user_id: i64) -> Result<Vec<ProgressMaterial>> {
        let rows = sqlx::query(
            r#"
            SELECT
                m.id,
                m.title,
                m.subject,
                CASE WHEN c.user_id IS NULL THEN 0 ELSE 100 END AS progress,
                COALESCE(c.completed_at, f.added_at) AS last_activity
            FROM favorite_materials f
            JOIN materials m ON m.id = f.material_id
            LEFT JOIN material_completions c
                ON c.material_id = f.material_id AND c.user_id = f.user_id
            WHERE f.user_id = $1
            ORDER BY last_activity DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| LecternError::Store(format!("Failed to load current materials: {e}")))?;

        rows.iter()
            .map(|row| {
                let id: i64 = row
                    .try_get("id")
                    .map_err(|e| LecternError::Store(format!("Failed to read material id: {e}")))?;
                let title: String = row.try_get("title").map_err(|e| {
                    LecternError::Store(format!("Failed to read material title: {e}"))
                })?;
                let subject: String = row.try_get("subject").map_err(|e| {
                    LecternError::Store(format!("Failed to read material subject: {e}"))
                })?;
                let progress: i32 = row
                    .try_get("progress")
                    .map_err(|e| LecternError::Store(format!("Failed to read progress: {e}")))?;
                let last_activity: DateTime<Utc> = row.try_get("last_activity").map_err(|e| {
                    LecternError::Store(format!("Failed to read last activity: {e}"))
                })?;

                Ok(ProgressMaterial {
                    id,
                    title,
                    subject,
                    progress,
                    last_activity,
                })
            })
            .collect()
    }

    async fn upsert_completion(
        &self,
        user_id: i64,
        material_id: i64,
        time_spent: i32,
        grade: Option<i16>,
    ) -> Result<MaterialCompletion> {
        let row = sqlx::query(
            r#"
            INSERT INTO material_completions (user_id, material_id, time_spent, grade)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, material_id)
            DO UPDATE SET
                time_spent = EXCLUDED.time_spent,
                grade = EXCLUDED.grade,
                completed_at = NOW()
            RETURNING user_id, material_id, time_spent, grade, completed_at
            "#,
        )
        .bind(user_id)
        .bind(material_id)
        .bind(time_spent)
        .bind(grade)
        .fetch_one(self.pool())
        .await
        .map_err(|e| LecternError::Store(format!("Failed to record completion: {e}")))?;

        Self::map_completion(&row)
    }

    async fn list_favorites(&self, user_id: i64) -> Result<Vec<FavoriteEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.title, m.subject, m.status, f.added_at
            FROM favorite_materials f
            JOIN materials m ON m.id = f.material_id
            WHERE f.user_id = $1
            ORDER BY f.added_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| LecternError::Store(format!("Failed to list favorites: {e}")))?;

        rows.iter().map(Self::map_favorite).collect()
    }

    async fn add_favorite(&self, user_id: i64, material_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO favorite_materials (user_id, material_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, material_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(material_id)
        .execute(self.pool())
        .await
        .map_err(|e| LecternError::Store(format!("Failed to add favorite: {e}")))?;

        Ok(())
    }

    async fn remove_favorite(&self, user_id: i64, material_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM favorite_materials
            WHERE user_id = $1 AND material_id = $2
            "#,
        )
        .bind(user_id)
        .bind(material_id)
        .execute(self.pool())
        .await
        .map_err(|e| LecternError::Store(format!("Failed to remove favorite: {e}")))?;

        Ok(())
    }
}
