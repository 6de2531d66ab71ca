use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::database::ports::materials::MaterialsRepository;
use crate::domain::materials::{AccessMode, Block, BlockAnimation, Material, MaterialStatus};
use crate::error::{LecternError, Result};

#[derive(Debug, Clone)]
pub struct PostgresMaterialsRepository {
    pool: PgPool,
}

const MATERIAL_COLUMNS: &str = r#"
    id,
    title,
    subject,
    author_id,
    author_name,
    status,
    access,
    share_url,
    version,
    created_at,
    updated_at
"#;

impl PostgresMaterialsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_material(row: &PgRow) -> Result<Material> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| LecternError::Store(format!("Failed to read material id: {e}")))?;
        let title: String = row
            .try_get("title")
            .map_err(|e| LecternError::Store(format!("Failed to read material title: {e}")))?;
        let subject: String = row
            .try_get("subject")
            .map_err(|e| LecternError::Store(format!("Failed to read material subject: {e}")))?;
        let author_id: i64 = row
            .try_get("author_id")
            .map_err(|e| LecternError::Store(format!("Failed to read author id: {e}")))?;
        let author_name: Option<String> = row
            .try_get("author_name")
            .map_err(|e| LecternError::Store(format!("Failed to read author name: {e}")))?;
        let status: String = row
            .try_get("status")
            .map_err(|e| LecternError::Store(format!("Failed to read material status: {e}")))?;
        let status = status
            .parse::<MaterialStatus>()
            .map_err(|_| LecternError::Store(format!("Unknown material status: {status}")))?;
        let access: String = row
            .try_get("access")
            .map_err(|e| LecternError::Store(format!("Failed to read access mode: {e}")))?;
        let access = access
            .parse::<AccessMode>()
            .map_err(|_| LecternError::Store(format!("Unknown access mode: {access}")))?;
        let share_url: Option<String> = row
            .try_get("share_url")
            .map_err(|e| LecternError::Store(format!("Failed to read share url: {e}")))?;
        let version: i64 = row
            .try_get("version")
            .map_err(|e| LecternError::Store(format!("Failed to read material version: {e}")))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| LecternError::Store(format!("Failed to read created_at: {e}")))?;
        let updated_at: DateTime<Utc> = row
            .try_get("updated_at")
            .map_err(|e| LecternError::Store(format!("Failed to read updated_at: {e}")))?;

        Ok(Material {
            id,
            title,
            subject,
            author_id,
            author_name,
            status,
            access,
            share_url,
            blocks: Vec::new(),
            version,
            created_at,
            updated_at,
        })
    }

    fn map_block(row: &PgRow) -> Result<Block> {
        let id: String = row
            .try_get("id")
            .map_err(|e| LecternError::Store(format!("Failed to read block id: {e}")))?;
        let block_type: String = row
            .try_get("block_type")
            .map_err(|e| LecternError::Store(format!("Failed to read block type: {e}")))?;
        let content: Value = row
            .try_get("content")
            .map_err(|e| LecternError::Store(format!("Failed to read block content: {e}")))?;
        let styles: Option<Value> = row
            .try_get("styles")
            .map_err(|e| LecternError::Store(format!("Failed to read block styles: {e}")))?;
        let position: i32 = row
            .try_get("position")
            .map_err(|e| LecternError::Store(format!("Failed to read block position: {e}")))?;
        let animation: Option<BlockAnimation> = row
            .try_get::<Option<Value>, _>("animation")
            .map_err(|e| LecternError::Store(format!("Failed to read block animation: {e}")))?
            .map(serde_json::from_value)
            .transpose()?;

        Ok(Block {
            id,
            block_type,
            content,
            styles,
            position,
            animation,
        })
    }

    fn animation_value(animation: Option<&BlockAnimation>) -> Result<Option<Value>> {
        animation
            .map(serde_json::to_value)
            .transpose()
            .map_err(LecternError::from)
    }
}

#[async_trait]
impl MaterialsRepository for PostgresMaterialsRepository {
    async fn create(&self, author_id: i64, title: &str, subject: &str) -> Result<Material> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO materials (title, subject, author_id)
            VALUES ($1, $2, $3)
            RETURNING {MATERIAL_COLUMNS}
            "#
        ))
        .bind(title)
        .bind(subject)
        .bind(author_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| LecternError::Store(format!("Failed to create material: {e}")))?;

        Self::map_material(&row)
    }

    async fn fetch(&self, material_id: i64) -> Result<Option<Material>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {MATERIAL_COLUMNS}
            FROM materials
            WHERE id = $1
            "#
        ))
        .bind(material_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| LecternError::Store(format!("Failed to load material: {e}")))?;

        row.map(|row| Self::map_material(&row)).transpose()
    }

    async fn fetch_blocks(&self, material_id: i64) -> Result<Vec<Block>> {
        let rows = sqlx::query(
            r#"
            SELECT id, block_type, content, styles, position, animation
            FROM material_blocks
            WHERE material_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(material_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| LecternError::Store(format!("Failed to load blocks: {e}")))?;

        rows.iter().map(Self::map_block).collect()
    }

    async fn exists(&self, material_id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM materials WHERE id = $1) AS present")
            .bind(material_id)
            .fetch_one(self.pool())
            .await
            .map_err(|e| LecternError::Store(format!("Failed to check material: {e}")))?;

        row.try_get("present")
            .map_err(|e| LecternError::Store(format!("Failed to read existence flag: {e}")))
    }

    async fn list_for_author(
        &self,
        author_id: i64,
        status: Option<MaterialStatus>,
    ) -> Result<Vec<Material>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    r#"
                    SELECT {MATERIAL_COLUMNS}
                    FROM materials
                    WHERE author_id = $1 AND status = $2
                    ORDER BY updated_at DESC
                    "#
                ))
                .bind(author_id)
                .bind(status.as_str())
                .fetch_all(self.pool())
                .await
            }
            None => {
                sqlx::query(&format!(
                    r#"
                    SELECT {MATERIAL_COLUMNS}
                    FROM materials
                    WHERE author_id = $1
                    ORDER BY updated_at DESC
                    "#
                ))
                .bind(author_id)
                .fetch_all(self.pool())
                .await
            }
        }
        .map_err(|e| LecternError::Store(format!("Failed to list materials: {e}")))?;

        rows.iter().map(Self::map_material).collect()
    }

    async fn update_title(&self, material_id: i64, title: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE materials
            SET title = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(material_id)
        .bind(title)
        .execute(self.pool())
        .await
        .map_err(|e| LecternError::Store(format!("Failed to update title: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(LecternError::NotFound(format!(
                "Material {material_id} not found"
            )));
        }

        Ok(())
    }

    async fn replace_blocks(
        &self,
        material_id: i64,
        expected_version: i64,
        blocks: &[Block],
    ) -> Result<()> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| LecternError::Store(format!("Failed to begin transaction: {e}")))?;

        // Version gate: losing this race means another writer rewrote the
        // sequence after we read it, so the whole operation must be retried.
        let result = sqlx::query(
            r#"
            UPDATE materials
            SET version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(material_id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await
        .map_err(|e| LecternError::Store(format!("Failed to advance material version: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(LecternError::Conflict(format!(
                "Material {material_id} was modified concurrently"
            )));
        }

        sqlx::query("DELETE FROM material_blocks WHERE material_id = $1")
            .bind(material_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| LecternError::Store(format!("Failed to clear blocks: {e}")))?;

        for block in blocks {
            let animation = Self::animation_value(block.animation.as_ref())?;
            sqlx::query(
                r#"
                INSERT INTO material_blocks
                    (material_id, id, block_type, content, styles, position, animation)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(material_id)
            .bind(&block.id)
            .bind(&block.block_type)
            .bind(&block.content)
            .bind(&block.styles)
            .bind(block.position)
            .bind(animation)
            .execute(&mut *tx)
            .await
            .map_err(|e| LecternError::Store(format!("Failed to insert block: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| LecternError::Store(format!("Failed to commit block write: {e}")))?;

        Ok(())
    }

    async fn update_publication(
        &self,
        material_id: i64,
        status: MaterialStatus,
        access: AccessMode,
        share_url: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE materials
            SET status = $2, access = $3, share_url = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(material_id)
        .bind(status.as_str())
        .bind(access.as_str())
        .bind(share_url)
        .execute(self.pool())
        .await
        .map_err(|e| LecternError::Store(format!("Failed to update publication state: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(LecternError::NotFound(format!(
                "Material {material_id} not found"
            )));
        }

        Ok(())
    }
}
