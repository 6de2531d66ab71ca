use async_trait::async_trait;

use crate::domain::progress::{
    CompletionStats, FavoriteEntry, MaterialCompletion, ProgressMaterial,
};
use crate::error::Result;

/// Storage port for student completion and favorite records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Completion aggregates for one student.
    async fn completion_stats(&self, user_id: i64) -> Result<CompletionStats>;

    /// The student's favorites joined with completion state, projected for
    /// the progress summary.
    async fn current_materials(&self, user_id: i64) -> Result<Vec<ProgressMaterial>>;

    /// Record (or overwrite) a completion.
    async fn upsert_completion(
        &self,
        user_id: i64,
        material_id: i64,
        time_spent: i32,
        grade: Option<i16>,
    ) -> Result<MaterialCompletion>;

    /// Favorites, most recently added first.
    async fn list_favorites(&self, user_id: i64) -> Result<Vec<FavoriteEntry>>;

    /// Idempotent: adding an existing favorite is a no-op.
    async fn add_favorite(&self, user_id: i64, material_id: i64) -> Result<()>;

    /// Idempotent: removing an absent favorite is a no-op.
    async fn remove_favorite(&self, user_id: i64, material_id: i64) -> Result<()>;
}
