//! Progress summaries, completions, and favorites.

use std::sync::Arc;

use tracing::info;

use crate::database::ports::{MaterialsRepository, ProgressRepository};
use crate::domain::progress::{
    CompleteMaterialRequest, FavoriteAction, FavoriteEntry, MaterialCompletion, StudentProgress,
    ToggleFavoriteRequest,
};
use crate::error::{LecternError, Result};

/// The grade scale completions are recorded on.
const GRADE_SCALE: f64 = 5.0;

/// Tracks what students have completed and favorited.
pub struct ProgressService {
    progress: Arc<dyn ProgressRepository>,
    materials: Arc<dyn MaterialsRepository>,
}

impl std::fmt::Debug for ProgressService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressService").finish_non_exhaustive()
    }
}

impl ProgressService {
    pub fn new(
        progress: Arc<dyn ProgressRepository>,
        materials: Arc<dyn MaterialsRepository>,
    ) -> Self {
        Self {
            progress,
            materials,
        }
    }

    /// Builds the aggregate summary for one student.
    ///
    /// A student with no completions gets a zeroed summary rather than an
    /// error.
    pub async fn summary(&self, user_id: i64) -> Result<StudentProgress> {
        let stats = self.progress.completion_stats(user_id).await?;
        let current_materials = self.progress.current_materials(user_id).await?;

        let average_grade = stats.average_grade.unwrap_or(0.0);
        Ok(StudentProgress {
            completed_topics: stats.completed,
            success_rate: average_grade / GRADE_SCALE * 100.0,
            learning_hours: stats.total_minutes as f64 / 60.0,
            average_grade,
            current_materials,
        })
    }

    /// Records that the student finished a material. Marking the same
    /// material again overwrites the previous record.
    pub async fn mark_complete(
        &self,
        user_id: i64,
        material_id: i64,
        request: CompleteMaterialRequest,
    ) -> Result<MaterialCompletion> {
        request.validate()?;

        if !self.materials.exists(material_id).await? {
            return Err(LecternError::NotFound(format!(
                "Material {material_id} not found"
            )));
        }

        let completion = self
            .progress
            .upsert_completion(user_id, material_id, request.time_spent, request.grade)
            .await?;
        info!(user_id, material_id, "Material marked complete");
        Ok(completion)
    }

    pub async fn favorites(&self, user_id: i64) -> Result<Vec<FavoriteEntry>> {
        self.progress.list_favorites(user_id).await
    }

    /// Adds or removes a favorite depending on the requested action.
    ///
    /// Adding checks the material exists; removing is a blind delete so a
    /// favorite can be dropped even after its material is gone.
    pub async fn toggle_favorite(
        &self,
        user_id: i64,
        material_id: i64,
        request: ToggleFavoriteRequest,
    ) -> Result<()> {
        let action = request.action.parse::<FavoriteAction>()?;
        match action {
            FavoriteAction::Add => {
                if !self.materials.exists(material_id).await? {
                    return Err(LecternError::NotFound(format!(
                        "Material {material_id} not found"
                    )));
                }
                self.progress.add_favorite(user_id, material_id).await?;
            }
            FavoriteAction::Remove => {
                self.progress.remove_favorite(user_id, material_id).await?;
            }
        }
        info!(user_id, material_id, %action, "Favorite toggled");
        Ok(())
    }
}
