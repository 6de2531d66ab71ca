//! Student progress records: completions, favorites, and the aggregate summary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::materials::MaterialStatus;
use crate::error::{LecternError, Result};

/// A student's record of finishing a material. Re-marking overwrites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialCompletion {
    pub user_id: i64,
    pub material_id: i64,
    /// Minutes spent on the material.
    pub time_spent: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<i16>,
    pub completed_at: DateTime<Utc>,
}

/// Aggregate progress summary for one student.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProgress {
    pub completed_topics: i64,
    /// Average grade expressed as a percentage of the 5-point scale.
    pub success_rate: f64,
    pub learning_hours: f64,
    pub average_grade: f64,
    pub current_materials: Vec<ProgressMaterial>,
}

/// A material the student is working with, projected for the summary view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMaterial {
    pub id: i64,
    pub title: String,
    pub subject: String,
    /// 100 once completed, 0 otherwise.
    pub progress: i32,
    pub last_activity: DateTime<Utc>,
}

/// A favorited material projected for list views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub id: i64,
    pub title: String,
    pub subject: String,
    pub status: MaterialStatus,
    pub added_at: DateTime<Utc>,
}

/// Raw completion aggregates; the service derives the summary fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionStats {
    pub completed: i64,
    pub total_minutes: i64,
    pub average_grade: Option<f64>,
}

/// Payload for marking a material complete.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMaterialRequest {
    pub time_spent: i32,
    #[serde(default)]
    pub grade: Option<i16>,
}

impl CompleteMaterialRequest {
    pub fn validate(&self) -> Result<()> {
        if self.time_spent <= 0 {
            return Err(LecternError::Validation(
                "Time spent must be positive".to_string(),
            ));
        }
        if let Some(grade) = self.grade
            && !(1..=5).contains(&grade)
        {
            return Err(LecternError::Validation(
                "Grade must be between 1 and 5".to_string(),
            ));
        }
        Ok(())
    }
}

/// Payload for the favorite toggle; `action` is validated against
/// [`FavoriteAction`] so unknown values report verbatim.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteRequest {
    pub action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteAction {
    Add,
    Remove,
}

impl FromStr for FavoriteAction {
    type Err = LecternError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            _ => Err(LecternError::Validation(
                "Action must be add or remove".to_string(),
            )),
        }
    }
}

impl fmt::Display for FavoriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
        })
    }
}
