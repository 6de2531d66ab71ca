use axum::{
    Extension, Json,
    extract::{Path, State},
};

use lectern_core::api_types::ApiResponse;
use lectern_core::domain::identity::Principal;
use lectern_core::domain::progress::{
    CompleteMaterialRequest, FavoriteEntry, MaterialCompletion, StudentProgress,
    ToggleFavoriteRequest,
};

use crate::infra::app_state::AppState;
use crate::infra::errors::AppResult;

/// Aggregate progress summary for the caller
///
/// # Response
///
/// ```json
/// {
///   "status": "success",
///   "data": {
///     "completedTopics": 4,
///     "successRate": 90.0,
///     "learningHours": 2.5,
///     "averageGrade": 4.5,
///     "currentMaterials": []
///   }
/// }
/// ```
pub async fn get_progress_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<StudentProgress>>> {
    let summary = state.progress.summary(principal.user_id).await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// Record that the caller finished a material. Re-marking overwrites the
/// previous time and grade.
pub async fn complete_material_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(material_id): Path<i64>,
    Json(request): Json<CompleteMaterialRequest>,
) -> AppResult<Json<ApiResponse<MaterialCompletion>>> {
    let completion = state
        .progress
        .mark_complete(principal.user_id, material_id, request)
        .await?;
    Ok(Json(
        ApiResponse::success(completion).with_message("Material marked as completed"),
    ))
}

/// List the caller's favorite materials, most recently added first.
pub async fn list_favorites_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<Vec<FavoriteEntry>>>> {
    let favorites = state.progress.favorites(principal.user_id).await?;
    Ok(Json(ApiResponse::success(favorites)))
}

/// Add or remove a favorite; body `{"action": "add" | "remove"}`.
pub async fn toggle_favorite_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(material_id): Path<i64>,
    Json(request): Json<ToggleFavoriteRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .progress
        .toggle_favorite(principal.user_id, material_id, request)
        .await?;
    Ok(Json(ApiResponse::message("Favorites updated")))
}
