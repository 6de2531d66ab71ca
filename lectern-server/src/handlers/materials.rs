use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use lectern_core::api_types::ApiResponse;
use lectern_core::domain::identity::Principal;
use lectern_core::domain::materials::{
    Block, BlockInput, CreateMaterialRequest, Material, MaterialStatus, PublishMaterialRequest,
    ReorderBlocksRequest, UpdateMaterialRequest,
};

use crate::infra::app_state::AppState;
use crate::infra::errors::AppResult;

#[derive(Debug, Deserialize)]
pub struct ListMaterialsQuery {
    pub status: Option<String>,
}

/// Create a new draft material
///
/// # Request
///
/// ```json
/// {
///   "title": "Intro to Fractions",
///   "subject": "math"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the stored material and the editor URL for it:
///
/// ```json
/// {
///   "status": "success",
///   "data": {
///     "material": { "id": 7, "title": "Intro to Fractions", "status": "draft" },
///     "editorUrl": "/editor/7"
///   }
/// }
/// ```
pub async fn create_material_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateMaterialRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Value>>)> {
    let material = state.materials.create(principal.user_id, request).await?;
    let editor_url = format!("/editor/{}", material.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({
            "material": material,
            "editorUrl": editor_url,
        }))),
    ))
}

/// List the caller's materials, optionally filtered by `?status=`.
pub async fn list_materials_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListMaterialsQuery>,
) -> AppResult<Json<ApiResponse<Vec<Material>>>> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<MaterialStatus>)
        .transpose()?;

    let materials = state
        .materials
        .list_for_author(principal.user_id, status)
        .await?;
    Ok(Json(ApiResponse::success(materials)))
}

/// Fetch one material with its full block sequence.
pub async fn get_material_handler(
    State(state): State<AppState>,
    Path(material_id): Path<i64>,
) -> AppResult<Json<ApiResponse<Material>>> {
    let material = state.materials.get(material_id).await?;
    Ok(Json(ApiResponse::success(material)))
}

/// Update the title and, optionally, replace the whole block sequence.
///
/// Omitting `blocks` leaves the sequence untouched; sending `"blocks": []`
/// clears it.
pub async fn update_material_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(material_id): Path<i64>,
    Json(request): Json<UpdateMaterialRequest>,
) -> AppResult<Json<ApiResponse<Material>>> {
    let material = state
        .materials
        .update(principal.user_id, material_id, request)
        .await?;
    Ok(Json(ApiResponse::success(material).with_message("Material updated")))
}

/// Publish a material and mint its share URL
///
/// # Request
///
/// ```json
/// {
///   "visibility": "published",
///   "access": "link"
/// }
/// ```
///
/// Both fields are optional; the defaults are `published` and `open`.
/// Link access mints a fresh token on every publish.
pub async fn publish_material_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(material_id): Path<i64>,
    Json(request): Json<PublishMaterialRequest>,
) -> AppResult<Json<ApiResponse<Material>>> {
    let material = state
        .materials
        .publish(principal.user_id, material_id, request)
        .await?;
    Ok(Json(ApiResponse::success(material).with_message("Material published")))
}

/// Append a block to the material.
pub async fn add_block_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(material_id): Path<i64>,
    Json(input): Json<BlockInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Block>>)> {
    let block = state
        .materials
        .add_block(principal.user_id, material_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(block))))
}

/// Replace an existing block's payload. The path id wins over any id in the
/// body.
pub async fn update_block_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((material_id, block_id)): Path<(i64, String)>,
    Json(input): Json<BlockInput>,
) -> AppResult<Json<ApiResponse<Block>>> {
    let block = state
        .materials
        .update_block(principal.user_id, material_id, &block_id, input)
        .await?;
    Ok(Json(ApiResponse::success(block)))
}

/// Delete a block. Deleting an id that is not present still succeeds.
pub async fn delete_block_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((material_id, block_id)): Path<(i64, String)>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .materials
        .delete_block(principal.user_id, material_id, &block_id)
        .await?;
    Ok(Json(ApiResponse::message("Block deleted")))
}

/// Rewrite the block sequence in the requested order.
pub async fn reorder_blocks_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(material_id): Path<i64>,
    Json(request): Json<ReorderBlocksRequest>,
) -> AppResult<Json<ApiResponse<Vec<Block>>>> {
    let blocks = state
        .materials
        .reorder_blocks(principal.user_id, material_id, request)
        .await?;
    Ok(Json(ApiResponse::success(blocks).with_message("Blocks reordered")))
}
