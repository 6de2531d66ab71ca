use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::{
    AppState, auth,
    handlers::{materials, progress},
};

/// Create all v1 API routes
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(create_material_routes(state.clone()))
        .merge(create_progress_routes(state))
}

/// Material authoring routes; every route requires a verified principal
fn create_material_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/materials",
            get(materials::list_materials_handler).post(materials::create_material_handler),
        )
        .route(
            "/materials/{id}",
            get(materials::get_material_handler).put(materials::update_material_handler),
        )
        .route(
            "/materials/{id}/publish",
            post(materials::publish_material_handler),
        )
        .route("/materials/{id}/blocks", post(materials::add_block_handler))
        // The static segment wins over {block_id}, so "reorder" is never
        // shadowed by a block id (ids are minted as 16 hex chars).
        .route(
            "/materials/{id}/blocks/reorder",
            put(materials::reorder_blocks_handler),
        )
        .route(
            "/materials/{id}/blocks/{block_id}",
            put(materials::update_block_handler).delete(materials::delete_block_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::middleware::auth_middleware,
        ))
}

/// Student progress routes
fn create_progress_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/progress", get(progress::get_progress_handler))
        .route(
            "/progress/materials/{id}/complete",
            post(progress::complete_material_handler),
        )
        .route("/progress/favorites", get(progress::list_favorites_handler))
        .route(
            "/progress/favorites/{id}",
            post(progress::toggle_favorite_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::middleware::auth_middleware,
        ))
}
