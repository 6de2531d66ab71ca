//! Block manipulation tests: add, update, delete, and reorder.

use axum::http::StatusCode;
use serde_json::{Value, json};

mod common;

use common::{add_block, bearer, create_material, minted, spawn_app, token_for};

async fn block_sequence(app: &common::TestApp, token: &str, material_id: i64) -> Vec<Value> {
    let response = app
        .server
        .get(&format!("/api/v1/materials/{material_id}"))
        .add_header("Authorization", bearer(token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["data"]["blocks"].as_array().unwrap().clone()
}

#[tokio::test]
async fn adding_a_block_mints_the_id_server_side() {
    let app = spawn_app();
    let token = token_for(7, "teacher");
    let id = create_material(&app.server, &token, "Fractions", "math").await;

    let response = app
        .server
        .post(&format!("/api/v1/materials/{id}/blocks"))
        .add_header("Authorization", bearer(&token))
        .json(&json!({
            "id": "client-chosen",
            "type": "text",
            "content": { "text": "One half" },
            "position": 4
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["status"], "success");

    let block = &body["data"];
    let block_id = block["id"].as_str().unwrap();
    assert_ne!(block_id, "client-chosen");
    assert!(minted(block_id));
    assert_eq!(block["type"], "text");
    assert_eq!(block["content"]["text"], "One half");
    // The submitted position is stored verbatim, gaps included.
    assert_eq!(block["position"], 4);
}

#[tokio::test]
async fn adding_a_block_requires_a_type() {
    let app = spawn_app();
    let token = token_for(7, "teacher");
    let id = create_material(&app.server, &token, "Fractions", "math").await;

    let response = app
        .server
        .post(&format!("/api/v1/materials/{id}/blocks"))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "type": "   " }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Block type is required");
}

#[tokio::test]
async fn block_payloads_are_stored_verbatim() {
    let app = spawn_app();
    let token = token_for(7, "teacher");
    let id = create_material(&app.server, &token, "Geometry", "math").await;

    add_block(
        &app.server,
        &token,
        id,
        json!({
            "type": "formula",
            "content": { "latex": "a^2 + b^2 = c^2", "widgets": [1, 2, 3] },
            "styles": { "fontSize": 18, "align": "center" },
            "position": 0,
            "animation": {
                "steps": [{ "element": "formula", "action": "show" }],
                "trigger": "click",
                "delay": 400
            }
        }),
    )
    .await;

    let blocks = block_sequence(&app, &token, id).await;
    assert_eq!(blocks.len(), 1);
    let block = &blocks[0];
    assert_eq!(block["content"]["latex"], "a^2 + b^2 = c^2");
    assert_eq!(block["content"]["widgets"], json!([1, 2, 3]));
    assert_eq!(block["styles"]["fontSize"], 18);
    assert_eq!(block["animation"]["trigger"], "click");
    assert_eq!(block["animation"]["delay"], 400);
    assert_eq!(block["animation"]["steps"][0]["action"], "show");
}

#[tokio::test]
async fn updating_a_block_keeps_its_identity() {
    let app = spawn_app();
    let token = token_for(7, "teacher");
    let id = create_material(&app.server, &token, "Fractions", "math").await;
    let first = add_block(
        &app.server,
        &token,
        id,
        json!({ "type": "text", "content": { "text": "a" }, "position": 0 }),
    )
    .await;
    let second = add_block(
        &app.server,
        &token,
        id,
        json!({ "type": "text", "content": { "text": "b" }, "position": 1 }),
    )
    .await;

    let response = app
        .server
        .put(&format!("/api/v1/materials/{id}/blocks/{first}"))
        .add_header("Authorization", bearer(&token))
        .json(&json!({
            "id": "smuggled",
            "type": "image",
            "content": { "url": "/diagram.png" },
            "position": 7
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    // The path id wins over anything in the body.
    assert_eq!(body["data"]["id"], first.as_str());
    assert_eq!(body["data"]["type"], "image");
    assert_eq!(body["data"]["position"], 7);

    let blocks = block_sequence(&app, &token, id).await;
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["id"], second.as_str());
    assert_eq!(blocks[1]["id"], first.as_str());
    assert_eq!(blocks[1]["position"], 7);
}

#[tokio::test]
async fn updating_an_unknown_block_is_not_found() {
    let app = spawn_app();
    let token = token_for(7, "teacher");
    let id = create_material(&app.server, &token, "Fractions", "math").await;

    let response = app
        .server
        .put(&format!("/api/v1/materials/{id}/blocks/deadbeefdeadbeef"))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "type": "text", "content": {} }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Block deadbeefdeadbeef not found");
}

#[tokio::test]
async fn deleting_a_block_leaves_a_gap() {
    let app = spawn_app();
    let token = token_for(7, "teacher");
    let id = create_material(&app.server, &token, "Fractions", "math").await;
    let first = add_block(
        &app.server,
        &token,
        id,
        json!({ "type": "text", "content": { "text": "a" }, "position": 0 }),
    )
    .await;
    let middle = add_block(
        &app.server,
        &token,
        id,
        json!({ "type": "text", "content": { "text": "b" }, "position": 1 }),
    )
    .await;
    let last = add_block(
        &app.server,
        &token,
        id,
        json!({ "type": "text", "content": { "text": "c" }, "position": 2 }),
    )
    .await;

    let response = app
        .server
        .delete(&format!("/api/v1/materials/{id}/blocks/{middle}"))
        .add_header("Authorization", bearer(&token))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Block deleted");

    let blocks = block_sequence(&app, &token, id).await;
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["id"], first.as_str());
    assert_eq!(blocks[1]["id"], last.as_str());
    // Remaining positions are not compacted.
    assert_eq!(blocks[0]["position"], 0);
    assert_eq!(blocks[1]["position"], 2);
}

#[tokio::test]
async fn deleting_an_absent_block_still_succeeds() {
    let app = spawn_app();
    let token = token_for(7, "teacher");
    let id = create_material(&app.server, &token, "Fractions", "math").await;
    add_block(
        &app.server,
        &token,
        id,
        json!({ "type": "text", "content": { "text": "a" }, "position": 0 }),
    )
    .await;

    let response = app
        .server
        .delete(&format!("/api/v1/materials/{id}/blocks/deadbeefdeadbeef"))
        .add_header("Authorization", bearer(&token))
        .await;

    response.assert_status_ok();
    assert_eq!(block_sequence(&app, &token, id).await.len(), 1);
}

#[tokio::test]
async fn block_writes_are_restricted_to_the_author() {
    let app = spawn_app();
    let author = token_for(7, "teacher");
    let intruder = token_for(8, "teacher");
    let id = create_material(&app.server, &author, "Fractions", "math").await;
    let block = add_block(
        &app.server,
        &author,
        id,
        json!({ "type": "text", "content": { "text": "a" }, "position": 0 }),
    )
    .await;

    let response = app
        .server
        .post(&format!("/api/v1/materials/{id}/blocks"))
        .add_header("Authorization", bearer(&intruder))
        .json(&json!({ "type": "text", "content": {} }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .delete(&format!("/api/v1/materials/{id}/blocks/{block}"))
        .add_header("Authorization", bearer(&intruder))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .put(&format!("/api/v1/materials/{id}/blocks/reorder"))
        .add_header("Authorization", bearer(&intruder))
        .json(&json!({ "blockIds": [block] }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reordering_renumbers_contiguously() {
    let app = spawn_app();
    let token = token_for(7, "teacher");
    let id = create_material(&app.server, &token, "Fractions", "math").await;
    let a = add_block(
        &app.server,
        &token,
        id,
        json!({ "type": "text", "content": { "text": "a" }, "position": 0 }),
    )
    .await;
    let b = add_block(
        &app.server,
        &token,
        id,
        json!({ "type": "text", "content": { "text": "b" }, "position": 1 }),
    )
    .await;
    let c = add_block(
        &app.server,
        &token,
        id,
        json!({ "type": "text", "content": { "text": "c" }, "position": 2 }),
    )
    .await;

    let response = app
        .server
        .put(&format!("/api/v1/materials/{id}/blocks/reorder"))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "blockIds": [c, a, b] }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Blocks reordered");
    let reordered = body["data"].as_array().unwrap();
    let ids: Vec<&str> = reordered
        .iter()
        .map(|block| block["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![c.as_str(), a.as_str(), b.as_str()]);
    let positions: Vec<i64> = reordered
        .iter()
        .map(|block| block["position"].as_i64().unwrap())
        .collect();
    assert_eq!(positions, vec![0, 1, 2]);

    let blocks = block_sequence(&app, &token, id).await;
    assert_eq!(blocks[0]["id"], c.as_str());
}

#[tokio::test]
async fn reordering_drops_unlisted_blocks() {
    let app = spawn_app();
    let token = token_for(7, "teacher");
    let id = create_material(&app.server, &token, "Fractions", "math").await;
    let a = add_block(
        &app.server,
        &token,
        id,
        json!({ "type": "text", "content": { "text": "a" }, "position": 0 }),
    )
    .await;
    add_block(
        &app.server,
        &token,
        id,
        json!({ "type": "text", "content": { "text": "b" }, "position": 1 }),
    )
    .await;
    let c = add_block(
        &app.server,
        &token,
        id,
        json!({ "type": "text", "content": { "text": "c" }, "position": 2 }),
    )
    .await;

    app.server
        .put(&format!("/api/v1/materials/{id}/blocks/reorder"))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "blockIds": [c, a] }))
        .await
        .assert_status_ok();

    let blocks = block_sequence(&app, &token, id).await;
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["id"], c.as_str());
    assert_eq!(blocks[1]["id"], a.as_str());
}

#[tokio::test]
async fn reordering_with_an_unknown_id_changes_nothing() {
    let app = spawn_app();
    let token = token_for(7, "teacher");
    let id = create_material(&app.server, &token, "Fractions", "math").await;
    let a = add_block(
        &app.server,
        &token,
        id,
        json!({ "type": "text", "content": { "text": "a" }, "position": 0 }),
    )
    .await;
    let b = add_block(
        &app.server,
        &token,
        id,
        json!({ "type": "text", "content": { "text": "b" }, "position": 1 }),
    )
    .await;

    let response = app
        .server
        .put(&format!("/api/v1/materials/{id}/blocks/reorder"))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "blockIds": [b, "deadbeefdeadbeef"] }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Block deadbeefdeadbeef not found");

    let blocks = block_sequence(&app, &token, id).await;
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["id"], a.as_str());
    assert_eq!(blocks[1]["id"], b.as_str());
}
