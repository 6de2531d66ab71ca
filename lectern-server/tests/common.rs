//! Shared integration-test support: an in-memory store behind the repository
//! ports, an app builder, and bearer-token helpers.

// Shared across test binaries; not every binary exercises every helper.
#![allow(unused)]

use std::collections::HashMap;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;

use lectern_core::database::PostgresDatabase;
use lectern_core::database::ports::{MaterialsRepository, ProgressRepository};
use lectern_core::domain::materials::{AccessMode, Block, Material, MaterialStatus};
use lectern_core::domain::progress::{
    CompletionStats, FavoriteEntry, MaterialCompletion, ProgressMaterial,
};
use lectern_core::error::{LecternError, Result};
use lectern_core::services::{MaterialService, ProgressService};
use lectern_server::auth::{Claims, TokenVerifier};
use lectern_server::infra::app_state::AppState;
use lectern_server::infra::config::Config;
use lectern_server::routes;

pub const TEST_SECRET: &str = "integration-test-secret";

struct FavoriteRecord {
    user_id: i64,
    material_id: i64,
    added_at: DateTime<Utc>,
}

#[derive(Default)]
struct StoreState {
    next_material_id: i64,
    materials: HashMap<i64, Material>,
    blocks: HashMap<i64, Vec<Block>>,
    completions: HashMap<(i64, i64), MaterialCompletion>,
    favorites: Vec<FavoriteRecord>,
}

/// In-memory stand-in for the Postgres repositories.
///
/// Mirrors their observable semantics: fetches never attach blocks, block
/// rewrites are gated on the material version, and the favorite joins drop
/// orphaned rows.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<StoreState>,
    contended: AtomicBool,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The next sequence write fails as if another editor advanced the
    /// version between read and write.
    pub fn contend_next_write(&self) {
        self.contended.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MaterialsRepository for FakeStore {
    async fn create(&self, author_id: i64, title: &str, subject: &str) -> Result<Material> {
        let mut state = self.state.lock().unwrap();
        state.next_material_id += 1;
        let now = Utc::now();
        let material = Material {
            id: state.next_material_id,
            title: title.to_string(),
            subject: subject.to_string(),
            author_id,
            author_name: None,
            status: MaterialStatus::Draft,
            access: AccessMode::Open,
            share_url: None,
            blocks: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        };
        state.materials.insert(material.id, material.clone());
        Ok(material)
    }

    async fn fetch(&self, material_id: i64) -> Result<Option<Material>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .materials
            .get(&material_id)
            .cloned())
    }

    async fn fetch_blocks(&self, material_id: i64) -> Result<Vec<Block>> {
        let state = self.state.lock().unwrap();
        let mut blocks = state.blocks.get(&material_id).cloned().unwrap_or_default();
        blocks.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        Ok(blocks)
    }

    async fn exists(&self, material_id: i64) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .materials
            .contains_key(&material_id))
    }

    async fn list_for_author(
        &self,
        author_id: i64,
        status: Option<MaterialStatus>,
    ) -> Result<Vec<Material>> {
        let state = self.state.lock().unwrap();
        let mut materials: Vec<Material> = state
            .materials
            .values()
            .filter(|material| material.author_id == author_id)
            .filter(|material| status.is_none_or(|status| material.status == status))
            .cloned()
            .collect();
        materials.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(materials)
    }

    async fn update_title(&self, material_id: i64, title: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let material = state
            .materials
            .get_mut(&material_id)
            .ok_or_else(|| LecternError::NotFound(format!("Material {material_id} not found")))?;
        material.title = title.to_string();
        material.updated_at = Utc::now();
        Ok(())
    }

    async fn replace_blocks(
        &self,
        material_id: i64,
        expected_version: i64,
        blocks: &[Block],
    ) -> Result<()> {
        if self.contended.swap(false, Ordering::SeqCst) {
            return Err(LecternError::Conflict(format!(
                "Material {material_id} was modified concurrently"
            )));
        }

        let mut state = self.state.lock().unwrap();
        match state.materials.get_mut(&material_id) {
            Some(material) if material.version == expected_version => {
                material.version += 1;
                material.updated_at = Utc::now();
            }
            _ => {
                return Err(LecternError::Conflict(format!(
                    "Material {material_id} was modified concurrently"
                )));
            }
        }
        state.blocks.insert(material_id, blocks.to_vec());
        Ok(())
    }

    async fn update_publication(
        &self,
        material_id: i64,
        status: MaterialStatus,
        access: AccessMode,
        share_url: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let material = state
            .materials
            .get_mut(&material_id)
            .ok_or_else(|| LecternError::NotFound(format!("Material {material_id} not found")))?;
        material.status = status;
        material.access = access;
        material.share_url = Some(share_url.to_string());
        material.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for FakeStore {
    async fn completion_stats(&self, user_id: i64) -> Result<CompletionStats> {
        let state = self.state.lock().unwrap();
        let completions: Vec<&MaterialCompletion> = state
            .completions
            .values()
            .filter(|completion| completion.user_id == user_id)
            .collect();
        let grades: Vec<f64> = completions
            .iter()
            .filter_map(|completion| completion.grade.map(f64::from))
            .collect();

        Ok(CompletionStats {
            completed: completions.len() as i64,
            total_minutes: completions
                .iter()
                .map(|completion| i64::from(completion.time_spent))
                .sum(),
            average_grade: if grades.is_empty() {
                None
            } else {
                Some(grades.iter().sum::<f64>() / grades.len() as f64)
            },
        })
    }

    async fn current_materials(&self, user_id: i64) -> Result<Vec<ProgressMaterial>> {
        let state = self.state.lock().unwrap();
        let mut entries: Vec<ProgressMaterial> = state
            .favorites
            .iter()
            .filter(|favorite| favorite.user_id == user_id)
            .filter_map(|favorite| {
                let material = state.materials.get(&favorite.material_id)?;
                let completion = state.completions.get(&(user_id, favorite.material_id));
                Some(ProgressMaterial {
                    id: material.id,
                    title: material.title.clone(),
                    subject: material.subject.clone(),
                    progress: if completion.is_some() { 100 } else { 0 },
                    last_activity: completion
                        .map_or(favorite.added_at, |completion| completion.completed_at),
                })
            })
            .collect();
        entries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(entries)
    }

    async fn upsert_completion(
        &self,
        user_id: i64,
        material_id: i64,
        time_spent: i32,
        grade: Option<i16>,
    ) -> Result<MaterialCompletion> {
        let completion = MaterialCompletion {
            user_id,
            material_id,
            time_spent,
            grade,
            completed_at: Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .completions
            .insert((user_id, material_id), completion.clone());
        Ok(completion)
    }

    async fn list_favorites(&self, user_id: i64) -> Result<Vec<FavoriteEntry>> {
        let state = self.state.lock().unwrap();
        let mut favorites: Vec<FavoriteEntry> = state
            .favorites
            .iter()
            .filter(|favorite| favorite.user_id == user_id)
            .filter_map(|favorite| {
                let material = state.materials.get(&favorite.material_id)?;
                Some(FavoriteEntry {
                    id: material.id,
                    title: material.title.clone(),
                    subject: material.subject.clone(),
                    status: material.status,
                    added_at: favorite.added_at,
                })
            })
            .collect();
        favorites.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(favorites)
    }

    async fn add_favorite(&self, user_id: i64, material_id: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let already = state
            .favorites
            .iter()
            .any(|favorite| favorite.user_id == user_id && favorite.material_id == material_id);
        if !already {
            state.favorites.push(FavoriteRecord {
                user_id,
                material_id,
                added_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn remove_favorite(&self, user_id: i64, material_id: i64) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .favorites
            .retain(|favorite| !(favorite.user_id == user_id && favorite.material_id == material_id));
        Ok(())
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<FakeStore>,
}

/// Builds a server over the in-memory store.
///
/// The database handle is a lazy pool pointed at a closed port, so nothing
/// connects unless a test hits `/health`.
pub fn spawn_app() -> TestApp {
    let store = FakeStore::new();
    let materials: Arc<dyn MaterialsRepository> = store.clone();
    let progress: Arc<dyn ProgressRepository> = store.clone();

    // Short acquire timeout so the health check's failure path returns
    // promptly instead of waiting out the production default.
    let pool = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_millis(200))
        .connect_lazy("postgres://lectern@127.0.0.1:1/lectern")
        .expect("lazy pool");

    let config = Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_url: String::new(),
        jwt_secret: TEST_SECRET.to_string(),
        jwt_issuer: None,
        cors_allowed_origins: Vec::new(),
        dev_mode: true,
    };

    let state = AppState {
        materials: Arc::new(MaterialService::new(materials.clone())),
        progress: Arc::new(ProgressService::new(progress, materials)),
        verifier: Arc::new(TokenVerifier::new(TEST_SECRET, None)),
        config: Arc::new(config),
        database: Arc::new(PostgresDatabase::from_pool(pool)),
        started_at: Utc::now(),
    };

    let server = TestServer::new(routes::create_app(state)).expect("test server");
    TestApp { server, store }
}

fn sign(claims: &Claims) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(TEST_SECRET.as_ref()),
    )
    .expect("token signs")
}

pub fn token_for(user_id: i64, role: &str) -> String {
    let now = Utc::now();
    sign(&Claims {
        sub: user_id.to_string(),
        email: format!("user{user_id}@example.com"),
        role: role.to_string(),
        exp: (now + Duration::minutes(15)).timestamp(),
        iat: now.timestamp(),
        iss: None,
    })
}

pub fn expired_token_for(user_id: i64) -> String {
    let now = Utc::now();
    sign(&Claims {
        sub: user_id.to_string(),
        email: format!("user{user_id}@example.com"),
        role: "teacher".to_string(),
        exp: (now - Duration::minutes(10)).timestamp(),
        iat: (now - Duration::minutes(30)).timestamp(),
        iss: None,
    })
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// True when `id` looks like a server-minted identifier: 16 hex characters.
pub fn minted(id: &str) -> bool {
    id.len() == 16 && id.chars().all(|c| c.is_ascii_hexdigit())
}

/// Creates a draft material through the API and returns its id.
pub async fn create_material(
    server: &TestServer,
    token: &str,
    title: &str,
    subject: &str,
) -> i64 {
    let response = server
        .post("/api/v1/materials")
        .add_header("Authorization", bearer(token))
        .json(&json!({ "title": title, "subject": subject }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["data"]["material"]["id"].as_i64().expect("material id")
}

/// Appends a block through the API and returns its minted id.
pub async fn add_block(server: &TestServer, token: &str, material_id: i64, block: Value) -> String {
    let response = server
        .post(&format!("/api/v1/materials/{material_id}/blocks"))
        .add_header("Authorization", bearer(token))
        .json(&block)
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["data"]["id"].as_str().expect("block id").to_string()
}
