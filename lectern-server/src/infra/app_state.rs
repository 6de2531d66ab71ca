use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};

use crate::auth::TokenVerifier;
use crate::infra::config::Config;
use lectern_core::database::PostgresDatabase;
use lectern_core::services::{MaterialService, ProgressService};

#[derive(Clone)]
pub struct AppState {
    pub materials: Arc<MaterialService>,
    pub progress: Arc<ProgressService>,
    pub verifier: Arc<TokenVerifier>,
    pub config: Arc<Config>,
    pub database: Arc<PostgresDatabase>,
    pub started_at: DateTime<Utc>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
