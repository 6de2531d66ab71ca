use std::{fmt, path::Path, time::Duration};

use sqlx::{
    PgPool, Row,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};
use tracing::{debug, info, warn};

use crate::error::{LecternError, Result};

pub mod materials;
pub mod progress;

use materials::PostgresMaterialsRepository;
use progress::PostgresProgressRepository;

/// Statistics about the connection pool
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub max_size: u32,
    pub min_idle: u32,
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    max_connections: u32,
    min_connections: u32,
    materials: PostgresMaterialsRepository,
    progress: PostgresProgressRepository,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

impl PostgresDatabase {
    pub async fn new(connection_string: &str) -> Result<Self> {
        // Pool sizing from environment, with defaults that suit a small deployment
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(num_cpus::get() as u32);

        let min_connections = std::env::var("DB_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(2);

        let connect_options = Self::build_connect_options(connection_string)?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .max_lifetime(Duration::from_secs(1800))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect_with(connect_options)
            .await
            .map_err(|e| LecternError::Store(format!("Database connection failed: {e}")))?;

        info!(
            "Database pool initialized with max_connections={}, min_connections={}",
            max_connections, min_connections
        );

        let materials = PostgresMaterialsRepository::new(pool.clone());
        let progress = PostgresProgressRepository::new(pool.clone());

        Ok(PostgresDatabase {
            pool,
            max_connections,
            min_connections,
            materials,
            progress,
        })
    }

    /// Create a PostgresDatabase from an existing pool (mainly for testing)
    pub fn from_pool(pool: PgPool) -> Self {
        let materials = PostgresMaterialsRepository::new(pool.clone());
        let progress = PostgresProgressRepository::new(pool.clone());

        PostgresDatabase {
            pool,
            max_connections: 20,
            min_connections: 2,
            materials,
            progress,
        }
    }

    fn build_connect_options(connection_string: &str) -> Result<PgConnectOptions> {
        let trimmed = connection_string.trim();

        let mut options = if trimmed.is_empty() {
            PgConnectOptions::new()
        } else {
            trimmed.parse::<PgConnectOptions>().map_err(|e| {
                LecternError::Store(format!("Invalid PostgreSQL connection string: {e}"))
            })?
        };

        if let Ok(user) = std::env::var("PGUSER")
            && !user.is_empty()
        {
            options = options.username(&user);
        }

        if let Ok(password) = std::env::var("PGPASSWORD")
            && !password.is_empty()
        {
            options = options.password(&password);
        }

        let mut using_socket = false;

        if let Ok(host) = std::env::var("PGHOST")
            && !host.is_empty()
        {
            if host.starts_with('/') {
                options = options.socket(Path::new(&host));
                using_socket = true;
                debug!("Using PostgreSQL socket from PGHOST at {}", host);
            } else {
                options = options.host(&host);
                debug!("Using PostgreSQL host from PGHOST: {}", host);
            }
        }

        if let Ok(port) = std::env::var("PGPORT")
            && let Ok(port) = port.parse::<u16>()
        {
            options = options.port(port);
        }

        if using_socket && std::env::var("PGSSLMODE").is_err() {
            options = options.ssl_mode(PgSslMode::Disable);
        }

        Ok(options)
    }

    /// Get a reference to the connection pool for use in extension modules
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle() as u32,
            max_size: self.max_connections,
            min_idle: self.min_connections,
        }
    }

    pub fn materials_repository(&self) -> &PostgresMaterialsRepository {
        &self.materials
    }

    pub fn progress_repository(&self) -> &PostgresProgressRepository {
        &self.progress
    }

    /// Apply any pending embedded migrations.
    pub async fn initialize_schema(&self) -> Result<()> {
        crate::MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| LecternError::Store(format!("Migration failed: {e}")))?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Connectivity and schema-state check without applying migrations.
    pub async fn preflight(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| LecternError::Store(format!("Database ping failed: {e}")))?;

        // The migrations table is absent on a fresh database; treat that as zero applied.
        let applied: i64 = match sqlx::query("SELECT COUNT(*) AS applied FROM _sqlx_migrations")
            .fetch_one(&self.pool)
            .await
        {
            Ok(row) => row
                .try_get("applied")
                .map_err(|e| LecternError::Store(format!("Failed to read migration count: {e}")))?,
            Err(_) => 0,
        };

        let total = crate::MIGRATOR.iter().count() as i64;
        if applied < total {
            warn!(applied, total, "Schema is behind; run `db migrate`");
        } else {
            info!(applied, "Schema is up to date");
        }

        Ok(())
    }

    /// Lightweight liveness probe for the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| LecternError::Store(format!("Database ping failed: {e}")))?;
        Ok(())
    }
}
