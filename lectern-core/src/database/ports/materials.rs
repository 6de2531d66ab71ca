use async_trait::async_trait;

use crate::domain::materials::{AccessMode, Block, Material, MaterialStatus};
use crate::error::Result;

/// Storage port for material documents and their block sequences.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MaterialsRepository: Send + Sync {
    /// Insert a new draft material; returns the stored row with its assigned
    /// id and timestamps, blocks empty.
    async fn create(&self, author_id: i64, title: &str, subject: &str) -> Result<Material>;

    /// Load material metadata. Blocks are not attached here.
    async fn fetch(&self, material_id: i64) -> Result<Option<Material>>;

    /// Load the ordered block sequence for a material.
    async fn fetch_blocks(&self, material_id: i64) -> Result<Vec<Block>>;

    async fn exists(&self, material_id: i64) -> Result<bool>;

    /// Materials owned by `author_id`, newest-updated first, blocks empty.
    async fn list_for_author(
        &self,
        author_id: i64,
        status: Option<MaterialStatus>,
    ) -> Result<Vec<Material>>;

    async fn update_title(&self, material_id: i64, title: &str) -> Result<()>;

    /// Rewrite the full block sequence, conditional on the version observed
    /// when the sequence was read. A stale `expected_version` fails with
    /// `Conflict` and leaves the stored sequence untouched.
    async fn replace_blocks(
        &self,
        material_id: i64,
        expected_version: i64,
        blocks: &[Block],
    ) -> Result<()>;

    /// Persist the outcome of a publish call: status, access mode, share URL.
    async fn update_publication(
        &self,
        material_id: i64,
        status: MaterialStatus,
        access: AccessMode,
        share_url: &str,
    ) -> Result<()>;
}
