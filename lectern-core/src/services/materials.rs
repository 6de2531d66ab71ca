//! Material document management.
//!
//! Every mutation runs through the author check and ends in a single
//! repository write, so concurrent editors either win the version race
//! or get a conflict back instead of a half-applied document.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::info;

use crate::database::ports::MaterialsRepository;
use crate::domain::materials::{
    AccessMode, Block, BlockInput, CreateMaterialRequest, Material, MaterialStatus,
    PublishMaterialRequest, ReorderBlocksRequest, UpdateMaterialRequest,
};
use crate::error::{LecternError, Result};
use crate::token;

/// Orchestrates material and block operations on behalf of handlers.
pub struct MaterialService {
    materials: Arc<dyn MaterialsRepository>,
}

impl std::fmt::Debug for MaterialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialService").finish_non_exhaustive()
    }
}

impl MaterialService {
    pub fn new(materials: Arc<dyn MaterialsRepository>) -> Self {
        Self { materials }
    }

    /// Creates a draft material owned by the caller.
    pub async fn create(&self, caller_id: i64, request: CreateMaterialRequest) -> Result<Material> {
        request.validate()?;

        let material = self
            .materials
            .create(caller_id, &request.title, &request.subject)
            .await?;
        info!(
            material_id = material.id,
            author_id = caller_id,
            "Material created"
        );
        Ok(material)
    }

    /// Fetches one material with its block sequence attached.
    pub async fn get(&self, material_id: i64) -> Result<Material> {
        let mut material = self
            .materials
            .fetch(material_id)
            .await?
            .ok_or_else(|| LecternError::NotFound(format!("Material {material_id} not found")))?;
        material.blocks = self.materials.fetch_blocks(material_id).await?;
        Ok(material)
    }

    /// Lists the caller's own materials, optionally narrowed by status.
    pub async fn list_for_author(
        &self,
        author_id: i64,
        status: Option<MaterialStatus>,
    ) -> Result<Vec<Material>> {
        self.materials.list_for_author(author_id, status).await
    }

    /// Updates the title and, when a block list is supplied, replaces the
    /// whole block sequence.
    ///
    /// An empty title leaves the stored title untouched. `blocks: None`
    /// leaves the sequence untouched while `Some(vec![])` clears it.
    pub async fn update(
        &self,
        caller_id: i64,
        material_id: i64,
        request: UpdateMaterialRequest,
    ) -> Result<Material> {
        if let Some(inputs) = &request.blocks {
            for input in inputs {
                input.validate()?;
            }
        }

        let material = self.load_owned(material_id, caller_id).await?;

        if !request.title.is_empty() {
            self.materials
                .update_title(material_id, &request.title)
                .await?;
        }

        if let Some(inputs) = request.blocks {
            let current = self.materials.fetch_blocks(material_id).await?;
            let next = Self::rebuild_sequence(&current, inputs);
            self.materials
                .replace_blocks(material_id, material.version, &next)
                .await?;
        }

        info!(
            material_id,
            author_id = caller_id,
            "Material updated"
        );
        self.get(material_id).await
    }

    /// Publishes a material and mints its share URL.
    ///
    /// Empty request fields fall back to `published` visibility and `open`
    /// access. Link access gets a fresh token on every call, so republishing
    /// rotates the URL.
    pub async fn publish(
        &self,
        caller_id: i64,
        material_id: i64,
        request: PublishMaterialRequest,
    ) -> Result<Material> {
        let status = if request.visibility.is_empty() {
            MaterialStatus::Published
        } else {
            request.visibility.parse::<MaterialStatus>()?
        };
        let access = if request.access.is_empty() {
            AccessMode::Open
        } else {
            request.access.parse::<AccessMode>()?
        };

        self.load_owned(material_id, caller_id).await?;

        let share_url = match access {
            AccessMode::Link => format!("/m/{}", token::share_token()),
            AccessMode::Open => format!("/material/material-{material_id}"),
        };

        self.materials
            .update_publication(material_id, status, access, &share_url)
            .await?;
        info!(
            material_id,
            status = %status,
            access = %access,
            "Material published"
        );
        self.get(material_id).await
    }

    /// Appends one block to the end of the sequence.
    ///
    /// The block id is minted server side; the caller-supplied position is
    /// stored verbatim.
    pub async fn add_block(
        &self,
        caller_id: i64,
        material_id: i64,
        input: BlockInput,
    ) -> Result<Block> {
        input.validate()?;
        let material = self.load_owned(material_id, caller_id).await?;
        let mut blocks = self.materials.fetch_blocks(material_id).await?;

        let block = Block {
            id: token::block_id(),
            block_type: input.block_type,
            content: input.content,
            styles: input.styles,
            position: input.position,
            animation: input.animation,
        };
        blocks.push(block.clone());

        self.materials
            .replace_blocks(material_id, material.version, &blocks)
            .await?;
        info!(material_id, block_id = %block.id, "Block added");
        Ok(block)
    }

    /// Replaces the payload of an existing block in place.
    ///
    /// The path id wins: the stored block keeps its id and slot while type,
    /// content, styles, position and animation come from the input.
    pub async fn update_block(
        &self,
        caller_id: i64,
        material_id: i64,
        block_id: &str,
        input: BlockInput,
    ) -> Result<Block> {
        input.validate()?;
        let material = self.load_owned(material_id, caller_id).await?;
        let mut blocks = self.materials.fetch_blocks(material_id).await?;

        let index = blocks
            .iter()
            .position(|block| block.id == block_id)
            .ok_or_else(|| LecternError::NotFound(format!("Block {block_id} not found")))?;

        let updated = Block {
            id: block_id.to_string(),
            block_type: input.block_type,
            content: input.content,
            styles: input.styles,
            position: input.position,
            animation: input.animation,
        };
        blocks[index] = updated.clone();

        self.materials
            .replace_blocks(material_id, material.version, &blocks)
            .await?;
        info!(material_id, block_id, "Block updated");
        Ok(updated)
    }

    /// Removes a block by id.
    ///
    /// Deleting an id that is not present still succeeds, and remaining
    /// positions are not compacted.
    pub async fn delete_block(
        &self,
        caller_id: i64,
        material_id: i64,
        block_id: &str,
    ) -> Result<()> {
        let material = self.load_owned(material_id, caller_id).await?;
        let mut blocks = self.materials.fetch_blocks(material_id).await?;
        blocks.retain(|block| block.id != block_id);

        self.materials
            .replace_blocks(material_id, material.version, &blocks)
            .await?;
        info!(material_id, block_id, "Block deleted");
        Ok(())
    }

    /// Rewrites the sequence in the requested id order.
    ///
    /// Every listed id must exist; otherwise nothing is written. Stored
    /// blocks missing from the list are dropped.
    pub async fn reorder_blocks(
        &self,
        caller_id: i64,
        material_id: i64,
        request: ReorderBlocksRequest,
    ) -> Result<Vec<Block>> {
        let material = self.load_owned(material_id, caller_id).await?;
        let blocks = self.materials.fetch_blocks(material_id).await?;

        let mut by_id: HashMap<&str, &Block> =
            blocks.iter().map(|block| (block.id.as_str(), block)).collect();

        let mut next = Vec::with_capacity(request.block_ids.len());
        for (index, id) in request.block_ids.iter().enumerate() {
            let block = by_id
                .remove(id.as_str())
                .ok_or_else(|| LecternError::NotFound(format!("Block {id} not found")))?;
            let mut block = block.clone();
            block.position = index as i32;
            next.push(block);
        }

        self.materials
            .replace_blocks(material_id, material.version, &next)
            .await?;
        info!(material_id, blocks = next.len(), "Blocks reordered");
        Ok(next)
    }

    /// Fetches a material and verifies the caller owns it.
    async fn load_owned(&self, material_id: i64, caller_id: i64) -> Result<Material> {
        let material = self
            .materials
            .fetch(material_id)
            .await?
            .ok_or_else(|| LecternError::NotFound(format!("Material {material_id} not found")))?;
        if material.author_id != caller_id {
            return Err(LecternError::AccessDenied(
                "Only the author may modify this material".to_string(),
            ));
        }
        Ok(material)
    }

    /// Builds the replacement sequence for a full block update.
    ///
    /// Ids already stored on this material are carried over; unknown, empty
    /// or repeated ids get freshly minted ones. Positions are renumbered to
    /// match list order.
    fn rebuild_sequence(current: &[Block], inputs: Vec<BlockInput>) -> Vec<Block> {
        let known: HashSet<&str> = current.iter().map(|block| block.id.as_str()).collect();
        let mut seen: HashSet<String> = HashSet::new();

        inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| {
                let id = if !input.id.is_empty()
                    && known.contains(input.id.as_str())
                    && seen.insert(input.id.clone())
                {
                    input.id
                } else {
                    token::block_id()
                };
                Block {
                    id,
                    block_type: input.block_type,
                    content: input.content,
                    styles: input.styles,
                    position: index as i32,
                    animation: input.animation,
                }
            })
            .collect()
    }
}
