//! Material documents and their ordered content blocks.
//!
//! A [`Material`] is the authored unit of the platform: metadata plus an
//! ordered sequence of [`Block`]s. Block payloads (`content`, `styles`) are
//! opaque JSON stored and returned verbatim; the store never inspects them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LecternError, Result};

/// Publication state of a material.
///
/// This is a flat enumerated field: any state may follow any other, the
/// store imposes no transition restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialStatus {
    Draft,
    Published,
    Archived,
}

impl MaterialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl FromStr for MaterialStatus {
    type Err = LecternError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(LecternError::Validation(format!(
                "Invalid material status: {other}"
            ))),
        }
    }
}

impl fmt::Display for MaterialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a published material is reached: openly via its canonical path, or
/// through an opaque link token minted at publish time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Open,
    Link,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Link => "link",
        }
    }
}

impl FromStr for AccessMode {
    type Err = LecternError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(Self::Open),
            "link" => Ok(Self::Link),
            other => Err(LecternError::Validation(format!(
                "Invalid access mode: {other}"
            ))),
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authored unit of educational content.
///
/// `author_id` is immutable after creation; only the creating principal may
/// mutate title, blocks, status, or access. `version` guards block-sequence
/// writes: every sequence rewrite is conditional on the version observed at
/// read time and bumps it by one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: i64,
    pub title: String,
    pub subject: String,
    pub author_id: i64,
    /// Denormalized display name of the author. Identity lives outside this
    /// system, so the field is only populated when a backfill provides it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub status: MaterialStatus,
    pub access: AccessMode,
    /// Recomputed on every publish call; absent until first publish.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,
    /// Ordered block sequence. Loaded on fetch; list operations leave it empty.
    pub blocks: Vec<Block>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One content unit within a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Server-minted identifier, stable for the lifetime of the block.
    pub id: String,
    /// Free-form discriminator (`text`, `image`, `video`, `formula`, `quiz`, ...).
    /// Opaque to the store beyond a non-empty check.
    #[serde(rename = "type")]
    pub block_type: String,
    /// Opaque payload, stored verbatim.
    pub content: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<Value>,
    /// Rank within the sequence. Reorder renumbers 0-based and contiguous;
    /// add/update trust the submitted value and may leave gaps.
    pub position: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<BlockAnimation>,
}

/// Step-wise reveal behavior attached to a block. Stored, never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockAnimation {
    pub steps: Vec<AnimationStep>,
    pub trigger: AnimationTrigger,
    /// Delay between steps in milliseconds.
    #[serde(default)]
    pub delay: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationTrigger {
    Click,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationStep {
    pub element: String,
    pub action: AnimationAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationAction {
    Show,
    Hide,
    Highlight,
}

/// Payload for creating a material.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaterialRequest {
    pub title: String,
    pub subject: String,
}

impl CreateMaterialRequest {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LecternError::Validation("Title is required".to_string()));
        }
        if self.subject.trim().is_empty() {
            return Err(LecternError::Validation("Subject is required".to_string()));
        }
        Ok(())
    }
}

/// Partial metadata update.
///
/// An empty `title` leaves the stored title unchanged. `blocks` distinguishes
/// absent from empty: `None` (omitted or JSON null) leaves the sequence
/// untouched, `Some([])` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateMaterialRequest {
    pub title: String,
    pub blocks: Option<Vec<BlockInput>>,
}

/// Incoming block payload for add/update/replace operations.
///
/// `id` is only meaningful on full-sequence replacement, where it references
/// an existing block to carry forward; creation paths mint fresh identifiers
/// and ignore anything submitted here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInput {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default = "empty_content")]
    pub content: Value,
    #[serde(default)]
    pub styles: Option<Value>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub animation: Option<BlockAnimation>,
}

fn empty_content() -> Value {
    Value::Object(serde_json::Map::new())
}

impl BlockInput {
    pub fn validate(&self) -> Result<()> {
        if self.block_type.trim().is_empty() {
            return Err(LecternError::Validation(
                "Block type is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Payload for the publish operation. Empty strings take the documented
/// defaults (`published` / `open`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublishMaterialRequest {
    pub visibility: String,
    pub access: String,
}

/// Full ordered ID set for a reorder. Blocks not mentioned are dropped.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderBlocksRequest {
    pub block_ids: Vec<String>,
}
