//! # Lectern Core
//!
//! Core library for the Lectern learning platform, providing the material
//! document model, student progress tracking, and the PostgreSQL persistence
//! layer behind both.
//!
//! ## Overview
//!
//! `lectern-core` is the foundation the Lectern server builds on, offering:
//!
//! - **Material Documents**: Block-based lesson materials with draft,
//!   published, and archived states
//! - **Block Sequences**: Ordered, typed content blocks with opaque JSON
//!   payloads, styles, and animations
//! - **Publishing**: Share URL minting for open and link-only access
//! - **Progress Tracking**: Completion records, grades, and favorites rolled
//!   up into a per-student summary
//! - **Database Abstraction**: Trait-based repository ports with a PostgreSQL
//!   implementation and embedded migrations
//!
//! ## Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`domain`]: Material, block, and progress types shared across API
//!   boundaries
//! - [`services`]: Business logic enforcing authorship and write ordering
//! - [`database`]: Repository ports and the PostgreSQL backend
//! - [`api_types`]: The response envelope used by HTTP handlers
//! - [`token`]: Opaque identifier minting for blocks and share links
//!
//! ## Examples
//!
//! ```
//! use lectern_core::domain::materials::CreateMaterialRequest;
//!
//! let request = CreateMaterialRequest {
//!     title: "Intro to Fractions".to_string(),
//!     subject: "math".to_string(),
//! };
//! assert!(request.validate().is_ok());
//! ```

#![allow(missing_docs)]

/// Common API types shared across Lectern services
pub mod api_types;

/// Database abstraction layer and the PostgreSQL implementation
pub mod database;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Material and progress domain types
pub mod domain;

/// Error types and error handling utilities
pub mod error;

/// Business services over the repository ports
pub mod services;

/// Opaque identifier generation for blocks and share links
pub mod token;
