//! Core data model for fsobserve
//!
//! This crate provides:
//! - File metadata records (size, modification time, directory flag)
//! - The metadata retrieval seam (`MetadataSource`) and its tokio-backed default
//! - Classified change events and their serialized wire shape

pub mod event;
pub mod metadata;

// Re-exports
pub use event::{ChangeEvent, ChangeKind};
pub use metadata::{FileMetadata, FsMetadata, MetadataSource};
