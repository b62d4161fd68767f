//! Asset importers
//!
//! Disk-to-CPU loaders for meshes and images. GPU upload happens in the
//! render layer; everything here is plain data and testable without a
//! device.

pub mod gltf_loader;
pub mod image_loader;
pub mod obj_loader;

pub use image_loader::ImageData;

use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
