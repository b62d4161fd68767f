//! Application and renderer configuration
//!
//! TOML-backed configuration with sensible defaults for every field, so a
//! missing or partial config file never prevents startup.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Window settings
    pub window: WindowConfig,
    /// Renderer settings
    pub renderer: RendererConfig,
}

impl ApplicationConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration, falling back to defaults when the file is
    /// missing or malformed
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Using default config ({}): {}",
                    path.as_ref().display(),
                    e
                );
                Self::default()
            }
        }
    }
}

/// Window creation settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial width in pixels
    pub width: u32,
    /// Initial height in pixels
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Render Engine".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Renderer settings
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RendererConfig {
    /// SPIR-V shader locations for the built-in render systems
    pub shaders: ShaderPaths,
}

/// Pre-compiled SPIR-V shader locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShaderPaths {
    pub geometry_vert: String,
    pub geometry_frag: String,
    pub point_light_vert: String,
    pub point_light_frag: String,
    pub skybox_vert: String,
    pub skybox_frag: String,
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self {
            geometry_vert: "shaders/geometry.vert.spv".to_string(),
            geometry_frag: "shaders/geometry.frag.spv".to_string(),
            point_light_vert: "shaders/point_light.vert.spv".to_string(),
            point_light_frag: "shaders/point_light.frag.spv".to_string(),
            skybox_vert: "shaders/skybox.vert.spv".to_string(),
            skybox_frag: "shaders/skybox.frag.spv".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = ApplicationConfig::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert!(!config.renderer.shaders.geometry_vert.is_empty());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: ApplicationConfig = toml::from_str(
            r#"
            [window]
            title = "Demo"
            width = 1280
            "#,
        )
        .unwrap();
        assert_eq!(config.window.title, "Demo");
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 600);
    }
}
