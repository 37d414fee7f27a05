use std::fs;
use std::path::Path;

use egui::Color32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::element::common::color_serde;
use crate::surface::SurfaceOptions;
use crate::tool::{BrushSettings, EraserMode, ToolKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Editor-wide settings; any field missing from a config file takes its default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    #[serde(with = "optional_color")]
    pub background: Option<Color32>,
    /// Maximum number of snapshots kept for undo
    pub history_depth: usize,
    /// Shift applied to duplicated layer content, in both axes
    pub duplicate_offset: f32,
    /// Edge length of layer thumbnails in pixels
    pub thumbnail_size: u32,
    pub brush_size: f32,
    #[serde(with = "color_serde")]
    pub brush_color: Color32,
    pub initial_tool: ToolKind,
    pub eraser_mode: EraserMode,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 600.0,
            background: None,
            history_depth: 20,
            duplicate_offset: 20.0,
            thumbnail_size: 40,
            brush_size: 5.0,
            brush_color: Color32::BLACK,
            initial_tool: ToolKind::Brush,
            eraser_mode: EraserMode::Pixel,
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Loading editor config from {}", path.display());
        Self::from_json(&fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_width <= 0.0 || self.canvas_height <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "canvas size {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        if self.history_depth == 0 {
            return Err(ConfigError::Invalid("history depth must be at least 1".into()));
        }
        if self.thumbnail_size == 0 {
            return Err(ConfigError::Invalid("thumbnail size must be at least 1".into()));
        }
        Ok(())
    }

    pub fn surface_options(&self) -> SurfaceOptions {
        SurfaceOptions {
            width: self.canvas_width,
            height: self.canvas_height,
            background: self.background,
        }
    }

    pub fn brush(&self) -> BrushSettings {
        BrushSettings {
            size: self.brush_size,
            color: self.brush_color,
            eraser_mode: self.eraser_mode,
        }
    }
}

mod optional_color {
    use egui::Color32;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::element::{format_color, parse_color};

    pub fn serialize<S: Serializer>(color: &Option<Color32>, serializer: S) -> Result<S::Ok, S::Error> {
        match color {
            Some(color) => serializer.serialize_some(&format_color(*color)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Color32>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| {
                parse_color(&text)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid colour `{text}`")))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.history_depth, 20);
        assert_eq!(config.thumbnail_size, 40);
        assert_eq!(config.initial_tool, ToolKind::Brush);
        assert_eq!(config.brush().size, 5.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(
            r##"{ "canvas_width": 1024, "background": "#ffffff", "eraser_mode": "smart" }"##,
        )
        .unwrap();
        assert_eq!(config.canvas_width, 1024.0);
        assert_eq!(config.canvas_height, 600.0);
        assert_eq!(config.background, Some(Color32::WHITE));
        assert_eq!(config.eraser_mode, EraserMode::Smart);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            EditorConfig::from_json(r#"{ "history_depth": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EditorConfig::from_json(r#"{ "brush_color": "nope" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        fs::write(&path, r#"{ "initial_tool": "select" }"#).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap().initial_tool, ToolKind::Select);
    }
}
