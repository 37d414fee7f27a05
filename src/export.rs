//! Flattening the editor into a single image file.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use thiserror::Error;

use crate::imaging::{ImagingError, decode_data_url_image};
use crate::layer::Layer;
use crate::util::time::timestamp_millis;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export yet")]
    NotReady,

    #[error("No layers to export")]
    NoLayers,

    #[error("Invalid export size {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },

    #[error("No result image to export")]
    NoResult,

    #[error(transparent)]
    Imaging(#[from] ImagingError),

    #[error("Failed to encode export: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Webp,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Webp => ImageFormat::WebP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    pub width: f32,
    pub height: f32,
    /// Pixel multiplier applied to the canvas size
    pub dpi: f32,
    pub format: ExportFormat,
}

impl ExportOptions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height, dpi: 1.0, format: ExportFormat::Png }
    }
}

/// Composite the visible layers bottom-to-top and encode the result
pub fn export_editor(layers: &[Layer], options: ExportOptions) -> Result<Vec<u8>, ExportError> {
    if layers.is_empty() {
        return Err(ExportError::NoLayers);
    }
    let ExportOptions { width, height, dpi, format } = options;
    if !(width > 0.0 && height > 0.0 && dpi > 0.0) {
        return Err(ExportError::InvalidDimensions { width, height });
    }

    let out_width = (width * dpi).ceil() as u32;
    let out_height = (height * dpi).ceil() as u32;
    let mut output = RgbaImage::new(out_width, out_height);

    for layer in layers.iter().filter(|layer| layer.visible) {
        let Some(surface) = layer.surface() else {
            log::debug!("Skipping unmounted {} in export", layer.id);
            continue;
        };
        let mut raster = surface.rasterize(dpi);
        if raster.dimensions() != (out_width, out_height) {
            raster = imageops::resize(&raster, out_width, out_height, FilterType::Triangle);
        }
        imageops::overlay(&mut output, &raster, 0, 0);
    }

    log::info!("Exported {}x{} {}", out_width, out_height, format.extension());
    encode(&output, format)
}

/// Re-encode a background-removal result
pub fn export_remove_bg(result_image: &str, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    if result_image.trim().is_empty() {
        return Err(ExportError::NoResult);
    }
    let decoded = decode_data_url_image(result_image)?;
    encode(&decoded, format)
}

fn encode(image: &RgbaImage, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format.image_format())?;
    Ok(out.into_inner())
}

/// Which part of the application is currently showing
#[derive(Debug, Clone, Copy)]
pub enum Workspace<'a> {
    Editor { layers: &'a [Layer], options: ExportOptions },
    RemoveBg { result_image: Option<&'a str> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub fn export_workspace(
    workspace: Option<Workspace<'_>>,
    format: ExportFormat,
) -> Result<ExportedFile, ExportError> {
    let bytes = match workspace.ok_or(ExportError::NotReady)? {
        Workspace::Editor { layers, options } => export_editor(layers, ExportOptions { format, ..options })?,
        Workspace::RemoveBg { result_image } => {
            export_remove_bg(result_image.ok_or(ExportError::NoResult)?, format)?
        }
    };
    Ok(ExportedFile {
        file_name: format!("export-{}.{}", timestamp_millis(), format.extension()),
        bytes,
    })
}
