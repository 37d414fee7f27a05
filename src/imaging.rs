//! Image decoding, data URLs and upload validation.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};
use thiserror::Error;

use crate::element::CanvasObject;

/// Largest file accepted from the user, in bytes
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// MIME types accepted for uploads
pub const ACCEPTED_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("No file selected")]
    NoFile,

    #[error("File too large ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("Invalid image format: {0}")]
    UnsupportedType(String),

    #[error("Invalid data URL.")]
    InvalidDataUrl,

    #[error("Invalid base64 content.")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// A parsed `data:<mime>;base64,<payload>` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Everything before the comma, e.g. `data:image/png;base64`
    pub meta: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn parse(text: &str) -> Result<Self, ImagingError> {
        let (meta, payload) = text.split_once(',').ok_or(ImagingError::InvalidDataUrl)?;
        let bytes = STANDARD.decode(payload.trim())?;
        Ok(Self { meta: meta.to_owned(), bytes })
    }

    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{mime};base64,{}", STANDARD.encode(bytes))
    }

    pub fn is_jpeg(&self) -> bool {
        self.meta.contains("image/jpeg")
    }

    /// File extension implied by the header; anything not JPEG is stored as PNG
    pub fn extension(&self) -> &'static str {
        if self.is_jpeg() { ".jpg" } else { ".png" }
    }
}

/// Validate a user-supplied file before any state is touched
pub fn validate_upload(mime: &str, bytes: &[u8]) -> Result<(), ImagingError> {
    if bytes.is_empty() {
        return Err(ImagingError::NoFile);
    }
    if !ACCEPTED_TYPES.contains(&mime) {
        return Err(ImagingError::UnsupportedType(mime.to_owned()));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ImagingError::TooLarge { size: bytes.len(), limit: MAX_UPLOAD_BYTES });
    }
    Ok(())
}

pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, ImagingError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ImagingError> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

pub fn png_data_url(image: &RgbaImage) -> Result<String, ImagingError> {
    Ok(DataUrl::encode("image/png", &encode_png(image)?))
}

/// Decode the pixels behind an image object's `src`
pub fn decode_data_url_image(src: &str) -> Result<RgbaImage, ImagingError> {
    decode_image(&DataUrl::parse(src)?.bytes)
}

/// Build an image object centred on the canvas and scaled down to fit it
pub fn create_image_object(
    bytes: &[u8],
    canvas_width: f32,
    canvas_height: f32,
) -> Result<CanvasObject, ImagingError> {
    let decoded = decode_image(bytes)?;
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(ImagingError::InvalidDataUrl);
    }

    let scale = (canvas_width / width as f32)
        .min(canvas_height / height as f32)
        .min(1.0);
    let left = (canvas_width - width as f32 * scale) / 2.0;
    let top = (canvas_height - height as f32 * scale) / 2.0;

    let mut object = CanvasObject::image(left, top, width, height, png_data_url(&decoded)?);
    object.scale_x = scale;
    object.scale_y = scale;
    log::debug!("Created image object {}x{} at scale {:.3}", width, height, scale);
    Ok(object)
}
