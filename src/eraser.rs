//! Smart eraser: one eraser stroke applied across layers.
//!
//! Editable objects get the stroke subtracted through their erase mask and
//! keep their geometry. Everything else is flattened to pixels with the
//! stroke cut out.

use egui::Pos2;

use crate::element::{
    CanvasObject, CompositeOp, EraseMask, MaskStroke, ObjectId, ObjectKind, Shape, classify,
    mark_as_rasterized,
};
use crate::imaging::{ImagingError, png_data_url};
use crate::layer::{Layer, LayerId};
use crate::surface::DrawingSurface;
use crate::surface::raster::{punch_stroke, render_object};

/// Resolution multiplier used when flattening objects
pub const RASTER_SCALE: f32 = 2.0;

/// Apply an eraser path to every visible mounted layer whose content has loaded; returns the layers that changed
pub fn apply_to_layers(layers: &mut [Layer], stroke: &CanvasObject) -> Vec<LayerId> {
    let Shape::Path { points } = &stroke.shape else {
        log::warn!("Smart eraser expects a path, got {}", stroke.type_name());
        return Vec::new();
    };
    let points: Vec<Pos2> = points.iter().map(|p| stroke.to_canvas(*p)).collect();
    let width = stroke.stroke_width * stroke.mean_scale();
    let reach = stroke.bounding_rect();

    let mut touched = Vec::new();
    for layer in layers.iter_mut().filter(|layer| layer.visible && !layer.is_loading()) {
        let id = layer.id;
        let Some(surface) = layer.surface_mut() else {
            continue;
        };

        let candidates: Vec<ObjectId> = surface
            .objects()
            .iter()
            .filter(|object| object.composite != CompositeOp::DestinationOut)
            .filter(|object| object.bounding_rect().intersects(reach))
            .map(|object| object.id)
            .collect();
        if candidates.is_empty() {
            continue;
        }

        for object_id in candidates {
            let kind = surface.objects().iter().find(|o| o.id == object_id).map(classify);
            match kind {
                Some(ObjectKind::Editable) => {
                    if let Some(object) = surface.object_mut(object_id) {
                        erase_non_destructive(object, &points, width);
                    }
                }
                Some(_) => {
                    if let Err(err) = erase_destructive(surface, object_id, &points, width) {
                        log::warn!("Failed to erase {} on {}: {}", object_id, id, err);
                    }
                }
                None => {}
            }
        }
        surface.request_render();
        touched.push(id);
    }
    touched
}

/// Subtract a canvas-space stroke from an object's mask, freezing the mask box on first use
pub fn erase_non_destructive(object: &mut CanvasObject, points: &[Pos2], width: f32) {
    let local: Vec<Pos2> = points.iter().map(|p| object.to_local(*p)).collect();
    let local_width = width / object.mean_scale();
    if object.erase_mask.is_none() {
        object.erase_mask = Some(EraseMask::for_object(object));
    }
    if let Some(mask) = object.erase_mask.as_mut() {
        mask.subtract(MaskStroke { points: local, width: local_width });
    }
    object.set_coords();
}

/// Flatten an object and clear the stroke out of its pixels, keeping its stacking index
pub fn erase_destructive(
    surface: &mut dyn DrawingSurface,
    id: ObjectId,
    points: &[Pos2],
    width: f32,
) -> Result<Option<ObjectId>, ImagingError> {
    let Some(object) = surface.objects().iter().find(|o| o.id == id).cloned() else {
        return Ok(None);
    };
    let (mut pixels, bounds) = render_object(&object, RASTER_SCALE);
    punch_stroke(&mut pixels, bounds.min, RASTER_SCALE, points, width);
    replace_with_raster(surface, &object, pixels, bounds).map(Some)
}

/// Drop an object's erase mask, restoring its full shape
pub fn reset_eraser(object: &mut CanvasObject) {
    if object.erase_mask.take().is_some() {
        object.set_coords();
    }
}

/// Replace any object by a rasterized image of itself
pub fn bake_object(
    surface: &mut dyn DrawingSurface,
    id: ObjectId,
) -> Result<Option<ObjectId>, ImagingError> {
    let Some(object) = surface.objects().iter().find(|o| o.id == id).cloned() else {
        return Ok(None);
    };
    let (pixels, bounds) = render_object(&object, RASTER_SCALE);
    replace_with_raster(surface, &object, pixels, bounds).map(Some)
}

fn replace_with_raster(
    surface: &mut dyn DrawingSurface,
    original: &CanvasObject,
    pixels: image::RgbaImage,
    bounds: egui::Rect,
) -> Result<ObjectId, ImagingError> {
    let (width, height) = pixels.dimensions();
    let mut image = CanvasObject::image(bounds.min.x, bounds.min.y, width, height, png_data_url(&pixels)?);
    image.scale_x = bounds.width() / width as f32;
    image.scale_y = bounds.height() / height as f32;
    image.set_interactive(original.is_interactive());
    mark_as_rasterized(&mut image);

    let index = surface
        .objects()
        .iter()
        .position(|o| o.id == original.id)
        .unwrap_or(surface.objects().len());
    surface.remove_object(original.id);
    Ok(surface.insert_object(index, image))
}
