//! Minimal software rasterizer used for thumbnails, export and destructive erasing.
//!
//! Coverage is point-sampled at pixel centres; anti-aliasing and text glyphs
//! are left to a real rendering backend.

use egui::{Color32, Pos2, Rect, Vec2};
use image::{Rgba, RgbaImage};

use crate::element::common::{distance_to_polyline, polygon_contains};
use crate::element::{CanvasObject, CompositeOp, Shape};
use crate::imaging::decode_data_url_image;

/// Render a full scene of `size` canvas units at `scale` pixels per unit
pub fn render_scene(
    objects: &[CanvasObject],
    background: Option<Color32>,
    size: Vec2,
    scale: f32,
) -> RgbaImage {
    let width = (size.x * scale).ceil().max(1.0) as u32;
    let height = (size.y * scale).ceil().max(1.0) as u32;
    let fill = background.unwrap_or(Color32::TRANSPARENT).to_srgba_unmultiplied();
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba(fill));
    for object in objects {
        draw_object(&mut canvas, object, Pos2::ZERO, scale);
    }
    canvas
}

/// Render one object alone into an image covering its bounding box
pub fn render_object(object: &CanvasObject, scale: f32) -> (RgbaImage, Rect) {
    let bounds = object.bounding_rect();
    let width = (bounds.width() * scale).ceil().max(1.0) as u32;
    let height = (bounds.height() * scale).ceil().max(1.0) as u32;
    let mut canvas = RgbaImage::new(width, height);
    draw_object(&mut canvas, object, bounds.min, scale);
    (canvas, bounds)
}

/// Clear alpha along a thick polyline given in canvas coordinates
pub fn punch_stroke(canvas: &mut RgbaImage, origin: Pos2, scale: f32, points: &[Pos2], width: f32) {
    let half = width / 2.0;
    for (px, py, pixel) in canvas.enumerate_pixels_mut() {
        let at = pixel_to_canvas(origin, scale, px, py);
        if distance_to_polyline(at, points) <= half {
            pixel.0[3] = 0;
        }
    }
}

fn pixel_to_canvas(origin: Pos2, scale: f32, px: u32, py: u32) -> Pos2 {
    Pos2::new(
        origin.x + (px as f32 + 0.5) / scale,
        origin.y + (py as f32 + 0.5) / scale,
    )
}

/// Child of a group expressed in the group's parent space
fn child_in_parent(group: &CanvasObject, child: &CanvasObject) -> CanvasObject {
    let mut placed = child.clone();
    let position = group.to_canvas(child.position());
    placed.left = position.x;
    placed.top = position.y;
    placed.scale_x *= group.scale_x;
    placed.scale_y *= group.scale_y;
    placed.angle += group.angle;
    placed.composite = group.composite;
    placed
}

fn draw_object(canvas: &mut RgbaImage, object: &CanvasObject, origin: Pos2, scale: f32) {
    if let Shape::Group { objects } = &object.shape {
        for child in objects {
            draw_object(canvas, &child_in_parent(object, child), origin, scale);
        }
        return;
    }

    let pixels = match &object.shape {
        Shape::Image { src, .. } => match decode_data_url_image(src) {
            Ok(pixels) => Some(pixels),
            Err(err) => {
                log::warn!("Skipping undecodable image {}: {}", object.id, err);
                return;
            }
        },
        _ => None,
    };

    let bounds = object.bounding_rect();
    let (width, height) = canvas.dimensions();
    let to_px = |v: f32, o: f32| ((v - o) * scale).floor().max(0.0) as u32;
    let x0 = to_px(bounds.min.x, origin.x).min(width);
    let y0 = to_px(bounds.min.y, origin.y).min(height);
    let x1 = (((bounds.max.x - origin.x) * scale).ceil().max(0.0) as u32).min(width);
    let y1 = (((bounds.max.y - origin.y) * scale).ceil().max(0.0) as u32).min(height);

    for py in y0..y1 {
        for px in x0..x1 {
            let local = object.to_local(pixel_to_canvas(origin, scale, px, py));
            if let Some(mask) = &object.erase_mask {
                if !mask.covers(local) {
                    continue;
                }
            }
            if let Some(color) = sample(object, local, pixels.as_ref()) {
                blend(canvas.get_pixel_mut(px, py), color, object.composite);
            }
        }
    }
}

fn paint(object: &CanvasObject, on_edge: bool, inside: bool) -> Option<Color32> {
    if on_edge && object.stroke_width > 0.0 && object.stroke != Color32::TRANSPARENT {
        Some(object.stroke)
    } else if inside && object.fill != Color32::TRANSPARENT {
        Some(object.fill)
    } else {
        None
    }
}

fn closed(points: &[Pos2]) -> Vec<Pos2> {
    let mut ring = points.to_vec();
    if let Some(first) = points.first() {
        ring.push(*first);
    }
    ring
}

fn sample(object: &CanvasObject, local: Pos2, pixels: Option<&RgbaImage>) -> Option<Color32> {
    let half = object.stroke_width / 2.0;
    match &object.shape {
        Shape::Rect { width, height } => {
            let inside = local.x >= 0.0 && local.y >= 0.0 && local.x <= *width && local.y <= *height;
            let ring = closed(&[
                Pos2::ZERO,
                Pos2::new(*width, 0.0),
                Pos2::new(*width, *height),
                Pos2::new(0.0, *height),
            ]);
            paint(object, distance_to_polyline(local, &ring) <= half, inside)
        }
        Shape::Circle { radius } => {
            let d = (local - Pos2::new(*radius, *radius)).length();
            paint(object, (d - radius).abs() <= half, d <= *radius)
        }
        Shape::Ellipse { rx, ry } => {
            if *rx <= 0.0 || *ry <= 0.0 {
                return None;
            }
            let nx = (local.x - rx) / rx;
            let ny = (local.y - ry) / ry;
            let n = (nx * nx + ny * ny).sqrt();
            paint(object, (n - 1.0).abs() * rx.min(*ry) <= half, n <= 1.0)
        }
        Shape::Triangle { width, height } => {
            let points = [Pos2::new(width / 2.0, 0.0), Pos2::new(*width, *height), Pos2::new(0.0, *height)];
            paint(
                object,
                distance_to_polyline(local, &closed(&points)) <= half,
                polygon_contains(&points, local),
            )
        }
        Shape::Polygon { points } => paint(
            object,
            distance_to_polyline(local, &closed(points)) <= half,
            polygon_contains(points, local),
        ),
        Shape::Path { points } => {
            let reach = half.max(0.5);
            (distance_to_polyline(local, points) <= reach && object.stroke != Color32::TRANSPARENT)
                .then_some(object.stroke)
        }
        Shape::Image { .. } => {
            let pixels = pixels?;
            if local.x < 0.0 || local.y < 0.0 {
                return None;
            }
            let (x, y) = (local.x as u32, local.y as u32);
            if x >= pixels.width() || y >= pixels.height() {
                return None;
            }
            let [r, g, b, a] = pixels.get_pixel(x, y).0;
            Some(Color32::from_rgba_unmultiplied(r, g, b, a))
        }
        // Glyph rendering belongs to the UI backend
        Shape::Text { .. } | Shape::Group { .. } => None,
    }
}

fn blend(dst: &mut Rgba<u8>, src: Color32, op: CompositeOp) {
    let sa = src.a() as f32 / 255.0;
    let da = dst.0[3] as f32 / 255.0;
    match op {
        CompositeOp::DestinationOut => {
            dst.0[3] = (da * (1.0 - sa) * 255.0).round() as u8;
        }
        CompositeOp::SourceOver => {
            let out_a = sa + da * (1.0 - sa);
            if out_a <= 0.0 {
                *dst = Rgba([0, 0, 0, 0]);
                return;
            }
            // Color32 is premultiplied; the image buffer is not
            let src_c = [src.r(), src.g(), src.b()].map(|c| c as f32 / 255.0);
            for (i, sc) in src_c.iter().enumerate() {
                let dc = dst.0[i] as f32 / 255.0 * da;
                let out = (sc + dc * (1.0 - sa)) / out_a;
                dst.0[i] = (out.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
            dst.0[3] = (out_a * 255.0).round() as u8;
        }
    }
}
