use egui::{Color32, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

mod classify;
pub(crate) mod common;

pub use classify::{ObjectKind, can_rasterize, classify, is_protected, mark_as_rasterized};
pub use common::{MIN_HIT_WIDTH, format_color, parse_color};

use common::{calculate_bounds, color_serde, distance_to_polyline, rotate};

/// Identifier of an object within one drawing surface.
///
/// Ids are surface-local runtime handles and are not serialized; a surface
/// assigns fresh ids whenever it loads a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obj_{}", self.0)
    }
}

/// How an object's pixels combine with what is already on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeOp {
    /// Draw over existing content
    #[default]
    SourceOver,
    /// Remove existing coverage where the object paints
    DestinationOut,
}

/// The geometry of a scene object, in object-local coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Shape {
    Rect { width: f32, height: f32 },
    Circle { radius: f32 },
    Ellipse { rx: f32, ry: f32 },
    Triangle { width: f32, height: f32 },
    Polygon { points: Vec<Pos2> },
    /// Free-draw polyline; points are relative to the object's left/top
    Path { points: Vec<Pos2> },
    #[serde(alias = "i-text", alias = "textbox")]
    Text {
        text: String,
        #[serde(rename = "fontSize", default = "default_font_size")]
        font_size: f32,
    },
    /// Raster content stored as a PNG data URL
    Image { width: u32, height: u32, src: String },
    /// Children are positioned relative to the group's left/top
    Group { objects: Vec<CanvasObject> },
}

fn default_font_size() -> f32 {
    40.0
}

fn one() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

/// A region subtracted from an object without touching its geometry.
///
/// The bounding box is frozen when the mask is first created; subsequent
/// strokes never grow or recentre it. A local point is visible when it lies
/// inside the frozen box and outside every subtracted stroke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EraseMask {
    pub bounds: Rect,
    pub strokes: Vec<MaskStroke>,
}

/// One eraser stroke in object-local coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskStroke {
    pub points: Vec<Pos2>,
    pub width: f32,
}

impl EraseMask {
    /// Mask covering the whole object, padded so strokes on the outline stay visible
    pub fn for_object(object: &CanvasObject) -> Self {
        let padding = object.stroke_width + 2.0;
        Self {
            bounds: object.local_bounds().expand(padding / 2.0),
            strokes: Vec::new(),
        }
    }

    pub fn subtract(&mut self, stroke: MaskStroke) {
        self.strokes.push(stroke);
    }

    pub fn covers(&self, local: Pos2) -> bool {
        self.bounds.contains(local)
            && self
                .strokes
                .iter()
                .all(|stroke| distance_to_polyline(local, &stroke.points) > stroke.width / 2.0)
    }
}

/// A single object on a drawing surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasObject {
    #[serde(skip)]
    pub id: ObjectId,
    #[serde(flatten)]
    pub shape: Shape,
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub top: f32,
    #[serde(default = "one")]
    pub scale_x: f32,
    #[serde(default = "one")]
    pub scale_y: f32,
    /// Rotation in degrees around the object's left/top
    #[serde(default)]
    pub angle: f32,
    #[serde(with = "color_serde", default)]
    pub fill: Color32,
    #[serde(with = "color_serde", default)]
    pub stroke: Color32,
    #[serde(default)]
    pub stroke_width: f32,
    #[serde(default = "yes")]
    pub selectable: bool,
    #[serde(default = "yes")]
    pub evented: bool,
    #[serde(default, rename = "globalCompositeOperation")]
    pub composite: CompositeOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erase_mask: Option<EraseMask>,
    #[serde(default, rename = "isRasterized", skip_serializing_if = "std::ops::Not::not")]
    pub rasterized: bool,
    /// Cached hit-test box, refreshed by `set_coords`
    #[serde(skip)]
    coords: Option<Rect>,
}

impl CanvasObject {
    pub fn new(shape: Shape, left: f32, top: f32) -> Self {
        Self {
            id: ObjectId::default(),
            shape,
            left,
            top,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            fill: Color32::TRANSPARENT,
            stroke: Color32::TRANSPARENT,
            stroke_width: 0.0,
            selectable: true,
            evented: true,
            composite: CompositeOp::SourceOver,
            erase_mask: None,
            rasterized: false,
            coords: None,
        }
    }

    pub fn rect(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self::new(Shape::Rect { width, height }, left, top)
    }

    pub fn circle(left: f32, top: f32, radius: f32) -> Self {
        Self::new(Shape::Circle { radius }, left, top)
    }

    pub fn text(left: f32, top: f32, text: impl Into<String>, font_size: f32) -> Self {
        Self::new(Shape::Text { text: text.into(), font_size }, left, top)
    }

    pub fn image(left: f32, top: f32, width: u32, height: u32, src: String) -> Self {
        Self::new(Shape::Image { width, height, src }, left, top)
    }

    pub fn group(left: f32, top: f32, objects: Vec<CanvasObject>) -> Self {
        Self::new(Shape::Group { objects }, left, top)
    }

    /// Build a path from absolute canvas points; left/top become the points' minimum
    pub fn path(points: &[Pos2], width: f32, color: Color32) -> Self {
        let bounds = calculate_bounds(points, 0.0);
        let origin = if points.is_empty() { Pos2::ZERO } else { bounds.min };
        let relative = points.iter().map(|p| Pos2::new(p.x - origin.x, p.y - origin.y)).collect();
        Self::new(Shape::Path { points: relative }, origin.x, origin.y)
            .with_stroke(color, width)
    }

    pub fn with_stroke(mut self, color: Color32, width: f32) -> Self {
        self.stroke = color;
        self.stroke_width = width;
        self
    }

    pub fn with_fill(mut self, color: Color32) -> Self {
        self.fill = color;
        self
    }

    pub fn type_name(&self) -> &'static str {
        match &self.shape {
            Shape::Rect { .. } => "rect",
            Shape::Circle { .. } => "circle",
            Shape::Ellipse { .. } => "ellipse",
            Shape::Triangle { .. } => "triangle",
            Shape::Polygon { .. } => "polygon",
            Shape::Path { .. } => "path",
            Shape::Text { .. } => "text",
            Shape::Image { .. } => "image",
            Shape::Group { .. } => "group",
        }
    }

    pub fn position(&self) -> Pos2 {
        Pos2::new(self.left, self.top)
    }

    /// Untransformed extent of the shape in its own coordinate space
    pub fn local_bounds(&self) -> Rect {
        let size = |w: f32, h: f32| Rect::from_min_size(Pos2::ZERO, Vec2::new(w, h));
        match &self.shape {
            Shape::Rect { width, height } | Shape::Triangle { width, height } => size(*width, *height),
            Shape::Circle { radius } => size(radius * 2.0, radius * 2.0),
            Shape::Ellipse { rx, ry } => size(rx * 2.0, ry * 2.0),
            Shape::Polygon { points } | Shape::Path { points } if !points.is_empty() => {
                calculate_bounds(points, 0.0)
            }
            Shape::Polygon { .. } | Shape::Path { .. } => size(0.0, 0.0),
            Shape::Text { text, font_size } => {
                let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
                let lines = text.lines().count().max(1);
                size(longest as f32 * font_size * 0.6, lines as f32 * font_size * 1.16)
            }
            Shape::Image { width, height, .. } => size(*width as f32, *height as f32),
            Shape::Group { objects } => objects
                .iter()
                .map(CanvasObject::bounding_rect)
                .reduce(|a, b| a.union(b))
                .unwrap_or_else(|| size(0.0, 0.0)),
        }
    }

    /// Map a canvas point into object-local coordinates
    pub fn to_local(&self, point: Pos2) -> Pos2 {
        let v = rotate(point - self.position(), -self.angle);
        let sx = if self.scale_x == 0.0 { 1.0 } else { self.scale_x };
        let sy = if self.scale_y == 0.0 { 1.0 } else { self.scale_y };
        Pos2::new(v.x / sx, v.y / sy)
    }

    /// Map an object-local point onto the canvas
    pub fn to_canvas(&self, local: Pos2) -> Pos2 {
        let scaled = Vec2::new(local.x * self.scale_x, local.y * self.scale_y);
        self.position() + rotate(scaled, self.angle)
    }

    pub fn mean_scale(&self) -> f32 {
        let scale = (self.scale_x.abs() + self.scale_y.abs()) / 2.0;
        if scale == 0.0 { 1.0 } else { scale }
    }

    /// Axis-aligned box around the transformed shape, including half the stroke
    pub fn bounding_rect(&self) -> Rect {
        let local = self.local_bounds();
        let corners = [
            local.left_top(),
            local.right_top(),
            local.right_bottom(),
            local.left_bottom(),
        ]
        .map(|corner| self.to_canvas(corner));
        calculate_bounds(&corners, self.stroke_width * self.mean_scale() / 2.0)
    }

    /// Refresh the cached hit-test box after geometry changes
    pub fn set_coords(&mut self) {
        self.coords = Some(self.bounding_rect());
    }

    /// Hit-test box as of the last `set_coords`
    pub fn coords(&self) -> Rect {
        self.coords.unwrap_or_else(|| self.bounding_rect())
    }

    pub fn contains_point(&self, point: Pos2) -> bool {
        if !self.coords().contains(point) {
            return false;
        }
        match &self.shape {
            Shape::Path { points } => {
                let reach = self.stroke_width.max(MIN_HIT_WIDTH) / 2.0;
                distance_to_polyline(self.to_local(point), points) <= reach
            }
            _ => true,
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.left += delta.x;
        self.top += delta.y;
        if self.coords.is_some() {
            self.set_coords();
        }
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.selectable = interactive;
        self.evented = interactive;
    }

    pub fn is_interactive(&self) -> bool {
        self.selectable && self.evented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_is_normalised_to_its_origin() {
        let path = CanvasObject::path(
            &[Pos2::new(10.0, 20.0), Pos2::new(30.0, 25.0)],
            4.0,
            Color32::BLACK,
        );
        assert_eq!(path.position(), Pos2::new(10.0, 20.0));
        let bounds = path.bounding_rect();
        assert_eq!(bounds.min, Pos2::new(8.0, 18.0));
        assert_eq!(bounds.max, Pos2::new(32.0, 27.0));
        assert!(path.contains_point(Pos2::new(20.0, 22.5)));
        assert!(!path.contains_point(Pos2::new(31.5, 19.0)));
    }

    #[test]
    fn test_local_round_trip_with_rotation_and_scale() {
        let mut rect = CanvasObject::rect(50.0, 40.0, 20.0, 10.0);
        rect.angle = 90.0;
        rect.scale_x = 2.0;
        let local = Pos2::new(5.0, 3.0);
        let back = rect.to_local(rect.to_canvas(local));
        assert!((back - local).length() < 1e-3);
    }

    #[test]
    fn test_serialized_shape_uses_type_tag() {
        let rect = CanvasObject::rect(1.0, 2.0, 3.0, 4.0).with_stroke(Color32::RED, 2.0);
        let json = serde_json::to_value(&rect).unwrap();
        assert_eq!(json["type"], "rect");
        assert_eq!(json["left"], 1.0);
        assert_eq!(json["stroke"], "#ff0000");
        assert_eq!(json["fill"], "transparent");
        assert_eq!(json["globalCompositeOperation"], "source-over");

        let parsed: CanvasObject = serde_json::from_value(json).unwrap();
        assert!(matches!(parsed.shape, Shape::Rect { width, height } if width == 3.0 && height == 4.0));
    }

    #[test]
    fn test_textbox_alias_parses_as_text() {
        let json = serde_json::json!({ "type": "textbox", "text": "hi", "left": 5 });
        let parsed: CanvasObject = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.type_name(), "text");
        assert!(parsed.selectable);
        assert_eq!(parsed.scale_x, 1.0);
    }

    #[test]
    fn test_erase_mask_subtracts_strokes() {
        let rect = CanvasObject::rect(0.0, 0.0, 100.0, 100.0);
        let mut mask = EraseMask::for_object(&rect);
        assert!(mask.covers(Pos2::new(50.0, 50.0)));
        mask.subtract(MaskStroke {
            points: vec![Pos2::new(0.0, 50.0), Pos2::new(100.0, 50.0)],
            width: 10.0,
        });
        assert!(!mask.covers(Pos2::new(50.0, 52.0)));
        assert!(mask.covers(Pos2::new(50.0, 70.0)));
        assert!(!mask.covers(Pos2::new(150.0, 70.0)));
    }
}
