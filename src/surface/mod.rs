//! The drawing-surface capability consumed by the canvas store.
//!
//! A surface is an opaque, stateful 2D canvas owned by exactly one layer. The
//! store only ever talks to it through [`DrawingSurface`]; the headless
//! [`SceneSurface`] implements the contract in memory so the whole editor can
//! run without a UI.

use egui::{Color32, Pos2, Vec2};
use futures::future::LocalBoxFuture;
use image::RgbaImage;
use serde_json::Value;

use crate::element::{CanvasObject, CompositeOp, ObjectId};
use crate::error::SurfaceError;
use crate::imaging::DataUrl;

pub(crate) mod raster;
mod scene;

pub use scene::{
    SCENE_VERSION, SceneDocument, SceneSurface, SceneSurfaceFactory, SurfaceStats, decode_scene,
    offset_scene_objects,
};

/// Token identifying a physical canvas element bound by the UI
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanvasHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceOptions {
    pub width: f32,
    pub height: f32,
    pub background: Option<Color32>,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self { width: 800.0, height: 600.0, background: None }
    }
}

/// Free-draw brush installed on a surface in drawing mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeDrawBrush {
    pub width: f32,
    pub color: Color32,
    pub composite: CompositeOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Crosshair,
}

/// Interaction state of a surface as toggled by the store
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceFlags {
    /// Accepts pointer input at all
    pub interactive: bool,
    /// Drag-to-select box enabled
    pub selection: bool,
    /// Hit testing disabled: clicks never find a target
    pub skip_target_find: bool,
    /// Free-draw mode enabled
    pub drawing_mode: bool,
    pub brush: Option<FreeDrawBrush>,
    pub cursor: Cursor,
}

impl Default for SurfaceFlags {
    fn default() -> Self {
        Self {
            interactive: true,
            selection: true,
            skip_target_find: false,
            drawing_mode: false,
            brush: None,
            cursor: Cursor::Default,
        }
    }
}

/// Mutation notifications a surface emits to its subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    PathCreated(ObjectId),
    /// `None` when the notification is synthetic and not tied to one object
    ObjectModified(Option<ObjectId>),
    ObjectRemoved(ObjectId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// A pointer event in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub pos: Pos2,
}

impl PointerEvent {
    pub fn down(x: f32, y: f32) -> Self {
        Self { kind: PointerKind::Down, pos: Pos2::new(x, y) }
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self { kind: PointerKind::Move, pos: Pos2::new(x, y) }
    }

    pub fn up(x: f32, y: f32) -> Self {
        Self { kind: PointerKind::Up, pos: Pos2::new(x, y) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
    Webp,
}

impl RasterFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Webp => image::ImageFormat::WebP,
        }
    }
}

pub type SurfaceListener = Box<dyn FnMut(SurfaceEvent) + Send>;

/// Capability contract of one drawing surface
pub trait DrawingSurface {
    fn size(&self) -> Vec2;

    fn add_object(&mut self, object: CanvasObject) -> ObjectId;

    fn insert_object(&mut self, index: usize, object: CanvasObject) -> ObjectId;

    /// Removes the object and emits `ObjectRemoved`
    fn remove_object(&mut self, id: ObjectId) -> Option<CanvasObject>;

    fn objects(&self) -> &[CanvasObject];

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut CanvasObject>;

    fn for_each_object(&mut self, f: &mut dyn FnMut(&mut CanvasObject));

    /// Removes every object, emitting `ObjectRemoved` for each
    fn clear(&mut self);

    fn serialize(&self) -> Value;

    /// Decode serialized content; the result is applied with [`DrawingSurface::apply_scene`]
    fn deserialize(&self, tree: Value) -> LocalBoxFuture<'static, Result<SceneDocument, SurfaceError>> {
        decode_scene(tree)
    }

    /// Replace the surface content without emitting mutation events
    fn apply_scene(&mut self, scene: SceneDocument);

    fn flags(&self) -> &SurfaceFlags;

    fn set_interactive(&mut self, interactive: bool);

    fn set_selection(&mut self, enabled: bool);

    fn set_hit_testing(&mut self, enabled: bool);

    fn set_each_object_interactive(&mut self, interactive: bool) {
        self.for_each_object(&mut |object| object.set_interactive(interactive));
    }

    fn set_free_draw(&mut self, brush: Option<FreeDrawBrush>);

    fn set_cursor(&mut self, cursor: Cursor);

    fn active_object(&self) -> Option<ObjectId>;

    fn set_active_object(&mut self, id: Option<ObjectId>);

    fn discard_active_object(&mut self) {
        self.set_active_object(None);
    }

    /// Built-in pointer behaviour: free drawing or object selection
    fn handle_pointer(&mut self, event: PointerEvent);

    fn render_now(&mut self);

    fn request_render(&mut self);

    fn rasterize(&self, scale: f32) -> RgbaImage;

    fn to_raster_data_url(&self, format: RasterFormat, scale: f32) -> Result<String, SurfaceError> {
        let raster = self.rasterize(scale);
        let mut out = std::io::Cursor::new(Vec::new());
        let encoded = match format {
            // JPEG has no alpha channel
            RasterFormat::Jpeg => image::DynamicImage::ImageRgba8(raster)
                .to_rgb8()
                .write_to(&mut out, format.image_format()),
            _ => raster.write_to(&mut out, format.image_format()),
        };
        encoded.map_err(|err| SurfaceError::Image(err.into()))?;
        Ok(DataUrl::encode(format.mime(), &out.into_inner()))
    }

    fn subscribe(&mut self, listener: SurfaceListener);

    /// Deliver an event to every subscriber
    fn fire(&mut self, event: SurfaceEvent);

    /// Release all resources and listeners; the surface must not be used afterwards
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}

/// Creates surfaces for physical canvases bound by the UI
pub trait SurfaceFactory {
    fn create(
        &mut self,
        canvas: &CanvasHandle,
        options: SurfaceOptions,
    ) -> Result<Box<dyn DrawingSurface>, SurfaceError>;
}
