//! Headless in-memory implementation of the drawing-surface contract.

use std::sync::Arc;

use egui::{Color32, Pos2, Vec2};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use image::RgbaImage;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    CanvasHandle, Cursor, DrawingSurface, FreeDrawBrush, PointerEvent, PointerKind, SurfaceError,
    SurfaceEvent, SurfaceFactory, SurfaceFlags, SurfaceListener, SurfaceOptions, raster,
};
use crate::element::{CanvasObject, ObjectId, Shape, format_color, parse_color};
use crate::id_generator::IdGenerator;
use crate::imaging::decode_data_url_image;

/// Format version written into serialized scenes
pub const SCENE_VERSION: &str = "5.3.0";

/// Serialized form of a surface's content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub objects: Vec<CanvasObject>,
}

fn validate_images(object: &CanvasObject) -> Result<(), SurfaceError> {
    match &object.shape {
        Shape::Image { src, .. } => {
            decode_data_url_image(src)?;
        }
        Shape::Group { objects } => {
            for child in objects {
                validate_images(child)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Parse a serialized scene, decoding every embedded image along the way
pub fn decode_scene(tree: Value) -> LocalBoxFuture<'static, Result<SceneDocument, SurfaceError>> {
    async move {
        if tree.is_null() {
            return Ok(SceneDocument::default());
        }
        let scene: SceneDocument = serde_json::from_value(tree)?;
        for object in &scene.objects {
            validate_images(object)?;
        }
        Ok(scene)
    }
    .boxed_local()
}

/// Shift every top-level object of a serialized scene; missing positions count as zero
pub fn offset_scene_objects(tree: &mut Value, dx: f32, dy: f32) {
    let Some(objects) = tree.get_mut("objects").and_then(Value::as_array_mut) else {
        return;
    };
    for object in objects.iter_mut().filter_map(Value::as_object_mut) {
        for (key, delta) in [("left", dx), ("top", dy)] {
            let current = object.get(key).and_then(Value::as_f64).unwrap_or(0.0);
            object.insert(key.to_owned(), json!(current + f64::from(delta)));
        }
    }
}

/// Lifetime counters shared by every surface a factory creates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub created: usize,
    pub disposed: usize,
}

impl SurfaceStats {
    pub fn live(&self) -> usize {
        self.created - self.disposed
    }
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    id: ObjectId,
    last: Pos2,
    moved: bool,
}

pub struct SceneSurface {
    size: Vec2,
    background: Option<Color32>,
    objects: Vec<CanvasObject>,
    ids: IdGenerator,
    flags: SurfaceFlags,
    active: Option<ObjectId>,
    listeners: Vec<SurfaceListener>,
    /// Free-draw stroke in progress, in canvas coordinates
    stroke: Vec<Pos2>,
    drag: Option<Drag>,
    renders: usize,
    render_requests: usize,
    disposed: bool,
    stats: Option<Arc<Mutex<SurfaceStats>>>,
}

impl SceneSurface {
    pub fn new(options: SurfaceOptions) -> Self {
        Self {
            size: Vec2::new(options.width, options.height),
            background: options.background,
            objects: Vec::new(),
            ids: IdGenerator::new(),
            flags: SurfaceFlags::default(),
            active: None,
            listeners: Vec::new(),
            stroke: Vec::new(),
            drag: None,
            renders: 0,
            render_requests: 0,
            disposed: false,
            stats: None,
        }
    }

    fn with_stats(options: SurfaceOptions, stats: Arc<Mutex<SurfaceStats>>) -> Self {
        stats.lock().created += 1;
        Self { stats: Some(stats), ..Self::new(options) }
    }

    pub fn background(&self) -> Option<Color32> {
        self.background
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn render_request_count(&self) -> usize {
        self.render_requests
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn assign_id(&mut self, mut object: CanvasObject) -> CanvasObject {
        object.id = ObjectId(self.ids.generate());
        object.set_coords();
        object
    }

    fn free_draw(&mut self, event: PointerEvent, brush: FreeDrawBrush) {
        match event.kind {
            PointerKind::Down => self.stroke = vec![event.pos],
            PointerKind::Move if !self.stroke.is_empty() => self.stroke.push(event.pos),
            PointerKind::Move => {}
            PointerKind::Up => {
                if self.stroke.is_empty() {
                    return;
                }
                self.stroke.push(event.pos);
                let points = std::mem::take(&mut self.stroke);
                let mut path = CanvasObject::path(&points, brush.width, brush.color);
                path.composite = brush.composite;
                // Drawing mode keeps every object inert until the tool changes
                path.set_interactive(false);
                let id = self.add_object(path);
                self.request_render();
                self.fire(SurfaceEvent::PathCreated(id));
            }
        }
    }

    fn hit_test(&self, pos: Pos2) -> Option<ObjectId> {
        if self.flags.skip_target_find {
            return None;
        }
        self.objects
            .iter()
            .rev()
            .find(|object| object.is_interactive() && object.contains_point(pos))
            .map(|object| object.id)
    }

    fn select_drag(&mut self, event: PointerEvent) {
        match event.kind {
            PointerKind::Down => {
                let target = self.hit_test(event.pos);
                self.active = target;
                self.drag = target.map(|id| Drag { id, last: event.pos, moved: false });
                self.request_render();
            }
            PointerKind::Move => {
                let Some(drag) = self.drag.as_mut() else {
                    return;
                };
                let delta = event.pos - drag.last;
                drag.last = event.pos;
                drag.moved |= delta != Vec2::ZERO;
                let id = drag.id;
                if let Some(object) = self.object_mut(id) {
                    object.translate(delta);
                }
                self.request_render();
            }
            PointerKind::Up => {
                if let Some(drag) = self.drag.take() {
                    if drag.moved {
                        self.fire(SurfaceEvent::ObjectModified(Some(drag.id)));
                    }
                }
            }
        }
    }
}

impl DrawingSurface for SceneSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn add_object(&mut self, object: CanvasObject) -> ObjectId {
        let object = self.assign_id(object);
        let id = object.id;
        self.objects.push(object);
        id
    }

    fn insert_object(&mut self, index: usize, object: CanvasObject) -> ObjectId {
        let object = self.assign_id(object);
        let id = object.id;
        self.objects.insert(index.min(self.objects.len()), object);
        id
    }

    fn remove_object(&mut self, id: ObjectId) -> Option<CanvasObject> {
        let index = self.objects.iter().position(|object| object.id == id)?;
        let removed = self.objects.remove(index);
        if self.active == Some(id) {
            self.active = None;
        }
        self.fire(SurfaceEvent::ObjectRemoved(id));
        Some(removed)
    }

    fn objects(&self) -> &[CanvasObject] {
        &self.objects
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut CanvasObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    fn for_each_object(&mut self, f: &mut dyn FnMut(&mut CanvasObject)) {
        self.objects.iter_mut().for_each(f);
    }

    fn clear(&mut self) {
        self.active = None;
        let removed: Vec<ObjectId> = self.objects.drain(..).map(|object| object.id).collect();
        for id in removed {
            self.fire(SurfaceEvent::ObjectRemoved(id));
        }
    }

    fn serialize(&self) -> Value {
        let document = SceneDocument {
            version: SCENE_VERSION.to_owned(),
            background: self.background.map(format_color),
            objects: self.objects.clone(),
        };
        serde_json::to_value(document).unwrap_or_else(|err| {
            log::error!("Failed to serialize scene: {}", err);
            Value::Null
        })
    }

    fn apply_scene(&mut self, scene: SceneDocument) {
        self.background = scene.background.as_deref().and_then(parse_color);
        self.active = None;
        self.drag = None;
        self.objects = scene
            .objects
            .into_iter()
            .map(|object| self.assign_id(object))
            .collect();
    }

    fn flags(&self) -> &SurfaceFlags {
        &self.flags
    }

    fn set_interactive(&mut self, interactive: bool) {
        self.flags.interactive = interactive;
        if !interactive {
            self.stroke.clear();
            self.drag = None;
        }
    }

    fn set_selection(&mut self, enabled: bool) {
        self.flags.selection = enabled;
    }

    fn set_hit_testing(&mut self, enabled: bool) {
        self.flags.skip_target_find = !enabled;
    }

    fn set_free_draw(&mut self, brush: Option<FreeDrawBrush>) {
        self.flags.drawing_mode = brush.is_some();
        self.flags.brush = brush;
        if brush.is_none() {
            self.stroke.clear();
        }
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.flags.cursor = cursor;
    }

    fn active_object(&self) -> Option<ObjectId> {
        self.active
    }

    fn set_active_object(&mut self, id: Option<ObjectId>) {
        self.active = id.filter(|id| self.objects.iter().any(|object| object.id == *id));
    }

    fn handle_pointer(&mut self, event: PointerEvent) {
        if self.disposed || !self.flags.interactive {
            return;
        }
        match self.flags.brush {
            Some(brush) if self.flags.drawing_mode => self.free_draw(event, brush),
            _ => self.select_drag(event),
        }
    }

    fn render_now(&mut self) {
        self.renders += 1;
    }

    fn request_render(&mut self) {
        self.render_requests += 1;
    }

    fn rasterize(&self, scale: f32) -> RgbaImage {
        raster::render_scene(&self.objects, self.background, self.size, scale)
    }

    fn subscribe(&mut self, listener: SurfaceListener) {
        if !self.disposed {
            self.listeners.push(listener);
        }
    }

    fn fire(&mut self, event: SurfaceEvent) {
        for listener in self.listeners.iter_mut() {
            listener(event);
        }
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.listeners.clear();
        self.objects.clear();
        self.stroke.clear();
        self.drag = None;
        self.active = None;
        if let Some(stats) = &self.stats {
            stats.lock().disposed += 1;
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Creates [`SceneSurface`]s and counts how many are alive.
///
/// Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct SceneSurfaceFactory {
    stats: Arc<Mutex<SurfaceStats>>,
}

impl SceneSurfaceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> SurfaceStats {
        *self.stats.lock()
    }
}

impl SurfaceFactory for SceneSurfaceFactory {
    fn create(
        &mut self,
        canvas: &CanvasHandle,
        options: SurfaceOptions,
    ) -> Result<Box<dyn DrawingSurface>, SurfaceError> {
        if options.width <= 0.0 || options.height <= 0.0 {
            return Err(SurfaceError::Create(format!(
                "canvas {} has invalid size {}x{}",
                canvas.0, options.width, options.height
            )));
        }
        Ok(Box::new(SceneSurface::with_stats(options, Arc::clone(&self.stats))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::CompositeOp;
    use futures::executor::block_on;

    fn recording(surface: &mut SceneSurface) -> Arc<Mutex<Vec<SurfaceEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        surface.subscribe(Box::new(move |event| sink.lock().push(event)));
        seen
    }

    #[test]
    fn test_free_draw_creates_path() {
        let mut surface = SceneSurface::new(SurfaceOptions::default());
        let seen = recording(&mut surface);
        surface.set_free_draw(Some(FreeDrawBrush {
            width: 5.0,
            color: Color32::BLACK,
            composite: CompositeOp::DestinationOut,
        }));

        surface.handle_pointer(PointerEvent::down(10.0, 10.0));
        surface.handle_pointer(PointerEvent::moved(20.0, 15.0));
        surface.handle_pointer(PointerEvent::up(30.0, 20.0));

        assert_eq!(surface.objects().len(), 1);
        let path = &surface.objects()[0];
        assert_eq!(path.type_name(), "path");
        assert_eq!(path.composite, CompositeOp::DestinationOut);
        assert_eq!(path.position(), Pos2::new(10.0, 10.0));
        assert_eq!(*seen.lock(), vec![SurfaceEvent::PathCreated(path.id)]);
    }

    #[test]
    fn test_drag_moves_hit_object() {
        let mut surface = SceneSurface::new(SurfaceOptions::default());
        let id = surface.add_object(CanvasObject::rect(10.0, 10.0, 20.0, 20.0));
        let seen = recording(&mut surface);

        surface.handle_pointer(PointerEvent::down(15.0, 15.0));
        assert_eq!(surface.active_object(), Some(id));
        surface.handle_pointer(PointerEvent::moved(25.0, 20.0));
        surface.handle_pointer(PointerEvent::up(25.0, 20.0));

        assert_eq!(surface.objects()[0].position(), Pos2::new(20.0, 15.0));
        assert_eq!(*seen.lock(), vec![SurfaceEvent::ObjectModified(Some(id))]);
    }

    #[test]
    fn test_inert_surface_ignores_pointer() {
        let mut surface = SceneSurface::new(SurfaceOptions::default());
        surface.add_object(CanvasObject::rect(0.0, 0.0, 20.0, 20.0));
        surface.set_interactive(false);
        surface.handle_pointer(PointerEvent::down(5.0, 5.0));
        assert_eq!(surface.active_object(), None);

        surface.set_interactive(true);
        surface.set_hit_testing(false);
        surface.handle_pointer(PointerEvent::down(5.0, 5.0));
        assert_eq!(surface.active_object(), None);
    }

    #[test]
    fn test_clear_fires_removals() {
        let mut surface = SceneSurface::new(SurfaceOptions::default());
        surface.add_object(CanvasObject::rect(0.0, 0.0, 1.0, 1.0));
        surface.add_object(CanvasObject::circle(0.0, 0.0, 1.0));
        let seen = recording(&mut surface);
        surface.clear();
        assert!(surface.objects().is_empty());
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_serialized_scene_loads_into_another_surface() {
        let mut source = SceneSurface::new(SurfaceOptions::default());
        source.add_object(CanvasObject::rect(5.0, 6.0, 10.0, 10.0));
        let mut tree = source.serialize();
        assert_eq!(tree["version"], SCENE_VERSION);

        offset_scene_objects(&mut tree, 20.0, 20.0);
        let mut target = SceneSurface::new(SurfaceOptions::default());
        let scene = block_on(target.deserialize(tree)).unwrap();
        target.apply_scene(scene);
        assert_eq!(target.objects()[0].position(), Pos2::new(25.0, 26.0));
    }

    #[test]
    fn test_offset_treats_missing_position_as_zero() {
        let mut tree = json!({ "objects": [{ "type": "circle", "radius": 3 }] });
        offset_scene_objects(&mut tree, 20.0, 20.0);
        assert_eq!(tree["objects"][0]["left"], 20.0);
        assert_eq!(tree["objects"][0]["top"], 20.0);
    }

    #[test]
    fn test_decode_rejects_broken_image() {
        let tree = json!({
            "objects": [{ "type": "image", "width": 1, "height": 1, "src": "data:image/png;base64,AAAA" }]
        });
        assert!(block_on(decode_scene(tree)).is_err());
    }

    #[test]
    fn test_factory_counts_lifetimes() {
        let mut factory = SceneSurfaceFactory::new();
        let mut surface = factory.create(&CanvasHandle(1), SurfaceOptions::default()).unwrap();
        assert_eq!(factory.stats().live(), 1);
        surface.dispose();
        surface.dispose();
        assert_eq!(factory.stats(), SurfaceStats { created: 1, disposed: 1 });
    }
}
