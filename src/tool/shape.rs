use egui::{Color32, Pos2};

use crate::element::{CanvasObject, ObjectId, Shape};
use crate::surface::{DrawingSurface, PointerEvent, PointerKind, SurfaceEvent};

/// Outline width of drag-created shapes
pub const SHAPE_STROKE_WIDTH: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Circle,
}

/// Drag-to-size shape creation, owned by one tool controller.
///
/// `Idle -> Drawing` on pointer down, back to `Idle` on pointer up. While
/// drawing, the shape lives on the surface but stays inert.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ShapeGesture {
    #[default]
    Idle,
    Drawing {
        kind: ShapeKind,
        anchor: Pos2,
        shape: ObjectId,
    },
}

impl ShapeGesture {
    pub fn is_drawing(&self) -> bool {
        matches!(self, Self::Drawing { .. })
    }

    /// Forget any in-progress shape; a later pointer up becomes a no-op
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    /// Drop an in-progress shape from the surface it was being drawn on.
    ///
    /// Returns the removed shape.
    pub fn abort(&mut self, surface: &mut dyn DrawingSurface) -> Option<ObjectId> {
        let Self::Drawing { shape, .. } = std::mem::take(self) else {
            return None;
        };
        surface.remove_object(shape)?;
        surface.request_render();
        Some(shape)
    }

    pub fn handle(
        &mut self,
        kind: ShapeKind,
        color: Color32,
        event: PointerEvent,
        surface: &mut dyn DrawingSurface,
    ) -> Option<ObjectId> {
        match event.kind {
            PointerKind::Down => {
                self.pointer_down(kind, color, event.pos, surface);
                None
            }
            PointerKind::Move => {
                self.pointer_move(event.pos, surface);
                None
            }
            PointerKind::Up => self.pointer_up(surface),
        }
    }

    pub fn pointer_down(
        &mut self,
        kind: ShapeKind,
        color: Color32,
        anchor: Pos2,
        surface: &mut dyn DrawingSurface,
    ) {
        if self.is_drawing() {
            return;
        }
        let mut object = match kind {
            ShapeKind::Rectangle => CanvasObject::rect(anchor.x, anchor.y, 0.0, 0.0),
            ShapeKind::Circle => CanvasObject::circle(anchor.x, anchor.y, 0.0),
        }
        .with_stroke(color, SHAPE_STROKE_WIDTH);
        object.set_interactive(false);
        let shape = surface.add_object(object);
        *self = Self::Drawing { kind, anchor, shape };
    }

    pub fn pointer_move(&mut self, pos: Pos2, surface: &mut dyn DrawingSurface) {
        let Self::Drawing { kind, anchor, shape } = *self else {
            return;
        };
        let Some(object) = surface.object_mut(shape) else {
            return;
        };
        match (kind, &mut object.shape) {
            (ShapeKind::Rectangle, Shape::Rect { width, height }) => {
                *width = (pos.x - anchor.x).abs();
                *height = (pos.y - anchor.y).abs();
                object.left = pos.x.min(anchor.x);
                object.top = pos.y.min(anchor.y);
            }
            (ShapeKind::Circle, Shape::Circle { radius }) => {
                *radius = (pos - anchor).length() / 2.0;
            }
            _ => {}
        }
        surface.request_render();
    }

    /// Finish the gesture, returning the completed shape
    pub fn pointer_up(&mut self, surface: &mut dyn DrawingSurface) -> Option<ObjectId> {
        let Self::Drawing { shape, .. } = std::mem::take(self) else {
            return None;
        };
        let object = surface.object_mut(shape)?;
        object.set_interactive(true);
        object.set_coords();
        surface.fire(SurfaceEvent::ObjectModified(Some(shape)));
        Some(shape)
    }
}
