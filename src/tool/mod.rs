//! The registry-wide tool and how it configures the selected surface.

use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::element::{CompositeOp, ObjectId};
use crate::layer::{Layer, LayerId};
use crate::surface::{Cursor, DrawingSurface, FreeDrawBrush, PointerEvent};

mod shape;

pub use shape::{SHAPE_STROKE_WIDTH, ShapeGesture, ShapeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Select,
    #[default]
    Brush,
    Eraser,
    Rectangle,
    Circle,
}

impl ToolKind {
    pub fn shape(self) -> Option<ShapeKind> {
        match self {
            Self::Rectangle => Some(ShapeKind::Rectangle),
            Self::Circle => Some(ShapeKind::Circle),
            _ => None,
        }
    }

    pub fn is_free_draw(self) -> bool {
        matches!(self, Self::Brush | Self::Eraser)
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Select => "select",
            Self::Brush => "brush",
            Self::Eraser => "eraser",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
        };
        f.write_str(name)
    }
}

/// What an eraser stroke does once it is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EraserMode {
    /// Keep the stroke as a destination-out path
    #[default]
    Pixel,
    /// Apply the stroke to the objects it crosses
    Smart,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSettings {
    pub size: f32,
    pub color: Color32,
    pub eraser_mode: EraserMode,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self { size: 5.0, color: Color32::BLACK, eraser_mode: EraserMode::Pixel }
    }
}

/// Applies the active tool to the selected surface and owns shape-gesture state.
///
/// Only one surface at a time has pointer wiring: free-draw mode or the shape
/// listeners. Applying a tool is total and idempotent, so every change (tool,
/// brush, selection, mount) simply re-applies it.
#[derive(Debug, Clone)]
pub struct ToolController {
    tool: ToolKind,
    brush: BrushSettings,
    /// Layer whose surface has the shape listeners installed
    wired: Option<LayerId>,
    gesture: ShapeGesture,
}

impl Default for ToolController {
    fn default() -> Self {
        Self::new(ToolKind::default(), BrushSettings::default())
    }
}

impl ToolController {
    pub fn new(tool: ToolKind, brush: BrushSettings) -> Self {
        Self { tool, brush, wired: None, gesture: ShapeGesture::Idle }
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    pub fn wired_layer(&self) -> Option<LayerId> {
        self.wired
    }

    pub fn gesture(&self) -> &ShapeGesture {
        &self.gesture
    }

    /// Returns the previous tool
    pub(crate) fn set_tool(&mut self, tool: ToolKind) -> ToolKind {
        std::mem::replace(&mut self.tool, tool)
    }

    pub(crate) fn set_brush(&mut self, brush: BrushSettings) {
        self.brush = brush;
    }

    /// Drop all wiring, e.g. after every surface was disposed
    pub(crate) fn reset(&mut self) {
        self.wired = None;
        self.gesture.cancel();
    }

    /// Release the wired layer, removing a shape left half-drawn on it
    fn abort_gesture(&mut self, layers: &mut [Layer]) -> Option<(LayerId, ObjectId)> {
        let Some(wired) = self.wired.take() else {
            self.gesture.cancel();
            return None;
        };
        match layers.iter_mut().find(|layer| layer.id == wired).and_then(Layer::surface_mut) {
            Some(surface) => {
                let shape = self.gesture.abort(surface)?;
                log::debug!("Discarded unfinished shape {} on {}", shape, wired);
                Some((wired, shape))
            }
            None => {
                self.gesture.cancel();
                None
            }
        }
    }

    /// Configure `target`'s surface for the active tool and strip pointer wiring from all others.
    ///
    /// Deferred while the target has no surface or its content is still
    /// loading; registering the surface or finishing the load re-applies it.
    /// A shape gesture survives only when the same shape tool is re-applied to
    /// the layer it is drawn on. Otherwise its shape is removed and returned.
    pub fn apply(&mut self, layers: &mut [Layer], target: LayerId) -> Option<(LayerId, ObjectId)> {
        let keep_gesture = self.wired == Some(target)
            && matches!(self.gesture, ShapeGesture::Drawing { kind, .. } if self.tool.shape() == Some(kind));
        let aborted = if keep_gesture { None } else { self.abort_gesture(layers) };

        for layer in layers.iter_mut().filter(|layer| layer.id != target || layer.is_loading()) {
            if let Some(surface) = layer.surface_mut() {
                surface.set_free_draw(None);
                surface.set_cursor(Cursor::Default);
                surface.set_selection(false);
                surface.set_hit_testing(false);
            }
        }

        let Some(surface) = layers
            .iter_mut()
            .find(|layer| layer.id == target && !layer.is_loading())
            .and_then(Layer::surface_mut)
        else {
            log::debug!("Deferring tool {} until {} is ready", self.tool, target);
            return aborted;
        };

        surface.set_free_draw(None);
        surface.set_cursor(Cursor::Default);
        self.configure(surface);
        if self.tool.shape().is_some() {
            self.wired = Some(target);
        }
        surface.request_render();
        log::debug!("Applied tool {} to {}", self.tool, target);
        aborted
    }

    fn configure(&self, surface: &mut dyn DrawingSurface) {
        match self.tool {
            ToolKind::Brush | ToolKind::Eraser => {
                let composite = if self.tool == ToolKind::Eraser {
                    CompositeOp::DestinationOut
                } else {
                    CompositeOp::SourceOver
                };
                surface.set_free_draw(Some(FreeDrawBrush {
                    width: self.brush.size,
                    color: self.brush.color,
                    composite,
                }));
                surface.set_selection(false);
                surface.set_hit_testing(false);
                surface.set_each_object_interactive(false);
            }
            ToolKind::Rectangle | ToolKind::Circle => {
                surface.set_selection(false);
                surface.set_cursor(Cursor::Crosshair);
                surface.set_each_object_interactive(false);
            }
            ToolKind::Select => {
                surface.set_selection(true);
                surface.set_hit_testing(true);
                surface.set_each_object_interactive(true);
            }
        }
    }

    /// Feed a pointer event to `layer`'s surface.
    ///
    /// Wired surfaces run the shape gesture; everything else goes to the
    /// surface's own handling, which ignores input while inert.
    pub fn handle_pointer(&mut self, layer: &mut Layer, event: PointerEvent) {
        let id = layer.id;
        if layer.is_loading() {
            return;
        }
        let Some(surface) = layer.surface_mut() else {
            return;
        };
        match self.tool.shape() {
            Some(kind) if self.wired == Some(id) => {
                if let Some(shape) = self.gesture.handle(kind, self.brush.color, event, surface) {
                    log::debug!("Finished {:?} {} on {}", kind, shape, id);
                }
            }
            _ => surface.handle_pointer(event),
        }
    }
}
