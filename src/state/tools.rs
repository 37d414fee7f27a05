use egui::Color32;

use crate::error::{EditorError, EditorResult};
use crate::event::EditorEvent;
use crate::layer::LayerId;
use crate::surface::PointerEvent;
use crate::tool::{BrushSettings, EraserMode, ToolKind};

use super::CanvasStore;

impl CanvasStore {
    /// Switch the registry-wide tool and apply it to the selected surface
    pub fn set_tool(&mut self, tool: ToolKind) {
        let old = self.tools.set_tool(tool);
        if old != tool {
            log::debug!("Switching tool {} -> {}", old, tool);
            self.emit(EditorEvent::ToolChanged { old, new: tool });
        }
        self.apply_current_tool();
    }

    /// Re-apply the active tool to the selected surface
    pub fn apply_current_tool(&mut self) {
        match self.selected {
            Some(selected) => self.apply_tool_to(selected),
            None => log::warn!("Cannot apply tool {}: no layer selected", self.tools.tool()),
        }
    }

    pub fn update_brush_settings(&mut self, size: f32, color: Color32) {
        let brush = BrushSettings { size, color, ..*self.tools.brush() };
        self.set_brush(brush);
    }

    pub fn set_eraser_mode(&mut self, eraser_mode: EraserMode) {
        let brush = BrushSettings { eraser_mode, ..*self.tools.brush() };
        self.set_brush(brush);
    }

    fn set_brush(&mut self, brush: BrushSettings) {
        self.tools.set_brush(brush);
        self.emit(EditorEvent::BrushChanged(brush));
        self.apply_current_tool();
    }

    /// Deliver a pointer event to a layer's surface, then handle what it changed.
    ///
    /// Input is refused while the layer's content is still loading.
    pub fn pointer(&mut self, layer: LayerId, event: PointerEvent) -> EditorResult<()> {
        let index = self.index_of(layer)?;
        if self.layers[index].is_loading() {
            log::debug!("Ignoring {:?} on {}: content still loading", event.kind, layer);
            return Err(EditorError::LayerLoading(layer));
        }
        self.tools.handle_pointer(&mut self.layers[index], event);
        self.process_surface_events();
        Ok(())
    }
}
