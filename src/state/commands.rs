use crate::command::Command;
use crate::element::{CompositeOp, ObjectId};
use crate::eraser;
use crate::error::{EditorError, EditorResult};
use crate::layer::LayerId;
use crate::surface::SurfaceEvent;
use crate::tool::{EraserMode, ToolKind};

use super::CanvasStore;

impl CanvasStore {
    /// Apply one command atomically.
    ///
    /// Surface events raised by the command are handled before returning,
    /// and at most one history snapshot is captured for the whole command.
    pub fn dispatch(&mut self, command: Command) -> EditorResult<()> {
        log::debug!("Dispatching {}", command.name());
        self.batch_depth += 1;
        let result = self.apply_command(command);
        self.drain_surface_events();
        self.batch_depth -= 1;
        self.finish_batch();
        result
    }

    /// Queue a command for the next `flush`
    pub fn submit(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    /// Apply queued commands in order; failures are collected and do not stop the queue
    pub fn flush(&mut self) -> Vec<EditorError> {
        let mut errors = Vec::new();
        while let Some(command) = self.commands.pop_front() {
            if let Err(err) = self.dispatch(command) {
                errors.push(err);
            }
        }
        errors
    }

    fn apply_command(&mut self, command: Command) -> EditorResult<()> {
        match command {
            Command::AddLayer { name } => {
                self.add_layer(name, false);
            }
            Command::DuplicateActiveLayer => {
                self.duplicate_active_layer()?;
            }
            Command::RemoveLayer(id) => self.remove_layer(id)?,
            Command::ReorderLayer { id, direction } => {
                self.reorder_layer(id, direction)?;
            }
            Command::ToggleVisibility(id) => {
                self.toggle_layer_visibility(id)?;
            }
            Command::SelectLayer(id) => self.select_layer(id)?,
            Command::SetTool(tool) => self.set_tool(tool),
            Command::UpdateBrush { size, color } => self.update_brush_settings(size, color),
            Command::SetEraserMode(mode) => self.set_eraser_mode(mode),
            Command::ClearLayer(id) => self.clear_layer_content(id)?,
            Command::AddImage { mime, bytes } => {
                self.add_image(&mime, &bytes)?;
            }
            Command::Pointer { layer, event } => self.pointer(layer, event)?,
            Command::Undo => {
                self.undo();
            }
            Command::Redo => {
                self.redo();
            }
        }
        Ok(())
    }

    /// Handle queued surface mutations: thumbnails first, then one history capture
    pub fn process_surface_events(&mut self) {
        self.batch_depth += 1;
        self.drain_surface_events();
        self.batch_depth -= 1;
        self.finish_batch();
    }

    fn finish_batch(&mut self) {
        if self.batch_depth == 0 && std::mem::take(&mut self.capture_requested) {
            self.capture_snapshot();
        }
    }

    fn drain_surface_events(&mut self) {
        loop {
            let events = self.surface_events.drain();
            if events.is_empty() {
                break;
            }

            let mut touched: Vec<LayerId> = Vec::new();
            for (layer, event) in events {
                if self.layer(layer).is_none() {
                    log::debug!("Dropping {:?} from removed {}", event, layer);
                    continue;
                }
                if let SurfaceEvent::PathCreated(path) = event {
                    touched.extend(self.on_path_created(layer, path));
                }
                touched.push(layer);
                self.save_state();
            }

            touched.sort_unstable();
            touched.dedup();
            for layer in touched {
                self.refresh_thumbnail(layer);
            }
        }
    }

    /// Finish a free-drawn path; eraser strokes either stay as cut-outs or run the smart eraser
    fn on_path_created(&mut self, layer: LayerId, path: ObjectId) -> Vec<LayerId> {
        if self.tools.tool() != ToolKind::Eraser {
            return Vec::new();
        }
        let Ok(index) = self.index_of(layer) else {
            return Vec::new();
        };
        let Some(surface) = self.layers[index].surface_mut() else {
            return Vec::new();
        };
        if let Some(object) = surface.object_mut(path) {
            object.composite = CompositeOp::DestinationOut;
        }
        if self.tools.brush().eraser_mode != EraserMode::Smart {
            return Vec::new();
        }

        let Some(stroke) = surface.remove_object(path) else {
            return Vec::new();
        };
        let touched = eraser::apply_to_layers(&mut self.layers, &stroke);
        log::debug!("Smart eraser touched {} layers", touched.len());
        touched
    }
}
