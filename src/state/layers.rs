use crate::command::ReorderDirection;
use crate::element::ObjectId;
use crate::error::{EditorError, EditorResult};
use crate::event::{EditorEvent, LayerEvent};
use crate::imaging::{create_image_object, validate_upload};
use crate::layer::{Layer, LayerId};
use crate::surface::{CanvasHandle, offset_scene_objects};
use crate::tool::ToolKind;

use super::CanvasStore;

impl CanvasStore {
    /// Append a new unmounted layer on top and select it
    pub fn add_layer(&mut self, name: impl Into<String>, skip_history: bool) -> LayerId {
        let id = LayerId(self.layer_ids.generate());
        let layer = Layer::new(id, name);
        log::debug!("Adding {} ({})", id, layer.name);
        self.layers.push(layer);
        self.emit(EditorEvent::LayerChanged(LayerEvent::Added {
            id,
            index: self.layers.len() - 1,
        }));

        self.set_selected(Some(id));
        self.regate();
        if !skip_history {
            self.save_state();
        }
        id
    }

    /// Copy the selected layer's content, shifted by the duplicate offset, into a new layer above it.
    ///
    /// Returns `None` when the selected layer has no surface yet.
    pub fn duplicate_active_layer(&mut self) -> EditorResult<Option<LayerId>> {
        let Some(selected) = self.selected else {
            return Ok(None);
        };
        let index = self.index_of(selected)?;
        let source = &self.layers[index];
        if !source.is_mounted() {
            log::debug!("Not duplicating {}: no surface yet", selected);
            return Ok(None);
        }

        let mut content = source.content().unwrap_or_default();
        let offset = self.config.duplicate_offset;
        offset_scene_objects(&mut content, offset, offset);

        let id = LayerId(self.layer_ids.generate());
        let layer = Layer::new(id, format!("{} copy", source.name)).with_pending(Some(content));
        log::debug!("Duplicating {} into {}", selected, id);
        self.layers.insert(index + 1, layer);
        self.emit(EditorEvent::LayerChanged(LayerEvent::Added { id, index: index + 1 }));

        self.select_layer(id)?;
        self.save_state();
        Ok(Some(id))
    }

    /// Dispose and remove a layer; the last remaining layer can never be removed
    pub fn remove_layer(&mut self, id: LayerId) -> EditorResult<()> {
        if self.layers.len() <= 1 {
            return Err(self.reject(EditorError::LastLayer));
        }
        let index = self.index_of(id)?;

        let mut layer = self.layers.remove(index);
        layer.dispose_surface();
        self.surface_events.discard_for(id);
        self.thumbnail_refs.remove(&id);
        self.thumbnails.remove(&id);
        if self.tools.wired_layer() == Some(id) {
            self.tools.reset();
        }
        log::debug!("Removed {} at index {}", id, index);
        self.emit(EditorEvent::LayerChanged(LayerEvent::Removed { id, index }));

        if self.selected == Some(id) {
            let fallback = self.layers[index.saturating_sub(1)].id;
            self.set_selected(Some(fallback));
        }
        self.regate();
        self.save_state();
        Ok(())
    }

    /// Move a layer in the stacking order; returns whether the order changed
    pub fn reorder_layer(&mut self, id: LayerId, direction: ReorderDirection) -> EditorResult<bool> {
        let index = self.index_of(id)?;
        let last = self.layers.len() - 1;

        let new_index = match direction {
            ReorderDirection::Up if index < last => {
                self.layers.swap(index, index + 1);
                index + 1
            }
            ReorderDirection::Down if index > 0 => {
                self.layers.swap(index, index - 1);
                index - 1
            }
            ReorderDirection::Top if index < last => {
                let layer = self.layers.remove(index);
                self.layers.push(layer);
                last
            }
            ReorderDirection::Bottom if index > 0 => {
                let layer = self.layers.remove(index);
                self.layers.insert(0, layer);
                0
            }
            _ => {
                log::debug!("{} already at the {:?} boundary", id, direction);
                return Ok(false);
            }
        };

        self.emit(EditorEvent::LayerChanged(LayerEvent::Reordered {
            id,
            old_index: index,
            new_index,
        }));
        self.regate();
        self.save_state();
        Ok(true)
    }

    /// Returns the new visibility
    pub fn toggle_layer_visibility(&mut self, id: LayerId) -> EditorResult<bool> {
        let index = self.index_of(id)?;
        let layer = &mut self.layers[index];
        layer.visible = !layer.visible;
        let visible = layer.visible;
        self.emit(EditorEvent::LayerChanged(LayerEvent::VisibilityChanged { id, visible }));
        self.save_state();
        Ok(visible)
    }

    pub fn select_layer(&mut self, id: LayerId) -> EditorResult<()> {
        self.index_of(id)?;
        log::debug!("Selecting {}", id);
        self.set_selected(Some(id));
        self.regate();
        Ok(())
    }

    /// Bind a physical canvas to a layer, creating its surface on first use.
    ///
    /// Later calls only refresh the handle and, for the selected layer,
    /// re-apply the active tool.
    pub fn register_surface(&mut self, id: LayerId, canvas: CanvasHandle) -> EditorResult<()> {
        let index = self.index_of(id)?;

        if self.layers[index].is_mounted() {
            let layer = &mut self.layers[index];
            if layer.canvas.as_ref() != Some(&canvas) {
                log::info!("Re-linking {} to canvas {}", id, canvas.0);
                layer.canvas = Some(canvas);
            }
            self.refresh_thumbnail(id);
            if self.selected == Some(id) {
                self.apply_tool_to(id);
            }
            return Ok(());
        }

        let mut surface = self
            .factory
            .create(&canvas, self.config.surface_options())
            .map_err(|err| self.reject(err.into()))?;
        log::info!("Created surface for {} on canvas {}", id, canvas.0);
        surface.subscribe(self.surface_events.listener_for(id));

        let generation = self.generations.generate();
        let load = self.layers[index]
            .pending()
            .cloned()
            .map(|content| surface.deserialize(content));

        let layer = &mut self.layers[index];
        layer.surface = Some(surface);
        layer.canvas = Some(canvas);
        layer.generation = generation;
        self.emit(EditorEvent::LayerChanged(LayerEvent::SurfaceMounted { id }));

        match load {
            Some(future) => {
                log::debug!("Loading pending content into {}", id);
                self.track_load(id, generation, future);
            }
            None => self.refresh_thumbnail(id),
        }

        self.regate();
        Ok(())
    }

    /// Remove every object from a layer with a single history capture.
    ///
    /// Content still waiting to load is dropped as well, so a late load
    /// cannot bring it back.
    pub fn clear_layer_content(&mut self, id: LayerId) -> EditorResult<()> {
        let index = self.index_of(id)?;
        self.process_surface_events();

        let layer = &mut self.layers[index];
        let was_loading = layer.is_loading();
        if layer.pending.take().is_some() && layer.is_mounted() {
            layer.generation = self.generations.generate();
            log::debug!("Dropped in-flight load for {}", id);
        }

        if let Some(surface) = self.layers[index].surface_mut() {
            let count = surface.objects().len();
            surface.clear();
            surface.request_render();
            // Individual removals must not each capture a snapshot
            self.surface_events.discard_for(id);
            log::debug!("Cleared {} ({} objects)", id, count);
            self.refresh_thumbnail(id);
        }
        if was_loading {
            self.regate();
        }
        self.save_state();
        Ok(())
    }

    /// Decode an image onto the selected layer, centred and scaled to fit, then switch to `select`
    pub fn add_image(&mut self, mime: &str, bytes: &[u8]) -> EditorResult<ObjectId> {
        let Some(index) = self
            .selected
            .and_then(|id| self.layers.iter().position(|layer| layer.id == id))
            .filter(|index| self.layers[*index].is_mounted())
        else {
            return Err(self.reject(EditorError::NoActiveSurface));
        };
        if self.layers[index].is_loading() {
            let id = self.layers[index].id;
            return Err(self.reject(EditorError::LayerLoading(id)));
        }
        validate_upload(mime, bytes).map_err(|err| self.reject(err.into()))?;

        let layer = &self.layers[index];
        let size = layer.surface().map(|surface| surface.size()).unwrap_or_default();
        let object = create_image_object(bytes, size.x, size.y).map_err(|err| self.reject(err.into()))?;

        let id = self.layers[index].id;
        let Some(surface) = self.layers[index].surface_mut() else {
            return Err(EditorError::NoActiveSurface);
        };
        let object_id = surface.add_object(object);
        surface.set_active_object(Some(object_id));

        self.set_tool(ToolKind::Select);
        if let Some(surface) = self.layers[index].surface_mut() {
            surface.request_render();
        }
        self.refresh_thumbnail(id);
        self.save_state();
        Ok(object_id)
    }
}
