//! The canvas store: layer registry, tool state and undo history.
//!
//! `CanvasStore` is the single source of truth the UI observes. Every public
//! mutation runs to completion before the next one starts; surface mutation
//! events are queued while an operation runs and handled once it finishes.
//!
//! # Example
//!
//! ```rust,no_run
//! use canvas_studio::config::EditorConfig;
//! use canvas_studio::state::CanvasStore;
//! use canvas_studio::surface::{CanvasHandle, SceneSurfaceFactory};
//!
//! let mut store = CanvasStore::new(EditorConfig::default(), Box::new(SceneSurfaceFactory::new()));
//! store.init_first_layer();
//! let id = store.layers()[0].id;
//! store.register_surface(id, CanvasHandle(1)).unwrap();
//! ```

use std::collections::{HashMap, HashSet, VecDeque};

use image::RgbaImage;

use crate::command::{Command, History};
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::event::{EditorEvent, EventBus, EventHandler, SurfaceEventQueue};
use crate::id_generator::IdGenerator;
use crate::interaction::update_layer_interactions;
use crate::layer::{Layer, LayerId};
use crate::surface::{SurfaceEvent, SurfaceFactory};
use crate::tool::{BrushSettings, ToolController, ToolKind};

mod commands;
mod history;
mod layers;
mod loading;
mod thumbnails;
mod tools;

use loading::PendingLoad;

pub struct CanvasStore {
    config: EditorConfig,
    factory: Box<dyn SurfaceFactory>,
    /// Bottom-to-top stacking order
    layers: Vec<Layer>,
    selected: Option<LayerId>,
    layer_ids: IdGenerator,
    /// Source of surface generations, so stale loads can be recognised
    generations: IdGenerator,
    tools: ToolController,
    history: History,
    surface_events: SurfaceEventQueue,
    events: EventBus,
    commands: VecDeque<Command>,
    loads: Vec<PendingLoad>,
    thumbnail_refs: HashSet<LayerId>,
    thumbnails: HashMap<LayerId, RgbaImage>,
    /// Nesting depth of operations that coalesce history captures
    batch_depth: usize,
    capture_requested: bool,
}

impl std::fmt::Debug for CanvasStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasStore")
            .field("layers", &self.layers)
            .field("selected", &self.selected)
            .field("tool", &self.tools.tool())
            .field("history", &self.history.index())
            .field("loads", &self.loads.len())
            .finish_non_exhaustive()
    }
}

impl CanvasStore {
    pub fn new(config: EditorConfig, factory: Box<dyn SurfaceFactory>) -> Self {
        let tools = ToolController::new(config.initial_tool, config.brush());
        let history = History::new(config.history_depth);
        Self {
            config,
            factory,
            layers: Vec::new(),
            selected: None,
            layer_ids: IdGenerator::new(),
            generations: IdGenerator::new(),
            tools,
            history,
            surface_events: SurfaceEventQueue::new(),
            events: EventBus::new(),
            commands: VecDeque::new(),
            loads: Vec::new(),
            thumbnail_refs: HashSet::new(),
            thumbnails: HashMap::new(),
            batch_depth: 0,
            capture_requested: false,
        }
    }

    /// Create "Layer 1" if the registry is empty, capturing the initial snapshot
    pub fn init_first_layer(&mut self) -> Option<LayerId> {
        if !self.layers.is_empty() {
            return None;
        }
        Some(self.add_layer("Layer 1", false))
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn selected_id(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.selected.and_then(|id| self.layer(id))
    }

    pub fn active_tool(&self) -> ToolKind {
        self.tools.tool()
    }

    pub fn brush(&self) -> &BrushSettings {
        self.tools.brush()
    }

    pub fn tool_controller(&self) -> &ToolController {
        &self.tools
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.events.subscribe(handler);
    }

    fn emit(&self, event: EditorEvent) {
        self.events.emit(event);
    }

    /// Surface a rejected action to the user and hand the error back
    fn reject(&self, error: EditorError) -> EditorError {
        log::warn!("{}", error);
        self.emit(EditorEvent::Notice(error.to_string()));
        error
    }

    fn index_of(&self, id: LayerId) -> EditorResult<usize> {
        self.layers
            .iter()
            .position(|layer| layer.id == id)
            .ok_or(EditorError::LayerNotFound(id))
    }

    fn set_selected(&mut self, id: Option<LayerId>) {
        let old = std::mem::replace(&mut self.selected, id);
        if old != id {
            self.emit(EditorEvent::SelectionChanged { old, new: id });
        }
    }

    /// Gating pass followed by re-applying the tool to the selected surface
    fn regate(&mut self) {
        update_layer_interactions(&mut self.layers, self.selected);
        if let Some(selected) = self.selected {
            self.apply_tool_to(selected);
        }
    }

    /// Apply the active tool to `target`. A shape left unfinished by the
    /// switch was never part of the content, so its removal is not recorded.
    fn apply_tool_to(&mut self, target: LayerId) {
        if let Some((layer, shape)) = self.tools.apply(&mut self.layers, target) {
            self.surface_events.discard(layer, SurfaceEvent::ObjectRemoved(shape));
        }
    }
}
