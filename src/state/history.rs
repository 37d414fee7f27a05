use crate::command::HistorySnapshot;
use crate::event::EditorEvent;
use crate::layer::Layer;

use super::CanvasStore;

impl CanvasStore {
    /// Capture the registry into the history.
    ///
    /// Suppressed while replaying; inside a command the capture is deferred
    /// until the command finishes, so each command records at most once.
    pub fn save_state(&mut self) {
        if self.history.is_replaying() {
            log::debug!("Skipping snapshot during replay");
            return;
        }
        if self.batch_depth > 0 {
            self.capture_requested = true;
            return;
        }
        self.capture_snapshot();
    }

    pub(super) fn capture_snapshot(&mut self) {
        let snapshot = HistorySnapshot::capture(&self.layers, self.selected);
        if self.history.record(snapshot) {
            log::debug!(
                "Saved snapshot {}/{}",
                self.history.index().map_or(0, |index| index + 1),
                self.history.len()
            );
            self.emit_history_changed();
        }
    }

    fn emit_history_changed(&self) {
        self.emit(EditorEvent::HistoryChanged {
            index: self.history.index().unwrap_or(0),
            len: self.history.len(),
        });
    }

    /// Step back one snapshot; returns whether anything was restored
    pub fn undo(&mut self) -> bool {
        if self.history.is_replaying() || !self.history.can_undo() {
            return false;
        }
        self.history.begin_replay();
        if let Some(snapshot) = self.history.step_back() {
            self.load_state(snapshot);
        }
        self.history.end_replay();
        self.emit_history_changed();
        true
    }

    /// Step forward one snapshot; returns whether anything was restored
    pub fn redo(&mut self) -> bool {
        if self.history.is_replaying() || !self.history.can_redo() {
            return false;
        }
        self.history.begin_replay();
        if let Some(snapshot) = self.history.step_forward() {
            self.load_state(snapshot);
        }
        self.history.end_replay();
        self.emit_history_changed();
        true
    }

    /// Replace the registry with a snapshot.
    ///
    /// Every surface is disposed; restored layers come back unmounted with
    /// their content pending until the UI binds canvases again. A snapshot
    /// without layers is ignored, since the registry never goes empty.
    pub fn load_state(&mut self, snapshot: HistorySnapshot) {
        if snapshot.layers.is_empty() {
            log::warn!("Ignoring snapshot without layers");
            return;
        }
        log::debug!("Loading snapshot with {} layers", snapshot.layers.len());
        for layer in &mut self.layers {
            layer.dispose_surface();
        }
        // Events from disposed surfaces are meaningless now
        self.surface_events.drain();
        self.tools.reset();

        self.layers = snapshot
            .layers
            .into_iter()
            .map(|state| {
                self.layer_ids.observe(state.id.0);
                let mut layer = Layer::new(state.id, state.name).with_pending(state.canvas_data);
                layer.visible = state.visible;
                layer
            })
            .collect();

        let layers = &self.layers;
        self.thumbnails.retain(|id, _| layers.iter().any(|layer| layer.id == *id));
        self.thumbnail_refs.retain(|id| layers.iter().any(|layer| layer.id == *id));

        let selected = snapshot
            .selected_id
            .filter(|id| self.layers.iter().any(|layer| layer.id == *id))
            .or_else(|| self.layers.last().map(|layer| layer.id));
        self.set_selected(selected);
    }
}
