use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::layer::{Layer, LayerId};

/// Serialized state of one layer inside a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerState {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    /// `None` for a layer that never had content
    pub canvas_data: Option<Value>,
}

/// Deep copy of the whole registry at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    pub layers: Vec<LayerState>,
    pub selected_id: Option<LayerId>,
}

impl HistorySnapshot {
    /// Serializes every layer; layers still loading contribute their pending data
    pub fn capture(layers: &[Layer], selected_id: Option<LayerId>) -> Self {
        Self {
            layers: layers
                .iter()
                .map(|layer| LayerState {
                    id: layer.id,
                    name: layer.name.clone(),
                    visible: layer.visible,
                    canvas_data: layer.content(),
                })
                .collect(),
            selected_id,
        }
    }
}

/// Bounded linear undo/redo stack of snapshots.
///
/// The cursor always points at the snapshot matching the live state.
/// Recording while the cursor is not at the tail discards everything after it.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<HistorySnapshot>,
    cursor: usize,
    max_depth: usize,
    /// Set while a snapshot is being replayed; recording is suppressed
    replaying: bool,
}

impl Default for History {
    fn default() -> Self {
        Self::new(20)
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            cursor: 0,
            max_depth: max_depth.max(1),
            replaying: false,
        }
    }

    /// Append a snapshot; returns `false` if suppressed by a replay
    pub fn record(&mut self, snapshot: HistorySnapshot) -> bool {
        if self.replaying {
            return false;
        }
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.max_depth {
            self.snapshots.remove(0);
        }
        self.cursor = self.snapshots.len() - 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.snapshots.is_empty() && self.cursor < self.snapshots.len() - 1
    }

    /// Move the cursor back and return the snapshot to restore
    pub fn step_back(&mut self) -> Option<HistorySnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.snapshots.get(self.cursor).cloned()
    }

    /// Move the cursor forward and return the snapshot to restore
    pub fn step_forward(&mut self) -> Option<HistorySnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.snapshots.get(self.cursor).cloned()
    }

    pub fn begin_replay(&mut self) {
        self.replaying = true;
    }

    pub fn end_replay(&mut self) {
        self.replaying = false;
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Cursor position, `None` before the first snapshot
    pub fn index(&self) -> Option<usize> {
        (!self.snapshots.is_empty()).then_some(self.cursor)
    }

    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.snapshots.get(self.cursor)
    }

    pub fn snapshots(&self) -> &[HistorySnapshot] {
        &self.snapshots
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(n: u64) -> HistorySnapshot {
        HistorySnapshot {
            layers: vec![LayerState {
                id: LayerId(n),
                name: format!("Layer {n}"),
                visible: true,
                canvas_data: None,
            }],
            selected_id: Some(LayerId(n)),
        }
    }

    #[test]
    fn test_undo_redo_walks_the_stack() {
        let mut history = History::new(20);
        assert!(!history.can_undo());
        for n in 1..=3 {
            history.record(snapshot(n));
        }
        assert_eq!(history.step_back(), Some(snapshot(2)));
        assert_eq!(history.step_back(), Some(snapshot(1)));
        assert_eq!(history.step_back(), None);
        assert_eq!(history.step_forward(), Some(snapshot(2)));
        assert_eq!(history.index(), Some(1));
    }

    #[test]
    fn test_recording_after_undo_discards_the_future() {
        let mut history = History::new(20);
        for n in 1..=3 {
            history.record(snapshot(n));
        }
        history.step_back();
        history.step_back();
        history.record(snapshot(4));
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.step_forward(), None);
        assert_eq!(history.current(), Some(&snapshot(4)));
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut history = History::new(20);
        for n in 0..45 {
            history.record(snapshot(n));
            assert!(history.len() <= 20);
        }
        assert_eq!(history.index(), Some(19));
        assert_eq!(history.snapshots()[0], snapshot(25));
    }

    #[test]
    fn test_replay_suppresses_recording() {
        let mut history = History::new(20);
        history.record(snapshot(1));
        history.begin_replay();
        assert!(!history.record(snapshot(2)));
        history.end_replay();
        assert!(history.record(snapshot(2)));
        assert_eq!(history.len(), 2);
    }
}
