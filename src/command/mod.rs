mod history;

use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::layer::LayerId;
use crate::surface::PointerEvent;
use crate::tool::{EraserMode, ToolKind};

pub use history::{History, HistorySnapshot, LayerState};

/// Where `ReorderLayer` moves a layer in the stacking order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderDirection {
    /// Swap with the layer above
    Up,
    /// Swap with the layer below
    Down,
    /// Move to the end of the sequence, the highest stacking position
    Top,
    /// Move to the start of the sequence
    Bottom,
}

/// One user action, applied atomically by the canvas store
#[derive(Debug, Clone)]
pub enum Command {
    AddLayer { name: String },
    DuplicateActiveLayer,
    RemoveLayer(LayerId),
    ReorderLayer { id: LayerId, direction: ReorderDirection },
    ToggleVisibility(LayerId),
    SelectLayer(LayerId),
    SetTool(ToolKind),
    UpdateBrush { size: f32, color: Color32 },
    SetEraserMode(EraserMode),
    ClearLayer(LayerId),
    AddImage { mime: String, bytes: Vec<u8> },
    Pointer { layer: LayerId, event: PointerEvent },
    Undo,
    Redo,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddLayer { .. } => "add-layer",
            Self::DuplicateActiveLayer => "duplicate-layer",
            Self::RemoveLayer(_) => "remove-layer",
            Self::ReorderLayer { .. } => "reorder-layer",
            Self::ToggleVisibility(_) => "toggle-visibility",
            Self::SelectLayer(_) => "select-layer",
            Self::SetTool(_) => "set-tool",
            Self::UpdateBrush { .. } => "update-brush",
            Self::SetEraserMode(_) => "set-eraser-mode",
            Self::ClearLayer(_) => "clear-layer",
            Self::AddImage { .. } => "add-image",
            Self::Pointer { .. } => "pointer",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}
