use crate::layer::LayerId;
use crate::tool::{BrushSettings, ToolKind};

#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
    Added { id: LayerId, index: usize },
    Removed { id: LayerId, index: usize },
    Reordered { id: LayerId, old_index: usize, new_index: usize },
    VisibilityChanged { id: LayerId, visible: bool },
    /// A drawing surface was created for the layer
    SurfaceMounted { id: LayerId },
    /// Pending content finished loading into the layer's surface
    ContentLoaded { id: LayerId },
    ThumbnailUpdated { id: LayerId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    LayerChanged(LayerEvent),
    SelectionChanged {
        old: Option<LayerId>,
        new: Option<LayerId>,
    },
    ToolChanged {
        old: ToolKind,
        new: ToolKind,
    },
    BrushChanged(BrushSettings),
    HistoryChanged {
        index: usize,
        len: usize,
    },
    /// User-visible message for a rejected or failed action
    Notice(String),
}
