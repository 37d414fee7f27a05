use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::surface::{CanvasHandle, DrawingSurface};

/// Opaque layer identifier; larger ids were created later
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer_{}", self.0)
    }
}

/// One stacked drawing plane.
///
/// The surface is attached lazily once the UI binds a physical canvas, and
/// is exclusively owned by this layer until it is disposed.
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    /// Physical canvas the UI last bound to this layer
    pub(crate) canvas: Option<CanvasHandle>,
    pub(crate) surface: Option<Box<dyn DrawingSurface>>,
    /// Serialized content waiting for the surface to mount
    pub(crate) pending: Option<Value>,
    /// Identifies the current surface instance, so stale async loads can be discarded
    pub(crate) generation: u64,
}

impl Layer {
    pub fn new(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            canvas: None,
            surface: None,
            pending: None,
            generation: 0,
        }
    }

    pub fn with_pending(mut self, content: Option<Value>) -> Self {
        self.pending = content;
        self
    }

    pub fn surface(&self) -> Option<&dyn DrawingSurface> {
        self.surface.as_deref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut (dyn DrawingSurface + 'static)> {
        self.surface.as_deref_mut()
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    /// Mounted, with pending content that has not reached the surface yet
    pub fn is_loading(&self) -> bool {
        self.surface.is_some() && self.pending.is_some()
    }

    pub fn canvas(&self) -> Option<&CanvasHandle> {
        self.canvas.as_ref()
    }

    pub fn pending(&self) -> Option<&Value> {
        self.pending.as_ref()
    }

    /// Current content: in-flight pending data wins over a surface that has not loaded it yet
    pub fn content(&self) -> Option<Value> {
        match (&self.pending, &self.surface) {
            (Some(pending), _) => Some(pending.clone()),
            (None, Some(surface)) => Some(surface.serialize()),
            (None, None) => None,
        }
    }

    /// Release the surface and every listener it holds
    pub(crate) fn dispose_surface(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.dispose();
        }
        self.canvas = None;
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("visible", &self.visible)
            .field("mounted", &self.is_mounted())
            .field("pending", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}
