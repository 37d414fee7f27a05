use image::RgbaImage;
use image::imageops;

use crate::event::{EditorEvent, LayerEvent};
use crate::layer::LayerId;

use super::CanvasStore;

impl CanvasStore {
    /// Register interest in a layer's thumbnail and render it right away if possible
    pub fn set_thumbnail_ref(&mut self, id: LayerId) {
        if self.layer(id).is_none() {
            log::debug!("Ignoring thumbnail for unknown {}", id);
            return;
        }
        self.thumbnail_refs.insert(id);
        self.refresh_thumbnail(id);
    }

    pub fn thumbnail(&self, id: LayerId) -> Option<&RgbaImage> {
        self.thumbnails.get(&id)
    }

    pub(crate) fn refresh_thumbnail(&mut self, id: LayerId) {
        if !self.thumbnail_refs.contains(&id) {
            return;
        }
        let Some(surface) = self.layer(id).and_then(|layer| layer.surface()) else {
            return;
        };
        let size = self.config.thumbnail_size;
        let raster = surface.rasterize(1.0);
        self.thumbnails.insert(id, imageops::thumbnail(&raster, size, size));
        self.emit(EditorEvent::LayerChanged(LayerEvent::ThumbnailUpdated { id }));
    }
}
