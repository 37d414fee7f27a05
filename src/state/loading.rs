use futures::FutureExt;
use futures::future::{LocalBoxFuture, join_all};

use crate::error::SurfaceError;
use crate::event::{EditorEvent, LayerEvent};
use crate::layer::LayerId;
use crate::surface::SceneDocument;

use super::CanvasStore;

/// Content load into one surface instance, identified by its generation
pub(super) struct PendingLoad {
    layer: LayerId,
    generation: u64,
    future: LocalBoxFuture<'static, Result<SceneDocument, SurfaceError>>,
}

impl CanvasStore {
    pub(super) fn track_load(
        &mut self,
        layer: LayerId,
        generation: u64,
        future: LocalBoxFuture<'static, Result<SceneDocument, SurfaceError>>,
    ) {
        self.loads.push(PendingLoad { layer, generation, future });
    }

    pub fn has_pending_loads(&self) -> bool {
        !self.loads.is_empty()
    }

    /// Apply every load that is already complete, without blocking.
    ///
    /// Returns how many loads were applied.
    pub fn poll_loads(&mut self) -> usize {
        let mut applied = 0;
        for mut load in std::mem::take(&mut self.loads) {
            let ready = load.future.as_mut().now_or_never();
            match ready {
                Some(result) => {
                    if self.finish_load(load.layer, load.generation, result) {
                        applied += 1;
                    }
                }
                None => self.loads.push(load),
            }
        }
        applied
    }

    /// Wait for every in-flight load and apply those whose target still exists
    pub async fn settle_loads(&mut self) -> usize {
        let (targets, futures): (Vec<_>, Vec<_>) = std::mem::take(&mut self.loads)
            .into_iter()
            .map(|load| ((load.layer, load.generation), load.future))
            .unzip();
        let results = join_all(futures).await;

        let mut applied = 0;
        for ((layer, generation), result) in targets.into_iter().zip(results) {
            if self.finish_load(layer, generation, result) {
                applied += 1;
            }
        }
        applied
    }

    /// Apply a completed load if its layer still owns the same surface
    fn finish_load(
        &mut self,
        id: LayerId,
        generation: u64,
        result: Result<SceneDocument, SurfaceError>,
    ) -> bool {
        let Some(index) = self
            .layers
            .iter()
            .position(|layer| layer.id == id && layer.is_mounted() && layer.generation == generation)
        else {
            log::debug!("Discarding stale load for {}", id);
            return false;
        };

        let scene = match result {
            Ok(scene) => scene,
            Err(err) => {
                log::error!("Failed to load content into {}: {}", id, err);
                self.emit(EditorEvent::Notice(format!("Failed to load layer content: {err}")));
                return false;
            }
        };

        let layer = &mut self.layers[index];
        let Some(surface) = layer.surface_mut() else {
            return false;
        };
        surface.apply_scene(scene);
        surface.request_render();
        layer.pending = None;
        log::debug!("Loaded pending content into {}", id);

        self.regate();
        self.refresh_thumbnail(id);
        self.emit(EditorEvent::LayerChanged(LayerEvent::ContentLoaded { id }));
        true
    }
}
