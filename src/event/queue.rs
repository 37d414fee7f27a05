use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::layer::LayerId;
use crate::surface::{SurfaceEvent, SurfaceListener};

/// Collects mutation events from every surface until the store drains them.
///
/// Surfaces fire synchronously from inside store operations, so listeners only
/// enqueue; all reactions run once the operation has finished.
#[derive(Debug, Clone, Default)]
pub struct SurfaceEventQueue {
    inner: Arc<Mutex<VecDeque<(LayerId, SurfaceEvent)>>>,
}

impl SurfaceEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener to subscribe on the surface owned by `layer`
    pub fn listener_for(&self, layer: LayerId) -> SurfaceListener {
        let inner = Arc::clone(&self.inner);
        Box::new(move |event| inner.lock().push_back((layer, event)))
    }

    pub fn drain(&self) -> Vec<(LayerId, SurfaceEvent)> {
        self.inner.lock().drain(..).collect()
    }

    /// Drop queued events of one layer, keeping the rest in order
    pub fn discard_for(&self, layer: LayerId) -> usize {
        let mut queue = self.inner.lock();
        let before = queue.len();
        queue.retain(|(owner, _)| *owner != layer);
        before - queue.len()
    }

    /// Drop one queued event; returns whether it was queued
    pub fn discard(&self, layer: LayerId, event: SurfaceEvent) -> bool {
        let mut queue = self.inner.lock();
        match queue.iter().position(|queued| *queued == (layer, event)) {
            Some(index) => queue.remove(index).is_some(),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ObjectId;

    #[test]
    fn test_discard_keeps_other_layers() {
        let queue = SurfaceEventQueue::new();
        let mut a = queue.listener_for(LayerId(1));
        let mut b = queue.listener_for(LayerId(2));
        a(SurfaceEvent::ObjectRemoved(ObjectId(1)));
        b(SurfaceEvent::PathCreated(ObjectId(2)));
        a(SurfaceEvent::ObjectRemoved(ObjectId(3)));

        assert_eq!(queue.discard_for(LayerId(1)), 2);
        assert_eq!(queue.drain(), vec![(LayerId(2), SurfaceEvent::PathCreated(ObjectId(2)))]);
        assert!(queue.is_empty());
    }
}
