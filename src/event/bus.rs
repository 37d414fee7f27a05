use std::cell::RefCell;

use crate::event::{EditorEvent, EventHandler};

/// Broadcasts editor events to registered handlers
pub struct EventBus {
    handlers: RefCell<Vec<Box<dyn EventHandler>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.handlers.borrow().len()))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self { handlers: RefCell::new(Vec::new()) }
    }

    /// Subscribe a handler to receive events
    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.handlers.borrow_mut().push(handler);
    }

    /// Emit an event to all registered handlers.
    ///
    /// Handlers must not emit on the same bus while handling an event.
    pub fn emit(&self, event: EditorEvent) {
        log::trace!("Emitting {:?}", event);
        let Ok(mut handlers) = self.handlers.try_borrow_mut() else {
            log::warn!("Dropped re-entrant event {:?}", event);
            return;
        };
        for handler in handlers.iter_mut() {
            handler.handle_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    struct Recorder(Arc<Mutex<Vec<EditorEvent>>>);

    impl EventHandler for Recorder {
        fn handle_event(&mut self, event: &EditorEvent) {
            self.0.lock().push(event.clone());
        }
    }

    #[test]
    fn test_every_handler_sees_every_event() {
        let bus = EventBus::new();
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(Box::new(Recorder(Arc::clone(&first))));
        bus.subscribe(Box::new(Recorder(Arc::clone(&second))));

        bus.emit(EditorEvent::Notice("hello".into()));
        bus.emit(EditorEvent::HistoryChanged { index: 0, len: 1 });

        assert_eq!(first.lock().len(), 2);
        assert_eq!(*first.lock(), *second.lock());
    }
}
