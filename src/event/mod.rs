mod bus;
mod events;
mod queue;

pub use bus::EventBus;
pub use events::{EditorEvent, LayerEvent};
pub use queue::SurfaceEventQueue;

pub trait EventHandler: Send {
    fn handle_event(&mut self, event: &EditorEvent);
}
