#![warn(clippy::all, rust_2018_idioms)]

pub mod command;
pub mod config;
pub mod element;
pub mod eraser;
pub mod error;
pub mod event;
pub mod export;
pub mod id_generator;
pub mod imaging;
pub mod interaction;
pub mod layer;
#[cfg(feature = "server")]
pub mod server;
pub mod state;
pub mod surface;
pub mod tool;
pub mod util;

pub use command::{Command, History, HistorySnapshot, ReorderDirection};
pub use config::EditorConfig;
pub use element::{CanvasObject, ObjectId};
pub use error::{EditorError, EditorResult};
pub use event::{EditorEvent, EventHandler, LayerEvent};
pub use export::{ExportFormat, ExportOptions, Workspace, export_workspace};
pub use layer::{Layer, LayerId};
pub use state::CanvasStore;
pub use surface::{CanvasHandle, DrawingSurface, PointerEvent, SceneSurfaceFactory, SurfaceFactory};
pub use tool::{EraserMode, ToolKind};
