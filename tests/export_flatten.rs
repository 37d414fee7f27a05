use canvas_studio::command::Command;
use canvas_studio::config::EditorConfig;
use canvas_studio::export::{ExportError, ExportFormat, ExportOptions, Workspace, export_workspace};
use canvas_studio::imaging::decode_image;
use canvas_studio::state::CanvasStore;
use canvas_studio::surface::{CanvasHandle, PointerEvent, SceneSurfaceFactory};
use canvas_studio::tool::ToolKind;
use egui::Color32;

#[test]
fn test_export_editor_workspace() {
    let config = EditorConfig { canvas_width: 200.0, canvas_height: 100.0, ..Default::default() };
    let mut store = CanvasStore::new(config, Box::new(SceneSurfaceFactory::new()));
    let layer = store.init_first_layer().unwrap();
    store.register_surface(layer, CanvasHandle(1)).unwrap();

    store.update_brush_settings(20.0, Color32::RED);
    store.set_tool(ToolKind::Brush);
    for event in [PointerEvent::down(10.0, 50.0), PointerEvent::moved(100.0, 50.0), PointerEvent::up(190.0, 50.0)] {
        store.dispatch(Command::Pointer { layer, event }).unwrap();
    }

    let options = ExportOptions { dpi: 2.0, ..ExportOptions::new(200.0, 100.0) };
    let file = export_workspace(
        Some(Workspace::Editor { layers: store.layers(), options }),
        ExportFormat::Png,
    )
    .unwrap();
    assert!(file.file_name.ends_with(".png"));

    let image = decode_image(&file.bytes).unwrap();
    assert_eq!(image.dimensions(), (400, 200));
    assert_eq!(image.get_pixel(200, 100)[0], 255);
    assert_eq!(image.get_pixel(200, 10)[3], 0);
}

#[test]
fn test_export_hidden_layers_are_skipped() {
    let mut store = CanvasStore::new(EditorConfig::default(), Box::new(SceneSurfaceFactory::new()));
    let layer = store.init_first_layer().unwrap();
    store.register_surface(layer, CanvasHandle(1)).unwrap();
    for event in [PointerEvent::down(0.0, 0.0), PointerEvent::up(800.0, 600.0)] {
        store.dispatch(Command::Pointer { layer, event }).unwrap();
    }
    store.toggle_layer_visibility(layer).unwrap();

    let file = export_workspace(
        Some(Workspace::Editor { layers: store.layers(), options: ExportOptions::new(800.0, 600.0) }),
        ExportFormat::Webp,
    )
    .unwrap();
    let image = decode_image(&file.bytes).unwrap();
    assert!(image.pixels().all(|pixel| pixel[3] == 0));
}

#[test]
fn test_export_requires_workspace() {
    assert!(matches!(export_workspace(None, ExportFormat::Png), Err(ExportError::NotReady)));
}
