use canvas_studio::command::Command;
use canvas_studio::config::EditorConfig;
use canvas_studio::element::{CompositeOp, Shape};
use canvas_studio::error::EditorError;
use canvas_studio::imaging::{ImagingError, encode_png};
use canvas_studio::layer::LayerId;
use canvas_studio::state::CanvasStore;
use canvas_studio::surface::{CanvasHandle, Cursor, FreeDrawBrush, PointerEvent, SceneSurfaceFactory};
use canvas_studio::tool::{EraserMode, ToolKind};
use egui::{Color32, Pos2};
use image::{Rgba, RgbaImage};

fn mounted_store() -> (CanvasStore, LayerId) {
    let mut store = CanvasStore::new(EditorConfig::default(), Box::new(SceneSurfaceFactory::new()));
    let id = store.init_first_layer().unwrap();
    store.register_surface(id, CanvasHandle(1)).unwrap();
    (store, id)
}

fn gesture(store: &mut CanvasStore, layer: LayerId, points: &[(f32, f32)]) {
    let last = points.len() - 1;
    for (index, &(x, y)) in points.iter().enumerate() {
        let event = match index {
            0 => PointerEvent::down(x, y),
            i if i == last => PointerEvent::up(x, y),
            _ => PointerEvent::moved(x, y),
        };
        store.dispatch(Command::Pointer { layer, event }).unwrap();
    }
}

#[test]
fn test_rectangle_tool_scenario() {
    let (mut store, layer) = mounted_store();
    store.dispatch(Command::SetTool(ToolKind::Rectangle)).unwrap();
    let surface = store.layer(layer).unwrap().surface().unwrap();
    assert_eq!(surface.flags().cursor, Cursor::Crosshair);
    assert!(!surface.flags().selection);

    gesture(&mut store, layer, &[(10.0, 10.0), (50.0, 80.0), (50.0, 80.0)]);

    let objects = store.layer(layer).unwrap().surface().unwrap().objects();
    assert_eq!(objects.len(), 1);
    let rect = &objects[0];
    assert_eq!(rect.left, 10.0);
    assert_eq!(rect.top, 10.0);
    assert!(matches!(rect.shape, Shape::Rect { width, height } if width == 40.0 && height == 70.0));
    assert!(rect.selectable);
    assert!(!store.tool_controller().gesture().is_drawing());
}

#[test]
fn test_circle_tool_scenario() {
    let (mut store, layer) = mounted_store();
    store.set_tool(ToolKind::Circle);
    gesture(&mut store, layer, &[(0.0, 0.0), (30.0, 40.0), (30.0, 40.0)]);

    let circle = &store.layer(layer).unwrap().surface().unwrap().objects()[0];
    assert!(matches!(circle.shape, Shape::Circle { radius } if radius == 25.0));
}

#[test]
fn test_shape_tool_follows_selection() {
    let (mut store, first) = mounted_store();
    store.set_tool(ToolKind::Rectangle);
    assert_eq!(store.tool_controller().wired_layer(), Some(first));

    let second = store.add_layer("Second", false);
    assert_eq!(store.tool_controller().wired_layer(), None);
    store.register_surface(second, CanvasHandle(2)).unwrap();
    assert_eq!(store.tool_controller().wired_layer(), Some(second));

    // The unselected layer is inert, so the gesture draws nothing there
    gesture(&mut store, first, &[(0.0, 0.0), (20.0, 20.0), (20.0, 20.0)]);
    assert!(store.layer(first).unwrap().surface().unwrap().objects().is_empty());

    gesture(&mut store, second, &[(0.0, 0.0), (20.0, 20.0), (20.0, 20.0)]);
    assert_eq!(store.layer(second).unwrap().surface().unwrap().objects().len(), 1);
}

#[test]
fn test_switching_to_select_makes_objects_interactive() {
    let (mut store, layer) = mounted_store();
    store.set_tool(ToolKind::Brush);
    gesture(&mut store, layer, &[(10.0, 10.0), (60.0, 10.0), (90.0, 40.0)]);
    let path = &store.layer(layer).unwrap().surface().unwrap().objects()[0];
    assert_eq!(path.type_name(), "path");
    assert!(!path.is_interactive());

    store.set_tool(ToolKind::Select);
    let surface = store.layer(layer).unwrap().surface().unwrap();
    assert!(surface.flags().selection);
    assert!(surface.flags().brush.is_none());
    assert!(surface.objects()[0].is_interactive());
}

#[test]
fn test_brush_update_reapplies_to_selected_surface() {
    let (mut store, layer) = mounted_store();
    store.set_tool(ToolKind::Brush);
    store.dispatch(Command::UpdateBrush { size: 12.0, color: Color32::RED }).unwrap();
    let expected = FreeDrawBrush { width: 12.0, color: Color32::RED, composite: CompositeOp::SourceOver };
    assert_eq!(store.layer(layer).unwrap().surface().unwrap().flags().brush, Some(expected));

    store.set_tool(ToolKind::Eraser);
    store.update_brush_settings(30.0, Color32::RED);
    let brush = store.layer(layer).unwrap().surface().unwrap().flags().brush.unwrap();
    assert_eq!(brush.width, 30.0);
    assert_eq!(brush.composite, CompositeOp::DestinationOut);
}

#[test]
fn test_switching_tool_mid_gesture_leaves_no_shape() {
    let (mut store, layer) = mounted_store();
    store.set_tool(ToolKind::Rectangle);
    let before = store.history().len();
    store.dispatch(Command::Pointer { layer, event: PointerEvent::down(10.0, 10.0) }).unwrap();
    store.dispatch(Command::Pointer { layer, event: PointerEvent::moved(40.0, 40.0) }).unwrap();
    assert_eq!(store.layer(layer).unwrap().surface().unwrap().objects().len(), 1);

    store.dispatch(Command::SetTool(ToolKind::Select)).unwrap();
    store.dispatch(Command::Pointer { layer, event: PointerEvent::up(40.0, 40.0) }).unwrap();

    assert!(store.layer(layer).unwrap().surface().unwrap().objects().is_empty());
    assert!(!store.tool_controller().gesture().is_drawing());
    assert_eq!(store.history().len(), before);
}

#[test]
fn test_pixel_eraser_keeps_cut_out_path() {
    let (mut store, layer) = mounted_store();
    store.set_tool(ToolKind::Eraser);
    gesture(&mut store, layer, &[(0.0, 0.0), (100.0, 100.0)]);

    let objects = store.layer(layer).unwrap().surface().unwrap().objects();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].composite, CompositeOp::DestinationOut);
}

#[test]
fn test_smart_eraser_masks_shapes_on_every_visible_layer() {
    let (mut store, first) = mounted_store();
    store.set_tool(ToolKind::Rectangle);
    gesture(&mut store, first, &[(20.0, 20.0), (120.0, 120.0), (120.0, 120.0)]);

    let second = store.add_layer("Second", false);
    store.register_surface(second, CanvasHandle(2)).unwrap();
    gesture(&mut store, second, &[(20.0, 20.0), (120.0, 120.0), (120.0, 120.0)]);

    let hidden = store.add_layer("Hidden", false);
    store.register_surface(hidden, CanvasHandle(3)).unwrap();
    gesture(&mut store, hidden, &[(20.0, 20.0), (120.0, 120.0), (120.0, 120.0)]);
    store.toggle_layer_visibility(hidden).unwrap();
    store.select_layer(second).unwrap();

    store.dispatch(Command::SetTool(ToolKind::Eraser)).unwrap();
    store.dispatch(Command::SetEraserMode(EraserMode::Smart)).unwrap();
    let before = store.history().len();
    gesture(&mut store, second, &[(0.0, 70.0), (100.0, 70.0), (200.0, 70.0)]);
    assert_eq!(store.history().len(), before + 1);

    for id in [first, second] {
        let objects = store.layer(id).unwrap().surface().unwrap().objects();
        assert_eq!(objects.len(), 1, "eraser stroke must not stay on {id}");
        let mask = objects[0].erase_mask.as_ref().expect("shape is masked");
        assert_eq!(mask.strokes.len(), 1);
        assert!(!mask.covers(Pos2::new(50.0, 50.0)));
    }
    let untouched = &store.layer(hidden).unwrap().surface().unwrap().objects()[0];
    assert!(untouched.erase_mask.is_none());
}

#[test]
fn test_smart_eraser_flattens_brush_strokes() {
    let (mut store, layer) = mounted_store();
    store.update_brush_settings(10.0, Color32::BLUE);
    gesture(&mut store, layer, &[(50.0, 0.0), (50.0, 100.0), (50.0, 200.0)]);

    store.set_tool(ToolKind::Eraser);
    store.set_eraser_mode(EraserMode::Smart);
    gesture(&mut store, layer, &[(0.0, 100.0), (100.0, 100.0)]);

    let objects = store.layer(layer).unwrap().surface().unwrap().objects();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].type_name(), "image");
    assert!(objects[0].rasterized);
}

fn png(width: u32, height: u32) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(width, height, Rgba([0, 128, 0, 255]))).unwrap()
}

#[test]
fn test_add_image_centres_and_switches_to_select() {
    let (mut store, layer) = mounted_store();
    let before = store.history().len();
    store
        .dispatch(Command::AddImage { mime: "image/png".into(), bytes: png(1600, 600) })
        .unwrap();

    assert_eq!(store.active_tool(), ToolKind::Select);
    assert_eq!(store.history().len(), before + 1);
    let surface = store.layer(layer).unwrap().surface().unwrap();
    let image = &surface.objects()[0];
    assert_eq!(surface.active_object(), Some(image.id));
    assert_eq!(image.scale_x, 0.5);
    assert_eq!((image.left, image.top), (0.0, 150.0));
}

#[test]
fn test_add_image_rejections_leave_state_alone() {
    let mut store = CanvasStore::new(EditorConfig::default(), Box::new(SceneSurfaceFactory::new()));
    store.init_first_layer();
    assert!(matches!(
        store.add_image("image/png", &png(4, 4)),
        Err(EditorError::NoActiveSurface)
    ));

    let (mut store, _) = mounted_store();
    assert!(matches!(
        store.add_image("image/gif", &png(4, 4)),
        Err(EditorError::Imaging(ImagingError::UnsupportedType(_)))
    ));
    assert!(matches!(
        store.add_image("image/png", b"not an image"),
        Err(EditorError::Imaging(ImagingError::Decode(_)))
    ));
    assert_eq!(store.active_tool(), ToolKind::Brush);
    assert_eq!(store.history().len(), 1);
}
