use serde::{Deserialize, Serialize};

use super::{CanvasObject, Shape};

/// How an object responds to erasing and flattening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Pixel content, including paths that were baked to images
    Raster,
    /// Text and basic shapes whose properties stay editable
    Editable,
    /// Free-draw paths that still carry their geometry
    Vector,
}

pub fn classify(object: &CanvasObject) -> ObjectKind {
    match &object.shape {
        Shape::Text { .. }
        | Shape::Rect { .. }
        | Shape::Circle { .. }
        | Shape::Ellipse { .. }
        | Shape::Polygon { .. }
        | Shape::Triangle { .. } => ObjectKind::Editable,
        Shape::Image { .. } => ObjectKind::Raster,
        Shape::Path { .. } if object.rasterized => ObjectKind::Raster,
        Shape::Path { .. } => ObjectKind::Vector,
        Shape::Group { objects } => {
            if objects.iter().all(|child| classify(child) == ObjectKind::Raster) {
                ObjectKind::Raster
            } else {
                ObjectKind::Editable
            }
        }
    }
}

/// Editable objects must never be destructively erased
pub fn is_protected(object: &CanvasObject) -> bool {
    classify(object) == ObjectKind::Editable
}

pub fn can_rasterize(object: &CanvasObject) -> bool {
    matches!(classify(object), ObjectKind::Vector | ObjectKind::Raster)
}

pub fn mark_as_rasterized(object: &mut CanvasObject) {
    object.rasterized = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Color32, Pos2};

    #[test]
    fn test_basic_shapes_are_editable() {
        assert_eq!(classify(&CanvasObject::rect(0.0, 0.0, 1.0, 1.0)), ObjectKind::Editable);
        assert_eq!(classify(&CanvasObject::circle(0.0, 0.0, 1.0)), ObjectKind::Editable);
        assert_eq!(classify(&CanvasObject::text(0.0, 0.0, "a", 12.0)), ObjectKind::Editable);
        assert!(is_protected(&CanvasObject::rect(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn test_paths_become_raster_once_baked() {
        let mut path = CanvasObject::path(&[Pos2::ZERO, Pos2::new(5.0, 5.0)], 2.0, Color32::BLACK);
        assert_eq!(classify(&path), ObjectKind::Vector);
        assert!(can_rasterize(&path));
        mark_as_rasterized(&mut path);
        assert_eq!(classify(&path), ObjectKind::Raster);
    }

    #[test]
    fn test_group_is_raster_only_when_all_children_are() {
        let image = CanvasObject::image(0.0, 0.0, 2, 2, String::new());
        let raster_group = CanvasObject::group(0.0, 0.0, vec![image.clone(), image.clone()]);
        assert_eq!(classify(&raster_group), ObjectKind::Raster);

        let mixed = CanvasObject::group(0.0, 0.0, vec![image, CanvasObject::rect(0.0, 0.0, 1.0, 1.0)]);
        assert_eq!(classify(&mixed), ObjectKind::Editable);
        assert!(!can_rasterize(&mixed));
    }
}
