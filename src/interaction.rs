//! Gating pass that keeps exactly one surface interactive.
//!
//! This is the only code path that toggles a surface's interactivity flags.

use crate::layer::{Layer, LayerId};

/// Enable the selected layer's surface and make every other mounted surface inert.
///
/// Idempotent; safe to run after every registry mutation.
pub fn update_layer_interactions(layers: &mut [Layer], selected: Option<LayerId>) {
    for layer in layers.iter_mut() {
        let is_selected = Some(layer.id) == selected;
        let Some(surface) = layer.surface_mut() else {
            continue;
        };

        if is_selected {
            surface.set_selection(true);
            surface.set_hit_testing(true);
            surface.set_interactive(true);
            surface.set_each_object_interactive(true);
        } else {
            surface.set_selection(false);
            surface.set_hit_testing(false);
            surface.set_interactive(false);
            surface.set_each_object_interactive(false);
            surface.discard_active_object();
            surface.request_render();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::CanvasObject;
    use crate::surface::{DrawingSurface, SceneSurface, SurfaceOptions};

    fn mounted(id: u64) -> Layer {
        let mut layer = Layer::new(LayerId(id), format!("Layer {id}"));
        let mut surface = SceneSurface::new(SurfaceOptions::default());
        let object = surface.add_object(CanvasObject::rect(0.0, 0.0, 10.0, 10.0));
        surface.set_active_object(Some(object));
        layer.surface = Some(Box::new(surface));
        layer
    }

    #[test]
    fn test_only_selected_surface_is_interactive() {
        let mut layers = vec![mounted(1), mounted(2), Layer::new(LayerId(3), "unmounted")];
        update_layer_interactions(&mut layers, Some(LayerId(2)));

        let first = layers[0].surface().unwrap();
        assert!(!first.flags().interactive);
        assert!(first.flags().skip_target_find);
        assert!(!first.flags().selection);
        assert!(first.objects().iter().all(|o| !o.is_interactive()));
        assert_eq!(first.active_object(), None);

        let second = layers[1].surface().unwrap();
        assert!(second.flags().interactive && second.flags().selection);
        assert!(!second.flags().skip_target_find);
        assert!(second.objects().iter().all(|o| o.is_interactive()));
        assert!(second.active_object().is_some());
    }

    #[test]
    fn test_gating_is_idempotent() {
        let mut layers = vec![mounted(1), mounted(2)];
        update_layer_interactions(&mut layers, Some(LayerId(1)));
        let once: Vec<_> = layers.iter().map(|l| l.surface().unwrap().flags().clone()).collect();
        update_layer_interactions(&mut layers, Some(LayerId(1)));
        let twice: Vec<_> = layers.iter().map(|l| l.surface().unwrap().flags().clone()).collect();
        assert_eq!(once, twice);
    }
}
