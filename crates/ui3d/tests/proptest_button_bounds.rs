//! Property tests for interactive element bounds

use glam::Vec2;
use proptest::prelude::*;
use webplane_dom::{Document, MemoryDocument};
use webplane_ui3d::components::hit_test;
use webplane_ui3d::{compute_button_bounds, METHOD_ATTRIBUTE};

fn markup(buttons: &[(u32, u32)]) -> String {
    buttons
        .iter()
        .enumerate()
        .map(|(i, (w, h))| format!(r#"<a method="m{i}" width="{w}" height="{h}">{i}</a>"#))
        .collect()
}

proptest! {
    /// Property: one bound per interactive element, in document order
    #[test]
    fn bounds_match_elements(
        buttons in prop::collection::vec((1u32..400, 1u32..120), 0..20),
    ) {
        let mut doc = MemoryDocument::new();
        let wrapper = doc.create_wrapper();
        doc.set_inner_markup(wrapper, &markup(&buttons)).unwrap();
        let sources = doc.query_attribute(wrapper, METHOD_ATTRIBUTE);
        let clone = doc.deep_clone(wrapper).unwrap();
        doc.attach_offscreen(clone).unwrap();

        let bounds = compute_button_bounds(&doc, clone, &sources).unwrap();
        prop_assert_eq!(bounds.len(), buttons.len());
        for (i, bound) in bounds.iter().enumerate() {
            prop_assert_eq!(&bound.method, &format!("m{i}"));
            prop_assert_eq!(bound.source, sources[i]);
            prop_assert_eq!(bound.rect.width, buttons[i].0 as f32);
            prop_assert_eq!(bound.rect.height, buttons[i].1 as f32);
        }
    }

    /// Property: the center of every bound hits that bound
    #[test]
    fn centers_hit_their_own_bound(
        buttons in prop::collection::vec((1u32..400, 1u32..120), 1..20),
    ) {
        let mut doc = MemoryDocument::new();
        let wrapper = doc.create_wrapper();
        doc.set_inner_markup(wrapper, &markup(&buttons)).unwrap();
        let sources = doc.query_attribute(wrapper, METHOD_ATTRIBUTE);
        doc.attach_offscreen(wrapper).unwrap();

        let bounds = compute_button_bounds(&doc, wrapper, &sources).unwrap();
        for bound in &bounds {
            let (x, y) = bound.rect.center();
            let hit = hit_test(&bounds, Vec2::new(x, y)).unwrap();
            prop_assert_eq!(&hit.method, &bound.method);
        }
    }
}
