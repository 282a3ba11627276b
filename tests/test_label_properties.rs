// tests/test_label_properties.rs
// Property tests for label resolution: priority default, zoom fallback and
// union rules, overlap flag inheritance, build determinism and which fields
// react to the feature environment.
// RELEVANT FILES: src/labels/text_builder.rs, src/labels/poi_builder.rs, src/labels/zoom.rs

use std::sync::Arc;

use glam::Vec3;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

use tile_labels::labels::{pick_max, pick_min, IconRequest};
use tile_labels::{
    Env, LabelServices, PoiBuilder, Technique, TechniqueName, TextElementBuilder, TileContext,
};

fn technique_name() -> impl Strategy<Value = TechniqueName> {
    prop_oneof![
        Just(TechniqueName::Text),
        Just(TechniqueName::LabeledIcon),
        Just(TechniqueName::LineMarker),
    ]
}

fn zoom_level() -> impl Strategy<Value = Option<f32>> {
    proptest::option::of(0u8..=22).prop_map(|z| z.map(f32::from))
}

fn technique(name: TechniqueName, fields: &[(&str, Option<Value>)]) -> Arc<Technique> {
    let mut object = Map::new();
    object.insert("name".into(), serde_json::to_value(name).unwrap());
    for (key, value) in fields {
        if let Some(value) = value {
            object.insert((*key).to_string(), value.clone());
        }
    }
    Arc::new(Technique::from_json(Value::Object(object)).unwrap())
}

fn zoom_json(z: Option<f32>) -> Option<Value> {
    z.map(|z| json!(z))
}

proptest! {
    #[test]
    fn prop_priority_defaults_to_zero(name in technique_name(), zoom in 0.0f64..22.0) {
        let props = Map::new();
        let mut builder = TextElementBuilder::new(Env::new(&props, zoom), LabelServices::default());
        builder.with_technique(technique(name, &[])).unwrap();
        let element = builder
            .build("x", Vec3::ZERO, &TileContext::default(), None, None)
            .unwrap();
        prop_assert_eq!(element.priority, 0.0);
    }

    #[test]
    fn prop_icon_min_zoom_falls_back_to_generic(
        generic in zoom_level(),
        icon in zoom_level(),
    ) {
        let props = Map::new();
        let mut builder = PoiBuilder::new(Env::new(&props, 10.0), LabelServices::default());
        builder
            .with_technique(technique(
                TechniqueName::LabeledIcon,
                &[("minZoomLevel", zoom_json(generic)), ("iconMinZoomLevel", zoom_json(icon))],
            ))
            .unwrap();
        let element = builder
            .build("x", Vec3::ZERO, &TileContext::default(), &IconRequest::texture("i"), None)
            .unwrap();
        let info = element.icon_info.unwrap();
        prop_assert_eq!(info.icon_min_zoom_level, icon.or(generic));
        prop_assert_eq!(info.text_min_zoom_level, generic);
    }

    #[test]
    fn prop_icon_overlap_inherits_unless_set(
        text_overlap in proptest::option::of(any::<bool>()),
        icon_overlap in proptest::option::of(any::<bool>()),
    ) {
        let props = Map::new();
        let mut builder = PoiBuilder::new(Env::new(&props, 10.0), LabelServices::default());
        builder
            .with_technique(technique(
                TechniqueName::LabeledIcon,
                &[
                    ("textMayOverlap", text_overlap.map(Value::Bool)),
                    ("iconMayOverlap", icon_overlap.map(Value::Bool)),
                ],
            ))
            .unwrap();
        let element = builder
            .build("x", Vec3::ZERO, &TileContext::default(), &IconRequest::texture("i"), None)
            .unwrap();

        prop_assert_eq!(element.may_overlap, text_overlap.unwrap_or(false));
        let info = element.icon_info.unwrap();
        prop_assert_eq!(info.may_overlap, icon_overlap.unwrap_or(element.may_overlap));
    }

    #[test]
    fn prop_icon_zoom_range_is_union(
        icon_min in zoom_level(),
        icon_max in zoom_level(),
        text_min in zoom_level(),
        text_max in zoom_level(),
    ) {
        let props = Map::new();
        let mut builder = PoiBuilder::new(Env::new(&props, 10.0), LabelServices::default());
        builder
            .with_technique(technique(
                TechniqueName::LabeledIcon,
                &[
                    ("iconMinZoomLevel", zoom_json(icon_min)),
                    ("iconMaxZoomLevel", zoom_json(icon_max)),
                    ("textMinZoomLevel", zoom_json(text_min)),
                    ("textMaxZoomLevel", zoom_json(text_max)),
                ],
            ))
            .unwrap();
        let element = builder
            .build("x", Vec3::ZERO, &TileContext::default(), &IconRequest::texture("i"), None)
            .unwrap();

        prop_assert_eq!(element.min_zoom_level, pick_min(icon_min, text_min));
        prop_assert_eq!(element.max_zoom_level, pick_max(icon_max, text_max));
        if let (Some(a), Some(b), Some(min)) = (icon_min, text_min, element.min_zoom_level) {
            prop_assert!(min <= a && min <= b);
        }
        if let (Some(a), Some(b), Some(max)) = (icon_max, text_max, element.max_zoom_level) {
            prop_assert!(max >= a && max >= b);
        }
    }

    #[test]
    fn prop_build_is_deterministic(
        name in technique_name(),
        priority in proptest::option::of(-100i32..100),
        text in "[a-zA-Z ]{0,16}",
        id in any::<i64>(),
    ) {
        let props = Map::new();
        let mut builder = PoiBuilder::new(Env::new(&props, 12.0), LabelServices::default());
        builder
            .with_technique(technique(name, &[("priority", priority.map(|p| json!(p)))]))
            .unwrap();
        let attributes = json!({"$id": id});
        let build = || {
            builder
                .build(
                    &text,
                    Vec3::new(1.0, 2.0, 0.0),
                    &TileContext::default(),
                    &IconRequest::texture("i"),
                    attributes.as_object(),
                )
                .unwrap()
        };
        prop_assert_eq!(build(), build());
    }

    #[test]
    fn prop_env_only_changes_expression_fields(a in -50i64..50, b in -50i64..50) {
        let t = technique(
            TechniqueName::Text,
            &[
                ("priority", Some(json!(7))),
                ("xOffset", Some(json!(3))),
                ("yOffset", Some(json!(["get", "offset"]))),
            ],
        );
        let build = |offset: i64| {
            let props = json!({"offset": offset}).as_object().cloned().unwrap();
            let mut builder =
                TextElementBuilder::new(Env::new(&props, 10.0), LabelServices::default());
            builder.with_technique(Arc::clone(&t)).unwrap();
            builder
                .build("x", Vec3::ZERO, &TileContext::default(), None, None)
                .unwrap()
        };

        let first = build(a);
        let second = build(b);
        prop_assert_eq!(first.priority, 7.0);
        prop_assert_eq!(second.priority, 7.0);
        prop_assert_eq!(first.x_offset, second.x_offset);
        prop_assert_eq!(first.y_offset, Some(a as f32));
        prop_assert_eq!(second.y_offset, Some(b as f32));
    }
}
