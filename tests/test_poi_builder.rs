// tests/test_poi_builder.rs
// POI builder behaviour through the public API: icon sourcing diagnostics,
// the POI table marker and misuse of the configure-then-build sequence.
// RELEVANT FILES: src/labels/poi_builder.rs, src/labels/text_builder.rs, src/labels/types.rs

use std::cell::RefCell;
use std::sync::{Arc, Once};

use glam::Vec3;
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::{json, Map};

use tile_labels::labels::IconRequest;
use tile_labels::{Env, LabelError, LabelServices, PoiBuilder, Technique, TileContext};

thread_local! {
    static RECORDS: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
}

struct CapturingLogger;

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if record.target().starts_with("tile_labels") {
            RECORDS.with(|r| r.borrow_mut().push((record.level(), record.args().to_string())));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger;
static INIT: Once = Once::new();

/// Run `f` and return what the crate logged on this thread meanwhile.
fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<(Level, String)>) {
    INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Trace);
    });
    RECORDS.with(|r| r.borrow_mut().clear());
    let result = f();
    let records = RECORDS.with(|r| r.borrow_mut().drain(..).collect());
    (result, records)
}

fn warnings(records: &[(Level, String)]) -> Vec<&str> {
    records
        .iter()
        .filter(|(level, _)| *level == Level::Warn)
        .map(|(_, msg)| msg.as_str())
        .collect()
}

fn configured_builder(props: &Map<String, serde_json::Value>) -> PoiBuilder<'_> {
    let mut builder = PoiBuilder::new(Env::new(props, 14.0), LabelServices::default());
    let technique = Technique::from_json(json!({"name": "labeled-icon", "_index": 1}))
        .expect("valid technique");
    builder
        .with_technique(Arc::new(technique))
        .expect("technique resolves");
    builder
}

#[test]
fn conflicting_icon_sources_warn_once_and_texture_wins() {
    let props = Map::new();
    let builder = configured_builder(&props);
    let icon = IconRequest::texture("cafe.png").with_poi_table("poi-main");

    let (element, records) = capture(|| {
        builder.build("Cafe", Vec3::ZERO, &TileContext::default(), &icon, None)
    });
    let element = element.expect("build succeeds");

    let warned = warnings(&records);
    assert_eq!(warned.len(), 1, "expected one warning, got {records:?}");
    assert!(warned[0].contains("Possible duplicate POI icon definition"));

    let info = element.icon_info.expect("icon attached");
    assert_eq!(info.image_texture_name, "cafe.png");
    assert_eq!(info.poi_table_name.as_deref(), Some("poi-main"));
}

#[test]
fn each_conflicting_build_warns_once() {
    let props = Map::new();
    let builder = configured_builder(&props);
    let icon = IconRequest::texture("a.png").with_poi_table("t");

    let (_, records) = capture(|| {
        for _ in 0..3 {
            builder
                .build("A", Vec3::ZERO, &TileContext::default(), &icon, None)
                .expect("build succeeds");
        }
    });
    assert_eq!(warnings(&records).len(), 3);
}

#[test]
fn single_icon_source_is_silent() {
    let props = Map::new();
    let builder = configured_builder(&props);

    let (texture, records) = capture(|| {
        builder.build(
            "Museum",
            Vec3::ZERO,
            &TileContext::default(),
            &IconRequest::texture("museum.png"),
            None,
        )
    });
    assert!(warnings(&records).is_empty());
    assert_eq!(
        texture.expect("build succeeds").icon_info.expect("icon").image_texture_name,
        "museum.png"
    );

    let (table, records) = capture(|| {
        builder.build(
            "A7",
            Vec3::ZERO,
            &TileContext::default(),
            &IconRequest::poi_table("shields", "motorway"),
            None,
        )
    });
    assert!(warnings(&records).is_empty());
    let info = table.expect("build succeeds").icon_info.expect("icon");
    assert_eq!(info.image_texture_name, "");
    assert!(info.uses_poi_table());
    assert_eq!(info.poi_name.as_deref(), Some("motorway"));
}

#[test]
fn no_icon_request_builds_plain_label() {
    let props = Map::new();
    let builder = configured_builder(&props);

    let (element, records) = capture(|| {
        builder.build("Park", Vec3::ZERO, &TileContext::default(), &IconRequest::none(), None)
    });
    assert!(warnings(&records).is_empty());
    let element = element.expect("build succeeds");
    assert!(!element.has_icon());
    assert_eq!(element.text, "Park");
}

#[test]
fn build_before_with_technique_is_an_error() {
    let props = Map::new();
    let builder = PoiBuilder::new(Env::new(&props, 14.0), LabelServices::default());

    let (result, records) = capture(|| {
        builder.build(
            "Cafe",
            Vec3::ZERO,
            &TileContext::default(),
            &IconRequest::texture("cafe.png"),
            None,
        )
    });
    assert!(matches!(result, Err(LabelError::TechniqueNotConfigured)));
    assert!(records.iter().any(|(level, _)| *level == Level::Error));
}

#[test]
fn failed_reconfigure_leaves_builder_unconfigured() {
    let props = Map::new();
    let mut builder = configured_builder(&props);
    let broken = Technique::from_json(json!({"name": "labeled-icon", "priority": ["no-such-op"]}))
        .expect("valid technique");

    assert!(builder.with_technique(Arc::new(broken)).is_err());
    assert!(builder.resolution().is_none());
    let result = builder.build(
        "Cafe",
        Vec3::ZERO,
        &TileContext::default(),
        &IconRequest::texture("cafe.png"),
        None,
    );
    assert!(matches!(result, Err(LabelError::TechniqueNotConfigured)));
}

#[test]
fn feature_id_reaches_icon_info() {
    let props = Map::new();
    let builder = configured_builder(&props);
    let attributes = json!({"$id": "node/42", "name": "Cafe"});

    let element = builder
        .build(
            "Cafe",
            Vec3::ZERO,
            &TileContext::new(2),
            &IconRequest::texture("cafe.png"),
            attributes.as_object(),
        )
        .expect("build succeeds");

    let info = element.icon_info.as_ref().expect("icon");
    assert_eq!(info.feature_id, element.feature_id);
    assert!(element.feature_id.is_some());
    assert_eq!(element.tile_offset, 2);
    assert_eq!(element.user_data.as_ref(), attributes.as_object());
}
