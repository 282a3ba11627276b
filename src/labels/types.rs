//! Label element types produced by the builders.

use std::sync::Arc;

use glam::Vec3;
use serde_json::{Map, Value};

use crate::labels::color_cache::ColorHandle;
use crate::labels::style_cache::{TextLayoutStyle, TextRenderStyle};
use crate::labels::zoom::{compute_effective_zoom_range, ZoomRange};
use crate::style::Technique;

/// Feature attributes as decoded from the tile.
pub type AttributeMap = Map<String, Value>;

/// Attribute holding the feature identifier.
pub const FEATURE_ID_ATTRIBUTE: &str = "$id";

/// Feature identifier taken from the attribute map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureId {
    Number(i64),
    String(String),
}

/// Derive the feature identifier from a feature's attributes.
///
/// Returns `None` when there are no attributes or `$id` is neither an
/// integer nor a string.
pub fn feature_id(attributes: Option<&AttributeMap>) -> Option<FeatureId> {
    match attributes?.get(FEATURE_ID_ATTRIBUTE)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(integral_id))
            .map(FeatureId::Number),
        Value::String(s) => Some(FeatureId::String(s.clone())),
        _ => None,
    }
}

/// Integral floats within `i64` range; anything else would collide on cast.
fn integral_id(f: f64) -> Option<i64> {
    // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

/// Where a label is anchored in tile space.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelAnchor {
    /// Single anchor point (POIs, point labels).
    Point(Vec3),
    /// Ordered path for path-following text.
    Path(Vec<Vec3>),
}

impl LabelAnchor {
    /// First anchor position, if any.
    pub fn position(&self) -> Option<Vec3> {
        match self {
            LabelAnchor::Point(p) => Some(*p),
            LabelAnchor::Path(points) => points.first().copied(),
        }
    }

    pub fn is_path(&self) -> bool {
        matches!(self, LabelAnchor::Path(_))
    }
}

impl From<Vec3> for LabelAnchor {
    fn from(point: Vec3) -> Self {
        LabelAnchor::Point(point)
    }
}

impl From<Vec<Vec3>> for LabelAnchor {
    fn from(points: Vec<Vec3>) -> Self {
        LabelAnchor::Path(points)
    }
}

/// Per-tile inputs copied onto every element built for the tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileContext {
    /// World wrap offset of the tile.
    pub offset: i32,
}

impl TileContext {
    pub fn new(offset: i32) -> Self {
        Self { offset }
    }
}

/// Icon attributes of a POI label.
#[derive(Debug, Clone, PartialEq)]
pub struct IconInfo {
    /// Texture name; empty when the icon comes from the POI table.
    pub image_texture_name: String,
    pub poi_table_name: Option<String>,
    pub poi_name: Option<String>,
    pub shield_group_index: Option<u32>,
    /// Technique the icon was resolved from.
    pub technique: Arc<Technique>,
    pub text_is_optional: bool,
    pub icon_is_optional: bool,
    pub render_text_during_movements: bool,
    pub may_overlap: bool,
    pub reserve_space: bool,
    pub feature_id: Option<FeatureId>,
    pub icon_brightness: Option<f32>,
    /// Color override; `None` keeps the texture's own colors.
    pub icon_color: Option<ColorHandle>,
    pub icon_min_zoom_level: Option<f32>,
    pub icon_max_zoom_level: Option<f32>,
    pub text_min_zoom_level: Option<f32>,
    pub text_max_zoom_level: Option<f32>,
}

impl IconInfo {
    /// True when the icon is looked up in a POI table at render time.
    pub fn uses_poi_table(&self) -> bool {
        self.image_texture_name.is_empty() && self.poi_table_name.is_some()
    }

    pub fn icon_zoom_range(&self) -> ZoomRange {
        ZoomRange::new(self.icon_min_zoom_level, self.icon_max_zoom_level)
    }

    pub fn text_zoom_range(&self) -> ZoomRange {
        ZoomRange::new(self.text_min_zoom_level, self.text_max_zoom_level)
    }
}

/// A placeable text or POI label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelElement {
    /// Shaped text in display order.
    pub text: String,
    pub anchor: LabelAnchor,
    pub render_style: Arc<TextRenderStyle>,
    pub layout_style: Arc<TextLayoutStyle>,
    /// Placement priority, higher wins. Always defined.
    pub priority: f32,
    pub x_offset: Option<f32>,
    pub y_offset: Option<f32>,
    pub feature_id: Option<FeatureId>,
    /// Style set name of the technique.
    pub style: Option<String>,
    pub fade_near: Option<f32>,
    pub fade_far: Option<f32>,
    pub tile_offset: i32,
    /// Unset means the zoom axis does not constrain visibility.
    pub min_zoom_level: Option<f32>,
    pub max_zoom_level: Option<f32>,
    pub distance_scale: f32,
    pub may_overlap: bool,
    pub reserve_space: bool,
    pub always_on_top: bool,
    pub kind: Option<String>,
    /// Feature attributes, kept for picking.
    pub user_data: Option<AttributeMap>,
    pub text_fade_time: Option<f32>,
    pub path_length_sqr: Option<f32>,
    pub icon_info: Option<IconInfo>,
}

impl LabelElement {
    /// Current zoom bounds.
    pub fn zoom_range(&self) -> ZoomRange {
        ZoomRange::new(self.min_zoom_level, self.max_zoom_level)
    }

    pub fn set_zoom_range(&mut self, range: ZoomRange) {
        self.min_zoom_level = range.min;
        self.max_zoom_level = range.max;
    }

    /// Widen the zoom bounds to cover both the icon and the text range.
    ///
    /// Must be called once after `icon_info` is attached. Does nothing for
    /// elements without icon info.
    pub fn update_zoom_range_from_icon_info(&mut self) {
        if let Some(info) = &self.icon_info {
            let range =
                compute_effective_zoom_range(self.zoom_range(), ZoomRange::default(), Some(info));
            self.set_zoom_range(range);
        }
    }

    /// Whether the element is eligible for display at `zoom`.
    pub fn visible_at(&self, zoom: f32) -> bool {
        self.zoom_range().contains(zoom)
    }

    pub fn has_icon(&self) -> bool {
        self.icon_info.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attributes(value: Value) -> AttributeMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_feature_id() {
        assert_eq!(feature_id(None), None);
        assert_eq!(
            feature_id(Some(&attributes(json!({"$id": 42})))),
            Some(FeatureId::Number(42))
        );
        assert_eq!(
            feature_id(Some(&attributes(json!({"$id": "way/7"})))),
            Some(FeatureId::String("way/7".to_string()))
        );
        assert_eq!(feature_id(Some(&attributes(json!({"$id": 1.5})))), None);
        assert_eq!(feature_id(Some(&attributes(json!({"name": "x"})))), None);
    }

    #[test]
    fn test_feature_id_out_of_range() {
        assert_eq!(
            feature_id(Some(&attributes(json!({"$id": 12.0})))),
            Some(FeatureId::Number(12))
        );
        assert_eq!(feature_id(Some(&attributes(json!({"$id": 1e20})))), None);
        assert_eq!(feature_id(Some(&attributes(json!({"$id": -1e20})))), None);
        assert_eq!(feature_id(Some(&attributes(json!({"$id": u64::MAX})))), None);
    }

    #[test]
    fn test_anchor_position() {
        let point = LabelAnchor::from(Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(point.position(), Some(Vec3::new(1.0, 2.0, 0.0)));
        assert!(!point.is_path());

        let path = LabelAnchor::from(vec![Vec3::X, Vec3::Y]);
        assert_eq!(path.position(), Some(Vec3::X));
        assert!(path.is_path());
        assert_eq!(LabelAnchor::Path(Vec::new()).position(), None);
    }
}
