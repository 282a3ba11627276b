//! Label element construction for decoded map tiles.
//!
//! Provides:
//! - `TextElementBuilder` for plain text labels (points and paths)
//! - `PoiBuilder` for labels carrying an icon
//! - Zoom range fallback and union rules shared by both
//! - `ColorCache` and `TileTextStyleCache` for sharing resolved styles
//! - Bidirectional text shaping before layout

pub mod color_cache;
pub mod poi_builder;
pub mod services;
pub mod shaping;
pub mod style_cache;
pub mod text_builder;
mod types;
pub mod zoom;

pub use color_cache::{Color, ColorCache, ColorHandle};
pub use poi_builder::{
    attach_icon, build_poi_element, reconcile_icon_source, IconRequest, IconSource, PoiBuilder,
    PoiResolution,
};
pub use services::LabelServices;
pub use shaping::{BidiShaper, PassthroughShaper, TextShaper};
pub use style_cache::{TextLayoutStyle, TextRenderStyle, TextStyleCache, TileTextStyleCache};
pub use text_builder::{build_text_element, TextElementBuilder, TextResolution};
pub use types::{
    feature_id, AttributeMap, FeatureId, IconInfo, LabelAnchor, LabelElement, TileContext,
    FEATURE_ID_ATTRIBUTE,
};
pub use zoom::{compute_effective_zoom_range, first_defined, pick_max, pick_min, ZoomRange};
