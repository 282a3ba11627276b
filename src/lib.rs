//! Label elements for vector map tiles.
//!
//! Turns styling techniques plus per-feature attributes into placeable text
//! and POI label elements. Placement, collision and glyph rendering happen
//! downstream; this crate only decides what each label is and when it may be
//! shown.

pub mod config;
pub mod error;
pub mod labels;
pub mod style;

pub use config::{LabelConfig, TextStyleDefaults};
pub use error::{LabelError, LabelResult};
pub use labels::{
    build_poi_element, build_text_element, ColorCache, IconInfo, IconRequest, LabelAnchor,
    LabelElement, LabelServices, PoiBuilder, PoiResolution, TextElementBuilder, TextResolution,
    TileContext, ZoomRange,
};
pub use style::{Env, ExpressionResolver, StyleExpressionResolver, StyleValue, Technique, TechniqueName};
