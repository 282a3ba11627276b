//! Render and layout styles shared by all labels of a technique.
//!
//! A `TileTextStyleCache` belongs to one tile: expression-valued style fields
//! are evaluated at the tile's zoom level, so the result depends only on the
//! technique and can be cached by technique index. Malformed style
//! expressions are errors, like any other technique field.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Map;

use crate::config::TextStyleDefaults;
use crate::error::LabelResult;
use crate::labels::color_cache::ColorCache;
use crate::style::{
    Env, ExpressionResolver, FontStyle, FontVariant, HorizontalAlignment, StyleExpressionResolver,
    StyleValue, Technique, VerticalAlignment, WrappingMode,
};

/// How glyphs are drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRenderStyle {
    pub font_name: Option<String>,
    /// Font size in pixels.
    pub size: f32,
    /// Background (halo) size in pixels.
    pub background_size: f32,
    pub font_style: FontStyle,
    pub font_variant: FontVariant,
    /// Glyph rotation in radians.
    pub rotation: f32,
    pub color: [f32; 4],
    pub background_color: [f32; 4],
    pub opacity: f32,
    pub background_opacity: f32,
}

/// How glyphs are arranged into lines.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayoutStyle {
    pub tracking: f32,
    pub leading: f32,
    pub max_lines: Option<u32>,
    pub line_width: f32,
    pub canvas_rotation: f32,
    pub line_rotation: f32,
    pub wrapping_mode: WrappingMode,
    pub horizontal_alignment: HorizontalAlignment,
    pub vertical_alignment: VerticalAlignment,
}

/// Source of render/layout styles, keyed by technique identity.
///
/// Fails when a style field holds a malformed expression or a value of the
/// wrong type.
pub trait TextStyleCache: Send + Sync {
    fn render_style(&self, technique: &Technique) -> LabelResult<Arc<TextRenderStyle>>;
    fn layout_style(&self, technique: &Technique) -> LabelResult<Arc<TextLayoutStyle>>;
}

type StyleSlots<T> = Mutex<HashMap<usize, Arc<T>>>;

/// Style cache for one tile.
///
/// Only techniques carrying an `_index` are cached; the others are rebuilt
/// on every lookup.
pub struct TileTextStyleCache {
    zoom_level: f64,
    defaults: TextStyleDefaults,
    resolver: Arc<dyn ExpressionResolver>,
    colors: Arc<ColorCache>,
    render_styles: StyleSlots<TextRenderStyle>,
    layout_styles: StyleSlots<TextLayoutStyle>,
}

impl TileTextStyleCache {
    pub fn new(zoom_level: f64, defaults: TextStyleDefaults) -> Self {
        Self {
            zoom_level,
            defaults,
            resolver: Arc::new(StyleExpressionResolver),
            colors: ColorCache::shared(),
            render_styles: Mutex::new(HashMap::new()),
            layout_styles: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ExpressionResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_color_cache(mut self, colors: Arc<ColorCache>) -> Self {
        self.colors = colors;
        self
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    /// Drop all cached styles, e.g. after the technique set changed.
    pub fn clear(&self) {
        self.render_styles.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.layout_styles.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn number(
        &self,
        field: &'static str,
        value: Option<&StyleValue>,
        fallback: f32,
    ) -> LabelResult<f32> {
        let empty = Map::new();
        let env = Env::new(&empty, self.zoom_level);
        Ok(self
            .resolver
            .resolve_number(field, value, &env)?
            .map_or(fallback, |n| n as f32))
    }

    /// Unparsable colors fall back with a warning from the color cache.
    fn color(&self, value: Option<&StyleValue>, fallback: [f32; 4]) -> LabelResult<[f32; 4]> {
        let empty = Map::new();
        let env = Env::new(&empty, self.zoom_level);
        Ok(match self.resolver.resolve_value(value, &env)? {
            Some(raw) => self.colors.get_color(&raw).map_or(fallback, |c| c.rgba),
            None => fallback,
        })
    }

    fn build_render_style(&self, technique: &Technique) -> LabelResult<TextRenderStyle> {
        let d = &self.defaults;
        Ok(TextRenderStyle {
            font_name: technique.font_name.clone(),
            size: self.number("size", technique.size.as_ref(), d.size)?,
            background_size: self.number(
                "backgroundSize",
                technique.background_size.as_ref(),
                d.background_size,
            )?,
            font_style: technique.font_style.unwrap_or_default(),
            font_variant: technique.font_variant.unwrap_or_default(),
            rotation: technique.rotation.unwrap_or(0.0),
            color: self.color(technique.color.as_ref(), d.color)?,
            background_color: self
                .color(technique.background_color.as_ref(), d.background_color)?,
            opacity: self.number("opacity", technique.opacity.as_ref(), d.opacity)?,
            background_opacity: self.number(
                "backgroundOpacity",
                technique.background_opacity.as_ref(),
                d.background_opacity,
            )?,
        })
    }

    fn build_layout_style(&self, technique: &Technique) -> TextLayoutStyle {
        let d = &self.defaults;
        TextLayoutStyle {
            tracking: technique.tracking.unwrap_or(d.tracking),
            leading: technique.leading.unwrap_or(d.leading),
            max_lines: technique.max_lines,
            line_width: technique.line_width.unwrap_or(d.line_width),
            canvas_rotation: technique.canvas_rotation.unwrap_or(0.0),
            line_rotation: technique.line_rotation.unwrap_or(0.0),
            wrapping_mode: technique.wrapping_mode.unwrap_or_default(),
            horizontal_alignment: technique.h_alignment.unwrap_or_default(),
            vertical_alignment: technique.v_alignment.unwrap_or_default(),
        }
    }
}

/// Look up or build the style for `technique`.
///
/// The slot lock is held while building so each index gets one canonical
/// style.
fn cached<T>(
    slots: &StyleSlots<T>,
    technique: &Technique,
    kind: &str,
    build: impl FnOnce() -> LabelResult<T>,
) -> LabelResult<Arc<T>> {
    let Some(index) = technique.index else {
        return build().map(Arc::new);
    };
    let mut slots = slots.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(style) = slots.get(&index) {
        return Ok(Arc::clone(style));
    }
    log::debug!("{kind} style cache miss for technique {index}");
    let style = Arc::new(build()?);
    slots.insert(index, Arc::clone(&style));
    Ok(style)
}

impl Default for TileTextStyleCache {
    fn default() -> Self {
        Self::new(0.0, TextStyleDefaults::default())
    }
}

impl TextStyleCache for TileTextStyleCache {
    fn render_style(&self, technique: &Technique) -> LabelResult<Arc<TextRenderStyle>> {
        cached(&self.render_styles, technique, "Render", || {
            self.build_render_style(technique)
        })
    }

    fn layout_style(&self, technique: &Technique) -> LabelResult<Arc<TextLayoutStyle>> {
        cached(&self.layout_styles, technique, "Layout", || {
            Ok(self.build_layout_style(technique))
        })
    }
}
