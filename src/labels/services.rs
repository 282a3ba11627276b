//! Shared collaborators handed to the label builders.

use std::sync::Arc;

use crate::config::LabelConfig;
use crate::labels::color_cache::ColorCache;
use crate::labels::shaping::{BidiShaper, TextShaper};
use crate::labels::style_cache::{TextStyleCache, TileTextStyleCache};
use crate::style::{ExpressionResolver, StyleExpressionResolver};

/// Resolver, caches and shaper used while building labels.
///
/// Cheap to clone; every collaborator is behind an `Arc` and may be shared
/// between tile decoding tasks.
#[derive(Clone)]
pub struct LabelServices {
    pub resolver: Arc<dyn ExpressionResolver>,
    pub style_cache: Arc<dyn TextStyleCache>,
    pub color_cache: Arc<ColorCache>,
    pub shaper: Arc<dyn TextShaper>,
    pub config: LabelConfig,
}

impl LabelServices {
    /// Default collaborators for a tile at `zoom_level`.
    ///
    /// Colors go through the process-wide [`ColorCache`], so handles are
    /// shared across tiles. Use [`with_color_cache`](Self::with_color_cache)
    /// to isolate a builder.
    pub fn for_tile(zoom_level: f64, config: LabelConfig) -> Self {
        let color_cache = ColorCache::shared_with_capacity(config.color_cache_capacity);
        let style_cache = TileTextStyleCache::new(zoom_level, config.text_defaults.clone())
            .with_color_cache(Arc::clone(&color_cache));
        Self {
            resolver: Arc::new(StyleExpressionResolver),
            style_cache: Arc::new(style_cache),
            color_cache,
            shaper: Arc::new(BidiShaper),
            config,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ExpressionResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_style_cache(mut self, style_cache: Arc<dyn TextStyleCache>) -> Self {
        self.style_cache = style_cache;
        self
    }

    pub fn with_color_cache(mut self, color_cache: Arc<ColorCache>) -> Self {
        self.color_cache = color_cache;
        self
    }

    pub fn with_shaper(mut self, shaper: Arc<dyn TextShaper>) -> Self {
        self.shaper = shaper;
        self
    }
}

impl Default for LabelServices {
    fn default() -> Self {
        Self::for_tile(0.0, LabelConfig::default())
    }
}
