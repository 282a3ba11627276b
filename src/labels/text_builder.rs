//! Text label construction.
//!
//! Building is split in two phases. [`TextResolution::resolve`] evaluates a
//! technique once (expressions, cache lookups); [`build_text_element`] then
//! assembles one [`LabelElement`] per feature occurrence from that immutable
//! resolution. [`TextElementBuilder`] wraps both behind a configure-then-build
//! interface.

use std::sync::Arc;

use crate::error::{LabelError, LabelResult};
use crate::labels::services::LabelServices;
use crate::labels::shaping::TextShaper;
use crate::labels::style_cache::{TextLayoutStyle, TextRenderStyle};
use crate::labels::types::{feature_id, AttributeMap, LabelAnchor, LabelElement, TileContext};
use crate::labels::zoom::ZoomRange;
use crate::style::{Env, StyleValue, Technique};

/// Text attributes of one technique resolved in one environment.
#[derive(Debug, Clone, PartialEq)]
pub struct TextResolution {
    pub technique: Arc<Technique>,
    /// Defaults to 0 so that labels always sort deterministically.
    pub priority: f32,
    pub fade_near: Option<f32>,
    pub fade_far: Option<f32>,
    /// Generic technique range (`minZoomLevel` / `maxZoomLevel`).
    pub zoom_range: ZoomRange,
    pub distance_scale: f32,
    pub may_overlap: bool,
    pub reserve_space: bool,
    pub render_style: Arc<TextRenderStyle>,
    pub layout_style: Arc<TextLayoutStyle>,
    pub x_offset: Option<f32>,
    pub y_offset: Option<f32>,
}

impl TextResolution {
    /// Evaluate the text fields of `technique` in `env`.
    pub fn resolve(
        technique: Arc<Technique>,
        env: &Env<'_>,
        services: &LabelServices,
    ) -> LabelResult<Self> {
        let resolver = services.resolver.as_ref();
        let number = |field: &'static str, value: Option<&StyleValue>| {
            resolver
                .resolve_number(field, value, env)
                .map(|n| n.map(|n| n as f32))
        };

        let priority = number("priority", technique.priority.as_ref())?.unwrap_or(0.0);
        let fade_near = number("fadeNear", technique.fade_near.as_ref())?;
        let fade_far = number("fadeFar", technique.fade_far.as_ref())?;
        let zoom_range = ZoomRange::new(
            number("minZoomLevel", technique.min_zoom_level.as_ref())?,
            number("maxZoomLevel", technique.max_zoom_level.as_ref())?,
        );
        let x_offset = number("xOffset", technique.x_offset.as_ref())?;
        let y_offset = number("yOffset", technique.y_offset.as_ref())?;

        let distance_scale = technique
            .distance_scale
            .unwrap_or(services.config.distance_scale);

        // Icon-bearing techniques carry separate text and icon flags.
        let (may_overlap, reserve_space) = if technique.name.is_icon_bearing() {
            (technique.text_may_overlap, technique.text_reserve_space)
        } else {
            (technique.may_overlap, technique.reserve_space)
        };

        let render_style = services.style_cache.render_style(&technique)?;
        let layout_style = services.style_cache.layout_style(&technique)?;

        log::trace!(
            "Resolved text technique {:?} (priority {priority}, zoom {:?}..{:?})",
            technique.index,
            zoom_range.min,
            zoom_range.max
        );

        Ok(Self {
            priority,
            fade_near,
            fade_far,
            zoom_range,
            distance_scale,
            may_overlap: may_overlap == Some(true),
            reserve_space: reserve_space != Some(false),
            render_style,
            layout_style,
            x_offset,
            y_offset,
            technique,
        })
    }
}

/// Assemble a text element from a resolution and per-occurrence inputs.
pub fn build_text_element(
    resolution: &TextResolution,
    shaper: &dyn TextShaper,
    text: &str,
    anchor: LabelAnchor,
    tile: &TileContext,
    attributes: Option<&AttributeMap>,
    path_length_sqr: Option<f32>,
) -> LabelElement {
    let technique = &resolution.technique;

    LabelElement {
        text: shaper.shape(text),
        anchor,
        render_style: Arc::clone(&resolution.render_style),
        layout_style: Arc::clone(&resolution.layout_style),
        priority: resolution.priority,
        x_offset: resolution.x_offset,
        y_offset: resolution.y_offset,
        feature_id: feature_id(attributes),
        style: technique.style.clone(),
        fade_near: resolution.fade_near,
        fade_far: resolution.fade_far,
        tile_offset: tile.offset,
        min_zoom_level: resolution.zoom_range.min,
        max_zoom_level: resolution.zoom_range.max,
        distance_scale: resolution.distance_scale,
        may_overlap: resolution.may_overlap,
        reserve_space: resolution.reserve_space,
        always_on_top: false,
        kind: technique.kind.clone(),
        user_data: attributes.cloned(),
        text_fade_time: technique.text_fade_time,
        path_length_sqr,
        icon_info: None,
    }
}

/// Creates text [`LabelElement`]s for features sharing a technique.
///
/// Call [`with_technique`](Self::with_technique) before the first
/// [`build`](Self::build) and whenever the technique changes.
pub struct TextElementBuilder<'a> {
    env: Env<'a>,
    services: LabelServices,
    resolution: Option<TextResolution>,
}

impl<'a> TextElementBuilder<'a> {
    pub fn new(env: Env<'a>, services: LabelServices) -> Self {
        Self {
            env,
            services,
            resolution: None,
        }
    }

    /// Resolve `technique` for the following `build` calls.
    ///
    /// On error the builder is left unconfigured.
    pub fn with_technique(
        &mut self,
        technique: impl Into<Arc<Technique>>,
    ) -> LabelResult<&mut Self> {
        self.resolution = None;
        self.resolution = Some(TextResolution::resolve(
            technique.into(),
            &self.env,
            &self.services,
        )?);
        Ok(self)
    }

    pub fn resolution(&self) -> Option<&TextResolution> {
        self.resolution.as_ref()
    }

    pub fn env(&self) -> &Env<'a> {
        &self.env
    }

    pub fn services(&self) -> &LabelServices {
        &self.services
    }

    /// Build one element. Fails if no technique is configured.
    pub fn build(
        &self,
        text: &str,
        anchor: impl Into<LabelAnchor>,
        tile: &TileContext,
        attributes: Option<&AttributeMap>,
        path_length_sqr: Option<f32>,
    ) -> LabelResult<LabelElement> {
        let Some(resolution) = &self.resolution else {
            log::error!("TextElementBuilder::build called before with_technique");
            return Err(LabelError::TechniqueNotConfigured);
        };
        Ok(build_text_element(
            resolution,
            self.services.shaper.as_ref(),
            text,
            anchor.into(),
            tile,
            attributes,
            path_length_sqr,
        ))
    }
}
