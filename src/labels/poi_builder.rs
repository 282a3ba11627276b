//! POI label construction: text plus an optional icon.
//!
//! A POI icon is either named directly (`imageTextureName`) or looked up in a
//! POI table at render time (`poiTableName`, with an empty texture name as
//! the marker). When both are given the inline texture wins and a warning is
//! logged.

use std::sync::Arc;

use crate::error::{LabelError, LabelResult};
use crate::labels::color_cache::ColorHandle;
use crate::labels::services::LabelServices;
use crate::labels::shaping::TextShaper;
use crate::labels::text_builder::{build_text_element, TextElementBuilder, TextResolution};
use crate::labels::types::{AttributeMap, IconInfo, LabelAnchor, LabelElement, TileContext};
use crate::labels::zoom::{compute_effective_zoom_range, first_defined, ZoomRange};
use crate::style::{Env, StyleValue, Technique};

/// Icon sourcing inputs for one POI occurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IconRequest<'a> {
    pub image_texture_name: Option<&'a str>,
    pub poi_table_name: Option<&'a str>,
    pub poi_name: Option<&'a str>,
    pub shield_group_index: Option<u32>,
}

impl<'a> IconRequest<'a> {
    /// No icon; the element is a plain label.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn texture(name: &'a str) -> Self {
        Self {
            image_texture_name: Some(name),
            ..Self::default()
        }
    }

    pub fn poi_table(table: &'a str, poi_name: &'a str) -> Self {
        Self {
            poi_table_name: Some(table),
            poi_name: Some(poi_name),
            ..Self::default()
        }
    }

    pub fn with_poi_table(mut self, table: &'a str) -> Self {
        self.poi_table_name = Some(table);
        self
    }

    pub fn with_poi_name(mut self, poi_name: &'a str) -> Self {
        self.poi_name = Some(poi_name);
        self
    }

    pub fn with_shield_group(mut self, index: u32) -> Self {
        self.shield_group_index = Some(index);
        self
    }
}

/// Where the icon texture of one occurrence comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSource<'a> {
    /// No icon requested.
    None,
    /// Inline texture name.
    Texture(&'a str),
    /// Resolved through the POI table at render time.
    PoiTable(&'a str),
    /// Both given; the inline texture is used.
    Conflict { texture: &'a str, table: &'a str },
}

impl<'a> IconSource<'a> {
    /// Texture name stored on the icon info, `""` for table lookups.
    pub fn texture_name(&self) -> Option<&'a str> {
        match *self {
            IconSource::None => None,
            IconSource::Texture(name) | IconSource::Conflict { texture: name, .. } => Some(name),
            IconSource::PoiTable(_) => Some(""),
        }
    }
}

/// Decide how the icon is sourced from the two optional names.
pub fn reconcile_icon_source<'a>(
    image_texture_name: Option<&'a str>,
    poi_table_name: Option<&'a str>,
) -> IconSource<'a> {
    match (image_texture_name, poi_table_name) {
        (None, None) => IconSource::None,
        (Some(texture), None) => IconSource::Texture(texture),
        (None, Some(table)) => IconSource::PoiTable(table),
        (Some(texture), Some(table)) => IconSource::Conflict { texture, table },
    }
}

/// Text and icon attributes of one technique resolved in one environment.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiResolution {
    pub text: TextResolution,
    pub always_on_top: bool,
    /// `iconMin/MaxZoomLevel`, falling back to the generic fields.
    pub icon_zoom_range: ZoomRange,
    /// `textMin/MaxZoomLevel`, falling back to the generic fields.
    pub text_zoom_range: ZoomRange,
    /// `textMin/MaxZoomLevel` alone, used to back-fill icon-less elements.
    pub text_only_zoom_range: ZoomRange,
    pub text_is_optional: bool,
    pub icon_is_optional: bool,
    pub render_text_during_movements: bool,
    pub icon_may_overlap: bool,
    pub icon_reserve_space: bool,
    pub icon_color: Option<ColorHandle>,
    pub icon_brightness: Option<f32>,
}

impl PoiResolution {
    /// Evaluate text and icon fields of `technique` in `env`.
    pub fn resolve(
        technique: Arc<Technique>,
        env: &Env<'_>,
        services: &LabelServices,
    ) -> LabelResult<Self> {
        let text = TextResolution::resolve(technique, env, services)?;
        Self::from_text(text, env, services)
    }

    /// Extend an existing text resolution with the icon fields.
    pub fn from_text(
        text: TextResolution,
        env: &Env<'_>,
        services: &LabelServices,
    ) -> LabelResult<Self> {
        let technique = Arc::clone(&text.technique);
        let resolver = services.resolver.as_ref();
        let number = |field: &'static str, value: Option<&StyleValue>| {
            resolver
                .resolve_number(field, value, env)
                .map(|n| n.map(|n| n as f32))
        };
        let generic_min = technique.min_zoom_level.as_ref();
        let generic_max = technique.max_zoom_level.as_ref();

        let icon_zoom_range = ZoomRange::new(
            number(
                "iconMinZoomLevel",
                first_defined([technique.icon_min_zoom_level.as_ref(), generic_min]),
            )?,
            number(
                "iconMaxZoomLevel",
                first_defined([technique.icon_max_zoom_level.as_ref(), generic_max]),
            )?,
        );
        let text_zoom_range = ZoomRange::new(
            number(
                "textMinZoomLevel",
                first_defined([technique.text_min_zoom_level.as_ref(), generic_min]),
            )?,
            number(
                "textMaxZoomLevel",
                first_defined([technique.text_max_zoom_level.as_ref(), generic_max]),
            )?,
        );
        let text_only_zoom_range = ZoomRange::new(
            number("textMinZoomLevel", technique.text_min_zoom_level.as_ref())?,
            number("textMaxZoomLevel", technique.text_max_zoom_level.as_ref())?,
        );

        let icon_color = match resolver.resolve_value(technique.icon_color.as_ref(), env)? {
            Some(raw) => services.color_cache.get_color(&raw),
            None => None,
        };

        // Icon placement flags default to whatever the text resolved to.
        let icon_may_overlap =
            first_defined([technique.icon_may_overlap, Some(text.may_overlap)]).unwrap_or(false);
        let icon_reserve_space =
            first_defined([technique.icon_reserve_space, Some(text.reserve_space)]).unwrap_or(true);

        log::trace!(
            "Resolved POI technique {:?} (icon zoom {:?}, text zoom {:?})",
            technique.index,
            icon_zoom_range,
            text_zoom_range
        );

        Ok(Self {
            always_on_top: technique.always_on_top == Some(true),
            icon_zoom_range,
            text_zoom_range,
            text_only_zoom_range,
            text_is_optional: technique.text_is_optional == Some(true),
            icon_is_optional: technique.icon_is_optional != Some(false),
            render_text_during_movements: technique.render_text_during_movements != Some(false),
            icon_may_overlap,
            icon_reserve_space,
            icon_color,
            icon_brightness: technique.icon_brightness,
            text,
        })
    }
}

/// Attach icon info to a freshly built text element and settle its zoom range.
pub fn attach_icon(resolution: &PoiResolution, element: &mut LabelElement, icon: &IconRequest<'_>) {
    element.always_on_top = resolution.always_on_top;

    let source = reconcile_icon_source(icon.image_texture_name, icon.poi_table_name);
    if let IconSource::Conflict { texture, table } = source {
        log::warn!(
            "Possible duplicate POI icon definition via imageTextureName `{texture}` and poiTable `{table}`"
        );
    }

    let Some(texture_name) = source.texture_name() else {
        // Text only: keep axes the generic range already set.
        let range = compute_effective_zoom_range(
            element.zoom_range(),
            resolution.text_only_zoom_range,
            None,
        );
        element.set_zoom_range(range);
        return;
    };

    element.icon_info = Some(IconInfo {
        image_texture_name: texture_name.to_string(),
        poi_table_name: icon.poi_table_name.map(str::to_string),
        poi_name: icon.poi_name.map(str::to_string),
        shield_group_index: icon.shield_group_index,
        technique: Arc::clone(&resolution.text.technique),
        text_is_optional: resolution.text_is_optional,
        icon_is_optional: resolution.icon_is_optional,
        render_text_during_movements: resolution.render_text_during_movements,
        may_overlap: resolution.icon_may_overlap,
        reserve_space: resolution.icon_reserve_space,
        feature_id: element.feature_id.clone(),
        icon_brightness: resolution.icon_brightness,
        icon_color: resolution.icon_color.clone(),
        icon_min_zoom_level: resolution.icon_zoom_range.min,
        icon_max_zoom_level: resolution.icon_zoom_range.max,
        text_min_zoom_level: resolution.text_zoom_range.min,
        text_max_zoom_level: resolution.text_zoom_range.max,
    });
    element.update_zoom_range_from_icon_info();
}

/// Assemble a POI element from a resolution and per-occurrence inputs.
pub fn build_poi_element(
    resolution: &PoiResolution,
    shaper: &dyn TextShaper,
    text: &str,
    anchor: LabelAnchor,
    tile: &TileContext,
    icon: &IconRequest<'_>,
    attributes: Option<&AttributeMap>,
) -> LabelElement {
    let mut element =
        build_text_element(&resolution.text, shaper, text, anchor, tile, attributes, None);
    attach_icon(resolution, &mut element, icon);
    element
}

/// Creates POI [`LabelElement`]s for features sharing a technique.
pub struct PoiBuilder<'a> {
    text_builder: TextElementBuilder<'a>,
    resolution: Option<PoiResolution>,
}

impl<'a> PoiBuilder<'a> {
    pub fn new(env: Env<'a>, services: LabelServices) -> Self {
        Self {
            text_builder: TextElementBuilder::new(env, services),
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
        self.text_builder.with_technique(technique)?;
        let text = self
            .text_builder
            .resolution()
            .cloned()
            .ok_or(LabelError::TechniqueNotConfigured)?;
        self.resolution = Some(PoiResolution::from_text(
            text,
            self.text_builder.env(),
            self.text_builder.services(),
        )?);
        Ok(self)
    }

    pub fn resolution(&self) -> Option<&PoiResolution> {
        self.resolution.as_ref()
    }

    /// Build one element. Fails if no technique is configured.
    pub fn build(
        &self,
        text: &str,
        anchor: impl Into<LabelAnchor>,
        tile: &TileContext,
        icon: &IconRequest<'_>,
        attributes: Option<&AttributeMap>,
    ) -> LabelResult<LabelElement> {
        let Some(resolution) = &self.resolution else {
            log::error!("PoiBuilder::build called before with_technique");
            return Err(LabelError::TechniqueNotConfigured);
        };
        let mut element = self.text_builder.build(text, anchor, tile, attributes, None)?;
        attach_icon(resolution, &mut element, icon);
        Ok(element)
    }
}
