//! Zoom range fallback rules.
//!
//! Every fallback chain in the builders goes through [`first_defined`], and
//! the final element range is always produced by
//! [`compute_effective_zoom_range`].

use crate::labels::types::IconInfo;

/// Zoom levels across which a label may be displayed. Unset bounds do not
/// constrain.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZoomRange {
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl ZoomRange {
    pub fn new(min: Option<f32>, max: Option<f32>) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, zoom: f32) -> bool {
        let min_ok = self.min.map(|z| zoom >= z).unwrap_or(true);
        let max_ok = self.max.map(|z| zoom <= z).unwrap_or(true);
        min_ok && max_ok
    }

    /// Keep axes already set, fill the others from `fallback`.
    pub fn or(self, fallback: ZoomRange) -> ZoomRange {
        ZoomRange {
            min: first_defined([self.min, fallback.min]),
            max: first_defined([self.max, fallback.max]),
        }
    }

    /// Smallest range covering both inputs.
    pub fn union(self, other: ZoomRange) -> ZoomRange {
        ZoomRange {
            min: pick_min(self.min, other.min),
            max: pick_max(self.max, other.max),
        }
    }
}

/// First `Some` in the candidates, in order.
pub fn first_defined<T, I>(candidates: I) -> Option<T>
where
    I: IntoIterator<Item = Option<T>>,
{
    candidates.into_iter().flatten().next()
}

/// Smaller of the defined values.
pub fn pick_min(a: Option<f32>, b: Option<f32>) -> Option<f32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Larger of the defined values.
pub fn pick_max(a: Option<f32>, b: Option<f32>) -> Option<f32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Final zoom range of an element.
///
/// With icon info the result is the union of the icon and text ranges and
/// `base` is ignored. Without it, `base` (the generic technique range) wins
/// per axis and `text_fields` (the raw text-specific range) fills the gaps.
pub fn compute_effective_zoom_range(
    base: ZoomRange,
    text_fields: ZoomRange,
    icon_info: Option<&IconInfo>,
) -> ZoomRange {
    match icon_info {
        Some(info) => info.icon_zoom_range().union(info.text_zoom_range()),
        None => base.or(text_fields),
    }
}
