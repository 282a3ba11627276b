//! Canonical color handles.
//!
//! Resolved icon colors are interned so that labels sharing a color share one
//! allocation. The cache holds at most one handle per RGBA value.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::config::DEFAULT_COLOR_CACHE_CAPACITY;
use crate::style::{color_from_packed, parse_color_string};

/// RGBA color with channels in 0..1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub rgba: [f32; 4],
}

impl Color {
    pub fn r(&self) -> f32 {
        self.rgba[0]
    }

    pub fn g(&self) -> f32 {
        self.rgba[1]
    }

    pub fn b(&self) -> f32 {
        self.rgba[2]
    }

    pub fn a(&self) -> f32 {
        self.rgba[3]
    }
}

/// Shared handle to a canonical color.
pub type ColorHandle = Arc<Color>;

type ColorKey = [u32; 4];

static SHARED: OnceCell<Arc<ColorCache>> = OnceCell::new();

/// Interning cache from color values to [`ColorHandle`]s.
#[derive(Debug)]
pub struct ColorCache {
    entries: Mutex<HashMap<ColorKey, ColorHandle>>,
    capacity: usize,
}

impl ColorCache {
    /// Create a cache that is cleared once it holds `capacity` colors.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Process-wide cache shared by all builders that do not bring their own.
    pub fn shared() -> Arc<ColorCache> {
        Self::shared_with_capacity(DEFAULT_COLOR_CACHE_CAPACITY)
    }

    /// Process-wide cache, created with `capacity` on first use.
    ///
    /// Later calls return the existing cache whatever capacity they ask for.
    pub fn shared_with_capacity(capacity: usize) -> Arc<ColorCache> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(ColorCache::with_capacity(capacity))))
    }

    /// Canonical handle for a raw color value.
    ///
    /// Accepts CSS color strings, packed `0xRRGGBB` integers and RGB(A)
    /// arrays in 0..1. Returns `None` for values that are not colors.
    pub fn get_color(&self, raw: &Value) -> Option<ColorHandle> {
        let Some(rgba) = parse_raw_color(raw) else {
            log::warn!("Ignoring unparsable color value {raw}");
            return None;
        };
        Some(self.intern(rgba))
    }

    /// Canonical handle for an RGBA value.
    pub fn intern(&self, rgba: [f32; 4]) -> ColorHandle {
        let key = rgba.map(f32::to_bits);
        let mut entries = self.lock();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            log::debug!("Color cache full ({} entries), clearing", entries.len());
            entries.clear();
        }
        Arc::clone(
            entries
                .entry(key)
                .or_insert_with(|| Arc::new(Color { rgba })),
        )
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all entries. Handles already given out stay valid.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ColorKey, ColorHandle>> {
        // The map stays consistent even if a holder panicked.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ColorCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_COLOR_CACHE_CAPACITY)
    }
}

fn parse_raw_color(raw: &Value) -> Option<[f32; 4]> {
    match raw {
        Value::String(s) => parse_color_string(s),
        Value::Number(n) => {
            let packed = n.as_u64().filter(|v| *v <= 0xff_ffff)?;
            Some(color_from_packed(packed as u32))
        }
        Value::Array(channels) if channels.len() == 3 || channels.len() == 4 => {
            let mut rgba = [1.0f32; 4];
            for (slot, channel) in rgba.iter_mut().zip(channels) {
                *slot = channel.as_f64()? as f32;
            }
            Some(rgba)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_handles() {
        let cache = ColorCache::with_capacity(16);
        let a = cache.get_color(&json!("#ff0000")).unwrap();
        let b = cache.get_color(&json!("red")).unwrap();
        let c = cache.get_color(&json!(0xff0000)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 1);
        assert_eq!(a.rgba, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_array_colors() {
        let cache = ColorCache::default();
        let color = cache.get_color(&json!([0.0, 0.5, 1.0])).unwrap();
        assert_eq!(color.rgba, [0.0, 0.5, 1.0, 1.0]);
        assert!(cache.get_color(&json!([1.0])).is_none());
    }

    #[test]
    fn test_unparsable_color() {
        let cache = ColorCache::default();
        assert!(cache.get_color(&json!("not-a-color")).is_none());
        assert!(cache.get_color(&json!(true)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_clears() {
        let cache = ColorCache::with_capacity(2);
        let first = cache.intern([0.0, 0.0, 0.0, 1.0]);
        cache.intern([1.0, 1.0, 1.0, 1.0]);
        cache.intern([0.5, 0.5, 0.5, 1.0]);
        assert_eq!(cache.len(), 1);
        assert_eq!(first.rgba, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_concurrent_interning_is_canonical() {
        let cache = Arc::new(ColorCache::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.intern([0.2, 0.4, 0.6, 1.0]))
            })
            .collect();
        let colors: Vec<ColorHandle> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(colors.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
    }
}
