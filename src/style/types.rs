//! Technique types: the style rules attached to map features.
//!
//! Techniques arrive as camelCase JSON from the decoder. Fields that may be
//! data-driven are `Option<StyleValue>`; a JSON `null` is the same as an
//! absent field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Technique family. Decides which overlap/reserve-space fields apply to text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TechniqueName {
    /// Pure text label.
    #[default]
    Text,
    /// Point of interest: icon with optional text.
    LabeledIcon,
    /// Icons repeated along a line.
    LineMarker,
}

impl TechniqueName {
    /// Whether the technique may carry an icon in addition to text.
    pub fn is_icon_bearing(self) -> bool {
        !matches!(self, TechniqueName::Text)
    }
}

/// A technique field value: a literal or an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    /// Literal number.
    Number(f64),
    /// Literal boolean.
    Bool(bool),
    /// Literal string (colors, names).
    String(String),
    /// Expression (e.g., ["get", "rank"]).
    Expression(Value),
}

impl StyleValue {
    /// Literal number or None for expressions and other literals.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StyleValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// True when the value needs an environment to be resolved.
    pub fn is_expression(&self) -> bool {
        matches!(self, StyleValue::Expression(Value::Array(_)))
    }

    /// The value as plain JSON.
    pub fn to_json(&self) -> Value {
        match self {
            StyleValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            StyleValue::Bool(b) => Value::Bool(*b),
            StyleValue::String(s) => Value::String(s.clone()),
            StyleValue::Expression(expr) => expr.clone(),
        }
    }
}

impl From<f64> for StyleValue {
    fn from(value: f64) -> Self {
        StyleValue::Number(value)
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        StyleValue::String(value.to_string())
    }
}

impl From<Value> for StyleValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(StyleValue::Number)
                .unwrap_or(StyleValue::Expression(Value::Number(n))),
            Value::Bool(b) => StyleValue::Bool(b),
            Value::String(s) => StyleValue::String(s),
            other => StyleValue::Expression(other),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontVariant {
    #[default]
    Regular,
    AllCaps,
    SmallCaps,
}

/// Line wrapping behaviour for multi-line labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrappingMode {
    None,
    Character,
    #[default]
    Word,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorizontalAlignment {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalAlignment {
    Above,
    #[default]
    Center,
    Below,
}

/// A text, POI or line-marker technique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Technique {
    /// Technique family.
    pub name: TechniqueName,
    /// Technique identity within its style set, used as the style cache key.
    /// Techniques without one are never cached.
    #[serde(rename = "_index")]
    pub index: Option<usize>,

    // Placement
    pub priority: Option<StyleValue>,
    pub fade_near: Option<StyleValue>,
    pub fade_far: Option<StyleValue>,
    pub min_zoom_level: Option<StyleValue>,
    pub max_zoom_level: Option<StyleValue>,
    pub text_min_zoom_level: Option<StyleValue>,
    pub text_max_zoom_level: Option<StyleValue>,
    pub icon_min_zoom_level: Option<StyleValue>,
    pub icon_max_zoom_level: Option<StyleValue>,
    pub x_offset: Option<StyleValue>,
    pub y_offset: Option<StyleValue>,
    pub distance_scale: Option<f32>,
    pub may_overlap: Option<bool>,
    pub reserve_space: Option<bool>,
    pub text_may_overlap: Option<bool>,
    pub text_reserve_space: Option<bool>,
    pub icon_may_overlap: Option<bool>,
    pub icon_reserve_space: Option<bool>,
    pub always_on_top: Option<bool>,
    pub kind: Option<String>,
    pub style: Option<String>,
    pub text_fade_time: Option<f32>,

    // Icon
    pub icon_color: Option<StyleValue>,
    pub icon_brightness: Option<f32>,
    pub text_is_optional: Option<bool>,
    pub icon_is_optional: Option<bool>,
    pub render_text_during_movements: Option<bool>,

    // Text render style
    pub font_name: Option<String>,
    pub size: Option<StyleValue>,
    pub background_size: Option<StyleValue>,
    pub font_style: Option<FontStyle>,
    pub font_variant: Option<FontVariant>,
    pub rotation: Option<f32>,
    pub color: Option<StyleValue>,
    pub background_color: Option<StyleValue>,
    pub opacity: Option<StyleValue>,
    pub background_opacity: Option<StyleValue>,

    // Text layout style
    pub tracking: Option<f32>,
    pub leading: Option<f32>,
    pub max_lines: Option<u32>,
    pub line_width: Option<f32>,
    pub canvas_rotation: Option<f32>,
    pub line_rotation: Option<f32>,
    pub wrapping_mode: Option<WrappingMode>,
    pub h_alignment: Option<HorizontalAlignment>,
    pub v_alignment: Option<VerticalAlignment>,
}

impl Technique {
    /// Create an empty technique of the given family.
    pub fn new(name: TechniqueName) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Decode a technique from its JSON form.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Set the style cache identity.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

/// Parse a CSS color string to RGBA.
pub fn parse_color_string(s: &str) -> Option<[f32; 4]> {
    let s = s.trim();

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex_color(hex);
    }
    if s.starts_with("rgb") {
        return parse_rgb_color(s);
    }
    if s.starts_with("hsl") {
        return parse_hsl_color(s);
    }

    match s.to_lowercase().as_str() {
        "black" => Some([0.0, 0.0, 0.0, 1.0]),
        "white" => Some([1.0, 1.0, 1.0, 1.0]),
        "red" => Some([1.0, 0.0, 0.0, 1.0]),
        "green" => Some([0.0, 0.5, 0.0, 1.0]),
        "blue" => Some([0.0, 0.0, 1.0, 1.0]),
        "yellow" => Some([1.0, 1.0, 0.0, 1.0]),
        "cyan" => Some([0.0, 1.0, 1.0, 1.0]),
        "magenta" => Some([1.0, 0.0, 1.0, 1.0]),
        "gray" | "grey" => Some([0.5, 0.5, 0.5, 1.0]),
        "orange" => Some([1.0, 0.647, 0.0, 1.0]),
        "transparent" => Some([0.0, 0.0, 0.0, 0.0]),
        _ => None,
    }
}

/// Convert a packed `0xRRGGBB` integer to RGBA.
pub fn color_from_packed(rgb: u32) -> [f32; 4] {
    [
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
        1.0,
    ]
}

fn parse_hex_color(hex: &str) -> Option<[f32; 4]> {
    if !hex.is_ascii() {
        return None;
    }
    // Short forms repeat each digit: #RGB(A) -> #RRGGBB(AA)
    let expanded: String = match hex.len() {
        3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| -> Option<f32> {
        let byte = u8::from_str_radix(&expanded[i * 2..i * 2 + 2], 16).ok()?;
        Some(byte as f32 / 255.0)
    };
    let alpha = if expanded.len() == 8 { channel(3)? } else { 1.0 };
    Some([channel(0)?, channel(1)?, channel(2)?, alpha])
}

fn function_args<'a>(s: &'a str, names: &[&str]) -> Option<Vec<&'a str>> {
    let mut inner = s;
    for name in names {
        if let Some(rest) = inner.strip_prefix(name) {
            inner = rest;
            break;
        }
    }
    let inner = inner.strip_prefix('(')?.strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }
    Some(parts)
}

fn parse_rgb_color(s: &str) -> Option<[f32; 4]> {
    let parts = function_args(s, &["rgba", "rgb"])?;

    let mut rgb = [0.0f32; 3];
    for (slot, part) in rgb.iter_mut().zip(&parts) {
        let value: f32 = part.trim_end_matches('%').parse().ok()?;
        *slot = if part.ends_with('%') {
            value / 100.0
        } else {
            value / 255.0
        };
    }
    let a = parts.get(3).and_then(|p| p.parse().ok()).unwrap_or(1.0);

    Some([rgb[0], rgb[1], rgb[2], a])
}

fn parse_hsl_color(s: &str) -> Option<[f32; 4]> {
    let parts = function_args(s, &["hsla", "hsl"])?;

    let h: f32 = parts[0].parse().ok()?;
    let sat: f32 = parts[1].trim_end_matches('%').parse::<f32>().ok()? / 100.0;
    let l: f32 = parts[2].trim_end_matches('%').parse::<f32>().ok()? / 100.0;
    let a = parts.get(3).and_then(|p| p.parse().ok()).unwrap_or(1.0);

    let (r, g, b) = hsl_to_rgb(h / 360.0, sat, l);
    Some([r, g, b, a])
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s == 0.0 {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
