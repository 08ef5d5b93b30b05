//! Paint and color resolution.
//!
//! Design exports carry RGBA channels in 0..1 with a separate per-paint
//! opacity; everything downstream wants CSS-shaped strings. All formatting
//! here is canonical: lowercase hex, no spaces inside functional notation
//! (class token values must stay one token), alpha trimmed of trailing
//! zeros. The validator accepts three equivalent encodings of a
//! translucent color (rgba(), 8-digit hex, and hex with slash opacity),
//! so `variants` enumerates all of them.

use serde::{Deserialize, Serialize};

use crate::schema::{RawColor, RawPaint};

// ═══════════════════════════════════════════════════════════════════════════════
// RGBA
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// 0..1, already combined with paint opacity, rounded to 2 decimals.
    pub a: f64,
}

fn channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub fn format_alpha(a: f64) -> String {
    let rounded = (a * 100.0).round() / 100.0;
    let s = format!("{:.2}", rounded);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

impl Rgba {
    pub fn from_raw(color: &RawColor, paint_opacity: f64) -> Self {
        Rgba {
            r: channel(color.r),
            g: channel(color.g),
            b: channel(color.b),
            a: ((color.a * paint_opacity).clamp(0.0, 1.0) * 100.0).round() / 100.0,
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.a >= 0.995
    }

    pub fn is_opaque_black(&self) -> bool {
        self.is_opaque() && self.r == 0 && self.g == 0 && self.b == 0
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Canonical class-token value: hex when opaque, rgba() otherwise.
    pub fn css_value(&self) -> String {
        if self.is_opaque() {
            self.hex()
        } else {
            format!(
                "rgba({},{},{},{})",
                self.r,
                self.g,
                self.b,
                format_alpha(self.a)
            )
        }
    }

    /// Every encoding the validator treats as equal to this color.
    pub fn variants(&self) -> Vec<String> {
        if self.is_opaque() {
            return vec![self.hex()];
        }
        vec![
            format!(
                "rgba({},{},{},{})",
                self.r,
                self.g,
                self.b,
                format_alpha(self.a)
            ),
            format!("{}{:02x}", self.hex(), (self.a * 255.0).round() as u8),
            format!("{}/{}", self.hex(), (self.a * 100.0).round() as i64),
        ]
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAINT RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolve a solid paint to a combined color. Non-solid or colorless paints
/// yield nothing.
pub fn resolve_solid(paint: &RawPaint) -> Option<Rgba> {
    if !paint.is_solid() || !paint.is_visible() {
        return None;
    }
    paint
        .color
        .as_ref()
        .map(|c| Rgba::from_raw(c, paint.opacity.unwrap_or(1.0)))
}

/// Render a gradient paint as a CSS gradient expression in class-token form
/// (underscores instead of spaces, stops as percentages).
pub fn gradient_css(paint: &RawPaint) -> Option<String> {
    if !paint.is_gradient() || !paint.is_visible() || paint.gradient_stops.is_empty() {
        return None;
    }
    let opacity = paint.opacity.unwrap_or(1.0);
    let stops: Vec<String> = paint
        .gradient_stops
        .iter()
        .map(|stop| {
            let color = Rgba::from_raw(&stop.color, opacity);
            let pos = (stop.position.clamp(0.0, 1.0) * 100.0).round() as i64;
            format!("{}_{}%", color.css_value(), pos)
        })
        .collect();

    if paint.kind == "GRADIENT_RADIAL" {
        return Some(format!("radial-gradient({})", stops.join(",")));
    }

    // Linear: CSS angles run clockwise from the up direction; gradient
    // handles give the axis as two normalized points.
    let angle = if paint.gradient_handle_positions.len() >= 2 {
        let start = paint.gradient_handle_positions[0];
        let end = paint.gradient_handle_positions[1];
        let deg = (end.y - start.y).atan2(end.x - start.x).to_degrees() + 90.0;
        deg.rem_euclid(360.0).round() as i64
    } else {
        180
    };
    Some(format!("linear-gradient({}deg,{})", angle, stops.join(",")))
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPARISON
// ═══════════════════════════════════════════════════════════════════════════════

/// Fold a color or gradient value into comparison form: lowercase, with the
/// space/underscore distinction erased.
pub fn normalize_value(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect()
}

/// Does a class-token value denote this color in any accepted encoding?
pub fn matches_solid(value: &str, color: &Rgba) -> bool {
    let normalized = normalize_value(value);
    color
        .variants()
        .iter()
        .any(|v| normalize_value(v) == normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawGradientStop;

    fn raw(r: f64, g: f64, b: f64, a: f64) -> RawColor {
        RawColor { r, g, b, a }
    }

    #[test]
    fn test_hex_formatting() {
        let c = Rgba::from_raw(&raw(0.0667, 0.1333, 0.2, 1.0), 1.0);
        assert_eq!(c.hex(), "#112233");
        assert_eq!(c.css_value(), "#112233");
    }

    #[test]
    fn test_alpha_combination() {
        let c = Rgba::from_raw(&raw(1.0, 0.0, 0.0, 0.8), 0.625);
        assert_eq!(c.a, 0.5);
        assert_eq!(c.css_value(), "rgba(255,0,0,0.5)");
    }

    #[test]
    fn test_variant_equivalence() {
        let c = Rgba::from_raw(&raw(1.0, 0.0, 0.0, 0.5), 1.0);
        assert!(matches_solid("rgba(255,0,0,0.5)", &c));
        assert!(matches_solid("#ff000080", &c));
        assert!(matches_solid("#ff0000/50", &c));
        assert!(!matches_solid("#ff0000", &c));
    }

    #[test]
    fn test_opaque_black_detection() {
        assert!(Rgba::from_raw(&raw(0.0, 0.0, 0.0, 1.0), 1.0).is_opaque_black());
        assert!(!Rgba::from_raw(&raw(0.0, 0.0, 0.0, 0.5), 1.0).is_opaque_black());
    }

    #[test]
    fn test_linear_gradient() {
        let paint = RawPaint {
            kind: "GRADIENT_LINEAR".to_string(),
            gradient_stops: vec![
                RawGradientStop {
                    position: 0.0,
                    color: raw(1.0, 0.0, 0.0, 1.0),
                },
                RawGradientStop {
                    position: 1.0,
                    color: raw(0.0, 0.0, 1.0, 1.0),
                },
            ],
            ..Default::default()
        };
        let css = gradient_css(&paint).unwrap();
        assert_eq!(css, "linear-gradient(180deg,#ff0000_0%,#0000ff_100%)");
    }

    #[test]
    fn test_normalize_erases_spacing() {
        assert_eq!(
            normalize_value("rgba(255, 0, 0, 0.5)"),
            normalize_value("rgba(255,0,0,0.5)")
        );
        assert_eq!(
            normalize_value("linear-gradient(90deg, #fff 0%)"),
            normalize_value("linear-gradient(90deg,#fff_0%)")
        );
    }
}
