//! Raw design-document wire types.
//!
//! Mirrors the node graph a design tool exports for one file: nodes with
//! geometry, paint lists, auto-layout fields, effects and text runs. The
//! payload arrives as JSON; every field the tool may omit is defaulted so a
//! sparse export still deserializes.
//!
//! These types are read-only inputs. Canonicalization happens in the IR
//! builder, never here.

use serde::{Deserialize, Serialize};

use crate::error::InputError;

// ═══════════════════════════════════════════════════════════════════════════════
// DOCUMENT & NODES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDocument {
    pub name: String,
    pub document: RawNode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Omitted by the exporter when true.
    pub visible: Option<bool>,
    pub opacity: Option<f64>,
    pub absolute_bounding_box: Option<RawRect>,
    pub fills: Vec<RawPaint>,
    pub strokes: Vec<RawPaint>,
    pub stroke_weight: Option<f64>,
    pub corner_radius: Option<f64>,
    pub rectangle_corner_radii: Option<[f64; 4]>,
    pub clips_content: Option<bool>,
    pub layout_mode: Option<String>,
    pub layout_wrap: Option<String>,
    pub layout_positioning: Option<String>,
    pub item_spacing: Option<f64>,
    pub padding_left: Option<f64>,
    pub padding_right: Option<f64>,
    pub padding_top: Option<f64>,
    pub padding_bottom: Option<f64>,
    pub primary_axis_align_items: Option<String>,
    pub counter_axis_align_items: Option<String>,
    pub effects: Vec<RawEffect>,
    pub characters: Option<String>,
    pub style: Option<RawTextStyle>,
    pub rotation: Option<f64>,
    pub children: Vec<RawNode>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawVector {
    pub x: f64,
    pub y: f64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAINTS & EFFECTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Channels are 0..1 as exported, alpha included.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPaint {
    #[serde(rename = "type")]
    pub kind: String,
    pub visible: Option<bool>,
    pub opacity: Option<f64>,
    pub color: Option<RawColor>,
    pub gradient_stops: Vec<RawGradientStop>,
    pub gradient_handle_positions: Vec<RawVector>,
}

impl RawPaint {
    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(true) && self.opacity.unwrap_or(1.0) > 0.0
    }

    pub fn is_solid(&self) -> bool {
        self.kind == "SOLID"
    }

    pub fn is_gradient(&self) -> bool {
        self.kind.starts_with("GRADIENT_")
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawGradientStop {
    pub position: f64,
    pub color: RawColor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEffect {
    #[serde(rename = "type")]
    pub kind: String,
    pub visible: Option<bool>,
    pub offset: Option<RawVector>,
    pub radius: Option<f64>,
    pub spread: Option<f64>,
    pub color: Option<RawColor>,
}

impl RawEffect {
    pub fn is_visible_shadow(&self) -> bool {
        self.visible.unwrap_or(true) && self.kind == "DROP_SHADOW"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEXT STYLE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTextStyle {
    pub font_family: Option<String>,
    /// e.g. "Inter-SemiBold"; weight is inferred from this when the numeric
    /// field is absent.
    pub font_post_script_name: Option<String>,
    pub font_weight: Option<f64>,
    pub font_size: Option<f64>,
    pub line_height_px: Option<f64>,
    pub letter_spacing: Option<f64>,
    pub text_align_horizontal: Option<String>,
    pub text_decoration: Option<String>,
    pub text_case: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOOKUP & PARSING
// ═══════════════════════════════════════════════════════════════════════════════

pub fn parse_document(json: &str) -> Result<RawDocument, InputError> {
    serde_json::from_str(json).map_err(|e| InputError::MalformedPayload(e.to_string()))
}

/// Depth-first lookup by node id.
pub fn find_node<'a>(root: &'a RawNode, id: &str) -> Option<&'a RawNode> {
    if root.id == id {
        return Some(root);
    }
    for child in &root.children {
        if let Some(found) = find_node(child, id) {
            return Some(found);
        }
    }
    None
}
