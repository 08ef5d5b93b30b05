//! Canonical intermediate representation.
//!
//! The IR tree is computed once per request by the builder and is read-only
//! for every downstream stage. All geometry is resolved (absolute and
//! root-relative bounds), all paints are reduced to concrete colors or
//! gradient expressions, and text is canonicalized. Nothing in the IR
//! refers back to the raw document.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::color::Rgba;

// ═══════════════════════════════════════════════════════════════════════════════
// GEOMETRY
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right > x && bottom > y {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersect(other).is_some()
    }
}

/// Quantize a measurement to whole pixels for token emission.
pub fn px(v: f64) -> i64 {
    v.round() as i64
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CornerRadii {
    pub tl: f64,
    pub tr: f64,
    pub br: f64,
    pub bl: f64,
}

impl CornerRadii {
    pub fn uniform(radius: f64) -> Self {
        CornerRadii {
            tl: radius,
            tr: radius,
            br: radius,
            bl: radius,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.tl <= 0.0 && self.tr <= 0.0 && self.br <= 0.0 && self.bl <= 0.0
    }

    /// The single shared radius, when all four corners agree.
    pub fn as_uniform(&self) -> Option<f64> {
        if px(self.tl) == px(self.tr) && px(self.tr) == px(self.br) && px(self.br) == px(self.bl) {
            Some(self.tl)
        } else {
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE KINDS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Frame,
    Group,
    Instance,
    Component,
    Text,
    Vector,
    BooleanOperation,
    Star,
    Line,
    Ellipse,
    RegularPolygon,
    Rectangle,
    Other,
}

impl NodeKind {
    pub fn from_raw(kind: &str) -> Self {
        match kind {
            "FRAME" | "SECTION" => NodeKind::Frame,
            "GROUP" => NodeKind::Group,
            "INSTANCE" => NodeKind::Instance,
            "COMPONENT" | "COMPONENT_SET" => NodeKind::Component,
            "TEXT" => NodeKind::Text,
            "VECTOR" => NodeKind::Vector,
            "BOOLEAN_OPERATION" => NodeKind::BooleanOperation,
            "STAR" => NodeKind::Star,
            "LINE" => NodeKind::Line,
            "ELLIPSE" => NodeKind::Ellipse,
            "REGULAR_POLYGON" => NodeKind::RegularPolygon,
            "RECTANGLE" => NodeKind::Rectangle,
            _ => NodeKind::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Frame => "FRAME",
            NodeKind::Group => "GROUP",
            NodeKind::Instance => "INSTANCE",
            NodeKind::Component => "COMPONENT",
            NodeKind::Text => "TEXT",
            NodeKind::Vector => "VECTOR",
            NodeKind::BooleanOperation => "BOOLEAN_OPERATION",
            NodeKind::Star => "STAR",
            NodeKind::Line => "LINE",
            NodeKind::Ellipse => "ELLIPSE",
            NodeKind::RegularPolygon => "REGULAR_POLYGON",
            NodeKind::Rectangle => "RECTANGLE",
            NodeKind::Other => "OTHER",
        }
    }

    /// Container kinds honor inherited background lists when they clip.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Frame | NodeKind::Group | NodeKind::Instance | NodeKind::Component
        )
    }

    pub fn is_vector_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::Vector
                | NodeKind::BooleanOperation
                | NodeKind::Star
                | NodeKind::Line
                | NodeKind::Ellipse
                | NodeKind::RegularPolygon
                | NodeKind::Rectangle
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LAYOUT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayoutMode {
    #[default]
    None,
    Horizontal,
    Vertical,
}

/// Only these mappings emit flex alignment tokens; anything else stays
/// token-silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisAlign {
    Start,
    Center,
    End,
    SpaceBetween,
    Baseline,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSpec {
    pub mode: LayoutMode,
    pub gap: f64,
    /// top, right, bottom, left
    pub padding: [f64; 4],
    pub wrap: bool,
    pub align_items: Option<AxisAlign>,
    pub justify_content: Option<AxisAlign>,
}

impl LayoutSpec {
    pub fn is_auto(&self) -> bool {
        self.mode != LayoutMode::None
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAINT & TEXT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolvedFill {
    Solid(Rgba),
    Gradient(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Background {
    Solid(Rgba),
    Gradient { css: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeSpec {
    pub color: Rgba,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextDecoration {
    Underline,
    Strikethrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextTransform {
    Upper,
    Lower,
    Title,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub family: String,
    pub size: f64,
    pub weight: u32,
    pub line_height: Option<f64>,
    pub letter_spacing: f64,
    pub align: TextAlign,
    pub decoration: Option<TextDecoration>,
    pub transform: Option<TextTransform>,
    pub color: Option<Rgba>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSpec {
    /// Whole run, whitespace-collapsed.
    pub content: String,
    /// Logical lines split at newline/bullet boundaries.
    pub lines: Vec<String>,
    pub style: TextStyle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconHint {
    pub is_icon: bool,
    pub tintable: bool,
    pub dominant_color: Option<Rgba>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// IR NODE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub own_visible: bool,
    pub visible_effective: bool,
    /// Absolute bounds as exported.
    pub bounds: Rect,
    /// Bounds translated so the request root sits at the origin.
    pub bounds_relative: Rect,
    /// Origin relative to the parent node, used for absolute positioning.
    pub offset: (f64, f64),
    pub layout: LayoutSpec,
    pub absolutely_positioned: bool,
    pub fills: Vec<ResolvedFill>,
    pub background: Option<Background>,
    pub stroke: Option<StrokeSpec>,
    pub corner_radii: CornerRadii,
    pub box_shadow: Option<String>,
    pub opacity: f64,
    pub clips_content: bool,
    pub text: Option<TextSpec>,
    pub rotation: f64,
    pub index: usize,
    pub z_index: Option<i32>,
    pub is_root: bool,
    pub icon: IconHint,
    pub class_tokens: Vec<String>,
    pub children: Vec<IrNode>,
}

impl IrNode {
    /// A wrapper that paints nothing of its own. Exempt from strict
    /// dimension/position/color assertions. A node with a derived
    /// background is never layout-only.
    pub fn is_layout_only(&self) -> bool {
        self.kind != NodeKind::Text
            && !self.clips_content
            && self.text.is_none()
            && self.background.is_none()
            && self.stroke.is_none()
            && self.box_shadow.is_none()
    }

    /// Does this node render anything on its own, ignoring children?
    pub fn has_own_contribution(&self) -> bool {
        self.text.as_ref().map_or(false, |t| !t.content.is_empty())
            || !self.fills.is_empty()
            || self.stroke.is_some()
            || self.box_shadow.is_some()
            || self.clips_content
    }

    pub fn reindex_children(&mut self) {
        for (i, child) in self.children.iter_mut().enumerate() {
            child.index = i;
        }
    }
}

/// Deterministic visual ordering: top-to-bottom, left-to-right, original
/// index as the final tie-break.
pub fn visual_cmp(a: &IrNode, b: &IrNode) -> Ordering {
    px(a.bounds.y)
        .cmp(&px(b.bounds.y))
        .then(px(a.bounds.x).cmp(&px(b.bounds.x)))
        .then(a.index.cmp(&b.index))
}
