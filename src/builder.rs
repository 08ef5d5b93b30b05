//! IR Builder.
//!
//! Compiles the raw node tree into the canonical IR. A pure function of its
//! input: the same document and target always produce the same tree. The
//! recursive descent carries an explicit immutable `Inherited` accumulator
//! (clip rectangle, visibility chain, background list) instead of ambient
//! state.
//!
//! Canonicalization rules live here and nowhere else:
//! - relative bounds derive from the request root's absolute origin;
//! - effective visibility folds the ancestor chain, own opacity and the
//!   inherited clip;
//! - a container's own paint list always wins over inherited background
//!   lists, which only clipping containers honor in full;
//! - malformed per-node geometry defaults to zero rather than aborting.

use log::{debug, warn};

use crate::classes::synthesize_classes;
use crate::color::{gradient_css, resolve_solid, Rgba};
use crate::config::CompilerConfig;
use crate::error::{CompileError, InputError};
use crate::ir::{
    visual_cmp, AxisAlign, Background, CornerRadii, IconHint, IrNode, LayoutMode, LayoutSpec,
    NodeKind, Rect, ResolvedFill, StrokeSpec, TextAlign, TextDecoration, TextSpec, TextStyle,
    TextTransform,
};
use crate::schema::{find_node, RawDocument, RawNode, RawPaint};
use crate::visitor::{walk_children_mut, IrVisitorMut};

// ═══════════════════════════════════════════════════════════════════════════════
// INHERITED CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
struct Inherited<'doc> {
    root_origin: (f64, f64),
    clip: Option<Rect>,
    visible: bool,
    /// Background paint list carried down from the nearest painted ancestor.
    background_fills: &'doc [RawPaint],
    parent_auto_layout: bool,
    parent_origin: (f64, f64),
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn build_ir(
    doc: &RawDocument,
    target_id: &str,
    config: &CompilerConfig,
) -> Result<IrNode, CompileError> {
    let raw_root = find_node(&doc.document, target_id)
        .ok_or_else(|| InputError::NodeNotFound(target_id.to_string()))?;
    let origin = node_bounds(raw_root);
    let ctx = Inherited {
        root_origin: (origin.x, origin.y),
        clip: None,
        visible: true,
        background_fills: &[],
        parent_auto_layout: true,
        parent_origin: (origin.x, origin.y),
    };
    let mut root = build_node(raw_root, ctx, true, 0, config);
    root.class_tokens = synthesize_classes(&root);
    debug!(
        "built IR for {} ({} top-level children)",
        target_id,
        root.children.len()
    );
    Ok(root)
}

/// Conservative pruning: a subtree is removed only when it is provably
/// invisible, paints nothing of its own, and kept no children. Anything
/// ambiguous stays. Indices are reassigned afterwards.
pub fn filter_hidden(root: &mut IrNode) {
    struct HiddenPruner;

    impl IrVisitorMut for HiddenPruner {
        fn visit_children(&mut self, children: &mut Vec<IrNode>) {
            walk_children_mut(self, children);
            children.retain(|child| {
                child.visible_effective
                    || child.has_own_contribution()
                    || !child.children.is_empty()
            });
            for (i, child) in children.iter_mut().enumerate() {
                child.index = i;
            }
        }
    }

    HiddenPruner.visit_node(root);
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE CONSTRUCTION
// ═══════════════════════════════════════════════════════════════════════════════

fn build_node(
    raw: &RawNode,
    ctx: Inherited<'_>,
    is_root: bool,
    index: usize,
    config: &CompilerConfig,
) -> IrNode {
    let kind = NodeKind::from_raw(&raw.kind);
    let bounds = node_bounds(raw);
    let own_visible = raw.visible.unwrap_or(true);
    let opacity = raw.opacity.unwrap_or(1.0).clamp(0.0, 1.0);
    let clips_content = raw.clips_content.unwrap_or(false);

    let inside_clip = ctx.clip.map_or(true, |clip| bounds.intersects(&clip));
    let visible_effective = own_visible && ctx.visible && opacity > 0.01 && inside_clip;

    let layout = resolve_layout(raw);
    let absolutely_positioned = !is_root
        && (raw.layout_positioning.as_deref() == Some("ABSOLUTE") || !ctx.parent_auto_layout);

    let (fills, background) = resolve_fills(raw, kind, clips_content, ctx.background_fills, config);
    let stroke = resolve_stroke(raw);
    let corner_radii = resolve_radii(raw);
    let box_shadow = resolve_shadow(raw);
    let text = if kind == NodeKind::Text {
        Some(resolve_text(raw))
    } else {
        None
    };

    // Children inherit the tightened clip and this node's paint list when it
    // has one; a clip that no longer intersects collapses to a zero rect so
    // everything beneath resolves invisible.
    let next_clip = if clips_content {
        Some(match ctx.clip {
            Some(clip) => clip
                .intersect(&bounds)
                .unwrap_or_else(|| Rect::new(bounds.x, bounds.y, 0.0, 0.0)),
            None => bounds,
        })
    } else {
        ctx.clip
    };
    let own_has_visible_fills = raw.fills.iter().any(|p| p.is_visible());
    let child_background: &[RawPaint] = if own_has_visible_fills {
        &raw.fills
    } else {
        ctx.background_fills
    };
    let child_ctx = Inherited {
        root_origin: ctx.root_origin,
        clip: next_clip,
        visible: ctx.visible && own_visible && opacity > 0.01,
        background_fills: child_background,
        parent_auto_layout: layout.is_auto(),
        parent_origin: (bounds.x, bounds.y),
    };

    let mut children: Vec<IrNode> = raw
        .children
        .iter()
        .enumerate()
        .map(|(i, child)| build_node(child, child_ctx, false, i, config))
        .collect();

    // Free-positioned sets re-sort into canonical visual order; auto-layout
    // children keep the authored order.
    if !layout.is_auto() && children.len() > 1 {
        children.sort_by(visual_cmp);
    }
    for (i, child) in children.iter_mut().enumerate() {
        child.index = i;
    }
    if !layout.is_auto() {
        assign_stack_order(&mut children);
    }
    for child in &mut children {
        child.class_tokens = synthesize_classes(child);
    }

    IrNode {
        id: raw.id.clone(),
        name: raw.name.clone(),
        kind,
        own_visible,
        visible_effective,
        bounds,
        bounds_relative: Rect::new(
            bounds.x - ctx.root_origin.0,
            bounds.y - ctx.root_origin.1,
            bounds.w,
            bounds.h,
        ),
        offset: (bounds.x - ctx.parent_origin.0, bounds.y - ctx.parent_origin.1),
        layout,
        absolutely_positioned,
        fills,
        background,
        stroke,
        corner_radii,
        box_shadow,
        opacity,
        clips_content,
        text,
        rotation: raw.rotation.unwrap_or(0.0),
        index,
        z_index: None,
        is_root,
        icon: classify_icon(raw, kind, bounds, config),
        class_tokens: Vec::new(),
        children,
    }
}

fn node_bounds(raw: &RawNode) -> Rect {
    match &raw.absolute_bounding_box {
        Some(b) if b.x.is_finite() && b.y.is_finite() && b.width.is_finite() && b.height.is_finite() => {
            Rect::new(b.x, b.y, b.width.max(0.0), b.height.max(0.0))
        }
        Some(_) => {
            warn!("node {} has non-finite bounds, zeroing", raw.id);
            Rect::default()
        }
        None => Rect::default(),
    }
}

/// Overlapping absolutely positioned siblings get their stacking order made
/// explicit; everything else stays implicit.
fn assign_stack_order(children: &mut [IrNode]) {
    for i in 1..children.len() {
        if !children[i].absolutely_positioned {
            continue;
        }
        let overlaps = children[..i]
            .iter()
            .any(|earlier| earlier.bounds.intersects(&children[i].bounds));
        if overlaps {
            children[i].z_index = Some(i as i32);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAINT RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

fn resolve_fills(
    raw: &RawNode,
    kind: NodeKind,
    clips_content: bool,
    inherited: &[RawPaint],
    config: &CompilerConfig,
) -> (Vec<ResolvedFill>, Option<Background>) {
    let own: Vec<&RawPaint> = raw.fills.iter().filter(|p| p.is_visible()).collect();
    let effective: Vec<&RawPaint> = if !own.is_empty() {
        own
    } else if kind.is_container() {
        let inherited_visible = inherited.iter().filter(|p| p.is_visible());
        if clips_content || !config.suppress_inherited_black_fill {
            inherited_visible.collect()
        } else {
            // Opaque pure black on a non-clipping wrapper is treated as an
            // editor artifact, not an intended background.
            inherited_visible
                .filter(|p| resolve_solid(p).map_or(true, |c| !c.is_opaque_black()))
                .collect()
        }
    } else {
        Vec::new()
    };

    let fills: Vec<ResolvedFill> = effective
        .iter()
        .filter_map(|paint| {
            if paint.is_solid() {
                resolve_solid(paint)
                    .filter(|c| c.a > 0.01)
                    .map(ResolvedFill::Solid)
            } else if paint.is_gradient() {
                gradient_css(paint).map(ResolvedFill::Gradient)
            } else {
                None
            }
        })
        .collect();

    // A text node's fills paint the glyphs, not a surface behind them.
    let background = if kind == NodeKind::Text {
        None
    } else {
        fills.first().map(|fill| match fill {
            ResolvedFill::Solid(color) => Background::Solid(*color),
            ResolvedFill::Gradient(css) => Background::Gradient { css: css.clone() },
        })
    };
    (fills, background)
}

fn resolve_stroke(raw: &RawNode) -> Option<StrokeSpec> {
    raw.strokes
        .iter()
        .filter_map(resolve_solid)
        .find(|c| c.a > 0.01)
        .map(|color| StrokeSpec {
            color,
            weight: raw.stroke_weight.unwrap_or(1.0).max(0.0),
        })
}

fn resolve_radii(raw: &RawNode) -> CornerRadii {
    if let Some([tl, tr, br, bl]) = raw.rectangle_corner_radii {
        return CornerRadii { tl, tr, br, bl };
    }
    match raw.corner_radius {
        Some(r) if r > 0.0 => CornerRadii::uniform(r),
        _ => CornerRadii::default(),
    }
}

fn resolve_shadow(raw: &RawNode) -> Option<String> {
    let shadows: Vec<String> = raw
        .effects
        .iter()
        .filter(|e| e.is_visible_shadow())
        .map(|effect| {
            let offset = effect.offset.unwrap_or_default();
            let color = effect
                .color
                .map(|c| Rgba::from_raw(&c, 1.0))
                .unwrap_or(Rgba {
                    r: 0,
                    g: 0,
                    b: 0,
                    a: 0.25,
                });
            format!(
                "{}px_{}px_{}px_{}px_{}",
                crate::ir::px(offset.x),
                crate::ir::px(offset.y),
                crate::ir::px(effect.radius.unwrap_or(0.0)),
                crate::ir::px(effect.spread.unwrap_or(0.0)),
                color.css_value()
            )
        })
        .collect();
    if shadows.is_empty() {
        None
    } else {
        Some(shadows.join(","))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEXT CANONICALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Non-breaking spaces become regular spaces, whitespace runs collapse, and
/// logical lines split at newline/bullet boundaries.
pub fn canonicalize_text(raw: &str) -> (String, Vec<String>) {
    let normalized = raw.replace('\u{00a0}', " ");
    let content = collapse_whitespace(&normalized);
    let lines: Vec<String> = normalized
        .replace('\u{2022}', "\n")
        .split('\n')
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect();
    (content, lines)
}

fn resolve_text(raw: &RawNode) -> TextSpec {
    let (content, lines) = canonicalize_text(raw.characters.as_deref().unwrap_or(""));
    let style = raw.style.clone().unwrap_or_default();

    let weight = match style.font_weight {
        Some(w) if w >= 100.0 => ((w / 100.0).round() as u32 * 100).clamp(100, 900),
        _ => style
            .font_post_script_name
            .as_deref()
            .and_then(infer_weight)
            .unwrap_or(400),
    };

    let color = raw
        .fills
        .iter()
        .filter_map(resolve_solid)
        .find(|c| c.a > 0.01);

    TextSpec {
        content,
        lines,
        style: TextStyle {
            family: style.font_family.unwrap_or_default(),
            size: style.font_size.unwrap_or(16.0),
            weight,
            line_height: style.line_height_px.filter(|lh| *lh > 0.0),
            letter_spacing: style.letter_spacing.unwrap_or(0.0),
            align: match style.text_align_horizontal.as_deref() {
                Some("CENTER") => TextAlign::Center,
                Some("RIGHT") => TextAlign::Right,
                Some("JUSTIFIED") => TextAlign::Justified,
                _ => TextAlign::Left,
            },
            decoration: match style.text_decoration.as_deref() {
                Some("UNDERLINE") => Some(TextDecoration::Underline),
                Some("STRIKETHROUGH") => Some(TextDecoration::Strikethrough),
                _ => None,
            },
            transform: match style.text_case.as_deref() {
                Some("UPPER") => Some(TextTransform::Upper),
                Some("LOWER") => Some(TextTransform::Lower),
                Some("TITLE") => Some(TextTransform::Title),
                _ => None,
            },
            color,
        },
    }
}

/// Style names like "Inter-SemiBold" carry the weight when the numeric field
/// is missing. Compound names are checked before their substrings.
fn infer_weight(style_name: &str) -> Option<u32> {
    let name = style_name.to_lowercase();
    if name.contains("extrabold") || name.contains("extra bold") || name.contains("heavy") {
        Some(800)
    } else if name.contains("semibold") || name.contains("demibold") || name.contains("semi bold") {
        Some(600)
    } else if name.contains("extralight") || name.contains("ultralight") {
        Some(200)
    } else if name.contains("thin") {
        Some(100)
    } else if name.contains("light") {
        Some(300)
    } else if name.contains("medium") {
        Some(500)
    } else if name.contains("black") {
        Some(900)
    } else if name.contains("bold") {
        Some(700)
    } else if name.contains("regular") || name.contains("book") || name.contains("normal") {
        Some(400)
    } else {
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LAYOUT
// ═══════════════════════════════════════════════════════════════════════════════

fn map_axis_align(value: Option<&str>) -> Option<AxisAlign> {
    match value {
        Some("MIN") => Some(AxisAlign::Start),
        Some("CENTER") => Some(AxisAlign::Center),
        Some("MAX") => Some(AxisAlign::End),
        Some("SPACE_BETWEEN") => Some(AxisAlign::SpaceBetween),
        Some("BASELINE") => Some(AxisAlign::Baseline),
        _ => None,
    }
}

fn resolve_layout(raw: &RawNode) -> LayoutSpec {
    let mode = match raw.layout_mode.as_deref() {
        Some("HORIZONTAL") => LayoutMode::Horizontal,
        Some("VERTICAL") => LayoutMode::Vertical,
        _ => LayoutMode::None,
    };
    if mode == LayoutMode::None {
        return LayoutSpec::default();
    }
    LayoutSpec {
        mode,
        gap: raw.item_spacing.unwrap_or(0.0).max(0.0),
        padding: [
            raw.padding_top.unwrap_or(0.0),
            raw.padding_right.unwrap_or(0.0),
            raw.padding_bottom.unwrap_or(0.0),
            raw.padding_left.unwrap_or(0.0),
        ],
        wrap: raw.layout_wrap.as_deref() == Some("WRAP"),
        align_items: map_axis_align(raw.counter_axis_align_items.as_deref()),
        justify_content: map_axis_align(raw.primary_axis_align_items.as_deref()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ICON CLASSIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

fn within_icon_window(bounds: Rect, config: &CompilerConfig) -> bool {
    let (w, h) = (bounds.w, bounds.h);
    if w < config.icon_min_px || h < config.icon_min_px {
        return false;
    }
    if w > config.icon_max_px || h > config.icon_max_px {
        return false;
    }
    let aspect = w.max(h) / w.min(h).max(1e-6);
    aspect <= config.icon_max_aspect
}

fn scan_vector_leaves(raw: &RawNode, depth: usize, max_depth: usize, leaves: &mut usize) -> bool {
    // Returns false as soon as any text is found beneath.
    for child in &raw.children {
        if NodeKind::from_raw(&child.kind) == NodeKind::Text {
            return false;
        }
        if depth < max_depth {
            if NodeKind::from_raw(&child.kind).is_vector_leaf() && child.children.is_empty() {
                *leaves += 1;
            }
            if !scan_vector_leaves(child, depth + 1, max_depth, leaves) {
                return false;
            }
        } else if has_text_beneath(child) {
            return false;
        }
    }
    true
}

fn has_text_beneath(raw: &RawNode) -> bool {
    raw.children.iter().any(|child| {
        NodeKind::from_raw(&child.kind) == NodeKind::Text || has_text_beneath(child)
    })
}

fn first_subtree_color(raw: &RawNode) -> Option<Rgba> {
    raw.fills
        .iter()
        .chain(raw.strokes.iter())
        .filter_map(resolve_solid)
        .find(|c| c.a > 0.01)
        .or_else(|| raw.children.iter().find_map(first_subtree_color))
}

fn classify_icon(raw: &RawNode, kind: NodeKind, bounds: Rect, config: &CompilerConfig) -> IconHint {
    let is_leaf_icon =
        kind.is_vector_leaf() && raw.children.is_empty() && within_icon_window(bounds, config);

    let is_composite_icon = if !is_leaf_icon
        && !raw.children.is_empty()
        && within_icon_window(bounds, config)
    {
        let mut leaves = 0usize;
        scan_vector_leaves(raw, 0, config.icon_max_scan_depth, &mut leaves)
            && leaves >= 1
            && leaves <= config.icon_max_vector_leaves
    } else {
        false
    };

    let is_icon = is_leaf_icon || is_composite_icon;
    IconHint {
        is_icon,
        tintable: is_icon,
        dominant_color: if is_icon { first_subtree_color(raw) } else { None },
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_json(children: &str) -> String {
        format!(
            r#"{{"name":"doc","document":{{"id":"0:0","name":"Page","type":"CANVAS","children":[
                {{"id":"1:1","name":"Root","type":"FRAME","clipsContent":true,
                  "absoluteBoundingBox":{{"x":100.0,"y":50.0,"width":200.0,"height":100.0}},
                  "children":[{}]}}]}}}}"#,
            children
        )
    }

    fn build(children: &str) -> IrNode {
        let doc = crate::schema::parse_document(&frame_json(children)).unwrap();
        build_ir(&doc, "1:1", &CompilerConfig::default()).unwrap()
    }

    #[test]
    fn test_missing_target_is_input_error() {
        let doc = crate::schema::parse_document(&frame_json("")).unwrap();
        let err = build_ir(&doc, "9:9", &CompilerConfig::default()).unwrap_err();
        assert!(matches!(err, CompileError::Input(InputError::NodeNotFound(_))));
    }

    #[test]
    fn test_relative_bounds_derive_from_root_origin() {
        let root = build(
            r#"{"id":"1:2","name":"Child","type":"RECTANGLE",
                "absoluteBoundingBox":{"x":110.0,"y":60.0,"width":50.0,"height":20.0}}"#,
        );
        assert_eq!(root.bounds_relative, Rect::new(0.0, 0.0, 200.0, 100.0));
        let child = &root.children[0];
        assert_eq!(child.bounds_relative, Rect::new(10.0, 10.0, 50.0, 20.0));
        assert_eq!(child.offset, (10.0, 10.0));
        assert!(child.absolutely_positioned);
    }

    #[test]
    fn test_clip_chain_hides_outside_children() {
        let root = build(
            r#"{"id":"1:2","name":"Out","type":"RECTANGLE",
                "absoluteBoundingBox":{"x":900.0,"y":900.0,"width":50.0,"height":20.0},
                "fills":[{"type":"SOLID","color":{"r":1,"g":0,"b":0,"a":1}}]}"#,
        );
        assert!(!root.children[0].visible_effective);
    }

    #[test]
    fn test_hidden_ancestor_propagates() {
        let root = build(
            r#"{"id":"1:2","name":"Wrap","type":"FRAME","visible":false,
                "absoluteBoundingBox":{"x":100.0,"y":50.0,"width":100.0,"height":100.0},
                "children":[{"id":"1:3","name":"Inner","type":"RECTANGLE",
                  "absoluteBoundingBox":{"x":100.0,"y":50.0,"width":10.0,"height":10.0}}]}"#,
        );
        assert!(!root.children[0].visible_effective);
        assert!(!root.children[0].children[0].visible_effective);
        assert!(root.children[0].children[0].own_visible);
    }

    #[test]
    fn test_near_zero_opacity_is_invisible() {
        let root = build(
            r#"{"id":"1:2","name":"Ghost","type":"RECTANGLE","opacity":0.005,
                "absoluteBoundingBox":{"x":110.0,"y":60.0,"width":50.0,"height":20.0}}"#,
        );
        assert!(!root.children[0].visible_effective);
    }

    #[test]
    fn test_text_canonicalization() {
        let (content, lines) = canonicalize_text("Hello\u{00a0} world\nSecond •Third ");
        assert_eq!(content, "Hello world Second •Third");
        assert_eq!(lines, vec!["Hello world", "Second", "Third"]);
    }

    #[test]
    fn test_weight_inference_from_style_name() {
        assert_eq!(infer_weight("Inter-SemiBold"), Some(600));
        assert_eq!(infer_weight("Roboto-ExtraBold"), Some(800));
        assert_eq!(infer_weight("Lato-Regular"), Some(400));
        assert_eq!(infer_weight("Display"), None);
    }

    #[test]
    fn test_icon_window_leaf() {
        let root = build(
            r#"{"id":"1:2","name":"ic","type":"VECTOR",
                "absoluteBoundingBox":{"x":110.0,"y":60.0,"width":24.0,"height":24.0},
                "fills":[{"type":"SOLID","color":{"r":0,"g":0.5,"b":1,"a":1}}]}"#,
        );
        let icon = &root.children[0];
        assert!(icon.icon.is_icon);
        assert!(icon.icon.tintable);
        assert!(icon.icon.dominant_color.is_some());
    }

    #[test]
    fn test_icon_rejects_text_beneath() {
        let root = build(
            r#"{"id":"1:2","name":"badge","type":"FRAME",
                "absoluteBoundingBox":{"x":110.0,"y":60.0,"width":24.0,"height":24.0},
                "children":[
                  {"id":"1:3","name":"v","type":"VECTOR",
                   "absoluteBoundingBox":{"x":110.0,"y":60.0,"width":24.0,"height":24.0}},
                  {"id":"1:4","name":"t","type":"TEXT","characters":"x",
                   "absoluteBoundingBox":{"x":110.0,"y":60.0,"width":8.0,"height":8.0}}]}"#,
        );
        assert!(!root.children[0].icon.is_icon);
    }

    #[test]
    fn test_malformed_geometry_defaults_to_zero() {
        let root = build(r#"{"id":"1:2","name":"NoBox","type":"RECTANGLE"}"#);
        assert_eq!(root.children[0].bounds, Rect::default());
    }

    #[test]
    fn test_inherited_background_only_for_clipping_containers() {
        let root = build(
            r#"{"id":"1:2","name":"ClipWrap","type":"FRAME","clipsContent":true,
                "absoluteBoundingBox":{"x":100.0,"y":50.0,"width":100.0,"height":100.0}},
               {"id":"1:5","name":"PlainWrap","type":"FRAME","layoutMode":"VERTICAL",
                "absoluteBoundingBox":{"x":100.0,"y":50.0,"width":100.0,"height":100.0}}"#,
        );
        // Root has no fills, so nothing is inherited here; repeat with a
        // painted root.
        assert!(root.children.iter().all(|c| c.background.is_none()));

        let doc = crate::schema::parse_document(
            r#"{"name":"doc","document":{"id":"0:0","name":"Page","type":"CANVAS","children":[
                {"id":"1:1","name":"Root","type":"FRAME",
                 "fills":[{"type":"SOLID","color":{"r":0,"g":0,"b":0,"a":1}}],
                 "absoluteBoundingBox":{"x":0.0,"y":0.0,"width":200.0,"height":100.0},
                 "children":[
                   {"id":"1:2","name":"Clipper","type":"FRAME","clipsContent":true,
                    "absoluteBoundingBox":{"x":0.0,"y":0.0,"width":50.0,"height":50.0}},
                   {"id":"1:3","name":"Wrapper","type":"FRAME","layoutMode":"VERTICAL",
                    "absoluteBoundingBox":{"x":50.0,"y":0.0,"width":50.0,"height":50.0}}]}]}}"#,
        )
        .unwrap();
        let root = build_ir(&doc, "1:1", &CompilerConfig::default()).unwrap();
        let clipper = root.children.iter().find(|c| c.id == "1:2").unwrap();
        let wrapper = root.children.iter().find(|c| c.id == "1:3").unwrap();
        // The clipping container inherits the black fill; the non-clipping
        // layout wrapper suppresses it.
        assert!(matches!(clipper.background, Some(Background::Solid(_))));
        assert!(wrapper.background.is_none());
    }

    #[test]
    fn test_filter_hidden_keeps_contributors() {
        let mut root = build(
            r#"{"id":"1:2","name":"Gone","type":"FRAME","visible":false,
                "absoluteBoundingBox":{"x":100.0,"y":50.0,"width":10.0,"height":10.0}},
               {"id":"1:3","name":"HiddenPaint","type":"RECTANGLE","visible":false,
                "absoluteBoundingBox":{"x":100.0,"y":50.0,"width":10.0,"height":10.0},
                "fills":[{"type":"SOLID","color":{"r":1,"g":0,"b":0,"a":1}}]}"#,
        );
        filter_hidden(&mut root);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].id, "1:3");
        assert_eq!(root.children[0].index, 0);
    }

    #[test]
    fn test_free_children_sort_visually() {
        let root = build(
            r#"{"id":"1:2","name":"Lower","type":"RECTANGLE",
                "absoluteBoundingBox":{"x":110.0,"y":90.0,"width":10.0,"height":10.0},
                "fills":[{"type":"SOLID","color":{"r":1,"g":0,"b":0,"a":1}}]},
               {"id":"1:3","name":"Upper","type":"RECTANGLE",
                "absoluteBoundingBox":{"x":110.0,"y":60.0,"width":10.0,"height":10.0},
                "fills":[{"type":"SOLID","color":{"r":1,"g":0,"b":0,"a":1}}]}"#,
        );
        assert_eq!(root.children[0].id, "1:3");
        assert_eq!(root.children[1].id, "1:2");
        assert_eq!(root.children[0].index, 0);
    }
}
