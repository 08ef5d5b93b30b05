//! Class token synthesis.
//!
//! Turns one IR node into its ordered utility-class token list. The rule
//! order is fixed and the output is deterministic: identical IR input
//! always yields a byte-identical token list. Duplicates are removed
//! keeping the first occurrence, then conflicting tokens are resolved.

use crate::color::format_alpha;
use crate::ir::{px, AxisAlign, Background, IrNode, LayoutMode, NodeKind, TextAlign,
    TextDecoration, TextSpec, TextTransform};

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINT
// ═══════════════════════════════════════════════════════════════════════════════

pub fn synthesize_classes(node: &IrNode) -> Vec<String> {
    let mut tokens = Vec::new();

    push_size(node, &mut tokens);
    push_position(node, &mut tokens);
    if node.clips_content {
        tokens.push("overflow-hidden".to_string());
    }
    push_flex(node, &mut tokens);
    if node.kind == NodeKind::Text {
        if let Some(text) = &node.text {
            push_text(text, &mut tokens);
        }
    } else {
        push_background(node, &mut tokens);
    }
    push_border(node, &mut tokens);
    push_radius(node, &mut tokens);
    if let Some(shadow) = &node.box_shadow {
        tokens.push(format!("shadow-[{}]", shadow));
    }
    if node.opacity < 1.0 {
        tokens.push(format!("opacity-[{}]", format_alpha(node.opacity)));
    }
    if node.rotation != 0.0 {
        tokens.push(format!("rotate-[{}deg]", format_decimal(node.rotation)));
    }
    if let Some(z) = node.z_index {
        tokens.push(format!("z-[{}]", z));
    }

    dedup_keep_first(&mut tokens);
    resolve_conflicts(&mut tokens);
    tokens
}

// ═══════════════════════════════════════════════════════════════════════════════
// RULES, IN SYNTHESIS ORDER
// ═══════════════════════════════════════════════════════════════════════════════

fn push_size(node: &IrNode, tokens: &mut Vec<String>) {
    tokens.push(format!("w-[{}px]", px(node.bounds.w)));
    tokens.push(format!("h-[{}px]", px(node.bounds.h)));
}

fn push_position(node: &IrNode, tokens: &mut Vec<String>) {
    if node.absolutely_positioned {
        tokens.push("absolute".to_string());
        tokens.push(format!("left-[{}px]", px(node.offset.0)));
        tokens.push(format!("top-[{}px]", px(node.offset.1)));
    } else {
        tokens.push("relative".to_string());
    }
}

fn push_flex(node: &IrNode, tokens: &mut Vec<String>) {
    let layout = &node.layout;
    if !layout.is_auto() {
        return;
    }
    tokens.push("flex".to_string());
    if layout.mode == LayoutMode::Vertical {
        tokens.push("flex-col".to_string());
    }
    if layout.wrap {
        tokens.push("flex-wrap".to_string());
    }
    if layout.gap > 0.0 {
        tokens.push(format!("gap-[{}px]", px(layout.gap)));
    }
    let [top, right, bottom, left] = layout.padding;
    for (side, value) in [("pt", top), ("pr", right), ("pb", bottom), ("pl", left)] {
        if value > 0.0 {
            tokens.push(format!("{}-[{}px]", side, px(value)));
        }
    }
    if let Some(align) = layout.align_items {
        if let Some(token) = items_token(align) {
            tokens.push(token.to_string());
        }
    }
    if let Some(justify) = layout.justify_content {
        if let Some(token) = justify_token(justify) {
            tokens.push(token.to_string());
        }
    }
}

fn items_token(align: AxisAlign) -> Option<&'static str> {
    match align {
        AxisAlign::Start => Some("items-start"),
        AxisAlign::Center => Some("items-center"),
        AxisAlign::End => Some("items-end"),
        AxisAlign::Baseline => Some("items-baseline"),
        AxisAlign::SpaceBetween => None,
    }
}

fn justify_token(align: AxisAlign) -> Option<&'static str> {
    match align {
        AxisAlign::Start => Some("justify-start"),
        AxisAlign::Center => Some("justify-center"),
        AxisAlign::End => Some("justify-end"),
        AxisAlign::SpaceBetween => Some("justify-between"),
        AxisAlign::Baseline => None,
    }
}

fn push_text(text: &TextSpec, tokens: &mut Vec<String>) {
    let style = &text.style;
    if let Some(color) = &style.color {
        tokens.push(format!("text-[{}]", color.css_value()));
    }
    tokens.push(format!("text-[{}px]", px(style.size)));
    if let Some(weight) = weight_class(style.weight) {
        tokens.push(weight.to_string());
    }
    if let Some(line_height) = style.line_height {
        tokens.push(format!("leading-[{}px]", px(line_height)));
    }
    if style.letter_spacing.abs() > 0.05 {
        tokens.push(format!(
            "tracking-[{}px]",
            format_decimal(style.letter_spacing)
        ));
    }
    match style.align {
        TextAlign::Left => {}
        TextAlign::Center => tokens.push("text-center".to_string()),
        TextAlign::Right => tokens.push("text-right".to_string()),
        TextAlign::Justified => tokens.push("text-justify".to_string()),
    }
    match style.decoration {
        Some(TextDecoration::Underline) => tokens.push("underline".to_string()),
        Some(TextDecoration::Strikethrough) => tokens.push("line-through".to_string()),
        None => {}
    }
    match style.transform {
        Some(TextTransform::Upper) => tokens.push("uppercase".to_string()),
        Some(TextTransform::Lower) => tokens.push("lowercase".to_string()),
        Some(TextTransform::Title) => tokens.push("capitalize".to_string()),
        None => {}
    }
}

fn push_background(node: &IrNode, tokens: &mut Vec<String>) {
    match &node.background {
        Some(Background::Solid(color)) => tokens.push(format!("bg-[{}]", color.css_value())),
        Some(Background::Gradient { css }) => tokens.push(format!("bg-[{}]", css)),
        None => {}
    }
}

fn push_border(node: &IrNode, tokens: &mut Vec<String>) {
    if let Some(stroke) = &node.stroke {
        let weight = px(stroke.weight).max(1);
        tokens.push("border".to_string());
        if weight != 1 {
            tokens.push(format!("border-[{}px]", weight));
        }
        tokens.push(format!("border-[{}]", stroke.color.css_value()));
    }
}

fn push_radius(node: &IrNode, tokens: &mut Vec<String>) {
    if node.corner_radii.is_zero() {
        return;
    }
    if let Some(radius) = node.corner_radii.as_uniform() {
        tokens.push(format!("rounded-[{}px]", px(radius)));
        return;
    }
    let radii = &node.corner_radii;
    for (corner, value) in [
        ("tl", radii.tl),
        ("tr", radii.tr),
        ("br", radii.br),
        ("bl", radii.bl),
    ] {
        if value > 0.0 {
            tokens.push(format!("rounded-{}-[{}px]", corner, px(value)));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CANONICALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

pub fn dedup_keep_first(tokens: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    tokens.retain(|t| seen.insert(t.clone()));
}

/// Two rules: `absolute` beats `relative`, and an explicit border width
/// token suppresses the bare `border` keyword.
pub fn resolve_conflicts(tokens: &mut Vec<String>) {
    let has_absolute = tokens.iter().any(|t| t == "absolute");
    let has_border_width = tokens
        .iter()
        .any(|t| t.starts_with("border-[") && t.ends_with("px]"));
    tokens.retain(|t| {
        if has_absolute && t == "relative" {
            return false;
        }
        if has_border_width && t == "border" {
            return false;
        }
        true
    });
}

fn weight_class(weight: u32) -> Option<&'static str> {
    match weight {
        100 => Some("font-thin"),
        200 => Some("font-extralight"),
        300 => Some("font-light"),
        400 => Some("font-normal"),
        500 => Some("font-medium"),
        600 => Some("font-semibold"),
        700 => Some("font-bold"),
        800 => Some("font-extrabold"),
        900 => Some("font-black"),
        _ => None,
    }
}

/// Trim a measurement to at most two decimals without a trailing zero tail.
fn format_decimal(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        let s = format!("{:.2}", rounded);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::ir::{IconHint, LayoutSpec, Rect, StrokeSpec, TextStyle};

    fn base_node() -> IrNode {
        IrNode {
            id: "1:1".to_string(),
            name: "Box".to_string(),
            kind: NodeKind::Frame,
            own_visible: true,
            visible_effective: true,
            bounds: Rect::new(0.0, 0.0, 200.0, 100.0),
            bounds_relative: Rect::new(0.0, 0.0, 200.0, 100.0),
            offset: (0.0, 0.0),
            layout: LayoutSpec::default(),
            absolutely_positioned: false,
            fills: vec![],
            background: None,
            stroke: None,
            corner_radii: Default::default(),
            box_shadow: None,
            opacity: 1.0,
            clips_content: false,
            text: None,
            rotation: 0.0,
            index: 0,
            z_index: None,
            is_root: true,
            icon: IconHint::default(),
            class_tokens: vec![],
            children: vec![],
        }
    }

    fn white() -> Rgba {
        Rgba {
            r: 255,
            g: 255,
            b: 255,
            a: 1.0,
        }
    }

    #[test]
    fn test_size_then_position_order() {
        let node = base_node();
        let tokens = synthesize_classes(&node);
        assert_eq!(tokens[..3], ["w-[200px]", "h-[100px]", "relative"]);
    }

    #[test]
    fn test_absolute_drops_relative() {
        let mut node = base_node();
        node.absolutely_positioned = true;
        node.offset = (10.0, 20.0);
        let tokens = synthesize_classes(&node);
        assert!(tokens.contains(&"absolute".to_string()));
        assert!(tokens.contains(&"left-[10px]".to_string()));
        assert!(tokens.contains(&"top-[20px]".to_string()));
        assert!(!tokens.contains(&"relative".to_string()));
    }

    #[test]
    fn test_border_width_suppresses_keyword() {
        let mut node = base_node();
        node.stroke = Some(StrokeSpec {
            color: white(),
            weight: 3.0,
        });
        let tokens = synthesize_classes(&node);
        assert!(tokens.contains(&"border-[3px]".to_string()));
        assert!(!tokens.contains(&"border".to_string()));

        node.stroke = Some(StrokeSpec {
            color: white(),
            weight: 1.0,
        });
        let tokens = synthesize_classes(&node);
        assert!(tokens.contains(&"border".to_string()));
        assert!(!tokens.iter().any(|t| t == "border-[1px]"));
    }

    #[test]
    fn test_text_tokens() {
        let mut node = base_node();
        node.kind = NodeKind::Text;
        node.text = Some(TextSpec {
            content: "Hello".to_string(),
            lines: vec!["Hello".to_string()],
            style: TextStyle {
                family: "Inter".to_string(),
                size: 16.0,
                weight: 600,
                line_height: Some(24.0),
                letter_spacing: 0.0,
                align: TextAlign::Center,
                decoration: None,
                transform: None,
                color: Some(white()),
            },
        });
        let tokens = synthesize_classes(&node);
        assert!(tokens.contains(&"text-[#ffffff]".to_string()));
        assert!(tokens.contains(&"text-[16px]".to_string()));
        assert!(tokens.contains(&"font-semibold".to_string()));
        assert!(tokens.contains(&"leading-[24px]".to_string()));
        assert!(tokens.contains(&"text-center".to_string()));
        assert!(!tokens.iter().any(|t| t.starts_with("tracking-")));
    }

    #[test]
    fn test_flex_tokens_recognized_only() {
        let mut node = base_node();
        node.layout = LayoutSpec {
            mode: LayoutMode::Vertical,
            gap: 8.0,
            padding: [4.0, 0.0, 4.0, 12.0],
            wrap: false,
            align_items: Some(AxisAlign::Center),
            justify_content: Some(AxisAlign::Baseline),
        };
        let tokens = synthesize_classes(&node);
        assert!(tokens.contains(&"flex".to_string()));
        assert!(tokens.contains(&"flex-col".to_string()));
        assert!(tokens.contains(&"gap-[8px]".to_string()));
        assert!(tokens.contains(&"pt-[4px]".to_string()));
        assert!(tokens.contains(&"pl-[12px]".to_string()));
        assert!(!tokens.iter().any(|t| t == "pr-[0px]"));
        assert!(tokens.contains(&"items-center".to_string()));
        // Baseline is not a recognized justify mapping.
        assert!(!tokens.iter().any(|t| t.starts_with("justify-")));
    }

    #[test]
    fn test_determinism() {
        let mut node = base_node();
        node.clips_content = true;
        node.background = Some(Background::Solid(white()));
        let a = synthesize_classes(&node);
        let b = synthesize_classes(&node);
        assert_eq!(a, b);
    }
}
