//! Validator/Autofix Engine.
//!
//! Enforces 1:1 parity between the IR and the generated text through an
//! ordered pipeline: repair passes first, assertions last. Each pass
//! assumes every prior pass ran. Repairs only ever touch the narrow code
//! shapes the generator itself produces; the assertions mutate nothing and
//! reject the file on the first violation, identifying the offending node.
//!
//! The expected-text and expected-background sets are computed once per
//! request into plain lookup structures and shared by every pass.

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::color::{matches_solid, normalize_value};
use crate::config::CompilerConfig;
use crate::error::{
    CompileError, ValidationFailure, RULE_BACKGROUND_EXTRA, RULE_COLOR, RULE_DIMENSIONS,
    RULE_ICON_UNEXPECTED, RULE_ICON_USAGE, RULE_LAYOUT_GUARD, RULE_POSITION, RULE_SHADOW,
    RULE_TEXT_EXTRA, RULE_TEXT_MISSING, RULE_TYPOGRAPHY,
};
use crate::generator::{identifier_from_path, GeneratedFile, IconAsset, ImportBinding};
use crate::ir::{px, AxisAlign, Background, IrNode, NodeKind};
use crate::visitor::{walk_node, IrVisitor};

lazy_static! {
    static ref TEXT_PAYLOAD_RE: Regex = Regex::new(r#"\{"((?:[^"\\]|\\.)*)"\}"#).unwrap();
    static ref CLASSNAME_RE: Regex = Regex::new(r#"className="([^"]*)""#).unwrap();
    static ref IMPORT_RE: Regex =
        Regex::new(r#"(?m)^import\s+([A-Za-z_$][\w$]*)\s+from\s+"([^"]+)";"#).unwrap();
    static ref ATTR_TEXT_RE: Regex =
        Regex::new(r#"(?:alt|placeholder|title|aria-label)="([^"]*)""#).unwrap();
    static ref BRACKET_RE: Regex = Regex::new(r"\[[^\[\]]*\]").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPECTED SETS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct ExpectedSets {
    /// Everything the purge pass tolerates: whole runs and individual lines.
    accepted_texts: HashSet<String>,
    /// What coverage demands: the exact payload per text node.
    required_texts: Vec<(String, String)>,
    backgrounds: Vec<Background>,
    families: HashSet<String>,
}

fn normalize_text(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn collect_expected(ir: &IrNode, icons: &HashMap<String, IconAsset>) -> ExpectedSets {
    struct Collector<'a> {
        icons: &'a HashMap<String, IconAsset>,
        sets: ExpectedSets,
    }

    impl IrVisitor for Collector<'_> {
        fn visit_node(&mut self, node: &IrNode) {
            // The generator emits nothing for invisible subtrees, and icon
            // subtrees render as a single image; neither contributes to the
            // expected sets.
            if !node.visible_effective || self.icons.contains_key(&node.id) {
                return;
            }
            if let Some(bg) = &node.background {
                if !self.sets.backgrounds.contains(bg) {
                    self.sets.backgrounds.push(bg.clone());
                }
            }
            if let Some(text) = &node.text {
                let payload = if !text.content.is_empty() {
                    text.content.clone()
                } else {
                    text.lines.join(" ")
                };
                if !payload.is_empty() {
                    self.sets
                        .required_texts
                        .push((normalize_text(&payload), node.id.clone()));
                    self.sets.accepted_texts.insert(normalize_text(&payload));
                    for line in &text.lines {
                        self.sets.accepted_texts.insert(normalize_text(line));
                    }
                }
                if !text.style.family.is_empty() {
                    self.sets.families.insert(text.style.family.clone());
                }
            }
            walk_node(self, node);
        }
    }

    let mut collector = Collector {
        icons,
        sets: ExpectedSets::default(),
    };
    collector.visit_node(ir);
    collector.sets
}

fn collect_expected_icons(
    ir: &IrNode,
    icons: &HashMap<String, IconAsset>,
) -> Vec<(String, IconAsset)> {
    struct Collector<'a> {
        icons: &'a HashMap<String, IconAsset>,
        found: Vec<(String, IconAsset)>,
    }

    impl IrVisitor for Collector<'_> {
        fn visit_node(&mut self, node: &IrNode) {
            if !node.visible_effective {
                return;
            }
            if let Some(asset) = self.icons.get(&node.id) {
                self.found.push((node.id.clone(), asset.clone()));
                return;
            }
            walk_node(self, node);
        }
    }

    let mut collector = Collector {
        icons,
        found: Vec::new(),
    };
    collector.visit_node(ir);
    collector.found.sort_by(|a, b| a.0.cmp(&b.0));
    collector.found
}

fn find_in_ir<'a>(root: &'a IrNode, id: &str) -> Option<&'a IrNode> {
    if root.id == id {
        return Some(root);
    }
    root.children.iter().find_map(|c| find_in_ir(c, id))
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINT
// ═══════════════════════════════════════════════════════════════════════════════

pub fn validate_and_fix(
    file: &mut GeneratedFile,
    ir: &IrNode,
    icons: &HashMap<String, IconAsset>,
    config: &CompilerConfig,
) -> Result<(), CompileError> {
    let expected = collect_expected(ir, icons);
    let expected_icons = collect_expected_icons(ir, icons);

    let mut lines: Vec<String> = file.code.lines().map(String::from).collect();
    purge_unexpected_text(&mut lines, &expected);
    autofix_icons(&mut lines, &expected_icons, config)?;
    sanitize_icon_positions(&mut lines);
    compact_arbitrary_values(&mut lines);
    purge_unexpected_backgrounds(&mut lines, &expected);
    autofix_font_family(&mut lines, &expected);
    file.code = lines.join("\n") + "\n";
    file.imports = parse_imports(&file.code);

    assert_icons(&file.code, ir, &expected_icons, config)?;
    assert_text(&file.code, ir, &expected)?;
    assert_geometry(&file.code, ir, icons)?;
    assert_paints(&file.code, ir, icons)?;
    assert_background_whitelist(&file.code, &expected)?;
    assert_typography(&file.code, ir, icons)?;
    assert_layout_guard(&file.code, ir)?;
    debug!("validation passed for {}", file.component_name);
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// REPAIR PASSES
// ═══════════════════════════════════════════════════════════════════════════════

fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Pass 1: delete text-bearing leaves whose content the IR does not expect.
fn purge_unexpected_text(lines: &mut Vec<String>, expected: &ExpectedSets) {
    lines.retain(|line| {
        if !line.contains(">{\"") {
            return true;
        }
        match TEXT_PAYLOAD_RE.captures(line) {
            Some(cap) => {
                let payload = normalize_text(&unescape_text(&cap[1]));
                let keep = expected.accepted_texts.contains(&payload);
                if !keep {
                    debug!("purging unexpected text line: {}", line.trim());
                }
                keep
            }
            None => true,
        }
    });
}

/// Pass 2: insert a missing import plus a single image usage for every
/// expected icon asset not already present.
fn autofix_icons(
    lines: &mut Vec<String>,
    expected_icons: &[(String, IconAsset)],
    config: &CompilerConfig,
) -> Result<(), CompileError> {
    for (node_id, asset) in expected_icons {
        let code = lines.join("\n");
        let imports = parse_imports(&code);
        let binding = imports
            .iter()
            .find(|b| b.import_path == asset.import_path)
            .map(|b| b.local_name.clone());

        let name = match binding {
            Some(name) => name,
            None => {
                if asset.import_path.trim().is_empty() {
                    if config.strict_icon_enforcement {
                        return Err(ValidationFailure::autofix_exhausted(&format!(
                            "icon asset for node {} has no import path",
                            node_id
                        ))
                        .into());
                    }
                    warn!("skipping icon repair for node {}: empty path", node_id);
                    continue;
                }
                let base = identifier_from_path(&asset.import_path);
                let taken: HashSet<String> =
                    imports.iter().map(|b| b.local_name.clone()).collect();
                let mut name = base.clone();
                let mut suffix = 2;
                while taken.contains(&name) {
                    name = format!("{}{}", base, suffix);
                    suffix += 1;
                }
                insert_import(lines, &name, &asset.import_path);
                name
            }
        };

        let usage = format!("src={{{}}}", name);
        if lines.iter().any(|l| l.contains(&usage)) {
            continue;
        }
        let w = px(asset.width.max(1.0));
        let h = px(asset.height.max(1.0));
        let img = format!(
            "<img src={{{}}} alt=\"\" width={{{}}} height={{{}}} className=\"w-[{}px] h-[{}px]\" />",
            name, w, h, w, h
        );
        if !insert_into_root(lines, &img) {
            if config.strict_icon_enforcement {
                return Err(ValidationFailure::autofix_exhausted(&format!(
                    "no mount point for repaired icon usage (node {})",
                    node_id
                ))
                .into());
            }
            warn!("no mount point for icon usage, node {}", node_id);
        } else {
            debug!("repaired missing icon usage for node {}", node_id);
        }
    }
    Ok(())
}

fn insert_import(lines: &mut Vec<String>, name: &str, path: &str) {
    let import_line = format!("import {} from \"{}\";", name, path);
    let last_import = lines
        .iter()
        .rposition(|l| l.starts_with("import "));
    match last_import {
        Some(i) => lines.insert(i + 1, import_line),
        None => {
            lines.insert(0, import_line);
            lines.insert(1, String::new());
        }
    }
}

/// Place a repaired element as the last child of the component's root
/// element. Expands a self-closing root when necessary.
fn insert_into_root(lines: &mut Vec<String>, element: &str) -> bool {
    let return_idx = match lines.iter().position(|l| l.trim() == "return (") {
        Some(i) => i,
        None => return false,
    };
    let root_idx = return_idx + 1;
    if root_idx >= lines.len() {
        return false;
    }
    let root_line = lines[root_idx].clone();
    let root_indent: String = root_line.chars().take_while(|c| *c == ' ').collect();
    let child_indent = format!("{}  ", root_indent);

    if root_line.trim_end().ends_with("/>") && root_line.trim_start().starts_with("<div") {
        let opened = root_line.trim_end().trim_end_matches("/>").trim_end().to_string() + ">";
        lines[root_idx] = opened;
        lines.insert(root_idx + 1, format!("{}{}", child_indent, element));
        lines.insert(root_idx + 2, format!("{}</div>", root_indent));
        return true;
    }
    if root_line.trim_start().starts_with("<div") {
        // Root close is the matching line with the same indentation.
        if let Some(close_idx) = lines
            .iter()
            .rposition(|l| l.starts_with(&root_indent) && l.trim() == "</div>")
        {
            lines.insert(close_idx, format!("{}{}", child_indent, element));
            return true;
        }
    }
    false
}

/// Pass 3: image elements never carry position classes.
fn sanitize_icon_positions(lines: &mut Vec<String>) {
    for line in lines.iter_mut() {
        if !line.contains("<img") {
            continue;
        }
        *line = CLASSNAME_RE
            .replace_all(line, |caps: &regex::Captures| {
                let kept: Vec<&str> = caps[1]
                    .split_whitespace()
                    .filter(|t| {
                        *t != "absolute"
                            && *t != "relative"
                            && !t.starts_with("left-[")
                            && !t.starts_with("top-[")
                    })
                    .collect();
                format!("className=\"{}\"", kept.join(" "))
            })
            .into_owned();
    }
}

/// Pass 4: collapse incidental whitespace inside bracketed class values so
/// spacing cannot split one token into two.
fn compact_arbitrary_values(lines: &mut Vec<String>) {
    for line in lines.iter_mut() {
        if !line.contains("className=") {
            continue;
        }
        *line = CLASSNAME_RE
            .replace_all(line, |caps: &regex::Captures| {
                let compacted = BRACKET_RE.replace_all(&caps[1], |b: &regex::Captures| {
                    b[0].chars().filter(|c| !c.is_whitespace()).collect::<String>()
                });
                format!("className=\"{}\"", compacted)
            })
            .into_owned();
    }
}

fn background_token_expected(value: &str, expected: &ExpectedSets) -> bool {
    let normalized = normalize_value(value);
    expected.backgrounds.iter().any(|bg| match bg {
        Background::Solid(color) => matches_solid(value, color),
        Background::Gradient { css } => {
            let expected_norm = normalize_value(css);
            expected_norm == normalized
                || expected_norm.starts_with(&normalized)
                || normalized.starts_with(&expected_norm)
        }
    })
}

/// Pass 5: drop background tokens the IR cannot account for.
fn purge_unexpected_backgrounds(lines: &mut Vec<String>, expected: &ExpectedSets) {
    for line in lines.iter_mut() {
        if !line.contains("bg-[") {
            continue;
        }
        *line = CLASSNAME_RE
            .replace_all(line, |caps: &regex::Captures| {
                let kept: Vec<&str> = caps[1]
                    .split_whitespace()
                    .filter(|t| {
                        if let Some(value) = t.strip_prefix("bg-[").and_then(|v| v.strip_suffix(']'))
                        {
                            background_token_expected(value, expected)
                        } else {
                            true
                        }
                    })
                    .collect();
                format!("className=\"{}\"", kept.join(" "))
            })
            .into_owned();
    }
}

fn family_token(family: &str) -> String {
    format!("font-['{}']", family.replace(' ', "_"))
}

/// Pass 6: single-family designs carry the family once, on the first
/// structural element.
fn autofix_font_family(lines: &mut Vec<String>, expected: &ExpectedSets) {
    if expected.families.len() != 1 {
        return;
    }
    let family = expected.families.iter().next().unwrap();
    let token = family_token(family);
    let return_idx = match lines.iter().position(|l| l.trim() == "return (") {
        Some(i) => i,
        None => return,
    };
    let root_idx = return_idx + 1;
    if root_idx >= lines.len() || !lines[root_idx].trim_start().starts_with("<div") {
        return;
    }
    if lines[root_idx].contains("font-['") {
        return;
    }
    lines[root_idx] = CLASSNAME_RE
        .replace(&lines[root_idx], |caps: &regex::Captures| {
            if caps[1].is_empty() {
                format!("className=\"{}\"", token)
            } else {
                format!("className=\"{} {}\"", &caps[1], token)
            }
        })
        .into_owned();
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSERTIONS
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_imports(code: &str) -> Vec<ImportBinding> {
    IMPORT_RE
        .captures_iter(code)
        .map(|cap| ImportBinding {
            local_name: cap[1].to_string(),
            import_path: cap[2].to_string(),
        })
        .collect()
}

fn class_lists(code: &str) -> Vec<Vec<String>> {
    CLASSNAME_RE
        .captures_iter(code)
        .map(|cap| cap[1].split_whitespace().map(String::from).collect())
        .collect()
}

fn node_failure(root: &IrNode, node_id: &str, code: &str, message: &str) -> ValidationFailure {
    match find_in_ir(root, node_id) {
        Some(node) => ValidationFailure::for_node(code, message, node),
        None => ValidationFailure::new(code, message),
    }
}

fn assert_icons(
    code: &str,
    ir: &IrNode,
    expected_icons: &[(String, IconAsset)],
    config: &CompilerConfig,
) -> Result<(), CompileError> {
    let imports = parse_imports(code);
    let expected_paths: HashSet<&str> = expected_icons
        .iter()
        .map(|(_, a)| a.import_path.as_str())
        .collect();

    for (node_id, asset) in expected_icons {
        let binding = imports
            .iter()
            .find(|b| b.import_path == asset.import_path);
        let failure = |message: String| node_failure(ir, node_id, RULE_ICON_USAGE, &message);

        let name = match binding {
            Some(b) => &b.local_name,
            None => {
                if !config.strict_icon_enforcement {
                    warn!("icon import missing for node {} (lenient mode)", node_id);
                    continue;
                }
                return Err(failure(format!(
                    "expected import for \"{}\" is missing",
                    asset.import_path
                ))
                .into());
            }
        };
        let usage = format!("src={{{}}}", name);
        let usage_lines: Vec<&str> = code.lines().filter(|l| l.contains(&usage)).collect();
        if usage_lines.len() != 1 {
            return Err(failure(format!(
                "icon \"{}\" used {} times, expected exactly once",
                name,
                usage_lines.len()
            ))
            .into());
        }
        let w = px(asset.width.max(1.0));
        let h = px(asset.height.max(1.0));
        if !usage_lines[0].contains(&format!("width={{{}}}", w))
            || !usage_lines[0].contains(&format!("height={{{}}}", h))
        {
            return Err(failure(format!("icon \"{}\" is not sized {}x{}", name, w, h)).into());
        }
    }

    for binding in &imports {
        if !expected_paths.contains(binding.import_path.as_str()) {
            return Err(ValidationFailure::new(
                RULE_ICON_UNEXPECTED,
                &format!(
                    "import \"{}\" does not correspond to any expected icon",
                    binding.import_path
                ),
            )
            .into());
        }
    }
    Ok(())
}

fn assert_text(code: &str, ir: &IrNode, expected: &ExpectedSets) -> Result<(), CompileError> {
    let payloads: Vec<String> = TEXT_PAYLOAD_RE
        .captures_iter(code)
        .map(|cap| normalize_text(&unescape_text(&cap[1])))
        .collect();
    let attr_texts: Vec<String> = ATTR_TEXT_RE
        .captures_iter(code)
        .map(|cap| normalize_text(&cap[1]))
        .collect();

    for (required, node_id) in &expected.required_texts {
        let found = payloads.iter().any(|p| p == required)
            || attr_texts.iter().any(|a| a == required);
        if !found {
            return Err(node_failure(
                ir,
                node_id,
                RULE_TEXT_MISSING,
                &format!("expected text \"{}\" not found in output", required),
            )
            .into());
        }
    }

    for payload in &payloads {
        if payload.is_empty() {
            continue;
        }
        if !expected.accepted_texts.contains(payload) {
            return Err(ValidationFailure::new(
                RULE_TEXT_EXTRA,
                &format!("output carries text \"{}\" the design does not contain", payload),
            )
            .with_hints(vec![
                "The text purge pass should have removed this; check pass ordering.".to_string(),
            ])
            .into());
        }
    }
    Ok(())
}

fn assert_geometry(
    code: &str,
    ir: &IrNode,
    icons: &HashMap<String, IconAsset>,
) -> Result<(), CompileError> {
    struct GeometryCheck<'a> {
        lists: Vec<Vec<String>>,
        icons: &'a HashMap<String, IconAsset>,
        failure: Option<ValidationFailure>,
    }

    impl IrVisitor for GeometryCheck<'_> {
        fn visit_node(&mut self, node: &IrNode) {
            if self.failure.is_some()
                || !node.visible_effective
                || self.icons.contains_key(&node.id)
            {
                return;
            }
            if !node.is_layout_only() {
                let w = format!("w-[{}px]", px(node.bounds.w));
                let h = format!("h-[{}px]", px(node.bounds.h));
                let left = format!("left-[{}px]", px(node.offset.0));
                let top = format!("top-[{}px]", px(node.offset.1));
                let is_text = node.kind == NodeKind::Text;

                let sized = self.lists.iter().find(|tokens| {
                    let size_ok = (tokens.contains(&w) && tokens.contains(&h))
                        || (is_text
                            && tokens.iter().any(|t| t == "w-fit")
                            && tokens.iter().any(|t| t == "h-fit"));
                    let pos_ok = !node.absolutely_positioned
                        || (tokens.contains(&left) && tokens.contains(&top));
                    size_ok && pos_ok
                });
                if sized.is_none() {
                    let rule = if node.absolutely_positioned {
                        RULE_POSITION
                    } else {
                        RULE_DIMENSIONS
                    };
                    self.failure = Some(ValidationFailure::for_node(
                        rule,
                        &format!(
                            "no element carries {} {}{}",
                            w,
                            h,
                            if node.absolutely_positioned {
                                format!(" with {} {}", left, top)
                            } else {
                                String::new()
                            }
                        ),
                        node,
                    ));
                    return;
                }
            }
            walk_node(self, node);
        }
    }

    let mut check = GeometryCheck {
        lists: class_lists(code),
        icons,
        failure: None,
    };
    check.visit_node(ir);
    match check.failure {
        Some(failure) => Err(failure.into()),
        None => Ok(()),
    }
}

fn gradient_token_present(lists: &[Vec<String>], css: &str) -> bool {
    let expected_norm = normalize_value(css);
    lists.iter().flatten().any(|t| {
        t.strip_prefix("bg-[")
            .and_then(|v| v.strip_suffix(']'))
            .map_or(false, |v| {
                let norm = normalize_value(v);
                norm == expected_norm || expected_norm.starts_with(&norm)
            })
    })
}

fn assert_paints(
    code: &str,
    ir: &IrNode,
    icons: &HashMap<String, IconAsset>,
) -> Result<(), CompileError> {
    struct PaintCheck<'a> {
        lists: Vec<Vec<String>>,
        icons: &'a HashMap<String, IconAsset>,
        failure: Option<ValidationFailure>,
    }

    impl PaintCheck<'_> {
        fn token_present(&self, prefix: &str, matcher: impl Fn(&str) -> bool) -> bool {
            self.lists.iter().flatten().any(|t| {
                t.strip_prefix(prefix)
                    .and_then(|v| v.strip_suffix(']'))
                    .map_or(false, &matcher)
            })
        }
    }

    impl IrVisitor for PaintCheck<'_> {
        fn visit_node(&mut self, node: &IrNode) {
            if self.failure.is_some()
                || !node.visible_effective
                || self.icons.contains_key(&node.id)
            {
                return;
            }
            match &node.background {
                Some(Background::Solid(color)) => {
                    if !self.token_present("bg-[", |v| matches_solid(v, color)) {
                        self.failure = Some(ValidationFailure::for_node(
                            RULE_COLOR,
                            &format!("background {} has no matching token", color.css_value()),
                            node,
                        ));
                        return;
                    }
                }
                Some(Background::Gradient { css }) => {
                    if !gradient_token_present(&self.lists, css) {
                        self.failure = Some(ValidationFailure::for_node(
                            RULE_COLOR,
                            &format!("gradient background \"{}\" has no matching token", css),
                            node,
                        ));
                        return;
                    }
                }
                None => {}
            }
            if let Some(text) = &node.text {
                if let Some(color) = &text.style.color {
                    if !self.token_present("text-[", |v| matches_solid(v, color)) {
                        self.failure = Some(ValidationFailure::for_node(
                            RULE_COLOR,
                            &format!("text color {} has no matching token", color.css_value()),
                            node,
                        ));
                        return;
                    }
                }
            }
            if let Some(shadow) = &node.box_shadow {
                let expected_norm = normalize_value(shadow);
                if !self.token_present("shadow-[", |v| normalize_value(v) == expected_norm) {
                    self.failure = Some(ValidationFailure::for_node(
                        RULE_SHADOW,
                        &format!("shadow \"{}\" has no matching token", shadow),
                        node,
                    ));
                    return;
                }
            }
            walk_node(self, node);
        }
    }

    let mut check = PaintCheck {
        lists: class_lists(code),
        icons,
        failure: None,
    };
    check.visit_node(ir);
    match check.failure {
        Some(failure) => Err(failure.into()),
        None => Ok(()),
    }
}

fn assert_background_whitelist(code: &str, expected: &ExpectedSets) -> Result<(), CompileError> {
    for tokens in class_lists(code) {
        for token in tokens {
            if let Some(value) = token.strip_prefix("bg-[").and_then(|v| v.strip_suffix(']')) {
                if !background_token_expected(value, expected) {
                    return Err(ValidationFailure::new(
                        RULE_BACKGROUND_EXTRA,
                        &format!("background token \"{}\" is not derived from the design", token),
                    )
                    .into());
                }
            }
        }
    }
    Ok(())
}

fn assert_typography(
    code: &str,
    ir: &IrNode,
    icons: &HashMap<String, IconAsset>,
) -> Result<(), CompileError> {
    // Token list per text payload line, plus the root element's tokens for
    // the shared family token.
    let lines: Vec<&str> = code.lines().collect();
    let root_tokens: Vec<String> = lines
        .iter()
        .position(|l| l.trim() == "return (")
        .and_then(|i| lines.get(i + 1))
        .and_then(|l| CLASSNAME_RE.captures(l))
        .map(|cap| cap[1].split_whitespace().map(String::from).collect())
        .unwrap_or_default();

    struct TypographyCheck<'a> {
        lines: &'a [&'a str],
        root_tokens: &'a [String],
        icons: &'a HashMap<String, IconAsset>,
        failure: Option<ValidationFailure>,
    }

    impl IrVisitor for TypographyCheck<'_> {
        fn visit_node(&mut self, node: &IrNode) {
            if self.failure.is_some()
                || !node.visible_effective
                || self.icons.contains_key(&node.id)
            {
                return;
            }
            if node.kind == NodeKind::Text {
                if let Some(text) = &node.text {
                    let payload = if !text.content.is_empty() {
                        text.content.clone()
                    } else {
                        text.lines.join(" ")
                    };
                    if !payload.is_empty() {
                        let wanted = normalize_text(&payload);
                        let element = self.lines.iter().find(|l| {
                            TEXT_PAYLOAD_RE
                                .captures(l)
                                .map_or(false, |cap| normalize_text(&unescape_text(&cap[1])) == wanted)
                        });
                        if let Some(line) = element {
                            let tokens: Vec<String> = CLASSNAME_RE
                                .captures(line)
                                .map(|cap| cap[1].split_whitespace().map(String::from).collect())
                                .unwrap_or_default();
                            if let Some(failure) =
                                check_text_tokens(node, text, &tokens, self.root_tokens)
                            {
                                self.failure = Some(failure);
                                return;
                            }
                        }
                    }
                }
            }
            walk_node(self, node);
        }
    }

    let mut check = TypographyCheck {
        lines: &lines,
        root_tokens: &root_tokens,
        icons,
        failure: None,
    };
    check.visit_node(ir);
    match check.failure {
        Some(failure) => Err(failure.into()),
        None => Ok(()),
    }
}

fn check_text_tokens(
    node: &IrNode,
    text: &crate::ir::TextSpec,
    tokens: &[String],
    root_tokens: &[String],
) -> Option<ValidationFailure> {
    let style = &text.style;
    let size = format!("text-[{}px]", px(style.size));
    if !tokens.contains(&size) {
        return Some(ValidationFailure::for_node(
            RULE_TYPOGRAPHY,
            &format!("missing font size token {}", size),
            node,
        ));
    }
    if let Some(line_height) = style.line_height {
        let leading = format!("leading-[{}px]", px(line_height));
        if !tokens.contains(&leading) {
            return Some(ValidationFailure::for_node(
                RULE_TYPOGRAPHY,
                &format!("missing line height token {}", leading),
                node,
            ));
        }
    }
    // Near-zero letter spacing is exempt.
    if style.letter_spacing.abs() > 0.05 && !tokens.iter().any(|t| t.starts_with("tracking-[")) {
        return Some(ValidationFailure::for_node(
            RULE_TYPOGRAPHY,
            "missing letter spacing token",
            node,
        ));
    }
    let weight_token = match style.weight {
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
    };
    if let Some(weight) = weight_token {
        if !tokens.iter().any(|t| t == weight) {
            return Some(ValidationFailure::for_node(
                RULE_TYPOGRAPHY,
                &format!("missing weight token {}", weight),
                node,
            ));
        }
    }
    if !style.family.is_empty() {
        let family = family_token(&style.family);
        if !tokens.contains(&family) && !root_tokens.contains(&family) {
            return Some(ValidationFailure::for_node(
                RULE_TYPOGRAPHY,
                &format!("missing family token {}", family),
                node,
            ));
        }
    }
    None
}

fn assert_layout_guard(code: &str, ir: &IrNode) -> Result<(), CompileError> {
    let used = class_lists(code)
        .iter()
        .flatten()
        .any(|t| t == "justify-between");
    if used && ir.layout.justify_content != Some(AxisAlign::SpaceBetween) {
        return Err(ValidationFailure::for_node(
            RULE_LAYOUT_GUARD,
            "justify-between present but the root does not request space-between",
            ir,
        )
        .into());
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_ir;
    use crate::generator::generate;
    use crate::schema::parse_document;

    fn doc(children: &str) -> crate::schema::RawDocument {
        parse_document(&format!(
            r#"{{"name":"doc","document":{{"id":"0:0","name":"Page","type":"CANVAS","children":[
                {{"id":"1:1","name":"Root","type":"FRAME","clipsContent":true,
                  "fills":[{{"type":"SOLID","color":{{"r":0.0667,"g":0.1333,"b":0.2,"a":1}}}}],
                  "absoluteBoundingBox":{{"x":0.0,"y":0.0,"width":200.0,"height":100.0}},
                  "children":[{}]}}]}}}}"#,
            children
        ))
        .unwrap()
    }

    fn text_child() -> &'static str {
        r#"{"id":"1:2","name":"Copy","type":"TEXT","characters":"Hello",
            "style":{"fontFamily":"Inter","fontSize":16.0},
            "fills":[{"type":"SOLID","color":{"r":1,"g":1,"b":1,"a":1}}],
            "absoluteBoundingBox":{"x":10.0,"y":10.0,"width":100.0,"height":20.0}}"#
    }

    fn compile(children: &str, icons: &HashMap<String, IconAsset>) -> (GeneratedFile, IrNode) {
        let config = CompilerConfig::default();
        let document = doc(children);
        let mut ir = build_ir(&document, "1:1", &config).unwrap();
        crate::builder::filter_hidden(&mut ir);
        let file = generate(&ir, icons, "Card");
        (file, ir)
    }

    #[test]
    fn test_clean_output_validates() {
        let icons = HashMap::new();
        let (mut file, ir) = compile(text_child(), &icons);
        validate_and_fix(&mut file, &ir, &icons, &CompilerConfig::default()).unwrap();
    }

    #[test]
    fn test_text_purge_removes_foreign_copy() {
        let icons = HashMap::new();
        let (mut file, ir) = compile(text_child(), &icons);
        file.code = file.code.replace(
            "</div>",
            "    <span className=\"text-[#ffffff] text-[16px]\">{\"Injected\"}</span>\n  </div>",
        );
        validate_and_fix(&mut file, &ir, &icons, &CompilerConfig::default()).unwrap();
        assert!(!file.code.contains("Injected"));
        assert!(file.code.contains("Hello"));
    }

    #[test]
    fn test_missing_text_is_rejected() {
        let icons = HashMap::new();
        let (mut file, ir) = compile(text_child(), &icons);
        file.code = file
            .code
            .lines()
            .filter(|l| !l.contains("Hello"))
            .collect::<Vec<_>>()
            .join("\n")
            + "\n";
        let err = validate_and_fix(&mut file, &ir, &icons, &CompilerConfig::default()).unwrap_err();
        match err {
            CompileError::Validation(f) => {
                assert_eq!(f.code, RULE_TEXT_MISSING);
                assert_eq!(f.node_id, "1:2");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_icon_autofix_inserts_import_and_usage() {
        let mut icons = HashMap::new();
        icons.insert(
            "1:3".to_string(),
            IconAsset {
                import_path: "/assets/star.svg".to_string(),
                width: 24.0,
                height: 24.0,
            },
        );
        let children = format!(
            "{},{}",
            text_child(),
            r#"{"id":"1:3","name":"star","type":"VECTOR",
                "absoluteBoundingBox":{"x":150.0,"y":10.0,"width":24.0,"height":24.0}}"#
        );
        let (mut file, ir) = compile(&children, &icons);
        // Drop the icon from the generated output, then let the engine
        // repair it.
        file.code = file
            .code
            .lines()
            .filter(|l| !l.contains("star") && !l.contains("<img"))
            .collect::<Vec<_>>()
            .join("\n")
            + "\n";
        validate_and_fix(&mut file, &ir, &icons, &CompilerConfig::default()).unwrap();
        assert!(file.code.contains("import star from \"/assets/star.svg\";"));
        assert_eq!(file.code.matches("<img src={star}").count(), 1);
    }

    #[test]
    fn test_icon_position_classes_are_stripped() {
        let mut lines = vec![
            "    <img src={star} alt=\"\" width={24} height={24} className=\"absolute left-[4px] top-[4px] w-[24px] h-[24px]\" />".to_string(),
        ];
        sanitize_icon_positions(&mut lines);
        assert_eq!(
            lines[0],
            "    <img src={star} alt=\"\" width={24} height={24} className=\"w-[24px] h-[24px]\" />"
        );
    }

    #[test]
    fn test_compaction_joins_split_values() {
        let mut lines =
            vec!["    <div className=\"bg-[rgba(255, 0, 0, 0.5)] w-[200px]\">".to_string()];
        compact_arbitrary_values(&mut lines);
        assert!(lines[0].contains("bg-[rgba(255,0,0,0.5)]"));
    }

    #[test]
    fn test_background_purge_drops_unknown() {
        let icons = HashMap::new();
        let (mut file, ir) = compile(text_child(), &icons);
        file.code = file
            .code
            .replace("bg-[#112233]", "bg-[#112233] bg-[#ff00ff]");
        validate_and_fix(&mut file, &ir, &icons, &CompilerConfig::default()).unwrap();
        assert!(file.code.contains("bg-[#112233]"));
        assert!(!file.code.contains("bg-[#ff00ff]"));
    }

    #[test]
    fn test_font_family_injected_at_root() {
        let icons = HashMap::new();
        let (mut file, ir) = compile(text_child(), &icons);
        validate_and_fix(&mut file, &ir, &icons, &CompilerConfig::default()).unwrap();
        let root_line = file
            .code
            .lines()
            .find(|l| l.trim_start().starts_with("<div"))
            .unwrap();
        assert!(root_line.contains("font-['Inter']"));
    }

    #[test]
    fn test_alpha_encodings_are_equivalent() {
        let children = r#"{"id":"1:2","name":"Veil","type":"RECTANGLE",
            "fills":[{"type":"SOLID","color":{"r":1,"g":0,"b":0,"a":0.5}}],
            "absoluteBoundingBox":{"x":10.0,"y":10.0,"width":50.0,"height":50.0}}"#;
        let icons = HashMap::new();
        let (file, ir) = compile(children, &icons);
        assert!(file.code.contains("bg-[rgba(255,0,0,0.5)]"));

        for variant in ["bg-[#ff000080]", "bg-[#ff0000/50]"] {
            let mut swapped = file.clone();
            swapped.code = swapped.code.replace("bg-[rgba(255,0,0,0.5)]", variant);
            validate_and_fix(&mut swapped, &ir, &icons, &CompilerConfig::default()).unwrap();
        }
    }

    #[test]
    fn test_layout_guard_rejects_stray_space_between() {
        let icons = HashMap::new();
        let (mut file, ir) = compile(text_child(), &icons);
        file.code = file.code.replace(
            "overflow-hidden",
            "overflow-hidden flex justify-between",
        );
        let err = validate_and_fix(&mut file, &ir, &icons, &CompilerConfig::default()).unwrap_err();
        match err {
            CompileError::Validation(f) => assert_eq!(f.code, RULE_LAYOUT_GUARD),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_dimension_assertion_reports_node() {
        let icons = HashMap::new();
        let (mut file, ir) = compile(text_child(), &icons);
        file.code = file.code.replace("w-[100px]", "w-[90px]");
        let err = validate_and_fix(&mut file, &ir, &icons, &CompilerConfig::default()).unwrap_err();
        match err {
            CompileError::Validation(f) => {
                assert!(f.code == RULE_DIMENSIONS || f.code == RULE_POSITION);
                assert_eq!(f.node_id, "1:2");
                assert!(f.bounds.is_some());
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_icon_import_rejected() {
        let icons = HashMap::new();
        let (mut file, ir) = compile(text_child(), &icons);
        file.code = format!("import ghost from \"/assets/ghost.svg\";\n\n{}", file.code);
        let err = validate_and_fix(&mut file, &ir, &icons, &CompilerConfig::default()).unwrap_err();
        match err {
            CompileError::Validation(f) => assert_eq!(f.code, RULE_ICON_UNEXPECTED),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_autofix_exhausted_on_empty_path() {
        let mut icons = HashMap::new();
        icons.insert(
            "1:3".to_string(),
            IconAsset {
                import_path: "".to_string(),
                width: 24.0,
                height: 24.0,
            },
        );
        let children = format!(
            "{},{}",
            text_child(),
            r#"{"id":"1:3","name":"star","type":"VECTOR",
                "absoluteBoundingBox":{"x":150.0,"y":10.0,"width":24.0,"height":24.0}}"#
        );
        let (mut file, ir) = compile(&children, &icons);
        let err = validate_and_fix(&mut file, &ir, &icons, &CompilerConfig::default()).unwrap_err();
        match err {
            CompileError::Validation(f) => assert!(f.code.starts_with("A-")),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
