//! Merge Engine.
//!
//! Installs or updates a generated component's usage inside a host file
//! without disturbing unrelated content. The mount region is delimited by
//! paired BEGIN/END anchor comments; a legacy single-marker form is
//! normalized to the paired form on first encounter, and duplicated
//! consecutive markers collapse to one. Everything inside the region is
//! regenerable; everything outside is only touched by replace-mode stale
//! reference removal and ghost cleanup.
//!
//! Idempotence is the contract: running the same merge twice produces
//! byte-identical host bytes the second time.

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::CompilerConfig;
use crate::error::{CompileError, MergeConflict};

pub const MOUNT_BEGIN: &str = "{/* draftsmith:begin */}";
pub const MOUNT_END: &str = "{/* draftsmith:end */}";
pub const MOUNT_LEGACY: &str = "{/* draftsmith:mount */}";

const STYLESHEET_SPECIFIER: &str = "./index.css";

lazy_static! {
    static ref HOST_IMPORT_RE: Regex =
        Regex::new(r#"^import\s+([A-Za-z_$][\w$]*)\s+from\s+["']([^"']+)["'];?\s*$"#).unwrap();
    static ref SIDE_EFFECT_IMPORT_RE: Regex =
        Regex::new(r#"^import\s+["']([^"']+)["'];?\s*$"#).unwrap();
    static ref TILE_IDENT_RE: Regex = Regex::new(r"<([A-Z][A-Za-z0-9_]*)").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// REQUEST TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeMode {
    #[default]
    Append,
    Replace,
}

/// Overlay rectangle in reference-stage pixels; rendered as a
/// percentage-positioned absolute container around the usage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub component_name: String,
    /// Host-relative module specifier for the generated file.
    pub import_path: String,
    pub mode: MergeMode,
    pub placement: Option<OverlayRect>,
    /// Directory of the host file, for on-disk module resolution during
    /// ghost cleanup. `None` disables disk probing (everything is kept).
    pub host_dir: Option<PathBuf>,
    /// Module prefix identifying generated components ("./generated/").
    pub generated_prefix: String,
}

impl MergeRequest {
    pub fn new(component_name: &str, import_path: &str) -> Self {
        MergeRequest {
            component_name: component_name.to_string(),
            import_path: import_path.to_string(),
            mode: MergeMode::Append,
            placement: None,
            host_dir: None,
            generated_prefix: "./generated/".to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINT
// ═══════════════════════════════════════════════════════════════════════════════

pub fn merge_component(
    host: &str,
    request: &MergeRequest,
    config: &CompilerConfig,
) -> Result<String, CompileError> {
    let ends_with_newline = host.ends_with('\n');
    let mut lines: Vec<String> = host.lines().map(String::from).collect();

    normalize_anchors(&mut lines);
    if locate_region(&lines)?.is_none() {
        install_anchors(&mut lines);
    }

    if request.mode == MergeMode::Replace {
        remove_stale_generated(&mut lines, request)?;
    }

    ensure_import(&mut lines, &request.component_name, &request.import_path);

    let (begin, end) = locate_region(&lines)?.ok_or(MergeConflict::AnchorsUnlocatable)?;
    let tile = build_tile(request, config);
    let region_has_tile = lines[begin + 1..end].iter().any(|l| l.trim() == tile);
    if !region_has_tile {
        let indent: String = lines[begin].chars().take_while(|c| *c == ' ').collect();
        lines.insert(end, format!("{}{}", indent, tile));
        debug!("mounted <{} /> into region", request.component_name);
    }

    ghost_cleanup(&mut lines, request);

    let mut out = lines.join("\n");
    if ends_with_newline {
        out.push('\n');
    }
    Ok(out)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANCHOR NORMALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

fn is_marker(line: &str, marker: &str) -> bool {
    line.trim() == marker
}

fn normalize_anchors(lines: &mut Vec<String>) {
    // Legacy single marker becomes an empty paired region in place.
    let mut i = 0;
    while i < lines.len() {
        if is_marker(&lines[i], MOUNT_LEGACY) {
            let indent: String = lines[i].chars().take_while(|c| *c == ' ').collect();
            lines[i] = format!("{}{}", indent, MOUNT_BEGIN);
            lines.insert(i + 1, format!("{}{}", indent, MOUNT_END));
        }
        i += 1;
    }

    // Duplicate consecutive markers collapse to one.
    let mut deduped: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines.drain(..) {
        let duplicate = deduped.last().map_or(false, |prev: &String| {
            (is_marker(prev, MOUNT_BEGIN) && is_marker(&line, MOUNT_BEGIN))
                || (is_marker(prev, MOUNT_END) && is_marker(&line, MOUNT_END))
        });
        if !duplicate {
            deduped.push(line);
        }
    }
    *lines = deduped;
}

/// Find the single BEGIN/END pair, or `None` when the file has no markers.
fn locate_region(lines: &[String]) -> Result<Option<(usize, usize)>, MergeConflict> {
    let begins: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| is_marker(l, MOUNT_BEGIN))
        .map(|(i, _)| i)
        .collect();
    let ends: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| is_marker(l, MOUNT_END))
        .map(|(i, _)| i)
        .collect();

    match (begins.len(), ends.len()) {
        (0, 0) => Ok(None),
        (1, 1) if begins[0] < ends[0] => Ok(Some((begins[0], ends[0]))),
        (1, 1) => Err(MergeConflict::UnbalancedAnchors(
            "end marker precedes begin marker".to_string(),
        )),
        _ => Err(MergeConflict::UnbalancedAnchors(format!(
            "{} begin / {} end markers",
            begins.len(),
            ends.len()
        ))),
    }
}

/// No markers anywhere: try the known top-level render call, then the known
/// app-root closing tag, then append a minimal wrapper construct.
fn install_anchors(lines: &mut Vec<String>) {
    if let Some(i) = lines.iter().position(|l| l.contains(".render(")) {
        let indent: String = lines[i].chars().take_while(|c| *c == ' ').collect();
        lines.insert(i + 1, format!("{}  {}", indent, MOUNT_BEGIN));
        lines.insert(i + 2, format!("{}  {}", indent, MOUNT_END));
        debug!("installed anchors inside render call");
        return;
    }

    if let Some(open) = lines.iter().position(|l| l.contains("id=\"app-root\"")) {
        let close = (open + 1..lines.len())
            .rev()
            .find(|&j| lines[j].trim() == "</div>");
        if let Some(close) = close {
            let indent: String = lines[open].chars().take_while(|c| *c == ' ').collect();
            lines.insert(close, format!("{}  {}", indent, MOUNT_BEGIN));
            lines.insert(close + 1, format!("{}  {}", indent, MOUNT_END));
            debug!("installed anchors before app-root close");
            return;
        }
    }

    if !lines.last().map_or(true, |l| l.is_empty()) {
        lines.push(String::new());
    }
    lines.push("export function DraftsmithMount() {".to_string());
    lines.push("  return (".to_string());
    lines.push("    <div className=\"relative\">".to_string());
    lines.push(format!("      {}", MOUNT_BEGIN));
    lines.push(format!("      {}", MOUNT_END));
    lines.push("    </div>".to_string());
    lines.push("  );".to_string());
    lines.push("}".to_string());
    debug!("appended mount wrapper construct");
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGION CONTENT
// ═══════════════════════════════════════════════════════════════════════════════

fn format_pct(value: f64, reference: f64) -> String {
    let pct = if reference > 0.0 {
        value / reference * 100.0
    } else {
        0.0
    };
    let rounded = (pct * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        let s = format!("{:.2}", rounded);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn build_tile(request: &MergeRequest, config: &CompilerConfig) -> String {
    let usage = format!("<{} />", request.component_name);
    match &request.placement {
        None => usage,
        Some(rect) => format!(
            "<div className=\"absolute\" style={{{{ left: \"{}%\", top: \"{}%\", width: \"{}%\", height: \"{}%\" }}}}>{}</div>",
            format_pct(rect.x, config.stage_width),
            format_pct(rect.y, config.stage_height),
            format_pct(rect.w, config.stage_width),
            format_pct(rect.h, config.stage_height),
            usage
        ),
    }
}

fn ensure_import(lines: &mut Vec<String>, name: &str, path: &str) {
    let import_line = format!("import {} from \"{}\";", name, path);
    if lines.iter().any(|l| l.trim() == import_line) {
        return;
    }
    match lines.iter().rposition(|l| l.starts_with("import ")) {
        Some(i) => lines.insert(i + 1, import_line),
        None => {
            lines.insert(0, import_line);
            lines.insert(1, String::new());
        }
    }
}

/// Replace mode: clear the region and drop every other generated-component
/// reference in the file (imports under the generated prefix and their
/// usages), leaving unrelated imports alone.
fn remove_stale_generated(
    lines: &mut Vec<String>,
    request: &MergeRequest,
) -> Result<(), CompileError> {
    if let Some((begin, end)) = locate_region(lines)? {
        lines.drain(begin + 1..end);
    }

    let stale: Vec<String> = lines
        .iter()
        .filter_map(|l| HOST_IMPORT_RE.captures(l.trim()))
        .filter(|cap| {
            cap[2].starts_with(request.generated_prefix.as_str())
                && cap[1] != request.component_name
        })
        .map(|cap| cap[1].to_string())
        .collect();

    for name in &stale {
        let usage_re = Regex::new(&format!(r"<{}\b", regex::escape(name))).unwrap();
        lines.retain(|l| {
            !(usage_re.is_match(l)
                || HOST_IMPORT_RE
                    .captures(l.trim())
                    .map_or(false, |cap| &cap[1] == name.as_str()))
        });
        debug!("removed stale generated component {}", name);
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// GHOST CLEANUP
// ═══════════════════════════════════════════════════════════════════════════════

const ASSET_EXTENSIONS: &[&str] = &[
    ".css", ".scss", ".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp",
];

fn is_asset_specifier(specifier: &str) -> bool {
    ASSET_EXTENSIONS.iter().any(|ext| specifier.ends_with(ext))
}

fn module_resolves(host_dir: &Path, specifier: &str) -> bool {
    let base = host_dir.join(specifier);
    if base.exists() {
        return true;
    }
    for ext in ["js", "jsx", "ts", "tsx"] {
        if base.with_extension(ext).exists() {
            return true;
        }
        if base.join(format!("index.{}", ext)).exists() {
            return true;
        }
    }
    false
}

fn ghost_cleanup(lines: &mut Vec<String>, request: &MergeRequest) {
    // Imports whose relative target is gone from disk. Module resolution is
    // best effort: without a host directory we keep everything.
    if let Some(host_dir) = &request.host_dir {
        lines.retain(|l| {
            let trimmed = l.trim();
            if let Some(cap) = HOST_IMPORT_RE.captures(trimmed) {
                let specifier = cap[2].to_string();
                if (specifier.starts_with("./") || specifier.starts_with("../"))
                    && !is_asset_specifier(&specifier)
                    && !module_resolves(host_dir, &specifier)
                {
                    warn!("removing ghost import of \"{}\"", specifier);
                    return false;
                }
            }
            true
        });

        // Restore the known stylesheet side-effect import when its file
        // exists but the line went missing.
        let has_stylesheet = lines.iter().any(|l| {
            SIDE_EFFECT_IMPORT_RE
                .captures(l.trim())
                .map_or(false, |cap| &cap[1] == STYLESHEET_SPECIFIER)
        });
        if !has_stylesheet && host_dir.join("index.css").exists() {
            let import_line = format!("import \"{}\";", STYLESHEET_SPECIFIER);
            match lines.iter().rposition(|l| l.starts_with("import ")) {
                Some(i) => lines.insert(i + 1, import_line),
                None => lines.insert(0, import_line),
            }
            debug!("restored stylesheet import");
        }
    }

    // Tiles whose identifier no longer resolves to an import.
    let imported: Vec<String> = lines
        .iter()
        .filter_map(|l| HOST_IMPORT_RE.captures(l.trim()))
        .map(|cap| cap[1].to_string())
        .collect();
    if let Ok(Some((begin, end))) = locate_region(lines) {
        let mut keep: Vec<bool> = Vec::new();
        for line in &lines[begin + 1..end] {
            let orphan = TILE_IDENT_RE
                .captures_iter(line)
                .any(|cap| !imported.iter().any(|n| n == &cap[1]));
            keep.push(!orphan);
        }
        let mut idx = 0;
        let mut removed = 0usize;
        lines.retain(|_| {
            idx += 1;
            let pos = idx - 1;
            if pos > begin && pos < end {
                let k = keep[pos - begin - 1];
                if !k {
                    removed += 1;
                }
                k
            } else {
                true
            }
        });
        if removed > 0 {
            debug!("removed {} orphaned tile(s)", removed);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
