//! Error taxonomy for the draftsmith compiler.
//!
//! Every failure surfaces as a typed result. The core performs no retries:
//! the same input always yields the same output or the same typed failure.
//!
//! - `InputError`: the request cannot even start (missing target node,
//!   malformed document payload).
//! - `ValidationFailure`: an assertion pass rejected the generated markup;
//!   carries the offending node context. Nothing is persisted.
//! - `MergeConflict`: the host file's anchors could not be located or
//!   normalized; the host file is left untouched.
//!
//! Autofix passes that cannot resolve what they own escalate into a
//! `ValidationFailure` with an `A-`-prefixed rule code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ir::Rect;

// ═══════════════════════════════════════════════════════════════════════════════
// RULE CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const RULE_ICON_USAGE: &str = "V-ICON-001";
pub const RULE_ICON_UNEXPECTED: &str = "V-ICON-002";
pub const RULE_TEXT_MISSING: &str = "V-TEXT-001";
pub const RULE_TEXT_EXTRA: &str = "V-TEXT-002";
pub const RULE_DIMENSIONS: &str = "V-GEOM-001";
pub const RULE_POSITION: &str = "V-GEOM-002";
pub const RULE_COLOR: &str = "V-PAINT-001";
pub const RULE_BACKGROUND_EXTRA: &str = "V-PAINT-002";
pub const RULE_SHADOW: &str = "V-PAINT-003";
pub const RULE_TYPOGRAPHY: &str = "V-TYPE-001";
pub const RULE_LAYOUT_GUARD: &str = "V-FLEX-001";
pub const RULE_AUTOFIX_ICON: &str = "A-ICON-001";

fn get_guarantee(code: &str) -> &'static str {
    match code {
        RULE_ICON_USAGE => "Every expected icon asset is imported and used exactly once at its mapped size.",
        RULE_ICON_UNEXPECTED => "No import binding exists without a matching expected icon asset.",
        RULE_TEXT_MISSING => "Every visible text run in the design appears in the generated markup.",
        RULE_TEXT_EXTRA => "The generated markup carries no text the design does not contain.",
        RULE_DIMENSIONS => "Every visible, non-layout-only node carries width/height tokens matching its bounds.",
        RULE_POSITION => "Every absolutely positioned node carries left/top tokens matching its offsets.",
        RULE_COLOR => "Every resolved background and text color is present as a class token.",
        RULE_BACKGROUND_EXTRA => "No background token survives that is absent from the design.",
        RULE_SHADOW => "Every resolved shadow effect is present as a class token.",
        RULE_TYPOGRAPHY => "Font size, line height, tracking, weight and family tokens match each text node's style.",
        RULE_LAYOUT_GUARD => "Space-between distribution appears only when the design root requests it.",
        RULE_AUTOFIX_ICON => "Icon repair only runs against asset paths that yield a valid import binding.",
        _ => "Unknown rule.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOP-LEVEL ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("input error: {0}")]
    Input(#[from] InputError),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationFailure),
    #[error("merge conflict: {0}")]
    Merge(#[from] MergeConflict),
}

#[derive(Debug, Clone, Error)]
pub enum InputError {
    #[error("target node \"{0}\" not found in document")]
    NodeNotFound(String),
    #[error("malformed document payload: {0}")]
    MalformedPayload(String),
}

#[derive(Debug, Clone, Error)]
pub enum MergeConflict {
    #[error("mount anchors could not be located in the host file")]
    AnchorsUnlocatable,
    #[error("mount anchors are unbalanced: {0}")]
    UnbalancedAnchors(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATION FAILURE
// ═══════════════════════════════════════════════════════════════════════════════

/// Structured rejection report: the violated rule plus the offending node.
/// Serializes to camelCase JSON for collaborator consumption.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code}] {message} (node {node_id} \"{node_name}\" {node_kind})")]
pub struct ValidationFailure {
    pub code: String,
    pub message: String,
    pub guarantee: String,
    pub node_id: String,
    pub node_name: String,
    pub node_kind: String,
    pub bounds: Option<Rect>,
    pub hints: Vec<String>,
}

impl ValidationFailure {
    pub fn new(code: &str, message: &str) -> Self {
        ValidationFailure {
            code: code.to_string(),
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            node_id: String::new(),
            node_name: String::new(),
            node_kind: String::new(),
            bounds: None,
            hints: Vec::new(),
        }
    }

    pub fn for_node(code: &str, message: &str, node: &crate::ir::IrNode) -> Self {
        ValidationFailure {
            code: code.to_string(),
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            node_id: node.id.clone(),
            node_name: node.name.clone(),
            node_kind: node.kind.label().to_string(),
            bounds: Some(node.bounds),
            hints: Vec::new(),
        }
    }

    pub fn with_hints(mut self, hints: Vec<String>) -> Self {
        self.hints = hints;
        self
    }

    /// An autofix pass gave up on something it owns. Escalates into the
    /// validation taxonomy rather than introducing a fourth fatal class.
    pub fn autofix_exhausted(message: &str) -> Self {
        ValidationFailure::new(RULE_AUTOFIX_ICON, message)
    }
}
