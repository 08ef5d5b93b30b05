//! Compiler configuration.
//!
//! Every process-wide toggle lives here as an enumerated field with a
//! default, and the whole object is passed into the pipeline at
//! construction. Nothing in the core reads ambient state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    /// Reject output when an expected icon cannot be repaired into place.
    pub strict_icon_enforcement: bool,
    /// Lower edge of the icon size window, in px.
    pub icon_min_px: f64,
    /// Upper edge of the icon size window, in px.
    pub icon_max_px: f64,
    /// Maximum long-side/short-side ratio for icon eligibility.
    pub icon_max_aspect: f64,
    /// Maximum number of vector leaves a container may hold and still
    /// classify as a single icon.
    pub icon_max_vector_leaves: usize,
    /// Maximum descent depth when scanning a container for vector leaves.
    pub icon_max_scan_depth: usize,
    /// Suppress an inherited opaque pure-black fill on non-clipping layout
    /// wrappers. Observed editor behavior; flagged for product confirmation.
    pub suppress_inherited_black_fill: bool,
    /// Reference stage size for percentage-based mount placement.
    pub stage_width: f64,
    pub stage_height: f64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            strict_icon_enforcement: true,
            icon_min_px: 8.0,
            icon_max_px: 64.0,
            icon_max_aspect: 2.0,
            icon_max_vector_leaves: 8,
            icon_max_scan_depth: 5,
            suppress_inherited_black_fill: true,
            stage_width: 1920.0,
            stage_height: 1080.0,
        }
    }
}

impl CompilerConfig {
    /// Stable serialized form, folded into the compile-cache key so a config
    /// change invalidates cached output.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert!(config.strict_icon_enforcement);
        assert_eq!(config.icon_max_vector_leaves, 8);
        assert_eq!(config.icon_max_scan_depth, 5);
    }

    #[test]
    fn test_fingerprint_tracks_fields() {
        let a = CompilerConfig::default();
        let mut b = CompilerConfig::default();
        b.icon_max_px = 48.0;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: CompilerConfig = serde_json::from_str("{\"iconMaxPx\": 32}").unwrap();
        assert_eq!(config.icon_max_px, 32.0);
        assert!(config.suppress_inherited_black_fill);
    }
}
