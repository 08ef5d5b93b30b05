//! Code generation.
//!
//! Pre-order walk over the IR emitting styled JSX. Non-effectively-visible
//! nodes emit nothing. Icon-mapped nodes collapse into a single `<img>` and
//! their subtrees are never visited. Text payloads are emitted as raw JSX
//! string expressions so braces or quotes in copy cannot be misparsed as
//! markup.
//!
//! The output is line-oriented on purpose: every element owns exactly one
//! line (open tags, leaves, text runs), which is what keeps the validator's
//! repair passes tractable.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::ir::{px, IrNode};

// ═══════════════════════════════════════════════════════════════════════════════
// INPUT/OUTPUT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconAsset {
    pub import_path: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBinding {
    pub local_name: String,
    pub import_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    pub code: String,
    /// Sorted by local name for stable output.
    pub imports: Vec<ImportBinding>,
    pub component_name: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINT
// ═══════════════════════════════════════════════════════════════════════════════

pub fn generate(
    root: &IrNode,
    icons: &HashMap<String, IconAsset>,
    component_name: &str,
) -> GeneratedFile {
    let mut emitter = Emitter {
        icons,
        bindings: Vec::new(),
        by_path: HashMap::new(),
        used_names: HashSet::new(),
        lines: Vec::new(),
    };
    emitter.emit_node(root, 0);

    let mut imports = emitter.bindings;
    imports.sort_by(|a, b| a.local_name.cmp(&b.local_name));

    let mut code = String::new();
    for binding in &imports {
        code.push_str(&format!(
            "import {} from \"{}\";\n",
            binding.local_name, binding.import_path
        ));
    }
    if !imports.is_empty() {
        code.push('\n');
    }
    code.push_str(&format!(
        "export default function {}() {{\n  return (\n",
        component_name
    ));
    if emitter.lines.is_empty() {
        code.push_str("    null\n");
    } else {
        code.push_str(&emitter.lines.join("\n"));
        code.push('\n');
    }
    code.push_str("  );\n}\n");

    debug!(
        "generated {} ({} lines, {} imports)",
        component_name,
        code.lines().count(),
        imports.len()
    );
    GeneratedFile {
        code,
        imports,
        component_name: component_name.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EMITTER
// ═══════════════════════════════════════════════════════════════════════════════

struct Emitter<'a> {
    icons: &'a HashMap<String, IconAsset>,
    bindings: Vec<ImportBinding>,
    by_path: HashMap<String, String>,
    used_names: HashSet<String>,
    lines: Vec<String>,
}

impl Emitter<'_> {
    fn emit_node(&mut self, node: &IrNode, depth: usize) {
        if !node.visible_effective {
            return;
        }
        let indent = "  ".repeat(depth + 2);

        if let Some(asset) = self.icons.get(&node.id) {
            let name = self.binding_for(&asset.import_path);
            let w = px(asset.width.max(1.0));
            let h = px(asset.height.max(1.0));
            self.lines.push(format!(
                "{}<img src={{{}}} alt=\"\" width={{{}}} height={{{}}} className=\"w-[{}px] h-[{}px]\" />",
                indent, name, w, h, w, h
            ));
            return;
        }

        if let Some(text) = &node.text {
            let payload = if !text.content.is_empty() {
                text.content.clone()
            } else {
                text.lines.join(" ")
            };
            if !payload.is_empty() {
                self.lines.push(format!(
                    "{}<span className=\"{}\">{{\"{}\"}}</span>",
                    indent,
                    node.class_tokens.join(" "),
                    escape_text(&payload)
                ));
                return;
            }
            // Empty text runs degrade to a structural wrapper so layout and
            // background classes survive.
        }

        let class_attr = node.class_tokens.join(" ");
        let has_visible_children = node.children.iter().any(|c| c.visible_effective);
        if has_visible_children {
            self.lines.push(format!("{}<div className=\"{}\">", indent, class_attr));
            for child in &node.children {
                self.emit_node(child, depth + 1);
            }
            self.lines.push(format!("{}</div>", indent));
        } else {
            self.lines
                .push(format!("{}<div className=\"{}\" />", indent, class_attr));
        }
    }

    fn binding_for(&mut self, path: &str) -> String {
        if let Some(name) = self.by_path.get(path) {
            return name.clone();
        }
        let base = identifier_from_path(path);
        let mut name = base.clone();
        let mut suffix = 2;
        while !self.used_names.insert(name.clone()) {
            name = format!("{}{}", base, suffix);
            suffix += 1;
        }
        self.by_path.insert(path.to_string(), name.clone());
        self.bindings.push(ImportBinding {
            local_name: name.clone(),
            import_path: path.to_string(),
        });
        name
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Backslashes and the string delimiter are the only characters that could
/// break out of the raw JSX string form.
pub fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Derive a camelCase import binding from an asset file name:
/// "/assets/ic-arrow_up.svg" → "icArrowUp".
pub fn identifier_from_path(path: &str) -> String {
    let stem = path
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(path));

    let words: Vec<&str> = stem
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return "asset".to_string();
    }
    let mut name = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            name.push_str(&word.to_lowercase());
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                name.push_str(&first.to_uppercase().to_string());
                name.push_str(&chars.as_str().to_lowercase());
            }
        }
    }
    if name.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        name = format!("asset{}", name);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_ir;
    use crate::config::CompilerConfig;
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

    #[test]
    fn test_invisible_nodes_emit_nothing() {
        let document = doc(
            r#"{"id":"1:2","name":"Hidden","type":"TEXT","visible":false,"characters":"Nope",
                "absoluteBoundingBox":{"x":10.0,"y":10.0,"width":100.0,"height":20.0}}"#,
        );
        let ir = build_ir(&document, "1:1", &CompilerConfig::default()).unwrap();
        let file = generate(&ir, &HashMap::new(), "Card");
        assert!(!file.code.contains("Nope"));
        assert!(!file.code.contains("<span"));
    }

    #[test]
    fn test_text_payload_is_raw_string() {
        let document = doc(
            r#"{"id":"1:2","name":"Copy","type":"TEXT","characters":"Say \"hi\" {now}",
                "style":{"fontFamily":"Inter","fontSize":16.0},
                "fills":[{"type":"SOLID","color":{"r":1,"g":1,"b":1,"a":1}}],
                "absoluteBoundingBox":{"x":10.0,"y":10.0,"width":100.0,"height":20.0}}"#,
        );
        let ir = build_ir(&document, "1:1", &CompilerConfig::default()).unwrap();
        let file = generate(&ir, &HashMap::new(), "Card");
        assert!(file.code.contains(r#"{"Say \"hi\" {now}"}"#));
    }

    #[test]
    fn test_icon_collapses_subtree_and_reuses_binding() {
        let document = doc(
            r#"{"id":"1:2","name":"ic left","type":"VECTOR",
                "absoluteBoundingBox":{"x":10.0,"y":10.0,"width":24.0,"height":24.0},
                "children":[]},
               {"id":"1:3","name":"ic right","type":"VECTOR",
                "absoluteBoundingBox":{"x":60.0,"y":10.0,"width":24.0,"height":24.0},
                "children":[]}"#,
        );
        let ir = build_ir(&document, "1:1", &CompilerConfig::default()).unwrap();
        let mut icons = HashMap::new();
        icons.insert(
            "1:2".to_string(),
            IconAsset {
                import_path: "/assets/ic-x.svg".to_string(),
                width: 24.0,
                height: 24.0,
            },
        );
        icons.insert(
            "1:3".to_string(),
            IconAsset {
                import_path: "/assets/ic-x.svg".to_string(),
                width: 24.0,
                height: 24.0,
            },
        );
        let file = generate(&ir, &icons, "Card");
        assert_eq!(file.imports.len(), 1);
        assert_eq!(file.imports[0].local_name, "icX");
        assert_eq!(file.code.matches("import icX").count(), 1);
        assert_eq!(file.code.matches("<img src={icX}").count(), 2);
    }

    #[test]
    fn test_binding_suffix_dedup() {
        let mut emitter = Emitter {
            icons: &HashMap::new(),
            bindings: Vec::new(),
            by_path: HashMap::new(),
            used_names: HashSet::new(),
            lines: Vec::new(),
        };
        let a = emitter.binding_for("/a/icon.svg");
        let b = emitter.binding_for("/b/icon.svg");
        assert_eq!(a, "icon");
        assert_eq!(b, "icon2");
    }

    #[test]
    fn test_identifier_from_path() {
        assert_eq!(identifier_from_path("/assets/ic-arrow_up.svg"), "icArrowUp");
        assert_eq!(identifier_from_path("logo.svg"), "logo");
        assert_eq!(identifier_from_path("/x/9grid.svg"), "asset9grid");
        assert_eq!(identifier_from_path("///.svg"), "asset");
    }

    #[test]
    fn test_deterministic_output() {
        let document = doc(
            r#"{"id":"1:2","name":"Copy","type":"TEXT","characters":"Hello",
                "style":{"fontFamily":"Inter","fontSize":16.0},
                "fills":[{"type":"SOLID","color":{"r":1,"g":1,"b":1,"a":1}}],
                "absoluteBoundingBox":{"x":10.0,"y":10.0,"width":100.0,"height":20.0}}"#,
        );
        let ir = build_ir(&document, "1:1", &CompilerConfig::default()).unwrap();
        let a = generate(&ir, &HashMap::new(), "Card");
        let b = generate(&ir, &HashMap::new(), "Card");
        assert_eq!(a.code, b.code);
        assert_eq!(a.imports, b.imports);
    }
}
