//! One-shot pipeline entry.
//!
//! One request is one synchronous run: build IR → generate → validate →
//! (separately) merge. The IR is built once and read-only afterwards; the
//! same request always yields the same output or the same typed failure.
//! Retries and timeouts belong to the collaborators dispatching requests,
//! never here.

use log::debug;
use std::collections::HashMap;

use crate::builder::{build_ir, filter_hidden};
use crate::cache::CompileCache;
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::generator::{generate, GeneratedFile, IconAsset};
use crate::ir::IrNode;
use crate::merge::{merge_component, MergeRequest};
use crate::schema::RawDocument;
use crate::validator::validate_and_fix;

// ═══════════════════════════════════════════════════════════════════════════════
// REQUEST/OUTPUT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct CompileRequest {
    pub document: RawDocument,
    pub target_node_id: String,
    pub component_name: String,
    /// Node id → exported asset, provided by the source adapter.
    pub icon_assets: HashMap<String, IconAsset>,
}

#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub file: GeneratedFile,
    pub file_name: String,
    pub ir: IrNode,
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Compiler {
    config: CompilerConfig,
    cache: Option<CompileCache>,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Compiler {
            config,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: CompileCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn compile(&self, request: &CompileRequest) -> Result<CompileOutput, CompileError> {
        let mut ir = build_ir(&request.document, &request.target_node_id, &self.config)?;
        filter_hidden(&mut ir);

        let file_name = format!("{}.jsx", request.component_name);
        let cache_key = self.cache_key(request);

        if let Some(cache) = &self.cache {
            if let Some(file) = cache.get(&request.component_name, &cache_key) {
                debug!("cache hit for {}", request.component_name);
                return Ok(CompileOutput {
                    file,
                    file_name,
                    ir,
                });
            }
        }

        let mut file = generate(&ir, &request.icon_assets, &request.component_name);
        validate_and_fix(&mut file, &ir, &request.icon_assets, &self.config)?;

        if let Some(cache) = &self.cache {
            cache.set(&request.component_name, &cache_key, &file);
        }
        Ok(CompileOutput {
            file,
            file_name,
            ir,
        })
    }

    pub fn merge(&self, host: &str, request: &MergeRequest) -> Result<String, CompileError> {
        merge_component(host, request, &self.config)
    }

    /// Deterministic cache key: document, request parameters, icon map in
    /// sorted order, config fingerprint.
    fn cache_key(&self, request: &CompileRequest) -> String {
        let mut icon_ids: Vec<&String> = request.icon_assets.keys().collect();
        icon_ids.sort();
        let icons: Vec<String> = icon_ids
            .iter()
            .map(|id| {
                let asset = &request.icon_assets[*id];
                format!(
                    "{}={}:{}x{}",
                    id, asset.import_path, asset.width, asset.height
                )
            })
            .collect();
        format!(
            "{}|{}|{}|{}|{}",
            serde_json::to_string(&request.document).unwrap_or_default(),
            request.target_node_id,
            request.component_name,
            icons.join(";"),
            self.config.fingerprint()
        )
    }
}
