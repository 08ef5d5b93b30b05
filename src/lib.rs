//! # Draftsmith Compiler Ground Truth
//!
//! Deterministic design-to-code compiler: one design-tool subtree in,
//! validated utility-class JSX out, merged idempotently into a host file.
//!
//! ## Pipeline Invariants
//!
//! 1. **Single IR**: the IR tree is built exactly once per request and is
//!    read-only for every downstream stage. All output derives from it.
//! 2. **Strict data flow**: Builder → Synthesizer (per node, during build)
//!    → Generator → Validator/Autofix → Merge. No stage reaches backwards.
//! 3. **Determinism**: identical input yields byte-identical generated code
//!    and token order. No clocks, no randomness, no retries.
//! 4. **Visibility**: a node that is not effectively visible emits no
//!    markup. Effective visibility folds the ancestor chain, own opacity
//!    and the inherited clip rectangle.
//! 5. **Parity**: the validator enforces 1:1 correspondence between IR and
//!    generated text, repair passes first, assertions last. Output that
//!    cannot be proven faithful is rejected, never persisted.
//! 6. **Idempotent merge**: re-running the merge with identical inputs
//!    produces byte-identical host bytes the second time.
//!
//! Fetching design documents, exporting assets, job dispatch and version
//! control are collaborator concerns consumed through the types in
//! `schema` and `generator`; the core performs no IO beyond the merge
//! engine's best-effort module resolution and the opt-in compile cache.

mod builder;
mod cache;
mod classes;
mod color;
mod config;
mod error;
mod generator;
mod ir;
mod merge;
mod pipeline;
mod schema;
mod validator;
mod visitor;

pub use builder::{build_ir, filter_hidden};
pub use cache::CompileCache;
pub use classes::synthesize_classes;
pub use config::CompilerConfig;
pub use error::{CompileError, InputError, MergeConflict, ValidationFailure};
pub use generator::{generate, GeneratedFile, IconAsset, ImportBinding};
pub use ir::{Background, IrNode, NodeKind, Rect};
pub use merge::{
    merge_component, MergeMode, MergeRequest, OverlayRect, MOUNT_BEGIN, MOUNT_END,
};
pub use pipeline::{CompileOutput, CompileRequest, Compiler};
pub use schema::{parse_document, RawDocument, RawNode};
pub use validator::validate_and_fix;
