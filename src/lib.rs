// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # ang-codegen
//!
//! Emission core of the ang service compiler: turns a schema IR into a Go
//! backend tree.
//!
//! ## Pipeline
//!
//! ```text
//! Schema (JSON/YAML IR)
//!     │  ir::migrate_to_current
//!     ▼
//! model::project ──► Model (resolved Go types, signatures, lowered flows)
//!     │
//!     ▼
//! Emitter::emit(family) for each ArtifactFamily
//!     │  TemplateSource::render (overlay first, bundled second)
//!     │  custom_blocks::merge with the file on disk
//!     │  PostProcessor (tree-sitter-go check or gofmt)
//!     ▼
//! write_if_changed ──► internal/…, cmd/…, tests/contract/…
//! ```
//!
//! Methods without a flow, inline code or manual override are collected by
//! the [`ImplAudit`] and reported after emission.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ang_codegen::{generate, CancelToken, EmitterConfig, Schema};
//!
//! let schema = Schema::load("schema.json".as_ref())?;
//! let config = EmitterConfig {
//!     output_dir: "backend".into(),
//!     go_module: "github.com/acme/market".into(),
//!     ..Default::default()
//! };
//! let generation = generate(schema, config, CancelToken::new())?;
//! for missing in &generation.missing_impls {
//!     eprintln!("not implemented: {missing}");
//! }
//! ```

pub mod audit;
pub mod config;
pub mod contract;
pub mod emit;
pub mod error;
pub mod flow;
pub mod format;
pub mod ir;
pub mod model;
pub mod overrides;
pub mod signature;
pub mod stamp;
pub mod templates;
pub mod util;

pub use audit::{ImplAudit, MissingImpl};
pub use config::{ConfigOverrides, EmitterConfig, FormatterKind, Layout, CONFIG_FILE};
pub use contract::{synthesize, ContractCase, ContractSuite};
pub use emit::{generate, ArtifactFamily, CancelToken, EmitReport, Emitter, Generation};
pub use error::{Error, Result};
pub use format::{
    write_if_changed, FormatError, FormatMode, Formatter, GoSyntaxFormatter, GofmtFormatter,
    PostProcessor, WriteOutcome,
};
pub use ir::{migrate_to_current, Schema, CURRENT_IR_VERSION};
pub use model::{project, Model};
pub use signature::{FinderSignature, MethodSignature};
pub use stamp::Stamp;
pub use templates::TemplateSource;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
