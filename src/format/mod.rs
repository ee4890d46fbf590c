//! Post-processing of generated Go
//!
//! Every rendered buffer goes through a [`Formatter`] before it reaches the
//! disk. In [`FormatMode::Strict`] a formatter failure aborts the artifact; in
//! [`FormatMode::Lenient`] the raw bytes are written instead.

pub mod custom_blocks;

use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tree_sitter::{Node, Parser};

/// Formatter failures
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("{unit}:{line}:{column}: syntax error near {snippet:?}")]
    Syntax {
        unit: String,
        line: usize,
        column: usize,
        snippet: String,
    },

    #[error("{unit}: output is not valid UTF-8")]
    Encoding { unit: String },

    #[error("go parser unavailable: {0}")]
    Parser(String),

    #[error("{unit}: {program} failed: {message}")]
    External {
        unit: String,
        program: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Target-language formatter: `format(bytes, unit) -> bytes`
pub trait Formatter: Send + Sync {
    fn format(&self, src: &[u8], unit: &str) -> std::result::Result<Vec<u8>, FormatError>;
}

/// How formatter failures are treated
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum FormatMode {
    /// Fail the artifact
    #[default]
    Strict,
    /// Fall back to the unformatted bytes
    Lenient,
}

/// In-process formatter backed by tree-sitter-go.
///
/// Rejects anything the grammar does not accept and normalizes whitespace:
/// trailing blanks are stripped, blank-line runs collapse to one and the
/// file ends with a single newline. Raw string literals are left untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoSyntaxFormatter;

impl Formatter for GoSyntaxFormatter {
    fn format(&self, src: &[u8], unit: &str) -> std::result::Result<Vec<u8>, FormatError> {
        let text = std::str::from_utf8(src).map_err(|_| FormatError::Encoding {
            unit: unit.to_string(),
        })?;
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| FormatError::Parser(e.to_string()))?;
        let tree = parser
            .parse(text, None)
            .ok_or_else(|| FormatError::Parser("parse aborted".into()))?;
        let root = tree.root_node();

        if root.has_error() {
            if let Some(bad) = first_error(root) {
                let pos = bad.start_position();
                let line_text = text.lines().nth(pos.row).unwrap_or_default();
                return Err(FormatError::Syntax {
                    unit: unit.to_string(),
                    line: pos.row + 1,
                    column: pos.column + 1,
                    snippet: line_text.trim().chars().take(60).collect(),
                });
            }
        }

        let mut raw_rows = Vec::new();
        collect_raw_rows(root, &mut raw_rows);
        Ok(normalize_whitespace(text, &raw_rows).into_bytes())
    }
}

/// First `ERROR` or missing node in document order
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            if let Some(found) = first_error(child) {
                return Some(found);
            }
        }
    }
    None
}

/// Row spans (exclusive start, inclusive end) continuing a raw string
fn collect_raw_rows(node: Node<'_>, out: &mut Vec<(usize, usize)>) {
    if node.kind() == "raw_string_literal" {
        let (start, end) = (node.start_position().row, node.end_position().row);
        if end > start {
            out.push((start, end));
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_raw_rows(child, out);
    }
}

fn normalize_whitespace(text: &str, raw_rows: &[(usize, usize)]) -> String {
    let in_raw = |row: usize| raw_rows.iter().any(|&(s, e)| row > s && row <= e);
    let opens_raw = |row: usize| raw_rows.iter().any(|&(s, _)| row == s);

    let mut out = String::with_capacity(text.len());
    let mut blank_run = false;
    for (row, line) in text.lines().enumerate() {
        if in_raw(row) {
            out.push_str(line);
            out.push('\n');
            blank_run = false;
            continue;
        }
        let line = if opens_raw(row) { line } else { line.trim_end() };
        if line.trim().is_empty() {
            if blank_run || out.is_empty() {
                continue;
            }
            blank_run = true;
            out.push('\n');
            continue;
        }
        blank_run = false;
        out.push_str(line);
        out.push('\n');
    }
    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

/// Formatter delegating to an external `gofmt` binary
#[derive(Debug, Clone)]
pub struct GofmtFormatter {
    program: PathBuf,
}

impl Default for GofmtFormatter {
    fn default() -> Self {
        Self {
            program: PathBuf::from("gofmt"),
        }
    }
}

impl GofmtFormatter {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Formatter for GofmtFormatter {
    fn format(&self, src: &[u8], unit: &str) -> std::result::Result<Vec<u8>, FormatError> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(src)?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(FormatError::External {
                unit: unit.to_string(),
                program: self.program.display().to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// Formatter plus failure policy
pub struct PostProcessor {
    formatter: Box<dyn Formatter>,
    mode: FormatMode,
}

impl std::fmt::Debug for PostProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostProcessor")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::new(Box::new(GoSyntaxFormatter), FormatMode::Strict)
    }
}

impl PostProcessor {
    pub fn new(formatter: Box<dyn Formatter>, mode: FormatMode) -> Self {
        Self { formatter, mode }
    }

    pub fn mode(&self) -> FormatMode {
        self.mode
    }

    /// Format `src`, labelled by its artifact path
    pub fn process(&self, src: Vec<u8>, path: &str) -> Result<Vec<u8>> {
        match self.formatter.format(&src, path) {
            Ok(formatted) => Ok(formatted),
            Err(source) => match self.mode {
                FormatMode::Strict => Err(Error::PostProcess {
                    path: path.to_string(),
                    source,
                }),
                FormatMode::Lenient => {
                    tracing::warn!(path, error = %source, "formatting failed, writing raw output");
                    Ok(src)
                }
            },
        }
    }
}

/// Result of an idempotent write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Write `bytes` to `path` unless the file already holds exactly those bytes.
///
/// The new content goes to a temp file in the destination directory which
/// is then renamed over the target, so readers never see a truncated file.
pub fn write_if_changed(path: &Path, bytes: &[u8]) -> Result<WriteOutcome> {
    if let Ok(existing) = std::fs::read(path) {
        if existing == bytes {
            tracing::trace!(path = %path.display(), "unchanged");
            return Ok(WriteOutcome::Unchanged);
        }
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|source| Error::OutputDir {
        path: dir.clone(),
        source,
    })?;
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "written");
    Ok(WriteOutcome::Written)
}
