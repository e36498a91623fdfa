//! Backend that renders the instruction stream as Go source text.

pub mod builder;
pub(crate) mod expr;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::exec::spec;

pub use builder::Builder;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Name in the `package` clause.
    pub package: String,
    /// Function that receives the top-level statements.
    pub main_func: String,
    /// Emit `//line file:line` before statements that carry a position.
    pub line_directives: bool,
    pub indent: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            package: "main".to_string(),
            main_func: "main".to_string(),
            line_directives: true,
            indent: "\t".to_string(),
        }
    }
}

/// A rendered Go source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    source: String,
}

impl Code {
    pub(crate) fn new(source: String) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_source(self) -> String {
        self.source
    }
}

impl spec::Code for Code {
    /// Number of source lines.
    fn len(&self) -> usize {
        self.source.lines().count()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
