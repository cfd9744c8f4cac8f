//! Cell modes, transpile options and transpiled cell definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::template::EscapeMode;

/// Source language of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellMode {
    /// Plain JavaScript.
    #[default]
    Js,
    /// Reactive JavaScript dialect, handled by a [`crate::ReactiveDialect`].
    Ojs,
    /// Markdown template.
    Md,
    /// HTML template.
    Html,
    /// TeX template, rendered in display mode.
    Tex,
    /// SQL query template.
    Sql,
    /// Graphviz DOT template.
    Dot,
}

/// Tag and escaping used to render a template cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderer {
    pub tag: &'static str,
    pub escape: EscapeMode,
}

impl CellMode {
    pub const ALL: [CellMode; 7] = [
        Self::Js,
        Self::Ojs,
        Self::Md,
        Self::Html,
        Self::Tex,
        Self::Sql,
        Self::Dot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Js => "js",
            Self::Ojs => "ojs",
            Self::Md => "md",
            Self::Html => "html",
            Self::Tex => "tex",
            Self::Sql => "sql",
            Self::Dot => "dot",
        }
    }

    /// Infer the mode from a file extension, without the leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "js" | "mjs" => Some(Self::Js),
            "ojs" => Some(Self::Ojs),
            "md" | "markdown" => Some(Self::Md),
            "html" | "htm" => Some(Self::Html),
            "tex" => Some(Self::Tex),
            "sql" => Some(Self::Sql),
            "dot" | "gv" => Some(Self::Dot),
            _ => None,
        }
    }

    /// Renderer of a template mode; `None` for the JavaScript modes.
    pub fn renderer(&self) -> Option<Renderer> {
        let (tag, escape) = match self {
            Self::Js | Self::Ojs => return None,
            Self::Md => ("md", EscapeMode::Raw),
            Self::Html => ("html", EscapeMode::Raw),
            Self::Tex => ("tex.block", EscapeMode::Cooked),
            Self::Sql => ("__sql(db, Inputs.table)", EscapeMode::Cooked),
            Self::Dot => ("dot", EscapeMode::Cooked),
        };
        Some(Renderer { tag, escape })
    }
}

impl fmt::Display for CellMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CellMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(CellMode::as_str).collect();
                format!("unknown cell mode '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

/// Options controlling how a cell is rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranspileOptions {
    /// Resolve relative and absolute import paths against the document URL.
    pub resolve_local_imports: bool,
    /// Resolve `FileAttachment` paths against the module URL.
    pub resolve_files: bool,
}

/// A cell compiled to a JavaScript function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranspiledCell {
    /// Source of the cell function, taking `inputs` as parameters.
    pub body: String,
    /// Free variables the cell reads, in first-occurrence order.
    pub inputs: Vec<String>,
    /// Top-level names the cell defines. Empty when it defines none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    /// Name under which the cell's value is published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Whether the runtime should display the returned value.
    pub autodisplay: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub autoview: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub automutable: bool,
}
