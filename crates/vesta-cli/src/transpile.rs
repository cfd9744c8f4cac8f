//! Transpile command implementation for Vesta CLI.
//!
//! Compiles one cell and prints the result as JSON.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, bail};
use vesta_core::{CellMode, TranspileOptions, transpile};

/// Read a cell source; `-` reads standard input.
pub fn read_source(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("failed to read cell from stdin")?;
        return Ok(source);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
}

/// Mode of the cell at `path`: the explicit mode if given, else inferred
/// from the file extension.
pub fn resolve_mode(path: &str, mode: Option<CellMode>) -> anyhow::Result<CellMode> {
    if let Some(mode) = mode {
        return Ok(mode);
    }
    if path == "-" {
        return Ok(CellMode::Js);
    }
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    match CellMode::from_extension(extension) {
        Some(mode) => Ok(mode),
        None => bail!("cannot infer the cell mode of {path}; pass --mode"),
    }
}

/// Execute the transpile command.
pub fn execute(
    path: &str,
    mode: Option<CellMode>,
    options: &TranspileOptions,
    pretty: bool,
) -> anyhow::Result<()> {
    let mode = resolve_mode(path, mode)?;
    let source = read_source(path)?;
    tracing::debug!(path, %mode, bytes = source.len(), "transpiling cell");

    let cell = transpile(&source, mode, options)?;
    let json = if pretty {
        serde_json::to_string_pretty(&cell)?
    } else {
        serde_json::to_string(&cell)?
    };
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_extension() {
        assert_eq!(resolve_mode("cells/intro.md", None).unwrap(), CellMode::Md);
        assert_eq!(resolve_mode("chart.js", None).unwrap(), CellMode::Js);
    }

    #[test]
    fn test_explicit_mode_wins() {
        assert_eq!(resolve_mode("query.txt", Some(CellMode::Sql)).unwrap(), CellMode::Sql);
    }

    #[test]
    fn test_unknown_extension() {
        let err = resolve_mode("notes.txt", None).unwrap_err();
        assert!(err.to_string().contains("pass --mode"));
    }

    #[test]
    fn test_stdin_defaults_to_js() {
        assert_eq!(resolve_mode("-", None).unwrap(), CellMode::Js);
    }
}
