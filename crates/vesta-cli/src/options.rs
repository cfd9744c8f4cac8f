//! Transpile options from the command line.

use std::fs;

use anyhow::Context;
use clap::Args;
use vesta_core::TranspileOptions;

/// Flags shared by the commands that transpile cells.
#[derive(Args, Debug, Default)]
pub struct OptionArgs {
    /// JSON file with transpile options (camelCase keys)
    #[arg(long, value_name = "FILE")]
    pub options: Option<String>,

    /// Resolve relative and absolute imports against the document URL
    #[arg(long)]
    pub resolve_local_imports: bool,

    /// Resolve FileAttachment paths against the module URL
    #[arg(long)]
    pub resolve_files: bool,
}

impl OptionArgs {
    /// Load the options file, if any, then apply the flags on top.
    pub fn load(&self) -> anyhow::Result<TranspileOptions> {
        let mut options = match &self.options {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read options file {path}"))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("invalid options file {path}"))?
            }
            None => TranspileOptions::default(),
        };
        options.resolve_local_imports |= self.resolve_local_imports;
        options.resolve_files |= self.resolve_files;
        tracing::debug!(?options, "transpile options");
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_flags_without_file() {
        let args = OptionArgs {
            resolve_files: true,
            ..Default::default()
        };
        let options = args.load().unwrap();
        assert!(options.resolve_files);
        assert!(!options.resolve_local_imports);
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"resolveLocalImports": true}}"#).unwrap();
        let args = OptionArgs {
            options: Some(file.path().display().to_string()),
            resolve_files: true,
            ..Default::default()
        };
        let options = args.load().unwrap();
        assert!(options.resolve_local_imports);
        assert!(options.resolve_files);
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let args = OptionArgs {
            options: Some(file.path().display().to_string()),
            ..Default::default()
        };
        let err = args.load().unwrap_err();
        assert!(err.to_string().contains("invalid options file"));
    }
}
