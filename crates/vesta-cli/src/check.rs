//! Check command implementation for Vesta CLI.
//!
//! Transpiles many cells in parallel and reports which ones fail.

use std::time::Instant;

use anyhow::bail;
use rayon::prelude::*;
use vesta_core::{CellMode, TranspileOptions, TranspiledCell, transpile};

use crate::colors;
use crate::transpile::{read_source, resolve_mode};

fn check_file(
    path: &str,
    mode: Option<CellMode>,
    options: &TranspileOptions,
) -> anyhow::Result<TranspiledCell> {
    let mode = resolve_mode(path, mode)?;
    let source = read_source(path)?;
    transpile(&source, mode, options).map_err(|err| anyhow::anyhow!("{}", err.with_hint()))
}

fn report_ok(path: &str, cell: &TranspiledCell) {
    println!(
        "{}ok{}   {} {}({} inputs, {} outputs){}",
        colors::GREEN,
        colors::RESET,
        path,
        colors::DIM,
        cell.inputs.len(),
        cell.outputs.len(),
        colors::RESET
    );
}

fn report_failure(path: &str, err: &anyhow::Error) {
    eprintln!("{}FAIL{} {}: {:#}", colors::RED, colors::RESET, path, err);
}

/// Execute the check command.
pub fn execute(
    paths: &[String],
    mode: Option<CellMode>,
    options: &TranspileOptions,
    keep_going: bool,
) -> anyhow::Result<()> {
    let start = Instant::now();

    if !keep_going {
        let cells = paths
            .par_iter()
            .map(|path| {
                check_file(path, mode, options).map_err(|err| {
                    report_failure(path, &err);
                    anyhow::anyhow!("{path} failed to transpile")
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        for (path, cell) in paths.iter().zip(&cells) {
            report_ok(path, cell);
        }
        print_summary(paths.len(), 0, start);
        return Ok(());
    }

    let results: Vec<_> = paths
        .par_iter()
        .map(|path| check_file(path, mode, options))
        .collect();
    let mut failed = 0;
    for (path, result) in paths.iter().zip(&results) {
        match result {
            Ok(cell) => report_ok(path, cell),
            Err(err) => {
                failed += 1;
                report_failure(path, err);
            }
        }
    }
    print_summary(paths.len(), failed, start);
    if failed > 0 {
        bail!("{failed} of {} cells failed to transpile", paths.len());
    }
    Ok(())
}

fn print_summary(total: usize, failed: usize, start: Instant) {
    let (color, label) = if failed == 0 {
        (colors::GREEN, "Checked")
    } else {
        (colors::YELLOW, "Checked with failures:")
    };
    println!(
        "\n{}{}{}{} {} cells in {:.2}s ({} failed)",
        colors::BOLD,
        color,
        label,
        colors::RESET,
        total,
        start.elapsed().as_secs_f64(),
        failed
    );
}
