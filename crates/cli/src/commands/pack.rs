use std::fs;

use anyhow::{anyhow, Context, Result};
use packscope_core::services::packers::{ExternalPacker, PackerTool};
use packscope_core::services::packing::{
    output_root_for, FailurePolicy, FileOutcome, PackSummary, PackingPipeline,
};

use crate::absolute_or_current;
use crate::commands::{packer_config, ToolOverrides};

/// Repack every PE file under `directory` with `tool`, mirroring the tree
/// into `<directory>_<tool>`.
pub fn pack_command(
    directory: &str,
    tool: PackerTool,
    overrides: &ToolOverrides,
    keep_going: bool,
    summary_path: Option<&str>,
) -> Result<()> {
    let source_root = absolute_or_current(directory)?;
    if !source_root.is_dir() {
        return Err(anyhow!("Directory does not exist: {}", source_root.display()));
    }

    let config = packer_config(tool, overrides)?;
    let packer =
        ExternalPacker::new(tool, config.packer_command(tool)).with_timeout(config.timeout());
    let policy = if keep_going { FailurePolicy::Continue } else { FailurePolicy::Abort };

    let output_root = output_root_for(&source_root, tool)?;
    println!("Packing with {} ({})", tool.display_name(), packer.command());
    println!("Files will save into: {}", output_root.display());

    let pipeline = PackingPipeline::new(&packer).with_policy(policy);
    let summary = pipeline
        .run(&source_root, |outcome| match outcome {
            FileOutcome::Skipped { source } => println!("Skipping non-PE file {}", source.display()),
            FileOutcome::Packed { output, .. } => println!("Packed {}", output.display()),
            FileOutcome::Failed { error, .. } => println!("{}", error),
        })
        .with_context(|| format!("Packing with {} failed", tool.display_name()))?;

    print_summary(&summary);

    if let Some(path) = summary_path {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(path, json).with_context(|| format!("Failed to write summary to {}", path))?;
        println!("Summary written to {}", path);
    }

    if summary.aborted {
        return Err(anyhow!(
            "Packing aborted after a failure; rerun with --keep-going to continue past failures"
        ));
    }
    if !summary.failed.is_empty() {
        return Err(anyhow!("{} file(s) failed to pack", summary.failed.len()));
    }
    Ok(())
}

fn print_summary(summary: &PackSummary) {
    println!(
        "Packed: {}, skipped: {}, failed: {}",
        summary.packed.len(),
        summary.skipped.len(),
        summary.failed.len()
    );
    for failed in &summary.failed {
        println!("- {}: {}", failed.path.display(), failed.error);
    }
    println!("Files saved into: {}", summary.output_root.display());
}
