use std::path::Path;

use anyhow::{anyhow, Context, Result};
use packscope_core::services::analysis::{AnalysisPipeline, TableOutputs};
use packscope_core::services::detector::DiecDetector;

use crate::absolute_or_current;
use crate::commands::{describe_record, detector_config, ToolOverrides};

/// Fingerprint and classify every file under `input`, then write the CSV and
/// binary tables.
pub fn analyze_command(
    input: &str,
    output_csv: &str,
    output_table: &str,
    overrides: &ToolOverrides,
) -> Result<()> {
    let input_path = absolute_or_current(input)?;
    if !input_path.is_dir() {
        return Err(anyhow!("Input folder does not exist: {}", input_path.display()));
    }

    let config = detector_config(overrides)?;
    let detector = DiecDetector::new(config.detector_command()).with_timeout(config.timeout());

    println!("Binary Directory:\t\t{}", input_path.display());
    println!("CSV file will save:\t\t{}", output_csv);
    println!("Binary table will save:\t\t{}", output_table);

    let outputs = TableOutputs {
        text: Path::new(output_csv).to_path_buf(),
        binary: Path::new(output_table).to_path_buf(),
    };
    let pipeline = AnalysisPipeline::new(&detector);
    let report = pipeline
        .run_and_persist(&input_path, &outputs, |path, record| {
            println!("{} -> {}", path.display(), describe_record(record));
        })
        .with_context(|| format!("Failed to analyze {}", input_path.display()))?;

    println!("Results saved to {}", outputs.text.display());
    println!("Binary table saved to {}", outputs.binary.display());
    println!(
        "Files: {} (packed: {}, not packed: {}, errors: {})",
        report.tally.total(),
        report.tally.packed,
        report.tally.not_packed,
        report.tally.errors
    );

    Ok(())
}
