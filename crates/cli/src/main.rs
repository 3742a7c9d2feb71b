use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use packscope::commands::{
    analyze_command, list_tools_command, pack_command, show_table_command, ToolOverrides,
};
use packscope_core::services::packers::PackerTool;
use tracing_subscriber::EnvFilter;

/// Packer fingerprinting and batch repacking for PE corpora.
///
/// This CLI is a thin wrapper around `packscope-core`; all pipeline logic
/// lives in the library.
#[derive(Parser, Debug)]
#[command(
    name = "packscope",
    version,
    about = "Packer detection and batch repacking for PE corpora",
    long_about = None
)]
struct Cli {
    /// Emit debug diagnostics on stderr (otherwise controlled by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fingerprint every file in a folder and classify it with the packer detector.
    ///
    /// Writes a CSV (`SHA256,Filename,Packed Status,Packer Name`) and a binary
    /// table holding the same rows.
    Analyze {
        /// Folder to scan recursively.
        input_folder: String,

        /// CSV output path.
        output_csv: String,

        /// Binary table output path.
        output_table: String,

        /// JSON tool config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Detector executable (defaults to `diec` on PATH).
        #[arg(long)]
        detector: Option<String>,

        /// Launcher to run the detector through; empty for none.
        #[arg(long)]
        launcher: Option<String>,

        /// Kill a detector invocation after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Copy every PE file into `<directory>_<tool>` and pack the copies.
    Pack {
        /// Corpus directory; it is never modified.
        directory: String,

        /// Packer to use: upx, mpress, pecompact, molebox, petite.
        #[arg(long, value_parser = parse_packer_tool)]
        tool: PackerTool,

        /// JSON tool config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Packer executable (defaults to the tool name).
        #[arg(long)]
        tool_path: Option<String>,

        /// Launcher such as `wine`; empty to run the packer natively.
        #[arg(long)]
        launcher: Option<String>,

        /// Kill a packer invocation after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,

        /// Keep packing after a file fails instead of aborting the batch.
        #[arg(long, default_value_t = false)]
        keep_going: bool,

        /// Write a JSON run summary to this path.
        #[arg(long)]
        summary: Option<String>,
    },

    /// List the detector and packers with their resolved commands.
    Tools {
        /// JSON tool config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print a stored result table (CSV or binary).
    ShowTable {
        /// Table file; `.csv` is read as text, anything else as binary.
        path: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn parse_packer_tool(value: &str) -> Result<PackerTool, String> {
    value.parse()
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(version = packscope_core::version(), "starting");

    match cli.command {
        Command::Analyze {
            input_folder,
            output_csv,
            output_table,
            config,
            detector,
            launcher,
            timeout,
        } => {
            let overrides =
                ToolOverrides { config, program: detector, launcher, timeout_secs: timeout };
            analyze_command(&input_folder, &output_csv, &output_table, &overrides)?
        }
        Command::Pack {
            directory,
            tool,
            config,
            tool_path,
            launcher,
            timeout,
            keep_going,
            summary,
        } => {
            let overrides =
                ToolOverrides { config, program: tool_path, launcher, timeout_secs: timeout };
            pack_command(&directory, tool, &overrides, keep_going, summary.as_deref())?
        }
        Command::Tools { config, json } => list_tools_command(config.as_deref(), json)?,
        Command::ShowTable { path, json } => show_table_command(&path, json)?,
    }

    Ok(())
}
