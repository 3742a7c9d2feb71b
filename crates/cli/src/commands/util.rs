use std::path::{Path, PathBuf};

use anyhow::Result;
use packscope_core::config::{load_tool_config, ToolConfig, ToolSpec};
use packscope_core::model::FileRecord;

/// Tool location flags shared by the analyze and pack commands.
#[derive(Debug, Clone, Default)]
pub struct ToolOverrides {
    /// JSON tool config file.
    pub config: Option<PathBuf>,
    /// Explicit program path for the selected tool.
    pub program: Option<String>,
    /// Explicit launcher; an empty string runs the tool natively.
    pub launcher: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ToolOverrides {
    fn apply_to(&self, spec: &mut ToolSpec) {
        if let Some(program) = &self.program {
            spec.program = Some(program.clone());
        }
        if let Some(launcher) = &self.launcher {
            spec.launcher = Some(launcher.clone());
        }
    }
}

/// Load the tool config file (if any) and overlay `PACKSCOPE_*` variables.
pub fn load_config(config: Option<&Path>) -> Result<ToolConfig> {
    load_tool_config(config, |key| std::env::var(key).ok())
}

/// Load config for the detector with command-line flags applied last.
pub fn detector_config(overrides: &ToolOverrides) -> Result<ToolConfig> {
    let mut config = load_config(overrides.config.as_deref())?;
    overrides.apply_to(config.detector.get_or_insert_with(ToolSpec::default));
    if overrides.timeout_secs.is_some() {
        config.timeout_secs = overrides.timeout_secs;
    }
    Ok(config)
}

/// Load config for one packer with command-line flags applied last.
pub fn packer_config(
    tool: packscope_core::services::packers::PackerTool,
    overrides: &ToolOverrides,
) -> Result<ToolConfig> {
    let mut config = load_config(overrides.config.as_deref())?;
    overrides.apply_to(config.packers.get_mut(tool));
    if overrides.timeout_secs.is_some() {
        config.timeout_secs = overrides.timeout_secs;
    }
    Ok(config)
}

/// One-line rendering of a record for progress output.
pub fn describe_record(record: &FileRecord) -> String {
    match (record.packer_name(), record.error_message()) {
        (_, Some(message)) => format!("{} ({})", record.status().as_str(), message),
        (Some(packer), None) => format!("{} ({})", record.status().as_str(), packer),
        (None, None) => record.status().as_str().to_string(),
    }
}
