use std::path::Path;

use anyhow::{Context, Result};

use super::ToolConfig;
use crate::services::packers::PackerTool;

/// Prefix for per-tool program overrides, e.g. `PACKSCOPE_UPX`.
pub const ENV_PREFIX: &str = "PACKSCOPE_";

/// Overrides the launcher of every tool that uses one by default.
pub const ENV_LAUNCHER: &str = "PACKSCOPE_LAUNCHER";

/// Load a tool config from an optional JSON file, then apply environment
/// overrides read through `env`.
///
/// `env` is injected so callers decide where variables come from; the CLI
/// passes `std::env::var`.
pub fn load_tool_config(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ToolConfig> {
    let mut config = match path {
        Some(path) => {
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read tool config at {}", path.display()))?;
            serde_json::from_str::<ToolConfig>(&body)
                .with_context(|| format!("Failed to parse tool config JSON at {}", path.display()))?
        }
        None => ToolConfig::default(),
    };
    config.apply_env(env);
    Ok(config)
}

impl ToolConfig {
    /// Overlay `PACKSCOPE_DIEC`, `PACKSCOPE_<TOOL>` and `PACKSCOPE_LAUNCHER`.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(program) = env(&format!("{ENV_PREFIX}DIEC")) {
            self.detector.get_or_insert_with(Default::default).program = Some(program);
        }

        let launcher = env(ENV_LAUNCHER);
        for tool in PackerTool::ALL {
            let key = format!("{ENV_PREFIX}{}", tool.name().to_ascii_uppercase());
            if let Some(program) = env(&key) {
                self.packers.get_mut(tool).program = Some(program);
            }
            if tool.needs_launcher() {
                if let Some(launcher) = &launcher {
                    self.packers.get_mut(tool).launcher = Some(launcher.clone());
                }
            }
        }
    }
}
