//! Tool configuration: where the detector and each packer live, which
//! launcher (compatibility shim) runs them, and the per-invocation timeout.
//!
//! Configuration is resolved once by the frontend and injected into the
//! adapters; nothing in the services layer reads the environment.

mod load;
mod resolve;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use load::{load_tool_config, ENV_LAUNCHER, ENV_PREFIX};
pub use resolve::{find_in_path, resolve_executable, ResolveError};

use crate::services::packers::PackerTool;
use crate::services::process::ToolCommand;

/// Default detector executable (Detect It Easy console).
pub const DEFAULT_DETECTOR: &str = "diec";

/// Default launcher for Windows-only packers on non-Windows hosts.
pub const DEFAULT_LAUNCHER: &str = "wine";

/// Program/launcher override for a single external tool.
///
/// `launcher = Some("")` explicitly disables a launcher the tool would
/// otherwise get by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launcher: Option<String>,
}

/// Per-packer overrides keyed by tool name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackerSpecs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upx: Option<ToolSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpress: Option<ToolSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pecompact: Option<ToolSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub molebox: Option<ToolSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub petite: Option<ToolSpec>,
}

impl PackerSpecs {
    pub fn get(&self, tool: PackerTool) -> Option<&ToolSpec> {
        match tool {
            PackerTool::Upx => self.upx.as_ref(),
            PackerTool::Mpress => self.mpress.as_ref(),
            PackerTool::Pecompact => self.pecompact.as_ref(),
            PackerTool::Molebox => self.molebox.as_ref(),
            PackerTool::Petite => self.petite.as_ref(),
        }
    }

    pub fn get_mut(&mut self, tool: PackerTool) -> &mut ToolSpec {
        let slot = match tool {
            PackerTool::Upx => &mut self.upx,
            PackerTool::Mpress => &mut self.mpress,
            PackerTool::Pecompact => &mut self.pecompact,
            PackerTool::Molebox => &mut self.molebox,
            PackerTool::Petite => &mut self.petite,
        };
        slot.get_or_insert_with(ToolSpec::default)
    }
}

/// Serializable tool configuration, typically loaded from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detector: Option<ToolSpec>,
    #[serde(default)]
    pub packers: PackerSpecs,
    /// Kill external tools that run longer than this many seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ToolConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|secs| *secs > 0).map(Duration::from_secs)
    }

    /// Command used to run the detector.
    pub fn detector_command(&self) -> ToolCommand {
        let spec = self.detector.clone().unwrap_or_default();
        ToolCommand {
            program: PathBuf::from(spec.program.unwrap_or_else(|| DEFAULT_DETECTOR.to_string())),
            launcher: launcher_from(spec.launcher, None),
        }
    }

    /// Command used to run `tool`, with its default launcher applied.
    pub fn packer_command(&self, tool: PackerTool) -> ToolCommand {
        let spec = self.packers.get(tool).cloned().unwrap_or_default();
        let default_launcher = tool.needs_launcher().then_some(DEFAULT_LAUNCHER);
        ToolCommand {
            program: PathBuf::from(
                spec.program.unwrap_or_else(|| tool.default_program().to_string()),
            ),
            launcher: launcher_from(spec.launcher, default_launcher),
        }
    }
}

fn launcher_from(configured: Option<String>, default: Option<&str>) -> Option<PathBuf> {
    match configured {
        Some(value) if value.is_empty() => None,
        Some(value) => Some(PathBuf::from(value)),
        None => default.map(PathBuf::from),
    }
}
