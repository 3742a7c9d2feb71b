use std::path::Path;

use anyhow::Result;
use packscope_core::services::detector::{Detector, DiecDetector, DIEC_ARGS};
use packscope_core::services::packers::{ExternalPacker, Packer, PackerTool};
use serde::Serialize;

use crate::commands::load_config;

#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub role: String,
    pub command: String,
    pub arguments: String,
    pub available: bool,
}

/// List the detector and every supported packer with its resolved command.
pub fn list_tools_command(config: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config)?;

    let detector = DiecDetector::new(config.detector_command());
    let mut entries = vec![ToolInfo {
        name: detector.name().to_string(),
        role: "detector".to_string(),
        command: detector.command().to_string(),
        arguments: format!("{} <file>", DIEC_ARGS.join(" ")),
        available: detector.preflight().is_ok(),
    }];

    for tool in PackerTool::ALL {
        let packer = ExternalPacker::new(tool, config.packer_command(tool));
        let mut arguments: Vec<&str> = tool.leading_args().to_vec();
        arguments.push("<file>");
        entries.push(ToolInfo {
            name: tool.name().to_string(),
            role: "packer".to_string(),
            command: packer.command().to_string(),
            arguments: arguments.join(" "),
            available: packer.preflight().is_ok(),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Tools:");
    for entry in entries {
        println!(
            "- {} [{}]: {} {} ({})",
            entry.name,
            entry.role,
            entry.command,
            entry.arguments,
            if entry.available { "OK" } else { "MISSING" }
        );
    }
    Ok(())
}
