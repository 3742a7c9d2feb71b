use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use packscope_core::config::{load_tool_config, resolve_executable, ResolveError, ToolConfig};
use packscope_core::services::packers::PackerTool;
use packscope_core::services::process::ToolCommand;
use tempfile::tempdir;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> =
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_use_tool_names() {
    let config = ToolConfig::default();
    assert_eq!(config.detector_command(), ToolCommand::native("diec"));
    assert_eq!(config.packer_command(PackerTool::Upx), ToolCommand::native("upx"));
    assert_eq!(config.timeout(), None);
}

#[cfg(not(windows))]
#[test]
fn windows_only_packers_default_to_wine() {
    let config = ToolConfig::default();
    for tool in [PackerTool::Mpress, PackerTool::Pecompact, PackerTool::Molebox, PackerTool::Petite]
    {
        assert_eq!(config.packer_command(tool), ToolCommand::launched("wine", tool.name()));
    }
}

#[test]
fn json_file_then_environment_overrides() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("tools.json");
    fs::write(
        &path,
        r#"{
            "detector": { "program": "/opt/die/diec" },
            "packers": {
                "upx": { "program": "/opt/upx/upx" },
                "petite": { "program": "C:\\tools\\petite.exe", "launcher": "" }
            },
            "timeout_secs": 30
        }"#,
    )
    .unwrap();

    let env = env_from(&[("PACKSCOPE_UPX", "/usr/local/bin/upx")]);
    let config = load_tool_config(Some(path.as_path()), env).expect("load config");

    assert_eq!(config.detector_command().program, PathBuf::from("/opt/die/diec"));
    assert_eq!(config.packer_command(PackerTool::Upx).program, PathBuf::from("/usr/local/bin/upx"));
    assert_eq!(config.packer_command(PackerTool::Petite).launcher, None);
    assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
}

#[test]
fn launcher_env_applies_only_to_launched_tools() {
    let config = load_tool_config(
        None,
        env_from(&[("PACKSCOPE_LAUNCHER", "/usr/bin/wine64"), ("PACKSCOPE_DIEC", "die")]),
    )
    .unwrap();

    assert_eq!(config.detector_command(), ToolCommand::native("die"));
    assert_eq!(config.packer_command(PackerTool::Upx).launcher, None);
    if PackerTool::Mpress.needs_launcher() {
        assert_eq!(
            config.packer_command(PackerTool::Mpress).launcher,
            Some(PathBuf::from("/usr/bin/wine64"))
        );
    }
}

#[test]
fn zero_timeout_means_no_timeout() {
    let config = ToolConfig { timeout_secs: Some(0), ..Default::default() };
    assert_eq!(config.timeout(), None);
}

#[test]
fn unreadable_or_invalid_config_files_error() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("missing.json");
    let err = load_tool_config(Some(missing.as_path()), |_| None).unwrap_err();
    assert!(err.to_string().contains("Failed to read tool config"));

    let bad = temp.path().join("bad.json");
    fs::write(&bad, "not-json").unwrap();
    let err = load_tool_config(Some(bad.as_path()), |_| None).unwrap_err();
    assert!(err.to_string().contains("Failed to parse tool config JSON"));
}

#[test]
fn resolve_executable_checks_paths_and_path_lookup() {
    let temp = tempdir().unwrap();
    let tool = temp.path().join("tool");
    fs::write(&tool, b"#!/bin/sh\n").unwrap();

    assert_eq!(resolve_executable(&tool).unwrap(), tool);
    assert!(matches!(
        resolve_executable(&temp.path().join("absent")),
        Err(ResolveError::MissingFile(_))
    ));
    assert!(matches!(
        resolve_executable(std::path::Path::new("packscope-definitely-not-installed")),
        Err(ResolveError::NotInPath(_))
    ));
}

#[cfg(unix)]
#[test]
fn preflight_requires_only_the_launcher_for_bare_programs() {
    let launched = ToolCommand::launched("sh", "mpress.exe");
    assert!(launched.preflight().is_ok());

    let missing_launcher = ToolCommand::launched("packscope-no-such-launcher", "mpress.exe");
    assert!(missing_launcher.preflight().is_err());

    let missing_program = ToolCommand::launched("sh", "/nonexistent/dir/mpress.exe");
    assert!(missing_program.preflight().is_err());
}
