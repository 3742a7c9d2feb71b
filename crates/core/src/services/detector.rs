//! Adapter around the external packer-identification tool.
//!
//! The detector is driven through its human-readable output, so the parsing
//! rule lives in [`classify_output`] on its own and the process plumbing in
//! [`DiecDetector`]. Other detectors plug in through the [`Detector`] trait.

use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::config::ResolveError;
use crate::model::Detection;
use crate::services::process::{ProcessError, ToolCommand};

/// Recursive + deep scan, heuristic scan, verbose text output.
pub const DIEC_ARGS: [&str; 3] = ["-rd", "--heuristicscan", "--verbose"];

/// Marker preceding the packer name in detector output.
pub const PACKER_MARKER: &str = "Packer:";

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Detector {program} is not available: {source}")]
    Missing {
        program: String,
        #[source]
        source: ResolveError,
    },
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("detector output is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}

/// Classifies a single file as packed or not.
pub trait Detector {
    fn detect(&self, path: &Path) -> Result<Detection, DetectorError>;
    fn name(&self) -> &str;

    /// Verify the detector can be launched before a run starts.
    fn preflight(&self) -> Result<(), DetectorError> {
        Ok(())
    }
}

/// Detect It Easy console (`diec`) adapter.
///
/// The exit status is ignored; only the captured stdout is inspected.
#[derive(Debug, Clone)]
pub struct DiecDetector {
    command: ToolCommand,
    timeout: Option<Duration>,
}

impl DiecDetector {
    pub fn new(command: ToolCommand) -> Self {
        Self { command, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &ToolCommand {
        &self.command
    }
}

impl Detector for DiecDetector {
    fn detect(&self, path: &Path) -> Result<Detection, DetectorError> {
        let args = DIEC_ARGS.into_iter().map(OsStr::new).chain([path.as_os_str()]);
        let output = self.command.run(args, self.timeout)?;
        if !output.status.success() {
            tracing::debug!(path = %path.display(), status = %output.status, "detector exited non-zero");
        }
        let text = String::from_utf8(output.stdout)?;
        Ok(classify_output(&text))
    }

    fn name(&self) -> &str {
        "diec"
    }

    fn preflight(&self) -> Result<(), DetectorError> {
        self.command
            .preflight()
            .map_err(|source| DetectorError::Missing { program: self.command.to_string(), source })
    }
}

/// Classify detector output.
///
/// Any case-insensitive mention of `packer` marks the file packed. The name
/// is the remainder of the line after the first `Packer:` marker, trimmed.
/// Output that mentions a packer without the marker (or with nothing after
/// it) is still `Packed`, just without a name.
pub fn classify_output(text: &str) -> Detection {
    if !text.to_ascii_lowercase().contains("packer") {
        return Detection::NotPacked;
    }

    let packer = text
        .find(PACKER_MARKER)
        .map(|idx| &text[idx + PACKER_MARKER.len()..])
        .map(|rest| rest.split('\n').next().unwrap_or_default().trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    Detection::Packed { packer }.normalized()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_trimmed_name() {
        assert_eq!(classify_output("PE32\n    Packer: ASPack\n"), Detection::packed("ASPack"));
    }

    #[test]
    fn none_label_is_an_unnamed_packer() {
        assert_eq!(classify_output("Packer: None\n"), Detection::Packed { packer: None });
    }

    #[test]
    fn strips_carriage_return() {
        assert_eq!(
            classify_output("Packer: UPX(3.96)[NRV,brute]\r\nLinker: x"),
            Detection::packed("UPX(3.96)[NRV,brute]")
        );
    }

    #[test]
    fn first_marker_wins() {
        assert_eq!(
            classify_output("Packer: MPRESS\nPacker: UPX\n"),
            Detection::packed("MPRESS")
        );
    }

    #[test]
    fn lowercase_mention_without_marker_is_packed_without_name() {
        assert_eq!(
            classify_output("heuristic: packer signature suspected\n"),
            Detection::Packed { packer: None }
        );
    }

    #[test]
    fn empty_marker_has_no_name() {
        assert_eq!(classify_output("Packer:   \n"), Detection::Packed { packer: None });
    }

    #[test]
    fn no_mention_is_not_packed() {
        assert_eq!(
            classify_output("PE32\n    Compiler: MSVC\n    Linker: Microsoft Linker\n"),
            Detection::NotPacked
        );
        assert_eq!(classify_output(""), Detection::NotPacked);
    }
}
