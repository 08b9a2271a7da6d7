//! Detector abstraction and an external-program detector

use std::path::Path;
use std::process::Command;

use log::{debug, warn};
use serde::Deserialize;

use super::detection::PixelDetection;
use crate::errors::{SlicerError, SlicerResult};

/// Object detector run on one encoded tile
///
/// Detections are returned in the tile's own pixel coordinates. Errors are
/// treated as affecting this tile only.
pub trait Detector {
    fn detect(&mut self, image_path: &Path) -> SlicerResult<Vec<PixelDetection>>;
}

impl<F> Detector for F
where
    F: FnMut(&Path) -> SlicerResult<Vec<PixelDetection>>,
{
    fn detect(&mut self, image_path: &Path) -> SlicerResult<Vec<PixelDetection>> {
        self(image_path)
    }
}

const SUCCESS: &str = "Success";

/// Response printed by a detector program
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectorResponse {
    /// A bare list of detections
    Plain(Vec<PixelDetection>),
    /// Hosted-API style envelope with one result per image
    Envelope {
        message: String,
        #[serde(default)]
        result: Vec<EnvelopeResult>,
    },
}

#[derive(Debug, Deserialize)]
struct EnvelopeResult {
    message: String,
    #[serde(default)]
    prediction: Vec<PixelDetection>,
}

/// Runs an external program per tile and reads detections from its stdout
///
/// The tile path is appended to the configured arguments. The program must
/// exit successfully and print either a JSON array of detections or an
/// envelope `{"message": "Success", "result": [{"message": "Success",
/// "prediction": [...]}]}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDetector {
    program: String,
    args: Vec<String>,
}

impl CommandDetector {
    pub fn new(program: &str, args: &[String]) -> Self {
        CommandDetector {
            program: program.to_string(),
            args: args.to_vec(),
        }
    }

    /// Build from a whitespace-separated command line
    pub fn from_command_line(command_line: &str) -> SlicerResult<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()
            .ok_or_else(|| SlicerError::InvalidParameters("detector command is empty".to_string()))?;
        Ok(CommandDetector { program, args: parts.collect() })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Parse the stdout of the detector program
    pub fn parse_response(output: &str) -> SlicerResult<Vec<PixelDetection>> {
        let response: DetectorResponse = serde_json::from_str(output)
            .map_err(|e| SlicerError::DetectorError(format!("Unreadable detector output: {}", e)))?;

        match response {
            DetectorResponse::Plain(detections) => Ok(detections),
            DetectorResponse::Envelope { message, result } => {
                if message != SUCCESS {
                    return Err(SlicerError::DetectorError(format!("Detector reported '{}'", message)));
                }

                let mut detections = Vec::new();
                for entry in result {
                    if entry.message == SUCCESS {
                        detections.extend(entry.prediction);
                    } else {
                        warn!("Skipping failed prediction: {}", entry.message);
                    }
                }
                Ok(detections)
            },
        }
    }
}

impl Detector for CommandDetector {
    fn detect(&mut self, image_path: &Path) -> SlicerResult<Vec<PixelDetection>> {
        debug!("Running {} on {}", self.program, image_path.display());

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image_path)
            .output()
            .map_err(|e| SlicerError::DetectorError(format!("Cannot run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(SlicerError::DetectorError(format!(
                "{} exited with {}: {}",
                self.program, output.status, String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        CommandDetector::parse_response(&String::from_utf8_lossy(&output.stdout))
    }
}
