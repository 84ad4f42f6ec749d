//! Studio wire types
//!
//! Every response is an envelope with a `success` flag. Success bodies are
//! flattened next to it; failures carry `error` plus, for process-backed
//! endpoints, whatever output the CLI produced.

use crate::artifacts::ArtifactRecord;
use serde::{Deserialize, Serialize};

/// POST /api/generate body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    pub seed: Option<String>,
    pub width: Option<u32>,
    /// Free-form trait parameters, echoed back untouched
    pub traits: Option<serde_json::Value>,
}

/// POST /api/save body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveRequest {
    pub seed: Option<String>,
}

/// GET /api/status body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub version: String,
    pub cli_path: String,
    pub output_dir: String,
}

/// GET /api/test body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub output: String,
}

/// GET /api/help body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpReport {
    pub help: String,
}

/// POST /api/generate body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub filename: String,
    pub seed: String,
    pub width: u32,
    pub traits: serde_json::Value,
    /// Wall time of the render, e.g. `"12.34s"`
    pub duration: String,
    /// CLI stdout
    pub logs: String,
}

/// POST /api/save body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReport {
    pub filename: String,
    pub original_file: String,
    pub seed: String,
}

/// GET /api/list-outputs body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputList {
    pub files: Vec<ArtifactRecord>,
}

/// Successful envelope: `{"success": true, ...body}`
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

/// Failed envelope: `{"success": false, "error": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiFailure {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
}

impl ApiFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            output: None,
            logs: None,
        }
    }

    /// Attach captured CLI output under `output`
    pub fn with_output(mut self, output: Option<&str>) -> Self {
        self.output = output.map(str::to_string);
        self
    }

    /// Attach captured CLI output under `logs`
    pub fn with_logs(mut self, logs: Option<&str>) -> Self {
        self.logs = logs.map(str::to_string);
        self
    }
}
